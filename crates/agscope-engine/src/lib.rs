// Engine module - pure functions over sessions (rendering, matching)
// This layer sits between normalized sessions (types) and the runtime

pub mod filter;
pub mod transcript;

pub use filter::{MatchOutcome, TranscriptLookup, TranscriptPolicy, evaluate, matches};
pub use transcript::{Block, RenderMode, RenderOptions, coalesce, render, render_events};
