//! Decoding policy shared by every source.
//!
//! Source modules decide *where* a value lives in their records; these
//! helpers decide *how* a value is interpreted once found.

mod content;
mod cwd;
mod kind;
mod metadata;
mod timestamp;
mod title;

pub use content::{binary_placeholder, extract_text, value_to_display};
pub use cwd::{cwd_candidates, cwd_markers, resolve_cwd};
pub use kind::{derive_kind, kind_from_role, kind_from_type};
pub use metadata::MetadataScan;
pub use timestamp::{find_timestamp, parse_timestamp_str, parse_timestamp_value, timestamp_from_epoch};
pub use title::{TITLE_MAX_CHARS, derive_title};
