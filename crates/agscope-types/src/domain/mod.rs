pub mod candidate;
pub mod filters;
pub mod progress;
pub mod session;
pub mod source;

pub use candidate::*;
pub use filters::*;
pub use progress::*;
pub use session::*;
pub use source::*;
