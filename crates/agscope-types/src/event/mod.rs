#[allow(clippy::module_inception)]
mod event;
mod kind;

pub use event::*;
pub use kind::*;
