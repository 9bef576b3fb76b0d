pub mod error;
pub mod path;
pub mod resolver;

pub use error::{Error, Result};
pub use path::*;
pub use resolver::{ProjectResolver, ProjectResolverBuilder};
