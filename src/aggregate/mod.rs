//! Cross-provider operations built on the [`SourceRegistry`](crate::sources::SourceRegistry).
//!
//! Both components turn provider failures into values: the resolver returns a
//! structured error record, the fan-out an `<name>_error` entry per failing
//! provider.

mod fanout;
mod resolver;

pub use fanout::{Fanout, FanoutResult, DEFAULT_DATABASES};
pub use resolver::{Resolution, Resolver};
