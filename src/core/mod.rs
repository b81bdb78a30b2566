//! Core module containing the denormalization building blocks

pub mod accessors;
pub mod context;
pub mod error;
pub mod fetcher;
pub mod handler;
pub mod path;
pub mod resolver;
pub mod schema;

pub use accessors::{extract_accessors, extract_types};
pub use context::ResolutionContext;
pub use error::{DenormError, DenormResult};
pub use fetcher::{Fetcher, FetcherSpec, extract_fetchers};
pub use handler::{ApiFnHandle, ApiHandler, handler_fn};
pub use path::{get_path, set_path};
pub use resolver::Resolver;
pub use schema::{Accessor, Schema, TypeRef};
