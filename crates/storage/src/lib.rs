pub mod backend;
pub mod error;
mod key;

pub use crate::backend::{Object, ObjectStore};
pub use crate::key::Key;
use std::sync::Arc;

pub type StoreHandle = Arc<dyn ObjectStore + Send + Sync>;
