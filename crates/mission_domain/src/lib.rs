pub mod error;
pub mod memory;
pub mod notifications;
pub mod service;
pub mod store;

pub use crate::error::{EngineError, EngineResult};
pub use crate::memory::{InMemoryStore, JsonFileStore};
pub use crate::service::{MissionService, MissionServiceBuilder};
pub use crate::store::{Filter, Row, Store, StoreError, Table};
