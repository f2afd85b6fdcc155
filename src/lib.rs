// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod error;
pub mod evidence;
pub mod ingest;
pub mod progression;
pub mod scorecard;
pub mod store;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::error::{EngineError, Result};
pub use crate::store::JsonStore;
