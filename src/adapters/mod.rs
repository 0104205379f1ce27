// Adapters layer: concrete ContactStore / TokenProvider implementations.

pub mod http;
pub mod memory;

pub use http::{ApiCredentials, ApiTokenProvider, HttpContactStore};
pub use memory::{InMemoryContactStore, StaticTokenProvider};
