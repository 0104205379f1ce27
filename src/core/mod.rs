pub mod pipeline;
pub mod powers;
pub mod transforms;

pub use crate::domain::model::{AuthContext, Contact, ContactFilter, Operation};
pub use crate::domain::ports::{ContactStore, TokenProvider};
pub use crate::utils::error::Result;
