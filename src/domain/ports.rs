use crate::domain::model::{AuthContext, Contact, ContactFilter, Operation};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Issues the header bundle that authorizes one pipeline cycle.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Fails with `ContactError::Auth`.
    async fn get_token(&self, operation: Operation) -> Result<AuthContext>;
}

/// Read/write access to the contact batch.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Fails with `ContactError::Fetch`. Never mutates the store.
    async fn list_contacts(
        &self,
        auth: &AuthContext,
        filter: &ContactFilter,
    ) -> Result<Vec<Contact>>;

    /// Writes the whole batch in one call. Fails with `ContactError::Persist`.
    async fn save_contacts(&self, auth: &AuthContext, batch: &[Contact]) -> Result<()>;
}
