//! In-memory collaborators.
//!
//! Thread-safe stand-ins for the HTTP adapters. Useful for tests and for
//! embedding the pipeline without a network.

use crate::domain::model::{AuthContext, Contact, ContactFilter, Operation};
use crate::domain::ports::{ContactStore, TokenProvider};
use crate::utils::error::{ContactError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Default)]
pub struct InMemoryContactStore {
    contacts: Arc<RwLock<Vec<Contact>>>,
    saved: Arc<RwLock<Vec<Vec<Contact>>>>,
    last_auth: Arc<RwLock<Option<AuthContext>>>,
    read_failure: Option<String>,
    write_failure: Option<String>,
}

impl InMemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contacts(contacts: Vec<Contact>) -> Self {
        Self {
            contacts: Arc::new(RwLock::new(contacts)),
            ..Self::default()
        }
    }

    /// Every `list_contacts` call fails with `Fetch`.
    pub fn failing_reads(mut self, message: &str) -> Self {
        self.read_failure = Some(message.to_string());
        self
    }

    /// Every `save_contacts` call fails with `Persist`.
    pub fn failing_writes(mut self, message: &str) -> Self {
        self.write_failure = Some(message.to_string());
        self
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.contacts
            .read()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Batches passed to `save_contacts`, oldest first.
    pub fn saved_batches(&self) -> Vec<Vec<Contact>> {
        self.saved.read().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last_auth(&self) -> Option<AuthContext> {
        self.last_auth.read().ok().and_then(|a| a.clone())
    }

    fn remember_auth(&self, auth: &AuthContext) {
        if let Ok(mut last) = self.last_auth.write() {
            *last = Some(auth.clone());
        }
    }
}

fn same_person(a: &Contact, b: &Contact) -> bool {
    a.first_name == b.first_name && a.last_name == b.last_name
}

#[async_trait]
impl ContactStore for InMemoryContactStore {
    async fn list_contacts(
        &self,
        auth: &AuthContext,
        filter: &ContactFilter,
    ) -> Result<Vec<Contact>> {
        self.remember_auth(auth);
        if let Some(message) = &self.read_failure {
            return Err(ContactError::Fetch {
                message: message.clone(),
            });
        }

        let contacts = self.contacts.read().map_err(|_| ContactError::Fetch {
            message: "Failed to acquire read lock".to_string(),
        })?;
        Ok(contacts
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    /// Upserts by first and last name.
    async fn save_contacts(&self, auth: &AuthContext, batch: &[Contact]) -> Result<()> {
        self.remember_auth(auth);
        if let Some(message) = &self.write_failure {
            return Err(ContactError::Persist {
                message: message.clone(),
            });
        }

        let lock_error = || ContactError::Persist {
            message: "Failed to acquire write lock".to_string(),
        };
        let mut contacts = self.contacts.write().map_err(|_| lock_error())?;
        for incoming in batch {
            match contacts.iter_mut().find(|c| same_person(c, incoming)) {
                Some(existing) => *existing = incoming.clone(),
                None => contacts.push(incoming.clone()),
            }
        }
        self.saved
            .write()
            .map_err(|_| lock_error())?
            .push(batch.to_vec());
        Ok(())
    }
}

/// Hands out a fixed bearer token, or always fails.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: std::result::Result<String, String>,
    calls: Arc<AtomicUsize>,
}

impl StaticTokenProvider {
    pub fn new(token: &str) -> Self {
        Self {
            token: Ok(token.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            token: Err(message.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self, operation: Operation) -> Result<AuthContext> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.token {
            Ok(token) => Ok(AuthContext::new(operation)
                .with_header("Authorization", &format!("Bearer {}", token))
                .with_header("test_case", operation.tag())),
            Err(message) => Err(ContactError::Auth {
                message: message.clone(),
            }),
        }
    }
}
