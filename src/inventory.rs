//! Read-only inventory collections: devices, circuits, clients, services.
//!
//! Items are passed through as opaque JSON objects; only the paging envelope
//! is interpreted.

#[cfg(test)]
#[path = "inventory_test.rs"]
mod tests;

use serde_json::Value;

use crate::endpoints::Collection;
use crate::error::ConsoleError;
use crate::pagination::{FetchedCollection, PageQuery};
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct Inventory {
    session: Session,
}

impl Inventory {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Every item of `collection`.
    ///
    /// # Errors
    ///
    /// Returns the first failing page's error.
    pub async fn fetch(&self, collection: Collection) -> Result<FetchedCollection<Value>, ConsoleError> {
        let query = PageQuery::new(self.session.endpoints().collection(collection));
        self.session.fetch_all(&query).await
    }

    /// All devices, optionally filtered on monitoring status.
    ///
    /// # Errors
    ///
    /// Returns the first failing page's error.
    pub async fn devices(&self, monitoring: Option<bool>) -> Result<FetchedCollection<Value>, ConsoleError> {
        let query = PageQuery::new(self.session.endpoints().collection(Collection::Devices)).param("monitoring", monitoring);
        self.session.fetch_all(&query).await
    }

    /// # Errors
    ///
    /// Returns the first failing page's error.
    pub async fn circuits(&self) -> Result<FetchedCollection<Value>, ConsoleError> {
        self.fetch(Collection::Circuits).await
    }

    /// # Errors
    ///
    /// Returns the first failing page's error.
    pub async fn clients(&self) -> Result<FetchedCollection<Value>, ConsoleError> {
        self.fetch(Collection::Clients).await
    }

    /// # Errors
    ///
    /// Returns the first failing page's error.
    pub async fn services(&self) -> Result<FetchedCollection<Value>, ConsoleError> {
        self.fetch(Collection::Services).await
    }

    /// Device count, or 0 when the backend cannot say.
    ///
    /// # Errors
    ///
    /// Returns authentication failures only.
    pub async fn devices_count(&self, monitoring: Option<bool>) -> Result<u64, ConsoleError> {
        let params = vec![("monitoring".to_owned(), monitoring.map(|m| m.to_string()))];
        self.session.total_count(&self.session.endpoints().collection(Collection::Devices), &params).await
    }

    /// Circuit count, or 0 when the backend cannot say.
    ///
    /// # Errors
    ///
    /// Returns authentication failures only.
    pub async fn circuits_count(&self) -> Result<u64, ConsoleError> {
        self.session.total_count(&self.session.endpoints().collection(Collection::Circuits), &[]).await
    }

    /// Count for any collection, or 0 when the backend cannot say.
    ///
    /// # Errors
    ///
    /// Returns authentication failures only.
    pub async fn count(&self, collection: Collection) -> Result<u64, ConsoleError> {
        match collection {
            Collection::Devices => self.devices_count(None).await,
            Collection::Circuits => self.circuits_count().await,
            other => self.session.total_count(&self.session.endpoints().collection(other), &[]).await,
        }
    }
}
