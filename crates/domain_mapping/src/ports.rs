//! Local Entity Store Port
//!
//! Lookup resolution needs exactly two queries from the portal's persistence
//! layer: find an entity by its local id, and find one by the identifier the
//! CRM assigned to it. The `EntityStorePort` trait captures those; adapters
//! backed by the portal database implement it outside this crate.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_mapping::{EntityStorePort, LookupResolver};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn EntityStorePort> = Arc::new(PortalDbStore::new(pool));
//! let resolver = LookupResolver::new(store);
//! ```

use async_trait::async_trait;

use core_kernel::{DomainPort, EntityType, ExternalId, LocalId, PortError};

use crate::value::EntityRef;

/// Read access to synchronized portal entities
///
/// Both methods return `Ok(None)` when no entity matches; `Err` is reserved
/// for failures of the store itself.
#[async_trait]
pub trait EntityStorePort: DomainPort {
    /// Finds the entity of `entity_type` carrying the given CRM identifier
    async fn find_by_external_id(
        &self,
        entity_type: EntityType,
        external_id: &ExternalId,
    ) -> Result<Option<EntityRef>, PortError>;

    /// Finds the entity of `entity_type` with the given local identifier
    async fn find_by_id(
        &self,
        entity_type: EntityType,
        id: LocalId,
    ) -> Result<Option<EntityRef>, PortError>;
}

/// Mock implementation of EntityStorePort for testing
///
/// Stores entity references in memory and counts queries so tests can
/// assert when a lookup was avoided.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory mock implementation of EntityStorePort
    #[derive(Debug, Default)]
    pub struct MockEntityStore {
        entities: Arc<RwLock<Vec<EntityRef>>>,
        queries: AtomicUsize,
        failing: AtomicBool,
    }

    impl MockEntityStore {
        /// Creates an empty store
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with entities for testing
        pub async fn with_entities(entities: Vec<EntityRef>) -> Self {
            let store = Self::new();
            store.entities.write().await.extend(entities);
            store
        }

        pub async fn insert(&self, entity: EntityRef) {
            self.entities.write().await.push(entity);
        }

        /// Number of find calls served so far
        pub fn query_count(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }

        /// Makes every subsequent query fail with a connection error
        pub fn fail_queries(&self) {
            self.failing.store(true, Ordering::SeqCst);
        }

        fn record_query(&self) -> Result<(), PortError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(PortError::connection("mock entity store is offline"));
            }
            Ok(())
        }
    }

    impl DomainPort for MockEntityStore {}

    #[async_trait]
    impl EntityStorePort for MockEntityStore {
        async fn find_by_external_id(
            &self,
            entity_type: EntityType,
            external_id: &ExternalId,
        ) -> Result<Option<EntityRef>, PortError> {
            self.record_query()?;
            Ok(self
                .entities
                .read()
                .await
                .iter()
                .find(|e| e.entity_type == entity_type && e.external_id.as_ref() == Some(external_id))
                .cloned())
        }

        async fn find_by_id(
            &self,
            entity_type: EntityType,
            id: LocalId,
        ) -> Result<Option<EntityRef>, PortError> {
            self.record_query()?;
            Ok(self
                .entities
                .read()
                .await
                .iter()
                .find(|e| e.entity_type == entity_type && e.id == id)
                .cloned())
        }
    }
}
