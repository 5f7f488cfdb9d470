//! Test Data Builders
//!
//! Builders for portal entities, CRM records, and a fully wired sync
//! service over in-memory ports. Tests set only the fields they care about.

use std::sync::Arc;

use core_kernel::{EntityType, ExternalId, LocalId};
use domain_mapping::value::local_id_to_value;
use domain_mapping::{
    CrmRecord, EntityRef, LookupResolver, MappingSpec, MockEntityStore, PortalEntity, PortalInput,
    RecordTranslator,
};
use domain_sync::{CrmClient, MockCrmPort, RecordSyncService, SyncSettings};
use serde_json::{json, Value};

use crate::fixtures::{MappingFixtures, SyncFixtures, ACCOUNT, CONTACT};

/// Builder for portal contacts
pub struct TestContactBuilder {
    entity: PortalEntity,
}

impl Default for TestContactBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContactBuilder {
    /// Creates an unsynced contact with a last name
    pub fn new() -> Self {
        Self {
            entity: PortalEntity::new(CONTACT)
                .with_id(LocalId::new())
                .with_attribute("name", "Lovelace"),
        }
    }

    pub fn with_external_id(mut self, id: ExternalId) -> Self {
        self.entity = self.entity.with_external_id(id);
        self
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.entity = self.entity.with_attribute(key, value);
        self
    }

    /// Links the contact to an account, preloading the relation
    pub fn with_account(mut self, account: EntityRef) -> Self {
        self.entity = self
            .entity
            .with_attribute("account_id", local_id_to_value(account.id))
            .with_relation(account);
        self
    }

    /// Sets the nested secondary data block
    pub fn with_data(mut self, data: Value) -> Self {
        self.entity = self.entity.with_attribute("data", data);
        self
    }

    pub fn build(self) -> PortalEntity {
        self.entity
    }

    pub fn build_input(self) -> PortalInput {
        PortalInput::entity(self.entity)
    }
}

/// Builder for records as the CRM returns them
pub struct CrmRecordBuilder {
    record: CrmRecord,
}

impl CrmRecordBuilder {
    pub fn new(id: ExternalId) -> Self {
        Self {
            record: CrmRecord::new(id),
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.record = self.record.with_field(key, value);
        self
    }

    /// Sets a lookup field the way the CRM serialises it
    pub fn lookup(self, key: &str, id: &ExternalId, name: &str) -> Self {
        self.field(key, json!({"id": id.as_str(), "name": name}))
    }

    pub fn build(self) -> CrmRecord {
        self.record
    }
}

/// A sync service over in-memory ports, with handles to both mocks
pub struct SyncHarness {
    pub crm: Arc<MockCrmPort>,
    pub store: Arc<MockEntityStore>,
    pub client: Arc<CrmClient>,
    pub service: RecordSyncService,
}

impl SyncHarness {
    /// Registers a synced account in the local store and returns its reference
    pub async fn synced_account(&self, external_id: ExternalId) -> EntityRef {
        self.synced(ACCOUNT, external_id).await
    }

    pub async fn synced(&self, entity_type: EntityType, external_id: ExternalId) -> EntityRef {
        let entity = EntityRef::synced(entity_type, LocalId::new(), external_id);
        self.store.insert(entity.clone()).await;
        entity
    }

    /// A second service for another spec sharing this harness's client and store
    pub fn service_for(&self, spec: Arc<MappingSpec>, settings: SyncSettings) -> RecordSyncService {
        let translator = RecordTranslator::new(spec, LookupResolver::new(self.store.clone()));
        RecordSyncService::new(self.client.clone(), translator, settings)
    }
}

/// Builder for [`SyncHarness`]
pub struct TestSyncHarnessBuilder {
    spec: Arc<MappingSpec>,
    settings: SyncSettings,
}

impl Default for TestSyncHarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSyncHarnessBuilder {
    /// Defaults to the contact spec and fixture settings
    pub fn new() -> Self {
        Self {
            spec: MappingFixtures::contact_spec(),
            settings: SyncFixtures::settings(),
        }
    }

    pub fn with_spec(mut self, spec: Arc<MappingSpec>) -> Self {
        self.spec = spec;
        self
    }

    pub fn with_settings(mut self, settings: SyncSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> SyncHarness {
        let crm = Arc::new(MockCrmPort::new());
        let store = Arc::new(MockEntityStore::new());
        let client = Arc::new(CrmClient::new(crm.clone()));
        let translator = RecordTranslator::new(self.spec, LookupResolver::new(store.clone()));
        let service = RecordSyncService::new(client.clone(), translator, self.settings);
        SyncHarness {
            crm,
            store,
            client,
            service,
        }
    }
}
