//! Record Translator Tests
//!
//! End-to-end translation tests against a store adapter implemented outside
//! the crate, the way a portal database adapter would be.
//!
//! # Test Organization
//!
//! - `scenarios` - Concrete CRM/portal records for a deal-like entity
//! - `polymorphic` - Relations with several mutually exclusive alternatives
//! - `properties` - Key presence, field round trip, and codec round trip laws

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use core_kernel::{DomainPort, EntityType, ExternalId, LocalId, PortError};
use domain_mapping::value::local_id_to_value;
use domain_mapping::{
    CrmRecord, DifferentCodec, EntityRef, EntityStorePort, EnumCodec, EqualCodec, LookupResolver,
    LookupTarget, MappingSpec, PortalEntity, PortalInput, RecordTranslator,
};
use serde_json::{json, Map, Value};

// ============================================================================
// TEST FIXTURES
// ============================================================================

const ACCOUNT: EntityType = EntityType::new("account");
const CONTACT: EntityType = EntityType::new("contact");
const DEAL: EntityType = EntityType::new("deal");

/// Store adapter keyed the way a relational table would index it
#[derive(Default)]
struct TableStore {
    by_id: HashMap<(EntityType, LocalId), EntityRef>,
}

impl TableStore {
    fn with(mut self, entity: EntityRef) -> Self {
        self.by_id.insert((entity.entity_type, entity.id), entity);
        self
    }
}

impl DomainPort for TableStore {}

#[async_trait]
impl EntityStorePort for TableStore {
    async fn find_by_external_id(
        &self,
        entity_type: EntityType,
        external_id: &ExternalId,
    ) -> Result<Option<EntityRef>, PortError> {
        Ok(self
            .by_id
            .values()
            .find(|e| e.entity_type == entity_type && e.external_id.as_ref() == Some(external_id))
            .cloned())
    }

    async fn find_by_id(
        &self,
        entity_type: EntityType,
        id: LocalId,
    ) -> Result<Option<EntityRef>, PortError> {
        Ok(self.by_id.get(&(entity_type, id)).cloned())
    }
}

fn ext(id: &str) -> ExternalId {
    ExternalId::new(id).unwrap()
}

fn stage_codec() -> EqualCodec {
    EqualCodec::new("stage")
        .entry("Qualification", "open")
        .entry("Closed Won", "won")
        .entry("Closed Lost", "lost")
}

fn deal_spec() -> MappingSpec {
    MappingSpec::builder(DEAL, "Deals")
        .field("name", "Deal_Name")
        .field("amount", "Amount")
        .field("closing_date", "Closing_Date")
        .equal_enum("stage", "Stage", Arc::new(stage_codec()))
        .different_enum(
            "probability_band",
            "Probability",
            Arc::new(DifferentCodec::new(
                "probability_band",
                |crm| {
                    let p = crm.as_u64()?;
                    Some(json!(if p >= 50 { "likely" } else { "unlikely" }))
                },
                |portal| match portal.as_str()? {
                    "likely" => Some(json!(75)),
                    "unlikely" => Some(json!(25)),
                    _ => None,
                },
            )),
        )
        .lookup("owner", LookupTarget::passthrough("Owner"))
        .polymorphic(
            "party_id",
            [
                ("contact_id", LookupTarget::related(CONTACT, "Contact_Name")),
                ("account_id", LookupTarget::related(ACCOUNT, "Account_Name")),
            ],
        )
        .build()
        .unwrap()
}

fn translator(store: TableStore) -> RecordTranslator {
    RecordTranslator::new(Arc::new(deal_spec()), LookupResolver::new(Arc::new(store)))
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

mod scenarios {
    use super::*;

    #[tokio::test]
    async fn test_status_code_decodes_to_portal_value() {
        let spec = MappingSpec::builder(CONTACT, "Contacts")
            .equal_enum(
                "status",
                "status",
                Arc::new(EqualCodec::new("status").entry(1, "inactive").entry(2, "active")),
            )
            .build()
            .unwrap();
        let translator = RecordTranslator::new(
            Arc::new(spec),
            LookupResolver::new(Arc::new(TableStore::default())),
        );

        let record = CrmRecord::new(ext("C-1")).with_field("status", 2);
        let parsed = translator.crm_to_portal(&record).await.unwrap();

        assert_eq!(parsed["status"], json!("active"));
        assert_eq!(parsed["crm_id"], json!("C-1"));
    }

    #[tokio::test]
    async fn test_null_name_clears_crm_field() {
        let translator = translator(TableStore::default());
        let input = PortalInput::from_json(json!({"name": null})).unwrap();

        let fields = translator.portal_to_crm(&input).await.unwrap();

        assert_eq!(fields, object(json!({"Deal_Name": null})));
    }

    #[tokio::test]
    async fn test_partial_update_only_touches_supplied_fields() {
        let translator = translator(TableStore::default());
        let input = PortalInput::from_json(json!({
            "crm_id": "D-1",
            "amount": 1200,
            "data": {"stage": "won"}
        }))
        .unwrap();

        let fields = translator.portal_to_crm(&input).await.unwrap();

        assert_eq!(fields, object(json!({"Amount": 1200, "Stage": "Closed Won"})));
    }

    #[tokio::test]
    async fn test_different_codec_is_many_to_one() {
        let translator = translator(TableStore::default());
        let record = CrmRecord::new(ext("D-2")).with_field("Probability", 90);

        let parsed = translator.crm_to_portal(&record).await.unwrap();
        assert_eq!(parsed["probability_band"], json!("likely"));

        let input = PortalInput::from_json(json!({"probability_band": "likely"})).unwrap();
        let fields = translator.portal_to_crm(&input).await.unwrap();
        assert_eq!(fields["Probability"], json!(75));
    }

    #[tokio::test]
    async fn test_passthrough_owner_keeps_crm_id() {
        let translator = translator(TableStore::default());
        let record = CrmRecord::new(ext("D-3")).with_field("Owner", json!({"id": "U-1", "name": "Sam"}));

        let parsed = translator.crm_to_portal(&record).await.unwrap();
        assert_eq!(parsed["owner"], json!("U-1"));
    }
}

// ============================================================================
// POLYMORPHIC LOOKUPS
// ============================================================================

mod polymorphic {
    use super::*;

    #[tokio::test]
    async fn test_only_populated_alternative_is_written() {
        let account = LocalId::new();
        let translator = translator(TableStore::default().with(EntityRef::synced(ACCOUNT, account, ext("A-1"))));

        let input = PortalInput::from_json(json!({"account_id": local_id_to_value(account)})).unwrap();
        let fields = translator.portal_to_crm(&input).await.unwrap();

        assert_eq!(fields.get("Account_Name"), Some(&json!("A-1")));
        assert!(!fields.contains_key("Contact_Name"));
    }

    #[tokio::test]
    async fn test_no_alternative_populated_writes_nothing() {
        let translator = translator(TableStore::default());

        let input = PortalInput::from_json(json!({"contact_id": null, "account_id": null})).unwrap();
        let fields = translator.portal_to_crm(&input).await.unwrap();

        assert!(fields.is_empty());
    }

    #[tokio::test]
    async fn test_entity_relation_object_is_reduced_to_id() {
        let contact = LocalId::new();
        let translator = translator(TableStore::default());
        let entity = PortalEntity::new(DEAL)
            .with_attribute("contact_id", json!({"id": local_id_to_value(contact), "name": "Ada"}))
            .with_relation(EntityRef::synced(CONTACT, contact, ext("C-42")));

        let fields = translator.portal_to_crm(&PortalInput::entity(entity)).await.unwrap();

        assert_eq!(fields.get("Contact_Name"), Some(&json!("C-42")));
    }

    #[tokio::test]
    async fn test_crm_side_shares_one_portal_key() {
        let contact = LocalId::new();
        let translator = translator(TableStore::default().with(EntityRef::synced(CONTACT, contact, ext("C-1"))));

        let record = CrmRecord::new(ext("D-9"))
            .with_field("Contact_Name", json!({"id": "C-1"}))
            .with_field("Account_Name", Value::Null);
        let parsed = translator.crm_to_portal(&record).await.unwrap();

        assert_eq!(parsed["party_id"], local_id_to_value(contact));
        assert!(!parsed.contains_key("contact_id"));
    }
}

// ============================================================================
// PROPERTIES
// ============================================================================

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread().build().unwrap()
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z0-9 ]{1,24}".prop_map(Value::from),
        ]
    }

    proptest! {
        #[test]
        fn prop_every_declared_key_present(
            name in proptest::option::of(scalar()),
            amount in proptest::option::of(scalar()),
        ) {
            let translator = translator(TableStore::default());
            let mut record = CrmRecord::new(ext("D-prop"));
            if let Some(name) = name {
                record = record.with_field("Deal_Name", name);
            }
            if let Some(amount) = amount {
                record = record.with_field("Amount", amount);
            }

            let parsed = runtime().block_on(translator.crm_to_portal(&record)).unwrap();
            for key in translator.spec().output_keys() {
                prop_assert!(parsed.contains_key(key));
            }
        }

        #[test]
        fn prop_field_round_trip(
            name in scalar(),
            amount in scalar(),
            closing_date in scalar(),
        ) {
            let translator = translator(TableStore::default());
            let record = CrmRecord::new(ext("D-rt"))
                .with_field("Deal_Name", name)
                .with_field("Amount", amount)
                .with_field("Closing_Date", closing_date);

            let rt = runtime();
            let parsed = rt.block_on(translator.crm_to_portal(&record)).unwrap();
            let fields = rt
                .block_on(translator.portal_to_crm(&PortalInput::payload(parsed)))
                .unwrap();

            for field in translator.spec().fields() {
                prop_assert_eq!(fields.get(&field.crm_key), record.field(&field.crm_key));
            }
        }

        #[test]
        fn prop_equal_codec_round_trip(index in 0usize..3) {
            let codec = stage_codec();
            let code = codec.crm_codes().nth(index).unwrap().clone();
            let portal = codec.to_portal(&code).unwrap();
            prop_assert_eq!(codec.to_crm(&portal).unwrap(), code);
        }
    }
}
