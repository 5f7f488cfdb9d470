//! Translation laws over the fixture specs

use std::sync::Arc;

use domain_mapping::{
    CrmRecord, EnumCodec, LookupResolver, MappingSpec, MockEntityStore, PortalInput,
    RecordTranslator,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use test_utils::*;

fn translator(spec: Arc<MappingSpec>) -> RecordTranslator {
    RecordTranslator::new(spec, LookupResolver::new(Arc::new(MockEntityStore::new())))
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #[test]
    fn prop_crm_to_portal_declares_every_key(
        spec_index in 0usize..3,
        id in external_id_strategy(),
    ) {
        let spec = MappingFixtures::all_specs().swap_remove(spec_index);
        let translator = translator(spec.clone());

        let parsed = block_on(translator.crm_to_portal(&CrmRecord::new(id))).unwrap();

        assert_all_keys_present(&spec, &parsed);
        for key in spec.output_keys().filter(|k| *k != "crm_id") {
            prop_assert_eq!(&parsed[key], &Value::Null);
        }
    }

    #[test]
    fn prop_partial_contact_records_keep_key_presence(
        record in field_record_strategy(MappingFixtures::contact_spec()),
    ) {
        let spec = MappingFixtures::contact_spec();
        let parsed = block_on(translator(spec.clone()).crm_to_portal(&record)).unwrap();

        assert_all_keys_present(&spec, &parsed);
    }

    #[test]
    fn prop_field_round_trip(
        (spec, record) in (0usize..3).prop_flat_map(|i| {
            let spec = MappingFixtures::all_specs().swap_remove(i);
            (Just(spec.clone()), complete_field_record_strategy(spec))
        }),
    ) {
        let translator = translator(spec.clone());

        let parsed = block_on(translator.crm_to_portal(&record)).unwrap();
        let fields = block_on(translator.portal_to_crm(&PortalInput::payload(parsed))).unwrap();

        for field in spec.fields() {
            prop_assert_eq!(fields.get(&field.crm_key), record.field(&field.crm_key));
        }
    }

    #[test]
    fn prop_null_clears_and_absent_omits(
        cleared in proptest::sample::subsequence(vec!["first_name", "name", "email", "opted_in"], 0..=4),
    ) {
        let spec = MappingFixtures::contact_spec();
        let payload: Map<String, Value> =
            cleared.iter().map(|key| (key.to_string(), Value::Null)).collect();

        let fields = block_on(translator(spec.clone()).portal_to_crm(&PortalInput::payload(payload))).unwrap();

        for field in spec.fields() {
            if cleared.contains(&field.portal_key.as_str()) {
                prop_assert_eq!(fields.get(&field.crm_key), Some(&Value::Null));
            } else {
                assert_field_omitted(&fields, &field.crm_key);
            }
        }
    }

    #[test]
    fn prop_equal_codec_round_trip(index in 0usize..4) {
        let codec = MappingFixtures::deal_stage_codec();
        let code = codec.crm_codes().nth(index).unwrap().clone();

        let portal = codec.to_portal(&code).unwrap();
        prop_assert_eq!(codec.to_crm(&portal).unwrap(), code);
    }
}

#[test]
fn test_status_scenario() {
    let spec = MappingSpec::builder(CONTACT, "Contacts")
        .equal_enum("status", "status", MappingFixtures::contact_status_codec())
        .build()
        .unwrap();
    let record = CrmRecord::new(IdFixtures::contact()).with_field("status", 2);

    let parsed = block_on(translator(Arc::new(spec)).crm_to_portal(&record)).unwrap();

    assert_eq!(parsed["status"], json!("active"));
}

#[test]
fn test_null_name_scenario() {
    let spec = MappingSpec::builder(CONTACT, "Contacts")
        .field("name", "Name")
        .build()
        .unwrap();
    let input = PortalInput::from_json(json!({"name": null})).unwrap();

    let fields = block_on(translator(Arc::new(spec)).portal_to_crm(&input)).unwrap();

    assert_eq!(Value::Object(fields), json!({"Name": null}));
}

#[test]
fn test_direct_value_beats_secondary_block() {
    let input = PortalInput::from_json(json!({
        "email": "direct@example.com",
        "data": {"email": "secondary@example.com"}
    }))
    .unwrap();

    let fields = block_on(translator(MappingFixtures::contact_spec()).portal_to_crm(&input)).unwrap();

    assert_eq!(fields["Email"], json!("direct@example.com"));
}
