//! Pre-built Test Fixtures
//!
//! Mapping specs for the three entity types the suite exercises, plus the
//! identifiers and settings the scenarios share. Codecs are built once per
//! test binary.

use std::sync::Arc;

use core_kernel::{EntityType, ExternalId};
use domain_mapping::{DifferentCodec, EqualCodec, LookupTarget, MappingSpec};
use domain_sync::SyncSettings;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

pub const ACCOUNT: EntityType = EntityType::new("account");
pub const CONTACT: EntityType = EntityType::new("contact");
pub const DEAL: EntityType = EntityType::new("deal");

static CONTACT_STATUS: Lazy<Arc<EqualCodec>> = Lazy::new(|| {
    Arc::new(EqualCodec::new("contact_status").entry(1, "inactive").entry(2, "active"))
});

static ACCOUNT_TYPE: Lazy<Arc<EqualCodec>> = Lazy::new(|| {
    Arc::new(EqualCodec::from_pairs(
        "account_type",
        [
            ("Customer", "customer"),
            ("Partner", "partner"),
            ("Prospect", "prospect"),
            ("Vendor", "vendor"),
        ],
    ))
});

static DEAL_STAGE: Lazy<Arc<EqualCodec>> = Lazy::new(|| {
    Arc::new(
        EqualCodec::new("deal_stage")
            .entry("Qualification", "open")
            .entry("Negotiation/Review", "negotiating")
            .entry("Closed Won", "won")
            .entry("Closed Lost", "lost"),
    )
});

static SALUTATION: Lazy<Arc<DifferentCodec>> = Lazy::new(|| {
    Arc::new(DifferentCodec::new(
        "salutation",
        |crm: &Value| match crm.as_str()? {
            "Mr." => Some(json!("mr")),
            "Ms." | "Mrs." | "Miss" => Some(json!("ms")),
            "Dr." | "Prof." => Some(json!("dr")),
            _ => None,
        },
        |portal: &Value| match portal.as_str()? {
            "mr" => Some(json!("Mr.")),
            "ms" => Some(json!("Ms.")),
            "dr" => Some(json!("Dr.")),
            _ => None,
        },
    ))
});

/// Mapping specs for the fixture entity types
pub struct MappingFixtures;

impl MappingFixtures {
    /// Accounts: plain fields, a type enum, and a passthrough owner
    pub fn account_spec() -> Arc<MappingSpec> {
        let spec = MappingSpec::builder(ACCOUNT, "Accounts")
            .field("name", "Account_Name")
            .field("website", "Website")
            .field("phone", "Phone")
            .field("is_active", "Active")
            .equal_enum("type", "Account_Type", ACCOUNT_TYPE.clone())
            .lookup("owner", LookupTarget::passthrough("Owner"))
            .build()
            .unwrap();
        Arc::new(spec)
    }

    /// Contacts: a status code table, a salutation vocabulary, and an account relation
    pub fn contact_spec() -> Arc<MappingSpec> {
        let spec = MappingSpec::builder(CONTACT, "Contacts")
            .field("first_name", "First_Name")
            .field("name", "Last_Name")
            .field("email", "Email")
            .field("opted_in", "Email_Opt_In")
            .equal_enum("status", "Status", CONTACT_STATUS.clone())
            .different_enum("salutation", "Salutation", SALUTATION.clone())
            .lookup("account_id", LookupTarget::related(ACCOUNT, "Account_Name"))
            .build()
            .unwrap();
        Arc::new(spec)
    }

    /// Deals: a stage enum and a polymorphic party relation
    pub fn deal_spec() -> Arc<MappingSpec> {
        let spec = MappingSpec::builder(DEAL, "Deals")
            .field("name", "Deal_Name")
            .field("amount", "Amount")
            .field("closing_date", "Closing_Date")
            .equal_enum("stage", "Stage", DEAL_STAGE.clone())
            .polymorphic(
                "party_id",
                [
                    ("contact_id", LookupTarget::related(CONTACT, "Contact_Name")),
                    ("account_id", LookupTarget::related(ACCOUNT, "Account_Name")),
                ],
            )
            .build()
            .unwrap();
        Arc::new(spec)
    }

    pub fn all_specs() -> Vec<Arc<MappingSpec>> {
        vec![Self::account_spec(), Self::contact_spec(), Self::deal_spec()]
    }

    pub fn contact_status_codec() -> Arc<EqualCodec> {
        CONTACT_STATUS.clone()
    }

    pub fn deal_stage_codec() -> Arc<EqualCodec> {
        DEAL_STAGE.clone()
    }
}

/// Fixture for CRM identifiers
pub struct IdFixtures;

impl IdFixtures {
    pub fn external(id: &str) -> ExternalId {
        ExternalId::new(id).unwrap()
    }

    pub fn account() -> ExternalId {
        Self::external("4876000000001001")
    }

    pub fn contact() -> ExternalId {
        Self::external("4876000000002001")
    }

    pub fn deal() -> ExternalId {
        Self::external("4876000000003001")
    }
}

/// Fixture for service settings
pub struct SyncFixtures;

impl SyncFixtures {
    pub fn territory() -> &'static str {
        "EMEA"
    }

    pub fn settings() -> SyncSettings {
        SyncSettings::new(Self::territory())
    }
}
