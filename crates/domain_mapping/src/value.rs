//! Record shapes on both sides of the mapping
//!
//! CRM records and translation outputs are JSON maps of scalars. Portal-side
//! input comes in two shapes, a structured entity or a loose payload, unified
//! behind [`PortalInput`] so the translator never inspects which one it got.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use core_kernel::{EntityType, ExternalId, LocalId};

use crate::error::MappingError;

/// Portal key under which the CRM identifier is exposed
pub const EXTERNAL_ID_KEY: &str = "crm_id";

/// Key of the nested secondary data block in loose payloads
pub const SECONDARY_DATA_KEY: &str = "data";

/// Portal-shaped translation output; every mapped key is present
pub type ParsedRecord = Map<String, Value>;

/// CRM field values ready for submission; only determined fields are present
pub type CrmFieldMap = Map<String, Value>;

/// A record as returned by the CRM record service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrmRecord {
    pub id: ExternalId,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl CrmRecord {
    pub fn new(id: ExternalId) -> Self {
        Self {
            id,
            data: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

/// Reference to a portal entity, as preloaded on an input or found in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub entity_type: EntityType,
    pub id: LocalId,
    /// `None` until the entity has been synced once
    pub external_id: Option<ExternalId>,
}

impl EntityRef {
    pub fn new(entity_type: EntityType, id: LocalId) -> Self {
        Self {
            entity_type,
            id,
            external_id: None,
        }
    }

    pub fn synced(entity_type: EntityType, id: LocalId, external_id: ExternalId) -> Self {
        Self {
            entity_type,
            id,
            external_id: Some(external_id),
        }
    }
}

/// A structured portal entity with its attributes and preloaded relations
#[derive(Debug, Clone, PartialEq)]
pub struct PortalEntity {
    pub entity_type: EntityType,
    pub id: Option<LocalId>,
    pub external_id: Option<ExternalId>,
    pub attributes: Map<String, Value>,
    pub relations: Vec<EntityRef>,
}

impl PortalEntity {
    pub fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            id: None,
            external_id: None,
            attributes: Map::new(),
            relations: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: LocalId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_external_id(mut self, external_id: ExternalId) -> Self {
        self.external_id = Some(external_id);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_relation(mut self, relation: EntityRef) -> Self {
        self.relations.push(relation);
        self
    }
}

/// Where a portal value for a given key came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Supplied<'a> {
    /// Present on the input itself with a non-null value
    Direct(&'a Value),
    /// Taken from the secondary data block (may be null)
    Secondary(&'a Value),
    /// Present on the input, null, and not in the secondary block
    ExplicitNull,
    /// Not mentioned anywhere
    Absent,
}

impl<'a> Supplied<'a> {
    /// The supplied value, if one was found on either source
    pub fn value(&self) -> Option<&'a Value> {
        match *self {
            Supplied::Direct(value) | Supplied::Secondary(value) => Some(value),
            Supplied::ExplicitNull | Supplied::Absent => None,
        }
    }
}

/// Input to the portal-to-CRM direction
#[derive(Debug, Clone, PartialEq)]
pub enum PortalInput {
    /// A structured entity
    Entity(PortalEntity),
    /// A loose key/value payload with an optional secondary block used as fallback
    Payload {
        fields: Map<String, Value>,
        data: Option<Map<String, Value>>,
    },
}

impl PortalInput {
    pub fn entity(entity: PortalEntity) -> Self {
        PortalInput::Entity(entity)
    }

    pub fn payload(fields: Map<String, Value>) -> Self {
        PortalInput::Payload { fields, data: None }
    }

    pub fn payload_with_data(fields: Map<String, Value>, data: Map<String, Value>) -> Self {
        PortalInput::Payload {
            fields,
            data: Some(data),
        }
    }

    /// Builds a payload from a JSON object, splitting out a nested `data` object
    pub fn from_json(value: Value) -> Result<Self, MappingError> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(MappingError::InvalidInput(format!(
                    "expected a JSON object, got {}",
                    other
                )))
            }
        };

        let data = match fields.remove(SECONDARY_DATA_KEY) {
            Some(Value::Object(data)) => Some(data),
            Some(other) => {
                fields.insert(SECONDARY_DATA_KEY.to_string(), other);
                None
            }
            None => None,
        };

        Ok(PortalInput::Payload { fields, data })
    }

    /// Returns the raw value for `key`; `Some(Null)` means present but null
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            PortalInput::Entity(entity) => entity.attributes.get(key),
            PortalInput::Payload { fields, .. } => fields.get(key),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The secondary data block, if the input carries one
    pub fn secondary(&self) -> Option<&Map<String, Value>> {
        match self {
            PortalInput::Entity(entity) => entity
                .attributes
                .get(SECONDARY_DATA_KEY)
                .and_then(Value::as_object),
            PortalInput::Payload { data, .. } => data.as_ref(),
        }
    }

    /// Resolves `key` against the input, falling back to the secondary block
    pub fn supplied(&self, key: &str) -> Supplied<'_> {
        match self.get(key) {
            Some(value) if !value.is_null() => Supplied::Direct(value),
            present => match self.secondary().and_then(|data| data.get(key)) {
                Some(value) => Supplied::Secondary(value),
                None if present.is_some() => Supplied::ExplicitNull,
                None => Supplied::Absent,
            },
        }
    }

    /// Relations preloaded on a structured entity; payloads carry none
    pub fn relations(&self) -> &[EntityRef] {
        match self {
            PortalInput::Entity(entity) => &entity.relations,
            PortalInput::Payload { .. } => &[],
        }
    }

    /// The CRM identifier of the record this input describes, if it was synced
    pub fn external_id(&self) -> Option<ExternalId> {
        match self {
            PortalInput::Entity(entity) => entity.external_id.clone(),
            PortalInput::Payload { fields, .. } => {
                fields.get(EXTERNAL_ID_KEY).and_then(external_id_from_value)
            }
        }
    }
}

impl From<PortalEntity> for PortalInput {
    fn from(entity: PortalEntity) -> Self {
        PortalInput::Entity(entity)
    }
}

/// Extracts a CRM identifier from a lookup value (`{"id": ..}`, string or number)
pub fn external_id_from_value(value: &Value) -> Option<ExternalId> {
    match value {
        Value::String(id) => ExternalId::new(id.as_str()).ok(),
        Value::Number(id) => ExternalId::new(id.to_string()).ok(),
        Value::Object(object) => object.get("id").and_then(external_id_from_value),
        _ => None,
    }
}

/// Parses a local identifier from a portal value (`{"id": ..}` or string)
pub fn local_id_from_value(value: &Value) -> Option<LocalId> {
    match value {
        Value::String(id) => id.parse().ok(),
        Value::Object(object) => object.get("id").and_then(local_id_from_value),
        _ => None,
    }
}

/// Portal representation of a local identifier: the bare UUID string
pub fn local_id_to_value(id: LocalId) -> Value {
    Value::String(id.as_uuid().to_string())
}

pub fn external_id_to_value(id: Option<ExternalId>) -> Value {
    id.map(|id| Value::String(id.into_inner())).unwrap_or(Value::Null)
}
