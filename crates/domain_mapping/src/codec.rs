//! Enum codecs
//!
//! An [`EnumCodec`] translates one enumerated field between its CRM and portal
//! vocabularies. Implementations only provide the raw table or function; the
//! provided `to_portal` / `to_crm` methods apply the shared contract:
//!
//! - null passes through unchanged in both directions
//! - a value the codec does not know fails with `UnknownEnumValue`
//!
//! Two implementations cover the rule groups of a mapping spec:
//!
//! - [`EqualCodec`]: a code/value table for enums whose semantics match on both
//!   sides and only the representation differs
//! - [`DifferentCodec`]: an opaque pair of functions for vocabularies that need
//!   business-specific translation (possibly many-to-one, never assumed invertible)

use std::fmt;

use serde_json::Value;

use crate::error::MappingError;

/// Bidirectional translator for a single enumerated field
pub trait EnumCodec: Send + Sync {
    /// Name used in error messages
    fn name(&self) -> &str;

    /// Maps a non-null CRM value to its portal value, `None` if unknown
    fn decode(&self, crm_value: &Value) -> Option<Value>;

    /// Maps a non-null portal value to its CRM value, `None` if unknown
    fn encode(&self, portal_value: &Value) -> Option<Value>;

    fn to_portal(&self, crm_value: &Value) -> Result<Value, MappingError> {
        if crm_value.is_null() {
            return Ok(Value::Null);
        }
        self.decode(crm_value)
            .ok_or_else(|| MappingError::unknown_enum_value(self.name(), crm_value))
    }

    fn to_crm(&self, portal_value: &Value) -> Result<Value, MappingError> {
        if portal_value.is_null() {
            return Ok(Value::Null);
        }
        self.encode(portal_value)
            .ok_or_else(|| MappingError::unknown_enum_value(self.name(), portal_value))
    }
}

/// Code table for enums sharing semantics on both sides
///
/// Each entry pairs the CRM code with the portal value. Matching treats a
/// number and its decimal string form as equal, so payload values that
/// arrive as strings (`"2"`) still resolve against numeric codes.
#[derive(Debug, Clone, Default)]
pub struct EqualCodec {
    name: String,
    entries: Vec<(Value, Value)>,
}

impl EqualCodec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Adds a `crm_code <-> portal_value` pair
    pub fn entry(mut self, crm_code: impl Into<Value>, portal_value: impl Into<Value>) -> Self {
        self.entries.push((crm_code.into(), portal_value.into()));
        self
    }

    pub fn from_pairs<C, P>(name: impl Into<String>, pairs: impl IntoIterator<Item = (C, P)>) -> Self
    where
        C: Into<Value>,
        P: Into<Value>,
    {
        pairs
            .into_iter()
            .fold(Self::new(name), |codec, (crm, portal)| codec.entry(crm, portal))
    }

    /// CRM codes in declaration order
    pub fn crm_codes(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(crm, _)| crm)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EnumCodec for EqualCodec {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, crm_value: &Value) -> Option<Value> {
        self.entries
            .iter()
            .find(|(crm, _)| loosely_equal(crm, crm_value))
            .map(|(_, portal)| portal.clone())
    }

    fn encode(&self, portal_value: &Value) -> Option<Value> {
        self.entries
            .iter()
            .find(|(_, portal)| loosely_equal(portal, portal_value))
            .map(|(crm, _)| crm.clone())
    }
}

type Translate = Box<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Opaque translation for vocabularies that differ between portal and CRM
pub struct DifferentCodec {
    name: String,
    to_portal: Translate,
    to_crm: Translate,
}

impl DifferentCodec {
    pub fn new<P, C>(name: impl Into<String>, to_portal: P, to_crm: C) -> Self
    where
        P: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
        C: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            to_portal: Box::new(to_portal),
            to_crm: Box::new(to_crm),
        }
    }
}

impl fmt::Debug for DifferentCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DifferentCodec")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl EnumCodec for DifferentCodec {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, crm_value: &Value) -> Option<Value> {
        (self.to_portal)(crm_value)
    }

    fn encode(&self, portal_value: &Value) -> Option<Value> {
        (self.to_crm)(portal_value)
    }
}

fn loosely_equal(known: &Value, candidate: &Value) -> bool {
    if known == candidate {
        return true;
    }
    match (known, candidate) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            match (s.trim().parse::<f64>(), n.as_f64()) {
                (Ok(parsed), Some(number)) => parsed == number,
                _ => false,
            }
        }
        _ => false,
    }
}
