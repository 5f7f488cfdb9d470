//! CRM Record Port
//!
//! The CRM is consumed through a small record-CRUD surface. Authentication,
//! HTTP transport and rate limiting belong to the adapter implementing
//! [`CrmRecordPort`]; the sync service only sees entity responses and
//! `PortError`s.
//!
//! # Responses
//!
//! Create and update calls answer with one [`EntityResponse`] per submitted
//! record. A transport-level failure is an `Err(PortError)`; a record the CRM
//! refused (validation, duplicates) is an `Ok` response with
//! [`ResponseStatus::Error`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use core_kernel::{DomainPort, ExternalId, HealthCheckable, PortError};
use domain_mapping::{CrmFieldMap, CrmRecord};

/// Automation the CRM should run after a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Workflow,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Workflow => "workflow",
        }
    }
}

/// Search criterion in the CRM's `(field:equals:value)` syntax
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criteria {
    field: String,
    value: String,
}

impl Criteria {
    pub fn equals(field: impl Into<String>, value: impl fmt::Display) -> Self {
        Self {
            field: field.into(),
            value: value.to_string(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}:equals:{})", self.field, self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Per-record outcome of a create or update call
#[derive(Debug, Clone, PartialEq)]
pub struct EntityResponse {
    pub status: ResponseStatus,
    pub message: String,
    pub details: Value,
    /// Identifier of the written record; set on success
    pub id: Option<ExternalId>,
}

impl EntityResponse {
    pub fn success(id: ExternalId) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: "record saved".to_string(),
            details: Value::Null,
            id: Some(id),
        }
    }

    pub fn error(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            details,
            id: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

/// Record operations against one CRM account
#[async_trait]
pub trait CrmRecordPort: DomainPort + HealthCheckable {
    /// Prepares the connection (credentials, token store); may be called repeatedly
    async fn initialize(&self) -> Result<(), PortError>;

    async fn create_records(
        &self,
        module: &str,
        records: Vec<CrmFieldMap>,
        triggers: &[Trigger],
    ) -> Result<Vec<EntityResponse>, PortError>;

    /// Updates existing records; each record's id selects the CRM record
    async fn update_records(
        &self,
        module: &str,
        records: Vec<CrmRecord>,
        triggers: &[Trigger],
    ) -> Result<Vec<EntityResponse>, PortError>;

    async fn get_record(&self, module: &str, id: &ExternalId) -> Result<CrmRecord, PortError>;

    /// One page of records, in the CRM's order
    async fn get_records(
        &self,
        module: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<CrmRecord>, PortError>;

    async fn search_records_by_criteria(
        &self,
        module: &str,
        criteria: &Criteria,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<CrmRecord>, PortError>;
}

/// Mock implementation of CrmRecordPort for testing
///
/// Keeps records per module in memory, records every call, and can be
/// scripted to fail, reject or answer empty.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use core_kernel::{AdapterHealth, HealthCheckResult};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    const FIRST_ID: u64 = 4_876_000_000_000_001;

    /// A call received by the mock
    #[derive(Debug, Clone, PartialEq)]
    pub enum CrmCall {
        Create {
            module: String,
            records: Vec<CrmFieldMap>,
            triggers: Vec<Trigger>,
        },
        Update {
            module: String,
            records: Vec<CrmRecord>,
            triggers: Vec<Trigger>,
        },
        Get {
            module: String,
            id: ExternalId,
        },
        List {
            module: String,
            page: u32,
            per_page: u32,
        },
        Search {
            module: String,
            criteria: String,
            page: u32,
            per_page: u32,
        },
    }

    /// In-memory mock implementation of CrmRecordPort
    #[derive(Debug, Default)]
    pub struct MockCrmPort {
        records: Arc<RwLock<HashMap<String, Vec<CrmRecord>>>>,
        calls: Arc<RwLock<Vec<CrmCall>>>,
        initializations: AtomicUsize,
        failing_initializations: AtomicUsize,
        next_id: AtomicU64,
        request_failure: RwLock<Option<String>>,
        rejection: RwLock<Option<(String, Value)>>,
        empty_responses: AtomicBool,
    }

    impl MockCrmPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates a module with records for testing
        pub async fn with_records(module: &str, records: Vec<CrmRecord>) -> Self {
            let port = Self::new();
            port.seed(module, records).await;
            port
        }

        pub async fn seed(&self, module: &str, records: Vec<CrmRecord>) {
            self.records
                .write()
                .await
                .entry(module.to_string())
                .or_default()
                .extend(records);
        }

        /// Makes the next `times` initialize calls fail
        pub fn fail_initialization(&self, times: usize) {
            self.failing_initializations.store(times, Ordering::SeqCst);
        }

        /// Makes every record request fail at transport level
        pub async fn fail_requests(&self, message: impl Into<String>) {
            *self.request_failure.write().await = Some(message.into());
        }

        /// Makes every create/update answer with a record-level error
        pub async fn reject_records(&self, message: impl Into<String>, details: Value) {
            *self.rejection.write().await = Some((message.into(), details));
        }

        /// Makes create/update answer with no entity responses
        pub fn respond_empty(&self) {
            self.empty_responses.store(true, Ordering::SeqCst);
        }

        pub fn initialize_count(&self) -> usize {
            self.initializations.load(Ordering::SeqCst)
        }

        pub async fn calls(&self) -> Vec<CrmCall> {
            self.calls.read().await.clone()
        }

        pub async fn records(&self, module: &str) -> Vec<CrmRecord> {
            self.records
                .read()
                .await
                .get(module)
                .cloned()
                .unwrap_or_default()
        }

        async fn record_call(&self, call: CrmCall) -> Result<(), PortError> {
            self.calls.write().await.push(call);
            match self.request_failure.read().await.as_ref() {
                Some(message) => Err(PortError::connection(message.clone())),
                None => Ok(()),
            }
        }

        /// The scripted response overriding normal behaviour, if any
        async fn scripted_response(&self) -> Option<Vec<EntityResponse>> {
            if self.empty_responses.load(Ordering::SeqCst) {
                return Some(Vec::new());
            }
            self.rejection
                .read()
                .await
                .as_ref()
                .map(|(message, details)| vec![EntityResponse::error(message.clone(), details.clone())])
        }

        fn allocate_id(&self) -> Result<ExternalId, PortError> {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            ExternalId::new((FIRST_ID + n).to_string())
                .map_err(|e| PortError::internal(e.to_string()))
        }
    }

    fn matches_criteria(record: &CrmRecord, criteria: &Criteria) -> bool {
        match record.field(criteria.field()) {
            Some(Value::String(value)) => value == criteria.value(),
            Some(Value::Number(value)) => value.to_string() == criteria.value(),
            Some(Value::Object(object)) => {
                object.get("id").and_then(Value::as_str) == Some(criteria.value())
            }
            _ => false,
        }
    }

    impl DomainPort for MockCrmPort {}

    #[async_trait]
    impl HealthCheckable for MockCrmPort {
        async fn health_check(&self) -> HealthCheckResult {
            match self.request_failure.read().await.as_ref() {
                Some(message) => {
                    HealthCheckResult::now("mock_crm", AdapterHealth::Unhealthy, 0)
                        .with_message(message.clone())
                }
                None => HealthCheckResult::now("mock_crm", AdapterHealth::Healthy, 0),
            }
        }
    }

    #[async_trait]
    impl CrmRecordPort for MockCrmPort {
        async fn initialize(&self) -> Result<(), PortError> {
            self.initializations.fetch_add(1, Ordering::SeqCst);
            let remaining = self.failing_initializations.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failing_initializations.store(remaining - 1, Ordering::SeqCst);
                return Err(PortError::Unauthorized {
                    message: "invalid client credentials".to_string(),
                });
            }
            Ok(())
        }

        async fn create_records(
            &self,
            module: &str,
            records: Vec<CrmFieldMap>,
            triggers: &[Trigger],
        ) -> Result<Vec<EntityResponse>, PortError> {
            self.record_call(CrmCall::Create {
                module: module.to_string(),
                records: records.clone(),
                triggers: triggers.to_vec(),
            })
            .await?;

            if let Some(responses) = self.scripted_response().await {
                return Ok(responses);
            }

            let mut store = self.records.write().await;
            let stored = store.entry(module.to_string()).or_default();
            let mut responses = Vec::with_capacity(records.len());
            for data in records {
                let id = self.allocate_id()?;
                stored.push(CrmRecord {
                    id: id.clone(),
                    data,
                });
                responses.push(EntityResponse::success(id));
            }
            Ok(responses)
        }

        async fn update_records(
            &self,
            module: &str,
            records: Vec<CrmRecord>,
            triggers: &[Trigger],
        ) -> Result<Vec<EntityResponse>, PortError> {
            self.record_call(CrmCall::Update {
                module: module.to_string(),
                records: records.clone(),
                triggers: triggers.to_vec(),
            })
            .await?;

            if let Some(responses) = self.scripted_response().await {
                return Ok(responses);
            }

            let mut store = self.records.write().await;
            let stored = store.entry(module.to_string()).or_default();
            let responses = records
                .into_iter()
                .map(|update| match stored.iter_mut().find(|r| r.id == update.id) {
                    Some(existing) => {
                        existing.data.extend(update.data);
                        EntityResponse::success(update.id)
                    }
                    None => EntityResponse::error(
                        "the related id given seems to be invalid",
                        serde_json::json!({"id": update.id.as_str()}),
                    ),
                })
                .collect();
            Ok(responses)
        }

        async fn get_record(&self, module: &str, id: &ExternalId) -> Result<CrmRecord, PortError> {
            self.record_call(CrmCall::Get {
                module: module.to_string(),
                id: id.clone(),
            })
            .await?;

            self.records
                .read()
                .await
                .get(module)
                .and_then(|records| records.iter().find(|r| &r.id == id))
                .cloned()
                .ok_or_else(|| PortError::not_found(module, id))
        }

        async fn get_records(
            &self,
            module: &str,
            page: u32,
            per_page: u32,
        ) -> Result<Vec<CrmRecord>, PortError> {
            self.record_call(CrmCall::List {
                module: module.to_string(),
                page,
                per_page,
            })
            .await?;

            let skip = page.saturating_sub(1) as usize * per_page as usize;
            Ok(self
                .records(module)
                .await
                .into_iter()
                .skip(skip)
                .take(per_page as usize)
                .collect())
        }

        async fn search_records_by_criteria(
            &self,
            module: &str,
            criteria: &Criteria,
            page: u32,
            per_page: u32,
        ) -> Result<Vec<CrmRecord>, PortError> {
            self.record_call(CrmCall::Search {
                module: module.to_string(),
                criteria: criteria.to_string(),
                page,
                per_page,
            })
            .await?;

            let skip = page.saturating_sub(1) as usize * per_page as usize;
            Ok(self
                .records(module)
                .await
                .into_iter()
                .filter(|r| matches_criteria(r, criteria))
                .skip(skip)
                .take(per_page as usize)
                .collect())
        }
    }
}
