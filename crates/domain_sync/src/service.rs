//! Record Sync Service
//!
//! Single-record CRUD against one CRM module. Each operation initialises the
//! shared client if needed, translates through the module's
//! [`RecordTranslator`], and makes exactly one CRM call.
//!
//! Writes add two things translation does not: the configured `Territory`
//! field, and conversion of the literal strings `"true"` and `"false"` into
//! booleans.
//!
//! # Example
//!
//! ```rust,ignore
//! let service = RecordSyncService::new(client.clone(), contact_translator, config.settings());
//!
//! let input = PortalInput::from_json(json!({"name": "Lovelace", "status": "active"}))?;
//! let crm_id = service.create(&input, true).await?;
//! let parsed = service.fetch_one(&crm_id).await?;
//! ```

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument};

use core_kernel::{ExternalId, HealthCheckResult};
use domain_mapping::{CrmFieldMap, CrmRecord, ParsedRecord, PortalInput, RecordTranslator};

use crate::client::CrmClient;
use crate::config::SyncSettings;
use crate::error::SyncError;
use crate::ports::{Criteria, EntityResponse, ResponseStatus, Trigger};

/// CRM field every written record is assigned to
pub const TERRITORY_FIELD: &str = "Territory";

const FIRST_PAGE: u32 = 1;

/// Synchronizes records of one entity type with its CRM module
#[derive(Clone)]
pub struct RecordSyncService {
    client: Arc<CrmClient>,
    translator: RecordTranslator,
    settings: SyncSettings,
}

impl RecordSyncService {
    pub fn new(client: Arc<CrmClient>, translator: RecordTranslator, settings: SyncSettings) -> Self {
        Self {
            client,
            translator,
            settings,
        }
    }

    pub fn module(&self) -> &str {
        self.translator.spec().module()
    }

    pub fn translator(&self) -> &RecordTranslator {
        &self.translator
    }

    /// Creates the record in the CRM and returns its new identifier
    #[instrument(skip(self, input), fields(module = %self.module()))]
    pub async fn create(&self, input: &PortalInput, with_workflow: bool) -> Result<ExternalId, SyncError> {
        const OPERATION: &str = "create";

        self.initialize().await?;
        let fields = self.prepare(OPERATION, input).await?;

        let responses = self
            .client
            .port()
            .create_records(self.module(), vec![fields], triggers(with_workflow))
            .await
            .map_err(|e| self.failed(OPERATION, SyncError::request(self.module(), OPERATION, e)))?;

        let id = self.accept(OPERATION, responses)?;
        info!(crm_id = %id, "Record created in CRM");
        Ok(id)
    }

    /// Updates the CRM record the input is linked to
    ///
    /// Only the fields the input determines are sent; the rest of the CRM
    /// record is left as is.
    #[instrument(skip(self, input), fields(module = %self.module()))]
    pub async fn update(&self, input: &PortalInput, with_workflow: bool) -> Result<ExternalId, SyncError> {
        const OPERATION: &str = "update";

        let id = input.external_id().ok_or_else(|| {
            self.failed(
                OPERATION,
                SyncError::MissingExternalIdentifier {
                    module: self.module().to_string(),
                },
            )
        })?;

        self.initialize().await?;
        let fields = self.prepare(OPERATION, input).await?;
        let record = CrmRecord {
            id: id.clone(),
            data: fields,
        };

        let responses = self
            .client
            .port()
            .update_records(self.module(), vec![record], triggers(with_workflow))
            .await
            .map_err(|e| {
                let message = format!("record {}: {}", id, e);
                self.failed(OPERATION, SyncError::request(self.module(), OPERATION, message))
            })?;

        let updated = self.accept(OPERATION, responses)?;
        info!(crm_id = %updated, "Record updated in CRM");
        Ok(updated)
    }

    /// Fetches one CRM record in portal shape
    #[instrument(skip(self), fields(module = %self.module()))]
    pub async fn fetch_one(&self, id: &ExternalId) -> Result<ParsedRecord, SyncError> {
        const OPERATION: &str = "get";

        self.initialize().await?;
        let record = self
            .client
            .port()
            .get_record(self.module(), id)
            .await
            .map_err(|e| {
                let message = format!("record {}: {}", id, e);
                self.failed(OPERATION, SyncError::request(self.module(), OPERATION, message))
            })?;

        self.translator
            .crm_to_portal(&record)
            .await
            .map_err(|e| self.failed(OPERATION, e.into()))
    }

    /// Fetches the first page of the module's records, in CRM order
    #[instrument(skip(self), fields(module = %self.module()))]
    pub async fn fetch_all(&self) -> Result<Vec<ParsedRecord>, SyncError> {
        const OPERATION: &str = "list";

        self.initialize().await?;
        let records = self
            .client
            .port()
            .get_records(self.module(), FIRST_PAGE, self.settings.page_size)
            .await
            .map_err(|e| self.failed(OPERATION, SyncError::request(self.module(), OPERATION, e)))?;

        self.translate_all(OPERATION, &records).await
    }

    /// Fetches the records whose `parent_field` points at `parent_id`
    #[instrument(skip(self), fields(module = %self.module()))]
    pub async fn search(
        &self,
        parent_field: &str,
        parent_id: &ExternalId,
    ) -> Result<Vec<ParsedRecord>, SyncError> {
        const OPERATION: &str = "search";

        self.initialize().await?;
        let criteria = Criteria::equals(parent_field, parent_id);
        let records = self
            .client
            .port()
            .search_records_by_criteria(self.module(), &criteria, FIRST_PAGE, self.settings.page_size)
            .await
            .map_err(|e| self.failed(OPERATION, SyncError::request(self.module(), OPERATION, e)))?;

        self.translate_all(OPERATION, &records).await
    }

    pub async fn health_check(&self) -> HealthCheckResult {
        self.client.health_check().await
    }

    async fn initialize(&self) -> Result<(), SyncError> {
        const OPERATION: &str = "initialize";

        self.client
            .ensure_initialized()
            .await
            .map_err(|e| self.failed(OPERATION, SyncError::request(self.module(), OPERATION, e)))
    }

    async fn prepare(&self, operation: &str, input: &PortalInput) -> Result<CrmFieldMap, SyncError> {
        let mut fields = self
            .translator
            .portal_to_crm(input)
            .await
            .map_err(|e| self.failed(operation, e.into()))?;

        fields.insert(
            TERRITORY_FIELD.to_string(),
            Value::String(self.settings.territory.clone()),
        );
        fields.values_mut().for_each(normalize_boolean);
        Ok(fields)
    }

    async fn translate_all(
        &self,
        operation: &str,
        records: &[CrmRecord],
    ) -> Result<Vec<ParsedRecord>, SyncError> {
        let mut parsed = Vec::with_capacity(records.len());
        for record in records {
            let translated = self
                .translator
                .crm_to_portal(record)
                .await
                .map_err(|e| self.failed(operation, e.into()))?;
            parsed.push(translated);
        }
        Ok(parsed)
    }

    /// Reads the first entity response of a write
    fn accept(&self, operation: &str, responses: Vec<EntityResponse>) -> Result<ExternalId, SyncError> {
        let Some(response) = responses.into_iter().next() else {
            return Err(self.failed(operation, SyncError::empty_response(self.module(), operation)));
        };

        match response.status {
            ResponseStatus::Success => response.id.ok_or_else(|| {
                self.failed(operation, SyncError::empty_response(self.module(), operation))
            }),
            ResponseStatus::Error => Err(self.failed(
                operation,
                SyncError::rejected(self.module(), operation, response.message, response.details),
            )),
        }
    }

    fn failed(&self, operation: &str, error: SyncError) -> SyncError {
        debug!(module = self.module(), operation, error = %error, "CRM sync operation failed");
        error
    }
}

fn triggers(with_workflow: bool) -> &'static [Trigger] {
    if with_workflow {
        &[Trigger::Workflow]
    } else {
        &[]
    }
}

/// Turns the exact strings `"true"` and `"false"` into booleans
fn normalize_boolean(value: &mut Value) {
    let normalized = match value.as_str() {
        Some("true") => Value::Bool(true),
        Some("false") => Value::Bool(false),
        _ => return,
    };
    *value = normalized;
}
