//! Shared CRM client handle
//!
//! One [`CrmClient`] is built at startup and handed to every
//! [`RecordSyncService`](crate::RecordSyncService) through an `Arc`. The
//! underlying port is initialised lazily, at most once per process: the
//! first operation pays for it, later ones skip it. A failed initialisation
//! is not remembered, so the next operation tries again.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use core_kernel::{HealthCheckResult, PortError};

use crate::ports::CrmRecordPort;

pub struct CrmClient {
    port: Arc<dyn CrmRecordPort>,
    initialized: OnceCell<()>,
}

impl CrmClient {
    pub fn new(port: Arc<dyn CrmRecordPort>) -> Self {
        Self {
            port,
            initialized: OnceCell::new(),
        }
    }

    /// Runs the port's initialisation unless it already succeeded
    pub async fn ensure_initialized(&self) -> Result<(), PortError> {
        self.initialized
            .get_or_try_init(|| async {
                self.port.initialize().await?;
                info!("CRM client initialized");
                Ok::<(), PortError>(())
            })
            .await?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    pub fn port(&self) -> &dyn CrmRecordPort {
        self.port.as_ref()
    }

    pub async fn health_check(&self) -> HealthCheckResult {
        self.port.health_check().await
    }
}

impl std::fmt::Debug for CrmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrmClient")
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::MockCrmPort;

    #[tokio::test]
    async fn test_initializes_once() {
        let port = Arc::new(MockCrmPort::new());
        let client = CrmClient::new(port.clone());

        client.ensure_initialized().await.unwrap();
        client.ensure_initialized().await.unwrap();

        assert!(client.is_initialized());
        assert_eq!(port.initialize_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_initialization_is_retried() {
        let port = Arc::new(MockCrmPort::new());
        port.fail_initialization(1);
        let client = CrmClient::new(port.clone());

        let err = client.ensure_initialized().await.unwrap_err();
        assert!(matches!(err, PortError::Unauthorized { .. }));
        assert!(!client.is_initialized());

        client.ensure_initialized().await.unwrap();
        assert_eq!(port.initialize_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_initialization() {
        let port = Arc::new(MockCrmPort::new());
        let client = Arc::new(CrmClient::new(port.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move { client.ensure_initialized().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(port.initialize_count(), 1);
    }
}
