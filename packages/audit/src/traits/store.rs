//! Audit history store trait.

use async_trait::async_trait;

use super::ServiceError;
use crate::types::AuditRecord;

/// Append-only audit history.
///
/// Persistence is best-effort from the pipeline's point of view: a failed
/// `save` is logged and never fails the audit response. The read side
/// backs the retrieval endpoints.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn save(&self, record: &AuditRecord) -> Result<(), ServiceError>;

    async fn get(&self, id: &str) -> Result<Option<AuditRecord>, ServiceError>;

    /// Most recent first, scoped to one user.
    async fn list(
        &self,
        user_id: &str,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<AuditRecord>, ServiceError>;
}
