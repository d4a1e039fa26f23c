//! Rule repository trait.

use async_trait::async_trait;

use super::ServiceError;
use crate::types::RulePack;

/// Read-only source of regulatory rules.
///
/// Implementations load lazily and cache; the pipeline calls this on
/// every audit and expects repeat lookups to be cheap.
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Rules for one jurisdiction and industry. The pack is ordered:
    /// common rules first, then category rules, file order preserved.
    async fn load(
        &self,
        country: &str,
        region: Option<&str>,
        category: &str,
    ) -> Result<RulePack, ServiceError>;
}
