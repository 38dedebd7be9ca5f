use async_trait::async_trait;
use error_common::CapabilityResult;

use crate::model::NounRecord;

/// Operations of the noun capability.
///
/// Callers code against this trait only; whether the implementation runs
/// in-process ([`NounServiceImpl`](crate::NounServiceImpl)) or behind a
/// transport ([`NounServiceProxy`](crate::NounServiceProxy)) is decided at
/// bootstrap. Every call yields exactly one result.
#[async_trait]
pub trait NounService: Send + Sync {
    /// Fetch a noun from the backend
    async fn get(&self) -> CapabilityResult<NounRecord>;

    /// Store a noun
    async fn save(&self, record: NounRecord) -> CapabilityResult<NounRecord>;

    /// Whether the backend is reachable
    async fn health_check(&self) -> CapabilityResult<bool>;
}
