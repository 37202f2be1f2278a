use std::sync::Arc;

use salvo::async_trait;
use turnover_core::error::CoreError;
use turnover_service::sync::SyncEngine;

use crate::error::AppResult;

/// Shares one [`SyncEngine`] with every request so the listing locks are
/// process-wide.
pub struct SyncEngineHandler {
    pub engine: Arc<SyncEngine>,
}

#[async_trait]
impl salvo::Handler for SyncEngineHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(Arc::clone(&self.engine));
    }
}

/// ## Summary
/// Retrieves the sync engine from the depot.
///
/// ## Errors
/// Returns an error if the engine is not found in the depot.
pub fn get_sync_engine_from_depot(depot: &salvo::Depot) -> AppResult<Arc<SyncEngine>> {
    depot
        .obtain::<Arc<SyncEngine>>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Sync engine not found in depot").into())
}
