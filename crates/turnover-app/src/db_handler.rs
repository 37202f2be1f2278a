//! Database pool plumbing for request handlers.

use std::sync::Arc;

use salvo::async_trait;
use turnover_core::error::CoreError;
use turnover_db::db::DbProvider;

use crate::error::AppResult;

/// The provider as stored in the depot.
pub type SharedDb = Arc<dyn DbProvider + Send + Sync>;

/// Makes `provider` available to every handler below it.
pub struct DbProviderHandler<T: DbProvider + Send + Sync + Clone> {
    pub provider: T,
}

#[async_trait]
impl<T: DbProvider + Send + Sync + Clone + 'static> salvo::Handler for DbProviderHandler<T> {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject::<SharedDb>(Arc::new(self.provider.clone()));
    }
}

/// ## Summary
/// Returns the provider injected by [`DbProviderHandler`].
///
/// ## Errors
/// Returns an invariant violation, reported as HTTP 500, when the route was
/// mounted without the handler.
pub fn get_db_from_depot(depot: &salvo::Depot) -> AppResult<SharedDb> {
    depot.obtain::<SharedDb>().cloned().map_err(|_err| {
        tracing::error!("No database provider in depot");
        CoreError::InvariantViolation("Database provider not found in depot").into()
    })
}
