use salvo::Router;
use turnover_core::constants::APP_ROUTE_COMPONENT;

mod assignments;
mod cleaners;
mod events;
mod extra_hours;
mod feeds;
mod healthcheck;
mod listings;
mod notifications;
mod payment_reports;
mod reply;
mod sync;


#[must_use]
pub fn routes() -> Router {
    Router::with_path(APP_ROUTE_COMPONENT)
        .push(healthcheck::routes())
        .push(listings::routes())
        .push(feeds::routes())
        .push(sync::routes())
        .push(events::routes())
        .push(assignments::routes())
        .push(cleaners::routes())
        .push(extra_hours::routes())
        .push(payment_reports::routes())
        .push(notifications::routes())
}
