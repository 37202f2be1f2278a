use salvo::prelude::Text;
use salvo::{Response, Router, handler};

/// GET /app/healthcheck - liveness only; the database is not touched.
#[handler]
async fn liveness(res: &mut Response) {
    res.render(Text::Plain("OK"));
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("healthcheck").get(liveness)
}
