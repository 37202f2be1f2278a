//! Turnover backend - integration test support.
//!
//! Re-exports the workspace crates under one path for the tests in
//! `tests/integration`.

pub use turnover_app::app;

pub mod component {
    pub use turnover_core::{config, constants, util};
    pub use turnover_rfc::ical;
    pub use turnover_service::{assignment, catalog, error, feed, payment, sync};

    pub mod db {
        pub use turnover_db::db::*;
        pub use turnover_db::error::DbError;
    }

    pub mod model {
        pub use turnover_db::model::*;
    }

    pub mod handler {
        pub use turnover_app::config::ConfigHandler;
        pub use turnover_app::db_handler::DbProviderHandler;
        pub use turnover_app::sync_handler::SyncEngineHandler;
    }
}
