pub mod assignment;
pub mod catalog;
pub mod derive;
pub mod error;
pub mod feed;
pub mod fingerprint;
pub mod notify;
pub mod password;
pub mod payment;
pub mod reconcile;
pub mod sync;
