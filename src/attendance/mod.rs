pub mod error;
pub mod ingest;
pub mod notify;
pub mod policy;
pub mod reconcile;
pub mod sessions;
pub mod state;
pub mod status;
pub mod store;
