// Library surface shared by the binary and the integration tests.
// The terminal front end lives in main.rs/ui.rs.
pub mod app_dirs;
pub mod corpus;
pub mod history;
pub mod metrics;
pub mod preferences;
pub mod result;
pub mod router;
pub mod runtime;
pub mod session;
pub mod variant;
