// === PUBLIC CONTRACT ===
// Only the contract module should be public for other modules to consume
pub mod contract;

pub use contract::{client, error, model};

// === MODULE DEFINITION ===
pub mod config;
pub mod module;
pub use config::UserDirectoryConfig;
pub use module::UserDirectoryModule;

// === INTERNAL MODULES ===
// Exposed only for integration tests; not a stable API.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
