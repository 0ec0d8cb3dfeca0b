//! CLI command implementations

pub mod review;
pub mod secrets;

pub use review::ReviewArgs;
pub use secrets::SecretsArgs;
