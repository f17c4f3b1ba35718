pub mod auth;
pub mod secrets;

pub use auth::AuthManager;
pub use secrets::SecretStore;
pub use secrets::SecretUpdate;
