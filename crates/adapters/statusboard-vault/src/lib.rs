pub mod cache;
pub mod config;
pub mod credentials;
pub mod error;
pub mod source;
pub mod vault;

pub use cache::CredentialCache;
pub use config::{CredentialsConfig, DeliveryMethod};
pub use credentials::Credentials;
pub use error::CredentialError;
pub use source::CredentialSource;
pub use vault::VaultClient;
