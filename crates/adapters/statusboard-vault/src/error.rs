use std::path::PathBuf;

#[derive(Debug)]
pub enum CredentialError {
    /// Unrecognised `SECRET_DELIVERY_METHOD` value.
    UnknownMethod(String),
    Io { path: PathBuf, source: std::io::Error },
    /// No service account token available for Kubernetes auth.
    MissingServiceAccountToken(PathBuf),
    Http(reqwest::Error),
    /// Vault answered with a non-success status.
    Vault { status: u16, path: String },
    /// Vault answered 2xx but the body lacked an expected field.
    MalformedResponse(String),
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownMethod(m) => write!(f, "unknown secret delivery method: {m}"),
            Self::Io { path, source } => write!(f, "failed to read {}: {source}", path.display()),
            Self::MissingServiceAccountToken(path) => {
                write!(f, "service account token not found at {}", path.display())
            },
            Self::Http(e) => write!(f, "vault request failed: {e}"),
            Self::Vault { status, path } => write!(f, "vault returned {status} for {path}"),
            Self::MalformedResponse(m) => write!(f, "unexpected vault response: {m}"),
        }
    }
}

impl std::error::Error for CredentialError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CredentialError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}
