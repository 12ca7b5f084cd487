use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::CredentialError;

/// Where Kubernetes mounts the pod's service account JWT.
pub const DEFAULT_SA_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Minimal Vault HTTP client: Kubernetes auth plus LDAP static-role reads.
pub struct VaultClient {
    vault_addr: String,
    auth_role: String,
    auth_mount: String,
    sa_token_path: PathBuf,
    client: reqwest::Client,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    auth: Option<LoginAuth>,
}

#[derive(Debug, Deserialize)]
struct LoginAuth {
    client_token: String,
}

#[derive(Debug, Deserialize)]
struct SecretResponse {
    data: Option<HashMap<String, serde_json::Value>>,
}

impl VaultClient {
    pub fn new(
        vault_addr: &str,
        auth_role: &str,
        auth_mount: Option<&str>,
    ) -> Result<Self, CredentialError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("statusboard-vault/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            vault_addr: vault_addr.trim_end_matches('/').to_string(),
            auth_role: auth_role.to_string(),
            auth_mount: auth_mount.unwrap_or("kubernetes").to_string(),
            sa_token_path: PathBuf::from(DEFAULT_SA_TOKEN_PATH),
            client,
            token: None,
        })
    }

    pub fn with_sa_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sa_token_path = path.into();
        self
    }

    pub fn vault_addr(&self) -> &str {
        &self.vault_addr
    }

    pub fn auth_role(&self) -> &str {
        &self.auth_role
    }

    pub fn auth_mount(&self) -> &str {
        &self.auth_mount
    }

    pub fn sa_token_path(&self) -> &Path {
        &self.sa_token_path
    }

    /// Read the service account JWT. `None` if the file is missing or empty.
    pub fn read_sa_token(&self) -> Option<String> {
        let raw = std::fs::read_to_string(&self.sa_token_path).ok()?;
        let token = raw.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    /// Log in with the Kubernetes auth method and keep the client token.
    pub async fn login(&mut self) -> Result<(), CredentialError> {
        let jwt = self
            .read_sa_token()
            .ok_or_else(|| CredentialError::MissingServiceAccountToken(self.sa_token_path.clone()))?;

        let path = format!("auth/{}/login", self.auth_mount);
        let resp = self
            .client
            .post(format!("{}/v1/{path}", self.vault_addr))
            .json(&serde_json::json!({ "role": self.auth_role, "jwt": jwt }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(CredentialError::Vault {
                status: resp.status().as_u16(),
                path,
            });
        }

        let body: LoginResponse = resp.json().await?;
        let auth = body
            .auth
            .ok_or_else(|| CredentialError::MalformedResponse("login without auth block".into()))?;
        self.token = Some(auth.client_token);
        tracing::info!(role = %self.auth_role, mount = %self.auth_mount, "Logged in to Vault");
        Ok(())
    }

    /// Read the current credentials of an LDAP static role.
    ///
    /// Logs in first if there is no token. A 403 drops the token so the next
    /// call logs in again.
    pub async fn read_static_creds(
        &mut self,
        ldap_mount: &str,
        role: &str,
    ) -> Result<HashMap<String, String>, CredentialError> {
        if self.token.is_none() {
            self.login().await?;
        }
        let token = self.token.clone().unwrap_or_default();

        let path = format!("{ldap_mount}/static-cred/{role}");
        let resp = self
            .client
            .get(format!("{}/v1/{path}", self.vault_addr))
            .header("X-Vault-Token", token)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            self.token = None;
        }
        if !status.is_success() {
            return Err(CredentialError::Vault {
                status: status.as_u16(),
                path,
            });
        }

        let body: SecretResponse = resp.json().await?;
        let data = body
            .data
            .ok_or_else(|| CredentialError::MalformedResponse(format!("{path} has no data")))?;
        Ok(flatten_values(data))
    }
}

/// Vault returns mixed JSON scalars (`ttl` is a number); the cache stores
/// strings.
fn flatten_values(data: HashMap<String, serde_json::Value>) -> HashMap<String, String> {
    data.into_iter()
        .filter_map(|(k, v)| match v {
            serde_json::Value::String(s) => Some((k, s)),
            serde_json::Value::Number(n) => Some((k, n.to_string())),
            serde_json::Value::Bool(b) => Some((k, b.to_string())),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_client_init() {
        let client =
            VaultClient::new("http://vault.local:8200", "test-role", Some("kubernetes")).unwrap();
        assert_eq!(client.vault_addr(), "http://vault.local:8200");
        assert_eq!(client.auth_role(), "test-role");
        assert_eq!(client.auth_mount(), "kubernetes");
    }

    #[test]
    fn strips_trailing_slash() {
        let client = VaultClient::new("http://vault.local:8200/", "test-role", None).unwrap();
        assert_eq!(client.vault_addr(), "http://vault.local:8200");
        assert_eq!(client.auth_mount(), "kubernetes");
    }

    #[test]
    fn read_sa_token_missing_file() {
        let client = VaultClient::new("http://vault:8200", "test", None)
            .unwrap()
            .with_sa_token_path("/nonexistent/token");
        assert!(client.read_sa_token().is_none());
    }

    #[test]
    fn read_sa_token_trims() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "my-jwt-token-here\n").unwrap();

        let client = VaultClient::new("http://vault:8200", "test", None)
            .unwrap()
            .with_sa_token_path(&path);
        assert_eq!(client.read_sa_token().as_deref(), Some("my-jwt-token-here"));
    }

    #[tokio::test]
    async fn login_without_token_fails_before_network() {
        let mut client = VaultClient::new("http://127.0.0.1:1", "test", None)
            .unwrap()
            .with_sa_token_path("/nonexistent/token");
        let err = client.login().await.unwrap_err();
        assert!(matches!(err, CredentialError::MissingServiceAccountToken(_)));
    }

    #[test]
    fn flatten_keeps_scalars() {
        let mut data = HashMap::new();
        data.insert("username".to_string(), serde_json::json!("svc"));
        data.insert("ttl".to_string(), serde_json::json!(42));
        data.insert("nested".to_string(), serde_json::json!({ "a": 1 }));
        let flat = flatten_values(data);
        assert_eq!(flat["username"], "svc");
        assert_eq!(flat["ttl"], "42");
        assert!(!flat.contains_key("nested"));
    }
}
