use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::{CredentialsConfig, DeliveryMethod};
use crate::credentials::ENV_KEYS;
use crate::error::CredentialError;
use crate::vault::VaultClient;

/// Where raw credential key/value pairs are read from.
pub enum CredentialSource {
    Env,
    KeyValueFile(PathBuf),
    SecretDir(PathBuf),
    Vault {
        client: Box<VaultClient>,
        ldap_mount: String,
        role: String,
    },
}

impl CredentialSource {
    pub fn from_config(config: &CredentialsConfig) -> Result<Self, CredentialError> {
        Ok(match config.method {
            DeliveryMethod::VaultSecretsOperator => Self::Env,
            DeliveryMethod::VaultAgentSidecar => {
                Self::KeyValueFile(config.agent_creds_file.clone())
            },
            DeliveryMethod::VaultCsiDriver => Self::SecretDir(config.csi_secrets_dir.clone()),
            DeliveryMethod::VaultDirect => Self::Vault {
                client: Box::new(VaultClient::new(
                    &config.vault_addr,
                    &config.auth_role,
                    Some(&config.auth_mount),
                )?),
                ldap_mount: config.ldap_mount.clone(),
                role: config.static_role.clone(),
            },
        })
    }

    pub fn method(&self) -> DeliveryMethod {
        match self {
            Self::Env => DeliveryMethod::VaultSecretsOperator,
            Self::KeyValueFile(_) => DeliveryMethod::VaultAgentSidecar,
            Self::SecretDir(_) => DeliveryMethod::VaultCsiDriver,
            Self::Vault { .. } => DeliveryMethod::VaultDirect,
        }
    }

    /// Read the current key/value pairs. File based sources return an empty
    /// map while their file or directory does not exist yet.
    pub async fn fetch(&mut self) -> Result<HashMap<String, String>, CredentialError> {
        match self {
            Self::Env => Ok(read_env()),
            Self::KeyValueFile(path) => read_key_value_file(path),
            Self::SecretDir(path) => read_secret_dir(path),
            Self::Vault {
                client,
                ldap_mount,
                role,
            } => client.read_static_creds(ldap_mount, role).await,
        }
    }
}

fn read_env() -> HashMap<String, String> {
    ENV_KEYS
        .iter()
        .filter_map(|k| std::env::var(k).ok().map(|v| (k.to_string(), v)))
        .collect()
}

/// Parse `KEY=value` lines. Blank lines, `#` comments and lines without `=`
/// are skipped; keys and values are trimmed.
pub fn parse_key_value(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

pub fn read_key_value_file(path: &Path) -> Result<HashMap<String, String>, CredentialError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(parse_key_value(&content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Credentials file not present yet");
            Ok(HashMap::new())
        },
        Err(source) => Err(CredentialError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Read a directory with one file per key: file name is the key, trimmed
/// content the value. Subdirectories and dot files are ignored.
pub fn read_secret_dir(dir: &Path) -> Result<HashMap<String, String>, CredentialError> {
    let io_err = |source| CredentialError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "Secrets directory not present yet");
            return Ok(HashMap::new());
        },
        Err(e) => return Err(io_err(e)),
    };

    let mut values = HashMap::new();
    for entry in entries {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        // CSI mounts expose keys through symlinks; follow them.
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let content = std::fs::read_to_string(&path).map_err(|source| CredentialError::Io {
            path: path.clone(),
            source,
        })?;
        values.insert(name.to_string(), content.trim().to_string());
    }
    Ok(values)
}
