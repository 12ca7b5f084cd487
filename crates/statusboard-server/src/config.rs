use std::path::{Path, PathBuf};

use serde::Deserialize;

use statusboard_core::events::default_agents;

/// Default config file, overridable with `STATUSBOARD_CONFIG`.
pub const DEFAULT_CONFIG_PATH: &str = "statusboard.toml";

/// Top-level server configuration, loaded from `statusboard.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub web_root: String,
    /// Append-only CSV status log.
    pub log_path: PathBuf,
    /// Agents reported on by the dashboard, in display order.
    pub agents: Vec<String>,
    /// Write an initial status row for every agent when the log is empty.
    pub seed_on_empty: bool,
    pub limits: LimitsConfig,
    pub credentials: Option<CredentialsFileConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5050".to_string(),
            web_root: "web".to_string(),
            log_path: PathBuf::from("agent_status.csv"),
            agents: default_agents(),
            seed_on_empty: true,
            limits: LimitsConfig::default(),
            credentials: None,
        }
    }
}

/// Response sizes, fan-out capacity and input bounds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Raw log rows returned by `/api/status`.
    pub recent_log_rows: usize,
    pub broadcast_capacity: usize,
    pub max_sse_subscribers: usize,
    /// Maximum byte length of an agent name or status label.
    pub max_field_len: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            recent_log_rows: 100,
            broadcast_capacity: 1024,
            max_sse_subscribers: 100,
            max_field_len: 128,
        }
    }
}

/// `[credentials]` section: how the credential demo obtains its secrets.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CredentialsFileConfig {
    /// One of `vault-secrets-operator`, `vault-agent-sidecar`,
    /// `vault-csi-driver`, `vault-direct`.
    pub method: String,
    pub agent_creds_file: PathBuf,
    pub csi_secrets_dir: PathBuf,
    pub vault_addr: String,
    pub auth_role: String,
    pub auth_mount: String,
    pub ldap_mount: String,
    pub static_role: String,
    pub refresh_interval_secs: u64,
}

impl Default for CredentialsFileConfig {
    fn default() -> Self {
        Self {
            method: "vault-secrets-operator".to_string(),
            agent_creds_file: PathBuf::from("/vault/secrets/ldap-creds"),
            csi_secrets_dir: PathBuf::from("/mnt/secrets-store"),
            vault_addr: "http://vault:8200".to_string(),
            auth_role: "ldap-app".to_string(),
            auth_mount: "kubernetes".to_string(),
            ldap_mount: "ldap".to_string(),
            static_role: "ldap-static".to_string(),
            refresh_interval_secs: 5,
        }
    }
}

#[cfg(feature = "credentials")]
impl CredentialsFileConfig {
    pub fn to_adapter_config(
        &self,
    ) -> Result<statusboard_vault::CredentialsConfig, statusboard_vault::CredentialError> {
        Ok(statusboard_vault::CredentialsConfig {
            method: self.method.parse()?,
            agent_creds_file: self.agent_creds_file.clone(),
            csi_secrets_dir: self.csi_secrets_dir.clone(),
            vault_addr: self.vault_addr.clone(),
            auth_role: self.auth_role.clone(),
            auth_mount: self.auth_mount.clone(),
            ldap_mount: self.ldap_mount.clone(),
            static_role: self.static_role.clone(),
            refresh_interval_secs: self.refresh_interval_secs,
        })
    }
}

impl ServerConfig {
    /// Check the configuration, logging warnings for suspicious values.
    /// Returns an error describing the first fatal problem.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(format!(
                "listen_addr {:?} is not a valid socket address",
                self.listen_addr
            ));
        }
        if self.agents.is_empty() {
            return Err("agents must list at least one agent".to_string());
        }
        if self.agents.iter().any(|a| a.trim().is_empty()) {
            return Err("agents must not contain empty names".to_string());
        }
        let mut sorted = self.agents.clone();
        sorted.sort();
        sorted.dedup();
        if sorted.len() != self.agents.len() {
            tracing::warn!("agents contains duplicate names; duplicates are reported once");
        }

        if self.limits.recent_log_rows == 0 {
            tracing::warn!("limits.recent_log_rows is 0; /api/status will return no log rows");
        }
        if self.limits.broadcast_capacity == 0 {
            return Err("limits.broadcast_capacity must be > 0".to_string());
        }
        if self.limits.max_sse_subscribers == 0 {
            return Err("limits.max_sse_subscribers must be > 0".to_string());
        }
        if self.limits.max_field_len == 0 {
            return Err("limits.max_field_len must be > 0".to_string());
        }

        if let Some(ref creds) = self.credentials {
            if creds.refresh_interval_secs == 0 {
                return Err("credentials.refresh_interval_secs must be > 0".to_string());
            }
            #[cfg(feature = "credentials")]
            if let Err(e) = creds.method.parse::<statusboard_vault::DeliveryMethod>() {
                return Err(format!("credentials.method: {e}"));
            }
            #[cfg(not(feature = "credentials"))]
            tracing::warn!("[credentials] is configured but the credentials feature is disabled");
        }

        Ok(())
    }

    /// Load config from `STATUSBOARD_CONFIG` (or `statusboard.toml`) if it
    /// exists, then apply environment overrides.
    pub fn load() -> Self {
        let path = std::env::var("STATUSBOARD_CONFIG")
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load_file(Path::new(&path));
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Parse a config file, falling back to defaults if it is missing or
    /// invalid.
    pub fn load_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!(path = %path.display(), "Loaded configuration");
                    cfg
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Failed to parse config: {e}, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "No config file found, using defaults");
                ServerConfig::default()
            },
        }
    }

    /// Apply overrides from an environment lookup. Empty values are ignored.
    pub fn apply_env_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| env(key).filter(|v| !v.is_empty());

        if let Some(addr) = var("STATUSBOARD_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(root) = var("STATUSBOARD_WEB_ROOT") {
            self.web_root = root;
        }
        if let Some(path) = var("STATUSBOARD_LOG_PATH") {
            self.log_path = PathBuf::from(path);
        }
        if let Some(list) = var("STATUSBOARD_AGENTS") {
            let agents: Vec<String> = list
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect();
            if !agents.is_empty() {
                self.agents = agents;
            }
        }
        if let Some(val) = var("STATUSBOARD_RECENT_ROWS")
            && let Ok(n) = val.parse::<usize>()
        {
            self.limits.recent_log_rows = n;
        }
        if let Some(val) = var("STATUSBOARD_MAX_SSE_SUBSCRIBERS")
            && let Ok(n) = val.parse::<usize>()
        {
            self.limits.max_sse_subscribers = n;
        }

        // Credential delivery follows the deployment manifests' variable names.
        if let Some(method) = var("SECRET_DELIVERY_METHOD") {
            self.credentials.get_or_insert_with(Default::default).method = method;
        }
        if let Some(creds) = self.credentials.as_mut() {
            if let Some(path) = var("VAULT_AGENT_CREDS_FILE") {
                creds.agent_creds_file = PathBuf::from(path);
            }
            if let Some(dir) = var("VAULT_CSI_SECRETS_DIR") {
                creds.csi_secrets_dir = PathBuf::from(dir);
            }
            if let Some(addr) = var("VAULT_ADDR") {
                creds.vault_addr = addr;
            }
            if let Some(role) = var("VAULT_AUTH_ROLE") {
                creds.auth_role = role;
            }
            if let Some(mount) = var("VAULT_AUTH_MOUNT") {
                creds.auth_mount = mount;
            }
            if let Some(mount) = var("VAULT_LDAP_MOUNT") {
                creds.ldap_mount = mount;
            }
            if let Some(role) = var("VAULT_LDAP_ROLE") {
                creds.static_role = role;
            }
        }
    }
}
