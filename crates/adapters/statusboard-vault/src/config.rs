use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CredentialError;

/// How rotated credentials reach the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryMethod {
    /// Synced into a Kubernetes secret and injected as environment variables.
    #[default]
    VaultSecretsOperator,
    /// Rendered by a Vault Agent sidecar into a `KEY=value` file.
    VaultAgentSidecar,
    /// Mounted by the Secrets Store CSI driver, one file per key.
    VaultCsiDriver,
    /// Read straight from the Vault HTTP API.
    VaultDirect,
}

impl DeliveryMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VaultSecretsOperator => "vault-secrets-operator",
            Self::VaultAgentSidecar => "vault-agent-sidecar",
            Self::VaultCsiDriver => "vault-csi-driver",
            Self::VaultDirect => "vault-direct",
        }
    }

    /// Human readable name shown next to the credentials.
    pub fn label(self) -> &'static str {
        match self {
            Self::VaultSecretsOperator => "Vault Secrets Operator",
            Self::VaultAgentSidecar => "Vault Agent Sidecar",
            Self::VaultCsiDriver => "Vault CSI Driver",
            Self::VaultDirect => "Vault API",
        }
    }
}

impl FromStr for DeliveryMethod {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "vault-secrets-operator" | "vso" => Ok(Self::VaultSecretsOperator),
            "vault-agent-sidecar" | "agent" => Ok(Self::VaultAgentSidecar),
            "vault-csi-driver" | "csi" => Ok(Self::VaultCsiDriver),
            "vault-direct" | "direct" => Ok(Self::VaultDirect),
            other => Err(CredentialError::UnknownMethod(other.to_string())),
        }
    }
}

/// Configuration for a credential source and its refresher.
#[derive(Debug, Clone)]
pub struct CredentialsConfig {
    pub method: DeliveryMethod,
    /// `KEY=value` file written by the agent sidecar.
    pub agent_creds_file: PathBuf,
    /// Directory populated by the CSI driver.
    pub csi_secrets_dir: PathBuf,
    pub vault_addr: String,
    /// Kubernetes auth role used to log in to Vault.
    pub auth_role: String,
    pub auth_mount: String,
    /// Mount of the LDAP secrets engine.
    pub ldap_mount: String,
    /// LDAP static role whose credentials are displayed.
    pub static_role: String,
    pub refresh_interval_secs: u64,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            method: DeliveryMethod::default(),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_method_names() {
        assert_eq!(
            "vault-agent-sidecar".parse::<DeliveryMethod>().unwrap(),
            DeliveryMethod::VaultAgentSidecar
        );
        assert_eq!(
            " vault-csi-driver ".parse::<DeliveryMethod>().unwrap(),
            DeliveryMethod::VaultCsiDriver
        );
        assert!(matches!(
            "carrier-pigeon".parse::<DeliveryMethod>(),
            Err(CredentialError::UnknownMethod(m)) if m == "carrier-pigeon"
        ));
    }

    #[test]
    fn as_str_round_trips() {
        for m in [
            DeliveryMethod::VaultSecretsOperator,
            DeliveryMethod::VaultAgentSidecar,
            DeliveryMethod::VaultCsiDriver,
            DeliveryMethod::VaultDirect,
        ] {
            assert_eq!(m.as_str().parse::<DeliveryMethod>().unwrap(), m);
        }
    }

    #[test]
    fn labels() {
        assert_eq!(
            DeliveryMethod::VaultSecretsOperator.label(),
            "Vault Secrets Operator"
        );
        assert_eq!(DeliveryMethod::VaultCsiDriver.label(), "Vault CSI Driver");
    }

    #[test]
    fn serialized_name_matches_parsed_name() {
        for m in [
            DeliveryMethod::VaultSecretsOperator,
            DeliveryMethod::VaultAgentSidecar,
            DeliveryMethod::VaultCsiDriver,
            DeliveryMethod::VaultDirect,
        ] {
            let json = serde_json::to_value(m).unwrap();
            assert_eq!(json, m.as_str());
            assert_eq!(json.as_str().unwrap().parse::<DeliveryMethod>().unwrap(), m);
        }
    }
}
