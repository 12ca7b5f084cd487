use std::collections::HashMap;

use serde::Serialize;

use crate::config::DeliveryMethod;

/// Shown in place of any credential field the source did not provide.
pub const NOT_CONFIGURED: &str = "Not configured";

const DEFAULT_ROTATION_PERIOD: u64 = 30;

const USERNAME_KEYS: &[&str] = &["LDAP_USERNAME", "username"];
const PASSWORD_KEYS: &[&str] = &["LDAP_PASSWORD", "password"];
const LAST_PASSWORD_KEYS: &[&str] = &[
    "LDAP_LAST_VAULT_PASSWORD",
    "last_vault_password",
    "last_password",
];
const ROTATION_PERIOD_KEYS: &[&str] = &["ROTATION_PERIOD", "rotation_period"];
const TTL_KEYS: &[&str] = &["ROTATION_TTL", "rotation_ttl", "ttl"];
const DUAL_ACCOUNT_KEYS: &[&str] = &["DUAL_ACCOUNT_MODE", "dual_account_mode"];

/// Environment variables read by the secrets-operator source.
pub const ENV_KEYS: &[&str] = &[
    "LDAP_USERNAME",
    "LDAP_PASSWORD",
    "LDAP_LAST_VAULT_PASSWORD",
    "ROTATION_PERIOD",
    "ROTATION_TTL",
    "DUAL_ACCOUNT_MODE",
];

/// Normalised view of whatever keys a delivery method produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub last_vault_password: String,
    /// Seconds between rotations.
    pub rotation_period: u64,
    /// Seconds until the next rotation, as of the last refresh.
    pub ttl: u64,
    pub delivery_method: DeliveryMethod,
    pub delivery_label: &'static str,
    pub dual_account_mode: bool,
}

fn lookup<'a>(values: &'a HashMap<String, String>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|k| values.get(*k))
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

impl Credentials {
    /// Build from raw key/value pairs. Upper-case env style keys
    /// (`LDAP_USERNAME`) and lower-case file style keys (`username`) are both
    /// accepted.
    pub fn from_map(values: &HashMap<String, String>, method: DeliveryMethod) -> Self {
        let text = |keys: &[&str]| {
            lookup(values, keys)
                .unwrap_or(NOT_CONFIGURED)
                .to_string()
        };
        let number = |keys: &[&str], default: u64| {
            lookup(values, keys)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        Self {
            username: text(USERNAME_KEYS),
            password: text(PASSWORD_KEYS),
            last_vault_password: text(LAST_PASSWORD_KEYS),
            rotation_period: number(ROTATION_PERIOD_KEYS, DEFAULT_ROTATION_PERIOD),
            ttl: number(TTL_KEYS, 0),
            delivery_method: method,
            delivery_label: method.label(),
            dual_account_mode: lookup(values, DUAL_ACCOUNT_KEYS)
                .is_some_and(|v| matches!(v.trim(), "true" | "1" | "yes")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn env_style_keys() {
        let values = map(&[
            ("LDAP_USERNAME", "svc-rotate-a"),
            ("LDAP_PASSWORD", "secret123"),
            ("LDAP_LAST_VAULT_PASSWORD", "oldsecret"),
            ("ROTATION_PERIOD", "300"),
            ("ROTATION_TTL", "250"),
        ]);
        let c = Credentials::from_map(&values, DeliveryMethod::VaultAgentSidecar);
        assert_eq!(c.username, "svc-rotate-a");
        assert_eq!(c.password, "secret123");
        assert_eq!(c.last_vault_password, "oldsecret");
        assert_eq!(c.rotation_period, 300);
        assert_eq!(c.ttl, 250);
        assert_eq!(c.delivery_label, "Vault Agent Sidecar");
        assert!(!c.dual_account_mode);
    }

    #[test]
    fn file_style_keys() {
        let values = map(&[
            ("username", "svc-csi-user"),
            ("password", "csi-secret-456"),
            ("rotation_period", "600"),
            ("last_password", "prev"),
        ]);
        let c = Credentials::from_map(&values, DeliveryMethod::VaultCsiDriver);
        assert_eq!(c.username, "svc-csi-user");
        assert_eq!(c.rotation_period, 600);
        assert_eq!(c.last_vault_password, "prev");
    }

    #[test]
    fn missing_values_fall_back() {
        let c = Credentials::from_map(&HashMap::new(), DeliveryMethod::VaultSecretsOperator);
        assert_eq!(c.username, NOT_CONFIGURED);
        assert_eq!(c.password, NOT_CONFIGURED);
        assert_eq!(c.rotation_period, 30);
        assert_eq!(c.ttl, 0);
    }

    #[test]
    fn unparsable_numbers_fall_back() {
        let values = map(&[("ROTATION_PERIOD", "soon"), ("ROTATION_TTL", "-5")]);
        let c = Credentials::from_map(&values, DeliveryMethod::VaultSecretsOperator);
        assert_eq!(c.rotation_period, 30);
        assert_eq!(c.ttl, 0);
    }

    #[test]
    fn dual_account_flag() {
        let values = map(&[("DUAL_ACCOUNT_MODE", "true")]);
        let c = Credentials::from_map(&values, DeliveryMethod::VaultDirect);
        assert!(c.dual_account_mode);
    }

    #[test]
    fn serializes_expected_fields() {
        let c = Credentials::from_map(&HashMap::new(), DeliveryMethod::VaultCsiDriver);
        let json = serde_json::to_value(&c).unwrap();
        for field in ["username", "password", "rotation_period", "ttl", "dual_account_mode"] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        assert!(json["rotation_period"].is_u64());
        assert_eq!(json["delivery_method"], "vault-csi-driver");
    }
}
