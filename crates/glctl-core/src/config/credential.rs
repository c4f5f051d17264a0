//! Workspace token references and in-memory secrets
//!
//! A profile token is written to the config file either inline or as a
//! `keyring:<entry>` reference into the OS keyring (with the `secure-storage`
//! feature). Client secrets and refresh tokens travel as [`SecretValue`]s until a
//! request body is built.

use super::error::{ConfigError, Result};
use std::env;
use std::fmt;

const KEYRING_PREFIX: &str = "keyring:";

#[cfg(feature = "secure-storage")]
const SERVICE_NAME: &str = "glctl";

/// Keyring access for profile tokens
///
/// Stateless: the keyring is only touched when a value actually is a
/// `keyring:` reference.
pub struct CredentialStore;

impl CredentialStore {
    /// Check if a config value points into the keyring
    pub fn is_keyring_reference(value: &str) -> bool {
        value.starts_with(KEYRING_PREFIX)
    }

    /// Keyring entry holding the token of `profile`
    pub fn token_entry(profile: &str) -> String {
        format!("{}-token", profile)
    }

    /// Resolve a profile value
    ///
    /// `env_var` wins when it is set, then keyring references are looked up,
    /// anything else is returned as written.
    pub fn resolve(value: &str, env_var: Option<&str>) -> Result<String> {
        if let Some(var) = env_var
            && let Ok(env_value) = env::var(var)
        {
            return Ok(env_value);
        }

        match value.strip_prefix(KEYRING_PREFIX) {
            Some(entry) => Self::lookup(entry),
            None => Ok(value.to_string()),
        }
    }

    /// Store `token` in the keyring and return the reference to write to the config
    #[cfg(feature = "secure-storage")]
    pub fn store_token(profile: &str, token: &str) -> Result<String> {
        let entry_name = Self::token_entry(profile);
        keyring_entry(&entry_name)?
            .set_password(token)
            .map_err(|e| {
                ConfigError::KeyringError(format!("Failed to store '{}': {}", entry_name, e))
            })?;
        Ok(format!("{}{}", KEYRING_PREFIX, entry_name))
    }

    /// Delete the keyring entry named by `reference`
    ///
    /// Plain values and already missing entries are not an error.
    pub fn forget(reference: &str) -> Result<()> {
        let Some(entry_name) = reference.strip_prefix(KEYRING_PREFIX) else {
            return Ok(());
        };

        Self::delete(entry_name)
    }

    #[cfg(feature = "secure-storage")]
    fn delete(entry_name: &str) -> Result<()> {
        match keyring_entry(entry_name)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ConfigError::KeyringError(format!(
                "Failed to delete '{}': {}",
                entry_name, e
            ))),
        }
    }

    #[cfg(not(feature = "secure-storage"))]
    fn delete(entry_name: &str) -> Result<()> {
        Err(keyring_disabled(entry_name))
    }

    #[cfg(feature = "secure-storage")]
    fn lookup(entry_name: &str) -> Result<String> {
        keyring_entry(entry_name)?.get_password().map_err(|e| {
            ConfigError::KeyringError(format!("Failed to read '{}': {}", entry_name, e))
        })
    }

    #[cfg(not(feature = "secure-storage"))]
    fn lookup(entry_name: &str) -> Result<String> {
        Err(keyring_disabled(entry_name))
    }
}

#[cfg(feature = "secure-storage")]
fn keyring_entry(entry_name: &str) -> Result<keyring::Entry> {
    keyring::Entry::new(SERVICE_NAME, entry_name)
        .map_err(|e| ConfigError::KeyringError(e.to_string()))
}

#[cfg(not(feature = "secure-storage"))]
fn keyring_disabled(entry_name: &str) -> ConfigError {
    ConfigError::CredentialError(format!(
        "'{}{}' needs keyring support; rebuild with the secure-storage feature",
        KEYRING_PREFIX, entry_name
    ))
}

#[derive(Clone, PartialEq, Eq)]
enum Source {
    Plain(String),
    Keyring(String),
}

/// A secret held in memory
///
/// Values built with [`SecretValue::new`] are used exactly as given, so a secret
/// returned by the API is never mistaken for a keyring reference. Only
/// [`SecretValue::from_config`] follows `keyring:` references, and only when
/// [`SecretValue::reveal`] is called. `Debug` and `Display` never print the
/// contents.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(Source);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Source::Plain(value.into()))
    }

    /// A secret as written by the user, where `keyring:<entry>` names a keyring entry
    pub fn from_config(value: impl Into<String>) -> Self {
        let value = value.into();
        match value.strip_prefix(KEYRING_PREFIX) {
            Some(entry) => Self(Source::Keyring(entry.to_string())),
            None => Self(Source::Plain(value)),
        }
    }

    pub fn reveal(&self) -> Result<String> {
        match &self.0 {
            Source::Plain(value) => Ok(value.clone()),
            Source::Keyring(entry) => CredentialStore::lookup(entry),
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Source::Plain(value) | Source::Keyring(value) => value.is_empty(),
        }
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(<REDACTED>)")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_returns_inline_values() {
        assert_eq!(CredentialStore::resolve("my-token", None).unwrap(), "my-token");
        assert_eq!(CredentialStore::resolve("", None).unwrap(), "");
    }

    #[test]
    #[serial_test::serial]
    fn test_resolve_prefers_the_environment() {
        unsafe {
            env::set_var("TEST_GLCTL_CREDENTIAL", "env-value");
        }

        let result =
            CredentialStore::resolve("keyring:never-read", Some("TEST_GLCTL_CREDENTIAL"));
        assert_eq!(result.unwrap(), "env-value");

        unsafe {
            env::remove_var("TEST_GLCTL_CREDENTIAL");
        }
    }

    #[test]
    fn test_token_entry_and_references() {
        assert_eq!(CredentialStore::token_entry("prod"), "prod-token");
        assert!(CredentialStore::is_keyring_reference("keyring:prod-token"));
        assert!(!CredentialStore::is_keyring_reference("prod-token"));
        assert!(!CredentialStore::is_keyring_reference(""));
    }

    #[test]
    fn test_forget_ignores_plain_values() {
        assert!(CredentialStore::forget("inline-token").is_ok());
    }

    #[test]
    fn test_secret_value_is_redacted() {
        let secret = SecretValue::new("s3cr3t");
        assert_eq!(format!("{:?}", secret), "SecretValue(<REDACTED>)");
        assert_eq!(secret.to_string(), "<REDACTED>");
        assert_eq!(secret.reveal().unwrap(), "s3cr3t");
    }

    #[test]
    fn test_api_secret_with_keyring_prefix_is_kept_verbatim() {
        let secret = SecretValue::new("keyring:abc");
        assert_eq!(secret.reveal().unwrap(), "keyring:abc");
    }

    #[test]
    fn test_from_config_without_reference_is_plain() {
        let secret = SecretValue::from_config("typed-in");
        assert_eq!(secret, SecretValue::new("typed-in"));
        assert_eq!(secret.reveal().unwrap(), "typed-in");
        assert!(SecretValue::from_config("").is_empty());
    }

    #[test]
    fn test_from_config_reference_is_not_plain() {
        let secret = SecretValue::from_config("keyring:client-secret");
        assert_ne!(secret, SecretValue::new("keyring:client-secret"));
        assert!(!secret.is_empty());
    }

    #[cfg(not(feature = "secure-storage"))]
    #[test]
    fn test_keyring_reference_without_feature() {
        let err = SecretValue::from_config("keyring:client-secret")
            .reveal()
            .unwrap_err();
        assert!(err.to_string().contains("secure-storage"));
        assert!(CredentialStore::resolve("keyring:prod-token", None).is_err());
        assert!(CredentialStore::forget("keyring:prod-token").is_err());
    }

    #[cfg(feature = "secure-storage")]
    #[test]
    #[ignore = "Requires keyring service to be available"]
    fn test_keyring_token_lifecycle() {
        let reference = CredentialStore::store_token("glctl-test", "test-value").unwrap();
        assert_eq!(reference, "keyring:glctl-test-token");

        assert_eq!(
            CredentialStore::resolve(&reference, None).unwrap(),
            "test-value"
        );
        assert_eq!(
            SecretValue::from_config(reference.as_str()).reveal().unwrap(),
            "test-value"
        );

        CredentialStore::forget(&reference).unwrap();
        // Second delete finds nothing and still succeeds
        CredentialStore::forget(&reference).unwrap();
    }
}
