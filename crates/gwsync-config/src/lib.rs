//! Settings for gwsync.
//!
//! Layered loading (built-in defaults, then a TOML file, then `GWSYNC_`
//! environment variables), controller credential resolution (env, then
//! keyring, then plaintext) and translation into the values the other
//! crates take: `gwsync_api::TransportConfig` and
//! `gwsync_core::ReconcilerOptions`.

pub mod logging;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use gwsync_api::{ControllerClient, TlsMode, TransportConfig};
use gwsync_core::{CloudFamily, CloudSet, CreationDefaults, ReconcilerOptions, RetryPolicy};

pub use logging::LogSettings;

/// Environment variable prefix. Nested keys are separated by `__`,
/// e.g. `GWSYNC_RETRY__ROUTE_ATTEMPTS`.
pub const ENV_PREFIX: &str = "GWSYNC_";

const KEYRING_SERVICE: &str = "gwsync";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for controller '{controller}'")]
    NoCredentials { controller: String },

    #[error("failed to serialize settings: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("settings loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("controller client setup failed: {0}")]
    Client(#[from] gwsync_api::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Top-level settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub controller: ControllerSettings,
    pub retry: RetrySettings,
    pub creation_defaults: CreationDefaultSettings,
    pub log: LogSettings,
}

/// Where the controller is and how to log in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Controller base URL (e.g. "https://controller.example.com").
    pub url: String,

    pub username: Option<String>,

    /// Password (plaintext; prefer the keyring or an env var).
    pub password: Option<String>,

    /// Name of an environment variable holding the password.
    pub password_env: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept any certificate.
    pub insecure: bool,

    pub timeout_secs: u64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: None,
            password: None,
            password_env: None,
            ca_cert: None,
            insecure: false,
            timeout_secs: 30,
        }
    }
}

/// Bounds for calls retried while a gateway is still coming up.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySettings {
    pub route_attempts: u32,
    pub advertise_attempts: u32,
    pub interval_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            route_attempts: RetryPolicy::ROUTES.max_attempts,
            advertise_attempts: RetryPolicy::ADVERTISE.max_attempts,
            interval_secs: RetryPolicy::ROUTES.interval.as_secs(),
        }
    }
}

/// Provider families in which the controller turns a feature on by
/// itself when it launches a gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CreationDefaultSettings {
    pub jumbo_frame: Vec<CloudFamily>,
    pub gro_gso: Vec<CloudFamily>,
}

impl Default for CreationDefaultSettings {
    fn default() -> Self {
        Self {
            jumbo_frame: vec![CloudFamily::Aws, CloudFamily::Gcp],
            gro_gso: vec![
                CloudFamily::Aws,
                CloudFamily::Azure,
                CloudFamily::Gcp,
                CloudFamily::Oci,
                CloudFamily::AliCloud,
                CloudFamily::Edge,
            ],
        }
    }
}

impl Settings {
    /// Check values figment cannot: URL syntax and retry bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.controller_url()?;
        if self.retry.route_attempts == 0 {
            return Err(invalid("retry.route_attempts", "must be at least 1"));
        }
        if self.retry.advertise_attempts == 0 {
            return Err(invalid("retry.advertise_attempts", "must be at least 1"));
        }
        if self.controller.timeout_secs == 0 {
            return Err(invalid("controller.timeout_secs", "must be at least 1"));
        }
        Ok(())
    }

    pub fn controller_url(&self) -> Result<Url, ConfigError> {
        if self.controller.url.is_empty() {
            return Err(invalid("controller.url", "not set"));
        }
        self.controller
            .url
            .parse()
            .map_err(|_| invalid("controller.url", format!("invalid URL: {}", self.controller.url)))
    }

    pub fn transport_config(&self) -> TransportConfig {
        let tls = if self.controller.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.controller.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };

        TransportConfig {
            tls,
            timeout: Duration::from_secs(self.controller.timeout_secs),
        }
    }

    pub fn reconciler_options(&self) -> ReconcilerOptions {
        let interval = Duration::from_secs(self.retry.interval_secs);
        ReconcilerOptions {
            route_retry: RetryPolicy::ROUTES
                .with_attempts(self.retry.route_attempts)
                .with_interval(interval),
            advertise_retry: RetryPolicy::ADVERTISE
                .with_attempts(self.retry.advertise_attempts)
                .with_interval(interval),
            creation_defaults: CreationDefaults {
                jumbo_frame: self.creation_defaults.jumbo_frame.iter().copied().collect::<CloudSet>(),
                gro_gso: self.creation_defaults.gro_gso.iter().copied().collect::<CloudSet>(),
            },
        }
    }

    /// An HTTP client for the configured controller. Not logged in yet.
    pub fn client(&self) -> Result<ControllerClient, ConfigError> {
        let url = self.controller_url()?;
        Ok(ControllerClient::new(url, &self.transport_config())?)
    }
}

// ── Settings file path ──────────────────────────────────────────────

/// Resolve the settings file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "gwsync", "gwsync").map_or_else(
        || PathBuf::from(".gwsync.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load settings from the platform config path and the environment.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(&config_path())
}

/// Load settings from `path` (which need not exist) and the environment,
/// then validate them.
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    debug!(path = %path.display(), "loading settings");

    let settings: Settings = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;

    settings.validate()?;
    Ok(settings)
}

/// Write `settings` to `path` as TOML, creating parent directories.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(settings)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Keyring entry name for a controller login.
fn keyring_user(username: &str, url: &str) -> String {
    format!("{username}@{url}")
}

/// Resolve the controller login.
///
/// The username comes from the settings or `GWSYNC_USERNAME`. The
/// password is looked up in order: the variable named by `password_env`,
/// `GWSYNC_PASSWORD`, the system keyring, the plaintext setting.
pub fn resolve_credentials(
    controller: &ControllerSettings,
) -> Result<(String, SecretString), ConfigError> {
    let no_credentials = || ConfigError::NoCredentials {
        controller: controller.url.clone(),
    };

    let username = controller
        .username
        .clone()
        .or_else(|| std::env::var(format!("{ENV_PREFIX}USERNAME")).ok())
        .ok_or_else(no_credentials)?;

    // 1. Named env var
    if let Some(ref env_name) = controller.password_env {
        if let Ok(pw) = std::env::var(env_name) {
            return Ok((username, SecretString::from(pw)));
        }
    }

    // 2. Default env var
    if let Ok(pw) = std::env::var(format!("{ENV_PREFIX}PASSWORD")) {
        return Ok((username, SecretString::from(pw)));
    }

    // 3. Keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(&username, &controller.url))
    {
        if let Ok(pw) = entry.get_password() {
            return Ok((username, SecretString::from(pw)));
        }
    }

    // 4. Plaintext
    if let Some(ref pw) = controller.password {
        return Ok((username, SecretString::from(pw.clone())));
    }

    Err(no_credentials())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use gwsync_core::CloudType;

    use super::*;

    const FILE: &str = r#"
        [controller]
        url = "https://controller.example.com"
        username = "admin"
        password = "from-file"
        timeout_secs = 15

        [retry]
        route_attempts = 5

        [creation_defaults]
        jumbo_frame = ["aws"]
    "#;

    #[test]
    fn defaults_match_reconciler_defaults() {
        let settings = Settings::default();
        assert_eq!(
            settings.reconciler_options(),
            ReconcilerOptions::default()
        );
    }

    #[test]
    fn file_then_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file("gwsync.toml", FILE)?;
            jail.set_env("GWSYNC_RETRY__INTERVAL_SECS", "2");
            jail.set_env("GWSYNC_LOG__JSON", "true");

            let settings = load_settings_from(Path::new("gwsync.toml")).unwrap();
            assert_eq!(settings.controller.timeout_secs, 15);
            assert_eq!(settings.retry.route_attempts, 5);
            assert_eq!(settings.retry.advertise_attempts, 10);
            assert_eq!(settings.retry.interval_secs, 2);
            assert!(settings.log.json);

            let options = settings.reconciler_options();
            assert_eq!(options.route_retry.max_attempts, 5);
            assert_eq!(options.route_retry.interval, Duration::from_secs(2));
            assert!(options.creation_defaults.jumbo_frame_on(CloudType::AwsGov));
            assert!(!options.creation_defaults.jumbo_frame_on(CloudType::Gcp));
            Ok(())
        });
    }

    #[test]
    fn missing_url_is_rejected() {
        Jail::expect_with(|_| {
            let err = load_settings_from(Path::new("absent.toml")).unwrap_err();
            assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "controller.url"));
            Ok(())
        });
    }

    #[test]
    fn zero_attempts_are_rejected() {
        let mut settings = Settings::default();
        settings.controller.url = "https://controller.example.com".into();
        settings.retry.route_attempts = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn unknown_family_fails_to_load() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "gwsync.toml",
                r#"
                [controller]
                url = "https://controller.example.com"
                [creation_defaults]
                gro_gso = ["vmware"]
                "#,
            )?;
            let err = load_settings_from(Path::new("gwsync.toml")).unwrap_err();
            assert!(matches!(err, ConfigError::Figment(_)));
            Ok(())
        });
    }

    #[test]
    fn tls_mode_follows_settings() {
        let mut settings = Settings::default();
        assert_eq!(settings.transport_config().tls, TlsMode::System);

        settings.controller.ca_cert = Some(PathBuf::from("/etc/ca.pem"));
        assert_eq!(
            settings.transport_config().tls,
            TlsMode::CustomCa(PathBuf::from("/etc/ca.pem"))
        );

        settings.controller.insecure = true;
        assert_eq!(settings.transport_config().tls, TlsMode::DangerAcceptInvalid);
    }

    #[test]
    fn named_env_password_wins_over_plaintext() {
        Jail::expect_with(|jail| {
            jail.set_env("GWSYNC_TEST_PW", "from-env");
            let controller = ControllerSettings {
                url: "https://controller.example.com".into(),
                username: Some("admin".into()),
                password: Some("from-file".into()),
                password_env: Some("GWSYNC_TEST_PW".into()),
                ..ControllerSettings::default()
            };

            let (user, pw) = resolve_credentials(&controller).unwrap();
            assert_eq!(user, "admin");
            assert_eq!(pw.expose_secret(), "from-env");
            Ok(())
        });
    }

    #[test]
    fn missing_username_is_no_credentials() {
        Jail::expect_with(|_| {
            let controller = ControllerSettings {
                url: "https://controller.example.com".into(),
                password: Some("pw".into()),
                ..ControllerSettings::default()
            };
            let err = resolve_credentials(&controller).unwrap_err();
            assert!(matches!(err, ConfigError::NoCredentials { .. }));
            Ok(())
        });
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut settings = Settings::default();
        settings.controller.url = "https://controller.example.com".into();
        settings.retry.advertise_attempts = 3;

        save_settings(&path, &settings).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let back: Settings = toml::from_str(&text).unwrap();

        assert_eq!(back, settings);
    }
}
