//! Configuration loading and data folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Kiosk configuration, loaded once at startup
///
/// All sections are optional in the TOML file; missing sections get safe
/// defaults (malformed config never aborts startup decisions elsewhere).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BoothConfig {
    /// Base URL under which this kiosk is reachable, used to build hosted
    /// strip URLs for the MMS transport (e.g. "http://192.168.1.20:5470")
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    #[serde(default)]
    pub email: EmailConfig,

    #[serde(default)]
    pub sms: SmsConfig,

    #[serde(default)]
    pub segmentation: SegmentationConfig,
}

/// Email delivery transport settings (Resend-style API)
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_email_api_url")]
    pub api_url: String,
    /// API key; the email channel is disabled when empty
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_email_from")]
    pub from_address: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: default_email_api_url(),
            api_key: String::new(),
            from_address: default_email_from(),
        }
    }
}

/// SMS/MMS delivery transport settings (Twilio-style API)
#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    #[serde(default = "default_sms_api_url")]
    pub api_url: String,
    /// Account SID; the SMS channel is disabled when empty or malformed
    #[serde(default)]
    pub account_sid: String,
    #[serde(default)]
    pub auth_token: String,
    #[serde(default)]
    pub from_number: String,
}

impl SmsConfig {
    /// Twilio account SIDs start with "AC"; anything else is treated as
    /// unconfigured rather than an error
    pub fn is_configured(&self) -> bool {
        self.account_sid.starts_with("AC") && !self.auth_token.is_empty()
    }
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            api_url: default_sms_api_url(),
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
        }
    }
}

/// Segmentation inference service settings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SegmentationConfig {
    /// Inference endpoint URL; matting is disabled when absent
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_segmentation_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_public_base_url() -> String {
    "http://localhost:5470".to_string()
}

fn default_email_api_url() -> String {
    "https://api.resend.com/emails".to_string()
}

fn default_email_from() -> String {
    "Photo Booth <booth@example.com>".to_string()
}

fn default_sms_api_url() -> String {
    "https://api.twilio.com/2010-04-01".to_string()
}

fn default_segmentation_timeout_ms() -> u64 {
    2000
}

impl BoothConfig {
    /// Load configuration from a TOML file, or defaults when no file exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)?;
        let config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Default configuration file path for the platform
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("booth").join("config.toml"))
}

/// Data folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. OS-dependent compiled default (fallback)
pub fn resolve_data_folder(cli_arg: Option<&Path>, env_var_name: &str) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        return PathBuf::from(path);
    }

    dirs::data_local_dir()
        .map(|d| d.join("booth"))
        .unwrap_or_else(|| PathBuf::from("./booth_data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = BoothConfig::default();
        assert_eq!(config.public_base_url, "http://localhost:5470");
        assert!(config.email.api_key.is_empty());
        assert!(!config.sms.is_configured());
        assert!(config.segmentation.endpoint.is_none());
    }

    #[test]
    fn test_load_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
public_base_url = "http://kiosk.local:8080"

[email]
api_key = "re_test_key"
from_address = "Booth <booth@kiosk.local>"

[sms]
account_sid = "ACxxxxxxxx"
auth_token = "token"
from_number = "+15550006666"

[segmentation]
endpoint = "http://localhost:9000/segment"
"#
        )
        .unwrap();

        let config = BoothConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.public_base_url, "http://kiosk.local:8080");
        assert_eq!(config.email.api_key, "re_test_key");
        assert!(config.sms.is_configured());
        assert_eq!(
            config.segmentation.endpoint.as_deref(),
            Some("http://localhost:9000/segment")
        );
        // Unspecified fields keep their defaults
        assert_eq!(config.email.api_url, "https://api.resend.com/emails");
    }

    #[test]
    fn test_sms_sid_validation() {
        let mut sms = SmsConfig::default();
        sms.auth_token = "token".into();
        sms.account_sid = "SKwrongprefix".into();
        assert!(!sms.is_configured());
        sms.account_sid = "AC123".into();
        assert!(sms.is_configured());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "public_base_url = [not a string").unwrap();
        let err = BoothConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_resolve_data_folder_cli_wins() {
        let path = resolve_data_folder(
            Some(Path::new("/tmp/booth-cli")),
            "BOOTH_TEST_DATA_FOLDER_UNSET",
        );
        assert_eq!(path, PathBuf::from("/tmp/booth-cli"));
    }
}
