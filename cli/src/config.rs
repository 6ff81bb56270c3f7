use anyhow::{bail, Result};
use wa_tester_core::client::DEFAULT_BASE_URL;
use wa_tester_core::upload::{DEFAULT_CLOUD_NAME, DEFAULT_UPLOAD_BASE, DEFAULT_UPLOAD_PRESET};
use wa_tester_core::Coordinates;

/// Tester configuration. Command-line flags override these values.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Backend API root, e.g. `http://localhost:8080/api/whatsapp`
    pub base_url: String,
    /// Asset host API root
    pub upload_base: String,
    pub cloud_name: String,
    pub upload_preset: String,
    /// Position reported for `--here`
    pub location: Option<Coordinates>,
    /// Default log filter. `RUST_LOG` still takes precedence at startup.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            upload_base: DEFAULT_UPLOAD_BASE.to_string(),
            cloud_name: DEFAULT_CLOUD_NAME.to_string(),
            upload_preset: DEFAULT_UPLOAD_PRESET.to_string(),
            location: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// A set but malformed `WA_TESTER_LOCATION` is an error, not a silent
    /// fallback to "no location".
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let location = match lookup("WA_TESTER_LOCATION") {
            Some(value) => match parse_location(&value) {
                Some(coordinates) => Some(coordinates),
                None => bail!("WA_TESTER_LOCATION must be \"lat,lng\", got {value:?}"),
            },
            None => None,
        };
        Ok(Self {
            base_url: lookup("WA_TESTER_BASE_URL").unwrap_or(defaults.base_url),
            upload_base: lookup("WA_TESTER_UPLOAD_BASE").unwrap_or(defaults.upload_base),
            cloud_name: lookup("WA_TESTER_CLOUD_NAME").unwrap_or(defaults.cloud_name),
            upload_preset: lookup("WA_TESTER_UPLOAD_PRESET").unwrap_or(defaults.upload_preset),
            location,
            log_level: lookup("WA_TESTER_LOG").unwrap_or(defaults.log_level),
        })
    }
}

/// Parse `"lat,lng"`.
pub fn parse_location(value: &str) -> Option<Coordinates> {
    let (lat, lng) = value.split_once(',')?;
    Some(Coordinates {
        latitude: lat.trim().parse().ok()?,
        longitude: lng.trim().parse().ok()?,
    })
}
