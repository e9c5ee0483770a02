use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api: Api,
    pub auth: Auth,
    #[serde(default)]
    pub routes: Routes,
    pub log: Log,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub backend: String, // "fake" or "real"
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Auth {
    pub storage: String, // "cookie", "file" or "memory"
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
    #[serde(default = "default_access_cookie_ttl_secs")]
    pub access_cookie_ttl_secs: u64,
    #[serde(default = "default_refresh_cookie_ttl_secs")]
    pub refresh_cookie_ttl_secs: u64,
    #[serde(default)]
    pub expiry_leeway_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Routes {
    pub login_path: String,
    pub landing_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub filter: String,
}

impl Default for Routes {
    fn default() -> Self {
        Routes {
            login_path: "/login".to_owned(),
            landing_path: "/dashboard".to_owned(),
        }
    }
}

impl Api {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Auth {
    pub fn access_cookie_ttl(&self) -> Duration {
        Duration::from_secs(self.access_cookie_ttl_secs)
    }

    pub fn refresh_cookie_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_cookie_ttl_secs)
    }

    pub fn expiry_leeway(&self) -> Duration {
        Duration::from_secs(self.expiry_leeway_secs)
    }
}

fn default_base_url() -> String {
    "http://localhost:5050/api/v1".to_owned()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_access_cookie_ttl_secs() -> u64 {
    15 * 60
}

fn default_refresh_cookie_ttl_secs() -> u64 {
    2 * 365 * 24 * 60 * 60
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Reads the TOML file, then `KEEPER__SECTION__KEY` environment overrides.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix("KEEPER").prefix_separator("__").separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn omitted_keys_take_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[api]\nbackend = \"fake\"\n[auth]\nstorage = \"memory\"\n[log]\nfilter = \"warn\""
        )
        .unwrap();

        let settings = parse_settings(file.path().to_str()).unwrap();
        assert_eq!(settings.api.base_url, "http://localhost:5050/api/v1");
        assert_eq!(settings.api.timeout(), Duration::from_secs(20));
        assert_eq!(settings.auth.access_cookie_ttl(), Duration::from_secs(900));
        assert_eq!(settings.auth.refresh_cookie_ttl_secs, 63_072_000);
        assert_eq!(settings.routes.login_path, "/login");
        assert_eq!(settings.routes.landing_path, "/dashboard");
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(parse_settings(Some("settings/does-not-exist.toml")).is_err());
    }
}
