//! Job settings: built-in defaults, then the config file, then `PORTAXE_*`
//! environment variables, then command-line overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use portaxe_extract::{DEFAULT_SCAN_LIMIT, ToolPolicy};
use portaxe_install::ConvertOptions;
use serde::{Deserialize, Serialize};

const ROOT_DIR: &str = ".portaxe";
const CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "PORTAXE_";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub output_dir:           PathBuf,
    pub timeout_seconds:      u64,
    pub use_7zip:             bool,
    pub use_innoextract:      bool,
    pub use_msi_extract:      bool,
    pub include_dependencies: bool,
    pub backup_registry:      bool,
    pub redist_dir:           Option<PathBuf>,
    pub scan_limit_bytes:     u64,
}

impl Default for Settings {
    fn default() -> Self {
        let home = home::home_dir();
        Self {
            output_dir:           home
                .as_deref()
                .map(|h| h.join("PortableApps"))
                .unwrap_or_else(|| PathBuf::from("PortableApps")),
            timeout_seconds:      300,
            use_7zip:             true,
            use_innoextract:      true,
            use_msi_extract:      true,
            include_dependencies: true,
            backup_registry:      false,
            redist_dir:           home.map(|h| h.join(ROOT_DIR).join("redist")),
            scan_limit_bytes:     DEFAULT_SCAN_LIMIT,
        }
    }
}

/// Values given on the command line; unset fields leave lower layers alone.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir:           Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds:      Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_7zip:             Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_innoextract:      Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_msi_extract:      Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_dependencies: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_registry:      Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redist_dir:           Option<PathBuf>,
}

/// `~/.portaxe/config.toml`, if a home directory exists.
pub fn default_config_path() -> Option<PathBuf> {
    home::home_dir().map(|h| h.join(ROOT_DIR).join(CONFIG_FILE))
}

impl Settings {
    /// Every layer except the environment.
    fn layered(config: Option<&Path>, overrides: &Overrides, env: Option<Env>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = config {
            figment = figment.merge(Toml::file(path));
        }
        if let Some(env) = env {
            figment = figment.merge(env);
        }
        figment.merge(Serialized::defaults(overrides))
    }

    pub fn load(config: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let explicit = config.map(Path::to_path_buf);
        if let Some(path) = &explicit {
            if !path.is_file() {
                anyhow::bail!("config file '{}' does not exist", path.display());
            }
        }
        let path = explicit.or_else(default_config_path);
        let settings: Settings = Self::layered(path.as_deref(), overrides, Some(Env::prefixed(ENV_PREFIX)))
            .extract()
            .context("invalid configuration")?;
        tracing::debug!(?settings, "settings loaded");
        Ok(settings)
    }

    pub fn policy(&self) -> ToolPolicy {
        ToolPolicy {
            use_7zip:        self.use_7zip,
            use_innoextract: self.use_innoextract,
            use_msi_extract: self.use_msi_extract,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn convert_options(&self) -> ConvertOptions {
        let mut options = ConvertOptions::new(&self.output_dir);
        options.timeout = self.timeout();
        options.policy = self.policy();
        options.include_dependencies = self.include_dependencies;
        options.backup_registry = self.backup_registry;
        options.redist_dir = self.redist_dir.clone();
        options.scan_limit = self.scan_limit_bytes;
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn extract(config: Option<&Path>, overrides: &Overrides) -> Settings {
        Settings::layered(config, overrides, None).extract().unwrap()
    }

    #[test]
    fn defaults_without_config_file() {
        let settings = extract(None, &Overrides::default());
        assert_eq!(settings.timeout_seconds, 300);
        assert!(settings.use_7zip && settings.use_innoextract && settings.use_msi_extract);
        assert!(settings.include_dependencies);
        assert!(!settings.backup_registry);
        assert_eq!(settings.scan_limit_bytes, DEFAULT_SCAN_LIMIT);
    }

    #[test]
    fn missing_default_file_is_ignored() {
        let dir = tempdir().unwrap();
        let settings = extract(Some(&dir.path().join("config.toml")), &Overrides::default());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn file_then_overrides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let file = toml::toml! {
            output_dir = "/srv/portable"
            timeout_seconds = 60
            use_innoextract = false
            backup_registry = true
        };
        std::fs::write(&path, file.to_string()).unwrap();

        let overrides = Overrides {
            timeout_seconds: Some(10),
            use_7zip: Some(false),
            ..Default::default()
        };
        let settings = extract(Some(&path), &overrides);

        assert_eq!(settings.output_dir, PathBuf::from("/srv/portable"));
        assert_eq!(settings.timeout_seconds, 10);
        assert!(!settings.use_innoextract);
        assert!(!settings.use_7zip);
        assert!(settings.backup_registry);

        let options = settings.convert_options();
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert!(!options.policy.use_7zip);
        assert!(options.policy.use_msi_extract);
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.toml")), &Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn malformed_value_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timeout_seconds = \"soon\"\n").unwrap();
        let result = Settings::layered(Some(&path), &Overrides::default(), None).extract::<Settings>();
        assert!(result.is_err());
    }
}
