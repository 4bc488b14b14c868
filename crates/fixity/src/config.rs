use crate::error::{FixityError, Result};
use crate::index::hasher::Algorithm;
use crate::report::ExportFormat;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use xdg::BaseDirectories;

const APP_PREFIX: &str = "fixity";
const MAX_DEFAULT_WORKERS: usize = 8;

/// Tunables read from `fixity.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub default_algorithm: String,
    pub lock_timeout_secs: u64,
    pub workers: usize,
    pub report_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_algorithm: Algorithm::default().as_str().to_string(),
            lock_timeout_secs: 30,
            workers: default_workers(),
            report_dir: None,
        }
    }
}

impl Settings {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(&path)
            .map_err(|e| FixityError::Config(format!("Failed to read settings file: {}", e)))?;
        let settings: Settings = toml::from_str(&contents)
            .map_err(|e| FixityError::Config(format!("Failed to parse settings TOML: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.algorithm()?;
        if self.workers == 0 {
            return Err(FixityError::Config("workers must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn algorithm(&self) -> Result<Algorithm> {
        self.default_algorithm.parse()
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_DEFAULT_WORKERS)
}

pub struct Config {
    pub store_path: PathBuf,
    pub config_path: Option<PathBuf>,
    pub settings: Settings,
}

impl Config {
    /// Resolves the store location (`--store`, then `FIXITY_STORE`, then the
    /// XDG data dir) and loads settings from `--config` or the XDG config dir.
    pub fn new(store_override: Option<PathBuf>, config_override: Option<PathBuf>) -> Result<Self> {
        let store_path = if let Some(path) = store_override {
            path
        } else if let Ok(env_path) = std::env::var("FIXITY_STORE") {
            PathBuf::from(env_path)
        } else {
            let xdg = BaseDirectories::with_prefix(APP_PREFIX)
                .map_err(|e| FixityError::Config(format!("Failed to initialize XDG directories: {}", e)))?;
            xdg.place_data_file("store.json")
                .map_err(|e| FixityError::Config(format!("Failed to create data directory: {}", e)))?
        };

        let config_path = match config_override {
            Some(path) => Some(path),
            None => BaseDirectories::with_prefix(APP_PREFIX)
                .ok()
                .and_then(|xdg| xdg.find_config_file("fixity.toml")),
        };

        let settings = match &config_path {
            Some(path) => Settings::load_from_file(path)?,
            None => Settings::default(),
        };

        Ok(Self {
            store_path,
            config_path,
            settings,
        })
    }

    pub fn ensure_store_directory(&self) -> Result<()> {
        if let Some(parent) = self.store_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Per-invocation options a driver hands to the engine.
///
/// `export_format` is `None` when no export was asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub algorithm: Algorithm,
    pub recursive: bool,
    pub export_format: Option<ExportFormat>,
    pub output_path: Option<PathBuf>,
}

impl RunOptions {
    /// Options seeded from settings; the algorithm is validated here, before
    /// any file is touched.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            algorithm: settings.algorithm()?,
            recursive: false,
            export_format: None,
            output_path: None,
        })
    }

    /// Layers command-line flags over the settings defaults. An output path
    /// without a format exports the default format.
    pub fn with_flags(
        mut self,
        algorithm: Option<Algorithm>,
        recursive: bool,
        export_format: Option<ExportFormat>,
        output_path: Option<PathBuf>,
    ) -> Self {
        if let Some(algorithm) = algorithm {
            self.algorithm = algorithm;
        }
        self.recursive |= recursive;
        self.export_format = export_format
            .or(self.export_format)
            .or_else(|| output_path.as_ref().map(|_| ExportFormat::default()));
        if output_path.is_some() {
            self.output_path = output_path;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_with_override() {
        let temp_dir = tempfile::tempdir().unwrap();
        let custom_path = temp_dir.path().join("store.json");
        let settings_path = temp_dir.path().join("fixity.toml");
        fs::write(&settings_path, "").unwrap();

        let config = Config::new(Some(custom_path.clone()), Some(settings_path)).unwrap();
        assert_eq!(config.store_path, custom_path);
        assert_eq!(config.settings, Settings::default());
    }

    #[test]
    fn test_config_ensure_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store_path = temp_dir.path().join("subdir/store.json");
        let config = Config {
            store_path: store_path.clone(),
            config_path: None,
            settings: Settings::default(),
        };
        config.ensure_store_directory().unwrap();
        assert!(store_path.parent().unwrap().exists());
    }

    #[test]
    fn test_settings_from_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("fixity.toml");
        fs::write(
            &path,
            "default_algorithm = \"sha512\"\nlock_timeout_secs = 5\nworkers = 2\nreport_dir = \"/var/lib/fixity/reports\"\n",
        )
        .unwrap();

        let settings = Settings::load_from_file(&path).unwrap();
        assert_eq!(settings.algorithm().unwrap(), Algorithm::Sha512);
        assert_eq!(settings.lock_timeout(), Duration::from_secs(5));
        assert_eq!(settings.workers, 2);
        assert_eq!(
            settings.report_dir,
            Some(PathBuf::from("/var/lib/fixity/reports"))
        );
    }

    #[test]
    fn test_settings_reject_bad_algorithm() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("fixity.toml");
        fs::write(&path, "default_algorithm = \"crc32\"\n").unwrap();

        assert!(matches!(
            Settings::load_from_file(&path),
            Err(FixityError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_settings_reject_unknown_keys() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("fixity.toml");
        fs::write(&path, "algorithm = \"sha1\"\n").unwrap();

        assert!(matches!(
            Settings::load_from_file(&path),
            Err(FixityError::Config(_))
        ));
    }

    #[test]
    fn test_default_workers_bounded() {
        let workers = Settings::default().workers;
        assert!(workers >= 1 && workers <= MAX_DEFAULT_WORKERS);
    }

    #[test]
    fn test_run_options_from_settings() {
        let settings = Settings {
            default_algorithm: "md5".to_string(),
            ..Settings::default()
        };
        let options = RunOptions::from_settings(&settings).unwrap();
        assert_eq!(options.algorithm, Algorithm::Md5);
        assert!(!options.recursive);
        assert_eq!(options.export_format, None);
    }

    #[test]
    fn test_flags_override_settings() {
        let base = RunOptions::from_settings(&Settings::default()).unwrap();

        let options = base
            .clone()
            .with_flags(Some(Algorithm::Sha384), true, Some(ExportFormat::Html), None);
        assert_eq!(options.algorithm, Algorithm::Sha384);
        assert!(options.recursive);
        assert_eq!(options.export_format, Some(ExportFormat::Html));
        assert_eq!(options.output_path, None);

        let options = base
            .clone()
            .with_flags(None, false, None, Some(PathBuf::from("out.json")));
        assert_eq!(options.algorithm, Algorithm::Sha256);
        assert_eq!(options.export_format, Some(ExportFormat::Json));
        assert_eq!(options.output_path, Some(PathBuf::from("out.json")));

        assert_eq!(base.clone().with_flags(None, false, None, None), base);
    }
}
