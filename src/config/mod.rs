use crate::errors::{AppError, AppResult};
use crate::utils::path::expand_tilde;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_media_root")]
    pub media_root: String,
    #[serde(default = "default_media_base_url")]
    pub media_base_url: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub admin_bootstrap: AdminBootstrap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    #[serde(default = "default_retention_days")]
    pub days: i64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
    #[serde(default = "default_from_addr")]
    pub from_addr: String,
    /// When set, alerts are written as `.eml` files here instead of the log.
    #[serde(default)]
    pub spool_dir: Option<String>,
}

/// The single admin account created by `bootstrap-admin`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminBootstrap {
    #[serde(default = "default_admin_username")]
    pub username: String,
    #[serde(default = "default_admin_email")]
    pub email: String,
    #[serde(default = "default_admin_password")]
    pub password: String,
    #[serde(default = "default_admin_name")]
    pub name: String,
    #[serde(default = "default_admin_department")]
    pub department: String,
    #[serde(default = "default_shift_start")]
    pub shift_start_time: String,
    #[serde(default = "default_shift_end")]
    pub shift_end_time: String,
}

fn default_database() -> String {
    Config::config_dir().join("idletracker.sqlite").to_string_lossy().to_string()
}
fn default_media_root() -> String {
    Config::config_dir().join("media").to_string_lossy().to_string()
}
fn default_media_base_url() -> String {
    "http://127.0.0.1:5000/media".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_retention_days() -> i64 {
    crate::core::retention::DEFAULT_RETENTION_DAYS
}
fn default_batch_size() -> usize {
    crate::db::purge::DEFAULT_BATCH_SIZE
}
fn default_subject_prefix() -> String {
    crate::core::notify::DEFAULT_SUBJECT_PREFIX.to_string()
}
fn default_from_addr() -> String {
    "idletracker@localhost".to_string()
}
fn default_admin_username() -> String {
    "admin".to_string()
}
fn default_admin_email() -> String {
    "admin@example.com".to_string()
}
fn default_admin_password() -> String {
    "admin123".to_string()
}
fn default_admin_name() -> String {
    "Administrator".to_string()
}
fn default_admin_department() -> String {
    "Administration".to_string()
}
fn default_shift_start() -> String {
    "09:00:00".to_string()
}
fn default_shift_end() -> String {
    "18:00:00".to_string()
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            days: default_retention_days(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            subject_prefix: default_subject_prefix(),
            from_addr: default_from_addr(),
            spool_dir: None,
        }
    }
}

impl Default for AdminBootstrap {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            email: default_admin_email(),
            password: default_admin_password(),
            name: default_admin_name(),
            department: default_admin_department(),
            shift_start_time: default_shift_start(),
            shift_end_time: default_shift_end(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            media_root: default_media_root(),
            media_base_url: default_media_base_url(),
            log_level: default_log_level(),
            retention: RetentionConfig::default(),
            notify: NotifyConfig::default(),
            admin_bootstrap: AdminBootstrap::default(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".idletracker")
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("idletracker.conf")
    }

    /// Load configuration from `path` (or the default file). A missing file
    /// yields the defaults.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_file);

        let mut cfg = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_yaml::from_str(&content)
                .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?
        } else {
            Config::default()
        };

        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// `ADMIN_USERNAME`, `ADMIN_EMAIL` and `ADMIN_PASSWORD` override the
    /// bootstrap account.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("ADMIN_USERNAME") {
            self.admin_bootstrap.username = v;
        }
        if let Ok(v) = env::var("ADMIN_EMAIL") {
            self.admin_bootstrap.email = v;
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD") {
            self.admin_bootstrap.password = v;
        }
    }

    pub fn database_path(&self) -> PathBuf {
        expand_tilde(&self.database)
    }

    pub fn media_root_path(&self) -> PathBuf {
        expand_tilde(&self.media_root)
    }

    /// Write the configuration file and create the directories it points at.
    pub fn init_all(&self, config_path: Option<&Path>, is_test: bool) -> AppResult<PathBuf> {
        if !is_test {
            let path = config_path.map(Path::to_path_buf).unwrap_or_else(Self::config_file);
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            let yaml = serde_yaml::to_string(self).map_err(|e| AppError::Config(e.to_string()))?;
            let mut file = fs::File::create(&path)?;
            file.write_all(yaml.as_bytes())?;
            tracing::debug!(path = %path.display(), "config file written");
        }

        let db_path = self.database_path();
        if let Some(dir) = db_path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }
        fs::create_dir_all(self.media_root_path())?;

        Ok(db_path)
    }
}
