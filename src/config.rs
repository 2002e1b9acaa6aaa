use crate::model::Settings;
use anyhow::{Context, Result, bail};
use std::env;
use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "spotstat";
const SETTINGS_FILE: &str = "settings.json";
const LOG_FILE: &str = "spotstat.log";

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var("SPOTSTAT_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let home = env::var("USERPROFILE")
        .or_else(|_| env::var("HOME"))
        .context("neither USERPROFILE nor HOME is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn settings_path() -> Result<PathBuf> {
    Ok(config_root()?.join(SETTINGS_FILE))
}

pub fn log_path() -> Result<PathBuf> {
    Ok(config_root()?.join(LOG_FILE))
}

pub fn ensure_config_dir() -> Result<PathBuf> {
    let root = config_root()?;
    fs::create_dir_all(&root).with_context(|| format!("failed to create {}", root.display()))?;
    Ok(root)
}

pub fn load_settings() -> Result<Settings> {
    let path = settings_path()?;
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse settings file {}", path.display()))?;
    if settings.page_size == 0 {
        bail!("page_size in {} must be at least 1", path.display());
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FilterColumn, Theme};
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn with_config_dir<T>(dir: &std::path::Path, body: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        unsafe {
            env::set_var("SPOTSTAT_CONFIG_DIR", dir.to_string_lossy().as_ref());
        }
        body()
    }

    #[test]
    fn missing_settings_file_gives_defaults() {
        let dir = tempdir().expect("tempdir");
        let settings = with_config_dir(dir.path(), load_settings).expect("load");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn settings_file_is_read() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"page_size":20,"default_column":"album","theme":"matrix"}"#,
        )
        .expect("write settings");

        let settings = with_config_dir(dir.path(), load_settings).expect("load");
        assert_eq!(settings.page_size, 20);
        assert_eq!(settings.default_column, FilterColumn::Album);
        assert_eq!(settings.theme, Theme::Matrix);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join(SETTINGS_FILE), r#"{"page_size":0}"#).expect("write");

        let err = with_config_dir(dir.path(), load_settings).expect_err("must fail");
        assert!(format!("{err:#}").contains("page_size"));
    }

    #[test]
    fn malformed_settings_report_the_path() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join(SETTINGS_FILE), "{").expect("write");

        let err = with_config_dir(dir.path(), load_settings).expect_err("must fail");
        assert!(format!("{err:#}").contains(SETTINGS_FILE));
    }
}
