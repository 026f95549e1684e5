use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Deserialize;

use crate::calendar::{HourGrid, ViewMode};

/// Toggl APIのデフォルトのURL。
pub const DEFAULT_API_URL: &str = "https://api.track.toggl.com/api/v9";

/// アプリケーションの設定。
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub api_token: String,
    pub grid: HourGrid,
    pub view: ViewMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: String::new(),
            grid: HourGrid::default(),
            view: ViewMode::default(),
        }
    }
}

/// 設定ファイルの内容。全ての項目を省略できる。
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    api_url: Option<String>,
    api_token: Option<String>,
    grid: Option<HourGrid>,
    view: Option<ViewMode>,
}

impl Config {
    /// 設定ファイルと環境変数から設定を読み込む。
    ///
    /// デフォルト値、設定ファイル、環境変数(`TOGGL_API_TOKEN`, `TOGGL_API_URL`)の順に上書きする。
    /// API tokenがどこにも設定されていない場合はエラーを返す。
    pub fn load() -> Result<Self> {
        let config = Self::read()?;
        if config.api_token.is_empty() {
            anyhow::bail!("TOGGL_API_TOKEN must be set");
        }
        info!("Config loaded (api url: {})", config.api_url);

        Ok(config)
    }

    /// API tokenの有無を確認せずに設定を読み込む。
    pub fn read() -> Result<Self> {
        let mut config = match default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env();

        Ok(config)
    }

    /// 設定ファイルを読み込む。
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading config file: {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn from_toml(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        let default = Self::default();

        Ok(Self {
            api_url: file.api_url.unwrap_or(default.api_url),
            api_token: file.api_token.unwrap_or(default.api_token),
            grid: file.grid.unwrap_or(default.grid),
            view: file.view.unwrap_or(default.view),
        })
    }

    /// 環境変数で設定を上書きする。
    fn apply_env(&mut self) {
        if let Ok(token) = env::var("TOGGL_API_TOKEN") {
            self.api_token = token;
        }
        if let Ok(url) = env::var("TOGGL_API_URL") {
            self.api_url = url;
        }
    }
}

/// 設定ファイルのパスを返す。
fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tooggls").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use std::{env, fs, sync::Mutex};

    use once_cell::sync::Lazy;

    use super::{Config, DEFAULT_API_URL};
    use crate::calendar::{HourGrid, ViewMode};

    /// 環境変数を変更するテストを直列に実行するためのロック。
    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    #[test]
    fn test_from_toml_full() {
        let config = Config::from_toml(
            r#"
api_url = "http://localhost:8080"
api_token = "token"
grid = "legacy"
view = "day"
"#,
        )
        .unwrap();

        assert_eq!(
            config,
            Config {
                api_url: "http://localhost:8080".to_string(),
                api_token: "token".to_string(),
                grid: HourGrid::Legacy,
                view: ViewMode::Day,
            }
        );
    }

    /// 省略した項目はデフォルト値になる。
    #[test]
    fn test_from_toml_empty() {
        let config = Config::from_toml("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.view, ViewMode::Week);
        assert_eq!(config.grid, HourGrid::Full);
    }

    #[test]
    fn test_from_toml_invalid_grid() {
        assert!(Config::from_toml(r#"grid = "hourly""#).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = env::temp_dir().join("tooggls_config_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "view = \"day\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.view, ViewMode::Day);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_from_file_missing() {
        let path = env::temp_dir().join("tooggls_config_missing").join("config.toml");

        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn test_apply_env() {
        let _lock = ENV_LOCK.lock().unwrap();
        env::set_var("TOGGL_API_TOKEN", "from-env");
        env::set_var("TOGGL_API_URL", "http://example.test");

        let mut config = Config::default();
        config.apply_env();

        env::remove_var("TOGGL_API_TOKEN");
        env::remove_var("TOGGL_API_URL");
        assert_eq!(config.api_token, "from-env");
        assert_eq!(config.api_url, "http://example.test");
    }

    /// 環境変数がなければ設定ファイルの値を維持する。
    #[test]
    fn test_apply_env_unset() {
        let _lock = ENV_LOCK.lock().unwrap();
        env::remove_var("TOGGL_API_TOKEN");
        env::remove_var("TOGGL_API_URL");

        let mut config = Config::from_toml(r#"api_token = "from-file""#).unwrap();
        config.apply_env();

        assert_eq!(config.api_token, "from-file");
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
