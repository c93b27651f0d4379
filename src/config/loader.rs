use super::schema::RawWidgetConfig;
use crate::error::ConfigError;
use directories::UserDirs;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".omnichat-widget";
const CONFIG_FILE: &str = "widget.toml";

/// `~/.omnichat-widget/widget.toml`, or `None` when there is no home directory.
pub fn default_config_path() -> Option<PathBuf> {
    UserDirs::new().map(|u| u.home_dir().join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Expand a leading `~` in a user-supplied path.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

impl RawWidgetConfig {
    /// Read a partial config from disk. `.json` files use the embed loader's
    /// `config.json` layout; everything else is parsed as TOML.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load `path` when given, else the default location if it exists, else an
    /// empty config. Environment overrides are applied last.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut raw = match path {
            Some(path) => Self::load_from_path(path)?,
            None => match default_config_path() {
                Some(default) if default.exists() => Self::load_from_path(&default)?,
                _ => Self::default(),
            },
        };
        raw.apply_env_overrides();
        Ok(raw)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(org_id) = lookup("OMNICHAT_ORG_ID")
            && !org_id.is_empty()
        {
            self.org_id = Some(org_id);
        }

        if let Some(org_url) = lookup("OMNICHAT_ORG_URL")
            && !org_url.is_empty()
        {
            self.org_url = Some(org_url);
        }

        if let Some(widget_id) = lookup("OMNICHAT_WIDGET_ID")
            && !widget_id.is_empty()
        {
            self.widget_id = Some(widget_id);
        }

        if let Some(interval) = lookup("OMNICHAT_POLL_INTERVAL_MS")
            && let Ok(ms) = interval.parse::<u64>()
        {
            self.poll_interval_ms = Some(ms);
        }
    }
}
