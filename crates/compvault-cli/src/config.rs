use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::Result;
use compvault_core::{
    revision::{DEFAULT_BRANCH, DEFAULT_PATH},
    VaultError,
};
use compvault_store::GitHubConfig;
use dirs::config_dir;
use serde::{Deserialize, Serialize};

pub const DEFAULT_REPO: &str = "salesforce-component-manager";
const TOKEN_ENV: &str = "COMPVAULT_GITHUB_TOKEN";
const PASSWORD_ENV: &str = "COMPVAULT_PASSWORD";

/// User-level configuration loaded from `~/.config/compvault/config.toml` (platform-specific).
/// Stored as plaintext; this is not a secrets vault.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct GitHubSettings {
    pub username: String,
    pub repo: String,
    pub token: String,
    pub branch: String,
    pub encryption_password: String,
    /// File holding the encrypted collection.
    pub path: String,
    /// Override for GitHub Enterprise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            username: String::new(),
            repo: DEFAULT_REPO.to_string(),
            token: String::new(),
            branch: DEFAULT_BRANCH.to_string(),
            encryption_password: String::new(),
            path: DEFAULT_PATH.to_string(),
            api_base: None,
        }
    }
}

impl GitHubSettings {
    /// Every field needed to reach the repository and open the blob.
    pub fn validate(&self) -> std::result::Result<(), VaultError> {
        let missing: Vec<&str> = [
            ("username", &self.username),
            ("repo", &self.repo),
            ("token", &self.token),
            ("branch", &self.branch),
            ("encryption_password", &self.encryption_password),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            return Err(VaultError::validation(format!(
                "missing configuration: {} (run `compvault setup`)",
                missing.join(", ")
            )));
        }
        compvault_envelope::validate_passphrase(&self.encryption_password)
    }

    pub fn to_github_config(&self) -> GitHubConfig {
        GitHubConfig {
            owner: self.username.clone(),
            repo: self.repo.clone(),
            token: self.token.clone(),
            branch: self.branch.clone(),
            path: self.path.clone(),
            api_base: self.api_base.clone(),
        }
    }
}

impl Config {
    /// Environment variables win over the file for the two secrets.
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(
            std::env::var(TOKEN_ENV).ok(),
            std::env::var(PASSWORD_ENV).ok(),
        );
        self
    }

    fn apply_overrides(&mut self, token: Option<String>, password: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.github.token = token;
        }
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            self.github.encryption_password = password;
        }
    }
}

/// Load config from the default path; if missing, return defaults.
pub fn load() -> Result<Config> {
    let path = default_path()?;
    Ok(load_from_path(path)?.with_env_overrides())
}

/// Load config from a given path; if missing or empty, return defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg)
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("compvault").join("config.toml"))
}

/// Write a default config unless a file already exists there. Secrets from
/// the environment are never persisted.
pub fn write_default_if_missing() -> Result<PathBuf> {
    let path = default_path()?;
    write_default_to_path_if_missing(&path)
}

fn write_default_to_path_if_missing(path: &Path) -> Result<PathBuf> {
    write_to_path_if_missing(&Config::default(), path)
}

fn write_to_path_if_missing(config: &Config, path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    save_to_path(config, path)?;
    Ok(path.to_path_buf())
}

/// Overwrite the config at `path`, creating parent directories as needed.
pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(path, body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> GitHubSettings {
        GitHubSettings {
            username: "acme".into(),
            token: "ghp_xxx".into(),
            encryption_password: "correct-horse-battery".into(),
            ..GitHubSettings::default()
        }
    }

    #[test]
    fn returns_default_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_from_path(dir.path().join("config.toml")).expect("load");
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.github.repo, DEFAULT_REPO);
        assert_eq!(cfg.github.branch, "main");
    }

    #[test]
    fn parses_custom_config() {
        let contents = r#"
            [github]
            username = "acme"
            repo = "catalogue"
            token = "ghp_xxx"
            branch = "data"
            encryption_password = "correct-horse-battery"
            api_base = "https://github.example.com/api/v3"
        "#;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).expect("write temp config");

        let cfg = load_from_path(&path).expect("load");
        assert_eq!(
            cfg.github,
            GitHubSettings {
                username: "acme".into(),
                repo: "catalogue".into(),
                token: "ghp_xxx".into(),
                branch: "data".into(),
                encryption_password: "correct-horse-battery".into(),
                path: "components.json".into(),
                api_base: Some("https://github.example.com/api/v3".into()),
            }
        );
        let gh = cfg.github.to_github_config();
        assert_eq!(gh.location().to_string(), "acme/catalogue@data:components.json");
    }

    #[test]
    fn write_default_creates_file_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config {
            github: configured(),
        };

        write_to_path_if_missing(&cfg, &path).expect("write should succeed");
        let other = Config::default();
        let second = write_to_path_if_missing(&other, &path).expect("second write ok");
        assert_eq!(second, path);
        assert_eq!(load_from_path(&path).expect("load"), cfg);
    }

    #[test]
    fn init_never_writes_env_secrets() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let mut loaded = load_from_path(&path).expect("load");
        loaded.apply_overrides(Some("ghp_FROM_ENV".into()), Some("env-secret-pass".into()));
        assert_eq!(loaded.github.token, "ghp_FROM_ENV");

        write_default_to_path_if_missing(&path).expect("init");
        let body = fs::read_to_string(&path).expect("read back");
        assert!(!body.contains("ghp_FROM_ENV"));
        assert!(!body.contains("env-secret-pass"));
        assert_eq!(load_from_path(&path).expect("load"), Config::default());
    }

    #[test]
    fn validation_lists_missing_fields() {
        let err = GitHubSettings::default().validate().expect_err("empty config");
        let message = err.to_string();
        assert!(message.contains("username"));
        assert!(message.contains("token"));
        assert!(message.contains("encryption_password"));
        assert!(!message.contains("repo,"));
    }

    #[test]
    fn validation_enforces_password_length() {
        let settings = GitHubSettings {
            encryption_password: "short".into(),
            ..configured()
        };
        let err = settings.validate().expect_err("short password");
        assert!(err.to_string().contains("at least 8"));
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn overrides_replace_secrets_but_ignore_blanks() {
        let mut cfg = Config {
            github: configured(),
        };
        cfg.apply_overrides(Some("ghp_env".into()), Some(String::new()));
        assert_eq!(cfg.github.token, "ghp_env");
        assert_eq!(cfg.github.encryption_password, "correct-horse-battery");
    }
}
