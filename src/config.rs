//! Configuration for ytmeta.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags
//! 2. Environment variables (YOUTUBE_API_KEY, YTMETA_API_BASE)
//! 3. Config file (.ytmeta/config.yaml)
//! 4. Defaults (videos.txt, output/, ../decks)
//!
//! Config file discovery:
//! - Searches the starting directory and its parents for .ytmeta/config.yaml
//! - Paths in the config file are relative to the project root (parent of .ytmeta/)
//!
//! Everything is resolved once into a [`ResolvedConfig`] and passed down
//! explicitly; nothing here is cached globally.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::adapters::youtube::{FetcherConfig, DEFAULT_API_BASE, DEFAULT_TIMEOUT_SECS};

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// Environment variable overriding the API root
pub const API_BASE_ENV: &str = "YTMETA_API_BASE";

/// Default credential file, relative to the project root
pub const DEFAULT_CREDENTIALS_FILE: &str = ".youtube-api-key";

pub const DEFAULT_INPUT: &str = "videos.txt";
pub const DEFAULT_OUTPUT: &str = "output";
pub const DEFAULT_DECKS: &str = "../decks";

/// Subdirectory of the decks tree that receives newly fetched metadata
pub const PROCESSING_SUBDIR: &str = "processing";

/// Configuration errors surfaced to the user
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Missing {env_var} in environment variables and no credential file found (looked in: {})",
        display_paths(.searched)
    )]
    MissingCredential {
        env_var: &'static str,
        searched: Vec<PathBuf>,
    },

    #[error("Failed to read credential file {path}: {source}")]
    CredentialFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub api: Option<ApiConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Input file with one URL per line
    pub input: Option<String>,
    /// Output directory for `fetch`
    pub output: Option<String>,
    /// Decks tree scanned by `sync`
    pub decks: Option<String>,
    /// Output directory for `sync` (default: <decks>/processing)
    pub processing: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub credentials_file: Option<String>,
}

/// Environment values relevant to configuration
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
}

impl EnvVars {
    /// Snapshot the process environment
    pub fn from_env() -> Self {
        Self {
            api_key: non_empty(std::env::var(API_KEY_ENV).ok()),
            api_base: non_empty(std::env::var(API_BASE_ENV).ok()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolved configuration with absolute or cwd-relative paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub decks: PathBuf,
    pub processing: PathBuf,
    pub api_base: String,
    pub timeout_seconds: u64,
    /// API key found in the environment
    pub env_api_key: Option<String>,
    /// Credential files tried in order when no key is in the environment
    pub credentials_files: Vec<PathBuf>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Where the API key came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Flag,
    Environment,
    File(PathBuf),
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Flag => write!(f, "--api-key"),
            CredentialSource::Environment => write!(f, "${}", API_KEY_ENV),
            CredentialSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A resolved API key
#[derive(Clone)]
pub struct Credential {
    pub key: String,
    pub source: CredentialSource,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("key", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

impl ResolvedConfig {
    /// Load configuration for the current directory and process environment
    pub fn load() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to determine current directory")?;
        Self::discover(&cwd, &EnvVars::from_env())
    }

    /// Load configuration starting the config file search at `start`
    pub fn discover(start: &Path, env: &EnvVars) -> Result<Self> {
        match find_config_file(start) {
            Some(path) => {
                let file = load_config_file(&path)?;
                Ok(Self::from_file(file, Some(path), env))
            }
            None => Ok(Self::defaults(start, env)),
        }
    }

    /// Defaults relative to `base`
    pub fn defaults(base: &Path, env: &EnvVars) -> Self {
        let decks = base.join(DEFAULT_DECKS);
        let mut credentials_files = vec![base.join(DEFAULT_CREDENTIALS_FILE)];
        credentials_files.extend(user_credentials_file());

        Self {
            input: base.join(DEFAULT_INPUT),
            output: base.join(DEFAULT_OUTPUT),
            processing: decks.join(PROCESSING_SUBDIR),
            decks,
            api_base: env
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            env_api_key: env.api_key.clone(),
            credentials_files,
            config_file: None,
        }
    }

    fn from_file(file: ConfigFile, config_path: Option<PathBuf>, env: &EnvVars) -> Self {
        // Base directory is the parent of .ytmeta/ (i.e., grandparent of config.yaml)
        let base_dir = config_path
            .as_deref()
            .and_then(Path::parent)
            .and_then(Path::parent)
            .unwrap_or(Path::new("."))
            .to_path_buf();

        let mut config = Self::defaults(&base_dir, env);
        config.config_file = config_path;

        let paths = file.paths;
        if let Some(ref p) = paths.input {
            config.input = resolve_path(&base_dir, p);
        }
        if let Some(ref p) = paths.output {
            config.output = resolve_path(&base_dir, p);
        }
        if let Some(ref p) = paths.decks {
            config.decks = resolve_path(&base_dir, p);
            config.processing = config.decks.join(PROCESSING_SUBDIR);
        }
        if let Some(ref p) = paths.processing {
            config.processing = resolve_path(&base_dir, p);
        }

        if let Some(api) = file.api {
            if env.api_base.is_none() {
                if let Some(base_url) = api.base_url {
                    config.api_base = base_url;
                }
            }
            if let Some(timeout) = api.timeout_seconds {
                config.timeout_seconds = timeout;
            }
            if let Some(ref creds) = api.credentials_file {
                config.credentials_files[0] = resolve_path(&base_dir, creds);
            }
        }

        config
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Resolve the API key: explicit flag, then environment, then credential files
    pub fn resolve_credential(&self, explicit: Option<String>) -> Result<Credential, ConfigError> {
        if let Some(key) = non_empty(explicit) {
            return Ok(Credential {
                key,
                source: CredentialSource::Flag,
            });
        }

        if let Some(key) = non_empty(self.env_api_key.clone()) {
            return Ok(Credential {
                key,
                source: CredentialSource::Environment,
            });
        }

        for path in &self.credentials_files {
            if let Some(key) = read_credential_file(path)? {
                return Ok(Credential {
                    key,
                    source: CredentialSource::File(path.clone()),
                });
            }
        }

        Err(ConfigError::MissingCredential {
            env_var: API_KEY_ENV,
            searched: self.credentials_files.clone(),
        })
    }

    /// Build the fetcher configuration around a resolved key
    pub fn fetcher_config(&self, credential: &Credential) -> FetcherConfig {
        FetcherConfig::new(credential.key.clone())
            .with_api_base(self.api_base.clone())
            .with_timeout(self.timeout())
    }
}

/// Per-user credential file (~/.config/ytmeta/api-key on Linux)
fn user_credentials_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ytmeta").join("api-key"))
}

/// First non-empty, non-comment line of a credential file; `None` if the file is absent
fn read_credential_file(path: &Path) -> Result<Option<String>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::CredentialFile {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    Ok(content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string))
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".ytmeta").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(root: &Path, body: &str) -> PathBuf {
        let dir = root.join(".ytmeta");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", body).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let temp = TempDir::new().unwrap();
        let config = ResolvedConfig::discover(temp.path(), &EnvVars::default()).unwrap();

        assert!(config.config_file.is_none());
        assert_eq!(config.input, temp.path().join("videos.txt"));
        assert_eq!(config.output, temp.path().join("output"));
        assert_eq!(config.decks, temp.path().join("../decks"));
        assert_eq!(config.processing, temp.path().join("../decks/processing"));
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(
            config.credentials_files[0],
            temp.path().join(".youtube-api-key")
        );
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            temp.path(),
            r#"
version: "1.0"
paths:
  input: lists/videos.txt
  decks: /srv/decks
api:
  base_url: http://localhost:9999/v3
  timeout_seconds: 5
  credentials_file: secrets/key.txt
"#,
        );

        let file = load_config_file(&path).unwrap();
        assert_eq!(file.version, "1.0");
        assert_eq!(file.paths.input, Some("lists/videos.txt".to_string()));
        assert!(file.paths.output.is_none());
        assert_eq!(file.api.as_ref().unwrap().timeout_seconds, Some(5));
    }

    #[test]
    fn test_discover_from_nested_directory() {
        let temp = TempDir::new().unwrap();
        write_config(
            temp.path(),
            r#"
version: "1.0"
paths:
  input: lists/videos.txt
  decks: /srv/decks
api:
  base_url: http://localhost:9999/v3
  timeout_seconds: 5
  credentials_file: secrets/key.txt
"#,
        );
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = ResolvedConfig::discover(&nested, &EnvVars::default()).unwrap();

        assert!(config.config_file.is_some());
        assert_eq!(config.input, temp.path().join("lists/videos.txt"));
        assert_eq!(config.output, temp.path().join("output"));
        assert_eq!(config.decks, PathBuf::from("/srv/decks"));
        assert_eq!(config.processing, PathBuf::from("/srv/decks/processing"));
        assert_eq!(config.api_base, "http://localhost:9999/v3");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(
            config.credentials_files[0],
            temp.path().join("secrets/key.txt")
        );
    }

    #[test]
    fn test_env_api_base_wins_over_file() {
        let temp = TempDir::new().unwrap();
        write_config(
            temp.path(),
            "version: \"1.0\"\napi:\n  base_url: http://from-file/v3\n",
        );
        let env = EnvVars {
            api_key: None,
            api_base: Some("http://from-env/v3".to_string()),
        };

        let config = ResolvedConfig::discover(temp.path(), &env).unwrap();
        assert_eq!(config.api_base, "http://from-env/v3");
    }

    #[test]
    fn test_explicit_processing_dir() {
        let temp = TempDir::new().unwrap();
        write_config(
            temp.path(),
            "version: \"1.0\"\npaths:\n  decks: decks\n  processing: inbox\n",
        );

        let config = ResolvedConfig::discover(temp.path(), &EnvVars::default()).unwrap();
        assert_eq!(config.decks, temp.path().join("decks"));
        assert_eq!(config.processing, temp.path().join("inbox"));
    }

    #[test]
    fn test_credential_precedence() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".youtube-api-key"), "from-file\n").unwrap();
        let env = EnvVars {
            api_key: Some("from-env".to_string()),
            api_base: None,
        };
        let config = ResolvedConfig::defaults(temp.path(), &env);

        let cred = config
            .resolve_credential(Some("from-flag".to_string()))
            .unwrap();
        assert_eq!(cred.key, "from-flag");
        assert_eq!(cred.source, CredentialSource::Flag);

        let cred = config.resolve_credential(None).unwrap();
        assert_eq!(cred.key, "from-env");
        assert_eq!(cred.source, CredentialSource::Environment);
    }

    #[test]
    fn test_credential_file_fallback() {
        let temp = TempDir::new().unwrap();
        let key_path = temp.path().join(".youtube-api-key");
        std::fs::write(&key_path, "# comment\n\n  AIza-test-key  \nignored\n").unwrap();
        let config = ResolvedConfig::defaults(temp.path(), &EnvVars::default());

        let cred = config.resolve_credential(Some("   ".to_string())).unwrap();
        assert_eq!(cred.key, "AIza-test-key");
        assert_eq!(cred.source, CredentialSource::File(key_path));
        assert!(!format!("{:?}", cred).contains("AIza-test-key"));
    }

    #[test]
    fn test_missing_credential() {
        let temp = TempDir::new().unwrap();
        let mut config = ResolvedConfig::defaults(temp.path(), &EnvVars::default());
        // Keep the lookup inside the temp dir
        config.credentials_files.truncate(1);

        let err = config.resolve_credential(None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
        assert!(err.to_string().contains("YOUTUBE_API_KEY"));
    }

    #[test]
    fn test_fetcher_config_from_resolved() {
        let temp = TempDir::new().unwrap();
        let mut config = ResolvedConfig::defaults(temp.path(), &EnvVars::default());
        config.api_base = "http://localhost:1/v3".to_string();
        config.timeout_seconds = 7;

        let cred = Credential {
            key: "k".to_string(),
            source: CredentialSource::Environment,
        };
        let fetcher = config.fetcher_config(&cred);
        assert_eq!(fetcher.api_key, "k");
        assert_eq!(fetcher.videos_url(), "http://localhost:1/v3/videos");
        assert_eq!(fetcher.timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/./subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
