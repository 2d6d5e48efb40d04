use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use spendlens_finance::model_client::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BACKOFF_MS};
use spendlens_finance::ollama::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use spendlens_finance::{ModelClient, OllamaBackend, RetryPolicy, DEFAULT_BATCH_SIZE};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub model: ModelSection,
    pub report: ReportSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelSection {
    /// Ollama model tag, e.g. "llama3:8b"
    pub name: String,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Attempts per query, including the first
    pub max_retries: u32,
    /// Base delay before the first retry; doubles each retry. 0 = retry immediately.
    pub retry_backoff_ms: u64,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportSection {
    pub output_dir: PathBuf,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./reports"),
        }
    }
}

impl ModelSection {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn build_client(&self) -> ModelClient<OllamaBackend> {
        let backend = OllamaBackend::new(&self.name, &self.base_url)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        ModelClient::new(backend).with_retry(self.retry_policy())
    }
}

impl Config {
    /// Command-line flags win over the config file.
    pub fn with_overrides(mut self, model: Option<String>, base_url: Option<String>) -> Self {
        if let Some(m) = model {
            self.model.name = m;
        }
        if let Some(u) = base_url {
            self.model.base_url = u;
        }
        self
    }
}

/// `~/.spendlens/config.toml`. Nothing is created here.
pub fn config_path() -> Result<PathBuf> {
    let home = std::env::var_os("HOME").context("HOME is not set")?;
    Ok(config_path_under(Path::new(&home)))
}

fn config_path_under(home: &Path) -> PathBuf {
    home.join(".spendlens").join("config.toml")
}

/// Missing file → defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    save_config(path, &Config::default())?;
    println!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.model.name, "llama3:8b");
        assert_eq!(cfg.model.base_url, "http://localhost:11434");
        assert_eq!(cfg.model.timeout_secs, 30);
        assert_eq!(cfg.model.max_retries, 3);
        assert_eq!(cfg.model.batch_size, 10);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(&p, "[model]\nname = \"mistral\"\nretry_backoff_ms = 0\n").unwrap();

        let cfg = load_config(&p).unwrap();
        assert_eq!(cfg.model.name, "mistral");
        assert_eq!(cfg.model.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.model.retry_policy(), RetryPolicy::immediate(3));
        assert_eq!(cfg.report.output_dir, PathBuf::from("./reports"));
    }

    #[test]
    fn test_init_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        init_config(&p).unwrap();
        assert_eq!(load_config(&p).unwrap(), Config::default());
    }

    #[test]
    fn test_config_path_does_not_create_home() {
        let home = tempfile::tempdir().unwrap();
        let p = config_path_under(home.path());
        assert_eq!(p, home.path().join(".spendlens/config.toml"));
        assert!(!home.path().join(".spendlens").exists());
    }

    #[test]
    fn test_init_creates_missing_directory() {
        let home = tempfile::tempdir().unwrap();
        let p = config_path_under(home.path());
        init_config(&p).unwrap();
        assert_eq!(load_config(&p).unwrap(), Config::default());
    }

    #[test]
    fn test_flags_override_file() {
        let cfg = Config::default().with_overrides(Some("qwen2".into()), None);
        assert_eq!(cfg.model.name, "qwen2");
        assert_eq!(cfg.model.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_bad_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(&p, "[model\n").unwrap();
        assert!(load_config(&p).is_err());
    }
}
