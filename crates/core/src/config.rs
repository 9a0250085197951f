//! Configuration management for the Smart City Assistant.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config file (`.civic/config.yaml` or an explicit path)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources win. Relative paths are resolved against the workspace root.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Completion providers the service knows how to construct.
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["ollama"];

/// Embedding providers the knowledge store knows how to construct.
pub const KNOWN_EMBEDDING_PROVIDERS: &[&str] = &["ollama", "trigram"];

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .civic/)
    pub workspace: PathBuf,

    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    /// Knowledge base and vector store settings
    pub knowledge: KnowledgeSettings,

    /// Completion provider settings
    pub llm: LlmSettings,

    /// Embedding provider settings
    pub embedding: EmbeddingSettings,

    /// HTTP service settings
    pub server: ServerSettings,

    /// Log filter override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON
    pub log_json: bool,
}

/// Knowledge base settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KnowledgeSettings {
    /// JSON knowledge-base file
    pub path: PathBuf,

    /// SQLite vector store location
    pub store: PathBuf,

    /// Reject entries without an explicit `id` instead of deriving one
    pub require_ids: bool,

    /// Documents retrieved per query
    pub top_k: usize,

    /// Sources returned per answer
    pub max_sources: usize,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("knowledge.json"),
            store: PathBuf::from(".civic/store/city_knowledge.sqlite"),
            require_ids: false,
            top_k: 3,
            max_sources: 3,
        }
    }
}

/// Completion provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmSettings {
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    /// Per-request timeout; the HTTP client default applies when unset
    pub timeout_secs: Option<u64>,
    /// Sampling temperature (0.0 - 2.0); the model default applies when unset
    pub temperature: Option<f32>,
    /// Cap on generated tokens
    pub max_tokens: Option<u32>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            endpoint: DEFAULT_OLLAMA_URL.to_string(),
            model: "llama2".to_string(),
            timeout_secs: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingSettings {
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    pub dimensions: usize,
    pub batch_size: usize,
    pub timeout_secs: Option<u64>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            endpoint: DEFAULT_OLLAMA_URL.to_string(),
            model: "mxbai-embed-large".to_string(),
            dimensions: 1024,
            batch_size: 32,
            timeout_secs: None,
        }
    }
}

/// HTTP service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Where chat clients send their questions
    pub backend_url: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            backend_url: "http://localhost:8000".to_string(),
        }
    }
}

/// Full configuration file structure. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    knowledge: Option<KnowledgeSettings>,
    llm: Option<LlmSettings>,
    embedding: Option<EmbeddingSettings>,
    server: Option<ServerSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

/// Command-line overrides, applied last.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub knowledge_base: Option<PathBuf>,
    pub store: Option<PathBuf>,
    pub llm_model: Option<String>,
    pub embedding_model: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub backend_url: Option<String>,
    pub log_level: Option<String>,
    pub verbose: bool,
    pub no_color: bool,
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            knowledge: KnowledgeSettings::default(),
            llm: LlmSettings::default(),
            embedding: EmbeddingSettings::default(),
            server: ServerSettings::default(),
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment and defaults.
    ///
    /// Environment variables:
    /// - `CIVIC_WORKSPACE`: Override workspace path
    /// - `CIVIC_CONFIG`: Path to config file
    /// - `CIVIC_KNOWLEDGE_BASE`, `CIVIC_STORE`: Knowledge file and store path
    /// - `OLLAMA_BASE_URL`: Endpoint for both completion and embedding providers
    /// - `CIVIC_LLM_PROVIDER`, `CIVIC_LLM_MODEL`
    /// - `CIVIC_EMBEDDING_PROVIDER`, `CIVIC_EMBEDDING_MODEL`
    /// - `CIVIC_HOST`, `CIVIC_PORT`, `CIVIC_BACKEND_URL`
    /// - `RUST_LOG`: Log filter
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use civic_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None, None).expect("Failed to load config");
    /// println!("Store: {:?}", config.store_path());
    /// ```
    pub fn load(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        Self::load_with_env(workspace, config_file, |key| std::env::var(key).ok())
    }

    /// Load configuration with an explicit environment lookup.
    pub fn load_with_env<F>(
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        env: F,
    ) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| env("CIVIC_WORKSPACE").map(PathBuf::from)) {
            config.workspace = workspace;
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let explicit_file = config_file.or_else(|| env("CIVIC_CONFIG").map(PathBuf::from));
        let config_path = match explicit_file {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                Some(path)
            }
            None => {
                let default_path = config.civic_dir().join("config.yaml");
                default_path.exists().then_some(default_path)
            }
        };

        if let Some(path) = config_path {
            config.merge_yaml(&path)?;
            config.config_file = Some(path);
        }

        config.apply_env(env)?;

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(knowledge) = config_file.knowledge {
            self.knowledge = knowledge;
        }
        if let Some(llm) = config_file.llm {
            self.llm = llm;
        }
        if let Some(embedding) = config_file.embedding {
            self.embedding = embedding;
        }
        if let Some(server) = config_file.server {
            self.server = server;
        }
        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
            if let Some(json) = logging.json {
                self.log_json = json;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(())
    }

    /// Environment variables override the YAML config.
    fn apply_env<F>(&mut self, env: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = env("CIVIC_KNOWLEDGE_BASE") {
            self.knowledge.path = PathBuf::from(path);
        }
        if let Some(store) = env("CIVIC_STORE") {
            self.knowledge.store = PathBuf::from(store);
        }
        if let Some(url) = env("OLLAMA_BASE_URL") {
            self.llm.endpoint = url.clone();
            self.embedding.endpoint = url;
        }
        if let Some(provider) = env("CIVIC_LLM_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Some(model) = env("CIVIC_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(provider) = env("CIVIC_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }
        if let Some(model) = env("CIVIC_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(host) = env("CIVIC_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env("CIVIC_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| AppError::Config(format!("Invalid CIVIC_PORT: {}", port)))?;
        }
        if let Some(url) = env("CIVIC_BACKEND_URL") {
            self.server.backend_url = url;
        }
        if let Some(level) = env("RUST_LOG") {
            self.log_level = Some(level);
        }
        if env("NO_COLOR").is_some() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and
    /// the config file.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(path) = overrides.knowledge_base {
            self.knowledge.path = path;
        }
        if let Some(store) = overrides.store {
            self.knowledge.store = store;
        }
        if let Some(model) = overrides.llm_model {
            self.llm.model = model;
        }
        if let Some(model) = overrides.embedding_model {
            self.embedding.model = model;
        }
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(url) = overrides.backend_url {
            self.server.backend_url = url;
        }
        if let Some(log_level) = overrides.log_level {
            self.log_level = Some(log_level);
        }

        if overrides.verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if overrides.no_color {
            self.no_color = true;
        }
        if overrides.log_json {
            self.log_json = true;
        }

        self
    }

    /// Get the path to the .civic directory.
    pub fn civic_dir(&self) -> PathBuf {
        self.workspace.join(".civic")
    }

    /// Knowledge-base file, resolved against the workspace.
    pub fn knowledge_base_path(&self) -> PathBuf {
        self.resolve(&self.knowledge.path)
    }

    /// Vector store location, resolved against the workspace.
    pub fn store_path(&self) -> PathBuf {
        self.resolve(&self.knowledge.store)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Validate provider names and numeric limits.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_LLM_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown LLM provider: {}. Supported: {}",
                self.llm.provider,
                KNOWN_LLM_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if let Some(temperature) = self.llm.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(AppError::Config(format!(
                    "llm.temperature must be between 0.0 and 2.0, got {}",
                    temperature
                )));
            }
        }

        if self.knowledge.top_k == 0 {
            return Err(AppError::Config("knowledge.topK must be at least 1".to_string()));
        }
        if self.knowledge.max_sources == 0 {
            return Err(AppError::Config(
                "knowledge.maxSources must be at least 1".to_string(),
            ));
        }
        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding.dimensions must be at least 1".to_string(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "embedding.batchSize must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.model, "llama2");
        assert_eq!(config.embedding.model, "mxbai-embed-large");
        assert_eq!(config.knowledge.top_k, 3);
        assert_eq!(config.knowledge.max_sources, 3);
        assert_eq!(config.server.port, 8000);
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_paths_resolve_against_workspace() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load_with_env(Some(temp.path().to_path_buf()), None, no_env)
            .unwrap();

        assert_eq!(config.knowledge_base_path(), temp.path().join("knowledge.json"));
        assert!(config.store_path().starts_with(temp.path()));
        assert!(config.civic_dir().ends_with(".civic"));
    }

    #[test]
    fn test_missing_workspace_is_rejected() {
        let result = AppConfig::load_with_env(
            Some(PathBuf::from("/definitely/not/a/workspace")),
            None,
            no_env,
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_yaml_partial_sections_keep_defaults() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join(".civic")).unwrap();
        std::fs::write(
            temp.path().join(".civic/config.yaml"),
            "llm:\n  model: mistral\n  temperature: 0.2\n  maxTokens: 512\nembedding:\n  provider: trigram\n  dimensions: 256\nlogging:\n  color: false\n",
        )
        .unwrap();

        let config =
            AppConfig::load_with_env(Some(temp.path().to_path_buf()), None, no_env).unwrap();

        assert_eq!(config.llm.model, "mistral");
        assert_eq!(config.llm.endpoint, "http://localhost:11434");
        assert_eq!(config.llm.temperature, Some(0.2));
        assert_eq!(config.llm.max_tokens, Some(512));
        assert_eq!(config.embedding.provider, "trigram");
        assert_eq!(config.embedding.dimensions, 256);
        assert_eq!(config.embedding.batch_size, 32);
        assert!(config.no_color);
        assert!(config.config_file.is_some());
    }

    #[test]
    fn test_env_overrides_yaml() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("custom.yaml");
        std::fs::write(&file, "server:\n  port: 9000\n").unwrap();

        let env: HashMap<&str, &str> = [
            ("OLLAMA_BASE_URL", "http://ollama:11434"),
            ("CIVIC_PORT", "9100"),
            ("CIVIC_STORE", "/var/lib/civic/store.sqlite"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::load_with_env(Some(temp.path().to_path_buf()), Some(file), |k| {
            env.get(k).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.llm.endpoint, "http://ollama:11434");
        assert_eq!(config.embedding.endpoint, "http://ollama:11434");
        assert_eq!(
            config.store_path(),
            PathBuf::from("/var/lib/civic/store.sqlite")
        );
    }

    #[test]
    fn test_invalid_port_env() {
        let temp = TempDir::new().unwrap();
        let result = AppConfig::load_with_env(Some(temp.path().to_path_buf()), None, |k| {
            (k == "CIVIC_PORT").then(|| "eighty".to_string())
        });
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_explicit_config_file_must_exist() {
        let temp = TempDir::new().unwrap();
        let result = AppConfig::load_with_env(
            Some(temp.path().to_path_buf()),
            Some(temp.path().join("missing.yaml")),
            no_env,
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(ConfigOverrides {
            llm_model: Some("llama3".to_string()),
            port: Some(8080),
            verbose: true,
            ..Default::default()
        });

        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.server.port, 8080);
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.llm.provider = "unknown".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.embedding.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_limits() {
        let mut config = AppConfig::default();
        config.knowledge.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.knowledge.max_sources = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.llm.temperature = Some(2.5);
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        config.llm.temperature = Some(0.7);
        assert!(config.validate().is_ok());
    }
}
