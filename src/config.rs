use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use glob::Pattern;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = ".modcovrc.json";

/// Placeholder replaced by the module stem in `testFilePattern`.
pub const MODULE_PLACEHOLDER: &str = "{module}";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_src_dir")]
    pub src_dir: String,
    #[serde(default = "default_test_dir")]
    pub test_dir: String,
    #[serde(default = "default_module_extension")]
    pub module_extension: String,
    #[serde(default = "default_test_file_pattern")]
    pub test_file_pattern: String,
    #[serde(default = "default_exclude_modules")]
    pub exclude_modules: Vec<String>,
    #[serde(default)]
    pub ignores: Vec<String>,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_nested_namespaces")]
    pub nested_namespaces: Vec<String>,
    #[serde(default = "default_correlation_window")]
    pub correlation_window: usize,
    #[serde(default = "default_context_tokens")]
    pub context_tokens: usize,
    #[serde(default)]
    pub compiler: CompilerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerConfig {
    #[serde(default = "default_compiler_path")]
    pub path: String,
    #[serde(default = "default_compiler_args")]
    pub args: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_allowed_exit_codes")]
    pub allowed_exit_codes: Vec<i32>,
}

fn default_src_dir() -> String {
    "src".to_string()
}

fn default_test_dir() -> String {
    "test".to_string()
}

fn default_module_extension() -> String {
    "cppm".to_string()
}

fn default_test_file_pattern() -> String {
    "test_{module}.cpp".to_string()
}

fn default_exclude_modules() -> Vec<String> {
    vec!["std".to_string()]
}

fn default_namespace() -> String {
    "std".to_string()
}

fn default_nested_namespaces() -> Vec<String> {
    ["filesystem", "ranges"].map(String::from).to_vec()
}

fn default_correlation_window() -> usize {
    10
}

fn default_context_tokens() -> usize {
    10
}

fn default_compiler_path() -> String {
    "clang++".to_string()
}

fn default_compiler_args() -> Vec<String> {
    vec!["-std=c++20".to_string()]
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_allowed_exit_codes() -> Vec<i32> {
    vec![0]
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            path: default_compiler_path(),
            args: default_compiler_args(),
            timeout_secs: default_timeout_secs(),
            allowed_exit_codes: default_allowed_exit_codes(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            src_dir: default_src_dir(),
            test_dir: default_test_dir(),
            module_extension: default_module_extension(),
            test_file_pattern: default_test_file_pattern(),
            exclude_modules: default_exclude_modules(),
            ignores: Vec::new(),
            namespace: default_namespace(),
            nested_namespaces: default_nested_namespaces(),
            correlation_window: default_correlation_window(),
            context_tokens: default_context_tokens(),
            compiler: CompilerConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignores {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'ignores': \"{}\"", pattern))?;
        }

        if self.namespace.trim().is_empty() {
            bail!("'namespace' must not be empty");
        }
        if self.correlation_window == 0 {
            bail!("'correlationWindow' must be at least 1");
        }
        if !self.test_file_pattern.contains(MODULE_PLACEHOLDER) {
            bail!(
                "'testFilePattern' must contain {}: \"{}\"",
                MODULE_PLACEHOLDER,
                self.test_file_pattern
            );
        }
        if self.compiler.timeout_secs == 0 {
            bail!("'compiler.timeoutSecs' must be at least 1");
        }

        Ok(())
    }

    /// Test file name for a module stem, e.g. `format` -> `test_format.cpp`.
    pub fn test_file_name(&self, module: &str) -> String {
        self.test_file_pattern.replace(MODULE_PLACEHOLDER, module)
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// Path of the file the config came from; `None` when using defaults.
    pub path: Option<PathBuf>,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            Ok(ConfigLoadResult {
                config,
                path: Some(path),
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            path: None,
        }),
    }
}
