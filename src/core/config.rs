use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::error::ConfigError;
use crate::core::model::{ModelId, CONTEXT_THRESHOLD_TOKENS, DEFAULT_MODEL_ID, FALLBACK_MODEL_ID};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// API key for the OpenAI-compatible service
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// PDF holding the fixed base-instruction prompt
    #[serde(default = "default_base_prompt_path")]
    pub base_prompt_path: PathBuf,

    /// DOCX report template with the marker paragraph
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,

    #[serde(default)]
    pub selector: SelectorConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub debug: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_working_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn default_base_prompt_path() -> PathBuf {
    PathBuf::from("prompt_edital.pdf")
}

fn default_template_path() -> PathBuf {
    PathBuf::from("padrao_instrucao_arq.docx")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            working_dir: default_working_dir(),
            api_key: None,
            base_url: default_base_url(),
            base_prompt_path: default_base_prompt_path(),
            template_path: default_template_path(),
            selector: SelectorConfig::default(),
            client: ClientConfig::default(),
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(default = "default_model")]
    pub default_model: ModelId,

    #[serde(default = "fallback_model")]
    pub fallback_model: ModelId,

    #[serde(default = "default_threshold")]
    pub threshold_tokens: usize,
}

fn default_model() -> ModelId {
    ModelId(DEFAULT_MODEL_ID.into())
}

fn fallback_model() -> ModelId {
    ModelId(FALLBACK_MODEL_ID.into())
}

fn default_threshold() -> usize {
    CONTEXT_THRESHOLD_TOKENS
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            fallback_model: fallback_model(),
            threshold_tokens: default_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u64,

    /// Echo fragments to the operator as they arrive
    #[serde(default = "default_true")]
    pub live_output: bool,

    /// Compute and display the cost estimate after completion
    #[serde(default = "default_true")]
    pub cost_summary: bool,
}

fn default_max_tokens() -> u64 {
    4_096
}

fn default_true() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            live_output: true,
            cost_summary: true,
        }
    }
}

pub fn load_config(working_dir: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    let wd = working_dir.unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    let mut config = AppConfig::default();
    config.working_dir = wd.clone();

    // Global config
    if let Some(config_dir) = dirs::config_dir() {
        let global_path = config_dir.join("edital-analyzer").join("config.json");
        if global_path.exists() {
            let content = std::fs::read_to_string(&global_path)
                .map_err(|e| ConfigError::File(e.to_string()))?;
            let file_config: AppConfig = serde_json::from_str(&content)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            merge_config(&mut config, file_config);
        }
    }

    // Local project config
    let local_path = wd.join("edital-analyzer.json");
    if local_path.exists() {
        let content = std::fs::read_to_string(&local_path)
            .map_err(|e| ConfigError::File(e.to_string()))?;
        let file_config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        merge_config(&mut config, file_config);
    }

    detect_api_key(&mut config);

    Ok(config)
}

fn merge_config(base: &mut AppConfig, overlay: AppConfig) {
    if overlay.api_key.is_some() {
        base.api_key = overlay.api_key;
    }
    if overlay.base_url != default_base_url() {
        base.base_url = overlay.base_url;
    }
    if overlay.base_prompt_path != default_base_prompt_path() {
        base.base_prompt_path = overlay.base_prompt_path;
    }
    if overlay.template_path != default_template_path() {
        base.template_path = overlay.template_path;
    }
    if overlay.selector.default_model != default_model() {
        base.selector.default_model = overlay.selector.default_model;
    }
    if overlay.selector.fallback_model != fallback_model() {
        base.selector.fallback_model = overlay.selector.fallback_model;
    }
    if overlay.selector.threshold_tokens != default_threshold() {
        base.selector.threshold_tokens = overlay.selector.threshold_tokens;
    }
    if overlay.client.max_tokens != default_max_tokens() {
        base.client.max_tokens = overlay.client.max_tokens;
    }
    if !overlay.client.live_output {
        base.client.live_output = false;
    }
    if !overlay.client.cost_summary {
        base.client.cost_summary = false;
    }
    if overlay.debug {
        base.debug = true;
    }
}

fn detect_api_key(config: &mut AppConfig) {
    if config.api_key.is_some() {
        return;
    }
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        if !key.is_empty() {
            config.api_key = Some(key);
        }
    }
}

impl AppConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Fixed local inputs are resolved relative to the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }
}
