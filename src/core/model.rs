use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::core::error::ConfigError;

#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ModelId(pub String);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        ModelId(s.to_string())
    }
}

/// USD per million tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPricing {
    pub cost_per_1m_input: f64,
    pub cost_per_1m_output: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub id: ModelId,
    pub display_name: String,
    pub context_window: u64,
    pub max_output_tokens: u64,
    pub pricing: ModelPricing,
}

impl Model {
    pub fn calculate_cost(&self, prompt_tokens: u64, completion_tokens: u64) -> f64 {
        let input_cost =
            (prompt_tokens as f64 / 1_000_000.0) * self.pricing.cost_per_1m_input;
        let output_cost =
            (completion_tokens as f64 / 1_000_000.0) * self.pricing.cost_per_1m_output;
        round4(input_cost + output_cost)
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

pub const DEFAULT_MODEL_ID: &str = "gpt-4o";
pub const FALLBACK_MODEL_ID: &str = "gpt-4.1";

/// Prompts at or below this token count go to the default model; anything
/// larger goes to the long-context fallback.
pub const CONTEXT_THRESHOLD_TOKENS: usize = 120_000;

pub fn builtin_models() -> HashMap<ModelId, Model> {
    let mut m = HashMap::new();

    m.insert(
        ModelId(DEFAULT_MODEL_ID.into()),
        Model {
            id: ModelId(DEFAULT_MODEL_ID.into()),
            display_name: "GPT-4o".into(),
            context_window: 128_000,
            max_output_tokens: 16_384,
            pricing: ModelPricing {
                cost_per_1m_input: 2.50,
                cost_per_1m_output: 10.00,
            },
        },
    );

    // Long-context fallback for editais that blow past the GPT-4o window
    m.insert(
        ModelId(FALLBACK_MODEL_ID.into()),
        Model {
            id: ModelId(FALLBACK_MODEL_ID.into()),
            display_name: "GPT-4.1".into(),
            context_window: 1_047_576,
            max_output_tokens: 32_768,
            pricing: ModelPricing {
                cost_per_1m_input: 2.00,
                cost_per_1m_output: 8.00,
            },
        },
    );

    m
}

pub fn get_model(id: &ModelId) -> Option<Model> {
    builtin_models().remove(id)
}

pub fn get_default_model() -> Result<Model, ConfigError> {
    get_model(&ModelId(DEFAULT_MODEL_ID.into()))
        .ok_or_else(|| ConfigError::UnknownModel(DEFAULT_MODEL_ID.into()))
}

/// Threshold rule for picking the request model. Deterministic: the selection
/// never looks at the remote service's actual context limit and is never
/// revisited after a rejection.
pub fn select_model(
    prompt_tokens: usize,
    default_model: &ModelId,
    fallback_model: &ModelId,
    threshold: usize,
) -> Result<Model, ConfigError> {
    let chosen = if prompt_tokens <= threshold {
        default_model
    } else {
        fallback_model
    };
    get_model(chosen).ok_or_else(|| ConfigError::UnknownModel(chosen.0.clone()))
}

/// Monetary estimate for one completed call, rounded to 4 decimal places.
/// A model with no price entry is a configuration fault, never a zero cost.
pub fn estimate_cost(
    model: &ModelId,
    prompt_tokens: u64,
    completion_tokens: u64,
) -> Result<f64, ConfigError> {
    let model = get_model(model).ok_or_else(|| ConfigError::MissingPrice(model.0.clone()))?;
    Ok(model.calculate_cost(prompt_tokens, completion_tokens))
}
