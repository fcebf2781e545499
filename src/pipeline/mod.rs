pub mod extract;
pub mod prompt;
pub mod tokens;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use crate::core::config::AppConfig;
use crate::core::error::{AnalysisError, ReportError, SessionStateError};
use crate::core::model::{self, Model};
use crate::core::session::{AnalysisSession, DocumentSource, Step, UsageRecord};
use crate::providers;
use crate::report;

/// Everything the operator sees after a successful run.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub model: Model,
    pub prompt_token_estimate: usize,
    pub usage: UsageRecord,
    pub cost: Option<f64>,
    pub output_path: PathBuf,
}

/// Runs the full pipeline for a session sitting in Processing: extract the
/// base prompt and the edital, assemble, pick a model under the token budget,
/// stream the completion, and materialize the report. Strictly sequential;
/// the streaming call blocks this flow until drained or failed. Any error is
/// terminal for the attempt — the caller must reset the session to retry.
pub async fn run_analysis(
    session: &mut AnalysisSession,
    config: &AppConfig,
    on_fragment: impl FnMut(&str),
) -> Result<AnalysisOutcome, AnalysisError> {
    if session.step != Step::Processing {
        return Err(SessionStateError::InvalidTransition {
            step: session.step.to_string(),
            action: "run_analysis",
        }
        .into());
    }

    let jurisdiction = session.jurisdiction.ok_or(SessionStateError::InvalidTransition {
        step: session.step.to_string(),
        action: "run_analysis (missing jurisdiction)",
    })?;
    let completeness = session.document_complete.ok_or(SessionStateError::InvalidTransition {
        step: session.step.to_string(),
        action: "run_analysis (missing completeness)",
    })?;

    let base_prompt_path = config.resolve(&config.base_prompt_path);
    tracing::debug!(path = %base_prompt_path.display(), "reading base instruction prompt");
    let base_prompt = extract::extract_file(&base_prompt_path)?;

    let document_text = match &session.source {
        Some(DocumentSource::File(path)) => extract::extract_file(path)?,
        Some(DocumentSource::Memory(bytes)) => extract::extract_bytes(bytes)?,
        None => {
            return Err(SessionStateError::InvalidTransition {
                step: session.step.to_string(),
                action: "run_analysis (missing document)",
            }
            .into())
        }
    };

    let prompt = prompt::assemble(&base_prompt, jurisdiction, completeness, &document_text);

    // Budget estimate against the default model's vocabulary; the selector
    // threshold is a heuristic, not the remote service's real limit.
    let token_estimate = tokens::count_tokens(&prompt, &config.selector.default_model.0);
    let model = model::select_model(
        token_estimate,
        &config.selector.default_model,
        &config.selector.fallback_model,
        config.selector.threshold_tokens,
    )?;
    tracing::info!(
        tokens = token_estimate,
        model = %model.id,
        "model selected for analysis"
    );

    let provider = providers::create_provider(config, model.clone())
        .map_err(AnalysisError::from)?;
    let stream = provider
        .stream_completion(&prompt)
        .await
        .map_err(AnalysisError::from)?;
    let (final_text, usage) = providers::drain_completion(stream, on_fragment)
        .await
        .map_err(AnalysisError::from)?;
    tracing::info!(
        prompt_tokens = usage.prompt_tokens,
        completion_tokens = usage.completion_tokens,
        "completion stream drained"
    );

    let cost = if config.client.cost_summary {
        Some(model::estimate_cost(
            &model.id,
            usage.prompt_tokens,
            usage.completion_tokens,
        )?)
    } else {
        None
    };

    let template_path = config.resolve(&config.template_path);
    let output_path = write_report_in(&std::env::temp_dir(), &template_path, &final_text)?;

    session.complete(final_text, usage, model.id.clone(), output_path.clone())?;

    Ok(AnalysisOutcome {
        model,
        prompt_token_estimate: token_estimate,
        usage,
        cost,
        output_path,
    })
}

/// Materializes the report into temp storage under `dir`. The file is kept
/// only once generation succeeds, so a failed run leaves nothing behind; the
/// kept file outlives the session so the operator can fetch it, cleanup is
/// the environment's job.
fn write_report_in(
    dir: &std::path::Path,
    template_path: &std::path::Path,
    analysis_text: &str,
) -> Result<PathBuf, ReportError> {
    let file = tempfile::Builder::new()
        .prefix("instrucao_padronizada_")
        .suffix(".docx")
        .tempfile_in(dir)
        .map_err(|e| ReportError::Write(e.to_string()))?;
    report::generate(template_path, file.path(), analysis_text)?;
    let (_, path) = file.keep().map_err(|e| ReportError::Write(e.to_string()))?;
    Ok(path)
}
