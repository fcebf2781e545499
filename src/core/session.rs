use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::core::error::SessionStateError;
use crate::core::model::ModelId;

/// Governing body that issued the edital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Jurisdiction {
    Estadual,
    Municipal,
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Estadual => write!(f, "Estadual"),
            Self::Municipal => write!(f, "Municipal"),
        }
    }
}

/// Operator's answer to "is the document legible and complete?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Completeness {
    Sim,
    Nao,
}

impl fmt::Display for Completeness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sim => write!(f, "Sim"),
            Self::Nao => write!(f, "Não"),
        }
    }
}

/// Wizard position. Processing and Ready share ordinal 3; they are told apart
/// by whether the pipeline has delivered a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    AskJurisdiction,
    AskCompleteness,
    AwaitUpload,
    Processing,
    Ready,
}

impl Step {
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::AskJurisdiction => 0,
            Self::AskCompleteness => 1,
            Self::AwaitUpload => 2,
            Self::Processing | Self::Ready => 3,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AskJurisdiction => "AskJurisdiction",
            Self::AskCompleteness => "AskCompleteness",
            Self::AwaitUpload => "AwaitUpload",
            Self::Processing => "Processing",
            Self::Ready => "Ready",
        };
        write!(f, "{name}")
    }
}

/// Uploaded edital: a named file or bytes already in memory.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    File(PathBuf),
    Memory(Vec<u8>),
}

/// The remote service's authoritative token counts for one completed call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// One document analysis from first question to downloadable report. Owned by
/// a single operator flow; every mutation goes through these methods.
#[derive(Debug)]
pub struct AnalysisSession {
    pub id: String,
    pub step: Step,
    pub jurisdiction: Option<Jurisdiction>,
    pub document_complete: Option<Completeness>,
    pub source: Option<DocumentSource>,
    pub final_text: Option<String>,
    pub usage: Option<UsageRecord>,
    pub model_used: Option<ModelId>,
    pub output_path: Option<PathBuf>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            step: Step::AskJurisdiction,
            jurisdiction: None,
            document_complete: None,
            source: None,
            final_text: None,
            usage: None,
            model_used: None,
            output_path: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    pub fn answer_jurisdiction(
        &mut self,
        jurisdiction: Jurisdiction,
    ) -> Result<(), SessionStateError> {
        self.expect_step(Step::AskJurisdiction, "answer_jurisdiction")?;
        self.jurisdiction = Some(jurisdiction);
        self.step = Step::AskCompleteness;
        Ok(())
    }

    pub fn answer_completeness(
        &mut self,
        completeness: Completeness,
    ) -> Result<(), SessionStateError> {
        self.expect_step(Step::AskCompleteness, "answer_completeness")?;
        self.document_complete = Some(completeness);
        self.step = Step::AwaitUpload;
        Ok(())
    }

    pub fn attach_document(&mut self, source: DocumentSource) -> Result<(), SessionStateError> {
        self.expect_step(Step::AwaitUpload, "attach_document")?;
        self.source = Some(source);
        self.step = Step::Processing;
        Ok(())
    }

    /// Fired by the orchestrator once the whole pipeline succeeds. The report
    /// is only ever offered for download from Ready.
    pub fn complete(
        &mut self,
        final_text: String,
        usage: UsageRecord,
        model_used: ModelId,
        output_path: PathBuf,
    ) -> Result<(), SessionStateError> {
        self.expect_step(Step::Processing, "complete")?;
        self.final_text = Some(final_text);
        self.usage = Some(usage);
        self.model_used = Some(model_used);
        self.output_path = Some(output_path);
        self.error = None;
        self.step = Step::Ready;
        Ok(())
    }

    /// A failure keeps the session in Processing with a visible error; only an
    /// operator reset leaves this state. No partial result is retained.
    pub fn mark_failed(&mut self, message: String) {
        self.final_text = None;
        self.usage = None;
        self.model_used = None;
        self.output_path = None;
        self.error = Some(message);
    }

    /// Atomic return to step 0: the whole session value is replaced.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn has_failed(&self) -> bool {
        self.error.is_some()
    }

    fn expect_step(&self, expected: Step, action: &'static str) -> Result<(), SessionStateError> {
        if self.step != expected {
            return Err(SessionStateError::InvalidTransition {
                step: self.step.to_string(),
                action,
            });
        }
        Ok(())
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}
