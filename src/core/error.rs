use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Session error: {0}")]
    Session(#[from] SessionStateError),
}

/// Source document could not be read as a PDF.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Cannot open source: {0}")]
    Open(String),

    #[error("Not a valid PDF document: {0}")]
    InvalidDocument(String),
}

/// The remote LLM service rejected or errored the request.
#[derive(Error, Debug, Clone)]
pub enum ServiceError {
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Missing API key: {0}")]
    MissingApiKey(String),
}

/// Connection-level failure before or during the response stream.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Stream error: {0}")]
    Stream(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file error: {0}")]
    File(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No price entry for model: {0}")]
    MissingPrice(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Cannot read template: {0}")]
    Template(String),

    #[error("Cannot write output document: {0}")]
    Write(String),
}

#[derive(Error, Debug)]
pub enum SessionStateError {
    #[error("Action '{action}' is not valid in step {step}")]
    InvalidTransition { step: String, action: &'static str },
}
