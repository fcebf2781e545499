
use std::fs;
use std::path::Path;

use docx_rs::{read_docx, DocumentChild, Paragraph, ParagraphChild, Run, RunChild};

use crate::core::error::ReportError;

/// Placeholder text inside the report template. Matched by substring,
/// case-sensitive.
pub const MARKER_PHRASE: &str = "Reproduzir integralmente resultado da etapa";

/// MIME type the generated report is served under.
pub const REPORT_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Loads the template, replaces the full text of every paragraph containing
/// the marker phrase with `analysis_text`, and writes the result to
/// `output_path` (created or overwritten).
///
/// A template with no marker paragraph is copied through byte-identical. That
/// silent pass-through is long-standing documented behavior; the warning below
/// is the only concession to it being suspicious.
pub fn generate(
    template_path: &Path,
    output_path: &Path,
    analysis_text: &str,
) -> Result<(), ReportError> {
    let bytes = fs::read(template_path).map_err(|e| ReportError::Template(e.to_string()))?;
    let mut docx = read_docx(&bytes).map_err(|e| ReportError::Template(e.to_string()))?;

    let mut replaced = false;
    for child in &mut docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            if paragraph_text(paragraph).contains(MARKER_PHRASE) {
                paragraph.children = vec![ParagraphChild::Run(Box::new(
                    Run::new().add_text(analysis_text),
                ))];
                replaced = true;
            }
        }
    }

    if !replaced {
        tracing::warn!(
            template = %template_path.display(),
            "no paragraph contains the marker phrase; template copied unchanged"
        );
        fs::copy(template_path, output_path).map_err(|e| ReportError::Write(e.to_string()))?;
        return Ok(());
    }

    let mut file = fs::File::create(output_path).map_err(|e| ReportError::Write(e.to_string()))?;
    docx.build()
        .pack(&mut file)
        .map_err(|e| ReportError::Write(e.to_string()))?;
    Ok(())
}

/// Plain text of a paragraph: its runs' text nodes concatenated.
fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                if let RunChild::Text(t) = run_child {
                    text.push_str(&t.text);
                }
            }
        }
    }
    text
}
