use std::path::Path;

use lopdf::Document;

use crate::core::error::ExtractionError;

/// Extracts the plain text of a PDF on disk. The file is opened and closed
/// here; nothing about it is left for the caller to clean up.
pub fn extract_file(path: &Path) -> Result<String, ExtractionError> {
    let doc = Document::load(path).map_err(|e| ExtractionError::Open(e.to_string()))?;
    Ok(extract_pages(&doc))
}

/// Extracts the plain text of a PDF already in memory.
pub fn extract_bytes(bytes: &[u8]) -> Result<String, ExtractionError> {
    let doc =
        Document::load_mem(bytes).map_err(|e| ExtractionError::InvalidDocument(e.to_string()))?;
    Ok(extract_pages(&doc))
}

/// Page texts joined with a single newline. A page that yields no text (or
/// that fails individually, as scanned pages do) contributes nothing.
fn extract_pages(doc: &Document) -> String {
    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys() {
        let text = match doc.extract_text(&[*page_number]) {
            Ok(t) => t,
            Err(e) => {
                tracing::debug!(page = page_number, error = %e, "page yielded no text");
                continue;
            }
        };
        // lopdf terminates each page's text with a newline of its own
        let text = text.strip_suffix('\n').unwrap_or(&text);
        if !text.is_empty() {
            pages.push(text.to_string());
        }
    }
    pages.join("\n")
}
