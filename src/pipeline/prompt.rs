use crate::core::session::{Completeness, Jurisdiction};

const CLOSING_INSTRUCTION: &str =
    "Inicie a análise conforme as instruções detalhadas no prompt-base.";

/// Builds the outbound prompt: base instruction, metadata header, the full
/// document text untouched, closing instruction. Pure; never truncates —
/// oversized prompts are the model selector's problem, not this function's.
pub fn assemble(
    base_instruction: &str,
    jurisdiction: Jurisdiction,
    document_complete: Completeness,
    document_text: &str,
) -> String {
    format!(
        "{base_instruction}\n\n{header}{document_text}\n{CLOSING_INSTRUCTION}",
        header = header(jurisdiction, document_complete),
    )
}

fn header(jurisdiction: Jurisdiction, document_complete: Completeness) -> String {
    format!(
        "O edital a ser analisado é da esfera: {jurisdiction}.\n\
         Está legível e completo? {document_complete}.\n\
         Segue o texto integral do edital para análise técnica, normativa e \
         classificatória de riscos conforme o fluxo:\n\n"
    )
}
