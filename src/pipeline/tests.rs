use super::extract;
use super::prompt;
use super::tokens;
use super::write_report_in;

use crate::core::session::{Completeness, Jurisdiction};
use crate::report::MARKER_PHRASE;

use std::fs;
use std::path::Path;

use docx_rs::{Docx, Paragraph, Run};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

#[test]
fn test_assemble_layout() {
    let p = prompt::assemble(
        "PROMPT BASE",
        Jurisdiction::Municipal,
        Completeness::Sim,
        "Artigo 1. Texto do edital.",
    );
    assert!(p.starts_with("PROMPT BASE\n\n"));
    assert!(p.contains("O edital a ser analisado é da esfera: Municipal."));
    assert!(p.contains("Está legível e completo? Sim."));
    assert!(p.ends_with("Inicie a análise conforme as instruções detalhadas no prompt-base."));
}

#[test]
fn test_assemble_preserves_document_text_verbatim() {
    // Round-trip: the exact extracted text must appear untouched
    let doc_text = "Cláusula 7.2 — prazo de 30 (trinta) dias.\n\tAnexo I: R$ 1.234,56";
    let p = prompt::assemble("base", Jurisdiction::Estadual, Completeness::Nao, doc_text);
    assert!(p.contains(doc_text));
}

#[test]
fn test_assemble_is_deterministic() {
    let a = prompt::assemble("b", Jurisdiction::Municipal, Completeness::Sim, "t");
    let b = prompt::assemble("b", Jurisdiction::Municipal, Completeness::Sim, "t");
    assert_eq!(a, b);
}

#[test]
fn test_assemble_never_truncates() {
    let big = "x".repeat(2_000_000);
    let p = prompt::assemble("base", Jurisdiction::Estadual, Completeness::Sim, &big);
    assert!(p.contains(&big));
}

#[test]
fn test_count_tokens_empty_is_zero() {
    assert_eq!(tokens::count_tokens("", "gpt-4o"), 0);
    assert_eq!(tokens::count_tokens("", "model-nobody-knows"), 0);
}

#[test]
fn test_count_tokens_positive() {
    assert!(tokens::count_tokens("O edital a ser analisado", "gpt-4o") > 0);
}

#[test]
fn test_count_tokens_referentially_transparent() {
    let text = "Segue o texto integral do edital para análise técnica.";
    assert_eq!(
        tokens::count_tokens(text, "gpt-4o"),
        tokens::count_tokens(text, "gpt-4o")
    );
}

#[test]
fn test_count_tokens_unknown_model_uses_generic_vocabulary() {
    // Unknown models fall back to o200k_base instead of failing; two unknown
    // names therefore agree with each other
    let text = "análise técnica, normativa e classificatória de riscos";
    let a = tokens::count_tokens(text, "model-nobody-knows");
    let b = tokens::count_tokens(text, "another-unknown-model");
    assert!(a > 0);
    assert_eq!(a, b);
}

#[test]
fn test_extract_rejects_garbage() {
    let result = extract::extract_bytes(b"this is not a pdf at all");
    assert!(result.is_err());
}

#[test]
fn test_extract_single_page() {
    let pdf = build_pdf(&["Hello World!"]);
    let text = extract::extract_bytes(&pdf).unwrap();
    assert!(text.contains("Hello World!"), "got: {text:?}");
}

#[test]
fn test_extract_joins_pages_with_newline() {
    let pdf = build_pdf(&["Primeira pagina", "Segunda pagina"]);
    let text = extract::extract_bytes(&pdf).unwrap();

    let first = text.find("Primeira pagina").expect("first page text");
    let second = text.find("Segunda pagina").expect("second page text");
    assert!(first < second);
    assert!(text[first..second].contains('\n'));
}

#[test]
fn test_report_kept_in_requested_dir_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("template.docx");
    write_template(&template, &[MARKER_PHRASE]);

    let out_dir = tempfile::tempdir().unwrap();
    let path = write_report_in(out_dir.path(), &template, "análise").unwrap();

    assert!(path.starts_with(out_dir.path()));
    assert!(path.is_file());
    let name = path.file_name().unwrap().to_string_lossy();
    assert!(name.starts_with("instrucao_padronizada_"));
    assert!(name.ends_with(".docx"));
}

#[test]
fn test_failed_report_leaves_no_file_behind() {
    let out_dir = tempfile::tempdir().unwrap();
    let missing_template = out_dir.path().join("nope.docx");

    let result = write_report_in(out_dir.path(), &missing_template, "análise");
    assert!(result.is_err());

    // The temp destination must be cleaned up, not kept empty
    assert_eq!(fs::read_dir(out_dir.path()).unwrap().count(), 0);
}

fn write_template(path: &Path, paragraphs: &[&str]) {
    let mut docx = Docx::new();
    for text in paragraphs {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)));
    }
    let mut file = fs::File::create(path).unwrap();
    docx.build().pack(&mut file).unwrap();
}

#[test]
fn test_extract_skips_textless_page_between_text_pages() {
    // A scanned or blank page contributes nothing, not an empty line
    let pdf = build_pdf(&["Primeira pagina", "", "Segunda pagina"]);
    let text = extract::extract_bytes(&pdf).unwrap();
    assert_eq!(text, "Primeira pagina\nSegunda pagina");
}

/// Minimal one-font PDF with one page per entry in `page_texts`. An empty
/// entry becomes a page with no text operations at all.
fn build_pdf(page_texts: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in page_texts {
        let operations = if text.is_empty() {
            vec![]
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 48.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}
