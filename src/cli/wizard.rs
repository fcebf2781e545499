use anyhow::Result;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::core::config::AppConfig;
use crate::core::session::{
    AnalysisSession, Completeness, DocumentSource, Jurisdiction, Step,
};
use crate::pipeline;
use crate::report;

/// Answers supplied on the command line; whatever is missing gets asked.
pub struct Prefill {
    pub pdf: Option<PathBuf>,
    pub jurisdiction: Option<Jurisdiction>,
    pub complete: Option<Completeness>,
    pub output: Option<PathBuf>,
    pub quiet: bool,
}

pub async fn run(config: AppConfig, mut prefill: Prefill, interactive: bool) -> Result<()> {
    if interactive {
        println!("\x1b[1medital-analyzer\x1b[0m v{}", env!("CARGO_PKG_VERSION"));
        println!("Bem-vindo(a)! Responda às perguntas abaixo para iniciar a análise do edital.\n");
    }

    let mut session = AnalysisSession::new();

    loop {
        match session.step {
            Step::AskJurisdiction => {
                // Command-line answers apply to the first session only
                let jurisdiction = match prefill.jurisdiction.take() {
                    Some(j) => j,
                    None => ask_jurisdiction()?,
                };
                session.answer_jurisdiction(jurisdiction)?;
            }
            Step::AskCompleteness => {
                let completeness = match prefill.complete.take() {
                    Some(c) => c,
                    None => ask_completeness()?,
                };
                session.answer_completeness(completeness)?;
            }
            Step::AwaitUpload => {
                let path = match prefill.pdf.take() {
                    Some(p) => p,
                    None => ask_pdf_path()?,
                };
                session.attach_document(DocumentSource::File(path))?;
            }
            Step::Processing => {
                println!("Extraindo texto do edital e consultando o modelo...\n");

                let live = config.client.live_output && !prefill.quiet;
                let result = pipeline::run_analysis(&mut session, &config, |fragment| {
                    if live {
                        print!("{fragment}");
                        io::stdout().flush().ok();
                    }
                })
                .await;

                match result {
                    Ok(outcome) => {
                        if live {
                            println!();
                        }
                        print_summary(&outcome);
                        if let Some(dest) = &prefill.output {
                            std::fs::copy(&outcome.output_path, dest)?;
                            println!("Cópia do relatório salva em: {}", dest.display());
                        }
                    }
                    Err(e) => {
                        // Terminal for this attempt: the session parks in a
                        // visible error state until the operator resets it
                        session.mark_failed(e.to_string());
                        eprintln!("\x1b[31mFalha na análise: {e}\x1b[0m");
                        if interactive && ask_new_analysis()? {
                            session.reset();
                            continue;
                        }
                        // Declining still ends the run on the failure
                        return Err(e.into());
                    }
                }
            }
            Step::Ready => {
                if !interactive {
                    break;
                }
                if ask_new_analysis()? {
                    session.reset();
                    continue;
                }
                break;
            }
        }
    }

    Ok(())
}

fn print_summary(outcome: &pipeline::AnalysisOutcome) {
    println!("\n\x1b[32mAnálise concluída!\x1b[0m");
    println!("Modelo: \x1b[36m{}\x1b[0m", outcome.model.display_name);
    println!(
        "Tokens: {} in / {} out (estimativa do prompt: {})",
        outcome.usage.prompt_tokens, outcome.usage.completion_tokens, outcome.prompt_token_estimate
    );
    if let Some(cost) = outcome.cost {
        println!("Custo estimado: ${cost:.4}");
    }
    println!(
        "Instrução padronizada ({}): {}",
        report::REPORT_MIME_TYPE,
        outcome.output_path.display()
    );
}

fn ask_jurisdiction() -> Result<Jurisdiction> {
    loop {
        let answer = ask("O edital a ser analisado é Estadual ou Municipal? [1] Estadual [2] Municipal")?;
        match answer.trim() {
            "1" | "Estadual" | "estadual" => return Ok(Jurisdiction::Estadual),
            "2" | "Municipal" | "municipal" => return Ok(Jurisdiction::Municipal),
            _ => eprintln!("Resposta inválida."),
        }
    }
}

fn ask_completeness() -> Result<Completeness> {
    loop {
        let answer = ask("O edital está legível e completo? [1] Sim [2] Não")?;
        match answer.trim() {
            "1" | "Sim" | "sim" | "s" => return Ok(Completeness::Sim),
            "2" | "Não" | "Nao" | "não" | "nao" | "n" => return Ok(Completeness::Nao),
            _ => eprintln!("Resposta inválida."),
        }
    }
}

fn ask_pdf_path() -> Result<PathBuf> {
    loop {
        let answer = ask("Caminho do edital em PDF:")?;
        let path = PathBuf::from(answer.trim());
        if path.is_file() {
            return Ok(path);
        }
        eprintln!("Arquivo não encontrado: {}", path.display());
    }
}

fn ask_new_analysis() -> Result<bool> {
    let answer = ask("Nova análise? [s/n]")?;
    Ok(matches!(answer.trim(), "s" | "S" | "sim" | "Sim"))
}

fn ask(question: &str) -> Result<String> {
    eprint!("\x1b[33m{question}\x1b[0m ");
    io::stderr().flush().ok();

    let mut input = String::new();
    match io::stdin().read_line(&mut input) {
        Ok(0) => anyhow::bail!("entrada encerrada (EOF)"),
        Ok(_) => Ok(input),
        Err(e) => Err(e.into()),
    }
}
