mod wizard;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::core::config;
use crate::core::session::{Completeness, Jurisdiction};

#[derive(Parser, Debug)]
#[command(
    name = "edital-analyzer",
    version,
    about = "Análise de editais de licitação com geração de instrução padronizada"
)]
struct Cli {
    /// PDF do edital (skips the upload question)
    #[arg(short, long)]
    pdf: Option<PathBuf>,

    /// Esfera do edital (skips the first question)
    #[arg(short, long, value_enum)]
    jurisdiction: Option<JurisdictionArg>,

    /// O edital está legível e completo? (skips the second question)
    #[arg(long, value_enum)]
    complete: Option<CompletenessArg>,

    /// Copy the generated report to this path as well
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Working directory
    #[arg(short = 'c', long = "cwd")]
    working_dir: Option<PathBuf>,

    /// Suppress the live fragment display
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum JurisdictionArg {
    Estadual,
    Municipal,
}

impl From<JurisdictionArg> for Jurisdiction {
    fn from(a: JurisdictionArg) -> Self {
        match a {
            JurisdictionArg::Estadual => Jurisdiction::Estadual,
            JurisdictionArg::Municipal => Jurisdiction::Municipal,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CompletenessArg {
    Sim,
    Nao,
}

impl From<CompletenessArg> for Completeness {
    fn from(a: CompletenessArg) -> Self {
        match a {
            CompletenessArg::Sim => Completeness::Sim,
            CompletenessArg::Nao => Completeness::Nao,
        }
    }
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config =
        config::load_config(cli.working_dir.clone()).map_err(|e| anyhow::anyhow!("{e}"))?;

    if !config.has_api_key() {
        anyhow::bail!("No API key found. Set the OPENAI_API_KEY env var or add it to the config file.");
    }

    // Everything answered up front means one non-interactive run
    let non_interactive =
        cli.pdf.is_some() && cli.jurisdiction.is_some() && cli.complete.is_some();

    let prefill = wizard::Prefill {
        pdf: cli.pdf,
        jurisdiction: cli.jurisdiction.map(Into::into),
        complete: cli.complete.map(Into::into),
        output: cli.output,
        quiet: cli.quiet,
    };

    wizard::run(config, prefill, !non_interactive).await
}
