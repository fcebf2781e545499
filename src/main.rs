use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    edital_analyzer::cli::run_cli().await
}
