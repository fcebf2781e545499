use super::wizard::{self, Prefill};

use crate::core::config::AppConfig;
use crate::core::session::{Completeness, Jurisdiction};

#[tokio::test]
async fn test_failed_run_exits_with_the_error() {
    let dir = tempfile::tempdir().unwrap();
    let edital = dir.path().join("edital.pdf");
    std::fs::write(&edital, b"%PDF stub").unwrap();

    // Empty working dir: no base prompt PDF, so the pipeline fails
    let mut config = AppConfig::default();
    config.working_dir = dir.path().to_path_buf();
    config.api_key = Some("sk-test".into());
    config.client.live_output = false;

    let prefill = Prefill {
        pdf: Some(edital),
        jurisdiction: Some(Jurisdiction::Estadual),
        complete: Some(Completeness::Sim),
        output: None,
        quiet: true,
    };

    // With every answer prefilled nothing is asked; the failure must come
    // back as an error instead of a quiet zero-status exit
    let result = wizard::run(config, prefill, false).await;
    assert!(result.is_err());
}
