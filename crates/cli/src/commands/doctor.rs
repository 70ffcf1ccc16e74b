//! `devsquad doctor` — diagnose configuration and backend health.

use devsquad_config::AppConfig;
use devsquad_core::llm::LlmBackend;

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    println!("DevSquad doctor\n");

    match config.validate() {
        Ok(()) => println!("  config      ok"),
        Err(e) => println!("  config      FAIL: {e}"),
    }

    let workspace = std::path::Path::new(&config.workspace_root);
    if workspace.exists() {
        println!("  workspace   ok ({})", workspace.display());
    } else {
        println!(
            "  workspace   missing ({}) — it will be created on first file write",
            workspace.display()
        );
    }

    match devsquad_llm::build_backend(&config.llm) {
        Ok(backend) => match backend.health_check().await {
            Ok(true) => println!("  llm         ok ({} / {})", backend.name(), config.llm.model),
            Ok(false) => println!("  llm         unreachable ({})", backend.name()),
            Err(e) => println!("  llm         FAIL: {e}"),
        },
        Err(e) => println!("  llm         FAIL: {e}"),
    }

    Ok(())
}
