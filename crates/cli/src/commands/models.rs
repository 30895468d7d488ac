//! `contentforge models` — List the rewrite model catalog.

use contentforge_config::{AppConfig, MODEL_CATALOG};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let rewriter = &config.rewriter;

    println!("🤖 Rewrite Models");
    println!("─────────────────────────────────────────────────────────────────────");
    println!("{:<38} {:<24} {:<9} {}", "Model", "Label", "Tier", "Status");
    println!("{:<38} {:<24} {:<9} {}", "─────", "─────", "────", "──────");

    for model in MODEL_CATALOG {
        let status = if model.id == rewriter.default_model {
            "default"
        } else if rewriter.is_model_allowed(model.id) {
            "enabled"
        } else {
            "disabled"
        };
        println!("{:<38} {:<24} {:<9} {}", model.id, model.label, model.tier.to_string(), status);
    }

    let custom: Vec<&String> = rewriter
        .allowed_models
        .iter()
        .filter(|id| !MODEL_CATALOG.iter().any(|m| m.id == id.as_str()))
        .collect();
    if !custom.is_empty() {
        println!();
        println!("  Additional allowed models:");
        for id in custom {
            println!("    {id}");
        }
    }

    println!();
    println!("  Select one with `contentforge optimize --model <id>` or CONTENTFORGE_MODEL.");

    Ok(())
}
