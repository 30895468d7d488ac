//! `contentforge doctor` — Diagnose configuration and credentials.

use contentforge_config::{AppConfig, find_model};
use contentforge_providers::OpenRouterRewriter;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 ContentForge Doctor — System Diagnostics");
    println!("===========================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_path();
    if config_path.exists() {
        println!("  ✅ Config file found: {}", config_path.display());
    } else {
        println!("  ⚠️  No config file, using defaults (run `contentforge config init`)");
    }

    match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");

            if config.rewriter.has_api_key() {
                println!("  ✅ API key configured");
            } else {
                println!(
                    "  ⚠️  No API key: set {} to enable rewrites",
                    config.rewriter.api_key_env
                );
                issues += 1;
            }

            let model = &config.rewriter.default_model;
            match find_model(model) {
                Some(info) => println!("  ✅ Default model: {} ({}, {})", info.id, info.label, info.tier),
                None => println!("  ✅ Default model: {model} (custom)"),
            }

            match OpenRouterRewriter::from_config(&config.rewriter) {
                Ok(_) => println!("  ✅ HTTP client ready for {}", config.rewriter.api_base),
                Err(e) => {
                    println!("  ❌ HTTP client could not be built: {e}");
                    issues += 1;
                }
            }
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
