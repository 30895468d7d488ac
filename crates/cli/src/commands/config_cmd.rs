//! `contentforge config` — Configuration management commands.

use contentforge_config::AppConfig;
use std::path::Path;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let warnings = advisories(&config);
            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Profile:   {}", config.pipeline.profile);
            println!("   Mode:      {}", config.pipeline.mode.description());
            println!("   Keyword:   {}", config.pipeline.primary_keyword);
            println!("   Budget:    {} chunk rewrites", config.pipeline.chunk_rewrite_budget);
            println!("   Model:     {}", config.rewriter.default_model);
            println!("   Parallel:  {} rewrites in flight", config.rewriter.max_concurrent_rewrites);
            println!("   Endpoint:  {}", config.rewriter.api_base);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

/// Non-fatal observations about a config that passed validation.
pub fn advisories(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.rewriter.has_api_key() {
        warnings.push(format!(
            "No API key set (set {} or CONTENTFORGE_API_KEY); only structural checks will run",
            config.rewriter.api_key_env
        ));
    }

    if config.pipeline.chunk_rewrite_budget == 0 {
        warnings.push("chunk_rewrite_budget is 0; Stage 2 will never rewrite chunks".into());
    }

    if config.pipeline.primary_keyword.trim().is_empty() {
        warnings.push("primary_keyword is empty; metadata will use a generic keyword".into());
    }

    warnings
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let mut shown = config.clone();
    if shown.rewriter.api_key.is_some() {
        shown.rewriter.api_key = Some("***".into());
    }
    let toml_str = toml::to_string_pretty(&shown)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", AppConfig::config_path().display());
    Ok(())
}

pub async fn init(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_path();
    if write_default_config(&config_path, force)? {
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Export OPENROUTER_API_KEY (or add api_key under [rewriter])");
        println!("   2. Run: contentforge optimize article.md\n");
    } else {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or re-run with --force.");
    }
    Ok(())
}

/// Write the default config to `path`, creating parent directories.
/// Returns `false` when the file exists and `force` is not set.
fn write_default_config(path: &Path, force: bool) -> std::io::Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(true)
}
