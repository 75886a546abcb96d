//! Configuration display.

use console::style;

use crate::config::Config;

/// Print the effective configuration with secrets redacted.
pub fn cmd_config_show(config: &Config, json: bool) -> anyhow::Result<()> {
    let shown = config.redacted();

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    let source = config
        .source_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults + environment".to_string());
    println!("{} {}\n", style("# Source:").dim(), source);
    println!("{}", toml::to_string_pretty(&shown)?);

    for problem in config.problems() {
        eprintln!("{} {}", style("!").yellow(), problem);
    }
    Ok(())
}
