use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::Path;

use sar_assistant_lib::infrastructure::bootstrap::build_investigation;
use sar_assistant_lib::infrastructure::config::AppConfig;
use sar_assistant_lib::infrastructure::logging;
use sar_assistant_lib::interfaces::cli::{Cli, Commands};
use sar_assistant_lib::interfaces::http::InvestigationResponse;

const DISCLAIMER: &str = "This is an automated investigation summary. Always verify findings manually before filing any formal report.";

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    logging::init(&config.log_level);
    tracing::debug!(?config, "Configuration loaded");

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            sar_assistant_lib::serve(&config).context("HTTP server failed")?;
        }
        Commands::Investigate {
            file,
            output,
            json,
            no_delay,
            template,
        } => {
            if let Some(template) = template {
                config.narrative.template = template;
            }
            if no_delay {
                config.investigation.delay_secs = 0;
            }
            investigate(&config, &file, output.as_deref(), json)?;
        }
    }

    Ok(())
}

fn investigate(config: &AppConfig, file: &Path, output: Option<&Path>, json: bool) -> Result<()> {
    let bytes = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    let investigation = build_investigation(config).investigate(file_name, &bytes)?;

    if let Some(path) = output {
        fs::write(path, &investigation.artifact.bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = investigation.artifact.size(), "Report written");
    }

    if json {
        let response = InvestigationResponse::from(investigation);
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let outcome = &investigation.outcome;
    for warning in &outcome.warnings {
        eprintln!("warning: {}", warning);
    }

    println!("SAR Narrative\n=============\n{}\n", outcome.result.narrative);
    println!("AML Red Flags\n=============\n{}\n", outcome.result.flags.render_checklist());
    println!(
        "Report: {} rows x {} columns{}",
        outcome.result.report.row_count(),
        outcome.result.report.column_count(),
        match output {
            Some(path) => format!(" -> {}", path.display()),
            None => " (use --output to save it)".to_string(),
        }
    );
    println!("\n{}", DISCLAIMER);

    Ok(())
}
