//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::ClientBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    server: String,
    resolution: String,
    filter: String,
    agent: String,
    behavior: String,
    loop_route: bool,
    recording_dir: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(summarize(&blueprint)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn summarize(blueprint: &ClientBlueprint) -> ConfigSummary {
    ConfigSummary {
        version: format!("{:?}", blueprint.version),
        server: format!("{}:{}", blueprint.client.host, blueprint.client.port),
        resolution: format!("{}x{}", blueprint.display.width, blueprint.display.height),
        filter: blueprint.vehicle.filter.clone(),
        agent: blueprint.agent.kind.to_string(),
        behavior: blueprint.agent.behavior.to_string(),
        loop_route: blueprint.agent.loop_route,
        recording_dir: blueprint.recording.output_dir.clone(),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &ClientBlueprint) -> Vec<String> {
    use contracts::AgentKind;

    let mut warnings = Vec::new();

    if blueprint.agent.kind != AgentKind::Behavior && blueprint.agent.loop_route {
        warnings.push(format!(
            "agent.loop only applies to the Behavior agent, ignored for {}",
            blueprint.agent.kind
        ));
    }
    if blueprint.client.tick_timeout_secs < 1.0 / blueprint.world.tick_hz {
        warnings.push(
            "client.tick_timeout_secs is shorter than one world tick - most waits will time out"
                .to_string(),
        );
    }
    if blueprint.recording.enabled && blueprint.recording.queue_capacity < 4 {
        warnings.push("recording.queue_capacity is very small - frames will be dropped".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Server: {}", summary.server);
            println!("  Resolution: {}", summary.resolution);
            println!("  Actor filter: {}", summary.filter);
            println!("  Agent: {} ({})", summary.agent, summary.behavior);
            println!("  Loop: {}", summary.loop_route);
            println!("  Recording dir: {}", summary.recording_dir);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args_for(content: &str, suffix: &str) -> (tempfile::NamedTempFile, ValidateArgs) {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        };
        (file, args)
    }

    #[test]
    fn test_valid_config_with_warning() {
        let (_file, args) = args_for(r#"{"agent": {"kind": "Roaming", "loop": true}}"#, ".json");
        let result = validate_config(&args);
        assert!(result.valid);
        assert_eq!(result.warnings.as_ref().map(Vec::len), Some(1));
        assert_eq!(result.summary.as_ref().unwrap().agent, "Roaming");
    }

    #[test]
    fn test_invalid_config() {
        let (_file, args) = args_for("[display]\nwidth = 0\n", ".toml");
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("display"));
        assert!(run_validate(&args).is_err());
    }
}
