use anyhow::Context;
use clap::Subcommand;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cli::utils::{output_success, read_structured};
use crate::cli::OutputFormat;

const API_PLACEHOLDER_BASE: &str = "https://your-api-id.execute-api.your-region.amazonaws.com/prod";

/// Placeholder text in the shipped front-end config, and the deployment output that replaces it.
/// Applied in order; the endpoint URLs go first since they share the `your-region` prefix.
const REPLACEMENTS: [(&str, &str); 6] = [
    ("/conversation", "ConversationApiEndpoint"),
    ("/submit-feedback", "WriteFeedbackApiEndpoint"),
    ("/feedback-data", "ReadFeedbackApiEndpoint"),
    ("/review-feedback", "ReviewFeedbackApiEndpoint"),
    ("your-region_your-user-pool-id", "UserPoolId"),
    ("your-client-id", "UserPoolClientId"),
];

pub type StackOutputs = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum SiteConfigError {
    #[error("No deployment outputs provided")]
    NoOutputs,

    #[error("Invalid --set value '{0}', expected KEY=VALUE")]
    InvalidOverride(String),
}

#[derive(Subcommand)]
pub enum SiteCommands {
    #[command(about = "Fill the front-end config file with deployed endpoint and identity pool values")]
    UpdateConfig {
        #[arg(help = "Path to the front-end config.js")]
        config: PathBuf,

        #[arg(long, help = "JSON or YAML map of deployment outputs")]
        outputs: Option<PathBuf>,

        #[arg(long = "set", value_name = "KEY=VALUE", help = "Override a single output value")]
        set: Vec<String>,
    },
}

pub async fn handle(cmd: SiteCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        SiteCommands::UpdateConfig { config, outputs, set } => {
            let outputs = collect_outputs(outputs.as_deref(), &set)?;
            let replaced = update_config_file(&config, &outputs)?;

            output_success(
                &output_format,
                &format!("Updated {} with stack outputs", config.display()),
                Some(json!({ "config": config, "replaced": replaced })),
            )
        }
    }
}

/// Merge the outputs file with `--set` overrides; later values win
pub fn collect_outputs(file: Option<&Path>, overrides: &[String]) -> anyhow::Result<StackOutputs> {
    let mut outputs: StackOutputs = match file {
        Some(path) => read_structured(path)?,
        None => StackOutputs::new(),
    };

    for item in overrides {
        let (key, value) = item
            .split_once('=')
            .filter(|(key, _)| !key.trim().is_empty())
            .ok_or_else(|| SiteConfigError::InvalidOverride(item.clone()))?;
        outputs.insert(key.trim().to_string(), value.to_string());
    }

    if outputs.is_empty() {
        return Err(SiteConfigError::NoOutputs.into());
    }
    Ok(outputs)
}

/// Replace every known placeholder whose output is present. Returns the new
/// content and the output keys that were applied.
pub fn rewrite_config(content: &str, outputs: &StackOutputs) -> (String, Vec<&'static str>) {
    let mut rewritten = content.to_string();
    let mut applied = Vec::new();

    for (placeholder, key) in REPLACEMENTS {
        let placeholder = if placeholder.starts_with('/') {
            format!("{}{}", API_PLACEHOLDER_BASE, placeholder)
        } else {
            placeholder.to_string()
        };

        if let Some(value) = outputs.get(key) {
            if rewritten.contains(&placeholder) {
                applied.push(key);
            }
            rewritten = rewritten.replace(&placeholder, value);
        }
    }

    (rewritten, applied)
}

fn update_config_file(path: &Path, outputs: &StackOutputs) -> anyhow::Result<Vec<&'static str>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Error reading config file {}", path.display()))?;
    let (rewritten, applied) = rewrite_config(&content, outputs);
    std::fs::write(path, rewritten).with_context(|| format!("Error writing config file {}", path.display()))?;
    tracing::info!("Replaced {} placeholder(s) in {}", applied.len(), path.display());
    Ok(applied)
}
