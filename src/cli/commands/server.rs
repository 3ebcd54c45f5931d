use clap::Subcommand;
use serde_json::json;

use crate::cli::{config, utils, OutputFormat};

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Point the CLI at an API server, or show the current one")]
    Use {
        #[arg(help = "Base URL, e.g. http://localhost:3000")]
        url: Option<String>,
    },

    #[command(about = "Show the configured server")]
    Show,

    #[command(about = "Health check the configured server")]
    Ping,
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Use { url } => match url {
            Some(url) => {
                let base_url = url.trim_end_matches('/').to_string();
                config::save_server_profile(&config::ServerProfile {
                    base_url: Some(base_url.clone()),
                })?;
                utils::output_success(
                    &output_format,
                    &format!("Using server {}", base_url),
                    Some(json!({ "baseUrl": base_url })),
                )
            }
            None => show(output_format),
        },
        ServerCommands::Show => show(output_format),
        ServerCommands::Ping => {
            let base_url = config::base_url()?;
            let response = utils::client()
                .get(format!("{}/health", base_url))
                .timeout(std::time::Duration::from_secs(5))
                .send()
                .await;

            match response {
                Ok(r) if r.status().is_success() => utils::output_success(
                    &output_format,
                    &format!("{} is up", base_url),
                    Some(json!({ "status": "up" })),
                ),
                Ok(r) => utils::output_error(
                    &output_format,
                    &format!("{} is degraded ({})", base_url, r.status()),
                ),
                Err(e) => {
                    utils::output_error(&output_format, &format!("{} is down: {}", base_url, e))
                }
            }
        }
    }
}

fn show(output_format: OutputFormat) -> anyhow::Result<()> {
    match config::load_server_profile()?.base_url {
        Some(url) => utils::output_success(
            &output_format,
            &format!("Current server: {}", url),
            Some(json!({ "baseUrl": url })),
        ),
        None => utils::output_error(
            &output_format,
            "No server configured. Run: iskolar server use <url>",
        ),
    }
}
