use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::{config, utils, OutputFormat};

#[derive(Subcommand)]
pub enum ReviewCommands {
    #[command(about = "List verification submissions in the admin queue")]
    List {
        #[arg(long, help = "Filter by status (pending, verified, pre_approved, denied)")]
        status: Option<String>,

        #[arg(long, help = "Filter by persona (student, individualSponsor, ...)")]
        persona: Option<String>,

        #[arg(long)]
        limit: Option<i64>,

        #[arg(long)]
        offset: Option<i64>,
    },

    #[command(about = "Show queue counts per status")]
    Stats,

    #[command(about = "Approve a verification")]
    Approve {
        id: Uuid,

        #[arg(long, help = "Mark pre_approved instead of verified")]
        pre: bool,
    },

    #[command(about = "Deny a verification with a reason")]
    Deny { id: Uuid, reason: String },
}

pub async fn handle(cmd: ReviewCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let base_url = config::base_url()?;
    let token = config::auth_token()?;

    match cmd {
        ReviewCommands::List {
            status,
            persona,
            limit,
            offset,
        } => {
            let mut query: Vec<(&str, String)> = Vec::new();
            if let Some(status) = status {
                query.push(("status", status));
            }
            if let Some(persona) = persona {
                query.push(("persona", persona));
            }
            if let Some(limit) = limit {
                query.push(("limit", limit.to_string()));
            }
            if let Some(offset) = offset {
                query.push(("offset", offset.to_string()));
            }

            let response = utils::client()
                .get(format!("{}/api/admin/verifications", base_url))
                .query(&query)
                .bearer_auth(token)
                .send()
                .await?;
            let data = utils::unwrap_envelope(response).await?;
            utils::print_data(&data)
        }
        ReviewCommands::Stats => {
            let response = utils::client()
                .get(format!("{}/api/admin/verifications/stats", base_url))
                .bearer_auth(token)
                .send()
                .await?;
            let data = utils::unwrap_envelope(response).await?;
            utils::print_data(&data)
        }
        ReviewCommands::Approve { id, pre } => {
            let status = if pre { "pre_approved" } else { "verified" };
            let response = utils::client()
                .put(format!("{}/api/admin/verifications/{}", base_url, id))
                .bearer_auth(token)
                .json(&json!({ "status": status }))
                .send()
                .await?;
            utils::unwrap_envelope(response).await?;
            utils::output_success(
                &output_format,
                &format!("Verification {} marked {}", id, status),
                Some(json!({ "id": id, "status": status })),
            )
        }
        ReviewCommands::Deny { id, reason } => {
            let response = utils::client()
                .put(format!("{}/api/admin/verifications/{}", base_url, id))
                .bearer_auth(token)
                .json(&json!({ "status": "denied", "denialReason": reason }))
                .send()
                .await?;
            utils::unwrap_envelope(response).await?;
            utils::output_success(
                &output_format,
                &format!("Verification {} denied", id),
                Some(json!({ "id": id, "status": "denied", "denialReason": reason })),
            )
        }
    }
}
