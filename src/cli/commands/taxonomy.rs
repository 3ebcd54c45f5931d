use clap::Subcommand;
use serde_json::json;

use crate::cli::{config, utils, OutputFormat};

#[derive(Subcommand)]
pub enum TaxonomyCommands {
    #[command(about = "Show every resource list in a configuration domain")]
    List {
        #[arg(help = "Domain key, e.g. identity-configuration")]
        domain: String,
    },

    #[command(about = "Append an item to a resource list")]
    Add {
        domain: String,
        #[arg(help = "Resource slug, e.g. id-types")]
        resource: String,
        item: String,
    },

    #[command(about = "Rename an item in place")]
    Rename {
        domain: String,
        resource: String,
        old_item: String,
        new_item: String,
    },

    #[command(about = "Remove an item from a resource list")]
    Remove {
        domain: String,
        resource: String,
        item: String,
    },
}

pub async fn handle(cmd: TaxonomyCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let base_url = config::base_url()?;
    let token = config::auth_token()?;

    match cmd {
        TaxonomyCommands::List { domain } => {
            let response = utils::client()
                .get(format!("{}/{}/all", base_url, domain))
                .bearer_auth(token)
                .send()
                .await?;
            let data = utils::unwrap_envelope(response).await?;
            utils::print_data(&data)
        }
        TaxonomyCommands::Add {
            domain,
            resource,
            item,
        } => {
            let response = utils::client()
                .post(format!("{}/{}/{}", base_url, domain, resource))
                .bearer_auth(token)
                .json(&json!({ "item": item }))
                .send()
                .await?;
            utils::unwrap_envelope(response).await?;
            utils::output_success(
                &output_format,
                &format!("Added '{}' to {}/{}", item, domain, resource),
                Some(json!({ "domain": domain, "resource": resource, "item": item })),
            )
        }
        TaxonomyCommands::Rename {
            domain,
            resource,
            old_item,
            new_item,
        } => {
            let response = utils::client()
                .put(format!("{}/{}/{}", base_url, domain, resource))
                .bearer_auth(token)
                .json(&json!({ "oldItem": old_item, "newItem": new_item }))
                .send()
                .await?;
            utils::unwrap_envelope(response).await?;
            utils::output_success(
                &output_format,
                &format!("Renamed '{}' to '{}' in {}/{}", old_item, new_item, domain, resource),
                Some(json!({
                    "domain": domain,
                    "resource": resource,
                    "oldItem": old_item,
                    "newItem": new_item,
                })),
            )
        }
        TaxonomyCommands::Remove {
            domain,
            resource,
            item,
        } => {
            let response = utils::client()
                .delete(format!("{}/{}/{}", base_url, domain, resource))
                .bearer_auth(token)
                .json(&json!({ "item": item }))
                .send()
                .await?;
            utils::unwrap_envelope(response).await?;
            utils::output_success(
                &output_format,
                &format!("Removed '{}' from {}/{}", item, domain, resource),
                Some(json!({ "domain": domain, "resource": resource, "item": item })),
            )
        }
    }
}
