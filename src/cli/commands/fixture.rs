use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Subcommand;
use serde_json::json;

use crate::cli::{config, utils, OutputFormat};

/// Domain key -> resource slug -> items, the list contents of
/// `GET /:domain/all` without the wrapper fields.
type FixtureDoc = BTreeMap<String, BTreeMap<String, Vec<String>>>;

#[derive(Subcommand)]
pub enum FixtureCommands {
    #[command(about = "Load a YAML fixture of configuration items through the API")]
    Load {
        #[arg(help = "Fixture file, e.g. fixtures/demo.yaml")]
        file: PathBuf,

        #[arg(long, help = "Parse and report without calling the server")]
        dry_run: bool,
    },
}

pub async fn handle(cmd: FixtureCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        FixtureCommands::Load { file, dry_run } => load(file, dry_run, output_format).await,
    }
}

async fn load(file: PathBuf, dry_run: bool, output_format: OutputFormat) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&file)
        .map_err(|e| anyhow::anyhow!("Could not read {}: {}", file.display(), e))?;
    let doc: FixtureDoc = serde_yaml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("{} is not a valid fixture file: {}", file.display(), e))?;

    if dry_run {
        let mut planned = 0usize;
        for (domain, resources) in &doc {
            for (resource, items) in resources {
                for item in items {
                    println!("would add {}/{}: {}", domain, resource, item);
                    planned += 1;
                }
            }
        }
        return utils::output_success(
            &output_format,
            &format!("Dry run: {} item(s) planned", planned),
            Some(json!({ "planned": planned })),
        );
    }

    let base_url = config::base_url()?;
    let token = config::auth_token()?;
    let client = utils::client();

    let mut added = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for (domain, resources) in &doc {
        for (resource, items) in resources {
            for item in items {
                let response = client
                    .post(format!("{}/{}/{}", base_url, domain, resource))
                    .bearer_auth(&token)
                    .json(&json!({ "item": item }))
                    .send()
                    .await?;
                match utils::unwrap_envelope(response).await {
                    Ok(_) => added += 1,
                    // Duplicates are expected on re-runs, keep going.
                    Err(e) if utils::is_conflict(&e) => {
                        println!("  {}/{}: '{}' already present", domain, resource, item);
                        skipped += 1;
                    }
                    Err(e) => {
                        eprintln!("  {}/{}: '{}' failed: {}", domain, resource, item, e);
                        failed += 1;
                    }
                }
            }
        }
    }

    if failed > 0 {
        utils::output_error(
            &output_format,
            &format!(
                "Loaded {} item(s), {} already present, {} failed",
                added, skipped, failed
            ),
        )?;
        anyhow::bail!("{} fixture item(s) failed to load", failed);
    }

    utils::output_success(
        &output_format,
        &format!("Loaded {} item(s), {} already present", added, skipped),
        Some(json!({ "added": added, "skipped": skipped, "failed": failed })),
    )
}
