use std::io::Write;

use clap::Subcommand;
use serde_json::json;

use crate::cli::{config, utils, OutputFormat};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Log in and store a session token")]
    Login {
        email: String,

        #[arg(long, help = "Password (prompted when omitted)")]
        password: Option<String>,
    },

    #[command(about = "Discard the stored session")]
    Logout,

    #[command(about = "Ask the server who the stored token belongs to")]
    Whoami,

    #[command(about = "Show local session state without calling the server")]
    Status,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => login(email, password, output_format).await,
        AuthCommands::Logout => {
            config::clear_session()?;
            utils::output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Whoami => {
            let base_url = config::base_url()?;
            let token = config::auth_token()?;
            let response = utils::client()
                .get(format!("{}/api/auth/whoami", base_url))
                .bearer_auth(token)
                .send()
                .await?;
            let data = utils::unwrap_envelope(response).await?;
            utils::print_data(&data)
        }
        AuthCommands::Status => status(output_format),
    }
}

async fn login(
    email: String,
    password: Option<String>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let base_url = config::base_url()?;
    let password = match password {
        Some(p) => p,
        None => prompt_password()?,
    };

    let response = utils::client()
        .post(format!("{}/auth/login", base_url))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?;
    let data = utils::unwrap_envelope(response).await?;

    let token = data
        .get("token")
        .and_then(|t| t.as_str())
        .ok_or_else(|| anyhow::anyhow!("Login response carried no token"))?;
    config::save_session(&config::Session::logged_in(
        email.clone(),
        token.to_string(),
    ))?;

    utils::output_success(
        &output_format,
        &format!("Logged in as {}", email),
        Some(json!({ "email": email, "expiresIn": data.get("expiresIn") })),
    )
}

fn prompt_password() -> anyhow::Result<String> {
    print!("Password: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn status(output_format: OutputFormat) -> anyhow::Result<()> {
    let profile = config::load_server_profile()?;
    let session = config::load_session()?;

    let server = profile.base_url.as_deref().unwrap_or("(not configured)");
    match (&session.email, &session.token) {
        (Some(email), Some(_)) => {
            let since = session
                .saved_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string());
            utils::output_success(
                &output_format,
                &format!("Server {} | logged in as {} since {}", server, email, since),
                Some(json!({ "server": server, "email": email, "savedAt": session.saved_at })),
            )
        }
        _ => utils::output_success(
            &output_format,
            &format!("Server {} | not logged in", server),
            Some(json!({ "server": server, "email": null })),
        ),
    }
}
