use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Which API the CLI talks to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerProfile {
    pub base_url: Option<String>,
}

/// Saved login session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub email: Option<String>,
    pub saved_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn logged_in(email: String, token: String) -> Self {
        Self {
            token: Some(token),
            email: Some(email),
            saved_at: Some(Utc::now()),
        }
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("ISKOLAR_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME")
            .map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("iskolar").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_server_profile() -> anyhow::Result<ServerProfile> {
    let file = get_config_dir()?.join("server.json");
    if !file.exists() {
        return Ok(ServerProfile::default());
    }
    let content = fs::read_to_string(file)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn save_server_profile(profile: &ServerProfile) -> anyhow::Result<()> {
    let file = get_config_dir()?.join("server.json");
    fs::write(file, serde_json::to_string_pretty(profile)?)?;
    Ok(())
}

pub fn load_session() -> anyhow::Result<Session> {
    let file = get_config_dir()?.join("session.json");
    if !file.exists() {
        return Ok(Session::default());
    }
    let content = fs::read_to_string(file)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn save_session(session: &Session) -> anyhow::Result<()> {
    let file = get_config_dir()?.join("session.json");
    fs::write(file, serde_json::to_string_pretty(session)?)?;
    Ok(())
}

pub fn clear_session() -> anyhow::Result<()> {
    let file = get_config_dir()?.join("session.json");
    if file.exists() {
        fs::remove_file(file)?;
    }
    Ok(())
}

/// The configured base URL, trailing slash trimmed.
pub fn base_url() -> anyhow::Result<String> {
    let profile = load_server_profile()?;
    profile
        .base_url
        .map(|u| u.trim_end_matches('/').to_string())
        .ok_or_else(|| anyhow::anyhow!("No server configured. Run: iskolar server use <url>"))
}

/// The saved bearer token.
pub fn auth_token() -> anyhow::Result<String> {
    let session = load_session()?;
    session
        .token
        .ok_or_else(|| anyhow::anyhow!("Not logged in. Run: iskolar auth login <email>"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_round_trips_through_json() {
        let session = Session::logged_in("admin@example.com".to_string(), "tok".to_string());
        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back.email.as_deref(), Some("admin@example.com"));
        assert_eq!(back.token.as_deref(), Some("tok"));
        assert!(back.saved_at.is_some());
    }
}
