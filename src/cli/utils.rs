use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let (Some(obj), Some(extra)) = (response.as_object_mut(), data.as_ref()) {
                if let Some(extra_obj) = extra.as_object() {
                    obj.extend(extra_obj.clone());
                }
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "success": false,
                    "error": message
                }))?
            );
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Dump a response payload as pretty JSON.
pub fn print_data(data: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// A failed API call, keeping the HTTP status so callers can branch on it.
#[derive(Debug)]
pub struct ApiCallError {
    pub status: reqwest::StatusCode,
    pub message: String,
}

impl std::fmt::Display for ApiCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.status)
    }
}

impl std::error::Error for ApiCallError {}

/// Unwrap the API envelope: `data` on success, the server's message as the
/// error otherwise.
pub async fn unwrap_envelope(response: reqwest::Response) -> anyhow::Result<Value> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| anyhow::anyhow!("Server returned a non-JSON response ({}): {}", status, e))?;

    if body.get("success").and_then(Value::as_bool) == Some(true) {
        return Ok(body.get("data").cloned().unwrap_or(Value::Null));
    }

    let message = body
        .get("message")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .unwrap_or("Request failed")
        .to_string();
    Err(ApiCallError { status, message }.into())
}

/// True when the call failed with an HTTP 409 conflict.
pub fn is_conflict(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ApiCallError>(),
        Some(e) if e.status == reqwest::StatusCode::CONFLICT
    )
}

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}
