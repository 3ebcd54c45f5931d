use crate::taxonomy::Lists;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A configuration document as returned to clients: the list fields are
/// flattened to the top level, matching the shape admin UIs bind to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationDocument {
    pub name: String,
    #[serde(flatten)]
    pub lists: Lists,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
