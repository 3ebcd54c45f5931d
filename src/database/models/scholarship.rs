use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ScholarshipStatus {
    Draft,
    Open,
    Closed,
    Archived,
}

impl ScholarshipStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Archived => "archived",
        }
    }

    /// Allowed walk: draft -> open -> closed -> archived, with early
    /// archiving from open. Everything else is a conflict.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Open)
                | (Self::Open, Self::Closed)
                | (Self::Open, Self::Archived)
                | (Self::Closed, Self::Archived)
        )
    }
}

/// Peso amounts travel as decimal strings on the wire.
fn amount_as_string<S>(value: &Option<BigDecimal>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(amount) => serializer.serialize_some(&amount.to_string()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Scholarship {
    pub id: Uuid,
    pub sponsor_id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scholarship_type: Option<String>,
    pub coverage: Vec<String>,
    pub slots: i32,
    #[serde(serialize_with = "amount_as_string")]
    pub amount: Option<BigDecimal>,
    pub status: ScholarshipStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_deadline: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_walk_is_forward_only() {
        use ScholarshipStatus::*;
        assert!(Draft.can_transition_to(Open));
        assert!(Open.can_transition_to(Closed));
        assert!(Open.can_transition_to(Archived));
        assert!(Closed.can_transition_to(Archived));

        assert!(!Draft.can_transition_to(Closed));
        assert!(!Draft.can_transition_to(Archived));
        assert!(!Open.can_transition_to(Draft));
        assert!(!Archived.can_transition_to(Open));
        assert!(!Closed.can_transition_to(Open));
    }

    #[test]
    fn amount_serializes_as_decimal_string() {
        let scholarship = Scholarship {
            id: Uuid::new_v4(),
            sponsor_id: Uuid::new_v4(),
            title: "STEM Grant".to_string(),
            description: "Full tuition".to_string(),
            scholarship_type: Some("Merit".to_string()),
            coverage: vec!["Tuition".to_string()],
            slots: 10,
            amount: Some(BigDecimal::from_str("15000.50").unwrap()),
            status: ScholarshipStatus::Open,
            application_deadline: None,
            banner_path: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&scholarship).unwrap();
        assert_eq!(json["amount"], "15000.50");
        assert_eq!(json["status"], "open");
        assert!(json.get("bannerPath").is_none());
    }
}
