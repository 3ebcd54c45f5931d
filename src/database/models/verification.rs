use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Review status of a verification record. `pre_approved` is the school
/// reviewer's terminal state, `verified` the admin's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    PreApproved,
    Verified,
    Denied,
}

impl VerificationStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "pre_approved" => Some(Self::PreApproved),
            "verified" => Some(Self::Verified),
            "denied" => Some(Self::Denied),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PreApproved => "pre_approved",
            Self::Verified => "verified",
            Self::Denied => "denied",
        }
    }

    /// Decisions only ever move a record out of `pending`.
    pub fn is_decided(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "snake_case")]
pub enum Persona {
    Student,
    IndividualSponsor,
    CorporateSponsor,
    School,
}

impl Persona {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Self::Student),
            "individualSponsor" => Some(Self::IndividualSponsor),
            "corporateSponsor" => Some(Self::CorporateSponsor),
            "school" => Some(Self::School),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::IndividualSponsor => "individualSponsor",
            Self::CorporateSponsor => "corporateSponsor",
            Self::School => "school",
        }
    }
}

/// Submitted KYC payload, exactly one per verification. The `persona` tag
/// selects the variant; field names follow the client wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "persona", rename_all = "camelCase")]
pub enum PersonaProfile {
    #[serde(rename_all = "camelCase")]
    Student {
        first_name: String,
        last_name: String,
        school_name: String,
        education_level: String,
        year_level: String,
        course: String,
        student_id_number: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id_number: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    IndividualSponsor {
        first_name: String,
        last_name: String,
        id_type: String,
        id_number: String,
        employment_type: String,
        nature_of_work: String,
        source_of_income: String,
    },
    #[serde(rename_all = "camelCase")]
    CorporateSponsor {
        company_name: String,
        registration_number: String,
        organization_type: String,
        industry_sector: String,
        contact_person: String,
    },
    #[serde(rename_all = "camelCase")]
    School {
        school_name: String,
        school_type: String,
        accreditation_number: String,
        contact_person: String,
    },
}

impl PersonaProfile {
    pub fn persona(&self) -> Persona {
        match self {
            Self::Student { .. } => Persona::Student,
            Self::IndividualSponsor { .. } => Persona::IndividualSponsor,
            Self::CorporateSponsor { .. } => Persona::CorporateSponsor,
            Self::School { .. } => Persona::School,
        }
    }

    /// Wire names of required fields that are blank after trimming.
    pub fn blank_fields(&self) -> Vec<&'static str> {
        fn check<'a>(blanks: &mut Vec<&'a str>, fields: &[(&'a str, &str)]) {
            for (name, value) in fields {
                if value.trim().is_empty() {
                    blanks.push(name);
                }
            }
        }

        let mut blanks = Vec::new();
        match self {
            Self::Student {
                first_name,
                last_name,
                school_name,
                education_level,
                year_level,
                course,
                student_id_number,
                ..
            } => check(
                &mut blanks,
                &[
                    ("firstName", first_name),
                    ("lastName", last_name),
                    ("schoolName", school_name),
                    ("educationLevel", education_level),
                    ("yearLevel", year_level),
                    ("course", course),
                    ("studentIdNumber", student_id_number),
                ],
            ),
            Self::IndividualSponsor {
                first_name,
                last_name,
                id_type,
                id_number,
                employment_type,
                nature_of_work,
                source_of_income,
            } => check(
                &mut blanks,
                &[
                    ("firstName", first_name),
                    ("lastName", last_name),
                    ("idType", id_type),
                    ("idNumber", id_number),
                    ("employmentType", employment_type),
                    ("natureOfWork", nature_of_work),
                    ("sourceOfIncome", source_of_income),
                ],
            ),
            Self::CorporateSponsor {
                company_name,
                registration_number,
                organization_type,
                industry_sector,
                contact_person,
            } => check(
                &mut blanks,
                &[
                    ("companyName", company_name),
                    ("registrationNumber", registration_number),
                    ("organizationType", organization_type),
                    ("industrySector", industry_sector),
                    ("contactPerson", contact_person),
                ],
            ),
            Self::School {
                school_name,
                school_type,
                accreditation_number,
                contact_person,
            } => check(
                &mut blanks,
                &[
                    ("schoolName", school_name),
                    ("schoolType", school_type),
                    ("accreditationNumber", accreditation_number),
                    ("contactPerson", contact_person),
                ],
            ),
        }
        blanks
    }
}

/// One persona submission under review.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub persona: Persona,
    pub profile: serde_json::Value,
    pub status: VerificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<Uuid>,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Counts per review status.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: i64,
    pub pending: i64,
    pub pre_approved: i64,
    pub verified: i64,
    pub denied: i64,
}

impl StatusCounts {
    pub fn record(&mut self, status: VerificationStatus, count: i64) {
        self.total += count;
        match status {
            VerificationStatus::Pending => self.pending += count,
            VerificationStatus::PreApproved => self.pre_approved += count,
            VerificationStatus::Verified => self.verified += count,
            VerificationStatus::Denied => self.denied += count,
        }
    }
}

/// Counts per submitted persona.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersonaCounts {
    pub student: i64,
    pub individual_sponsor: i64,
    pub corporate_sponsor: i64,
    pub school: i64,
}

impl PersonaCounts {
    pub fn record(&mut self, persona: Persona, count: i64) {
        match persona {
            Persona::Student => self.student += count,
            Persona::IndividualSponsor => self.individual_sponsor += count,
            Persona::CorporateSponsor => self.corporate_sponsor += count,
            Persona::School => self.school += count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn persona_tag_selects_the_variant() {
        let profile: PersonaProfile = serde_json::from_value(json!({
            "persona": "individualSponsor",
            "firstName": "Liza",
            "lastName": "Reyes",
            "idType": "UMID",
            "idNumber": "0011-2233445-6",
            "employmentType": "Employed",
            "natureOfWork": "Private Sector",
            "sourceOfIncome": "Salary"
        }))
        .unwrap();
        assert_eq!(profile.persona(), Persona::IndividualSponsor);
        assert!(profile.blank_fields().is_empty());
    }

    #[test]
    fn unknown_persona_tag_is_rejected() {
        let result: Result<PersonaProfile, _> = serde_json::from_value(json!({
            "persona": "guardian",
            "firstName": "X"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn blank_required_fields_are_reported_by_wire_name() {
        let profile: PersonaProfile = serde_json::from_value(json!({
            "persona": "school",
            "schoolName": "   ",
            "schoolType": "Public",
            "accreditationNumber": "",
            "contactPerson": "Dean Cruz"
        }))
        .unwrap();
        assert_eq!(profile.blank_fields(), vec!["schoolName", "accreditationNumber"]);
    }

    #[test]
    fn student_optional_id_fields_may_be_absent() {
        let profile: PersonaProfile = serde_json::from_value(json!({
            "persona": "student",
            "firstName": "Ben",
            "lastName": "Santos",
            "schoolName": "PUP",
            "educationLevel": "Undergraduate",
            "yearLevel": "2nd Year",
            "course": "BS Computer Science",
            "studentIdNumber": "2021-00123"
        }))
        .unwrap();
        assert!(profile.blank_fields().is_empty());

        let wire = serde_json::to_value(&profile).unwrap();
        assert_eq!(wire["persona"], "student");
        assert!(wire.get("idType").is_none());
    }

    #[test]
    fn status_wire_names_use_snake_case() {
        assert_eq!(
            serde_json::to_value(VerificationStatus::PreApproved).unwrap(),
            "pre_approved"
        );
        assert_eq!(VerificationStatus::parse("pre_approved"), Some(VerificationStatus::PreApproved));
        assert_eq!(VerificationStatus::parse("preApproved"), None);
    }

    #[test]
    fn decided_statuses_exclude_pending() {
        assert!(!VerificationStatus::Pending.is_decided());
        assert!(VerificationStatus::PreApproved.is_decided());
        assert!(VerificationStatus::Verified.is_decided());
        assert!(VerificationStatus::Denied.is_decided());
    }

    #[test]
    fn status_counts_accumulate_totals() {
        let mut counts = StatusCounts::default();
        counts.record(VerificationStatus::Pending, 3);
        counts.record(VerificationStatus::Denied, 2);
        assert_eq!(counts.total, 5);
        assert_eq!(counts.pending, 3);
        assert_eq!(counts.denied, 2);
        assert_eq!(counts.verified, 0);
    }
}
