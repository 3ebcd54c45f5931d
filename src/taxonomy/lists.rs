use std::collections::BTreeMap;
use thiserror::Error;

/// Field name -> list values, the mutable body of a configuration document.
pub type Lists = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxonomyError {
    #[error("Item cannot be empty")]
    EmptyValue,

    #[error("'{0}' already exists")]
    Duplicate(String),

    #[error("'{0}' was not found")]
    NotFound(String),

    #[error("Unknown configuration resource: {0}")]
    UnknownResource(String),

    #[error("Unknown configuration document: {0}")]
    UnknownDocument(String),
}

fn clean(value: &str) -> Result<String, TaxonomyError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TaxonomyError::EmptyValue);
    }
    Ok(trimmed.to_string())
}

/// Append `item` to `field`. Exact-match duplicates are rejected and the
/// list is left untouched.
pub fn add_item(lists: &mut Lists, field: &str, item: &str) -> Result<(), TaxonomyError> {
    let item = clean(item)?;
    let values = lists.entry(field.to_string()).or_default();
    if values.iter().any(|v| v == &item) {
        return Err(TaxonomyError::Duplicate(item));
    }
    values.push(item);
    Ok(())
}

/// Replace the first occurrence of `old` with `new`, keeping its position.
/// Renaming a value to itself is a no-op, not a conflict.
pub fn rename_item(
    lists: &mut Lists,
    field: &str,
    old: &str,
    new: &str,
) -> Result<(), TaxonomyError> {
    let old = clean(old)?;
    let new = clean(new)?;

    let values = lists
        .get_mut(field)
        .ok_or_else(|| TaxonomyError::NotFound(old.clone()))?;

    let position = values
        .iter()
        .position(|v| v == &old)
        .ok_or_else(|| TaxonomyError::NotFound(old.clone()))?;

    if new != old {
        if values.iter().any(|v| v == &new) {
            return Err(TaxonomyError::Duplicate(new));
        }
        values[position] = new;
    }
    Ok(())
}

/// Remove exactly one occurrence of `item` from `field`.
pub fn remove_item(lists: &mut Lists, field: &str, item: &str) -> Result<(), TaxonomyError> {
    let item = clean(item)?;

    let values = lists
        .get_mut(field)
        .ok_or_else(|| TaxonomyError::NotFound(item.clone()))?;

    let position = values
        .iter()
        .position(|v| v == &item)
        .ok_or(TaxonomyError::NotFound(item))?;

    values.remove(position);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::catalog;

    fn fresh_identity() -> Lists {
        catalog::IDENTITY.default_lists()
    }

    #[test]
    fn add_two_distinct_items_keeps_both_without_duplicates() {
        let mut lists = fresh_identity();
        add_item(&mut lists, "idTypes", "SSS ID").unwrap();
        add_item(&mut lists, "idTypes", "PhilHealth ID").unwrap();

        let values = &lists["idTypes"];
        assert!(values.contains(&"SSS ID".to_string()));
        assert!(values.contains(&"PhilHealth ID".to_string()));
        let mut deduped = values.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), values.len());
    }

    #[test]
    fn add_existing_item_conflicts_and_leaves_list_unchanged() {
        let mut lists = fresh_identity();
        let before = lists["idTypes"].clone();

        let err = add_item(&mut lists, "idTypes", "Passport").unwrap_err();
        assert_eq!(err, TaxonomyError::Duplicate("Passport".to_string()));
        assert_eq!(lists["idTypes"], before);
    }

    #[test]
    fn fresh_id_types_plus_sss_id_matches_documented_sequence() {
        let mut lists = fresh_identity();
        add_item(&mut lists, "idTypes", "SSS ID").unwrap();
        assert_eq!(
            lists["idTypes"],
            vec!["UMID", "Passport", "Company ID", "SSS ID"]
        );

        // Repeating the same add conflicts and changes nothing
        let before = lists["idTypes"].clone();
        assert!(matches!(
            add_item(&mut lists, "idTypes", "SSS ID"),
            Err(TaxonomyError::Duplicate(_))
        ));
        assert_eq!(lists["idTypes"], before);
    }

    #[test]
    fn rename_missing_old_value_reports_not_found_and_leaves_list_unchanged() {
        let mut lists = fresh_identity();
        let before = lists["idTypes"].clone();

        let err = rename_item(&mut lists, "idTypes", "Voter's ID", "National ID").unwrap_err();
        assert_eq!(err, TaxonomyError::NotFound("Voter's ID".to_string()));
        assert_eq!(lists["idTypes"], before);
    }

    #[test]
    fn rename_onto_another_existing_value_conflicts() {
        let mut lists = fresh_identity();
        let err = rename_item(&mut lists, "idTypes", "UMID", "Passport").unwrap_err();
        assert_eq!(err, TaxonomyError::Duplicate("Passport".to_string()));
        assert_eq!(lists["idTypes"], vec!["UMID", "Passport", "Company ID"]);
    }

    #[test]
    fn rename_keeps_position_and_rename_to_self_is_noop() {
        let mut lists = fresh_identity();
        rename_item(&mut lists, "idTypes", "Passport", "PH Passport").unwrap();
        assert_eq!(lists["idTypes"], vec!["UMID", "PH Passport", "Company ID"]);

        rename_item(&mut lists, "idTypes", "UMID", "UMID").unwrap();
        assert_eq!(lists["idTypes"], vec!["UMID", "PH Passport", "Company ID"]);
    }

    #[test]
    fn remove_missing_item_reports_not_found() {
        let mut lists = fresh_identity();
        let err = remove_item(&mut lists, "idTypes", "Barangay ID").unwrap_err();
        assert_eq!(err, TaxonomyError::NotFound("Barangay ID".to_string()));
    }

    #[test]
    fn remove_present_item_drops_exactly_one_occurrence() {
        let mut lists = fresh_identity();
        remove_item(&mut lists, "idTypes", "Passport").unwrap();
        assert_eq!(lists["idTypes"], vec!["UMID", "Company ID"]);
    }

    #[test]
    fn values_are_trimmed_and_blank_input_is_rejected() {
        let mut lists = fresh_identity();
        add_item(&mut lists, "idTypes", "  SSS ID  ").unwrap();
        assert!(lists["idTypes"].contains(&"SSS ID".to_string()));

        assert_eq!(
            add_item(&mut lists, "idTypes", "   ").unwrap_err(),
            TaxonomyError::EmptyValue
        );
        assert_eq!(
            remove_item(&mut lists, "idTypes", "").unwrap_err(),
            TaxonomyError::EmptyValue
        );

        // Trimmed match: "  UMID " removes the stored "UMID"
        remove_item(&mut lists, "idTypes", "  UMID ").unwrap();
        assert!(!lists["idTypes"].contains(&"UMID".to_string()));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let mut lists = fresh_identity();
        add_item(&mut lists, "idTypes", "passport").unwrap();
        assert!(lists["idTypes"].contains(&"Passport".to_string()));
        assert!(lists["idTypes"].contains(&"passport".to_string()));
    }

    #[test]
    fn unknown_field_behaves_as_missing_value_for_rename_and_remove() {
        let mut lists = Lists::new();
        assert!(matches!(
            rename_item(&mut lists, "idTypes", "UMID", "National ID"),
            Err(TaxonomyError::NotFound(_))
        ));
        assert!(matches!(
            remove_item(&mut lists, "idTypes", "UMID"),
            Err(TaxonomyError::NotFound(_))
        ));
        // add creates the field on demand
        add_item(&mut lists, "idTypes", "UMID").unwrap();
        assert_eq!(lists["idTypes"], vec!["UMID"]);
    }
}
