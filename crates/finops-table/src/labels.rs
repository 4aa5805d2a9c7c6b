//! Label derivation from a data row.

use std::collections::BTreeMap;

/// Columns with this prefix are provider-internal and never exported.
pub const INTERNAL_PREFIX: &str = "x_";

pub fn is_internal_column(header: &str) -> bool {
    header.starts_with(INTERNAL_PREFIX)
}

/// Structured-tag columns (`Tags`, `x_ResourceTags`, ...).
pub fn is_tag_column(header: &str) -> bool {
    header.to_ascii_lowercase().contains("tags")
}

/// Flatten a tag value so it is safe inside a label value:
/// braces and quotes are dropped, `=` becomes `:` and `,` becomes `;`.
pub fn sanitize_tags(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '"'))
        .map(|c| match c {
            '=' => ':',
            ',' => ';',
            other => other,
        })
        .collect()
}

/// Column name → value, ordered by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    /// Build labels for `row`, skipping internal columns and the value
    /// column at `value_index`.
    pub fn from_row(header: &[String], row: &[String], value_index: usize) -> Self {
        let labels = header
            .iter()
            .zip(row)
            .enumerate()
            .filter(|(i, (name, _))| *i != value_index && !is_internal_column(name))
            .map(|(_, (name, value))| {
                let value = if is_tag_column(name) {
                    sanitize_tags(value)
                } else {
                    value.clone()
                };
                (name.clone(), value)
            })
            .collect();
        Self(labels)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn drops_value_and_internal_columns() {
        let header = strings(&["BilledCost", "ServiceName", "x_BillingProfileId", "ResourceId"]);
        let row = strings(&["12.5", "Storage", "bp-1", "disk-1"]);
        let labels = LabelSet::from_row(&header, &row, 0);

        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get("ServiceName"), Some("Storage"));
        assert_eq!(labels.get("ResourceId"), Some("disk-1"));
        assert_eq!(labels.get("BilledCost"), None);
        assert_eq!(labels.get("x_BillingProfileId"), None);
    }

    #[test]
    fn labels_sorted_by_name() {
        let header = strings(&["Zeta", "Alpha", "Value"]);
        let row = strings(&["z", "a", "1"]);
        let labels = LabelSet::from_row(&header, &row, 2);
        let names: Vec<&str> = labels.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn tag_values_are_sanitized() {
        let header = strings(&["Tags", "BilledCost"]);
        let row = strings(&[r#"{"env"="prod","team"="core"}"#, "1"]);
        let labels = LabelSet::from_row(&header, &row, 1);
        assert_eq!(labels.get("Tags"), Some("env:prod;team:core"));
    }

    #[test]
    fn tag_detection_ignores_case() {
        assert!(is_tag_column("Tags"));
        assert!(is_tag_column("ResourceTags"));
        assert!(is_tag_column("tags"));
        assert!(!is_tag_column("ServiceName"));
    }

    #[test]
    fn sanitized_tags_never_contain_reserved_characters() {
        for raw in [
            r#"{"a"="b"}"#,
            "k=v,k2=v2",
            r#"{{"nested"={"x"="y"}}}"#,
            "plain",
            "",
        ] {
            let clean = sanitize_tags(raw);
            assert!(
                !clean.contains(['{', '}', '=', ',', '"']),
                "{raw:?} -> {clean:?}"
            );
        }
    }

    #[test]
    fn short_row_yields_only_present_columns() {
        let header = strings(&["A", "B", "C"]);
        let row = strings(&["1", "2"]);
        let labels = LabelSet::from_row(&header, &row, 2);
        assert_eq!(labels.len(), 2);
    }
}
