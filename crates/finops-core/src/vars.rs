//! `<name>` placeholder substitution for API paths, server URLs and headers.
//!
//! A placeholder is replaced by the value mapped to `name`. When that value
//! is itself an all-uppercase identifier (e.g. `AZURE_SUBSCRIPTION`) it is
//! treated as the name of an environment variable and the variable's value
//! is used instead. Unknown names resolve to the empty string.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::warn;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^<>]*)>").expect("placeholder pattern is valid"));

/// Substitute placeholders, reading the process environment for
/// all-uppercase values.
pub fn substitute(text: &str, vars: &BTreeMap<String, String>) -> String {
    substitute_with(text, vars, |key| std::env::var(key).ok())
}

/// Substitute placeholders with an explicit environment lookup.
pub fn substitute_with<F>(text: &str, vars: &BTreeMap<String, String>, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            let name = &caps[1];
            let Some(value) = vars.get(name) else {
                warn!(variable = name, "no value for placeholder");
                return String::new();
            };
            if is_env_reference(value) {
                match lookup(value) {
                    Some(env_value) => env_value,
                    None => {
                        warn!(variable = name, env = %value, "environment variable not set");
                        String::new()
                    }
                }
            } else {
                value.clone()
            }
        })
        .into_owned()
}

fn is_env_reference(value: &str) -> bool {
    value.chars().any(|c| c.is_alphabetic()) && !value.chars().any(|c| c.is_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn replaces_mapped_values() {
        let v = vars(&[("subscription_id", "d3sa-123"), ("scope", "rg")]);
        assert_eq!(
            substitute_with("/subscriptions/<subscription_id>/<scope>/costs", &v, no_env),
            "/subscriptions/d3sa-123/rg/costs"
        );
    }

    #[test]
    fn uppercase_value_reads_environment() {
        let v = vars(&[("token", "API_TOKEN")]);
        let out = substitute_with("Bearer <token>", &v, |k| {
            (k == "API_TOKEN").then(|| "secret".to_string())
        });
        assert_eq!(out, "Bearer secret");
    }

    #[test]
    fn unset_environment_variable_is_empty() {
        let v = vars(&[("token", "API_TOKEN")]);
        assert_eq!(substitute_with("x<token>y", &v, no_env), "xy");
    }

    #[test]
    fn unknown_placeholder_is_empty() {
        assert_eq!(substitute_with("/a/<missing>/b", &BTreeMap::new(), no_env), "/a//b");
    }

    #[test]
    fn numeric_values_are_literal() {
        let v = vars(&[("year", "2024"), ("id", "ABC-12")]);
        let out = substitute_with("<year>/<id>", &v, |k| Some(format!("env:{k}")));
        assert_eq!(out, "2024/env:ABC-12");
    }

    #[test]
    fn text_without_placeholders_unchanged() {
        let v = vars(&[("a", "b")]);
        assert_eq!(
            substitute_with("https://api.example.com/x?y=1", &v, no_env),
            "https://api.example.com/x?y=1"
        );
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let v = vars(&[("a", "<b>"), ("b", "nope")]);
        assert_eq!(substitute_with("<a>", &v, no_env), "<b>");
    }
}
