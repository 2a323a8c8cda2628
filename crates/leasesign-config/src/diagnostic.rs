// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment reports deserialization problems with a key path and, for file
//! sources, the file they came from. This module turns those into miette
//! reports that point at the offending line of `leasesign.toml` and offer a
//! close match for misspelled keys.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a candidate must exceed to be offered as a fix.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A TOML file that was read while loading, kept for span lookup.
pub type TomlSource = (String, String);

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(leasesign::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest valid key, when one is similar enough.
        suggestion: Option<String>,
        /// Comma-separated keys accepted by the section.
        valid_keys: String,
        #[label("not a leasesign setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// `key` is the dotted path, e.g. `gateway.port`.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(leasesign::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(leasesign::config::missing_key),
        help("set `{key}` in leasesign.toml or through its LEASESIGN_* variable")
    )]
    MissingKey { key: String },

    /// Semantic check failed after deserialization.
    #[error("validation error: {message}")]
    #[diagnostic(code(leasesign::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(leasesign::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    let listing = format!("valid keys: {valid_keys}");
    suggestion.map_or(listing.clone(), |s| format!("did you mean `{s}`? {listing}"))
}

/// Expand a figment error chain into one [`ConfigError`] per problem.
///
/// `toml_sources` holds `(path, content)` for every file that was read so
/// spans can be resolved against the file figment blames.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[TomlSource],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let path: Vec<String> = error.path.clone();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate(&error, &path, field, toml_sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: dotted(&path, field),
                },
                Kind::InvalidType(actual, expected) => {
                    let (span, src) = match path.split_last() {
                        Some((field, section)) => locate(&error, section, field, toml_sources),
                        None => (None, None),
                    };
                    ConfigError::InvalidType {
                        key: path.join("."),
                        detail: format!("found {actual}, expected {expected}"),
                        expected: expected.to_string(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn dotted(section: &[String], field: &str) -> String {
    if section.last().is_some_and(|last| last == field) {
        return section.join(".");
    }
    section
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(field))
        .collect::<Vec<_>>()
        .join(".")
}

/// Span of `field` within `section` of the file the error was raised from.
fn locate(
    error: &figment::Error,
    section: &[String],
    field: &str,
    toml_sources: &[TomlSource],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let blamed = match error.metadata.as_ref().and_then(|m| m.source.as_ref()) {
        Some(figment::Source::File(path)) => path.display().to_string(),
        _ => return (None, None),
    };

    toml_sources
        .iter()
        .find(|(path, _)| *path == blamed)
        .and_then(|(path, content)| {
            let offset = find_key_offset(content, section, field)?;
            Some((
                Some(SourceSpan::new(offset.into(), field.len())),
                Some(NamedSource::new(path, content.clone())),
            ))
        })
        .unwrap_or((None, None))
}

/// Byte offset of `field` as a key inside the `[section]` table.
///
/// Only the first path segment is used as the table header. The search
/// stops at the next table header, so a same-named key in a later section
/// is never reported. An empty `section` searches the top of the file.
pub fn find_key_offset(content: &str, section: &[String], field: &str) -> Option<usize> {
    let mut in_table = section.is_empty();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let trimmed = line.trim_start();

        if trimmed.starts_with('[') {
            if in_table && !section.is_empty() {
                return None;
            }
            in_table = section
                .first()
                .is_some_and(|name| trimmed.trim_end() == format!("[{name}]"));
            continue;
        }
        if !in_table {
            continue;
        }

        let is_key = trimmed
            .strip_prefix(field)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c == '=' || c == ' ' || c == '\t');
        if is_key {
            return Some(start + (line.len() - trimmed.len()));
        }
    }
    None
}

/// Closest entry of `valid_keys` to `unknown`, if any clears the threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print every error to stderr as a graphical miette report.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut report = String::new();
        match handler.render_report(&mut report, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{report}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(name: &str) -> Vec<String> {
        vec![name.to_string()]
    }

    #[test]
    fn suggests_host_for_hots() {
        let valid = &["host", "port", "webhook_path", "bearer_token"];
        assert_eq!(suggest_key("hots", valid), Some("host".to_string()));
    }

    #[test]
    fn suggests_api_key_for_api_kye() {
        let valid = &["backend", "bucket", "endpoint", "api_key", "timeout_secs"];
        assert_eq!(suggest_key("api_kye", valid), Some("api_key".to_string()));
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        assert_eq!(suggest_key("zzzzzz", &["name", "log_level"]), None);
    }

    #[test]
    fn find_key_offset_in_section() {
        let content = "[service]\nname = \"x\"\n\n[gateway]\nhots = \"0.0.0.0\"\n";
        let o = find_key_offset(content, &section("gateway"), "hots").unwrap();
        assert_eq!(&content[o..o + 4], "hots");
    }

    #[test]
    fn find_key_offset_stops_at_next_table() {
        let content = "[gateway]\nport = 1\n\n[documents]\nbucket = \"b\"\n";
        assert!(find_key_offset(content, &section("gateway"), "bucket").is_none());
        let o = find_key_offset(content, &section("documents"), "bucket").unwrap();
        assert_eq!(&content[o..o + 6], "bucket");
    }

    #[test]
    fn find_key_offset_missing_section() {
        let content = "[service]\nname = \"x\"\n";
        assert!(find_key_offset(content, &section("gateway"), "host").is_none());
    }

    #[test]
    fn find_key_offset_ignores_prefix_matches() {
        let content = "[documents]\napi_key_file = \"x\"\napi_key = \"y\"\n";
        let o = find_key_offset(content, &section("documents"), "api_key").unwrap();
        assert!(content[o..].starts_with("api_key = "));
    }

    #[test]
    fn unknown_key_help_lists_suggestion() {
        let help = unknown_key_help(Some("host"), "host, port");
        assert!(help.contains("did you mean `host`?"));
        assert_eq!(unknown_key_help(None, "host"), "valid keys: host");
    }

    #[test]
    fn dotted_joins_section_and_field() {
        assert_eq!(dotted(&section("gateway"), "port"), "gateway.port");
        assert_eq!(dotted(&[], "port"), "port");
        let full = vec!["gateway".to_string(), "port".to_string()];
        assert_eq!(dotted(&full, "port"), "gateway.port");
    }
}
