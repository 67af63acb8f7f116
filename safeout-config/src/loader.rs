//! Configuration loader implementations.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::info;

use crate::error::{ConfigError, ConfigResult};
use crate::schema::SafeOutputsConfig;
use crate::store::PolicyStore;

/// Environment variable holding either a path to the configuration file or
/// the JSON document itself.
pub const CONFIG_ENV_VAR: &str = "SAFE_OUTPUTS_CONFIG";

/// Parses a JSON configuration document.
///
/// Object keys may be spelled `snake_case` or `kebab-case`.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed documents and any validation
/// error raised by [`PolicyStore::from_config`].
pub fn load_from_str(json: &str) -> ConfigResult<PolicyStore> {
    let raw: Value = serde_json::from_str(json)?;
    let config: SafeOutputsConfig = serde_json::from_value(normalize_keys(raw))?;
    PolicyStore::from_config(config)
}

/// Reads and parses a configuration file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when the file cannot be read, plus every error
/// documented on [`load_from_str`].
pub fn load_from_path(path: impl AsRef<Path>) -> ConfigResult<PolicyStore> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let store = load_from_str(&contents)?;
    info!(path = %path.display(), "safe output configuration loaded");
    Ok(store)
}

/// Loads configuration from [`CONFIG_ENV_VAR`].
///
/// Values starting with `{` are parsed as inline JSON; anything else is
/// treated as a file path.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnv`] when the variable is unset, plus every
/// error documented on [`load_from_path`].
pub fn load_from_env() -> ConfigResult<PolicyStore> {
    let value = std::env::var(CONFIG_ENV_VAR).map_err(|_| ConfigError::MissingEnv {
        name: CONFIG_ENV_VAR,
    })?;
    if value.trim_start().starts_with('{') {
        load_from_str(&value)
    } else {
        load_from_path(value.trim())
    }
}

fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key.replace('_', "-"), normalize_keys(value)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safeout_primitives::ActionType;

    use crate::schema::Target;

    #[test]
    fn accepts_snake_case_keys() {
        let store = load_from_str(
            r#"{
                "close_pull_request": {
                    "max": 2,
                    "required_labels": ["ready"],
                    "required_title_prefix": "[bot] "
                },
                "add_comment": {"hide_older_comments": true, "target": "*"}
            }"#,
        )
        .unwrap();

        let close = store.close_pull_request().unwrap();
        assert_eq!(close.required_labels.as_deref(), Some(&["ready".to_owned()][..]));
        assert_eq!(close.required_title_prefix.as_deref(), Some("[bot] "));
        assert_eq!(store.max(ActionType::ClosePullRequest), Some(2));

        let comment = store.add_comment().unwrap();
        assert!(comment.hide_older_comments);
        assert_eq!(comment.target, Target::Any);
    }

    #[test]
    fn invalid_project_url_is_a_parse_error() {
        let err = load_from_str(
            r#"{"github-token": "t", "update-project": {"project": "https://example.com/nope"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_from_path_reads_file() {
        let mut path = std::env::temp_dir();
        path.push(format!("safe-outputs-config-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{"staged": true, "create-issue": {}}"#).unwrap();

        let store = load_from_path(&path).unwrap();
        assert!(store.staged());
        assert!(store.is_enabled(ActionType::CreateIssue));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { path, .. } if path.ends_with("here.json")));
    }
}
