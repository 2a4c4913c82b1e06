use figment::{
    providers::{Env, Serialized},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment variable overrides, e.g. `IMGMIRROR_MIRROR__POOL_SIZE=4`
const ENV_PREFIX: &str = "IMGMIRROR_";

/// Load variables from an env file into the process environment.
///
/// Variables already set in the environment are not overridden.
pub fn load_env_file(path: &Path) -> Result<(), ConfigError> {
    dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Load configuration from file with `${VAR}` expansion and environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
    let table = expand_table(&contents)?;

    let config: Config = Figment::new()
        .merge(Serialized::defaults(table))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    let table = expand_table(toml_str)?;
    toml::Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError(e.to_string()))
}

fn expand_table(toml_str: &str) -> Result<toml::Table, ConfigError> {
    let mut table: toml::Table =
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    for (_, value) in table.iter_mut() {
        expand_placeholders(value)?;
    }
    Ok(table)
}

/// Replace every string of the form `${NAME}` with the value of env var `NAME`.
fn expand_placeholders(value: &mut toml::Value) -> Result<(), ConfigError> {
    match value {
        toml::Value::String(s) => {
            if let Some(name) = placeholder_name(s) {
                let resolved = std::env::var(name)
                    .ok()
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| ConfigError::MissingEnv(name.to_string()))?;
                *s = resolved;
            }
        }
        toml::Value::Array(items) => {
            for item in items {
                expand_placeholders(item)?;
            }
        }
        toml::Value::Table(table) => {
            for (_, item) in table.iter_mut() {
                expand_placeholders(item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn placeholder_name(s: &str) -> Option<&str> {
    s.strip_prefix("${").and_then(|rest| rest.strip_suffix('}'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
origin_host = "https://cdn.example.com/"

[mirror]
pool_size = 4
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.mirror.pool_size, 4);
    }

    #[test]
    fn test_load_config_from_str_missing_origin() {
        let toml = r#"
[mirror]
pool_size = 4
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
origin_host = "http://127.0.0.1:9000/"

[database]
path = "/tmp/records.db"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.origin_host, "http://127.0.0.1:9000/");
        assert_eq!(config.database.path.to_str().unwrap(), "/tmp/records.db");
    }

    #[test]
    fn test_env_override_beats_file_value() {
        // Only this test sets a mirror.request_timeout_secs override
        std::env::set_var("IMGMIRROR_MIRROR__REQUEST_TIMEOUT_SECS", "7");
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
origin_host = "https://cdn.example.com/"

[mirror]
request_timeout_secs = 30
local_dest = "from-file"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        std::env::remove_var("IMGMIRROR_MIRROR__REQUEST_TIMEOUT_SECS");

        assert_eq!(config.mirror.request_timeout_secs, 7);
        assert_eq!(config.mirror.local_dest, "from-file");
    }

    #[test]
    fn test_placeholder_is_expanded_from_env() {
        std::env::set_var("IMGMIRROR_TEST_ORIGIN_EXPAND", "https://a.example.com/");
        let toml = r#"
origin_host = "${IMGMIRROR_TEST_ORIGIN_EXPAND}"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.origin_host, "https://a.example.com/");
    }

    #[test]
    fn test_nested_placeholder_is_expanded() {
        std::env::set_var("IMGMIRROR_TEST_DB_PATH", "/srv/records.db");
        let toml = r#"
origin_host = "https://a.example.com/"

[database]
path = "${IMGMIRROR_TEST_DB_PATH}"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.database.path.to_str().unwrap(), "/srv/records.db");
    }

    #[test]
    fn test_unset_placeholder_is_fatal() {
        let toml = r#"
origin_host = "${IMGMIRROR_TEST_DEFINITELY_UNSET}"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        match err {
            ConfigError::MissingEnv(name) => assert_eq!(name, "IMGMIRROR_TEST_DEFINITELY_UNSET"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_partial_placeholder_is_left_alone() {
        let toml = r#"
origin_host = "https://${not-a-placeholder"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.origin_host, "https://${not-a-placeholder");
    }

    #[test]
    fn test_load_env_file() {
        let mut env_file = NamedTempFile::new().unwrap();
        writeln!(env_file, "IMGMIRROR_TEST_FROM_ENV_FILE=loaded").unwrap();

        load_env_file(env_file.path()).unwrap();
        assert_eq!(
            std::env::var("IMGMIRROR_TEST_FROM_ENV_FILE").unwrap(),
            "loaded"
        );
    }

    #[test]
    fn test_missing_env_file_is_fatal() {
        let err = load_env_file(Path::new("/nonexistent/.env")).unwrap_err();
        assert!(matches!(err, ConfigError::EnvFile { .. }));
    }
}
