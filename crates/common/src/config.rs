use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Errors from loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Load a JSON config file, or fall back to `T::default()` when no path is given.
///
/// Missing fields are filled by the type's own `#[serde(default)]` handling.
pub fn load_json_or_default<T>(path: Option<&Path>) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        tracing::debug!("no config file given, using defaults");
        return Ok(T::default());
    };

    let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value = serde_json::from_str(&data).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("loaded config from {}", path.display());
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(default)]
    struct Sample {
        speed: f32,
        count: u32,
    }

    #[test]
    fn none_path_yields_default() {
        let cfg: Sample = load_json_or_default(None).unwrap();
        assert_eq!(cfg, Sample::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "speed": 0.5 }}"#).unwrap();
        let cfg: Sample = load_json_or_default(Some(file.path())).unwrap();
        assert_eq!(cfg.speed, 0.5);
        assert_eq!(cfg.count, 0);
    }

    #[test]
    fn malformed_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = load_json_or_default::<Sample>(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
        assert!(err.to_string().contains("invalid config"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_json_or_default::<Sample>(Some(Path::new("/nonexistent/vigil.json")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
