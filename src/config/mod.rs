//! Site configuration loading (`_data/socials.yml`).

mod error;

pub use error::ConfigError;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_yaml::Value;
use tracing::debug;

/// Default location of the socials config holding `scholar_userid`.
pub const DEFAULT_SOCIALS_PATH: &str = "_data/socials.yml";

/// Key holding the Google Scholar user id.
pub const SCHOLAR_USERID_KEY: &str = "scholar_userid";

/// Returns the Google Scholar user id defined in the socials config at `path`.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file is missing or unparsable, or when
/// `scholar_userid` is absent or empty.
#[tracing::instrument(fields(path = %path.display()))]
pub fn load_scholar_user_id(path: &Path) -> Result<String, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let user_id = parse_scholar_user_id(&raw, path)?;
    debug!(scholar_userid = %user_id, "loaded scholar user id");
    Ok(user_id)
}

fn parse_scholar_user_id(raw: &str, path: &Path) -> Result<String, ConfigError> {
    let document: Value = serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let value = match &document {
        Value::Mapping(mapping) => mapping.get(SCHOLAR_USERID_KEY),
        _ => None,
    };

    let user_id = match value {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    };

    if user_id.is_empty() {
        return Err(ConfigError::missing_key(path, SCHOLAR_USERID_KEY));
    }
    Ok(user_id)
}
