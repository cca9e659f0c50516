use std::env;
use std::error;
use std::str::FromStr;

use log::warn;

use super::ConfigurationReader;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("couldn't parse the value of {0:?} environment variable as UTF-8 string")]
    NotUtf8(String),

    #[error("couldn't parse the value of {0:?} environment variable: {1}")]
    ParsingFailed(String, #[source] Box<dyn error::Error + Send + Sync>),
}

pub fn parse_env_var<T: FromStr>(name: &str) -> Result<Option<T>, Error>
where
    T::Err: error::Error + Send + Sync + 'static,
{
    if let Some(value) = env::var_os(name) {
        Ok(Some(
            value
                .into_string()
                .map_err(|_| Error::NotUtf8(name.to_string()))?
                .parse()
                .map_err(|err| Error::ParsingFailed(name.to_string(), Box::new(err)))?,
        ))
    } else {
        Ok(None)
    }
}

/// Reads settings from environment variables.
///
/// The value of `(category, key)` is taken from `{PREFIX}_{CATEGORY}_{KEY}`,
/// upper-cased, with every character that is not ASCII alphanumeric
/// replaced by `_`.
#[derive(Debug, Clone, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct EnvConfigurationReader {
    prefix: Option<String>,
}

impl EnvConfigurationReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: Some(prefix.to_string()),
        }
    }

    pub fn variable_name(&self, category: &str, key: &str) -> String {
        let parts = self.prefix.as_deref().into_iter().chain([category, key]);
        parts
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.chars()
                    .map(|c| {
                        if c.is_ascii_alphanumeric() {
                            c.to_ascii_uppercase()
                        } else {
                            '_'
                        }
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Reads and parses a value, reporting malformed values instead of
    /// hiding them.
    pub fn get_parsed<T: FromStr>(&self, category: &str, key: &str) -> Result<Option<T>, Error>
    where
        T::Err: error::Error + Send + Sync + 'static,
    {
        parse_env_var(&self.variable_name(category, key))
    }
}

impl ConfigurationReader for EnvConfigurationReader {
    fn get_configuration_value(&self, category: &str, key: &str) -> Option<String> {
        let name = self.variable_name(category, key);
        match parse_env_var::<String>(&name) {
            Ok(value) => value,
            Err(e) => {
                warn!("Ignoring configuration value: {e}");
                None
            }
        }
    }
}
