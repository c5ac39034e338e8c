//! INI configuration adapter.
//!
//! Values may carry a trailing `;` or `#` comment (`sizing = risk ; fixed | risk`);
//! the comment is dropped and the rest trimmed. An empty value reads as unset.

use crate::domain::error::SigtraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SigtraderError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| SigtraderError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, SigtraderError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| SigtraderError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn value(&self, section: &str, key: &str) -> Option<String> {
        let raw = self.config.get(section, key)?;
        let value = strip_comment(&raw).trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// Cuts at the first `;` or `#` that starts the value or follows whitespace.
fn strip_comment(raw: &str) -> &str {
    let mut prev_blank = true;
    for (i, c) in raw.char_indices() {
        if (c == ';' || c == '#') && prev_blank {
            return &raw[..i];
        }
        prev_blank = c.is_whitespace();
    }
    raw
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.value(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.value(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.value(section, key)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(default)
    }
}
