//! Configuration validation.

use chrono::NaiveDate;

use crate::config::loader::Config;
use crate::error::{Error, Result};

/// Parse a YYYY-MM-DD date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| Error::ConfigValidation {
        field: "time".to_string(),
        message: format!("'{}' is not a YYYY-MM-DD date", value),
    })
}

/// Validate the merged configuration before a run starts.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.options.thread == 0 {
        return Err(Error::ConfigValidation {
            field: "options.thread".to_string(),
            message: "worker pool width must be at least 1".to_string(),
        });
    }

    if config.options.retries == 0 {
        return Err(Error::ConfigValidation {
            field: "options.retries".to_string(),
            message: "retry budget must be at least 1".to_string(),
        });
    }

    if !config.options.max_per_second.is_finite() || config.options.max_per_second <= 0.0 {
        return Err(Error::ConfigValidation {
            field: "options.max_per_second".to_string(),
            message: "request rate must be positive".to_string(),
        });
    }

    let start = match config.options.start_time.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(s) => Some(parse_date(s).map_err(|_| Error::ConfigValidation {
            field: "options.start_time".to_string(),
            message: format!("'{}' is not a YYYY-MM-DD date", s),
        })?),
        None => None,
    };
    let end = match config.options.end_time.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(s) => Some(parse_date(s).map_err(|_| Error::ConfigValidation {
            field: "options.end_time".to_string(),
            message: format!("'{}' is not a YYYY-MM-DD date", s),
        })?),
        None => None,
    };
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(Error::ConfigValidation {
                field: "options.start_time".to_string(),
                message: "start_time is after end_time".to_string(),
            });
        }
    }

    if config.increase_enabled() && !config.options.database {
        return Err(Error::ConfigValidation {
            field: "increase".to_string(),
            message: "incremental mode requires database = true".to_string(),
        });
    }

    Ok(())
}

impl Config {
    /// Whether any scope has incremental mode switched on.
    pub fn increase_enabled(&self) -> bool {
        self.increase.post || self.increase.like || self.increase.mix || self.increase.music
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn zero_threads_rejected() {
        let mut config = Config::default();
        config.options.thread = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn bad_date_rejected() {
        let mut config = Config::default();
        config.options.start_time = Some("01/02/2024".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn inverted_window_rejected() {
        let mut config = Config::default();
        config.options.start_time = Some("2024-06-01".to_string());
        config.options.end_time = Some("2024-01-01".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn valid_window_accepted() {
        let mut config = Config::default();
        config.options.start_time = Some("2024-01-01".to_string());
        config.options.end_time = Some("2024-06-01".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn incremental_without_database_rejected() {
        let mut config = Config::default();
        config.increase.music = true;
        config.options.database = false;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn parse_date_accepts_iso_days() {
        assert!(parse_date("2024-02-29").is_ok());
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("nope").is_err());
    }
}
