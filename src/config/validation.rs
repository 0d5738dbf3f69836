//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts within (0, one year], limits > 0)
//! - Check that pass-through collaborator settings are present
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::fmt;
use std::net::SocketAddr;
use tokio::sync::Semaphore;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Upper bound for every timeout and interval: one year.
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

fn check_duration(errors: &mut Vec<ValidationError>, field: &'static str, secs: u64) {
    if secs == 0 {
        errors.push(ValidationError::new(field, "must be greater than zero"));
    } else if secs > MAX_DURATION_SECS {
        errors.push(ValidationError::new(
            field,
            format!("must not exceed {} seconds", MAX_DURATION_SECS),
        ));
    }
}

/// Check every semantic rule and collect all violations.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_duration(&mut errors, "lifecycle.start_timeout_secs", config.lifecycle.start_timeout_secs);
    check_duration(&mut errors, "lifecycle.shutdown_timeout_secs", config.lifecycle.shutdown_timeout_secs);

    if let Err(e) = url::Url::parse(&config.iss.base_url) {
        errors.push(ValidationError::new("iss.base_url", format!("invalid URL: {}", e)));
    }
    if config.iss.max_connections == 0 {
        errors.push(ValidationError::new("iss.max_connections", "must be greater than zero"));
    } else if config.iss.max_connections > Semaphore::MAX_PERMITS {
        errors.push(ValidationError::new(
            "iss.max_connections",
            format!("must not exceed {}", Semaphore::MAX_PERMITS),
        ));
    }
    check_duration(&mut errors, "iss.request_timeout_secs", config.iss.request_timeout_secs);
    if config.iss.retry_attempts == 0 {
        errors.push(ValidationError::new("iss.retry_attempts", "must allow at least one attempt"));
    }
    if config.iss.retry_base_delay_ms > config.iss.retry_max_delay_ms {
        errors.push(ValidationError::new(
            "iss.retry_base_delay_ms",
            "must not exceed iss.retry_max_delay_ms",
        ));
    }

    check_duration(&mut errors, "tables.update_interval_secs", config.tables.update_interval_secs);
    if config.tables.event_capacity == 0 {
        errors.push(ValidationError::new("tables.event_capacity", "must be greater than zero"));
    }
    if config.tables.group.trim().is_empty() {
        errors.push(ValidationError::new("tables.group", "must not be empty"));
    }
    if config.tables.name.trim().is_empty() {
        errors.push(ValidationError::new("tables.name", "must not be empty"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {}", config.observability.metrics_address),
        ));
    }

    if config.repository.uri.trim().is_empty() {
        errors.push(ValidationError::new("repository.uri", "must not be empty"));
    }
    if config.repository.database.trim().is_empty() {
        errors.push(ValidationError::new("repository.database", "must not be empty"));
    }
    if config.server.address.trim().is_empty() {
        errors.push(ValidationError::new("server.address", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.lifecycle.start_timeout_secs = 0;
        config.iss.base_url = "not a url".to_string();
        config.tables.name = "  ".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["lifecycle.start_timeout_secs", "iss.base_url", "tables.name"]
        );
    }

    #[test]
    fn test_oversized_durations_and_limits_rejected() {
        let mut config = AppConfig::default();
        config.lifecycle.start_timeout_secs = i64::MAX as u64;
        config.lifecycle.shutdown_timeout_secs = u64::MAX;
        config.iss.max_connections = Semaphore::MAX_PERMITS + 1;
        config.iss.request_timeout_secs = MAX_DURATION_SECS + 1;
        config.tables.update_interval_secs = u64::MAX;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "lifecycle.start_timeout_secs",
                "lifecycle.shutdown_timeout_secs",
                "iss.max_connections",
                "iss.request_timeout_secs",
                "tables.update_interval_secs",
            ]
        );

        config = AppConfig::default();
        config.lifecycle.start_timeout_secs = MAX_DURATION_SECS;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = AppConfig::default();
        config.observability.metrics_address = "nowhere".to_string();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "observability.metrics_address");
    }
}
