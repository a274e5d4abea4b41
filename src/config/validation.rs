//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::config::schema::ServiceConfig;
use crate::resilience::Backoff;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.name must not be empty")]
    EmptyListenerName,
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),
    #[error("listener.max_connections must be greater than zero")]
    ZeroMaxConnections,
    #[error("logging.level {0:?} is not a level")]
    LogLevel(String),
    #[error("probe.tries must be greater than zero")]
    ZeroTries,
    #[error("probe.timeout_ms must be greater than zero")]
    ZeroTimeout,
    #[error("probe.backoff delay must be greater than zero")]
    ZeroDelay,
    #[error("probe.backoff base_ms ({base_ms}) exceeds max_ms ({max_ms})")]
    BackoffRange { base_ms: u64, max_ms: u64 },
    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

/// Check every semantic constraint and collect all violations.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.name.trim().is_empty() {
        errors.push(ValidationError::EmptyListenerName);
    }
    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }
    if config.logging.level.parse::<LevelFilter>().is_err() {
        errors.push(ValidationError::LogLevel(config.logging.level.clone()));
    }
    if config.probe.tries == 0 {
        errors.push(ValidationError::ZeroTries);
    }
    if config.probe.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    match config.probe.backoff {
        Backoff::Constant { delay_ms: 0 } => errors.push(ValidationError::ZeroDelay),
        Backoff::Exponential { base_ms: 0, .. } => errors.push(ValidationError::ZeroDelay),
        Backoff::Exponential { base_ms, max_ms } if base_ms > max_ms => {
            errors.push(ValidationError::BackoffRange { base_ms, max_ms })
        }
        _ => {}
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
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
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ServiceConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_violation() {
        let mut config = ServiceConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.logging.level = "loud".into();
        config.probe.timeout_ms = 0;
        config.probe.backoff = Backoff::Exponential { base_ms: 500, max_ms: 100 };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BindAddress("nowhere".into()),
                ValidationError::LogLevel("loud".into()),
                ValidationError::ZeroTimeout,
                ValidationError::BackoffRange { base_ms: 500, max_ms: 100 },
            ]
        );
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = ServiceConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::MetricsAddress("bogus".into())])
        );
    }
}
