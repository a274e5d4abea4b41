//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global subscriber (pretty or JSON)
//! - Build per-listener loggers for the lifecycle coordinator
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` overrides the configured level

use std::sync::Arc;

use thiserror::Error;
use tracing::level_filters::{LevelFilter, ParseLevelFilterError};
use tracing::{Level, Span};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::{LogFormat, LoggingConfig};

/// Errors raised while building a logger or installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level {level:?}")]
    InvalidLevel {
        level: String,
        #[source]
        source: ParseLevelFilterError,
    },
    #[error("listener name must not be empty")]
    EmptyName,
    #[error("invalid log filter {level:?}")]
    Filter {
        level: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("failed to install global subscriber")]
    Init(#[source] tracing_subscriber::util::TryInitError),
}

/// Install the process-wide subscriber described by `config`.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|source| LoggingError::Filter {
            level: config.level.clone(),
            source,
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    }
    .map_err(LoggingError::Init)
}

/// Logger bound to a single `{listener: address}` context.
///
/// Every message is emitted inside a span carrying the listener name, its
/// address and a per-run id, so all lifecycle lines of one run correlate.
#[derive(Debug, Clone)]
pub struct Logger {
    span: Span,
    filter: LevelFilter,
    listener: Arc<str>,
    address: Arc<str>,
    run_id: Uuid,
}

impl Logger {
    /// Build a logger from `config` with the context `{listener: address}`.
    pub fn new(config: &LoggingConfig, listener: &str, address: &str) -> Result<Self, LoggingError> {
        if listener.trim().is_empty() {
            return Err(LoggingError::EmptyName);
        }
        let filter = config
            .level
            .parse::<LevelFilter>()
            .map_err(|source| LoggingError::InvalidLevel {
                level: config.level.clone(),
                source,
            })?;

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "serve",
            listener = %listener,
            address = %address,
            run_id = %run_id,
        );

        Ok(Self {
            span,
            filter,
            listener: Arc::from(listener),
            address: Arc::from(address),
            run_id,
        })
    }

    pub fn listener(&self) -> &str {
        &self.listener
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Whether messages at `level` pass this logger's configured threshold.
    pub fn enabled(&self, level: Level) -> bool {
        self.filter >= level
    }

    pub fn debug(&self, message: &str) {
        if self.enabled(Level::DEBUG) {
            tracing::debug!(parent: &self.span, "{}", message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.enabled(Level::INFO) {
            tracing::info!(parent: &self.span, "{}", message);
        }
    }

    pub fn warn(&self, message: &str) {
        if self.enabled(Level::WARN) {
            tracing::warn!(parent: &self.span, "{}", message);
        }
    }

    pub fn error(&self, message: &str) {
        if self.enabled(Level::ERROR) {
            tracing::error!(parent: &self.span, "{}", message);
        }
    }
}
