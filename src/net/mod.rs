//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Reference worker (echo.rs):
//!     listener.rs (accept loop, connection limits)
//!     → connection.rs (track each connection for drain)
//!     → echo bytes until EOF or shutdown
//!
//! Probe clients:
//!     tls.rs (root certificates from PEM → rustls ClientConfig)
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection tracked for graceful shutdown
//! - TLS client configs pin the ring crypto provider

pub mod connection;
pub mod echo;
pub mod listener;
pub mod tls;
