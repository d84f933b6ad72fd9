//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → structured tracing events (tree, uri, signature fields)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, human-readable or JSON)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - `RUST_LOG` overrides the configured level

pub mod logging;

pub use logging::init_logging;
