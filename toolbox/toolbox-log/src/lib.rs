//! # Host logging
//!
//! The toolbox crates log through the [`log`] facade and never install a
//! logger themselves. On bare-metal targets the application wires up its own
//! sink; when the toolbox runs as an ordinary process (tests, simulations,
//! host-side tools), this crate provides one.
//!
//! ## Output format
//!
//! One line per record, written to standard error in a single call so that
//! lines from concurrent threads do not interleave:
//!
//! ```text
//! [LEVEL] target: message
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use log::{LevelFilter, info};
//! use toolbox_log::HostLogger;
//!
//! HostLogger::new(LevelFilter::Debug)
//!     .init()
//!     .expect("logger initialization");
//!
//! info!("simulation started");
//! ```
//!
//! Filtering is by level only; the toolbox logs lock construction at `debug`
//! and every critical-section transition at `trace`.

mod logger;

pub use logger::{HostLogger, write_record};
