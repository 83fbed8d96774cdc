//! Staging and serving of prebuilt release binaries.
//!
//! This crate assembles a directory of prebuilt binaries (one per CPU
//! architecture and operating system) into a temporary staging tree, packages
//! each binary as both a `.tar` and a `.zip` archive, writes minimal HTML
//! index pages, and serves the result over plain HTTP until shut down:
//!
//! - **Configuration** - Source directory, release targets, and listen port
//! - **Archive writers** - Single-file tar and zip packaging
//! - **Staging builder** - Per-architecture directory layout with symlinks
//!   back to the real binaries
//! - **Tree indexer** - A root index page listing every artifact, plus
//!   placeholder pages that suppress directory listings everywhere else
//! - **Server** - A synchronous static file server with keep-alives disabled
//!
//! The staging tree lives in a [`tempfile::TempDir`] owned by the binary's
//! entry point, so it is removed on any orderly exit, including a
//! SIGINT/SIGTERM shutdown.
//!
//! # Example
//!
//! ```rust,ignore
//! use binstage::{config::Config, index, stage};
//!
//! let config = Config::default();
//! let staging = tempfile::TempDir::new()?;
//! let links = stage::build_staging(&config, staging.path())?;
//! index::write_indexes(staging.path(), &links)?;
//! ```

pub mod archive;
pub mod config;
pub mod index;
pub mod page;
pub mod server;
pub mod shutdown;
pub mod stage;

pub use config::{Config, ReleaseTarget};
pub use shutdown::ShutdownFlag;
