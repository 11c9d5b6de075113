//! mdnote Git - Repository adapter over the `git` executable
//!
//! Implements [`mdnote_core::ports::IRepository`] by spawning `git` with
//! `tokio::process`. Every invocation runs non-interactively
//! (`GIT_TERMINAL_PROMPT=0`), so missing credentials fail fast instead of
//! waiting on a prompt.
//!
//! ## Modules
//!
//! - [`command`] - Process invocation, commit identity, failure classification
//! - [`status`] - Porcelain v1 status parser
//! - [`repository`] - The [`GitRepository`] adapter

pub mod command;
pub mod repository;
pub mod status;

pub use command::{Git, Identity};
pub use repository::GitRepository;
