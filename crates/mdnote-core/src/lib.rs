//! mdnote Core - Domain types, ports and configuration
//!
//! This crate contains the hexagonal architecture core of the note vault
//! synchronization engine:
//! - **Domain types** - `SyncStatus`, `SyncStep`, `SyncOutcome`, `AutoSyncConfig`, `RepoError`
//! - **Port definitions** - Traits for adapters: `IRepository`, `INotificationSink`
//! - **Configuration** - The persisted JSON application document and its store
//!
//! # Architecture
//!
//! The domain module holds plain data and invariants with no I/O.
//! Ports define the trait interfaces that adapter crates implement
//! (`mdnote-git` for the repository, `mdnote-ipc` for desktop notifications).
//! The orchestration itself lives in `mdnote-sync`.

pub mod config;
pub mod domain;
pub mod ports;
