pub mod auto_sync;
pub mod completions;
pub mod config;
pub mod daemon;
pub mod files;
pub mod repo;
pub mod status;
pub mod sync;
