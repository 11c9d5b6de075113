//! mdnote IPC - D-Bus boundary of the sync engine
//!
//! The daemon serves the engine on the session bus; front ends reach it
//! through the generated proxy.
//!
//! # Interfaces
//! - `org.mdnote.Sync` at `/org/mdnote/Sync` - status, sync, repository management
//!
//! Also provides a notification sink that raises desktop notifications
//! through `org.freedesktop.Notifications`.

pub mod client;
pub mod notifier;
pub mod service;

/// D-Bus well-known name of the daemon
pub const DBUS_NAME: &str = "org.mdnote.Sync";

/// D-Bus object path of the sync interface
pub const DBUS_PATH: &str = "/org/mdnote/Sync";

/// D-Bus interface name
pub const DBUS_INTERFACE: &str = "org.mdnote.Sync";
