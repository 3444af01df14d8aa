//! SSH module - owns the transport underneath the remote session
//!
//! Built on the russh library.
//!
//! # Features
//! - Password and private-key authentication
//! - Host key verification via ~/.ssh/known_hosts (trust on first use)
//! - Protocol-level keep-alive every 60 seconds
//! - Single-owner handle task so the connection is never driven concurrently

mod client;
mod config;
mod error;
mod handle_owner;
pub mod known_hosts;

pub use client::{ClientHandler, SshClient};
pub use config::{AuthMethod, SshConfig, KEEPALIVE_INTERVAL};
pub use error::SshError;
pub use handle_owner::{spawn_handle_owner_task, HandleCommand, HandleController, PingResult};
pub use known_hosts::{HostKeyVerification, KnownHostsStore};
