//! API module
//!
//! This module exposes the tree data provider over HTTP and provides a client
//! for it.

pub mod client;
pub mod server;

// Re-export commonly used types
pub use client::{Client, ClientConfig, ClientError};
pub use server::{router, serve, ServerConfig};
