//! Core types shared across the substore-deploy crates
//!
//! Holds the per-run deployment configuration, the input validation rules
//! that build it, and the fixed names and paths of everything the
//! provisioner creates on the host.

pub mod config;
pub mod constants;
pub mod error;
pub mod layout;

pub use config::*;
pub use constants::*;
pub use error::*;
pub use layout::HostLayout;
