//! Common infrastructure for the EVPN flow manager.
//!
//! - [`shell`]: bounded shell command execution with proper quoting, used to
//!   drive `ovs-ofctl` and `ip`
//! - [`error`]: error types for flow synthesis, resolution and installation
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use flowmgr_common::{
//!     shell::{self, OVS_OFCTL_CMD, shellquote},
//!     FlowResult,
//! };
//!
//! async fn dump_ports(bridge: &str) -> FlowResult<String> {
//!     let cmd = format!("{} show {}", OVS_OFCTL_CMD, shellquote(bridge));
//!     shell::exec_or_throw(&cmd, Duration::from_secs(5)).await
//! }
//! ```

pub mod error;
pub mod shell;

pub use error::{FlowError, FlowResult};
