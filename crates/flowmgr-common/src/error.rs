//! Error types for flow synthesis and switch operations.
//!
//! All errors implement `std::error::Error` via `thiserror`. Every error is
//! scoped to a single advertisement or a single rule; none of them is fatal
//! to the daemon.

use std::io;

use evpn_types::ParseError;
use thiserror::Error;

/// Result type alias for flow manager operations.
pub type FlowResult<T> = Result<T, FlowError>;

/// Errors that can occur while synthesizing or installing a flow rule.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Failed to execute a shell command (spawn error).
    #[error("Failed to execute shell command '{command}': {source}")]
    ShellExec {
        /// The command that failed to execute.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Shell command returned non-zero exit code.
    #[error("Shell command failed: '{command}' (exit code {exit_code}): {output}")]
    ShellCommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// Combined stdout/stderr output.
        output: String,
    },

    /// Shell command did not finish in time and was killed.
    #[error("Shell command timed out after {timeout_ms}ms: '{command}'")]
    Timeout {
        /// The command that timed out.
        command: String,
        /// The limit that was exceeded, in milliseconds.
        timeout_ms: u64,
    },

    /// A field of the advertisement could not be parsed.
    #[error("Malformed advertisement: {0}")]
    Parse(#[from] ParseError),

    /// No switch port matches the lookup criterion.
    #[error("No switch port found for {criterion}")]
    PortNotFound {
        /// Human readable criterion (`address 10.1.1.1`, `name veth0`).
        criterion: String,
    },

    /// No inventory endpoint matches the advertised MAC, IP and VNI.
    #[error("No local endpoint matches mac {mac}, ip {ip}, vni {vni}")]
    EndpointNotFound {
        mac: String,
        ip: String,
        vni: u32,
    },

    /// More than one inventory endpoint matches the advertised MAC, IP and VNI.
    #[error("{count} local endpoints match mac {mac}, ip {ip}, vni {vni}")]
    AmbiguousEndpoint {
        mac: String,
        ip: String,
        vni: u32,
        count: usize,
    },

    /// The container inventory could not be read.
    #[error("Inventory unavailable: {message}")]
    Inventory {
        /// Error message.
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },
}

impl FlowError {
    /// Creates a port not found error.
    pub fn port_not_found(criterion: impl Into<String>) -> Self {
        Self::PortNotFound {
            criterion: criterion.into(),
        }
    }

    /// Creates an inventory error.
    pub fn inventory(message: impl Into<String>) -> Self {
        Self::Inventory {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}
