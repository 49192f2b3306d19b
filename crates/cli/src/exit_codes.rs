//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `tproof` exit codes.
//! Exit codes are part of the shell contract. Scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain       | Description                              |
//! |---------|--------------|------------------------------------------|
//! | 0       | Universal    | Success                                  |
//! | 1       | Universal    | General error (unspecified)              |
//! | 2       | Universal    | CLI usage error (bad args)               |
//! | 10-19   | config       | Missing or invalid configuration         |
//! | 20-29   | auth         | Challenge/token handshake                |
//! | 30-39   | capability   | Capability token minting                 |
//! | 40-49   | warehouse    | Table operations and query results       |

use tamperproof_client::ClientError;
use tamperproof_config::ConfigError;

use crate::pipeline::{Step, StepError};

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - table created, row inserted, row read back.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments (clap exits with this itself).
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Config (10-19)
// =============================================================================

/// Required key missing, numeric key unparseable, or env file unreadable.
pub const EXIT_CONFIG: u8 = 10;

// =============================================================================
// Auth (20-29)
// =============================================================================

/// Server rejected the challenge or token request (non-200).
pub const EXIT_AUTH_REJECTED: u8 = 20;

/// USER_PRIVATE_KEY cannot be decoded, or AUTH_SCHEME cannot be signed.
pub const EXIT_AUTH_KEY: u8 = 21;

// =============================================================================
// Capability (30-39)
// =============================================================================

/// Capability token could not be built (bad schema, signing failure).
pub const EXIT_CAPABILITY: u8 = 30;

// =============================================================================
// Warehouse (40-49)
// =============================================================================

/// DDL, DML, or query call returned a non-success status.
pub const EXIT_WAREHOUSE_HTTP: u8 = 40;

/// Transport failure on any call.
pub const EXIT_NETWORK: u8 = 41;

/// Response body could not be parsed (JSON shape or Arrow stream).
pub const EXIT_MALFORMED: u8 = 42;

/// Map a config error to its exit code.
pub fn config_exit_code(_err: &ConfigError) -> u8 {
    EXIT_CONFIG
}

/// Map a pipeline failure to its exit code.
pub fn step_exit_code(err: &StepError) -> u8 {
    match (&err.step, &err.source) {
        (_, ClientError::Network(_)) => EXIT_NETWORK,
        (_, ClientError::Parse(_)) | (_, ClientError::Decode(_)) => EXIT_MALFORMED,
        (_, ClientError::Key(_)) | (_, ClientError::Scheme(_)) => EXIT_AUTH_KEY,
        (_, ClientError::Capability(_)) => EXIT_CAPABILITY,
        (Step::Authenticate, ClientError::Http { .. }) => EXIT_AUTH_REJECTED,
        (_, ClientError::Http { .. }) => EXIT_WAREHOUSE_HTTP,
    }
}
