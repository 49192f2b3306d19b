//! Warehouse API client: the wire contract for one tamper-proof table run.
//!
//! Auth handshake, capability tokens, SQL calls, and Arrow result decoding.
//!
//! No CLI concepts. No retries. No connection pooling beyond reqwest's own.

mod auth;
mod batch;
mod capability;
mod client;
mod error;
pub mod sql;

pub use auth::{AuthFlow, ChallengeRequested, Identity, SessionTokens, Signed, UserKey, SCHEME_ED25519};
pub use batch::{batch_to_json_rows, deserialize_batch, format_batch, serialize_batch};
pub use capability::{authority_source, random_table_name, resource_id, CapabilityCredential, Permission};
pub use client::{WarehouseClient, BISCUIT_HEADER};
pub use error::ClientError;

pub use arrow::record_batch::RecordBatch;
