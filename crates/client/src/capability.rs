//! Capability tokens (Biscuits) scoped to a single table.
//!
//! Each run mints a fresh root keypair and a token whose authority block
//! grants the seven table permissions on exactly one resource id:
//!
//! ```datalog
//! sxt:capability("ddl_create", "se_playground.xyzw");
//! sxt:capability("ddl_drop", "se_playground.xyzw");
//! ...
//! sxt:capability("dql_select", "se_playground.xyzw");
//! ```

use std::collections::HashMap;
use std::fmt;

use biscuit_auth::builder::Term;
use biscuit_auth::{Biscuit, KeyPair, PublicKey};
use rand::Rng;

use crate::error::ClientError;

/// A permission the warehouse checks against the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    DdlCreate,
    DdlDrop,
    DmlInsert,
    DmlUpdate,
    DmlMerge,
    DmlDelete,
    DqlSelect,
}

impl Permission {
    pub const ALL: [Permission; 7] = [
        Permission::DdlCreate,
        Permission::DdlDrop,
        Permission::DmlInsert,
        Permission::DmlUpdate,
        Permission::DmlMerge,
        Permission::DmlDelete,
        Permission::DqlSelect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::DdlCreate => "ddl_create",
            Permission::DdlDrop => "ddl_drop",
            Permission::DmlInsert => "dml_insert",
            Permission::DmlUpdate => "dml_update",
            Permission::DmlMerge => "dml_merge",
            Permission::DmlDelete => "dml_delete",
            Permission::DqlSelect => "dql_select",
        }
    }
}

/// Datalog for the authority block; `{resource}` is bound as a parameter.
pub fn authority_source() -> String {
    Permission::ALL
        .iter()
        .map(|p| format!("sxt:capability(\"{}\", {{resource}});\n", p.as_str()))
        .collect()
}

/// Random lowercase table name, 4 to 11 letters.
pub fn random_table_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.gen_range(4..=11);
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

/// `{schema}.{table}`, after checking the schema is a plain identifier.
pub fn resource_id(schema: &str, table: &str) -> Result<String, ClientError> {
    let valid = !schema.is_empty()
        && schema.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(ClientError::Capability(format!(
            "schema {schema:?} must be letters, digits, or underscores"
        )));
    }
    Ok(format!("{schema}.{table}"))
}

/// A minted capability token plus the keys that signed it.
///
/// Created once per run; never persisted.
#[derive(Clone)]
pub struct CapabilityCredential {
    /// Hex-encoded root private key
    pub private_key: String,
    /// Hex-encoded root public key (also embedded in the table's DDL)
    pub public_key: String,
    pub resource_id: String,
    /// URL-safe base64 Biscuit
    pub token: String,
    root: PublicKey,
}

impl CapabilityCredential {
    /// Mint a token for a freshly named table in `schema`.
    pub fn issue(schema: &str) -> Result<Self, ClientError> {
        let table = random_table_name(&mut rand::thread_rng());
        let resource = resource_id(schema, &table)?;
        Self::issue_for(&resource)
    }

    /// Mint a token for an explicit resource id.
    pub fn issue_for(resource_id: &str) -> Result<Self, ClientError> {
        let keypair = KeyPair::new();

        let mut params = HashMap::new();
        params.insert("resource".to_string(), Term::Str(resource_id.to_string()));

        let mut builder = Biscuit::builder();
        builder
            .add_code_with_params(authority_source(), params, HashMap::new())
            .map_err(|e| ClientError::Capability(format!("authority block: {e}")))?;
        let biscuit = builder
            .build(&keypair)
            .map_err(|e| ClientError::Capability(format!("signing: {e}")))?;
        let token = biscuit
            .to_base64()
            .map_err(|e| ClientError::Capability(format!("serialization: {e}")))?;

        let credential = Self {
            private_key: keypair.private().to_bytes_hex(),
            public_key: keypair.public().to_bytes_hex(),
            resource_id: resource_id.to_string(),
            token,
            root: keypair.public(),
        };

        tracing::info!(public_key = %credential.public_key, "capability public key");
        tracing::info!(resource_id = %credential.resource_id, "capability resource");
        tracing::info!(token = %credential.token, "capability token");
        tracing::debug!(private_key = %credential.private_key, "capability private key");

        Ok(credential)
    }

    /// Parse the token back with the root key and check one permission.
    pub fn verify(&self, permission: Permission) -> Result<(), ClientError> {
        if self.resource_id.contains(['"', '\\']) {
            return Err(ClientError::Capability(format!(
                "resource id {:?} cannot appear in a policy",
                self.resource_id
            )));
        }
        let biscuit = self.parse()?;
        let mut authorizer = biscuit
            .authorizer()
            .map_err(|e| ClientError::Capability(format!("authorizer: {e}")))?;
        authorizer
            .add_code(format!(
                "allow if sxt:capability(\"{}\", \"{}\");",
                permission.as_str(),
                self.resource_id,
            ))
            .map_err(|e| ClientError::Capability(format!("policy: {e}")))?;
        authorizer
            .authorize()
            .map(|_| ())
            .map_err(|e| ClientError::Capability(format!("{} denied: {e}", permission.as_str())))
    }

    /// Datalog source of the authority block, as stored in the token.
    pub fn authority_block(&self) -> Result<String, ClientError> {
        self.parse()?
            .print_block_source(0)
            .map_err(|e| ClientError::Capability(format!("block source: {e}")))
    }

    fn parse(&self) -> Result<Biscuit, ClientError> {
        Biscuit::from_base64(&self.token, self.root.clone())
            .map_err(|e| ClientError::Capability(format!("parse: {e}")))
    }
}

impl fmt::Debug for CapabilityCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityCredential")
            .field("private_key", &"***")
            .field("public_key", &self.public_key)
            .field("resource_id", &self.resource_id)
            .field("token", &self.token)
            .finish()
    }
}
