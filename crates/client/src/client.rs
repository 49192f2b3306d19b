//! Warehouse HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required).
//! Covers the full run: auth code → token → DDL → DML → tamper-proof query.

use std::time::Duration;

use arrow::record_batch::RecordBatch;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tamperproof_config::Config;

use crate::auth::{ChallengeRequested, Identity, SessionTokens, Signed};
use crate::batch::deserialize_batch;
use crate::capability::CapabilityCredential;
use crate::error::ClientError;
use crate::sql;

const APPLICATION_JSON: &str = "application/json";
const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

/// Header carrying the capability token next to the bearer session token.
pub const BISCUIT_HEADER: &str = "biscuit";

/// Warehouse API client (blocking).
#[derive(Clone)]
pub struct WarehouseClient {
    http: reqwest::blocking::Client,
    api_base: String,
    query_url: String,
}

impl WarehouseClient {
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.api_url, &config.query_url(), config.http_timeout)
    }

    /// `api_base` must end in `/`; endpoint paths are appended verbatim.
    pub fn new(api_base: &str, query_url: &str, timeout: Duration) -> Self {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("tproof/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            api_base: api_base.to_string(),
            query_url: query_url.to_string(),
        }
    }

    // ── Auth ────────────────────────────────────────────────────────

    /// `POST auth/code`: ask for a one-time challenge.
    pub fn request_auth_code(&self, user_id: &str) -> Result<ChallengeRequested, ClientError> {
        let url = self.endpoint("auth/code");
        let json = self.post_auth(&url, &serde_json::json!({ "userId": user_id }))?;
        tracing::debug!(response = %json, "auth/code response");

        let auth_code = json["authCode"]
            .as_str()
            .ok_or_else(|| ClientError::Parse("Missing authCode in response".into()))?;

        Ok(ChallengeRequested {
            auth_code: auth_code.to_string(),
        })
    }

    /// `POST auth/token`: trade a signed challenge for session tokens.
    pub fn request_token(
        &self,
        signed: Signed,
        identity: &Identity<'_>,
    ) -> Result<SessionTokens, ClientError> {
        let url = self.endpoint("auth/token");
        let body = serde_json::json!({
            "userId": identity.user_id,
            "authCode": signed.auth_code,
            "signature": signed.signature,
            "key": identity.public_key,
            "scheme": identity.scheme,
        });

        let json = self.post_auth(&url, &body)?;
        tracing::debug!(response = %json, "auth/token response");

        serde_json::from_value(json)
            .map_err(|e| ClientError::Parse(format!("auth/token response: {e}")))
    }

    // ── Table operations ────────────────────────────────────────────

    /// `POST sql/ddl`: create the capability's table.
    pub fn create_table(
        &self,
        session: &SessionTokens,
        credential: &CapabilityCredential,
    ) -> Result<(), ClientError> {
        let url = self.endpoint("sql/ddl");
        let body = serde_json::json!({
            "sqlText": sql::create_table_sql(&credential.resource_id, &credential.public_key),
            "biscuits": [credential.token],
        });

        let resp = self.post_sql(&url, session, credential, &body, APPLICATION_JSON)?;
        tracing::info!(
            resource_id = %credential.resource_id,
            status = resp.status().as_u16(),
            "table created"
        );
        Ok(())
    }

    /// `POST sql/dml`: insert one `(PROOF_ORDER, PLANET)` row.
    pub fn insert_row(
        &self,
        session: &SessionTokens,
        credential: &CapabilityCredential,
        proof_order: i64,
        planet: &str,
    ) -> Result<(), ClientError> {
        let url = self.endpoint("sql/dml");
        let body = serde_json::json!({
            "resources": [credential.resource_id],
            "sqlText": sql::insert_row_sql(&credential.resource_id, proof_order, planet),
            "biscuits": [credential.token],
        });

        let resp = self.post_sql(&url, session, credential, &body, APPLICATION_JSON)?;
        tracing::info!(
            proof_order,
            planet,
            status = resp.status().as_u16(),
            "row inserted"
        );
        Ok(())
    }

    /// `POST {tamperproof_url}`: select everything back as Arrow.
    pub fn query_table(
        &self,
        session: &SessionTokens,
        credential: &CapabilityCredential,
    ) -> Result<RecordBatch, ClientError> {
        let body = serde_json::json!({
            "resourceId": credential.resource_id,
            "sqlText": sql::select_all_sql(&credential.resource_id),
            "biscuits": [credential.token],
        });

        let resp = self.post_sql(&self.query_url, session, credential, &body, APPLICATION_OCTET_STREAM)?;
        tracing::info!(status = resp.status().as_u16(), "tamper-proof query succeeded");

        let bytes = resp
            .bytes()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        deserialize_batch(&bytes)
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Auth calls accept exactly 200 and always answer JSON.
    fn post_auth(&self, url: &str, body: &serde_json::Value) -> Result<serde_json::Value, ClientError> {
        let response = self.http.post(url)
            .header(ACCEPT, APPLICATION_JSON)
            .json(body)
            .send()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().unwrap_or_default();
            tracing::error!(url, status, body = %body, "auth request rejected");
            return Err(ClientError::Http { status, body });
        }

        response.json().map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// SQL calls carry both the bearer token and the capability token.
    fn post_sql(
        &self,
        url: &str,
        session: &SessionTokens,
        credential: &CapabilityCredential,
        body: &serde_json::Value,
        accept: &str,
    ) -> Result<reqwest::blocking::Response, ClientError> {
        let response = self.http.post(url)
            .bearer_auth(&session.access_token)
            .header(BISCUIT_HEADER, &credential.token)
            .header(ACCEPT, accept)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .json(body)
            .send()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            tracing::error!(url, status, body = %body, "warehouse request failed");
            return Err(ClientError::Http { status, body });
        }

        Ok(response)
    }
}
