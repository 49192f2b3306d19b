//! Challenge/response authentication.
//!
//! The handshake moves through three states, each consumed to produce the
//! next:
//!
//! ```text
//! ChallengeRequested --sign--> Signed --exchange--> SessionTokens
//! ```
//!
//! The signature covers the raw UTF-8 bytes of the challenge, nothing else.

use base64::Engine;
use ed25519_dalek::Signer;
use tamperproof_config::Config;

use crate::client::WarehouseClient;
use crate::error::ClientError;

/// Scheme name the server expects for ed25519 signatures.
pub const SCHEME_ED25519: &str = "ed25519";

/// The user's ed25519 signing key, decoded from its base64 form.
pub struct UserKey {
    signing: ed25519_dalek::SigningKey,
}

impl UserKey {
    /// Decode a base64 private key.
    ///
    /// Accepts a 32-byte seed or a 64-byte seed‖public keypair (the latter is
    /// checked for consistency).
    pub fn from_base64(encoded: &str) -> Result<Self, ClientError> {
        let b64 = base64::engine::general_purpose::STANDARD;
        let bytes = b64
            .decode(encoded.trim())
            .map_err(|e| ClientError::Key(format!("private key is not valid base64: {e}")))?;

        let signing = match bytes.len() {
            32 => {
                let seed: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| ClientError::Key("private key must be 32 bytes".to_string()))?;
                ed25519_dalek::SigningKey::from_bytes(&seed)
            }
            64 => {
                let pair: [u8; 64] = bytes
                    .try_into()
                    .map_err(|_| ClientError::Key("keypair must be 64 bytes".to_string()))?;
                ed25519_dalek::SigningKey::from_keypair_bytes(&pair)
                    .map_err(|e| ClientError::Key(format!("inconsistent keypair: {e}")))?
            }
            n => {
                return Err(ClientError::Key(format!(
                    "private key decodes to {n} bytes, expected 32 or 64"
                )))
            }
        };

        Ok(Self { signing })
    }

    pub fn verifying_key(&self) -> ed25519_dalek::VerifyingKey {
        self.signing.verifying_key()
    }

    /// Base64 of the public half, as the token endpoint expects it.
    pub fn public_key_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.verifying_key().to_bytes())
    }

    /// Sign the challenge bytes and hex-encode the 64-byte signature.
    pub fn sign_challenge(&self, challenge: &str) -> String {
        let signature = self.signing.sign(challenge.as_bytes());
        hex::encode(signature.to_bytes())
    }
}

/// A challenge issued by `auth/code`.
#[derive(Debug, Clone)]
pub struct ChallengeRequested {
    pub auth_code: String,
}

impl ChallengeRequested {
    pub fn sign(self, key: &UserKey) -> Signed {
        let signature = key.sign_challenge(&self.auth_code);
        tracing::debug!(signature = %signature, "signed auth code");
        Signed {
            auth_code: self.auth_code,
            signature,
        }
    }
}

/// A challenge together with its hex signature, ready for `auth/token`.
#[derive(Debug, Clone)]
pub struct Signed {
    pub auth_code: String,
    pub signature: String,
}

/// Bearer tokens returned by `auth/token`.
#[derive(Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    pub access_token: String,
    /// Returned by the server; not used by this client.
    pub refresh_token: String,
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .finish()
    }
}

/// Identity fields sent alongside the signature.
#[derive(Debug, Clone)]
pub struct Identity<'a> {
    pub user_id: &'a str,
    pub public_key: &'a str,
    pub scheme: &'a str,
}

/// Drives the full handshake for one configured user.
pub struct AuthFlow<'a> {
    client: &'a WarehouseClient,
    config: &'a Config,
}

impl<'a> AuthFlow<'a> {
    pub fn new(client: &'a WarehouseClient, config: &'a Config) -> Self {
        Self { client, config }
    }

    /// Request a challenge, sign it, and exchange it for session tokens.
    ///
    /// The user key and scheme are checked before the first request.
    pub fn run(&self) -> Result<SessionTokens, ClientError> {
        if !self.config.auth_scheme.eq_ignore_ascii_case(SCHEME_ED25519) {
            return Err(ClientError::Scheme(self.config.auth_scheme.clone()));
        }
        let key = UserKey::from_base64(&self.config.user_private_key)?;

        let challenge = self.client.request_auth_code(&self.config.user_id)?;
        let signed = challenge.sign(&key);

        let identity = Identity {
            user_id: &self.config.user_id,
            public_key: &self.config.user_public_key,
            scheme: &self.config.auth_scheme,
        };
        let tokens = self.client.request_token(signed, &identity)?;

        tracing::info!(user_id = %self.config.user_id, "authenticated");
        Ok(tokens)
    }
}
