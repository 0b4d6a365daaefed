//! Signed identity tokens.
//!
//! Tokens are EdDSA (Ed25519) JWTs carrying the user id in `sub` and an
//! expiry in `exp`. They are stateless: anything signed by the server key and
//! not yet expired identifies its subject.

use ed25519_dalek::pkcs8::{EncodePrivateKey, KeypairBytes};
use ed25519_dalek::SigningKey;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::db::UserId;
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
    iat: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenSigner {
    pub fn new(signing_key: &SigningKey, ttl_hours: i64) -> Result<Self, AppError> {
        let keypair = KeypairBytes {
            secret_key: signing_key.to_bytes(),
            public_key: None,
        };
        let der = keypair
            .to_pkcs8_der()
            .map_err(|e| AppError::Crypto(format!("Failed to encode signing key: {}", e)))?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_ed_der(der.as_bytes()),
            decoding_key: DecodingKey::from_ed_der(signing_key.verifying_key().as_bytes()),
            validation,
            ttl_secs: ttl_hours * 3600,
        })
    }

    /// Signer with a random key; its tokens die with the process.
    pub fn ephemeral(ttl_hours: i64) -> Result<Self, AppError> {
        Self::new(&SigningKey::generate(&mut OsRng), ttl_hours)
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let Some(encoded) = &config.token_signing_key else {
            tracing::warn!("TOKEN_SIGNING_KEY not set, generating an ephemeral signing key");
            return Self::ephemeral(config.token_expiry_hours);
        };

        let seed: [u8; 32] = base64_simd::STANDARD
            .decode_to_vec(encoded.trim())
            .map_err(|e| AppError::Config(format!("Invalid TOKEN_SIGNING_KEY: {}", e)))?
            .try_into()
            .map_err(|_| AppError::Config("TOKEN_SIGNING_KEY must decode to 32 bytes".to_string()))?;

        Self::new(&SigningKey::from_bytes(&seed), config.token_expiry_hours)
    }

    pub fn issue_token(&self, user_id: UserId) -> Result<IssuedToken, AppError> {
        let now = chrono::Utc::now().timestamp();
        self.issue_with_expiry(user_id, now, now + self.ttl_secs)
    }

    fn issue_with_expiry(&self, user_id: UserId, issued_at: i64, expires_at: i64) -> Result<IssuedToken, AppError> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: expires_at,
            iat: issued_at,
        };
        let token = encode(&Header::new(Algorithm::EdDSA), &claims, &self.encoding_key)
            .map_err(|e| AppError::Crypto(format!("Failed to sign token: {}", e)))?;

        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify_token(&self, token: &str) -> Result<UserId, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            AppError::InvalidToken
        })?;

        data.claims.sub.parse().map_err(|_| AppError::InvalidToken)
    }
}
