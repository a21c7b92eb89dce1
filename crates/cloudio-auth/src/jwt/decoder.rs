//! JWT token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use cloudio_core::config::AuthConfig;
use cloudio_core::error::{AppError, ErrorKind};
use cloudio_core::types::OwnerId;

use super::claims::Claims;

/// Validates bearer tokens and extracts the caller identity.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a decoder from auth configuration.
    ///
    /// Uses RS256 when a public key is configured, HS256 with the shared
    /// secret otherwise.
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        let (decoding_key, algorithm) = if !config.jwt_public_key_pem.trim().is_empty() {
            let key = DecodingKey::from_rsa_pem(config.jwt_public_key_pem.as_bytes()).map_err(
                |e| {
                    AppError::with_source(
                        ErrorKind::Configuration,
                        "auth.jwt_public_key_pem is not a valid RSA public key",
                        e,
                    )
                },
            )?;
            (key, Algorithm::RS256)
        } else if !config.jwt_secret.is_empty() {
            (
                DecodingKey::from_secret(config.jwt_secret.as_bytes()),
                Algorithm::HS256,
            )
        } else {
            return Err(AppError::configuration(
                "Either auth.jwt_secret or auth.jwt_public_key_pem must be set",
            ));
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Decodes and validates a token string.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                debug!(error = %e, "Rejected bearer token");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::unauthorized("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::unauthorized("Invalid token signature")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                        AppError::unauthorized("Invalid token issuer")
                    }
                    _ => AppError::unauthorized("Invalid token"),
                }
            })?;

        Ok(token_data.claims)
    }

    /// Validates a token and returns the owner it identifies.
    pub fn authenticate(&self, token: &str) -> Result<OwnerId, AppError> {
        self.decode(token)?.owner_id()
    }
}
