use chrono::Utc;

use super::{TokenHasher, TokenKind, token_lookup};
use crate::store::Store;
use crate::types::{Session, Usuario};

#[derive(Debug)]
pub enum TokenValidationError {
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    InternalError,
}

pub struct ValidatedSession {
    pub session: Session,
    pub usuario: Usuario,
}

/// Validates a raw session token against the store and loads its user.
pub fn validate_session(
    store: &dyn Store,
    raw_token: &str,
) -> Result<ValidatedSession, TokenValidationError> {
    let lookup = token_lookup(raw_token, TokenKind::Session)
        .map_err(|_| TokenValidationError::InvalidToken)?;

    let session = store
        .get_session_by_lookup(lookup)
        .map_err(|_| TokenValidationError::InternalError)?
        .ok_or(TokenValidationError::InvalidToken)?;

    let hasher = TokenHasher::new().map_err(|_| TokenValidationError::InternalError)?;
    if !hasher
        .verify(raw_token, &session.token_hash)
        .map_err(|_| TokenValidationError::InternalError)?
    {
        return Err(TokenValidationError::InvalidToken);
    }

    if session.expires_at < Utc::now() {
        return Err(TokenValidationError::TokenExpired);
    }

    let usuario = store
        .get_usuario(&session.usuario_id)
        .map_err(|_| TokenValidationError::InternalError)?
        .ok_or(TokenValidationError::InvalidToken)?;

    if let Err(e) = store.touch_session(&session.id) {
        tracing::warn!("Failed to update session last_used_at: {e}");
    }

    Ok(ValidatedSession { session, usuario })
}

/// Extracts a bearer token from the Authorization header.
/// Returns None if no auth header is present.
/// Returns Err if the auth scheme is unsupported.
pub fn extract_token_from_header(
    auth_header: Option<&str>,
) -> Result<Option<String>, TokenValidationError> {
    match auth_header {
        Some(header) => match header.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
            Some(_) => Err(TokenValidationError::InvalidToken),
            None => Err(TokenValidationError::InvalidScheme),
        },
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_token_from_header(Some("Bearer ags_abc_def")).unwrap(),
            Some("ags_abc_def".to_string())
        );
        assert!(extract_token_from_header(None).unwrap().is_none());
        assert!(matches!(
            extract_token_from_header(Some("Basic eC10b2tlbjp5")),
            Err(TokenValidationError::InvalidScheme)
        ));
        assert!(matches!(
            extract_token_from_header(Some("Bearer ")),
            Err(TokenValidationError::InvalidToken)
        ));
    }
}
