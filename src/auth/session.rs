use chrono::{Duration, Utc};

use super::{TokenHasher, TokenKind, token_lookup};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{EmailToken, EmailTokenPurpose, Session};

const MAX_ISSUE_ATTEMPTS: usize = 3;

/// Creates a session for the user and returns the raw bearer token.
pub fn issue_session(
    store: &dyn Store,
    usuario_id: &str,
    escola_id: Option<&str>,
    ttl: Duration,
) -> Result<String> {
    let hasher = TokenHasher::new()?;

    for _ in 0..MAX_ISSUE_ATTEMPTS {
        let issued = hasher.issue(TokenKind::Session)?;
        let now = Utc::now();
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            token_hash: issued.hash,
            token_lookup: issued.lookup,
            usuario_id: usuario_id.to_string(),
            escola_id: escola_id.map(str::to_string),
            created_at: now,
            expires_at: now + ttl,
            last_used_at: None,
        };

        match store.create_session(&session) {
            Ok(()) => return Ok(issued.raw),
            Err(Error::TokenLookupCollision) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(Error::TokenLookupCollision)
}

/// Creates a single-use link token for the user and returns it raw.
pub fn issue_email_token(
    store: &dyn Store,
    usuario_id: &str,
    purpose: EmailTokenPurpose,
) -> Result<String> {
    let hasher = TokenHasher::new()?;

    for _ in 0..MAX_ISSUE_ATTEMPTS {
        let issued = hasher.issue(TokenKind::EmailLink)?;
        let now = Utc::now();
        let token = EmailToken {
            id: uuid::Uuid::new_v4().to_string(),
            token_hash: issued.hash,
            token_lookup: issued.lookup,
            usuario_id: usuario_id.to_string(),
            purpose,
            created_at: now,
            expires_at: now + purpose.ttl(),
            used_at: None,
        };

        match store.create_email_token(&token) {
            Ok(()) => return Ok(issued.raw),
            Err(Error::TokenLookupCollision) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(Error::TokenLookupCollision)
}

/// Checks a link token and consumes it.
///
/// Unknown or malformed tokens yield `InvalidTokenFormat`; expired, used or
/// wrong-purpose tokens yield `TokenExpired`.
pub fn redeem_email_token(
    store: &dyn Store,
    raw_token: &str,
    purpose: EmailTokenPurpose,
) -> Result<EmailToken> {
    let raw_token = raw_token.trim();
    let lookup = token_lookup(raw_token, TokenKind::EmailLink)?;

    let token = store
        .get_email_token_by_lookup(lookup)?
        .ok_or(Error::InvalidTokenFormat)?;

    if !TokenHasher::new()?.verify(raw_token, &token.token_hash)? {
        return Err(Error::InvalidTokenFormat);
    }

    if !token.is_usable(purpose, Utc::now()) {
        return Err(Error::TokenExpired);
    }

    if !store.mark_email_token_used(&token.id)? {
        return Err(Error::TokenExpired);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::helpers::validate_session;
    use crate::store::SqliteStore;
    use crate::types::{AccountState, Usuario};
    use tempfile::TempDir;

    fn setup() -> (TempDir, SqliteStore, Usuario) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let usuario = Usuario {
            id: "u1".to_string(),
            nome: "Ana".to_string(),
            nome_curto: None,
            email: "ana@example.com".to_string(),
            account_state: AccountState::Invited,
            is_superadmin: false,
            email_confirmado: false,
            foto_perfil: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.create_usuario(&usuario).unwrap();
        (temp, store, usuario)
    }

    #[test]
    fn test_issued_session_validates() {
        let (_temp, store, usuario) = setup();
        let raw = issue_session(&store, &usuario.id, None, Duration::hours(1)).unwrap();

        let validated = validate_session(&store, &raw).unwrap();
        assert_eq!(validated.usuario.id, usuario.id);
        assert!(validated.session.escola_id.is_none());
    }

    #[test]
    fn test_expired_session_is_rejected() {
        let (_temp, store, usuario) = setup();
        let raw = issue_session(&store, &usuario.id, None, Duration::seconds(-1)).unwrap();

        assert!(matches!(
            validate_session(&store, &raw),
            Err(crate::auth::helpers::TokenValidationError::TokenExpired)
        ));
    }

    #[test]
    fn test_email_token_redeems_once() {
        let (_temp, store, usuario) = setup();
        let raw = issue_email_token(&store, &usuario.id, EmailTokenPurpose::Invite).unwrap();

        assert!(matches!(
            redeem_email_token(&store, &raw, EmailTokenPurpose::ResetPassword),
            Err(Error::TokenExpired)
        ));

        let token = redeem_email_token(&store, &raw, EmailTokenPurpose::Invite).unwrap();
        assert_eq!(token.usuario_id, usuario.id);

        assert!(matches!(
            redeem_email_token(&store, &raw, EmailTokenPurpose::Invite),
            Err(Error::TokenExpired)
        ));
    }

    #[test]
    fn test_session_and_link_tokens_are_not_interchangeable() {
        let (_temp, store, usuario) = setup();
        let session = issue_session(&store, &usuario.id, None, Duration::hours(1)).unwrap();
        let link = issue_email_token(&store, &usuario.id, EmailTokenPurpose::Invite).unwrap();

        assert!(matches!(
            redeem_email_token(&store, &session, EmailTokenPurpose::Invite),
            Err(Error::InvalidTokenFormat)
        ));
        assert!(matches!(
            validate_session(&store, &link),
            Err(crate::auth::helpers::TokenValidationError::InvalidToken)
        ));

        // The link is still good after the failed attempts
        assert!(redeem_email_token(&store, &link, EmailTokenPurpose::Invite).is_ok());
    }

    #[test]
    fn test_forged_email_token_is_invalid() {
        let (_temp, store, usuario) = setup();
        let raw = issue_email_token(&store, &usuario.id, EmailTokenPurpose::ConfirmEmail).unwrap();
        let last = if raw.ends_with('0') { '1' } else { '0' };
        let forged = format!("{}{last}", &raw[..raw.len() - 1]);

        assert!(matches!(
            redeem_email_token(&store, &forged, EmailTokenPurpose::ConfirmEmail),
            Err(Error::InvalidTokenFormat)
        ));
        assert!(matches!(
            redeem_email_token(&store, "garbage", EmailTokenPurpose::ConfirmEmail),
            Err(Error::InvalidTokenFormat)
        ));
    }
}
