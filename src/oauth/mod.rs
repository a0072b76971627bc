//! Social login through Google and Microsoft.
//!
//! OAuth only signs in users that already exist; it never creates accounts.

mod providers;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::RngCore;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

pub use providers::{Endpoints, OAuthProvider, OAuthProviders, Provider};

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{AccountState, OAuthState, Usuario};

const STATE_TTL_MINUTES: i64 = 10;
const STATE_BYTES: usize = 32;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    email: Option<String>,
    #[serde(default)]
    preferred_username: Option<String>,
}

fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Records a fresh state and returns the provider's authorization URL.
pub fn start(store: &dyn Store, provider: &OAuthProvider, redirect_uri: &str) -> Result<String> {
    let now = Utc::now();
    let state = OAuthState {
        state: generate_state(),
        provider: provider.provider.as_str().to_string(),
        created_at: now,
        expires_at: now + Duration::minutes(STATE_TTL_MINUTES),
    };
    store.create_oauth_state(&state)?;

    Ok(format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
        provider.endpoints.authorize_url,
        urlencoding::encode(&provider.client.client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&provider.endpoints.scope),
        urlencoding::encode(&state.state),
    ))
}

/// Completes the authorization code flow and returns the matching user.
///
/// Invited users become social-only with a confirmed email. Unknown emails
/// are refused with `Forbidden`.
pub async fn callback(
    store: &dyn Store,
    http: &Client,
    provider: &OAuthProvider,
    code: &str,
    state: &str,
    redirect_uri: &str,
) -> Result<Usuario> {
    let pending = store.take_oauth_state(state)?.ok_or(Error::Unauthorized)?;
    if pending.provider != provider.provider.as_str() || pending.expires_at <= Utc::now() {
        return Err(Error::Unauthorized);
    }

    let email = fetch_email(http, provider, code, redirect_uri).await?;

    let Some(mut usuario) = store.get_usuario_by_email(&email)? else {
        warn!(provider = %provider.provider, email = %email, "oauth login for unknown email");
        return Err(Error::Forbidden);
    };

    if matches!(usuario.account_state, AccountState::Invited) {
        usuario.account_state = AccountState::SocialOnly {
            provider: provider.provider.as_str().to_string(),
        };
        usuario.email_confirmado = true;
        usuario.updated_at = Utc::now();
        store.update_usuario(&usuario)?;
        info!(usuario_id = %usuario.id, provider = %provider.provider, "invited user activated via oauth");
    }

    Ok(usuario)
}

async fn fetch_email(
    http: &Client,
    provider: &OAuthProvider,
    code: &str,
    redirect_uri: &str,
) -> Result<String> {
    let form = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", redirect_uri),
        ("client_id", provider.client.client_id.as_str()),
        ("client_secret", provider.client.client_secret.as_str()),
    ];

    let response = http
        .post(&provider.endpoints.token_url)
        .form(&form)
        .send()
        .await?;
    if !response.status().is_success() {
        let status = response.status();
        return Err(Error::External(format!(
            "{} token endpoint returned {status}",
            provider.provider
        )));
    }
    let token: TokenResponse = response.json().await?;

    let response = http
        .get(&provider.endpoints.userinfo_url)
        .bearer_auth(&token.access_token)
        .send()
        .await?;
    if !response.status().is_success() {
        let status = response.status();
        return Err(Error::External(format!(
            "{} userinfo endpoint returned {status}",
            provider.provider
        )));
    }
    let info: UserInfo = response.json().await?;

    info.email
        .or(info.preferred_username)
        .filter(|e| e.contains('@'))
        .ok_or_else(|| Error::External(format!("{} returned no email", provider.provider)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OAuthClient;
    use crate::store::SqliteStore;
    use tempfile::TempDir;

    fn provider() -> OAuthProvider {
        OAuthProvider::new(
            Provider::Google,
            OAuthClient {
                client_id: "client id".to_string(),
                client_secret: "secret".to_string(),
            },
        )
    }

    #[test]
    fn test_start_builds_url_and_stores_state() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();

        let url = start(&store, &provider(), "http://localhost/cb").unwrap();
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?response_type=code"));
        assert!(url.contains("client_id=client%20id"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%2Fcb"));

        let state = url.split("state=").nth(1).unwrap();
        let taken = store.take_oauth_state(state).unwrap().unwrap();
        assert_eq!(taken.provider, "google");
        assert!(store.take_oauth_state(state).unwrap().is_none());
    }

    #[test]
    fn test_states_are_unique() {
        assert_ne!(generate_state(), generate_state());
        assert_eq!(generate_state().len(), 43);
    }
}
