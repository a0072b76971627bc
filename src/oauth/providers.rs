use std::fmt;

use crate::config::{Integrations, OAuthClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Google,
    Microsoft,
}

impl Provider {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Microsoft => "microsoft",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Provider> {
        match s {
            "google" => Some(Provider::Google),
            "microsoft" => Some(Provider::Microsoft),
            _ => None,
        }
    }

    #[must_use]
    pub fn endpoints(&self) -> Endpoints {
        match self {
            Provider::Google => Endpoints {
                authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                token_url: "https://oauth2.googleapis.com/token".to_string(),
                userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
                scope: "openid email profile".to_string(),
            },
            Provider::Microsoft => Endpoints {
                authorize_url: "https://login.microsoftonline.com/common/oauth2/v2.0/authorize"
                    .to_string(),
                token_url: "https://login.microsoftonline.com/common/oauth2/v2.0/token"
                    .to_string(),
                userinfo_url: "https://graph.microsoft.com/oidc/userinfo".to_string(),
                scope: "openid email profile User.Read".to_string(),
            },
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub scope: String,
}

/// A provider with credentials, ready to use.
#[derive(Debug, Clone)]
pub struct OAuthProvider {
    pub provider: Provider,
    pub client: OAuthClient,
    pub endpoints: Endpoints,
}

impl OAuthProvider {
    #[must_use]
    pub fn new(provider: Provider, client: OAuthClient) -> Self {
        Self {
            provider,
            client,
            endpoints: provider.endpoints(),
        }
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

/// The configured providers. Missing credentials leave a provider disabled.
#[derive(Debug, Clone, Default)]
pub struct OAuthProviders {
    google: Option<OAuthProvider>,
    microsoft: Option<OAuthProvider>,
}

impl OAuthProviders {
    #[must_use]
    pub fn from_integrations(integrations: &Integrations) -> Self {
        Self {
            google: integrations
                .google
                .clone()
                .map(|c| OAuthProvider::new(Provider::Google, c)),
            microsoft: integrations
                .microsoft
                .clone()
                .map(|c| OAuthProvider::new(Provider::Microsoft, c)),
        }
    }

    #[must_use]
    pub fn with(mut self, provider: OAuthProvider) -> Self {
        match provider.provider {
            Provider::Google => self.google = Some(provider),
            Provider::Microsoft => self.microsoft = Some(provider),
        }
        self
    }

    #[must_use]
    pub fn get(&self, provider: Provider) -> Option<&OAuthProvider> {
        match provider {
            Provider::Google => self.google.as_ref(),
            Provider::Microsoft => self.microsoft.as_ref(),
        }
    }
}
