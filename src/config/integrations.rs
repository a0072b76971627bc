use std::path::{Path, PathBuf};

pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_MAIL_PORT: u16 = 587;
const DEFAULT_MAIL_SENDER: &str = "Agenda Escolar <nao-responda@agenda.local>";

#[derive(Debug, Clone)]
pub struct MailSettings {
    pub server: Option<String>,
    pub port: u16,
    pub use_tls: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub default_sender: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            server: None,
            port: DEFAULT_MAIL_PORT,
            use_tls: true,
            username: None,
            password: None,
            default_sender: DEFAULT_MAIL_SENDER.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct StripeSettings {
    pub secret_key: String,
    pub public_key: Option<String>,
    pub webhook_secret: Option<String>,
    pub api_base: String,
}

/// Settings for the external collaborators, read from the environment.
#[derive(Debug, Clone, Default)]
pub struct Integrations {
    pub database_url: Option<String>,
    pub mail: MailSettings,
    pub google: Option<OAuthClient>,
    pub microsoft: Option<OAuthClient>,
    pub stripe: Option<StripeSettings>,
}

impl Integrations {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to honour `.env`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mail = MailSettings {
            server: get("MAIL_SERVER"),
            port: get("MAIL_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_MAIL_PORT),
            use_tls: get("MAIL_USE_TLS").is_none_or(|v| parse_bool(&v)),
            username: get("MAIL_USERNAME"),
            password: get("MAIL_PASSWORD"),
            default_sender: get("MAIL_DEFAULT_SENDER")
                .unwrap_or_else(|| DEFAULT_MAIL_SENDER.to_string()),
        };

        let oauth_client = |id_key: &str, secret_key: &str| match (get(id_key), get(secret_key)) {
            (Some(client_id), Some(client_secret)) => Some(OAuthClient {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        let stripe = get("STRIPE_SECRET_KEY").map(|secret_key| StripeSettings {
            secret_key,
            public_key: get("STRIPE_PUBLIC_KEY"),
            webhook_secret: get("STRIPE_WEBHOOK_SECRET"),
            api_base: get("STRIPE_API_BASE")
                .map(|b| b.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_STRIPE_API_BASE.to_string()),
        });

        Self {
            database_url: get("DATABASE_URL"),
            mail,
            google: oauth_client("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
            microsoft: oauth_client("MICROSOFT_CLIENT_ID", "MICROSOFT_CLIENT_SECRET"),
            stripe,
        }
    }

    /// The sqlite file to open: `DATABASE_URL` when set, else `<data_dir>/agenda.db`.
    #[must_use]
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        match &self.database_url {
            Some(url) => {
                let path = url
                    .strip_prefix("sqlite:///")
                    .or_else(|| url.strip_prefix("sqlite://"))
                    .or_else(|| url.strip_prefix("sqlite:"))
                    .unwrap_or(url);
                PathBuf::from(path)
            }
            None => data_dir.join("agenda.db"),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Integrations {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Integrations::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let integrations = from_pairs(&[]);
        assert!(integrations.google.is_none());
        assert!(integrations.stripe.is_none());
        assert_eq!(integrations.mail.port, 587);
        assert!(integrations.mail.use_tls);
        assert_eq!(
            integrations.database_path(Path::new("/srv/agenda")),
            PathBuf::from("/srv/agenda/agenda.db")
        );
    }

    #[test]
    fn test_oauth_requires_id_and_secret() {
        let integrations = from_pairs(&[
            ("GOOGLE_CLIENT_ID", "gid"),
            ("MICROSOFT_CLIENT_ID", "mid"),
            ("MICROSOFT_CLIENT_SECRET", "msecret"),
        ]);
        assert!(integrations.google.is_none());
        assert_eq!(
            integrations.microsoft.map(|c| c.client_id),
            Some("mid".to_string())
        );
    }

    #[test]
    fn test_stripe_and_mail_settings() {
        let integrations = from_pairs(&[
            ("STRIPE_SECRET_KEY", "sk_test"),
            ("STRIPE_API_BASE", "http://127.0.0.1:9999/"),
            ("MAIL_PORT", "2525"),
            ("MAIL_USE_TLS", "false"),
        ]);
        let stripe = integrations.stripe.unwrap();
        assert_eq!(stripe.api_base, "http://127.0.0.1:9999");
        assert!(stripe.webhook_secret.is_none());
        assert_eq!(integrations.mail.port, 2525);
        assert!(!integrations.mail.use_tls);
    }

    #[test]
    fn test_database_url_prefixes() {
        let dir = Path::new("/data");
        let relative = from_pairs(&[("DATABASE_URL", "sqlite:///agenda.db")]);
        assert_eq!(relative.database_path(dir), PathBuf::from("agenda.db"));

        let short = from_pairs(&[("DATABASE_URL", "sqlite://agenda.db")]);
        assert_eq!(short.database_path(dir), PathBuf::from("agenda.db"));

        let absolute = from_pairs(&[("DATABASE_URL", "sqlite:////var/lib/agenda.db")]);
        assert_eq!(
            absolute.database_path(dir),
            PathBuf::from("/var/lib/agenda.db")
        );

        let plain = from_pairs(&[("DATABASE_URL", "/tmp/x.db")]);
        assert_eq!(plain.database_path(dir), PathBuf::from("/tmp/x.db"));
    }
}
