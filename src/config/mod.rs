mod integrations;
mod server;

pub use integrations::{Integrations, MailSettings, OAuthClient, StripeSettings};
pub use server::ServerConfig;
