use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use crate::config::StripeSettings;
use crate::error::{Error, Result};
use crate::types::{Escola, Plano};

/// Hosted checkout page returned by Stripe.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Clone)]
pub struct StripeClient {
    http: Client,
    settings: StripeSettings,
}

impl StripeClient {
    #[must_use]
    pub fn new(http: Client, settings: StripeSettings) -> Self {
        Self { http, settings }
    }

    #[must_use]
    pub fn settings(&self) -> &StripeSettings {
        &self.settings
    }

    /// Opens a one-off payment for `plano` on behalf of `escola`.
    ///
    /// The school and plan ids travel as metadata and come back in the
    /// `checkout.session.completed` webhook.
    pub async fn create_checkout_session(
        &self,
        plano: &Plano,
        escola: &Escola,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession> {
        debug!(escola_id = %escola.id, plano = %plano.nome, "creating checkout session");

        let preco = plano.preco.to_string();
        let product_name = format!("Agenda Escolar - {}", plano.nome);

        let mut form: Vec<(&str, &str)> = vec![
            ("mode", "payment"),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
            ("client_reference_id", escola.id.as_str()),
            ("metadata[escola_id]", escola.id.as_str()),
            ("metadata[plano_id]", plano.id.as_str()),
            ("line_items[0][quantity]", "1"),
        ];

        match &plano.stripe_price_id {
            Some(price_id) => form.push(("line_items[0][price]", price_id.as_str())),
            None => {
                form.push(("line_items[0][price_data][currency]", "brl"));
                form.push(("line_items[0][price_data][unit_amount]", preco.as_str()));
                form.push(("line_items[0][price_data][product_data][name]", product_name.as_str()));
            }
        }

        let url = format!("{}/v1/checkout/sessions", self.settings.api_base);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.settings.secret_key, Option::<&str>::None)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Stripe request failed");
                Error::External(format!("stripe: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Stripe API error");
            return Err(Error::External(format!("stripe returned {status}")));
        }

        let session: CheckoutSession = response.json().await?;
        if session.url.is_none() {
            return Err(Error::External(
                "stripe checkout session has no url".to_string(),
            ));
        }

        Ok(session)
    }
}
