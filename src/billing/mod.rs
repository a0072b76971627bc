//! Subscription renewal and the Stripe hosted checkout integration.

mod stripe;
mod webhook;

use chrono::{Months, NaiveDate};
use tracing::info;

pub use stripe::{CheckoutSession, StripeClient};
pub use webhook::{
    CheckoutCompleted, SIGNATURE_TOLERANCE_SECS, WebhookEvent, parse_event, verify_signature,
};

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Assinatura, AssinaturaStatus, Plano, TenantId};

/// End date after renewing `plano` on top of `current`.
///
/// Time left on an unexpired subscription is kept; expired ones restart today.
pub fn renewal(current: Option<&Assinatura>, plano: &Plano, today: NaiveDate) -> Result<NaiveDate> {
    let months = u32::try_from(plano.duracao_meses)
        .map_err(|_| Error::BadRequest(format!("invalid plan duration: {}", plano.duracao_meses)))?;

    let base = current.map_or(today, |a| a.data_fim.max(today));

    base.checked_add_months(Months::new(months))
        .ok_or_else(|| Error::BadRequest("plan duration out of range".to_string()))
}

/// Renews the school's subscription, extending the current one when present.
pub fn apply_renewal(
    store: &dyn Store,
    tenant: &TenantId,
    plano: &Plano,
    today: NaiveDate,
) -> Result<Assinatura> {
    let current = store.current_assinatura(tenant)?;
    let data_fim = renewal(current.as_ref(), plano, today)?;

    let assinatura = match current {
        Some(mut existing) => {
            existing.plano_id = plano.id.clone();
            existing.data_fim = data_fim;
            existing.status = AssinaturaStatus::Ativa;
            store.update_assinatura(&existing)?;
            existing
        }
        None => {
            let created = Assinatura {
                id: uuid::Uuid::new_v4().to_string(),
                escola_id: tenant.as_str().to_string(),
                plano_id: plano.id.clone(),
                data_inicio: today,
                data_fim,
                status: AssinaturaStatus::Ativa,
            };
            store.create_assinatura(&created)?;
            created
        }
    };

    info!(
        escola_id = %tenant,
        plano = %plano.nome,
        data_fim = %assinatura.data_fim,
        "subscription renewed"
    );

    Ok(assinatura)
}

/// Status as of `today`, regardless of whether the expiry sweep has run.
#[must_use]
pub fn effective_status(assinatura: &Assinatura, today: NaiveDate) -> AssinaturaStatus {
    match assinatura.status {
        AssinaturaStatus::Cancelada => AssinaturaStatus::Cancelada,
        _ if assinatura.data_fim < today => AssinaturaStatus::Vencida,
        status => status,
    }
}
