use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use tracing::{info, warn};

use crate::auth::{RequireTenant, RequireTenantAdmin};
use crate::billing::{WebhookEvent, apply_renewal, effective_status, parse_event, verify_signature};
use crate::scheduling::today;
use crate::server::AppState;
use crate::server::dto::{AssinaturaResponse, CheckoutRequest, CheckoutResponse, MessageResponse};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::types::TenantId;

pub fn billing_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/planos", get(list_planos))
        .route("/assinatura", get(get_assinatura))
        .route("/billing/checkout", post(checkout))
        .route("/billing/webhook", post(webhook))
}

/// GET /planos
pub async fn list_planos(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let planos = state
        .store
        .list_planos()
        .api_err("Falha ao listar os planos.")?;

    Ok(Json(ApiResponse::success(planos)))
}

/// GET /assinatura - Current subscription of the selected school
pub async fn get_assinatura(
    RequireTenant(ctx): RequireTenant,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let assinatura = state
        .store
        .current_assinatura(&ctx.tenant)
        .api_err("Falha ao carregar a assinatura.")?;

    let response = match assinatura {
        Some(assinatura) => {
            let plano = state
                .store
                .get_plano(&assinatura.plano_id)
                .api_err("Falha ao carregar o plano.")?;
            Some(AssinaturaResponse {
                effective_status: effective_status(&assinatura, today()),
                assinatura,
                plano,
            })
        }
        None => None,
    };

    Ok(Json(ApiResponse::success(response)))
}

/// POST /billing/checkout
pub async fn checkout(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| ApiError::bad_request("Pagamentos online não estão configurados."))?;

    let plano = state
        .store
        .get_plano(&req.plano_id)
        .api_err("Falha ao carregar o plano.")?
        .or_not_found("Plano não encontrado.")?;

    let success_url = format!("{}/assinatura?checkout=sucesso", state.public_base_url);
    let cancel_url = format!("{}/assinatura?checkout=cancelado", state.public_base_url);

    let session = stripe
        .create_checkout_session(&plano, &ctx.escola, &success_url, &cancel_url)
        .await
        .map_err(|e| {
            warn!(escola_id = %ctx.tenant, error = %e, "checkout session failed");
            ApiError::bad_gateway("Não foi possível iniciar o pagamento. Tente novamente mais tarde.")
        })?;

    Ok(Json(ApiResponse::success(CheckoutResponse {
        checkout_url: session.url.unwrap_or_default(),
        session_id: session.id,
    })))
}

/// POST /billing/webhook - Stripe event delivery
pub async fn webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let secret = state
        .stripe
        .as_ref()
        .and_then(|s| s.settings().webhook_secret.as_deref())
        .ok_or_else(|| ApiError::bad_request("Webhook não configurado."))?;

    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("Assinatura do webhook ausente."))?;

    verify_signature(&body, signature, secret, Utc::now().timestamp())
        .map_err(|_| ApiError::bad_request("Assinatura do webhook inválida."))?;

    let event = parse_event(&body).map_err(|e| {
        warn!(error = %e, "unreadable webhook payload");
        ApiError::bad_request("Evento inválido.")
    })?;

    match event {
        WebhookEvent::CheckoutCompleted(completed) => {
            let escola = state
                .store
                .get_escola(&completed.escola_id)
                .api_err("Falha ao carregar a escola.")?
                .or_not_found("Escola não encontrada.")?;
            let plano = state
                .store
                .get_plano(&completed.plano_id)
                .api_err("Falha ao carregar o plano.")?
                .or_not_found("Plano não encontrado.")?;

            let tenant = TenantId::from_escola(&escola);
            let first_delivery = state
                .store
                .record_checkout_session(&completed.session_id, &tenant)
                .api_err("Falha ao registrar o pagamento.")?;
            if !first_delivery {
                info!(session_id = %completed.session_id, escola_id = %escola.id, "checkout already processed");
                return Ok(Json(ApiResponse::success(MessageResponse::new("ok"))));
            }

            if let Err(e) = apply_renewal(state.store.as_ref(), &tenant, &plano, today()) {
                warn!(session_id = %completed.session_id, error = %e, "renewal failed");
                // Released so the provider's retry can renew
                if let Err(cleanup) = state.store.forget_checkout_session(&completed.session_id) {
                    warn!(session_id = %completed.session_id, error = %cleanup, "failed to release checkout session");
                }
                return Err(ApiError::internal("Falha ao renovar a assinatura."));
            }

            info!(session_id = %completed.session_id, escola_id = %escola.id, "checkout completed");
        }
        WebhookEvent::Ignored { event_type } => {
            info!(event_type = %event_type, "webhook event ignored");
        }
    }

    Ok(Json(ApiResponse::success(MessageResponse::new("ok"))))
}
