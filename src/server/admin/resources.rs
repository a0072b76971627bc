use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;

use crate::auth::{RequireTenantAdmin, TenantContext};
use crate::scheduling::MAX_ADVANCE_DAYS;
use crate::server::AppState;
use crate::server::dto::{
    CopyResourceRequest, CreateResourceRequest, ReorderRequest, ReorderResponse,
    UpdateResourceRequest, UpsertScheduleRequest,
};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{normalize_slots, optional_text, validate_name};
use crate::types::{DEFAULT_RESOURCE_ICON, Resource, Shift};

fn validate_min_days(value: i64) -> Result<i64, ApiError> {
    if value < 0 {
        return Err(ApiError::bad_request(
            "A antecedência mínima não pode ser negativa.",
        ));
    }
    if value > MAX_ADVANCE_DAYS {
        return Err(ApiError::bad_request(format!(
            "A antecedência mínima deve ser de no máximo {MAX_ADVANCE_DAYS} dias."
        )));
    }
    Ok(value)
}

fn icon_or_default(icon: Option<String>) -> String {
    optional_text(icon).unwrap_or_else(|| DEFAULT_RESOURCE_ICON.to_string())
}

fn load_resource(state: &AppState, ctx: &TenantContext, id: &str) -> Result<Resource, ApiError> {
    state
        .store
        .get_resource(&ctx.tenant, id)
        .api_err("Falha ao carregar o recurso.")?
        .or_not_found("Recurso não encontrado.")
}

fn parse_shift(value: &str) -> Result<Shift, ApiError> {
    Shift::parse(value).ok_or_else(|| ApiError::bad_request("Turno inválido."))
}

/// GET /admin/resources
pub async fn list_resources(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let resources = state
        .store
        .list_resources(&ctx.tenant)
        .api_err("Falha ao listar os recursos.")?;

    Ok(Json(ApiResponse::success(resources)))
}

/// POST /admin/resources
pub async fn create_resource(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateResourceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate_name(&req.name, "O nome do recurso")?;
    let min_agendamento_dias = validate_min_days(req.min_agendamento_dias.unwrap_or(0))?;

    // New resources go to the end of the list
    let sort_order = state
        .store
        .list_resources(&ctx.tenant)
        .api_err("Falha ao listar os recursos.")?
        .len() as i64;

    let resource = Resource {
        id: uuid::Uuid::new_v4().to_string(),
        escola_id: ctx.tenant.as_str().to_string(),
        name,
        description: optional_text(req.description),
        icon: icon_or_default(req.icon),
        sort_order,
        min_agendamento_dias,
        created_at: Utc::now(),
    };

    state
        .store
        .create_resource(&ctx.tenant, &resource)
        .api_err("Falha ao criar o recurso.")?;

    info!(escola_id = %ctx.tenant, resource_id = %resource.id, "resource created");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(resource))))
}

/// PATCH /admin/resources/{id}
pub async fn update_resource(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateResourceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut resource = load_resource(&state, &ctx, &id)?;

    if let Some(name) = req.name {
        resource.name = validate_name(&name, "O nome do recurso")?;
    }
    if req.description.is_some() {
        resource.description = optional_text(req.description);
    }
    if req.icon.is_some() {
        resource.icon = icon_or_default(req.icon);
    }
    if let Some(days) = req.min_agendamento_dias {
        resource.min_agendamento_dias = validate_min_days(days)?;
    }

    state
        .store
        .update_resource(&ctx.tenant, &resource)
        .api_err("Falha ao atualizar o recurso.")?;

    Ok(Json(ApiResponse::success(resource)))
}

/// DELETE /admin/resources/{id} - Also drops its schedules and bookings
pub async fn delete_resource(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .store
        .delete_resource(&ctx.tenant, &id)
        .api_err("Falha ao remover o recurso.")?;

    if !deleted {
        return Err(ApiError::not_found("Recurso não encontrado."));
    }

    info!(escola_id = %ctx.tenant, resource_id = %id, "resource deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/resources/{id}/copy - Duplicate a resource with its schedules
pub async fn copy_resource(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CopyResourceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_name = validate_name(&req.new_name, "O nome do novo recurso")?;
    let new_icon = optional_text(req.new_icon);

    let copy = state
        .store
        .copy_resource(&ctx.tenant, &id, &new_name, new_icon.as_deref())
        .map_err(|e| match e {
            crate::error::Error::NotFound => ApiError::not_found("Recurso não encontrado."),
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(copy))))
}

/// POST /admin/resources/reorder
pub async fn reorder_resources(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReorderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .store
        .reorder_resources(&ctx.tenant, &req.order)
        .api_err("Falha ao reordenar os recursos.")?;

    Ok(Json(ApiResponse::success(ReorderResponse { updated })))
}

/// GET /admin/resources/{id}/schedules
pub async fn list_schedules(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let resource = load_resource(&state, &ctx, &id)?;
    let schedules = state
        .store
        .list_schedules(&ctx.tenant, &resource.id)
        .api_err("Falha ao carregar a grade de horários.")?;

    Ok(Json(ApiResponse::success(schedules)))
}

/// PUT /admin/resources/{id}/schedules/{shift} - Replace the slot list of one shift
pub async fn upsert_schedule(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Path((id, shift)): Path<(String, String)>,
    Json(req): Json<UpsertScheduleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let shift = parse_shift(&shift)?;
    let slots = normalize_slots(req.slots)?;
    let resource = load_resource(&state, &ctx, &id)?;

    let template = state
        .store
        .upsert_schedule(&ctx.tenant, &resource.id, shift, &slots)
        .api_err("Falha ao salvar a grade de horários.")?;

    Ok(Json(ApiResponse::success(template)))
}

/// DELETE /admin/resources/{id}/schedules/{shift}
pub async fn delete_schedule(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Path((id, shift)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let shift = parse_shift(&shift)?;

    let deleted = state
        .store
        .delete_schedule(&ctx.tenant, &id, shift)
        .api_err("Falha ao remover a grade de horários.")?;

    if !deleted {
        return Err(ApiError::not_found("Grade de horários não encontrada."));
    }

    Ok(StatusCode::NO_CONTENT)
}
