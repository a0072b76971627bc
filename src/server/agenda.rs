use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use chrono::NaiveDate;
use tracing::info;

use crate::auth::{RequireTenant, RequireTenantAdmin, TenantContext};
use crate::scheduling::{
    CLOSED_LABEL, can_remove, check_advance, day_agenda, earliest_booking_date,
    initial_agenda_date, today, weekday_pt,
};
use crate::server::AppState;
use crate::server::dto::{
    CloseSlotRequest, CreateBookingRequest, DayAgendaResponse, MembroOption,
    ResourceDetailResponse,
};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::types::{Booking, BookingStatus, NewBooking, Resource, Shift};

pub fn agenda_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/escola", get(get_escola))
        .route("/resources", get(list_resources))
        .route("/resources/{id}", get(get_resource))
        .route("/resources/{id}/agenda/{date}", get(get_day_agenda))
        .route("/bookings", post(create_booking))
        .route("/bookings/close", post(close_slot))
        .route("/bookings/{id}", delete(delete_booking))
}

fn parse_shift(value: &str) -> Result<Shift, ApiError> {
    Shift::parse(value.trim()).ok_or_else(|| ApiError::bad_request("Turno inválido."))
}

fn load_resource(state: &AppState, ctx: &TenantContext, id: &str) -> Result<Resource, ApiError> {
    state
        .store
        .get_resource(&ctx.tenant, id)
        .api_err("Falha ao carregar o recurso.")?
        .or_not_found("Recurso não encontrado.")
}

/// Rejects slots that the resource's template for `shift` does not define.
fn ensure_slot_exists(
    state: &AppState,
    ctx: &TenantContext,
    resource: &Resource,
    shift: Shift,
    slot_name: &str,
) -> Result<(), ApiError> {
    let template = state
        .store
        .get_schedule(&ctx.tenant, &resource.id, shift)
        .api_err("Falha ao carregar a grade de horários.")?;

    match template {
        Some(t) if t.has_slot(slot_name) => Ok(()),
        _ => Err(ApiError::bad_request(
            "Horário não encontrado na grade deste recurso.",
        )),
    }
}

/// Deletes a booking if the actor owns it or administers the school.
pub(crate) fn remove_booking(
    state: &AppState,
    ctx: &TenantContext,
    id: &str,
) -> Result<Booking, ApiError> {
    let booking = state
        .store
        .get_booking(&ctx.tenant, id)
        .api_err("Falha ao carregar o agendamento.")?
        .or_not_found("Agendamento não encontrado.")?;

    if !can_remove(&ctx.usuario.id, ctx.is_admin(), &booking) {
        return Err(ApiError::forbidden(
            "Você não tem permissão para remover este agendamento.",
        ));
    }

    state
        .store
        .delete_booking(&ctx.tenant, &booking.id)
        .api_err("Falha ao remover o agendamento.")?;

    Ok(booking)
}

/// GET /escola
pub async fn get_escola(RequireTenant(ctx): RequireTenant) -> impl IntoResponse {
    Json(ApiResponse::success(ctx.escola))
}

/// GET /resources
pub async fn list_resources(
    RequireTenant(ctx): RequireTenant,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let resources = state
        .store
        .list_resources(&ctx.tenant)
        .api_err("Falha ao listar os recursos.")?;

    Ok(Json(ApiResponse::success(resources)))
}

/// GET /resources/{id}
pub async fn get_resource(
    RequireTenant(ctx): RequireTenant,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let resource = load_resource(&state, &ctx, &id)?;
    let schedules = state
        .store
        .list_schedules(&ctx.tenant, &resource.id)
        .api_err("Falha ao carregar a grade de horários.")?;

    let membros = if ctx.is_admin() {
        let membros = state
            .store
            .list_membros(&ctx.tenant)
            .api_err("Falha ao listar os membros.")?;
        Some(
            membros
                .into_iter()
                .map(|m| MembroOption {
                    nome: m.usuario.display_name().to_string(),
                    usuario_id: m.usuario.id,
                })
                .collect(),
        )
    } else {
        None
    };

    let today = today();
    let earliest_date = if ctx.is_admin() {
        today
    } else {
        earliest_booking_date(today, resource.min_agendamento_dias)
    };

    Ok(Json(ApiResponse::success(ResourceDetailResponse {
        resource,
        schedules,
        membros,
        initial_date: initial_agenda_date(today),
        earliest_date,
    })))
}

/// GET /resources/{id}/agenda/{date}
pub async fn get_day_agenda(
    RequireTenant(ctx): RequireTenant,
    State(state): State<Arc<AppState>>,
    Path((id, date)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request("Data inválida. Use o formato AAAA-MM-DD."))?;
    let resource = load_resource(&state, &ctx, &id)?;

    let templates = state
        .store
        .list_schedules(&ctx.tenant, &resource.id)
        .api_err("Falha ao carregar a grade de horários.")?;
    let bookings = state
        .store
        .list_bookings_for_day(&ctx.tenant, &resource.id, date)
        .api_err("Falha ao carregar os agendamentos.")?;

    Ok(Json(ApiResponse::success(DayAgendaResponse {
        resource_id: resource.id,
        date,
        weekday: weekday_pt(date),
        shifts: day_agenda(&templates, &bookings, &ctx.usuario.id, ctx.is_admin()),
    })))
}

/// POST /bookings
pub async fn create_booking(
    RequireTenant(ctx): RequireTenant,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let shift = parse_shift(&req.shift)?;
    let slot_name = req.slot_name.trim();
    let resource = load_resource(&state, &ctx, &req.resource_id)?;
    let is_admin = ctx.is_admin();

    if let Err(earliest) = check_advance(
        today(),
        req.date,
        resource.min_agendamento_dias,
        is_admin,
    ) {
        return Err(ApiError::bad_request(format!(
            "Este recurso exige agendamento com {} dia(s) de antecedência. A data mais próxima disponível é {}.",
            resource.min_agendamento_dias,
            earliest.format("%d/%m/%Y")
        )));
    }

    ensure_slot_exists(&state, &ctx, &resource, shift, slot_name)?;

    // Admins may book on behalf of another member
    let teacher = match req.teacher_id.as_deref().filter(|id| !id.is_empty()) {
        Some(teacher_id) if is_admin && teacher_id != ctx.usuario.id => {
            state
                .store
                .get_membership(&ctx.tenant, teacher_id)
                .api_err("Falha ao verificar o professor.")?
                .or_not_found("Professor não encontrado nesta escola.")?;
            state
                .store
                .get_usuario(teacher_id)
                .api_err("Falha ao carregar o professor.")?
                .or_not_found("Professor não encontrado nesta escola.")?
        }
        _ => ctx.usuario.clone(),
    };

    let booking = state.store.create_booking(
        &ctx.tenant,
        &NewBooking {
            resource_id: resource.id,
            usuario_id: teacher.id.clone(),
            teacher_name: teacher.display_name().to_string(),
            date: req.date,
            shift,
            slot_name: slot_name.to_string(),
            status: BookingStatus::Booked,
        },
    )?;

    info!(
        escola_id = %ctx.tenant,
        booking_id = %booking.id,
        date = %booking.date,
        shift = %booking.shift,
        "slot booked"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(booking))))
}

/// POST /bookings/close - Block a slot so nobody can book it
pub async fn close_slot(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CloseSlotRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let shift = parse_shift(&req.shift)?;
    let slot_name = req.slot_name.trim();
    let resource = load_resource(&state, &ctx, &req.resource_id)?;

    ensure_slot_exists(&state, &ctx, &resource, shift, slot_name)?;

    let booking = state.store.create_booking(
        &ctx.tenant,
        &NewBooking {
            resource_id: resource.id,
            usuario_id: ctx.usuario.id.clone(),
            teacher_name: CLOSED_LABEL.to_string(),
            date: req.date,
            shift,
            slot_name: slot_name.to_string(),
            status: BookingStatus::Closed,
        },
    )?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(booking))))
}

/// DELETE /bookings/{id}
pub async fn delete_booking(
    RequireTenant(ctx): RequireTenant,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    remove_booking(&state, &ctx, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
