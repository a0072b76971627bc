use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::auth::RequireTenantAdmin;
use crate::scheduling::{today, week_bounds, week_view};
use crate::server::AppState;
use crate::server::dto::{ReportParams, ReportResponse, WeeklyViewParams};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::types::ReportRow;

/// GET /admin/weekly-view?date=YYYY-MM-DD - Defaults to the current week
pub async fn weekly_view(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<WeeklyViewParams>,
) -> Result<impl IntoResponse, ApiError> {
    let base_date = params.date.unwrap_or_else(today);
    let out_of_range = || ApiError::bad_request("Data fora do intervalo permitido.");
    let (start, end) = week_bounds(base_date).ok_or_else(out_of_range)?;

    let resources = state
        .store
        .list_resources(&ctx.tenant)
        .api_err("Falha ao listar os recursos.")?;
    let templates = state
        .store
        .list_tenant_schedules(&ctx.tenant)
        .api_err("Falha ao carregar as grades de horários.")?;
    let bookings = state
        .store
        .list_bookings_between(&ctx.tenant, start, end)
        .api_err("Falha ao carregar os agendamentos.")?;

    let view = week_view(base_date, &resources, &templates, &bookings).ok_or_else(out_of_range)?;
    Ok(Json(ApiResponse::success(view)))
}

/// GET /admin/reports - Booking counts per teacher, JSON or `format=csv`
pub async fn booking_report(
    RequireTenantAdmin(ctx): RequireTenantAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportParams>,
) -> Result<Response, ApiError> {
    if params.start_date > params.end_date {
        return Err(ApiError::bad_request(
            "A data inicial deve ser anterior ou igual à data final.",
        ));
    }

    let resource = state
        .store
        .get_resource(&ctx.tenant, &params.resource_id)
        .api_err("Falha ao carregar o recurso.")?
        .or_not_found("Recurso não encontrado.")?;

    let rows = state
        .store
        .booking_report(&ctx.tenant, &resource.id, params.start_date, params.end_date)
        .api_err("Falha ao gerar o relatório.")?;

    if params.format.as_deref() == Some("csv") {
        let filename = format!(
            "relatorio_{}_{}.csv",
            params.start_date.format("%Y%m%d"),
            params.end_date.format("%Y%m%d")
        );
        return Ok((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{filename}\""),
                ),
            ],
            report_csv(&rows),
        )
            .into_response());
    }

    let total = rows.iter().map(|r| r.count).sum();
    Ok(Json(ApiResponse::success(ReportResponse {
        resource,
        start_date: params.start_date,
        end_date: params.end_date,
        rows,
        total,
    }))
    .into_response())
}

fn csv_field(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn report_csv(rows: &[ReportRow]) -> String {
    let mut out = String::from("Professor,Agendamentos\r\n");
    for row in rows {
        out.push_str(&csv_field(&row.teacher_name));
        out.push(',');
        out.push_str(&row.count.to_string());
        out.push_str("\r\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_csv_quotes_when_needed() {
        let rows = vec![
            ReportRow {
                teacher_name: "Ana".into(),
                count: 3,
            },
            ReportRow {
                teacher_name: "Silva, João \"Jota\"".into(),
                count: 1,
            },
        ];

        assert_eq!(
            report_csv(&rows),
            "Professor,Agendamentos\r\nAna,3\r\n\"Silva, João \"\"Jota\"\"\",1\r\n"
        );
    }

    #[test]
    fn test_report_csv_empty() {
        assert_eq!(report_csv(&[]), "Professor,Agendamentos\r\n");
    }
}
