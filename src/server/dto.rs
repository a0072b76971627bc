use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{
    Assinatura, AssinaturaStatus, Disciplina, Endereco, Escola, EscolaStatus, MembershipWithEscola,
    Membro, Papel, Plano, Resource, ScheduleTemplate, Slot, Usuario,
};

// Auth

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub escola_nome: String,
    pub nome: String,
    #[serde(default)]
    pub nome_curto: Option<String>,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub endereco: Endereco,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub escola: Escola,
    pub usuario: Usuario,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub usuario: Usuario,
    pub escola_id: Option<String>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct AcceptInviteRequest {
    pub token: String,
    pub password: String,
    #[serde(default)]
    pub confirm_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OAuthStartResponse {
    pub authorization_url: String,
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackParams {
    pub code: String,
    pub state: String,
}

/// Acknowledgement with a user-facing message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// Me

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub usuario: Usuario,
    pub escolas: Vec<MembershipWithEscola>,
    pub escola_id: Option<String>,
    /// Admin rights in the selected school.
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub nome_curto: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: Option<String>,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectEscolaRequest {
    pub escola_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MyBookingsParams {
    #[serde(default)]
    pub all: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct MyBookingResponse {
    #[serde(flatten)]
    pub booking: crate::types::BookingWithResource,
    pub weekday: &'static str,
    /// `dd/mm/YYYY`
    pub date_formatted: String,
}

// Agenda

#[derive(Debug, Serialize)]
pub struct ResourceDetailResponse {
    pub resource: Resource,
    pub schedules: Vec<ScheduleTemplate>,
    /// Present for admins, who may book on behalf of a member.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membros: Option<Vec<MembroOption>>,
    pub initial_date: NaiveDate,
    pub earliest_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct MembroOption {
    pub usuario_id: String,
    pub nome: String,
}

#[derive(Debug, Serialize)]
pub struct DayAgendaResponse {
    pub resource_id: String,
    pub date: NaiveDate,
    pub weekday: &'static str,
    pub shifts: crate::scheduling::DayAgenda,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub resource_id: String,
    pub date: NaiveDate,
    pub shift: String,
    pub slot_name: String,
    #[serde(default)]
    pub teacher_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CloseSlotRequest {
    pub resource_id: String,
    pub date: NaiveDate,
    pub shift: String,
    pub slot_name: String,
}

// Billing

#[derive(Debug, Serialize)]
pub struct AssinaturaResponse {
    #[serde(flatten)]
    pub assinatura: Assinatura,
    pub effective_status: AssinaturaStatus,
    pub plano: Option<Plano>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub plano_id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
    pub session_id: String,
}

// Admin

#[derive(Debug, Deserialize)]
pub struct UpdateEscolaRequest {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub endereco: Option<Endereco>,
}

#[derive(Debug, Deserialize)]
pub struct CreateResourceRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub min_agendamento_dias: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateResourceRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub min_agendamento_dias: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CopyResourceRequest {
    pub new_name: String,
    #[serde(default)]
    pub new_icon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub order: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ReorderResponse {
    pub updated: usize,
}

#[derive(Debug, Deserialize)]
pub struct UpsertScheduleRequest {
    pub slots: Vec<Slot>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMembroRequest {
    pub nome: String,
    #[serde(default)]
    pub nome_curto: Option<String>,
    pub email: String,
    #[serde(default)]
    pub papel: Option<Papel>,
    #[serde(default)]
    pub matricula: Option<String>,
    /// When absent the member is invited by mail to choose one.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub disciplina_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMembroRequest {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub nome_curto: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub papel: Option<Papel>,
    #[serde(default)]
    pub matricula: Option<String>,
    #[serde(default)]
    pub disciplina_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct MembroResponse {
    #[serde(flatten)]
    pub membro: Membro,
    pub disciplinas: Vec<Disciplina>,
}

#[derive(Debug, Deserialize)]
pub struct DisciplinaRequest {
    pub nome: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct WeeklyViewParams {
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub resource_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub resource: Resource,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rows: Vec<crate::types::ReportRow>,
    pub total: i64,
}

// Superadmin

#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEscolaRequest {
    pub nome: String,
    #[serde(default)]
    pub endereco: Endereco,
}

#[derive(Debug, Deserialize)]
pub struct SuperUpdateEscolaRequest {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub status: Option<EscolaStatus>,
}

#[derive(Debug, Deserialize)]
pub struct GrantPlanoRequest {
    pub plano_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePlanoRequest {
    pub nome: String,
    pub preco: i64,
    pub duracao_meses: i64,
    #[serde(default)]
    pub stripe_price_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlanoRequest {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub preco: Option<i64>,
    #[serde(default)]
    pub duracao_meses: Option<i64>,
    #[serde(default)]
    pub stripe_price_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}
