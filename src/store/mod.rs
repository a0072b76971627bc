mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use std::path::Path;

use chrono::NaiveDate;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Everything a school owns is reached through a `TenantId`; rows of another
/// school are invisible to those calls and behave as missing.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Escola operations
    fn create_escola(&self, escola: &Escola) -> Result<()>;
    fn get_escola(&self, id: &str) -> Result<Option<Escola>>;
    fn get_escola_by_nome(&self, nome: &str) -> Result<Option<Escola>>;
    fn list_escolas(&self, cursor: &str, limit: i32) -> Result<Vec<Escola>>;
    fn update_escola(&self, escola: &Escola) -> Result<()>;
    fn delete_escola(&self, id: &str) -> Result<bool>;

    // Usuario operations
    fn create_usuario(&self, usuario: &Usuario) -> Result<()>;
    fn get_usuario(&self, id: &str) -> Result<Option<Usuario>>;
    fn get_usuario_by_email(&self, email: &str) -> Result<Option<Usuario>>;
    fn update_usuario(&self, usuario: &Usuario) -> Result<()>;
    fn delete_usuario(&self, id: &str) -> Result<bool>;
    fn has_superadmin(&self) -> Result<bool>;

    // Membership operations
    fn add_membership(
        &self,
        tenant: &TenantId,
        usuario_id: &str,
        papel: Papel,
        matricula: Option<&str>,
    ) -> Result<()>;
    fn get_membership(&self, tenant: &TenantId, usuario_id: &str)
    -> Result<Option<UsuarioEscola>>;
    fn list_membros(&self, tenant: &TenantId) -> Result<Vec<Membro>>;
    fn update_membership(
        &self,
        tenant: &TenantId,
        usuario_id: &str,
        papel: Papel,
        matricula: Option<&str>,
    ) -> Result<()>;
    /// Drops the membership together with the user's bookings in that school.
    fn remove_membership(&self, tenant: &TenantId, usuario_id: &str) -> Result<bool>;
    fn list_usuario_memberships(&self, usuario_id: &str) -> Result<Vec<MembershipWithEscola>>;
    fn count_usuario_memberships(&self, usuario_id: &str) -> Result<i64>;

    // Resource operations
    fn create_resource(&self, tenant: &TenantId, resource: &Resource) -> Result<()>;
    fn get_resource(&self, tenant: &TenantId, id: &str) -> Result<Option<Resource>>;
    fn list_resources(&self, tenant: &TenantId) -> Result<Vec<Resource>>;
    fn update_resource(&self, tenant: &TenantId, resource: &Resource) -> Result<()>;
    fn delete_resource(&self, tenant: &TenantId, id: &str) -> Result<bool>;
    /// Assigns `sort_order` from each id's position. Unknown ids are skipped.
    fn reorder_resources(&self, tenant: &TenantId, ids: &[String]) -> Result<usize>;
    fn copy_resource(
        &self,
        tenant: &TenantId,
        source_id: &str,
        new_name: &str,
        new_icon: Option<&str>,
    ) -> Result<Resource>;

    // Schedule template operations
    fn upsert_schedule(
        &self,
        tenant: &TenantId,
        resource_id: &str,
        shift: Shift,
        slots: &[Slot],
    ) -> Result<ScheduleTemplate>;
    fn get_schedule(
        &self,
        tenant: &TenantId,
        resource_id: &str,
        shift: Shift,
    ) -> Result<Option<ScheduleTemplate>>;
    fn list_schedules(&self, tenant: &TenantId, resource_id: &str)
    -> Result<Vec<ScheduleTemplate>>;
    fn list_tenant_schedules(&self, tenant: &TenantId) -> Result<Vec<ScheduleTemplate>>;
    fn delete_schedule(&self, tenant: &TenantId, resource_id: &str, shift: Shift) -> Result<bool>;

    // Booking operations
    /// Inserts the booking or fails with `SlotTaken` when the slot is occupied.
    fn create_booking(&self, tenant: &TenantId, booking: &NewBooking) -> Result<Booking>;
    fn get_booking(&self, tenant: &TenantId, id: &str) -> Result<Option<Booking>>;
    fn delete_booking(&self, tenant: &TenantId, id: &str) -> Result<bool>;
    fn list_bookings_for_day(
        &self,
        tenant: &TenantId,
        resource_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Booking>>;
    fn list_bookings_between(
        &self,
        tenant: &TenantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Booking>>;
    fn list_usuario_bookings(
        &self,
        tenant: &TenantId,
        usuario_id: &str,
        from: Option<NaiveDate>,
    ) -> Result<Vec<BookingWithResource>>;
    fn booking_report(
        &self,
        tenant: &TenantId,
        resource_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ReportRow>>;

    // Disciplina operations
    fn create_disciplina(&self, tenant: &TenantId, disciplina: &Disciplina) -> Result<()>;
    fn get_disciplina(&self, tenant: &TenantId, id: &str) -> Result<Option<Disciplina>>;
    fn list_disciplinas(&self, tenant: &TenantId) -> Result<Vec<Disciplina>>;
    fn update_disciplina(&self, tenant: &TenantId, disciplina: &Disciplina) -> Result<()>;
    fn delete_disciplina(&self, tenant: &TenantId, id: &str) -> Result<bool>;
    fn set_membro_disciplinas(
        &self,
        tenant: &TenantId,
        usuario_id: &str,
        disciplina_ids: &[String],
    ) -> Result<()>;
    fn list_membro_disciplinas(&self, tenant: &TenantId, usuario_id: &str)
    -> Result<Vec<Disciplina>>;

    // Plano operations
    fn create_plano(&self, plano: &Plano) -> Result<()>;
    fn get_plano(&self, id: &str) -> Result<Option<Plano>>;
    fn get_plano_by_nome(&self, nome: &str) -> Result<Option<Plano>>;
    fn list_planos(&self) -> Result<Vec<Plano>>;
    fn update_plano(&self, plano: &Plano) -> Result<()>;
    fn delete_plano(&self, id: &str) -> Result<bool>;

    // Assinatura operations
    fn create_assinatura(&self, assinatura: &Assinatura) -> Result<()>;
    fn get_assinatura(&self, id: &str) -> Result<Option<Assinatura>>;
    /// Latest non-cancelled subscription by end date.
    fn current_assinatura(&self, tenant: &TenantId) -> Result<Option<Assinatura>>;
    fn list_assinaturas(&self, tenant: &TenantId) -> Result<Vec<Assinatura>>;
    fn update_assinatura(&self, assinatura: &Assinatura) -> Result<()>;
    fn expire_overdue_assinaturas(&self, today: NaiveDate) -> Result<usize>;
    /// Claims a checkout session for `tenant`. Returns false when it was already claimed.
    fn record_checkout_session(&self, session_id: &str, tenant: &TenantId) -> Result<bool>;
    fn forget_checkout_session(&self, session_id: &str) -> Result<()>;

    // Session operations
    fn create_session(&self, session: &Session) -> Result<()>;
    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>>;
    fn set_session_escola(&self, id: &str, escola_id: Option<&str>) -> Result<()>;
    fn touch_session(&self, id: &str) -> Result<()>;
    fn delete_session(&self, id: &str) -> Result<bool>;
    fn delete_usuario_sessions(&self, usuario_id: &str) -> Result<usize>;

    // Email token operations
    fn create_email_token(&self, token: &EmailToken) -> Result<()>;
    fn get_email_token_by_lookup(&self, lookup: &str) -> Result<Option<EmailToken>>;
    /// Returns false when the token was already used.
    fn mark_email_token_used(&self, id: &str) -> Result<bool>;

    // OAuth state operations
    fn create_oauth_state(&self, state: &OAuthState) -> Result<()>;
    fn take_oauth_state(&self, state: &str) -> Result<Option<OAuthState>>;

    // Snapshots
    fn backup_to(&self, path: &Path) -> Result<()>;
    fn restore_from(&self, path: &Path) -> Result<()>;
}

