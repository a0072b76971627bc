use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{
    AccountState, AssinaturaStatus, BookingStatus, EmailTokenPurpose, EscolaStatus, Papel, Shift,
};

#[derive(Debug, Clone, Serialize)]
pub struct Escola {
    pub id: String,
    pub nome: String,
    pub status: EscolaStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cep: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logradouro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complemento: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bairro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Escola {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == EscolaStatus::Ativo
    }

    /// Replaces the address; blank fields are stored as missing.
    pub fn set_endereco(&mut self, endereco: Endereco) {
        let clean = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        self.cep = clean(endereco.cep);
        self.logradouro = clean(endereco.logradouro);
        self.numero = clean(endereco.numero);
        self.complemento = clean(endereco.complemento);
        self.bairro = clean(endereco.bairro);
        self.cidade = clean(endereco.cidade);
        self.uf = clean(endereco.uf);
    }
}

/// Address columns shared by create and update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Endereco {
    pub cep: Option<String>,
    pub logradouro: Option<String>,
    pub numero: Option<String>,
    pub complemento: Option<String>,
    pub bairro: Option<String>,
    pub cidade: Option<String>,
    pub uf: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Usuario {
    pub id: String,
    pub nome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome_curto: Option<String>,
    pub email: String,
    #[serde(rename = "account")]
    pub account_state: AccountState,
    pub is_superadmin: bool,
    pub email_confirmado: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foto_perfil: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Usuario {
    /// True for superadmins and for anyone holding an admin membership in any school.
    #[must_use]
    pub fn is_admin(&self, memberships: &[UsuarioEscola]) -> bool {
        self.is_superadmin || memberships.iter().any(|m| m.papel == Papel::Admin)
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.nome_curto.as_deref() {
            Some(curto) if !curto.trim().is_empty() => curto,
            _ => &self.nome,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UsuarioEscola {
    pub usuario_id: String,
    pub escola_id: String,
    pub papel: Papel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matricula: Option<String>,
}

/// A membership joined with its user row.
#[derive(Debug, Clone, Serialize)]
pub struct Membro {
    pub usuario: Usuario,
    pub papel: Papel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matricula: Option<String>,
}

/// A membership joined with its school's name, for the school picker.
#[derive(Debug, Clone, Serialize)]
pub struct MembershipWithEscola {
    #[serde(flatten)]
    pub membership: UsuarioEscola,
    pub escola_nome: String,
    pub escola_status: EscolaStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    pub id: String,
    pub escola_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub icon: String,
    pub sort_order: i64,
    pub min_agendamento_dias: i64,
    pub created_at: DateTime<Utc>,
}

pub const DEFAULT_RESOURCE_ICON: &str = "bi-box";
pub const DEFAULT_SLOT_TYPE: &str = "aula";

fn default_slot_type() -> String {
    DEFAULT_SLOT_TYPE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub name: String,
    #[serde(rename = "type", default = "default_slot_type")]
    pub slot_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleTemplate {
    pub id: String,
    pub resource_id: String,
    pub shift: Shift,
    pub slots: Vec<Slot>,
}

impl ScheduleTemplate {
    #[must_use]
    pub fn has_slot(&self, name: &str) -> bool {
        self.slots.iter().any(|s| s.name == name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: String,
    pub escola_id: String,
    pub resource_id: String,
    pub usuario_id: String,
    pub teacher_name: String,
    pub date: NaiveDate,
    pub shift: Shift,
    pub slot_name: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// Fields of a booking about to be inserted.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub resource_id: String,
    pub usuario_id: String,
    pub teacher_name: String,
    pub date: NaiveDate,
    pub shift: Shift,
    pub slot_name: String,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingWithResource {
    #[serde(flatten)]
    pub booking: Booking,
    pub resource_name: String,
    pub resource_icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub teacher_name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Disciplina {
    pub id: String,
    pub escola_id: String,
    pub nome: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Plano {
    pub id: String,
    pub nome: String,
    /// Price in cents.
    pub preco: i64,
    pub duracao_meses: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_price_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Assinatura {
    pub id: String,
    pub escola_id: String,
    pub plano_id: String,
    pub data_inicio: NaiveDate,
    pub data_fim: NaiveDate,
    pub status: AssinaturaStatus,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub token_hash: String,
    pub token_lookup: String,
    pub usuario_id: String,
    pub escola_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct EmailToken {
    pub id: String,
    pub token_hash: String,
    pub token_lookup: String,
    pub usuario_id: String,
    pub purpose: EmailTokenPurpose,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl EmailToken {
    #[must_use]
    pub fn is_usable(&self, purpose: EmailTokenPurpose, now: DateTime<Utc>) -> bool {
        self.purpose == purpose && self.used_at.is_none() && self.expires_at > now
    }
}

/// Pending OAuth authorization, consumed by the provider callback.
#[derive(Debug, Clone)]
pub struct OAuthState {
    pub state: String,
    pub provider: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usuario(superadmin: bool) -> Usuario {
        Usuario {
            id: "u1".into(),
            nome: "Maria da Silva".into(),
            nome_curto: None,
            email: "maria@example.com".into(),
            account_state: AccountState::Invited,
            is_superadmin: superadmin,
            email_confirmado: false,
            foto_perfil: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn membership(papel: Papel) -> UsuarioEscola {
        UsuarioEscola {
            usuario_id: "u1".into(),
            escola_id: "e1".into(),
            papel,
            matricula: None,
        }
    }

    #[test]
    fn test_superadmin_is_always_admin() {
        assert!(usuario(true).is_admin(&[]));
        assert!(usuario(true).is_admin(&[membership(Papel::Professor)]));
    }

    #[test]
    fn test_is_admin_from_memberships() {
        let u = usuario(false);
        assert!(!u.is_admin(&[]));
        assert!(!u.is_admin(&[membership(Papel::Professor)]));
        assert!(u.is_admin(&[membership(Papel::Professor), membership(Papel::Admin)]));
    }

    #[test]
    fn test_display_name_prefers_nome_curto() {
        let mut u = usuario(false);
        assert_eq!(u.display_name(), "Maria da Silva");
        u.nome_curto = Some("Maria".into());
        assert_eq!(u.display_name(), "Maria");
        u.nome_curto = Some("  ".into());
        assert_eq!(u.display_name(), "Maria da Silva");
    }

    #[test]
    fn test_slot_type_defaults_to_aula() {
        let slot: Slot = serde_json::from_str(r#"{"name":"08:00"}"#).unwrap();
        assert_eq!(slot.slot_type, "aula");
    }

    #[test]
    fn test_email_token_usable() {
        let now = Utc::now();
        let token = EmailToken {
            id: "t".into(),
            token_hash: String::new(),
            token_lookup: String::new(),
            usuario_id: "u1".into(),
            purpose: EmailTokenPurpose::ResetPassword,
            created_at: now,
            expires_at: now + chrono::Duration::hours(1),
            used_at: None,
        };
        assert!(token.is_usable(EmailTokenPurpose::ResetPassword, now));
        assert!(!token.is_usable(EmailTokenPurpose::Invite, now));
        assert!(!token.is_usable(
            EmailTokenPurpose::ResetPassword,
            now + chrono::Duration::hours(2)
        ));
    }
}
