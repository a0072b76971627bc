use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Role a user holds inside one school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Papel {
    Admin,
    Professor,
}

impl Papel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Papel::Admin => "admin",
            Papel::Professor => "professor",
        }
    }

    pub fn parse(s: &str) -> Option<Papel> {
        match s {
            "admin" => Some(Papel::Admin),
            "professor" => Some(Papel::Professor),
            _ => None,
        }
    }
}

/// Named daily period under which slots are defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shift {
    Matutino,
    Vespertino,
}

impl Shift {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Shift::Matutino => "matutino",
            Shift::Vespertino => "vespertino",
        }
    }

    pub fn parse(s: &str) -> Option<Shift> {
        match s {
            "matutino" => Some(Shift::Matutino),
            "vespertino" => Some(Shift::Vespertino),
            _ => None,
        }
    }

    /// Capitalized label used in the weekly view titles.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Shift::Matutino => "Matutino",
            Shift::Vespertino => "Vespertino",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Booked,
    Closed,
}

impl BookingStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Booked => "booked",
            BookingStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<BookingStatus> {
        match s {
            "booked" => Some(BookingStatus::Booked),
            "closed" => Some(BookingStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssinaturaStatus {
    Ativa,
    Vencida,
    Cancelada,
}

impl AssinaturaStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AssinaturaStatus::Ativa => "ativa",
            AssinaturaStatus::Vencida => "vencida",
            AssinaturaStatus::Cancelada => "cancelada",
        }
    }

    pub fn parse(s: &str) -> Option<AssinaturaStatus> {
        match s {
            "ativa" => Some(AssinaturaStatus::Ativa),
            "vencida" => Some(AssinaturaStatus::Vencida),
            "cancelada" => Some(AssinaturaStatus::Cancelada),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscolaStatus {
    Ativo,
    Inativo,
}

impl EscolaStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EscolaStatus::Ativo => "ativo",
            EscolaStatus::Inativo => "inativo",
        }
    }

    pub fn parse(s: &str) -> Option<EscolaStatus> {
        match s {
            "ativo" => Some(EscolaStatus::Ativo),
            "inativo" => Some(EscolaStatus::Inativo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailTokenPurpose {
    ConfirmEmail,
    ResetPassword,
    Invite,
}

impl EmailTokenPurpose {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EmailTokenPurpose::ConfirmEmail => "confirm_email",
            EmailTokenPurpose::ResetPassword => "reset_password",
            EmailTokenPurpose::Invite => "invite",
        }
    }

    pub fn parse(s: &str) -> Option<EmailTokenPurpose> {
        match s {
            "confirm_email" => Some(EmailTokenPurpose::ConfirmEmail),
            "reset_password" => Some(EmailTokenPurpose::ResetPassword),
            "invite" => Some(EmailTokenPurpose::Invite),
            _ => None,
        }
    }

    /// How long a link of this kind stays valid.
    #[must_use]
    pub fn ttl(self) -> chrono::Duration {
        match self {
            EmailTokenPurpose::ConfirmEmail => chrono::Duration::hours(48),
            EmailTokenPurpose::ResetPassword => chrono::Duration::hours(1),
            EmailTokenPurpose::Invite => chrono::Duration::days(7),
        }
    }
}

/// How a user authenticates.
///
/// `Invited` accounts have no credential yet; the invitation link turns them
/// into `Active` (password) accounts, an OAuth login turns them into `SocialOnly`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountState {
    Invited,
    Active { password_hash: String },
    SocialOnly { provider: String },
}

impl AccountState {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            AccountState::Invited => "invited",
            AccountState::Active { .. } => "active",
            AccountState::SocialOnly { .. } => "social_only",
        }
    }

    #[must_use]
    pub fn password_hash(&self) -> Option<&str> {
        match self {
            AccountState::Active { password_hash } => Some(password_hash),
            _ => None,
        }
    }

    #[must_use]
    pub fn social_provider(&self) -> Option<&str> {
        match self {
            AccountState::SocialOnly { provider } => Some(provider),
            _ => None,
        }
    }

    #[must_use]
    pub const fn can_login_with_password(&self) -> bool {
        matches!(self, AccountState::Active { .. })
    }

    /// Rebuilds the state from its stored columns.
    pub fn from_columns(
        kind: &str,
        password_hash: Option<String>,
        provider: Option<String>,
    ) -> Option<AccountState> {
        match (kind, password_hash, provider) {
            ("invited", _, _) => Some(AccountState::Invited),
            ("active", Some(password_hash), _) => Some(AccountState::Active { password_hash }),
            ("social_only", _, Some(provider)) => Some(AccountState::SocialOnly { provider }),
            _ => None,
        }
    }
}

impl Serialize for AccountState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_parse() {
        assert_eq!(Shift::parse("matutino"), Some(Shift::Matutino));
        assert_eq!(Shift::parse("vespertino"), Some(Shift::Vespertino));
        assert_eq!(Shift::parse("noturno"), None);
    }

    #[test]
    fn test_account_state_from_columns() {
        assert_eq!(
            AccountState::from_columns("invited", None, None),
            Some(AccountState::Invited)
        );
        assert_eq!(
            AccountState::from_columns("active", Some("h".into()), None),
            Some(AccountState::Active {
                password_hash: "h".into()
            })
        );
        assert_eq!(AccountState::from_columns("active", None, None), None);
        assert_eq!(
            AccountState::from_columns("social_only", None, Some("google".into()))
                .and_then(|s| s.social_provider().map(str::to_string)),
            Some("google".to_string())
        );
    }

    #[test]
    fn test_only_active_accounts_use_passwords() {
        assert!(!AccountState::Invited.can_login_with_password());
        assert!(
            !AccountState::SocialOnly {
                provider: "microsoft".into()
            }
            .can_login_with_password()
        );
        assert!(
            AccountState::Active {
                password_hash: "x".into()
            }
            .can_login_with_password()
        );
    }
}
