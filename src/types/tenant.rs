use std::fmt;

use serde::Serialize;

use super::Escola;

/// Identifies the school every tenant-scoped store call is bound to.
///
/// Handlers get one from a validated session (see `auth::RequireTenant`);
/// superadmin and seeding code derive it from an `Escola` row they already hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    #[must_use]
    pub fn from_escola(escola: &Escola) -> Self {
        Self(escola.id.clone())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
