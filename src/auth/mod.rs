mod helpers;
mod middleware;
mod password;
mod session;
mod token;

pub use helpers::{TokenValidationError, ValidatedSession, extract_token_from_header, validate_session};
pub use middleware::{
    AuthError, RequireSuperadmin, RequireTenant, RequireTenantAdmin, RequireUser, TenantContext,
};
pub use password::{MIN_PASSWORD_LEN, hash_password, verify_password};
pub use session::{issue_email_token, issue_session, redeem_email_token};
pub use token::{IssuedToken, TokenHasher, TokenKind, token_lookup};
