mod enums;
mod models;
mod tenant;

pub use enums::*;
pub use models::*;
pub use tenant::TenantId;
