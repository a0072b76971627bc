mod admin;
mod agenda;
mod auth;
mod billing;
pub mod dto;
mod me;
pub mod response;
mod router;
mod superadmin;
mod uploads;
pub mod validation;

pub use router::{AppState, create_router};
