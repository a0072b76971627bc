#![allow(dead_code)]

mod test_server;

pub use test_server::{PASSWORD, SUPERADMIN_EMAIL, TestServer};
