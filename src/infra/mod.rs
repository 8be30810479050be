//! Infrastructure adapters: Postgres persistence, HTTP surface,
//! telemetry bootstrap.

pub mod db;
pub mod error;
pub mod http;
pub mod telemetry;
