//! Application services orchestrating domain logic over the
//! persistence seam.

pub mod analytics;
pub mod error;
pub mod repos;
pub mod tracking;
