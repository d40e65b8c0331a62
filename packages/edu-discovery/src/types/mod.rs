//! Discovery data types.

pub mod config;
pub mod grade;
pub mod policy;
pub mod request;
pub mod result;
