//! Utility modules

pub mod debug;
pub mod http;
