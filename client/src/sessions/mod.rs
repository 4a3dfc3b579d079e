//! Host-side session management: grouping and selection sessions.

pub mod models;
pub mod service;
