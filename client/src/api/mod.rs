//! HTTP access to the GroupifyAssist backend.
//!
//! `client` owns the transport and the 401 policy; `common` holds the wire
//! shapes every endpoint shares.

pub mod client;
pub mod common;
