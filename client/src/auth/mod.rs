//! Authentication: the process-wide bearer token and the account endpoints
//! that obtain, check and drop it.

pub mod models;
pub mod service;
pub mod session;
