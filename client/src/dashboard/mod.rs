//! The host's dashboard: totals, session listings, participants and
//! recent exports.

pub mod models;
pub mod service;
