pub mod backend;
pub mod link;
pub mod models;
pub mod validation;
pub mod workflow;
