//! Small shared utilities.

pub mod client_ip;
pub mod idgen;
