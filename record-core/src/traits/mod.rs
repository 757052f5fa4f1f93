pub mod backend;
pub mod permission;
