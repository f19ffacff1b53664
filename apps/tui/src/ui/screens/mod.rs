pub mod details;
pub mod help;
pub mod map;
pub mod permission;
pub mod upload;
