pub mod common;
pub mod errors;
pub mod server;
pub mod upload;
