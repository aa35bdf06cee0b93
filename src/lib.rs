pub mod config;
pub mod dispatch;
pub mod error;
pub mod payload;
pub mod requests;
pub mod response;
pub mod server;
pub mod validate;
