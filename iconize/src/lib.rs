pub mod command;
mod config;
pub mod server;

pub use crate::config::{Config, ServeArgs};
