pub mod codec;
pub mod commands;
pub mod config;
pub mod connection;
pub mod encoder;
pub mod frame;
pub mod handler;
pub mod list;
pub mod outbound;
pub mod pubsub;
pub mod server;
pub mod store;
pub mod utils;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
