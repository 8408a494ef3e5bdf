pub mod classifier;
pub mod codec;
pub mod commands;
pub mod config;
pub mod connection;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod frame;
pub mod pubsub;
pub mod server;
pub mod stats;
pub mod store;
pub mod worker;

pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;
