pub mod assets;
pub mod cli;
pub mod config;
pub mod error;
pub mod init;
pub mod model;
pub mod pipeline;
pub mod server;
pub mod services;

pub use error::HalalError;
