pub mod common;
pub mod config;
pub mod database;
pub mod errors;
pub mod imagegen;
pub mod normalize;
pub mod services;
pub mod storage;

#[cfg(feature = "server")]
pub mod server;
