pub mod auth;
pub mod cities;
pub mod connections;
pub mod health;
pub mod search;
