pub mod auth_service;
pub mod city_service;
pub mod connection_service;
pub mod search_service;
pub mod validation;

pub use auth_service::*;
pub use city_service::*;
pub use connection_service::*;
pub use search_service::*;
pub use validation::*;
