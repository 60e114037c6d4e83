pub mod cities;
pub mod connections;
