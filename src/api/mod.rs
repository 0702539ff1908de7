pub mod espn_client;
pub mod handlers;
pub mod models;
pub mod parsers;
pub mod routes;

pub use espn_client::EspnClient;
