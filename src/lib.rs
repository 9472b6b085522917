pub mod config;
pub mod error;
pub mod graph;
pub mod http_client;
pub mod images;
pub mod layout;
pub mod loader;
pub mod matchup;
pub mod names;
pub mod state;
pub mod stats;
pub mod views;
