pub mod app;
pub mod client;
pub mod config;
pub mod model;
pub mod state;
pub mod view;
