pub mod config;
pub mod dispatcher;
pub mod formatter;
pub mod models;
pub mod server;
pub mod shipment;
