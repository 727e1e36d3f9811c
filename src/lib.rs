pub mod api_client;
pub mod client;
pub mod platform;
pub mod profile;
pub mod ui;
