pub mod app;
pub mod channels;
pub mod config;
pub mod progress;
pub mod shared;
