pub mod config;
pub mod domain;
pub mod logging;
pub mod notification;
pub mod utils;
