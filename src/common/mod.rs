pub mod client {
    pub mod client;
    pub mod error;
    pub mod models;
}

pub mod config;
pub mod logger;
pub mod utils;
