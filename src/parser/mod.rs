pub mod catalog;
pub mod detail;
pub mod errors;
pub mod models;
pub mod stream_selector;
