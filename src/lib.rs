pub mod auth;
pub mod cli;
pub mod common;
pub mod courseware;
pub mod downloader;
pub mod orchestrator;
pub mod parser;
pub mod post_process;
