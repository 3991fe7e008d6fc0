// src/lib.rs
pub mod avatar;
pub mod config;
pub mod handlers;
pub mod models;
pub mod protocol;
pub mod service;
pub mod storage;
pub mod upstream;
pub mod utils;
