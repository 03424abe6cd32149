pub mod config;
pub mod engine;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod quality;
pub mod storage;
pub mod types;
