pub mod export;
pub mod ingestion;
pub mod poller;
pub mod pools;
pub mod scoring;
pub mod server;
