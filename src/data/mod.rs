pub mod cache;
pub mod fetcher;
pub mod types;
