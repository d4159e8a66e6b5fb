//! Query access layer: one cached fetch per remote read operation

pub mod cache;
pub mod client;
pub mod key;

pub use cache::QueryCache;
pub use client::{QueryClient, QueryState};
pub use key::QueryKey;
