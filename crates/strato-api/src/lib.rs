// strato-api: Async Rust client for the Cloudflare v4 DNS API (zones + records)

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::CloudflareClient;
pub use error::Error;
pub use models::{Credentials, Record, RecordPayload, Zone};
