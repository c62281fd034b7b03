pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod middleware;
pub mod registry;
pub mod server;
pub mod token_bucket;

pub use config::Config;
pub use error::{Error, Result};
pub use limiter::RateLimiter;
pub use registry::ClientRegistry;
pub use server::{create_app, Server};
pub use token_bucket::TokenBucket;
