//! Redis-backed durable cache

mod cache;
mod pool;

pub use pool::RedisPool;
