//! Storage layer
//!
//! The gate's only durable dependency is a key-value cache with atomic
//! conditional-set-with-expiry, used for cross-process dedup and the durable
//! event counter.

pub mod redis;

pub use redis::RedisPool;
