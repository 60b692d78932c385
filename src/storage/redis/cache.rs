//! Cache operations used by the gateway
//!
//! The dedup guarantee rests on `set_nx_ex`: Redis applies SET NX EX
//! atomically, so concurrent duplicate submissions race on the server and
//! exactly one wins, with no application-level lock.

use super::pool::{MemoryEntry, RedisPool};
use crate::utils::error::{GatewayError, Result};
use redis::AsyncCommands;
use std::time::{Duration, Instant};

impl RedisPool {
    /// Get a value from cache
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        if let Some(memory) = &self.memory {
            let mut store = memory.lock();
            let expired = store
                .get(key)
                .map_or(false, |e| e.expires_at.map_or(false, |t| t <= Instant::now()));
            if expired {
                store.remove(key);
                return Ok(None);
            }
            return Ok(store.get(key).map(|e| e.value.clone()));
        }
        if self.noop_mode {
            return Ok(None);
        }

        let mut conn = self.connection()?;
        let value: Option<String> = conn.get(key).await.map_err(GatewayError::Redis)?;
        Ok(value)
    }

    /// Atomic "set if absent, with expiry".
    ///
    /// Returns `true` if the key was newly set (this caller won), `false` if
    /// it already existed within its TTL.
    pub async fn set_nx_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool> {
        if let Some(memory) = &self.memory {
            let mut store = memory.lock();
            let now = Instant::now();
            let live = store
                .get(key)
                .map_or(false, |e| e.expires_at.map_or(true, |t| t > now));
            if live {
                return Ok(false);
            }
            store.insert(
                key.to_string(),
                MemoryEntry {
                    value: value.to_string(),
                    expires_at: Some(now + Duration::from_secs(ttl_secs)),
                },
            );
            return Ok(true);
        }
        if self.noop_mode {
            return Err(GatewayError::DependencyUnavailable(
                "redis pool in no-op mode".to_string(),
            ));
        }

        let mut conn = self.connection()?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(GatewayError::Redis)?;

        Ok(reply.is_some())
    }

    /// Increment key value by delta, returning the new value
    pub async fn increment(&self, key: &str, delta: i64) -> Result<i64> {
        if let Some(memory) = &self.memory {
            let mut store = memory.lock();
            let current = store
                .get(key)
                .and_then(|e| e.value.parse::<i64>().ok())
                .unwrap_or(0);
            let new_value = current + delta;
            store.insert(
                key.to_string(),
                MemoryEntry {
                    value: new_value.to_string(),
                    expires_at: None,
                },
            );
            return Ok(new_value);
        }
        if self.noop_mode {
            return Err(GatewayError::DependencyUnavailable(
                "redis pool in no-op mode".to_string(),
            ));
        }

        let mut conn = self.connection()?;
        let new_value: i64 = conn.incr(key, delta).await.map_err(GatewayError::Redis)?;
        Ok(new_value)
    }

    /// Remove a key; a missing key is not an error
    pub async fn delete(&self, key: &str) -> Result<()> {
        if let Some(memory) = &self.memory {
            memory.lock().remove(key);
            return Ok(());
        }
        if self.noop_mode {
            return Err(GatewayError::DependencyUnavailable(
                "redis pool in no-op mode".to_string(),
            ));
        }

        let mut conn = self.connection()?;
        let _: i64 = conn.del(key).await.map_err(GatewayError::Redis)?;
        Ok(())
    }

    /// Read an integer counter, treating a missing key as zero
    pub async fn get_counter(&self, key: &str) -> Result<i64> {
        let value = self.get(key).await?;
        Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    /// Read a float value when present and parseable
    pub async fn get_float(&self, key: &str) -> Result<Option<f64>> {
        let value = self.get(key).await?;
        Ok(value.and_then(|v| v.parse().ok()))
    }

    fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.connection
            .clone()
            .ok_or_else(|| GatewayError::DependencyUnavailable("no redis connection".to_string()))
    }
}
