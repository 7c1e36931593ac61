use redis::RedisResult;
use tracing::info;

/// Shared counters for per-client request limiting.
#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        info!("Redis rate limiter configured");
        Ok(Self { client })
    }

    /// Fixed-window counter: returns `false` once `key` exceeds `limit`
    /// requests within `window_seconds` of the first one.
    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let (count,): (i64,) = window_pipeline(key, window_seconds).query_async(&mut conn).await?;
        Ok(count <= limit)
    }
}

/// The TTL is set only when the window opens; `INCR` keeps it.
fn window_pipeline(key: &str, window_seconds: i64) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .cmd("SET")
        .arg(key)
        .arg(0)
        .arg("NX")
        .arg("EX")
        .arg(window_seconds)
        .ignore()
        .incr(key, 1);
    pipe
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_ttl_is_not_refreshed_per_request() {
        let packed = window_pipeline("ratelimit:10.0.0.1", 60).get_packed_pipeline();
        let packed = String::from_utf8_lossy(&packed);

        assert!(packed.contains("\r\nSET\r\n"));
        assert!(packed.contains("\r\nNX\r\n"));
        assert!(packed.contains("\r\nINCR\r\n"));
        assert!(!packed.contains("EXPIRE"));
        assert!(packed.find("\r\nSET\r\n") < packed.find("\r\nINCR\r\n"));
    }
}
