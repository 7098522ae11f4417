use anyhow::Result;
use redis::Client;

const KEY_NAMESPACE: &str = "flagdesk";

#[derive(Clone)]
pub struct RedisCache {
    client: Client,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let cache = Self {
            client: Client::open(redis_url)?,
        };
        cache.ping().await?;
        Ok(cache)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Prefixes `suffix` with the application namespace.
    pub fn key(&self, suffix: &str) -> String {
        format!("{}:{}", KEY_NAMESPACE, suffix)
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }
}
