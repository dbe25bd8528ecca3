//! Redis 缓存管理模块
//!
//! 提供 Redis 连接管理和常用缓存操作封装，值统一以 JSON 存储。

use crate::config::RedisConfig;
use crate::error::{Result, SharedError};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{info, instrument};

/// Redis 缓存客户端
#[derive(Clone)]
pub struct Cache {
    client: Client,
}

impl Cache {
    /// 创建 Redis 客户端（不会立即建立连接）
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        info!("Redis client created");
        Ok(Self { client })
    }

    async fn get_conn(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(SharedError::from)
    }

    /// 健康检查
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.get_conn().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(SharedError::from)
    }

    /// 获取值
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn.get(key).await?;

        match value {
            Some(v) => Ok(Some(serde_json::from_str(&v)?)),
            None => Ok(None),
        }
    }

    /// 设置值
    #[instrument(skip(self, value))]
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let mut conn = self.get_conn().await?;
        let serialized = serde_json::to_string(value)?;

        let _: () = conn.set_ex(key, serialized, ttl.as_secs()).await?;
        Ok(())
    }

    /// 删除值
    #[instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.get_conn().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    /// 批量删除（按模式）
    #[instrument(skip(self))]
    pub async fn delete_pattern(&self, pattern: &str) -> Result<u64> {
        let mut conn = self.get_conn().await?;
        let keys: Vec<String> = conn.keys(pattern).await?;

        if keys.is_empty() {
            return Ok(0);
        }

        let count: u64 = conn.del(keys).await?;
        Ok(count)
    }
}

/// 缓存键生成器
pub struct CacheKey;

impl CacheKey {
    pub fn provinces() -> String {
        "wilayah:provinces".to_string()
    }

    pub fn cities(province_id: i64) -> String {
        format!("wilayah:cities:{}", province_id)
    }

    pub fn districts(city_id: i64) -> String {
        format!("wilayah:districts:{}", city_id)
    }

    pub fn sub_districts(district_id: i64) -> String {
        format!("wilayah:sub_districts:{}", district_id)
    }

    pub fn region_path(sub_district_id: i64) -> String {
        format!("wilayah:path:{}", sub_district_id)
    }

    pub fn category_tree() -> String {
        "catalog:category_tree".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_generation() {
        assert_eq!(CacheKey::provinces(), "wilayah:provinces");
        assert_eq!(CacheKey::cities(31), "wilayah:cities:31");
        assert_eq!(CacheKey::region_path(3171010001), "wilayah:path:3171010001");
        assert_eq!(CacheKey::category_tree(), "catalog:category_tree");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config = RedisConfig {
            url: "not-a-redis-url".to_string(),
            pool_size: 1,
        };
        assert!(Cache::new(&config).is_err());
    }
}
