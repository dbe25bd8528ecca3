//! 行政区划查询服务
//!
//! 区划数据只读且变化极少，按层级缓存到 Redis，TTL 1 小时。
//! 缓存不可用时直接查库。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use grosir_shared::cache::{Cache, CacheKey};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{instrument, warn};

use crate::error::{CommerceError, Entity, Result};
use crate::models::{City, District, Province, RegionPath, SubDistrict};
use crate::repository::RegionRepositoryTrait;

const REGION_TTL: Duration = Duration::from_secs(3600);

pub struct RegionService<R: RegionRepositoryTrait> {
    repo: Arc<R>,
    cache: Option<Arc<Cache>>,
}

impl<R: RegionRepositoryTrait> RegionService<R> {
    pub fn new(repo: Arc<R>, cache: Option<Arc<Cache>>) -> Self {
        Self { repo, cache }
    }

    async fn get_cached_or_fetch<T, F, Fut>(&self, key: &str, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let Some(cache) = &self.cache else {
            return fetch().await;
        };

        match cache.get::<T>(key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => {
                warn!(key = %key, error = %e, "Cache get failed, falling back to database");
            }
        }

        let data = fetch().await?;

        if let Err(e) = cache.set(key, &data, REGION_TTL).await {
            warn!(key = %key, error = %e, "Cache set failed");
        }

        Ok(data)
    }

    pub async fn list_provinces(&self) -> Result<Vec<Province>> {
        self.get_cached_or_fetch(&CacheKey::provinces(), || self.repo.list_provinces())
            .await
    }

    /// 省份不存在时返回 NotFound，而不是空列表
    #[instrument(skip(self))]
    pub async fn list_cities(&self, province_id: i64) -> Result<Vec<City>> {
        self.get_cached_or_fetch(&CacheKey::cities(province_id), || async move {
            let cities = self.repo.list_cities(province_id).await?;
            if cities.is_empty() && !self.repo.province_exists(province_id).await? {
                return Err(CommerceError::not_found(Entity::Province, province_id));
            }
            Ok(cities)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn list_districts(&self, city_id: i64) -> Result<Vec<District>> {
        self.get_cached_or_fetch(&CacheKey::districts(city_id), || async move {
            let districts = self.repo.list_districts(city_id).await?;
            if districts.is_empty() && !self.repo.city_exists(city_id).await? {
                return Err(CommerceError::not_found(Entity::City, city_id));
            }
            Ok(districts)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn list_sub_districts(&self, district_id: i64) -> Result<Vec<SubDistrict>> {
        self.get_cached_or_fetch(&CacheKey::sub_districts(district_id), || async move {
            let subs = self.repo.list_sub_districts(district_id).await?;
            if subs.is_empty() && !self.repo.district_exists(district_id).await? {
                return Err(CommerceError::not_found(Entity::District, district_id));
            }
            Ok(subs)
        })
        .await
    }

    /// 街道到省份的完整路径
    pub async fn resolve_path(&self, sub_district_id: i64) -> Result<RegionPath> {
        self.get_cached_or_fetch(&CacheKey::region_path(sub_district_id), || async move {
            self.repo
                .resolve_path(sub_district_id)
                .await?
                .ok_or_else(|| CommerceError::not_found(Entity::SubDistrict, sub_district_id))
        })
        .await
    }
}
