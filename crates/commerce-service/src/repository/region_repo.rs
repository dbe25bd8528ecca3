//! 行政区划仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::RegionRepositoryTrait;
use crate::error::Result;
use crate::models::region::RegionPathRow;
use crate::models::{City, District, Province, RegionPath, SubDistrict};

pub struct RegionRepository {
    pool: PgPool,
}

impl RegionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegionRepositoryTrait for RegionRepository {
    async fn list_provinces(&self) -> Result<Vec<Province>> {
        let provinces =
            sqlx::query_as::<_, Province>("SELECT id, name FROM provinces ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(provinces)
    }

    async fn province_exists(&self, id: i64) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM provinces WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn list_cities(&self, province_id: i64) -> Result<Vec<City>> {
        let cities = sqlx::query_as::<_, City>(
            "SELECT id, province_id, name FROM cities WHERE province_id = $1 ORDER BY name ASC",
        )
        .bind(province_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(cities)
    }

    async fn city_exists(&self, id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cities WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn list_districts(&self, city_id: i64) -> Result<Vec<District>> {
        let districts = sqlx::query_as::<_, District>(
            "SELECT id, city_id, name FROM districts WHERE city_id = $1 ORDER BY name ASC",
        )
        .bind(city_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(districts)
    }

    async fn district_exists(&self, id: i64) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM districts WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn list_sub_districts(&self, district_id: i64) -> Result<Vec<SubDistrict>> {
        let sub_districts = sqlx::query_as::<_, SubDistrict>(
            r#"
            SELECT id, district_id, name, postal_code
            FROM sub_districts
            WHERE district_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(district_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sub_districts)
    }

    async fn resolve_path(&self, sub_district_id: i64) -> Result<Option<RegionPath>> {
        let row = sqlx::query_as::<_, RegionPathRow>(
            r#"
            SELECT p.id AS province_id, p.name AS province_name,
                   c.id AS city_id, c.name AS city_name,
                   d.id AS district_id, d.name AS district_name,
                   s.id AS sub_district_id, s.name AS sub_district_name,
                   s.postal_code
            FROM sub_districts s
            JOIN districts d ON d.id = s.district_id
            JOIN cities c ON c.id = d.city_id
            JOIN provinces p ON p.id = c.province_id
            WHERE s.id = $1
            "#,
        )
        .bind(sub_district_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RegionPath::from))
    }
}
