//! 内容仓储：横幅、常见问题、视频、文章
//!
//! 新建记录的 urutan 追加到表尾

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::traits::ContentRepositoryTrait;
use crate::dto::{BannerRequest, BlogPostQuery, FaqRequest, PageRequest, VideoRequest};
use crate::error::Result;
use crate::models::{Banner, BlogPost, BlogPostInput, Faq, PublishStatus, Video};

const BANNER_COLUMNS: &str =
    "id, title, image_url, link_url, starts_at, ends_at, urutan, is_active, created_at, updated_at";

const FAQ_COLUMNS: &str = "id, question, answer, urutan, is_active, created_at, updated_at";

const VIDEO_COLUMNS: &str = "id, title, video_url, thumbnail_url, description, urutan, \
     is_active, created_at, updated_at";

const POST_COLUMNS: &str = "id, title, slug, excerpt, body, cover_url, status, published_at, \
     urutan, author_admin_id, created_at, updated_at";

pub struct ContentRepository {
    pool: PgPool,
}

impl ContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn delete_from(&self, table: &'static str, id: i64) -> Result<bool> {
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl ContentRepositoryTrait for ContentRepository {
    // ==================== 横幅 ====================

    async fn list_banners(&self) -> Result<Vec<Banner>> {
        let sql = format!("SELECT {BANNER_COLUMNS} FROM banners ORDER BY urutan ASC, id ASC");
        let banners = sqlx::query_as::<_, Banner>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(banners)
    }

    async fn list_visible_banners(&self, now: DateTime<Utc>) -> Result<Vec<Banner>> {
        let sql = format!(
            r#"
            SELECT {BANNER_COLUMNS} FROM banners
            WHERE is_active = true
              AND (starts_at IS NULL OR starts_at <= $1)
              AND (ends_at IS NULL OR ends_at > $1)
            ORDER BY urutan ASC, id ASC
            "#
        );
        let banners = sqlx::query_as::<_, Banner>(&sql)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;
        Ok(banners)
    }

    async fn get_banner(&self, id: i64) -> Result<Option<Banner>> {
        let sql = format!("SELECT {BANNER_COLUMNS} FROM banners WHERE id = $1");
        let banner = sqlx::query_as::<_, Banner>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(banner)
    }

    async fn create_banner(&self, request: &BannerRequest) -> Result<Banner> {
        let sql = format!(
            r#"
            INSERT INTO banners (title, image_url, link_url, starts_at, ends_at, is_active, urutan)
            VALUES ($1, $2, $3, $4, $5, $6, (SELECT COALESCE(MAX(urutan), 0) + 1 FROM banners))
            RETURNING {BANNER_COLUMNS}
            "#
        );
        let banner = sqlx::query_as::<_, Banner>(&sql)
            .bind(request.title.trim())
            .bind(&request.image_url)
            .bind(&request.link_url)
            .bind(request.starts_at)
            .bind(request.ends_at)
            .bind(request.is_active.unwrap_or(true))
            .fetch_one(&self.pool)
            .await?;
        Ok(banner)
    }

    async fn update_banner(&self, id: i64, request: &BannerRequest) -> Result<Option<Banner>> {
        let sql = format!(
            r#"
            UPDATE banners
            SET title = $2, image_url = $3, link_url = $4, starts_at = $5, ends_at = $6,
                is_active = COALESCE($7, is_active), updated_at = NOW()
            WHERE id = $1
            RETURNING {BANNER_COLUMNS}
            "#
        );
        let banner = sqlx::query_as::<_, Banner>(&sql)
            .bind(id)
            .bind(request.title.trim())
            .bind(&request.image_url)
            .bind(&request.link_url)
            .bind(request.starts_at)
            .bind(request.ends_at)
            .bind(request.is_active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(banner)
    }

    async fn delete_banner(&self, id: i64) -> Result<bool> {
        self.delete_from("banners", id).await
    }

    // ==================== 常见问题 ====================

    async fn list_faqs(&self, active_only: bool) -> Result<Vec<Faq>> {
        let sql = format!(
            "SELECT {FAQ_COLUMNS} FROM faqs WHERE ($1 = false OR is_active = true) \
             ORDER BY urutan ASC, id ASC"
        );
        let faqs = sqlx::query_as::<_, Faq>(&sql)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;
        Ok(faqs)
    }

    async fn get_faq(&self, id: i64) -> Result<Option<Faq>> {
        let sql = format!("SELECT {FAQ_COLUMNS} FROM faqs WHERE id = $1");
        let faq = sqlx::query_as::<_, Faq>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(faq)
    }

    async fn create_faq(&self, request: &FaqRequest) -> Result<Faq> {
        let sql = format!(
            r#"
            INSERT INTO faqs (question, answer, is_active, urutan)
            VALUES ($1, $2, $3, (SELECT COALESCE(MAX(urutan), 0) + 1 FROM faqs))
            RETURNING {FAQ_COLUMNS}
            "#
        );
        let faq = sqlx::query_as::<_, Faq>(&sql)
            .bind(request.question.trim())
            .bind(&request.answer)
            .bind(request.is_active.unwrap_or(true))
            .fetch_one(&self.pool)
            .await?;
        Ok(faq)
    }

    async fn update_faq(&self, id: i64, request: &FaqRequest) -> Result<Option<Faq>> {
        let sql = format!(
            r#"
            UPDATE faqs
            SET question = $2, answer = $3, is_active = COALESCE($4, is_active), updated_at = NOW()
            WHERE id = $1
            RETURNING {FAQ_COLUMNS}
            "#
        );
        let faq = sqlx::query_as::<_, Faq>(&sql)
            .bind(id)
            .bind(request.question.trim())
            .bind(&request.answer)
            .bind(request.is_active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(faq)
    }

    async fn delete_faq(&self, id: i64) -> Result<bool> {
        self.delete_from("faqs", id).await
    }

    // ==================== 视频 ====================

    async fn list_videos(&self, active_only: bool) -> Result<Vec<Video>> {
        let sql = format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE ($1 = false OR is_active = true) \
             ORDER BY urutan ASC, id ASC"
        );
        let videos = sqlx::query_as::<_, Video>(&sql)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;
        Ok(videos)
    }

    async fn get_video(&self, id: i64) -> Result<Option<Video>> {
        let sql = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1");
        let video = sqlx::query_as::<_, Video>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(video)
    }

    async fn create_video(&self, request: &VideoRequest) -> Result<Video> {
        let sql = format!(
            r#"
            INSERT INTO videos (title, video_url, thumbnail_url, description, is_active, urutan)
            VALUES ($1, $2, $3, $4, $5, (SELECT COALESCE(MAX(urutan), 0) + 1 FROM videos))
            RETURNING {VIDEO_COLUMNS}
            "#
        );
        let video = sqlx::query_as::<_, Video>(&sql)
            .bind(request.title.trim())
            .bind(request.video_url.trim())
            .bind(&request.thumbnail_url)
            .bind(&request.description)
            .bind(request.is_active.unwrap_or(true))
            .fetch_one(&self.pool)
            .await?;
        Ok(video)
    }

    async fn update_video(&self, id: i64, request: &VideoRequest) -> Result<Option<Video>> {
        let sql = format!(
            r#"
            UPDATE videos
            SET title = $2, video_url = $3, thumbnail_url = $4, description = $5,
                is_active = COALESCE($6, is_active), updated_at = NOW()
            WHERE id = $1
            RETURNING {VIDEO_COLUMNS}
            "#
        );
        let video = sqlx::query_as::<_, Video>(&sql)
            .bind(id)
            .bind(request.title.trim())
            .bind(request.video_url.trim())
            .bind(&request.thumbnail_url)
            .bind(&request.description)
            .bind(request.is_active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(video)
    }

    async fn delete_video(&self, id: i64) -> Result<bool> {
        self.delete_from("videos", id).await
    }

    // ==================== 文章 ====================

    async fn list_posts(
        &self,
        query: &BlogPostQuery,
        page: PageRequest,
    ) -> Result<(Vec<BlogPost>, i64)> {
        let keyword = query
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| format!("%{}%", k));

        let condition = r#"
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR title ILIKE $2 OR excerpt ILIKE $2)
        "#;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM blog_posts {condition}"))
                .bind(query.status)
                .bind(&keyword)
                .fetch_one(&self.pool)
                .await?;

        // 已发布文章按发布时间倒序，草稿排在最后
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM blog_posts {condition} \
             ORDER BY published_at DESC NULLS LAST, id DESC LIMIT $3 OFFSET $4"
        );
        let posts = sqlx::query_as::<_, BlogPost>(&sql)
            .bind(query.status)
            .bind(&keyword)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((posts, total))
    }

    async fn get_post(&self, id: i64) -> Result<Option<BlogPost>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM blog_posts WHERE id = $1");
        let post = sqlx::query_as::<_, BlogPost>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn get_published_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM blog_posts WHERE slug = $1 AND status = $2");
        let post = sqlx::query_as::<_, BlogPost>(&sql)
            .bind(slug)
            .bind(PublishStatus::Published)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn post_slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM blog_posts WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_post(&self, input: &BlogPostInput, author_admin_id: i64) -> Result<BlogPost> {
        let sql = format!(
            r#"
            INSERT INTO blog_posts (title, slug, excerpt, body, cover_url, status, published_at,
                                    author_admin_id, urutan)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8,
                    (SELECT COALESCE(MAX(urutan), 0) + 1 FROM blog_posts))
            RETURNING {POST_COLUMNS}
            "#
        );
        let post = sqlx::query_as::<_, BlogPost>(&sql)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.excerpt)
            .bind(&input.body)
            .bind(&input.cover_url)
            .bind(input.status)
            .bind(input.published_at)
            .bind(author_admin_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(post)
    }

    async fn update_post(&self, id: i64, input: &BlogPostInput) -> Result<Option<BlogPost>> {
        let sql = format!(
            r#"
            UPDATE blog_posts
            SET title = $2, slug = $3, excerpt = $4, body = $5, cover_url = $6,
                status = $7, published_at = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        );
        let post = sqlx::query_as::<_, BlogPost>(&sql)
            .bind(id)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.excerpt)
            .bind(&input.body)
            .bind(&input.cover_url)
            .bind(input.status)
            .bind(input.published_at)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn delete_post(&self, id: i64) -> Result<bool> {
        self.delete_from("blog_posts", id).await
    }
}
