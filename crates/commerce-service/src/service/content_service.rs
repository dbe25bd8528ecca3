//! 内容服务：横幅、常见问题、视频、博客文章

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{
    BannerRequest, BlogPostQuery, BlogPostRequest, FaqRequest, PageRequest, PageResponse,
    VideoRequest, trim_optional,
};
use crate::error::{CommerceError, Entity, Result};
use crate::models::{Banner, BlogPost, BlogPostInput, Faq, PublishStatus, Video};
use crate::repository::ContentRepositoryTrait;
use crate::service::slug::unique_slug;

fn check_banner_window(request: &BannerRequest) -> Result<()> {
    if let (Some(start), Some(end)) = (request.starts_at, request.ends_at)
        && end <= start
    {
        return Err(CommerceError::Validation(
            "Waktu selesai harus setelah waktu mulai".to_string(),
        ));
    }
    Ok(())
}

fn check_video_url(url: &str) -> Result<()> {
    let url = url.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));

    match rest {
        Some(host) if !host.is_empty() && !host.contains(char::is_whitespace) => Ok(()),
        _ => Err(CommerceError::Validation(
            "URL video harus diawali http:// atau https://".to_string(),
        )),
    }
}

pub struct ContentService<R: ContentRepositoryTrait> {
    repo: Arc<R>,
}

impl<R: ContentRepositoryTrait> ContentService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    // ==================== 横幅 ====================

    /// 前台横幅：已启用且在展示时间窗口内
    pub async fn visible_banners(&self) -> Result<Vec<Banner>> {
        self.repo.list_visible_banners(Utc::now()).await
    }

    pub async fn list_banners(&self) -> Result<Vec<Banner>> {
        self.repo.list_banners().await
    }

    pub async fn get_banner(&self, id: i64) -> Result<Banner> {
        self.repo
            .get_banner(id)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Banner, id))
    }

    #[instrument(skip(self, request))]
    pub async fn create_banner(&self, request: BannerRequest) -> Result<Banner> {
        request.validate()?;
        check_banner_window(&request)?;

        let banner = self.repo.create_banner(&request).await?;
        info!(banner_id = banner.id, "横幅已创建");
        Ok(banner)
    }

    #[instrument(skip(self, request))]
    pub async fn update_banner(&self, id: i64, request: BannerRequest) -> Result<Banner> {
        request.validate()?;
        check_banner_window(&request)?;

        self.repo
            .update_banner(id, &request)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Banner, id))
    }

    pub async fn delete_banner(&self, id: i64) -> Result<()> {
        if !self.repo.delete_banner(id).await? {
            return Err(CommerceError::not_found(Entity::Banner, id));
        }
        Ok(())
    }

    // ==================== 常见问题 ====================

    pub async fn list_faqs(&self, active_only: bool) -> Result<Vec<Faq>> {
        self.repo.list_faqs(active_only).await
    }

    pub async fn get_faq(&self, id: i64) -> Result<Faq> {
        self.repo
            .get_faq(id)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Faq, id))
    }

    pub async fn create_faq(&self, request: FaqRequest) -> Result<Faq> {
        request.validate()?;
        self.repo.create_faq(&request).await
    }

    pub async fn update_faq(&self, id: i64, request: FaqRequest) -> Result<Faq> {
        request.validate()?;
        self.repo
            .update_faq(id, &request)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Faq, id))
    }

    pub async fn delete_faq(&self, id: i64) -> Result<()> {
        if !self.repo.delete_faq(id).await? {
            return Err(CommerceError::not_found(Entity::Faq, id));
        }
        Ok(())
    }

    // ==================== 视频 ====================

    pub async fn list_videos(&self, active_only: bool) -> Result<Vec<Video>> {
        self.repo.list_videos(active_only).await
    }

    pub async fn get_video(&self, id: i64) -> Result<Video> {
        self.repo
            .get_video(id)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Video, id))
    }

    pub async fn create_video(&self, request: VideoRequest) -> Result<Video> {
        request.validate()?;
        check_video_url(&request.video_url)?;
        self.repo.create_video(&request).await
    }

    pub async fn update_video(&self, id: i64, request: VideoRequest) -> Result<Video> {
        request.validate()?;
        check_video_url(&request.video_url)?;
        self.repo
            .update_video(id, &request)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Video, id))
    }

    pub async fn delete_video(&self, id: i64) -> Result<()> {
        if !self.repo.delete_video(id).await? {
            return Err(CommerceError::not_found(Entity::Video, id));
        }
        Ok(())
    }

    // ==================== 文章 ====================

    /// 前台文章列表，只含已发布文章
    pub async fn published_posts(
        &self,
        keyword: Option<String>,
        page: PageRequest,
    ) -> Result<PageResponse<BlogPost>> {
        let query = BlogPostQuery {
            status: Some(PublishStatus::Published),
            keyword: trim_optional(keyword),
        };
        self.list_posts(query, page).await
    }

    pub async fn published_post(&self, slug: &str) -> Result<BlogPost> {
        self.repo
            .get_published_by_slug(slug)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::BlogPost, slug))
    }

    pub async fn list_posts(
        &self,
        query: BlogPostQuery,
        page: PageRequest,
    ) -> Result<PageResponse<BlogPost>> {
        let (items, total) = self.repo.list_posts(&query, page).await?;
        Ok(PageResponse::new(items, total, &page))
    }

    pub async fn get_post(&self, id: i64) -> Result<BlogPost> {
        self.repo
            .get_post(id)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::BlogPost, id))
    }

    /// 组装写入字段；发布时间只在首次发布时写入
    async fn post_input(
        &self,
        request: BlogPostRequest,
        current: Option<&BlogPost>,
    ) -> Result<BlogPostInput> {
        request.validate()?;

        let title = request.title.trim().to_string();
        let slug = match current {
            Some(post) if post.title == title => post.slug.clone(),
            _ => {
                let exclude_id = current.map(|p| p.id);
                unique_slug(&title, |candidate| async move {
                    self.repo.post_slug_exists(&candidate, exclude_id).await
                })
                .await?
            }
        };

        let published_at = match (request.status, current.and_then(|p| p.published_at)) {
            (_, Some(first)) => Some(first),
            (PublishStatus::Published, None) => Some(Utc::now()),
            (PublishStatus::Draft, None) => None,
        };

        Ok(BlogPostInput {
            title,
            slug,
            excerpt: trim_optional(request.excerpt),
            body: request.body,
            cover_url: trim_optional(request.cover_url),
            status: request.status,
            published_at,
        })
    }

    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn create_post(&self, admin_id: i64, request: BlogPostRequest) -> Result<BlogPost> {
        let input = self.post_input(request, None).await?;
        let post = self.repo.create_post(&input, admin_id).await?;
        info!(post_id = post.id, slug = %post.slug, "文章已创建");
        Ok(post)
    }

    #[instrument(skip(self, request))]
    pub async fn update_post(&self, id: i64, request: BlogPostRequest) -> Result<BlogPost> {
        let current = self.get_post(id).await?;
        let input = self.post_input(request, Some(&current)).await?;

        self.repo
            .update_post(id, &input)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::BlogPost, id))
    }

    pub async fn delete_post(&self, id: i64) -> Result<()> {
        if !self.repo.delete_post(id).await? {
            return Err(CommerceError::not_found(Entity::BlogPost, id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockContentRepositoryTrait;
    use chrono::{DateTime, Duration};

    fn post(published_at: Option<DateTime<Utc>>) -> BlogPost {
        let now = Utc::now();
        BlogPost {
            id: 3,
            title: "Tips Menyimpan Beras".to_string(),
            slug: "tips-menyimpan-beras".to_string(),
            excerpt: None,
            body: "Simpan di tempat kering.".to_string(),
            cover_url: None,
            status: if published_at.is_some() {
                PublishStatus::Published
            } else {
                PublishStatus::Draft
            },
            published_at,
            urutan: 1,
            author_admin_id: Some(1),
            created_at: now,
            updated_at: now,
        }
    }

    fn post_request(title: &str, status: PublishStatus) -> BlogPostRequest {
        BlogPostRequest {
            title: title.to_string(),
            excerpt: Some("  ".to_string()),
            body: "Simpan di tempat kering.".to_string(),
            cover_url: None,
            status,
        }
    }

    fn banner_request() -> BannerRequest {
        BannerRequest {
            title: "Promo Lebaran".to_string(),
            image_url: "https://cdn.example.id/banner.jpg".to_string(),
            link_url: None,
            starts_at: None,
            ends_at: None,
            is_active: None,
        }
    }

    #[test]
    fn test_video_url_scheme() {
        assert!(check_video_url("https://www.youtube.com/watch?v=abc").is_ok());
        assert!(check_video_url("http://cdn.example.id/v.mp4").is_ok());
        assert!(check_video_url("ftp://cdn.example.id/v.mp4").is_err());
        assert!(check_video_url("javascript:alert(1)").is_err());
        assert!(check_video_url("https://").is_err());
    }

    #[tokio::test]
    async fn test_banner_window_must_be_ordered() {
        let mut repo = MockContentRepositoryTrait::new();
        repo.expect_create_banner().never();

        let now = Utc::now();
        let mut request = banner_request();
        request.starts_at = Some(now);
        request.ends_at = Some(now - Duration::days(1));

        let err = ContentService::new(Arc::new(repo))
            .create_banner(request)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_missing_faq() {
        let mut repo = MockContentRepositoryTrait::new();
        repo.expect_update_faq().returning(|_, _| Ok(None));

        let err = ContentService::new(Arc::new(repo))
            .update_faq(
                9,
                FaqRequest {
                    question: "Minimal order?".to_string(),
                    answer: "5 karung".to_string(),
                    is_active: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "FAQ_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_publish_stamps_published_at() {
        let mut repo = MockContentRepositoryTrait::new();
        repo.expect_post_slug_exists().returning(|_, _| Ok(false));
        repo.expect_create_post()
            .withf(|input, admin| {
                input.slug == "tips-menyimpan-beras"
                    && input.published_at.is_some()
                    && input.excerpt.is_none()
                    && *admin == 1
            })
            .returning(|_, _| Ok(post(Some(Utc::now()))));

        ContentService::new(Arc::new(repo))
            .create_post(
                1,
                post_request("Tips Menyimpan Beras", PublishStatus::Published),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_draft_has_no_published_at() {
        let mut repo = MockContentRepositoryTrait::new();
        repo.expect_post_slug_exists().returning(|_, _| Ok(false));
        repo.expect_create_post()
            .withf(|input, _| input.published_at.is_none() && input.status == PublishStatus::Draft)
            .returning(|_, _| Ok(post(None)));

        ContentService::new(Arc::new(repo))
            .create_post(1, post_request("Tips Menyimpan Beras", PublishStatus::Draft))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_republish_keeps_first_published_at() {
        let first = Utc::now() - Duration::days(10);

        let mut repo = MockContentRepositoryTrait::new();
        repo.expect_get_post()
            .returning(move |_| Ok(Some(post(Some(first)))));
        repo.expect_post_slug_exists().never();
        repo.expect_update_post()
            .withf(move |_, input| {
                input.published_at == Some(first)
                    && input.status == PublishStatus::Draft
                    && input.slug == "tips-menyimpan-beras"
            })
            .returning(move |_, _| Ok(Some(post(Some(first)))));

        ContentService::new(Arc::new(repo))
            .update_post(3, post_request("Tips Menyimpan Beras", PublishStatus::Draft))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rename_regenerates_slug() {
        let mut repo = MockContentRepositoryTrait::new();
        repo.expect_get_post().returning(|_| Ok(Some(post(None))));
        repo.expect_post_slug_exists()
            .withf(|_, exclude| *exclude == Some(3))
            .returning(|slug, _| Ok(slug == "harga-beras-2026"));
        repo.expect_update_post()
            .withf(|_, input| input.slug == "harga-beras-2026-2")
            .returning(|_, _| Ok(Some(post(None))));

        ContentService::new(Arc::new(repo))
            .update_post(3, post_request("Harga Beras 2026", PublishStatus::Draft))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_published_post_unknown_slug() {
        let mut repo = MockContentRepositoryTrait::new();
        repo.expect_get_published_by_slug().returning(|_| Ok(None));

        let err = ContentService::new(Arc::new(repo))
            .published_post("draft-post")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "BLOG_POST_NOT_FOUND");
    }
}
