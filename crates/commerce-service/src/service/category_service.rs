//! 分类服务
//!
//! 分类最多两级。前台分类树缓存在 Redis，任何写操作后失效。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use grosir_shared::cache::{Cache, CacheKey};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::dto::{CreateCategoryRequest, UpdateCategoryRequest, trim_optional};
use crate::error::{CommerceError, Entity, Result, is_foreign_key_violation};
use crate::models::{Category, CategoryInput, CategoryNode};
use crate::repository::CategoryRepositoryTrait;
use crate::service::slug::unique_slug;

const TREE_TTL: Duration = Duration::from_secs(600);

/// 把扁平列表组装为两级树，保持输入顺序
///
/// 父分类不在列表中的子分类（例如父分类已停用）被丢弃
pub fn build_tree(categories: Vec<Category>) -> Vec<CategoryNode> {
    let (roots, children): (Vec<_>, Vec<_>) =
        categories.into_iter().partition(|c| c.parent_id.is_none());

    let mut by_parent: HashMap<i64, Vec<Category>> = HashMap::new();
    for child in children {
        if let Some(parent_id) = child.parent_id {
            by_parent.entry(parent_id).or_default().push(child);
        }
    }

    roots
        .into_iter()
        .map(|category| CategoryNode {
            children: by_parent.remove(&category.id).unwrap_or_default(),
            category,
        })
        .collect()
}

pub struct CategoryService<R: CategoryRepositoryTrait> {
    repo: Arc<R>,
    cache: Option<Arc<Cache>>,
}

impl<R: CategoryRepositoryTrait> CategoryService<R> {
    pub fn new(repo: Arc<R>, cache: Option<Arc<Cache>>) -> Self {
        Self { repo, cache }
    }

    /// 前台分类树（仅启用的分类）
    pub async fn public_tree(&self) -> Result<Vec<CategoryNode>> {
        let key = CacheKey::category_tree();

        if let Some(cache) = &self.cache {
            match cache.get::<Vec<CategoryNode>>(&key).await {
                Ok(Some(tree)) => return Ok(tree),
                Ok(None) => {}
                Err(e) => {
                    warn!(key = %key, error = %e, "Cache get failed, falling back to database")
                }
            }
        }

        let tree = build_tree(self.repo.list(true).await?);

        if let Some(cache) = &self.cache
            && let Err(e) = cache.set(&key, &tree, TREE_TTL).await
        {
            warn!(key = %key, error = %e, "Cache set failed");
        }

        Ok(tree)
    }

    /// 后台分类树（包含停用分类）
    pub async fn admin_tree(&self) -> Result<Vec<CategoryNode>> {
        Ok(build_tree(self.repo.list(false).await?))
    }

    pub async fn get(&self, id: i64) -> Result<Category> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Category, id))
    }

    /// 前台按 slug 查询，停用分类视为不存在
    pub async fn get_public_by_slug(&self, slug: &str) -> Result<Category> {
        self.repo
            .get_by_slug(slug)
            .await?
            .filter(|c| c.is_active)
            .ok_or_else(|| CommerceError::not_found(Entity::Category, slug))
    }

    /// 失效前台分类树缓存
    pub async fn invalidate_tree(&self) {
        if let Some(cache) = &self.cache
            && let Err(e) = cache.delete(&CacheKey::category_tree()).await
        {
            warn!(error = %e, "Failed to invalidate category tree cache");
        }
    }

    /// 父分类必须存在且为顶级分类
    async fn check_parent(&self, parent_id: i64) -> Result<()> {
        let parent = self
            .repo
            .get(parent_id)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Category, parent_id))?;

        if parent.parent_id.is_some() {
            return Err(CommerceError::Validation(
                "Kategori maksimal dua tingkat, induk harus kategori utama".to_string(),
            ));
        }
        Ok(())
    }

    async fn slug_for(&self, name: &str, exclude_id: Option<i64>) -> Result<String> {
        unique_slug(name, |candidate| async move {
            self.repo.slug_exists(&candidate, exclude_id).await
        })
        .await
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, request: CreateCategoryRequest) -> Result<Category> {
        request.validate()?;

        if let Some(parent_id) = request.parent_id {
            self.check_parent(parent_id).await?;
        }

        let name = request.name.trim().to_string();
        let input = CategoryInput {
            parent_id: request.parent_id,
            slug: self.slug_for(&name, None).await?,
            name,
            description: trim_optional(request.description),
            icon_url: trim_optional(request.icon_url),
            is_active: request.is_active.unwrap_or(true),
        };

        let category = self.repo.create(&input).await?;
        self.invalidate_tree().await;

        info!(category_id = category.id, slug = %category.slug, "分类已创建");
        Ok(category)
    }

    #[instrument(skip(self, request))]
    pub async fn update(&self, id: i64, request: UpdateCategoryRequest) -> Result<Category> {
        request.validate()?;
        let current = self.get(id).await?;

        let parent_id = match request.parent_id {
            None => current.parent_id,
            Some(None) => None,
            Some(Some(parent_id)) => {
                if parent_id == id {
                    return Err(CommerceError::Validation(
                        "Kategori tidak dapat menjadi induk dirinya sendiri".to_string(),
                    ));
                }
                self.check_parent(parent_id).await?;
                if self.repo.count_children(id).await? > 0 {
                    return Err(CommerceError::Validation(
                        "Kategori yang punya subkategori tidak dapat dipindah ke kategori lain"
                            .to_string(),
                    ));
                }
                Some(parent_id)
            }
        };

        let (name, slug) = match request.name.map(|n| n.trim().to_string()) {
            Some(name) if name != current.name => {
                let slug = self.slug_for(&name, Some(id)).await?;
                (name, slug)
            }
            _ => (current.name, current.slug),
        };

        let input = CategoryInput {
            parent_id,
            name,
            slug,
            description: match request.description {
                Some(d) => trim_optional(Some(d)),
                None => current.description,
            },
            icon_url: match request.icon_url {
                Some(u) => trim_optional(Some(u)),
                None => current.icon_url,
            },
            is_active: request.is_active.unwrap_or(current.is_active),
        };

        let category = self
            .repo
            .update(id, &input)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Category, id))?;
        self.invalidate_tree().await;

        Ok(category)
    }

    /// 删除分类；仍有子分类、商品或优惠券范围引用时拒绝
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.get(id).await?;

        let children = self.repo.count_children(id).await?;
        if children > 0 {
            return Err(CommerceError::in_use(
                Entity::Category,
                format!("masih memiliki {} subkategori", children),
            ));
        }
        let products = self.repo.count_products(id).await?;
        if products > 0 {
            return Err(CommerceError::in_use(
                Entity::Category,
                format!("masih memiliki {} produk", products),
            ));
        }
        let coupons = self.repo.count_coupons(id).await?;
        if coupons > 0 {
            return Err(CommerceError::in_use(
                Entity::Category,
                format!("masih menjadi cakupan {} kupon", coupons),
            ));
        }

        let deleted = self.repo.delete(id).await.map_err(|e| match e {
            CommerceError::Database(ref db) if is_foreign_key_violation(db) => {
                CommerceError::in_use(Entity::Category, "masih dirujuk oleh data lain")
            }
            other => other,
        })?;
        if !deleted {
            return Err(CommerceError::not_found(Entity::Category, id));
        }
        self.invalidate_tree().await;

        info!(category_id = id, "分类已删除");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockCategoryRepositoryTrait;
    use chrono::Utc;

    fn category(id: i64, parent_id: Option<i64>, name: &str) -> Category {
        let now = Utc::now();
        Category {
            id,
            parent_id,
            name: name.to_string(),
            slug: crate::service::slug::slugify(name),
            description: None,
            icon_url: None,
            urutan: id as i32,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn service(repo: MockCategoryRepositoryTrait) -> CategoryService<MockCategoryRepositoryTrait> {
        CategoryService::new(Arc::new(repo), None)
    }

    #[test]
    fn test_build_tree() {
        let tree = build_tree(vec![
            category(1, None, "Sembako"),
            category(2, Some(1), "Beras"),
            category(3, None, "Minuman"),
            category(4, Some(1), "Minyak Goreng"),
            category(5, Some(99), "Yatim"),
        ]);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].category.name, "Sembako");
        let children: Vec<_> = tree[0].children.iter().map(|c| c.id).collect();
        assert_eq!(children, vec![2, 4]);
        assert!(tree[1].children.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_third_level() {
        let mut repo = MockCategoryRepositoryTrait::new();
        repo.expect_get()
            .returning(|id| Ok(Some(category(id, Some(1), "Beras"))));
        repo.expect_create().never();

        let err = service(repo)
            .create(CreateCategoryRequest {
                name: "Beras Merah".to_string(),
                parent_id: Some(2),
                description: None,
                icon_url: None,
                is_active: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_generates_unique_slug() {
        let mut repo = MockCategoryRepositoryTrait::new();
        repo.expect_slug_exists()
            .returning(|slug, _| Ok(slug == "sembako"));
        repo.expect_create()
            .withf(|input| input.slug == "sembako-2" && input.is_active)
            .returning(|input| {
                let mut c = category(7, None, &input.name);
                c.slug = input.slug.clone();
                Ok(c)
            });

        let created = service(repo)
            .create(CreateCategoryRequest {
                name: " Sembako ".to_string(),
                parent_id: None,
                description: None,
                icon_url: None,
                is_active: None,
            })
            .await
            .unwrap();

        assert_eq!(created.slug, "sembako-2");
    }

    #[tokio::test]
    async fn test_delete_refused_while_in_use() {
        let mut repo = MockCategoryRepositoryTrait::new();
        repo.expect_get()
            .returning(|id| Ok(Some(category(id, None, "Sembako"))));
        repo.expect_count_children().returning(|_| Ok(0));
        repo.expect_count_products().returning(|_| Ok(12));
        repo.expect_delete().never();

        let err = service(repo).delete(1).await.unwrap_err();
        assert_eq!(err.error_code(), "CATEGORY_IN_USE");
    }

    #[tokio::test]
    async fn test_delete_refused_while_in_coupon_scope() {
        let mut repo = MockCategoryRepositoryTrait::new();
        repo.expect_get()
            .returning(|id| Ok(Some(category(id, None, "Sembako"))));
        repo.expect_count_children().returning(|_| Ok(0));
        repo.expect_count_products().returning(|_| Ok(0));
        repo.expect_count_coupons().returning(|_| Ok(2));
        repo.expect_delete().never();

        let err = service(repo).delete(1).await.unwrap_err();
        assert_eq!(err.error_code(), "CATEGORY_IN_USE");
    }

    #[tokio::test]
    async fn test_update_keeps_slug_when_name_unchanged() {
        let mut repo = MockCategoryRepositoryTrait::new();
        repo.expect_get()
            .returning(|id| Ok(Some(category(id, None, "Sembako"))));
        repo.expect_slug_exists().never();
        repo.expect_update()
            .withf(|_, input| input.slug == "sembako" && !input.is_active)
            .returning(|id, input| {
                let mut c = category(id, None, &input.name);
                c.is_active = input.is_active;
                Ok(Some(c))
            });

        let updated = service(repo)
            .update(
                1,
                UpdateCategoryRequest {
                    name: Some("Sembako".to_string()),
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!updated.is_active);
    }
}
