//! 评价服务
//!
//! 买家只能评价自己已完成订单中的商品，每个订单中的每个商品限评一次。
//! 评价需后台审核通过后才在前台展示。

use std::sync::Arc;

use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{
    ModerateReviewRequest, PageRequest, PageResponse, ProductReviews, ReviewQuery,
    SubmitReviewRequest, trim_optional,
};
use crate::error::{CommerceError, Entity, Result, is_unique_violation};
use crate::models::{OrderStatus, RatingSummary, Review, ReviewStatus};
use crate::repository::{ProductRepositoryTrait, ReviewRepositoryTrait};

pub struct ReviewService<RR: ReviewRepositoryTrait, PR: ProductRepositoryTrait> {
    repo: Arc<RR>,
    product_repo: Arc<PR>,
}

impl<RR: ReviewRepositoryTrait, PR: ProductRepositoryTrait> ReviewService<RR, PR> {
    pub fn new(repo: Arc<RR>, product_repo: Arc<PR>) -> Self {
        Self { repo, product_repo }
    }

    #[instrument(
        skip(self, request),
        fields(product_id = request.product_id, order_id = request.order_id)
    )]
    pub async fn submit(&self, buyer_id: i64, request: SubmitReviewRequest) -> Result<Review> {
        request.validate()?;

        let status = self
            .repo
            .purchase_status(buyer_id, request.order_id, request.product_id)
            .await?
            .ok_or_else(|| {
                CommerceError::Validation(
                    "Ulasan hanya untuk produk yang Anda beli di pesanan Anda".to_string(),
                )
            })?;

        if status != OrderStatus::Completed {
            return Err(CommerceError::Validation(
                "Ulasan hanya dapat diberikan setelah pesanan selesai".to_string(),
            ));
        }

        if self
            .repo
            .exists(buyer_id, request.product_id, request.order_id)
            .await?
        {
            return Err(CommerceError::already_exists(
                Entity::Review,
                "order_id",
                request.order_id,
            ));
        }

        let review = self.repo.create(buyer_id, &request).await.map_err(|e| match e {
            CommerceError::Database(ref db) if is_unique_violation(db) => {
                CommerceError::already_exists(Entity::Review, "order_id", request.order_id)
            }
            other => other,
        })?;

        info!(review_id = review.id, rating = review.rating, "评价已提交，等待审核");
        Ok(review)
    }

    pub async fn list_mine(
        &self,
        buyer_id: i64,
        page: PageRequest,
    ) -> Result<PageResponse<Review>> {
        let (items, total) = self.repo.list_by_buyer(buyer_id, page).await?;
        Ok(PageResponse::new(items, total, &page))
    }

    /// 买家撤回尚未审核的评价
    #[instrument(skip(self))]
    pub async fn delete_own(&self, buyer_id: i64, id: i64) -> Result<()> {
        if self.repo.delete_pending(buyer_id, id).await? {
            return Ok(());
        }

        match self.repo.get(id).await? {
            Some(review) if review.buyer_id == buyer_id => Err(CommerceError::Validation(
                "Ulasan yang sudah dimoderasi tidak dapat dihapus".to_string(),
            )),
            _ => Err(CommerceError::not_found(Entity::Review, id)),
        }
    }

    /// 前台商品评价：仅展示已通过的评价
    pub async fn product_reviews(
        &self,
        product_id: i64,
        page: PageRequest,
    ) -> Result<ProductReviews> {
        self.product_repo
            .get(product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| CommerceError::not_found(Entity::Product, product_id))?;

        let (counts, (items, total)) = tokio::try_join!(
            self.repo.rating_counts(product_id),
            self.repo.list_approved(product_id, page),
        )?;

        Ok(ProductReviews {
            summary: RatingSummary::from_counts(&counts),
            reviews: PageResponse::new(items, total, &page),
        })
    }

    // ==================== 后台 ====================

    pub async fn list_admin(
        &self,
        query: ReviewQuery,
        page: PageRequest,
    ) -> Result<PageResponse<Review>> {
        let (items, total) = self.repo.list(&query, page).await?;
        Ok(PageResponse::new(items, total, &page))
    }

    pub async fn get(&self, id: i64) -> Result<Review> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Review, id))
    }

    /// 审核评价，驳回必须填写原因
    #[instrument(skip(self, request), fields(approve = request.approve))]
    pub async fn moderate(
        &self,
        admin_id: i64,
        id: i64,
        request: ModerateReviewRequest,
    ) -> Result<Review> {
        request.validate()?;

        let reason = trim_optional(request.reason);
        if !request.approve && reason.is_none() {
            return Err(CommerceError::Validation(
                "Alasan wajib diisi saat menolak ulasan".to_string(),
            ));
        }

        let current = self.get(id).await?;
        if current.status != ReviewStatus::Pending {
            return Err(CommerceError::Validation("Ulasan ini sudah dimoderasi".to_string()));
        }

        let status = if request.approve {
            ReviewStatus::Approved
        } else {
            ReviewStatus::Rejected
        };
        let reason = if request.approve { None } else { reason };

        let review = self
            .repo
            .moderate(id, status, admin_id, reason)
            .await?
            .ok_or(CommerceError::ConcurrencyConflict)?;

        info!(review_id = id, admin_id, status = ?review.status, "评价已审核");
        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PublicReview;
    use crate::repository::{MockProductRepositoryTrait, MockReviewRepositoryTrait};
    use crate::service::product_service::fixtures::product;
    use chrono::Utc;

    fn review(status: ReviewStatus) -> Review {
        let now = Utc::now();
        Review {
            id: 7,
            buyer_id: 5,
            product_id: 1,
            order_id: 100,
            rating: 4,
            comment: Some("Beras pulen".to_string()),
            status,
            rejection_reason: None,
            moderated_by: None,
            moderated_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn submit_request() -> SubmitReviewRequest {
        SubmitReviewRequest {
            product_id: 1,
            order_id: 100,
            rating: 4,
            comment: Some("Beras pulen".to_string()),
        }
    }

    fn service(
        repo: MockReviewRepositoryTrait,
    ) -> ReviewService<MockReviewRepositoryTrait, MockProductRepositoryTrait> {
        ReviewService::new(Arc::new(repo), Arc::new(MockProductRepositoryTrait::new()))
    }

    #[tokio::test]
    async fn test_submit_requires_completed_order() {
        let mut repo = MockReviewRepositoryTrait::new();
        repo.expect_purchase_status()
            .returning(|_, _, _| Ok(Some(OrderStatus::Shipped)));
        repo.expect_create().never();

        let err = service(repo).submit(5, submit_request()).await.unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_submit_requires_purchase() {
        let mut repo = MockReviewRepositoryTrait::new();
        repo.expect_purchase_status().returning(|_, _, _| Ok(None));

        let err = service(repo).submit(5, submit_request()).await.unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_submit_rejects_duplicate() {
        let mut repo = MockReviewRepositoryTrait::new();
        repo.expect_purchase_status()
            .returning(|_, _, _| Ok(Some(OrderStatus::Completed)));
        repo.expect_exists().returning(|_, _, _| Ok(true));
        repo.expect_create().never();

        let err = service(repo).submit(5, submit_request()).await.unwrap_err();
        assert_eq!(err.error_code(), "REVIEW_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn test_submit_rejects_rating_out_of_range() {
        let mut request = submit_request();
        request.rating = 6;

        let err = service(MockReviewRepositoryTrait::new())
            .submit(5, request)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_submit_creates_pending_review() {
        let mut repo = MockReviewRepositoryTrait::new();
        repo.expect_purchase_status()
            .withf(|buyer, order, product| *buyer == 5 && *order == 100 && *product == 1)
            .returning(|_, _, _| Ok(Some(OrderStatus::Completed)));
        repo.expect_exists().returning(|_, _, _| Ok(false));
        repo.expect_create()
            .times(1)
            .returning(|_, _| Ok(review(ReviewStatus::Pending)));

        let review = service(repo).submit(5, submit_request()).await.unwrap();
        assert_eq!(review.status, ReviewStatus::Pending);
    }

    #[tokio::test]
    async fn test_reject_requires_reason() {
        let mut repo = MockReviewRepositoryTrait::new();
        repo.expect_moderate().never();

        let err = service(repo)
            .moderate(
                1,
                7,
                ModerateReviewRequest {
                    approve: false,
                    reason: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_moderate_only_pending() {
        let mut repo = MockReviewRepositoryTrait::new();
        repo.expect_get()
            .returning(|_| Ok(Some(review(ReviewStatus::Approved))));
        repo.expect_moderate().never();

        let err = service(repo)
            .moderate(
                1,
                7,
                ModerateReviewRequest {
                    approve: true,
                    reason: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_approve_drops_reason() {
        let mut repo = MockReviewRepositoryTrait::new();
        repo.expect_get()
            .returning(|_| Ok(Some(review(ReviewStatus::Pending))));
        repo.expect_moderate()
            .withf(|_, status, admin, reason| {
                *status == ReviewStatus::Approved && *admin == 1 && reason.is_none()
            })
            .returning(|_, status, _, _| Ok(Some(review(status))));

        let review = service(repo)
            .moderate(
                1,
                7,
                ModerateReviewRequest {
                    approve: true,
                    reason: Some("ok".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(review.status, ReviewStatus::Approved);
    }

    #[tokio::test]
    async fn test_delete_moderated_review_refused() {
        let mut repo = MockReviewRepositoryTrait::new();
        repo.expect_delete_pending().returning(|_, _| Ok(false));
        repo.expect_get()
            .returning(|_| Ok(Some(review(ReviewStatus::Approved))));

        let err = service(repo).delete_own(5, 7).await.unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_foreign_review_not_found() {
        let mut repo = MockReviewRepositoryTrait::new();
        repo.expect_delete_pending().returning(|_, _| Ok(false));
        repo.expect_get()
            .returning(|_| Ok(Some(review(ReviewStatus::Pending))));

        let err = service(repo).delete_own(6, 7).await.unwrap_err();
        assert_eq!(err.error_code(), "REVIEW_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_product_reviews_summary() {
        let mut repo = MockReviewRepositoryTrait::new();
        repo.expect_rating_counts()
            .returning(|_| Ok(vec![(5, 3), (4, 1)]));
        repo.expect_list_approved().returning(|_, _| {
            Ok((
                vec![PublicReview {
                    id: 7,
                    buyer_name: "Budi".to_string(),
                    rating: 5,
                    comment: None,
                    created_at: Utc::now(),
                }],
                4,
            ))
        });

        let mut products = MockProductRepositoryTrait::new();
        products.expect_get().returning(|id| Ok(Some(product(id))));

        let result = ReviewService::new(Arc::new(repo), Arc::new(products))
            .product_reviews(1, PageRequest::default())
            .await
            .unwrap();

        assert_eq!(result.summary.count, 4);
        assert_eq!(result.summary.average, 4.8);
        assert_eq!(result.reviews.total, 4);
    }

    #[tokio::test]
    async fn test_product_reviews_hidden_for_inactive_product() {
        let mut products = MockProductRepositoryTrait::new();
        products.expect_get().returning(|id| {
            let mut p = product(id);
            p.is_active = false;
            Ok(Some(p))
        });

        let err = ReviewService::new(Arc::new(MockReviewRepositoryTrait::new()), Arc::new(products))
            .product_reviews(1, PageRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "PRODUCT_NOT_FOUND");
    }
}
