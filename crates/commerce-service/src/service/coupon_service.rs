//! 优惠券服务
//!
//! 后台维护优惠券，下单与试算时按固定顺序校验并计算折扣。
//! 使用次数的扣减在订单事务中完成，见 OrderRepository。

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use grosir_shared::observability::metrics;
use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{
    COUPON_CODE_REGEX, CouponLine, CouponQuery, CouponQuote, CreateCouponRequest, PageRequest,
    PageResponse, UpdateCouponRequest, trim_optional,
};
use crate::error::{CommerceError, CouponRejection, Entity, Result, is_foreign_key_violation};
use crate::models::{Coupon, CouponInput, CouponView, DiscountType};
use crate::repository::{CategoryRepositoryTrait, CouponRepositoryTrait};

/// 校验优惠券并计算折扣
///
/// 顺序：过期 -> 启用 -> 开始时间 -> 总次数 -> 买家次数 -> 适用小计与最低消费 -> 折扣。
/// 百分比折扣向下取整到整数卢比并受封顶限制，所有折扣不超过适用小计。
pub fn evaluate_coupon(
    coupon: &Coupon,
    now: DateTime<Utc>,
    buyer_usage: i64,
    lines: &[CouponLine],
) -> std::result::Result<CouponQuote, CouponRejection> {
    if now >= coupon.expires_at {
        return Err(CouponRejection::Expired);
    }
    if !coupon.is_active {
        return Err(CouponRejection::Inactive);
    }
    if now < coupon.starts_at {
        return Err(CouponRejection::NotStarted);
    }
    if coupon.is_exhausted() {
        return Err(CouponRejection::Exhausted);
    }
    if coupon
        .per_buyer_limit
        .is_some_and(|limit| buyer_usage >= i64::from(limit))
    {
        return Err(CouponRejection::BuyerLimitReached);
    }

    let eligible_subtotal: i64 = lines
        .iter()
        .filter(|line| coupon.applies_to(line.category_id))
        .map(|line| line.line_total)
        .sum();

    if eligible_subtotal == 0 {
        return Err(CouponRejection::NoEligibleItems);
    }
    if eligible_subtotal < coupon.min_purchase {
        return Err(CouponRejection::MinimumNotMet {
            required: coupon.min_purchase,
            actual: eligible_subtotal,
        });
    }

    let discount = match coupon.discount_type {
        DiscountType::Percentage => {
            let raw = eligible_subtotal * coupon.discount_value / 100;
            coupon.max_discount.map_or(raw, |cap| raw.min(cap))
        }
        DiscountType::Fixed => coupon.discount_value,
    }
    .min(eligible_subtotal);

    Ok(CouponQuote {
        coupon_id: coupon.id,
        code: coupon.code.clone(),
        eligible_subtotal,
        discount,
    })
}

/// 规范化券码：去空白并转大写
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// 折扣规则的字段间校验
fn check_rules(input: &CouponInput) -> Result<()> {
    match input.discount_type {
        DiscountType::Percentage => {
            if !(1..=100).contains(&input.discount_value) {
                return Err(CommerceError::Validation(
                    "Diskon persentase harus 1-100".to_string(),
                ));
            }
            if input.max_discount.is_some_and(|cap| cap <= 0) {
                return Err(CommerceError::Validation(
                    "Maksimal diskon harus lebih dari 0".to_string(),
                ));
            }
        }
        DiscountType::Fixed => {
            if input.discount_value <= 0 {
                return Err(CommerceError::Validation(
                    "Nilai diskon harus lebih dari 0".to_string(),
                ));
            }
            if input.max_discount.is_some() {
                return Err(CommerceError::Validation(
                    "Diskon nominal tetap tidak mendukung maksimal diskon".to_string(),
                ));
            }
        }
    }

    if input.expires_at <= input.starts_at {
        return Err(CommerceError::Validation(
            "Waktu selesai harus setelah waktu mulai".to_string(),
        ));
    }

    if let (Some(total), Some(per_buyer)) = (input.usage_limit, input.per_buyer_limit)
        && per_buyer > total
    {
        return Err(CommerceError::Validation(
            "Batas per pembeli tidak boleh melebihi batas total".to_string(),
        ));
    }

    Ok(())
}

pub struct CouponService<CR, CatR>
where
    CR: CouponRepositoryTrait,
    CatR: CategoryRepositoryTrait,
{
    repo: Arc<CR>,
    category_repo: Arc<CatR>,
}

impl<CR, CatR> CouponService<CR, CatR>
where
    CR: CouponRepositoryTrait,
    CatR: CategoryRepositoryTrait,
{
    pub fn new(repo: Arc<CR>, category_repo: Arc<CatR>) -> Self {
        Self {
            repo,
            category_repo,
        }
    }

    pub async fn list(
        &self,
        query: CouponQuery,
        page: PageRequest,
    ) -> Result<PageResponse<CouponView>> {
        let now = Utc::now();
        let (items, total) = self.repo.list(&query, now, page).await?;
        Ok(PageResponse::new(items, total, &page).map(|c| CouponView::new(c, now)))
    }

    pub async fn get(&self, id: i64) -> Result<CouponView> {
        let coupon = self.get_coupon(id).await?;
        Ok(CouponView::new(coupon, Utc::now()))
    }

    async fn get_coupon(&self, id: i64) -> Result<Coupon> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Coupon, id))
    }

    /// 去重并校验适用分类存在
    async fn check_categories(&self, ids: Vec<i64>) -> Result<Vec<i64>> {
        let ids: BTreeSet<i64> = ids.into_iter().collect();
        for id in &ids {
            if self.category_repo.get(*id).await?.is_none() {
                return Err(CommerceError::not_found(Entity::Category, *id));
            }
        }
        Ok(ids.into_iter().collect())
    }

    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create(&self, request: CreateCouponRequest) -> Result<CouponView> {
        request.validate()?;

        let code = normalize_code(&request.code);
        if !COUPON_CODE_REGEX.is_match(&code) {
            return Err(CommerceError::Validation(
                "Kode kupon hanya boleh huruf, angka, garis bawah dan tanda hubung, panjang 3-32"
                    .to_string(),
            ));
        }
        if self.repo.code_exists(&code).await? {
            return Err(CommerceError::already_exists(Entity::Coupon, "code", code));
        }

        let input = CouponInput {
            code,
            name: request.name.trim().to_string(),
            description: trim_optional(request.description),
            discount_type: request.discount_type,
            discount_value: request.discount_value,
            max_discount: request.max_discount,
            min_purchase: request.min_purchase,
            usage_limit: request.usage_limit,
            per_buyer_limit: request.per_buyer_limit,
            starts_at: request.starts_at,
            expires_at: request.expires_at,
            is_active: request.is_active.unwrap_or(true),
            category_ids: self.check_categories(request.category_ids).await?,
        };
        check_rules(&input)?;

        let coupon = self.repo.create(&input).await?;
        info!(coupon_id = coupon.id, code = %coupon.code, "优惠券已创建");

        Ok(CouponView::new(coupon, Utc::now()))
    }

    /// 部分更新；已被使用的优惠券只能修改名称、说明、次数上限、有效期与启用状态
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: i64, request: UpdateCouponRequest) -> Result<CouponView> {
        request.validate()?;
        let current = self.get_coupon(id).await?;
        let mut input = CouponInput::from_coupon(&current);

        if let Some(name) = request.name {
            input.name = name.trim().to_string();
        }
        if let Some(description) = request.description {
            input.description = trim_optional(Some(description));
        }
        if let Some(discount_type) = request.discount_type {
            input.discount_type = discount_type;
        }
        if let Some(value) = request.discount_value {
            input.discount_value = value;
        }
        if request.max_discount.is_some() {
            input.max_discount = request.max_discount;
        }
        if input.discount_type == DiscountType::Fixed {
            input.max_discount = None;
        }
        if let Some(min_purchase) = request.min_purchase {
            input.min_purchase = min_purchase;
        }
        if request.usage_limit.is_some() {
            input.usage_limit = request.usage_limit;
        }
        if request.per_buyer_limit.is_some() {
            input.per_buyer_limit = request.per_buyer_limit;
        }
        if let Some(starts_at) = request.starts_at {
            input.starts_at = starts_at;
        }
        if let Some(expires_at) = request.expires_at {
            input.expires_at = expires_at;
        }
        if let Some(is_active) = request.is_active {
            input.is_active = is_active;
        }
        if let Some(category_ids) = request.category_ids {
            input.category_ids = self.check_categories(category_ids).await?;
        }

        if current.used_count > 0 {
            let rules_changed = input.discount_type != current.discount_type
                || input.discount_value != current.discount_value
                || input.max_discount != current.max_discount
                || input.min_purchase != current.min_purchase
                || input.category_ids != current.category_ids;
            if rules_changed {
                return Err(CommerceError::Validation(
                    "Kupon sudah dipakai, aturan diskon tidak dapat diubah".to_string(),
                ));
            }
            if input
                .usage_limit
                .is_some_and(|limit| limit < current.used_count)
            {
                return Err(CommerceError::Validation(format!(
                    "Batas total tidak boleh di bawah jumlah pemakaian {}",
                    current.used_count
                )));
            }
        }
        check_rules(&input)?;

        let coupon = self
            .repo
            .update(id, &input)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Coupon, id))?;

        Ok(CouponView::new(coupon, Utc::now()))
    }

    /// 已被使用或被订单引用的优惠券不能删除，只能停用
    ///
    /// 订单取消后 used_count 会回退，但订单仍保留 coupon_id
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        let coupon = self.get_coupon(id).await?;
        if coupon.used_count > 0 {
            return Err(CommerceError::in_use(
                Entity::Coupon,
                format!("sudah dipakai {} kali, nonaktifkan saja", coupon.used_count),
            ));
        }
        let orders = self.repo.count_orders(id).await?;
        if orders > 0 {
            return Err(CommerceError::in_use(
                Entity::Coupon,
                format!("masih dirujuk oleh {} pesanan, nonaktifkan saja", orders),
            ));
        }

        let deleted = self.repo.delete(id).await.map_err(|e| match e {
            CommerceError::Database(ref db) if is_foreign_key_violation(db) => {
                CommerceError::in_use(
                    Entity::Coupon,
                    "masih dirujuk oleh pesanan, nonaktifkan saja",
                )
            }
            other => other,
        })?;
        if !deleted {
            return Err(CommerceError::not_found(Entity::Coupon, id));
        }

        info!(coupon_id = id, code = %coupon.code, "优惠券已删除");
        Ok(())
    }

    /// 按券码试算；券码不存在返回 NotFound，不满足条件返回 CouponRejected
    #[instrument(skip(self, lines))]
    pub async fn quote(
        &self,
        code: &str,
        buyer_id: i64,
        lines: &[CouponLine],
    ) -> Result<CouponQuote> {
        let code = normalize_code(code);
        let coupon = self
            .repo
            .get_by_code(&code)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Coupon, &code))?;

        let buyer_usage = if coupon.per_buyer_limit.is_some() {
            self.repo.buyer_usage_count(coupon.id, buyer_id).await?
        } else {
            0
        };

        evaluate_coupon(&coupon, Utc::now(), buyer_usage, lines)
            .map_err(CommerceError::CouponRejected)
    }

    /// 试算并返回优惠券本身（下单时需要 per_buyer_limit）
    pub async fn quote_with_coupon(
        &self,
        code: &str,
        buyer_id: i64,
        lines: &[CouponLine],
    ) -> Result<(Coupon, CouponQuote)> {
        let quote = self.quote(code, buyer_id, lines).await?;
        let coupon = self.get_coupon(quote.coupon_id).await?;
        Ok((coupon, quote))
    }

    /// 停用一批已过期的优惠券
    pub async fn expire_due(&self, now: DateTime<Utc>, batch_size: i64) -> Result<u64> {
        let count = self.repo.deactivate_expired(now, batch_size).await?;
        if count > 0 {
            metrics::record_coupons_expired(count);
            info!(count, "已停用过期优惠券");
        }
        Ok(count)
    }
}
