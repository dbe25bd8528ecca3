//! 请求与响应 DTO
//!
//! 请求体统一使用 validator 派生校验，字段名为 camelCase

pub mod address;
pub mod auth;
pub mod catalog;
pub mod common;
pub mod content;
pub mod coupon;
pub mod order;
pub mod review;

pub use address::{AddressRequest, AddressResponse};
pub use auth::{
    AccountFilter, AdminLoginRequest, BuyerLoginRequest, ChangePasswordRequest, ClientInfo,
    CreateAdminRequest, PrincipalInfo, RefreshTokenRequest, RegisterBuyerRequest, TokenResponse,
    UpdateBuyerProfileRequest,
};
pub use catalog::{
    AdjustStockRequest, CreateCategoryRequest, CreateProductRequest, MasterDataRequest,
    PriceTierInput, ProductQuery, UpdateCategoryRequest, UpdateProductRequest, WarehouseRequest,
};
pub use common::{
    COUPON_CODE_REGEX, PageRequest, PageResponse, SetActiveRequest, trim_optional,
};
pub use content::{BannerRequest, BlogPostQuery, BlogPostRequest, FaqRequest, VideoRequest};
pub use coupon::{
    CouponLine, CouponQuery, CouponQuote, CreateCouponRequest, QuoteCouponRequest,
    UpdateCouponRequest,
};
pub use order::{
    AdminOrderQuery, BuyerOrderQuery, CancelOrderRequest, OrderLineRequest, OrderPreview,
    PlaceOrderRequest, PricedLine, SubmitPaymentRequest, TransitionOrderRequest,
    VerifyPaymentRequest,
};
pub use review::{ModerateReviewRequest, ProductReviews, ReviewQuery, SubmitReviewRequest};
