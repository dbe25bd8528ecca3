//! 领域模型
//!
//! 数据库行结构与派生的业务视图

pub mod account;
pub mod address;
pub mod catalog;
pub mod content;
pub mod coupon;
pub mod enums;
pub mod order;
pub mod ordinal;
pub mod region;
pub mod review;

pub use account::{Admin, Buyer, Credential, Session};
pub use address::{Address, AddressInput, AddressSnapshot};
pub use catalog::{
    Category, CategoryInput, CategoryNode, MasterData, MasterDataInput, MasterDataKind,
    PriceTier, Product, ProductDetail, ProductFilter, ProductInput, Warehouse, WarehouseInput,
};
pub use content::{Banner, BlogPost, BlogPostInput, Faq, Video};
pub use coupon::{Coupon, CouponInput, CouponView};
pub use enums::{
    ActorKind, CouponStatus, DiscountType, OrderStatus, PaymentMethod, PaymentStatus,
    PrincipalKind, ProductSort, PublishStatus, ReviewStatus,
};
pub use order::{
    AppliedCoupon, NewOrder, NewOrderItem, Order, OrderDetail, OrderFilter, OrderItem,
    OrderStatusHistory, Payment, PaymentReview, PaymentReviewOutcome, StatusChange,
};
pub use ordinal::{
    MoveCommand, OrderedTable, OrdinalSlot, ReorderOutcome, ReorderPlan, plan_reorder,
};
pub use region::{City, District, Province, RegionNode, RegionPath, SubDistrict};
pub use review::{PublicReview, RatingSummary, Review};
