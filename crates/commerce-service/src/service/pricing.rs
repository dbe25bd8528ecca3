//! 批发计价
//!
//! 阶梯价校验、按数量取单价与按重量计算运费

use crate::error::{CommerceError, Result};
use crate::models::PriceTier;

/// 校验阶梯价
///
/// 要求：起订量严格递增且不低于商品最小起订量，单价严格递减且都低于基础价
pub fn validate_price_tiers(
    base_price: i64,
    min_order_qty: i32,
    tiers: &[PriceTier],
) -> Result<()> {
    let mut previous: Option<&PriceTier> = None;

    for tier in tiers {
        if tier.min_quantity < min_order_qty {
            return Err(CommerceError::Validation(format!(
                "Jumlah minimum harga grosir {} lebih kecil dari minimum pemesanan {}",
                tier.min_quantity, min_order_qty
            )));
        }
        if tier.unit_price <= 0 || tier.unit_price >= base_price {
            return Err(CommerceError::Validation(format!(
                "Harga grosir {} harus lebih dari 0 dan di bawah harga dasar {}",
                tier.unit_price, base_price
            )));
        }
        if let Some(prev) = previous {
            if tier.min_quantity <= prev.min_quantity {
                return Err(CommerceError::Validation(
                    "Jumlah minimum harga grosir harus terus naik".to_string(),
                ));
            }
            if tier.unit_price >= prev.unit_price {
                return Err(CommerceError::Validation(
                    "Harga grosir harus terus turun seiring jumlah bertambah".to_string(),
                ));
            }
        }
        previous = Some(tier);
    }

    Ok(())
}

/// 按购买数量取单价：满足 min_quantity <= quantity 的最高档，否则基础价
///
/// tiers 须按 min_quantity 升序
pub fn unit_price_for(base_price: i64, tiers: &[PriceTier], quantity: i32) -> i64 {
    tiers
        .iter()
        .rev()
        .find(|tier| tier.min_quantity <= quantity)
        .map(|tier| tier.unit_price)
        .unwrap_or(base_price)
}

/// 运费 = 向上取整的公斤数 × 每公斤运费，最少按 1 公斤计
pub fn shipping_fee(total_weight_grams: i64, rate_per_kg: i64) -> i64 {
    let kilograms = ((total_weight_grams + 999) / 1000).max(1);
    kilograms * rate_per_kg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> Vec<PriceTier> {
        vec![
            PriceTier {
                min_quantity: 10,
                unit_price: 340_000,
            },
            PriceTier {
                min_quantity: 50,
                unit_price: 330_000,
            },
        ]
    }

    #[test]
    fn test_unit_price_for() {
        let tiers = tiers();
        assert_eq!(unit_price_for(350_000, &tiers, 5), 350_000);
        assert_eq!(unit_price_for(350_000, &tiers, 10), 340_000);
        assert_eq!(unit_price_for(350_000, &tiers, 49), 340_000);
        assert_eq!(unit_price_for(350_000, &tiers, 200), 330_000);
        assert_eq!(unit_price_for(350_000, &[], 200), 350_000);
    }

    #[test]
    fn test_validate_price_tiers_accepts_valid() {
        assert!(validate_price_tiers(350_000, 5, &tiers()).is_ok());
        assert!(validate_price_tiers(350_000, 5, &[]).is_ok());
    }

    #[test]
    fn test_validate_price_tiers_rejects() {
        // 低于最小起订量
        assert!(validate_price_tiers(350_000, 20, &tiers()).is_err());

        // 不低于基础价
        let tiers_at_base = vec![PriceTier {
            min_quantity: 10,
            unit_price: 350_000,
        }];
        assert!(validate_price_tiers(350_000, 5, &tiers_at_base).is_err());

        // 数量未递增
        let mut unordered = tiers();
        unordered.reverse();
        assert!(validate_price_tiers(350_000, 5, &unordered).is_err());

        // 单价未递减
        let flat = vec![
            PriceTier {
                min_quantity: 10,
                unit_price: 340_000,
            },
            PriceTier {
                min_quantity: 20,
                unit_price: 340_000,
            },
        ];
        assert!(validate_price_tiers(350_000, 5, &flat).is_err());
    }

    #[test]
    fn test_shipping_fee_rounds_up_with_minimum() {
        assert_eq!(shipping_fee(0, 5_000), 5_000);
        assert_eq!(shipping_fee(999, 5_000), 5_000);
        assert_eq!(shipping_fee(1_000, 5_000), 5_000);
        assert_eq!(shipping_fee(1_001, 5_000), 10_000);
        assert_eq!(shipping_fee(25_000, 5_000), 125_000);
    }
}
