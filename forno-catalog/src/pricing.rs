use crate::product::ProductKind;
use chrono::{NaiveDate, Utc};
use forno_core::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Read-only, unit-level line in an order view: an item with quantity N
/// contributes N entries, each priced after size and toppings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemView {
    pub sku: String,
    pub name: String,
    pub unit_price: Money,
    pub kind: ProductKind,
}

/// Read-only snapshot of an order handed to pricing strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub subtotal: Money,
    pub items: Vec<OrderItemView>,
    pub metadata: serde_json::Value,
}

/// Result of applying a pricing strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    pub final_total: Money,
    pub discount_amount: Money,
    pub strategy_name: String,
    pub breakdown: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("invalid pricing operation: {0}")]
    InvalidOperation(String),

    #[error("coupon {code} expired on {expired_on}")]
    CouponExpired { code: String, expired_on: NaiveDate },

    #[error("coupon {code} is only valid on a customer's first order")]
    CouponNotFirstOrder { code: String },

    #[error("strategy is incompatible with this order: {0}")]
    IncompatibleStrategy(String),
}

/// A pricing strategy is a pure function of the order view: applying it
/// twice to an unchanged view yields identical results.
pub trait PricingStrategy: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, view: &OrderView) -> Result<PricingResult, PricingError>;
}

fn percent_discount(subtotal: Money, percent: Decimal) -> Result<Money, PricingError> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(PricingError::InvalidOperation(format!(
            "percentage {percent} outside [0, 100]"
        )));
    }
    Ok(Money::new(subtotal.amount() * percent / Decimal::ONE_HUNDRED))
}

/// Default strategy: final total equals the subtotal.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NoDiscount;

impl PricingStrategy for NoDiscount {
    fn name(&self) -> &str {
        "no_discount"
    }

    fn apply(&self, view: &OrderView) -> Result<PricingResult, PricingError> {
        Ok(PricingResult {
            final_total: view.subtotal,
            discount_amount: Money::zero(),
            strategy_name: self.name().to_string(),
            breakdown: Vec::new(),
            warnings: Vec::new(),
        })
    }
}

/// Percentage discount off the subtotal; the percentage must lie in
/// [0, 100].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PercentOff {
    pub percent: Decimal,
}

impl PercentOff {
    pub fn new(percent: Decimal) -> Self {
        Self { percent }
    }
}

impl PricingStrategy for PercentOff {
    fn name(&self) -> &str {
        "percent_off"
    }

    fn apply(&self, view: &OrderView) -> Result<PricingResult, PricingError> {
        let discount = percent_discount(view.subtotal, self.percent)?;
        Ok(PricingResult {
            final_total: view.subtotal - discount,
            discount_amount: discount,
            strategy_name: self.name().to_string(),
            breakdown: vec![format!("{}% off subtotal {}", self.percent, view.subtotal)],
            warnings: Vec::new(),
        })
    }
}

/// Which order lines a discount strategy considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountScope {
    PizzaOnly,
    EntireOrder,
}

/// Buy N, get the M cheapest of each full group free. Groups are formed
/// in insertion order; a partial trailing group earns no discount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyNGetMFree {
    pub n: usize,
    pub m: usize,
    pub scope: DiscountScope,
}

impl BuyNGetMFree {
    pub fn new(n: usize, m: usize) -> Self {
        Self {
            n,
            m,
            scope: DiscountScope::PizzaOnly,
        }
    }

    pub fn with_scope(n: usize, m: usize, scope: DiscountScope) -> Self {
        Self { n, m, scope }
    }
}

impl PricingStrategy for BuyNGetMFree {
    fn name(&self) -> &str {
        "buy_n_get_m_free"
    }

    fn apply(&self, view: &OrderView) -> Result<PricingResult, PricingError> {
        if self.n == 0 || self.m == 0 || self.m > self.n {
            return Err(PricingError::InvalidOperation(format!(
                "buy {} get {} free is not a valid promotion",
                self.n, self.m
            )));
        }

        let in_scope: Vec<&OrderItemView> = view
            .items
            .iter()
            .filter(|item| match self.scope {
                DiscountScope::PizzaOnly => item.kind == ProductKind::Pizza,
                DiscountScope::EntireOrder => true,
            })
            .collect();

        let mut discount = Money::zero();
        let mut breakdown = Vec::new();
        let mut warnings = Vec::new();

        for group in in_scope.chunks(self.n) {
            if group.len() < self.n {
                warnings.push(format!(
                    "trailing group of {} below promotion size {}",
                    group.len(),
                    self.n
                ));
                continue;
            }
            // Stable: ties keep insertion order.
            let mut positions: Vec<usize> = (0..group.len()).collect();
            positions.sort_by_key(|&i| group[i].unit_price);
            for &i in positions.iter().take(self.m) {
                discount += group[i].unit_price;
                breakdown.push(format!("{} free ({})", group[i].name, group[i].unit_price));
            }
        }

        Ok(PricingResult {
            final_total: view.subtotal - discount,
            discount_amount: discount,
            strategy_name: self.name().to_string(),
            breakdown,
            warnings,
        })
    }
}

/// Percentage coupon restricted to a customer's first order, optionally
/// time-bounded (still valid on the expiry date itself).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirstOrderCoupon {
    pub code: String,
    pub percent: Decimal,
    pub expires_at: Option<NaiveDate>,
}

impl FirstOrderCoupon {
    pub fn new(code: impl Into<String>, percent: Decimal, expires_at: Option<NaiveDate>) -> Self {
        Self {
            code: code.into(),
            percent,
            expires_at,
        }
    }
}

impl PricingStrategy for FirstOrderCoupon {
    fn name(&self) -> &str {
        "first_order_coupon"
    }

    fn apply(&self, view: &OrderView) -> Result<PricingResult, PricingError> {
        if let Some(attached) = view.metadata.get("coupon_code").and_then(|v| v.as_str()) {
            if !attached.eq_ignore_ascii_case(&self.code) {
                return Err(PricingError::IncompatibleStrategy(format!(
                    "order carries coupon {attached}, strategy expects {}",
                    self.code
                )));
            }
        }

        if let Some(expires_at) = self.expires_at {
            if Utc::now().date_naive() > expires_at {
                return Err(PricingError::CouponExpired {
                    code: self.code.clone(),
                    expired_on: expires_at,
                });
            }
        }

        let is_first_order = view
            .metadata
            .get("is_first_order")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !is_first_order {
            return Err(PricingError::CouponNotFirstOrder {
                code: self.code.clone(),
            });
        }

        let discount = percent_discount(view.subtotal, self.percent)?;
        Ok(PricingResult {
            final_total: view.subtotal - discount,
            discount_amount: discount,
            strategy_name: self.name().to_string(),
            breakdown: vec![format!(
                "coupon {}: {}% off subtotal {}",
                self.code, self.percent, view.subtotal
            )],
            warnings: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn unit(sku: &str, name: &str, price: Decimal) -> OrderItemView {
        OrderItemView {
            sku: sku.to_string(),
            name: name.to_string(),
            unit_price: Money::new(price),
            kind: ProductKind::Pizza,
        }
    }

    fn view(items: Vec<OrderItemView>, metadata: serde_json::Value) -> OrderView {
        let subtotal = items.iter().map(|i| i.unit_price).sum();
        OrderView {
            subtotal,
            items,
            metadata,
        }
    }

    #[test]
    fn test_no_discount_returns_subtotal() {
        let v = view(vec![unit("pz-mar", "Margherita", dec!(14.50))], json!({}));
        let result = NoDiscount.apply(&v).unwrap();
        assert_eq!(result.final_total, Money::new(dec!(14.50)));
        assert_eq!(result.discount_amount, Money::zero());
    }

    #[test]
    fn test_percent_off_worked_example() {
        let v = view(
            vec![
                unit("pz-mar", "Margherita", dec!(14.50)),
                unit("pz-mar", "Margherita", dec!(14.50)),
            ],
            json!({}),
        );
        assert_eq!(v.subtotal, Money::new(dec!(29.00)));

        let result = PercentOff::new(dec!(10)).apply(&v).unwrap();
        assert_eq!(result.discount_amount, Money::new(dec!(2.90)));
        assert_eq!(result.final_total, Money::new(dec!(26.10)));
    }

    #[test]
    fn test_percent_off_rejects_out_of_range() {
        let v = view(vec![unit("pz-mar", "Margherita", dec!(10.00))], json!({}));
        assert!(matches!(
            PercentOff::new(dec!(101)).apply(&v),
            Err(PricingError::InvalidOperation(_))
        ));
        assert!(matches!(
            PercentOff::new(dec!(-1)).apply(&v),
            Err(PricingError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_percent_off_is_idempotent() {
        let v = view(vec![unit("pz-pep", "Pepperoni", dec!(11.00))], json!({}));
        let first = PercentOff::new(dec!(15)).apply(&v).unwrap();
        let second = PercentOff::new(dec!(15)).apply(&v).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_buy_n_get_m_frees_cheapest_per_full_group() {
        let v = view(
            vec![
                unit("pz-4ch", "Four Cheese", dec!(12.00)),
                unit("pz-pep", "Pepperoni", dec!(8.00)),
                unit("pz-mar", "Margherita", dec!(10.00)),
                unit("pz-mar", "Margherita", dec!(10.00)),
            ],
            json!({}),
        );

        let result = BuyNGetMFree::new(3, 1).apply(&v).unwrap();
        // Full group: 12.00 / 8.00 / 10.00 -> 8.00 free; trailing single
        // pizza earns nothing.
        assert_eq!(result.discount_amount, Money::new(dec!(8.00)));
        assert_eq!(result.final_total, Money::new(dec!(32.00)));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_buy_n_get_m_tie_breaks_by_insertion_order() {
        let v = view(
            vec![
                unit("pz-mar", "Margherita", dec!(10.00)),
                unit("pz-pep", "Pepperoni", dec!(10.00)),
                unit("pz-4ch", "Four Cheese", dec!(12.00)),
            ],
            json!({}),
        );

        let result = BuyNGetMFree::new(3, 1).apply(&v).unwrap();
        assert_eq!(result.breakdown, vec!["Margherita free (10.00)"]);
    }

    #[test]
    fn test_buy_n_get_m_rejects_bad_shape() {
        let v = view(vec![unit("pz-mar", "Margherita", dec!(10.00))], json!({}));
        assert!(matches!(
            BuyNGetMFree::new(0, 1).apply(&v),
            Err(PricingError::InvalidOperation(_))
        ));
        assert!(matches!(
            BuyNGetMFree::new(2, 3).apply(&v),
            Err(PricingError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_first_order_coupon_applies_on_first_order() {
        let v = view(
            vec![unit("pz-mar", "Margherita", dec!(20.00))],
            json!({"is_first_order": true}),
        );
        let coupon = FirstOrderCoupon::new("WELCOME", dec!(25), None);
        let result = coupon.apply(&v).unwrap();
        assert_eq!(result.discount_amount, Money::new(dec!(5.00)));
        assert_eq!(result.final_total, Money::new(dec!(15.00)));
    }

    #[test]
    fn test_first_order_coupon_rejects_repeat_customer() {
        let v = view(
            vec![unit("pz-mar", "Margherita", dec!(20.00))],
            json!({"is_first_order": false}),
        );
        let coupon = FirstOrderCoupon::new("WELCOME", dec!(25), None);
        assert!(matches!(
            coupon.apply(&v),
            Err(PricingError::CouponNotFirstOrder { .. })
        ));
    }

    #[test]
    fn test_first_order_coupon_valid_through_expiry_date() {
        let today = Utc::now().date_naive();
        let v = view(
            vec![unit("pz-mar", "Margherita", dec!(20.00))],
            json!({"is_first_order": true}),
        );

        let expires_today = FirstOrderCoupon::new("WELCOME", dec!(10), Some(today));
        assert!(expires_today.apply(&v).is_ok());

        let expired = FirstOrderCoupon::new(
            "WELCOME",
            dec!(10),
            Some(today - chrono::Duration::days(1)),
        );
        assert!(matches!(
            expired.apply(&v),
            Err(PricingError::CouponExpired { .. })
        ));
    }

    #[test]
    fn test_first_order_coupon_code_mismatch_is_incompatible() {
        let v = view(
            vec![unit("pz-mar", "Margherita", dec!(20.00))],
            json!({"is_first_order": true, "coupon_code": "SUMMER"}),
        );
        let coupon = FirstOrderCoupon::new("WELCOME", dec!(10), None);
        assert!(matches!(
            coupon.apply(&v),
            Err(PricingError::IncompatibleStrategy(_))
        ));
    }
}
