use crate::inventory::IngredientRequirement;
use crate::CatalogError;
use forno_core::Money;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Pizza sizes; the price (and recipe) multiplier depends on the size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PizzaSize {
    Small,
    Medium,
    Large,
}

impl PizzaSize {
    /// Exact price/recipe multiplier relative to the MEDIUM baseline.
    pub fn multiplier(&self) -> Decimal {
        match self {
            PizzaSize::Small => dec!(0.75),
            PizzaSize::Medium => dec!(1.0),
            PizzaSize::Large => dec!(1.25),
        }
    }
}

/// What kind of catalog entry a line refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductKind {
    Pizza,
    Topping,
}

/// Topping: unique SKU, name, unit price per portion, optional ingredient
/// requirements (per portion, not scaled by pizza size).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topping {
    pub name: String,
    pub sku: String,
    pub unit_price: Money,
    pub requirements: Vec<IngredientRequirement>,
}

impl Topping {
    pub fn new(
        name: impl Into<String>,
        sku: impl Into<String>,
        unit_price: Money,
        requirements: Option<Vec<IngredientRequirement>>,
    ) -> Result<Self, CatalogError> {
        let sku = sku.into();
        if unit_price.is_negative() {
            return Err(CatalogError::InvalidProduct(format!(
                "topping {sku}: unit price must be >= 0"
            )));
        }
        let requirements = requirements.unwrap_or_default();
        if requirements.iter().any(|req| req.amount <= Decimal::ZERO) {
            return Err(CatalogError::InvalidProduct(format!(
                "topping {sku}: all requirement amounts must be > 0"
            )));
        }
        Ok(Self {
            name: name.into(),
            sku,
            unit_price,
            requirements,
        })
    }
}

/// Pizza product definition. `default_price` and `recipe` are the MEDIUM
/// baseline; other sizes scale both by the same multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pizza {
    pub name: String,
    pub sku: String,
    pub default_price: Money,
    pub recipe: Vec<IngredientRequirement>,
}

impl Pizza {
    pub fn new(
        name: impl Into<String>,
        sku: impl Into<String>,
        default_price: Money,
        recipe: Vec<IngredientRequirement>,
    ) -> Result<Self, CatalogError> {
        let sku = sku.into();
        if default_price.is_negative() {
            return Err(CatalogError::InvalidProduct(format!(
                "pizza {sku}: price must be >= 0"
            )));
        }
        if recipe.is_empty() {
            return Err(CatalogError::InvalidProduct(format!(
                "pizza {sku}: recipe must be non-empty"
            )));
        }
        if recipe.iter().any(|req| req.amount <= Decimal::ZERO) {
            return Err(CatalogError::InvalidProduct(format!(
                "pizza {sku}: all recipe amounts must be > 0"
            )));
        }
        Ok(Self {
            name: name.into(),
            sku,
            default_price,
            recipe,
        })
    }

    /// Sized unit price: `quantize(default_price * multiplier)`.
    pub fn unit_price(&self, size: PizzaSize) -> Money {
        self.default_price * size.multiplier()
    }

    /// Recipe scaled to the given size; each ingredient is scaled
    /// independently, so no rounding artifact is shared across lines.
    pub fn requirements(&self, size: PizzaSize) -> Vec<IngredientRequirement> {
        let multiplier = size.multiplier();
        self.recipe
            .iter()
            .map(|req| IngredientRequirement {
                ingredient: req.ingredient.clone(),
                amount: req.amount * multiplier,
            })
            .collect()
    }
}
