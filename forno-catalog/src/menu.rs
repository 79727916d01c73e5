use crate::product::{Pizza, Topping};
use crate::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Read-only catalog of pizzas and toppings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Menu {
    pizzas: Vec<Pizza>,
    toppings: Vec<Topping>,
}

impl Menu {
    /// Build a menu, rejecting duplicate SKUs (case-insensitive, across
    /// pizzas and toppings alike).
    pub fn new(pizzas: Vec<Pizza>, toppings: Vec<Topping>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for sku in pizzas
            .iter()
            .map(|p| p.sku.as_str())
            .chain(toppings.iter().map(|t| t.sku.as_str()))
        {
            if !seen.insert(sku.to_ascii_lowercase()) {
                return Err(CatalogError::DuplicateSku(sku.to_string()));
            }
        }
        Ok(Self { pizzas, toppings })
    }

    pub fn list_pizzas(&self) -> &[Pizza] {
        &self.pizzas
    }

    pub fn list_toppings(&self) -> &[Topping] {
        &self.toppings
    }

    pub fn find_pizza_sku(&self, sku: &str) -> Result<&Pizza, CatalogError> {
        self.pizzas
            .iter()
            .find(|p| p.sku.eq_ignore_ascii_case(sku))
            .ok_or_else(|| CatalogError::MenuItemNotFound(sku.to_string()))
    }

    pub fn find_topping_sku(&self, sku: &str) -> Result<&Topping, CatalogError> {
        self.toppings
            .iter()
            .find(|t| t.sku.eq_ignore_ascii_case(sku))
            .ok_or_else(|| CatalogError::MenuItemNotFound(sku.to_string()))
    }

    /// Case-insensitive substring search over pizza names. The query is
    /// trimmed first; a blank query matches nothing.
    pub fn find_pizza_name(&self, name: &str) -> Vec<&Pizza> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.pizzas
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{Ingredient, IngredientRequirement};
    use forno_core::Money;
    use rust_decimal_macros::dec;

    fn menu_basic() -> Menu {
        let dough = Ingredient::new("Dough", "kg");
        let cheese = Ingredient::new("Cheese", "kg");

        let pizzas = vec![
            Pizza::new(
                "Margherita",
                "pz-mar",
                Money::new(dec!(10.00)),
                vec![
                    IngredientRequirement::new(dough.clone(), dec!(1.0)),
                    IngredientRequirement::new(cheese.clone(), dec!(0.3)),
                ],
            )
            .unwrap(),
            Pizza::new(
                "Pepperoni",
                "pz-pep",
                Money::new(dec!(11.00)),
                vec![
                    IngredientRequirement::new(dough.clone(), dec!(1.0)),
                    IngredientRequirement::new(cheese.clone(), dec!(0.3)),
                ],
            )
            .unwrap(),
            Pizza::new(
                "Four Cheese",
                "pz-4ch",
                Money::new(dec!(12.00)),
                vec![
                    IngredientRequirement::new(dough, dec!(1.0)),
                    IngredientRequirement::new(cheese, dec!(0.45)),
                ],
            )
            .unwrap(),
        ];
        let toppings = vec![
            Topping::new("Extra Cheese", "tp-exch", Money::new(dec!(2.00)), None).unwrap(),
            Topping::new("Extra Pepper", "tp-ppr", Money::new(dec!(1.50)), None).unwrap(),
        ];
        Menu::new(pizzas, toppings).unwrap()
    }

    #[test]
    fn test_duplicate_sku_rejected_case_insensitive() {
        let toppings = vec![
            Topping::new("Extra Cheese", "tp-exch", Money::new(dec!(2.00)), None).unwrap(),
            Topping::new("Extra Pepper", "TP-EXCH", Money::new(dec!(1.50)), None).unwrap(),
        ];
        let result = Menu::new(vec![], toppings);
        assert!(matches!(result, Err(CatalogError::DuplicateSku(_))));
    }

    #[test]
    fn test_sku_lookup() {
        let menu = menu_basic();
        assert_eq!(menu.find_pizza_sku("pz-mar").unwrap().name, "Margherita");
        assert_eq!(menu.find_topping_sku("tp-ppr").unwrap().name, "Extra Pepper");

        let err = menu.find_pizza_sku("pz-margi").unwrap_err();
        assert!(matches!(err, CatalogError::MenuItemNotFound(_)));
    }

    #[test]
    fn test_name_search_is_trimmed_and_case_insensitive() {
        let menu = menu_basic();
        let names = |query: &str| -> Vec<String> {
            menu.find_pizza_name(query)
                .into_iter()
                .map(|p| p.name.clone())
                .collect()
        };

        assert_eq!(names("PEP"), vec!["Pepperoni"]);
        assert_eq!(names("  four"), vec!["Four Cheese"]);
        assert_eq!(names("ITA  "), vec!["Margherita"]);
        assert!(names("abc").is_empty());
        assert!(names("").is_empty());
        assert!(names("   ").is_empty());
    }
}
