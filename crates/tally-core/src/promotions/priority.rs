//! # Priority Resolver
//!
//! Orders eligible promotions so higher priorities claim lines first.

use std::cmp::Reverse;

use super::Promotion;

/// Sorts by `priority` descending.
///
/// The sort is stable: promotions with equal priority keep the order they
/// had in the catalog. There is no secondary key.
pub fn order_by_priority(mut promotions: Vec<&Promotion>) -> Vec<&Promotion> {
    promotions.sort_by_key(|promo| Reverse(promo.priority));
    promotions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promotions::fixtures::percent_off;

    fn ids<'a>(promotions: &[&'a Promotion]) -> Vec<&'a str> {
        promotions.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_highest_priority_first() {
        let catalog = vec![
            percent_off("low", 5.0).with_priority(1),
            percent_off("high", 5.0).with_priority(5),
            percent_off("negative", 5.0).with_priority(-3),
        ];
        let ordered = order_by_priority(catalog.iter().collect());
        assert_eq!(ids(&ordered), vec!["high", "low", "negative"]);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let catalog = vec![
            percent_off("c", 5.0).with_priority(2),
            percent_off("a", 5.0).with_priority(2),
            percent_off("top", 5.0).with_priority(9),
            percent_off("b", 5.0).with_priority(2),
        ];
        let ordered = order_by_priority(catalog.iter().collect());
        assert_eq!(ids(&ordered), vec!["top", "c", "a", "b"]);
    }

    #[test]
    fn test_empty() {
        assert!(order_by_priority(Vec::new()).is_empty());
    }
}
