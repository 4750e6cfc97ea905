//! # Cart Input
//!
//! Reads carts handed to the engine from outside (CLI files, JSON payloads)
//! and rejects lines the pass could only roll back.
//!
//! Accepted shapes:
//! ```json
//! [ { "id": "line-1", "productRef": { "id": "cola", "price": 1.99 }, "quantity": 3 } ]
//! { "items": [ ... ] }
//! ```
//! Incoming `discount`, `subtotal` and `appliedPromotionId` are kept as
//! given; the next pass resets them anyway.

use std::path::Path;

use serde::Deserialize;
use tally_core::validation::{validate_quantity, validate_unit_price};
use tally_core::CartLineItem;

use crate::error::{EngineError, EngineResult};

#[derive(Deserialize)]
#[serde(untagged)]
enum CartDocument {
    Items(Vec<CartLineItem>),
    Wrapped { items: Vec<CartLineItem> },
}

/// Parses and validates a cart.
pub fn parse_cart(json: &str) -> EngineResult<Vec<CartLineItem>> {
    let items = match serde_json::from_str::<CartDocument>(json)? {
        CartDocument::Items(items) | CartDocument::Wrapped { items } => items,
    };

    for item in &items {
        validate_line(item)?;
    }

    Ok(items)
}

/// Reads, parses and validates a cart file.
pub fn read_cart_file(path: &Path) -> EngineResult<Vec<CartLineItem>> {
    let json = std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
    parse_cart(&json)
}

fn validate_line(item: &CartLineItem) -> EngineResult<()> {
    let invalid = |source| EngineError::InvalidCart {
        line_id: item.id.clone(),
        source,
    };

    validate_quantity(item.quantity).map_err(invalid)?;
    validate_unit_price(item.product.price).map_err(invalid)?;
    if let Some(price) = item.unit_price_override {
        validate_unit_price(price).map_err(invalid)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_bare_array() {
        let items = parse_cart(
            r#"[
                { "id": "l1", "productRef": { "id": "cola", "name": "Cola", "price": 10.0 }, "quantity": 3 },
                { "id": "l2", "productRef": { "id": "chips", "price": 2.5 }, "quantity": 1, "unitPriceOverride": 2.0 }
            ]"#,
        )
        .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].gross_amount(), 30.0);
        assert_eq!(items[1].effective_unit_price(), 2.0);
    }

    #[test]
    fn test_parse_wrapped_items() {
        let items = parse_cart(
            r#"{ "items": [ { "id": "l1", "productRef": { "id": "cola", "price": 1.0 }, "quantity": 1 } ] }"#,
        )
        .unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let err = parse_cart(
            r#"[ { "id": "l1", "productRef": { "id": "cola", "price": 1.0 }, "quantity": 0 } ]"#,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidCart { ref line_id, .. } if line_id == "l1"));
    }

    #[test]
    fn test_negative_price_rejected() {
        let err = parse_cart(
            r#"[ { "id": "l9", "productRef": { "id": "cola", "price": 1.0 }, "quantity": 1, "unitPriceOverride": -1.0 } ]"#,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidCart { ref line_id, .. } if line_id == "l9"));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(parse_cart("[{"), Err(EngineError::Json(_))));
    }

    #[test]
    fn test_read_cart_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[ {{ "id": "l1", "productRef": {{ "id": "cola", "price": 1.0 }}, "quantity": 2 }} ]"#
        )
        .unwrap();

        let items = read_cart_file(file.path()).unwrap();
        assert_eq!(items[0].quantity, 2);
    }
}
