use std::collections::BTreeMap;

use crate::{
    db_types::{CartLine, ProductId},
    traits::MarketError,
};

/// Validates a purchase request and puts it in canonical form: one line per product, sorted by product id.
///
/// Every order locks its products in this order, so two orders that share products always contend for them in the
/// same sequence.
pub fn canonical_cart(lines: Vec<CartLine>) -> Result<Vec<CartLine>, MarketError> {
    if lines.is_empty() {
        return Err(MarketError::InvalidRequest("The cart is empty".into()));
    }
    let mut merged = BTreeMap::<ProductId, i64>::new();
    for line in lines {
        if line.quantity <= 0 {
            return Err(MarketError::InvalidRequest(format!(
                "Quantity for product {} must be positive, got {}",
                line.product_id, line.quantity
            )));
        }
        let qty = merged.entry(line.product_id).or_default();
        *qty = qty
            .checked_add(line.quantity)
            .ok_or_else(|| MarketError::InvalidRequest("Quantity is too large".into()))?;
    }
    Ok(merged.into_iter().map(|(product_id, quantity)| CartLine { product_id, quantity }).collect())
}
