use serde::Serialize;

/// A validated checkout, ready to be attempted.
#[derive(Debug, Clone)]
pub struct Checkout {
    pub user_id: i64,
    /// Caller-suggested batch order number, only honoured on the first attempt.
    pub order_number: Option<String>,
    pub payment_method: String,
    pub payment_status: String,
    pub order_status: String,
    pub gateway: GatewayFields,
    pub batch_index: Option<i32>,
    pub batch_number: Option<String>,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, Default)]
pub struct GatewayFields {
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub signature: Option<String>,
    pub response: Option<String>,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub product_id: i64,
    pub quantity: i32,
    pub price_per_unit: i64,
    pub total_amount: i64,
    pub batch_index: Option<i32>,
    pub batch_number: Option<String>,
}

impl Checkout {
    /// Batch metadata stored on the line at `index`.
    ///
    /// Item values win over request values. Multi-item checkouts fall back to
    /// the 1-based item index and the batch order number.
    pub fn batch_fields(&self, index: usize, batch: &str) -> (Option<i32>, Option<String>) {
        let item = &self.items[index];
        let multi = self.items.len() > 1;

        let batch_index = item
            .batch_index
            .or(self.batch_index)
            .or_else(|| multi.then(|| i32::try_from(index + 1).unwrap_or(i32::MAX)));

        let batch_number = item
            .batch_number
            .clone()
            .or_else(|| self.batch_number.clone())
            .or_else(|| multi.then(|| batch.to_string()));

        (batch_index, batch_number)
    }
}

/// Outcome of a committed checkout.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order_ids: Vec<i64>,
    pub order_number: String,
    pub generated_order_numbers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: i64) -> LineItem {
        LineItem {
            product_id,
            quantity: 1,
            price_per_unit: 10,
            total_amount: 10,
            batch_index: None,
            batch_number: None,
        }
    }

    fn checkout(items: Vec<LineItem>) -> Checkout {
        Checkout {
            user_id: 1,
            order_number: None,
            payment_method: "razorpay".into(),
            payment_status: "paid".into(),
            order_status: "pending".into(),
            gateway: GatewayFields::default(),
            batch_index: None,
            batch_number: None,
            items,
        }
    }

    #[test]
    fn single_item_has_no_batch_metadata() {
        let checkout = checkout(vec![item(1)]);
        assert_eq!(checkout.batch_fields(0, "B"), (None, None));
    }

    #[test]
    fn multi_item_defaults_to_index_and_batch_number() {
        let checkout = checkout(vec![item(1), item(2)]);
        assert_eq!(checkout.batch_fields(1, "B"), (Some(2), Some("B".into())));
    }

    #[test]
    fn explicit_batch_values_take_precedence() {
        let mut first = item(1);
        first.batch_number = Some("CART-9".into());
        let mut checkout = checkout(vec![first, item(2)]);
        checkout.batch_index = Some(7);

        assert_eq!(checkout.batch_fields(0, "B"), (Some(7), Some("CART-9".into())));
        assert_eq!(checkout.batch_fields(1, "B"), (Some(7), Some("B".into())));
    }
}
