use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    error::CheckoutError,
    models::{Checkout, GatewayFields, LineItem, PlacedOrder},
};

/// Checkout payload. Numeric fields accept JSON numbers or numeric strings,
/// and empty strings count as absent.
///
/// Money is sent in major units (`"199.00"`, `99.5`) with at most two
/// decimal places and held as integer minor units once parsed.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub user_id: Option<i64>,
    /// Presence is required; the value itself is not used for pricing.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub total_amount: Option<Value>,
    #[serde(default)]
    pub items: Option<Vec<CheckoutItem>>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub product_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub quantity: Option<i64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub price: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub order_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub payment_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub payment_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub order_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub razorpay_order_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub razorpay_payment_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub razorpay_signature: Option<String>,
    /// Object or string; objects are stored as their JSON text.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub gateway_response: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub payment_completed_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub batch_index: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub batch_number: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckoutItem {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub product_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub quantity: Option<i64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub price: Option<i64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub price_per_unit: Option<i64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_amount: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub batch_index: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub batch_number: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlacedOrderResponse {
    pub success: bool,
    pub message: String,
    pub order_ids: Vec<i64>,
    pub order_number: String,
    pub generated_order_numbers: Vec<String>,
}

impl From<PlacedOrder> for PlacedOrderResponse {
    fn from(placed: PlacedOrder) -> Self {
        Self {
            success: true,
            message: "Order(s) created successfully and stock updated".into(),
            order_ids: placed.order_ids,
            order_number: placed.order_number,
            generated_order_numbers: placed.generated_order_numbers,
        }
    }
}

impl CheckoutRequest {
    /// Validate the payload and resolve every line item.
    pub fn into_checkout(self) -> Result<Checkout, CheckoutError> {
        let user_id = self
            .user_id
            .ok_or_else(|| CheckoutError::Validation("Missing required: user_id".into()))?;

        if !is_present(self.total_amount.as_ref()) {
            return Err(CheckoutError::Validation(
                "Missing required: total_amount".into(),
            ));
        }

        let raw_items = match self.items {
            Some(items) if !items.is_empty() => items,
            _ => match self.product_id {
                Some(product_id) => {
                    let price = match (self.price, self.total_amount.as_ref()) {
                        (Some(price), _) => Some(price),
                        (None, Some(total)) => Some(parse_amount(total).map_err(|err| {
                            CheckoutError::Validation(format!("Invalid total_amount: {err}"))
                        })?),
                        (None, None) => None,
                    };
                    vec![CheckoutItem {
                        product_id: Some(product_id),
                        quantity: self.quantity,
                        price,
                        ..CheckoutItem::default()
                    }]
                }
                None => {
                    return Err(CheckoutError::Validation(
                        "Missing required: items array or product_id".into(),
                    ));
                }
            },
        };

        let items = raw_items
            .into_iter()
            .map(CheckoutItem::into_line_item)
            .collect::<Result<Vec<_>, _>>()?;

        let gateway = GatewayFields {
            order_id: self.razorpay_order_id,
            payment_id: self.razorpay_payment_id.or(self.payment_id),
            signature: self.razorpay_signature,
            response: self.gateway_response.and_then(|value| match value {
                Value::Null => None,
                Value::String(s) => Some(s),
                other => Some(other.to_string()),
            }),
            completed_at: self.payment_completed_at,
        };

        Ok(Checkout {
            user_id,
            order_number: self.order_number,
            payment_method: self.payment_method.unwrap_or_else(|| "razorpay".into()),
            payment_status: self.payment_status.unwrap_or_else(|| "paid".into()),
            order_status: self
                .order_status
                .or(self.status)
                .unwrap_or_else(|| "pending".into()),
            gateway,
            batch_index: self.batch_index.map(to_i32).transpose()?,
            batch_number: self.batch_number,
            items,
        })
    }
}

impl CheckoutItem {
    fn into_line_item(self) -> Result<LineItem, CheckoutError> {
        let product_id = self
            .product_id
            .ok_or_else(|| CheckoutError::Validation("Invalid product_id in item".into()))?;

        let quantity = to_i32(self.quantity.unwrap_or(1))?;
        if quantity <= 0 {
            return Err(CheckoutError::Validation(format!(
                "Invalid quantity {quantity} for product id {product_id}"
            )));
        }

        let price_per_unit = self.price.or(self.price_per_unit).unwrap_or(0);
        let total_amount = match self.total_amount {
            Some(total) => total,
            None => price_per_unit
                .checked_mul(i64::from(quantity))
                .ok_or_else(|| {
                    CheckoutError::Validation(format!(
                        "Line total out of range for product id {product_id}"
                    ))
                })?,
        };

        Ok(LineItem {
            product_id,
            quantity,
            price_per_unit,
            total_amount,
            batch_index: self.batch_index.map(to_i32).transpose()?,
            batch_number: self.batch_number,
        })
    }
}

fn to_i32(value: i64) -> Result<i32, CheckoutError> {
    i32::try_from(value)
        .map_err(|_| CheckoutError::Validation(format!("Value {value} is out of range")))
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

/// Parse a major-unit amount (`199`, `"199.00"`, `99.5`) into minor units.
pub fn parse_amount(value: &Value) -> Result<i64, String> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => return Err(format!("expected an amount, got {other}")),
    };
    let amount =
        Decimal::from_str_exact(&text).map_err(|_| format!("expected an amount, got {text:?}"))?;
    if amount.normalize().scale() > 2 {
        return Err(format!("amount {text} has more than 2 decimal places"));
    }
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|minor| minor.to_i64())
        .ok_or_else(|| format!("amount {text} is out of range"))
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => parse_amount(&value).map(Some).map_err(D::Error::custom),
    }
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected an integer, got {n}"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected an integer, got {s:?}"))),
        Some(other) => Err(D::Error::custom(format!(
            "expected an integer, got {other}"
        ))),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!("expected a string, got {other}"))),
    }
}
