#![allow(dead_code)]

use std::time::Duration;

use chrono::Utc;
use order_placement_api::{
    config::RetryPolicy,
    db::run_migrations,
    entity::{
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        products::{ActiveModel as ProductActive, Entity as Products},
    },
    services::order_number::OrderNumberGenerator,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, Database, EntityTrait, PaginatorTrait, QueryOrder, Set,
};

/// Fresh in-memory database with the schema applied.
///
/// One pooled connection: every connection to `sqlite::memory:` would
/// otherwise open its own empty database.
pub async fn setup_state() -> anyhow::Result<AppState> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let orm = Database::connect(options).await?;
    run_migrations(&orm).await?;

    Ok(AppState::new(orm, fast_retries()))
}

pub fn fast_retries() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 5,
        backoff_min: Duration::from_millis(1),
        backoff_max: Duration::from_millis(5),
        attempt_timeout: Duration::from_secs(5),
    }
}

/// `price` is in minor units.
pub async fn create_product(
    state: &AppState,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<i64> {
    let now = Utc::now().fixed_offset();
    let product = ProductActive {
        id: NotSet,
        name: Set(name.to_string()),
        price: Set(price),
        stock_quantity: Set(stock),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.orm)
    .await?;
    Ok(product.id)
}

pub async fn stock_of(state: &AppState, product_id: i64) -> anyhow::Result<i32> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {product_id} missing"))?;
    Ok(product.stock_quantity)
}

pub async fn all_orders(state: &AppState) -> anyhow::Result<Vec<OrderModel>> {
    Ok(Orders::find()
        .order_by_asc(OrderCol::Id)
        .all(&state.orm)
        .await?)
}

pub async fn order_count(state: &AppState) -> anyhow::Result<u64> {
    Ok(Orders::find().count(&state.orm).await?)
}

/// Insert an order row directly, bypassing the engine.
pub async fn insert_existing_order(
    state: &AppState,
    product_id: i64,
    order_number: &str,
) -> anyhow::Result<()> {
    let now = Utc::now().fixed_offset();
    OrderActive {
        id: NotSet,
        user_id: Set(1),
        product_id: Set(product_id),
        order_number: Set(order_number.to_string()),
        batch_number: Set(None),
        batch_index: Set(None),
        quantity: Set(1),
        price_per_unit: Set(0),
        total_amount: Set(0),
        payment_method: Set("razorpay".into()),
        payment_status: Set("paid".into()),
        order_status: Set("pending".into()),
        gateway_order_id: Set(None),
        gateway_payment_id: Set(None),
        gateway_signature: Set(None),
        gateway_response: Set(None),
        payment_completed_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.orm)
    .await?;
    Ok(())
}

/// Always hands out the same number.
pub struct FixedOrderNumber(pub &'static str);

impl OrderNumberGenerator for FixedOrderNumber {
    fn generate(&self, _attempt: u32) -> String {
        self.0.to_string()
    }
}

/// Collides on the first attempt, then falls back to a unique number.
pub struct CollideOnce(pub &'static str);

impl OrderNumberGenerator for CollideOnce {
    fn generate(&self, attempt: u32) -> String {
        if attempt == 0 {
            self.0.to_string()
        } else {
            format!("ORD-RETRY-{attempt}")
        }
    }
}
