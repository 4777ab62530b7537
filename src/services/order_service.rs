use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbBackend, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, Set, SqlErr, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;

use crate::{
    audit::log_audit,
    dto::orders::CheckoutRequest,
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult, CheckoutError},
    models::{Checkout, PlacedOrder},
    services::order_number::line_order_number,
    state::AppState,
};

/// Validate a checkout request and commit it, retrying the whole attempt when
/// the generated order number collides with an existing one.
pub async fn place_order(state: &AppState, payload: CheckoutRequest) -> AppResult<PlacedOrder> {
    let checkout = payload.into_checkout()?;
    let policy = &state.retry;
    let max_attempts = policy.max_attempts.max(1);

    let mut attempt = 0;
    loop {
        match run_attempt(state, &checkout, attempt).await {
            Ok(placed) => {
                tracing::info!(
                    user_id = checkout.user_id,
                    order_number = %placed.order_number,
                    items = placed.order_ids.len(),
                    retries = attempt,
                    "order placed"
                );

                if let Err(err) = log_audit(
                    &state.orm,
                    Some(checkout.user_id),
                    "checkout",
                    Some("orders"),
                    Some(serde_json::json!({
                        "order_ids": placed.order_ids,
                        "order_number": placed.order_number,
                    })),
                )
                .await
                {
                    tracing::warn!(error = %err, "audit log failed");
                }

                return Ok(placed);
            }
            Err(err) if err.is_retryable() && attempt + 1 < max_attempts => {
                let delay = policy.backoff();
                attempt += 1;
                tracing::warn!(
                    error = %err,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "order number collision, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                let err = if err.is_retryable() {
                    CheckoutError::RetriesExhausted {
                        attempts: max_attempts,
                    }
                } else {
                    err
                };
                match &err {
                    CheckoutError::Database(db_err) => tracing::error!(
                        user_id = checkout.user_id,
                        error = %db_err,
                        retries = attempt,
                        "order creation failed"
                    ),
                    other => tracing::warn!(
                        user_id = checkout.user_id,
                        error = %other,
                        retries = attempt,
                        "order creation rejected"
                    ),
                }
                return Err(AppError::checkout(err, attempt, max_attempts));
            }
        }
    }
}

/// One all-or-nothing attempt. Nothing is visible unless every item succeeds.
///
/// The deadline covers the writes only. Once they finish the commit runs to
/// completion, so a reported failure never hides committed rows.
async fn run_attempt(
    state: &AppState,
    checkout: &Checkout,
    attempt: u32,
) -> Result<PlacedOrder, CheckoutError> {
    let deadline = state.retry.attempt_timeout;
    let txn = state.orm.begin().await?;

    let written = tokio::time::timeout(deadline, write_orders(state, &txn, checkout, attempt))
        .await
        .unwrap_or(Err(CheckoutError::AttemptTimedOut(deadline)));

    match written {
        Ok(placed) => {
            txn.commit().await?;
            Ok(placed)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

async fn write_orders(
    state: &AppState,
    txn: &DatabaseTransaction,
    checkout: &Checkout,
    attempt: u32,
) -> Result<PlacedOrder, CheckoutError> {
    let batch = resolve_order_number(state, txn, checkout, attempt).await?;
    let now = Utc::now().fixed_offset();
    let total = checkout.items.len();

    let mut order_ids = Vec::with_capacity(total);
    let mut generated_order_numbers = Vec::with_capacity(total);

    for (index, item) in checkout.items.iter().enumerate() {
        let order_number = line_order_number(&batch, index, total);

        let mut stock_query = Products::find_by_id(item.product_id)
            .select_only()
            .column(ProdCol::StockQuantity);
        // SQLite has no row locks; its writers are already serialized.
        if txn.get_database_backend() != DbBackend::Sqlite {
            stock_query = stock_query.lock(LockType::Update);
        }
        let stock: Option<i32> = stock_query.into_tuple().one(txn).await?;
        let stock = stock.ok_or(CheckoutError::ProductNotFound(item.product_id))?;

        if item.quantity > stock {
            return Err(CheckoutError::InsufficientStock {
                product_id: item.product_id,
                available: stock,
                requested: item.quantity,
            });
        }

        let (batch_index, batch_number) = checkout.batch_fields(index, &batch);

        let order = OrderActive {
            id: NotSet,
            user_id: Set(checkout.user_id),
            product_id: Set(item.product_id),
            order_number: Set(order_number.clone()),
            batch_number: Set(batch_number),
            batch_index: Set(batch_index),
            quantity: Set(item.quantity),
            price_per_unit: Set(item.price_per_unit),
            total_amount: Set(item.total_amount),
            payment_method: Set(checkout.payment_method.clone()),
            payment_status: Set(checkout.payment_status.clone()),
            order_status: Set(checkout.order_status.clone()),
            gateway_order_id: Set(checkout.gateway.order_id.clone()),
            gateway_payment_id: Set(checkout.gateway.payment_id.clone()),
            gateway_signature: Set(checkout.gateway.signature.clone()),
            gateway_response: Set(checkout.gateway.response.clone()),
            payment_completed_at: Set(checkout.gateway.completed_at.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(|err| classify_insert_error(err, &order_number))?;

        // Guarded decrement: a row that no longer has enough stock is left untouched.
        let updated = Products::update_many()
            .col_expr(
                ProdCol::StockQuantity,
                Expr::col(ProdCol::StockQuantity).sub(item.quantity),
            )
            .col_expr(ProdCol::UpdatedAt, Expr::value(now))
            .filter(ProdCol::Id.eq(item.product_id))
            .filter(ProdCol::StockQuantity.gte(item.quantity))
            .exec(txn)
            .await?;
        if updated.rows_affected == 0 {
            return Err(CheckoutError::InsufficientStock {
                product_id: item.product_id,
                available: stock,
                requested: item.quantity,
            });
        }

        order_ids.push(order.id);
        generated_order_numbers.push(order_number);
    }

    Ok(PlacedOrder {
        order_ids,
        order_number: batch,
        generated_order_numbers,
    })
}

/// The caller's number is used verbatim only on the first attempt and only if
/// no order already carries it.
async fn resolve_order_number(
    state: &AppState,
    txn: &DatabaseTransaction,
    checkout: &Checkout,
    attempt: u32,
) -> Result<String, CheckoutError> {
    if attempt == 0 {
        if let Some(requested) = &checkout.order_number {
            let taken = Orders::find()
                .filter(OrderCol::OrderNumber.eq(requested.as_str()))
                .count(txn)
                .await?
                > 0;
            if !taken {
                return Ok(requested.clone());
            }
            tracing::info!(
                order_number = %requested,
                "requested order number in use, generating one"
            );
        }
    }
    Ok(state.order_numbers.generate(attempt))
}

/// `order_number` is the only caller-controlled unique column on `orders`, so a
/// unique violation raised by the order insert is an order number collision.
fn classify_insert_error(err: DbErr, order_number: &str) -> CheckoutError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            CheckoutError::OrderNumberConflict(order_number.to_string())
        }
        _ => CheckoutError::Database(err),
    }
}
