use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::orders::{CheckoutItem, CheckoutRequest, PlacedOrderResponse},
    response::ErrorResponse,
    routes::{health, orders},
};

#[derive(OpenApi)]
#[openapi(
    paths(health::health_check, orders::create_order),
    components(
        schemas(
            CheckoutRequest,
            CheckoutItem,
            PlacedOrderResponse,
            ErrorResponse,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Orders", description = "Order placement endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
