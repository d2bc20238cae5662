use crate::models::cart::{CartLine, CartProduct, CartTotals};
use crate::models::errors::AppError;
use crate::services::cart::{CartService, FileStorage};
use crate::utils::cookies::{build_cookie, read_cookie};
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::{num::NonZeroU32, time::Duration};
use uuid::Uuid;

/// Cookie identifying an anonymous cart
pub const CART_COOKIE: &str = "cart_id";

const CART_COOKIE_MAX_AGE: Duration = Duration::from_secs(60 * 60 * 24 * 30);

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    #[serde(flatten)]
    pub product: CartProduct,
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Cart bound to one request's `cart_id` cookie
struct CartHandle {
    id: Uuid,
    is_new: bool,
}

impl CartHandle {
    fn from_headers(headers: &HeaderMap) -> Self {
        let existing = read_cookie(headers, CART_COOKIE).and_then(|id| Uuid::parse_str(&id).ok());

        Self {
            id: existing.unwrap_or_else(Uuid::new_v4),
            is_new: existing.is_none(),
        }
    }

    /// Runs a cart operation on the blocking pool under the cart's lock
    async fn run<T, F>(&self, app_state: &AppState, op: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(&CartService<FileStorage>) -> T + Send + 'static,
    {
        let carts = app_state.carts.clone();
        let id = self.id;

        tokio::task::spawn_blocking(move || carts.with_cart(id, op))
            .await
            .map_err(|e| AppError::internal_error(format!("Cart task failed: {}", e)))
    }

    fn respond(&self, app_state: &AppState, lines: Vec<CartLine>) -> Response {
        let totals = CartTotals::from_lines(&lines);
        let body = Json(json!({
            "success": true,
            "items": lines,
            "totalItems": totals.total_items,
            "totalPrice": totals.total_price
        }));

        if self.is_new {
            let cookie = build_cookie(
                CART_COOKIE,
                &self.id.to_string(),
                CART_COOKIE_MAX_AGE,
                app_state.config.secure_cookies(),
            );
            (AppendHeaders([(header::SET_COOKIE, cookie)]), body).into_response()
        } else {
            body.into_response()
        }
    }
}

pub async fn get_cart(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let cart = CartHandle::from_headers(&headers);
    let lines = cart.run(&app_state, |service| service.get_cart()).await?;

    Ok(cart.respond(&app_state, lines))
}

pub async fn add_item(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = payload?;
    let product = validate_product(req.product)?;
    let quantity = match req.quantity {
        Some(quantity) => Some(positive_quantity(quantity)?),
        None => None,
    };

    let cart = CartHandle::from_headers(&headers);
    let lines = cart
        .run(&app_state, move |service| service.add_item(product, quantity))
        .await?;

    Ok(cart.respond(&app_state, lines))
}

/// Sets a line's quantity; zero or less removes it
pub async fn update_quantity(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    product_id: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateQuantityRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Path(product_id) = product_id?;
    let Json(req) = payload?;

    let cart = CartHandle::from_headers(&headers);
    let lines = cart
        .run(&app_state, move |service| service.update_quantity(&product_id, req.quantity))
        .await?;

    Ok(cart.respond(&app_state, lines))
}

pub async fn remove_item(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    product_id: Result<Path<String>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(product_id) = product_id?;

    let cart = CartHandle::from_headers(&headers);
    let lines = cart
        .run(&app_state, move |service| service.remove_item(&product_id))
        .await?;

    Ok(cart.respond(&app_state, lines))
}

pub async fn clear_cart(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let cart = CartHandle::from_headers(&headers);
    cart.run(&app_state, |service| service.clear_cart()).await?;

    Ok(cart.respond(&app_state, Vec::new()))
}

fn validate_product(mut product: CartProduct) -> Result<CartProduct, AppError> {
    product.product_id = product.product_id.trim().to_string();
    product.name = product.name.trim().to_string();

    if product.product_id.is_empty() {
        return Err(AppError::validation_failed("productId is required"));
    }
    if product.name.is_empty() {
        return Err(AppError::validation_failed("name is required"));
    }
    Ok(product)
}

fn positive_quantity(quantity: i64) -> Result<NonZeroU32, AppError> {
    u32::try_from(quantity)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or_else(|| AppError::validation_failed("quantity must be a positive integer"))
}
