use crate::models::cart::{CartLine, CartProduct, CartTotals};
use crate::services::cart::{CartService, CartStorage};
use std::num::NonZeroU32;
use tokio::sync::watch;

/// In-memory mirror of the cart for a UI layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartSnapshot {
    NotLoaded,
    Loaded(Vec<CartLine>),
}

impl CartSnapshot {
    pub fn lines(&self) -> &[CartLine] {
        match self {
            CartSnapshot::NotLoaded => &[],
            CartSnapshot::Loaded(lines) => lines,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, CartSnapshot::Loaded(_))
    }
}

/// Wraps a [`CartService`] and keeps the latest lines in memory.
///
/// The cart is read from storage once on [`CartState::mount`]; after that
/// every mutation goes through the service and republishes the resulting
/// lines to subscribers, so reads never touch storage.
pub struct CartState<S> {
    service: CartService<S>,
    state: watch::Sender<CartSnapshot>,
}

impl<S: CartStorage> CartState<S> {
    pub fn new(service: CartService<S>) -> Self {
        let (state, _) = watch::channel(CartSnapshot::NotLoaded);
        Self { service, state }
    }

    /// Loads the cart from storage the first time it is called
    pub fn mount(&self) {
        if self.is_loaded() {
            return;
        }
        self.publish(self.service.get_cart());
    }

    pub fn is_loaded(&self) -> bool {
        self.state.borrow().is_loaded()
    }

    /// Receives the new lines after every change
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.state.subscribe()
    }

    pub fn items(&self) -> Vec<CartLine> {
        self.state.borrow().lines().to_vec()
    }

    pub fn add_item(&self, product: CartProduct, quantity: Option<NonZeroU32>) {
        let lines = self.service.add_item(product, quantity);
        self.publish(lines);
    }

    pub fn update_quantity(&self, product_id: &str, quantity: i64) {
        let lines = self.service.update_quantity(product_id, quantity);
        self.publish(lines);
    }

    pub fn remove_item(&self, product_id: &str) {
        let lines = self.service.remove_item(product_id);
        self.publish(lines);
    }

    pub fn clear_cart(&self) {
        self.service.clear_cart();
        self.publish(Vec::new());
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from_lines(self.state.borrow().lines())
    }

    pub fn total_items(&self) -> u64 {
        self.totals().total_items
    }

    pub fn total_price(&self) -> u64 {
        self.totals().total_price
    }

    pub fn is_in_cart(&self, product_id: &str) -> bool {
        self.state
            .borrow()
            .lines()
            .iter()
            .any(|line| line.product_id == product_id)
    }

    pub fn item_quantity(&self, product_id: &str) -> u32 {
        self.state
            .borrow()
            .lines()
            .iter()
            .find(|line| line.product_id == product_id)
            .map_or(0, |line| line.quantity)
    }

    fn publish(&self, lines: Vec<CartLine>) {
        self.state.send_replace(CartSnapshot::Loaded(lines));
    }
}
