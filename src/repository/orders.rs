//! Order log and the store that guards status changes

use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::domain::aggregates::Order;
use crate::domain::events::DomainEvent;
use super::{check_version, read_json, write_json, OrderRepository, StoreError, RECORD_VERSION};

#[derive(Debug, Serialize, Deserialize)]
struct OrderLog {
    version: u32,
    orders: Vec<Order>,
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryOrderRepository { orders: Vec<Order> }

impl InMemoryOrderRepository {
    pub fn new() -> Self { Self::default() }
    pub fn with_orders(orders: Vec<Order>) -> Self { Self { orders } }
}

impl OrderRepository for InMemoryOrderRepository {
    fn load(&self) -> Result<Vec<Order>, StoreError> { Ok(self.orders.clone()) }
    fn save(&mut self, orders: &[Order]) -> Result<(), StoreError> {
        self.orders = orders.to_vec();
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct JsonFileOrderRepository { path: PathBuf }

impl JsonFileOrderRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }
    pub fn path(&self) -> &Path { &self.path }
}

impl OrderRepository for JsonFileOrderRepository {
    fn load(&self) -> Result<Vec<Order>, StoreError> {
        let Some(log) = read_json::<OrderLog>(&self.path)? else { return Ok(vec![]) };
        check_version(log.version)?;
        debug!(path = %self.path.display(), count = log.orders.len(), "orders loaded");
        Ok(log.orders)
    }

    fn save(&mut self, orders: &[Order]) -> Result<(), StoreError> {
        write_json(&self.path, &OrderLog { version: RECORD_VERSION, orders: orders.to_vec() })
    }
}

/// A stored order and the notifications its last change raised.
#[derive(Clone, Debug)]
pub struct OrderChange<'a> {
    pub order: &'a Order,
    pub events: Vec<DomainEvent>,
}

/// Append-only order list. Only status fields change after creation.
#[derive(Debug)]
pub struct OrderStore<R: OrderRepository> {
    repo: R,
    orders: Vec<Order>,
}

impl<R: OrderRepository> OrderStore<R> {
    pub fn open(repo: R) -> Result<Self, StoreError> {
        let orders = repo.load()?;
        Ok(Self { repo, orders })
    }

    pub fn list(&self) -> &[Order] { &self.orders }
    pub fn len(&self) -> usize { self.orders.len() }
    pub fn is_empty(&self) -> bool { self.orders.is_empty() }
    pub fn find_by_id(&self, id: &str) -> Option<&Order> { self.orders.iter().find(|o| o.id() == id) }

    pub fn append(&mut self, order: Order) -> Result<OrderChange<'_>, StoreError> {
        self.orders.push(order);
        if let Err(e) = self.repo.save(&self.orders) {
            self.orders.pop();
            return Err(e);
        }
        let count = self.orders.len();
        let order = self.orders.last_mut().ok_or_else(|| StoreError::NotFound(String::new()))?;
        let events = order.take_events();
        info!(order_id = %order.id(), count, "order stored");
        Ok(OrderChange { order, events })
    }

    /// Cancels `id` if it is inside its window and not yet terminal.
    pub fn cancel(&mut self, id: &str, now: DateTime<Utc>) -> Result<OrderChange<'_>, StoreError> {
        self.update(id, |order| order.cancel(now).map_err(StoreError::from))
    }

    /// Moves `id` one fulfillment step forward.
    pub fn advance(&mut self, id: &str) -> Result<OrderChange<'_>, StoreError> {
        self.update(id, |order| order.advance_fulfillment().map(|_| ()).map_err(StoreError::from))
    }

    fn update(&mut self, id: &str, f: impl FnOnce(&mut Order) -> Result<(), StoreError>) -> Result<OrderChange<'_>, StoreError> {
        let idx = self.orders.iter().position(|o| o.id() == id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let previous = self.orders[idx].clone();
        f(&mut self.orders[idx])?;
        if let Err(e) = self.repo.save(&self.orders) {
            self.orders[idx] = previous;
            return Err(e);
        }
        let order = &mut self.orders[idx];
        let events = order.take_events();
        debug!(order_id = %order.id(), status = ?order.status(), "order updated");
        Ok(OrderChange { order, events })
    }

    pub fn into_inner(self) -> R { self.repo }
}
