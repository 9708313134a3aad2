//! # Low-Stock Notifications
//!
//! Services collect [`LowStockAlert`]s while their transaction runs and hand
//! them to a [`StockObserver`] only after commit. A rolled-back operation
//! never signals.

use std::sync::Arc;

use stockroom_core::LowStockAlert;
use tracing::warn;

/// Receives low-stock alerts after the enclosing transaction committed.
pub trait StockObserver: Send + Sync {
    fn low_stock(&self, alert: &LowStockAlert);
}

/// Default observer: a structured `warn!` per alert.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl StockObserver for LogObserver {
    fn low_stock(&self, alert: &LowStockAlert) {
        warn!(
            product_id = %alert.product_id,
            product = %alert.product_name,
            previous_stock = alert.previous_stock,
            current_stock = alert.current_stock,
            minimum_stock = alert.minimum_stock,
            "Product reached minimum stock"
        );
    }
}

pub type SharedObserver = Arc<dyn StockObserver>;

pub(crate) fn dispatch(observer: &dyn StockObserver, alerts: &[LowStockAlert]) {
    for alert in alerts {
        observer.low_stock(alert);
    }
}
