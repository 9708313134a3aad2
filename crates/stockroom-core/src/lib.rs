//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! Every rule that decides whether stock may move lives here, as pure
//! functions with zero I/O dependencies. `stockroom-db` loads rows, asks this
//! crate what should happen, and writes the answer inside one transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Transport (REST, CLI) - not in this workspace       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  stockroom-db services                          │   │
//! │  │   SaleService  PurchaseOrderService  ReturnService  Adjustments │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ asks                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockroom-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌────────┐  │   │
//! │  │   │  stock  │ │ pricing │ │receiving │ │ returns │ │ money  │  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └─────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (Product, MovementRecord, Sale, PurchaseOrder, ...)
//! - [`commands`] - Inputs accepted by the services
//! - [`money`] - Integer money and basis-point rates
//! - [`stock`] - Stock transition rules and low-stock edge detection
//! - [`pricing`] - Sale totals (discount, clamp, tax)
//! - [`receiving`] - Purchase-order receipt validation and derived status
//! - [`returns`] - Return quantity bounds
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::money::{BasisPoints, Money};
//! use stockroom_core::pricing::{compute_totals, SaleDiscount};
//!
//! let subtotal = Money::from_cents(10_000);
//! let discount = SaleDiscount::new(BasisPoints::from_bps(1_000), Money::from_cents(500));
//! let totals = compute_totals(subtotal, &discount, BasisPoints::zero()).unwrap();
//!
//! // 10% off $100.00, then $5.00 off
//! assert_eq!(totals.total.cents(), 8_500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod commands;
pub mod error;
pub mod money;
pub mod pricing;
pub mod receiving;
pub mod returns;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use commands::*;
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::{BasisPoints, Money};
pub use stock::{LowStockAlert, StockTransition};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines accepted on a single sale.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity on a single sale or return line.
///
/// Guards against keying 10000 instead of 10 at the counter.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Maximum quantity on a single purchase-order line, manual adjustment or
/// opening stock.
pub const MAX_MOVEMENT_QUANTITY: i64 = 1_000_000;

/// Maximum unit price or cost, in cents.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// Maximum length of a free-form movement or return reason.
pub const MAX_REASON_LENGTH: usize = 255;
