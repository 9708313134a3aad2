//! # stockroom-db: Stock Ledger Persistence
//!
//! SQLite storage for the catalog, the movement ledger and the documents
//! that move stock (sales, purchase orders, returns, adjustments).
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  backoffice CLI / seed / embedding app                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockroom-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌───────────────┐   │   │
//! │  │   │   Services    │──►│  StockMutator  │──►│ MovementLedger│   │   │
//! │  │   │ sale, po,     │   │  (stock.rs)    │   │  (ledger.rs)  │   │   │
//! │  │   │ return, adj.  │   │  sole writer   │   │  append-only  │   │   │
//! │  │   └───────┬───────┘   └───────┬────────┘   └───────────────┘   │   │
//! │  │           │                   │                                 │   │
//! │  │           ▼                   ▼                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌───────────────┐   │   │
//! │  │   │ Repositories  │   │   Database     │   │  Migrations   │   │   │
//! │  │   │ product, sale │   │   (pool.rs)    │   │  (embedded)   │   │   │
//! │  │   └───────────────┘   └────────────────┘   └───────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`ledger`] - Movement ledger reads and verification
//! - [`stock`] - The stock mutator
//! - [`notify`] - Low-stock observer hook
//! - [`repository`] - Row access (products, customers, sales, ...)
//! - [`service`] - Transactional operations
//! - [`seed`] - Development catalog
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("stockroom.db")).await?;
//! let sale = db.sales().create(&actor, request).await?;
//! let drift = db.ledger().verify().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod migrations;
pub mod notify;
pub mod pool;
pub mod repository;
pub mod seed;
pub mod service;
pub mod stock;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use ledger::{MovementFilter, MovementLedger};
pub use notify::{LogObserver, SharedObserver, StockObserver};
pub use pool::{Database, DbConfig};
pub use stock::{StockAdjustment, StockChange, StockMutator};

pub use repository::customer::CustomerRepository;
pub use repository::product::ProductRepository;
pub use service::adjustment::AdjustmentService;
pub use service::purchase_order::PurchaseOrderService;
pub use service::returns::ReturnService;
pub use service::sale::SaleService;
