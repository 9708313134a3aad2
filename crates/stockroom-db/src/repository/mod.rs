//! # Repository Module
//!
//! Row access for every table except the ledger (see [`crate::ledger`]).
//!
//! ## Two Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Pool-owning repositories (standalone operations)                      │
//! │  ├── ProductRepository   db.products()                                 │
//! │  └── CustomerRepository  db.customers()                                │
//! │                                                                         │
//! │  Connection-scoped functions (composed inside a service transaction)   │
//! │  ├── product::fetch / require           (&mut SqliteConnection, ..)    │
//! │  ├── sale::insert_sale / fetch_detail                                  │
//! │  ├── purchase_order::set_received / set_status                         │
//! │  └── returns::returned_quantities / refunded_total                     │
//! │                                                                         │
//! │  Callers pass `&mut *tx`, so every read sees the transaction's own     │
//! │  uncommitted writes.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod customer;
pub mod product;
pub mod purchase_order;
pub mod returns;
pub mod sale;
