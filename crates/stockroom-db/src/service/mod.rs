//! # Services
//!
//! Each public operation opens one transaction, validates, calls the stock
//! mutator once per affected line, and commits. Any error rolls back
//! everything.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  service op                                                             │
//! │     │                                                                   │
//! │     ├─ validate command (no I/O)                                        │
//! │     ├─ pool.begin()                                                     │
//! │     ├─ load + check rows ─────────────┐                                 │
//! │     ├─ write header / items           │  all on &mut *tx                │
//! │     ├─ StockMutator::adjust × N ──────┘                                 │
//! │     ├─ commit  (or rollback on the first error)                         │
//! │     └─ dispatch low-stock alerts                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod adjustment;
pub mod purchase_order;
pub mod returns;
pub mod sale;

use sqlx::{Sqlite, Transaction};
use stockroom_core::ErrorKind;
use tracing::{error, warn};

use crate::error::DbResult;

/// Commits on success, rolls back and logs on failure.
pub(crate) async fn finish<T>(
    tx: Transaction<'static, Sqlite>,
    outcome: DbResult<T>,
    operation: &'static str,
) -> DbResult<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if err.kind() == ErrorKind::Internal {
                error!(operation, error = %err, "Storage failure, rolling back");
            } else {
                warn!(operation, error = %err, "Operation rejected, rolling back");
            }

            if let Err(rollback_err) = tx.rollback().await {
                error!(operation, error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}
