//! # Change Feed
//!
//! In-process stand-in for the hosted store's realtime channel: repositories
//! publish "this table changed for this franchise" after every successful
//! write, and report views subscribe per table to know when to re-fetch.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Change Feed Contract                             │
//! │                                                                         │
//! │  Repository write ──► publish(table, franchise)                        │
//! │                            │                                            │
//! │                            ▼                                            │
//! │  ┌──────────────────────────────────────────┐                          │
//! │  │      broadcast channel (bounded)          │                          │
//! │  └──────────────────────────────────────────┘                          │
//! │        │                │                │                              │
//! │        ▼                ▼                ▼                              │
//! │  sales screen     report screen    owner overview                      │
//! │  (re-fetch)       (re-fetch)       (re-fetch)                          │
//! │                                                                         │
//! │  The event is a SIGNAL, not a payload: consumers re-pull the rows      │
//! │  they care about. A lagged subscriber therefore loses nothing - the    │
//! │  next signal triggers the same re-fetch.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use tracing::debug;

/// Default broadcast capacity. Signals are tiny; this only bounds how far a
/// slow subscriber can fall behind before it observes a lag (and re-fetches).
const DEFAULT_CAPACITY: usize = 256;

// =============================================================================
// Event Types
// =============================================================================

/// Tables a consumer can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedTable {
    Franchises,
    AdminSettings,
    Products,
    Sales,
    Expenditures,
    ProfitSharingPayments,
}

impl fmt::Display for ChangedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangedTable::Franchises => "franchises",
            ChangedTable::AdminSettings => "admin_settings",
            ChangedTable::Products => "products",
            ChangedTable::Sales => "sales",
            ChangedTable::Expenditures => "expenditures",
            ChangedTable::ProfitSharingPayments => "profit_sharing_payments",
        };
        f.write_str(name)
    }
}

/// A change signal. Carries which table changed and for which franchise,
/// nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: ChangedTable,
    pub franchise_id: String,
}

// =============================================================================
// Change Hub
// =============================================================================

/// Fan-out point for change signals.
///
/// Cheap to clone; the [`crate::Database`] owns one and hands it to every
/// repository it constructs.
#[derive(Debug, Clone)]
pub struct ChangeHub {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeHub {
    /// Creates a hub with the default capacity.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(DEFAULT_CAPACITY);
        ChangeHub { tx }
    }

    /// Subscribes to every change signal, unfiltered.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Subscribes to one table, optionally narrowed to one franchise.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let mut watcher = db.changes().watch(ChangedTable::Sales, Some("franchise-1"));
    /// while watcher.changed().await.is_some() {
    ///     refresh_sales_view().await;
    /// }
    /// ```
    pub fn watch(&self, table: ChangedTable, franchise_id: Option<&str>) -> TableWatcher {
        TableWatcher {
            rx: self.tx.subscribe(),
            table,
            franchise_id: franchise_id.map(str::to_string),
        }
    }

    /// Publishes a change signal. Called by repositories after a successful
    /// write; a send with no subscribers is not an error.
    pub(crate) fn publish(&self, table: ChangedTable, franchise_id: &str) {
        debug!(table = %table, franchise_id = %franchise_id, "Publishing change");
        let _ = self.tx.send(ChangeEvent {
            table,
            franchise_id: franchise_id.to_string(),
        });
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        ChangeHub::new()
    }
}

// =============================================================================
// Table Watcher
// =============================================================================

/// A filtered subscription to one table's change signals.
pub struct TableWatcher {
    rx: broadcast::Receiver<ChangeEvent>,
    table: ChangedTable,
    franchise_id: Option<String>,
}

impl TableWatcher {
    /// Waits for the next matching signal.
    ///
    /// Returns `None` once the hub (and therefore the database) is gone.
    /// A lagged receiver skips ahead: the consumer re-fetches on the next
    /// signal anyway, so dropped signals cost nothing.
    pub async fn changed(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if event.table != self.table {
                        continue;
                    }
                    if let Some(wanted) = &self.franchise_id {
                        if &event.franchise_id != wanted {
                            continue;
                        }
                    }
                    return Some(event);
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
