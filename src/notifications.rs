//! Realtime row-change notifications.
//!
//! Writers publish a [`RowChange`] after a reservation or payment row is
//! inserted or updated. Each listener task applies the changes for one
//! organization to a shared [`NotificationState`]. Delivery is best effort:
//! a change published with no listener is dropped, a listener that falls
//! behind skips what it missed, and nothing is deduplicated. Dropping or
//! aborting the listener task unsubscribes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const RECENT_LIMIT: usize = 20;

/// Table a change happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchedTable {
    /// `reservations`
    Reservations,
    /// `payments`
    Payments,
}

/// Kind of row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A new row
    Insert,
    /// An existing row changed
    Update,
}

/// A single row-change event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowChange {
    /// Table the row lives in
    pub table: WatchedTable,
    /// What happened to it
    pub kind: ChangeKind,
    /// Tenant the row belongs to
    pub organization_id: String,
    /// Primary key of the row
    pub row_id: i64,
    /// When the change was published
    pub occurred_at: DateTime<Utc>,
}

impl RowChange {
    /// Builds a change stamped with the current time.
    #[must_use]
    pub fn now(table: WatchedTable, kind: ChangeKind, organization_id: &str, row_id: i64) -> Self {
        Self {
            table,
            kind,
            organization_id: organization_id.to_string(),
            row_id,
            occurred_at: Utc::now(),
        }
    }

    /// Short human-readable description
    #[must_use]
    pub fn describe(&self) -> String {
        let table = match self.table {
            WatchedTable::Reservations => "Reservation",
            WatchedTable::Payments => "Payment",
        };
        let verb = match self.kind {
            ChangeKind::Insert => "created",
            ChangeKind::Update => "updated",
        };
        format!("{table} #{} {verb}", self.row_id)
    }
}

/// Fan-out channel for row changes.
#[derive(Debug, Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<RowChange>,
}

impl NotificationHub {
    /// Creates a hub buffering up to `capacity` undelivered changes per listener.
    ///
    /// A `capacity` of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a change and returns how many listeners will see it.
    pub fn publish(&self, change: RowChange) -> usize {
        debug!("Publishing {:?}", change);
        // No listeners is not an error
        self.sender.send(change).unwrap_or(0)
    }

    /// Opens a new receiver; only changes published afterwards are delivered.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RowChange> {
        self.sender.subscribe()
    }

    /// Number of live receivers
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// In-memory counters driven by row changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationState {
    /// Reservations created since last read
    pub new_reservations: u64,
    /// Reservations updated since last read
    pub updated_reservations: u64,
    /// Payments created since last read
    pub new_payments: u64,
    /// Payments updated since last read
    pub updated_payments: u64,
    /// Most recent changes, newest first
    pub recent: VecDeque<RowChange>,
}

impl NotificationState {
    /// Counts a change and remembers it in the recent list.
    pub fn apply(&mut self, change: &RowChange) {
        let counter = match (change.table, change.kind) {
            (WatchedTable::Reservations, ChangeKind::Insert) => &mut self.new_reservations,
            (WatchedTable::Reservations, ChangeKind::Update) => &mut self.updated_reservations,
            (WatchedTable::Payments, ChangeKind::Insert) => &mut self.new_payments,
            (WatchedTable::Payments, ChangeKind::Update) => &mut self.updated_payments,
        };
        *counter += 1;

        self.recent.push_front(change.clone());
        self.recent.truncate(RECENT_LIMIT);
    }

    /// Total changes since the last [`Self::mark_all_read`]
    #[must_use]
    pub const fn unread_count(&self) -> u64 {
        self.new_reservations + self.updated_reservations + self.new_payments + self.updated_payments
    }

    /// Zeroes the counters; the recent list is kept for context.
    pub const fn mark_all_read(&mut self) {
        self.new_reservations = 0;
        self.updated_reservations = 0;
        self.new_payments = 0;
        self.updated_payments = 0;
    }
}

/// Spawns a task applying `organization_id`'s changes to `state`.
///
/// The task ends when the hub is dropped; abort the handle to unsubscribe
/// earlier.
#[must_use]
pub fn spawn_listener(
    hub: &NotificationHub,
    organization_id: String,
    state: Arc<RwLock<NotificationState>>,
) -> JoinHandle<()> {
    let mut receiver = hub.subscribe();

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(change) if change.organization_id == organization_id => {
                    state.write().await.apply(&change);
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Notification listener for {organization_id} skipped {skipped} changes");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("Notification listener for {organization_id} stopped");
    })
}
