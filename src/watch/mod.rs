//! Watchlist persistence, alert delivery, and the periodic check cycle.

pub mod cycle;
pub mod notify;
pub mod store;

pub use cycle::{notify_reasons, run_cycle, CycleReport, NotifyPolicy, NotifyReason};
pub use notify::{Notifier, NotifyError, NullNotifier, TelegramNotifier};
pub use store::{PriceObservation, SqliteStore, StoreError, WatchItem, WatchStore};
