//! CLI command implementations.

pub mod check;
pub mod run;
pub mod watchlist;

pub use check::CheckCommand;
pub use run::RunCommand;
pub use watchlist::WatchlistCommand;
