//! core
//!
//! Domain types and persistence for depot: the ledger, path routing and
//! repository discovery, configuration, and the advisory repository lock.

pub mod config;
pub mod ledger;
pub mod lock;
pub mod paths;

pub use config::{ConfigError, RepoConfig};
pub use ledger::{Entry, Ledger, LedgerError, Record};
pub use lock::{LockError, RepoLock};
pub use paths::{RepoError, RepoPaths};
