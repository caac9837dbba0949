//! Stack management module
//!
//! This module implements the stacked pull request core:
//! - Stack data model and upstream chain computation
//! - Stack persistence and the current-stack pointer
//! - Stack lifecycle operations (generate, extend, enable, disable, delete)
//! - Reconciliation against git and the review service

pub mod hooks;
pub mod manager;
pub mod stack;
pub mod store;
pub mod sync;

pub use hooks::{PreCreateHook, SkipCiHook};
pub use manager::StackManager;
pub use stack::{branch_name, check_position, item_title, ChainedItem, Stack, StackItem};
pub use store::StackStore;
pub use sync::{ItemOutcome, SyncEngine};
