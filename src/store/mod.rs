//! Task item storage subsystem.
//!
//! # Data Flow
//! ```text
//! Request handler (inside an instrumented operation)
//!     → memory.rs (TaskStore: list/get/insert/update/delete)
//!     → item.rs (TaskItem owned by the store, cloned out to callers)
//! ```
//!
//! # Design Decisions
//! - Memory-resident, single process, no durability
//! - One lock around the whole collection; every operation takes it once
//! - No telemetry here: instrumentation wraps store calls from outside

pub mod item;
pub mod memory;

pub use item::{CreateTask, TaskItem, UpdateTask};
pub use memory::{StoreError, StoreResult, TaskStore};
