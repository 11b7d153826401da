// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage layer for rota: the task catalog and the execution log

mod catalog;
mod error;
mod execution_log;

#[cfg(any(test, feature = "test-support"))]
mod memory;

pub use catalog::{CatalogFile, TaskCatalog};
pub use error::StorageError;
pub use execution_log::{ExecutionLog, RecordSink};

#[cfg(any(test, feature = "test-support"))]
pub use memory::{MemoryCatalog, MemorySink};
