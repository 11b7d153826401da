// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod agenda;
pub mod cancel;
pub mod logs;
pub mod resolve;
pub mod run;
pub mod task;
