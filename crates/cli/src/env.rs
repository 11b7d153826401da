// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment switches read by the CLI.
//!
//! State paths and scheduler settings come from `rota_daemon::Config`, so
//! only presentation switches live here.

/// Color preference from the environment.
///
/// `NO_COLOR=1` wins over `COLOR=1`; `None` means follow the terminal.
pub fn color_override() -> Option<bool> {
    if flag("NO_COLOR") {
        Some(false)
    } else if flag("COLOR") {
        Some(true)
    } else {
        None
    }
}

fn flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| v == "1")
}
