// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rota-core: data model shared by the rota scheduler, storage and adapters

pub mod calendar;
pub mod clock;
pub mod event;
pub mod execution;
pub mod id;
pub mod schedule;
pub mod task;
pub mod time_fmt;
pub mod window;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use calendar::{Calendar, CalendarFields, FixedCalendar, LocalCalendar};
pub use clock::{Clock, FakeClock, SystemClock};
pub use event::Event;
pub use execution::{
    truncate_to_minute, ExecutionRecord, ExitStatus, LaunchSpec, OutputLine, OutputStream,
    QueueItem,
};
pub use id::{IdGen, SequentialIdGen, ShortId, UuidIdGen};
pub use schedule::{Field, FieldKind, RuleError, RuleText, ScheduleRule};
pub use task::{TaskDefinition, TaskId, Tool};
pub use time_fmt::{format_duration, format_local};
pub use window::{ActiveWindow, WindowError};
