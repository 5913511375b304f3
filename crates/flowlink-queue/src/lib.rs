// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Asynchronous sync path of the Flowlink integration engine.
//!
//! [`TaskQueue`] enqueues syncs and reports their status, [`RetryPolicy`]
//! decides when a failed attempt is tried again, and [`WorkerPool`] drains
//! due tasks. Task records live in any [`flowlink_core::TaskBackend`]; the
//! in-process [`MemoryTaskBackend`] is provided here.

pub mod memory;
pub mod queue;
pub mod retry;
pub mod worker;

pub use memory::MemoryTaskBackend;
pub use queue::TaskQueue;
pub use retry::RetryPolicy;
pub use worker::WorkerPool;
