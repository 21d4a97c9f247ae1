// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostics macros.
//!
//! With the `tracing` feature these forward to `tracing`; without it they
//! expand to nothing, so arguments must not carry side effects.

#[cfg(feature = "tracing")]
macro_rules! zone_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "understory_safe_zone", $($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! zone_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "tracing")]
macro_rules! zone_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "understory_safe_zone", $($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! zone_trace {
    ($($arg:tt)*) => {};
}
