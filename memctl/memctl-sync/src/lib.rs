//! # Cooperative cancellation
//!
//! Long-running memory operations poll a [`CancellationToken`] between
//! page-sized chunks. Whoever owns the other end (an interrupt handler, a
//! watchdog thread, a test) calls [`cancel`](CancellationToken::cancel).
//!
//! The flag itself is a [`CancellationFlag`], which can live in a `static` so
//! that async-signal-safe code can set it without touching the allocator.

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod flag;
mod token;

pub use flag::CancellationFlag;
pub use token::CancellationToken;
