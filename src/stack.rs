//! Stack growth for the recursive parts of parsing and evaluation.
//!
//! Table constructors nest without limit and module text comes from
//! untrusted wiki pages, so the recursive descent over them runs under
//! [`ensure_sufficient_stack`], which moves onto a fresh heap-allocated stack
//! segment when the current one runs low.

/// If less than this much stack remains, the stack is grown.
const RED_ZONE: usize = 100 * 1024;

/// Size of each newly allocated stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Runs `f`, first growing the stack if it is close to overflowing.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
