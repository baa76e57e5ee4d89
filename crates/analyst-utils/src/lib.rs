//! Shared utilities for the market analyst workspace
//!
//! Tracing setup used by the binaries and a few text helpers for log
//! previews and length checks on model output.

pub mod logging;
pub mod text;

pub use logging::{LogFormat, init_tracing, init_tracing_with};
pub use text::{char_len, preview, truncate_chars};
