//! Engine behind an injected table of contents overlay.
//!
//! The [`toc`] module decides whether a page deserves a table of contents,
//! extracts and places it and tracks the reading position. [`runtime`]
//! drives it from page activity, [`bridge`] carries settings between
//! pages and [`dom`] is the seam to the host page.

pub mod bridge;
pub mod cli;
pub mod config;
pub mod dom;
pub mod reactive;
pub mod runtime;
pub mod toc;
pub mod utils;

#[cfg(test)]
mod test_utils;
