//! HTTP control surface over the [`crate::processor::Processor`].
//!
//! See `rest.rs`; this replaces the out-of-scope framed byte-stream/eterm
//! wire codec with a JSON transport for the same four commands, for
//! local operation and testing.

pub mod rest;

pub use rest::{build_router, AppState};
