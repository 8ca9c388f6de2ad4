//! Computational core of a workload-manager scheduling daemon: the FCFS
//! scheduling engine, the chain runtime that runs algorithms over a
//! snapshot, and the chain controller/processor that dispatches commands
//! across many concurrently running chains.

pub mod algorithm;
pub mod api;
pub mod chain;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod fcfs;
pub mod metrics;
pub mod model;
pub mod processor;
pub mod queue;
pub mod rh;

pub use error::{Error, Result};
