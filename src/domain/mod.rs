//! Core domain types and logic.

pub mod table;
pub mod returns;
pub mod momentum;
pub mod selection;
pub mod weights;
pub mod backtest;
pub mod metrics;
pub mod pipeline;
pub mod config;
pub mod config_validation;
pub mod universe;
pub mod error;
