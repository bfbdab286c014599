//! services/api/src/lib.rs
//!
//! The Globe Explorer API service: HTTP layer, persistence adapters and the
//! HTTP clients used on the consuming side.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
