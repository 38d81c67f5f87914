//! HTTP API handlers
//!
//! Thin JSON surface over the core: no rendering, no sessions, no
//! static assets. Handlers validate, dispatch into `db`/`services`, and
//! shape responses.

pub mod consistency;
pub mod health;
pub mod scores;
pub mod subjects;
pub mod sync;
