//! Service layer: external tracker access, mapping, reconciliation and
//! score verification

pub mod consistency_checker;
pub mod issue_mapper;
pub mod redmine_client;
pub mod sync_engine;
