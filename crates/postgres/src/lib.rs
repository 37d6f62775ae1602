//! # Postgres
//!
//! This crate provides the PostgreSQL connection pool and schema migrations for the camper booking service.

/// Database client for the camper booking service.
pub mod database;
