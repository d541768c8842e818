//! # clearpath-types
//!
//! Shared domain types used across the Clearpath workspace: role profiles,
//! clearance records and views, the department catalog, and session types.
//!
//! All row shapes mirror the hosted backend's tables as consumed by the
//! client; timestamps coming from the backend are RFC 3339 strings.

pub mod clearance;
pub mod department;
pub mod profile;
pub mod session;
