//! # clearpath-core
//!
//! The clearance application's core logic, kept free of transport and UI
//! concerns:
//!
//! - [`resolver`] - maps an authenticated session to exactly one role
//!   profile (or none), repairing legacy row ids along the way
//! - [`controller`] - the session/redirect state machine deciding where a
//!   signed-in identity lands, with a one-shot retry and anti-loop guard
//! - [`aggregator`] - gap-filled clearance views for students and officers,
//!   plus the officer's record-clearance mutation
//! - [`certificate`] - renders the printable clearance certificate once
//!   every department is cleared
//! - [`notify`] - the external reminder-notification seam (interface plus
//!   a logging stub)
//!
//! All backend access goes through `clearpath_store::IdentityStore`, so
//! every component here runs unchanged against the REST backend or the
//! in-memory test backend.

pub mod aggregator;
pub mod certificate;
pub mod controller;
pub mod notify;
pub mod resolver;
