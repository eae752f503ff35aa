//! Domain types and pure logic for the specgen document-generation client.
//!
//! Nothing in this crate performs I/O: validation of file selections,
//! job identifiers, the job lifecycle record, failure classification, and
//! `Content-Disposition` filename parsing all live here so that the
//! client crate and its tests can share them.

pub mod disposition;
pub mod error;
pub mod failure;
pub mod job;
pub mod payload;
pub mod types;
pub mod validation;
