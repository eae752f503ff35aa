//! Async client for the document-generation service.
//!
//! Submits design documents, polls job progress while the upload is
//! pending, and saves the resulting archive. [`controller::JobController`]
//! is the entry point; the other modules are its collaborators and are
//! public for reuse and testing.

pub mod api;
pub mod board;
pub mod config;
pub mod controller;
pub mod delivery;
pub mod payload;
pub mod poller;
pub mod service;
