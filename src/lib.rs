//! Live search controller for the rights debugger form.
//!
//! As the operator edits the search fields, the controller issues a live
//! query, renders the matching grants and lets individual grants be revoked
//! inline. Only the latest search may reach the display; revokes run
//! independently and their in-progress state survives result refreshes.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
