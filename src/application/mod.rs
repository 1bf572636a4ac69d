//! Request lifecycle and UI-state coordination for the search form.

pub mod backend;
pub mod controller;
pub mod error;
pub mod lifecycle;
pub mod revoke;

#[cfg(test)]
pub(crate) mod test_support;
