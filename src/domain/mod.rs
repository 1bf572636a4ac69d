//! Domain types shared by the search form and its collaborators.

pub mod criteria;
pub mod error;
pub mod results;
