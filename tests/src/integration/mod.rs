//! Integration scenarios

pub mod fallback;
pub mod filters;
pub mod growth;
pub mod stampede;
