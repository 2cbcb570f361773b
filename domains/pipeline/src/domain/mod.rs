//! Domain layer for the pipeline
//!
//! Entities mirror the REST API's JSON shapes; the remaining modules are
//! pure view-model logic over those entities.

pub mod entities;
pub mod expansion;
pub mod filters;
pub mod hierarchy;
pub mod versions;
