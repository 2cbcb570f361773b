//! VFXTrack application composition root
//!
//! The hierarchy view controller, its query cache and the row projection
//! used by the `local` runner.

pub mod cache;
pub mod rows;
pub mod view;

pub use cache::{Collection, QueryCache, QueryKey};
pub use rows::{expand_all, visible_rows, Row, RowKind};
pub use view::{HierarchyView, InternalVersionsFetched, VersionsFetched, ViewError};
