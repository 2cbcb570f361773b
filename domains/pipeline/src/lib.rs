//! Pipeline domain: projects, shots, tasks, versions and the hierarchy view model

pub mod domain;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{
    Department, InternalVersion, NewTask, Package, Priority, Project, Sequence, Shot, Task,
    TaskStatus, UpdateTask, User, Version,
};
pub use domain::expansion::{ExpansionState, NodeClass, NodeKey};
pub use domain::filters::TaskFilter;
pub use domain::hierarchy::{
    build_hierarchy, DepartmentBranch, HierarchyInputs, PackageNode, ProjectHierarchy,
    SequenceNode, SequenceSummary, ShotNode,
};
pub use domain::versions::{
    current_internal_version_label, find_current_version, DEFAULT_INTERNAL_VERSION_LABEL,
};
