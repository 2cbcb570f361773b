//! Hierarchical grouping of the flat pipeline collections
//!
//! Builds the sequence → package → shot → department → task tree shown by
//! the hierarchy view. The build is a pure function of its inputs: input
//! order is kept at every level, children with dangling foreign keys are
//! skipped, and a collection that has not loaded yet is just an empty slice.

use serde::Serialize;
use std::collections::HashMap;

use crate::domain::entities::{Department, Package, Sequence, Shot, Task};

/// Flat collections feeding the tree.
///
/// `sequences` must already be narrowed to the selected project; the other
/// collections are unfiltered.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchyInputs<'a> {
    pub sequences: &'a [Sequence],
    pub packages: &'a [Package],
    pub shots: &'a [Shot],
    pub departments: &'a [Department],
    pub tasks: &'a [Task],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceNode {
    #[serde(flatten)]
    pub sequence: Sequence,
    pub packages: Vec<PackageNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageNode {
    #[serde(flatten)]
    pub package: Package,
    pub shots: Vec<ShotNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShotNode {
    #[serde(flatten)]
    pub shot: Shot,
    /// Only departments with at least one task on this shot
    pub departments: Vec<DepartmentBranch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentBranch {
    #[serde(flatten)]
    pub department: Department,
    pub tasks: Vec<Task>,
}

/// Groups items by a foreign key, keeping input order inside each group
fn group_by<T, K, F>(items: &[T], key: F) -> HashMap<K, Vec<&T>>
where
    K: std::hash::Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut groups: HashMap<K, Vec<&T>> = HashMap::new();
    for item in items {
        groups.entry(key(item)).or_default().push(item);
    }
    groups
}

/// Join the flat collections into the sequence tree
pub fn build_hierarchy(inputs: &HierarchyInputs<'_>) -> Vec<SequenceNode> {
    let packages_by_sequence = group_by(inputs.packages, |p| p.sequence_id);
    let shots_by_package = group_by(inputs.shots, |s| s.package_id);
    let tasks_by_slot = group_by(inputs.tasks, |t| (t.shot_id, t.department_id));

    let build_shot = |shot: &Shot| ShotNode {
        shot: shot.clone(),
        departments: inputs
            .departments
            .iter()
            .filter_map(|department| {
                let tasks = tasks_by_slot.get(&(shot.id, department.id))?;
                Some(DepartmentBranch {
                    department: department.clone(),
                    tasks: tasks.iter().map(|t| (*t).clone()).collect(),
                })
            })
            .collect(),
    };

    let build_package = |package: &Package| PackageNode {
        package: package.clone(),
        shots: shots_by_package
            .get(&package.id)
            .map(|shots| shots.iter().map(|s| build_shot(*s)).collect())
            .unwrap_or_default(),
    };

    inputs
        .sequences
        .iter()
        .map(|sequence| SequenceNode {
            sequence: sequence.clone(),
            packages: packages_by_sequence
                .get(&sequence.id)
                .map(|packages| packages.iter().map(|p| build_package(*p)).collect())
                .unwrap_or_default(),
        })
        .collect()
}

/// Package and shot counts for one sequence (pipeline overview cards)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceSummary {
    pub sequence_id: i64,
    pub code: String,
    pub package_count: usize,
    pub shot_count: usize,
    pub task_count: usize,
}

/// A built tree plus lookups over it
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectHierarchy {
    pub sequences: Vec<SequenceNode>,
}

impl ProjectHierarchy {
    pub fn build(inputs: &HierarchyInputs<'_>) -> Self {
        Self {
            sequences: build_hierarchy(inputs),
        }
    }

    #[mutants::skip] // Delegates to Vec::is_empty on the sequence list
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageNode> {
        self.sequences.iter().flat_map(|s| s.packages.iter())
    }

    pub fn shots(&self) -> impl Iterator<Item = &ShotNode> {
        self.packages().flat_map(|p| p.shots.iter())
    }

    /// Every task placed in the tree, in display order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.shots()
            .flat_map(|s| s.departments.iter())
            .flat_map(|d| d.tasks.iter())
    }

    pub fn task_count(&self) -> usize {
        self.tasks().count()
    }

    pub fn find_package(&self, package_id: i64) -> Option<&PackageNode> {
        self.packages().find(|p| p.package.id == package_id)
    }

    pub fn find_shot(&self, shot_id: i64) -> Option<&ShotNode> {
        self.shots().find(|s| s.shot.id == shot_id)
    }

    pub fn find_task(&self, task_id: i64) -> Option<&Task> {
        self.tasks().find(|t| t.id == task_id)
    }

    pub fn summaries(&self) -> Vec<SequenceSummary> {
        self.sequences
            .iter()
            .map(|node| {
                let shots = node.packages.iter().flat_map(|p| p.shots.iter());
                SequenceSummary {
                    sequence_id: node.sequence.id,
                    code: node.sequence.code.clone(),
                    package_count: node.packages.len(),
                    shot_count: shots.clone().count(),
                    task_count: shots
                        .flat_map(|s| s.departments.iter())
                        .map(|d| d.tasks.len())
                        .sum(),
                }
            })
            .collect()
    }
}
