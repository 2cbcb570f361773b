//! Flattening of the hierarchy into display rows
//!
//! Packages sit at depth 0, shots at 1, department branches at 2 and tasks
//! at 3. A node's children are emitted only when the node is expanded.

use serde::Serialize;
use vfxtrack_pipeline::{ExpansionState, NodeClass, ProjectHierarchy, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Package,
    Shot,
    Department,
    Task,
}

impl RowKind {
    pub fn depth(&self) -> usize {
        match self {
            RowKind::Package => 0,
            RowKind::Shot => 1,
            RowKind::Department => 2,
            RowKind::Task => 3,
        }
    }

    /// Expansion class for rows that can be opened; tasks are leaves
    pub fn node_class(&self) -> Option<NodeClass> {
        match self {
            RowKind::Package => Some(NodeClass::Package),
            RowKind::Shot => Some(NodeClass::Shot),
            RowKind::Department => Some(NodeClass::Department),
            RowKind::Task => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub kind: RowKind,
    pub id: i64,
    pub depth: usize,
    pub label: String,
    /// `None` for task rows
    pub expanded: Option<bool>,
    /// Number of direct children (shots, departments or tasks); 0 for tasks
    pub child_count: usize,
}

impl Row {
    fn node(kind: RowKind, id: i64, label: String, expanded: bool, child_count: usize) -> Self {
        Self {
            kind,
            id,
            depth: kind.depth(),
            label,
            expanded: Some(expanded),
            child_count,
        }
    }

    fn task(task: &Task) -> Self {
        Self {
            kind: RowKind::Task,
            id: task.id,
            depth: RowKind::Task.depth(),
            label: format!(
                "{} [{}] {}",
                task.name,
                task.status.label(),
                task.current_version
            ),
            expanded: None,
            child_count: 0,
        }
    }

    /// Indented one-line rendering with an open/closed marker
    pub fn render(&self) -> String {
        let marker = match self.expanded {
            Some(true) => "v ",
            Some(false) => "> ",
            None => "- ",
        };
        format!("{}{}{}", "  ".repeat(self.depth), marker, self.label)
    }
}

pub fn visible_rows(tree: &ProjectHierarchy, expansion: &ExpansionState) -> Vec<Row> {
    let mut rows = Vec::new();
    for package in tree.packages() {
        let id = package.package.id;
        let open = expansion.is_expanded(NodeClass::Package, id);
        rows.push(Row::node(
            RowKind::Package,
            id,
            format!("{} {}", package.package.code, package.package.name),
            open,
            package.shots.len(),
        ));
        if !open {
            continue;
        }

        for shot in &package.shots {
            let id = shot.shot.id;
            let open = expansion.is_expanded(NodeClass::Shot, id);
            rows.push(Row::node(
                RowKind::Shot,
                id,
                shot.shot.code.clone(),
                open,
                shot.departments.len(),
            ));
            if !open {
                continue;
            }

            for branch in &shot.departments {
                let id = branch.department.id;
                let open = expansion.is_expanded(NodeClass::Department, id);
                rows.push(Row::node(
                    RowKind::Department,
                    id,
                    format!("{} ({})", branch.department.name, branch.tasks.len()),
                    open,
                    branch.tasks.len(),
                ));
                if open {
                    rows.extend(branch.tasks.iter().map(Row::task));
                }
            }
        }
    }
    rows
}

/// Expansion state with every package, shot and department in `tree` open
pub fn expand_all(tree: &ProjectHierarchy, expansion: &ExpansionState) -> ExpansionState {
    let mut state = expansion.clone();
    for package in tree.packages() {
        state = state.with_expanded(NodeClass::Package, package.package.id, true);
    }
    for shot in tree.shots() {
        state = state.with_expanded(NodeClass::Shot, shot.shot.id, true);
        for branch in &shot.departments {
            state = state.with_expanded(NodeClass::Department, branch.department.id, true);
        }
    }
    state
}
