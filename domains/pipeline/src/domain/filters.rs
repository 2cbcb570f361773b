//! Task list filtering (department, status, priority)

use serde::{Deserialize, Serialize};

use crate::domain::entities::{Priority, Task, TaskStatus};

/// Filter applied to the task list. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl TaskFilter {
    /// Filter that matches every task
    pub fn all() -> Self {
        Self::default()
    }

    pub fn department(mut self, department_id: i64) -> Self {
        self.department_id = Some(department_id);
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn is_unfiltered(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.department_id.is_none_or(|id| task.department_id == id)
            && self.status.is_none_or(|status| task.status == status)
            && self.priority.is_none_or(|priority| task.priority == priority)
    }

    /// Query-string pairs for the list-tasks endpoint, in a fixed order
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(id) = self.department_id {
            params.push(("department_id", id.to_string()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(priority) = self.priority {
            params.push(("priority", priority.as_str().to_string()));
        }
        params
    }

    /// Apply the filter client-side
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|task| self.matches(task)).collect()
    }
}
