use thiserror::Error;

use crate::core::TaskId;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The identifier was never issued, or the task was removed.
    #[error("Task {0} does not exist")]
    InvalidId(TaskId),

    #[error("Task {id} produces `{found}`, but `{expected}` was requested")]
    TypeMismatch {
        id: TaskId,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Cycle detected in task graph: {}", format_path(.0))]
    Cycle(Vec<TaskId>),

    #[error("Task '{name}' ({id}):\n{error}")]
    Task {
        id: TaskId,
        name: String,
        error: anyhow::Error,
    },
}

fn format_path(path: &[TaskId]) -> String {
    path.iter()
        .map(TaskId::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message() {
        let err = SchedulerError::Cycle(vec![TaskId(0), TaskId(2), TaskId(0)]);
        assert_eq!(
            err.to_string(),
            "Cycle detected in task graph: #0 -> #2 -> #0"
        );
    }

    #[test]
    fn test_task_message() {
        let err = SchedulerError::Task {
            id: TaskId(3),
            name: "parse".into(),
            error: anyhow::anyhow!("bad digit"),
        };
        assert_eq!(err.to_string(), "Task 'parse' (#3):\nbad digit");
    }
}
