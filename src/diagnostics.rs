use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::core::TaskId;

/// Timing of a single successful task execution.
#[derive(Debug, Clone)]
pub struct TaskExecution {
    /// When the callable's arguments started resolving.
    pub start: Instant,
    /// Wall time until the value was produced, nested dependencies included.
    pub duration: Duration,
}

/// Execution metrics collected by a [`Scheduler`](crate::Scheduler).
///
/// Only successful executions are recorded. The duration of a task includes
/// the time spent forcing any of its dependencies that were still pending,
/// since those run nested inside it.
#[derive(Debug, Default)]
pub struct Diagnostics {
    /// A map of task identifiers to their execution metrics.
    pub execution_times: HashMap<TaskId, TaskExecution>,
}

impl Diagnostics {
    pub(crate) fn record(&mut self, id: TaskId, start: Instant) {
        let duration = start.elapsed();
        self.execution_times
            .insert(id, TaskExecution { start, duration });
    }

    /// Returns the task whose execution took the longest.
    pub fn slowest(&self) -> Option<(TaskId, &TaskExecution)> {
        self.execution_times
            .iter()
            .max_by_key(|(_, exec)| exec.duration)
            .map(|(id, exec)| (*id, exec))
    }

    /// Returns the identifiers of executed tasks in the order they started.
    pub fn execution_order(&self) -> Vec<TaskId> {
        let mut order: Vec<_> = self.execution_times.iter().collect();
        order.sort_by_key(|(id, exec)| (exec.start, **id));
        order.into_iter().map(|(id, _)| *id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let diagnostics = Diagnostics::default();
        assert!(diagnostics.slowest().is_none());
        assert!(diagnostics.execution_order().is_empty());
    }

    #[test]
    fn test_execution_order() {
        let mut diagnostics = Diagnostics::default();
        let start = Instant::now();

        diagnostics.execution_times.insert(
            TaskId(1),
            TaskExecution {
                start: start + Duration::from_millis(5),
                duration: Duration::from_millis(1),
            },
        );
        diagnostics.execution_times.insert(
            TaskId(0),
            TaskExecution {
                start,
                duration: Duration::from_millis(9),
            },
        );

        assert_eq!(diagnostics.execution_order(), vec![TaskId(0), TaskId(1)]);
        assert_eq!(diagnostics.slowest().map(|(id, _)| id), Some(TaskId(0)));
    }
}
