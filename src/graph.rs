use std::collections::{HashMap, VecDeque};
use std::fmt::{Display, Formatter};

use petgraph::Direction;
use petgraph::Graph;
use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;

use crate::Scheduler;
use crate::core::TaskId;
use crate::engine::Dependency;
use crate::error::SchedulerError;

/// The dependency graph made explicit. Nodes are live tasks, and every
/// future reference between two live tasks becomes an edge pointing from the
/// dependency to its dependent.
pub(crate) struct TaskGraph {
    graph: Graph<TaskId, Dependency>,
}

impl TaskGraph {
    pub(crate) fn new(scheduler: &Scheduler) -> Self {
        let mut graph = Graph::new();
        let mut indices = HashMap::new();

        for (id, _) in scheduler.live() {
            indices.insert(id, graph.add_node(id));
        }

        for (id, slot) in scheduler.live() {
            for dependency in slot.task.dependencies() {
                if let Some(&source) = indices.get(&dependency.id) {
                    graph.add_edge(source, indices[&id], dependency);
                }
            }
        }

        Self { graph }
    }

    /// Returns one cycle in demand order, first task repeated at the end.
    pub(crate) fn find_cycle(&self) -> Option<Vec<TaskId>> {
        let start = toposort(&self.graph, None).err()?.node_id();

        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([start]);

        while let Some(node) = queue.pop_front() {
            for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if next == start {
                    let mut path = vec![self.graph[start]];
                    let mut cursor = node;

                    while cursor != start {
                        path.push(self.graph[cursor]);
                        cursor = parent[&cursor];
                    }

                    path.push(self.graph[start]);
                    return Some(path);
                }

                if !parent.contains_key(&next) {
                    parent.insert(next, node);
                    queue.push_back(next);
                }
            }
        }

        None
    }
}

impl Scheduler {
    /// Checks the registered graph without executing anything.
    ///
    /// Reports a future reference to a task that does not exist, a future
    /// reference typed differently from the task it names, and any cycle.
    /// Registration itself stays late-bound, so this is the place to catch
    /// wiring mistakes up front.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        for (_, slot) in self.live() {
            for dependency in slot.task.dependencies() {
                let target = &self.slot(dependency.id)?.task;

                if target.output_type_id() != dependency.type_id {
                    return Err(SchedulerError::TypeMismatch {
                        id: dependency.id,
                        expected: dependency.type_name,
                        found: target.output_type_name(),
                    });
                }
            }
        }

        match TaskGraph::new(self).find_cycle() {
            Some(path) => Err(SchedulerError::Cycle(path)),
            None => Ok(()),
        }
    }
}

/// Renders the task graph as a Mermaid diagram.
impl Display for Scheduler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "graph LR")?;

        for (id, slot) in self.live() {
            let name = slot.task.get_name().replace('"', "\\\"");
            writeln!(f, "    {}[\"{}\"]", id.index(), name)?;
        }

        let graph = TaskGraph::new(self).graph;

        for edge in graph.raw_edges() {
            let type_name = edge
                .weight
                .type_name
                .replace('<', "&lt;")
                .replace('>', "&gt;");

            writeln!(
                f,
                "    {} -- \"{}\" --> {}",
                graph[edge.source()].index(),
                type_name,
                graph[edge.target()].index()
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_cycle() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.add(|| 1, ());
        scheduler.add(|x: i32| x + 1, scheduler.future_result::<i32>(a));

        assert!(TaskGraph::new(&scheduler).find_cycle().is_none());
    }

    #[test]
    fn test_cycle_path() {
        let mut scheduler = Scheduler::new();
        // 0 depends on 2, 1 depends on 0, 2 depends on 1
        scheduler.add(|x: i32| x, scheduler.future_result::<i32>(TaskId(2)));
        scheduler.add(|x: i32| x, scheduler.future_result::<i32>(TaskId(0)));
        scheduler.add(|x: i32| x, scheduler.future_result::<i32>(TaskId(1)));

        let path = TaskGraph::new(&scheduler).find_cycle().unwrap();
        assert_eq!(path.len(), 4);
        assert_eq!(path.first(), path.last());

        // every step follows a demand: each task depends on the next one
        for pair in path.windows(2) {
            let dependencies = scheduler.slot(pair[0]).unwrap().task.dependencies();
            assert!(dependencies.iter().any(|dep| dep.id == pair[1]));
        }
    }

    #[test]
    fn test_self_loop() {
        let mut scheduler = Scheduler::new();
        scheduler.add(|x: i32| x, scheduler.future_result::<i32>(TaskId(0)));

        let path = TaskGraph::new(&scheduler).find_cycle().unwrap();
        assert_eq!(path, vec![TaskId(0), TaskId(0)]);
    }

    #[test]
    fn test_validate_ok() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.add(|| String::from("7"), ());
        let b = scheduler.add(
            |s: String| s.parse::<i32>().unwrap_or_default(),
            scheduler.future_result::<String>(a),
        );
        scheduler.add(|v: i32, k: f64| v as f64 * k, (scheduler.future_result::<i32>(b), 2.5f64));

        assert!(scheduler.validate().is_ok());
        assert!(!scheduler.is_executed(a).unwrap());
    }

    #[test]
    fn test_validate_missing() {
        let mut scheduler = Scheduler::new();
        scheduler.add(|x: i32| x, scheduler.future_result::<i32>(TaskId(5)));

        assert!(matches!(
            scheduler.validate(),
            Err(SchedulerError::InvalidId(TaskId(5)))
        ));
    }

    #[test]
    fn test_validate_type_mismatch() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.add(|| 1.0f32, ());
        scheduler.add(|x: i32| x, scheduler.future_result::<i32>(a));

        match scheduler.validate() {
            Err(SchedulerError::TypeMismatch {
                id,
                expected,
                found,
            }) => {
                assert_eq!(id, a);
                assert_eq!(expected, "i32");
                assert_eq!(found, "f32");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_validate_cycle() {
        let mut scheduler = Scheduler::new();
        scheduler.add(|x: i32| x, scheduler.future_result::<i32>(TaskId(1)));
        scheduler.add(|x: i32| x, scheduler.future_result::<i32>(TaskId(0)));

        assert!(matches!(
            scheduler.validate(),
            Err(SchedulerError::Cycle(_))
        ));
    }

    #[test]
    fn test_mermaid() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.task().name("source").run(|| vec![1u8], ());
        let handle = scheduler.future_result::<Vec<u8>>(a);
        scheduler.task().name("len").run(|v: Vec<u8>| v.len(), handle);

        let rendered = scheduler.to_string();
        let lines: Vec<_> = rendered.lines().collect();

        assert_eq!(lines[0], "graph LR");
        assert_eq!(lines[1], "    0[\"source\"]");
        assert_eq!(lines[2], "    1[\"len\"]");
        assert!(lines[3].starts_with("    0 -- \""));
        assert!(lines[3].contains("Vec&lt;u8&gt;"));
        assert!(lines[3].ends_with("\" --> 1"));
    }
}
