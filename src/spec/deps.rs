// src/spec/deps.rs

//! Informational analysis of `metadata.dependencies`.
//!
//! Dependencies never influence admission: tasks are admitted in discovery
//! order. This module only points out declarations that discovery order
//! cannot honour, so authors can rename files or drop the declaration.

use std::collections::HashMap;
use std::fmt;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::engine::TaskId;
use crate::spec::model::Task;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyWarning {
    /// The dependency names no discovered spec.
    Unknown { task: TaskId, dependency: TaskId },
    /// A spec lists itself.
    SelfReference { task: TaskId },
    /// The dependency is discovered after its dependent, so it will not be
    /// admitted first.
    OutOfOrder { task: TaskId, dependency: TaskId },
    /// The declarations form a cycle through this spec.
    Cycle { task: TaskId },
}

impl fmt::Display for DependencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyWarning::Unknown { task, dependency } => {
                write!(f, "spec '{task}' depends on unknown spec '{dependency}'")
            }
            DependencyWarning::SelfReference { task } => {
                write!(f, "spec '{task}' lists itself as a dependency")
            }
            DependencyWarning::OutOfOrder { task, dependency } => write!(
                f,
                "spec '{task}' depends on '{dependency}', which is discovered later and is not guaranteed to run first"
            ),
            DependencyWarning::Cycle { task } => {
                write!(f, "dependency cycle detected involving spec '{task}'")
            }
        }
    }
}

/// Check declared dependencies of `tasks` (given in discovery order).
pub fn lint_dependencies(tasks: &[Task]) -> Vec<DependencyWarning> {
    let position: HashMap<&str, usize> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.as_str(), i))
        .collect();

    let mut warnings = Vec::new();

    // Edge direction: dependency -> dependent.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for task in tasks {
        graph.add_node(task.id.as_str());
    }

    for (idx, task) in tasks.iter().enumerate() {
        for dep in &task.spec.metadata.dependencies {
            if dep == &task.id {
                warnings.push(DependencyWarning::SelfReference {
                    task: task.id.clone(),
                });
                continue;
            }
            match position.get(dep.as_str()) {
                None => warnings.push(DependencyWarning::Unknown {
                    task: task.id.clone(),
                    dependency: dep.clone(),
                }),
                Some(&dep_idx) => {
                    if dep_idx > idx {
                        warnings.push(DependencyWarning::OutOfOrder {
                            task: task.id.clone(),
                            dependency: dep.clone(),
                        });
                    }
                    graph.add_edge(dep.as_str(), task.id.as_str(), ());
                }
            }
        }
    }

    if let Err(cycle) = toposort(&graph, None) {
        warnings.push(DependencyWarning::Cycle {
            task: cycle.node_id().to_string(),
        });
    }

    warnings
}
