//! Composition-time validation of a module's factory set.
//!
//! # Validation Rules
//!
//! - **Self dependency**: Error - a factory lists its own key
//! - **Missing dependencies**: Error - a dependency no factory provides; every
//!   missing key of the offending factory is reported
//! - **Circular dependencies**: Error - a cycle through several factories
//!   (optional, see [`ModuleOptions::detect_cycles`](crate::ModuleOptions))
//!
//! Factories are checked in list order and the first violation aborts.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::factory::ServiceFactory;

/// Checks the per-factory invariants: no self dependency, no missing dependency.
pub(crate) fn check_invariants(factories: &[ServiceFactory], index: &HashMap<u64, usize>) -> DiResult<()> {
    for factory in factories {
        let provides = factory.provides();
        if factory.depends_on().iter().any(|dep| dep == provides) {
            return Err(DiError::SelfDependency {
                service: provides.shared_name(),
            });
        }

        let mut seen = HashSet::new();
        let missing: Vec<Arc<str>> = factory
            .depends_on()
            .iter()
            .filter(|dep| !index.contains_key(&dep.id()))
            .filter(|dep| seen.insert(dep.id()))
            .map(|dep| dep.shared_name())
            .collect();
        if !missing.is_empty() {
            return Err(DiError::MissingDependencies {
                service: provides.shared_name(),
                missing,
            });
        }
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Finds a dependency cycle, returned as the path of service names from the
/// first repeated service back to itself (`A -> B -> A`).
///
/// Assumes [`check_invariants`] passed, so every dependency is in `index`.
pub(crate) fn find_cycle(factories: &[ServiceFactory], index: &HashMap<u64, usize>) -> Option<Vec<Arc<str>>> {
    let mut marks = vec![Mark::Unvisited; factories.len()];
    let mut stack: Vec<usize> = Vec::new();

    for start in 0..factories.len() {
        if marks[start] == Mark::Unvisited {
            if let Some(cycle) = visit(start, factories, index, &mut marks, &mut stack) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit(
    node: usize,
    factories: &[ServiceFactory],
    index: &HashMap<u64, usize>,
    marks: &mut [Mark],
    stack: &mut Vec<usize>,
) -> Option<Vec<Arc<str>>> {
    marks[node] = Mark::InProgress;
    stack.push(node);

    for dep in factories[node].depends_on() {
        let Some(&next) = index.get(&dep.id()) else {
            continue;
        };
        match marks[next] {
            Mark::InProgress => {
                let start = stack.iter().position(|&n| n == next).unwrap_or(0);
                let mut path: Vec<Arc<str>> = stack[start..]
                    .iter()
                    .map(|&n| factories[n].provides().shared_name())
                    .collect();
                path.push(factories[next].provides().shared_name());
                return Some(path);
            }
            Mark::Unvisited => {
                if let Some(cycle) = visit(next, factories, index, marks, stack) {
                    return Some(cycle);
                }
            }
            Mark::Done => {}
        }
    }

    stack.pop();
    marks[node] = Mark::Done;
    None
}

/// Positions ordered so every factory comes after all of its dependencies.
///
/// Ties keep list order. Factories caught in a cycle (possible only with
/// cycle detection disabled) are appended in list order.
pub(crate) fn dependency_order(factories: &[ServiceFactory], index: &HashMap<u64, usize>) -> Vec<usize> {
    let mut pending: Vec<usize> = factories
        .iter()
        .map(|f| {
            f.depends_on()
                .iter()
                .filter_map(|dep| index.get(&dep.id()))
                .collect::<HashSet<_>>()
                .len()
        })
        .collect();

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); factories.len()];
    for (i, factory) in factories.iter().enumerate() {
        let unique: HashSet<usize> = factory
            .depends_on()
            .iter()
            .filter_map(|dep| index.get(&dep.id()).copied())
            .collect();
        for dep in unique {
            dependents[dep].push(i);
        }
    }

    let mut order = Vec::with_capacity(factories.len());
    let mut placed = vec![false; factories.len()];
    loop {
        let Some(next) = (0..factories.len()).find(|&i| !placed[i] && pending[i] == 0) else {
            break;
        };
        placed[next] = true;
        order.push(next);
        for &dependent in &dependents[next] {
            pending[dependent] -= 1;
        }
    }

    order.extend((0..factories.len()).filter(|&i| !placed[i]));
    order
}
