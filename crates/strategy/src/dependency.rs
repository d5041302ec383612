//! Dependency strategy - candidates gated by declared prerequisites.

use std::collections::{HashMap, HashSet};

use cadence_core::{DirtyAssets, Element};
use tracing::debug;

use crate::{is_eligible, InterruptFlag, Result, Strategy, StrategyError};

/// Result of checking an element's prerequisites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// All prerequisites complete
    Ready,
    /// Waiting on these prerequisites
    Blocked(Vec<String>),
}

/// Selects every eligible element whose declared prerequisites are all
/// complete.
///
/// Prerequisites are read from [`Element::dependencies`]; the strategy owns
/// no graph of its own. A prerequisite that names no sibling can never be
/// satisfied, so its dependent is never offered. Serial and parallel
/// scheduling are the chain and empty-graph cases of this policy.
#[derive(Debug, Default)]
pub struct DependencyStrategy {
    interrupted: InterruptFlag,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

impl DependencyStrategy {
    /// Create a running dependency strategy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `element`'s prerequisites among `elements` are complete.
    pub fn resolve<T: Element>(element: &T, elements: &[T]) -> Resolution {
        let complete = complete_names(elements);
        resolve_against(element, &complete)
    }

    /// Reject prerequisites that name no sibling and prerequisite cycles.
    pub fn validate<T: Element>(elements: &[T]) -> Result<()> {
        let graph: HashMap<&str, &[String]> = elements
            .iter()
            .map(|e| (e.name(), e.dependencies()))
            .collect();

        for element in elements {
            if let Some(missing) = element
                .dependencies()
                .iter()
                .find(|dep| !graph.contains_key(dep.as_str()))
            {
                return Err(StrategyError::UnknownDependency {
                    element: element.name().to_string(),
                    dependency: missing.clone(),
                });
            }
        }

        let mut visits = HashMap::new();
        let mut path = Vec::new();
        for element in elements {
            if let Some(chain) = find_cycle(element.name(), &graph, &mut visits, &mut path) {
                return Err(StrategyError::CircularDependency { chain });
            }
        }

        Ok(())
    }

    /// Elements in an order that respects prerequisites, ties broken by
    /// declaration order.
    pub fn topological_order<T: Element>(elements: &[T]) -> Result<Vec<&T>> {
        Self::validate(elements)?;

        let mut sorted: Vec<&T> = Vec::with_capacity(elements.len());
        let mut placed: HashSet<&str> = HashSet::new();

        while sorted.len() < elements.len() {
            let ready: Vec<&T> = elements
                .iter()
                .filter(|e| !placed.contains(e.name()))
                .filter(|e| e.dependencies().iter().all(|d| placed.contains(d.as_str())))
                .collect();

            // validate() ruled out cycles, so every round places something
            if ready.is_empty() {
                break;
            }

            for element in ready {
                placed.insert(element.name());
                sorted.push(element);
            }
        }

        Ok(sorted)
    }
}

fn complete_names<T: Element>(elements: &[T]) -> HashSet<&str> {
    elements
        .iter()
        .filter(|e| e.is_complete())
        .map(|e| e.name())
        .collect()
}

fn resolve_against<T: Element>(element: &T, complete: &HashSet<&str>) -> Resolution {
    let blocked: Vec<String> = element
        .dependencies()
        .iter()
        .filter(|dep| !complete.contains(dep.as_str()))
        .cloned()
        .collect();

    if blocked.is_empty() {
        Resolution::Ready
    } else {
        Resolution::Blocked(blocked)
    }
}

/// Depth-first search returning the first cycle reachable from `name`.
fn find_cycle<'a>(
    name: &'a str,
    graph: &HashMap<&'a str, &'a [String]>,
    visits: &mut HashMap<&'a str, Visit>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    match visits.get(name) {
        Some(Visit::Done) => return None,
        Some(Visit::InProgress) => {
            let start = path.iter().position(|n| *n == name).unwrap_or(0);
            let mut chain: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
            chain.push(name.to_string());
            return Some(chain);
        }
        None => {}
    }

    visits.insert(name, Visit::InProgress);
    path.push(name);

    if let Some(&deps) = graph.get(name) {
        for dep in deps {
            if let Some(chain) = find_cycle(dep.as_str(), graph, visits, path) {
                return Some(chain);
            }
        }
    }

    path.pop();
    visits.insert(name, Visit::Done);
    None
}

impl<T: Element> Strategy<T> for DependencyStrategy {
    fn name(&self) -> &'static str {
        "dependency"
    }

    fn candidates<'a>(&self, elements: &'a [T], dirty_assets: &DirtyAssets) -> Vec<&'a T> {
        if self.interrupted.is_set() {
            return Vec::new();
        }

        let complete = complete_names(elements);
        elements
            .iter()
            .filter(|e| is_eligible(*e, dirty_assets))
            .filter(|e| resolve_against(*e, &complete) == Resolution::Ready)
            .collect()
    }

    fn interrupt(&self) {
        debug!("Interrupting dependency strategy");
        self.interrupted.set();
    }

    fn proceed(&self) {
        debug!("Proceeding dependency strategy");
        self.interrupted.clear();
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted.is_set()
    }
}
