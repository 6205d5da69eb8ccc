//! Topological Layering
//!
//! The scheduler assigns every node a depth so that dependencies always sit
//! in a shallower layer than the functions that read them.
//!
//! # Algorithm
//!
//! Nodes are processed in dependency order with Kahn's algorithm:
//!
//! 1. Raw inputs and zero-argument functions have no pending dependencies and
//!    seed the queue at depth 0.
//! 2. When a node is dequeued its depth is `1 + max(depth of its dependencies)`;
//!    all of those are already settled because they were dequeued first.
//! 3. Each dependent loses one pending dependency; at zero it joins the queue.
//!
//! The work is iterative, so depth is not bounded by the call stack. Members
//! of each layer are kept in lexicographic order, which is the tie-break every
//! evaluation sweep relies on.

use std::collections::{HashMap, VecDeque};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::node::Function;
use crate::error::{Cycles, GraphError, Result};

/// Nodes grouped by depth. Layer 0 holds raw inputs and dependency-free functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<IndexSet<String>>", into = "Vec<IndexSet<String>>")]
pub struct Layers {
    layers: Vec<IndexSet<String>>,
    depths: HashMap<String, usize>,
}

impl Layers {
    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Members of the layer at `depth`, in lexicographic order.
    pub fn get(&self, depth: usize) -> Option<&IndexSet<String>> {
        self.layers.get(depth)
    }

    /// Layers in increasing depth.
    pub fn iter(&self) -> impl Iterator<Item = &IndexSet<String>> {
        self.layers.iter()
    }

    /// Names in layer 0.
    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        self.layers.first().into_iter().flatten().map(String::as_str)
    }

    /// Every name beyond layer 0, layer by layer.
    pub fn computed(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().skip(1).flatten().map(String::as_str)
    }

    pub fn depth_of(&self, name: &str) -> Option<usize> {
        self.depths.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.depths.contains_key(name)
    }

    /// The stored copy of `name`, if it is a node.
    pub fn node_name(&self, name: &str) -> Option<&str> {
        self.depths.get_key_value(name).map(|(node, _)| node.as_str())
    }

    pub fn is_input_layer(&self, name: &str) -> bool {
        self.depth_of(name) == Some(0)
    }

    /// Total number of nodes across all layers.
    pub fn node_count(&self) -> usize {
        self.depths.len()
    }
}

impl TryFrom<Vec<IndexSet<String>>> for Layers {
    type Error = GraphError;

    /// Rebuild a layering; every node must appear in exactly one layer.
    fn try_from(layers: Vec<IndexSet<String>>) -> Result<Self> {
        let mut depths = HashMap::with_capacity(layers.iter().map(IndexSet::len).sum());
        for (depth, layer) in layers.iter().enumerate() {
            for name in layer {
                if depths.insert(name.clone(), depth).is_some() {
                    return Err(GraphError::DuplicateNode(name.clone()));
                }
            }
        }
        Ok(Self { layers, depths })
    }
}

impl From<Layers> for Vec<IndexSet<String>> {
    fn from(layers: Layers) -> Self {
        layers.layers
    }
}

/// Compute the layering of every node reachable from the registered functions.
///
/// The caller is expected to have ruled out cycles already; if some nodes can
/// never be settled they are reported as one cyclic component.
pub fn assign_layers<V>(functions: &IndexMap<String, Function<V>>) -> Result<Layers> {
    let mut pending: HashMap<&str, usize> = HashMap::with_capacity(functions.len());
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut queue = VecDeque::new();

    for (name, function) in functions {
        let arity = function.spec().arity();
        pending.insert(name.as_str(), arity);
        if arity == 0 {
            queue.push_back(name.as_str());
        }
    }

    for (name, function) in functions {
        for dependency in function.spec().depends_on() {
            dependents.entry(dependency).or_default().push(name.as_str());
            if !pending.contains_key(dependency) {
                pending.insert(dependency, 0);
                queue.push_back(dependency);
            }
        }
    }

    // Kahn's algorithm
    let mut depths: HashMap<&str, usize> = HashMap::with_capacity(pending.len());
    while let Some(name) = queue.pop_front() {
        let depth = match functions.get(name) {
            Some(function) => function
                .spec()
                .depends_on()
                .filter_map(|dependency| depths.get(dependency))
                .map(|depth| depth + 1)
                .max()
                .unwrap_or(0),
            None => 0,
        };
        depths.insert(name, depth);

        for &dependent in dependents.get(name).into_iter().flatten() {
            if let Some(count) = pending.get_mut(dependent) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    queue.push_back(dependent);
                }
            }
        }
    }

    // Unreachable after the SCC pass in `compile`; the leftover set may also
    // hold acyclic nodes downstream of a cycle.
    if depths.len() != pending.len() {
        let stuck = pending
            .keys()
            .filter(|name| !depths.contains_key(*name))
            .map(|name| name.to_string())
            .collect();
        return Err(GraphError::CyclicDependency(Cycles::new(vec![stuck])));
    }

    let height = depths.values().copied().max().map_or(0, |max| max + 1);
    let mut layers = vec![IndexSet::new(); height];
    for (name, depth) in &depths {
        layers[*depth].insert(name.to_string());
    }
    for layer in &mut layers {
        layer.sort();
    }

    Layers::try_from(layers)
}
