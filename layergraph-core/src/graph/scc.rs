//! Strongly Connected Components
//!
//! A general-purpose component finder over a directed edge set. The graph
//! compiler uses it purely as a cycle oracle: any component with more than
//! one member, or a node with an edge to itself, is a cycle.
//!
//! # Algorithm
//!
//! Two-pass depth-first search (Kosaraju):
//!
//! 1. DFS over the reversed edges, recording the order in which nodes finish.
//! 2. DFS over the forward edges, starting sweeps from nodes in decreasing
//!    finishing order. Every tree discovered in this pass is one component.
//!
//! Both passes use an explicit stack, so deep chains cannot exhaust the call
//! stack. The node a sweep starts from is reported as the component's leader;
//! which member that is carries no meaning beyond identifying the component.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

/// A set of mutually reachable nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component<N> {
    leader: N,
    members: Vec<N>,
    self_loop: bool,
}

impl<N: Eq> Component<N> {
    /// The node the discovering sweep started from.
    pub fn leader(&self) -> &N {
        &self.leader
    }

    /// All members, leader first.
    pub fn members(&self) -> &[N] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, node: &N) -> bool {
        self.members.contains(node)
    }

    /// Whether this component witnesses a cycle.
    pub fn is_cyclic(&self) -> bool {
        self.members.len() > 1 || self.self_loop
    }

    pub fn into_members(self) -> Vec<N> {
        self.members
    }
}

/// Partition every node mentioned by `edges` into strongly connected components.
pub fn strongly_connected_components<N, I>(edges: I) -> Vec<Component<N>>
where
    N: Clone + Eq + Hash + Ord,
    I: IntoIterator<Item = (N, N)>,
{
    let mut nodes = BTreeSet::new();
    let mut forward: HashMap<N, Vec<N>> = HashMap::new();
    let mut reverse: HashMap<N, Vec<N>> = HashMap::new();
    let mut self_loops = HashSet::new();

    for (from, to) in edges {
        if from == to {
            self_loops.insert(from.clone());
        }
        nodes.insert(from.clone());
        nodes.insert(to.clone());
        forward.entry(from.clone()).or_default().push(to.clone());
        reverse.entry(to).or_default().push(from);
    }

    let finished = finishing_order(nodes.iter().rev(), &reverse);

    let mut explored = HashSet::with_capacity(nodes.len());
    let mut components = Vec::new();
    for &leader in finished.iter().rev() {
        if explored.contains(leader) {
            continue;
        }
        let members = collect_reachable(leader, &forward, &mut explored);
        let self_loop = members.iter().any(|member| self_loops.contains(member));
        components.push(Component {
            leader: leader.clone(),
            members,
            self_loop,
        });
    }

    components
}

/// Post-order of a full DFS sweep over `adjacency`, visiting roots in the given order.
fn finishing_order<'a, N>(
    roots: impl Iterator<Item = &'a N>,
    adjacency: &'a HashMap<N, Vec<N>>,
) -> Vec<&'a N>
where
    N: Eq + Hash,
{
    let mut explored: HashSet<&N> = HashSet::new();
    let mut order = Vec::new();

    for root in roots {
        if !explored.insert(root) {
            continue;
        }
        let mut stack: Vec<(&N, usize)> = vec![(root, 0)];

        while let Some(&(node, next)) = stack.last() {
            let children = adjacency.get(node).map(Vec::as_slice).unwrap_or(&[]);
            match children.get(next) {
                Some(child) => {
                    if let Some(top) = stack.last_mut() {
                        top.1 += 1;
                    }
                    if explored.insert(child) {
                        stack.push((child, 0));
                    }
                }
                None => {
                    order.push(node);
                    stack.pop();
                }
            }
        }
    }

    order
}

/// Every node reachable from `root` that no earlier sweep has claimed.
fn collect_reachable<'a, N>(
    root: &'a N,
    adjacency: &'a HashMap<N, Vec<N>>,
    explored: &mut HashSet<&'a N>,
) -> Vec<N>
where
    N: Clone + Eq + Hash,
{
    let mut members = Vec::new();
    let mut stack = vec![root];
    explored.insert(root);

    while let Some(node) = stack.pop() {
        members.push(node.clone());
        for child in adjacency.get(node).into_iter().flatten() {
            if explored.insert(child) {
                stack.push(child);
            }
        }
    }

    members
}
