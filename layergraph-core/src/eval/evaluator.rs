//! Evaluator
//!
//! An evaluator binds one [`CompiledGraph`] to one set of initial inputs and
//! computes values on demand.
//!
//! # Resolution
//!
//! Asking for a node resolves its dependencies first, in parameter order,
//! using an explicit frame stack rather than recursion:
//!
//! - A cached value is returned as is; no function runs twice.
//! - A node in the failed set fails immediately; nothing is retried.
//! - An input with no binding takes its registered default, or fails.
//! - A function whose dependencies cannot all be resolved, or whose callable
//!   reports an error, takes its registered default, or fails.
//!
//! Every failure is remembered, so a hopeless node costs at most one attempt
//! per evaluator.
//!
//! The evaluator owns its cache and failed set; it is meant for a single
//! caller at a time. The graph it reads is shared and never mutated.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use super::arguments::Arguments;
use crate::error::{GraphError, Result};
use crate::graph::{CompiledGraph, Layers};

/// One pending node on the resolution stack.
#[derive(Debug)]
struct Frame<'g> {
    name: &'g str,
    /// Index of the next parameter to resolve.
    next: usize,
    /// Set when a dependency turned out to be unresolvable.
    blocked: bool,
}

impl<'g> Frame<'g> {
    fn new(name: &'g str) -> Self {
        Self {
            name,
            next: 0,
            blocked: false,
        }
    }
}

enum Step<'g> {
    /// Resolve this dependency before continuing.
    Descend(&'g str),
    /// The frame is done; `true` if its value is now cached.
    Settled(bool),
}

/// Per-invocation resolver over a compiled graph.
pub struct Evaluator<'g, V> {
    graph: &'g CompiledGraph<V>,
    cache: IndexMap<String, V>,
    failed: IndexSet<String>,
}

impl<'g, V: Clone> Evaluator<'g, V> {
    pub(crate) fn new(graph: &'g CompiledGraph<V>, bindings: IndexMap<String, V>) -> Self {
        Self {
            graph,
            cache: bindings,
            failed: IndexSet::new(),
        }
    }

    /// The graph this evaluator reads.
    pub fn graph(&self) -> &'g CompiledGraph<V> {
        self.graph
    }

    /// Value of `name`, computing it and its dependencies if needed.
    pub fn get(&mut self, name: &str) -> Result<V> {
        let graph = self.graph;
        let node = graph
            .layers()
            .node_name(name)
            .ok_or_else(|| GraphError::UnknownName(name.to_string()))?;
        self.resolve(node)
    }

    /// Compute every node beyond layer 0, in layer order.
    ///
    /// Stops at the first node that cannot be resolved.
    pub fn compute_all(&mut self) -> Result<()> {
        let graph = self.graph;
        let _span = graph.span().entered();

        for name in graph.layers().computed() {
            self.resolve(name)?;
        }
        Ok(())
    }

    /// Compute every node beyond layer 0 that can be computed.
    ///
    /// Unresolvable nodes are skipped and end up in the failed set.
    pub fn compute_all_possible(&mut self) {
        let graph = self.graph;
        let _span = graph.span().entered();

        for name in graph.layers().computed() {
            if let Err(error) = self.resolve(name) {
                trace!(node = name, %error, "skipping unresolved node");
            }
        }
    }

    /// `(name, value)` for every node beyond layer 0, in layer order.
    ///
    /// Fails on the first node that cannot be resolved.
    pub fn values(&mut self) -> Result<Vec<(String, V)>> {
        let graph = self.graph;
        graph
            .layers()
            .computed()
            .map(|name| self.resolve(name).map(|value| (name.to_string(), value)))
            .collect()
    }

    /// `(name, value)` for every node beyond layer 0 that was or can be computed.
    ///
    /// Nodes come in layer order, lexicographic within a layer.
    pub fn successfully_computed<'s>(&'s mut self) -> impl Iterator<Item = (&'s str, &'s V)> + 's {
        self.compute_all_possible();

        let layers: &'s Layers = self.graph.layers();
        let cache: &'s IndexMap<String, V> = &self.cache;
        layers
            .computed()
            .filter_map(move |name| cache.get(name).map(|value| (name, value)))
    }

    /// Cached value of `name`, without computing anything.
    pub fn cached(&self, name: &str) -> Option<&V> {
        self.cache.get(name)
    }

    /// Whether `name` is known to be uncomputable with the current bindings.
    pub fn is_failed(&self, name: &str) -> bool {
        self.failed.contains(name)
    }

    /// Nodes known to be uncomputable, in the order they failed.
    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.failed.iter().map(String::as_str)
    }

    /// Every cached value, bindings included.
    pub fn into_values(self) -> IndexMap<String, V> {
        self.cache
    }

    fn resolve(&mut self, target: &'g str) -> Result<V> {
        if let Some(value) = self.cache.get(target) {
            trace!(node = target, "cache hit");
            return Ok(value.clone());
        }
        if self.failed.contains(target) {
            trace!(node = target, "previously failed");
            return Err(GraphError::UnresolvedDependency(target.to_string()));
        }

        let mut stack = vec![Frame::new(target)];
        while let Some(frame) = stack.last_mut() {
            match self.step(frame) {
                Step::Descend(dependency) => stack.push(Frame::new(dependency)),
                Step::Settled(resolved) => {
                    stack.pop();
                    if let Some(parent) = stack.last_mut() {
                        if resolved {
                            parent.next += 1;
                        } else {
                            parent.blocked = true;
                        }
                    }
                }
            }
        }

        self.cache
            .get(target)
            .cloned()
            .ok_or_else(|| GraphError::UnresolvedDependency(target.to_string()))
    }

    /// Advance one frame. Frames are only pushed for nodes that are neither
    /// cached nor failed.
    fn step(&mut self, frame: &mut Frame<'g>) -> Step<'g> {
        let graph = self.graph;
        // Layer 0 is settled by bindings and defaults alone, including
        // zero-argument functions.
        if frame.blocked || graph.layers().is_input_layer(frame.name) {
            return Step::Settled(self.fall_back(frame.name));
        }

        let Some(function) = graph.callable(frame.name) else {
            return Step::Settled(self.fall_back(frame.name));
        };

        let parameters = function.spec().parameters();
        while let Some(dependency) = parameters.get(frame.next) {
            if self.cache.contains_key(dependency) {
                frame.next += 1;
                continue;
            }
            if self.failed.contains(dependency) {
                trace!(node = frame.name, dependency = %dependency, "dependency previously failed");
                return Step::Settled(self.fall_back(frame.name));
            }
            return Step::Descend(dependency);
        }

        let mut arguments = Arguments::with_capacity(parameters.len());
        for parameter in parameters {
            if let Some(value) = self.cache.get(parameter) {
                arguments.insert(parameter.as_str(), value.clone());
            }
        }

        match function.call(&arguments) {
            Ok(value) => {
                trace!(node = frame.name, "computed");
                self.cache.insert(frame.name.to_string(), value);
                Step::Settled(true)
            }
            Err(error) => {
                debug!(node = frame.name, %error, "computation failed");
                Step::Settled(self.fall_back(frame.name))
            }
        }
    }

    /// Use the registered default for `name`, or mark it failed.
    fn fall_back(&mut self, name: &str) -> bool {
        match self.graph.default_value(name) {
            Some(value) => {
                debug!(node = name, "using registered default");
                self.cache.insert(name.to_string(), value.clone());
                true
            }
            None => {
                self.failed.insert(name.to_string());
                false
            }
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Evaluator<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("label", &self.graph.label())
            .field("cache", &self.cache)
            .field("failed", &self.failed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GraphBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn unknown_name_is_rejected() {
        let mut graph = GraphBuilder::new();
        graph.register("a", &["x"], [], |args| args["x"] * args["x"]).unwrap();
        let compiled = graph.compile().unwrap();

        let mut evaluator = compiled.lazily_evaluate([("x", 7)]).unwrap();
        assert_eq!(evaluator.get("zzz").unwrap_err(), GraphError::UnknownName("zzz".into()));
        assert_eq!(evaluator.get("a").unwrap(), 49);
        assert_eq!(evaluator.get("x").unwrap(), 7);
    }

    #[test]
    fn inputs_resolve_through_defaults() {
        let mut graph = GraphBuilder::new();
        graph.register("a", &["x", "y"], [("y", 3)], |args| args["x"] + args["y"]).unwrap();
        let compiled = graph.compile().unwrap();

        let mut evaluator = compiled.lazily_evaluate([]).unwrap();
        assert_eq!(evaluator.get("y").unwrap(), 3);
        assert_eq!(
            evaluator.get("x").unwrap_err(),
            GraphError::UnresolvedDependency("x".into())
        );
        assert!(evaluator.is_failed("x"));
    }

    #[test]
    fn failed_nodes_are_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut graph = GraphBuilder::new();
        graph
            .register("a", &["x"], [], |args| args["x"] + 1)
            .unwrap();
        graph
            .register("b", &["y"], [], move |args| {
                counter.fetch_add(1, Ordering::SeqCst);
                args["y"]
            })
            .unwrap();
        graph.register("c", &["b", "a"], [], |args| args["a"] + args["b"]).unwrap();
        let compiled = graph.compile().unwrap();

        let mut evaluator = compiled.lazily_evaluate([("y", 1)]).unwrap();
        assert!(evaluator.get("c").is_err());
        assert!(evaluator.get("c").is_err());
        assert!(evaluator.is_failed("c"));
        assert!(evaluator.is_failed("a"));
        assert!(evaluator.is_failed("x"));
        assert_eq!(evaluator.failed().collect::<Vec<_>>(), vec!["x", "a", "c"]);

        // `b` was resolved on the way, exactly once.
        assert_eq!(evaluator.cached("b"), Some(&1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_argument_function_settles_like_an_input() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut graph = GraphBuilder::new();
        graph
            .register("seed", &[], [], move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                10
            })
            .unwrap();
        graph
            .register("grow", &["seed"], [("seed", 5)], |args| args["seed"] + 1)
            .unwrap();
        let compiled = graph.compile().unwrap();

        let mut evaluator = compiled.lazily_evaluate([]).unwrap();
        assert_eq!(evaluator.get("seed").unwrap(), 5);
        assert_eq!(evaluator.get("grow").unwrap(), 6);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn fallible_function_falls_back_to_its_default() {
        let mut graph = GraphBuilder::new();
        graph
            .register_fallible("ratio", &["num", "den"], [], |args| {
                if args["den"] == 0 {
                    Err("division by zero")
                } else {
                    Ok(args["num"] / args["den"])
                }
            })
            .unwrap();
        graph
            .register("report", &["ratio"], [("ratio", -1)], |args| args["ratio"])
            .unwrap();
        let compiled = graph.compile().unwrap();

        let mut evaluator = compiled.lazily_evaluate([("num", 10), ("den", 0)]).unwrap();
        assert_eq!(evaluator.get("report").unwrap(), -1);
        assert_eq!(evaluator.get("ratio").unwrap(), -1);

        let mut evaluator = compiled.lazily_evaluate([("num", 10), ("den", 5)]).unwrap();
        assert_eq!(evaluator.get("report").unwrap(), 2);
    }

    #[test]
    fn fallible_function_without_default_fails() {
        let mut graph = GraphBuilder::new();
        graph
            .register_fallible("parse", &["text"], [], |args: &Arguments<'_, i64>| {
                if args["text"] < 0 {
                    Err(format!("negative input {}", args["text"]))
                } else {
                    Ok(args["text"])
                }
            })
            .unwrap();
        let compiled = graph.compile().unwrap();

        let mut evaluator = compiled.lazily_evaluate([("text", -4)]).unwrap();
        assert_eq!(
            evaluator.get("parse").unwrap_err(),
            GraphError::UnresolvedDependency("parse".into())
        );
        assert!(evaluator.is_failed("parse"));
    }

    #[test]
    fn deep_chain_resolves_without_recursion() {
        let mut graph = GraphBuilder::new();
        graph.register("n0", &["seed"], [], |args| args["seed"]).unwrap();
        for i in 1..20_000 {
            let previous = format!("n{}", i - 1);
            let key = previous.clone();
            graph
                .register(format!("n{i}"), &[previous.as_str()], [], move |args| {
                    args[key.as_str()] + 1
                })
                .unwrap();
        }
        let compiled = graph.compile().unwrap();

        let mut evaluator = compiled.lazily_evaluate([("seed", 0)]).unwrap();
        assert_eq!(evaluator.get("n19999").unwrap(), 19_999);
    }

    #[test]
    fn into_values_includes_bindings() {
        let mut graph = GraphBuilder::new();
        graph.register("a", &["x"], [], |args| args["x"] * 2).unwrap();
        let compiled = graph.compile().unwrap();

        let values = compiled.evaluate([("x", 4)]).unwrap().into_values();
        assert_eq!(values.get("x"), Some(&4));
        assert_eq!(values.get("a"), Some(&8));
    }
}
