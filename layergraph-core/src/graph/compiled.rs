//! Compiled Graph
//!
//! An immutable snapshot produced by [`GraphBuilder::compile`]. It owns its
//! own copy of the function table, the default table and the layering, so
//! it is unaffected by later registrations and can back any number of
//! independent evaluations, including from several threads at once.
//!
//! [`GraphBuilder::compile`]: super::GraphBuilder::compile

use std::fmt;

use indexmap::IndexMap;
use tracing::debug_span;

use super::node::{Function, FunctionSpec, NodeKind};
use super::scheduler::Layers;
use crate::error::{GraphError, Result};
use crate::eval::Evaluator;

/// A validated, acyclic dependency graph ready for evaluation.
pub struct CompiledGraph<V> {
    label: Option<String>,
    functions: IndexMap<String, Function<V>>,
    defaults: IndexMap<String, V>,
    layers: Layers,
}

impl<V> CompiledGraph<V> {
    pub(crate) fn new(
        label: Option<String>,
        functions: IndexMap<String, Function<V>>,
        defaults: IndexMap<String, V>,
        layers: Layers,
    ) -> Self {
        Self {
            label,
            functions,
            defaults,
            layers,
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The topological layering. Layer 0 holds inputs and dependency-free functions.
    pub fn layers(&self) -> &Layers {
        &self.layers
    }

    /// Whether `name` is a node of the graph, function or input.
    pub fn contains(&self, name: &str) -> bool {
        self.layers.contains(name)
    }

    pub fn node_kind(&self, name: &str) -> Option<NodeKind> {
        if self.functions.contains_key(name) {
            Some(NodeKind::Function)
        } else if self.layers.contains(name) {
            Some(NodeKind::Input)
        } else {
            None
        }
    }

    pub fn node_count(&self) -> usize {
        self.layers.node_count()
    }

    /// Spec of a registered function.
    pub fn function(&self, name: &str) -> Option<&FunctionSpec> {
        self.functions.get(name).map(Function::spec)
    }

    /// All function specs, in registration order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionSpec> {
        self.functions.values().map(Function::spec)
    }

    /// Registered default for a node name.
    pub fn default_value(&self, name: &str) -> Option<&V> {
        self.defaults.get(name)
    }

    pub(crate) fn callable(&self, name: &str) -> Option<&Function<V>> {
        self.functions.get(name)
    }

    pub(crate) fn span(&self) -> tracing::Span {
        debug_span!("evaluate", label = self.label.as_deref().unwrap_or_default())
    }
}

impl<V: Clone> CompiledGraph<V> {
    /// Bind the initial inputs and return an evaluator without computing anything.
    ///
    /// Every binding must name a layer-0 node.
    pub fn lazily_evaluate<'b>(
        &self,
        bindings: impl IntoIterator<Item = (&'b str, V)>,
    ) -> Result<Evaluator<'_, V>> {
        let mut cache = IndexMap::new();
        for (name, value) in bindings {
            if !self.layers.is_input_layer(name) {
                return Err(GraphError::UnknownInput(name.to_string()));
            }
            cache.insert(name.to_string(), value);
        }
        Ok(Evaluator::new(self, cache))
    }

    /// Bind the initial inputs and compute every node beyond layer 0.
    ///
    /// Fails on the first node that cannot be resolved.
    pub fn evaluate<'b>(
        &self,
        bindings: impl IntoIterator<Item = (&'b str, V)>,
    ) -> Result<Evaluator<'_, V>> {
        let mut evaluator = self.lazily_evaluate(bindings)?;
        evaluator.compute_all()?;
        Ok(evaluator)
    }
}

impl<V> fmt::Debug for CompiledGraph<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("label", &self.label)
            .field("functions", &self.functions.values().collect::<Vec<_>>())
            .field("defaults", &self.defaults.keys().collect::<Vec<_>>())
            .field("layers", &self.layers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GraphBuilder;

    fn compiled() -> CompiledGraph<i64> {
        let mut graph = GraphBuilder::new();
        graph.register("a", &["x", "y"], [], |args| args["x"] * args["y"]).unwrap();
        graph.register("b", &["y"], [("y", 4)], |args| args["y"] * args["y"]).unwrap();
        graph.compile().unwrap()
    }

    #[test]
    fn classifies_nodes() {
        let graph = compiled();

        assert_eq!(graph.node_kind("a"), Some(NodeKind::Function));
        assert_eq!(graph.node_kind("x"), Some(NodeKind::Input));
        assert_eq!(graph.node_kind("nope"), None);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.functions().count(), 2);
        assert_eq!(graph.default_value("y"), Some(&4));
    }

    #[test]
    fn rejects_binding_outside_layer_zero() {
        let graph = compiled();

        let error = graph.lazily_evaluate([("a", 1)]).unwrap_err();
        assert_eq!(error, GraphError::UnknownInput("a".into()));

        let error = graph.lazily_evaluate([("q", 1)]).unwrap_err();
        assert_eq!(error, GraphError::UnknownInput("q".into()));
    }

    #[test]
    fn strict_evaluation_fails_on_missing_input() {
        let graph = compiled();

        let error = graph.evaluate([("y", 5)]).unwrap_err();
        assert_eq!(error, GraphError::UnresolvedDependency("a".into()));
    }

    #[test]
    fn lazy_evaluation_defers_failures() {
        let graph = compiled();

        let mut evaluator = graph.lazily_evaluate([("y", 5)]).unwrap();
        assert_eq!(evaluator.get("b").unwrap(), 25);
    }

    #[test]
    fn debug_lists_functions_without_callables() {
        let rendered = format!("{:?}", compiled());
        assert!(rendered.contains("CompiledGraph"));
        assert!(rendered.contains("\"a\""));
    }
}
