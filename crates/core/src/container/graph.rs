//! Directed dependency graph over components, configuration units and bean
//! product types, with cycle detection and deterministic topological
//! ordering.
//!
//! Nodes are integer-indexed in an arena so node identity is independent of
//! host object identity.

use std::collections::HashMap;

use crate::container::contracts::ContractIndex;
use crate::container::descriptor::{
    BeanDefinition, ComponentDescriptor, ParamRequest, TypeKey,
};
use crate::errors::CoreError;

/// Integer handle of a graph node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a graph node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Concrete service or repository; index into the filtered component list
    Component(usize),
    /// Configuration unit; index into the filtered component list
    Unit(usize),
    /// Bean product type
    Product,
}

/// Arena node: identity key, kind, outgoing dependency edges
#[derive(Debug)]
pub struct Node {
    pub key: TypeKey,
    pub kind: NodeKind,
    /// Outgoing edges; u -> v means constructing u requires v to exist
    pub dependencies: Vec<NodeId>,
}

/// Directed dependency graph for one pipeline run.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
    index: HashMap<TypeKey, NodeId>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build the graph from the filtered candidate set.
    ///
    /// Nodes are added components-first, then units, then bean product
    /// types; that insertion order is also the deterministic root order of
    /// the topological sort.
    pub fn build(
        components: &[ComponentDescriptor],
        beans: &[BeanDefinition],
        contracts: &ContractIndex,
    ) -> Self {
        let mut graph = Self::new();

        for (index, component) in components.iter().enumerate() {
            if !component.kind.is_unit() {
                graph.add_node(component.key, NodeKind::Component(index));
            }
        }
        for (index, component) in components.iter().enumerate() {
            if component.kind.is_unit() {
                graph.add_node(component.key, NodeKind::Unit(index));
            }
        }
        for bean in beans {
            if !graph.index.contains_key(&bean.product) {
                graph.add_node(bean.product, NodeKind::Product);
            }
        }

        // component and unit edges come from the selected constructor; a
        // descriptor without constructors gets no edges here and fails
        // later, at instantiation time
        for component in components {
            let Some(from) = graph.node_id(&component.key) else {
                continue;
            };
            if let Ok(ctor) = component.select_constructor() {
                for param in &ctor.params {
                    graph.add_param_edges(from, param, components, contracts);
                }
            }
        }

        // a bean product depends on its owning unit plus its method
        // parameters
        for bean in beans {
            let Some(from) = graph.node_id(&bean.product) else {
                continue;
            };
            if let Some(owner) = graph.node_id(&bean.owner) {
                graph.add_edge(from, owner);
            }
            for param in &bean.params {
                graph.add_param_edges(from, param, components, contracts);
            }
        }

        tracing::debug!(
            nodes = graph.nodes.len(),
            edges = graph.nodes.iter().map(|n| n.dependencies.len()).sum::<usize>(),
            "dependency graph built"
        );

        graph
    }

    fn add_node(&mut self, key: TypeKey, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            key,
            kind,
            dependencies: Vec::new(),
        });
        self.index.insert(key, id);
        id
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId) {
        let dependencies = &mut self.nodes[from.0].dependencies;
        if !dependencies.contains(&to) {
            dependencies.push(to);
        }
    }

    /// Expand one requested parameter into edges, per its declared shape.
    ///
    /// Contract and collection requests fan out to every bound
    /// implementation; a contract with several bindings yields one edge per
    /// binding, deferring the ambiguity decision to resolution time.
    /// Requests for types outside the graph yield no edge at all: those are
    /// delegated to the external resolver and invisible to ordering.
    fn add_param_edges(
        &mut self,
        from: NodeId,
        param: &ParamRequest,
        components: &[ComponentDescriptor],
        contracts: &ContractIndex,
    ) {
        match param {
            ParamRequest::Contract(key) | ParamRequest::CollectionOf(key) => {
                for &implementation in contracts.implementations(key) {
                    if let Some(to) = self.node_id(&components[implementation].key) {
                        self.add_edge(from, to);
                    }
                }
            }
            ParamRequest::Concrete(key) => {
                if let Some(to) = self.node_id(key) {
                    self.add_edge(from, to);
                }
            }
        }
    }

    /// Look up the node for a type key
    pub fn node_id(&self, key: &TypeKey) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Compute a dependency-respecting construction order: every dependency
    /// precedes its dependents.
    ///
    /// Depth-first three-color traversal; unvisited roots are taken in
    /// arena insertion order, keeping the output deterministic across runs
    /// for a given input. A cycle aborts with the full offending path.
    pub fn construction_order(&self) -> Result<Vec<NodeId>, CoreError> {
        let mut marks = vec![Mark::White; self.nodes.len()];
        let mut path = Vec::new();
        let mut order = Vec::with_capacity(self.nodes.len());

        for index in 0..self.nodes.len() {
            if marks[index] == Mark::White {
                self.visit(NodeId(index), &mut marks, &mut path, &mut order)?;
            }
        }

        Ok(order)
    }

    fn visit(
        &self,
        node: NodeId,
        marks: &mut [Mark],
        path: &mut Vec<NodeId>,
        order: &mut Vec<NodeId>,
    ) -> Result<(), CoreError> {
        match marks[node.0] {
            Mark::Grey => return Err(self.cycle_error(node, path)),
            Mark::Black => return Ok(()),
            Mark::White => {}
        }

        marks[node.0] = Mark::Grey;
        path.push(node);

        for &dependency in &self.nodes[node.0].dependencies {
            self.visit(dependency, marks, path, order)?;
        }

        path.pop();
        marks[node.0] = Mark::Black;
        order.push(node);

        Ok(())
    }

    /// Readable cycle trace: the path suffix starting at the first
    /// occurrence of the revisited node, with the node appended again.
    fn cycle_error(&self, node: NodeId, path: &[NodeId]) -> CoreError {
        let start = path.iter().position(|&n| n == node).unwrap_or(0);
        let mut chain: Vec<&str> = path[start..]
            .iter()
            .map(|&n| self.nodes[n.0].key.type_name())
            .collect();
        chain.push(self.nodes[node.0].key.type_name());
        CoreError::cyclic(chain.join(" -> "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Grey,
    Black,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> (TypeKey, TypeKey, TypeKey) {
        (
            TypeKey::of::<u8>(),
            TypeKey::of::<u16>(),
            TypeKey::of::<u32>(),
        )
    }

    fn graph_with(edges: &[(usize, usize)]) -> DependencyGraph {
        let (a, b, c) = keys();
        let mut graph = DependencyGraph::new();
        for key in [a, b, c] {
            graph.add_node(key, NodeKind::Product);
        }
        for &(from, to) in edges {
            graph.add_edge(NodeId(from), NodeId(to));
        }
        graph
    }

    #[test]
    fn test_order_puts_dependencies_first() {
        // a -> b -> c
        let graph = graph_with(&[(0, 1), (1, 2)]);
        let order = graph.construction_order().unwrap();

        let position = |id: usize| order.iter().position(|&n| n == NodeId(id)).unwrap();
        assert!(position(2) < position(1));
        assert!(position(1) < position(0));
        assert_eq!(order.len(), 3);
    }

    #[test]
    fn test_every_edge_respected_in_diamond() {
        // a depends on b and c; b and c both depend on... nothing; plus
        // a -> c directly
        let graph = graph_with(&[(0, 1), (0, 2), (1, 2)]);
        let order = graph.construction_order().unwrap();

        let position = |id: usize| order.iter().position(|&n| n == NodeId(id)).unwrap();
        assert!(position(1) < position(0));
        assert!(position(2) < position(0));
        assert!(position(2) < position(1));
    }

    #[test]
    fn test_two_node_cycle_names_both_types() {
        let graph = graph_with(&[(0, 1), (1, 0)]);
        let err = graph.construction_order().unwrap_err();

        assert!(err.is_cyclic());
        let message = err.to_string();
        assert!(message.contains("u8"));
        assert!(message.contains("u16"));
    }

    #[test]
    fn test_cycle_trace_starts_at_reentry_point() {
        // a -> b -> c -> b: the reported chain is the b..c suffix, not a
        let graph = graph_with(&[(0, 1), (1, 2), (2, 1)]);
        let err = graph.construction_order().unwrap_err();

        let CoreError::CyclicDependency { path } = err else {
            panic!("expected a cycle");
        };
        assert_eq!(path, "u16 -> u32 -> u16");
    }

    #[test]
    fn test_roots_visited_in_insertion_order() {
        // no edges at all: order equals insertion order
        let graph = graph_with(&[]);
        let order = graph.construction_order().unwrap();
        assert_eq!(order, vec![NodeId(0), NodeId(1), NodeId(2)]);
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let mut graph = graph_with(&[(0, 1)]);
        graph.add_edge(NodeId(0), NodeId(1));
        assert_eq!(graph.node(NodeId(0)).dependencies.len(), 1);
    }
}
