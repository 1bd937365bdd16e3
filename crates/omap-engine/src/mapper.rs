//! Runtime mappers
//!
//! A [`MapperGraph`] is the frozen result of one bind: one node per type
//! pair reachable from the root, each holding its compiled routine and the
//! graph ids of the siblings it delegates to. Cycles in the type graph are
//! cycles in the sibling ids, so nothing is ever patched after freezing.

use crate::cache::MapperId;
use omap_emit::{Program, Routine, SiblingInvoker};
use omap_types::{MapError, TypePair, Value};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Wrap a closure as a [`Routine`]
pub fn routine<F>(f: F) -> Routine
where
    F: Fn(&dyn SiblingInvoker, Value, Option<Value>) -> Result<Value, MapError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Strategy that produced a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapperKind {
    /// Scalar, enum and nullable conversions
    Convertible,
    /// Lists, arrays, sequences and dictionaries
    Collection,
    /// User converter for one member
    Custom,
    /// Object graph via an emitted program
    Class,
}

impl MapperKind {
    /// Lowercase name for diagnostics
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Convertible => "convertible",
            Self::Collection => "collection",
            Self::Custom => "custom",
            Self::Class => "class",
        }
    }
}

/// One compiled mapper
#[derive(Clone)]
pub struct MapperNode {
    /// Pair this node maps
    pub pair: TypePair,
    /// Producing strategy
    pub kind: MapperKind,
    /// Graph ids addressed by the routine's sibling indices
    pub siblings: Vec<MapperId>,
    /// Compiled body
    pub routine: Routine,
    /// Emitted program, for class mappers
    pub program: Option<Program>,
}

impl MapperNode {
    /// Node without siblings or program
    #[must_use]
    pub fn new(pair: TypePair, kind: MapperKind, routine: Routine) -> Self {
        Self {
            pair,
            kind,
            siblings: Vec::new(),
            routine,
            program: None,
        }
    }

    /// With sibling ids
    #[must_use]
    pub fn with_siblings(mut self, siblings: Vec<MapperId>) -> Self {
        self.siblings = siblings;
        self
    }

    /// With the program the routine was compiled from
    #[must_use]
    pub fn with_program(mut self, program: Program) -> Self {
        self.program = Some(program);
        self
    }
}

impl Debug for MapperNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperNode")
            .field("pair", &self.pair)
            .field("kind", &self.kind)
            .field("siblings", &self.siblings)
            .field("program", &self.program.as_ref().map(Program::len))
            .finish_non_exhaustive()
    }
}

/// Immutable mapper graph produced by one bind
#[derive(Debug)]
pub struct MapperGraph {
    nodes: Vec<MapperNode>,
    root: MapperId,
}

impl MapperGraph {
    pub(crate) fn new(nodes: Vec<MapperNode>, root: MapperId) -> Self {
        Self { nodes, root }
    }

    /// Root id
    #[inline]
    #[must_use]
    pub fn root(&self) -> MapperId {
        self.root
    }

    /// Node by id
    #[inline]
    #[must_use]
    pub fn node(&self, id: MapperId) -> Option<&MapperNode> {
        self.nodes.get(id.index())
    }

    /// All nodes in id order
    pub fn nodes(&self) -> impl Iterator<Item = &MapperNode> {
        self.nodes.iter()
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never true for a finalized graph
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Run node `id`
    ///
    /// # Errors
    /// [`MapError::UnresolvedMapper`] for an unknown id, otherwise whatever
    /// the routine fails with.
    pub fn invoke(
        &self,
        id: MapperId,
        source: Value,
        target: Option<Value>,
    ) -> Result<Value, MapError> {
        let node = self
            .node(id)
            .ok_or(MapError::UnresolvedMapper(id.index()))?;
        let scope = SiblingScope { graph: self, node };
        (node.routine)(&scope, source, target)
    }
}

struct SiblingScope<'g> {
    graph: &'g MapperGraph,
    node: &'g MapperNode,
}

impl SiblingInvoker for SiblingScope<'_> {
    fn invoke(
        &self,
        sibling: usize,
        source: Value,
        target: Option<Value>,
    ) -> Result<Value, MapError> {
        let id = self
            .node
            .siblings
            .get(sibling)
            .copied()
            .ok_or(MapError::UnresolvedMapper(sibling))?;
        self.graph.invoke(id, source, target)
    }
}

/// Bound mapper for one root pair
///
/// Cheap to clone; clones share the graph.
#[derive(Debug, Clone)]
pub struct Mapper {
    graph: Arc<MapperGraph>,
}

impl Mapper {
    pub(crate) fn new(graph: MapperGraph) -> Self {
        Self {
            graph: Arc::new(graph),
        }
    }

    /// Map `source`, reusing `target` when one is given
    ///
    /// # Errors
    /// [`MapError`] from any routine in the graph.
    pub fn map(&self, source: Value, target: Option<Value>) -> Result<Value, MapError> {
        self.graph.invoke(self.graph.root, source, target)
    }

    /// Root pair
    #[must_use]
    pub fn pair(&self) -> &TypePair {
        // A finalized graph always contains its root.
        &self.graph.nodes[self.graph.root.index()].pair
    }

    /// Underlying graph
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &MapperGraph {
        &self.graph
    }

    /// Number of nodes in the graph
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    /// Never true for a bound mapper
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Whether two handles share one graph
    #[must_use]
    pub fn same_graph(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.graph, &other.graph)
    }
}
