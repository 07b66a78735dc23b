//! The abstract syntax tree built during a parse.
//!
//! Nodes live in an arena owned by [`Ast`] and refer to each other by
//! [`NodeId`]. The tree is grown only through a cursor: `add_node` appends a
//! child under the cursor and moves onto it, `add_tokens` attaches tokens to
//! the node under the cursor, and `walk_up` returns to the parent. Parse
//! rules drive these through the [`Parser`](crate::Parser).
//!
//! Read access goes through [`NodeRef`], a borrowed view of one node.

use crate::diagnostics::DslError;
use crate::token::Token;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

mod print;
mod serialize;

// ============================================================================
// NODE KINDS
// ============================================================================

/// An open, grammar-defined node tag. `ROOT` is reserved for the tree root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKind(Cow<'static, str>);

impl NodeKind {
    pub const ROOT: NodeKind = NodeKind::from_static("ROOT");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The declared node kinds of a grammar. `ROOT` is always a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSet {
    kinds: BTreeSet<NodeKind>,
}

impl NodeSet {
    pub fn new<I>(kinds: I) -> Result<Self, DslError>
    where
        I: IntoIterator<Item = NodeKind>,
    {
        let mut set = BTreeSet::from([NodeKind::ROOT]);
        for kind in kinds {
            if !set.insert(kind.clone()) {
                return Err(DslError::DuplicateKind {
                    kind: kind.to_string(),
                });
            }
        }
        Ok(Self { kinds: set })
    }

    pub fn contains(&self, kind: &NodeKind) -> bool {
        self.kinds.contains(kind)
    }
}

// ============================================================================
// TREE
// ============================================================================

/// Index of a node in its [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    tokens: Vec<Token>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A rooted, ordered tree of nodes plus a cursor naming the node currently
/// being built.
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<NodeData>,
    cursor: NodeId,
}

const ROOT_ID: NodeId = NodeId(0);

impl Ast {
    /// A tree holding only the root, with the cursor on it.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::ROOT,
                tokens: Vec::new(),
                parent: None,
                children: Vec::new(),
            }],
            cursor: ROOT_ID,
        }
    }

    pub fn root(&self) -> NodeRef<'_> {
        self.node(ROOT_ID)
    }

    /// The node under the cursor.
    pub fn cursor(&self) -> NodeRef<'_> {
        self.node(self.cursor)
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { ast: self, id }
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// How many parent links separate the cursor from the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut at = self.cursor;
        while let Some(parent) = self.nodes[at.0].parent {
            depth += 1;
            at = parent;
        }
        depth
    }

    /// Appends a new child under the cursor and moves the cursor onto it.
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            tokens: Vec::new(),
            parent: Some(self.cursor),
            children: Vec::new(),
        });
        self.nodes[self.cursor.0].children.push(id);
        self.cursor = id;
        id
    }

    /// Appends `tokens` to the node under the cursor.
    pub fn add_tokens(&mut self, tokens: impl IntoIterator<Item = Token>) {
        self.nodes[self.cursor.0].tokens.extend(tokens);
    }

    /// Moves the cursor to its parent. At the root this does nothing.
    pub fn walk_up(&mut self) {
        if let Some(parent) = self.nodes[self.cursor.0].parent {
            self.cursor = parent;
        }
    }

    pub fn walk_to_root(&mut self) {
        self.cursor = ROOT_ID;
    }

    /// Visits every node depth-first, children left to right before their
    /// parent, so the root is visited last.
    pub fn inspect<F>(&self, mut visit: F)
    where
        F: FnMut(NodeRef<'_>),
    {
        self.visit_post_order(ROOT_ID, &mut visit);
    }

    fn visit_post_order<F>(&self, id: NodeId, visit: &mut F)
    where
        F: FnMut(NodeRef<'_>),
    {
        for &child in &self.nodes[id.0].children {
            self.visit_post_order(child, visit);
        }
        visit(self.node(id));
    }

    /// Writes the tree to standard output.
    pub fn print(&self) {
        print!("{self}");
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

/// A borrowed view of one node.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    ast: &'a Ast,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn data(&self) -> &'a NodeData {
        &self.ast.nodes[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &'a NodeKind {
        &self.data().kind
    }

    pub fn tokens(&self) -> &'a [Token] {
        &self.data().tokens
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.data().parent.map(|id| self.ast.node(id))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let ast = self.ast;
        self.data().children.iter().map(move |&id| ast.node(id))
    }

    pub fn child(&self, index: usize) -> Option<NodeRef<'a>> {
        self.data().children.get(index).map(|&id| self.ast.node(id))
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    /// Literals of this node's tokens, in order.
    pub fn literals(&self) -> Vec<&'a str> {
        self.tokens().iter().map(|t| t.literal.as_str()).collect()
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("kind", self.kind())
            .field("literals", &self.literals())
            .field("children", &self.child_count())
            .finish()
    }
}
