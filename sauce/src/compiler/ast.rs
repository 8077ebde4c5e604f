use std::fmt;
use std::ops::Index;

use crate::compiler::tokens::Span;
use crate::value::Value;

/// The type of a node in the syntax tree.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Text,
    Value,
    Variable,
    If,
    ElseIf,
    Else,
    ForEach,
    End,
    Debug,
}

impl NodeKind {
    /// Returns `true` if nodes of this kind open a nesting level.
    pub fn is_branch_start(self) -> bool {
        matches!(
            self,
            NodeKind::If | NodeKind::ElseIf | NodeKind::Else | NodeKind::ForEach
        )
    }

    /// Returns `true` if nodes of this kind close the open nesting level.
    pub fn is_branch_end(self) -> bool {
        matches!(self, NodeKind::ElseIf | NodeKind::Else | NodeKind::End)
    }

    /// Returns `true` if the whitespace around a node of this kind may be
    /// removed.  Values and text are never trimmed.
    pub fn is_trimmable(self) -> bool {
        !matches!(self, NodeKind::Root | NodeKind::Text | NodeKind::Value)
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Root => "Root",
            NodeKind::Text => "Text",
            NodeKind::Value => "Value",
            NodeKind::Variable => "Variable",
            NodeKind::If => "If",
            NodeKind::ElseIf => "ElseIf",
            NodeKind::Else => "Else",
            NodeKind::ForEach => "ForEach",
            NodeKind::End => "End",
            NodeKind::Debug => "Debug",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The parsed payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Root,
    Text,
    /// Interpolates the result of an expression.
    Value { expr: String },
    /// Binds the result of an expression to a name.
    ///
    /// `declare` records if the `var` keyword was used.  It has no effect
    /// on how the binding is stored.
    Variable {
        name: String,
        expr: String,
        declare: bool,
    },
    If { predicate: String },
    ElseIf { predicate: String },
    Else,
    ForEach { var: String, iter: String },
    End,
    Debug { expr: String },
}

impl Stmt {
    pub fn kind(&self) -> NodeKind {
        match self {
            Stmt::Root => NodeKind::Root,
            Stmt::Text => NodeKind::Text,
            Stmt::Value { .. } => NodeKind::Value,
            Stmt::Variable { .. } => NodeKind::Variable,
            Stmt::If { .. } => NodeKind::If,
            Stmt::ElseIf { .. } => NodeKind::ElseIf,
            Stmt::Else => NodeKind::Else,
            Stmt::ForEach { .. } => NodeKind::ForEach,
            Stmt::End => NodeKind::End,
            Stmt::Debug { .. } => NodeKind::Debug,
        }
    }
}

/// Index of a node within a [`SyntaxTree`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// The id of the root node.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single node of the syntax tree.
///
/// Nodes are owned by the tree.  Parent, child and sibling relations are
/// expressed as [`NodeId`]s into the tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub stmt: Stmt,
    /// Template data for text nodes, the trimmed tag body otherwise.
    pub content: String,
    pub span: Span,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// The node emitted right before this one in document order.
    pub prev: Option<NodeId>,
    /// The node emitted right after this one in document order.
    pub next: Option<NodeId>,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.stmt.kind()
    }
}

/// An arena holding all nodes of a parsed template.
///
/// Besides the parent/children nesting, all nodes are threaded onto a
/// doubly linked chain in the order they appear in the source, starting
/// at the root.  That chain does not care about nesting.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    trimmed: bool,
}

impl Default for SyntaxTree {
    fn default() -> Self {
        SyntaxTree::new()
    }
}

impl SyntaxTree {
    /// Creates a tree that only contains the root node.
    pub fn new() -> SyntaxTree {
        SyntaxTree {
            nodes: vec![Node {
                stmt: Stmt::Root,
                content: String::new(),
                span: Span::default(),
                parent: None,
                children: Vec::new(),
                prev: None,
                next: None,
            }],
            trimmed: false,
        }
    }

    /// Returns the root node id.
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Returns the number of nodes including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree only holds the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Returns `true` once whitespace trimming was applied.
    pub fn is_trimmed(&self) -> bool {
        self.trimmed
    }

    pub(crate) fn mark_trimmed(&mut self) {
        self.trimmed = true;
    }

    /// Looks up a node.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Appends a new node as last child of `parent` and links it into the
    /// document chain after `prev`.
    pub(crate) fn append(
        &mut self,
        parent: NodeId,
        prev: NodeId,
        stmt: Stmt,
        content: String,
        span: Span,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            stmt,
            content,
            span,
            parent: Some(parent),
            children: Vec::new(),
            prev: Some(prev),
            next: None,
        });
        self.get_mut(parent).children.push(id);
        self.get_mut(prev).next = Some(id);
        id
    }

    /// Iterates over all nodes following the document chain.
    pub fn iter_chain(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        let mut next = Some(NodeId::ROOT);
        std::iter::from_fn(move || {
            let id = some!(next);
            let node = &self[id];
            next = node.next;
            Some((id, node))
        })
    }

    /// Iterates over all nodes in pre-order (parents before children).
    pub fn iter_preorder(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        let mut stack = vec![NodeId::ROOT];
        std::iter::from_fn(move || {
            let id = some!(stack.pop());
            let node = &self[id];
            stack.extend(node.children.iter().rev().copied());
            Some((id, node))
        })
    }

    /// Returns the depth of a node.  The root has depth zero.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self[id].parent;
        while let Some(parent) = current {
            depth += 1;
            current = self[parent].parent;
        }
        depth
    }
}

impl Index<NodeId> for SyntaxTree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal.
    Const(Value),
    /// A dotted key path resolved against the context.
    Path(String),
    /// Attribute lookup on the result of another expression.
    GetAttr { expr: Box<Expr>, name: String },
    /// Subscript lookup (`expr[subscript]`).
    GetItem { expr: Box<Expr>, subscript: Box<Expr> },
    UnaryOp { op: UnaryOpKind, expr: Box<Expr> },
    BinOp {
        op: BinOpKind,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// A list literal.
    List(Vec<Expr>),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnaryOpKind {
    Not,
    Neg,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinOpKind {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    ScAnd,
    ScOr,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    In,
    Contains,
    BeginsWith,
    EndsWith,
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_branch_classification() {
        assert!(NodeKind::If.is_branch_start());
        assert!(!NodeKind::If.is_branch_end());
        assert!(NodeKind::ElseIf.is_branch_start());
        assert!(NodeKind::ElseIf.is_branch_end());
        assert!(NodeKind::Else.is_branch_start());
        assert!(NodeKind::Else.is_branch_end());
        assert!(NodeKind::ForEach.is_branch_start());
        assert!(NodeKind::End.is_branch_end());
        assert!(!NodeKind::End.is_branch_start());
        assert!(!NodeKind::Value.is_trimmable());
        assert!(!NodeKind::Text.is_trimmable());
        assert!(NodeKind::Debug.is_trimmable());
    }

    #[test]
    fn test_append_links_chain_and_children() {
        let mut tree = SyntaxTree::new();
        let a = tree.append(
            NodeId::ROOT,
            NodeId::ROOT,
            Stmt::Text,
            "a".into(),
            Span::default(),
        );
        let b = tree.append(
            a,
            a,
            Stmt::Text,
            "b".into(),
            Span::default(),
        );
        assert_eq!(tree[NodeId::ROOT].children, vec![a]);
        assert_eq!(tree[a].children, vec![b]);
        assert_eq!(tree[a].prev, Some(NodeId::ROOT));
        assert_eq!(tree[a].next, Some(b));
        assert_eq!(tree[b].parent, Some(a));
        assert_eq!(tree.depth(b), 2);
        let chain: Vec<_> = tree.iter_chain().map(|x| x.0).collect();
        assert_eq!(chain, vec![NodeId::ROOT, a, b]);
    }
}
