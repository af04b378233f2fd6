use std::fmt::Display;

/// Index of a node inside the [`SyntaxTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Grammar-symbol label of an inner node, one variant per production.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Prog,
    GlobVars,
    VTyp,
    VName,
    FTyp,
    FName,
    Algo,
    Instruc,
    Command,
    Assign,
    Term,
    Atomic,
    Const,
    Call,
    Op,
    UnOp,
    BinOp,
    Arg,
    Cond,
    Simple,
    Composit,
    Branch,
    Functions,
    Decl,
    Header,
    Body,
    Prolog,
    Epilog,
    LocVars,
    SubFuncs,
}

impl Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A node is either an inner node labelled by its production, or a leaf
/// carrying terminal text.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Inner(Label),
    Leaf(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    /// Unique node id. Assigned monotonically at parse time; scope analysis
    /// rewrites the unid of reference leaves to the declaring leaf's unid.
    pub unid: u32,
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

/// Arena-backed concrete syntax tree with parent back-references.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        SyntaxTree {
            nodes: vec![],
            root: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root.expect("syntax tree has no root")
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn add_inner(&mut self, label: Label, unid: u32) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            unid,
            kind: NodeKind::Inner(label),
            children: vec![],
            parent: None,
        });
        id
    }

    pub fn add_leaf(&mut self, terminal: &str, unid: u32) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            unid,
            kind: NodeKind::Leaf(terminal.to_string()),
            children: vec![],
            parent: None,
        });
        id
    }

    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn unid(&self, id: NodeId) -> u32 {
        self.nodes[id.0].unid
    }

    /// Rewrites a node's unid. Used by the resolver to point reference
    /// leaves at their declaration sites.
    pub fn set_unid(&mut self, id: NodeId, unid: u32) {
        self.nodes[id.0].unid = unid;
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Returns the `i`-th child. Child positions are fixed by the grammar.
    pub fn child(&self, id: NodeId, i: usize) -> NodeId {
        self.nodes[id.0].children[i]
    }

    pub fn label(&self, id: NodeId) -> Option<Label> {
        match self.nodes[id.0].kind {
            NodeKind::Inner(label) => Some(label),
            NodeKind::Leaf(_) => None,
        }
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Leaf(_))
    }

    pub fn leaf_text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Leaf(text) => Some(text.as_str()),
            NodeKind::Inner(_) => None,
        }
    }

    /// The terminal text of the node's first child, for labels whose first
    /// child is always a leaf (VTYP, FTYP, UNOP, BINOP, CONST, ...).
    pub fn first_leaf_text(&self, id: NodeId) -> Option<&str> {
        let first = *self.nodes[id.0].children.first()?;
        self.leaf_text(first)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walks parent links upward until a node with the given label is found.
    pub fn enclosing(&self, id: NodeId, label: Label) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if self.label(node) == Some(label) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Renders the tree as an indented listing, for debugging.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.root.is_some() {
            self.render_node(self.root(), 0, &mut out);
        }
        out
    }

    fn render_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        let text = match &node.kind {
            NodeKind::Inner(label) => format!("{}", label),
            NodeKind::Leaf(terminal) => format!("{:?}", terminal),
        };
        out.push_str(&format!(
            "{}{} [unid={}]\n",
            "  ".repeat(depth),
            text,
            node.unid
        ));
        for &child in &node.children {
            self.render_node(child, depth + 1, out);
        }
    }
}

impl Default for SyntaxTree {
    fn default() -> Self {
        SyntaxTree::new()
    }
}
