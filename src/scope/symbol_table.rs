use std::{collections::HashMap, fmt::Display};

/// Single-letter type tag attached to a binding or computed for a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Numeric,
    Text,
    Boolean,
    /// Intermediate tag produced by `eq` and `grt`; promoted to [`Boolean`]
    /// when both operands are numeric.
    ///
    /// [`Boolean`]: TypeTag::Boolean
    Comparison,
    Void,
    Unresolved,
}

impl TypeTag {
    pub fn code(&self) -> &'static str {
        match self {
            TypeTag::Numeric => "n",
            TypeTag::Text => "t",
            TypeTag::Boolean => "b",
            TypeTag::Comparison => "c",
            TypeTag::Void => "v",
            TypeTag::Unresolved => "u",
        }
    }
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One declared name: a variable, parameter or function.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Unique id of the declaration leaf in the syntax tree.
    pub unid: u32,
    /// The name as written in the source.
    pub source_name: String,
    /// Internally generated collision-free name.
    pub unique_name: String,
    /// Declared or back-filled type. `None` until the type checker fills it
    /// in; reads as [`TypeTag::Unresolved`] through [`Binding::type_tag`].
    pub ty: Option<TypeTag>,
}

impl Binding {
    pub fn type_tag(&self) -> TypeTag {
        self.ty.unwrap_or(TypeTag::Unresolved)
    }
}

/// Index of a scope inside the [`ScopeTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(pub usize);

#[derive(Debug, Clone)]
pub struct Scope {
    pub name: String,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    entries: HashMap<String, Binding>,
}

/// Arena of lexical scopes with parent back-references. Scope 0 is the
/// program scope once the walk has started.
#[derive(Debug, Clone, Default)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    pub fn new() -> Self {
        ScopeTree { scopes: vec![] }
    }

    pub fn push(&mut self, name: &str, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            name: name.to_string(),
            parent,
            children: vec![],
            entries: HashMap::new(),
        });
        if let Some(parent) = parent {
            self.scopes[parent.0].children.push(id);
        }
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn name(&self, id: ScopeId) -> &str {
        &self.scopes[id.0].name
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.scopes[id.0].parent
    }

    pub fn contains(&self, id: ScopeId, name: &str) -> bool {
        self.scopes[id.0].entries.contains_key(name)
    }

    pub fn declare(&mut self, id: ScopeId, binding: Binding) {
        self.scopes[id.0]
            .entries
            .insert(binding.source_name.clone(), binding);
    }

    /// Looks a name up in the given scope and then outward through its
    /// ancestors, innermost match first.
    pub fn lookup(&self, from: ScopeId, name: &str) -> Option<&Binding> {
        let mut current = Some(from);
        while let Some(id) = current {
            if let Some(binding) = self.scopes[id.0].entries.get(name) {
                return Some(binding);
            }
            current = self.parent(id);
        }
        None
    }

    /// Whether any scope on the chain from `from` up to the root carries the
    /// given name as its scope name.
    pub fn chain_has_scope_named(&self, from: ScopeId, name: &str) -> bool {
        let mut current = Some(from);
        while let Some(id) = current {
            if self.scopes[id.0].name == name {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    pub fn root(&self) -> Option<ScopeId> {
        if self.scopes.is_empty() {
            None
        } else {
            Some(ScopeId(0))
        }
    }

    /// Renders the scope tree as an indented listing, for debugging.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root() {
            self.render_scope(root, 0, &mut out);
        }
        out
    }

    fn render_scope(&self, id: ScopeId, depth: usize, out: &mut String) {
        let scope = &self.scopes[id.0];
        let indent = "  ".repeat(depth);
        out.push_str(&format!("{}Scope: {}\n", indent, scope.name));

        let mut entries: Vec<&Binding> = scope.entries.values().collect();
        entries.sort_by_key(|b| b.unid);
        for binding in entries {
            out.push_str(&format!(
                "{}  {} -> {} (unid {}, type {})\n",
                indent,
                binding.source_name,
                binding.unique_name,
                binding.unid,
                binding.type_tag()
            ));
        }

        for &child in &scope.children {
            self.render_scope(child, depth + 1, out);
        }
    }
}

/// Flat table of every binding in the program, keyed by declaration id.
/// After scope analysis every reference leaf's unid indexes into this table.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    bindings: HashMap<u32, Binding>,
    /// The scope tree the table was consolidated from, kept for diagnostics.
    pub scopes: ScopeTree,
}

impl BindingTable {
    /// Flattens a scope tree into one table keyed by declaration unid.
    pub fn consolidate(scopes: ScopeTree) -> Self {
        let mut bindings = HashMap::new();
        for scope in &scopes.scopes {
            for binding in scope.entries.values() {
                bindings.insert(binding.unid, binding.clone());
            }
        }
        BindingTable { bindings, scopes }
    }

    pub fn get(&self, unid: u32) -> Option<&Binding> {
        self.bindings.get(&unid)
    }

    pub fn get_mut(&mut self, unid: u32) -> Option<&mut Binding> {
        self.bindings.get_mut(&unid)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Renders the consolidated table sorted by unid, for the symbol dump.
    pub fn render(&self) -> String {
        let mut rows: Vec<&Binding> = self.bindings.values().collect();
        rows.sort_by_key(|b| b.unid);

        let mut out = String::new();
        for binding in rows {
            out.push_str(&format!(
                "unid {} -> {} (source {}, type {})\n",
                binding.unid,
                binding.unique_name,
                binding.source_name,
                binding.type_tag()
            ));
        }
        out
    }
}
