use log::debug;

use crate::{
    ast::tree::{Label, NodeId, SyntaxTree},
    errors::errors::ScopeError,
    lexer::tokens::RESERVED_WORDS,
};

use super::symbol_table::{Binding, BindingTable, ScopeId, ScopeTree, TypeTag};

/// A function call recorded during the walk, resolved once the whole tree
/// has been seen. Calls may refer forward to functions declared later.
struct DeferredCall {
    name: String,
    fname_leaf: NodeId,
    scope: ScopeId,
}

/// Depth-first name resolver. Consumed by [`ScopeAnalyzer::resolve`].
pub struct ScopeAnalyzer {
    scopes: ScopeTree,
    current: Option<ScopeId>,
    next_var: u32,
    next_func: u32,
    next_algo: u32,
    deferred: Vec<DeferredCall>,
}

impl ScopeAnalyzer {
    pub fn new() -> Self {
        ScopeAnalyzer {
            scopes: ScopeTree::new(),
            current: None,
            next_var: 1,
            next_func: 1,
            next_algo: 1,
            deferred: vec![],
        }
    }

    /// Resolves every name in the tree. Reference leaves have their unids
    /// rewritten to the unid of the matching declaration leaf; the returned
    /// table maps those declaration unids to bindings.
    pub fn resolve(mut self, tree: &mut SyntaxTree) -> Result<BindingTable, ScopeError> {
        if tree.label(tree.root()) != Some(Label::Prog) {
            return Err(ScopeError::MalformedTree {
                message: "root node must be PROG".to_string(),
            });
        }

        self.visit(tree, tree.root())?;
        self.resolve_calls(tree)?;

        debug!("scope tree:\n{}", self.scopes.render());

        Ok(BindingTable::consolidate(self.scopes))
    }

    fn visit(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), ScopeError> {
        match tree.label(id) {
            Some(Label::Prog) => self.enter_scope("main"),
            Some(Label::Functions) => self.declare_function(tree, id)?,
            Some(Label::GlobVars) | Some(Label::LocVars) => self.declare_variables(tree, id)?,
            Some(Label::Command) => self.check_command(tree, id)?,
            Some(Label::Cond) => self.check_cond(tree, id)?,
            Some(Label::Algo) => {
                let name = format!("algo{}", self.next_algo);
                self.next_algo += 1;
                self.enter_scope(&name);
            }
            _ => {}
        }

        let children = tree.children(id).to_vec();
        for child in children {
            self.visit(tree, child)?;
        }

        if tree.leaf_text(id) == Some("end") || tree.label(id) == Some(Label::Prog) {
            self.exit_scope();
        }

        Ok(())
    }

    fn enter_scope(&mut self, name: &str) {
        let id = self.scopes.push(name, self.current);
        self.current = Some(id);
    }

    fn exit_scope(&mut self) {
        if let Some(id) = self.current {
            if let Some(parent) = self.scopes.parent(id) {
                self.current = Some(parent);
            }
        }
    }

    fn current_scope(&self) -> Result<ScopeId, ScopeError> {
        self.current.ok_or_else(|| ScopeError::MalformedTree {
            message: "no active scope".to_string(),
        })
    }

    fn fresh_var_name(&mut self) -> String {
        let name = format!("varName{}", self.next_var);
        self.next_var += 1;
        name
    }

    fn fresh_func_name(&mut self) -> String {
        let name = format!("functionName{}", self.next_func);
        self.next_func += 1;
        name
    }

    /// The name leaf under a VNAME or FNAME wrapper node.
    fn name_leaf(&self, tree: &SyntaxTree, wrapper: NodeId) -> Result<NodeId, ScopeError> {
        tree.children(wrapper)
            .first()
            .copied()
            .ok_or_else(|| ScopeError::MalformedTree {
                message: "name node has no children".to_string(),
            })
    }

    fn leaf_word(&self, tree: &SyntaxTree, leaf: NodeId) -> Result<String, ScopeError> {
        tree.leaf_text(leaf)
            .map(str::to_string)
            .ok_or_else(|| ScopeError::MalformedTree {
                message: "expected a leaf node".to_string(),
            })
    }

    /// Declares each VTYP VNAME pair directly under a GLOBVARS or LOCVARS
    /// node into the current scope. A nested GLOBVARS tail is picked up by
    /// the walk itself.
    fn declare_variables(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<(), ScopeError> {
        if tree.label(id) == Some(Label::LocVars) && tree.children(id).len() != 9 {
            return Err(ScopeError::MalformedTree {
                message: "LOCVARS must declare exactly 3 variables".to_string(),
            });
        }

        let scope = self.current_scope()?;
        let children = tree.children(id).to_vec();

        let mut i = 0;
        while i < children.len() {
            if tree.label(children[i]) == Some(Label::VTyp) {
                let vname = children.get(i + 1).copied().ok_or_else(|| {
                    ScopeError::MalformedTree {
                        message: "expected a variable name after type declaration".to_string(),
                    }
                })?;
                if tree.label(vname) != Some(Label::VName) {
                    return Err(ScopeError::MalformedTree {
                        message: "expected a variable name after type declaration".to_string(),
                    });
                }

                let leaf = self.name_leaf(tree, vname)?;
                let name = self.leaf_word(tree, leaf)?;

                if self.scopes.contains(scope, &name) {
                    return Err(ScopeError::VariableAlreadyDeclared { name });
                }
                if RESERVED_WORDS.contains(name.as_str()) {
                    return Err(ScopeError::ReservedKeyword { name });
                }

                let unique_name = self.fresh_var_name();
                self.scopes.declare(
                    scope,
                    Binding {
                        unid: tree.unid(leaf),
                        source_name: name,
                        unique_name,
                        ty: None,
                    },
                );
                i += 2;
            } else {
                i += 1;
            }
        }

        Ok(())
    }

    /// Registers the function declared under a FUNCTIONS node in the current
    /// scope, then opens the function's own scope and declares its three
    /// parameters there. The matching `end` leaf of the BODY closes it.
    fn declare_function(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<(), ScopeError> {
        let first = tree
            .children(id)
            .first()
            .copied()
            .ok_or_else(|| ScopeError::MalformedTree {
                message: "FUNCTIONS node has no children".to_string(),
            })?;
        if tree.leaf_text(first) == Some("e") {
            return Ok(());
        }

        let decl = first;
        let header = tree.child(decl, 0);
        if tree.label(header) != Some(Label::Header) {
            return Err(ScopeError::MalformedTree {
                message: "function declaration is missing its HEADER".to_string(),
            });
        }

        let fname_leaf = self.name_leaf(tree, tree.child(header, 1))?;
        let name = self.leaf_word(tree, fname_leaf)?;

        if RESERVED_WORDS.contains(name.as_str()) {
            return Err(ScopeError::ReservedKeyword { name });
        }

        let scope = self.current_scope()?;
        if self.scopes.contains(scope, &name) {
            return Err(ScopeError::FunctionAlreadyDeclared { name });
        }
        if self.scopes.name(scope) == name {
            return Err(ScopeError::ScopeNameCollision { name });
        }

        let ty = match tree.first_leaf_text(tree.child(header, 0)) {
            Some("num") => TypeTag::Numeric,
            Some("void") => TypeTag::Void,
            _ => {
                return Err(ScopeError::MalformedTree {
                    message: "invalid function return type".to_string(),
                })
            }
        };

        let unique_name = self.fresh_func_name();
        self.scopes.declare(
            scope,
            Binding {
                unid: tree.unid(fname_leaf),
                source_name: name.clone(),
                unique_name,
                ty: Some(ty),
            },
        );

        self.enter_scope(&name);
        let scope = self.current_scope()?;

        // Parameter VNAMEs sit at fixed positions 3, 5 and 7.
        for i in [3, 5, 7] {
            let param = tree.child(header, i);
            if tree.label(param) != Some(Label::VName) {
                continue;
            }
            let leaf = self.name_leaf(tree, param)?;
            let param_name = self.leaf_word(tree, leaf)?;

            if RESERVED_WORDS.contains(param_name.as_str()) {
                return Err(ScopeError::ReservedKeyword { name: param_name });
            }
            if self.scopes.contains(scope, &param_name) {
                return Err(ScopeError::VariableAlreadyDeclared { name: param_name });
            }

            let unique_name = self.fresh_var_name();
            self.scopes.declare(
                scope,
                Binding {
                    unid: tree.unid(leaf),
                    source_name: param_name,
                    unique_name,
                    // Provisional; the type checker back-fills from use.
                    ty: Some(TypeTag::Numeric),
                },
            );
        }

        Ok(())
    }

    fn check_command(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), ScopeError> {
        let first = tree
            .children(id)
            .first()
            .copied()
            .ok_or_else(|| ScopeError::MalformedTree {
                message: "COMMAND node has no children".to_string(),
            })?;

        match tree.leaf_text(first) {
            Some("print") => self.check_atomic(tree, tree.child(id, 1))?,
            Some("return") => {
                self.check_return()?;
                self.check_atomic(tree, tree.child(id, 1))?;
            }
            Some(_) => {} // skip, halt
            None => match tree.label(first) {
                Some(Label::Assign) => self.check_assign(tree, first)?,
                Some(Label::Call) => self.check_call(tree, first)?,
                // BRANCH conditions are handled when the walk reaches COND.
                _ => {}
            },
        }

        Ok(())
    }

    /// A return command is legal only inside a function scope. Walking
    /// outward, hitting `main` first means the return sits in the main
    /// algorithm chain.
    fn check_return(&self) -> Result<(), ScopeError> {
        let mut current = Some(self.current_scope()?);
        while let Some(id) = current {
            let name = self.scopes.name(id);
            if name.starts_with("F_") {
                return Ok(());
            }
            if name == "main" {
                return Err(ScopeError::ReturnInMain);
            }
            current = self.scopes.parent(id);
        }
        Err(ScopeError::ReturnOutsideFunction)
    }

    fn check_assign(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), ScopeError> {
        let vname = tree.child(id, 0);
        let leaf = self.name_leaf(tree, vname)?;
        self.resolve_variable(tree, leaf)?;

        let children = tree.children(id).to_vec();
        match children.len() {
            2 => Ok(()), // VNAME < input
            3 => self.check_term(tree, children[2]),
            _ => Err(ScopeError::MalformedTree {
                message: "invalid ASSIGN structure".to_string(),
            }),
        }
    }

    fn check_term(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), ScopeError> {
        let child = tree
            .children(id)
            .first()
            .copied()
            .ok_or_else(|| ScopeError::MalformedTree {
                message: "TERM node has no children".to_string(),
            })?;

        match tree.label(child) {
            Some(Label::Atomic) => self.check_atomic(tree, child),
            Some(Label::Call) => self.check_call(tree, child),
            Some(Label::Op) => self.check_op(tree, child),
            _ => Err(ScopeError::MalformedTree {
                message: "invalid TERM child".to_string(),
            }),
        }
    }

    fn check_atomic(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), ScopeError> {
        let child = tree
            .children(id)
            .first()
            .copied()
            .ok_or_else(|| ScopeError::MalformedTree {
                message: "ATOMIC node has no children".to_string(),
            })?;

        match tree.label(child) {
            Some(Label::VName) => {
                let leaf = self.name_leaf(tree, child)?;
                self.resolve_variable(tree, leaf)
            }
            Some(Label::Const) => Ok(()),
            _ => Err(ScopeError::MalformedTree {
                message: "invalid ATOMIC child".to_string(),
            }),
        }
    }

    fn check_op(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), ScopeError> {
        let first = tree
            .children(id)
            .first()
            .copied()
            .ok_or_else(|| ScopeError::MalformedTree {
                message: "OP node has no children".to_string(),
            })?;

        match tree.label(first) {
            Some(Label::UnOp) => self.check_arg(tree, tree.child(id, 2)),
            Some(Label::BinOp) => {
                self.check_arg(tree, tree.child(id, 2))?;
                self.check_arg(tree, tree.child(id, 4))
            }
            _ => Err(ScopeError::MalformedTree {
                message: "invalid OP child".to_string(),
            }),
        }
    }

    fn check_arg(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), ScopeError> {
        let child = tree
            .children(id)
            .first()
            .copied()
            .ok_or_else(|| ScopeError::MalformedTree {
                message: "ARG node has no children".to_string(),
            })?;

        match tree.label(child) {
            Some(Label::Atomic) => self.check_atomic(tree, child),
            Some(Label::Op) => self.check_op(tree, child),
            _ => Err(ScopeError::MalformedTree {
                message: "invalid ARG child".to_string(),
            }),
        }
    }

    /// Validates the three arguments and records the call for resolution
    /// after the walk.
    fn check_call(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), ScopeError> {
        for i in [2, 4, 6] {
            self.check_atomic(tree, tree.child(id, i))?;
        }

        let fname_leaf = self.name_leaf(tree, tree.child(id, 0))?;
        let name = self.leaf_word(tree, fname_leaf)?;
        self.deferred.push(DeferredCall {
            name,
            fname_leaf,
            scope: self.current_scope()?,
        });

        Ok(())
    }

    fn check_cond(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), ScopeError> {
        let child = tree
            .children(id)
            .first()
            .copied()
            .ok_or_else(|| ScopeError::MalformedTree {
                message: "COND node has no children".to_string(),
            })?;

        match tree.label(child) {
            Some(Label::Simple) => self.check_simple(tree, child),
            Some(Label::Composit) => self.check_composit(tree, child),
            _ => Err(ScopeError::MalformedTree {
                message: "invalid COND child".to_string(),
            }),
        }
    }

    fn check_simple(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), ScopeError> {
        if tree.children(id).len() != 6 {
            return Err(ScopeError::MalformedTree {
                message: "invalid SIMPLE structure".to_string(),
            });
        }
        self.check_atomic(tree, tree.child(id, 2))?;
        self.check_atomic(tree, tree.child(id, 4))
    }

    fn check_composit(&mut self, tree: &mut SyntaxTree, id: NodeId) -> Result<(), ScopeError> {
        match tree.children(id).len() {
            6 => {
                self.check_simple(tree, tree.child(id, 2))?;
                self.check_simple(tree, tree.child(id, 4))
            }
            4 => self.check_simple(tree, tree.child(id, 2)),
            _ => Err(ScopeError::MalformedTree {
                message: "invalid COMPOSIT structure".to_string(),
            }),
        }
    }

    /// Looks the variable up from the current scope outward and rewrites the
    /// reference leaf's unid to the declaration's.
    fn resolve_variable(&mut self, tree: &mut SyntaxTree, leaf: NodeId) -> Result<(), ScopeError> {
        let name = self.leaf_word(tree, leaf)?;
        let scope = self.current_scope()?;

        let binding = self
            .scopes
            .lookup(scope, &name)
            .ok_or(ScopeError::VariableNotDeclared { name })?;

        tree.set_unid(leaf, binding.unid);
        Ok(())
    }

    fn resolve_calls(&mut self, tree: &mut SyntaxTree) -> Result<(), ScopeError> {
        for call in &self.deferred {
            if call.name == "main" && self.scopes.chain_has_scope_named(call.scope, "main") {
                return Err(ScopeError::RecursiveMain);
            }

            let binding = self
                .scopes
                .lookup(call.scope, &call.name)
                .ok_or_else(|| ScopeError::UnresolvedCall {
                    name: call.name.clone(),
                })?;

            debug!(
                "call to {:?} resolved to {} (unid {})",
                call.name, binding.unique_name, binding.unid
            );
            tree.set_unid(call.fname_leaf, binding.unid);
        }

        Ok(())
    }
}

impl Default for ScopeAnalyzer {
    fn default() -> Self {
        ScopeAnalyzer::new()
    }
}
