use crate::{
    ast::tree::{Label, NodeId, SyntaxTree},
    errors::errors::TypeError,
    scope::symbol_table::{BindingTable, TypeTag},
};

use TypeTag::{Boolean, Comparison, Numeric, Text, Unresolved, Void};

/// Judges the resolved tree and back-fills declared types into the binding
/// table.
pub fn type_check(tree: &SyntaxTree, table: &mut BindingTable) -> Result<bool, TypeError> {
    TypeChecker { tree, table }.check_node(tree.root())
}

/// Computes the type of a single expression node against a binding table.
pub fn type_of(tree: &SyntaxTree, table: &BindingTable, id: NodeId) -> Result<TypeTag, TypeError> {
    judge(tree, table, id)
}

struct TypeChecker<'a> {
    tree: &'a SyntaxTree,
    table: &'a mut BindingTable,
}

impl TypeChecker<'_> {
    fn type_of(&self, id: NodeId) -> Result<TypeTag, TypeError> {
        judge(self.tree, self.table, id)
    }

    fn check_node(&mut self, id: NodeId) -> Result<bool, TypeError> {
        let mut result = match self.tree.label(id) {
            Some(Label::Prog) => {
                self.check_node(self.tree.child(id, 1))?
                    && self.check_node(self.tree.child(id, 2))?
                    && self.check_node(self.tree.child(id, 3))?
            }
            Some(Label::GlobVars) => self.check_globvars(id)?,
            Some(Label::LocVars) => self.check_locvars(id)?,
            Some(Label::Command) => self.check_command(id)?,
            Some(Label::Algo) => self.check_node(self.tree.child(id, 1))?,
            Some(Label::Instruc) => {
                if self.tree.children(id).len() == 1 {
                    true
                } else {
                    self.check_node(self.tree.child(id, 0))?
                        && self.check_node(self.tree.child(id, 2))?
                }
            }
            Some(Label::Branch) => {
                if self.type_of(self.tree.child(id, 1))? == Boolean {
                    self.check_node(self.tree.child(id, 3))?
                        && self.check_node(self.tree.child(id, 5))?
                } else {
                    false
                }
            }
            Some(Label::Assign) => self.check_assign(id)?,
            Some(Label::Functions) => {
                if self.tree.children(id).len() == 1 {
                    true
                } else {
                    self.check_node(self.tree.child(id, 0))?
                        && self.check_node(self.tree.child(id, 1))?
                }
            }
            Some(Label::Decl) => {
                self.check_node(self.tree.child(id, 0))?
                    && self.check_node(self.tree.child(id, 1))?
            }
            Some(Label::Header) => self.check_header(id)?,
            Some(Label::Body) => {
                self.check_node(self.tree.child(id, 0))?
                    && self.check_node(self.tree.child(id, 1))?
                    && self.check_node(self.tree.child(id, 2))?
                    && self.check_node(self.tree.child(id, 3))?
                    && self.check_node(self.tree.child(id, 4))?
            }
            Some(Label::SubFuncs) => self.check_node(self.tree.child(id, 0))?,
            Some(Label::Prolog) | Some(Label::Epilog) => true,
            _ => true,
        };

        // Every child is folded into the verdict as well, short-circuiting
        // once it has gone false.
        let tree: &SyntaxTree = self.tree;
        for &child in tree.children(id) {
            if result {
                result = self.check_node(child)?;
            }
        }

        Ok(result)
    }

    /// The declaration unid of the name leaf under a VNAME or FNAME wrapper.
    fn declaration(&self, wrapper: NodeId) -> Result<(u32, String), TypeError> {
        let leaf = self
            .tree
            .children(wrapper)
            .first()
            .copied()
            .ok_or_else(|| TypeError::InvalidNode {
                label: "empty name node".to_string(),
            })?;
        let name = self.tree.leaf_text(leaf).unwrap_or_default().to_string();
        Ok((self.tree.unid(leaf), name))
    }

    fn backfill(&mut self, wrapper: NodeId, ty: TypeTag) -> Result<(), TypeError> {
        let (unid, name) = self.declaration(wrapper)?;
        let binding = self
            .table
            .get_mut(unid)
            .ok_or(TypeError::MissingBinding { unid, name })?;
        binding.ty = Some(ty);
        Ok(())
    }

    fn check_globvars(&mut self, id: NodeId) -> Result<bool, TypeError> {
        if self.tree.children(id).len() == 1 {
            return Ok(true);
        }
        let ty = self.type_of(self.tree.child(id, 0))?;
        self.backfill(self.tree.child(id, 1), ty)?;
        self.check_node(self.tree.child(id, 3))
    }

    fn check_locvars(&mut self, id: NodeId) -> Result<bool, TypeError> {
        for (vtyp, vname) in [(0, 1), (3, 4), (6, 7)] {
            let ty = self.type_of(self.tree.child(id, vtyp))?;
            self.backfill(self.tree.child(id, vname), ty)?;
        }
        Ok(true)
    }

    fn check_command(&mut self, id: NodeId) -> Result<bool, TypeError> {
        let first = self.tree.child(id, 0);
        match self.tree.leaf_text(first) {
            Some("skip") | Some("halt") => Ok(true),
            Some("print") => {
                let ty = self.type_of(self.tree.child(id, 1))?;
                Ok(ty == Numeric || ty == Text)
            }
            Some("return") => self.check_return(id),
            _ => match self.tree.label(first) {
                Some(Label::Assign) | Some(Label::Branch) => self.check_node(first),
                Some(Label::Call) => Ok(self.type_of(first)? == Void),
                _ => Ok(true),
            },
        }
    }

    /// A return's atom must agree with the numeric type of the enclosing
    /// function, found by crawling to the FUNCTIONS node above and reading
    /// the declared FTYP.
    fn check_return(&mut self, id: NodeId) -> Result<bool, TypeError> {
        let functions = self
            .tree
            .enclosing(id, Label::Functions)
            .ok_or_else(|| TypeError::InvalidNode {
                label: "return outside any function".to_string(),
            })?;

        let ftyp = self
            .tree
            .child(self.tree.child(self.tree.child(functions, 0), 0), 0);
        let returned = self.type_of(self.tree.child(id, 1))?;
        let declared = self.type_of(ftyp)?;

        Ok(returned == declared && returned == Numeric)
    }

    fn check_assign(&mut self, id: NodeId) -> Result<bool, TypeError> {
        if self.tree.children(id).len() == 2 {
            // VNAME < input : only numeric input is supported
            Ok(self.type_of(self.tree.child(id, 0))? == Numeric)
        } else {
            let lhs = self.type_of(self.tree.child(id, 0))?;
            let rhs = self.type_of(self.tree.child(id, 2))?;
            Ok(lhs == rhs)
        }
    }

    fn check_header(&mut self, id: NodeId) -> Result<bool, TypeError> {
        let declared = self.type_of(self.tree.child(id, 0))?;
        self.backfill(self.tree.child(id, 1), declared)?;

        let params_numeric = {
            let t2 = self.type_of(self.tree.child(id, 3))?;
            let t3 = self.type_of(self.tree.child(id, 5))?;
            let t4 = self.type_of(self.tree.child(id, 7))?;
            t2 == t3 && t3 == t4 && t2 == Numeric
        };

        if declared != Numeric {
            return Ok(params_numeric);
        }

        // A num function must end its instruction chain with a return.
        let decl = self
            .tree
            .enclosing(id, Label::Decl)
            .ok_or_else(|| TypeError::InvalidNode {
                label: "header outside any declaration".to_string(),
            })?;
        let body = self.tree.child(decl, 1);
        let mut instruc = self.tree.child(self.tree.child(body, 2), 1);

        loop {
            if self.tree.children(instruc).len() == 1 {
                // Reached the empty tail without seeing a return.
                return Ok(false);
            }
            let command = self.tree.child(instruc, 0);
            if self.tree.leaf_text(self.tree.child(command, 0)) == Some("return") {
                return Ok(params_numeric);
            }
            instruc = self.tree.child(instruc, 2);
        }
    }
}

fn judge(tree: &SyntaxTree, table: &BindingTable, id: NodeId) -> Result<TypeTag, TypeError> {
    let label = match tree.label(id) {
        Some(label) => label,
        None => {
            return Err(TypeError::InvalidNode {
                label: tree.leaf_text(id).unwrap_or_default().to_string(),
            })
        }
    };

    match label {
        Label::VTyp => match tree.first_leaf_text(id) {
            Some("num") => Ok(Numeric),
            Some("text") => Ok(Text),
            _ => invalid(label),
        },
        Label::FTyp => match tree.first_leaf_text(id) {
            Some("num") => Ok(Numeric),
            Some("void") => Ok(Void),
            _ => invalid(label),
        },
        Label::VName | Label::FName => {
            let leaf = tree
                .children(id)
                .first()
                .copied()
                .ok_or_else(|| TypeError::InvalidNode {
                    label: label.to_string(),
                })?;
            let unid = tree.unid(leaf);
            let binding = table.get(unid).ok_or_else(|| TypeError::MissingBinding {
                unid,
                name: tree.leaf_text(leaf).unwrap_or_default().to_string(),
            })?;
            Ok(binding.type_tag())
        }
        Label::Const => match tree.first_leaf_text(id) {
            Some(text) if text.parse::<i64>().is_ok() => Ok(Numeric),
            Some(_) => Ok(Text),
            None => invalid(label),
        },
        Label::Atomic | Label::Term | Label::Arg | Label::Cond => {
            judge(tree, table, tree.child(id, 0))
        }
        Label::Call => {
            let t1 = judge(tree, table, tree.child(id, 2))?;
            let t2 = judge(tree, table, tree.child(id, 4))?;
            let t3 = judge(tree, table, tree.child(id, 6))?;
            if t1 == t2 && t2 == t3 && t1 == Numeric {
                judge(tree, table, tree.child(id, 0))
            } else {
                Ok(Unresolved)
            }
        }
        Label::UnOp => match tree.first_leaf_text(id) {
            Some("sqrt") => Ok(Numeric),
            Some("not") => Ok(Boolean),
            _ => invalid(label),
        },
        Label::BinOp => match tree.first_leaf_text(id) {
            Some("add") | Some("sub") | Some("mul") | Some("div") => Ok(Numeric),
            Some("eq") | Some("grt") => Ok(Comparison),
            Some("or") | Some("and") => Ok(Boolean),
            _ => invalid(label),
        },
        Label::Op => {
            let first = tree.child(id, 0);
            match tree.label(first) {
                Some(Label::UnOp) => {
                    let t1 = judge(tree, table, first)?;
                    let t2 = judge(tree, table, tree.child(id, 2))?;
                    if t1 == t2 && (t1 == Numeric || t1 == Boolean) {
                        Ok(t1)
                    } else {
                        Ok(Unresolved)
                    }
                }
                Some(Label::BinOp) => {
                    let t0 = judge(tree, table, first)?;
                    let t1 = judge(tree, table, tree.child(id, 2))?;
                    let t2 = judge(tree, table, tree.child(id, 4))?;
                    if t0 == t1 && t1 == t2 && (t0 == Numeric || t0 == Boolean) {
                        Ok(t0)
                    } else if t0 == Comparison && t1 == t2 && t1 == Numeric {
                        Ok(Boolean)
                    } else {
                        Ok(Unresolved)
                    }
                }
                _ => Ok(Unresolved),
            }
        }
        Label::Simple => {
            let t0 = judge(tree, table, tree.child(id, 0))?;
            let t1 = judge(tree, table, tree.child(id, 2))?;
            let t2 = judge(tree, table, tree.child(id, 4))?;
            if t0 == t1 && t1 == t2 && t0 == Boolean {
                Ok(Boolean)
            } else if t0 == Comparison && t1 == t2 && t1 == Numeric {
                Ok(Boolean)
            } else {
                Ok(Unresolved)
            }
        }
        Label::Composit => {
            let first = tree.child(id, 0);
            match tree.label(first) {
                Some(Label::BinOp) => {
                    let t0 = judge(tree, table, first)?;
                    let t1 = judge(tree, table, tree.child(id, 2))?;
                    let t2 = judge(tree, table, tree.child(id, 4))?;
                    if t0 == t1 && t1 == t2 && t0 == Boolean {
                        Ok(Boolean)
                    } else {
                        Ok(Unresolved)
                    }
                }
                Some(Label::UnOp) => {
                    let t0 = judge(tree, table, first)?;
                    let t1 = judge(tree, table, tree.child(id, 2))?;
                    if t0 == t1 && t0 == Boolean {
                        Ok(Boolean)
                    } else {
                        Ok(Unresolved)
                    }
                }
                _ => Ok(Unresolved),
            }
        }
        _ => invalid(label),
    }
}

fn invalid(label: Label) -> Result<TypeTag, TypeError> {
    Err(TypeError::InvalidNode {
        label: label.to_string(),
    })
}
