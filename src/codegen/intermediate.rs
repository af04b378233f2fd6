use log::debug;

use crate::{
    ast::tree::{Label, NodeId, SyntaxTree},
    errors::errors::CodeGenError,
    scope::symbol_table::{Binding, BindingTable},
};

/// Lowers the entry algorithm to a flat three-address listing. Function
/// bodies are left to the target generator; a call lowers to a single
/// `CALL_` pseudo-instruction.
pub struct IntermediateGenerator<'a> {
    table: &'a BindingTable,
    next_temp: u32,
    next_label: u32,
}

impl<'a> IntermediateGenerator<'a> {
    pub fn new(table: &'a BindingTable) -> Self {
        IntermediateGenerator {
            table,
            next_temp: 1,
            next_label: 1,
        }
    }

    pub fn lower(&mut self, tree: &SyntaxTree) -> Result<String, CodeGenError> {
        let mut out = vec![];
        let root = tree.root();

        self.lower_algo(tree, tree.child(root, 2), &mut out)?;
        out.push("STOP".to_string());

        debug!("lowered {} intermediate instructions", out.len());

        let mut code = out.join("\n");
        code.push('\n');
        Ok(code)
    }

    fn fresh_temp(&mut self) -> String {
        let name = format!("t{}", self.next_temp);
        self.next_temp += 1;
        name
    }

    fn fresh_label(&mut self) -> String {
        let name = format!("l{}", self.next_label);
        self.next_label += 1;
        name
    }

    fn binding(&self, tree: &SyntaxTree, leaf: NodeId) -> Result<&Binding, CodeGenError> {
        let unid = tree.unid(leaf);
        self.table
            .get(unid)
            .ok_or(CodeGenError::MissingBinding { unid })
    }

    fn lower_algo(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        self.lower_instruc(tree, tree.child(id, 1), out)
    }

    fn lower_instruc(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        if tree.leaf_text(tree.child(id, 0)) == Some("e") {
            out.push("REM END".to_string());
            return Ok(());
        }

        self.lower_command(tree, tree.child(id, 0), out)?;
        self.lower_instruc(tree, tree.child(id, 2), out)
    }

    fn lower_command(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        let first = tree.child(id, 0);
        match tree.leaf_text(first) {
            Some("skip") => {
                out.push("REM DO NOTHING".to_string());
                Ok(())
            }
            Some("halt") => {
                out.push("STOP".to_string());
                Ok(())
            }
            Some("print") => {
                let value = self.atom_value(tree, tree.child(id, 1))?;
                out.push(format!("PRINT {}", value));
                Ok(())
            }
            Some("return") => {
                // Rejected for the entry algorithm during scope analysis;
                // function bodies are not lowered here.
                Err(CodeGenError::MalformedTree {
                    message: "return command in entry algorithm".to_string(),
                })
            }
            _ => match tree.label(first) {
                Some(Label::Assign) => self.lower_assign(tree, first, out),
                Some(Label::Call) => {
                    let call = self.render_call(tree, first)?;
                    out.push(call);
                    Ok(())
                }
                Some(Label::Branch) => self.lower_branch(tree, first, out),
                _ => Err(CodeGenError::MalformedTree {
                    message: "invalid COMMAND child".to_string(),
                }),
            },
        }
    }

    fn lower_assign(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        let vname_leaf = tree.child(tree.child(id, 0), 0);
        let dest = self.binding(tree, vname_leaf)?.unique_name.clone();

        if tree.children(id).len() == 2 {
            out.push(format!("INPUT {}", dest));
            return Ok(());
        }

        let temp = self.fresh_temp();
        self.lower_expr(tree, tree.child(id, 2), &temp, out)?;
        out.push(format!("{} := {}", dest, temp));
        Ok(())
    }

    /// Emits code leaving the expression's value in `dest`.
    fn lower_expr(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        dest: &str,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        match tree.label(id) {
            Some(Label::Term) | Some(Label::Arg) => {
                self.lower_expr(tree, tree.child(id, 0), dest, out)
            }
            Some(Label::Atomic) => {
                let value = self.atom_value(tree, id)?;
                out.push(format!("{} := {}", dest, value));
                Ok(())
            }
            Some(Label::Call) => {
                let call = self.render_call(tree, id)?;
                out.push(format!("{} := {}", dest, call));
                Ok(())
            }
            Some(Label::Op) => self.lower_op(tree, id, dest, out),
            _ => Err(CodeGenError::MalformedTree {
                message: "invalid expression node".to_string(),
            }),
        }
    }

    fn lower_op(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        dest: &str,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        let first = tree.child(id, 0);
        match tree.label(first) {
            Some(Label::UnOp) => {
                let temp = self.fresh_temp();
                self.lower_expr(tree, tree.child(id, 2), &temp, out)?;
                let name = unop_name(tree, first)?;
                out.push(format!("{} := {}({})", dest, name, temp));
                Ok(())
            }
            Some(Label::BinOp) => {
                let left = self.fresh_temp();
                let right = self.fresh_temp();
                self.lower_expr(tree, tree.child(id, 2), &left, out)?;
                self.lower_expr(tree, tree.child(id, 4), &right, out)?;
                let symbol = binop_symbol(tree, first)?;
                out.push(format!("{} := {} {} {}", dest, left, symbol, right));
                Ok(())
            }
            _ => Err(CodeGenError::MalformedTree {
                message: "invalid OP child".to_string(),
            }),
        }
    }

    /// The inline value of an ATOMIC: a variable's unique name or the
    /// constant text.
    fn atom_value(&self, tree: &SyntaxTree, id: NodeId) -> Result<String, CodeGenError> {
        let child = tree.child(id, 0);
        match tree.label(child) {
            Some(Label::VName) => {
                let leaf = tree.child(child, 0);
                Ok(self.binding(tree, leaf)?.unique_name.clone())
            }
            Some(Label::Const) => {
                tree.first_leaf_text(child)
                    .map(str::to_string)
                    .ok_or_else(|| CodeGenError::MalformedTree {
                        message: "CONST node has no leaf".to_string(),
                    })
            }
            _ => Err(CodeGenError::MalformedTree {
                message: "invalid ATOMIC child".to_string(),
            }),
        }
    }

    fn render_call(&self, tree: &SyntaxTree, id: NodeId) -> Result<String, CodeGenError> {
        let fname_leaf = tree.child(tree.child(id, 0), 0);
        let name = self.binding(tree, fname_leaf)?.unique_name.clone();
        let a = self.atom_value(tree, tree.child(id, 2))?;
        let b = self.atom_value(tree, tree.child(id, 4))?;
        let c = self.atom_value(tree, tree.child(id, 6))?;
        Ok(format!("CALL_{}({},{},{})", name, a, b, c))
    }

    fn lower_branch(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        let then_label = self.fresh_label();
        let else_label = self.fresh_label();
        let join_label = self.fresh_label();

        let cond = tree.child(tree.child(id, 1), 0);
        self.lower_cond(tree, cond, &then_label, &else_label, out)?;

        out.push(format!("LABEL {}", then_label));
        self.lower_algo(tree, tree.child(id, 3), out)?;
        out.push(format!("GOTO {}", join_label));
        out.push(format!("LABEL {}", else_label));
        self.lower_algo(tree, tree.child(id, 5), out)?;
        out.push(format!("LABEL {}", join_label));
        Ok(())
    }

    /// Jumping code: evaluates the condition and transfers control to one
    /// of the two labels, short-circuiting `and` and `or`.
    fn lower_cond(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        label_true: &str,
        label_false: &str,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        match tree.label(id) {
            Some(Label::Simple) => {
                let left = self.fresh_temp();
                let right = self.fresh_temp();
                self.lower_expr(tree, tree.child(id, 2), &left, out)?;
                self.lower_expr(tree, tree.child(id, 4), &right, out)?;
                let relop = binop_symbol(tree, tree.child(id, 0))?;
                out.push(format!(
                    "IF {} {} {} THEN {} ELSE {}",
                    left, relop, right, label_true, label_false
                ));
                Ok(())
            }
            Some(Label::Composit) => {
                let first = tree.child(id, 0);
                match tree.label(first) {
                    Some(Label::UnOp) => {
                        // not: swap the targets
                        self.lower_cond(tree, tree.child(id, 2), label_false, label_true, out)
                    }
                    Some(Label::BinOp) => match tree.first_leaf_text(first) {
                        Some("and") => {
                            let mid = self.fresh_label();
                            self.lower_cond(tree, tree.child(id, 2), &mid, label_false, out)?;
                            out.push(format!("LABEL {}", mid));
                            self.lower_cond(tree, tree.child(id, 4), label_true, label_false, out)
                        }
                        Some("or") => {
                            let mid = self.fresh_label();
                            self.lower_cond(tree, tree.child(id, 2), label_true, &mid, out)?;
                            out.push(format!("LABEL {}", mid));
                            self.lower_cond(tree, tree.child(id, 4), label_true, label_false, out)
                        }
                        other => Err(CodeGenError::UnsupportedOperator {
                            op: other.unwrap_or_default().to_string(),
                        }),
                    },
                    _ => Err(CodeGenError::MalformedTree {
                        message: "invalid COMPOSIT child".to_string(),
                    }),
                }
            }
            _ => Err(CodeGenError::MalformedTree {
                message: "invalid condition node".to_string(),
            }),
        }
    }
}

fn unop_name(tree: &SyntaxTree, id: NodeId) -> Result<&'static str, CodeGenError> {
    match tree.first_leaf_text(id) {
        Some("sqrt") => Ok("SQR"),
        Some("not") => Ok("NOT"),
        other => Err(CodeGenError::UnsupportedOperator {
            op: other.unwrap_or_default().to_string(),
        }),
    }
}

fn binop_symbol(tree: &SyntaxTree, id: NodeId) -> Result<&'static str, CodeGenError> {
    match tree.first_leaf_text(id) {
        Some("eq") => Ok("="),
        Some("grt") => Ok(">"),
        Some("add") => Ok("+"),
        Some("sub") => Ok("-"),
        Some("mul") => Ok("*"),
        Some("div") => Ok("/"),
        other => Err(CodeGenError::UnsupportedOperator {
            op: other.unwrap_or_default().to_string(),
        }),
    }
}
