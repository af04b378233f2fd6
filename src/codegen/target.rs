use std::collections::HashMap;

use log::debug;
use regex::Regex;

use crate::{
    ast::tree::{Label, NodeId, SyntaxTree},
    errors::errors::CodeGenError,
    scope::symbol_table::{Binding, BindingTable, TypeTag},
};

const DEFAULT_MAX_DEPTH: u32 = 20;

/// Emits line-numbered BASIC. The call stack is simulated in a matrix `M`:
/// row 0 carries return values, rows 1-3 the parameters and rows 4-6 the
/// locals of the active frame, indexed by the depth counter `f`.
pub struct TargetGenerator<'a> {
    table: &'a BindingTable,
    line: u32,
    max_depth: u32,
    /// First line of each emitted function, keyed by unique name. Used by
    /// the post-pass that patches GOSUB targets.
    function_lines: HashMap<String, u32>,
    /// Locals of the function currently being emitted, spilled around calls.
    local_vars: Vec<String>,
    param_vars: Vec<String>,
}

impl<'a> TargetGenerator<'a> {
    pub fn new(table: &'a BindingTable) -> Self {
        Self::with_max_depth(table, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(table: &'a BindingTable, max_depth: u32) -> Self {
        TargetGenerator {
            table,
            line: 10,
            max_depth,
            function_lines: HashMap::new(),
            local_vars: vec![],
            param_vars: vec![],
        }
    }

    pub fn generate(&mut self, tree: &SyntaxTree) -> Result<String, CodeGenError> {
        let mut out = vec![];
        let root = tree.root();

        self.emit(&mut out, format!("DIM M(7, {})", self.max_depth));
        self.emit(&mut out, "LET f = 0".to_string());
        self.emit_globvars(tree, tree.child(root, 1), &mut out)?;
        self.emit_algo(tree, tree.child(root, 2), &mut out)?;
        self.emit(&mut out, "END".to_string());
        self.emit_functions(tree, tree.child(root, 3), &mut out)?;

        debug!(
            "emitted {} target lines, {} functions",
            out.len(),
            self.function_lines.len()
        );

        let mut code = out.join("\n");
        code.push('\n');
        self.patch_gosubs(code)
    }

    fn emit(&mut self, out: &mut Vec<String>, text: String) {
        out.push(format!("{} {}", self.line, text));
        self.line += 10;
    }

    fn binding(&self, tree: &SyntaxTree, leaf: NodeId) -> Result<&Binding, CodeGenError> {
        let unid = tree.unid(leaf);
        self.table
            .get(unid)
            .ok_or(CodeGenError::MissingBinding { unid })
    }

    /// A variable's BASIC name: the unique name, with the string suffix for
    /// text variables.
    fn basic_var_name(&self, binding: &Binding) -> String {
        if binding.type_tag() == TypeTag::Text {
            format!("{}$", binding.unique_name)
        } else {
            binding.unique_name.clone()
        }
    }

    fn emit_globvars(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        for &child in &tree.children(id).to_vec() {
            match tree.label(child) {
                Some(Label::VName) => {
                    let name = self.binding(tree, tree.child(child, 0))?.unique_name.clone();
                    self.emit(out, format!("LET {} = 0", name));
                }
                Some(Label::GlobVars) => self.emit_globvars(tree, child, out)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn emit_algo(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        self.emit_instruc(tree, tree.child(id, 1), out)
    }

    fn emit_instruc(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        if tree.leaf_text(tree.child(id, 0)) == Some("e") {
            self.emit(out, "REM END".to_string());
            return Ok(());
        }

        self.emit_command(tree, tree.child(id, 0), out)?;
        self.emit_instruc(tree, tree.child(id, 2), out)
    }

    fn emit_command(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        let first = tree.child(id, 0);
        match tree.leaf_text(first) {
            Some("skip") => {
                self.emit(out, "REM DO NOTHING".to_string());
                Ok(())
            }
            Some("halt") => {
                self.emit(out, "STOP".to_string());
                Ok(())
            }
            Some("print") => {
                let value = self.render_expr(tree, tree.child(id, 1))?;
                self.emit(out, format!("PRINT {}", value));
                Ok(())
            }
            Some("return") => {
                let value = self.render_expr(tree, tree.child(id, 1))?;
                self.emit(out, "LET f = f - 1".to_string());
                self.emit(out, format!("LET M(0, f) = {}", value));
                self.emit(out, "RETURN".to_string());
                Ok(())
            }
            _ => match tree.label(first) {
                Some(Label::Assign) => self.emit_assign(tree, first, out),
                Some(Label::Call) => self.emit_call_sequence(tree, first, out),
                Some(Label::Branch) => self.emit_branch(tree, first, out),
                _ => Err(CodeGenError::MalformedTree {
                    message: "invalid COMMAND child".to_string(),
                }),
            },
        }
    }

    fn emit_assign(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        let binding = self.binding(tree, tree.child(tree.child(id, 0), 0))?;
        let dest = self.basic_var_name(binding);

        if tree.children(id).len() == 2 {
            self.emit(out, format!("INPUT {}", dest));
            return Ok(());
        }

        let term = tree.child(id, 2);
        let term_child = tree.child(term, 0);
        if tree.label(term_child) == Some(Label::Call) {
            // Run the call first; its numeric result lands in M(0, f).
            self.emit_call_sequence(tree, term_child, out)?;
        }

        let value = self.render_expr(tree, term)?;
        self.emit(out, format!("LET {} = {}", dest, value));
        Ok(())
    }

    /// The full frame dance around a GOSUB: spill the caller's parameters
    /// and locals, bump the depth counter with its overflow guard, marshal
    /// the arguments, jump, and restore.
    fn emit_call_sequence(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        let callee = self
            .binding(tree, tree.child(tree.child(id, 0), 0))?
            .clone();
        let args = [
            self.render_expr(tree, tree.child(id, 2))?,
            self.render_expr(tree, tree.child(id, 4))?,
            self.render_expr(tree, tree.child(id, 6))?,
        ];

        self.spill_frame(out);
        self.emit(out, "LET f = f + 1".to_string());
        self.emit(out, format!("IF f > {} THEN", self.max_depth));
        self.emit(out, "LET f = f - 1".to_string());
        self.emit(out, "RETURN".to_string());
        self.emit(out, "END IF".to_string());
        for (i, arg) in args.iter().enumerate() {
            self.emit(out, format!("LET M({}, f) = {}", i + 1, arg));
        }
        self.emit(out, format!("GOSUB {}", callee.unique_name));
        // A num function decrements f itself before storing its result;
        // everything else is unwound here.
        if callee.type_tag() != TypeTag::Numeric {
            self.emit(out, "LET f = f - 1".to_string());
        }
        self.restore_frame(out);
        Ok(())
    }

    fn spill_frame(&mut self, out: &mut Vec<String>) {
        let params = self.param_vars.clone();
        let locals = self.local_vars.clone();
        for (i, name) in params.iter().enumerate() {
            self.emit(out, format!("LET M({}, f) = {}", i + 1, name));
        }
        for (i, name) in locals.iter().enumerate() {
            self.emit(out, format!("LET M({}, f) = {}", i + 4, name));
        }
    }

    fn restore_frame(&mut self, out: &mut Vec<String>) {
        let params = self.param_vars.clone();
        let locals = self.local_vars.clone();
        for (i, name) in params.iter().enumerate() {
            self.emit(out, format!("LET {} = M({}, f)", name, i + 1));
        }
        for (i, name) in locals.iter().enumerate() {
            self.emit(out, format!("LET {} = M({}, f)", name, i + 4));
        }
    }

    fn emit_branch(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        let cond = self.render_expr(tree, tree.child(id, 1))?;
        self.emit(out, format!("IF {} THEN", cond));
        self.emit_algo(tree, tree.child(id, 3), out)?;
        self.emit(out, "ELSE".to_string());
        self.emit_algo(tree, tree.child(id, 5), out)?;
        self.emit(out, "END IF".to_string());
        Ok(())
    }

    fn emit_functions(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        for &child in &tree.children(id).to_vec() {
            match tree.label(child) {
                Some(Label::Decl) => self.emit_decl(tree, child, out)?,
                Some(Label::Functions) => self.emit_functions(tree, child, out)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn emit_decl(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        self.emit_header(tree, tree.child(id, 0), out)?;
        self.emit_body(tree, tree.child(id, 1), out)
    }

    fn emit_header(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        let name = self
            .binding(tree, tree.child(tree.child(id, 1), 0))?
            .unique_name
            .clone();
        self.function_lines.insert(name.clone(), self.line);
        self.emit(out, format!("REM DEF FN{}(a1, a2, a3)", name));

        self.param_vars.clear();
        for i in [3, 5, 7] {
            let param = tree.child(id, i);
            if tree.label(param) == Some(Label::VName) {
                let name = self.binding(tree, tree.child(param, 0))?.unique_name.clone();
                self.param_vars.push(name);
            }
        }

        let params = self.param_vars.clone();
        for (i, name) in params.iter().enumerate() {
            self.emit(out, format!("LET {} = M({}, f)", name, i + 1));
        }
        Ok(())
    }

    fn emit_body(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        self.emit_locvars(tree, tree.child(id, 1), out)?;
        self.emit_algo(tree, tree.child(id, 2), out)?;
        self.emit_epilog(tree, tree.child(id, 3), out)?;
        // Nested declarations follow their parent back to back.
        self.emit_functions(tree, tree.child(tree.child(id, 4), 0), out)
    }

    fn emit_locvars(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        self.local_vars.clear();
        for &child in &tree.children(id).to_vec() {
            if tree.label(child) == Some(Label::VName) {
                let name = self.binding(tree, tree.child(child, 0))?.unique_name.clone();
                self.local_vars.push(name);
            }
        }

        let locals = self.local_vars.clone();
        for name in &locals {
            self.emit(out, format!("LET {} = 0", name));
        }
        for (i, name) in locals.iter().enumerate() {
            self.emit(out, format!("LET M({}, f) = {}", i + 4, name));
        }
        Ok(())
    }

    /// A void function returns here; a num function's return command has
    /// already unwound the frame and jumped back.
    fn emit_epilog(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        out: &mut Vec<String>,
    ) -> Result<(), CodeGenError> {
        let body = tree.parent(id).ok_or_else(|| CodeGenError::MalformedTree {
            message: "EPILOG node has no parent".to_string(),
        })?;
        let decl = tree.parent(body).ok_or_else(|| CodeGenError::MalformedTree {
            message: "BODY node has no parent".to_string(),
        })?;
        let ftyp = tree.child(tree.child(decl, 0), 0);

        if tree.first_leaf_text(ftyp) != Some("num") {
            self.emit(out, "RETURN".to_string());
        }
        Ok(())
    }

    /// Renders an expression inline, with no line number of its own.
    fn render_expr(&self, tree: &SyntaxTree, id: NodeId) -> Result<String, CodeGenError> {
        match tree.label(id) {
            Some(Label::Atomic) | Some(Label::Term) | Some(Label::Arg) | Some(Label::Cond) => {
                self.render_expr(tree, tree.child(id, 0))
            }
            Some(Label::VName) => {
                let binding = self.binding(tree, tree.child(id, 0))?;
                Ok(self.basic_var_name(binding))
            }
            Some(Label::Const) => tree
                .first_leaf_text(id)
                .map(str::to_string)
                .ok_or_else(|| CodeGenError::MalformedTree {
                    message: "CONST node has no leaf".to_string(),
                }),
            Some(Label::Call) => {
                let callee = self.binding(tree, tree.child(tree.child(id, 0), 0))?;
                if callee.type_tag() == TypeTag::Numeric {
                    Ok(" M(0,f)".to_string())
                } else {
                    Err(CodeGenError::MalformedTree {
                        message: "void call used as an expression".to_string(),
                    })
                }
            }
            Some(Label::Op) => {
                let first = tree.child(id, 0);
                match tree.label(first) {
                    Some(Label::UnOp) => {
                        let name = basic_unop_name(tree, first)?;
                        let arg = self.render_expr(tree, tree.child(id, 2))?;
                        Ok(format!("{}({})", name, arg))
                    }
                    Some(Label::BinOp) => {
                        let left = self.render_expr(tree, tree.child(id, 2))?;
                        let right = self.render_expr(tree, tree.child(id, 4))?;
                        let symbol = basic_binop_symbol(tree, first)?;
                        Ok(format!("{} {} {}", left, symbol, right))
                    }
                    _ => Err(CodeGenError::MalformedTree {
                        message: "invalid OP child".to_string(),
                    }),
                }
            }
            Some(Label::Simple) => {
                let left = self.render_expr(tree, tree.child(id, 2))?;
                let right = self.render_expr(tree, tree.child(id, 4))?;
                let relop = basic_binop_symbol(tree, tree.child(id, 0))?;
                Ok(format!("{} {} {}", left, relop, right))
            }
            Some(Label::Composit) => {
                let first = tree.child(id, 0);
                match tree.label(first) {
                    Some(Label::UnOp) => {
                        let name = basic_unop_name(tree, first)?;
                        let inner = self.render_expr(tree, tree.child(id, 2))?;
                        Ok(format!("{}({})", name, inner))
                    }
                    Some(Label::BinOp) => {
                        let left = self.render_expr(tree, tree.child(id, 2))?;
                        let right = self.render_expr(tree, tree.child(id, 4))?;
                        let symbol = basic_binop_symbol(tree, first)?;
                        Ok(format!("{} {} {}", left, symbol, right))
                    }
                    _ => Err(CodeGenError::MalformedTree {
                        message: "invalid COMPOSIT child".to_string(),
                    }),
                }
            }
            _ => Err(CodeGenError::MalformedTree {
                message: "invalid expression node".to_string(),
            }),
        }
    }

    /// Replaces every `GOSUB functionNameN` with the function's first line.
    fn patch_gosubs(&self, mut code: String) -> Result<String, CodeGenError> {
        for (name, line) in &self.function_lines {
            let pattern = format!("GOSUB {}\\b", regex::escape(name));
            let re = Regex::new(&pattern).map_err(|e| CodeGenError::MalformedTree {
                message: format!("bad GOSUB pattern: {}", e),
            })?;
            code = re
                .replace_all(&code, format!("GOSUB {}", line))
                .into_owned();
        }
        Ok(code)
    }
}

fn basic_unop_name(tree: &SyntaxTree, id: NodeId) -> Result<&'static str, CodeGenError> {
    match tree.first_leaf_text(id) {
        Some("sqrt") => Ok("SQR"),
        Some("not") => Ok("NOT"),
        other => Err(CodeGenError::UnsupportedOperator {
            op: other.unwrap_or_default().to_string(),
        }),
    }
}

fn basic_binop_symbol(tree: &SyntaxTree, id: NodeId) -> Result<&'static str, CodeGenError> {
    match tree.first_leaf_text(id) {
        Some("eq") => Ok("="),
        Some("grt") => Ok(">"),
        Some("add") => Ok("+"),
        Some("sub") => Ok("-"),
        Some("mul") => Ok("*"),
        Some("div") => Ok("/"),
        Some("and") => Ok("AND"),
        Some("or") => Ok("OR"),
        other => Err(CodeGenError::UnsupportedOperator {
            op: other.unwrap_or_default().to_string(),
        }),
    }
}
