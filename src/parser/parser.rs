use crate::{
    ast::tree::{Label, NodeId, SyntaxTree},
    errors::errors::ParseError,
    lexer::tokens::{Token, TokenKind},
};

/// The recursive-descent parser. Holds the token stream, the tree being
/// built, and the unique-id counter.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    tree: SyntaxTree,
    next_unid: u32,
}

const BINOP_WORDS: [&str; 8] = ["or", "and", "eq", "grt", "add", "sub", "mul", "div"];
const UNOP_WORDS: [&str; 2] = ["not", "sqrt"];

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            tree: SyntaxTree::new(),
            next_unid: 1,
        }
    }

    fn fresh_unid(&mut self) -> u32 {
        let unid = self.next_unid;
        self.next_unid += 1;
        unid
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead)
    }

    fn at_word(&self, word: &str) -> bool {
        self.current().map(|t| t.word == word).unwrap_or(false)
    }

    fn at_kind(&self, kind: TokenKind) -> bool {
        self.current().map(|t| t.kind == kind).unwrap_or(false)
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(ParseError::UnexpectedEof {
                expected: "more input".to_string(),
            })?;
        self.pos += 1;
        Ok(token)
    }

    fn expect_word(&mut self, word: &str) -> Result<Token, ParseError> {
        match self.current() {
            Some(token) if token.word == word => self.advance(),
            Some(token) => Err(ParseError::UnexpectedToken {
                expected: format!("{:?}", word),
                found: token.word.clone(),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: format!("{:?}", word),
            }),
        }
    }

    fn expect_kind(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        match self.current() {
            Some(token) if token.kind == kind => self.advance(),
            Some(token) => Err(ParseError::UnexpectedToken {
                expected: what.to_string(),
                found: token.word.clone(),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: what.to_string(),
            }),
        }
    }

    /// The error for a token that fits no alternative of the current
    /// production: `UnexpectedEof` past the last token, `UnexpectedToken`
    /// otherwise.
    fn unexpected(&self, expected: &str) -> ParseError {
        match self.current() {
            Some(token) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.word.clone(),
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
        }
    }

    /// Consumes the given reserved word and attaches it as a leaf.
    fn keyword_leaf(&mut self, parent: NodeId, word: &str) -> Result<(), ParseError> {
        self.expect_word(word)?;
        let unid = self.fresh_unid();
        let leaf = self.tree.add_leaf(word, unid);
        self.tree.attach(parent, leaf);
        Ok(())
    }

    /// Attaches an `e` leaf for an empty production.
    fn empty_leaf(&mut self, parent: NodeId) {
        let unid = self.fresh_unid();
        let leaf = self.tree.add_leaf("e", unid);
        self.tree.attach(parent, leaf);
    }

    fn inner(&mut self, label: Label) -> NodeId {
        let unid = self.fresh_unid();
        self.tree.add_inner(label, unid)
    }

    // PROG ::= main GLOBVARS ALGO FUNCTIONS
    fn parse_prog(&mut self) -> Result<NodeId, ParseError> {
        let prog = self.inner(Label::Prog);
        self.keyword_leaf(prog, "main")?;
        let globvars = self.parse_globvars()?;
        self.tree.attach(prog, globvars);
        let algo = self.parse_algo()?;
        self.tree.attach(prog, algo);
        let functions = self.parse_functions()?;
        self.tree.attach(prog, functions);
        Ok(prog)
    }

    // GLOBVARS ::= e | VTYP VNAME , GLOBVARS
    fn parse_globvars(&mut self) -> Result<NodeId, ParseError> {
        let globvars = self.inner(Label::GlobVars);
        if self.at_word("num") || self.at_word("text") {
            let vtyp = self.parse_vtyp()?;
            self.tree.attach(globvars, vtyp);
            let vname = self.parse_vname()?;
            self.tree.attach(globvars, vname);
            self.keyword_leaf(globvars, ",")?;
            let rest = self.parse_globvars()?;
            self.tree.attach(globvars, rest);
        } else {
            self.empty_leaf(globvars);
        }
        Ok(globvars)
    }

    // VTYP ::= num | text
    fn parse_vtyp(&mut self) -> Result<NodeId, ParseError> {
        let vtyp = self.inner(Label::VTyp);
        if self.at_word("num") {
            self.keyword_leaf(vtyp, "num")?;
        } else {
            self.keyword_leaf(vtyp, "text")?;
        }
        Ok(vtyp)
    }

    fn parse_vname(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_kind(TokenKind::Variable, "variable name")?;
        let vname = self.inner(Label::VName);
        let unid = self.fresh_unid();
        let leaf = self.tree.add_leaf(&token.word, unid);
        self.tree.attach(vname, leaf);
        Ok(vname)
    }

    fn parse_fname(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_kind(TokenKind::Function, "function name")?;
        let fname = self.inner(Label::FName);
        let unid = self.fresh_unid();
        let leaf = self.tree.add_leaf(&token.word, unid);
        self.tree.attach(fname, leaf);
        Ok(fname)
    }

    // ALGO ::= begin INSTRUC end
    fn parse_algo(&mut self) -> Result<NodeId, ParseError> {
        let algo = self.inner(Label::Algo);
        self.keyword_leaf(algo, "begin")?;
        let instruc = self.parse_instruc()?;
        self.tree.attach(algo, instruc);
        self.keyword_leaf(algo, "end")?;
        Ok(algo)
    }

    // INSTRUC ::= e | COMMAND ; INSTRUC
    fn parse_instruc(&mut self) -> Result<NodeId, ParseError> {
        let instruc = self.inner(Label::Instruc);
        if self.at_word("end") {
            self.empty_leaf(instruc);
        } else {
            let command = self.parse_command()?;
            self.tree.attach(instruc, command);
            self.keyword_leaf(instruc, ";")?;
            let rest = self.parse_instruc()?;
            self.tree.attach(instruc, rest);
        }
        Ok(instruc)
    }

    // COMMAND ::= skip | halt | print ATOMIC | return ATOMIC | ASSIGN | CALL | BRANCH
    fn parse_command(&mut self) -> Result<NodeId, ParseError> {
        let command = self.inner(Label::Command);
        if self.at_word("skip") {
            self.keyword_leaf(command, "skip")?;
        } else if self.at_word("halt") {
            self.keyword_leaf(command, "halt")?;
        } else if self.at_word("print") {
            self.keyword_leaf(command, "print")?;
            let atomic = self.parse_atomic()?;
            self.tree.attach(command, atomic);
        } else if self.at_word("return") {
            self.keyword_leaf(command, "return")?;
            let atomic = self.parse_atomic()?;
            self.tree.attach(command, atomic);
        } else if self.at_word("if") {
            let branch = self.parse_branch()?;
            self.tree.attach(command, branch);
        } else if self.at_kind(TokenKind::Variable) {
            let assign = self.parse_assign()?;
            self.tree.attach(command, assign);
        } else if self.at_kind(TokenKind::Function) {
            let call = self.parse_call()?;
            self.tree.attach(command, call);
        } else {
            return Err(self.unexpected("a command"));
        }
        Ok(command)
    }

    // ASSIGN ::= VNAME < input | VNAME = TERM
    fn parse_assign(&mut self) -> Result<NodeId, ParseError> {
        let assign = self.inner(Label::Assign);
        let vname = self.parse_vname()?;
        self.tree.attach(assign, vname);
        if self.at_word("< input") {
            self.keyword_leaf(assign, "< input")?;
        } else {
            self.keyword_leaf(assign, "=")?;
            let term = self.parse_term()?;
            self.tree.attach(assign, term);
        }
        Ok(assign)
    }

    // TERM ::= ATOMIC | CALL | OP
    fn parse_term(&mut self) -> Result<NodeId, ParseError> {
        let term = self.inner(Label::Term);
        let child = if self.at_kind(TokenKind::Function) {
            self.parse_call()?
        } else if self.at_unop_word() || self.at_binop_word() {
            self.parse_op()?
        } else {
            self.parse_atomic()?
        };
        self.tree.attach(term, child);
        Ok(term)
    }

    // ATOMIC ::= VNAME | CONST
    fn parse_atomic(&mut self) -> Result<NodeId, ParseError> {
        let atomic = self.inner(Label::Atomic);
        if self.at_kind(TokenKind::Variable) {
            let vname = self.parse_vname()?;
            self.tree.attach(atomic, vname);
        } else if self.at_kind(TokenKind::Number) || self.at_kind(TokenKind::TextLit) {
            let token = self.advance()?;
            let constant = self.inner(Label::Const);
            let unid = self.fresh_unid();
            let leaf = self.tree.add_leaf(&token.word, unid);
            self.tree.attach(constant, leaf);
            self.tree.attach(atomic, constant);
        } else {
            return Err(self.unexpected("a variable or constant"));
        }
        Ok(atomic)
    }

    // CALL ::= FNAME ( ATOMIC , ATOMIC , ATOMIC )
    fn parse_call(&mut self) -> Result<NodeId, ParseError> {
        let call = self.inner(Label::Call);
        let fname = self.parse_fname()?;
        self.tree.attach(call, fname);
        self.keyword_leaf(call, "(")?;
        let arg1 = self.parse_atomic()?;
        self.tree.attach(call, arg1);
        self.keyword_leaf(call, ",")?;
        let arg2 = self.parse_atomic()?;
        self.tree.attach(call, arg2);
        self.keyword_leaf(call, ",")?;
        let arg3 = self.parse_atomic()?;
        self.tree.attach(call, arg3);
        self.keyword_leaf(call, ")")?;
        Ok(call)
    }

    fn at_unop_word(&self) -> bool {
        UNOP_WORDS.iter().any(|w| self.at_word(w))
    }

    fn at_binop_word(&self) -> bool {
        BINOP_WORDS.iter().any(|w| self.at_word(w))
    }

    fn parse_unop(&mut self) -> Result<NodeId, ParseError> {
        let unop = self.inner(Label::UnOp);
        if self.at_word("not") {
            self.keyword_leaf(unop, "not")?;
        } else {
            self.keyword_leaf(unop, "sqrt")?;
        }
        Ok(unop)
    }

    fn parse_binop(&mut self) -> Result<NodeId, ParseError> {
        for word in BINOP_WORDS {
            if self.at_word(word) {
                let binop = self.inner(Label::BinOp);
                self.keyword_leaf(binop, word)?;
                return Ok(binop);
            }
        }
        Err(self.unexpected("a binary operator"))
    }

    // OP ::= UNOP ( ARG ) | BINOP ( ARG , ARG )
    fn parse_op(&mut self) -> Result<NodeId, ParseError> {
        let op = self.inner(Label::Op);
        if self.at_unop_word() {
            let unop = self.parse_unop()?;
            self.tree.attach(op, unop);
            self.keyword_leaf(op, "(")?;
            let arg = self.parse_arg()?;
            self.tree.attach(op, arg);
            self.keyword_leaf(op, ")")?;
        } else {
            let binop = self.parse_binop()?;
            self.tree.attach(op, binop);
            self.keyword_leaf(op, "(")?;
            let arg1 = self.parse_arg()?;
            self.tree.attach(op, arg1);
            self.keyword_leaf(op, ",")?;
            let arg2 = self.parse_arg()?;
            self.tree.attach(op, arg2);
            self.keyword_leaf(op, ")")?;
        }
        Ok(op)
    }

    // ARG ::= ATOMIC | OP
    fn parse_arg(&mut self) -> Result<NodeId, ParseError> {
        let arg = self.inner(Label::Arg);
        let child = if self.at_unop_word() || self.at_binop_word() {
            self.parse_op()?
        } else {
            self.parse_atomic()?
        };
        self.tree.attach(arg, child);
        Ok(arg)
    }

    // COND ::= SIMPLE | COMPOSIT
    //
    // Both start with an operator word; the token two ahead (just inside the
    // opening parenthesis) decides which: another operator word means the
    // operands are SIMPLEs, so the whole condition is a COMPOSIT.
    fn parse_cond(&mut self) -> Result<NodeId, ParseError> {
        let cond = self.inner(Label::Cond);
        let child = if self.at_unop_word() {
            self.parse_composit()?
        } else {
            let inside = self.peek(2).map(|t| t.word.clone()).unwrap_or_default();
            if BINOP_WORDS.contains(&inside.as_str()) {
                self.parse_composit()?
            } else {
                self.parse_simple()?
            }
        };
        self.tree.attach(cond, child);
        Ok(cond)
    }

    // SIMPLE ::= BINOP ( ATOMIC , ATOMIC )
    fn parse_simple(&mut self) -> Result<NodeId, ParseError> {
        let simple = self.inner(Label::Simple);
        let binop = self.parse_binop()?;
        self.tree.attach(simple, binop);
        self.keyword_leaf(simple, "(")?;
        let left = self.parse_atomic()?;
        self.tree.attach(simple, left);
        self.keyword_leaf(simple, ",")?;
        let right = self.parse_atomic()?;
        self.tree.attach(simple, right);
        self.keyword_leaf(simple, ")")?;
        Ok(simple)
    }

    // COMPOSIT ::= BINOP ( SIMPLE , SIMPLE ) | UNOP ( SIMPLE )
    fn parse_composit(&mut self) -> Result<NodeId, ParseError> {
        let composit = self.inner(Label::Composit);
        if self.at_unop_word() {
            let unop = self.parse_unop()?;
            self.tree.attach(composit, unop);
            self.keyword_leaf(composit, "(")?;
            let simple = self.parse_simple()?;
            self.tree.attach(composit, simple);
            self.keyword_leaf(composit, ")")?;
        } else {
            let binop = self.parse_binop()?;
            self.tree.attach(composit, binop);
            self.keyword_leaf(composit, "(")?;
            let left = self.parse_simple()?;
            self.tree.attach(composit, left);
            self.keyword_leaf(composit, ",")?;
            let right = self.parse_simple()?;
            self.tree.attach(composit, right);
            self.keyword_leaf(composit, ")")?;
        }
        Ok(composit)
    }

    // BRANCH ::= if COND then ALGO else ALGO
    fn parse_branch(&mut self) -> Result<NodeId, ParseError> {
        let branch = self.inner(Label::Branch);
        self.keyword_leaf(branch, "if")?;
        let cond = self.parse_cond()?;
        self.tree.attach(branch, cond);
        self.keyword_leaf(branch, "then")?;
        let then_algo = self.parse_algo()?;
        self.tree.attach(branch, then_algo);
        self.keyword_leaf(branch, "else")?;
        let else_algo = self.parse_algo()?;
        self.tree.attach(branch, else_algo);
        Ok(branch)
    }

    // FUNCTIONS ::= e | DECL FUNCTIONS
    fn parse_functions(&mut self) -> Result<NodeId, ParseError> {
        let functions = self.inner(Label::Functions);
        if self.at_word("num") || self.at_word("void") {
            let decl = self.parse_decl()?;
            self.tree.attach(functions, decl);
            let rest = self.parse_functions()?;
            self.tree.attach(functions, rest);
        } else {
            self.empty_leaf(functions);
        }
        Ok(functions)
    }

    // DECL ::= HEADER BODY
    fn parse_decl(&mut self) -> Result<NodeId, ParseError> {
        let decl = self.inner(Label::Decl);
        let header = self.parse_header()?;
        self.tree.attach(decl, header);
        let body = self.parse_body()?;
        self.tree.attach(decl, body);
        Ok(decl)
    }

    // HEADER ::= FTYP FNAME ( VNAME , VNAME , VNAME )
    fn parse_header(&mut self) -> Result<NodeId, ParseError> {
        let header = self.inner(Label::Header);
        let ftyp = self.parse_ftyp()?;
        self.tree.attach(header, ftyp);
        let fname = self.parse_fname()?;
        self.tree.attach(header, fname);
        self.keyword_leaf(header, "(")?;
        let p1 = self.parse_vname()?;
        self.tree.attach(header, p1);
        self.keyword_leaf(header, ",")?;
        let p2 = self.parse_vname()?;
        self.tree.attach(header, p2);
        self.keyword_leaf(header, ",")?;
        let p3 = self.parse_vname()?;
        self.tree.attach(header, p3);
        self.keyword_leaf(header, ")")?;
        Ok(header)
    }

    // FTYP ::= num | void
    fn parse_ftyp(&mut self) -> Result<NodeId, ParseError> {
        let ftyp = self.inner(Label::FTyp);
        if self.at_word("num") {
            self.keyword_leaf(ftyp, "num")?;
        } else {
            self.keyword_leaf(ftyp, "void")?;
        }
        Ok(ftyp)
    }

    // BODY ::= PROLOG LOCVARS ALGO EPILOG SUBFUNCS end
    fn parse_body(&mut self) -> Result<NodeId, ParseError> {
        let body = self.inner(Label::Body);
        let prolog = self.inner(Label::Prolog);
        self.keyword_leaf(prolog, "{")?;
        self.tree.attach(body, prolog);
        let locvars = self.parse_locvars()?;
        self.tree.attach(body, locvars);
        let algo = self.parse_algo()?;
        self.tree.attach(body, algo);
        let epilog = self.inner(Label::Epilog);
        self.keyword_leaf(epilog, "}")?;
        self.tree.attach(body, epilog);
        let subfuncs = self.inner(Label::SubFuncs);
        let functions = self.parse_functions()?;
        self.tree.attach(subfuncs, functions);
        self.tree.attach(body, subfuncs);
        self.keyword_leaf(body, "end")?;
        Ok(body)
    }

    // LOCVARS ::= VTYP VNAME , VTYP VNAME , VTYP VNAME ,
    fn parse_locvars(&mut self) -> Result<NodeId, ParseError> {
        let locvars = self.inner(Label::LocVars);
        for _ in 0..3 {
            let vtyp = self.parse_vtyp()?;
            self.tree.attach(locvars, vtyp);
            let vname = self.parse_vname()?;
            self.tree.attach(locvars, vname);
            self.keyword_leaf(locvars, ",")?;
        }
        Ok(locvars)
    }
}

/// Parses a token stream into the concrete syntax tree.
pub fn parse(tokens: Vec<Token>) -> Result<SyntaxTree, ParseError> {
    let mut parser = Parser::new(tokens);
    let root = parser.parse_prog()?;

    if let Some(token) = parser.current() {
        return Err(ParseError::UnexpectedToken {
            expected: "end of input".to_string(),
            found: token.word.clone(),
        });
    }

    parser.tree.set_root(root);
    Ok(parser.tree)
}
