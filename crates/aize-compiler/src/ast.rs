//! The AST this crate expects its input in.
//!
//! Producing this tree (lexing, parsing) is somebody else's job; everything
//! here is a plain, owned contract type. Type-expression and
//! namespace-expression positions are not separate grammars: a type
//! annotation or a `::`-qualified path is just an [`Expr`], and [`Lower`]
//! disambiguates by shape exactly the way the surface grammar's own few
//! overloaded productions do (a bare name doubles as either a variable
//! reference or a type reference depending on where it sits).

use aize_core::source::{Position, SourceId, SourceKey};

#[derive(Clone, Debug)]
pub struct Program {
    pub sources: Vec<Source>,
}

#[derive(Clone, Debug)]
pub struct Source {
    pub key: SourceKey,
    pub display_name: String,
    pub top_levels: Vec<TopLevel>,
    /// Already registered in the [`aize_core::source::SourceRegistry`] this
    /// tree's positions point into; lowering just carries it onto the IR
    /// node.
    pub source_id: SourceId,
}

#[derive(Clone, Debug)]
pub enum TopLevel {
    Import(Import),
    Function(Function),
    Struct(Struct),
    Union(Union),
}

#[derive(Clone, Debug)]
pub struct Import {
    /// The literal anchor prefix token (`"std"`, `"project"`, `"local"`), if
    /// the surface syntax had one at all. Validating and defaulting this is
    /// [`crate::import`]'s job, not the parser's.
    pub anchor_text: Option<String>,
    pub segments: Vec<String>,
    /// Filled in by [`crate::import::trace_imports`] once this import has
    /// been resolved to a concrete source.
    pub resolved_key: Option<SourceKey>,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub ty: Expr,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: Option<Expr>,
    pub body: Vec<Stmt>,
    pub attrs: Vec<FuncAttr>,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub struct FuncAttr {
    pub name: String,
    pub pos: Position,
}

/// A method inside a struct or union body. Distinct from [`Function`]
/// because it implicitly binds a `self` parameter of the enclosing
/// aggregate's own type.
#[derive(Clone, Debug)]
pub struct AggFunc {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: Option<Expr>,
    pub body: Vec<Stmt>,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub struct AggField {
    pub name: String,
    pub ty: Expr,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub struct Struct {
    pub name: String,
    pub fields: Vec<AggField>,
    pub funcs: Vec<AggFunc>,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub struct Variant {
    pub name: String,
    pub ty: Expr,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub struct Union {
    pub name: String,
    pub variants: Vec<Variant>,
    pub funcs: Vec<AggFunc>,
    pub pos: Position,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Clone, Debug)]
pub enum Expr {
    Int(i64, Position),
    /// A bare name. Depending on position this lowers to a value reference,
    /// a type reference, or a namespace reference; the AST does not
    /// disambiguate that itself.
    Name(String, Position),
    SetVar {
        name: String,
        value: Box<Expr>,
        pos: Position,
    },
    GetAttr {
        obj: Box<Expr>,
        attr: String,
        pos: Position,
    },
    SetAttr {
        obj: Box<Expr>,
        attr: String,
        value: Box<Expr>,
        pos: Position,
    },
    /// `namespace::attr`, e.g. `std::io::read`.
    GetStaticAttr {
        namespace: Box<Expr>,
        attr: String,
        pos: Position,
    },
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
        pos: Position,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Expr>,
        right: Box<Expr>,
        pos: Position,
    },
    Negate {
        right: Box<Expr>,
        pos: Position,
    },
    New {
        ty: Box<Expr>,
        args: Vec<Expr>,
        pos: Position,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        pos: Position,
    },
    Intrinsic {
        name: String,
        args: Vec<Expr>,
        pos: Position,
    },
    /// `fn(params) -> body`. Also used, unevaluated, as a function-type
    /// annotation: `fn(int32) -> bool` in type position has no body.
    Lambda {
        params: Vec<Param>,
        body: Option<Box<Expr>>,
        ret: Option<Box<Expr>>,
        pos: Position,
    },
    Tuple {
        items: Vec<Expr>,
        pos: Position,
    },
    Is {
        expr: Box<Expr>,
        variant: String,
        bind_name: String,
        pos: Position,
    },
    /// The absence of a type annotation, written explicitly so every
    /// annotation site has a concrete AST node to lower.
    NoType(Position),
}

impl Expr {
    pub fn pos(&self) -> Position {
        match self {
            Expr::Int(_, p)
            | Expr::Name(_, p)
            | Expr::SetVar { pos: p, .. }
            | Expr::GetAttr { pos: p, .. }
            | Expr::SetAttr { pos: p, .. }
            | Expr::GetStaticAttr { pos: p, .. }
            | Expr::Compare { pos: p, .. }
            | Expr::Arithmetic { pos: p, .. }
            | Expr::Negate { pos: p, .. }
            | Expr::New { pos: p, .. }
            | Expr::Call { pos: p, .. }
            | Expr::Intrinsic { pos: p, .. }
            | Expr::Lambda { pos: p, .. }
            | Expr::Tuple { pos: p, .. }
            | Expr::Is { pos: p, .. }
            | Expr::NoType(p) => p.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Stmt {
    VarDecl {
        name: String,
        ann: Option<Expr>,
        value: Expr,
        pos: Position,
    },
    Block {
        stmts: Vec<Stmt>,
        pos: Position,
    },
    If {
        cond: Expr,
        then_do: Box<Stmt>,
        /// `None` for an `if` with no `else`; lowered as an empty block, so
        /// an absent `else` is never itself terminal.
        else_do: Option<Box<Stmt>>,
        pos: Position,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
        pos: Position,
    },
    ExprStmt {
        expr: Expr,
        pos: Position,
    },
    Return {
        expr: Expr,
        pos: Position,
    },
}

impl Stmt {
    pub fn pos(&self) -> Position {
        match self {
            Stmt::VarDecl { pos, .. }
            | Stmt::Block { pos, .. }
            | Stmt::If { pos, .. }
            | Stmt::While { pos, .. }
            | Stmt::ExprStmt { pos, .. }
            | Stmt::Return { pos, .. } => pos.clone(),
        }
    }
}
