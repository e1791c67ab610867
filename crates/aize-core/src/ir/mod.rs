//! The intermediate representation: one arena per node kind, indexed by a
//! `Copy` id newtype, plus the [`extensions`] side-table registry that
//! passes attach their derived data to.
//!
//! Nodes never reference each other by pointer or by identity; every edge in
//! the tree is an id into the owning arena. This makes the whole IR a plain
//! value (`Clone` if every field type is `Clone`), with no interior
//! mutability and no possibility of reference cycles.

pub mod extensions;

use crate::source::{Position, SourceId};
pub use extensions::ExtensionRegistry;
use std::collections::HashSet;

macro_rules! node_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub fn as_u32(self) -> u32 {
                self.0
            }
        }
    };
}

node_id!(IrSourceId);
node_id!(ImportId);
node_id!(FuncId);
node_id!(AggFuncId);
node_id!(StructId);
node_id!(UnionId);
node_id!(ParamId);
node_id!(FuncAttrId);
node_id!(AggFieldId);
node_id!(VariantId);
node_id!(StmtId);
node_id!(ExprId);
node_id!(TypeExprId);
node_id!(NamespaceExprId);

/// A top-level declaration inside a source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopLevelId {
    Import(ImportId),
    Function(FuncId),
    Struct(StructId),
    Union(UnionId),
}

/// Where an import's path anchors: the standard library, the current
/// project, or a path relative to the importing file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportAnchor {
    Std,
    Project,
    Local,
}

#[derive(Clone, Debug)]
pub struct ImportPath {
    pub anchor: ImportAnchor,
    pub segments: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ImportNode {
    pub path: ImportPath,
    /// Populated by lowering once the referenced source has been read and
    /// registered; `None` until then.
    pub resolved: Option<IrSourceId>,
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
pub enum ExprKind {
    Int(i64),
    GetVar {
        name: String,
    },
    SetVar {
        name: String,
        value: ExprId,
    },
    GetAttr {
        obj: ExprId,
        attr: String,
    },
    SetAttr {
        obj: ExprId,
        attr: String,
        value: ExprId,
    },
    GetStaticAttr {
        namespace: NamespaceExprId,
        attr: String,
    },
    Compare {
        op: CompareOp,
        left: ExprId,
        right: ExprId,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: ExprId,
        right: ExprId,
    },
    Negate {
        right: ExprId,
    },
    New {
        ty: TypeExprId,
        args: Vec<ExprId>,
    },
    Call {
        callee: ExprId,
        args: Vec<ExprId>,
    },
    /// Synthesized by the resolver from `Call(GetAttr(obj, name), args)`.
    MethodCall {
        obj: ExprId,
        name: String,
        args: Vec<ExprId>,
    },
    Intrinsic {
        name: String,
        args: Vec<ExprId>,
    },
    /// Synthesized by the resolver when unifying an integer expression to a
    /// wider/narrower integer type.
    CastInt {
        expr: ExprId,
        to: TypeExprId,
    },
    /// Synthesized by the resolver when unifying a union variant expression
    /// to its enclosing union type.
    CastUnion {
        expr: ExprId,
        union_ty: TypeExprId,
    },
    Lambda {
        params: Vec<ParamId>,
        body: ExprId,
    },
    Tuple {
        items: Vec<ExprId>,
    },
    /// `expr is Variant(binding)`.
    Is {
        expr: ExprId,
        variant: String,
        bind_name: String,
    },
}

#[derive(Clone, Debug)]
pub struct ExprNode {
    pub kind: ExprKind,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub enum StmtKind {
    VarDecl {
        name: String,
        ann: TypeExprId,
        value: ExprId,
    },
    Block {
        stmts: Vec<StmtId>,
    },
    If {
        cond: ExprId,
        then_do: StmtId,
        else_do: StmtId,
    },
    While {
        cond: ExprId,
        body: StmtId,
    },
    ExprStmt {
        expr: ExprId,
    },
    Return {
        expr: ExprId,
    },
}

#[derive(Clone, Debug)]
pub struct StmtNode {
    pub kind: StmtKind,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub enum TypeExprKind {
    GetType { name: String },
    FuncType { params: Vec<TypeExprId>, ret: TypeExprId },
    TupleType { items: Vec<TypeExprId> },
    NoType,
    /// Created by the resolver when it needs a type-expr node to anchor a
    /// generated cast; carries no surface syntax of its own.
    Generated,
    Malformed,
}

#[derive(Clone, Debug)]
pub struct TypeExprNode {
    pub kind: TypeExprKind,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub enum NamespaceExprKind {
    GetNamespace { name: String },
    Malformed,
}

#[derive(Clone, Debug)]
pub struct NamespaceExprNode {
    pub kind: NamespaceExprKind,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub struct ParamNode {
    pub name: String,
    pub ty: TypeExprId,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub struct FuncAttrNode {
    pub name: String,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub struct AggFieldNode {
    pub name: String,
    pub ty: TypeExprId,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub struct VariantNode {
    pub name: String,
    pub ty: TypeExprId,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub struct FunctionNode {
    /// Mutated in place by the mangling pass; every other transformation on
    /// the IR produces new nodes instead of editing existing ones.
    pub name: String,
    pub params: Vec<ParamId>,
    pub ret: TypeExprId,
    pub body: Vec<StmtId>,
    pub attrs: Vec<FuncAttrId>,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub struct AggFuncNode {
    pub name: String,
    pub params: Vec<ParamId>,
    pub ret: TypeExprId,
    pub body: Vec<StmtId>,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub struct StructNode {
    pub name: String,
    pub fields: Vec<AggFieldId>,
    pub funcs: Vec<AggFuncId>,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub struct UnionNode {
    pub name: String,
    pub variants: Vec<VariantId>,
    pub funcs: Vec<AggFuncId>,
    pub pos: Position,
}

#[derive(Clone, Debug)]
pub struct SourceNode {
    pub top_levels: Vec<TopLevelId>,
    pub display_name: String,
    pub source_id: SourceId,
}

#[derive(Clone, Debug, Default)]
pub struct Program {
    pub sources: Vec<IrSourceId>,
}

/// The full IR tree for a compilation: one arena per node kind plus the set
/// of passes that have already run and the extension side-table registry.
#[derive(Default)]
pub struct Ir {
    pub program: Program,

    sources: Vec<SourceNode>,
    imports: Vec<ImportNode>,
    functions: Vec<FunctionNode>,
    agg_funcs: Vec<AggFuncNode>,
    structs: Vec<StructNode>,
    unions: Vec<UnionNode>,
    params: Vec<ParamNode>,
    func_attrs: Vec<FuncAttrNode>,
    agg_fields: Vec<AggFieldNode>,
    variants: Vec<VariantNode>,
    stmts: Vec<StmtNode>,
    exprs: Vec<ExprNode>,
    type_exprs: Vec<TypeExprNode>,
    namespace_exprs: Vec<NamespaceExprNode>,

    pub ran_passes: HashSet<&'static str>,
    pub extensions: ExtensionRegistry,
}

macro_rules! arena_accessors {
    ($field:ident, $id:ty, $node:ty, $push:ident, $get:ident, $get_mut:ident) => {
        pub fn $push(&mut self, node: $node) -> $id {
            let id = <$id>::from_raw(self.$field.len() as u32);
            self.$field.push(node);
            id
        }

        pub fn $get(&self, id: $id) -> &$node {
            &self.$field[id.index()]
        }

        pub fn $get_mut(&mut self, id: $id) -> &mut $node {
            &mut self.$field[id.index()]
        }
    };
}

impl Ir {
    pub fn new() -> Self {
        Self::default()
    }

    arena_accessors!(
        sources,
        IrSourceId,
        SourceNode,
        push_source,
        source,
        source_mut
    );
    arena_accessors!(
        imports,
        ImportId,
        ImportNode,
        push_import,
        import,
        import_mut
    );
    arena_accessors!(
        functions,
        FuncId,
        FunctionNode,
        push_function,
        function,
        function_mut
    );
    arena_accessors!(
        agg_funcs,
        AggFuncId,
        AggFuncNode,
        push_agg_func,
        agg_func,
        agg_func_mut
    );
    arena_accessors!(structs, StructId, StructNode, push_struct, struct_, struct_mut);
    arena_accessors!(unions, UnionId, UnionNode, push_union, union_, union_mut);
    arena_accessors!(params, ParamId, ParamNode, push_param, param, param_mut);
    arena_accessors!(
        func_attrs,
        FuncAttrId,
        FuncAttrNode,
        push_func_attr,
        func_attr,
        func_attr_mut
    );
    arena_accessors!(
        agg_fields,
        AggFieldId,
        AggFieldNode,
        push_agg_field,
        agg_field,
        agg_field_mut
    );
    arena_accessors!(
        variants,
        VariantId,
        VariantNode,
        push_variant,
        variant,
        variant_mut
    );
    arena_accessors!(stmts, StmtId, StmtNode, push_stmt, stmt, stmt_mut);
    arena_accessors!(exprs, ExprId, ExprNode, push_expr, expr, expr_mut);
    arena_accessors!(
        type_exprs,
        TypeExprId,
        TypeExprNode,
        push_type_expr,
        type_expr,
        type_expr_mut
    );
    arena_accessors!(
        namespace_exprs,
        NamespaceExprId,
        NamespaceExprNode,
        push_namespace_expr,
        namespace_expr,
        namespace_expr_mut
    );
}
