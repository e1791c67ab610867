//! The concrete passes that together turn a lowered IR into one annotated
//! with every symbol and type the program uses, in the order
//! [`crate::pass::PassScheduler`] is expected to run them:
//! [`init_symbols::InitSymbols`] → [`declare_types::DeclareTypes`] →
//! [`declare_functions::DeclareFunctions`] → [`resolve::ResolveSymbols`] →
//! [`mangle::Mangle`].

pub mod declare_functions;
pub mod declare_types;
pub mod init_symbols;
pub mod mangle;
pub mod resolve;
pub(crate) mod type_expr;
