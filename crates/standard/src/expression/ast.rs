//! Abstract syntax tree for the standard expression language.

/// One step of a dot-path (`user.address.city`, `items.0`).
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// The top-level expression that can be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A literal value: `'text'`, `42`, `3.5`, `true`, `false`, `null`.
    Literal(serde_json::Value),
    /// `${path}` — navigation rooted at the context/local variables.
    Variable(Vec<PathSegment>),
    /// `*{path}` — navigation rooted at the selection target (falling back
    /// to the variables when no target is selected).
    Selection(Vec<PathSegment>),
    /// `#{key}` — an externalized message lookup.
    Message(String),
    UnaryOp {
        op: UnaryOperator,
        expr: Box<Expression>,
    },
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Logical
    Or,
    And,
    // Equality
    Equals,
    NotEquals,
    // Relational
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    // Concatenation / addition
    Plus,
}

/// One `name=expr` pair of an assignation sequence
/// (`x=${a},y='literal'`), as used by `wf:with` and `wf:attr`.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignation {
    pub name: String,
    pub expression: Expression,
}

/// A parsed `wf:each` expression: `item : ${collection}`.
#[derive(Debug, Clone, PartialEq)]
pub struct EachExpression {
    pub iteration_variable: String,
    pub iterated: Expression,
}
