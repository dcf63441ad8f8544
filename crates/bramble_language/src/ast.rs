//! Abstract Syntax Tree for Bramble stories.
//!
//! The AST is pure data produced by [`crate::translate`] and consumed by
//! the compiler. Every node carries the [`Span`] it was read from.

use std::fmt;

use crate::span::Span;

/// The root compilation unit.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Story {
    /// Story title (empty when the source has no header).
    pub title: String,
    /// Story description (empty when absent).
    pub description: String,
    /// Top-level statements in source order.
    pub statements: Vec<Statement>,
}

/// The body of a definition: either concrete or an abstract placeholder.
#[derive(Clone, Debug, PartialEq)]
pub enum DefinitionBody<T> {
    /// A real value or function body.
    Concrete(T),
    /// Reserves the name; an inheriting object must override it.
    Abstract,
}

impl<T> DefinitionBody<T> {
    /// Returns true for the abstract placeholder.
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        matches!(self, Self::Abstract)
    }
}

/// A statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    /// `let name = value;` or `let receiver.name abstract;`
    VariableDefinition {
        /// Receiver object when the target was a member access.
        receiver: Option<Expression>,
        /// Defined name.
        name: String,
        /// Initial value.
        body: DefinitionBody<Expression>,
        /// Source location.
        span: Span,
    },
    /// `fun name(params) { ... }`
    FunctionDefinition {
        /// Receiver object when the target was a member access.
        receiver: Option<Expression>,
        /// Defined name.
        name: String,
        /// Whether the definition replaces an inherited one.
        is_override: bool,
        /// Parameter names.
        params: Vec<String>,
        /// Function body.
        body: DefinitionBody<Vec<Statement>>,
        /// Source location.
        span: Span,
    },
    /// `object name : parent { ... }`
    ObjectDefinition {
        /// Object name.
        name: String,
        /// Parent object name.
        parent: String,
        /// Object body, run by the object's initializer.
        body: Vec<Statement>,
        /// Source location.
        span: Span,
    },
    /// `lhs = rhs;`
    Assignment {
        /// Assignment target.
        lhs: LExpression,
        /// Assigned value.
        rhs: Expression,
        /// Source location.
        span: Span,
    },
    /// `on event { ... }`
    OnHandler {
        /// Event expression, usually a verb object.
        event: Expression,
        /// Handler body.
        body: Vec<Statement>,
        /// Source location.
        span: Span,
    },
    /// `if condition { ... } else { ... }`
    If {
        /// Branch condition.
        condition: Expression,
        /// Statements run when the condition is truthy.
        then_case: Vec<Statement>,
        /// Statements run otherwise (empty when there is no `else`).
        else_case: Vec<Statement>,
        /// Source location.
        span: Span,
    },
    /// An expression evaluated for its effects.
    Expression(Expression),
}

impl Statement {
    /// Returns the source span of this statement.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::VariableDefinition { span, .. }
            | Self::FunctionDefinition { span, .. }
            | Self::ObjectDefinition { span, .. }
            | Self::Assignment { span, .. }
            | Self::OnHandler { span, .. }
            | Self::If { span, .. } => *span,
            Self::Expression(expr) => expr.span(),
        }
    }

    /// Returns true for definitions moved to the front of their block.
    ///
    /// Receiver definitions store onto an existing object and stay in
    /// source order.
    #[must_use]
    pub const fn is_hoisted(&self) -> bool {
        matches!(
            self,
            Self::FunctionDefinition { receiver: None, .. } | Self::ObjectDefinition { .. }
        )
    }
}

/// An expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    /// A name reference.
    Variable(String, Span),
    /// String literal.
    String(String, Span),
    /// Number literal.
    Number(f64, Span),
    /// `true` or `false`.
    Bool(bool, Span),
    /// `[a, b, c]`
    Array(Vec<Expression>, Span),
    /// `receiver.member`
    MemberAccess {
        /// The object read from.
        receiver: Box<Expression>,
        /// Member name.
        member: String,
        /// Source location.
        span: Span,
    },
    /// `receiver[index]`
    ArrayAccess {
        /// The array read from.
        receiver: Box<Expression>,
        /// Element index.
        index: Box<Expression>,
        /// Source location.
        span: Span,
    },
    /// `callee(args)`
    Call {
        /// The called expression.
        callee: Box<Expression>,
        /// Arguments in order.
        args: Vec<Expression>,
        /// Source location.
        span: Span,
    },
}

impl Expression {
    /// Returns the source span of this expression.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Variable(_, s)
            | Self::String(_, s)
            | Self::Number(_, s)
            | Self::Bool(_, s)
            | Self::Array(_, s)
            | Self::MemberAccess { span: s, .. }
            | Self::ArrayAccess { span: s, .. }
            | Self::Call { span: s, .. } => *s,
        }
    }

    /// Creates a variable reference with no source location.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable(name.into(), Span::synthetic())
    }

    /// Creates a member access with no source location.
    #[must_use]
    pub fn member(receiver: Expression, member: impl Into<String>) -> Self {
        Self::MemberAccess {
            receiver: Box::new(receiver),
            member: member.into(),
            span: Span::synthetic(),
        }
    }

    /// Creates a call with no source location.
    #[must_use]
    pub fn call(callee: Expression, args: Vec<Expression>) -> Self {
        Self::Call {
            callee: Box::new(callee),
            args,
            span: Span::synthetic(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(name, _) => write!(f, "{name}"),
            Self::String(s, _) => write!(f, "{s:?}"),
            Self::Number(n, _) => write!(f, "{n}"),
            Self::Bool(b, _) => write!(f, "{b}"),
            Self::Array(elements, _) => {
                write!(f, "[")?;
                write_list(f, elements)?;
                write!(f, "]")
            }
            Self::MemberAccess {
                receiver, member, ..
            } => write!(f, "{receiver}.{member}"),
            Self::ArrayAccess {
                receiver, index, ..
            } => write!(f, "{receiver}[{index}]"),
            Self::Call { callee, args, .. } => {
                write!(f, "{callee}(")?;
                write_list(f, args)?;
                write!(f, ")")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// An assignable expression.
///
/// Receivers of member and array targets are themselves assignable, so an
/// array element update can be written back through the whole path.
#[derive(Clone, Debug, PartialEq)]
pub enum LExpression {
    /// A name.
    Variable(String, Span),
    /// `receiver.member`
    Member {
        /// The object written to.
        receiver: Box<LExpression>,
        /// Member name.
        member: String,
        /// Source location.
        span: Span,
    },
    /// `receiver[index]`
    Index {
        /// The array written to.
        receiver: Box<LExpression>,
        /// Element index.
        index: Box<Expression>,
        /// Source location.
        span: Span,
    },
}

impl LExpression {
    /// Returns the source span of this target.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Variable(_, s) | Self::Member { span: s, .. } | Self::Index { span: s, .. } => {
                *s
            }
        }
    }

    /// Converts the target back into the expression that reads it.
    #[must_use]
    pub fn to_expression(&self) -> Expression {
        match self {
            Self::Variable(name, span) => Expression::Variable(name.clone(), *span),
            Self::Member {
                receiver,
                member,
                span,
            } => Expression::MemberAccess {
                receiver: Box::new(receiver.to_expression()),
                member: member.clone(),
                span: *span,
            },
            Self::Index {
                receiver,
                index,
                span,
            } => Expression::ArrayAccess {
                receiver: Box::new(receiver.to_expression()),
                index: index.clone(),
                span: *span,
            },
        }
    }
}

impl fmt::Display for LExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_expression())
    }
}
