//! Parse tree to AST translation.
//!
//! Walks a [`ParseNode`] tree and produces the typed [`Story`]. Shape
//! checks the grammar cannot express live here: assignment targets must be
//! assignable, and definition targets must be a bare name or a member
//! access.

use bramble_foundation::{Error, ErrorKind, Result};

use crate::ast::{DefinitionBody, Expression, LExpression, Statement, Story};
use crate::parse_tree::{Field, ParseNode, Rule};

/// Translates a `Story` parse node.
///
/// # Errors
/// Returns `MalformedParseTree`, `NotAnLValue`, or `InvalidDefinitionTarget`.
pub fn translate_story(node: &ParseNode) -> Result<Story> {
    node.expect_rule(Rule::Story)?;
    let title = optional_text(node, Field::Title)?;
    let description = optional_text(node, Field::Description)?;
    let statements = translate_statements(node.children(Field::Statement))?;
    Ok(Story {
        title,
        description,
        statements,
    })
}

fn optional_text(node: &ParseNode, field: Field) -> Result<String> {
    node.child(field)
        .map_or(Ok(String::new()), |child| child.expect_text().map(str::to_string))
}

/// Translates a sequence of statement nodes, dropping empty statements.
fn translate_statements<'a>(
    nodes: impl Iterator<Item = &'a ParseNode>,
) -> Result<Vec<Statement>> {
    let mut statements = Vec::new();
    for node in nodes {
        if let Some(statement) = translate_statement(node)? {
            statements.push(statement);
        }
    }
    Ok(statements)
}

fn translate_block(node: &ParseNode) -> Result<Vec<Statement>> {
    node.expect_rule(Rule::Block)?;
    translate_statements(node.children(Field::Statement))
}

/// Translates one statement node; empty statements yield `None`.
///
/// # Errors
/// Returns an error if the node or any descendant has an unexpected shape.
pub fn translate_statement(node: &ParseNode) -> Result<Option<Statement>> {
    let span = node.span;
    let statement = match node.rule {
        Rule::EmptyStatement => return Ok(None),
        Rule::VariableDefinition => {
            let (receiver, name) = definition_target(node.expect_child(Field::Target)?)?;
            let value = node.expect_child(Field::Value)?;
            let body = if value.rule == Rule::Abstract {
                DefinitionBody::Abstract
            } else {
                DefinitionBody::Concrete(translate_expression(value)?)
            };
            Statement::VariableDefinition {
                receiver,
                name,
                body,
                span,
            }
        }
        Rule::FunctionDefinition => {
            let (receiver, name) = definition_target(node.expect_child(Field::Target)?)?;
            let is_override = node
                .children(Field::Modifier)
                .any(|m| m.rule == Rule::Override);
            let params = node
                .children(Field::Parameter)
                .map(|p| p.expect_rule(Rule::Identifier)?.expect_text().map(str::to_string))
                .collect::<Result<Vec<_>>>()?;
            let body_node = node.expect_child(Field::Body)?;
            let body = if body_node.rule == Rule::Abstract {
                DefinitionBody::Abstract
            } else {
                DefinitionBody::Concrete(translate_block(body_node)?)
            };
            Statement::FunctionDefinition {
                receiver,
                name,
                is_override,
                params,
                body,
                span,
            }
        }
        Rule::ObjectDefinition => Statement::ObjectDefinition {
            name: identifier(node.expect_child(Field::Name)?)?,
            parent: identifier(node.expect_child(Field::Parent)?)?,
            body: translate_block(node.expect_child(Field::Body)?)?,
            span,
        },
        Rule::Assignment => Statement::Assignment {
            lhs: to_lvalue(translate_expression(node.expect_child(Field::Target)?)?)?,
            rhs: translate_expression(node.expect_child(Field::Value)?)?,
            span,
        },
        Rule::OnHandler => Statement::OnHandler {
            event: translate_expression(node.expect_child(Field::Event)?)?,
            body: translate_block(node.expect_child(Field::Body)?)?,
            span,
        },
        Rule::IfStatement => {
            let condition = translate_expression(node.expect_child(Field::Condition)?)?;
            let then_case = translate_block(node.expect_child(Field::Then)?)?;
            let else_case = match node.child(Field::Else) {
                None => Vec::new(),
                Some(branch) if branch.rule == Rule::IfStatement => {
                    translate_statement(branch)?.into_iter().collect()
                }
                Some(branch) => translate_block(branch)?,
            };
            Statement::If {
                condition,
                then_case,
                else_case,
                span,
            }
        }
        Rule::ExpressionStatement => {
            Statement::Expression(translate_expression(node.expect_child(Field::Value)?)?)
        }
        other => {
            return Err(node.malformed(format!("unexpected {other} node in statement position")));
        }
    };
    Ok(Some(statement))
}

/// Translates an expression node.
///
/// # Errors
/// Returns `MalformedParseTree` for nodes of a non-expression rule.
pub fn translate_expression(node: &ParseNode) -> Result<Expression> {
    let span = node.span;
    Ok(match node.rule {
        Rule::Identifier => Expression::Variable(node.expect_text()?.to_string(), span),
        Rule::StringLiteral => Expression::String(node.expect_text()?.to_string(), span),
        Rule::NumberLiteral => {
            let text = node.expect_text()?;
            let n = text
                .parse::<f64>()
                .map_err(|_| node.malformed(format!("invalid number literal: {text}")))?;
            Expression::Number(n, span)
        }
        Rule::BooleanLiteral => match node.expect_text()? {
            "true" => Expression::Bool(true, span),
            "false" => Expression::Bool(false, span),
            other => return Err(node.malformed(format!("invalid boolean literal: {other}"))),
        },
        Rule::ArrayLiteral => Expression::Array(
            node.children(Field::Element)
                .map(translate_expression)
                .collect::<Result<_>>()?,
            span,
        ),
        Rule::MemberAccess => Expression::MemberAccess {
            receiver: Box::new(translate_expression(node.expect_child(Field::Receiver)?)?),
            member: identifier(node.expect_child(Field::Member)?)?,
            span,
        },
        Rule::ArrayAccess => Expression::ArrayAccess {
            receiver: Box::new(translate_expression(node.expect_child(Field::Receiver)?)?),
            index: Box::new(translate_expression(node.expect_child(Field::Index)?)?),
            span,
        },
        Rule::FunctionCall => Expression::Call {
            callee: Box::new(translate_expression(node.expect_child(Field::Callee)?)?),
            args: node
                .children(Field::Argument)
                .map(translate_expression)
                .collect::<Result<_>>()?,
            span,
        },
        Rule::Parenthesized => translate_expression(node.expect_child(Field::Inner)?)?,
        other => {
            return Err(node.malformed(format!("unexpected {other} node in expression position")));
        }
    })
}

fn identifier(node: &ParseNode) -> Result<String> {
    Ok(node.expect_rule(Rule::Identifier)?.expect_text()?.to_string())
}

/// Converts an expression into an assignment target.
///
/// # Errors
/// Returns `NotAnLValue` when the expression, or the receiver of a member or
/// array access, is not assignable.
pub fn to_lvalue(expr: Expression) -> Result<LExpression> {
    let span = expr.span();
    match expr {
        Expression::Variable(name, span) => Ok(LExpression::Variable(name, span)),
        Expression::MemberAccess {
            receiver,
            member,
            span,
        } => Ok(LExpression::Member {
            receiver: Box::new(to_lvalue(*receiver)?),
            member,
            span,
        }),
        Expression::ArrayAccess {
            receiver,
            index,
            span,
        } => Ok(LExpression::Index {
            receiver: Box::new(to_lvalue(*receiver)?),
            index,
            span,
        }),
        other => Err(positioned(
            Error::new(ErrorKind::NotAnLValue(other.to_string())),
            span,
        )),
    }
}

/// Splits a definition target into an optional receiver and a name.
///
/// # Errors
/// Returns `InvalidDefinitionTarget` unless the target is a bare name or a
/// member access.
pub fn definition_target(node: &ParseNode) -> Result<(Option<Expression>, String)> {
    match translate_expression(node)? {
        Expression::Variable(name, _) => Ok((None, name)),
        Expression::MemberAccess {
            receiver, member, ..
        } => Ok((Some(*receiver), member)),
        other => Err(positioned(
            Error::new(ErrorKind::InvalidDefinitionTarget(other.to_string())),
            node.span,
        )),
    }
}

fn positioned(err: Error, span: crate::span::Span) -> Error {
    if span.is_located() {
        err.at(span.line, span.column)
    } else {
        err
    }
}
