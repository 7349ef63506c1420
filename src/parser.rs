use crate::expr::{Constant, Expr, Func, Var};
use meval::shunting_yard::to_rpn;
use meval::tokenizer::{tokenize, Operation, Token};
use nalgebra::Vector2;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParserError {
    #[error("Ошибка парсинга выражения: {0}")]
    ParseError(String),
    #[error("Неизвестный символ: {0}")]
    UnknownSymbol(String),
    #[error("Выражение содержит недопустимую операцию: {0}")]
    InvalidExpression(String),
    #[error("Ошибка вычисления: {0}")]
    EvalError(String),
}

#[derive(Clone, Debug)]
pub struct ParsedFunction {
    source: String,
    expr: Expr,
    dx: Expr,
    dy: Expr,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointEvaluation {
    pub point: Vector2<f64>,
    pub value: f64,
    pub gradient: Vector2<f64>,
}

impl ParsedFunction {
    pub fn new(expr_str: &str) -> Result<Self, ParserError> {
        let expr = parse_expression(expr_str)?;
        let dx = expr.diff(Var::X);
        let dy = expr.diff(Var::Y);
        Ok(ParsedFunction {
            source: expr_str.to_string(),
            expr,
            dx,
            dy,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn partial(&self, var: Var) -> &Expr {
        match var {
            Var::X => &self.dx,
            Var::Y => &self.dy,
        }
    }

    pub fn eval(&self, x: f64, y: f64) -> f64 {
        self.expr.eval(x, y)
    }

    // NaN и бесконечность в точке считаются ошибкой
    pub fn evaluate_at(&self, point: Vector2<f64>) -> Result<PointEvaluation, ParserError> {
        let value = finite(&self.expr, "f", point)?;
        let fx = finite(&self.dx, "∂f/∂x", point)?;
        let fy = finite(&self.dy, "∂f/∂y", point)?;
        Ok(PointEvaluation {
            point,
            value,
            gradient: Vector2::new(fx, fy),
        })
    }
}

fn finite(expr: &Expr, label: &str, point: Vector2<f64>) -> Result<f64, ParserError> {
    let value = expr.eval(point.x, point.y);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParserError::EvalError(format!(
            "{}({}, {}) = {} не является конечным числом",
            label, point.x, point.y, value
        )))
    }
}

// Глубже производная и упрощение уходят в слишком глубокую рекурсию.
const MAX_DEPTH: usize = 200;

/// Разбирает строку в дерево выражения. Степень допускается как в нотации
/// Python (`**`), так и через `^`.
pub fn parse_expression(expr_str: &str) -> Result<Expr, ParserError> {
    let normalized = expr_str.replace("**", "^");
    if normalized.trim().is_empty() {
        return Err(ParserError::ParseError("пустое выражение".to_string()));
    }

    let tokens = tokenize(&normalized).map_err(|e| ParserError::ParseError(e.to_string()))?;
    let rpn = to_rpn(&tokens).map_err(|e| ParserError::ParseError(e.to_string()))?;

    // рядом с каждым узлом хранится глубина его поддерева
    let mut stack: Vec<(Expr, usize)> = Vec::new();
    for token in rpn {
        let (node, depth) = match token {
            Token::Number(n) => (Expr::Const(n), 1),
            Token::Var(name) => (symbol(&name)?, 1),
            Token::Unary(op) => {
                let (arg, depth) = pop(&mut stack)?;
                let node = match op {
                    Operation::Minus => -arg,
                    Operation::Plus => arg,
                    other => return Err(unsupported(other)),
                };
                (node, depth + 1)
            }
            Token::Binary(op) => {
                let (rhs, rhs_depth) = pop(&mut stack)?;
                let (lhs, lhs_depth) = pop(&mut stack)?;
                let node = match op {
                    Operation::Plus => lhs + rhs,
                    Operation::Minus => lhs - rhs,
                    Operation::Times => lhs * rhs,
                    Operation::Div => lhs / rhs,
                    Operation::Pow => lhs.pow(rhs),
                    other => return Err(unsupported(other)),
                };
                (node, lhs_depth.max(rhs_depth) + 1)
            }
            Token::Func(name, arity) => {
                let func = Func::from_name(&name)
                    .ok_or_else(|| ParserError::UnknownSymbol(format!("{}()", name)))?;
                if arity != Some(1) {
                    return Err(ParserError::ParseError(format!(
                        "функция {} принимает ровно один аргумент",
                        name
                    )));
                }
                let (arg, depth) = pop(&mut stack)?;
                (Expr::apply(func, arg), depth + 1)
            }
            other => {
                return Err(ParserError::ParseError(format!(
                    "неожиданный токен {:?}",
                    other
                )))
            }
        };
        if depth > MAX_DEPTH {
            return Err(ParserError::ParseError(format!(
                "выражение слишком глубоко вложено (больше {} уровней)",
                MAX_DEPTH
            )));
        }
        stack.push((node, depth));
    }

    match (stack.pop(), stack.is_empty()) {
        (Some((expr, _)), true) => Ok(expr),
        _ => Err(ParserError::ParseError(
            "выражение не сводится к одному значению".to_string(),
        )),
    }
}

fn symbol(name: &str) -> Result<Expr, ParserError> {
    match name {
        "x" => Ok(Expr::Var(Var::X)),
        "y" => Ok(Expr::Var(Var::Y)),
        "pi" => Ok(Expr::Constant(Constant::Pi)),
        "e" | "E" => Ok(Expr::Constant(Constant::E)),
        _ => Err(ParserError::UnknownSymbol(name.to_string())),
    }
}

fn pop(stack: &mut Vec<(Expr, usize)>) -> Result<(Expr, usize), ParserError> {
    stack
        .pop()
        .ok_or_else(|| ParserError::ParseError("не хватает операнда".to_string()))
}

fn unsupported(op: Operation) -> ParserError {
    ParserError::InvalidExpression(format!("{:?}", op))
}
