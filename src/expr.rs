use std::f64::consts;
use std::fmt;
use std::ops;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Var {
    X,
    Y,
}

impl Var {
    pub fn name(self) -> &'static str {
        match self {
            Var::X => "x",
            Var::Y => "y",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Constant {
    Pi,
    E,
}

impl Constant {
    pub fn value(self) -> f64 {
        match self {
            Constant::Pi => consts::PI,
            Constant::E => consts::E,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Sqrt,
    Abs,
}

impl Func {
    pub fn from_name(name: &str) -> Option<Self> {
        let func = match name {
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "asin" | "arcsin" => Func::Asin,
            "acos" | "arccos" => Func::Acos,
            "atan" | "arctan" => Func::Atan,
            "sinh" => Func::Sinh,
            "cosh" => Func::Cosh,
            "tanh" => Func::Tanh,
            "exp" => Func::Exp,
            "log" | "ln" => Func::Ln,
            "sqrt" => Func::Sqrt,
            "abs" | "Abs" => Func::Abs,
            _ => return None,
        };
        Some(func)
    }

    pub fn name(self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Asin => "asin",
            Func::Acos => "acos",
            Func::Atan => "atan",
            Func::Sinh => "sinh",
            Func::Cosh => "cosh",
            Func::Tanh => "tanh",
            Func::Exp => "exp",
            Func::Ln => "log",
            Func::Sqrt => "sqrt",
            Func::Abs => "Abs",
        }
    }

    pub fn apply(self, v: f64) -> f64 {
        match self {
            Func::Sin => v.sin(),
            Func::Cos => v.cos(),
            Func::Tan => v.tan(),
            Func::Asin => v.asin(),
            Func::Acos => v.acos(),
            Func::Atan => v.atan(),
            Func::Sinh => v.sinh(),
            Func::Cosh => v.cosh(),
            Func::Tanh => v.tanh(),
            Func::Exp => v.exp(),
            Func::Ln => v.ln(),
            Func::Sqrt => v.sqrt(),
            Func::Abs => v.abs(),
        }
    }

    fn latex(self, arg: &str) -> String {
        match self {
            Func::Exp => format!("e^{{{}}}", arg),
            Func::Sqrt => format!("\\sqrt{{{}}}", arg),
            Func::Abs => format!("\\left|{{{}}}\\right|", arg),
            Func::Asin => format!("\\operatorname{{asin}}{{\\left({} \\right)}}", arg),
            Func::Acos => format!("\\operatorname{{acos}}{{\\left({} \\right)}}", arg),
            Func::Atan => format!("\\operatorname{{atan}}{{\\left({} \\right)}}", arg),
            other => format!("\\{}{{\\left({} \\right)}}", other.name(), arg),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Const(f64),
    Constant(Constant),
    Var(Var),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Func(Func, Box<Expr>),
}

impl Expr {
    pub fn pow(self, exp: Expr) -> Expr {
        Expr::Pow(Box::new(self), Box::new(exp))
    }

    pub fn apply(func: Func, arg: Expr) -> Expr {
        Expr::Func(func, Box::new(arg))
    }

    /// Значение выражения в точке `(x, y)`. Вычисления вещественные:
    /// выход из области определения даёт NaN или бесконечность.
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        match self {
            Expr::Const(c) => *c,
            Expr::Constant(c) => c.value(),
            Expr::Var(Var::X) => x,
            Expr::Var(Var::Y) => y,
            Expr::Neg(a) => -a.eval(x, y),
            Expr::Add(a, b) => a.eval(x, y) + b.eval(x, y),
            Expr::Sub(a, b) => a.eval(x, y) - b.eval(x, y),
            Expr::Mul(a, b) => a.eval(x, y) * b.eval(x, y),
            Expr::Div(a, b) => a.eval(x, y) / b.eval(x, y),
            Expr::Pow(a, b) => pow_real(a.eval(x, y), b.eval(x, y)),
            Expr::Func(f, a) => f.apply(a.eval(x, y)),
        }
    }

    pub fn depends_on(&self, var: Var) -> bool {
        match self {
            Expr::Const(_) | Expr::Constant(_) => false,
            Expr::Var(v) => *v == var,
            Expr::Neg(a) | Expr::Func(_, a) => a.depends_on(var),
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b) => a.depends_on(var) || b.depends_on(var),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Add(..) | Expr::Sub(..) => 1,
            Expr::Mul(..) | Expr::Div(..) => 2,
            Expr::Neg(_) => 3,
            Expr::Const(c) if c.is_sign_negative() => 3,
            Expr::Pow(..) => 4,
            _ => 5,
        }
    }

    fn is_negative(&self) -> bool {
        self.precedence() == 3
    }

    pub fn to_latex(&self) -> String {
        match self {
            Expr::Const(c) => format_number(*c),
            Expr::Constant(Constant::Pi) => "\\pi".to_string(),
            Expr::Constant(Constant::E) => "e".to_string(),
            Expr::Var(v) => v.name().to_string(),
            Expr::Neg(a) => format!("- {}", latex_wrapped(a, a.precedence() < 2)),
            Expr::Add(a, b) => format!("{} + {}", a.to_latex(), b.to_latex()),
            Expr::Sub(a, b) => format!(
                "{} - {}",
                a.to_latex(),
                latex_wrapped(b, b.precedence() <= 1)
            ),
            Expr::Mul(a, b) => {
                let sep = if matches!(**b, Expr::Const(_)) { " \\cdot " } else { " " };
                format!(
                    "{}{}{}",
                    latex_wrapped(a, a.precedence() < 2),
                    sep,
                    latex_wrapped(b, b.precedence() < 2 || b.is_negative())
                )
            }
            Expr::Div(a, b) => format!("\\frac{{{}}}{{{}}}", a.to_latex(), b.to_latex()),
            Expr::Pow(a, b) => format!(
                "{}^{{{}}}",
                latex_wrapped(a, a.precedence() <= 4),
                b.to_latex()
            ),
            Expr::Func(f, a) => f.latex(&a.to_latex()),
        }
    }
}

// целый показатель через powi: (-2)**3 = -8, а не NaN
fn pow_real(base: f64, exp: f64) -> f64 {
    if exp.fract() == 0.0 && exp.abs() <= i32::MAX as f64 {
        base.powi(exp as i32)
    } else {
        base.powf(exp)
    }
}

// 2, а не 2.0
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

fn latex_wrapped(expr: &Expr, wrap: bool) -> String {
    if wrap {
        format!("\\left({}\\right)", expr.to_latex())
    } else {
        expr.to_latex()
    }
}

struct Wrapped<'a>(&'a Expr, bool);

impl fmt::Display for Wrapped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.1 {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Const(c) => write!(f, "{}", format_number(*c)),
            Expr::Constant(Constant::Pi) => write!(f, "pi"),
            Expr::Constant(Constant::E) => write!(f, "E"),
            Expr::Var(v) => write!(f, "{}", v.name()),
            Expr::Neg(a) => write!(f, "-{}", Wrapped(a, a.precedence() < 2)),
            Expr::Add(a, b) => write!(f, "{} + {}", a, b),
            Expr::Sub(a, b) => write!(f, "{} - {}", a, Wrapped(b, b.precedence() <= 1)),
            Expr::Mul(a, b) => write!(
                f,
                "{}*{}",
                Wrapped(a, a.precedence() < 2),
                Wrapped(b, b.precedence() < 2 || b.is_negative())
            ),
            Expr::Div(a, b) => write!(
                f,
                "{}/{}",
                Wrapped(a, a.precedence() < 2),
                Wrapped(b, b.precedence() <= 2 || b.is_negative())
            ),
            Expr::Pow(a, b) => write!(
                f,
                "{}**{}",
                Wrapped(a, a.precedence() <= 4),
                Wrapped(b, b.precedence() < 4)
            ),
            Expr::Func(func, a) => write!(f, "{}({})", func.name(), a),
        }
    }
}

impl ops::Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        Expr::Add(Box::new(self), Box::new(rhs))
    }
}

impl ops::Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        Expr::Sub(Box::new(self), Box::new(rhs))
    }
}

impl ops::Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        Expr::Mul(Box::new(self), Box::new(rhs))
    }
}

impl ops::Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        Expr::Div(Box::new(self), Box::new(rhs))
    }
}

impl ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn x() -> Expr {
        Expr::Var(Var::X)
    }

    fn y() -> Expr {
        Expr::Var(Var::Y)
    }

    #[test]
    fn test_display_python_notation() {
        let f = x().pow(Expr::Const(2.0)) + y() + y().pow(Expr::Const(3.0));
        assert_eq!(f.to_string(), "x**2 + y + y**3");
    }

    #[test]
    fn test_display_parenthesizes_by_precedence() {
        let f = (x() + y()) * (x() - y());
        assert_eq!(f.to_string(), "(x + y)*(x - y)");

        let g = x() - (y() - Expr::Const(1.0));
        assert_eq!(g.to_string(), "x - (y - 1)");

        let h = Expr::Const(-2.0).pow(x());
        assert_eq!(h.to_string(), "(-2)**x");

        let k = x() / (Expr::Const(2.0) * y());
        assert_eq!(k.to_string(), "x/(2*y)");

        let n = -(x() + y());
        assert_eq!(n.to_string(), "-(x + y)");

        let m = -(x() / y());
        assert_eq!(m.to_string(), "-x/y");
    }

    #[test]
    fn test_display_functions_and_constants() {
        let f = Expr::apply(Func::Sin, x() * y()) + Expr::Constant(Constant::Pi);
        assert_eq!(f.to_string(), "sin(x*y) + pi");
        assert_eq!(format_number(0.5), "0.5");
    }

    #[test]
    fn test_latex() {
        let f = x().pow(Expr::Const(2.0)) + Expr::Const(3.0) * y().pow(Expr::Const(2.0));
        assert_eq!(f.to_latex(), "x^{2} + 3 y^{2}");

        let g = Expr::apply(Func::Sin, x()) / y();
        assert_eq!(g.to_latex(), "\\frac{\\sin{\\left(x \\right)}}{y}");
    }

    #[test]
    fn test_eval() {
        let f = x().pow(Expr::Const(2.0)) + y() + y().pow(Expr::Const(3.0));
        assert_relative_eq!(f.eval(1.0, 2.0), 11.0);

        let g = Expr::apply(Func::Exp, x()) * Expr::apply(Func::Cos, y());
        assert_relative_eq!(g.eval(0.0, 0.0), 1.0);

        let cube = Expr::Const(-2.0).pow(Expr::Const(3.0));
        assert_relative_eq!(cube.eval(0.0, 0.0), -8.0);
    }

    #[test]
    fn test_eval_out_of_domain_is_not_finite() {
        assert!((Expr::Const(1.0) / x()).eval(0.0, 0.0).is_infinite());
        assert!(Expr::apply(Func::Sqrt, x()).eval(-1.0, 0.0).is_nan());
        assert!(Expr::apply(Func::Ln, y()).eval(0.0, -1.0).is_nan());
    }

    #[test]
    fn test_depends_on() {
        let f = Expr::apply(Func::Sin, x()) + Expr::Const(1.0);
        assert!(f.depends_on(Var::X));
        assert!(!f.depends_on(Var::Y));
    }
}
