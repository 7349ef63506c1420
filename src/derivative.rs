use crate::expr::{Constant, Expr, Func, Var};

const MAX_SIMPLIFY_PASSES: usize = 16;

impl Expr {
    pub fn diff(&self, var: Var) -> Expr {
        self.derivative(var).simplify()
    }

    fn derivative(&self, var: Var) -> Expr {
        match self {
            Expr::Const(_) | Expr::Constant(_) => Expr::Const(0.0),
            Expr::Var(v) => {
                if *v == var {
                    Expr::Const(1.0)
                } else {
                    Expr::Const(0.0)
                }
            }
            Expr::Neg(a) => -a.derivative(var),
            Expr::Add(a, b) => a.derivative(var) + b.derivative(var),
            Expr::Sub(a, b) => a.derivative(var) - b.derivative(var),
            Expr::Mul(a, b) => {
                a.derivative(var) * (**b).clone() + (**a).clone() * b.derivative(var)
            }
            Expr::Div(a, b) if !b.depends_on(var) => a.derivative(var) / (**b).clone(),
            Expr::Div(a, b) => {
                (a.derivative(var) * (**b).clone() - (**a).clone() * b.derivative(var))
                    / (**b).clone().pow(Expr::Const(2.0))
            }
            Expr::Pow(base, exp) => {
                let base = (**base).clone();
                let exp = (**exp).clone();
                if !exp.depends_on(var) {
                    // d(u^n) = n*u^(n-1)*u'
                    let du = base.derivative(var);
                    exp.clone() * base.pow(exp - Expr::Const(1.0)) * du
                } else if !base.depends_on(var) {
                    // d(a^v) = a^v*ln(a)*v'
                    let dv = exp.derivative(var);
                    base.clone().pow(exp) * Expr::apply(Func::Ln, base) * dv
                } else {
                    // d(u^v) = u^v*(v'*ln(u) + v*u'/u)
                    let du = base.derivative(var);
                    let dv = exp.derivative(var);
                    base.clone().pow(exp.clone())
                        * (dv * Expr::apply(Func::Ln, base.clone()) + exp * du / base)
                }
            }
            Expr::Func(func, arg) => outer_derivative(*func, (**arg).clone()) * arg.derivative(var),
        }
    }

    pub fn simplify(&self) -> Expr {
        let mut current = self.clone();
        for _ in 0..MAX_SIMPLIFY_PASSES {
            let next = current.simplify_once();
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    fn simplify_once(&self) -> Expr {
        match self {
            Expr::Const(_) | Expr::Constant(_) | Expr::Var(_) => self.clone(),
            Expr::Neg(a) => negate(a.simplify_once()),
            Expr::Add(a, b) => add(a.simplify_once(), b.simplify_once()),
            Expr::Sub(a, b) => sub(a.simplify_once(), b.simplify_once()),
            Expr::Mul(a, b) => mul(a.simplify_once(), b.simplify_once()),
            Expr::Div(a, b) => div(a.simplify_once(), b.simplify_once()),
            Expr::Pow(a, b) => pow(a.simplify_once(), b.simplify_once()),
            Expr::Func(func, a) => apply(*func, a.simplify_once()),
        }
    }
}

// f'(u) без множителя u'
fn outer_derivative(func: Func, u: Expr) -> Expr {
    let one = || Expr::Const(1.0);
    let two = || Expr::Const(2.0);
    match func {
        Func::Sin => Expr::apply(Func::Cos, u),
        Func::Cos => -Expr::apply(Func::Sin, u),
        Func::Tan => one() + Expr::apply(Func::Tan, u).pow(two()),
        Func::Asin => one() / Expr::apply(Func::Sqrt, one() - u.pow(two())),
        Func::Acos => -(one() / Expr::apply(Func::Sqrt, one() - u.pow(two()))),
        Func::Atan => one() / (one() + u.pow(two())),
        Func::Sinh => Expr::apply(Func::Cosh, u),
        Func::Cosh => Expr::apply(Func::Sinh, u),
        Func::Tanh => one() - Expr::apply(Func::Tanh, u).pow(two()),
        Func::Exp => Expr::apply(Func::Exp, u),
        Func::Ln => one() / u,
        Func::Sqrt => one() / (two() * Expr::apply(Func::Sqrt, u)),
        Func::Abs => u.clone() / Expr::apply(Func::Abs, u),
    }
}

fn is_integer(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0
}

fn negate(a: Expr) -> Expr {
    match a {
        Expr::Const(c) => Expr::Const(-c),
        Expr::Neg(inner) => *inner,
        other => -other,
    }
}

fn add(a: Expr, b: Expr) -> Expr {
    match (a, b) {
        (Expr::Const(p), Expr::Const(q)) => Expr::Const(p + q),
        (Expr::Const(z), e) | (e, Expr::Const(z)) if z == 0.0 => e,
        (e, Expr::Neg(b)) => sub(e, *b),
        (e, Expr::Const(c)) if c < 0.0 => Expr::Sub(Box::new(e), Box::new(Expr::Const(-c))),
        (a, b) if a == b => Expr::Const(2.0) * a,
        (a, b) => a + b,
    }
}

fn sub(a: Expr, b: Expr) -> Expr {
    match (a, b) {
        (Expr::Const(p), Expr::Const(q)) => Expr::Const(p - q),
        (e, Expr::Const(z)) if z == 0.0 => e,
        (e, Expr::Const(c)) if c < 0.0 => add(e, Expr::Const(-c)),
        (Expr::Const(z), e) if z == 0.0 => negate(e),
        (e, Expr::Neg(b)) => add(e, *b),
        (a, b) if a == b => Expr::Const(0.0),
        (a, b) => a - b,
    }
}

fn mul(a: Expr, b: Expr) -> Expr {
    match (a, b) {
        (Expr::Const(p), Expr::Const(q)) => Expr::Const(p * q),
        (Expr::Const(z), _) | (_, Expr::Const(z)) if z == 0.0 => Expr::Const(0.0),
        (Expr::Const(o), e) | (e, Expr::Const(o)) if o == 1.0 => e,
        (Expr::Const(m), e) | (e, Expr::Const(m)) if m == -1.0 => negate(e),
        // константа всегда слева
        (e, Expr::Const(c)) => mul(Expr::Const(c), e),
        (Expr::Const(p), Expr::Mul(inner, e)) if matches!(*inner, Expr::Const(_)) => {
            match *inner {
                Expr::Const(q) => mul(Expr::Const(p * q), *e),
                other => Expr::Const(p) * (other * *e),
            }
        }
        (Expr::Neg(a), b) => negate(mul(*a, b)),
        (a, Expr::Neg(b)) => negate(mul(a, *b)),
        (a, b) if a == b => a.pow(Expr::Const(2.0)),
        (a, b) => a * b,
    }
}

fn div(a: Expr, b: Expr) -> Expr {
    match (a, b) {
        (Expr::Const(p), Expr::Const(q)) if q != 0.0 && is_integer(p / q) => Expr::Const(p / q),
        (Expr::Const(z), _) if z == 0.0 => Expr::Const(0.0),
        (e, Expr::Const(o)) if o == 1.0 => e,
        (Expr::Neg(a), b) => negate(div(*a, b)),
        (a, b) if a == b => Expr::Const(1.0),
        (a, b) => a / b,
    }
}

fn pow(base: Expr, exp: Expr) -> Expr {
    match (base, exp) {
        (Expr::Const(p), Expr::Const(q)) if is_integer(p.powf(q)) => Expr::Const(p.powf(q)),
        (_, Expr::Const(z)) if z == 0.0 => Expr::Const(1.0),
        (e, Expr::Const(o)) if o == 1.0 => e,
        (Expr::Const(o), _) if o == 1.0 => Expr::Const(1.0),
        (Expr::Pow(b, inner), Expr::Const(q)) if is_integer(q) && matches!(*inner, Expr::Const(_)) => {
            match *inner {
                Expr::Const(p) => pow(*b, Expr::Const(p * q)),
                other => (*b).pow(other).pow(Expr::Const(q)),
            }
        }
        (b, e) => b.pow(e),
    }
}

fn apply(func: Func, arg: Expr) -> Expr {
    if func == Func::Ln && arg == Expr::Constant(Constant::E) {
        return Expr::Const(1.0);
    }
    if let Expr::Const(c) = arg {
        let value = func.apply(c);
        if is_integer(value) {
            return Expr::Const(value);
        }
    }
    Expr::apply(func, arg)
}
