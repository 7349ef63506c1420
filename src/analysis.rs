use crate::config::GridWindow;
use crate::expr::Var;
use crate::parser::{ParsedFunction, ParserError, PointEvaluation};
use crate::surface::{self, SampleGrid, Section, TangentPlane};
use log::{debug, info};
use nalgebra::Vector2;

#[derive(Clone, Debug)]
pub struct Analysis {
    pub function: ParsedFunction,
    pub evaluation: PointEvaluation,
    pub plane: TangentPlane,
    pub grid: SampleGrid,
    pub section_x: Section,
    pub section_y: Section,
}

pub fn analyze(
    expr_str: &str,
    point: Vector2<f64>,
    window: &GridWindow,
) -> Result<Analysis, ParserError> {
    let function = ParsedFunction::new(expr_str)?;
    debug!(
        "f = {}, ∂f/∂x = {}, ∂f/∂y = {}",
        function.expr(),
        function.partial(Var::X),
        function.partial(Var::Y)
    );

    let evaluation = function.evaluate_at(point)?;
    let plane = TangentPlane::from(&evaluation);
    let grid = surface::sample(&function, &plane, window);
    let (section_x, section_y) = surface::sections(&function, &plane, window);

    info!(
        "{}: f({}, {}) = {}, градиент = ({}, {})",
        function.source(),
        point.x,
        point.y,
        evaluation.value,
        evaluation.gradient.x,
        evaluation.gradient.y
    );

    Ok(Analysis {
        function,
        evaluation,
        plane,
        grid,
        section_x,
        section_y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_pipeline() {
        let analysis = analyze("x**2 + y + y**3", Vector2::new(1.0, 2.0), &GridWindow::default()).unwrap();
        assert_eq!(analysis.function.partial(Var::X).to_string(), "2*x");
        assert_eq!(analysis.function.partial(Var::Y).to_string(), "1 + 3*y**2");
        assert_relative_eq!(analysis.evaluation.value, 11.0);
        assert_relative_eq!(analysis.evaluation.gradient.x, 2.0);
        assert_relative_eq!(analysis.evaluation.gradient.y, 13.0);
        assert_eq!(analysis.plane.at(1.0, 2.0), analysis.evaluation.value);
    }

    #[test]
    fn test_malformed_input_fails_without_panic() {
        let result = analyze("x**", Vector2::new(1.0, 2.0), &GridWindow::default());
        assert!(matches!(result, Err(ParserError::ParseError(_))));
    }

    #[test]
    fn test_moving_point_only_changes_numbers() {
        let window = GridWindow::default();
        let a = analyze("x*y**2 + sin(x)", Vector2::new(1.0, 2.0), &window).unwrap();
        let b = analyze("x*y**2 + sin(x)", Vector2::new(-2.0, 0.5), &window).unwrap();

        assert_eq!(a.function.partial(Var::X), b.function.partial(Var::X));
        assert_eq!(a.function.partial(Var::Y), b.function.partial(Var::Y));
        assert_ne!(a.evaluation.value, b.evaluation.value);
        assert_eq!(a.grid.xs[0], -1.0);
        assert_eq!(b.grid.xs[0], -4.0);
        assert_eq!(b.grid.ys[49], 2.5);
    }

    #[test]
    fn test_custom_window() {
        let window = GridWindow {
            half_width: 0.5,
            samples: 11,
        };
        let analysis = analyze("x + y", Vector2::new(0.0, 0.0), &window).unwrap();
        assert_eq!(analysis.grid.xs.len(), 11);
        assert_eq!(analysis.grid.xs[10], 0.5);
        assert_relative_eq!(analysis.grid.xs[5], 0.0, epsilon = 1e-12);
    }
}
