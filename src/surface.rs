use crate::config::GridWindow;
use crate::parser::{ParsedFunction, PointEvaluation};
use nalgebra::{DMatrix, DVector, Vector2};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TangentPlane {
    pub point: Vector2<f64>,
    pub value: f64,
    pub gradient: Vector2<f64>,
}

impl TangentPlane {
    pub fn at(&self, x: f64, y: f64) -> f64 {
        self.value + self.gradient.x * (x - self.point.x) + self.gradient.y * (y - self.point.y)
    }
}

impl From<&PointEvaluation> for TangentPlane {
    fn from(eval: &PointEvaluation) -> Self {
        Self {
            point: eval.point,
            value: eval.value,
            gradient: eval.gradient,
        }
    }
}

// строки матриц соответствуют ys, столбцы xs (как у meshgrid)
#[derive(Clone, Debug)]
pub struct SampleGrid {
    pub xs: DVector<f64>,
    pub ys: DVector<f64>,
    pub surface: DMatrix<f64>,
    pub plane: DMatrix<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct Section {
    pub surface: Vec<[f64; 2]>,
    pub tangent: Vec<[f64; 2]>,
}

// концы включены точно
pub fn linspace(start: f64, end: f64, n: usize) -> DVector<f64> {
    match n {
        0 => DVector::zeros(0),
        1 => DVector::from_element(1, start),
        _ => {
            let step = (end - start) / (n - 1) as f64;
            DVector::from_fn(n, |i, _| if i == n - 1 { end } else { start + step * i as f64 })
        }
    }
}

fn axis(center: f64, window: &GridWindow) -> DVector<f64> {
    linspace(center - window.half_width, center + window.half_width, window.samples)
}

pub fn sample(func: &ParsedFunction, plane: &TangentPlane, window: &GridWindow) -> SampleGrid {
    let xs = axis(plane.point.x, window);
    let ys = axis(plane.point.y, window);
    let surface = DMatrix::from_fn(ys.len(), xs.len(), |i, j| func.eval(xs[j], ys[i]));
    let plane = DMatrix::from_fn(ys.len(), xs.len(), |i, j| plane.at(xs[j], ys[i]));
    SampleGrid {
        xs,
        ys,
        surface,
        plane,
    }
}

// вдоль y = y₀ и вдоль x = x₀
pub fn sections(func: &ParsedFunction, plane: &TangentPlane, window: &GridWindow) -> (Section, Section) {
    let (x0, y0) = (plane.point.x, plane.point.y);

    let along_x = axis(x0, window);
    let section_x = Section {
        surface: along_x.iter().map(|&x| [x, func.eval(x, y0)]).collect(),
        tangent: along_x.iter().map(|&x| [x, plane.at(x, y0)]).collect(),
    };

    let along_y = axis(y0, window);
    let section_y = Section {
        surface: along_y.iter().map(|&y| [y, func.eval(x0, y)]).collect(),
        tangent: along_y.iter().map(|&y| [y, plane.at(x0, y)]).collect(),
    };

    (section_x, section_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn default_setup(x0: f64, y0: f64) -> (ParsedFunction, TangentPlane) {
        let func = ParsedFunction::new("x**2 + y + y**3").unwrap();
        let eval = func.evaluate_at(Vector2::new(x0, y0)).unwrap();
        (func, TangentPlane::from(&eval))
    }

    #[test]
    fn test_linspace_endpoints() {
        let v = linspace(-1.0, 3.0, 50);
        assert_eq!(v.len(), 50);
        assert_eq!(v[0], -1.0);
        assert_eq!(v[49], 3.0);
        assert_relative_eq!(v[1] - v[0], 4.0 / 49.0, epsilon = 1e-12);
        assert_eq!(linspace(0.0, 1.0, 1).len(), 1);
        assert_eq!(linspace(0.0, 1.0, 0).len(), 0);
    }

    #[test]
    fn test_plane_touches_surface_at_point() {
        let (_, plane) = default_setup(1.0, 2.0);
        assert_eq!(plane.at(1.0, 2.0), plane.value);
        assert_eq!(plane.value, 11.0);

        let (_, other) = default_setup(0.3, -1.7);
        assert_eq!(other.at(0.3, -1.7), other.value);
    }

    #[test]
    fn test_plane_is_linear() {
        let (_, plane) = default_setup(1.0, 2.0);
        // 11 + 2*(x-1) + 13*(y-2)
        assert_relative_eq!(plane.at(2.0, 2.0), 13.0);
        assert_relative_eq!(plane.at(1.0, 3.0), 24.0);
    }

    #[test]
    fn test_grid_spans_window() {
        for &(x0, y0) in &[(1.0, 2.0), (-3.5, 0.25), (100.0, -100.0)] {
            let (func, plane) = default_setup(x0, y0);
            let grid = sample(&func, &plane, &GridWindow::default());
            assert_eq!(grid.xs.len(), 50);
            assert_eq!(grid.ys.len(), 50);
            assert_eq!(grid.xs[0], x0 - 2.0);
            assert_eq!(grid.xs[49], x0 + 2.0);
            assert_eq!(grid.ys[0], y0 - 2.0);
            assert_eq!(grid.ys[49], y0 + 2.0);
            assert_eq!(grid.surface.shape(), (50, 50));
            assert_eq!(grid.plane.shape(), (50, 50));
        }
    }

    #[test]
    fn test_grid_uses_meshgrid_layout() {
        let (func, plane) = default_setup(1.0, 2.0);
        let grid = sample(&func, &plane, &GridWindow::default());
        let (i, j) = (3, 17);
        let (x, y) = (grid.xs[j], grid.ys[i]);
        assert_relative_eq!(grid.surface[(i, j)], x * x + y + y * y * y, epsilon = 1e-9);
        assert_relative_eq!(grid.plane[(i, j)], plane.at(x, y));
    }

    #[test]
    fn test_grid_keeps_non_finite_samples() {
        let func = ParsedFunction::new("sqrt(x)").unwrap();
        let eval = func.evaluate_at(Vector2::new(1.0, 0.0)).unwrap();
        let grid = sample(&func, &TangentPlane::from(&eval), &GridWindow::default());
        assert!(grid.surface[(0, 0)].is_nan());
        assert!(grid.surface[(0, 49)].is_finite());
    }

    #[test]
    fn test_sections_pass_through_point() {
        let (func, plane) = default_setup(1.0, 2.0);
        let (sx, sy) = sections(&func, &plane, &GridWindow::default());
        assert_eq!(sx.surface.len(), 50);
        assert_eq!(sy.tangent.len(), 50);
        assert_eq!(sx.surface[0][0], -1.0);
        assert_relative_eq!(sx.surface[0][1], 1.0 + 2.0 + 8.0);
        assert_relative_eq!(sy.tangent[49][1], plane.at(1.0, 4.0));
    }
}
