use crate::analysis::Analysis;
use crate::config::View;
use anyhow::{bail, Result};
use log::debug;
use nalgebra::DMatrix;
use plotters::prelude::*;

const SURFACE_ALPHA: f64 = 0.75;
const PLANE_ALPHA: f64 = 0.5;
// больший разброс значений plotters не размечает (зависает на осях)
const MAX_SPAN: f64 = f64::MAX / 16.0;

// Ось значений у plotters вертикальная (вторая координата), поэтому
// точка (x, y, z) поверхности кладётся как (x, z, y).
type Cell = (Vec<(f64, f64, f64)>, f64);

pub fn render_surface(analysis: &Analysis, size: (u32, u32), view: &View) -> Result<Vec<u8>> {
    let grid = &analysis.grid;
    if grid.xs.len() < 2 || grid.ys.len() < 2 {
        bail!("сетка должна содержать хотя бы 2×2 точки");
    }

    let point = analysis.evaluation.point;
    let value = analysis.evaluation.value;
    let (z_min, z_max) = match value_range(&[&grid.surface, &grid.plane], value) {
        Some(range) => range,
        None => bail!(
            "значения функции в окне построения не конечны или слишком велики для графика"
        ),
    };
    let x_range = grid.xs[0]..grid.xs[grid.xs.len() - 1];
    let y_range = grid.ys[0]..grid.ys[grid.ys.len() - 1];

    let surface_cells = cells(grid.xs.as_slice(), grid.ys.as_slice(), &grid.surface);
    let plane_cells = cells(grid.xs.as_slice(), grid.ys.as_slice(), &grid.plane);
    debug!(
        "рендер {}x{}: {} ячеек поверхности, {} ячеек плоскости, z ∈ [{}, {}]",
        size.0,
        size.1,
        surface_cells.len(),
        plane_cells.len(),
        z_min,
        z_max
    );

    let mut buffer = vec![0u8; size.0 as usize * size.1 as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("f(x, y) и касательная плоскость в точке (x₀, y₀), z = f", ("sans-serif", 20))
            .margin(10)
            .build_cartesian_3d(x_range.clone(), z_min..z_max, y_range.clone())?;

        chart.with_projection(|mut pb| {
            pb.yaw = view.yaw;
            pb.pitch = view.pitch;
            pb.scale = 0.8;
            pb.into_matrix()
        });

        chart
            .configure_axes()
            .light_grid_style(BLACK.mix(0.15))
            .max_light_lines(3)
            .draw()?;

        let axis_names = [
            ("x", (x_range.end, z_min, y_range.start)),
            ("y", (x_range.start, z_min, y_range.end)),
            ("z", (x_range.start, z_max, y_range.start)),
        ];
        chart.draw_series(
            axis_names
                .into_iter()
                .map(|(name, pos)| Text::new(name, pos, ("sans-serif", 18).into_font())),
        )?;

        let (lo, hi) = (z_min, z_max);
        chart
            .draw_series(surface_cells.into_iter().map(|(quad, height)| {
                Polygon::new(quad, height_color((height - lo) / (hi - lo)).mix(SURFACE_ALPHA).filled())
            }))?
            .label("f(x, y)")
            .legend(|(x, y)| {
                Rectangle::new([(x + 5, y - 5), (x + 15, y + 5)], height_color(0.5).filled())
            });

        chart
            .draw_series(
                plane_cells
                    .into_iter()
                    .map(|(quad, _)| Polygon::new(quad, RED.mix(PLANE_ALPHA).filled())),
            )?
            .label("касательная плоскость")
            .legend(|(x, y)| Rectangle::new([(x + 5, y - 5), (x + 15, y + 5)], RED.mix(PLANE_ALPHA).filled()));

        chart.draw_series(std::iter::once(Circle::new(
            (point.x, value, point.y),
            5,
            BLACK.filled(),
        )))?;

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
    }

    Ok(buffer)
}

// Минимум и максимум конечных значений с запасом 5%. Вырожденный диапазон
// расширяется на единицу, слишком широкий отбрасывается.
pub fn value_range(matrices: &[&DMatrix<f64>], value: f64) -> Option<(f64, f64)> {
    let (min, max) = matrices
        .iter()
        .flat_map(|m| m.iter())
        .chain(std::iter::once(&value))
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    if !min.is_finite() || !max.is_finite() {
        return None;
    }
    if max - min < f64::EPSILON * max.abs().max(1.0) {
        return Some((min - 1.0, max + 1.0));
    }
    let span = max - min;
    if !span.is_finite() || span > MAX_SPAN {
        return None;
    }
    let (lo, hi) = (min - 0.05 * span, max + 0.05 * span);
    if lo.is_finite() && hi.is_finite() {
        Some((lo, hi))
    } else {
        None
    }
}

// ячейки с нечисловыми углами пропускаются
pub fn cells(xs: &[f64], ys: &[f64], values: &DMatrix<f64>) -> Vec<Cell> {
    let mut out = Vec::with_capacity(xs.len().saturating_sub(1) * ys.len().saturating_sub(1));
    for i in 0..ys.len().saturating_sub(1) {
        for j in 0..xs.len().saturating_sub(1) {
            let corners = [(i, j), (i, j + 1), (i + 1, j + 1), (i + 1, j)];
            if corners.iter().any(|&idx| !values[idx].is_finite()) {
                continue;
            }
            let quad: Vec<(f64, f64, f64)> = corners
                .iter()
                .map(|&(r, c)| (xs[c], values[(r, c)], ys[r]))
                .collect();
            let height = corners.iter().map(|&idx| values[idx]).sum::<f64>() / 4.0;
            out.push((quad, height));
        }
    }
    out
}

// от фиолетового (t = 0) к жёлтому (t = 1)
pub fn height_color(t: f64) -> HSLColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    HSLColor(0.75 - 0.6 * t, 0.65, 0.3 + 0.3 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::config::GridWindow;
    use approx::assert_relative_eq;
    use nalgebra::Vector2;

    const SIZE: (u32, u32) = (400, 300);

    fn render(expr: &str, x0: f64, y0: f64) -> Result<Vec<u8>> {
        let analysis = analyze(expr, Vector2::new(x0, y0), &GridWindow::default()).unwrap();
        render_surface(&analysis, SIZE, &View::default())
    }

    fn has_ink(buffer: &[u8]) -> bool {
        buffer.chunks(3).any(|px| px != [255, 255, 255])
    }

    #[test]
    fn test_render_default_function() {
        let buffer = render("x**2 + y + y**3", 1.0, 2.0).unwrap();
        assert_eq!(buffer.len(), (SIZE.0 * SIZE.1 * 3) as usize);
        assert!(has_ink(&buffer));
    }

    #[test]
    fn test_render_with_undefined_region() {
        // при x < 0 корень не определён, часть ячеек пропускается
        let buffer = render("sqrt(x) + y", 1.0, 0.0).unwrap();
        assert_eq!(buffer.len(), (SIZE.0 * SIZE.1 * 3) as usize);
        assert!(has_ink(&buffer));
    }

    #[test]
    fn test_render_rejects_overflowing_range() {
        assert!(render("1e308*x", 0.0, 0.0).is_err());
        assert!(render("exp(x) - exp(y)", 708.0, 708.0).is_err());
    }

    #[test]
    fn test_value_range_overflow_is_rejected() {
        let m = DMatrix::from_row_slice(1, 2, &[-1.5e308, 1.5e308]);
        assert_eq!(value_range(&[&m], 0.0), None);

        let wide = DMatrix::from_row_slice(1, 2, &[-1e300, 1e300]);
        assert!(value_range(&[&wide], 0.0).is_some());
    }

    #[test]
    fn test_value_range_adds_margin() {
        let m = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 2.0, 10.0]);
        let (lo, hi) = value_range(&[&m], 5.0).unwrap();
        assert_relative_eq!(lo, -0.5);
        assert_relative_eq!(hi, 10.5);
    }

    #[test]
    fn test_value_range_skips_non_finite() {
        let m = DMatrix::from_row_slice(2, 2, &[f64::NAN, 1.0, f64::INFINITY, 3.0]);
        let (lo, hi) = value_range(&[&m], 2.0).unwrap();
        assert_relative_eq!(lo, 0.9);
        assert_relative_eq!(hi, 3.1);
    }

    #[test]
    fn test_value_range_degenerate_and_empty() {
        let flat = DMatrix::from_element(3, 3, 4.0);
        assert_eq!(value_range(&[&flat], 4.0), Some((3.0, 5.0)));

        let empty = DMatrix::from_element(2, 2, f64::NAN);
        assert_eq!(value_range(&[&empty], f64::NAN), None);
    }

    #[test]
    fn test_cells_skip_non_finite_corners() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 1.0];
        let values = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, f64::NAN, 3.0, 4.0, 5.0]);
        let cells = cells(&xs, &ys, &values);
        assert_eq!(cells.len(), 1);
        let (quad, height) = &cells[0];
        assert_eq!(quad[0], (0.0, 1.0, 0.0));
        assert_eq!(quad[2], (1.0, 4.0, 1.0));
        assert_relative_eq!(*height, 2.5);
    }

    #[test]
    fn test_height_color_is_clamped() {
        assert_eq!(height_color(-1.0).rgb(), height_color(0.0).rgb());
        assert_eq!(height_color(2.0).rgb(), height_color(1.0).rgb());
        assert_eq!(height_color(f64::NAN).rgb(), height_color(0.5).rgb());
        assert_ne!(height_color(0.0).rgb(), height_color(1.0).rgb());
    }
}
