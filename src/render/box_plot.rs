use std::path::Path;

use plotters::prelude::*;

use crate::analysis::REFERENCE_PRICE;
use crate::analysis::dispersion::DispersionSelection;
use crate::render::RenderError;

const BOX_X: f32 = 0.7;
const POINTS_X: f32 = 1.4;

/// Spread the data points sideways so equal prices do not overlap
fn jitter(i: usize) -> f32 {
    let h = (i as u32).wrapping_mul(2_654_435_761);
    (h % 1000) as f32 / 1000.0 * 0.4 - 0.2
}

/// Box plot of the selected category's prices, with every price drawn as a point
pub fn render_box_plot(
    selection: &DispersionSelection,
    path: &Path,
    size: (u32, u32),
) -> Result<(), RenderError> {
    if selection.prices.is_empty() {
        return Err(RenderError::Empty("box plot without prices"));
    }

    let quartiles = Quartiles::new(&selection.prices);
    let fences = quartiles.values();
    let (lo, hi) = selection
        .prices
        .iter()
        .map(|&p| p as f32)
        .chain(fences)
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    let pad = ((hi - lo) * 0.05).max(1.0);

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Price distribution for category: {}", selection.category),
            ("sans-serif", 24),
        )
        .margin(20)
        .x_label_area_size(30)
        .y_label_area_size(90)
        .build_cartesian_2d(0f32..2f32, (lo - pad)..(hi + pad))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(1)
        .x_label_formatter(&|_| String::new())
        .x_desc(selection.category.as_str())
        .y_desc(REFERENCE_PRICE)
        .draw()?;

    chart.draw_series(std::iter::once(
        Boxplot::new_vertical(BOX_X, &quartiles)
            .width(120)
            .whisker_width(0.5)
            .style(&BLUE),
    ))?;

    chart.draw_series(
        selection
            .prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Circle::new((POINTS_X + jitter(i), p as f32), 3, BLUE.mix(0.45).filled())),
    )?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_stays_in_band() {
        for i in 0..500 {
            let j = jitter(i);
            assert!((-0.2..0.2).contains(&j));
        }
    }

    #[test]
    fn writes_svg_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("box.svg");
        let selection = DispersionSelection {
            category: "belleza".into(),
            std_dev: 10.0,
            rows: vec![0, 1, 2, 3],
            prices: vec![10.0, 12.0, 15.0, 90.0],
        };
        render_box_plot(&selection, &path, (600, 400)).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("belleza"));
    }
}
