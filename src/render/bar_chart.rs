use std::path::Path;

use plotters::prelude::*;
use plotters::style::FontTransform;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::analysis::discounts::CategoryDiscount;
use crate::render::RenderError;
use crate::render::palette::BAR_COLOR;

/// Bar per category, tallest first, with the mean printed above each bar
pub fn render_bar_chart(
    discounts: &[CategoryDiscount],
    path: &Path,
    size: (u32, u32),
) -> Result<(), RenderError> {
    if discounts.is_empty() {
        return Err(RenderError::Empty("bar chart without categories"));
    }

    let names: Vec<String> = discounts.iter().map(|d| d.category.clone()).collect();
    // a NaN mean has no bar height
    let values: Vec<f64> = discounts
        .iter()
        .map(|d| if d.mean_discount.is_nan() { 0.0 } else { d.mean_discount })
        .collect();

    let max = values.iter().copied().fold(0.0, f64::max);
    let min = values.iter().copied().fold(0.0, f64::min);
    let top = if max > 0.0 { max * 1.15 } else { 1.0 };
    let bottom = if min < 0.0 { min * 1.15 } else { 0.0 };

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let n = discounts.len() as i32;
    let mut chart = ChartBuilder::on(&root)
        .caption("Mean discount by category", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(140)
        .y_label_area_size(80)
        .build_cartesian_2d((0..n).into_segmented(), bottom..top)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(discounts.len())
        .x_label_style(
            ("sans-serif", 12)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => names.get(*i as usize).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .x_desc("Category")
        .y_desc("Mean discount ($)")
        .draw()?;

    chart.draw_series(values.iter().enumerate().map(|(i, &v)| {
        let i = i as i32;
        let mut bar = Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), v)],
            BAR_COLOR.filled(),
        );
        bar.set_margin(0, 0, 6, 6);
        bar
    }))?;

    let label_style =
        TextStyle::from(("sans-serif", 12).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom));
    chart.draw_series(discounts.iter().zip(&values).enumerate().map(|(i, (d, &v))| {
        let label = if d.mean_discount.is_nan() {
            "NaN".to_string()
        } else {
            format!("{:.2}", d.mean_discount)
        };
        Text::new(label, (SegmentValue::CenterOf(i as i32), v), label_style.clone())
    }))?;

    root.present()?;
    Ok(())
}
