//! Squarified treemap: root → category → brand, area ∝ mean discount.

use std::path::Path;

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;

use crate::analysis::discounts::BrandDiscount;
use crate::render::RenderError;
use crate::render::palette::{is_light, normalize, ylgnbu};

pub const ROOT_LABEL: &str = "All categories";

const TITLE_HEIGHT: f64 = 40.0;
const HEADER_HEIGHT: f64 = 20.0;
const LEGEND_WIDTH: f64 = 90.0;
const MARGIN: f64 = 20.0;
const PAD: f64 = 2.0;

/// Axis-aligned rectangle in pixel space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Tile {
    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    fn inset(&self, pad: f64) -> Tile {
        Tile {
            x: self.x + pad,
            y: self.y + pad,
            w: (self.w - 2.0 * pad).max(0.0),
            h: (self.h - 2.0 * pad).max(0.0),
        }
    }

    /// Split off a strip of `height` at the top, returning the rest
    fn below_header(&self, height: f64) -> Tile {
        let height = height.min(self.h);
        Tile {
            x: self.x,
            y: self.y + height,
            w: self.w,
            h: self.h - height,
        }
    }

    fn corners(&self) -> [(i32, i32); 2] {
        [
            (self.x.round() as i32, self.y.round() as i32),
            ((self.x + self.w).round() as i32, (self.y + self.h).round() as i32),
        ]
    }
}

/// Lay `values` out inside `bounds` with the squarified algorithm
/// (Bruls, Huizing, van Wijk). Tiles come back in input order; non-positive
/// values get an empty tile at the origin of `bounds`.
pub fn squarify(values: &[f64], bounds: Tile) -> Vec<Tile> {
    let empty = Tile {
        w: 0.0,
        h: 0.0,
        ..bounds
    };
    let mut out = vec![empty; values.len()];

    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    if total <= 0.0 || bounds.area() <= 0.0 {
        return out;
    }

    let scale = bounds.area() / total;
    let mut order: Vec<usize> = (0..values.len()).filter(|&i| values[i] > 0.0).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    let areas: Vec<f64> = values.iter().map(|v| v.max(0.0) * scale).collect();

    let mut free = bounds;
    let mut row: Vec<usize> = Vec::new();
    let mut next = 0;

    while next < order.len() {
        let candidate = order[next];
        let side = free.w.min(free.h);

        let current = worst_ratio(row.iter().map(|&i| areas[i]), side);
        let extended = worst_ratio(
            row.iter().map(|&i| areas[i]).chain([areas[candidate]]),
            side,
        );

        if row.is_empty() || extended <= current {
            row.push(candidate);
            next += 1;
        } else {
            layout_row(&row, &areas, &mut free, &mut out);
            row.clear();
        }
    }
    if !row.is_empty() {
        layout_row(&row, &areas, &mut free, &mut out);
    }

    out
}

/// Largest aspect ratio in a row of `areas` laid along a side of length `side`
fn worst_ratio(areas: impl Iterator<Item = f64>, side: f64) -> f64 {
    let (sum, min, max) = areas.fold((0.0, f64::INFINITY, 0.0f64), |(s, lo, hi), a| {
        (s + a, lo.min(a), hi.max(a))
    });
    if sum <= 0.0 || side <= 0.0 {
        return f64::INFINITY;
    }
    let side2 = side * side;
    let sum2 = sum * sum;
    (side2 * max / sum2).max(sum2 / (side2 * min))
}

/// Place one row along the shorter side of `free` and shrink `free`
fn layout_row(row: &[usize], areas: &[f64], free: &mut Tile, out: &mut [Tile]) {
    let sum: f64 = row.iter().map(|&i| areas[i]).sum();

    if free.w >= free.h {
        // column on the left edge
        let width = if free.h > 0.0 { sum / free.h } else { 0.0 };
        let mut y = free.y;
        for &i in row {
            let h = if width > 0.0 { areas[i] / width } else { 0.0 };
            out[i] = Tile {
                x: free.x,
                y,
                w: width,
                h,
            };
            y += h;
        }
        free.x += width;
        free.w = (free.w - width).max(0.0);
    } else {
        // row along the top edge
        let height = if free.w > 0.0 { sum / free.w } else { 0.0 };
        let mut x = free.x;
        for &i in row {
            let w = if height > 0.0 { areas[i] / height } else { 0.0 };
            out[i] = Tile {
                x,
                y: free.y,
                w,
                h: height,
            };
            x += w;
        }
        free.y += height;
        free.h = (free.h - height).max(0.0);
    }
}

/// Brands of one category, in the order they appear in the input
#[derive(Debug)]
struct CategoryNode<'a> {
    name: &'a str,
    brands: Vec<&'a BrandDiscount>,
}

impl CategoryNode<'_> {
    fn total(&self) -> f64 {
        self.brands.iter().map(|b| b.mean_discount.max(0.0)).sum()
    }
}

fn group_by_category(pairs: &[BrandDiscount]) -> Vec<CategoryNode<'_>> {
    let mut nodes: Vec<CategoryNode<'_>> = Vec::new();
    for pair in pairs {
        match nodes.iter_mut().find(|n| n.name == pair.category) {
            Some(node) => node.brands.push(pair),
            None => nodes.push(CategoryNode {
                name: &pair.category,
                brands: vec![pair],
            }),
        }
    }
    nodes
}

/// Cut `text` to what roughly fits in `width` pixels at 12px
fn fit_label(text: &str, width: f64) -> Option<String> {
    let max_chars = (width / 7.0) as usize;
    if max_chars < 3 {
        return None;
    }
    if text.chars().count() <= max_chars {
        Some(text.to_string())
    } else {
        let cut: String = text.chars().take(max_chars - 1).collect();
        Some(format!("{cut}…"))
    }
}

pub fn render_treemap(
    pairs: &[BrandDiscount],
    path: &Path,
    size: (u32, u32),
) -> Result<(), RenderError> {
    if pairs.is_empty() {
        return Err(RenderError::Empty("treemap without discounted brands"));
    }

    let (min, max) = pairs
        .iter()
        .map(|p| p.mean_discount)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let (width, height) = (size.0 as f64, size.1 as f64);
    root.draw(&Text::new(
        "Mean discount by category and brand",
        (MARGIN as i32, (MARGIN / 2.0) as i32),
        ("sans-serif", 24).into_font(),
    ))?;

    let frame = Tile {
        x: MARGIN,
        y: MARGIN + TITLE_HEIGHT,
        w: (width - 2.0 * MARGIN - LEGEND_WIDTH).max(0.0),
        h: (height - 2.0 * MARGIN - TITLE_HEIGHT).max(0.0),
    };

    draw_header(&root, frame, ROOT_LABEL, &RGBColor(0xee, 0xee, 0xee))?;

    let categories = group_by_category(pairs);
    let totals: Vec<f64> = categories.iter().map(|c| c.total()).collect();
    let category_tiles = squarify(&totals, frame.below_header(HEADER_HEIGHT).inset(PAD));

    for (node, tile) in categories.iter().zip(&category_tiles) {
        if tile.area() <= 0.0 {
            continue;
        }
        draw_header(&root, *tile, node.name, &RGBColor(0xdd, 0xdd, 0xdd))?;

        let values: Vec<f64> = node.brands.iter().map(|b| b.mean_discount).collect();
        let brand_tiles = squarify(&values, tile.below_header(HEADER_HEIGHT).inset(PAD));

        for (brand, bt) in node.brands.iter().zip(&brand_tiles) {
            if bt.area() <= 0.0 {
                continue;
            }
            let color = ylgnbu(normalize(brand.mean_discount, min, max));
            root.draw(&Rectangle::new(bt.corners(), color.filled()))?;
            root.draw(&Rectangle::new(bt.corners(), WHITE.stroke_width(1)))?;

            if bt.h >= 30.0 {
                let text_color = if is_light(color) { BLACK } else { WHITE };
                let style = ("sans-serif", 12).into_font().color(&text_color);
                if let Some(label) = fit_label(&brand.brand, bt.w - 6.0) {
                    let at = ((bt.x + 3.0) as i32, (bt.y + 3.0) as i32);
                    root.draw(&Text::new(label, at, style.clone()))?;
                    let at = ((bt.x + 3.0) as i32, (bt.y + 17.0) as i32);
                    root.draw(&Text::new(format!("{:.2}", brand.mean_discount), at, style))?;
                }
            }
        }
    }

    draw_legend(&root, frame, min, max)?;
    root.present()?;
    Ok(())
}

fn draw_header<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    tile: Tile,
    label: &str,
    fill: &RGBColor,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.draw(&Rectangle::new(tile.corners(), fill.filled()))?;
    root.draw(&Rectangle::new(tile.corners(), BLACK.stroke_width(1)))?;
    if let Some(text) = fit_label(label, tile.w - 6.0) {
        if tile.h >= HEADER_HEIGHT {
            root.draw(&Text::new(
                text,
                ((tile.x + 3.0) as i32, (tile.y + 3.0) as i32),
                ("sans-serif", 13).into_font(),
            ))?;
        }
    }
    Ok(())
}

/// Vertical colour bar to the right of the frame
fn draw_legend<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    frame: Tile,
    min: f64,
    max: f64,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    const STEPS: usize = 50;
    let x = (frame.x + frame.w + 20.0) as i32;
    let bar_h = frame.h * 0.6;
    let step_h = bar_h / STEPS as f64;

    for s in 0..STEPS {
        let t = 1.0 - s as f64 / (STEPS - 1) as f64;
        let y0 = frame.y + s as f64 * step_h;
        root.draw(&Rectangle::new(
            [(x, y0 as i32), (x + 20, (y0 + step_h).ceil() as i32)],
            ylgnbu(t).filled(),
        ))?;
    }

    let style = ("sans-serif", 12).into_font();
    root.draw(&Text::new(
        format!("{max:.2}"),
        (x + 24, frame.y as i32),
        style.clone(),
    ))?;
    root.draw(&Text::new(
        format!("{min:.2}"),
        (x + 24, (frame.y + bar_h) as i32 - 12),
        style,
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn bounds() -> Tile {
        Tile {
            x: 10.0,
            y: 20.0,
            w: 600.0,
            h: 400.0,
        }
    }

    fn inside(inner: &Tile, outer: &Tile) -> bool {
        inner.x >= outer.x - EPS
            && inner.y >= outer.y - EPS
            && inner.x + inner.w <= outer.x + outer.w + EPS
            && inner.y + inner.h <= outer.y + outer.h + EPS
    }

    #[test]
    fn areas_are_proportional_and_tiles_stay_inside() {
        let values = [6.0, 6.0, 4.0, 3.0, 2.0, 2.0, 1.0];
        let b = bounds();
        let tiles = squarify(&values, b);
        let total: f64 = values.iter().sum();

        for (v, t) in values.iter().zip(&tiles) {
            assert!((t.area() - b.area() * v / total).abs() < 1e-6);
            assert!(inside(t, &b), "{t:?} escapes {b:?}");
        }
        let covered: f64 = tiles.iter().map(|t| t.area()).sum();
        assert!((covered - b.area()).abs() < 1e-6);
    }

    #[test]
    fn non_positive_values_get_empty_tiles() {
        let tiles = squarify(&[0.0, 5.0, -1.0], bounds());
        assert_eq!(tiles[0].area(), 0.0);
        assert_eq!(tiles[2].area(), 0.0);
        assert!((tiles[1].area() - bounds().area()).abs() < 1e-6);
    }

    #[test]
    fn tiles_do_not_overlap() {
        let tiles = squarify(&[5.0, 4.0, 3.0, 2.0, 1.0], bounds());
        for (i, a) in tiles.iter().enumerate() {
            for b in tiles.iter().skip(i + 1) {
                let overlap_w = (a.x + a.w).min(b.x + b.w) - a.x.max(b.x);
                let overlap_h = (a.y + a.h).min(b.y + b.h) - a.y.max(b.y);
                assert!(overlap_w <= EPS || overlap_h <= EPS);
            }
        }
    }

    #[test]
    fn labels_are_cut_to_width() {
        assert_eq!(fit_label("Soprole", 100.0).as_deref(), Some("Soprole"));
        assert_eq!(fit_label("Soprole", 35.0).as_deref(), Some("Sopr…"));
        assert_eq!(fit_label("Soprole", 10.0), None);
    }

    #[test]
    fn categories_keep_first_seen_order() {
        let pair = |c: &str, b: &str, v: f64| BrandDiscount {
            category: c.into(),
            brand: b.into(),
            rows: 1,
            mean_discount: v,
        };
        let pairs = vec![pair("a", "x", 1.0), pair("a", "y", 2.0), pair("b", "z", 4.0)];
        let nodes = group_by_category(&pairs);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].total(), 3.0);
        assert_eq!(nodes[1].name, "b");
    }

    #[test]
    fn renders_root_category_and_brand_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.svg");
        let pairs = vec![
            BrandDiscount {
                category: "lacteos".into(),
                brand: "Soprole".into(),
                rows: 4,
                mean_discount: 300.0,
            },
            BrandDiscount {
                category: "verduras".into(),
                brand: "Lider".into(),
                rows: 2,
                mean_discount: 120.0,
            },
        ];
        render_treemap(&pairs, &path, (1000, 700)).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains(ROOT_LABEL));
        assert!(svg.contains("lacteos"));
        assert!(svg.contains("Soprole"));
    }
}
