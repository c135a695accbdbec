use plotters::style::RGBColor;

/// ColorBrewer YlGnBu, light to dark
const YLGNBU: [(u8, u8, u8); 9] = [
    (0xff, 0xff, 0xd9),
    (0xed, 0xf8, 0xb1),
    (0xc7, 0xe9, 0xb4),
    (0x7f, 0xcd, 0xbb),
    (0x41, 0xb6, 0xc4),
    (0x1d, 0x91, 0xc0),
    (0x22, 0x5e, 0xa8),
    (0x25, 0x34, 0x94),
    (0x08, 0x1d, 0x58),
];

pub const BAR_COLOR: RGBColor = RGBColor(0x63, 0x6e, 0xfa);

/// Continuous yellow-green-blue scale; `t` is clamped to [0, 1] (NaN maps to 0)
pub fn ylgnbu(t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (YLGNBU.len() - 1) as f64;
    let lo = scaled.floor() as usize;
    let hi = (lo + 1).min(YLGNBU.len() - 1);
    let frac = scaled - lo as f64;

    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (a, b) = (YLGNBU[lo], YLGNBU[hi]);
    RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

/// Position of `value` inside `[min, max]`, 0.5 for a degenerate range
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max > min {
        (value - min) / (max - min)
    } else {
        0.5
    }
}

/// Whether dark text stays readable on `color`
pub fn is_light(color: RGBColor) -> bool {
    let RGBColor(r, g, b) = color;
    0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64 > 150.0
}
