//! Colormap names and legend color ramps.
//!
//! A colormap name like `RdBu_r` has two consumers with different contracts:
//! the remote tile service receives the name verbatim (it interprets the
//! `_r` suffix itself), while the local legend strips the suffix, looks up
//! the base ramp and reverses the sampling direction. The two representations
//! are deliberately kept separate.

use serde::{Deserialize, Serialize};

/// Suffix marking a reversed color ramp.
const REVERSAL_SUFFIX: &str = "_r";

/// A parsed colormap name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colormap {
    name: String,
}

impl Colormap {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The name as sent to the tile service, suffix and all.
    pub fn query_name(&self) -> &str {
        &self.name
    }

    /// The base ramp name with any reversal suffix stripped.
    pub fn base_name(&self) -> &str {
        self.name
            .strip_suffix(REVERSAL_SUFFIX)
            .unwrap_or(&self.name)
    }

    /// Whether the legend ramp should run in reverse.
    pub fn is_reversed(&self) -> bool {
        self.name.ends_with(REVERSAL_SUFFIX)
    }

    /// Build the legend ramp for this colormap.
    pub fn legend_ramp(&self) -> LegendRamp {
        LegendRamp::new(ramp_stops(self.base_name()), self.is_reversed())
    }
}

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear interpolation between two colors.
    pub fn lerp(&self, other: &Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let lerp_u8 =
            |a: u8, b: u8| -> u8 { ((a as f64) * (1.0 - t) + (b as f64) * t).round() as u8 };
        Rgb {
            r: lerp_u8(self.r, other.r),
            g: lerp_u8(self.g, other.g),
            b: lerp_u8(self.b, other.b),
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A legend color ramp: evenly spaced stops sampled over [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct LegendRamp {
    stops: Vec<Rgb>,
    reversed: bool,
}

impl LegendRamp {
    pub fn new(stops: Vec<Rgb>, reversed: bool) -> Self {
        debug_assert!(stops.len() >= 2, "a ramp needs at least 2 stops");
        Self { stops, reversed }
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Sample the ramp at normalized position `t` in [0, 1].
    pub fn sample(&self, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let t = if self.reversed { 1.0 - t } else { t };

        let segments = (self.stops.len() - 1) as f64;
        let position = t * segments;
        let index = (position.floor() as usize).min(self.stops.len() - 2);
        let local = position - index as f64;
        self.stops[index].lerp(&self.stops[index + 1], local)
    }
}

/// Color stops for a base ramp name (case-insensitive).
///
/// Covers the colormaps the dashboard's metric catalog actually uses, with
/// `inferno` as the fallback for anything unknown.
fn ramp_stops(base_name: &str) -> Vec<Rgb> {
    match base_name.to_lowercase().as_str() {
        "rdbu" => vec![
            Rgb::new(0x67, 0x00, 0x1f),
            Rgb::new(0xd6, 0x60, 0x4d),
            Rgb::new(0xf7, 0xf7, 0xf7),
            Rgb::new(0x43, 0x93, 0xc3),
            Rgb::new(0x05, 0x30, 0x61),
        ],
        "brbg" => vec![
            Rgb::new(0x54, 0x30, 0x05),
            Rgb::new(0xbf, 0x81, 0x2d),
            Rgb::new(0xf5, 0xf5, 0xf5),
            Rgb::new(0x35, 0x97, 0x8f),
            Rgb::new(0x00, 0x3c, 0x30),
        ],
        "puor" => vec![
            Rgb::new(0x7f, 0x3b, 0x08),
            Rgb::new(0xe0, 0x82, 0x14),
            Rgb::new(0xf7, 0xf7, 0xf7),
            Rgb::new(0x80, 0x73, 0xac),
            Rgb::new(0x2d, 0x00, 0x4b),
        ],
        "pubugn" => vec![
            Rgb::new(0xff, 0xf7, 0xfb),
            Rgb::new(0xd0, 0xd1, 0xe6),
            Rgb::new(0x67, 0xa9, 0xcf),
            Rgb::new(0x02, 0x81, 0x8a),
            Rgb::new(0x01, 0x46, 0x36),
        ],
        "gist_heat" => vec![
            Rgb::new(0xff, 0xff, 0xff),
            Rgb::new(0xff, 0xff, 0x00),
            Rgb::new(0xff, 0x40, 0x00),
            Rgb::new(0x80, 0x00, 0x00),
            Rgb::new(0x00, 0x00, 0x00),
        ],
        other => {
            tracing::warn!(colormap = other, "Unknown colormap, falling back to inferno");
            vec![
                Rgb::new(0x00, 0x00, 0x04),
                Rgb::new(0x78, 0x1c, 0x6d),
                Rgb::new(0xed, 0x69, 0x25),
                Rgb::new(0xfc, 0xff, 0xa4),
            ]
        }
    }
}

/// Value axis of a legend: rescale bounds plus tick labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendScale {
    pub min: f64,
    pub max: f64,
}

impl LegendScale {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Normalize a value into ramp position [0, 1], clamping out-of-range.
    pub fn normalize(&self, value: f64) -> f64 {
        if self.max <= self.min {
            return 0.0;
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    /// Tick values and labels. The rescale bounds are clamps, so the edge
    /// ticks read "Below <min>" and "Above <max>".
    pub fn ticks(&self, interior: usize) -> Vec<(f64, String)> {
        let mut ticks = Vec::with_capacity(interior + 2);
        ticks.push((self.min, format!("Below {}", trim_float(self.min))));
        for i in 1..=interior {
            let value = self.min + (self.max - self.min) * (i as f64) / ((interior + 1) as f64);
            ticks.push((value, trim_float(value)));
        }
        ticks.push((self.max, format!("Above {}", trim_float(self.max))));
        ticks
    }
}

fn trim_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_split() {
        let cm = Colormap::new("RdBu_r");
        assert_eq!(cm.query_name(), "RdBu_r");
        assert_eq!(cm.base_name(), "RdBu");
        assert!(cm.is_reversed());

        let plain = Colormap::new("BrBG");
        assert_eq!(plain.query_name(), "BrBG");
        assert_eq!(plain.base_name(), "BrBG");
        assert!(!plain.is_reversed());
    }

    #[test]
    fn test_reversed_ramp_mirrors_forward_ramp() {
        let forward = Colormap::new("RdBu").legend_ramp();
        let reversed = Colormap::new("RdBu_r").legend_ramp();

        assert_eq!(forward.sample(0.0), reversed.sample(1.0));
        assert_eq!(forward.sample(1.0), reversed.sample(0.0));
        assert_eq!(forward.sample(0.25), reversed.sample(0.75));
    }

    #[test]
    fn test_sample_endpoints_hit_stops() {
        let ramp = Colormap::new("PuBuGn").legend_ramp();
        assert_eq!(ramp.sample(0.0), Rgb::new(0xff, 0xf7, 0xfb));
        assert_eq!(ramp.sample(1.0), Rgb::new(0x01, 0x46, 0x36));
    }

    #[test]
    fn test_midpoint_of_diverging_ramp_is_neutral() {
        let ramp = Colormap::new("RdBu").legend_ramp();
        assert_eq!(ramp.sample(0.5), Rgb::new(0xf7, 0xf7, 0xf7));
    }

    #[test]
    fn test_unknown_colormap_falls_back() {
        let ramp = Colormap::new("NotARamp").legend_ramp();
        assert_eq!(ramp.sample(0.0), Rgb::new(0x00, 0x00, 0x04));
    }

    #[test]
    fn test_scale_normalize_clamps() {
        let scale = LegendScale::new(-30.0, 30.0);
        assert_eq!(scale.normalize(0.0), 0.5);
        assert_eq!(scale.normalize(-100.0), 0.0);
        assert_eq!(scale.normalize(100.0), 1.0);
    }

    #[test]
    fn test_edge_ticks_are_labeled_below_above() {
        let scale = LegendScale::new(-30.0, 30.0);
        let ticks = scale.ticks(2);
        assert_eq!(ticks.first().unwrap().1, "Below -30");
        assert_eq!(ticks.last().unwrap().1, "Above 30");
        assert_eq!(ticks.len(), 4);
    }
}
