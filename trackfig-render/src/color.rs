//! Colors and colormaps.
//!
//! Colors accept hex strings, matplotlib-style names and `(r, g, b[, a])`
//! tuples. Colormaps are piecewise-linear over color stops.

use crate::error::{RenderError, RenderResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity in [0, 1].
    pub a: f64,
}

pub const BLACK: Color = Color::rgb(0, 0, 0);
pub const WHITE: Color = Color::rgb(255, 255, 255);

const NAMED: &[(&str, &str)] = &[
    ("b", "#0000ff"),
    ("g", "#008000"),
    ("r", "#ff0000"),
    ("c", "#00bfbf"),
    ("m", "#bf00bf"),
    ("y", "#bfbf00"),
    ("k", "#000000"),
    ("w", "#ffffff"),
    ("black", "#000000"),
    ("white", "#ffffff"),
    ("red", "#ff0000"),
    ("green", "#008000"),
    ("blue", "#0000ff"),
    ("grey", "#808080"),
    ("gray", "#808080"),
    ("lightgrey", "#d3d3d3"),
    ("lightgray", "#d3d3d3"),
    ("darkgrey", "#a9a9a9"),
    ("darkgray", "#a9a9a9"),
    ("dimgrey", "#696969"),
    ("dimgray", "#696969"),
    ("silver", "#c0c0c0"),
    ("orange", "#ffa500"),
    ("darkorange", "#ff8c00"),
    ("purple", "#800080"),
    ("brown", "#a52a2a"),
    ("pink", "#ffc0cb"),
    ("yellow", "#ffff00"),
    ("gold", "#ffd700"),
    ("cyan", "#00ffff"),
    ("magenta", "#ff00ff"),
    ("navy", "#000080"),
    ("teal", "#008080"),
    ("olive", "#808000"),
    ("maroon", "#800000"),
    ("lime", "#00ff00"),
    ("darkblue", "#00008b"),
    ("darkred", "#8b0000"),
    ("darkgreen", "#006400"),
    ("lightblue", "#add8e6"),
    ("lightgreen", "#90ee90"),
    ("skyblue", "#87ceeb"),
    ("steelblue", "#4682b4"),
    ("royalblue", "#4169e1"),
    ("salmon", "#fa8072"),
    ("coral", "#ff7f50"),
    ("tomato", "#ff6347"),
    ("crimson", "#dc143c"),
    ("indigo", "#4b0082"),
    ("violet", "#ee82ee"),
    ("orchid", "#da70d6"),
    ("turquoise", "#40e0d0"),
    ("tan", "#d2b48c"),
    ("khaki", "#f0e68c"),
    ("beige", "#f5f5dc"),
    ("chocolate", "#d2691e"),
    ("sienna", "#a0522d"),
    ("forestgreen", "#228b22"),
    ("seagreen", "#2e8b57"),
    ("tab:blue", "#1f77b4"),
    ("tab:orange", "#ff7f0e"),
    ("tab:green", "#2ca02c"),
    ("tab:red", "#d62728"),
    ("tab:purple", "#9467bd"),
    ("tab:brown", "#8c564b"),
    ("tab:pink", "#e377c2"),
    ("tab:gray", "#7f7f7f"),
    ("tab:grey", "#7f7f7f"),
    ("tab:olive", "#bcbd22"),
    ("tab:cyan", "#17becf"),
];

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a: a.clamp(0.0, 1.0), ..self }
    }

    pub fn parse(text: &str) -> RenderResult<Self> {
        let text = text.trim().trim_matches(['\'', '"']);
        let invalid = || RenderError::Color(text.to_string());

        if text.eq_ignore_ascii_case("none") || text.eq_ignore_ascii_case("transparent") {
            return Ok(Self { a: 0.0, ..BLACK });
        }
        if let Some(hex) = text.strip_prefix('#') {
            return Self::from_hex(hex).ok_or_else(invalid);
        }
        if text.starts_with('(') {
            return Self::from_tuple(text).ok_or_else(invalid);
        }
        let lower = text.to_lowercase();
        NAMED
            .iter()
            .find(|(name, _)| *name == lower)
            .and_then(|(_, hex)| Self::from_hex(&hex[1..]))
            .ok_or_else(invalid)
    }

    fn from_hex(hex: &str) -> Option<Self> {
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let d: Vec<u8> = hex
                    .chars()
                    .map(|c| c.to_digit(16).map(|v| (v * 17) as u8))
                    .collect::<Option<_>>()?;
                Some(Self::rgb(d[0], d[1], d[2]))
            }
            6 | 8 => {
                let mut color = Self::rgb(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?);
                if hex.len() == 8 {
                    color.a = channel(&hex[6..8])? as f64 / 255.0;
                }
                Some(color)
            }
            _ => None,
        }
    }

    /// `(r, g, b)` or `(r, g, b, a)` in 0..1, or 0..255 when any channel exceeds 1.
    fn from_tuple(text: &str) -> Option<Self> {
        let inner = text.strip_prefix('(')?.strip_suffix(')')?;
        let values: Vec<f64> = inner
            .split(',')
            .map(|v| v.trim().parse::<f64>().ok())
            .collect::<Option<_>>()?;
        if values.len() != 3 && values.len() != 4 {
            return None;
        }
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return None;
        }
        let scale = if values[..3].iter().any(|v| *v > 1.0) { 1.0 } else { 255.0 };
        let channel = |v: f64| (v * scale).round().clamp(0.0, 255.0) as u8;
        let mut color = Self::rgb(channel(values[0]), channel(values[1]), channel(values[2]));
        if let Some(a) = values.get(3) {
            color.a = a.clamp(0.0, 1.0);
        }
        Some(color)
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn lerp(a: Color, b: Color, t: f64) -> Color {
        let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
        Color { r: mix(a.r, b.r), g: mix(a.g, b.g), b: mix(a.b, b.b), a: a.a + (b.a - a.a) * t }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    pub name: String,
    stops: Vec<(f64, Color)>,
}

fn evenly(hexes: &[&str]) -> Vec<(f64, Color)> {
    let n = hexes.len().max(2) - 1;
    hexes
        .iter()
        .enumerate()
        .filter_map(|(i, h)| Color::from_hex(&h[1..]).map(|c| (i as f64 / n as f64, c)))
        .collect()
}

fn builtin(name: &str) -> Option<Vec<(f64, Color)>> {
    let hexes: &[&str] = match name {
        "viridis" => &["#440154", "#482878", "#3e4989", "#31688e", "#26828e", "#1f9e89", "#35b779", "#6ece58", "#b5de2b", "#fde725"],
        "magma" => &["#000004", "#180f3d", "#440f76", "#721f81", "#9e2f7f", "#cd4071", "#f1605d", "#fd9668", "#feca8d", "#fcfdbf"],
        "inferno" => &["#000004", "#1b0c41", "#4a0c6b", "#781c6d", "#a52c60", "#cf4446", "#ed6925", "#fb9b06", "#f7d13d", "#fcffa4"],
        "plasma" => &["#0d0887", "#46039f", "#7201a8", "#9c179e", "#bd3786", "#d8576b", "#ed7953", "#fb9f3a", "#fdca26", "#f0f921"],
        "RdYlBu" => &["#a50026", "#d73027", "#f46d43", "#fdae61", "#fee090", "#ffffbf", "#e0f3f8", "#abd9e9", "#74add1", "#4575b4", "#313695"],
        "RdBu" => &["#67001f", "#b2182b", "#d6604d", "#f4a582", "#fddbc7", "#f7f7f7", "#d1e5f0", "#92c5de", "#4393c3", "#2166ac", "#053061"],
        "bwr" => &["#0000ff", "#ffffff", "#ff0000"],
        "coolwarm" => &["#3b4cc0", "#6788ee", "#9abbff", "#c9d7f0", "#edd1c2", "#f7a889", "#e26952", "#b40426"],
        "Reds" => &["#fff5f0", "#fee0d2", "#fcbba1", "#fc9272", "#fb6a4a", "#ef3b2c", "#cb181d", "#a50f15", "#67000d"],
        "Blues" => &["#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#08519c", "#08306b"],
        "Greens" => &["#f7fcf5", "#e5f5e0", "#c7e9c0", "#a1d99b", "#74c476", "#41ab5d", "#238b45", "#006d2c", "#00441b"],
        "Greys" => &["#ffffff", "#f0f0f0", "#d9d9d9", "#bdbdbd", "#969696", "#737373", "#525252", "#252525", "#000000"],
        "Oranges" => &["#fff5eb", "#fee6ce", "#fdd0a2", "#fdae6b", "#fd8d3c", "#f16913", "#d94801", "#a63603", "#7f2704"],
        "Purples" => &["#fcfbfd", "#efedf5", "#dadaeb", "#bcbddc", "#9e9ac8", "#807dba", "#6a51a3", "#54278f", "#3f007d"],
        "YlOrRd" => &["#ffffcc", "#ffeda0", "#fed976", "#feb24c", "#fd8d3c", "#fc4e2a", "#e31a1c", "#bd0026", "#800026"],
        "hot" => {
            return Some(vec![
                (0.0, Color::rgb(11, 0, 0)),
                (0.365, Color::rgb(255, 0, 0)),
                (0.746, Color::rgb(255, 255, 0)),
                (1.0, WHITE),
            ])
        }
        "jet" => {
            return Some(vec![
                (0.0, Color::rgb(0, 0, 127)),
                (0.125, Color::rgb(0, 0, 255)),
                (0.375, Color::rgb(0, 255, 255)),
                (0.625, Color::rgb(255, 255, 0)),
                (0.875, Color::rgb(255, 0, 0)),
                (1.0, Color::rgb(127, 0, 0)),
            ])
        }
        _ => return None,
    };
    Some(evenly(hexes))
}

impl Colormap {
    /// Built-in colormap by name; a `_r` suffix reverses it.
    pub fn by_name(name: &str) -> RenderResult<Self> {
        let name = name.trim();
        let (base, reversed) = match name.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (name, false),
        };
        let stops = builtin(base).ok_or_else(|| RenderError::Colormap(name.to_string()))?;
        let map = Self { name: name.to_string(), stops };
        Ok(if reversed { map.reversed() } else { map })
    }

    /// Evenly spaced colormap from a list such as `['white', (0.8, 0, 0), 'red']`.
    pub fn from_list(text: &str) -> RenderResult<Self> {
        let inner = text
            .trim()
            .strip_prefix('[')
            .and_then(|t| t.strip_suffix(']'))
            .ok_or_else(|| RenderError::Colormap(text.to_string()))?;
        let colors = split_top_level(inner)
            .into_iter()
            .filter(|item| !item.trim().is_empty())
            .map(Color::parse)
            .collect::<RenderResult<Vec<Color>>>()?;
        if colors.len() < 2 {
            return Err(RenderError::Colormap(text.to_string()));
        }
        let n = (colors.len() - 1) as f64;
        let stops = colors.into_iter().enumerate().map(|(i, c)| (i as f64 / n, c)).collect();
        Ok(Self { name: "custom".to_string(), stops })
    }

    /// A built-in name or a `[...]` list.
    pub fn parse(text: &str) -> RenderResult<Self> {
        if text.trim_start().starts_with('[') {
            Self::from_list(text)
        } else {
            Self::by_name(text)
        }
    }

    pub fn reversed(&self) -> Self {
        let stops = self.stops.iter().rev().map(|(t, c)| (1.0 - t, *c)).collect();
        Self { name: self.name.clone(), stops }
    }

    /// Color at `t`, clamped to [0, 1]. NaN maps to the low end.
    pub fn at(&self, t: f64) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        for pair in self.stops.windows(2) {
            let (t0, c0) = pair[0];
            let (t1, c1) = pair[1];
            if t <= t1 {
                let span = t1 - t0;
                let f = if span > 0.0 { (t - t0) / span } else { 0.0 };
                return Color::lerp(c0, c1, f);
            }
        }
        self.stops.last().map(|(_, c)| *c).unwrap_or(BLACK)
    }

    /// Color for `value` scaled linearly between `min` and `max`.
    pub fn map(&self, value: f64, min: f64, max: f64) -> Color {
        let span = max - min;
        if span <= 0.0 || !span.is_finite() {
            return self.at(1.0);
        }
        self.at((value - min) / span)
    }
}

/// Split on commas that are not inside parentheses.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Whether a property value names a colormap rather than a single color.
pub fn is_colormap_name(text: &str) -> bool {
    Colormap::parse(text).is_ok() && Color::parse(text).is_err()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(Color::parse("#ff0000").unwrap(), Color::rgb(255, 0, 0));
        assert_eq!(Color::parse("#0f0").unwrap(), Color::rgb(0, 255, 0));
        let c = Color::parse("#FF000080").unwrap();
        assert_eq!((c.r, c.a), (255, 128.0 / 255.0));
        assert!(Color::parse("#12345").is_err());
    }

    #[test]
    fn test_parse_names_and_tuples() {
        assert_eq!(Color::parse("Black").unwrap(), BLACK);
        assert_eq!(Color::parse("'grey'").unwrap().to_hex(), "#808080");
        assert_eq!(Color::parse("(1, 0, 0)").unwrap(), Color::rgb(255, 0, 0));
        assert_eq!(Color::parse("(0.8, 0, 0)").unwrap(), Color::rgb(204, 0, 0));
        assert_eq!(Color::parse("(51, 160, 44)").unwrap(), Color::rgb(51, 160, 44));
        assert!(Color::parse("(1, 2)").is_err());
        assert!(Color::parse("notacolor").is_err());
        assert_eq!(Color::parse("none").unwrap().a, 0.0);
    }

    #[test]
    fn test_colormap_endpoints() {
        let viridis = Colormap::by_name("viridis").unwrap();
        assert_eq!(viridis.at(0.0).to_hex(), "#440154");
        assert_eq!(viridis.at(1.0).to_hex(), "#fde725");
        assert_eq!(viridis.at(7.0).to_hex(), "#fde725");

        let reversed = Colormap::by_name("viridis_r").unwrap();
        assert_eq!(reversed.at(0.0).to_hex(), "#fde725");
        assert!(Colormap::by_name("nope").is_err());
    }

    #[test]
    fn test_colormap_interpolates() {
        let bwr = Colormap::by_name("bwr").unwrap();
        assert_eq!(bwr.at(0.5), WHITE);
        assert_eq!(bwr.at(0.25), Color::rgb(128, 128, 255));
        assert_eq!(bwr.map(5.0, 0.0, 10.0), WHITE);
    }

    #[test]
    fn test_custom_colormap() {
        let map = Colormap::parse("['white', (0.8, 0, 0), 'red']").unwrap();
        assert_eq!(map.at(0.0), WHITE);
        assert_eq!(map.at(0.5), Color::rgb(204, 0, 0));
        assert_eq!(map.at(1.0), Color::rgb(255, 0, 0));
        assert!(Colormap::parse("['white']").is_err());
    }

    #[test]
    fn test_is_colormap_name() {
        assert!(is_colormap_name("Reds"));
        assert!(is_colormap_name("RdYlBu_r"));
        assert!(!is_colormap_name("red"));
    }
}
