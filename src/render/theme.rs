//! Resolved styling handed to every chart.

use crate::config::{FontConfig, StyleConfig};
use plotters::style::{FontDesc, FontFamily, FontStyle, RGBColor, TextStyle};

/// Used when a configured color cannot be parsed.
pub const FALLBACK_COLOR: RGBColor = RGBColor(0x88, 0x88, 0x88);

/// Generic family used when none of the configured families is installed.
const FALLBACK_FAMILY: &str = "sans-serif";

/// Parses `#RRGGBB`, `#RGB` or one of a few color names.
pub fn parse_color(value: &str) -> Option<RGBColor> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        let digits: Vec<u8> = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<_>>()?;
        return match digits.as_slice() {
            [r, g, b] => Some(RGBColor(r * 17, g * 17, b * 17)),
            [r1, r2, g1, g2, b1, b2] => {
                Some(RGBColor(r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2))
            }
            _ => None,
        };
    }

    let color = match value.to_ascii_lowercase().as_str() {
        "black" => RGBColor(0, 0, 0),
        "white" => RGBColor(255, 255, 255),
        "gray" | "grey" => RGBColor(128, 128, 128),
        "lightgray" | "lightgrey" => RGBColor(211, 211, 211),
        "darkgray" | "darkgrey" => RGBColor(169, 169, 169),
        "red" => RGBColor(255, 0, 0),
        "green" => RGBColor(0, 128, 0),
        "blue" => RGBColor(0, 0, 255),
        "yellow" => RGBColor(255, 255, 0),
        "orange" => RGBColor(255, 165, 0),
        _ => return None,
    };
    Some(color)
}

fn color_or_fallback(value: &str) -> RGBColor {
    parse_color(value).unwrap_or(FALLBACK_COLOR)
}

/// First family of a comma separated list that has a usable font face.
fn resolve_family(list: &str) -> String {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .find(|name| {
            FontDesc::new(FontFamily::from(*name), 12.0, FontStyle::Normal)
                .box_size("M")
                .is_ok()
        })
        .unwrap_or(FALLBACK_FAMILY)
        .to_string()
}

/// A font for one text role, with sizes already converted to pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub family: String,
    pub size_px: f64,
    pub bold: bool,
    pub italic: bool,
    pub color: RGBColor,
}

impl Font {
    fn from_config(config: &FontConfig, px_per_pt: f64, text_color: RGBColor) -> Self {
        Self {
            family: resolve_family(&config.family),
            size_px: config.size * px_per_pt,
            bold: config.bold,
            italic: config.italic,
            color: config
                .color
                .as_deref()
                .map_or(text_color, color_or_fallback),
        }
    }

    pub fn style(&self) -> TextStyle<'_> {
        let slant = if self.bold {
            FontStyle::Bold
        } else if self.italic {
            FontStyle::Italic
        } else {
            FontStyle::Normal
        };
        FontDesc::new(FontFamily::from(self.family.as_str()), self.size_px, slant)
            .color(&self.color)
    }
}

/// Immutable theme handed to every chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub width_px: u32,
    pub height_px: u32,
    pub line_width_px: f64,
    pub headline: Font,
    pub description: Font,
    pub footnote: Font,
    pub text_color: RGBColor,
    pub background: RGBColor,
    pub grid_color: RGBColor,
    pub palette: Vec<RGBColor>,
}

impl Theme {
    /// Palette color for the `index`-th series; colors repeat once exhausted.
    pub fn color(&self, index: usize) -> RGBColor {
        if self.palette.is_empty() {
            return FALLBACK_COLOR;
        }
        self.palette[index % self.palette.len()]
    }

    /// Last palette color, used for aggregate series.
    pub fn accent(&self) -> RGBColor {
        self.palette.last().copied().unwrap_or(FALLBACK_COLOR)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width_px, self.height_px)
    }

    /// Stroke width in whole pixels, as the backends take it.
    pub fn stroke(&self, factor: f64) -> u32 {
        (self.line_width_px * factor).round().max(1.0) as u32
    }
}

impl From<&StyleConfig> for Theme {
    fn from(style: &StyleConfig) -> Self {
        let px_per_pt = style.dpi / 72.0;
        let text_color = color_or_fallback(&style.text_color);
        Self {
            width_px: (style.width * style.dpi).round() as u32,
            height_px: (style.height * style.dpi).round() as u32,
            line_width_px: style.line_width * px_per_pt,
            headline: Font::from_config(&style.headline_font, px_per_pt, text_color),
            description: Font::from_config(&style.description_font, px_per_pt, text_color),
            footnote: Font::from_config(&style.footnote_font, px_per_pt, text_color),
            text_color,
            background: color_or_fallback(&style.background_color),
            grid_color: RGBColor(0x44, 0x44, 0x44),
            palette: style.palette.iter().map(|c| color_or_fallback(c)).collect(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::from(&StyleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_from_default_style() {
        let theme = Theme::default();
        assert_eq!(theme.size(), (2700, 1700));
        assert!(theme.headline.bold);
        assert_eq!(theme.headline.color, RGBColor(255, 255, 255));
        assert_eq!(theme.footnote.color, RGBColor(128, 128, 128));
        assert!((theme.description.size_px - 30.0 * 100.0 / 72.0).abs() < 1e-9);
    }

    #[test]
    fn test_palette_is_cyclic() {
        let theme = Theme::default();
        assert_eq!(theme.color(0), RGBColor(0xFE, 0xED, 0x00));
        assert_eq!(theme.color(3), RGBColor(0xFE, 0xED, 0x00));
        assert_eq!(theme.color(4), RGBColor(0xFF, 0xB3, 0x0D));
        assert_eq!(theme.accent(), RGBColor(0xB9, 0xE3, 0xF9));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#fff"), Some(RGBColor(255, 255, 255)));
        assert_eq!(parse_color(" #0a0B0c "), Some(RGBColor(10, 11, 12)));
        assert_eq!(parse_color("Grey"), Some(RGBColor(128, 128, 128)));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#gg0000"), None);
        assert_eq!(parse_color("teal-ish"), None);
    }

    #[test]
    fn test_stroke_is_at_least_one_pixel() {
        let mut theme = Theme::default();
        theme.line_width_px = 0.2;
        assert_eq!(theme.stroke(1.0), 1);
        theme.line_width_px = 5.9;
        assert_eq!(theme.stroke(2.0), 12);
    }
}
