//! Color system
//! Terminal colors, highlight styles, and the named style registry the
//! syntax engine resolves emit names against.

use crossterm::style::Color as CrosstermColor;

/// Color representation wrapping crossterm's Color enum
/// Supports 16 colors, 256 colors, and RGB colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    /// Terminal default
    #[default]
    Default,
    Black,
    DarkGrey,
    Red,
    DarkRed,
    Green,
    DarkGreen,
    Yellow,
    DarkYellow,
    Blue,
    DarkBlue,
    Magenta,
    DarkMagenta,
    Cyan,
    DarkCyan,
    White,
    Grey,
    /// 256-color palette (0-255)
    Ansi256(u8),
    /// RGB color (r, g, b) where each component is 0-255
    Rgb { r: u8, g: u8, b: u8 },
}

impl Color {
    /// Convert to crossterm Color
    #[must_use]
    pub fn to_crossterm(self) -> CrosstermColor {
        match self {
            Color::Default => CrosstermColor::Reset,
            Color::Black => CrosstermColor::Black,
            Color::DarkGrey => CrosstermColor::DarkGrey,
            Color::Red => CrosstermColor::Red,
            Color::DarkRed => CrosstermColor::DarkRed,
            Color::Green => CrosstermColor::Green,
            Color::DarkGreen => CrosstermColor::DarkGreen,
            Color::Yellow => CrosstermColor::Yellow,
            Color::DarkYellow => CrosstermColor::DarkYellow,
            Color::Blue => CrosstermColor::Blue,
            Color::DarkBlue => CrosstermColor::DarkBlue,
            Color::Magenta => CrosstermColor::Magenta,
            Color::DarkMagenta => CrosstermColor::DarkMagenta,
            Color::Cyan => CrosstermColor::Cyan,
            Color::DarkCyan => CrosstermColor::DarkCyan,
            Color::White => CrosstermColor::White,
            Color::Grey => CrosstermColor::Grey,
            Color::Ansi256(n) => CrosstermColor::AnsiValue(n),
            Color::Rgb { r, g, b } => CrosstermColor::Rgb { r, g, b },
        }
    }
}

/// Text attributes of a highlight style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attrs {
    pub bold: bool,
    pub underline: bool,
    pub reverse: bool,
}

/// A resolved highlight style: the color triple handed to the display sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HlColor {
    pub fg: Color,
    pub bg: Color,
    pub attrs: Attrs,
}

impl HlColor {
    #[must_use]
    pub fn fg(fg: Color) -> Self {
        Self {
            fg,
            ..Self::default()
        }
    }
}

/// Index into a [`ColorScheme`]'s entries; this is what painting emits
/// per byte
pub type ColorId = u32;

/// Named style registry.
///
/// Syntax emit names are dot-qualified before lookup: emit `string`
/// inside syntax `c` resolves as `c.string`.
#[derive(Debug, Clone, Default)]
pub struct ColorScheme {
    entries: Vec<(String, HlColor)>,
}

impl ColorScheme {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a named style, returning its id
    pub fn set(&mut self, name: impl Into<String>, color: HlColor) -> ColorId {
        let name = name.into();
        if let Some(idx) = self.entries.iter().position(|(n, _)| *n == name) {
            self.entries[idx].1 = color;
            return idx as ColorId;
        }
        self.entries.push((name, color));
        (self.entries.len() - 1) as ColorId
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<ColorId> {
        self.entries
            .iter()
            .position(|(n, _)| n == name)
            .map(|i| i as ColorId)
    }

    #[must_use]
    pub fn get(&self, id: ColorId) -> &HlColor {
        &self.entries[id as usize].1
    }

    #[must_use]
    pub fn name(&self, id: ColorId) -> &str {
        &self.entries[id as usize].0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_find() {
        let mut scheme = ColorScheme::new();
        let id = scheme.set("c.string", HlColor::fg(Color::Green));
        assert_eq!(scheme.find("c.string"), Some(id));
        assert_eq!(scheme.get(id).fg, Color::Green);
        assert_eq!(scheme.find("c.comment"), None);
    }

    #[test]
    fn test_replace_keeps_id() {
        let mut scheme = ColorScheme::new();
        let id = scheme.set("c.keyword", HlColor::fg(Color::Yellow));
        let id2 = scheme.set("c.keyword", HlColor::fg(Color::Blue));
        assert_eq!(id, id2);
        assert_eq!(scheme.get(id).fg, Color::Blue);
    }

    #[test]
    fn test_crossterm_mapping() {
        assert_eq!(Color::Default.to_crossterm(), CrosstermColor::Reset);
        assert_eq!(
            Color::Ansi256(117).to_crossterm(),
            CrosstermColor::AnsiValue(117)
        );
    }
}
