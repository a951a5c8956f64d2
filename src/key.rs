//! Key representation for editor input
//!
//! The embedding's input source delivers decoded key events in this
//! form; the conversion from crossterm events lives here so the rest of
//! the core never sees terminal details.

use crate::uchar::Uchar;

/// Non-character keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKey {
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    F(u8),
}

/// A decoded key event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// Plain character, including control characters (Enter is `\r`,
    /// Tab is `\t`, Backspace is 0x7f)
    Normal(Uchar),
    /// Alt/meta chord
    Meta(Uchar),
    /// Navigation and function keys
    Special(SpecialKey),
    /// Bracketed paste payload, inserted verbatim
    Paste(Vec<u8>),
}

impl Key {
    /// Convert a crossterm key event. Returns `None` for release events
    /// and chords the core has no representation for.
    #[must_use]
    pub fn from_crossterm(ev: &crossterm::event::KeyEvent) -> Option<Key> {
        use crossterm::event::{KeyCode, KeyEventKind, KeyModifiers};

        if ev.kind == KeyEventKind::Release {
            return None;
        }

        let alt = ev.modifiers.contains(KeyModifiers::ALT);
        let ctrl = ev.modifiers.contains(KeyModifiers::CONTROL);

        let ch: Uchar = match ev.code {
            KeyCode::Char(c) => {
                if ctrl {
                    // mask to the control range like a terminal would
                    (c.to_ascii_uppercase() as Uchar) & 0x1f
                } else {
                    c as Uchar
                }
            }
            KeyCode::Enter => Uchar::from(b'\r'),
            KeyCode::Tab => Uchar::from(b'\t'),
            KeyCode::Backspace => 0x7f,
            KeyCode::Esc => 0x1b,
            KeyCode::Insert => return Some(Key::Special(SpecialKey::Insert)),
            KeyCode::Delete => return Some(Key::Special(SpecialKey::Delete)),
            KeyCode::Home => return Some(Key::Special(SpecialKey::Home)),
            KeyCode::End => return Some(Key::Special(SpecialKey::End)),
            KeyCode::PageUp => return Some(Key::Special(SpecialKey::PageUp)),
            KeyCode::PageDown => return Some(Key::Special(SpecialKey::PageDown)),
            KeyCode::Left => return Some(Key::Special(SpecialKey::ArrowLeft)),
            KeyCode::Right => return Some(Key::Special(SpecialKey::ArrowRight)),
            KeyCode::Up => return Some(Key::Special(SpecialKey::ArrowUp)),
            KeyCode::Down => return Some(Key::Special(SpecialKey::ArrowDown)),
            KeyCode::F(n) => return Some(Key::Special(SpecialKey::F(n))),
            _ => return None,
        };

        if alt {
            Some(Key::Meta(ch))
        } else {
            Some(Key::Normal(ch))
        }
    }
}
