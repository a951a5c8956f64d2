//! Cursor motions
//!
//! Horizontal motion forgets the preferred column; vertical motion
//! keeps aiming at it, landing before any tab or wide character that
//! straddles it.

use crate::buffer::Buffer;
use crate::uchar::{self, Uchar};
use crate::view::View;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharType {
    Space,
    Newline,
    Word,
    Other,
}

fn char_type(u: Uchar) -> CharType {
    if u == Uchar::from(b'\n') {
        CharType::Newline
    } else if uchar::is_space(u) {
        CharType::Space
    } else if uchar::is_word_byte(u) {
        CharType::Word
    } else {
        CharType::Other
    }
}

pub fn move_cursor_left(buffer: &Buffer, view: &mut View) {
    let mut it = buffer.iter(view.cursor);
    it.prev_char();
    view.cursor = it.pos();
    view.reset_preferred_x();
    view.update_cursor_y(buffer);
}

pub fn move_cursor_right(buffer: &Buffer, view: &mut View) {
    let mut it = buffer.iter(view.cursor);
    it.next_char();
    view.cursor = it.pos();
    view.reset_preferred_x();
    view.update_cursor_y(buffer);
}

pub fn move_bol(buffer: &Buffer, view: &mut View) {
    let mut it = buffer.iter(view.cursor);
    it.bol();
    view.cursor = it.pos();
    view.reset_preferred_x();
}

pub fn move_eol(buffer: &Buffer, view: &mut View) {
    let mut it = buffer.iter(view.cursor);
    it.eol();
    view.cursor = it.pos();
    view.reset_preferred_x();
}

pub fn move_bof(buffer: &Buffer, view: &mut View) {
    view.cursor = buffer.iter_bof().pos();
    view.cy = 0;
    view.reset_preferred_x();
}

pub fn move_eof(buffer: &Buffer, view: &mut View) {
    view.cursor = buffer.iter_at_offset(buffer.len()).pos();
    view.reset_preferred_x();
    view.update_cursor_y(buffer);
}

pub fn move_up(buffer: &Buffer, view: &mut View, count: usize) {
    let x = view.get_preferred_x(buffer);
    let mut it = buffer.iter(view.cursor);
    for _ in 0..count {
        if it.prev_line() == 0 {
            break;
        }
    }
    view.cursor = it.pos();
    move_to_preferred_x(buffer, view, x);
    view.update_cursor_y(buffer);
}

pub fn move_down(buffer: &Buffer, view: &mut View, count: usize) {
    let x = view.get_preferred_x(buffer);
    let mut it = buffer.iter(view.cursor);
    for _ in 0..count {
        if it.next_line() == 0 {
            break;
        }
    }
    view.cursor = it.pos();
    move_to_preferred_x(buffer, view, x);
    view.update_cursor_y(buffer);
}

/// Land on the current line as close to display column `x` as
/// possible, stopping before any character that straddles it
pub fn move_to_preferred_x(buffer: &Buffer, view: &mut View, x: usize) {
    view.set_preferred_x(x);
    let tw = buffer.options.tab_width;

    let mut it = buffer.iter(view.cursor);
    it.bol();
    let line = it.line_ref();

    let mut i = 0usize;
    let mut cur = 0usize;
    while cur < x && i < line.len() {
        let start = i;
        let u = uchar::get_char(line, &mut i);
        if u == Uchar::from(b'\t') {
            cur = (cur + tw) / tw * tw;
        } else {
            cur += uchar::char_width(u);
        }
        if cur > x {
            // the column falls inside this character; stay before it
            i = start;
            break;
        }
    }
    it.skip_bytes(i);
    view.cursor = it.pos();
}

/// Go to a 1-based line number; requests view centering
pub fn move_to_line(buffer: &Buffer, view: &mut View, line: usize) {
    let mut it = buffer.iter_bof();
    for _ in 1..line {
        if it.next_line() == 0 {
            break;
        }
    }
    view.cursor = it.pos();
    view.center_on_scroll = true;
    view.update_cursor_y(buffer);
}

/// Go to a 1-based column on the current line, stopping at the newline
pub fn move_to_column(buffer: &Buffer, view: &mut View, column: usize) {
    let mut it = buffer.iter(view.cursor);
    it.bol();
    for _ in 1..column {
        match it.next_char() {
            None => break,
            Some((u, _)) => {
                if u == Uchar::from(b'\n') {
                    it.prev_char();
                    break;
                }
            }
        }
    }
    view.cursor = it.pos();
    view.reset_preferred_x();
}

/// Move to the start of the next word. Returns bytes moved.
///
/// With `skip_non_word`, punctuation runs do not count as words.
pub fn word_fwd(buffer: &Buffer, view: &mut View, skip_non_word: bool) -> usize {
    let mut it = buffer.iter(view.cursor);
    let mut count = 0usize;
    loop {
        count += skip_fwd_type(&mut it, CharType::Space);
        let Some((u, _)) = peek_char(&it) else {
            break;
        };
        let t = char_type(u);

        if count > 0 && (!skip_non_word || t == CharType::Word || t == CharType::Newline) {
            break;
        }
        count += skip_fwd_type(&mut it, t);
    }
    view.cursor = it.pos();
    view.reset_preferred_x();
    view.update_cursor_y(buffer);
    count
}

/// Move to the start of the previous word. Returns bytes moved.
pub fn word_bwd(buffer: &Buffer, view: &mut View, skip_non_word: bool) -> usize {
    let mut it = buffer.iter(view.cursor);
    let mut count = 0usize;
    loop {
        count += skip_bwd_type(&mut it, CharType::Space);
        let Some((u, n)) = it.prev_char() else {
            break;
        };
        let t = char_type(u);
        count += n;
        count += skip_bwd_type(&mut it, t);
        if !skip_non_word || t == CharType::Word || t == CharType::Newline {
            break;
        }
    }
    view.cursor = it.pos();
    view.reset_preferred_x();
    view.update_cursor_y(buffer);
    count
}

fn peek_char(it: &crate::buffer::iter::BlockIter<'_>) -> Option<(Uchar, usize)> {
    let mut tmp = *it;
    tmp.next_char()
}

fn skip_fwd_type(it: &mut crate::buffer::iter::BlockIter<'_>, t: CharType) -> usize {
    let mut count = 0;
    while let Some((u, n)) = it.next_char() {
        if char_type(u) != t {
            it.prev_char();
            break;
        }
        count += n;
    }
    count
}

fn skip_bwd_type(it: &mut crate::buffer::iter::BlockIter<'_>, t: CharType) -> usize {
    let mut count = 0;
    while let Some((u, n)) = it.prev_char() {
        if char_type(u) != t {
            it.next_char();
            break;
        }
        count += n;
    }
    count
}
