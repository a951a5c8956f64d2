//! Test utilities
//! Shared buffers, syntaxes and color schemes for unit tests

use std::sync::Arc;

use crate::buffer::Buffer;
use crate::color::{Color, ColorScheme, HlColor};
use crate::syntax::parse::load_syntax_str;
use crate::syntax::{SyntaxId, SyntaxSet};
use crate::view::View;

/// Buffer plus a fresh view with the cursor at BOF
pub fn buffer_with(text: &str) -> (Buffer, View) {
    let buffer = Buffer::from_bytes(text.as_bytes());
    let mut view = View::new();
    view.cursor = buffer.iter_bof().pos();
    (buffer, view)
}

/// Buffer content as a string
pub fn text(buffer: &Buffer) -> String {
    String::from_utf8(buffer.contents()).expect("buffer content is not UTF-8")
}

/// A small C-like syntax: identifiers with a keyword list, strings,
/// and non-nesting block comments
pub const C_LIKE: &str = r#"
syntax c

state code code
  char -b a-zA-Z_ ident
  str "/*" comment
  char \" string
  eat code

state comment comment
  str "*/" code comment
  eat comment

state string string
  char \" code string
  eat string

state ident ident
  char -b a-zA-Z0-9_ ident
  inlist keyword code
  noeat code

list keyword int char return if else while for
"#;

/// A shell-like syntax with `<<WORD` heredocs, plus its subsyntax
pub const SH_LIKE: &str = r#"
syntax .here

state content content
  heredocend END heredoc
  eat content

syntax sh

state start code
  str "<<" word
  eat start

state word redir
  char -b a-zA-Z0-9_ word
  heredocbegin .here start
"#;

pub fn c_scheme() -> ColorScheme {
    let mut scheme = ColorScheme::new();
    scheme.set("c.code", HlColor::fg(Color::Default));
    scheme.set("c.comment", HlColor::fg(Color::DarkGrey));
    scheme.set("c.string", HlColor::fg(Color::Green));
    scheme.set("c.ident", HlColor::fg(Color::White));
    scheme.set("c.keyword", HlColor::fg(Color::Yellow));
    scheme
}

pub fn sh_scheme() -> ColorScheme {
    let mut scheme = ColorScheme::new();
    scheme.set("sh.code", HlColor::fg(Color::Default));
    scheme.set("sh.word", HlColor::fg(Color::Cyan));
    scheme.set("sh.redir", HlColor::fg(Color::Magenta));
    scheme.set(".here.content", HlColor::fg(Color::Green));
    scheme.set(".here.heredoc", HlColor::fg(Color::Red));
    scheme
}

/// Load a syntax string into a fresh set with resolved colors
pub fn loaded_set(src: &str, scheme: &ColorScheme) -> (Arc<SyntaxSet>, SyntaxId) {
    let mut set = SyntaxSet::new();
    let id = load_syntax_str(&mut set, "test", src).expect("test syntax loads");
    set.update_colors(scheme);
    (Arc::new(set), id)
}

/// Buffer with the C-like syntax attached
pub fn c_buffer(src: &str) -> (Buffer, View) {
    let (mut buffer, view) = buffer_with(src);
    let (set, id) = loaded_set(C_LIKE, &c_scheme());
    buffer.attach_syntax(set, id);
    (buffer, view)
}
