//! Tests for the syntax data model: character sets, word lists,
//! subsyntax inlining and color resolution

use crate::color::{Color, ColorScheme, HlColor};
use crate::syntax::parse::load_syntax_str;
use crate::syntax::{BitSet256, Destination, StringList, SyntaxSet};

#[test]
fn test_bitset_pattern_ranges() {
    let set = BitSet256::from_pattern(b"a-cx_");
    assert!(set.contains(b'a'));
    assert!(set.contains(b'b'));
    assert!(set.contains(b'c'));
    assert!(set.contains(b'x'));
    assert!(set.contains(b'_'));
    assert!(!set.contains(b'd'));
    assert!(!set.contains(b'A'));
}

#[test]
fn test_bitset_invert() {
    let mut set = BitSet256::from_pattern(b"q");
    set.invert();
    assert!(!set.contains(b'q'));
    assert!(set.contains(b'a'));
    assert!(set.contains(0xff));
}

#[test]
fn test_bitset_trailing_dash_is_literal() {
    let set = BitSet256::from_pattern(b"a-");
    assert!(set.contains(b'a'));
    assert!(set.contains(b'-'));
    assert!(!set.contains(b'b'));
}

#[test]
fn test_string_list_lookup() {
    let mut list = StringList::default();
    list.define(false, vec![b"int".to_vec(), b"char".to_vec()]);
    assert!(list.contains(b"int"));
    assert!(!list.contains(b"Int"));
    assert!(list.contains_hashed(b"char"));
    assert!(!list.contains_hashed(b"void"));
}

#[test]
fn test_string_list_icase() {
    let mut list = StringList::default();
    list.define(true, vec![b"begin".to_vec()]);
    assert!(list.contains(b"BEGIN"));
    assert!(list.contains_hashed(b"Begin"));
}

#[test]
fn test_subsyntax_inlined_by_copy() {
    let src = r#"
syntax .sub
state s1 sub
  char x END
  eat s1

syntax main
state start code
  char a .sub:after
  eat start
state after after
  eat after
"#;
    let mut set = SyntaxSet::new();
    let id = load_syntax_str(&mut set, "test", src).expect("loads");
    let syn = set.syntax(id);
    assert_eq!(syn.name, "main");

    // start, after, plus the copied subsyntax state
    assert_eq!(syn.states.len(), 3);
    let copy = &syn.states[2];
    assert!(copy.name.ends_with("-s1"));
    assert!(copy.copied);

    // the copy's END destination was rewritten to the return state
    let after = syn.find_state("after").unwrap();
    assert_eq!(copy.conds[0].action.dest, Some(Destination::State(after)));

    // the caller's condition enters the copy
    let start = &syn.states[0];
    assert_eq!(start.conds[0].action.dest, Some(Destination::State(2)));

    // referencing END made .sub a subsyntax; main stayed a main syntax
    let sub = set.find_any(".sub").unwrap();
    assert!(set.syntax(sub).subsyntax);
    assert!(!syn.subsyntax);
    assert_eq!(set.find(".sub"), None);
}

#[test]
fn test_color_resolution_dot_qualified() {
    let src = "
syntax t
state a str
  eat a
";
    let mut set = SyntaxSet::new();
    let id = load_syntax_str(&mut set, "test", src).expect("loads");
    let mut scheme = ColorScheme::new();
    let cid = scheme.set("t.str", HlColor::fg(Color::Green));
    set.update_colors(&scheme);

    // the eat action has no emit name; the destination's emit is used
    assert_eq!(set.syntax(id).states[0].action.emit_color, Some(cid));
}

#[test]
fn test_color_resolution_default_alias() {
    let src = "
syntax t
state a kw
  eat a
default keyword kw
";
    let mut set = SyntaxSet::new();
    let id = load_syntax_str(&mut set, "test", src).expect("loads");
    let mut scheme = ColorScheme::new();
    let cid = scheme.set("t.keyword", HlColor::fg(Color::Yellow));
    set.update_colors(&scheme);

    assert_eq!(set.syntax(id).states[0].action.emit_color, Some(cid));
}

#[test]
fn test_color_resolution_unknown_stays_unset() {
    let src = "
syntax t
state a mystery
  eat a
";
    let mut set = SyntaxSet::new();
    let id = load_syntax_str(&mut set, "test", src).expect("loads");
    set.update_colors(&ColorScheme::new());
    assert_eq!(set.syntax(id).states[0].action.emit_color, None);
}
