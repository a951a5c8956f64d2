//! Tests for editing operations, undo and redo

use crate::buffer::Buffer;
use crate::change::MergeTag;
use crate::edit::EditCtx;
use crate::error::ErrorKind;
use crate::test_utils::{buffer_with, text};
use crate::view::{SelectionMode, View};

fn ctx<'a>(buffer: &'a mut Buffer, view: &'a mut View) -> EditCtx<'a> {
    EditCtx::new(buffer, view)
}

#[test]
fn test_insert_with_newline_and_undo() {
    let (mut buffer, mut view) = buffer_with("ab\n");
    let mut ctx = ctx(&mut buffer, &mut view);
    ctx.move_to_offset(1);
    ctx.insert_text(b"X\nY");

    assert_eq!(text(ctx.buffer), "aX\nYb\n");
    assert_eq!(ctx.buffer.nl(), 2);
    assert_eq!(ctx.cursor_offset(), 4);
    ctx.view.update_cursor(ctx.buffer);
    assert_eq!(ctx.view.cy, 1);
    assert_eq!(ctx.view.cx_char, 1);

    assert_eq!(ctx.undo().unwrap(), 1);
    assert_eq!(text(ctx.buffer), "ab\n");
    assert_eq!(ctx.buffer.nl(), 1);
    assert_eq!(ctx.cursor_offset(), 1);
}

#[test]
fn test_delete_merging() {
    let (mut buffer, mut view) = buffer_with("hello\n");
    let mut ctx = ctx(&mut buffer, &mut view);
    ctx.move_to_offset(4);

    ctx.begin_change(MergeTag::Delete);
    ctx.delete(1, false);
    ctx.end_change();
    ctx.begin_change(MergeTag::Delete);
    ctx.delete(1, false);
    ctx.end_change();

    let cur = ctx.buffer.changes().cur();
    let record = ctx.buffer.changes().node(cur);
    assert_eq!(record.offset, 4);
    assert_eq!(record.del_count, 2);
    assert_eq!(record.deleted, b"o\n");
    assert_eq!(record.ins_count, 0);

    assert_eq!(ctx.undo().unwrap(), 1);
    assert_eq!(text(ctx.buffer), "hello\n");
}

#[test]
fn test_erase_merging() {
    let (mut buffer, mut view) = buffer_with("abc\n");
    let mut ctx = ctx(&mut buffer, &mut view);
    ctx.move_to_offset(3);

    ctx.erase();
    ctx.erase();
    ctx.erase();

    let cur = ctx.buffer.changes().cur();
    let record = ctx.buffer.changes().node(cur);
    assert_eq!(record.offset, 0);
    assert_eq!(record.del_count, 3);
    assert_eq!(record.deleted, b"abc");
    assert_eq!(text(ctx.buffer), "\n");

    assert_eq!(ctx.undo().unwrap(), 1);
    assert_eq!(text(ctx.buffer), "abc\n");
    // undoing a backspace run moves after the re-inserted text
    assert_eq!(ctx.cursor_offset(), 3);
}

#[test]
fn test_typed_characters_merge() {
    let (mut buffer, mut view) = buffer_with("\n");
    let mut ctx = ctx(&mut buffer, &mut view);
    ctx.insert_ch(u32::from(b'h'));
    ctx.insert_ch(u32::from(b'i'));
    ctx.insert_ch(u32::from(b'!'));
    assert_eq!(text(ctx.buffer), "hi!\n");

    // one undo step wipes the whole run
    assert_eq!(ctx.undo().unwrap(), 1);
    assert_eq!(text(ctx.buffer), "\n");
}

#[test]
fn test_newline_breaks_typing_merge() {
    let (mut buffer, mut view) = buffer_with("\n");
    let mut ctx = ctx(&mut buffer, &mut view);
    ctx.insert_ch(u32::from(b'a'));
    ctx.insert_ch(u32::from(b'\n'));
    ctx.insert_ch(u32::from(b'b'));
    assert_eq!(text(ctx.buffer), "a\nb\n");

    ctx.undo().unwrap();
    assert_eq!(text(ctx.buffer), "a\n\n");
    ctx.undo().unwrap();
    assert_eq!(text(ctx.buffer), "a\n");
    ctx.undo().unwrap();
    assert_eq!(text(ctx.buffer), "\n");
}

#[test]
fn test_insert_delete_round_trip() {
    let (mut buffer, mut view) = buffer_with("ab\ncd\n");
    let mut ctx = ctx(&mut buffer, &mut view);
    ctx.move_to_offset(3);
    ctx.insert(b"XY");
    assert_eq!(text(ctx.buffer), "ab\nXYcd\n");
    assert_eq!(ctx.cursor_offset(), 3);
    ctx.delete(2, false);
    assert_eq!(text(ctx.buffer), "ab\ncd\n");
    assert_eq!(ctx.cursor_offset(), 3);
}

#[test]
fn test_replace_and_undo() {
    let (mut buffer, mut view) = buffer_with("hello world\n");
    let mut ctx = ctx(&mut buffer, &mut view);
    ctx.move_to_offset(6);
    ctx.replace(5, b"there");
    assert_eq!(text(ctx.buffer), "hello there\n");

    ctx.undo().unwrap();
    assert_eq!(text(ctx.buffer), "hello world\n");
    ctx.redo(None).unwrap();
    assert_eq!(text(ctx.buffer), "hello there\n");
}

#[test]
fn test_undo_nothing_to_undo() {
    let (mut buffer, mut view) = buffer_with("x\n");
    let mut ctx = ctx(&mut buffer, &mut view);
    let err = ctx.undo().unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[test]
fn test_undo_redo_symmetry() {
    let (mut buffer, mut view) = buffer_with("one\ntwo\n");
    let mut ctx = ctx(&mut buffer, &mut view);
    ctx.move_to_offset(4);
    ctx.insert_text(b"2");
    let after = text(ctx.buffer);
    let cur = ctx.buffer.changes().cur();

    ctx.undo().unwrap();
    ctx.redo(None).unwrap();
    assert_eq!(text(ctx.buffer), after);
    assert_eq!(ctx.buffer.changes().cur(), cur);
}

#[test]
fn test_redo_branch_selection() {
    let (mut buffer, mut view) = buffer_with("base\n");
    let mut ctx = ctx(&mut buffer, &mut view);

    ctx.move_to_offset(0);
    ctx.insert_text(b"A");
    ctx.undo().unwrap();
    ctx.move_to_offset(0);
    ctx.insert_text(b"B");
    ctx.undo().unwrap();
    assert_eq!(text(ctx.buffer), "base\n");
    assert_eq!(ctx.buffer.changes().redo_branches(), 2);

    // the newest branch is the default
    ctx.redo(None).unwrap();
    assert_eq!(text(ctx.buffer), "Bbase\n");
    ctx.undo().unwrap();

    // branch numbers are 1-based, oldest first
    ctx.redo(Some(1)).unwrap();
    assert_eq!(text(ctx.buffer), "Abase\n");
    ctx.undo().unwrap();

    let err = ctx.redo(Some(3)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidInput);
    assert!(err.contains_msg("2 possible changes"));
}

#[test]
fn test_redo_nothing() {
    let (mut buffer, mut view) = buffer_with("x\n");
    let mut ctx = ctx(&mut buffer, &mut view);
    assert_eq!(ctx.redo(None).unwrap_err().kind, ErrorKind::NotFound);
}

#[test]
fn test_chain_atomicity() {
    let (mut buffer, mut view) = buffer_with("foo x foo y foo\n");
    let mut ctx = ctx(&mut buffer, &mut view);

    ctx.begin_change_chain();
    for offset in [0, 6, 12] {
        ctx.move_to_offset(offset);
        ctx.replace(3, b"bar");
    }
    ctx.end_change_chain();
    assert_eq!(text(ctx.buffer), "bar x bar y bar\n");

    // a single undo restores the pre-chain state
    assert_eq!(ctx.undo().unwrap(), 3);
    assert_eq!(text(ctx.buffer), "foo x foo y foo\n");

    // and a single redo brings it back
    assert_eq!(ctx.redo(None).unwrap(), 3);
    assert_eq!(text(ctx.buffer), "bar x bar y bar\n");
}

#[test]
fn test_dirty_flag_follows_cur() {
    let (mut buffer, mut view) = buffer_with("x\n");
    assert!(!buffer.is_modified());
    {
        let mut ctx = ctx(&mut buffer, &mut view);
        ctx.insert_text(b"y");
    }
    assert!(buffer.is_modified());
    buffer.mark_saved();
    assert!(!buffer.is_modified());
    {
        let mut ctx = ctx(&mut buffer, &mut view);
        ctx.undo().unwrap();
    }
    assert!(buffer.is_modified());
    {
        let mut ctx = ctx(&mut buffer, &mut view);
        ctx.redo(None).unwrap();
    }
    assert!(!buffer.is_modified());
}

#[test]
fn test_delete_ch_forward() {
    let (mut buffer, mut view) = buffer_with("ab\n");
    let mut ctx = ctx(&mut buffer, &mut view);
    ctx.move_to_offset(0);
    ctx.delete_ch();
    assert_eq!(text(ctx.buffer), "b\n");
    ctx.delete_ch();
    assert_eq!(text(ctx.buffer), "\n");
    // the two deletes merged
    assert_eq!(ctx.undo().unwrap(), 1);
    assert_eq!(text(ctx.buffer), "ab\n");
}

#[test]
fn test_erase_across_line_boundary_still_merges() {
    let (mut buffer, mut view) = buffer_with("ab\ncd\n");
    let mut ctx = ctx(&mut buffer, &mut view);
    // backspace from the start of "cd" eats the joining newline too
    ctx.move_to_offset(4);
    ctx.erase();
    ctx.erase();
    assert_eq!(text(ctx.buffer), "abd\n");

    let cur = ctx.buffer.changes().cur();
    let record = ctx.buffer.changes().node(cur);
    assert_eq!(record.offset, 2);
    assert_eq!(record.deleted, b"\nc");

    ctx.undo().unwrap();
    assert_eq!(text(ctx.buffer), "ab\ncd\n");
    assert_eq!(ctx.cursor_offset(), 4);
}

#[test]
fn test_insert_text_replaces_selection() {
    let (mut buffer, mut view) = buffer_with("hello world\n");
    let mut ctx = ctx(&mut buffer, &mut view);
    ctx.move_to_offset(0);
    ctx.select_start(SelectionMode::Chars);
    ctx.move_to_offset(4);
    ctx.insert_text(b"HEY");
    // chars 0..=4 were selected (the character under the cursor counts)
    assert_eq!(text(ctx.buffer), "HEY world\n");
    assert!(!ctx.view.selecting());

    ctx.undo().unwrap();
    assert_eq!(text(ctx.buffer), "hello world\n");
}

#[test]
fn test_line_selection_delete() {
    let (mut buffer, mut view) = buffer_with("one\ntwo\nthree\n");
    let mut ctx = ctx(&mut buffer, &mut view);
    ctx.move_to_offset(5);
    ctx.select_start(SelectionMode::Lines);
    ctx.move_to_offset(6);
    ctx.delete_ch();
    // the whole middle line goes away
    assert_eq!(text(ctx.buffer), "one\nthree\n");
}
