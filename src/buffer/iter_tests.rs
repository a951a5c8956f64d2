//! Tests for block iteration and UTF-8 navigation

use crate::buffer::iter::BlockPos;
use crate::buffer::Buffer;
use crate::uchar::INVALID_MASK;

fn two_block_buffer() -> Buffer {
    // two 500-byte lines become two blocks
    let mut input = vec![b'a'; 499];
    input.push(b'\n');
    input.extend(vec![b'b'; 499]);
    input.push(b'\n');
    let buf = Buffer::from_bytes(&input);
    assert_eq!(buf.blocks().block_count(), 2);
    buf
}

#[test]
fn test_next_prev_byte() {
    let buf = Buffer::from_bytes(b"ab\n");
    let mut it = buf.iter_bof();
    assert_eq!(it.next_byte(), Some(b'a'));
    assert_eq!(it.next_byte(), Some(b'b'));
    assert_eq!(it.next_byte(), Some(b'\n'));
    assert_eq!(it.next_byte(), None);
    assert!(it.eof());
    assert_eq!(it.prev_byte(), Some(b'\n'));
    assert_eq!(it.prev_byte(), Some(b'b'));
    assert_eq!(it.prev_byte(), Some(b'a'));
    assert_eq!(it.prev_byte(), None);
}

#[test]
fn test_bytes_cross_block_boundary() {
    let buf = two_block_buffer();
    let mut it = buf.iter(BlockPos {
        blk: 0,
        offset: 499,
    });
    assert_eq!(it.next_byte(), Some(b'\n'));
    assert_eq!(it.next_byte(), Some(b'b'));
    assert_eq!(it.pos().blk, 1);
    assert_eq!(it.prev_byte(), Some(b'b'));
    assert_eq!(it.prev_byte(), Some(b'\n'));
    assert_eq!(it.pos().blk, 0);
}

#[test]
fn test_next_prev_char_utf8() {
    let buf = Buffer::from_bytes("a\u{e4}\u{20ac}\n".as_bytes());
    let mut it = buf.iter_bof();
    assert_eq!(it.next_char(), Some((u32::from(b'a'), 1)));
    assert_eq!(it.next_char(), Some((0xe4, 2)));
    assert_eq!(it.next_char(), Some((0x20ac, 3)));
    assert_eq!(it.next_char(), Some((u32::from(b'\n'), 1)));
    assert_eq!(it.next_char(), None);
    assert_eq!(it.prev_char(), Some((u32::from(b'\n'), 1)));
    assert_eq!(it.prev_char(), Some((0x20ac, 3)));
    assert_eq!(it.prev_char(), Some((0xe4, 2)));
    assert_eq!(it.prev_char(), Some((u32::from(b'a'), 1)));
}

#[test]
fn test_invalid_byte_moves_one() {
    let buf = Buffer::from_bytes(&[b'a', 0xf0, b'b', b'\n']);
    let mut it = buf.iter_bof();
    it.next_char();
    // 0xf0 starts a 4-byte sequence but 'b' is not a continuation
    assert_eq!(it.next_char(), Some((0xf0 | INVALID_MASK, 1)));
    assert_eq!(it.next_char(), Some((u32::from(b'b'), 1)));
}

#[test]
fn test_next_line() {
    let buf = Buffer::from_bytes(b"one\ntwo\nthree\n");
    let mut it = buf.iter_bof();
    assert_eq!(it.next_line(), 4);
    assert_eq!(it.get_offset(), 4);
    assert_eq!(it.next_line(), 4);
    assert_eq!(it.get_offset(), 8);
    assert_eq!(it.next_line(), 6);
    assert!(it.eof());
    assert_eq!(it.next_line(), 0);
}

#[test]
fn test_prev_line() {
    let buf = Buffer::from_bytes(b"one\ntwo\nthree\n");
    let mut it = buf.iter_at_offset(10);
    // from mid "three" to the start of "two"
    assert_eq!(it.prev_line(), 6);
    assert_eq!(it.get_offset(), 4);
    assert_eq!(it.prev_line(), 4);
    assert_eq!(it.get_offset(), 0);
    assert_eq!(it.prev_line(), 0);
}

#[test]
fn test_prev_line_across_blocks() {
    let buf = two_block_buffer();
    let mut it = buf.iter(BlockPos { blk: 1, offset: 10 });
    assert_eq!(it.prev_line(), 510);
    assert_eq!(it.get_offset(), 0);
}

#[test]
fn test_bol_eol() {
    let buf = Buffer::from_bytes(b"one\ntwo\n");
    let mut it = buf.iter_at_offset(6);
    assert_eq!(it.bol(), 2);
    assert_eq!(it.get_offset(), 4);
    assert_eq!(it.eol(), 3);
    // eol stays on the newline
    assert_eq!(it.get_offset(), 7);
    let mut tmp = it;
    assert_eq!(tmp.next_byte(), Some(b'\n'));
}

#[test]
fn test_skip_goto_offset() {
    let buf = two_block_buffer();
    let mut it = buf.iter_bof();
    it.skip_bytes(600);
    assert_eq!(it.get_offset(), 600);
    assert_eq!(it.pos().blk, 1);
    it.goto_offset(3);
    assert_eq!(it.get_offset(), 3);
    it.goto_offset(buf.len());
    assert!(it.eof());
}

#[test]
fn test_line_refs() {
    let buf = Buffer::from_bytes(b"one\ntwo\n");
    let mut it = buf.iter_at_offset(4);
    assert_eq!(it.line_ref(), b"two");
    assert_eq!(it.line_nl_ref(), b"two\n");
}

#[test]
fn test_fetch_this_line() {
    let buf = Buffer::from_bytes(b"one\ntwo\n");
    let it = buf.iter_at_offset(6);
    let (back, line) = it.fetch_this_line();
    assert_eq!(back, 2);
    assert_eq!(line, b"two");
    // the iterator itself did not move
    assert_eq!(it.get_offset(), 6);
}

#[test]
fn test_normalize_at_seam() {
    let buf = two_block_buffer();
    let mut pos = BlockPos {
        blk: 0,
        offset: 500,
    };
    buf.blocks().normalize(&mut pos);
    assert_eq!(pos, BlockPos { blk: 1, offset: 0 });
}
