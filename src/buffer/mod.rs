//! The text buffer: an ordered list of line-aligned blocks plus the
//! change history and, when a syntax is attached, the per-line
//! highlighter start states.

pub mod block;
pub mod iter;

use std::sync::Arc;

use crate::change::ChangeTree;
use crate::syntax::hl::{HlData, HlState};
use crate::syntax::{SyntaxId, SyntaxSet};

use block::BlockList;
use iter::{BlockIter, BlockPos};

/// Line separator written on save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineSep {
    #[default]
    Unix,
    Dos,
}

/// Per-buffer options the core reads
#[derive(Debug, Clone)]
pub struct Options {
    /// Tab stop width, 1..=8
    pub tab_width: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options { tab_width: 8 }
    }
}

/// A text buffer
#[derive(Debug)]
pub struct Buffer {
    pub(crate) blocks: BlockList,
    /// Total newline count, kept in sync by the mutators
    pub(crate) nl: u32,
    pub options: Options,
    pub line_sep: LineSep,
    /// Encoding label reported to the embedding
    pub encoding: &'static str,
    pub read_only: bool,
    pub(crate) changes: ChangeTree,
    pub(crate) hl: Option<HlData>,
}

impl Buffer {
    #[must_use]
    pub fn new() -> Self {
        Buffer {
            blocks: BlockList::new(),
            nl: 0,
            options: Options::default(),
            line_sep: LineSep::default(),
            encoding: "UTF-8",
            read_only: false,
            changes: ChangeTree::new(),
            hl: None,
        }
    }

    /// Build a buffer from raw file content.
    ///
    /// CRLF input is converted to LF and remembered in `line_sep`; a
    /// missing final newline is appended so that every block ends on a
    /// line boundary. The encoding label is set from a scan for the
    /// first non-ASCII sequence.
    #[must_use]
    pub fn from_bytes(input: &[u8]) -> Self {
        let mut buf = Self::new();

        let crlf = match input.iter().position(|&b| b == b'\n') {
            Some(i) => i > 0 && input[i - 1] == b'\r',
            None => false,
        };

        let mut bytes;
        if crlf {
            buf.line_sep = LineSep::Dos;
            bytes = Vec::with_capacity(input.len());
            for &b in input {
                if b != b'\r' {
                    bytes.push(b);
                }
            }
        } else {
            bytes = input.to_vec();
        }
        if bytes.last().is_some_and(|&b| b != b'\n') {
            bytes.push(b'\n');
        }

        buf.encoding = detect_encoding(&bytes);
        buf.blocks = BlockList::from_bytes(&bytes);
        buf.nl = buf.blocks.count_newlines();
        buf
    }

    /// Total byte length
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Total newline count
    #[must_use]
    pub fn nl(&self) -> u32 {
        self.nl
    }

    #[must_use]
    pub fn blocks(&self) -> &BlockList {
        &self.blocks
    }

    #[must_use]
    pub fn changes(&self) -> &ChangeTree {
        &self.changes
    }

    pub fn changes_mut(&mut self) -> &mut ChangeTree {
        &mut self.changes
    }

    /// Buffer content, with CR re-inserted when the separator is DOS
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        let raw = self.blocks.concat_forward(BlockPos::default(), self.len());
        match self.line_sep {
            LineSep::Unix => raw,
            LineSep::Dos => {
                let mut out = Vec::with_capacity(raw.len() + self.nl as usize);
                for b in raw {
                    if b == b'\n' {
                        out.push(b'\r');
                    }
                    out.push(b);
                }
                out
            }
        }
    }

    #[must_use]
    pub fn iter(&self, pos: BlockPos) -> BlockIter<'_> {
        BlockIter::new(&self.blocks, pos)
    }

    #[must_use]
    pub fn iter_bof(&self) -> BlockIter<'_> {
        BlockIter::at_bof(&self.blocks)
    }

    #[must_use]
    pub fn iter_at_offset(&self, offset: usize) -> BlockIter<'_> {
        let mut it = self.iter_bof();
        it.goto_offset(offset);
        it
    }

    /// Dirty flag: the current change differs from the saved one
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.changes.is_modified()
    }

    pub fn mark_saved(&mut self) {
        self.changes.mark_saved();
    }

    /// Attach a syntax: creates the start-state array with the entry
    /// state seeded for line 0
    pub fn attach_syntax(&mut self, set: Arc<SyntaxSet>, syntax: SyntaxId) {
        self.hl = Some(HlData {
            set,
            syntax,
            states: vec![Some(HlState::initial(syntax))],
            first_hole: 1,
        });
    }

    pub fn detach_syntax(&mut self) {
        self.hl = None;
    }

    #[must_use]
    pub fn has_syntax(&self) -> bool {
        self.hl.is_some()
    }

    // These keep the block invariants and the newline total; cursor
    // projection, change recording and highlight invalidation are wired
    // up by the edit context.

    /// Insert `buf` at `pos`, leaving `pos` before the inserted bytes.
    /// Returns the number of newlines inserted.
    pub(crate) fn do_insert(&mut self, pos: &mut BlockPos, buf: &[u8]) -> u32 {
        let nl = self.blocks.insert(pos, buf);
        self.nl += nl;
        self.blocks.sanity_check(pos);
        nl
    }

    /// Delete `len` bytes at `pos`. Returns the removed bytes and the
    /// number of newlines among them.
    pub(crate) fn do_delete(&mut self, pos: &mut BlockPos, len: usize) -> (Vec<u8>, u32) {
        let (deleted, nl) = self.blocks.delete(pos, len);
        self.nl -= nl;
        self.blocks.sanity_check(pos);
        (deleted, nl)
    }

    /// In-place replace fast path; `None` means the caller must fall
    /// back to delete-then-insert.
    pub(crate) fn do_replace(
        &mut self,
        pos: &mut BlockPos,
        del: usize,
        buf: &[u8],
    ) -> Option<(Vec<u8>, u32, u32)> {
        let (deleted, del_nl, ins_nl) = self.blocks.replace(pos, del, buf)?;
        self.nl = self.nl - del_nl + ins_nl;
        self.blocks.sanity_check(pos);
        Some((deleted, del_nl, ins_nl))
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

fn detect_encoding(bytes: &[u8]) -> &'static str {
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] < 0x80 {
            idx += 1;
            continue;
        }
        let u = crate::uchar::get_char(bytes, &mut idx);
        return if u & crate::uchar::INVALID_MASK != 0 {
            "8-bit"
        } else {
            "UTF-8"
        };
    }
    "UTF-8"
}
