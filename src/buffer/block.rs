//! Block store
//!
//! Bytes are held as an ordered list of chunks. Blocks must contain
//! whole lines: a non-empty block always ends with `'\n'`, except the
//! last block of a buffer whose content does not end with one.
//! Preferred maximum block size is [`BLOCK_EDIT_SIZE`]; a block is
//! larger only when it holds a single very long line.

use crate::buffer::iter::BlockPos;

/// Preferred maximum size of an edited block
pub const BLOCK_EDIT_SIZE: usize = 512;

/// Allocation granularity
const MIN_ALLOC: usize = 64;

fn alloc_round(size: usize) -> usize {
    (size + MIN_ALLOC - 1) & !(MIN_ALLOC - 1)
}

/// Count `'\n'` bytes in `buf`
#[must_use]
pub fn count_nl(buf: &[u8]) -> u32 {
    buf.iter().filter(|&&b| b == b'\n').count() as u32
}

fn find_nl(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n')
}

/// One chunk of buffer bytes plus its newline count
#[derive(Debug)]
pub struct Block {
    pub(crate) data: Vec<u8>,
    /// Count of `'\n'` bytes in `data`
    pub(crate) nl: u32,
}

impl Block {
    /// Allocate an empty block with capacity rounded up to a multiple
    /// of 64
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Block {
            data: Vec::with_capacity(alloc_round(capacity)),
            nl: 0,
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn nl(&self) -> u32 {
        self.nl
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Grow capacity so `extra` more bytes fit, keeping the rounding
    /// discipline
    fn reserve_rounded(&mut self, extra: usize) {
        let need = self.data.len() + extra;
        if need > self.data.capacity() {
            self.data.reserve(alloc_round(need) - self.data.len());
        }
    }
}

/// The ordered list of blocks owned by a buffer.
///
/// There is always at least one block; only a sole block may be empty.
#[derive(Debug)]
pub struct BlockList {
    blocks: Vec<Block>,
}

impl BlockList {
    #[must_use]
    pub fn new() -> Self {
        BlockList {
            blocks: vec![Block::new(0)],
        }
    }

    /// Pack `bytes` into line-aligned blocks
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::new();
        }
        BlockList {
            blocks: pack_lines(bytes),
        }
    }

    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn block(&self, idx: usize) -> &Block {
        &self.blocks[idx]
    }

    /// Total byte length
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.iter().map(Block::size).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|b| b.data.is_empty())
    }

    /// Total newline count, recomputed from the blocks
    #[must_use]
    pub fn count_newlines(&self) -> u32 {
        self.blocks.iter().map(|b| b.nl).sum()
    }

    /// If `pos` sits past the end of a block that has a successor, move
    /// it to the start of the successor
    pub fn normalize(&self, pos: &mut BlockPos) {
        if pos.offset == self.blocks[pos.blk].size() && pos.blk + 1 < self.blocks.len() {
            pos.blk += 1;
            pos.offset = 0;
        }
    }

    /// Insert `buf` at `pos`, leaving `pos` before the inserted bytes.
    ///
    /// Returns the number of newlines inserted; the owning buffer
    /// updates its total.
    pub fn insert(&mut self, pos: &mut BlockPos, buf: &[u8]) -> u32 {
        // blocks must contain whole lines and the last byte of buf
        // might not be a newline, so never leave pos at a block seam
        self.normalize(pos);

        let blk = &mut self.blocks[pos.blk];
        let new_size = blk.size() + buf.len();
        if new_size <= blk.data.capacity() || new_size <= BLOCK_EDIT_SIZE {
            return Self::insert_to_current(blk, pos.offset, buf);
        }
        if blk.nl <= 1 && !buf.contains(&b'\n') {
            // can't split a single very long line; growing in place is
            // much faster than the split walk
            return Self::insert_to_current(blk, pos.offset, buf);
        }
        self.split_and_insert(pos, buf)
    }

    fn insert_to_current(blk: &mut Block, offset: usize, buf: &[u8]) -> u32 {
        blk.reserve_rounded(buf.len());
        blk.data.splice(offset..offset, buf.iter().copied());
        let nl = count_nl(buf);
        blk.nl += nl;
        nl
    }

    /// Combine the edited block and the new data into smaller blocks:
    /// every emitted block contains whole lines, greedily filled up to
    /// [`BLOCK_EDIT_SIZE`]; a single line longer than that gets a block
    /// of its own.
    fn split_and_insert(&mut self, pos: &mut BlockPos, buf: &[u8]) -> u32 {
        let idx = pos.blk;
        let offset = pos.offset;
        let old = &self.blocks[idx];
        let old_nl = old.nl;

        let mut combined = Vec::with_capacity(old.size() + buf.len());
        combined.extend_from_slice(&old.data[..offset]);
        combined.extend_from_slice(buf);
        combined.extend_from_slice(&old.data[offset..]);

        let chain = pack_lines(&combined);
        log::trace!(
            "split block {} ({} bytes) into {} blocks",
            idx,
            combined.len(),
            chain.len()
        );
        let nl_added = chain.iter().map(|b| b.nl).sum::<u32>() - old_nl;
        self.blocks.splice(idx..=idx, chain);

        // re-seat pos at the same absolute offset, still before the
        // inserted bytes
        pos.blk = idx;
        pos.offset = offset;
        while pos.offset > self.blocks[pos.blk].size() {
            pos.offset -= self.blocks[pos.blk].size();
            pos.blk += 1;
        }
        nl_added
    }

    /// Delete `len` bytes starting at `pos`.
    ///
    /// Returns the removed bytes and the number of newlines among them.
    /// Emptied blocks are freed (except a sole block), and if the
    /// resulting cursor block no longer ends on a line boundary its
    /// successor is joined onto it.
    pub fn delete(&mut self, pos: &mut BlockPos, len: usize) -> (Vec<u8>, u32) {
        if len == 0 {
            return (Vec::new(), 0);
        }

        // the block under the cursor may become empty and be freed
        let cursor_at_block_start = pos.offset == 0;

        let mut deleted = Vec::with_capacity(len);
        let mut nl_deleted: u32 = 0;
        let mut idx = pos.blk;
        let mut offset = pos.offset;
        while deleted.len() < len {
            debug_assert!(idx < self.blocks.len(), "delete past end of buffer");
            let sole = self.blocks.len() == 1;
            let blk = &mut self.blocks[idx];
            let avail = blk.size() - offset;
            let count = (len - deleted.len()).min(avail);
            if count > 0 {
                let removed = &blk.data[offset..offset + count];
                let nl = count_nl(removed);
                deleted.extend_from_slice(removed);
                blk.data.drain(offset..offset + count);
                blk.nl -= nl;
                nl_deleted += nl;
            }
            if blk.data.is_empty() && !sole {
                self.blocks.remove(idx);
                // the next block slides into idx
            } else {
                idx += 1;
            }
            offset = 0;
        }

        if cursor_at_block_start {
            if pos.blk >= self.blocks.len() {
                // everything after the cursor is gone
                pos.blk = self.blocks.len() - 1;
                pos.offset = self.blocks[pos.blk].size();
            } else {
                pos.offset = 0;
            }
        }

        self.join_with_next(pos.blk);
        (deleted, nl_deleted)
    }

    /// Blocks must end on a line boundary: concatenate the successor
    /// onto `idx` when the deletion left it ending mid-line
    fn join_with_next(&mut self, idx: usize) {
        let blk = &self.blocks[idx];
        if blk.data.last().is_some_and(|&b| b != b'\n') && idx + 1 < self.blocks.len() {
            let next = self.blocks.remove(idx + 1);
            let blk = &mut self.blocks[idx];
            blk.reserve_rounded(next.size());
            blk.data.extend_from_slice(&next.data);
            blk.nl += next.nl;
        }
    }

    /// Replace `del` bytes at `pos` with `buf`, in place, when the edit
    /// is confined to one block and cannot force a split.
    ///
    /// Returns `None` when the caller must fall back to delete+insert;
    /// otherwise the removed bytes and the deleted/inserted newline
    /// counts.
    pub fn replace(
        &mut self,
        pos: &mut BlockPos,
        del: usize,
        buf: &[u8],
    ) -> Option<(Vec<u8>, u32, u32)> {
        self.normalize(pos);

        let blk = &mut self.blocks[pos.blk];
        let offset = pos.offset;
        let avail = blk.size() - offset;
        if del >= avail {
            return None;
        }

        let new_size = blk.size() + buf.len() - del;
        if new_size > BLOCK_EDIT_SIZE && (blk.nl > 1 || buf.contains(&b'\n')) {
            // most likely can be split
            return None;
        }

        blk.reserve_rounded(buf.len().saturating_sub(del));
        let deleted: Vec<u8> = blk
            .data
            .splice(offset..offset + del, buf.iter().copied())
            .collect();
        let del_nl = count_nl(&deleted);
        let ins_nl = count_nl(buf);
        blk.nl = blk.nl - del_nl + ins_nl;
        Some((deleted, del_nl, ins_nl))
    }

    /// Copy up to `n` bytes starting at `pos`, stopping at EOF
    #[must_use]
    pub fn concat_forward(&self, pos: BlockPos, n: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(n);
        let mut idx = pos.blk;
        let mut offset = pos.offset;
        while out.len() < n && idx < self.blocks.len() {
            let blk = &self.blocks[idx];
            let avail = blk.size() - offset;
            let count = (n - out.len()).min(avail);
            out.extend_from_slice(&blk.data[offset..offset + count]);
            idx += 1;
            offset = 0;
        }
        out
    }

    /// Debug-build invariant check: block sizes, line alignment and
    /// newline counts, plus the cursor staying inside its block
    pub(crate) fn sanity_check(&self, pos: &BlockPos) {
        if !cfg!(debug_assertions) {
            return;
        }
        assert!(!self.blocks.is_empty(), "block list is empty");
        let last = self.blocks.len() - 1;
        for (i, blk) in self.blocks.iter().enumerate() {
            assert!(
                !blk.data.is_empty() || self.blocks.len() == 1,
                "empty block in a multi-block list"
            );
            if i != last {
                assert!(
                    blk.data.last() == Some(&b'\n'),
                    "block {i} does not end on a line boundary"
                );
            }
            assert_eq!(blk.nl, count_nl(&blk.data), "stale newline count");
        }
        assert!(pos.blk < self.blocks.len(), "cursor block out of range");
        assert!(
            pos.offset <= self.blocks[pos.blk].size(),
            "cursor offset past its block"
        );
    }
}

impl Default for BlockList {
    fn default() -> Self {
        Self::new()
    }
}

/// Split `bytes` into a chain of line-aligned blocks
fn pack_lines(bytes: &[u8]) -> Vec<Block> {
    let mut out = Vec::new();
    let mut start = 0;
    while start < bytes.len() {
        let mut size = 0;
        loop {
            let rest = &bytes[start + size..];
            if rest.is_empty() {
                break;
            }
            let line_len = match find_nl(rest) {
                Some(i) => i + 1,
                None => rest.len(),
            };
            if size > 0 && size + line_len > BLOCK_EDIT_SIZE {
                break;
            }
            size += line_len;
            if size > BLOCK_EDIT_SIZE {
                // one block containing one very long line
                break;
            }
        }
        let mut blk = Block::new(size);
        blk.data.extend_from_slice(&bytes[start..start + size]);
        blk.nl = count_nl(&blk.data);
        out.push(blk);
        start += size;
    }
    out
}
