//! Editing operations
//!
//! [`EditCtx`] pairs one buffer with its current view and wires the
//! three layers together: every edit rewrites blocks, records a change,
//! notifies the highlighter with the affected line range, and marks a
//! repaint region. The original kept buffer and view in process-wide
//! globals; here the command layer threads the pair through explicitly.

use crate::buffer::Buffer;
use crate::change::{ChangeId, MergeTag};
use crate::error::{CoreError, ErrorKind, Result};
use crate::syntax::hl;
use crate::uchar::{self, Uchar};
use crate::view::{SelectionMode, View, LAST_LINE};

/// One buffer plus the view the edits happen through
pub struct EditCtx<'a> {
    pub buffer: &'a mut Buffer,
    pub view: &'a mut View,
}

impl<'a> EditCtx<'a> {
    pub fn new(buffer: &'a mut Buffer, view: &'a mut View) -> Self {
        EditCtx { buffer, view }
    }

    /// Absolute byte offset of the view cursor
    #[must_use]
    pub fn cursor_offset(&self) -> usize {
        self.buffer.iter(self.view.cursor).get_offset()
    }

    /// Seat the view cursor at an absolute byte offset
    pub fn move_to_offset(&mut self, offset: usize) {
        let mut it = self.buffer.iter_bof();
        it.goto_offset(offset);
        self.view.cursor = it.pos();
        self.view.update_cursor_y(self.buffer);
    }

    // ---- low-level mutators ----

    /// Insert without recording; cursor stays before the inserted bytes
    pub(crate) fn apply_insert(&mut self, buf: &[u8]) {
        let at = self.cursor_offset();
        let nl = self.buffer.do_insert(&mut self.view.cursor, buf) as usize;
        self.view.update_cursor_y(self.buffer);
        let cy = self.view.cy;
        self.view
            .lines_changed(cy, if nl > 0 { LAST_LINE } else { cy });
        hl::hl_insert(self.buffer, cy, nl);
        self.view.selection_adjust_insert(at, buf.len());
    }

    /// Delete without recording; returns the removed bytes
    pub(crate) fn apply_delete(&mut self, len: usize) -> Vec<u8> {
        let at = self.cursor_offset();
        let (deleted, nl) = self.buffer.do_delete(&mut self.view.cursor, len);
        let nl = nl as usize;
        self.view.update_cursor_y(self.buffer);
        let cy = self.view.cy;
        self.view
            .lines_changed(cy, if nl > 0 { LAST_LINE } else { cy });
        hl::hl_delete(self.buffer, cy, nl);
        self.view.selection_adjust_delete(at, len);
        deleted
    }

    /// Replace without recording; in place when the edit stays inside
    /// one block, otherwise delete-then-insert
    pub(crate) fn apply_replace(&mut self, del: usize, ins: &[u8]) -> Vec<u8> {
        let at = self.cursor_offset();
        match self.buffer.do_replace(&mut self.view.cursor, del, ins) {
            Some((deleted, del_nl, ins_nl)) => {
                let (del_nl, ins_nl) = (del_nl as usize, ins_nl as usize);
                self.view.update_cursor_y(self.buffer);
                let cy = self.view.cy;
                if del_nl == ins_nl {
                    // lines changed in place, nothing moved up or down
                    self.view.lines_changed(cy, cy + del_nl);
                } else {
                    self.view.lines_changed(cy, LAST_LINE);
                }
                hl::hl_delete(self.buffer, cy, del_nl);
                hl::hl_insert(self.buffer, cy, ins_nl);
                self.view.selection_adjust_delete(at, del);
                self.view.selection_adjust_insert(at, ins.len());
                deleted
            }
            None => {
                let deleted = self.apply_delete(del);
                self.apply_insert(ins);
                deleted
            }
        }
    }

    // ---- recording primitives ----

    /// Insert and record. The cursor is left before the inserted bytes.
    pub fn insert(&mut self, buf: &[u8]) {
        if buf.is_empty() {
            return;
        }
        let at = self.cursor_offset();
        self.buffer.changes.record_insert(at, buf.len());
        self.apply_insert(buf);
    }

    /// Delete and record. `move_after` marks a backspace-style record:
    /// undoing it re-inserts the bytes and moves past them.
    pub fn delete(&mut self, len: usize, move_after: bool) {
        if len == 0 {
            return;
        }
        let at = self.cursor_offset();
        let deleted = self.apply_delete(len);
        self.buffer.changes.record_delete(at, deleted, move_after);
    }

    /// Replace and record as one change
    pub fn replace(&mut self, del: usize, ins: &[u8]) {
        if del == 0 && ins.is_empty() {
            return;
        }
        if del == 0 {
            self.insert(ins);
            return;
        }
        let at = self.cursor_offset();
        let deleted = self.apply_replace(del, ins);
        self.buffer.changes.record_replace(at, deleted, ins.len());
    }

    // ---- merge tags and chains ----

    pub fn begin_change(&mut self, tag: MergeTag) {
        self.buffer.changes.begin_change(tag);
    }

    pub fn end_change(&mut self) {
        self.buffer.changes.end_change();
    }

    pub fn begin_change_chain(&mut self) {
        self.buffer.changes.begin_change_chain();
    }

    pub fn end_change_chain(&mut self) {
        self.buffer.changes.end_change_chain();
    }

    // ---- command-level operations ----

    /// Replace the selection (if any) with `text` and move after it
    pub fn insert_text(&mut self, text: &[u8]) {
        let mut del = 0;
        if self.view.selecting() {
            del = self.prepare_selection();
            self.view.select_end();
        }
        self.replace(del, text);
        let mut it = self.buffer.iter(self.view.cursor);
        it.skip_bytes(text.len());
        self.view.cursor = it.pos();
        self.view.update_cursor_y(self.buffer);
        self.view.update_preferred_x(self.buffer);
    }

    /// Type one character; consecutive typed characters merge into one
    /// undo step
    pub fn insert_ch(&mut self, u: Uchar) {
        let tag = if u == Uchar::from(b'\n') {
            MergeTag::None
        } else {
            MergeTag::Insert
        };
        self.begin_change(tag);
        let mut buf = Vec::with_capacity(4);
        uchar::push_char(&mut buf, u);
        self.insert_text(&buf);
        self.end_change();
    }

    /// Delete the character under the cursor (or the selection)
    pub fn delete_ch(&mut self) {
        if self.view.selecting() {
            self.begin_change(MergeTag::None);
            let size = self.prepare_selection();
            self.view.select_end();
            self.delete(size, false);
        } else {
            self.begin_change(MergeTag::Delete);
            let size = self
                .buffer
                .iter(self.view.cursor)
                .next_char()
                .map_or(0, |(_, n)| n);
            self.delete(size, false);
        }
        self.end_change();
        self.view.update_preferred_x(self.buffer);
    }

    /// Backspace: delete the character before the cursor (or the
    /// selection)
    pub fn erase(&mut self) {
        if self.view.selecting() {
            self.begin_change(MergeTag::None);
            let size = self.prepare_selection();
            self.view.select_end();
            self.delete(size, true);
        } else {
            self.begin_change(MergeTag::Erase);
            let mut it = self.buffer.iter(self.view.cursor);
            let size = it.prev_char().map_or(0, |(_, n)| n);
            self.view.cursor = it.pos();
            self.delete(size, true);
        }
        self.end_change();
        self.view.update_preferred_x(self.buffer);
    }

    /// Move the cursor to the selection start and return the selection
    /// length in bytes
    pub fn prepare_selection(&mut self) -> usize {
        match self.view.selection_range(self.buffer) {
            None => 0,
            Some(info) => {
                self.move_to_offset(info.so);
                info.eo - info.so
            }
        }
    }

    // ---- undo and redo ----

    /// Undo one user-level step. Returns the number of primitive
    /// changes reversed.
    pub fn undo(&mut self) -> Result<usize> {
        self.buffer.changes.reset_merge();
        let cur = self.buffer.changes.cur();
        if self.buffer.changes.node(cur).next.is_none() {
            return Err(CoreError::new(ErrorKind::NotFound, "Nothing to undo."));
        }

        let count;
        if self.buffer.changes.node(cur).is_barrier() {
            let mut id = cur;
            let mut reversed = 0;
            loop {
                id = self
                    .buffer
                    .changes
                    .node(id)
                    .next
                    .expect("chain barrier without a parent");
                if self.buffer.changes.node(id).is_barrier() {
                    break;
                }
                self.reverse_change(id);
                reversed += 1;
            }
            let next = self
                .buffer
                .changes
                .node(id)
                .next
                .expect("opening barrier without a parent");
            self.buffer.changes.set_cur(next);
            count = reversed;
        } else {
            self.reverse_change(cur);
            let next = self.buffer.changes.node(cur).next.expect("checked above");
            self.buffer.changes.set_cur(next);
            count = 1;
        }

        if count > 1 {
            self.view.mark_all_lines_changed();
        }
        Ok(count)
    }

    /// Redo along one of the branches recorded at the current position.
    ///
    /// `branch` is the 1-based branch number; `None` picks the newest.
    /// Returns the number of primitive changes re-applied.
    pub fn redo(&mut self, branch: Option<usize>) -> Result<usize> {
        self.buffer.changes.reset_merge();
        let cur = self.buffer.changes.cur();
        let nr = self.buffer.changes.node(cur).prev.len();
        if nr == 0 {
            return Err(CoreError::new(ErrorKind::NotFound, "Nothing to redo."));
        }
        let idx = match branch {
            None => nr - 1,
            Some(n) => {
                if n == 0 || n > nr {
                    return Err(CoreError::new(
                        ErrorKind::InvalidInput,
                        format!("There are only {} possible changes to redo.", nr),
                    ));
                }
                n - 1
            }
        };

        let head = self.buffer.changes.node(cur).prev[idx];
        let count;
        if self.buffer.changes.node(head).is_barrier() {
            let mut id = head;
            let mut reversed = 0;
            loop {
                id = *self
                    .buffer
                    .changes
                    .node(id)
                    .prev
                    .last()
                    .expect("unterminated change chain");
                if self.buffer.changes.node(id).is_barrier() {
                    break;
                }
                self.reverse_change(id);
                reversed += 1;
            }
            self.buffer.changes.set_cur(id);
            count = reversed;
        } else {
            self.reverse_change(head);
            self.buffer.changes.set_cur(head);
            count = 1;
        }

        if count > 1 {
            self.view.mark_all_lines_changed();
        }
        Ok(count)
    }

    /// Apply a change in reverse, turning the record into its own
    /// inverse for the next pass
    fn reverse_change(&mut self, id: ChangeId) {
        let (offset, ins_count, del_count, move_after) = {
            let c = self.buffer.changes.node(id);
            (c.offset, c.ins_count, c.del_count, c.move_after)
        };
        self.move_to_offset(offset);

        if ins_count == 0 {
            // convert delete to insert
            let deleted = self.buffer.changes.take_deleted(id);
            self.apply_insert(&deleted);
            if move_after {
                self.move_to_offset(offset + del_count);
            }
            let c = self.buffer.changes.node_mut(id);
            c.ins_count = del_count;
            c.del_count = 0;
        } else if del_count > 0 {
            // reverse a replace
            let buf = self.apply_delete(ins_count);
            let old = self.buffer.changes.take_deleted(id);
            self.apply_insert(&old);
            let c = self.buffer.changes.node_mut(id);
            c.deleted = buf;
            c.ins_count = del_count;
            c.del_count = ins_count;
        } else {
            // convert insert to delete
            let buf = self.apply_delete(ins_count);
            let c = self.buffer.changes.node_mut(id);
            c.deleted = buf;
            c.del_count = ins_count;
            c.ins_count = 0;
        }
        self.view.update_preferred_x(self.buffer);
    }

    /// Start selecting at the cursor
    pub fn select_start(&mut self, mode: SelectionMode) {
        let offset = self.cursor_offset();
        self.view.select_start(mode, offset);
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
