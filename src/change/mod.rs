//! Change records and the branching undo DAG
//!
//! Every primitive edit is recorded here. Records form a tree kept in
//! an arena: `next` points toward the root (older), `prev` holds the
//! redo branches (newer alternatives, oldest first). Undo and redo walk
//! this structure and re-apply edits through the mutators; the walking
//! itself lives in the `edit` module because it needs the buffer.

/// Index into the change arena
pub type ChangeId = usize;

/// The arena root: a sentinel barrier with no parent
pub const ROOT: ChangeId = 0;

/// Merge tag set by the command layer around each user action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeTag {
    #[default]
    None,
    /// Consecutive typed characters coalesce into one record
    Insert,
    /// Consecutive forward deletes append to one record
    Delete,
    /// Consecutive backspaces prepend to one record
    Erase,
}

/// One recorded edit.
///
/// Inserted bytes are not stored; they live in the buffer. A record
/// with zero counts is a chain barrier bracketing an atomic multi-edit
/// user action.
#[derive(Debug, Default)]
pub struct Change {
    /// Parent (older) record
    pub(crate) next: Option<ChangeId>,
    /// Redo branches (newer records), oldest first
    pub(crate) prev: Vec<ChangeId>,
    pub offset: usize,
    pub del_count: usize,
    pub ins_count: usize,
    /// After undoing a backspace the cursor moves after the text
    pub move_after: bool,
    /// Deleted bytes
    pub deleted: Vec<u8>,
}

impl Change {
    #[must_use]
    pub fn is_barrier(&self) -> bool {
        self.ins_count == 0 && self.del_count == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainState {
    None,
    /// `begin_change_chain` ran but no edit happened yet; the opening
    /// barrier is linked in only on the first real change so that empty
    /// chains leave no trace
    Pending,
    Open,
}

/// The undo DAG plus merge bookkeeping
#[derive(Debug)]
pub struct ChangeTree {
    nodes: Vec<Change>,
    cur: ChangeId,
    /// Position at last successful save; dirty == (cur != saved)
    saved: ChangeId,
    merge: MergeTag,
    prev_merge: MergeTag,
    chain: ChainState,
}

impl ChangeTree {
    #[must_use]
    pub fn new() -> Self {
        ChangeTree {
            nodes: vec![Change::default()],
            cur: ROOT,
            saved: ROOT,
            merge: MergeTag::None,
            prev_merge: MergeTag::None,
            chain: ChainState::None,
        }
    }

    #[must_use]
    pub fn cur(&self) -> ChangeId {
        self.cur
    }

    pub(crate) fn set_cur(&mut self, id: ChangeId) {
        self.cur = id;
    }

    #[must_use]
    pub fn node(&self, id: ChangeId) -> &Change {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: ChangeId) -> &mut Change {
        &mut self.nodes[id]
    }

    pub(crate) fn take_deleted(&mut self, id: ChangeId) -> Vec<u8> {
        std::mem::take(&mut self.nodes[id].deleted)
    }

    /// Number of redo branches at the current position
    #[must_use]
    pub fn redo_branches(&self) -> usize {
        self.nodes[self.cur].prev.len()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.nodes[self.cur].next.is_some()
    }

    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.cur != self.saved
    }

    pub fn mark_saved(&mut self) {
        self.saved = self.cur;
    }

    /// Set the merge tag for the user action that is starting
    pub fn begin_change(&mut self, tag: MergeTag) {
        self.merge = tag;
    }

    /// Remember the finished action's tag so the next action can merge
    pub fn end_change(&mut self) {
        self.prev_merge = self.merge;
    }

    /// Break any pending merge; used after undo/redo and view switches
    pub(crate) fn reset_merge(&mut self) {
        self.merge = MergeTag::None;
        self.prev_merge = MergeTag::None;
    }

    /// Start bracketing a multi-edit user action.
    ///
    /// The opening barrier is recorded lazily: an empty chain leaves no
    /// trace in the history.
    pub fn begin_change_chain(&mut self) {
        debug_assert_eq!(self.chain, ChainState::None, "nested change chain");
        self.chain = ChainState::Pending;
        self.merge = MergeTag::None;
    }

    /// Close the bracket; appends the closing barrier iff the opening
    /// one was recorded
    pub fn end_change_chain(&mut self) {
        match self.chain {
            ChainState::Pending | ChainState::None => {}
            ChainState::Open => {
                self.add_node();
            }
        }
        self.chain = ChainState::None;
    }

    fn add_node(&mut self) -> ChangeId {
        let id = self.nodes.len();
        self.nodes.push(Change {
            next: Some(self.cur),
            ..Change::default()
        });
        self.nodes[self.cur].prev.push(id);
        self.cur = id;
        id
    }

    fn new_change(&mut self) -> ChangeId {
        if self.chain == ChainState::Pending {
            // first real change inside the chain: mark its beginning
            self.add_node();
            self.chain = ChainState::Open;
        }
        self.add_node()
    }

    /// Record `len` bytes inserted at `offset`
    pub fn record_insert(&mut self, offset: usize, len: usize) {
        debug_assert!(len > 0);
        if self.merge == self.prev_merge
            && self.merge == MergeTag::Insert
            && !self.nodes[self.cur].is_barrier()
        {
            let change = &mut self.nodes[self.cur];
            debug_assert_eq!(change.del_count, 0);
            change.ins_count += len;
            log::trace!("merged insert, ins_count={}", change.ins_count);
            return;
        }
        let id = self.new_change();
        let change = &mut self.nodes[id];
        change.offset = offset;
        change.ins_count = len;
    }

    /// Record deleted bytes. `move_after` makes undo leave the cursor
    /// after the re-inserted text (backspace).
    pub fn record_delete(&mut self, offset: usize, buf: Vec<u8>, move_after: bool) {
        debug_assert!(!buf.is_empty());
        if self.merge == self.prev_merge && !self.nodes[self.cur].is_barrier() {
            if self.merge == MergeTag::Delete {
                let change = &mut self.nodes[self.cur];
                debug_assert_eq!(change.ins_count, 0);
                change.del_count += buf.len();
                change.deleted.extend_from_slice(&buf);
                log::trace!("merged delete, del_count={}", change.del_count);
                return;
            }
            if self.merge == MergeTag::Erase {
                let change = &mut self.nodes[self.cur];
                debug_assert_eq!(change.ins_count, 0);
                change.del_count += buf.len();
                change.offset -= buf.len();
                let mut merged = buf;
                merged.extend_from_slice(&change.deleted);
                change.deleted = merged;
                log::trace!("merged erase, offset={}", change.offset);
                return;
            }
        }
        let id = self.new_change();
        let change = &mut self.nodes[id];
        change.offset = offset;
        change.del_count = buf.len();
        change.move_after = move_after;
        change.deleted = buf;
    }

    /// Record a replace; never merges
    pub fn record_replace(&mut self, offset: usize, deleted: Vec<u8>, ins_count: usize) {
        debug_assert!(!deleted.is_empty() || ins_count > 0);
        let id = self.new_change();
        let change = &mut self.nodes[id];
        change.offset = offset;
        change.del_count = deleted.len();
        change.ins_count = ins_count;
        change.deleted = deleted;
    }
}

impl Default for ChangeTree {
    fn default() -> Self {
        Self::new()
    }
}
