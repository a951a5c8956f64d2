//! Incremental highlighting
//!
//! One highlighter state per line start is cached in the buffer. After
//! an edit only the states at and after the change are invalidated;
//! [`fill_start_states`] recomputes them lazily before a repaint and
//! stops early when a recomputed state structurally equals the cached
//! one (the hole "heals").

use std::sync::Arc;

use crate::buffer::iter::BlockIter;
use crate::buffer::Buffer;
use crate::color::ColorId;
use crate::syntax::{CondKind, Destination, StateId, StateKind, SyntaxId, SyntaxSet};

/// One level of the highlighter's runtime stack.
///
/// The bottom frame runs the main syntax. Deeper frames are heredoc
/// bodies: they carry the captured delimiter and the caller state to
/// return to, which is what makes two mid-heredoc states semantically
/// distinct even when their state ids agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlFrame {
    pub syntax: SyntaxId,
    pub state: StateId,
    pub heredoc: Option<HeredocFrame>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeredocFrame {
    /// End delimiter captured from the begin line
    pub delim: Vec<u8>,
    /// Destination in the caller once the delimiter is seen
    pub ret: Destination,
}

/// Highlighter state at the start of a line.
///
/// Structural equality (the derived one) compares stack depth, the
/// identity of every state in the stack and, for heredoc frames, the
/// captured delimiter; it is what hole healing uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlState {
    frames: Vec<HlFrame>,
}

impl HlState {
    #[must_use]
    pub fn initial(syntax: SyntaxId) -> Self {
        HlState {
            frames: vec![HlFrame {
                syntax,
                state: 0,
                heredoc: None,
            }],
        }
    }

    #[must_use]
    pub fn top(&self) -> &HlFrame {
        self.frames.last().expect("empty highlighter stack")
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn transition(&mut self, dest: Destination) {
        let mut dest = dest;
        loop {
            match dest {
                Destination::State(id) => {
                    self.frames.last_mut().expect("empty highlighter stack").state = id;
                    return;
                }
                Destination::End => {
                    if self.frames.len() == 1 {
                        debug_assert!(false, "END transition at the bottom of the stack");
                        return;
                    }
                    let frame = self.frames.pop().expect("empty highlighter stack");
                    let heredoc = frame
                        .heredoc
                        .expect("only heredoc frames are entered at runtime");
                    dest = heredoc.ret;
                }
            }
        }
    }
}

/// Per-buffer highlight bookkeeping, present while a syntax is attached
#[derive(Debug)]
pub struct HlData {
    pub set: Arc<SyntaxSet>,
    pub syntax: SyntaxId,
    /// `states[i]` is the state at the start of line `i`; entries at
    /// `first_hole` and beyond may be absent or stale
    pub states: Vec<Option<HlState>>,
    /// First line whose start state is unknown or unverified
    pub first_hole: usize,
}

/// Run the state machine over one line.
///
/// `line` should include the terminating newline unless it is the last
/// line. Fills `colors` with one color per byte and returns the next
/// line's start state.
pub fn highlight_line(
    set: &SyntaxSet,
    start: &HlState,
    line: &[u8],
    colors: &mut Vec<Option<ColorId>>,
) -> HlState {
    let mut hl = start.clone();
    colors.clear();
    colors.resize(line.len(), None);

    let len = line.len();
    let mut i = 0usize;
    // start of the buffered run, when one is open
    let mut sidx: Option<usize> = None;

    'top: while i < len {
        let (cur_syn, cur_state) = {
            let top = hl.top();
            (top.syntax, top.state)
        };
        let state = &set.syntaxes[cur_syn].states[cur_state];
        let ch = line[i];

        for cond in &state.conds {
            match &cond.kind {
                CondKind::CharSet { bitmap } => {
                    if bitmap.contains(ch) {
                        colors[i] = cond.action.emit_color;
                        i += 1;
                        sidx = None;
                        hl.transition(cond.action.dest.expect("char condition without destination"));
                        continue 'top;
                    }
                }
                CondKind::CharSetBuffered { bitmap } => {
                    if bitmap.contains(ch) {
                        sidx.get_or_insert(i);
                        colors[i] = cond.action.emit_color;
                        i += 1;
                        hl.transition(cond.action.dest.expect("char condition without destination"));
                        continue 'top;
                    }
                }
                CondKind::BufIs { s, icase } => {
                    if let Some(s0) = sidx {
                        let run = &line[s0..i];
                        let hit = if *icase {
                            run.eq_ignore_ascii_case(s)
                        } else {
                            run == &s[..]
                        };
                        if hit {
                            for c in &mut colors[s0..i] {
                                *c = cond.action.emit_color;
                            }
                            sidx = None;
                            hl.transition(cond.action.dest.expect("bufis without destination"));
                            continue 'top;
                        }
                    }
                }
                CondKind::InList { list } => {
                    if let Some(s0) = sidx {
                        if set.list(*list).contains(&line[s0..i]) {
                            for c in &mut colors[s0..i] {
                                *c = cond.action.emit_color;
                            }
                            sidx = None;
                            hl.transition(cond.action.dest.expect("inlist without destination"));
                            continue 'top;
                        }
                    }
                }
                CondKind::InListHash { list } => {
                    if let Some(s0) = sidx {
                        if set.list(*list).contains_hashed(&line[s0..i]) {
                            for c in &mut colors[s0..i] {
                                *c = cond.action.emit_color;
                            }
                            sidx = None;
                            hl.transition(cond.action.dest.expect("inlist without destination"));
                            continue 'top;
                        }
                    }
                }
                CondKind::Str { s } => {
                    if len - i >= s.len() && &line[i..i + s.len()] == &s[..] {
                        for c in &mut colors[i..i + s.len()] {
                            *c = cond.action.emit_color;
                        }
                        i += s.len();
                        sidx = None;
                        hl.transition(cond.action.dest.expect("str without destination"));
                        continue 'top;
                    }
                }
                CondKind::StrIcase { s } => {
                    if len - i >= s.len() && line[i..i + s.len()].eq_ignore_ascii_case(s) {
                        for c in &mut colors[i..i + s.len()] {
                            *c = cond.action.emit_color;
                        }
                        i += s.len();
                        sidx = None;
                        hl.transition(cond.action.dest.expect("str without destination"));
                        continue 'top;
                    }
                }
                CondKind::Str2 { s } => {
                    if ch == s[0] && i + 1 < len && line[i + 1] == s[1] {
                        colors[i] = cond.action.emit_color;
                        colors[i + 1] = cond.action.emit_color;
                        i += 2;
                        sidx = None;
                        hl.transition(cond.action.dest.expect("str without destination"));
                        continue 'top;
                    }
                }
                CondKind::Recolor { len: n } => {
                    // repaints and falls through to the next condition
                    let lo = i.saturating_sub(*n);
                    for c in &mut colors[lo..i] {
                        *c = cond.action.emit_color;
                    }
                }
                CondKind::RecolorBuffer => {
                    if let Some(s0) = sidx.take() {
                        for c in &mut colors[s0..i] {
                            *c = cond.action.emit_color;
                        }
                    }
                }
                CondKind::HeredocEnd => {
                    let delim_len = match &hl.top().heredoc {
                        Some(hd) if line[i..].starts_with(&hd.delim) => Some(hd.delim.len()),
                        _ => None,
                    };
                    if let Some(n) = delim_len {
                        for c in &mut colors[i..i + n] {
                            *c = cond.action.emit_color;
                        }
                        i += n;
                        sidx = None;
                        hl.transition(cond.action.dest.expect("heredocend without destination"));
                        continue 'top;
                    }
                }
            }
        }

        match state.kind.expect("state without a default action") {
            StateKind::Eat => {
                colors[i] = state.action.emit_color;
                i += 1;
                sidx = None;
                hl.transition(state.action.dest.expect("eat without destination"));
            }
            StateKind::Noeat => {
                sidx = None;
                hl.transition(state.action.dest.expect("noeat without destination"));
            }
            StateKind::NoeatBuffer => {
                hl.transition(state.action.dest.expect("noeat without destination"));
            }
            StateKind::HeredocBegin => {
                let delim = sidx.take().map(|s0| line[s0..i].to_vec()).unwrap_or_default();
                let sub = state
                    .heredoc_subsyntax
                    .expect("heredocbegin without a subsyntax");
                let ret = state.action.dest.expect("heredocbegin without a return state");
                log::trace!("heredoc begins, delim {:?}", String::from_utf8_lossy(&delim));
                hl.frames.push(HlFrame {
                    syntax: sub,
                    state: 0,
                    heredoc: Some(HeredocFrame { delim, ret }),
                });
            }
        }
    }

    hl
}

fn truncate_states(hl: &mut HlData, count: usize) {
    debug_assert!(hl.first_hole <= hl.states.len());
    hl.states.truncate(count);
    if hl.first_hole > hl.states.len() {
        hl.first_hole = hl.states.len();
    }
}

/// Move the hole back to `idx`, clearing the entry the old hole may
/// have been left pointing at (filling can leave `first_hole` on a
/// non-empty entry)
fn new_hole(hl: &mut HlData, idx: usize) {
    if idx >= hl.first_hole {
        return;
    }
    if hl.first_hole < hl.states.len() {
        hl.states[hl.first_hole] = None;
    }
    hl.first_hole = idx;
}

fn find_hole(hl: &mut HlData, mut pos: usize) {
    while pos < hl.states.len() && hl.states[pos].is_some() {
        pos += 1;
    }
    hl.first_hole = pos;
}

/// Recompute start states so that every line up to and including
/// `line_nr` has a verified one. Called lazily before any screen draw.
pub fn fill_start_states(buf: &mut Buffer, line_nr: usize) {
    let Buffer { blocks, hl, .. } = buf;
    let Some(hl) = hl.as_mut() else {
        return;
    };
    let set = Arc::clone(&hl.set);
    let mut colors = Vec::new();

    let mut bi = BlockIter::at_bof(blocks);
    let mut current_line = 0usize;
    loop {
        debug_assert!(hl.first_hole <= hl.states.len());
        if hl.first_hole > line_nr {
            break;
        }

        // go to the line before the first hole
        for _ in current_line..hl.first_hole - 1 {
            bi.next_line();
        }
        current_line = hl.first_hole - 1;
        let idx = current_line;

        let line = bi.line_nl_ref();
        let start = hl.states[idx].clone().expect("no state before the hole");
        let next = highlight_line(&set, &start, line, &mut colors);

        let idx = idx + 1;
        debug_assert!(idx <= hl.states.len());
        if idx == hl.states.len() {
            hl.states.push(Some(next));
            hl.first_hole = hl.states.len();
        } else if hl.states[idx].is_none() {
            hl.states[idx] = Some(next);
            hl.first_hole += 1;
        } else if hl.states[idx].as_ref() == Some(&next) {
            // hole successfully closed, find the next one
            find_hole(hl, idx + 1);
        } else {
            // hole filled but the state changed
            hl.states[idx] = Some(next);
            hl.first_hole = idx + 1;
        }
    }
}

/// Paint one line for display.
///
/// The caller must have filled start states up to `line_nr`. Returns
/// the per-byte colors and whether the next line's start state changed
/// (meaning the repaint must continue past this line).
pub fn hl_line(
    buf: &mut Buffer,
    line: &[u8],
    line_nr: usize,
    colors: &mut Vec<Option<ColorId>>,
) -> bool {
    let Some(hl) = buf.hl.as_mut() else {
        colors.clear();
        colors.resize(line.len(), None);
        return false;
    };
    debug_assert!(line_nr < hl.states.len());

    let set = Arc::clone(&hl.set);
    let start = hl.states[line_nr].clone().expect("unfilled start state");
    let next = highlight_line(&set, &start, line, colors);

    let idx = line_nr + 1;
    let mut next_changed = false;
    if idx == hl.states.len() {
        hl.states.push(Some(next));
        hl.first_hole = hl.states.len();
        next_changed = true;
    } else if hl.states[idx].is_none() {
        hl.states[idx] = Some(next);
        // this can leave first_hole pointing at a filled entry
        hl.first_hole = idx + 1;
        next_changed = true;
    } else if idx == hl.first_hole {
        if hl.states[idx].as_ref() == Some(&next) {
            // hole successfully closed
            find_hole(hl, idx + 1);
        } else {
            hl.states[idx] = Some(next);
            hl.first_hole = idx + 1;
            next_changed = true;
        }
    } else {
        debug_assert!(hl.states[idx].as_ref() == Some(&next), "stale start state");
    }
    next_changed
}

/// Called after text insertion to invalidate start states.
///
/// `first` is the first modified line, `lines` the number of inserted
/// newlines.
pub(crate) fn hl_insert(buf: &mut Buffer, first: usize, lines: usize) {
    let Some(hl) = buf.hl.as_mut() else {
        return;
    };
    let last = first + lines;

    if first >= hl.states.len() {
        // nothing to rehighlight
        return;
    }

    if last + 1 >= hl.states.len() {
        // the last already highlighted lines changed; nothing to gain,
        // throw them away
        truncate_states(hl, first + 1);
        log::trace!("hl_insert: truncated to {} states", first + 1);
        return;
    }

    // add room for the new lines' start states
    if lines > 0 {
        hl.states
            .splice(first + 1..first + 1, std::iter::repeat_with(|| None).take(lines));
    }

    // invalidate the start states right after the changed lines
    for i in first + 1..=last + 1 {
        hl.states[i] = None;
    }
    new_hole(hl, first + 1);
    log::trace!("hl_insert: hole at {}", hl.first_hole);
}

/// Called after text deletion to invalidate start states.
///
/// `first` is the first modified line, `deleted_nl` the number of
/// deleted newlines.
pub(crate) fn hl_delete(buf: &mut Buffer, first: usize, deleted_nl: usize) {
    let Some(hl) = buf.hl.as_mut() else {
        return;
    };
    let last = first + deleted_nl;

    if hl.states.len() == 1 {
        return;
    }

    if first >= hl.states.len() {
        // nothing to highlight
        return;
    }

    if last + 1 >= hl.states.len() {
        // the last already highlighted lines changed; nothing to gain,
        // throw them away
        let keep = hl.states.len() - deleted_nl.min(hl.states.len() - 1);
        truncate_states(hl, keep);
        log::trace!("hl_delete: truncated to {} states", hl.states.len());
        return;
    }

    // drop the deleted lines' start states
    if deleted_nl > 0 {
        hl.states.drain(first + 1..first + 1 + deleted_nl);
    }

    // invalidate the line state after the changed line
    hl.states[first + 1] = None;
    new_hole(hl, first + 1);
    log::trace!("hl_delete: hole at {}", hl.first_hole);
}

#[cfg(test)]
#[path = "hl_tests.rs"]
mod tests;
