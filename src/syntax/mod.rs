//! Syntax state machines
//!
//! A syntax is a set of named states; each state owns an ordered list
//! of conditions and a default action taken when none of them match.
//! Subsyntaxes referenced through `sub:retstate` destinations are
//! inlined by copy with a fresh name prefix; heredoc subsyntaxes are
//! entered at runtime instead, because their end delimiter is captured
//! dynamically.

pub mod hl;
pub mod parse;

use crate::color::{ColorId, ColorScheme};

pub type StateId = usize;
pub type SyntaxId = usize;

/// Sentinel syntax id used for list references inside a syntax that has
/// not been registered yet; rewritten when the syntax is added to a set
pub(crate) const PENDING_SYNTAX: SyntaxId = usize::MAX;

/// Fixed 256-bit character set, bitmap layout
#[derive(Clone, PartialEq, Eq)]
pub struct BitSet256 {
    bits: [u8; 32],
}

impl BitSet256 {
    #[must_use]
    pub fn new() -> Self {
        BitSet256 { bits: [0; 32] }
    }

    /// Build from a pattern with `a-z` style ranges
    #[must_use]
    pub fn from_pattern(pattern: &[u8]) -> Self {
        let mut set = Self::new();
        let mut i = 0;
        while i < pattern.len() {
            let lo = pattern[i];
            set.set(lo);
            if i + 2 < pattern.len() && pattern[i + 1] == b'-' {
                for ch in lo..=pattern[i + 2] {
                    set.set(ch);
                }
                i += 2;
            }
            i += 1;
        }
        set
    }

    pub fn set(&mut self, byte: u8) {
        self.bits[usize::from(byte) / 8] |= 1 << (byte & 7);
    }

    #[must_use]
    pub fn contains(&self, byte: u8) -> bool {
        self.bits[usize::from(byte) / 8] & (1 << (byte & 7)) != 0
    }

    pub fn invert(&mut self) {
        for b in &mut self.bits {
            *b = !*b;
        }
    }
}

impl Default for BitSet256 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BitSet256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BitSet256(..)")
    }
}

/// Where a transition goes: a state of the same syntax, or back to the
/// caller (`END`, valid only in subsyntaxes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    State(StateId),
    End,
}

/// Transition plus the color its consumed bytes are painted with
#[derive(Debug, Clone, Default)]
pub struct Action {
    /// `None` only for recolor conditions, which do not transition
    pub dest: Option<Destination>,
    /// Emit name; falls back to the destination state's emit name
    pub emit_name: Option<String>,
    /// Resolved against a color scheme by [`SyntaxSet::update_colors`]
    pub emit_color: Option<ColorId>,
}

/// Reference to a word list; the list lives in the syntax that defined
/// it, which copies made by subsyntax inlining keep pointing at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRef {
    pub syntax: SyntaxId,
    pub list: usize,
}

#[derive(Debug, Clone)]
pub enum CondKind {
    /// Byte in set: eats one byte
    CharSet { bitmap: BitSet256 },
    /// Byte in set, also opening or extending the buffered run
    CharSetBuffered { bitmap: BitSet256 },
    /// Buffered run equals the string
    BufIs { s: Vec<u8>, icase: bool },
    /// Buffered run is a member of the list (linear scan)
    InList { list: ListRef },
    /// Buffered run is a member of the list (bucketed lookup)
    InListHash { list: ListRef },
    /// Literal lookahead
    Str { s: Vec<u8> },
    StrIcase { s: Vec<u8> },
    /// Two-byte case-sensitive literal, the common case
    Str2 { s: [u8; 2] },
    /// Repaint the last `len` emitted bytes; matches unconditionally
    /// and does not eat or transition
    Recolor { len: usize },
    /// Repaint the buffered run
    RecolorBuffer,
    /// The line continues with the dynamically installed heredoc
    /// delimiter
    HeredocEnd,
}

#[derive(Debug, Clone)]
pub struct Condition {
    pub kind: CondKind,
    pub action: Action,
}

/// Default action flavor, taken when no condition matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    /// Advance one byte and transition
    Eat,
    /// Transition without advancing
    Noeat,
    /// Transition without advancing, preserving the buffered run
    NoeatBuffer,
    /// Capture the buffered run as a heredoc delimiter and enter the
    /// configured subsyntax
    HeredocBegin,
}

#[derive(Debug, Clone)]
pub struct State {
    pub name: String,
    pub emit_name: String,
    pub conds: Vec<Condition>,
    /// `None` until the state body's terminator line is parsed
    pub kind: Option<StateKind>,
    /// Default action; for `HeredocBegin` its destination is the return
    /// state
    pub action: Action,
    pub heredoc_subsyntax: Option<SyntaxId>,
    pub(crate) defined: bool,
    /// Copied in by subsyntax inlining; exempt from the unreachable
    /// lint
    pub(crate) copied: bool,
}

impl State {
    fn undefined(name: &str) -> Self {
        State {
            name: name.to_string(),
            emit_name: String::new(),
            conds: Vec::new(),
            kind: None,
            action: Action::default(),
            heredoc_subsyntax: None,
            defined: false,
            copied: false,
        }
    }
}

const LIST_HASH_BUCKETS: usize = 62;

fn buf_hash(s: &[u8]) -> u32 {
    s.iter().fold(0u32, |h, &b| {
        (h << 5)
            .wrapping_sub(h)
            .wrapping_add(u32::from(b.to_ascii_lowercase()))
    })
}

/// A named word list with a precomputed bucketed index
#[derive(Debug, Clone, Default)]
pub struct StringList {
    pub name: String,
    pub icase: bool,
    pub(crate) defined: bool,
    pub(crate) used: bool,
    pub words: Vec<Vec<u8>>,
    buckets: Vec<Vec<usize>>,
}

impl StringList {
    pub(crate) fn define(&mut self, icase: bool, words: Vec<Vec<u8>>) {
        self.defined = true;
        self.icase = icase;
        self.words = words;
        self.buckets = vec![Vec::new(); LIST_HASH_BUCKETS];
        for (i, w) in self.words.iter().enumerate() {
            let idx = buf_hash(w) as usize % LIST_HASH_BUCKETS;
            self.buckets[idx].push(i);
        }
    }

    fn word_eq(&self, w: &[u8], s: &[u8]) -> bool {
        if self.icase {
            w.eq_ignore_ascii_case(s)
        } else {
            w == s
        }
    }

    /// Linear membership scan
    #[must_use]
    pub fn contains(&self, s: &[u8]) -> bool {
        self.words.iter().any(|w| self.word_eq(w, s))
    }

    /// Bucketed membership lookup for large lists
    #[must_use]
    pub fn contains_hashed(&self, s: &[u8]) -> bool {
        if self.buckets.is_empty() {
            return false;
        }
        let idx = buf_hash(s) as usize % LIST_HASH_BUCKETS;
        self.buckets[idx].iter().any(|&i| self.word_eq(&self.words[i], s))
    }
}

/// One loaded syntax
#[derive(Debug, Clone)]
pub struct Syntax {
    pub name: String,
    /// State 0 is the entry state
    pub states: Vec<State>,
    pub lists: Vec<StringList>,
    /// `default COLOR NAME...` emit aliases, first element the color
    pub default_colors: Vec<Vec<String>>,
    /// Set when the definition references the sentinel `END`
    pub subsyntax: bool,
    /// Contains a `heredocend` condition
    pub heredoc: bool,
    /// Referenced by another syntax
    pub(crate) used: bool,
}

impl Syntax {
    pub(crate) fn new(name: &str) -> Self {
        Syntax {
            name: name.to_string(),
            states: Vec::new(),
            lists: Vec::new(),
            default_colors: Vec::new(),
            subsyntax: false,
            heredoc: false,
            used: false,
        }
    }

    #[must_use]
    pub fn find_state(&self, name: &str) -> Option<StateId> {
        self.states.iter().position(|s| s.name == name)
    }

    #[must_use]
    pub fn find_list(&self, name: &str) -> Option<usize> {
        self.lists.iter().position(|l| l.name == name)
    }

    pub(crate) fn add_state_ref(&mut self, name: &str) -> StateId {
        match self.find_state(name) {
            Some(id) => id,
            None => {
                self.states.push(State::undefined(name));
                self.states.len() - 1
            }
        }
    }

    fn find_default_color(&self, emit: &str) -> Option<&str> {
        for entry in &self.default_colors {
            if entry.iter().skip(1).any(|n| n == emit) {
                return Some(&entry[0]);
            }
        }
        None
    }
}

/// All loaded syntaxes; heredoc frames reference subsyntax states
/// across syntax boundaries through this arena
#[derive(Debug, Default)]
pub struct SyntaxSet {
    pub syntaxes: Vec<Syntax>,
}

impl SyntaxSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn syntax(&self, id: SyntaxId) -> &Syntax {
        &self.syntaxes[id]
    }

    /// Find a syntax by name, subsyntaxes included
    #[must_use]
    pub fn find_any(&self, name: &str) -> Option<SyntaxId> {
        self.syntaxes.iter().position(|s| s.name == name)
    }

    /// Find a main (non-sub) syntax by name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<SyntaxId> {
        match self.find_any(name) {
            Some(id) if !self.syntaxes[id].subsyntax => Some(id),
            _ => None,
        }
    }

    #[must_use]
    pub fn list(&self, r: ListRef) -> &StringList {
        &self.syntaxes[r.syntax].lists[r.list]
    }

    /// Copy a subsyntax's states into `dst` with a fresh name prefix,
    /// rewriting literal `END` destinations to `ret`. Returns the id of
    /// the copied entry state in `dst`.
    pub(crate) fn merge_syntax(&mut self, dst: &mut Syntax, sub: SyntaxId, ret: Destination) -> StateId {
        let base = dst.states.len();
        let prefix = format!("{}-", base);
        let copies: Vec<State> = self.syntaxes[sub].states.clone();
        log::debug!(
            "inlining subsyntax {} into {} ({} states)",
            self.syntaxes[sub].name,
            dst.name,
            copies.len()
        );

        for mut st in copies {
            st.name = format!("{}{}", prefix, st.name);
            st.copied = true;
            for cond in &mut st.conds {
                rewrite_dest(&mut cond.action, base, ret);
            }
            rewrite_dest(&mut st.action, base, ret);
            dst.states.push(st);
        }

        self.syntaxes[sub].used = true;
        base
    }

    /// Resolve every action's emit name into a color id.
    ///
    /// Lookup order: `syntax.emit`, then the syntax's `default` alias
    /// for the emit name as `syntax.alias`.
    pub fn update_colors(&mut self, scheme: &ColorScheme) {
        for syn in &mut self.syntaxes {
            let mut resolved: Vec<(usize, Option<usize>, Option<ColorId>)> = Vec::new();
            for (si, st) in syn.states.iter().enumerate() {
                for (ci, cond) in st.conds.iter().enumerate() {
                    resolved.push((si, Some(ci), resolve_color(syn, scheme, &cond.action)));
                }
                resolved.push((si, None, resolve_color(syn, scheme, &st.action)));
            }
            for (si, ci, color) in resolved {
                match ci {
                    Some(ci) => syn.states[si].conds[ci].action.emit_color = color,
                    None => syn.states[si].action.emit_color = color,
                }
            }
        }
    }
}

fn rewrite_dest(action: &mut Action, base: StateId, ret: Destination) {
    match action.dest {
        Some(Destination::State(id)) => action.dest = Some(Destination::State(base + id)),
        Some(Destination::End) => action.dest = Some(ret),
        None => {}
    }
}

fn resolve_color(syn: &Syntax, scheme: &ColorScheme, action: &Action) -> Option<ColorId> {
    let emit: &str = match &action.emit_name {
        Some(name) => name,
        None => match action.dest {
            Some(Destination::State(id)) => &syn.states[id].emit_name,
            _ => return None,
        },
    };
    if let Some(id) = scheme.find(&format!("{}.{}", syn.name, emit)) {
        return Some(id);
    }
    let alias = syn.find_default_color(emit)?;
    scheme.find(&format!("{}.{}", syn.name, alias))
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
