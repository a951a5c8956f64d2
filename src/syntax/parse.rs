//! Syntax description parser
//!
//! The format is line oriented and whitespace insensitive: `syntax`
//! opens a definition, `state` begins a state whose body is condition
//! lines followed by one terminator (`eat`, `noeat` or
//! `heredocbegin`), `list` defines word lists and `default` aliases
//! emit names to a color. A definition referencing the sentinel state
//! `END` becomes a subsyntax.
//!
//! Errors carry file and line; a failed syntax is dropped and the
//! session continues.

use std::path::Path;

use crate::error::{CoreError, Result};
use crate::syntax::{
    Action, BitSet256, CondKind, Condition, Destination, ListRef, StateId, StateKind, Syntax,
    SyntaxId, SyntaxSet, PENDING_SYNTAX,
};

/// Lists at least this large get the bucketed membership lookup
const LIST_HASH_MIN: usize = 8;

/// Parse syntax definitions from a string, registering them into `set`.
///
/// Returns the id of the last main (non-sub) syntax defined. `label` is
/// used in error positions, the way a file name would be.
pub fn load_syntax_str(set: &mut SyntaxSet, label: &str, text: &str) -> Result<SyntaxId> {
    let mut parser = Parser {
        set,
        file: label.to_string(),
        line_nr: 0,
        syntax: None,
        state: None,
        last_main: None,
    };
    for (nr, line) in text.lines().enumerate() {
        parser.line_nr = nr + 1;
        parser.dispatch_line(line)?;
    }
    parser.finish_syntax()?;
    parser
        .last_main
        .ok_or_else(|| CoreError::in_file(label, 0, "no main syntax defined"))
}

/// Thin file loader around [`load_syntax_str`]
pub fn load_syntax_file(set: &mut SyntaxSet, path: &Path) -> Result<SyntaxId> {
    let text = std::fs::read_to_string(path)?;
    let label = path.to_string_lossy();
    load_syntax_str(set, &label, &text)
}

struct Parser<'a> {
    set: &'a mut SyntaxSet,
    file: String,
    line_nr: usize,
    syntax: Option<Syntax>,
    state: Option<StateId>,
    last_main: Option<SyntaxId>,
}

impl Parser<'_> {
    fn err(&self, msg: impl Into<String>) -> CoreError {
        CoreError::in_file(&self.file, self.line_nr, msg)
    }

    fn dispatch_line(&mut self, line: &str) -> Result<()> {
        let tokens = tokenize(line).map_err(|e| self.err(e))?;
        if tokens.is_empty() {
            return Ok(());
        }
        let cmd = tokens[0].as_str();
        let (flags, args) = split_flags(&tokens[1..]);

        match cmd {
            "syntax" => self.cmd_syntax(&args),
            "state" => self.cmd_state(&args),
            "char" => self.cmd_char(&flags, &args),
            "bufis" => self.cmd_bufis(&flags, &args),
            "str" => self.cmd_str(&flags, &args),
            "inlist" => self.cmd_inlist(&args),
            "recolor" => self.cmd_recolor(&args),
            "heredocend" => self.cmd_heredocend(&args),
            "eat" => self.cmd_eat(&args),
            "noeat" => self.cmd_noeat(&flags, &args),
            "heredocbegin" => self.cmd_heredocbegin(&args),
            "list" => self.cmd_list(&flags, &args),
            "default" => self.cmd_default(&args),
            _ => Err(self.err(format!("Unknown command {}", cmd))),
        }
    }

    // ---- context helpers ----

    fn syntax_mut(&mut self) -> Result<&mut Syntax> {
        if self.syntax.is_none() {
            return Err(self.err("No syntax started"));
        }
        Ok(self.syntax.as_mut().expect("checked above"))
    }

    fn state_id(&self) -> Result<StateId> {
        match (self.syntax.as_ref(), self.state) {
            (None, _) => Err(self.err("No syntax started")),
            (_, None) => Err(self.err("No state started")),
            (_, Some(id)) => Ok(id),
        }
    }

    /// A defined state must end with a terminator line
    fn close_state(&mut self) -> Result<()> {
        if let (Some(syn), Some(id)) = (self.syntax.as_ref(), self.state) {
            if syn.states[id].kind.is_none() {
                let name = syn.states[id].name.clone();
                self.state = None;
                return Err(self.err(format!("No default action in state {}", name)));
            }
        }
        self.state = None;
        Ok(())
    }

    fn add_state(&mut self, name: &str, defined: bool) -> Result<StateId> {
        if name == "END" {
            return Err(self.err("END is reserved state name"));
        }
        let err_exists = self.err(format!("State {} already exists.", name));
        let syn = self.syntax_mut()?;
        match syn.find_state(name) {
            None => {
                let id = syn.add_state_ref(name);
                syn.states[id].defined = defined;
                Ok(id)
            }
            Some(id) => {
                if !defined {
                    return Ok(id);
                }
                if !syn.states[id].defined {
                    // a previously referenced state gets defined now
                    syn.states[id].defined = true;
                    return Ok(id);
                }
                Err(err_exists)
            }
        }
    }

    /// Resolve a destination name: a state reference, the sentinel
    /// `END`, or a `subsyntax:returnstate` call that inlines the
    /// subsyntax by copy
    fn destination_state(&mut self, name: &str) -> Result<Destination> {
        if let Some((sub_name, ret_name)) = name.split_once(':') {
            let sub = match self.set.find_any(sub_name) {
                Some(id) => id,
                None => return Err(self.err(format!("No such syntax {}", sub_name))),
            };
            if !self.set.syntaxes[sub].subsyntax {
                return Err(self.err(format!("Syntax {} is not subsyntax", sub_name)));
            }
            let ret = if ret_name == "END" {
                self.syntax_mut()?.subsyntax = true;
                Destination::End
            } else {
                Destination::State(self.add_state(ret_name, false)?)
            };
            let syn = self.syntax.as_mut().expect("checked by add_state");
            let entry = self.set.merge_syntax(syn, sub, ret);
            return Ok(Destination::State(entry));
        }
        if name == "END" {
            self.syntax_mut()?.subsyntax = true;
            return Ok(Destination::End);
        }
        Ok(Destination::State(self.add_state(name, false)?))
    }

    fn add_condition(
        &mut self,
        kind: CondKind,
        dest: Option<&str>,
        emit: Option<&str>,
    ) -> Result<()> {
        let id = self.state_id()?;
        let dest = match dest {
            Some(name) => Some(self.destination_state(name)?),
            None => None,
        };
        let cond = Condition {
            kind,
            action: Action {
                dest,
                emit_name: emit.map(str::to_string),
                emit_color: None,
            },
        };
        self.syntax
            .as_mut()
            .expect("state_id checked the syntax")
            .states[id]
            .conds
            .push(cond);
        Ok(())
    }

    // ---- commands ----

    fn cmd_syntax(&mut self, args: &[String]) -> Result<()> {
        check_args(args, 1, 1).map_err(|e| self.err(e))?;
        self.finish_syntax()?;
        self.syntax = Some(Syntax::new(&args[0]));
        self.state = None;
        Ok(())
    }

    fn cmd_state(&mut self, args: &[String]) -> Result<()> {
        check_args(args, 1, 2).map_err(|e| self.err(e))?;
        self.close_state()?;
        self.syntax_mut()?;
        let id = self.add_state(&args[0], true)?;
        let emit = args.get(1).unwrap_or(&args[0]).clone();
        let syn = self.syntax.as_mut().expect("just checked");
        syn.states[id].emit_name = emit;
        self.state = Some(id);
        Ok(())
    }

    fn cmd_char(&mut self, flags: &str, args: &[String]) -> Result<()> {
        check_args(args, 2, 3).map_err(|e| self.err(e))?;
        let buffered = flags.contains('b');
        let mut bitmap = BitSet256::from_pattern(args[0].as_bytes());
        if flags.contains('n') {
            bitmap.invert();
        }
        let kind = if buffered {
            CondKind::CharSetBuffered { bitmap }
        } else {
            CondKind::CharSet { bitmap }
        };
        self.add_condition(kind, Some(&args[1]), args.get(2).map(String::as_str))
    }

    fn cmd_bufis(&mut self, flags: &str, args: &[String]) -> Result<()> {
        check_args(args, 2, 3).map_err(|e| self.err(e))?;
        let kind = CondKind::BufIs {
            s: args[0].as_bytes().to_vec(),
            icase: flags.contains('i'),
        };
        self.add_condition(kind, Some(&args[1]), args.get(2).map(String::as_str))
    }

    fn cmd_str(&mut self, flags: &str, args: &[String]) -> Result<()> {
        check_args(args, 2, 3).map_err(|e| self.err(e))?;
        let icase = flags.contains('i');
        let bytes = args[0].as_bytes();
        // strings of length 2 are very common
        let kind = if !icase && bytes.len() == 2 {
            CondKind::Str2 {
                s: [bytes[0], bytes[1]],
            }
        } else if icase {
            CondKind::StrIcase { s: bytes.to_vec() }
        } else {
            CondKind::Str { s: bytes.to_vec() }
        };
        self.add_condition(kind, Some(&args[1]), args.get(2).map(String::as_str))
    }

    fn cmd_inlist(&mut self, args: &[String]) -> Result<()> {
        check_args(args, 2, 3).map_err(|e| self.err(e))?;
        let name = &args[0];
        // without an explicit emit name the list name doubles as one
        let emit = args.get(2).unwrap_or(name).clone();
        self.state_id()?;
        let syn = self.syntax.as_mut().expect("state_id checked the syntax");
        let list = match syn.find_list(name) {
            Some(i) => i,
            None => {
                // reference to a list defined later
                syn.lists.push(crate::syntax::StringList {
                    name: name.clone(),
                    ..Default::default()
                });
                syn.lists.len() - 1
            }
        };
        syn.lists[list].used = true;
        let kind = CondKind::InList {
            list: ListRef {
                syntax: PENDING_SYNTAX,
                list,
            },
        };
        self.add_condition(kind, Some(&args[1]), Some(&emit))
    }

    fn cmd_recolor(&mut self, args: &[String]) -> Result<()> {
        check_args(args, 1, 2).map_err(|e| self.err(e))?;
        // without a length the buffered bytes are recolored
        let kind = match args.get(1) {
            Some(n) => {
                let len: usize = n
                    .parse()
                    .ok()
                    .filter(|&v| v > 0)
                    .ok_or_else(|| self.err("number of bytes must be larger than 0"))?;
                CondKind::Recolor { len }
            }
            None => CondKind::RecolorBuffer,
        };
        self.add_condition(kind, None, Some(&args[0]))
    }

    fn cmd_heredocend(&mut self, args: &[String]) -> Result<()> {
        check_args(args, 1, 2).map_err(|e| self.err(e))?;
        self.add_condition(
            CondKind::HeredocEnd,
            Some(&args[0]),
            args.get(1).map(String::as_str),
        )?;
        self.syntax_mut()?.heredoc = true;
        Ok(())
    }

    fn cmd_eat(&mut self, args: &[String]) -> Result<()> {
        check_args(args, 1, 2).map_err(|e| self.err(e))?;
        let id = self.state_id()?;
        let dest = self.destination_state(&args[0])?;
        let syn = self.syntax.as_mut().expect("state_id checked the syntax");
        syn.states[id].kind = Some(StateKind::Eat);
        syn.states[id].action = Action {
            dest: Some(dest),
            emit_name: args.get(1).cloned(),
            emit_color: None,
        };
        self.state = None;
        Ok(())
    }

    fn cmd_noeat(&mut self, flags: &str, args: &[String]) -> Result<()> {
        check_args(args, 1, 1).map_err(|e| self.err(e))?;
        let id = self.state_id()?;
        {
            let syn = self.syntax.as_ref().expect("state_id checked the syntax");
            if args[0] == syn.states[id].name {
                return Err(self.err("Using noeat to jump to the same state causes infinite loop"));
            }
        }
        let dest = self.destination_state(&args[0])?;
        let kind = if flags.contains('b') {
            StateKind::NoeatBuffer
        } else {
            StateKind::Noeat
        };
        let syn = self.syntax.as_mut().expect("state_id checked the syntax");
        syn.states[id].kind = Some(kind);
        syn.states[id].action = Action {
            dest: Some(dest),
            emit_name: None,
            emit_color: None,
        };
        self.state = None;
        Ok(())
    }

    fn cmd_heredocbegin(&mut self, args: &[String]) -> Result<()> {
        check_args(args, 2, 2).map_err(|e| self.err(e))?;
        let id = self.state_id()?;
        let sub = match self.set.find_any(&args[0]) {
            Some(s) => s,
            None => return Err(self.err(format!("No such syntax {}", args[0]))),
        };
        if !self.set.syntaxes[sub].subsyntax {
            return Err(self.err(format!("Syntax {} is not subsyntax", args[0])));
        }
        // the action destination doubles as the return state
        let ret = self.destination_state(&args[1])?;
        let syn = self.syntax.as_mut().expect("state_id checked the syntax");
        syn.states[id].kind = Some(StateKind::HeredocBegin);
        syn.states[id].action = Action {
            dest: Some(ret),
            emit_name: None,
            emit_color: None,
        };
        syn.states[id].heredoc_subsyntax = Some(sub);
        self.state = None;
        // merge() normally marks a subsyntax used, but heredoc
        // subsyntaxes are never merged at load time
        self.set.syntaxes[sub].used = true;
        Ok(())
    }

    fn cmd_list(&mut self, flags: &str, args: &[String]) -> Result<()> {
        check_args(args, 2, usize::MAX).map_err(|e| self.err(e))?;
        self.close_state()?;
        let icase = flags.contains('i');
        let err_exists = self.err(format!("List {} already exists.", args[0]));
        let syn = self.syntax_mut()?;
        let name = &args[0];
        let words: Vec<Vec<u8>> = args[1..].iter().map(|w| w.as_bytes().to_vec()).collect();
        match syn.find_list(name) {
            Some(i) => {
                if syn.lists[i].defined {
                    return Err(err_exists);
                }
                syn.lists[i].define(icase, words);
            }
            None => {
                let mut list = crate::syntax::StringList {
                    name: name.clone(),
                    ..Default::default()
                };
                list.define(icase, words);
                syn.lists.push(list);
            }
        }
        Ok(())
    }

    fn cmd_default(&mut self, args: &[String]) -> Result<()> {
        check_args(args, 2, usize::MAX).map_err(|e| self.err(e))?;
        self.close_state()?;
        self.syntax_mut()?
            .default_colors
            .push(args.to_vec());
        Ok(())
    }

    // ---- finalization ----

    fn finish_syntax(&mut self) -> Result<()> {
        self.close_state()?;
        let Some(mut syn) = self.syntax.take() else {
            return Ok(());
        };

        self.validate(&syn)?;

        // the syntax gets its slot now; rewrite its own list references
        let id = self.set.syntaxes.len();
        for st in &mut syn.states {
            for cond in &mut st.conds {
                match &mut cond.kind {
                    CondKind::InList { list } | CondKind::InListHash { list } => {
                        if list.syntax == PENDING_SYNTAX {
                            list.syntax = id;
                        }
                    }
                    _ => {}
                }
            }
        }
        // promote big lists to the bucketed lookup
        for st in &mut syn.states {
            for cond in &mut st.conds {
                if let CondKind::InList { list } = cond.kind {
                    let words = if list.syntax == id {
                        syn.lists[list.list].words.len()
                    } else {
                        self.set.list(list).words.len()
                    };
                    if words >= LIST_HASH_MIN {
                        cond.kind = CondKind::InListHash { list };
                    }
                }
            }
        }

        log::debug!(
            "loaded syntax {} ({} states, {} lists)",
            syn.name,
            syn.states.len(),
            syn.lists.len()
        );
        let main = !syn.subsyntax;
        self.set.syntaxes.push(syn);
        if main {
            self.last_main = Some(id);
        }
        Ok(())
    }

    fn validate(&self, syn: &Syntax) -> Result<()> {
        if syn.states.is_empty() {
            return Err(self.err("Empty syntax"));
        }
        for st in &syn.states {
            if !st.defined {
                // referenced but never defined
                return Err(self.err(format!("No such state {}", st.name)));
            }
        }
        for list in &syn.lists {
            if !list.defined {
                return Err(self.err(format!("No such list {}", list.name)));
            }
            if !list.used {
                return Err(self.err(format!("List {} never used", list.name)));
            }
        }
        if syn.heredoc && !syn.subsyntax {
            return Err(self.err("heredocend can be used only in subsyntaxes"));
        }
        if self.set.find_any(&syn.name).is_some() {
            return Err(self.err(format!("Syntax {} already exists", syn.name)));
        }

        // unreachable states; copies made by inlining are entered as
        // return states and get a pass
        let mut visited = vec![false; syn.states.len()];
        let mut stack = vec![0];
        while let Some(id) = stack.pop() {
            if visited[id] {
                continue;
            }
            visited[id] = true;
            let st = &syn.states[id];
            for cond in &st.conds {
                if let Some(Destination::State(d)) = cond.action.dest {
                    stack.push(d);
                }
            }
            if let Some(Destination::State(d)) = st.action.dest {
                stack.push(d);
            }
        }
        for (id, st) in syn.states.iter().enumerate() {
            if !visited[id] && !st.copied {
                return Err(self.err(format!("State {} is unreachable", st.name)));
            }
        }
        Ok(())
    }
}

fn check_args(args: &[String], min: usize, max: usize) -> std::result::Result<(), String> {
    if args.len() < min {
        return Err("Not enough arguments".to_string());
    }
    if args.len() > max {
        return Err("Too many arguments".to_string());
    }
    Ok(())
}

/// Leading `-x` tokens are flags; the rest are positional arguments
fn split_flags(tokens: &[String]) -> (String, Vec<String>) {
    let mut flags = String::new();
    let mut args = Vec::new();
    let mut flags_done = false;
    for tok in tokens {
        if !flags_done && tok.len() >= 2 && tok.starts_with('-') {
            flags.push_str(&tok[1..]);
        } else {
            flags_done = true;
            args.push(tok.clone());
        }
    }
    (flags, args)
}

/// Whitespace-separated tokens with double quoting and backslash
/// escapes; `#` at a token start comments out the rest of the line
fn tokenize(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        let Some(&first) = chars.peek() else {
            break;
        };
        if first == '#' {
            break;
        }

        let mut token = String::new();
        let mut quoted = false;
        while let Some(&c) = chars.peek() {
            if !quoted && c.is_whitespace() {
                break;
            }
            chars.next();
            match c {
                '"' => quoted = !quoted,
                '\\' => match chars.next() {
                    Some('t') => token.push('\t'),
                    Some('n') => token.push('\n'),
                    Some('r') => token.push('\r'),
                    Some(other) => token.push(other),
                    None => return Err("Trailing backslash".to_string()),
                },
                other => token.push(other),
            }
        }
        if quoted {
            return Err("Missing closing quote".to_string());
        }
        tokens.push(token);
    }
    Ok(tokens)
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
