//! Writer context: the registry of generated FunC functions.
//!
//! Every piece of output is registered under a name together with the names
//! it uses. Rendering walks those edges from the roots and emits only what is
//! reachable, so support code can be registered unconditionally and costs
//! nothing unless something uses it.

use std::mem;

use rustc_hash::{FxHashMap, FxHashSet};

/// Registry name of the entry point.
pub const MAIN: &str = "$main";

const INDENT: &str = "    ";

/// FunC function specifiers, rendered in declaration order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flag {
    Impure,
    Inline,
    MethodId,
}

impl Flag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Impure => "impure",
            Self::Inline => "inline",
            Self::MethodId => "method_id",
        }
    }
}

/// Where a registered function comes from.
///
/// User functions are always rendered; support functions only when
/// something reachable uses them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Origin {
    #[default]
    Support,
    User,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Code {
    Body(Vec<String>),
    Asm(String),
    Global(String),
    Main(Vec<String>),
}

#[derive(Clone, Debug)]
struct WrittenFunction {
    name: String,
    signature: Option<String>,
    flags: Vec<Flag>,
    code: Code,
    depends: Vec<String>,
    origin: Origin,
}

impl WrittenFunction {
    fn rendered_flags(&self) -> String {
        let mut out = String::new();
        for flag in &self.flags {
            out.push(' ');
            out.push_str(flag.as_str());
        }
        out
    }

    fn signature(&self) -> &str {
        match &self.signature {
            Some(signature) => signature,
            None => panic!("function `{}` has no signature", self.name),
        }
    }
}

/// A function whose declaration closure is still running.
#[derive(Debug, Default)]
struct PendingFunction {
    name: String,
    signature: Option<String>,
    flags: Vec<Flag>,
    code: Option<Code>,
    lines: Vec<String>,
    indent: usize,
    depends: Vec<String>,
    seen: FxHashSet<String>,
    origin: Origin,
}

impl PendingFunction {
    fn depend(&mut self, name: &str) {
        if name != self.name && self.seen.insert(name.to_string()) {
            self.depends.push(name.to_string());
        }
    }
}

/// Mutable emission session for one compilation.
///
/// Declarations may nest: a body can declare the helper it is about to use,
/// and the helper is finished before the outer body continues.
#[derive(Debug, Default)]
pub struct WriterContext {
    functions: Vec<WrittenFunction>,
    index: FxHashMap<String, usize>,
    pending: Vec<PendingFunction>,
    roots: Vec<String>,
}

impl WriterContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` is registered or currently being written.
    pub fn is_declared(&self, name: &str) -> bool {
        self.index.contains_key(name) || self.pending.iter().any(|p| p.name == name)
    }

    /// Declare function `name`, running `f` to fill it in.
    ///
    /// Declaring a name twice is a no-op; the first declaration wins.
    pub fn fun(&mut self, name: &str, f: impl FnOnce(&mut Self)) {
        if self.is_declared(name) {
            return;
        }
        self.pending.push(PendingFunction {
            name: name.to_string(),
            ..PendingFunction::default()
        });
        f(self);
        if let Some(pending) = self.pending.pop() {
            self.finish(pending);
        }
    }

    /// Declare the entry point. It is always rendered, last and verbatim.
    pub fn main(&mut self, f: impl FnOnce(&mut Self)) {
        self.fun(MAIN, |ctx| {
            ctx.origin(Origin::User);
            f(ctx);
            let current = ctx.current();
            let lines = mem::take(&mut current.lines);
            current.code = Some(Code::Main(lines));
        });
    }

    fn finish(&mut self, pending: PendingFunction) {
        debug_assert_eq!(
            pending.indent, 0,
            "unbalanced indentation in `{}`",
            pending.name
        );
        let Some(code) = pending.code else {
            panic!("function `{}` was declared without code", pending.name);
        };
        if matches!(code, Code::Body(_) | Code::Asm(_)) && pending.signature.is_none() {
            panic!("function `{}` has no signature", pending.name);
        }
        let mut flags = pending.flags;
        flags.sort_unstable();
        self.index.insert(pending.name.clone(), self.functions.len());
        self.functions.push(WrittenFunction {
            name: pending.name,
            signature: pending.signature,
            flags,
            code,
            depends: pending.depends,
            origin: pending.origin,
        });
    }

    fn current(&mut self) -> &mut PendingFunction {
        match self.pending.last_mut() {
            Some(pending) => pending,
            None => panic!("no function is being written"),
        }
    }

    pub fn signature(&mut self, signature: impl Into<String>) {
        self.current().signature = Some(signature.into());
    }

    pub fn flag(&mut self, flag: Flag) {
        let current = self.current();
        if !current.flags.contains(&flag) {
            current.flags.push(flag);
        }
    }

    pub fn origin(&mut self, origin: Origin) {
        self.current().origin = origin;
    }

    /// Shorthand for marking the current function as user code.
    pub fn user(&mut self) {
        self.origin(Origin::User);
    }

    /// Write the body of the current function; lines are indented one level.
    pub fn body(&mut self, f: impl FnOnce(&mut Self)) {
        self.current().indent += 1;
        f(self);
        let current = self.current();
        current.indent -= 1;
        let lines = mem::take(&mut current.lines);
        current.code = Some(Code::Body(lines));
    }

    /// Implement the current function as a TVM assembly snippet.
    pub fn asm(&mut self, code: impl Into<String>) {
        self.current().code = Some(Code::Asm(code.into()));
    }

    /// Make the current entry a global variable of FunC type `ty`.
    pub fn global(&mut self, ty: impl Into<String>) {
        self.current().code = Some(Code::Global(ty.into()));
    }

    /// Record that the code being written uses `name`, and return it.
    ///
    /// Outside of any function this marks `name` as a render root.
    pub fn used(&mut self, name: &str) -> String {
        match self.pending.last_mut() {
            Some(pending) => pending.depend(name),
            None => {
                if !self.roots.iter().any(|root| root == name) {
                    self.roots.push(name.to_string());
                }
            }
        }
        name.to_string()
    }

    /// Append one line at the current indentation.
    pub fn append(&mut self, line: impl AsRef<str>) {
        let current = self.current();
        let line = line.as_ref();
        if line.is_empty() {
            current.lines.push(String::new());
        } else {
            current
                .lines
                .push(format!("{}{line}", INDENT.repeat(current.indent)));
        }
    }

    /// Append a block of text, stripping its common leading whitespace.
    pub fn write(&mut self, text: &str) {
        let lines: Vec<&str> = text.lines().collect();
        let start = lines
            .iter()
            .position(|l| !l.trim().is_empty())
            .unwrap_or(lines.len());
        let end = lines
            .iter()
            .rposition(|l| !l.trim().is_empty())
            .map_or(start, |i| i + 1);
        let block = &lines[start..end];
        let margin = block
            .iter()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.len() - l.trim_start().len())
            .min()
            .unwrap_or(0);
        for line in block {
            if line.trim().is_empty() {
                self.append("");
            } else {
                self.append(&line[margin..]);
            }
        }
    }

    /// Run `f` one indentation level deeper.
    pub fn in_indent(&mut self, f: impl FnOnce(&mut Self)) {
        self.current().indent += 1;
        f(self);
        let current = self.current();
        debug_assert!(current.indent > 0, "dedent called with zero indent");
        current.indent = current.indent.saturating_sub(1);
    }

    /// Render every reachable function into one FunC program.
    ///
    /// # Panics
    ///
    /// Panics if a reachable name was never declared.
    pub fn render(self, debug: bool) -> String {
        debug_assert!(
            self.pending.is_empty(),
            "render called while a function is being written"
        );
        let reachable = self.reachable();
        let visible: Vec<&WrittenFunction> = self
            .functions
            .iter()
            .zip(&reachable)
            .filter_map(|(f, &keep)| keep.then_some(f))
            .collect();

        let mut sections = vec!["#pragma version >=0.4.0;\n#include \"stdlib.fc\";".to_string()];

        let globals: Vec<String> = visible
            .iter()
            .filter_map(|f| match &f.code {
                Code::Global(ty) => Some(format!("global {ty} {};", f.name)),
                _ => None,
            })
            .collect();
        push_section(&mut sections, &globals);

        let asm: Vec<String> = visible
            .iter()
            .filter_map(|f| match &f.code {
                Code::Asm(code) => Some(format!("{} asm \"{code}\";", f.signature())),
                _ => None,
            })
            .collect();
        push_section(&mut sections, &asm);

        let headers: Vec<String> = visible
            .iter()
            .filter(|f| matches!(f.code, Code::Body(_)) && !f.flags.contains(&Flag::MethodId))
            .map(|f| format!("{}{};", f.signature(), f.rendered_flags()))
            .collect();
        push_section(&mut sections, &headers);

        for f in &visible {
            if let Code::Body(lines) = &f.code {
                let mut text = debug_comment(f, debug);
                text.push_str(&format!("{}{} {{\n", f.signature(), f.rendered_flags()));
                for line in lines {
                    text.push_str(line);
                    text.push('\n');
                }
                text.push('}');
                sections.push(text);
            }
        }

        for f in &visible {
            if let Code::Main(lines) = &f.code {
                if !lines.is_empty() {
                    let mut text = debug_comment(f, debug);
                    text.push_str(&lines.join("\n"));
                    sections.push(text);
                }
            }
        }

        let mut out = sections.join("\n\n");
        out.push('\n');
        out
    }

    fn lookup(&self, name: &str) -> usize {
        match self.index.get(name) {
            Some(&i) => i,
            None => panic!("function `{name}` is used but was never declared"),
        }
    }

    fn reachable(&self) -> Vec<bool> {
        let mut marks = vec![false; self.functions.len()];
        let mut worklist = Vec::new();
        let roots = self
            .functions
            .iter()
            .filter(|f| f.origin == Origin::User)
            .map(|f| f.name.as_str())
            .chain(self.roots.iter().map(String::as_str));
        for name in roots {
            let i = self.lookup(name);
            if !marks[i] {
                marks[i] = true;
                worklist.push(i);
            }
        }
        while let Some(i) = worklist.pop() {
            for dep in &self.functions[i].depends {
                let j = self.lookup(dep);
                if !marks[j] {
                    marks[j] = true;
                    worklist.push(j);
                }
            }
        }
        marks
    }
}

fn push_section(sections: &mut Vec<String>, lines: &[String]) {
    if !lines.is_empty() {
        sections.push(lines.join("\n"));
    }
}

fn debug_comment(f: &WrittenFunction, debug: bool) -> String {
    if !debug {
        return String::new();
    }
    let mut text = format!(";; {}\n", f.name);
    if !f.depends.is_empty() {
        text.push_str(&format!(";; Depends on: {}\n", f.depends.join(", ")));
    }
    text
}
