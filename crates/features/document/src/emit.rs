//! Streaming structured-text writers driven by [`crate::DocumentTree::emit`].
//!
//! The tree calls `field` before every child of an object, then exactly one value: a scalar,
//! or a `begin_*` ... `end_*` pair enclosing further values. Output is written as the
//! events arrive.

use crate::value::{ScalarValue, float_literal};
use serde_json::ser::{Formatter, PrettyFormatter};
use std::fmt::Write as _;
use std::io::{self, Write};
use strata_domain::format::OutputFormat;

pub trait Emitter {
    fn begin_object(&mut self) -> io::Result<()>;
    fn end_object(&mut self) -> io::Result<()>;
    fn begin_array(&mut self) -> io::Result<()>;
    fn end_array(&mut self) -> io::Result<()>;
    /// Names the next value of the enclosing object.
    fn field(&mut self, name: &str) -> io::Result<()>;
    fn scalar(&mut self, value: &ScalarValue) -> io::Result<()>;
    /// Terminates the document and flushes the sink.
    fn finish(&mut self) -> io::Result<()>;
}

/// Creates the emitter for `format` over `sink`.
pub fn emitter_for<'w, W: Write + 'w>(format: OutputFormat, sink: W) -> Box<dyn Emitter + 'w> {
    match format {
        OutputFormat::Json => Box::new(JsonEmitter::new(sink)),
        OutputFormat::Yaml => Box::new(YamlEmitter::new(sink)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Composite {
    Object,
    Array,
}

#[derive(Debug)]
struct Frame {
    kind: Composite,
    first: bool,
}

/// Pretty-printed JSON with two-space indentation, laid out by [`PrettyFormatter`].
#[derive(Debug)]
pub struct JsonEmitter<W> {
    sink: W,
    formatter: PrettyFormatter<'static>,
    open: Vec<Frame>,
}

impl<W: Write> JsonEmitter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, formatter: PrettyFormatter::new(), open: Vec::new() }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn before_value(&mut self) -> io::Result<()> {
        if let Some(frame) = self.open.last_mut() {
            if frame.kind == Composite::Array {
                let first = std::mem::replace(&mut frame.first, false);
                self.formatter.begin_array_value(&mut self.sink, first)?;
            }
        }
        Ok(())
    }

    fn after_value(&mut self) -> io::Result<()> {
        match self.open.last().map(|frame| frame.kind) {
            Some(Composite::Array) => self.formatter.end_array_value(&mut self.sink),
            Some(Composite::Object) => self.formatter.end_object_value(&mut self.sink),
            None => Ok(()),
        }
    }

    fn string(&mut self, s: &str) -> io::Result<()> {
        serde_json::to_writer(&mut self.sink, s).map_err(io::Error::from)
    }
}

impl<W: Write> Emitter for JsonEmitter<W> {
    fn begin_object(&mut self) -> io::Result<()> {
        self.before_value()?;
        self.formatter.begin_object(&mut self.sink)?;
        self.open.push(Frame { kind: Composite::Object, first: true });
        Ok(())
    }

    fn end_object(&mut self) -> io::Result<()> {
        self.open.pop();
        self.formatter.end_object(&mut self.sink)?;
        self.after_value()
    }

    fn begin_array(&mut self) -> io::Result<()> {
        self.before_value()?;
        self.formatter.begin_array(&mut self.sink)?;
        self.open.push(Frame { kind: Composite::Array, first: true });
        Ok(())
    }

    fn end_array(&mut self) -> io::Result<()> {
        self.open.pop();
        self.formatter.end_array(&mut self.sink)?;
        self.after_value()
    }

    fn field(&mut self, name: &str) -> io::Result<()> {
        let first = self.open.last_mut().is_none_or(|frame| std::mem::replace(&mut frame.first, false));
        self.formatter.begin_object_key(&mut self.sink, first)?;
        self.string(name)?;
        self.formatter.end_object_key(&mut self.sink)?;
        self.formatter.begin_object_value(&mut self.sink)
    }

    fn scalar(&mut self, value: &ScalarValue) -> io::Result<()> {
        self.before_value()?;
        match value {
            ScalarValue::String(s) => self.string(s)?,
            ScalarValue::Bool(b) => self.formatter.write_bool(&mut self.sink, *b)?,
            ScalarValue::Integer(n) => self.formatter.write_i64(&mut self.sink, *n)?,
            ScalarValue::Unsigned(n) => self.formatter.write_u64(&mut self.sink, *n)?,
            ScalarValue::Float(n) if n.is_finite() => self.formatter.write_f64(&mut self.sink, *n)?,
            ScalarValue::Float(_) | ScalarValue::Null => self.formatter.write_null(&mut self.sink)?,
        }
        self.after_value()
    }

    fn finish(&mut self) -> io::Result<()> {
        self.sink.write_all(b"\n")?;
        self.sink.flush()
    }
}

/// What is already written on the current YAML line and still awaits its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Nothing,
    /// `name:`
    Key,
    /// `-`
    Dash,
}

#[derive(Debug)]
struct Block {
    kind: Composite,
    indent: usize,
    entries: usize,
    opened_by: Pending,
}

/// Block-style YAML. Strings are always double quoted, so no value changes type on reload.
/// Control and line-break characters inside them are escaped.
#[derive(Debug)]
pub struct YamlEmitter<W> {
    sink: W,
    blocks: Vec<Block>,
    pending: Pending,
}

impl<W: Write> YamlEmitter<W> {
    pub const fn new(sink: W) -> Self {
        Self { sink, blocks: Vec::new(), pending: Pending::Nothing }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Starts the next entry of the innermost block: moves to a fresh line unless the entry
    /// continues the `-` of an enclosing sequence item.
    fn start_entry(&mut self) -> io::Result<usize> {
        let Some(block) = self.blocks.last_mut() else { return Ok(0) };
        let indent = block.indent;
        let first = block.entries == 0;
        block.entries += 1;
        match (first, block.opened_by) {
            (true, Pending::Dash) => self.sink.write_all(b" ")?,
            (true, Pending::Key) => write!(self.sink, "\n{:indent$}", "")?,
            _ => write!(self.sink, "{:indent$}", "")?,
        }
        Ok(indent)
    }

    fn before_value(&mut self) -> io::Result<()> {
        if self.blocks.last().is_some_and(|b| b.kind == Composite::Array) {
            self.start_entry()?;
            self.sink.write_all(b"-")?;
            self.pending = Pending::Dash;
        }
        Ok(())
    }

    fn open(&mut self, kind: Composite) -> io::Result<()> {
        self.before_value()?;
        let indent = self.blocks.last().map_or(0, |b| b.indent + 2);
        self.blocks.push(Block { kind, indent, entries: 0, opened_by: self.pending });
        self.pending = Pending::Nothing;
        Ok(())
    }

    fn close(&mut self, empty: &str) -> io::Result<()> {
        if let Some(block) = self.blocks.pop() {
            if block.entries == 0 {
                match block.opened_by {
                    Pending::Nothing => writeln!(self.sink, "{empty}")?,
                    Pending::Key | Pending::Dash => writeln!(self.sink, " {empty}")?,
                }
            }
        }
        Ok(())
    }
}

impl<W: Write> Emitter for YamlEmitter<W> {
    fn begin_object(&mut self) -> io::Result<()> {
        self.open(Composite::Object)
    }

    fn end_object(&mut self) -> io::Result<()> {
        self.close("{}")
    }

    fn begin_array(&mut self) -> io::Result<()> {
        self.open(Composite::Array)
    }

    fn end_array(&mut self) -> io::Result<()> {
        self.close("[]")
    }

    fn field(&mut self, name: &str) -> io::Result<()> {
        self.start_entry()?;
        if is_plain_key(name) {
            write!(self.sink, "{name}:")?;
        } else {
            write!(self.sink, "{}:", yaml_quote(name))?;
        }
        self.pending = Pending::Key;
        Ok(())
    }

    fn scalar(&mut self, value: &ScalarValue) -> io::Result<()> {
        self.before_value()?;
        let text = match value {
            ScalarValue::String(s) => yaml_quote(s),
            ScalarValue::Float(n) if n.is_nan() => ".nan".to_owned(),
            ScalarValue::Float(n) if n.is_infinite() => {
                if n.is_sign_positive() { ".inf".to_owned() } else { "-.inf".to_owned() }
            },
            ScalarValue::Float(n) => float_literal(*n),
            other => other.encode(),
        };
        if self.pending == Pending::Nothing {
            writeln!(self.sink, "{text}")?;
        } else {
            writeln!(self.sink, " {text}")?;
        }
        self.pending = Pending::Nothing;
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

/// Double-quoted YAML scalar of `s`.
///
/// YAML readers reject characters outside their printable set and fold the NEL, LS and PS
/// line breaks, so those are written as escapes.
fn yaml_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{85}' => out.push_str("\\N"),
            '\u{2028}' => out.push_str("\\L"),
            '\u{2029}' => out.push_str("\\P"),
            c if yaml_printable(c) => out.push(c),
            c if u32::from(c) <= 0xFF => {
                let _ = write!(out, "\\x{:02X}", u32::from(c));
            },
            c => {
                let _ = write!(out, "\\u{:04X}", u32::from(c));
            },
        }
    }
    out.push('"');
    out
}

/// The characters a YAML stream may carry unescaped.
const fn yaml_printable(c: char) -> bool {
    matches!(c, '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
        && c != '\u{FEFF}'
}

/// Keys that YAML reads back as the same string without quotes.
fn is_plain_key(name: &str) -> bool {
    const RESERVED: [&str; 10] = ["true", "false", "null", "yes", "no", "on", "off", "y", "n", "~"];

    let mut chars = name.chars();
    let Some(first) = chars.next() else { return false };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !RESERVED.iter().any(|word| name.eq_ignore_ascii_case(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(emitter: &mut dyn Emitter) -> io::Result<()> {
        emitter.begin_object()?;
        emitter.field("name")?;
        emitter.scalar(&ScalarValue::String("strata".into()))?;
        emitter.field("ports")?;
        emitter.begin_array()?;
        emitter.scalar(&ScalarValue::Integer(80))?;
        emitter.begin_object()?;
        emitter.field("tls")?;
        emitter.scalar(&ScalarValue::Bool(true))?;
        emitter.field("ratio")?;
        emitter.scalar(&ScalarValue::Float(1.0))?;
        emitter.end_object()?;
        emitter.begin_array()?;
        emitter.end_array()?;
        emitter.end_array()?;
        emitter.field("empty")?;
        emitter.begin_object()?;
        emitter.end_object()?;
        emitter.field("on")?;
        emitter.scalar(&ScalarValue::Null)?;
        emitter.end_object()?;
        emitter.finish()
    }

    #[test]
    fn test_json_layout() {
        let mut emitter = JsonEmitter::new(Vec::new());
        drive(&mut emitter).unwrap();
        let text = String::from_utf8(emitter.into_inner()).unwrap();
        assert_eq!(
            text,
            r#"{
  "name": "strata",
  "ports": [
    80,
    {
      "tls": true,
      "ratio": 1.0
    },
    []
  ],
  "empty": {},
  "on": null
}
"#
        );
    }

    #[test]
    fn test_yaml_layout() {
        let mut emitter = YamlEmitter::new(Vec::new());
        drive(&mut emitter).unwrap();
        let text = String::from_utf8(emitter.into_inner()).unwrap();
        assert_eq!(
            text,
            r#"name: "strata"
ports:
  - 80
  - tls: true
    ratio: 1.0
  - []
empty: {}
"on": null
"#
        );
    }

    #[test]
    fn test_yaml_nested_sequences() {
        let mut emitter = YamlEmitter::new(Vec::new());
        emitter.begin_array().unwrap();
        emitter.begin_array().unwrap();
        emitter.scalar(&ScalarValue::Integer(1)).unwrap();
        emitter.scalar(&ScalarValue::Integer(2)).unwrap();
        emitter.end_array().unwrap();
        emitter.begin_object().unwrap();
        emitter.end_object().unwrap();
        emitter.end_array().unwrap();
        emitter.finish().unwrap();

        let text = String::from_utf8(emitter.into_inner()).unwrap();
        assert_eq!(text, "- - 1\n  - 2\n- {}\n");
    }

    #[test]
    fn test_empty_root_object() {
        let mut json = JsonEmitter::new(Vec::new());
        json.begin_object().unwrap();
        json.end_object().unwrap();
        json.finish().unwrap();
        assert_eq!(json.into_inner(), b"{}\n");

        let mut yaml = YamlEmitter::new(Vec::new());
        yaml.begin_object().unwrap();
        yaml.end_object().unwrap();
        yaml.finish().unwrap();
        assert_eq!(yaml.into_inner(), b"{}\n");
    }

    #[test]
    fn test_yaml_quote_escapes() {
        assert_eq!(yaml_quote("a\u{85}b\u{7f}"), r#""a\Nb\x7F""#);
        assert_eq!(yaml_quote("\u{2028}\u{2029}\u{feff}"), r#""\L\P\uFEFF""#);
        assert_eq!(yaml_quote("say \"hi\"\n"), r#""say \"hi\"\n""#);
        assert_eq!(yaml_quote("caf\u{e9} \u{1F600}"), "\"caf\u{e9} \u{1F600}\"");

        for s in ["a\u{85}b", "a\u{7f}b", "\u{0}\u{1b}\u{9f}", "tab\tcr\r", "\u{feff}x\u{fffe}", "\u{2028}"] {
            let back: String = serde_yaml::from_str(&yaml_quote(s)).unwrap();
            assert_eq!(back, s, "{s:?}");
        }
    }

    #[test]
    fn test_json_non_finite_float_is_null() {
        let mut emitter = JsonEmitter::new(Vec::new());
        emitter.begin_array().unwrap();
        emitter.scalar(&ScalarValue::Float(f64::NAN)).unwrap();
        emitter.scalar(&ScalarValue::Unsigned(u64::MAX)).unwrap();
        emitter.end_array().unwrap();
        emitter.finish().unwrap();
        assert_eq!(emitter.into_inner(), b"[\n  null,\n  18446744073709551615\n]\n");
    }

    #[test]
    fn test_plain_keys() {
        assert!(is_plain_key("server"));
        assert!(is_plain_key("max-connections"));
        assert!(!is_plain_key("true"));
        assert!(!is_plain_key("No"));
        assert!(!is_plain_key("with space"));
        assert!(!is_plain_key("1st"));
        assert!(!is_plain_key(""));
    }
}
