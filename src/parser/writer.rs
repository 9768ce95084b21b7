//! Canonical re-serialization of a parsed template
//!
//! [`to_source`] turns a tree back into template text that parses to an equal
//! tree. Text is escaped (`\` and `{$`), string literals are re-quoted, and tags
//! are written with single spaces between elements.

use crate::parser::ast::*;
use std::convert::Infallible;
use std::fmt;

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Variable(name) => write!(f, "{}", name),
            Element::Integer(n) => write!(f, "{}", n),
            Element::Double(n) => write!(f, "{}", double_literal(*n)),
            Element::Str(s) => write!(f, "\"{}\"", escape_string(s)),
            Element::Function(name) => write!(f, "@{}", name),
            Element::Operator(op) => write!(f, "{}", op),
        }
    }
}

impl fmt::Display for DocumentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_source(self))
    }
}

/// A double written so the lexer reads it back as a double: always has a `.`
fn double_literal(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') || !value.is_finite() {
        text
    } else {
        format!("{}.0", text)
    }
}

fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\").replace("{$", "\\{$")
}

/// Visitor that accumulates the canonical source form
#[derive(Default)]
pub struct SourceWriter {
    output: String,
}

impl SourceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.output
    }
}

impl NodeVisitor for SourceWriter {
    type Error = Infallible;

    fn visit_text(&mut self, node: &TextNode) -> Result<(), Infallible> {
        self.output.push_str(&escape_text(&node.text));
        Ok(())
    }

    fn visit_echo(&mut self, node: &EchoNode) -> Result<(), Infallible> {
        self.output.push_str("{$=");
        for element in &node.elements {
            self.output.push(' ');
            self.output.push_str(&element.to_string());
        }
        self.output.push_str(" $}");
        Ok(())
    }

    fn visit_for_loop(&mut self, node: &ForLoopNode) -> Result<(), Infallible> {
        self.output
            .push_str(&format!("{{$ FOR {} {} {}", node.variable, node.start, node.end));
        if let Some(step) = &node.step {
            self.output.push_str(&format!(" {}", step));
        }
        self.output.push_str(" $}");

        for child in &node.children {
            child.accept(self)?;
        }

        self.output.push_str("{$ END $}");
        Ok(())
    }
}

/// Canonical template text for `document`
pub fn to_source(document: &DocumentNode) -> String {
    let mut writer = SourceWriter::new();
    match document.accept(&mut writer) {
        Ok(()) => writer.finish(),
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser::parse;

    fn assert_round_trip(source: &str) {
        let document = parse(source).unwrap();
        let written = to_source(&document);
        let reparsed = parse(&written).unwrap();
        assert_eq!(document, reparsed, "round trip changed tree for {:?}", written);
        assert_eq!(written, to_source(&reparsed));
    }

    #[test]
    fn test_text_escaping() {
        let document = parse("a \\{$ b \\\\ c").unwrap();
        assert_eq!(to_source(&document), "a \\{$ b \\\\ c");
    }

    #[test]
    fn test_canonical_form() {
        let document = parse("{$for   i 1 10$}-{$=i \"a\\\"b\" @sin$}{$end$}").unwrap();
        assert_eq!(
            to_source(&document),
            "{$ FOR i 1 10 $}-{$= i \"a\\\"b\" @sin $}{$ END $}"
        );
    }

    #[test]
    fn test_double_keeps_decimal_point() {
        assert_eq!(Element::Double(5.0).to_string(), "5.0");
        assert_eq!(Element::Double(-0.25).to_string(), "-0.25");
    }

    #[test]
    fn test_round_trips() {
        assert_round_trip("This is sample text.\r\n{$ FOR i 1 10 1 $}\r\n  This is {$= i $}-th time this message is generated.\r\n{$END$}\r\n");
        assert_round_trip("{$= \"line\\nbreak\\t\\\\\" 3.5 -2 @decfmt * $}");
        assert_round_trip("{$FOR i -1 10.5 \"2\"$}{$FOR j i 3$}{$= i j + $}{$END$}{$END$}");
        assert_round_trip("braces { and $ and }$ stay literal");
        assert_round_trip("");
    }
}
