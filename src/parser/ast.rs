//! Syntax tree definitions for templates
//!
//! A parsed template is a [`DocumentNode`] owning an ordered list of [`Node`]s.
//! Only [`ForLoopNode`] has children of its own; text and echo nodes are leaves.
//!
//! Every node remembers where its tag started so the engine can report runtime
//! errors and the explorer can highlight the executing tag. Locations are not
//! part of node equality: two trees parsed from differently formatted sources
//! compare equal when their structure and values match.

use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// One atomic piece of an echo or for-loop argument list
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Variable(String),
    Integer(i32),
    Double(f64),
    Str(String),
    /// Built-in name without the leading `@`
    Function(String),
    Operator(char),
}

/// Literal output between tags
#[derive(Debug, Clone)]
pub struct TextNode {
    pub text: String,
    pub location: SourceLocation,
}

impl PartialEq for TextNode {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

/// `{$= ... $}` tag
#[derive(Debug, Clone)]
pub struct EchoNode {
    pub elements: Vec<Element>,
    pub location: SourceLocation,
}

impl PartialEq for EchoNode {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

/// `{$FOR var start end [step]$} ... {$END$}`
#[derive(Debug, Clone)]
pub struct ForLoopNode {
    pub variable: String,
    pub start: Element,
    pub end: Element,
    pub step: Option<Element>,
    pub children: Vec<Node>,
    pub location: SourceLocation,
}

impl PartialEq for ForLoopNode {
    fn eq(&self, other: &Self) -> bool {
        self.variable == other.variable
            && self.start == other.start
            && self.end == other.end
            && self.step == other.step
            && self.children == other.children
    }
}

/// Any node that can appear inside a document or a loop body
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(TextNode),
    Echo(EchoNode),
    ForLoop(ForLoopNode),
}

impl Node {
    pub fn location(&self) -> SourceLocation {
        match self {
            Node::Text(node) => node.location,
            Node::Echo(node) => node.location,
            Node::ForLoop(node) => node.location,
        }
    }

    /// Dispatches to the visitor method matching this node's kind.
    pub fn accept<V: NodeVisitor + ?Sized>(&self, visitor: &mut V) -> Result<(), V::Error> {
        match self {
            Node::Text(node) => visitor.visit_text(node),
            Node::Echo(node) => visitor.visit_echo(node),
            Node::ForLoop(node) => visitor.visit_for_loop(node),
        }
    }
}

/// Root of a parsed template
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentNode {
    pub children: Vec<Node>,
}

impl DocumentNode {
    pub fn accept<V: NodeVisitor + ?Sized>(&self, visitor: &mut V) -> Result<(), V::Error> {
        visitor.visit_document(self)
    }

    /// Total number of nodes in the tree, loop bodies included.
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[Node]) -> usize {
            nodes
                .iter()
                .map(|node| match node {
                    Node::ForLoop(the_loop) => 1 + count(&the_loop.children),
                    _ => 1,
                })
                .sum()
        }
        count(&self.children)
    }
}

/// Double-dispatch interface over the node kinds.
///
/// The default container methods visit children in document order, so a
/// visitor that only cares about leaves can override `visit_text` and
/// `visit_echo` alone.
pub trait NodeVisitor {
    type Error;

    fn visit_document(&mut self, node: &DocumentNode) -> Result<(), Self::Error> {
        for child in &node.children {
            child.accept(self)?;
        }
        Ok(())
    }

    fn visit_text(&mut self, node: &TextNode) -> Result<(), Self::Error>;

    fn visit_echo(&mut self, node: &EchoNode) -> Result<(), Self::Error>;

    fn visit_for_loop(&mut self, node: &ForLoopNode) -> Result<(), Self::Error> {
        for child in &node.children {
            child.accept(self)?;
        }
        Ok(())
    }
}
