//! Template AST node types.
//!
//! Every node of one document is allocated in a single bumpalo arena owned by
//! the caller. The tree is built once by the parser and only read afterwards.

use serde::{Deserialize, Serialize};
use vellum_carton::{Box, Bump, String, Vec};

/// Node type discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Root = 0,
    Element = 1,
    Text = 2,
    Comment = 3,
    Interpolation = 4,
    Attribute = 5,
}

/// Source position in the template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Position {
    /// Byte offset from start of file
    pub offset: u32,
    /// 1-indexed line number
    pub line: u32,
    /// 1-indexed column number
    pub column: u32,
}

impl Position {
    pub const fn new(offset: u32, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

/// Source location span [start, end)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
    pub source: String,
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::STUB
    }
}

impl SourceLocation {
    /// Stub location for generated nodes
    pub const STUB: Self = Self {
        start: Position {
            offset: 0,
            line: 1,
            column: 1,
        },
        end: Position {
            offset: 0,
            line: 1,
            column: 1,
        },
        source: String::const_new(""),
    };

    pub fn new(start: Position, end: Position, source: impl Into<String>) -> Self {
        Self {
            start,
            end,
            source: source.into(),
        }
    }
}

/// Root AST node
#[derive(Debug)]
pub struct RootNode<'a> {
    pub children: Vec<'a, TemplateChildNode<'a>>,
    pub source: String,
}

impl<'a> RootNode<'a> {
    pub fn new(allocator: &'a Bump, source: impl Into<String>) -> Self {
        Self {
            children: Vec::new_in(allocator),
            source: source.into(),
        }
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::Root
    }
}

// ============================================================================
// Template Nodes
// ============================================================================

/// All template child node types
#[derive(Debug)]
pub enum TemplateChildNode<'a> {
    Element(Box<'a, ElementNode<'a>>),
    Text(Box<'a, TextNode>),
    Comment(Box<'a, CommentNode>),
    Interpolation(Box<'a, InterpolationNode>),
}

impl<'a> TemplateChildNode<'a> {
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Element(_) => NodeType::Element,
            Self::Text(_) => NodeType::Text,
            Self::Comment(_) => NodeType::Comment,
            Self::Interpolation(_) => NodeType::Interpolation,
        }
    }

    pub fn loc(&self) -> &SourceLocation {
        match self {
            Self::Element(n) => &n.loc,
            Self::Text(n) => &n.loc,
            Self::Comment(n) => &n.loc,
            Self::Interpolation(n) => &n.loc,
        }
    }

    pub fn as_element(&self) -> Option<&ElementNode<'a>> {
        match self {
            Self::Element(el) => Some(&**el),
            _ => None,
        }
    }
}

/// Element node
#[derive(Debug)]
pub struct ElementNode<'a> {
    pub tag: String,
    pub attrs: Vec<'a, AttributeNode>,
    pub children: Vec<'a, TemplateChildNode<'a>>,
    pub is_self_closing: bool,
    pub loc: SourceLocation,
}

impl<'a> ElementNode<'a> {
    pub fn new(allocator: &'a Bump, tag: impl Into<String>, loc: SourceLocation) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new_in(allocator),
            children: Vec::new_in(allocator),
            is_self_closing: false,
            loc,
        }
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::Element
    }

    /// Look up an attribute value by name.
    ///
    /// Attributes behave like a map: when a name repeats, the last one wins.
    /// A boolean attribute (`<x hidden>`) yields `Some("")`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .rev()
            .find(|attr| attr.name.as_str() == name)
            .map(|attr| attr.value.as_ref().map_or("", |v| v.content.as_str()))
    }
}

/// Attribute node
#[derive(Debug)]
pub struct AttributeNode {
    pub name: String,
    pub name_loc: SourceLocation,
    pub value: Option<TextNode>,
    pub loc: SourceLocation,
}

impl AttributeNode {
    pub fn new(name: impl Into<String>, loc: SourceLocation) -> Self {
        Self {
            name: name.into(),
            name_loc: loc.clone(),
            value: None,
            loc,
        }
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::Attribute
    }
}

/// Text node
#[derive(Debug)]
pub struct TextNode {
    pub content: String,
    pub loc: SourceLocation,
}

impl TextNode {
    pub fn new(content: impl Into<String>, loc: SourceLocation) -> Self {
        Self {
            content: content.into(),
            loc,
        }
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::Text
    }
}

/// Comment node
#[derive(Debug)]
pub struct CommentNode {
    pub content: String,
    pub loc: SourceLocation,
}

impl CommentNode {
    pub fn new(content: impl Into<String>, loc: SourceLocation) -> Self {
        Self {
            content: content.into(),
            loc,
        }
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::Comment
    }
}

/// Interpolation node (`{{ expr }}`).
///
/// `content` is the trimmed expression; `loc.source` keeps the fragment
/// exactly as written, delimiters included.
#[derive(Debug)]
pub struct InterpolationNode {
    pub content: String,
    pub loc: SourceLocation,
}

impl InterpolationNode {
    pub fn new(content: impl Into<String>, loc: SourceLocation) -> Self {
        Self {
            content: content.into(),
            loc,
        }
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::Interpolation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_last_wins() {
        let bump = Bump::new();
        let mut el = ElementNode::new(&bump, "image", SourceLocation::STUB);
        let mut first = AttributeNode::new("src", SourceLocation::STUB);
        first.value = Some(TextNode::new("a.png", SourceLocation::STUB));
        let mut second = AttributeNode::new("src", SourceLocation::STUB);
        second.value = Some(TextNode::new("b.png", SourceLocation::STUB));
        el.attrs.push(first);
        el.attrs.push(second);

        assert_eq!(el.attr("src"), Some("b.png"));
        assert_eq!(el.attr("mode"), None);
    }

    #[test]
    fn test_boolean_attr_is_empty() {
        let bump = Bump::new();
        let mut el = ElementNode::new(&bump, "view", SourceLocation::STUB);
        el.attrs.push(AttributeNode::new("hidden", SourceLocation::STUB));
        assert_eq!(el.attr("hidden"), Some(""));
    }
}
