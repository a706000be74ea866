//! Template parser.
//!
//! Drives the tokenizer and assembles the arena AST. Malformed markup never
//! aborts parsing: problems are collected as [`CompilerError`]s next to a
//! best-effort tree.

use vellum_carton::{Box, Bump, String, Vec};
use vellum_relief::ast::*;
use vellum_relief::errors::{CompilerError, ErrorCode};
use vellum_relief::options::ParserOptions;

use crate::tokenizer::{Callbacks, QuoteType, Tokenizer};

/// Parser context for building AST
pub struct Parser<'a> {
    /// Arena allocator
    allocator: &'a Bump,
    /// Source code
    source: &'a str,
    /// Parser options
    options: ParserOptions,
    /// Open elements, innermost last
    stack: Vec<'a, ElementNode<'a>>,
    /// Root node
    root: RootNode<'a>,
    /// Current element being parsed
    current_element: Option<CurrentElement<'a>>,
    /// Current attribute being parsed
    current_attr: Option<CurrentAttribute>,
    /// Errors collected during parsing
    errors: Vec<'a, CompilerError>,
    /// Newline positions for calculating line/column
    newlines: std::vec::Vec<usize>,
}

/// Current element being parsed
struct CurrentElement<'a> {
    tag: String,
    tag_start: usize,
    is_self_closing: bool,
    attrs: Vec<'a, AttributeNode>,
}

/// Current attribute being parsed
struct CurrentAttribute {
    name: String,
    name_start: usize,
    name_end: usize,
    value_start: Option<usize>,
    value_end: Option<usize>,
}

impl<'a> Parser<'a> {
    /// Create a new parser
    pub fn new(allocator: &'a Bump, source: &'a str) -> Self {
        Self::with_options(allocator, source, ParserOptions::default())
    }

    /// Create a new parser with options
    pub fn with_options(allocator: &'a Bump, source: &'a str, options: ParserOptions) -> Self {
        let newlines = source
            .bytes()
            .enumerate()
            .filter(|(_, b)| *b == b'\n')
            .map(|(i, _)| i)
            .collect();

        Self {
            allocator,
            source,
            options,
            stack: Vec::new_in(allocator),
            root: RootNode::new(allocator, source),
            current_element: None,
            current_attr: None,
            errors: Vec::new_in(allocator),
            newlines,
        }
    }

    /// Parse the source and return the AST
    pub fn parse(mut self) -> (RootNode<'a>, Vec<'a, CompilerError>) {
        // Copy delimiters to avoid borrow issue
        let delimiter_open = self.options.delimiters.0.as_bytes().to_vec();
        let delimiter_close = self.options.delimiters.1.as_bytes().to_vec();

        let mut tokenizer = Tokenizer::with_delimiters(
            self.source,
            ParserCallbacks { parser: &mut self },
            &delimiter_open,
            &delimiter_close,
        );
        tokenizer.tokenize();
        drop(tokenizer);

        self.handle_unclosed_elements();

        let Parser { root, errors, .. } = self;
        (root, errors)
    }

    /// Get source slice
    fn get_source(&self, start: usize, end: usize) -> &'a str {
        &self.source[start..end]
    }

    /// Calculate position from byte offset
    fn get_pos(&self, offset: usize) -> Position {
        let line = match self.newlines.binary_search(&offset) {
            Ok(i) | Err(i) => i + 1,
        };

        let column = if line == 1 {
            offset + 1
        } else {
            offset - self.newlines[line - 2]
        };

        Position::new(offset as u32, line as u32, column as u32)
    }

    /// Create a source location
    fn create_loc(&self, start: usize, end: usize) -> SourceLocation {
        SourceLocation::new(
            self.get_pos(start),
            self.get_pos(end),
            self.get_source(start, end),
        )
    }

    fn error(&mut self, code: ErrorCode, loc: Option<SourceLocation>) {
        self.errors.push(CompilerError::new(code, loc));
    }

    /// Add child to current context (stack top or root)
    fn add_child(&mut self, child: TemplateChildNode<'a>) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(child),
            None => self.root.children.push(child),
        }
    }

    /// Close the innermost open element into its parent
    fn close_top(&mut self) {
        if let Some(element) = self.stack.pop() {
            let boxed = Box::new_in(element, self.allocator);
            self.add_child(TemplateChildNode::Element(boxed));
        }
    }

    /// Handle unclosed elements at end of parsing
    fn handle_unclosed_elements(&mut self) {
        while let Some(element) = self.stack.last() {
            let loc = element.loc.clone();
            self.error(ErrorCode::MissingEndTag, Some(loc));
            self.close_top();
        }
    }

    /// Process text content
    fn on_text_impl(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }

        let content = self.get_source(start, end);
        let loc = self.create_loc(start, end);

        let boxed = Box::new_in(TextNode::new(content, loc), self.allocator);
        self.add_child(TemplateChildNode::Text(boxed));
    }

    /// Process interpolation
    fn on_interpolation_impl(&mut self, start: usize, end: usize) {
        let content = self.get_source(start, end).trim();

        let full_start = start - self.options.delimiters.0.len();
        let full_end = end + self.options.delimiters.1.len();
        let loc = self.create_loc(full_start, full_end);

        let boxed = Box::new_in(InterpolationNode::new(content, loc), self.allocator);
        self.add_child(TemplateChildNode::Interpolation(boxed));
    }

    /// Process open tag name
    fn on_open_tag_name_impl(&mut self, start: usize, end: usize) {
        let tag = self.get_source(start, end);
        self.current_element = Some(CurrentElement {
            tag: tag.into(),
            tag_start: start,
            is_self_closing: false,
            attrs: Vec::new_in(self.allocator),
        });
    }

    /// Process open tag end
    fn on_open_tag_end_impl(&mut self, end: usize) {
        let Some(current) = self.current_element.take() else {
            return;
        };

        // Include < and >
        let loc = self.create_loc(current.tag_start - 1, end + 1);
        let mut element = ElementNode::new(self.allocator, current.tag, loc);
        element.is_self_closing = current.is_self_closing;
        element.attrs = current.attrs;

        if element.is_self_closing || (self.options.is_void_tag)(element.tag.as_str()) {
            let boxed = Box::new_in(element, self.allocator);
            self.add_child(TemplateChildNode::Element(boxed));
        } else {
            self.stack.push(element);
        }
    }

    /// Process self-closing tag
    fn on_self_closing_tag_impl(&mut self) {
        if let Some(ref mut current) = self.current_element {
            current.is_self_closing = true;
        }
    }

    /// Process close tag
    fn on_close_tag_impl(&mut self, start: usize, end: usize) {
        let tag = self.get_source(start, end);

        let Some(index) = self
            .stack
            .iter()
            .rposition(|el| el.tag.eq_ignore_ascii_case(tag))
        else {
            // Include </ and >
            let loc_end = (end + 1).min(self.source.len());
            let loc = self.create_loc(start - 2, loc_end);
            self.error(ErrorCode::InvalidEndTag, Some(loc));
            return;
        };

        // Elements opened after the match were never closed; nest them
        // where they were opened before closing the match itself.
        while self.stack.len() > index + 1 {
            if let Some(unclosed) = self.stack.last() {
                let loc = unclosed.loc.clone();
                self.error(ErrorCode::MissingEndTag, Some(loc));
            }
            self.close_top();
        }
        self.close_top();
    }

    /// Process attribute name
    fn on_attrib_name_impl(&mut self, start: usize, end: usize) {
        let name = self.get_source(start, end);
        self.current_attr = Some(CurrentAttribute {
            name: name.into(),
            name_start: start,
            name_end: end,
            value_start: None,
            value_end: None,
        });
    }

    /// Process attribute data (value content)
    fn on_attrib_data_impl(&mut self, start: usize, end: usize) {
        if let Some(ref mut attr) = self.current_attr {
            if attr.value_start.is_none() {
                attr.value_start = Some(start);
            }
            attr.value_end = Some(end);
        }
    }

    /// Process attribute end
    fn on_attrib_end_impl(&mut self, quote: QuoteType, end: usize) {
        let Some(attr) = self.current_attr.take() else {
            return;
        };

        let quoted = matches!(quote, QuoteType::Double | QuoteType::Single);
        let loc_end = if quoted { end + 1 } else { end };
        let loc = self.create_loc(attr.name_start, loc_end);
        let name_loc = self.create_loc(attr.name_start, attr.name_end);

        let mut attr_node = AttributeNode::new(attr.name, loc);
        attr_node.name_loc = name_loc;

        if let (Some(v_start), Some(v_end)) = (attr.value_start, attr.value_end) {
            let value_loc = self.create_loc(v_start, v_end);
            attr_node.value = Some(TextNode::new(self.get_source(v_start, v_end), value_loc));
        } else if quoted {
            // src="" is an empty value, not a boolean attribute
            let empty_loc = self.create_loc(end, end);
            attr_node.value = Some(TextNode::new("", empty_loc));
        }

        if let Some(ref mut current) = self.current_element {
            current.attrs.push(attr_node);
        }
    }

    /// Process comment
    fn on_comment_impl(&mut self, start: usize, end: usize) {
        if !self.options.comments {
            return;
        }

        let content = self.get_source(start, end);
        // Include <!-- and -->, clamped for unterminated comments
        let loc_start = start.saturating_sub(4);
        let loc_end = (end + 3).min(self.source.len());
        let loc = self.create_loc(loc_start, loc_end);

        let boxed = Box::new_in(CommentNode::new(content, loc), self.allocator);
        self.add_child(TemplateChildNode::Comment(boxed));
    }

    /// Record a tokenizer error
    fn on_error_impl(&mut self, code: ErrorCode, index: usize) {
        let index = index.min(self.source.len());
        let loc = self.create_loc(index, index);
        self.error(code, Some(loc));
    }
}

/// Wrapper struct to implement Callbacks
struct ParserCallbacks<'a, 'p> {
    parser: &'p mut Parser<'a>,
}

impl<'a, 'p> Callbacks for ParserCallbacks<'a, 'p> {
    fn on_text(&mut self, start: usize, end: usize) {
        self.parser.on_text_impl(start, end);
    }

    fn on_interpolation(&mut self, start: usize, end: usize) {
        self.parser.on_interpolation_impl(start, end);
    }

    fn on_open_tag_name(&mut self, start: usize, end: usize) {
        self.parser.on_open_tag_name_impl(start, end);
    }

    fn on_open_tag_end(&mut self, end: usize) {
        self.parser.on_open_tag_end_impl(end);
    }

    fn on_self_closing_tag(&mut self, end: usize) {
        self.parser.on_self_closing_tag_impl();
        self.parser.on_open_tag_end_impl(end);
    }

    fn on_close_tag(&mut self, start: usize, end: usize) {
        self.parser.on_close_tag_impl(start, end);
    }

    fn on_attrib_name(&mut self, start: usize, end: usize) {
        self.parser.on_attrib_name_impl(start, end);
    }

    fn on_attrib_data(&mut self, start: usize, end: usize) {
        self.parser.on_attrib_data_impl(start, end);
    }

    fn on_attrib_end(&mut self, quote: QuoteType, end: usize) {
        self.parser.on_attrib_end_impl(quote, end);
    }

    fn on_comment(&mut self, start: usize, end: usize) {
        self.parser.on_comment_impl(start, end);
    }

    fn on_end(&mut self) {}

    fn on_error(&mut self, code: ErrorCode, index: usize) {
        self.parser.on_error_impl(code, index);
    }
}

/// Parse a template with default options
pub fn parse<'a>(allocator: &'a Bump, source: &'a str) -> (RootNode<'a>, Vec<'a, CompilerError>) {
    Parser::new(allocator, source).parse()
}

/// Parse a template with custom options
pub fn parse_with_options<'a>(
    allocator: &'a Bump,
    source: &'a str,
    options: ParserOptions,
) -> (RootNode<'a>, Vec<'a, CompilerError>) {
    Parser::with_options(allocator, source, options).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element<'r, 'a>(node: &'r TemplateChildNode<'a>) -> &'r ElementNode<'a> {
        match node.as_element() {
            Some(el) => el,
            None => panic!("Expected element node, got {:?}", node.node_type()),
        }
    }

    #[test]
    fn test_parse_simple_element() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<view></view>");

        assert!(errors.is_empty());
        assert_eq!(root.children.len(), 1);

        let el = element(&root.children[0]);
        assert_eq!(el.tag.as_str(), "view");
        assert!(!el.is_self_closing);
    }

    #[test]
    fn test_parse_text() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "hello");

        assert!(errors.is_empty());
        if let TemplateChildNode::Text(text) = &root.children[0] {
            assert_eq!(text.content.as_str(), "hello");
        } else {
            panic!("Expected text node");
        }
    }

    #[test]
    fn test_parse_interpolation() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "{{ msg }}");

        assert!(errors.is_empty());
        if let TemplateChildNode::Interpolation(interp) = &root.children[0] {
            assert_eq!(interp.content.as_str(), "msg");
            assert_eq!(interp.loc.source.as_str(), "{{ msg }}");
        } else {
            panic!("Expected interpolation node");
        }
    }

    #[test]
    fn test_parse_attribute_values() {
        let allocator = Bump::new();
        let (root, errors) = parse(
            &allocator,
            r#"<image src="./a.png" mode=aspectFit lazy-load alt=""></image>"#,
        );

        assert!(errors.is_empty());
        let el = element(&root.children[0]);
        assert_eq!(el.attrs.len(), 4);
        assert_eq!(el.attr("src"), Some("./a.png"));
        assert_eq!(el.attr("mode"), Some("aspectFit"));
        assert_eq!(el.attr("lazy-load"), Some(""));
        assert!(el.attrs[2].value.is_none());
        assert_eq!(el.attr("alt"), Some(""));
        assert!(el.attrs[3].value.is_some());
    }

    #[test]
    fn test_parse_placeholder_in_attribute() {
        let allocator = Bump::new();
        let (root, errors) = parse(
            &allocator,
            r#"<image src="{{ a > b ? "x.png" : 'y.png' }}"/><text>ok</text>"#,
        );

        assert!(errors.is_empty());
        assert_eq!(root.children.len(), 2);
        let image = element(&root.children[0]);
        assert_eq!(
            image.attr("src"),
            Some(r#"{{ a > b ? "x.png" : 'y.png' }}"#)
        );
        assert_eq!(element(&root.children[1]).tag.as_str(), "text");
    }

    #[test]
    fn test_parse_self_closing() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, r#"<import src="./a.wxml" /><view/>"#);

        assert!(errors.is_empty());
        assert_eq!(root.children.len(), 2);
        let import = element(&root.children[0]);
        assert!(import.is_self_closing);
        assert_eq!(import.attr("src"), Some("./a.wxml"));
    }

    #[test]
    fn test_parse_void_tag() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<view><input><text>a</text></view>");

        assert!(errors.is_empty());
        let view = element(&root.children[0]);
        assert_eq!(view.children.len(), 2);
        assert_eq!(element(&view.children[0]).tag.as_str(), "input");
    }

    #[test]
    fn test_parse_nested() {
        let allocator = Bump::new();
        let (root, errors) = parse(
            &allocator,
            "<view>\n  <image src=\"a.png\"></image>\n  <text>{{ t }}</text>\n</view>",
        );

        assert!(errors.is_empty());
        let view = element(&root.children[0]);
        let tags: std::vec::Vec<&str> = view
            .children
            .iter()
            .filter_map(|c| c.as_element())
            .map(|el| el.tag.as_str())
            .collect();
        assert_eq!(tags, vec!["image", "text"]);

        let image = element(&view.children[1]);
        assert_eq!(image.loc.start.line, 2);
        assert_eq!(image.loc.start.column, 3);
    }

    #[test]
    fn test_parse_comment() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<!-- <image src=\"x.png\"/> -->");

        assert!(errors.is_empty());
        assert_eq!(root.children.len(), 1);
        if let TemplateChildNode::Comment(comment) = &root.children[0] {
            assert_eq!(comment.content.as_str(), " <image src=\"x.png\"/> ");
        } else {
            panic!("Expected comment node");
        }
    }

    #[test]
    fn test_parse_drops_comments_when_disabled() {
        let allocator = Bump::new();
        let options = ParserOptions {
            comments: false,
            ..Default::default()
        };
        let (root, errors) = parse_with_options(&allocator, "<!-- x --><view/>", options);

        assert!(errors.is_empty());
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn test_parse_custom_delimiters() {
        let allocator = Bump::new();
        let options = ParserOptions {
            delimiters: ("[[".into(), "]]".into()),
            ..Default::default()
        };
        let (root, _) = parse_with_options(&allocator, "[[ a ]]", options);

        if let TemplateChildNode::Interpolation(interp) = &root.children[0] {
            assert_eq!(interp.content.as_str(), "a");
        } else {
            panic!("Expected interpolation node");
        }
    }

    #[test]
    fn test_missing_end_tag_nests_children() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<view><text>a</view><image/>");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::MissingEndTag);

        assert_eq!(root.children.len(), 2);
        let view = element(&root.children[0]);
        assert_eq!(element(&view.children[0]).tag.as_str(), "text");
        assert_eq!(element(&root.children[1]).tag.as_str(), "image");
    }

    #[test]
    fn test_unclosed_at_eof() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<view><text>");

        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.code == ErrorCode::MissingEndTag));
        let view = element(&root.children[0]);
        assert_eq!(element(&view.children[0]).tag.as_str(), "text");
    }

    #[test]
    fn test_invalid_end_tag() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<view></text></view>");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::InvalidEndTag);
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn test_error_position() {
        let allocator = Bump::new();
        let (_, errors) = parse(&allocator, "<view>\n</text>");

        assert_eq!(errors[0].position(), Some((2, 1)));
    }
}
