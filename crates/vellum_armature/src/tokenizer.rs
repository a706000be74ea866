//! Markup tokenizer for Vellum templates.
//!
//! A byte-level state machine in the style of htmlparser2. Expression
//! placeholders (`{{ ... }}`) are opaque: markup characters inside them never
//! start a tag, and quotes inside them never close an attribute value.

use vellum_relief::ErrorCode;

/// Character codes for fast comparison
pub mod char_codes {
    pub const TAB: u8 = 0x09;
    pub const NEWLINE: u8 = 0x0A;
    pub const FORM_FEED: u8 = 0x0C;
    pub const CARRIAGE_RETURN: u8 = 0x0D;
    pub const SPACE: u8 = 0x20;
    pub const EXCLAMATION_MARK: u8 = 0x21;
    pub const DOUBLE_QUOTE: u8 = 0x22;
    pub const SINGLE_QUOTE: u8 = 0x27;
    pub const DASH: u8 = 0x2D;
    pub const SLASH: u8 = 0x2F;
    pub const LT: u8 = 0x3C;
    pub const EQ: u8 = 0x3D;
    pub const GT: u8 = 0x3E;
    pub const QUESTION_MARK: u8 = 0x3F;
    pub const CLOSE_BRACKET: u8 = 0x5D;
    pub const UPPER_A: u8 = 0x41;
    pub const UPPER_Z: u8 = 0x5A;
    pub const LOWER_A: u8 = 0x61;
    pub const LOWER_Z: u8 = 0x7A;
}

use char_codes::*;

/// `<!` already consumed
const CDATA_OPEN: &[u8] = b"[CDATA[";
const CDATA_CLOSE: &[u8] = b"]]>";

/// All the states the tokenizer can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum State {
    Text = 1,

    // Interpolation
    InterpolationOpen,
    Interpolation,
    InterpolationClose,

    // Tags
    BeforeTagName,
    InTagName,
    InSelfClosingTag,
    BeforeClosingTagName,
    InClosingTagName,
    AfterClosingTagName,

    // Attributes
    BeforeAttrName,
    InAttrName,
    AfterAttrName,
    BeforeAttrValue,
    InAttrValueDq,
    InAttrValueSq,
    InAttrValueNq,

    // Declarations & processing instructions
    BeforeDeclaration,
    InDeclaration,
    InProcessingInstruction,

    // Comments
    BeforeComment,
    InCommentLike,

    // Character data, kept as text
    InCdata,
}

/// Quote type for attribute values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum QuoteType {
    NoValue = 0,
    Unquoted = 1,
    Single = 2,
    Double = 3,
}

/// Tokenizer callbacks
pub trait Callbacks {
    fn on_text(&mut self, start: usize, end: usize);

    fn on_interpolation(&mut self, start: usize, end: usize);

    fn on_open_tag_name(&mut self, start: usize, end: usize);
    fn on_open_tag_end(&mut self, end: usize);
    fn on_self_closing_tag(&mut self, end: usize);
    fn on_close_tag(&mut self, start: usize, end: usize);

    fn on_attrib_name(&mut self, start: usize, end: usize);
    fn on_attrib_data(&mut self, start: usize, end: usize);
    fn on_attrib_end(&mut self, quote: QuoteType, end: usize);

    fn on_comment(&mut self, start: usize, end: usize);

    fn on_end(&mut self);
    fn on_error(&mut self, code: ErrorCode, index: usize);
}

/// Check if character is a tag start character (a-z, A-Z)
#[inline]
pub fn is_tag_start_char(c: u8) -> bool {
    (LOWER_A..=LOWER_Z).contains(&c) || (UPPER_A..=UPPER_Z).contains(&c)
}

/// Check if character is whitespace
#[inline]
pub fn is_whitespace(c: u8) -> bool {
    c == SPACE || c == NEWLINE || c == TAB || c == FORM_FEED || c == CARRIAGE_RETURN
}

/// Check if character ends a tag section
#[inline]
pub fn is_end_of_tag_section(c: u8) -> bool {
    c == SLASH || c == GT || is_whitespace(c)
}

/// Markup tokenizer
pub struct Tokenizer<'a, C: Callbacks> {
    /// Input source
    input: &'a [u8],
    /// Current state
    state: State,
    /// Buffer start position
    section_start: usize,
    /// Current index
    index: usize,
    /// Callbacks
    callbacks: C,
    /// Delimiter open sequence
    delimiter_open: &'a [u8],
    /// Delimiter close sequence
    delimiter_close: &'a [u8],
    /// Current delimiter index
    delimiter_index: usize,
    /// Inside a placeholder that sits in an attribute value
    in_value_interpolation: bool,
}

impl<'a, C: Callbacks> Tokenizer<'a, C> {
    /// Create a new tokenizer
    pub fn new(input: &'a str, callbacks: C) -> Self {
        Self::with_delimiters(input, callbacks, b"{{", b"}}")
    }

    /// Create a new tokenizer with custom delimiters
    pub fn with_delimiters(
        input: &'a str,
        callbacks: C,
        delimiter_open: &'a [u8],
        delimiter_close: &'a [u8],
    ) -> Self {
        Self {
            input: input.as_bytes(),
            state: State::Text,
            section_start: 0,
            index: 0,
            callbacks,
            delimiter_open,
            delimiter_close,
            delimiter_index: 0,
            in_value_interpolation: false,
        }
    }

    /// Tokenize the input
    pub fn tokenize(&mut self) {
        while self.index < self.input.len() {
            let c = self.input[self.index];

            match self.state {
                State::Text => self.state_text(c),
                State::InterpolationOpen => self.state_interpolation_open(c),
                State::Interpolation => self.state_interpolation(c),
                State::InterpolationClose => self.state_interpolation_close(c),
                State::BeforeTagName => self.state_before_tag_name(c),
                State::InTagName => self.state_in_tag_name(c),
                State::InSelfClosingTag => self.state_in_self_closing_tag(c),
                State::BeforeClosingTagName => self.state_before_closing_tag_name(c),
                State::InClosingTagName => self.state_in_closing_tag_name(c),
                State::AfterClosingTagName => self.state_after_closing_tag_name(c),
                State::BeforeAttrName => self.state_before_attr_name(c),
                State::InAttrName => self.state_in_attr_name(c),
                State::AfterAttrName => self.state_after_attr_name(c),
                State::BeforeAttrValue => self.state_before_attr_value(c),
                State::InAttrValueDq => self.state_in_attr_value_dq(c),
                State::InAttrValueSq => self.state_in_attr_value_sq(c),
                State::InAttrValueNq => self.state_in_attr_value_nq(c),
                State::BeforeDeclaration => self.state_before_declaration(c),
                State::InDeclaration => self.state_in_declaration(c),
                State::InProcessingInstruction => self.state_in_processing_instruction(c),
                State::BeforeComment => self.state_before_comment(c),
                State::InCommentLike => self.state_in_comment_like(c),
                State::InCdata => self.state_in_cdata(c),
            }

            self.index += 1;
        }

        // Handle remaining content
        self.cleanup();
        self.callbacks.on_end();
    }

    /// Consume the tokenizer and hand back its callbacks
    pub fn into_callbacks(self) -> C {
        self.callbacks
    }

    fn cleanup(&mut self) {
        match self.state {
            State::Text | State::InterpolationOpen | State::BeforeTagName => {
                if self.section_start < self.index {
                    self.callbacks.on_text(self.section_start, self.index);
                }
            }
            State::Interpolation | State::InterpolationClose => {
                self.callbacks
                    .on_error(ErrorCode::EofInInterpolation, self.index);
                let start = self.section_start - self.delimiter_open.len();
                self.callbacks.on_text(start, self.index);
            }
            State::InTagName
            | State::BeforeClosingTagName
            | State::InClosingTagName
            | State::BeforeAttrName
            | State::InAttrName
            | State::AfterAttrName
            | State::BeforeAttrValue
            | State::InAttrValueDq
            | State::InAttrValueSq
            | State::InAttrValueNq
            | State::InSelfClosingTag
            | State::AfterClosingTagName
            | State::BeforeDeclaration
            | State::InDeclaration
            | State::InProcessingInstruction
            | State::BeforeComment => {
                self.callbacks.on_error(ErrorCode::EofInTag, self.index);
            }
            State::InCommentLike => {
                self.callbacks.on_error(ErrorCode::EofInComment, self.index);
                self.callbacks.on_comment(self.section_start, self.index);
            }
            State::InCdata => {
                self.callbacks.on_error(ErrorCode::EofInCdata, self.index);
                self.callbacks.on_text(self.section_start, self.index);
            }
        }
    }

    /// Whether `seq` starts at the current index
    fn matches_at(&self, seq: &[u8]) -> bool {
        self.input[self.index..].starts_with(seq)
    }

    // ========== State handlers ==========

    fn state_text(&mut self, c: u8) {
        if c == LT {
            if self.index > self.section_start {
                self.callbacks.on_text(self.section_start, self.index);
            }
            self.state = State::BeforeTagName;
            self.section_start = self.index;
        } else if c == self.delimiter_open[0] {
            self.state = State::InterpolationOpen;
            self.delimiter_index = 0;
            self.state_interpolation_open(c);
        }
    }

    fn state_interpolation_open(&mut self, c: u8) {
        if c == self.delimiter_open[self.delimiter_index] {
            self.delimiter_index += 1;
            if self.delimiter_index == self.delimiter_open.len() {
                // Emit text before interpolation
                let start = self.index + 1 - self.delimiter_open.len();
                if start > self.section_start {
                    self.callbacks.on_text(self.section_start, start);
                }
                self.section_start = self.index + 1;
                self.state = State::Interpolation;
                self.delimiter_index = 0;
            }
        } else {
            self.state = State::Text;
            self.state_text(c);
        }
    }

    fn state_interpolation(&mut self, c: u8) {
        if c == self.delimiter_close[0] {
            self.state = State::InterpolationClose;
            self.delimiter_index = 0;
            self.state_interpolation_close(c);
        }
    }

    fn state_interpolation_close(&mut self, c: u8) {
        if c == self.delimiter_close[self.delimiter_index] {
            self.delimiter_index += 1;
            if self.delimiter_index == self.delimiter_close.len() {
                self.callbacks.on_interpolation(
                    self.section_start,
                    self.index + 1 - self.delimiter_close.len(),
                );
                self.section_start = self.index + 1;
                self.state = State::Text;
            }
        } else {
            self.state = State::Interpolation;
            self.state_interpolation(c);
        }
    }

    fn state_before_tag_name(&mut self, c: u8) {
        if c == EXCLAMATION_MARK {
            self.state = State::BeforeDeclaration;
            self.section_start = self.index + 1;
        } else if c == QUESTION_MARK {
            self.state = State::InProcessingInstruction;
            self.section_start = self.index + 1;
        } else if is_tag_start_char(c) {
            self.section_start = self.index;
            self.state = State::InTagName;
        } else if c == SLASH {
            self.state = State::BeforeClosingTagName;
        } else {
            // A lone `<` is plain text
            self.state = State::Text;
            self.state_text(c);
        }
    }

    fn state_in_tag_name(&mut self, c: u8) {
        if is_end_of_tag_section(c) {
            self.callbacks
                .on_open_tag_name(self.section_start, self.index);
            self.section_start = self.index;
            self.state = State::BeforeAttrName;
            self.state_before_attr_name(c);
        }
    }

    fn state_in_self_closing_tag(&mut self, c: u8) {
        if c == GT {
            self.callbacks.on_self_closing_tag(self.index);
            self.state = State::Text;
            self.section_start = self.index + 1;
        } else if !is_whitespace(c) {
            self.state = State::BeforeAttrName;
            self.state_before_attr_name(c);
        }
    }

    fn state_before_closing_tag_name(&mut self, c: u8) {
        if is_whitespace(c) {
            // Skip
        } else if c == GT {
            self.callbacks
                .on_error(ErrorCode::MissingEndTagName, self.index);
            self.state = State::Text;
            self.section_start = self.index + 1;
        } else {
            self.state = State::InClosingTagName;
            self.section_start = self.index;
        }
    }

    fn state_in_closing_tag_name(&mut self, c: u8) {
        if c == GT || is_whitespace(c) {
            self.callbacks.on_close_tag(self.section_start, self.index);
            self.section_start = self.index + 1;
            self.state = if c == GT {
                State::Text
            } else {
                State::AfterClosingTagName
            };
        }
    }

    fn state_after_closing_tag_name(&mut self, c: u8) {
        if c == GT {
            self.state = State::Text;
            self.section_start = self.index + 1;
        }
    }

    fn state_before_attr_name(&mut self, c: u8) {
        if c == GT {
            self.callbacks.on_open_tag_end(self.index);
            self.state = State::Text;
            self.section_start = self.index + 1;
        } else if c == SLASH {
            self.state = State::InSelfClosingTag;
        } else if !is_whitespace(c) {
            self.state = State::InAttrName;
            self.section_start = self.index;
        }
    }

    fn state_in_attr_name(&mut self, c: u8) {
        if c == EQ || is_end_of_tag_section(c) {
            self.callbacks
                .on_attrib_name(self.section_start, self.index);
            self.section_start = self.index;
            self.state = State::AfterAttrName;
            self.state_after_attr_name(c);
        }
    }

    fn state_after_attr_name(&mut self, c: u8) {
        if c == EQ {
            self.state = State::BeforeAttrValue;
        } else if c == SLASH || c == GT {
            self.callbacks.on_attrib_end(QuoteType::NoValue, self.index);
            self.state = State::BeforeAttrName;
            self.state_before_attr_name(c);
        } else if !is_whitespace(c) {
            self.callbacks.on_attrib_end(QuoteType::NoValue, self.index);
            self.state = State::InAttrName;
            self.section_start = self.index;
        }
    }

    fn state_before_attr_value(&mut self, c: u8) {
        if c == DOUBLE_QUOTE {
            self.state = State::InAttrValueDq;
            self.section_start = self.index + 1;
        } else if c == SINGLE_QUOTE {
            self.state = State::InAttrValueSq;
            self.section_start = self.index + 1;
        } else if !is_whitespace(c) {
            self.section_start = self.index;
            self.state = State::InAttrValueNq;
            self.state_in_attr_value_nq(c);
        }
    }

    /// Step over placeholders inside attribute values.
    ///
    /// Returns true while the current byte belongs to a placeholder.
    fn skip_value_interpolation(&mut self) -> bool {
        if self.in_value_interpolation {
            if self.matches_at(self.delimiter_close) {
                self.index += self.delimiter_close.len() - 1;
                self.in_value_interpolation = false;
            }
            return true;
        }
        if self.matches_at(self.delimiter_open) {
            self.index += self.delimiter_open.len() - 1;
            self.in_value_interpolation = true;
            return true;
        }
        false
    }

    fn state_in_attr_value_dq(&mut self, c: u8) {
        if self.skip_value_interpolation() {
            return;
        }
        if c == DOUBLE_QUOTE {
            self.emit_attr_value(QuoteType::Double);
        }
    }

    fn state_in_attr_value_sq(&mut self, c: u8) {
        if self.skip_value_interpolation() {
            return;
        }
        if c == SINGLE_QUOTE {
            self.emit_attr_value(QuoteType::Single);
        }
    }

    fn state_in_attr_value_nq(&mut self, c: u8) {
        if self.skip_value_interpolation() {
            return;
        }
        if is_whitespace(c) || c == GT {
            self.emit_attr_value(QuoteType::Unquoted);
            self.state_before_attr_name(c);
        } else if c == SLASH {
            self.emit_attr_value(QuoteType::Unquoted);
            self.state = State::InSelfClosingTag;
        }
    }

    fn emit_attr_value(&mut self, quote: QuoteType) {
        if self.section_start < self.index {
            self.callbacks
                .on_attrib_data(self.section_start, self.index);
        }
        self.callbacks.on_attrib_end(quote, self.index);
        self.section_start = self.index + 1;
        self.in_value_interpolation = false;
        self.state = State::BeforeAttrName;
    }

    fn state_before_declaration(&mut self, c: u8) {
        if c == DASH {
            self.state = State::BeforeComment;
            self.section_start = self.index + 1;
        } else if self.matches_at(CDATA_OPEN) {
            self.state = State::InCdata;
            // Back to the `<`
            self.section_start = self.index - 2;
            self.index += CDATA_OPEN.len() - 1;
        } else {
            self.state = State::InDeclaration;
            self.state_in_declaration(c);
        }
    }

    fn state_in_declaration(&mut self, c: u8) {
        if c == GT {
            self.state = State::Text;
            self.section_start = self.index + 1;
        }
    }

    fn state_in_processing_instruction(&mut self, c: u8) {
        if c == GT {
            self.state = State::Text;
            self.section_start = self.index + 1;
        }
    }

    fn state_before_comment(&mut self, c: u8) {
        if c == DASH {
            self.state = State::InCommentLike;
            self.section_start = self.index + 1;
        } else {
            self.state = State::InDeclaration;
            self.state_in_declaration(c);
        }
    }

    fn state_in_comment_like(&mut self, c: u8) {
        if c == DASH
            && self.index + 2 < self.input.len()
            && self.input[self.index + 1] == DASH
            && self.input[self.index + 2] == GT
        {
            self.callbacks.on_comment(self.section_start, self.index);
            self.index += 2;
            self.state = State::Text;
            self.section_start = self.index + 1;
        }
    }

    fn state_in_cdata(&mut self, c: u8) {
        if c == CLOSE_BRACKET && self.matches_at(CDATA_CLOSE) {
            self.index += CDATA_CLOSE.len() - 1;
            self.callbacks.on_text(self.section_start, self.index + 1);
            self.state = State::Text;
            self.section_start = self.index + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every callback as a readable event
    #[derive(Default)]
    struct Recorder<'s> {
        source: &'s str,
        events: Vec<String>,
    }

    impl<'s> Recorder<'s> {
        fn slice(&self, start: usize, end: usize) -> &'s str {
            &self.source[start..end]
        }
    }

    impl<'s> Callbacks for Recorder<'s> {
        fn on_text(&mut self, start: usize, end: usize) {
            let text = self.slice(start, end);
            self.events.push(format!("text:{text}"));
        }
        fn on_interpolation(&mut self, start: usize, end: usize) {
            let expr = self.slice(start, end);
            self.events.push(format!("interp:{expr}"));
        }
        fn on_open_tag_name(&mut self, start: usize, end: usize) {
            let tag = self.slice(start, end);
            self.events.push(format!("open:{tag}"));
        }
        fn on_open_tag_end(&mut self, _end: usize) {
            self.events.push("open_end".into());
        }
        fn on_self_closing_tag(&mut self, _end: usize) {
            self.events.push("self_close".into());
        }
        fn on_close_tag(&mut self, start: usize, end: usize) {
            let tag = self.slice(start, end);
            self.events.push(format!("close:{tag}"));
        }
        fn on_attrib_name(&mut self, start: usize, end: usize) {
            let name = self.slice(start, end);
            self.events.push(format!("attr:{name}"));
        }
        fn on_attrib_data(&mut self, start: usize, end: usize) {
            let value = self.slice(start, end);
            self.events.push(format!("value:{value}"));
        }
        fn on_attrib_end(&mut self, _quote: QuoteType, _end: usize) {}
        fn on_comment(&mut self, start: usize, end: usize) {
            let comment = self.slice(start, end);
            self.events.push(format!("comment:{comment}"));
        }
        fn on_end(&mut self) {}
        fn on_error(&mut self, code: ErrorCode, _index: usize) {
            self.events.push(format!("error:{code:?}"));
        }
    }

    fn tokenize(source: &str) -> Vec<String> {
        let recorder = Recorder {
            source,
            events: Vec::new(),
        };
        let mut tokenizer = Tokenizer::new(source, recorder);
        tokenizer.tokenize();
        tokenizer.into_callbacks().events
    }

    #[test]
    fn test_tokenize_element_with_attr() {
        assert_eq!(
            tokenize(r#"<image src="a.png"></image>"#),
            vec!["open:image", "attr:src", "value:a.png", "open_end", "close:image"]
        );
    }

    #[test]
    fn test_tokenize_self_closing() {
        assert_eq!(
            tokenize(r#"<import src="/a.wxml"/>"#),
            vec!["open:import", "attr:src", "value:/a.wxml", "self_close"]
        );
    }

    #[test]
    fn test_quotes_inside_value_placeholder() {
        assert_eq!(
            tokenize(r#"<image src="{{ ok ? "a.png" : 'b.png' }}" />"#),
            vec![
                "open:image",
                "attr:src",
                r#"value:{{ ok ? "a.png" : 'b.png' }}"#,
                "self_close"
            ]
        );
    }

    #[test]
    fn test_lt_inside_text_placeholder() {
        assert_eq!(
            tokenize("<view>{{ a < b }}</view>"),
            vec!["open:view", "open_end", "interp: a < b ", "close:view"]
        );
    }

    #[test]
    fn test_comment() {
        assert_eq!(tokenize("<!-- note -->"), vec!["comment: note "]);
    }

    #[test]
    fn test_unterminated_placeholder() {
        assert_eq!(
            tokenize("hi {{ oops"),
            vec!["text:hi ", "error:EofInInterpolation", "text:{{ oops"]
        );
    }

    #[test]
    fn test_eof_in_tag() {
        assert_eq!(tokenize("<view class"), vec!["open:view", "error:EofInTag"]);
        assert_eq!(
            tokenize(r#"<image src="./x.png""#),
            vec!["open:image", "attr:src", "value:./x.png", "error:EofInTag"]
        );
        assert_eq!(tokenize("<view /"), vec!["open:view", "error:EofInTag"]);
    }

    #[test]
    fn test_cdata_is_text() {
        assert_eq!(
            tokenize(r#"<![CDATA[ <image src="x.png"/> ]]><view/>"#),
            vec![
                r#"text:<![CDATA[ <image src="x.png"/> ]]>"#,
                "open:view",
                "self_close"
            ]
        );
        assert_eq!(
            tokenize("<![CDATA[ a"),
            vec!["error:EofInCdata", "text:<![CDATA[ a"]
        );
    }
}
