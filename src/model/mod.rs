//! Rich-document input model
//!
//! The exporter reads this model and never mutates it. Documents can be
//! built in code or deserialized from JSON.

mod bibliography;
mod images;

pub use bibliography::{BibEntry, BibliographyDb, DateParts, Person};
pub use images::{ImageData, ImageDb};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an anchor node in the preprocessed tree.
///
/// Assigned densely in document order by the preprocessor; values present
/// in the input are ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A document to export
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    /// Document title
    pub title: Option<String>,
    /// Location of the source document, used as identifier
    pub path: Option<String>,
    /// Content tree
    pub content: Vec<Block>,
    /// Comments referenced by comment ranges
    pub comments: Vec<Comment>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserialize a document from JSON
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append a block
    pub fn with_block(mut self, block: Block) -> Self {
        self.content.push(block);
        self
    }

    /// Add a comment
    pub fn with_comment(mut self, comment: Comment) -> Self {
        self.comments.push(comment);
        self
    }

    /// Look up a comment by id
    pub fn comment(&self, id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }
}

/// Block-level content
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph(Paragraph),
    Heading(Heading),
    List(List),
    Table(Table),
    Figure(Figure),
    Math(MathBlock),
    /// Where the bibliography is rendered
    Bibliography,
    PageBreak,
}

impl Block {
    /// Whether the node is marked hidden
    pub fn is_hidden(&self) -> bool {
        match self {
            Block::Paragraph(p) => p.hidden,
            Block::Heading(h) => h.hidden,
            Block::List(l) => l.hidden,
            Block::Table(t) => t.hidden,
            Block::Figure(f) => f.hidden,
            Block::Math(m) => m.hidden,
            Block::Bibliography | Block::PageBreak => false,
        }
    }

    /// Short name used in log messages and warnings
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Paragraph(_) => "paragraph",
            Block::Heading(_) => "heading",
            Block::List(_) => "list",
            Block::Table(_) => "table",
            Block::Figure(_) => "figure",
            Block::Math(_) => "math block",
            Block::Bibliography => "bibliography",
            Block::PageBreak => "page break",
        }
    }
}

/// Paragraph of inline content
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paragraph {
    /// Paragraph style id (e.g. "Quote")
    pub style: Option<String>,
    pub inlines: Vec<Inline>,
    pub hidden: bool,
}

impl Paragraph {
    /// Create a paragraph holding plain text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            inlines: vec![Inline::text(text)],
            ..Default::default()
        }
    }

    /// Create a paragraph from inline nodes
    pub fn from_inlines(inlines: Vec<Inline>) -> Self {
        Self {
            inlines,
            ..Default::default()
        }
    }

    /// Set the paragraph style
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Mark the paragraph hidden
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Plain text of the paragraph
    pub fn text(&self) -> String {
        inline_text(&self.inlines)
    }
}

/// Section heading
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heading {
    /// Level 1-6
    pub level: u8,
    /// Bookmark name targeted by internal links
    pub anchor: Option<String>,
    pub inlines: Vec<Inline>,
    pub hidden: bool,
}

impl Heading {
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            level,
            inlines: vec![Inline::text(text)],
            ..Default::default()
        }
    }

    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    pub fn text(&self) -> String {
        inline_text(&self.inlines)
    }
}

/// Number format of a list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    #[default]
    Bullet,
    Decimal,
    LowerAlpha,
    UpperAlpha,
    LowerRoman,
    UpperRoman,
}

/// Visual style of a list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ListStyle {
    pub kind: ListKind,
    /// First number of an ordered list
    pub start: u32,
}

impl Default for ListStyle {
    fn default() -> Self {
        Self {
            kind: ListKind::Bullet,
            start: 1,
        }
    }
}

impl ListStyle {
    pub fn bullet() -> Self {
        Self::default()
    }

    pub fn ordered(kind: ListKind, start: u32) -> Self {
        Self { kind, start }
    }

    pub fn is_ordered(&self) -> bool {
        self.kind != ListKind::Bullet
    }
}

/// Bullet or ordered list
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct List {
    #[serde(skip)]
    pub id: NodeId,
    pub style: ListStyle,
    pub items: Vec<ListItem>,
    pub hidden: bool,
}

impl List {
    pub fn new(style: ListStyle, items: Vec<ListItem>) -> Self {
        Self {
            style,
            items,
            ..Default::default()
        }
    }
}

/// Item of a list; may hold nested lists
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListItem {
    pub content: Vec<Block>,
    pub hidden: bool,
}

impl ListItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            content: vec![Block::Paragraph(Paragraph::new(text))],
            hidden: false,
        }
    }

    pub fn from_blocks(content: Vec<Block>) -> Self {
        Self {
            content,
            hidden: false,
        }
    }
}

/// Table with possibly merged cells
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Table {
    #[serde(skip)]
    pub id: NodeId,
    pub rows: Vec<TableRow>,
    /// Number of leading rows repeated as header
    pub header_rows: usize,
    pub hidden: bool,
}

impl Table {
    pub fn new(rows: Vec<TableRow>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

impl TableRow {
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self { cells }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableCell {
    pub content: Vec<Block>,
    pub col_span: u32,
    pub row_span: u32,
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            content: Vec::new(),
            col_span: 1,
            row_span: 1,
        }
    }
}

impl TableCell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            content: vec![Block::Paragraph(Paragraph::new(text))],
            ..Default::default()
        }
    }

    pub fn with_span(mut self, col_span: u32, row_span: u32) -> Self {
        self.col_span = col_span;
        self.row_span = row_span;
        self
    }
}

/// Image with caption
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Figure {
    pub image: ImageRef,
    pub caption: Vec<Inline>,
    pub hidden: bool,
}

/// Display equation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MathBlock {
    #[serde(skip)]
    pub id: NodeId,
    /// LaTeX source
    pub latex: String,
    pub hidden: bool,
}

impl MathBlock {
    pub fn new(latex: impl Into<String>) -> Self {
        Self {
            latex: latex.into(),
            ..Default::default()
        }
    }
}

/// Inline content
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Text(Text),
    Link(Link),
    Citation(Citation),
    Footnote(Footnote),
    Comment(CommentRange),
    Image(ImageRef),
    Math(InlineMath),
    LineBreak,
}

impl Inline {
    /// Plain text node
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text(Text {
            text: text.into(),
            marks: Marks::default(),
        })
    }

    /// Text node with marks
    pub fn styled(text: impl Into<String>, marks: Marks) -> Self {
        Inline::Text(Text {
            text: text.into(),
            marks,
        })
    }

    /// Citation marker for the given keys
    pub fn cite<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Inline::Citation(Citation {
            id: NodeId::default(),
            references: keys.into_iter().map(CiteRef::new).collect(),
        })
    }

    /// Footnote marker with the given content
    pub fn footnote(content: Vec<Paragraph>) -> Self {
        Inline::Footnote(Footnote {
            id: NodeId::default(),
            content,
        })
    }

    /// Comment range around `children`
    pub fn comment(comment_id: impl Into<String>, children: Vec<Inline>) -> Self {
        Inline::Comment(CommentRange {
            id: NodeId::default(),
            comment_id: comment_id.into(),
            children,
        })
    }

    /// Hyperlink
    pub fn link(href: impl Into<String>, children: Vec<Inline>) -> Self {
        Inline::Link(Link {
            href: href.into(),
            children,
        })
    }

    /// Inline image
    pub fn image(image_id: impl Into<String>) -> Self {
        Inline::Image(ImageRef::new(image_id))
    }

    /// Inline math
    pub fn math(latex: impl Into<String>) -> Self {
        Inline::Math(InlineMath {
            id: NodeId::default(),
            latex: latex.into(),
        })
    }
}

/// Character formatting
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub superscript: bool,
    pub subscript: bool,
    pub code: bool,
}

impl Marks {
    pub fn is_plain(&self) -> bool {
        *self == Marks::default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Text {
    pub text: String,
    pub marks: Marks,
}

/// Hyperlink; an `href` starting with `#` targets a heading anchor
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub href: String,
    pub children: Vec<Inline>,
}

impl Link {
    /// Anchor name for internal links
    pub fn internal_anchor(&self) -> Option<&str> {
        self.href.strip_prefix('#')
    }
}

/// Citation marker citing one or more sources
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Citation {
    #[serde(skip)]
    pub id: NodeId,
    pub references: Vec<CiteRef>,
}

impl Citation {
    /// Cited keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.references.iter().map(|r| r.key.as_str())
    }
}

/// One cited source with optional prefix and locator ("p. 4")
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CiteRef {
    pub key: String,
    pub prefix: Option<String>,
    pub locator: Option<String>,
}

impl CiteRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// Footnote marker; the content becomes the footnote text
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Footnote {
    #[serde(skip)]
    pub id: NodeId,
    pub content: Vec<Paragraph>,
}

/// Range of content annotated with a comment
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentRange {
    #[serde(skip)]
    pub id: NodeId,
    /// Id of the comment in [`Document::comments`]
    pub comment_id: String,
    pub children: Vec<Inline>,
}

/// Reference to an image in the [`ImageDb`]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageRef {
    #[serde(skip)]
    pub id: NodeId,
    pub image_id: String,
    /// Display width in pixels
    pub width: Option<u32>,
    /// Display height in pixels
    pub height: Option<u32>,
    pub alt: Option<String>,
}

impl ImageRef {
    pub fn new(image_id: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InlineMath {
    #[serde(skip)]
    pub id: NodeId,
    pub latex: String,
}

/// A comment with optional replies
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub initials: Option<String>,
    /// W3CDTF date, passed through as given
    pub date: Option<String>,
    pub content: Vec<Paragraph>,
    pub replies: Vec<Comment>,
}

impl Comment {
    pub fn new(id: impl Into<String>, author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            content: vec![Paragraph::new(text)],
            ..Default::default()
        }
    }

    pub fn with_reply(mut self, reply: Comment) -> Self {
        self.replies.push(reply);
        self
    }

    /// This comment or the reply with `id`, searched depth first
    pub fn find(&self, id: &str) -> Option<&Comment> {
        if self.id == id {
            return Some(self);
        }
        self.replies.iter().find_map(|reply| reply.find(id))
    }

    /// Initials, derived from the author name when not given
    pub fn initials(&self) -> String {
        match &self.initials {
            Some(i) => i.clone(),
            None => self
                .author
                .split_whitespace()
                .filter_map(|w| w.chars().next())
                .collect(),
        }
    }
}

/// Concatenated plain text of inline nodes (footnotes excluded)
pub fn inline_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(t) => out.push_str(&t.text),
            Inline::Link(l) => out.push_str(&inline_text(&l.children)),
            Inline::Comment(c) => out.push_str(&inline_text(&c.children)),
            Inline::Math(m) => out.push_str(&m.latex),
            Inline::LineBreak => out.push(' '),
            Inline::Citation(_) | Inline::Footnote(_) | Inline::Image(_) => {}
        }
    }
    out
}
