//! Raw input types produced by the upstream layout/segmentation stage.

use serde::{Deserialize, Serialize};

use super::geometry::{BoundingBox, FontStyle};

/// Paragraph type tags assigned by the upstream segmentation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphType {
    /// Running body text
    Text,
    /// A list item
    ListItem,
    /// Document title
    Title,
    /// Section heading
    SectionHeader,
    /// Repeated page header
    PageHeader,
    /// Repeated page footer
    PageFooter,
    /// A footnote
    Footnote,
    /// Figure or table caption
    Caption,
    /// A table block
    Table,
    /// An image block
    Picture,
    /// A formula block
    Formula,
}

impl ParagraphType {
    /// Types that carry translatable running text and take part in alignment.
    pub fn is_running_text(&self) -> bool {
        matches!(
            self,
            ParagraphType::Text
                | ParagraphType::ListItem
                | ParagraphType::Title
                | ParagraphType::SectionHeader
        )
    }

    /// Types that may be glued to the next page's first paragraph.
    ///
    /// Structural blocks never continue across a page break.
    pub fn allows_cross_page_merge(&self) -> bool {
        !matches!(
            self,
            ParagraphType::Formula
                | ParagraphType::Footnote
                | ParagraphType::Table
                | ParagraphType::Picture
                | ParagraphType::Title
                | ParagraphType::PageHeader
                | ParagraphType::SectionHeader
                | ParagraphType::Caption
                | ParagraphType::PageFooter
        )
    }
}

/// Page geometry shared by all segments of one language rendition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageContext {
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Total number of pages in this language's rendition
    pub page_count: u32,
}

impl PageContext {
    /// Create a new page context.
    pub fn new(width: f32, height: f32, page_count: u32) -> Self {
        Self {
            width,
            height,
            page_count,
        }
    }

    /// Whether the dimensions are usable.
    pub fn is_well_formed(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// A single extracted token inside a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Token text
    pub text: String,
    /// Token bounding box
    pub bounds: BoundingBox,
    /// Token font
    pub font: FontStyle,
}

impl Token {
    /// Create a new token.
    pub fn new(text: impl Into<String>, bounds: BoundingBox, font: FontStyle) -> Self {
        Self {
            text: text.into(),
            bounds,
            font,
        }
    }
}

/// One raw paragraph segment as delivered by the segmentation collaborator.
///
/// `bounds` and `tokens` are optional: a degenerate segment with no covered
/// tokens still aligns on its textual signals alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSegment {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Segment type tag
    pub kind: ParagraphType,
    /// Concatenated segment text
    pub text: String,
    /// Segment bounding box, if any tokens exist
    pub bounds: Option<BoundingBox>,
    /// Covered tokens in reading order
    pub tokens: Vec<Token>,
}

impl RawSegment {
    /// Create a segment without token-level detail.
    pub fn new(page_number: u32, kind: ParagraphType, text: impl Into<String>) -> Self {
        Self {
            page_number,
            kind,
            text: text.into(),
            bounds: None,
            tokens: Vec::new(),
        }
    }

    /// Attach a bounding box.
    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Attach covered tokens. The segment box defaults to their union.
    pub fn with_tokens(mut self, tokens: Vec<Token>) -> Self {
        if self.bounds.is_none() {
            self.bounds = tokens
                .iter()
                .map(|t| t.bounds)
                .reduce(|a, b| a.union(&b));
        }
        self.tokens = tokens;
        self
    }
}
