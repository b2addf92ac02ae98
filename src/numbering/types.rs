//! Numbering-related types and enums

use crate::model::ListKind;

/// Number format (w:numFmt)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberFormat {
    /// 1, 2, 3
    Decimal,
    /// I, II, III
    UpperRoman,
    /// i, ii, iii
    LowerRoman,
    /// A, B, C
    UpperLetter,
    /// a, b, c
    LowerLetter,
    /// •
    Bullet,
}

impl NumberFormat {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            NumberFormat::Decimal => "decimal",
            NumberFormat::UpperRoman => "upperRoman",
            NumberFormat::LowerRoman => "lowerRoman",
            NumberFormat::UpperLetter => "upperLetter",
            NumberFormat::LowerLetter => "lowerLetter",
            NumberFormat::Bullet => "bullet",
        }
    }

    /// Check if this is a bullet format
    pub fn is_bullet(&self) -> bool {
        matches!(self, NumberFormat::Bullet)
    }
}

impl From<ListKind> for NumberFormat {
    fn from(kind: ListKind) -> Self {
        match kind {
            ListKind::Bullet => NumberFormat::Bullet,
            ListKind::Decimal => NumberFormat::Decimal,
            ListKind::LowerAlpha => NumberFormat::LowerLetter,
            ListKind::UpperAlpha => NumberFormat::UpperLetter,
            ListKind::LowerRoman => NumberFormat::LowerRoman,
            ListKind::UpperRoman => NumberFormat::UpperRoman,
        }
    }
}

/// Numbering of a list paragraph (w:numPr)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumberingInfo {
    /// The numbering ID (references a Num definition)
    pub num_id: u32,
    /// The level (0-8)
    pub level: u8,
}

impl NumberingInfo {
    /// Create a new NumberingInfo
    pub fn new(num_id: u32, level: u8) -> Self {
        Self { num_id, level }
    }
}
