//! Level definitions for numbering

use crate::error::Result;
use crate::xml;
use quick_xml::Writer;

use super::types::NumberFormat;

/// Bullet glyphs, cycled by level
const BULLETS: [&str; 3] = ["\u{2022}", "\u{25E6}", "\u{25AA}"];

/// Indent step per level (twips)
const INDENT_STEP: u32 = 720;
/// Hanging indent of the number (twips)
const HANGING: u32 = 360;

/// Level definition (w:lvl)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    /// Level index (0-8)
    pub ilvl: u8,
    /// Start value
    pub start: u32,
    /// Number format
    pub num_fmt: NumberFormat,
    /// Level text (e.g., "%1.", "•")
    pub level_text: String,
    /// Level justification
    pub lvl_jc: String,
    /// Left indentation (twips)
    pub ind_left: u32,
    /// Hanging indentation (twips)
    pub ind_hanging: u32,
}

/// Level override (w:lvlOverride)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelOverride {
    /// Level index
    pub ilvl: u8,
    /// Start override
    pub start_override: u32,
}

impl Level {
    /// Create a new level with the given index
    pub fn new(ilvl: u8) -> Self {
        Level {
            ilvl,
            start: 1,
            num_fmt: NumberFormat::Decimal,
            level_text: format!("%{}.", ilvl + 1),
            lvl_jc: "left".to_string(),
            ind_left: INDENT_STEP * (ilvl as u32 + 1),
            ind_hanging: HANGING,
        }
    }

    /// Level `ilvl` of a list drawn in `format`
    pub fn for_format(ilvl: u8, format: NumberFormat) -> Self {
        let level = Level::new(ilvl).with_format(format);
        if format.is_bullet() {
            level.with_text(BULLETS[ilvl as usize % BULLETS.len()])
        } else {
            level
        }
    }

    /// Set the number format
    pub fn with_format(mut self, fmt: NumberFormat) -> Self {
        self.num_fmt = fmt;
        self
    }

    /// Set the level text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.level_text = text.into();
        self
    }

    /// Set the start value
    pub fn with_start(mut self, start: u32) -> Self {
        self.start = start;
        self
    }

    /// Set the justification
    pub fn with_justification(mut self, jc: impl Into<String>) -> Self {
        self.lvl_jc = jc.into();
        self
    }

    pub(crate) fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        xml::start(writer, "w:lvl", &[("w:ilvl", self.ilvl.to_string().as_str())])?;
        xml::w_val(writer, "w:start", &self.start.to_string())?;
        xml::w_val(writer, "w:numFmt", self.num_fmt.as_str())?;
        xml::w_val(writer, "w:lvlText", &self.level_text)?;
        xml::w_val(writer, "w:lvlJc", &self.lvl_jc)?;

        xml::start(writer, "w:pPr", &[])?;
        xml::empty(
            writer,
            "w:ind",
            &[
                ("w:left", self.ind_left.to_string().as_str()),
                ("w:hanging", self.ind_hanging.to_string().as_str()),
            ],
        )?;
        xml::end(writer, "w:pPr")?;

        xml::end(writer, "w:lvl")
    }
}

impl LevelOverride {
    pub fn new(ilvl: u8, start_override: u32) -> Self {
        Self {
            ilvl,
            start_override,
        }
    }

    pub(crate) fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        xml::start(
            writer,
            "w:lvlOverride",
            &[("w:ilvl", self.ilvl.to_string().as_str())],
        )?;
        xml::w_val(writer, "w:startOverride", &self.start_override.to_string())?;
        xml::end(writer, "w:lvlOverride")
    }
}
