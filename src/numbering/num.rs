//! Numbering instance definitions

use crate::error::Result;
use crate::xml;
use quick_xml::Writer;

use super::level::LevelOverride;

/// Numbering instance (w:num)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Num {
    /// Numbering ID (referenced by paragraphs)
    pub num_id: u32,
    /// Referenced abstract numbering ID
    pub abstract_num_id: u32,
    /// Level overrides
    pub level_overrides: Vec<LevelOverride>,
}

impl Num {
    /// Create a new numbering instance
    pub fn new(num_id: u32, abstract_num_id: u32) -> Self {
        Num {
            num_id,
            abstract_num_id,
            level_overrides: Vec::new(),
        }
    }

    /// Restart level `ilvl` at `start`
    pub fn with_override(mut self, level_override: LevelOverride) -> Self {
        self.level_overrides.push(level_override);
        self
    }

    pub(crate) fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        xml::start(writer, "w:num", &[("w:numId", self.num_id.to_string().as_str())])?;
        xml::w_val(writer, "w:abstractNumId", &self.abstract_num_id.to_string())?;
        for lo in &self.level_overrides {
            lo.write_to(writer)?;
        }
        xml::end(writer, "w:num")
    }
}
