//! Abstract numbering definitions

use crate::error::Result;
use crate::xml;
use quick_xml::Writer;

use super::level::Level;
use super::types::NumberFormat;

/// Levels Word allows per definition
pub const MAX_LEVELS: u8 = 9;

/// Abstract numbering definition (w:abstractNum)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbstractNum {
    /// Abstract numbering ID
    pub abstract_num_id: u32,
    /// Multi-level type
    pub multi_level_type: String,
    /// Level definitions, ordered by ilvl
    pub levels: Vec<Level>,
}

impl AbstractNum {
    /// Create a new abstract numbering definition
    pub fn new(id: u32) -> Self {
        AbstractNum {
            abstract_num_id: id,
            multi_level_type: "hybridMultilevel".to_string(),
            levels: Vec::new(),
        }
    }

    /// Add a level to this abstract numbering
    pub fn add_level(&mut self, level: Level) {
        self.levels.retain(|l| l.ilvl != level.ilvl);
        self.levels.push(level);
        self.levels.sort_by_key(|l| l.ilvl);
    }

    /// Nine-level definition drawing every level in `format`
    pub fn with_format(id: u32, format: NumberFormat) -> Self {
        let mut abs = Self::new(id);
        for ilvl in 0..MAX_LEVELS {
            abs.add_level(Level::for_format(ilvl, format));
        }
        abs
    }

    pub(crate) fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        xml::start(
            writer,
            "w:abstractNum",
            &[("w:abstractNumId", self.abstract_num_id.to_string().as_str())],
        )?;
        xml::w_val(writer, "w:multiLevelType", &self.multi_level_type)?;
        for level in &self.levels {
            level.write_to(writer)?;
        }
        xml::end(writer, "w:abstractNum")
    }
}
