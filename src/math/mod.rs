//! LaTeX to OMML conversion
//!
//! Formulas are parsed into a [`MathExpr`] tree and written as Office Math
//! elements. A formula outside the supported subset is kept as its source
//! text and a warning is recorded.

mod omml;
mod parser;
mod symbols;

pub use omml::{omath, omath_para};
pub use parser::{parse, MathError, MathExpr};

use crate::model::{Block, Inline, NodeId};
use crate::preprocess::{ContentTree, Story, Visitor};
use crate::warning::{WarningKind, Warnings};
use crate::xml::XmlElement;
use std::collections::BTreeMap;

/// Result of converting one formula
#[derive(Clone, Debug, PartialEq)]
pub enum MathOutput {
    /// `m:oMath` element
    Omml(XmlElement),
    /// Source text to show as a plain run
    Fallback(String),
}

/// Convert LaTeX source to an `m:oMath` element
pub fn convert(latex: &str) -> Result<XmlElement, MathError> {
    Ok(omath(&parse(latex)?))
}

#[derive(Default)]
struct Formulas<'a> {
    found: Vec<(NodeId, &'a str)>,
}

impl<'a> Visitor<'a> for Formulas<'a> {
    fn visit_block(&mut self, _story: Story, block: &'a Block) {
        if let Block::Math(m) = block {
            self.found.push((m.id, &m.latex));
        }
    }

    fn visit_inline(&mut self, _story: Story, inline: &'a Inline) {
        if let Inline::Math(m) = inline {
            self.found.push((m.id, &m.latex));
        }
    }
}

/// Convert every formula of the tree, keyed by node
pub fn convert_all(tree: &ContentTree, warnings: &mut Warnings) -> BTreeMap<NodeId, MathOutput> {
    let mut formulas = Formulas::default();
    tree.walk(&mut formulas);

    formulas
        .found
        .into_iter()
        .map(|(id, latex)| {
            let output = match convert(latex) {
                Ok(element) => MathOutput::Omml(element),
                Err(e) => {
                    warnings.push(
                        WarningKind::UnsupportedMath,
                        format!("formula {} kept as text: {}", id, e),
                    );
                    MathOutput::Fallback(latex.to_string())
                }
            };
            (id, output)
        })
        .collect()
}
