//! Inline pictures (`w:drawing`)
//!
//! ```xml
//! <w:drawing>
//!   <wp:inline distT="0" distB="0" distL="0" distR="0">
//!     <wp:extent cx="..." cy="..."/>
//!     <wp:docPr id="..." name="..." descr="..."/>
//!     <a:graphic>
//!       <a:graphicData uri="...picture">
//!         <pic:pic>...<a:blip r:embed="rIdN"/>...</pic:pic>
//!       </a:graphicData>
//!     </a:graphic>
//!   </wp:inline>
//! </w:drawing>
//! ```

use crate::error::Result;
use crate::media::pixels_to_emu;
use crate::model::NodeId;
use crate::xml::{self, PIC};
use quick_xml::Writer;
use std::io::Write;

/// What a drawing needs from the media store and the image reference
#[derive(Clone, Debug)]
pub struct Picture<'a> {
    pub node: NodeId,
    pub rel_id: &'a str,
    /// Display size in pixels
    pub size: (u32, u32),
    pub alt: Option<&'a str>,
}

impl Picture<'_> {
    /// Drawing object id; unique per node and never 0
    fn object_id(&self) -> String {
        (self.node.0 + 1).to_string()
    }

    fn name(&self) -> String {
        format!("Picture {}", self.node.0 + 1)
    }

    /// Write the `w:drawing` element (inside a run)
    pub fn write_to<W: Write>(&self, w: &mut Writer<W>) -> Result<()> {
        let cx = pixels_to_emu(self.size.0).to_string();
        let cy = pixels_to_emu(self.size.1).to_string();
        let id = self.object_id();
        let name = self.name();
        let descr = self.alt.unwrap_or_default();

        xml::start(w, "w:drawing", &[])?;
        xml::start(
            w,
            "wp:inline",
            &[("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")],
        )?;
        xml::empty(w, "wp:extent", &[("cx", &cx), ("cy", &cy)])?;
        xml::empty(w, "wp:docPr", &[("id", &id), ("name", &name), ("descr", descr)])?;

        xml::start(w, "a:graphic", &[])?;
        xml::start(w, "a:graphicData", &[("uri", PIC)])?;
        xml::start(w, "pic:pic", &[])?;

        xml::start(w, "pic:nvPicPr", &[])?;
        xml::empty(w, "pic:cNvPr", &[("id", &id), ("name", &name), ("descr", descr)])?;
        xml::empty(w, "pic:cNvPicPr", &[])?;
        xml::end(w, "pic:nvPicPr")?;

        xml::start(w, "pic:blipFill", &[])?;
        xml::empty(w, "a:blip", &[("r:embed", self.rel_id)])?;
        xml::start(w, "a:stretch", &[])?;
        xml::empty(w, "a:fillRect", &[])?;
        xml::end(w, "a:stretch")?;
        xml::end(w, "pic:blipFill")?;

        xml::start(w, "pic:spPr", &[])?;
        xml::start(w, "a:xfrm", &[])?;
        xml::empty(w, "a:off", &[("x", "0"), ("y", "0")])?;
        xml::empty(w, "a:ext", &[("cx", &cx), ("cy", &cy)])?;
        xml::end(w, "a:xfrm")?;
        xml::start(w, "a:prstGeom", &[("prst", "rect")])?;
        xml::empty(w, "a:avLst", &[])?;
        xml::end(w, "a:prstGeom")?;
        xml::end(w, "pic:spPr")?;

        xml::end(w, "pic:pic")?;
        xml::end(w, "a:graphicData")?;
        xml::end(w, "a:graphic")?;
        xml::end(w, "wp:inline")?;
        xml::end(w, "w:drawing")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drawing_markup() {
        let picture = Picture {
            node: NodeId(4),
            rel_id: "rId9",
            size: (100, 50),
            alt: Some("A \"chart\""),
        };
        let mut w = Writer::new(Vec::new());
        picture.write_to(&mut w).unwrap();
        let out = String::from_utf8(w.into_inner()).unwrap();

        assert!(out.starts_with(r#"<w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#));
        assert!(out.contains(r#"<wp:extent cx="952500" cy="476250"/>"#));
        assert!(out.contains(r#"<wp:docPr id="5" name="Picture 5" descr="A &quot;chart&quot;"/>"#));
        assert!(out.contains(r#"<a:blip r:embed="rId9"/>"#));
        assert!(out.ends_with("</wp:inline></w:drawing>"));
    }
}
