//! OMML (Office Math Markup Language) output

use super::parser::MathExpr;
use crate::xml::{XmlElement, XmlNode};

fn m(name: &str) -> XmlElement {
    XmlElement::new(format!("m:{}", name))
}

fn val(name: &str, value: &str) -> XmlElement {
    m(name).with_attr("m:val", value)
}

/// `m:r` with optional run properties
fn run(text: &str, props: Option<XmlElement>) -> XmlElement {
    let mut t = m("t");
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        t = t.with_attr("xml:space", "preserve");
    }
    let mut r = m("r");
    if let Some(props) = props {
        r = r.with_child(m("rPr").with_child(props));
    }
    r.with_child(t.with_text(text))
}

/// Element `name` holding the converted expressions
fn container(name: &str, exprs: &[MathExpr]) -> XmlElement {
    let mut element = m(name);
    for expr in exprs {
        append(&mut element, expr);
    }
    element
}

fn single(name: &str, expr: &MathExpr) -> XmlElement {
    container(name, std::slice::from_ref(expr))
}

fn append(parent: &mut XmlElement, expr: &MathExpr) {
    match expr {
        MathExpr::Group(items) => {
            for item in items {
                append(parent, item);
            }
        }
        other => parent.children.push(XmlNode::Element(convert(other))),
    }
}

fn convert(expr: &MathExpr) -> XmlElement {
    match expr {
        MathExpr::Ident(s) | MathExpr::Number(s) | MathExpr::Operator(s) => run(s, None),
        MathExpr::Text(s) => run(s, Some(m("nor"))),
        MathExpr::Styled { style, text } => run(text, Some(val("sty", style))),
        MathExpr::Space(s) => run(s, None),
        // Groups are flattened by `append`; a bare group becomes a box
        MathExpr::Group(items) => m("box").with_child(container("e", items)),
        MathExpr::Function { name, argument } => m("func")
            .with_child(single("fName", name))
            .with_child(container("e", argument)),
        MathExpr::Limit { base, limit } => m("limLow")
            .with_child(single("e", base))
            .with_child(container("lim", limit)),
        MathExpr::Frac { num, den } => m("f")
            .with_child(container("num", num))
            .with_child(container("den", den)),
        MathExpr::Sqrt { index, radicand } => {
            let rad = match index {
                Some(index) => m("rad").with_child(container("deg", index)),
                None => m("rad")
                    .with_child(m("radPr").with_child(val("degHide", "1")))
                    .with_child(m("deg")),
            };
            rad.with_child(container("e", radicand))
        }
        MathExpr::Scripts { base, sub, sup } => match (sub, sup) {
            (Some(sub), Some(sup)) => m("sSubSup")
                .with_child(single("e", base))
                .with_child(container("sub", sub))
                .with_child(container("sup", sup)),
            (Some(sub), None) => m("sSub")
                .with_child(single("e", base))
                .with_child(container("sub", sub)),
            (None, Some(sup)) => m("sSup")
                .with_child(single("e", base))
                .with_child(container("sup", sup)),
            (None, None) => single("e", base),
        },
        MathExpr::BigOp {
            op,
            integral,
            sub,
            sup,
            body,
        } => {
            let mut props = m("naryPr")
                .with_child(val("chr", op))
                .with_child(val("limLoc", if *integral { "subSup" } else { "undOvr" }));
            if sub.is_none() {
                props = props.with_child(val("subHide", "1"));
            }
            if sup.is_none() {
                props = props.with_child(val("supHide", "1"));
            }
            m("nary")
                .with_child(props)
                .with_child(container("sub", sub.as_deref().unwrap_or_default()))
                .with_child(container("sup", sup.as_deref().unwrap_or_default()))
                .with_child(container("e", body))
        }
        MathExpr::Fenced { open, close, body } => m("d")
            .with_child(
                m("dPr")
                    .with_child(val("begChr", open))
                    .with_child(val("endChr", close)),
            )
            .with_child(container("e", body)),
    }
}

/// Inline formula (`m:oMath`)
pub fn omath(exprs: &[MathExpr]) -> XmlElement {
    container("oMath", exprs)
}

/// Display formula (`m:oMathPara` around `m:oMath`)
pub fn omath_para(omath: XmlElement) -> XmlElement {
    m("oMathPara").with_child(omath)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::parse;
    use pretty_assertions::assert_eq;

    fn omml(src: &str) -> String {
        omath(&parse(src).unwrap()).to_xml().unwrap()
    }

    #[test]
    fn test_superscript() {
        assert_eq!(
            omml("x^2"),
            "<m:oMath><m:sSup><m:e><m:r><m:t>x</m:t></m:r></m:e><m:sup><m:r><m:t>2</m:t></m:r></m:sup></m:sSup></m:oMath>"
        );
    }

    #[test]
    fn test_fraction_groups_are_flattened() {
        assert_eq!(
            omml(r"\frac{a}{{b}}"),
            "<m:oMath><m:f><m:num><m:r><m:t>a</m:t></m:r></m:num><m:den><m:r><m:t>b</m:t></m:r></m:den></m:f></m:oMath>"
        );
    }

    #[test]
    fn test_nary_hides_missing_limits() {
        let xml = omml(r"\int_0 f");
        assert!(xml.contains(r#"<m:chr m:val="∫"/><m:limLoc m:val="subSup"/><m:supHide m:val="1"/>"#));
        assert!(xml.contains("<m:sup/>"));
        assert!(xml.contains("<m:e><m:r><m:t>f</m:t></m:r></m:e>"));
    }

    #[test]
    fn test_square_root_hides_degree() {
        let xml = omml(r"\sqrt{x}");
        assert!(xml.starts_with(r#"<m:oMath><m:rad><m:radPr><m:degHide m:val="1"/></m:radPr><m:deg/>"#));
    }

    #[test]
    fn test_text_runs() {
        let xml = omml(r"\text{ if } \mathrm{d}x");
        assert!(xml.contains(r#"<m:r><m:rPr><m:nor/></m:rPr><m:t xml:space="preserve"> if </m:t></m:r>"#));
        assert!(xml.contains(r#"<m:r><m:rPr><m:sty m:val="p"/></m:rPr><m:t>d</m:t></m:r>"#));
    }

    #[test]
    fn test_fence() {
        let xml = omml(r"\left\{ x \right.");
        assert!(xml.contains(r#"<m:dPr><m:begChr m:val="{"/><m:endChr m:val=""/></m:dPr>"#));
    }

    #[test]
    fn test_display_wrapper() {
        let xml = omath_para(omath(&parse("y").unwrap())).to_xml().unwrap();
        assert_eq!(xml, "<m:oMathPara><m:oMath><m:r><m:t>y</m:t></m:r></m:oMath></m:oMathPara>");
    }
}
