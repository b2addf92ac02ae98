//! LaTeX math parser
//!
//! Handles the subset used in prose documents: groups, `^` and `_`,
//! `\frac`, `\sqrt[n]{}`, `\left..\right`, big operators with limits, Greek
//! letters, common operator and relation symbols, `\text`, `\mathrm`, named
//! functions and spacing. Anything else is an error, and the caller falls
//! back to the source text.

use super::symbols;
use thiserror::Error;

/// Nesting beyond this is rejected
const MAX_DEPTH: usize = 64;

/// Reasons a formula cannot be converted
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("unsupported command \\{0}")]
    UnsupportedCommand(String),

    #[error("unsupported character '{0}'")]
    UnsupportedChar(char),

    #[error("unbalanced braces")]
    Unbalanced,

    #[error("missing argument for {0}")]
    MissingArgument(String),

    #[error("\\left without matching \\right")]
    UnclosedFence,

    #[error("unknown delimiter '{0}'")]
    UnknownDelimiter(String),

    #[error("double {0}")]
    DoubleScript(&'static str),

    #[error("formula nested too deeply")]
    TooDeep,
}

/// Parsed formula node
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MathExpr {
    /// Variable or letter-like symbol (italic)
    Ident(String),
    Number(String),
    Operator(String),
    /// Normal text (`\text`)
    Text(String),
    /// Text in a math style: "p" plain, "b" bold, "i" italic
    Styled { style: &'static str, text: String },
    Space(&'static str),
    Group(Vec<MathExpr>),
    Function {
        name: Box<MathExpr>,
        argument: Vec<MathExpr>,
    },
    /// Base with a limit typeset below (`\lim_{x\to 0}`)
    Limit {
        base: Box<MathExpr>,
        limit: Vec<MathExpr>,
    },
    Frac {
        num: Vec<MathExpr>,
        den: Vec<MathExpr>,
    },
    Sqrt {
        index: Option<Vec<MathExpr>>,
        radicand: Vec<MathExpr>,
    },
    Scripts {
        base: Box<MathExpr>,
        sub: Option<Vec<MathExpr>>,
        sup: Option<Vec<MathExpr>>,
    },
    BigOp {
        op: &'static str,
        integral: bool,
        sub: Option<Vec<MathExpr>>,
        sup: Option<Vec<MathExpr>>,
        body: Vec<MathExpr>,
    },
    Fenced {
        open: String,
        close: String,
        body: Vec<MathExpr>,
    },
}

/// Parse LaTeX math source
pub fn parse(src: &str) -> Result<Vec<MathExpr>, MathError> {
    let mut parser = Parser {
        chars: src.chars().collect(),
        pos: 0,
        depth: 0,
    };
    parser.sequence(Stop::End)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stop {
    End,
    Brace,
    Bracket,
    Right,
}

type Scripts = (Option<Vec<MathExpr>>, Option<Vec<MathExpr>>);

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, c: char) -> Result<(), MathError> {
        match self.bump() {
            Some(got) if got == c => Ok(()),
            _ => Err(MathError::Unbalanced),
        }
    }

    /// Name of the command at the cursor, without consuming it
    fn peek_command(&self) -> Option<String> {
        if self.peek() != Some('\\') {
            return None;
        }
        let name: String = self.chars[self.pos + 1..]
            .iter()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        Some(name)
    }

    fn at_stop(&self, stop: Stop) -> bool {
        match (stop, self.peek()) {
            (_, None) => true,
            (Stop::Brace, Some('}')) | (Stop::Bracket, Some(']')) => true,
            (Stop::Right, Some('\\')) => self.peek_command().as_deref() == Some("right"),
            _ => false,
        }
    }

    fn sequence(&mut self, stop: Stop) -> Result<Vec<MathExpr>, MathError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(MathError::TooDeep);
        }

        let mut out = Vec::new();
        while let Some(expr) = self.scripted(stop)? {
            out.push(expr);
        }

        self.depth -= 1;
        Ok(out)
    }

    /// An atom with its sub- and superscripts
    fn scripted(&mut self, stop: Stop) -> Result<Option<MathExpr>, MathError> {
        let Some(atom) = self.atom(stop)? else {
            return Ok(None);
        };
        let (sub, sup) = self.scripts()?;

        let expr = match atom {
            MathExpr::BigOp { op, integral, .. } => {
                let body = self.scripted(stop)?.into_iter().collect();
                MathExpr::BigOp {
                    op,
                    integral,
                    sub,
                    sup,
                    body,
                }
            }
            MathExpr::Function { name, .. } => {
                let limits = matches!(
                    name.as_ref(),
                    MathExpr::Styled { text, .. } if symbols::takes_limits(text)
                );
                let name = match (sub, sup) {
                    (Some(limit), None) if limits => MathExpr::Limit { base: name, limit },
                    (None, None) => *name,
                    (sub, sup) => MathExpr::Scripts { base: name, sub, sup },
                };
                let argument = self.scripted(stop)?.into_iter().collect();
                MathExpr::Function {
                    name: Box::new(name),
                    argument,
                }
            }
            atom if sub.is_some() || sup.is_some() => MathExpr::Scripts {
                base: Box::new(atom),
                sub,
                sup,
            },
            atom => atom,
        };

        Ok(Some(expr))
    }

    fn scripts(&mut self) -> Result<Scripts, MathError> {
        let mut sub = None;
        let mut sup = None;
        loop {
            self.skip_ws();
            match self.peek() {
                Some('_') => {
                    if sub.is_some() {
                        return Err(MathError::DoubleScript("subscript"));
                    }
                    self.pos += 1;
                    sub = Some(self.argument("_")?);
                }
                Some('^') => {
                    if sup.is_some() {
                        return Err(MathError::DoubleScript("superscript"));
                    }
                    self.pos += 1;
                    sup = Some(self.argument("^")?);
                }
                _ => return Ok((sub, sup)),
            }
        }
    }

    /// A braced group or a single token
    fn argument(&mut self, of: &str) -> Result<Vec<MathExpr>, MathError> {
        self.skip_ws();
        match self.peek() {
            Some('{') => {
                self.pos += 1;
                let inner = self.sequence(Stop::Brace)?;
                self.expect('}')?;
                Ok(inner)
            }
            Some(c) if c.is_ascii_digit() => {
                self.pos += 1;
                Ok(vec![MathExpr::Number(c.to_string())])
            }
            Some('}') | None => Err(MathError::MissingArgument(of.to_string())),
            Some(_) => match self.atom(Stop::End)? {
                Some(atom) => Ok(vec![atom]),
                None => Err(MathError::MissingArgument(of.to_string())),
            },
        }
    }

    /// Verbatim content of a braced group
    fn raw_group(&mut self, of: &str) -> Result<String, MathError> {
        self.skip_ws();
        if self.peek() != Some('{') {
            return Err(MathError::MissingArgument(format!("\\{}", of)));
        }
        self.pos += 1;

        let mut depth = 0;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('{') => {
                    depth += 1;
                    out.push('{');
                }
                Some('}') if depth == 0 => return Ok(out),
                Some('}') => {
                    depth -= 1;
                    out.push('}');
                }
                Some(c) => out.push(c),
                None => return Err(MathError::Unbalanced),
            }
        }
    }

    fn atom(&mut self, stop: Stop) -> Result<Option<MathExpr>, MathError> {
        self.skip_ws();
        if self.at_stop(stop) {
            return Ok(None);
        }
        let Some(c) = self.bump() else {
            return Ok(None);
        };

        let expr = match c {
            '{' => {
                let inner = self.sequence(Stop::Brace)?;
                self.expect('}')?;
                MathExpr::Group(inner)
            }
            '}' => return Err(MathError::Unbalanced),
            // Script without a base
            '^' | '_' => {
                self.pos -= 1;
                MathExpr::Group(Vec::new())
            }
            '\\' => self.command()?,
            c if c.is_ascii_digit() => {
                let mut number = c.to_string();
                while let Some(next) = self.peek() {
                    let decimal_point = next == '.'
                        && matches!(self.chars.get(self.pos + 1), Some(d) if d.is_ascii_digit());
                    if next.is_ascii_digit() || decimal_point {
                        number.push(next);
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                MathExpr::Number(number)
            }
            c if c.is_alphabetic() => MathExpr::Ident(c.to_string()),
            '\'' => MathExpr::Operator("′".into()),
            '-' => MathExpr::Operator("−".into()),
            '~' => MathExpr::Space("\u{00A0}"),
            '+' | '=' | '<' | '>' | '(' | ')' | '[' | ']' | ',' | ';' | ':' | '!' | '|' | '/'
            | '*' | '.' | '?' => MathExpr::Operator(c.to_string()),
            other => return Err(MathError::UnsupportedChar(other)),
        };

        Ok(Some(expr))
    }

    fn command(&mut self) -> Result<MathExpr, MathError> {
        let name = self.command_name()?;

        let expr = match name.as_str() {
            "frac" | "dfrac" | "tfrac" => MathExpr::Frac {
                num: self.argument("\\frac")?,
                den: self.argument("\\frac")?,
            },
            "sqrt" => {
                self.skip_ws();
                let index = if self.peek() == Some('[') {
                    self.pos += 1;
                    let index = self.sequence(Stop::Bracket)?;
                    self.expect(']')?;
                    Some(index)
                } else {
                    None
                };
                MathExpr::Sqrt {
                    index,
                    radicand: self.argument("\\sqrt")?,
                }
            }
            "left" => {
                let open = self.delimiter()?;
                let body = self.sequence(Stop::Right)?;
                if self.peek().is_none() {
                    return Err(MathError::UnclosedFence);
                }
                // Skip "\right"
                self.pos += 6;
                let close = self.delimiter()?;
                MathExpr::Fenced { open, close, body }
            }
            "text" | "textrm" | "textnormal" | "mbox" => MathExpr::Text(self.raw_group(&name)?),
            "mathrm" => MathExpr::Styled {
                style: "p",
                text: self.raw_group(&name)?,
            },
            "mathbf" | "textbf" => MathExpr::Styled {
                style: "b",
                text: self.raw_group(&name)?,
            },
            "mathit" | "textit" => MathExpr::Styled {
                style: "i",
                text: self.raw_group(&name)?,
            },
            "operatorname" => MathExpr::Function {
                name: Box::new(MathExpr::Styled {
                    style: "p",
                    text: self.raw_group(&name)?,
                }),
                argument: Vec::new(),
            },
            "{" | "}" | "%" | "$" | "&" | "#" | "_" => MathExpr::Operator(name.clone()),
            "|" => MathExpr::Operator("‖".into()),
            name => {
                if let Some(op) = symbols::big_operator(name) {
                    MathExpr::BigOp {
                        op,
                        integral: symbols::is_integral(name),
                        sub: None,
                        sup: None,
                        body: Vec::new(),
                    }
                } else if symbols::is_function(name) {
                    MathExpr::Function {
                        name: Box::new(MathExpr::Styled {
                            style: "p",
                            text: name.to_string(),
                        }),
                        argument: Vec::new(),
                    }
                } else if let Some(s) = symbols::space(name) {
                    MathExpr::Space(s)
                } else if let Some(s) = symbols::letter(name) {
                    MathExpr::Ident(s.to_string())
                } else if let Some(s) = symbols::operator(name) {
                    MathExpr::Operator(s.to_string())
                } else {
                    return Err(MathError::UnsupportedCommand(name.to_string()));
                }
            }
        };

        Ok(expr)
    }

    /// Command name after a backslash: a run of letters or one symbol
    fn command_name(&mut self) -> Result<String, MathError> {
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() => {
                let mut name = String::new();
                while let Some(c) = self.peek().filter(char::is_ascii_alphabetic) {
                    name.push(c);
                    self.pos += 1;
                }
                Ok(name)
            }
            Some(c) => {
                self.pos += 1;
                Ok(c.to_string())
            }
            None => Err(MathError::UnsupportedCommand(String::new())),
        }
    }

    fn delimiter(&mut self) -> Result<String, MathError> {
        self.skip_ws();
        match self.bump() {
            Some('.') => Ok(String::new()),
            Some('<') => Ok("⟨".into()),
            Some('>') => Ok("⟩".into()),
            Some(c @ ('(' | ')' | '[' | ']' | '|' | '/')) => Ok(c.to_string()),
            Some('\\') => {
                let name = self.command_name()?;
                symbols::delimiter(&name)
                    .map(str::to_string)
                    .ok_or(MathError::UnknownDelimiter(name))
            }
            Some(c) => Err(MathError::UnknownDelimiter(c.to_string())),
            None => Err(MathError::MissingArgument("\\left".into())),
        }
    }
}
