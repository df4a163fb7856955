//! XPath 1.0 subset for page-source snapshots
//!
//! Covers the shapes mobile locators actually use: `//Type`, `//*`,
//! `/a/b`, unions with `|`, relative paths (`.//x`, `./x`, `ancestor::x`,
//! `parent::x`, `..`) and predicates built from `contains()`,
//! `starts-with()`, `translate()`, `not()`, `text()`, `@attr`, `=`/`!=`,
//! `and`/`or` and 1-based positions.

use super::source::{PageSource, UiNode};

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    DoubleSlash,
    Slash,
    Pipe,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    At,
    Eq,
    Ne,
    AxisSep,
    Dot,
    DotDot,
    Star,
    Name(String),
    Str(String),
    Num(usize),
}

fn tokenize(input: &str) -> Result<Vec<Tok>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '/' if next == Some('/') => {
                out.push(Tok::DoubleSlash);
                i += 2;
            }
            '/' => {
                out.push(Tok::Slash);
                i += 1;
            }
            '|' => {
                out.push(Tok::Pipe);
                i += 1;
            }
            '[' => {
                out.push(Tok::LBracket);
                i += 1;
            }
            ']' => {
                out.push(Tok::RBracket);
                i += 1;
            }
            '(' => {
                out.push(Tok::LParen);
                i += 1;
            }
            ')' => {
                out.push(Tok::RParen);
                i += 1;
            }
            ',' => {
                out.push(Tok::Comma);
                i += 1;
            }
            '@' => {
                out.push(Tok::At);
                i += 1;
            }
            '=' => {
                out.push(Tok::Eq);
                i += 1;
            }
            '!' if next == Some('=') => {
                out.push(Tok::Ne);
                i += 2;
            }
            ':' if next == Some(':') => {
                out.push(Tok::AxisSep);
                i += 2;
            }
            '.' if next == Some('.') => {
                out.push(Tok::DotDot);
                i += 2;
            }
            '.' => {
                out.push(Tok::Dot);
                i += 1;
            }
            '*' => {
                out.push(Tok::Star);
                i += 1;
            }
            '\'' | '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == c)
                    .ok_or("unterminated string literal")?;
                out.push(Tok::Str(chars[i + 1..i + 1 + end].iter().collect()));
                i += end + 2;
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let digits: String = chars[start..i].iter().collect();
                out.push(Tok::Num(digits.parse().map_err(|_| "bad number")?));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric()
                        || chars[i] == '_'
                        || chars[i] == '-'
                        || chars[i] == '.')
                {
                    i += 1;
                }
                out.push(Tok::Name(chars[start..i].iter().collect()));
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }

    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Axis {
    Child,
    Descendant,
    Ancestor,
    AncestorOrSelf,
    Parent,
    SelfNode,
}

#[derive(Debug, Clone)]
enum Arg {
    Attr(String),
    Text,
    Literal(String),
    Translate(Box<Arg>, String, String),
}

#[derive(Debug, Clone)]
enum Pred {
    Or(Box<Pred>, Box<Pred>),
    And(Box<Pred>, Box<Pred>),
    Not(Box<Pred>),
    Contains(Arg, Arg),
    StartsWith(Arg, Arg),
    Eq(Arg, Arg),
    Ne(Arg, Arg),
    Exists(Arg),
    Position(usize),
}

#[derive(Debug, Clone)]
struct Step {
    /// Reached through `//`: the axis applies to every descendant-or-self of the context
    expand: bool,
    axis: Axis,
    /// None matches any element (`*`)
    name: Option<String>,
    predicates: Vec<Pred>,
}

#[derive(Debug, Clone)]
struct PathExpr {
    absolute: bool,
    steps: Vec<Step>,
}

/// A parsed XPath expression (union of location paths)
#[derive(Debug, Clone)]
pub struct XPath {
    paths: Vec<PathExpr>,
}

struct Parser {
    toks: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Tok> {
        self.toks.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Tok> {
        let t = self.toks.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn expect(&mut self, tok: Tok) -> Result<(), String> {
        match self.next() {
            Some(t) if t == tok => Ok(()),
            other => Err(format!("expected {:?}, found {:?}", tok, other)),
        }
    }

    fn parse_union(&mut self) -> Result<Vec<PathExpr>, String> {
        let mut paths = vec![self.parse_path()?];
        while self.peek() == Some(&Tok::Pipe) {
            self.next();
            paths.push(self.parse_path()?);
        }
        Ok(paths)
    }

    fn parse_path(&mut self) -> Result<PathExpr, String> {
        let mut steps = Vec::new();
        let (absolute, mut axis) = match self.peek() {
            Some(Tok::DoubleSlash) => {
                self.next();
                (true, Axis::Descendant)
            }
            Some(Tok::Slash) => {
                self.next();
                (true, Axis::Child)
            }
            _ => (false, Axis::Child),
        };

        loop {
            steps.push(self.parse_step(axis)?);
            match self.peek() {
                Some(Tok::DoubleSlash) => {
                    self.next();
                    axis = Axis::Descendant;
                }
                Some(Tok::Slash) => {
                    self.next();
                    axis = Axis::Child;
                }
                _ => break,
            }
        }

        Ok(PathExpr { absolute, steps })
    }

    fn parse_step(&mut self, default_axis: Axis) -> Result<Step, String> {
        let expand = default_axis == Axis::Descendant;
        match self.peek() {
            Some(Tok::Dot) => {
                self.next();
                return Ok(Step {
                    expand,
                    axis: Axis::SelfNode,
                    name: None,
                    predicates: Vec::new(),
                });
            }
            Some(Tok::DotDot) => {
                self.next();
                return Ok(Step {
                    expand,
                    axis: Axis::Parent,
                    name: None,
                    predicates: Vec::new(),
                });
            }
            _ => {}
        }

        let mut axis = Axis::Child;
        if let (Some(Tok::Name(name)), Some(Tok::AxisSep)) = (self.peek(), self.peek_at(1)) {
            axis = match name.as_str() {
                "child" => Axis::Child,
                "descendant" => Axis::Descendant,
                "ancestor" => Axis::Ancestor,
                "ancestor-or-self" => Axis::AncestorOrSelf,
                "parent" => Axis::Parent,
                "self" => Axis::SelfNode,
                other => return Err(format!("unsupported axis '{}'", other)),
            };
            self.next();
            self.next();
        }

        let name = match self.next() {
            Some(Tok::Star) => None,
            Some(Tok::Name(n)) => Some(n),
            other => return Err(format!("expected node test, found {:?}", other)),
        };

        let mut predicates = Vec::new();
        while self.peek() == Some(&Tok::LBracket) {
            self.next();
            predicates.push(self.parse_or()?);
            self.expect(Tok::RBracket)?;
        }

        Ok(Step {
            expand,
            axis,
            name,
            predicates,
        })
    }

    fn peek_word(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Tok::Name(n)) if n == word)
    }

    fn parse_or(&mut self) -> Result<Pred, String> {
        let mut left = self.parse_and()?;
        while self.peek_word("or") {
            self.next();
            let right = self.parse_and()?;
            left = Pred::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Pred, String> {
        let mut left = self.parse_unary()?;
        while self.peek_word("and") {
            self.next();
            let right = self.parse_unary()?;
            left = Pred::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Pred, String> {
        match self.peek().cloned() {
            Some(Tok::LParen) => {
                self.next();
                let inner = self.parse_or()?;
                self.expect(Tok::RParen)?;
                Ok(inner)
            }
            Some(Tok::Num(n)) => {
                self.next();
                Ok(Pred::Position(n))
            }
            Some(Tok::Name(n)) if self.peek_at(1) == Some(&Tok::LParen) => match n.as_str() {
                "not" => {
                    self.next();
                    self.next();
                    let inner = self.parse_or()?;
                    self.expect(Tok::RParen)?;
                    Ok(Pred::Not(Box::new(inner)))
                }
                "contains" | "starts-with" => {
                    self.next();
                    self.next();
                    let haystack = self.parse_arg()?;
                    self.expect(Tok::Comma)?;
                    let needle = self.parse_arg()?;
                    self.expect(Tok::RParen)?;
                    Ok(if n == "contains" {
                        Pred::Contains(haystack, needle)
                    } else {
                        Pred::StartsWith(haystack, needle)
                    })
                }
                _ => self.parse_comparison(),
            },
            _ => self.parse_comparison(),
        }
    }

    fn parse_comparison(&mut self) -> Result<Pred, String> {
        let left = self.parse_arg()?;
        match self.peek() {
            Some(Tok::Eq) => {
                self.next();
                Ok(Pred::Eq(left, self.parse_arg()?))
            }
            Some(Tok::Ne) => {
                self.next();
                Ok(Pred::Ne(left, self.parse_arg()?))
            }
            _ => Ok(Pred::Exists(left)),
        }
    }

    fn parse_arg(&mut self) -> Result<Arg, String> {
        match self.next() {
            Some(Tok::At) => match self.next() {
                Some(Tok::Name(n)) => Ok(Arg::Attr(n)),
                other => Err(format!("expected attribute name, found {:?}", other)),
            },
            Some(Tok::Str(s)) => Ok(Arg::Literal(s)),
            Some(Tok::Num(n)) => Ok(Arg::Literal(n.to_string())),
            Some(Tok::Dot) => Ok(Arg::Text),
            Some(Tok::Name(n)) if n == "text" => {
                self.expect(Tok::LParen)?;
                self.expect(Tok::RParen)?;
                Ok(Arg::Text)
            }
            Some(Tok::Name(n)) if n == "translate" => {
                self.expect(Tok::LParen)?;
                let inner = self.parse_arg()?;
                self.expect(Tok::Comma)?;
                let from = match self.next() {
                    Some(Tok::Str(s)) => s,
                    other => return Err(format!("translate() expects literals, found {:?}", other)),
                };
                self.expect(Tok::Comma)?;
                let to = match self.next() {
                    Some(Tok::Str(s)) => s,
                    other => return Err(format!("translate() expects literals, found {:?}", other)),
                };
                self.expect(Tok::RParen)?;
                Ok(Arg::Translate(Box::new(inner), from, to))
            }
            other => Err(format!("unsupported expression {:?}", other)),
        }
    }
}

fn translate(s: &str, from: &str, to: &str) -> String {
    let from: Vec<char> = from.chars().collect();
    let to: Vec<char> = to.chars().collect();
    s.chars()
        .filter_map(|c| match from.iter().position(|&f| f == c) {
            Some(k) => to.get(k).copied(),
            None => Some(c),
        })
        .collect()
}

fn eval_arg(arg: &Arg, node: &UiNode) -> Option<String> {
    match arg {
        Arg::Attr(name) => node.lookup(name).map(str::to_string),
        Arg::Text => node.text().map(str::to_string),
        Arg::Literal(s) => Some(s.clone()),
        Arg::Translate(inner, from, to) => eval_arg(inner, node).map(|s| translate(&s, from, to)),
    }
}

fn eval_pred(pred: &Pred, node: &UiNode, position: usize) -> bool {
    match pred {
        Pred::Or(a, b) => eval_pred(a, node, position) || eval_pred(b, node, position),
        Pred::And(a, b) => eval_pred(a, node, position) && eval_pred(b, node, position),
        Pred::Not(a) => !eval_pred(a, node, position),
        Pred::Contains(h, n) => match (eval_arg(h, node), eval_arg(n, node)) {
            (Some(h), Some(n)) => h.contains(&n),
            (None, Some(n)) => n.is_empty(),
            _ => false,
        },
        Pred::StartsWith(h, n) => match (eval_arg(h, node), eval_arg(n, node)) {
            (Some(h), Some(n)) => h.starts_with(&n),
            (None, Some(n)) => n.is_empty(),
            _ => false,
        },
        Pred::Eq(a, b) => match (eval_arg(a, node), eval_arg(b, node)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        Pred::Ne(a, b) => match (eval_arg(a, node), eval_arg(b, node)) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        },
        Pred::Exists(a) => eval_arg(a, node).is_some(),
        Pred::Position(p) => *p == position,
    }
}

fn name_matches(node: &UiNode, name: &Option<String>) -> bool {
    match name {
        None => true,
        Some(n) => node.tag == *n || node.element_type() == n,
    }
}

/// Nodes reachable from `ctx` along `axis`; positional order (nearest first for reverse axes)
fn axis_nodes(src: &PageSource, ctx: Option<usize>, axis: Axis) -> Vec<Option<usize>> {
    match (axis, ctx) {
        (Axis::SelfNode, c) => vec![c],
        (Axis::Child, None) => src
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(i, _)| Some(i))
            .collect(),
        (Axis::Child, Some(i)) => src.nodes[i].children.iter().map(|&c| Some(c)).collect(),
        (Axis::Descendant, None) => (0..src.len()).map(Some).collect(),
        (Axis::Descendant, Some(i)) => src.descendants(i).into_iter().map(Some).collect(),
        (Axis::Ancestor, Some(i)) => src.ancestors(i).into_iter().map(Some).collect(),
        (Axis::AncestorOrSelf, Some(i)) => std::iter::once(i)
            .chain(src.ancestors(i))
            .map(Some)
            .collect(),
        (Axis::Parent, Some(i)) => src.nodes[i].parent.map(Some).into_iter().collect(),
        (Axis::Ancestor | Axis::AncestorOrSelf | Axis::Parent, None) => Vec::new(),
    }
}

fn descendant_or_self(src: &PageSource, ctx: Option<usize>) -> Vec<Option<usize>> {
    let mut nodes = vec![ctx];
    nodes.extend(axis_nodes(src, ctx, Axis::Descendant));
    nodes
}

impl XPath {
    pub fn parse(input: &str) -> Result<Self, String> {
        let toks = tokenize(input)?;
        if toks.is_empty() {
            return Err("empty xpath".into());
        }
        let mut parser = Parser { toks, pos: 0 };
        let paths = parser.parse_union()?;
        if parser.pos < parser.toks.len() {
            return Err(format!("unexpected token {:?}", parser.toks[parser.pos]));
        }
        Ok(Self { paths })
    }

    /// Evaluate from the document root
    pub fn select(&self, src: &PageSource) -> Vec<usize> {
        self.select_from(src, None)
    }

    /// Evaluate with `context` as the context node; absolute paths ignore it
    pub fn select_from(&self, src: &PageSource, context: Option<usize>) -> Vec<usize> {
        let mut result: Vec<usize> = Vec::new();

        for path in &self.paths {
            let mut contexts: Vec<Option<usize>> = if path.absolute {
                vec![None]
            } else {
                vec![context]
            };

            for step in &path.steps {
                let mut next: Vec<Option<usize>> = Vec::new();
                let origins: Vec<Option<usize>> = if step.expand {
                    let mut origins = Vec::new();
                    let mut seen = vec![false; src.len() + 1];
                    for ctx in &contexts {
                        for o in descendant_or_self(src, *ctx) {
                            let slot = o.map_or(0, |i| i + 1);
                            if !seen[slot] {
                                seen[slot] = true;
                                origins.push(o);
                            }
                        }
                    }
                    origins
                } else {
                    contexts.clone()
                };

                // positions count per origin, so `//X[1]` is the first X child of each parent
                for ctx in &origins {
                    let mut candidates: Vec<Option<usize>> = axis_nodes(src, *ctx, step.axis)
                        .into_iter()
                        .filter(|c| match c {
                            Some(i) => name_matches(&src.nodes[*i], &step.name),
                            None => step.name.is_none(),
                        })
                        .collect();

                    for pred in &step.predicates {
                        candidates = candidates
                            .into_iter()
                            .enumerate()
                            .filter(|(pos, c)| match c {
                                Some(i) => eval_pred(pred, &src.nodes[*i], pos + 1),
                                None => false,
                            })
                            .map(|(_, c)| c)
                            .collect();
                    }

                    for c in candidates {
                        if !next.contains(&c) {
                            next.push(c);
                        }
                    }
                }
                contexts = next;
            }

            for c in contexts.into_iter().flatten() {
                if !result.contains(&c) {
                    result.push(c);
                }
            }
        }

        result.sort_unstable();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<AppiumAUT>
  <XCUIElementTypeApplication name="Swag Labs">
    <XCUIElementTypeOther name="test-Item">
      <XCUIElementTypeOther name="test-Item inner">
        <XCUIElementTypeStaticText name="test-Item title" label="Sauce Labs Backpack"/>
        <XCUIElementTypeButton name="test-ADD TO CART" label="ADD TO CART"/>
      </XCUIElementTypeOther>
    </XCUIElementTypeOther>
    <XCUIElementTypeTextField name="test-Username" label="Username"/>
    <XCUIElementTypeStaticText label="Epic sadface: Username and password do not match"/>
  </XCUIElementTypeApplication>
</AppiumAUT>"#;

    const LOWER: &str = "translate(@label,'ABCDEFGHIJKLMNOPQRSTUVWXYZ','abcdefghijklmnopqrstuvwxyz')";

    fn src() -> PageSource {
        PageSource::parse(XML).unwrap()
    }

    #[test]
    fn test_descendant_type() {
        let src = src();
        let hits = XPath::parse("//XCUIElementTypeStaticText").unwrap().select(&src);
        assert_eq!(hits, vec![4, 7]);
    }

    #[test]
    fn test_union_keeps_document_order() {
        let src = src();
        let hits = XPath::parse("//XCUIElementTypeTextField | //XCUIElementTypeStaticText")
            .unwrap()
            .select(&src);
        assert_eq!(hits, vec![4, 6, 7]);
    }

    #[test]
    fn test_translate_contains() {
        let src = src();
        let expr = format!("//*[contains({}, 'epic sadface')]", LOWER);
        let hits = XPath::parse(&expr).unwrap().select(&src);
        assert_eq!(hits, vec![7]);

        let expr = format!(
            "//XCUIElementTypeButton[contains({lower},'add to cart') or contains(@name,'nope')]",
            lower = LOWER
        );
        assert_eq!(XPath::parse(&expr).unwrap().select(&src), vec![5]);
    }

    #[test]
    fn test_relative_axes() {
        let src = src();
        let ancestors = XPath::parse("ancestor::XCUIElementTypeOther")
            .unwrap()
            .select_from(&src, Some(5));
        assert_eq!(ancestors, vec![2, 3]);

        let nearest = XPath::parse("ancestor::XCUIElementTypeOther[1]")
            .unwrap()
            .select_from(&src, Some(5));
        assert_eq!(nearest, vec![3]);

        let inner = XPath::parse(".//XCUIElementTypeStaticText")
            .unwrap()
            .select_from(&src, Some(2));
        assert_eq!(inner, vec![4]);

        let parent = XPath::parse("..").unwrap().select_from(&src, Some(4));
        assert_eq!(parent, vec![3]);
    }

    #[test]
    fn test_position_after_double_slash_is_per_parent() {
        let xml = r#"<AppiumAUT>
  <XCUIElementTypeOther name="row-1">
    <XCUIElementTypeStaticText label="Backpack"/>
    <XCUIElementTypeStaticText label="$29.99"/>
  </XCUIElementTypeOther>
  <XCUIElementTypeOther name="row-2">
    <XCUIElementTypeStaticText label="Bike Light"/>
    <XCUIElementTypeStaticText label="$9.99"/>
  </XCUIElementTypeOther>
</AppiumAUT>"#;
        let src = PageSource::parse(xml).unwrap();
        assert_eq!(
            XPath::parse("//XCUIElementTypeStaticText[1]").unwrap().select(&src),
            vec![2, 5]
        );
        assert_eq!(
            XPath::parse("//XCUIElementTypeStaticText[2]").unwrap().select(&src),
            vec![3, 6]
        );
        assert_eq!(
            XPath::parse("//descendant::XCUIElementTypeStaticText").unwrap().select(&src),
            vec![2, 3, 5, 6]
        );
    }

    #[test]
    fn test_attribute_equality_and_text() {
        let src = src();
        let hits = XPath::parse("//*[@name='test-Username']").unwrap().select(&src);
        assert_eq!(hits, vec![6]);
        // no `text` attribute on iOS nodes
        let hits = XPath::parse("//*[contains(text(),'$')]").unwrap().select(&src);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_translate_function() {
        assert_eq!(translate("LOGIN", "ABCDEFGHIJKLMNOPQRSTUVWXYZ", "abcdefghijklmnopqrstuvwxyz"), "login");
        assert_eq!(translate("a-b", "-", ""), "ab");
    }

    #[test]
    fn test_parse_errors() {
        assert!(XPath::parse("//*[contains(@label,'x']").is_err());
        assert!(XPath::parse("").is_err());
        assert!(XPath::parse("//foo::bar").is_err());
    }
}
