//! NSPredicate subset used by `-ios predicate string` locators
//!
//! Supported: `attr OP value` comparisons (`==`, `=`, `!=`, `<>`, `CONTAINS`,
//! `BEGINSWITH`, `ENDSWITH`, `LIKE`, `MATCHES`) with `[c]`/`[d]`/`[cd]`
//! modifiers, `AND`/`OR`/`NOT` (any case, or `&&`/`||`/`!`) and parentheses.

use super::source::UiNode;
use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Op(String),
    Modifier(String),
    LParen,
    RParen,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CmpOp {
    Eq,
    Ne,
    Contains,
    BeginsWith,
    EndsWith,
    Like,
    Matches,
}

#[derive(Debug, Clone)]
enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Cmp {
        key: String,
        op: CmpOp,
        case_insensitive: bool,
        value: String,
        regex: Option<Regex>,
    },
}

/// A parsed predicate
#[derive(Debug, Clone)]
pub struct Predicate {
    expr: Expr,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                let end = chars[i..]
                    .iter()
                    .position(|&ch| ch == ']')
                    .ok_or("unterminated modifier")?;
                let modifier: String = chars[i + 1..i + end].iter().collect();
                tokens.push(Token::Modifier(modifier.to_lowercase()));
                i += end + 1;
            }
            '\'' | '"' => {
                let quote = c;
                let mut s = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err("unterminated string literal".into()),
                        Some('\\') => {
                            if let Some(&next) = chars.get(i + 1) {
                                s.push(next);
                            }
                            i += 2;
                        }
                        Some(&ch) if ch == quote => {
                            i += 1;
                            break;
                        }
                        Some(&ch) => {
                            s.push(ch);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(s));
            }
            '=' | '!' | '<' | '>' | '&' | '|' => {
                let two: String = chars[i..(i + 2).min(chars.len())].iter().collect();
                let op = match two.as_str() {
                    "==" | "!=" | "<>" | "&&" | "||" => two,
                    _ => c.to_string(),
                };
                i += op.len();
                tokens.push(Token::Op(op));
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' || c == '-' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric()
                        || chars[i] == '_'
                        || chars[i] == '.'
                        || chars[i] == '-')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn peek_keyword(&self, words: &[&str]) -> bool {
        match self.peek() {
            Some(Token::Ident(w)) => words.iter().any(|k| w.eq_ignore_ascii_case(k)),
            Some(Token::Op(op)) => words.contains(&op.as_str()),
            _ => false,
        }
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_and()?;
        while self.peek_keyword(&["OR", "||"]) {
            self.next();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_not()?;
        while self.peek_keyword(&["AND", "&&"]) {
            self.next();
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, String> {
        if self.peek_keyword(&["NOT", "!"]) {
            self.next();
            let inner = self.parse_not()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.next() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err("expected ')'".into()),
                }
            }
            Some(Token::Ident(key)) => self.parse_comparison(key),
            other => Err(format!("expected attribute name, found {:?}", other)),
        }
    }

    fn parse_comparison(&mut self, key: String) -> Result<Expr, String> {
        let op = match self.next() {
            Some(Token::Op(op)) => match op.as_str() {
                "==" | "=" => CmpOp::Eq,
                "!=" | "<>" => CmpOp::Ne,
                other => return Err(format!("unsupported operator '{}'", other)),
            },
            Some(Token::Ident(word)) => match word.to_uppercase().as_str() {
                "CONTAINS" => CmpOp::Contains,
                "BEGINSWITH" => CmpOp::BeginsWith,
                "ENDSWITH" => CmpOp::EndsWith,
                "LIKE" => CmpOp::Like,
                "MATCHES" => CmpOp::Matches,
                other => return Err(format!("unsupported operator '{}'", other)),
            },
            other => return Err(format!("expected operator after '{}', found {:?}", key, other)),
        };

        let mut case_insensitive = false;
        if let Some(Token::Modifier(m)) = self.peek() {
            case_insensitive = m.contains('c');
            self.next();
        }

        let value = match self.next() {
            Some(Token::Str(s)) | Some(Token::Ident(s)) => s,
            other => return Err(format!("expected value for '{}', found {:?}", key, other)),
        };

        let regex = match op {
            CmpOp::Matches => {
                let pattern = if case_insensitive {
                    format!("(?i)^(?:{})$", value)
                } else {
                    format!("^(?:{})$", value)
                };
                Some(Regex::new(&pattern).map_err(|e| e.to_string())?)
            }
            CmpOp::Like => {
                let mut pattern = String::from(if case_insensitive { "(?i)^" } else { "^" });
                for ch in value.chars() {
                    match ch {
                        '*' => pattern.push_str(".*"),
                        '?' => pattern.push('.'),
                        other => pattern.push_str(&regex::escape(&other.to_string())),
                    }
                }
                pattern.push('$');
                Some(Regex::new(&pattern).map_err(|e| e.to_string())?)
            }
            _ => None,
        };

        Ok(Expr::Cmp {
            key,
            op,
            case_insensitive,
            value,
            regex,
        })
    }
}

/// Attributes whose values compare as booleans (`visible == 1`)
const BOOLEAN_KEYS: [&str; 9] = [
    "enabled",
    "visible",
    "selected",
    "accessible",
    "focused",
    "hittable",
    "checked",
    "clickable",
    "displayed",
];

fn is_truthy(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn eval(expr: &Expr, node: &UiNode) -> bool {
    match expr {
        Expr::And(a, b) => eval(a, node) && eval(b, node),
        Expr::Or(a, b) => eval(a, node) || eval(b, node),
        Expr::Not(a) => !eval(a, node),
        Expr::Cmp {
            key,
            op,
            case_insensitive,
            value,
            regex,
        } => {
            let actual = match node.lookup(key) {
                Some(a) => a,
                None => return *op == CmpOp::Ne,
            };

            let (a, v) = if *case_insensitive {
                (actual.to_lowercase(), value.to_lowercase())
            } else {
                (actual.to_string(), value.clone())
            };

            match op {
                CmpOp::Eq => {
                    a == v
                        || (BOOLEAN_KEYS.contains(&key.as_str())
                            && matches!((is_truthy(&a), is_truthy(&v)), (Some(x), Some(y)) if x == y))
                }
                CmpOp::Ne => a != v,
                CmpOp::Contains => a.contains(&v),
                CmpOp::BeginsWith => a.starts_with(&v),
                CmpOp::EndsWith => a.ends_with(&v),
                CmpOp::Like | CmpOp::Matches => {
                    regex.as_ref().map(|r| r.is_match(actual)).unwrap_or(false)
                }
            }
        }
    }
}

impl Predicate {
    pub fn parse(input: &str) -> Result<Self, String> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err("empty predicate".into());
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_or()?;
        if parser.pos < parser.tokens.len() {
            return Err(format!("trailing input at token {}", parser.pos));
        }
        Ok(Self { expr })
    }

    pub fn matches(&self, node: &UiNode) -> bool {
        eval(&self.expr, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::source::PageSource;

    fn node(attrs: &str) -> UiNode {
        let xml = format!("<root><XCUIElementTypeButton {}/></root>", attrs);
        PageSource::parse(&xml).unwrap().nodes[1].clone()
    }

    #[test]
    fn test_equality_and_contains() {
        let n = node(r#"type="XCUIElementTypeButton" name="test-LOGIN" label="LOGIN""#);
        assert!(Predicate::parse(r#"label == "LOGIN""#).unwrap().matches(&n));
        assert!(Predicate::parse("label CONTAINS 'LOG'").unwrap().matches(&n));
        assert!(!Predicate::parse("label CONTAINS 'log'").unwrap().matches(&n));
        assert!(Predicate::parse("label CONTAINS[c] 'log'").unwrap().matches(&n));
        assert!(Predicate::parse("label BEGINSWITH 'LO' AND name ENDSWITH 'LOGIN'")
            .unwrap()
            .matches(&n));
    }

    #[test]
    fn test_boolean_composition_any_case() {
        let n = node(r#"type="XCUIElementTypeButton" label="Cart""#);
        let p = Predicate::parse(
            "type == 'XCUIElementTypeButton' and (label CONTAINS 'Sort' or label CONTAINS 'Cart')",
        )
        .unwrap();
        assert!(p.matches(&n));
        assert!(!Predicate::parse("NOT label == 'Cart'").unwrap().matches(&n));
    }

    #[test]
    fn test_missing_attribute_never_matches() {
        let n = node(r#"type="XCUIElementTypeButton""#);
        assert!(!Predicate::parse("value CONTAINS 'x'").unwrap().matches(&n));
        assert!(Predicate::parse("value != 'x'").unwrap().matches(&n));
    }

    #[test]
    fn test_like_and_boolean_literals() {
        let n = node(r#"type="XCUIElementTypeButton" label="$29.99" visible="true""#);
        assert!(Predicate::parse("label LIKE '$*.99'").unwrap().matches(&n));
        assert!(Predicate::parse("visible == 1").unwrap().matches(&n));
        assert!(Predicate::parse("visible == 'YES'").unwrap().matches(&n));
    }

    #[test]
    fn test_text_attributes_compare_as_strings() {
        let no = node(r#"type="XCUIElementTypeButton" label="false""#);
        assert!(!Predicate::parse("label == 'No'").unwrap().matches(&no));
        assert!(Predicate::parse("label == 'false'").unwrap().matches(&no));

        let one = node(r#"type="XCUIElementTypeButton" label="1""#);
        assert!(!Predicate::parse("label == 'yes'").unwrap().matches(&one));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Predicate::parse("label ==").is_err());
        assert!(Predicate::parse("label CONTAINS 'x").is_err());
        assert!(Predicate::parse("(label == 'x'").is_err());
        assert!(Predicate::parse("").is_err());
    }
}
