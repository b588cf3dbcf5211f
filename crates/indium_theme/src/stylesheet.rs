//! Minimal CSS stylesheet model
//!
//! Just enough structure to find at-rule directives in a host stylesheet and
//! to check that generated CSS is well formed. Every node records the byte
//! span it was parsed from, so callers can splice the original text without
//! reformatting anything around the edit.
//!
//! Selectors, at-rule parameters and declaration values are kept as raw
//! (trimmed) text. Quoted strings, comments, parentheses and brackets are
//! respected when looking for the `{`, `;` and `}` that end a prelude.

use std::fmt::{self, Write as _};
use std::ops::Range;

use nom::{
    bytes::complete::{tag, take_until, take_while1},
    character::complete::{char, multispace0},
    combinator::cut,
    error::{context, VerboseError, VerboseErrorKind},
    sequence::{delimited, preceded},
    IResult,
};
use thiserror::Error;

type ParseResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

/// A stylesheet that failed to parse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("CSS error: line {line}, column {column}: {message}")]
pub struct StylesheetError {
    /// Human-readable error message with context
    pub message: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Input near the failure
    pub fragment: String,
}

/// A parsed stylesheet node
#[derive(Debug, Clone, PartialEq)]
pub struct Node<'a> {
    pub kind: NodeKind<'a>,
    /// Byte range in the parsed source, including any terminating `;` or `}`
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind<'a> {
    /// `selector { ... }`
    Rule {
        selector: &'a str,
        children: Vec<Node<'a>>,
    },
    /// `@name params;` or `@name params { ... }`
    AtRule {
        name: &'a str,
        params: &'a str,
        block: Option<Vec<Node<'a>>>,
    },
    /// `property: value;`
    Declaration { property: &'a str, value: &'a str },
    /// `/* text */`
    Comment(&'a str),
}

impl<'a> Node<'a> {
    /// Nested nodes of a rule or block at-rule
    pub fn children(&self) -> &[Node<'a>] {
        match &self.kind {
            NodeKind::Rule { children, .. } => children,
            NodeKind::AtRule {
                block: Some(children),
                ..
            } => children,
            _ => &[],
        }
    }

    /// At-rule name, without the `@`
    pub fn at_rule_name(&self) -> Option<&'a str> {
        match self.kind {
            NodeKind::AtRule { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// A parsed stylesheet borrowing from its source text
#[derive(Debug, Clone, PartialEq)]
pub struct Stylesheet<'a> {
    source: &'a str,
    pub nodes: Vec<Node<'a>>,
}

impl<'a> Stylesheet<'a> {
    pub fn parse(source: &'a str) -> Result<Self, StylesheetError> {
        let parser = Parser { source };
        let result = match parser.items(source) {
            Ok(("", nodes)) => Ok(nodes),
            Ok((rest, _)) => fail(rest, "unexpected closing brace").map(|(_, nodes)| nodes),
            Err(err) => Err(err),
        };

        match result {
            Ok(nodes) => Ok(Self { source, nodes }),
            Err(nom::Err::Error(err)) | Err(nom::Err::Failure(err)) => {
                Err(parser.error(&err))
            }
            Err(nom::Err::Incomplete(_)) => Err(StylesheetError {
                message: "unexpected end of input".to_string(),
                line: source.lines().count().max(1),
                column: 1,
                fragment: String::new(),
            }),
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Every at-rule called `name`, at any depth, in source order
    ///
    /// Matches are not searched further, so the returned spans never overlap.
    pub fn find_at_rules(&self, name: &str) -> Vec<&Node<'a>> {
        fn walk<'n, 'a>(nodes: &'n [Node<'a>], name: &str, found: &mut Vec<&'n Node<'a>>) {
            for node in nodes {
                if node.at_rule_name() == Some(name) {
                    found.push(node);
                } else {
                    walk(node.children(), name, found);
                }
            }
        }

        let mut found = Vec::new();
        walk(&self.nodes, name, &mut found);
        found
    }

    /// Serialize the node tree with two-space indentation
    pub fn to_css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Stylesheet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                out.push_str("\n\n");
            }
            write_node(&mut out, node, 0)?;
        }
        f.write_str(&out)
    }
}

fn write_block(out: &mut String, children: &[Node<'_>], depth: usize) -> fmt::Result {
    out.push_str(" {");
    for child in children {
        out.push('\n');
        write_node(out, child, depth + 1)?;
    }
    out.push('\n');
    out.push_str(&"  ".repeat(depth));
    out.push('}');
    Ok(())
}

fn write_node(out: &mut String, node: &Node<'_>, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    match &node.kind {
        NodeKind::Rule { selector, children } => {
            write!(out, "{indent}{selector}")?;
            write_block(out, children, depth)
        }
        NodeKind::AtRule {
            name,
            params,
            block,
        } => {
            write!(out, "{indent}@{name}")?;
            if !params.is_empty() {
                write!(out, " {params}")?;
            }
            match block {
                Some(children) => write_block(out, children, depth),
                None => {
                    out.push(';');
                    Ok(())
                }
            }
        }
        NodeKind::Declaration { property, value } => {
            write!(out, "{indent}{property}: {value};")
        }
        NodeKind::Comment(text) => write!(out, "{indent}/*{text}*/"),
    }
}

fn fail<'a, O>(input: &'a str, message: &'static str) -> ParseResult<'a, O> {
    Err(nom::Err::Failure(VerboseError {
        errors: vec![(input, VerboseErrorKind::Context(message))],
    }))
}

/// Parse an identifier (alphanumeric, hyphen, underscore)
fn identifier(input: &str) -> ParseResult<&str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '-' || c == '_')(input)
}

/// Parse a block comment, returning the text between the delimiters
fn comment(input: &str) -> ParseResult<&str> {
    context(
        "comment",
        delimited(tag("/*"), cut(take_until("*/")), tag("*/")),
    )(input)
}

/// Call `visit(offset, char, depth)` for every character outside quoted
/// strings and comments until it returns `false`
///
/// `depth` counts open parentheses and brackets.
fn scan(
    input: &str,
    mut visit: impl FnMut(usize, char, usize) -> bool,
) -> Result<(), &'static str> {
    let mut depth = 0usize;
    let mut quote = None;
    let mut escaped = false;
    let mut chars = input.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        if c == '/' && input[i..].starts_with("/*") {
            let Some(end) = input[i + 2..].find("*/") else {
                return Err("unterminated comment");
            };
            let resume = i + 2 + end + 2;
            while chars.next_if(|&(j, _)| j < resume).is_some() {}
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if !visit(i, c, depth) {
            return Ok(());
        }
    }

    match quote {
        Some(_) => Err("unterminated string"),
        None => Ok(()),
    }
}

/// Everything up to the next top-level `{`, `;` or `}` (or end of input)
///
/// Quoted strings, comments and bracketed groups are skipped.
fn prelude(input: &str) -> ParseResult<&str> {
    let mut end = None;
    let scanned = scan(input, |i, c, depth| {
        if depth == 0 && matches!(c, '{' | '}' | ';') {
            end = Some(i);
            return false;
        }
        true
    });

    match (end, scanned) {
        (Some(i), _) => Ok((&input[i..], &input[..i])),
        (None, Ok(())) => Ok(("", input)),
        (None, Err(message)) => fail(input, message),
    }
}

/// Split `property: value` at the first colon outside comments and strings
fn split_declaration(head: &str) -> Option<(&str, &str)> {
    let mut colon = None;
    let _ = scan(head, |i, c, _| {
        if c == ':' {
            colon = Some(i);
            return false;
        }
        true
    });
    colon.map(|i| (&head[..i], &head[i + 1..]))
}

struct Parser<'a> {
    source: &'a str,
}

impl<'a> Parser<'a> {
    fn offset(&self, rest: &str) -> usize {
        self.source.len() - rest.len()
    }

    /// Nodes until a closing brace or end of input (neither consumed)
    fn items(&self, mut input: &'a str) -> ParseResult<'a, Vec<Node<'a>>> {
        let mut nodes = Vec::new();
        loop {
            let (rest, _) = multispace0::<_, VerboseError<&str>>(input)?;
            input = rest;
            if input.is_empty() || input.starts_with('}') {
                return Ok((input, nodes));
            }
            if let Some(rest) = input.strip_prefix(';') {
                input = rest;
                continue;
            }
            let (rest, node) = self.item(input)?;
            nodes.push(node);
            input = rest;
        }
    }

    fn item(&self, input: &'a str) -> ParseResult<'a, Node<'a>> {
        let start = self.offset(input);

        if input.starts_with("/*") {
            let (rest, text) = comment(input)?;
            return Ok((rest, self.node(NodeKind::Comment(text), start, rest)));
        }

        if input.starts_with('@') {
            return self.at_rule(input, start);
        }

        let (rest, head) = prelude(input)?;
        if rest.starts_with('{') {
            let selector = head.trim();
            if selector.is_empty() {
                return fail(input, "expected selector");
            }
            let (rest, children) = self.block(rest)?;
            let kind = NodeKind::Rule { selector, children };
            return Ok((rest, self.node(kind, start, rest)));
        }

        let Some((property, value)) = split_declaration(head) else {
            return fail(input, "expected declaration");
        };
        let property = property.trim();
        if property.is_empty() {
            return fail(input, "expected property name");
        }
        let rest = rest.strip_prefix(';').unwrap_or(rest);
        let kind = NodeKind::Declaration {
            property,
            value: value.trim(),
        };
        Ok((rest, self.node(kind, start, rest)))
    }

    fn at_rule(&self, input: &'a str, start: usize) -> ParseResult<'a, Node<'a>> {
        let (rest, name) = context("at-rule name", preceded(char('@'), cut(identifier)))(input)?;
        let (rest, params) = prelude(rest)?;
        let params = params.trim();

        let (rest, block) = if rest.starts_with('{') {
            let (rest, children) = self.block(rest)?;
            (rest, Some(children))
        } else {
            (rest.strip_prefix(';').unwrap_or(rest), None)
        };

        let kind = NodeKind::AtRule {
            name,
            params,
            block,
        };
        Ok((rest, self.node(kind, start, rest)))
    }

    fn block(&self, input: &'a str) -> ParseResult<'a, Vec<Node<'a>>> {
        let (input, _) = context("opening brace", char::<_, VerboseError<&str>>('{'))(input)?;
        let (input, children) = self.items(input)?;
        let (input, _) = context("closing brace", cut(char::<_, VerboseError<&str>>('}')))(input)?;
        Ok((input, children))
    }

    fn node(&self, kind: NodeKind<'a>, start: usize, rest: &str) -> Node<'a> {
        Node {
            kind,
            span: start..self.offset(rest),
        }
    }

    fn error(&self, err: &VerboseError<&str>) -> StylesheetError {
        let fragment = err.errors.first().map(|(input, _)| *input).unwrap_or("");
        let (line, column, preview) = calculate_position(self.source, fragment);
        StylesheetError {
            message: format_verbose_error(err),
            line,
            column,
            fragment: preview,
        }
    }
}

/// Calculate line and column from the original input and the error fragment
fn calculate_position(original: &str, fragment: &str) -> (usize, usize, String) {
    let offset = original.len().saturating_sub(fragment.len());
    let consumed = &original[..offset];

    let line = consumed.matches('\n').count() + 1;
    let column = consumed
        .rfind('\n')
        .map(|pos| offset - pos)
        .unwrap_or(offset + 1);

    let preview: String = fragment.chars().take(30).collect();
    (line, column, preview)
}

fn format_verbose_error(err: &VerboseError<&str>) -> String {
    let mut parts = Vec::new();

    for (input, kind) in &err.errors {
        match kind {
            VerboseErrorKind::Context(ctx) => parts.push(ctx.to_string()),
            VerboseErrorKind::Char(c) => {
                let preview: String = input.chars().take(20).collect();
                parts.push(format!("expected '{c}' near \"{preview}\""));
            }
            VerboseErrorKind::Nom(kind) => parts.push(format!("{kind:?}")),
        }
    }

    if parts.is_empty() {
        "unknown parse error".to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_rules_declarations_and_comments() {
        let css = "/* base */\n:root {\n  --a: 1px;\n  color: red\n}\n";
        let sheet = Stylesheet::parse(css).unwrap();

        assert_eq!(sheet.nodes.len(), 2);
        assert_eq!(sheet.nodes[0].kind, NodeKind::Comment(" base "));
        let NodeKind::Rule { selector, children } = &sheet.nodes[1].kind else {
            panic!("expected rule");
        };
        assert_eq!(*selector, ":root");
        assert_eq!(
            children[1].kind,
            NodeKind::Declaration {
                property: "color",
                value: "red"
            }
        );
        assert_eq!(&css[sheet.nodes[1].span.clone()], ":root {\n  --a: 1px;\n  color: red\n}");
    }

    #[test]
    fn finds_nested_directives_with_exact_spans() {
        let css = "@import \"x.css\";\n@layer base {\n  @indium-theme;\n}\n@indium-theme;";
        let sheet = Stylesheet::parse(css).unwrap();
        let found = sheet.find_at_rules("indium-theme");

        assert_eq!(found.len(), 2);
        for node in found {
            assert_eq!(&css[node.span.clone()], "@indium-theme;");
        }
        assert_eq!(sheet.nodes[0].at_rule_name(), Some("import"));
    }

    #[test]
    fn directive_without_semicolon_at_end_of_input() {
        let sheet = Stylesheet::parse("a { color: red; }\n@indium-theme").unwrap();
        let found = sheet.find_at_rules("indium-theme");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].span, 18..31);
    }

    #[test]
    fn preludes_respect_strings_and_parens() {
        let css = r#"a[title="{x}"] { content: "a;b}"; background: url(data:image/png;base64,AAA); }"#;
        let sheet = Stylesheet::parse(css).unwrap();
        let children = sheet.nodes[0].children();

        assert_eq!(children.len(), 2);
        assert_eq!(
            children[0].kind,
            NodeKind::Declaration {
                property: "content",
                value: r#""a;b}""#
            }
        );
    }

    #[test]
    fn comments_inside_preludes_are_skipped() {
        let css = "b /* it's {x} */ { color: red /* a;b} */; }\n@indium-theme;";
        let sheet = Stylesheet::parse(css).unwrap();

        let NodeKind::Rule { selector, children } = &sheet.nodes[0].kind else {
            panic!("expected rule");
        };
        assert_eq!(*selector, "b /* it's {x} */");
        assert_eq!(
            children[0].kind,
            NodeKind::Declaration {
                property: "color",
                value: "red /* a;b} */"
            }
        );
        assert_eq!(sheet.find_at_rules("indium-theme").len(), 1);
    }

    #[test]
    fn colon_inside_comment_does_not_split_declaration() {
        let sheet = Stylesheet::parse("a { margin /* x: y */ : 0 }").unwrap();
        assert_eq!(
            sheet.nodes[0].children()[0].kind,
            NodeKind::Declaration {
                property: "margin /* x: y */",
                value: "0"
            }
        );
    }

    #[test]
    fn comments_in_at_rule_params() {
        let css = "@media screen /* ; */ and (min-width: 1px) {\n  @indium-theme;\n}";
        let sheet = Stylesheet::parse(css).unwrap();
        let NodeKind::AtRule { params, .. } = &sheet.nodes[0].kind else {
            panic!("expected at-rule");
        };
        assert_eq!(*params, "screen /* ; */ and (min-width: 1px)");
        assert_eq!(sheet.find_at_rules("indium-theme").len(), 1);
    }

    #[test]
    fn unterminated_comment_in_selector_is_an_error() {
        let err = Stylesheet::parse("a /* open { }").unwrap_err();
        assert!(err.message.contains("unterminated comment"), "{}", err.message);
    }

    #[test]
    fn generated_theme_css_serializes_unchanged() {
        let css = ":root {\n  --color-gray-50: #f9fafb;\n}\n\n:where(:root),\n[data-theme=\"light\"] {\n  color-scheme: light;\n  --color-text-primary: #111827;\n}\n\n@media (prefers-color-scheme: dark) {\n  :root:not([data-theme=\"light\"]) {\n    color-scheme: dark;\n    --color-text-primary: #f9fafb;\n  }\n}";
        let sheet = Stylesheet::parse(css).unwrap();
        assert_eq!(sheet.to_css(), css);
    }

    #[test]
    fn unclosed_block_reports_position() {
        let err = Stylesheet::parse("a {\n  color: red;\n").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("closing brace"), "{}", err.message);
    }

    #[test]
    fn stray_closing_brace_is_an_error() {
        let err = Stylesheet::parse("a { }\n}").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 1);
    }

    #[test]
    fn unterminated_comment_is_an_error() {
        assert!(Stylesheet::parse("/* open").is_err());
    }

    #[test]
    fn bare_words_are_not_declarations() {
        let err = Stylesheet::parse("a { color }").unwrap_err();
        assert!(err.message.contains("expected declaration"));
    }
}
