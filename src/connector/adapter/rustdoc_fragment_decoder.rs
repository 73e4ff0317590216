use std::path::{Component, Path};

use scraper::{ElementRef, Html, Node, Selector};

use crate::application::FragmentDecoder;
use crate::domain::{
    DomainError, Fragment, FragmentFormat, ImplementorDescriptor, ImplementorSet, InterfaceId,
    RawFragment,
};

const TABLE_DECLARATION: &str = "var implementors";
const ASSIGNMENT_PREFIX: &str = "implementors[";
const IMPLEMENTORS_DIR: &str = "implementors";
const FOR_KEYWORD: &str = " for ";

/// Decodes the `implementors/<crate>/<module>/trait.<Name>.js` files rustdoc
/// emits, where each crate contributes a list of pre-rendered `impl` lines:
///
/// ```text
/// implementors["juniper"] = ["impl <a class='trait' ...>Handler</a> for <a class='struct' ...>X</a>", ...];
/// ```
///
/// Each line is split into semantic fields (type path, link, type parameters,
/// where-clause); the markup itself is not kept.
pub struct RustdocFragmentDecoder;

impl RustdocFragmentDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustdocFragmentDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentDecoder for RustdocFragmentDecoder {
    fn format(&self) -> FragmentFormat {
        FragmentFormat::RustdocJs
    }

    fn decode(&self, raw: &RawFragment) -> Result<Fragment, DomainError> {
        let crate_lists = parse_crate_lists(raw.content())?;

        let interface = interface_from_path(Path::new(raw.origin()))
            .or_else(|| {
                crate_lists
                    .iter()
                    .flat_map(|(_, lines)| lines.iter())
                    .find_map(|line| anchor_title(line, "trait"))
                    .and_then(|title| InterfaceId::parse(&title).ok())
            })
            .ok_or_else(|| {
                DomainError::malformed(format!(
                    "cannot determine the interface of {}",
                    raw.origin()
                ))
            })?;

        let mut implementors = Vec::new();
        for (crate_name, lines) in &crate_lists {
            for line in lines {
                implementors.push(parse_impl_line(crate_name, line)?);
            }
        }

        Ok(Fragment::single(interface, ImplementorSet::new(implementors)))
    }
}

// ---------------------------------------------------------------------------
// JS table parsing
// ---------------------------------------------------------------------------

/// Extracts every `implementors["crate"] = [...]` assignment in file order.
fn parse_crate_lists(content: &str) -> Result<Vec<(String, Vec<String>)>, DomainError> {
    let mut lists = Vec::new();
    let mut rest = content;

    while let Some(pos) = rest.find(ASSIGNMENT_PREFIX) {
        let after = &rest[pos + ASSIGNMENT_PREFIX.len()..];
        let (crate_name, after) = parse_js_string(after)?;
        let after = expect_token(after, ']')?;
        let after = expect_token(after, '=')?;
        let after = expect_token(after, '[')?;
        let (lines, after) = parse_js_string_array(after)?;
        lists.push((crate_name, lines));
        rest = after;
    }

    if lists.is_empty() && !content.contains(TABLE_DECLARATION) {
        return Err(DomainError::malformed("no implementors table found"));
    }

    Ok(lists)
}

fn expect_token(input: &str, token: char) -> Result<&str, DomainError> {
    input
        .trim_start()
        .strip_prefix(token)
        .ok_or_else(|| DomainError::malformed(format!("expected '{}' in implementors table", token)))
}

/// Parses a quoted JS string literal at the start of `input` (after
/// whitespace). Returns the unescaped value and the remaining input.
fn parse_js_string(input: &str) -> Result<(String, &str), DomainError> {
    let input = input.trim_start();
    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, q @ ('"' | '\''))) => q,
        _ => return Err(DomainError::malformed("expected a string literal")),
    };

    let mut value = String::new();
    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, 'u')) => {
                    let hex: String = (0..4).filter_map(|_| chars.next().map(|(_, h)| h)).collect();
                    let decoded = u32::from_str_radix(&hex, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| DomainError::malformed("invalid \\u escape"))?;
                    value.push(decoded);
                }
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            c if c == quote => return Ok((value, &input[idx + c.len_utf8()..])),
            c => value.push(c),
        }
    }

    Err(DomainError::malformed("unterminated string literal"))
}

/// Parses string elements up to and including the closing `]`. A trailing
/// comma is allowed.
fn parse_js_string_array(mut input: &str) -> Result<(Vec<String>, &str), DomainError> {
    let mut values = Vec::new();
    loop {
        let trimmed = input.trim_start();
        if let Some(rest) = trimmed.strip_prefix(']') {
            return Ok((values, rest));
        }
        if trimmed.is_empty() {
            return Err(DomainError::malformed("unterminated implementors list"));
        }

        let (value, rest) = parse_js_string(trimmed)?;
        values.push(value);

        let rest = rest.trim_start();
        input = match rest.strip_prefix(',') {
            Some(after_comma) => after_comma,
            None if rest.starts_with(']') => rest,
            None => return Err(DomainError::malformed("expected ',' or ']' in implementors list")),
        };
    }
}

/// `.../implementors/iron/middleware/trait.Handler.js` → `iron::middleware::Handler`.
fn interface_from_path(path: &Path) -> Option<InterfaceId> {
    let components: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();

    let root = components.iter().rposition(|c| *c == IMPLEMENTORS_DIR)?;
    let (file, modules) = components[root + 1..].split_last()?;
    let name = file.strip_prefix("trait.")?.strip_suffix(".js")?;
    if modules.is_empty() {
        return None;
    }

    InterfaceId::from_segments(modules.iter().copied().chain(std::iter::once(name))).ok()
}

// ---------------------------------------------------------------------------
// impl line decomposition
// ---------------------------------------------------------------------------

struct Anchor {
    class: Option<String>,
    href: Option<String>,
    title: Option<String>,
    text: String,
}

/// Top-level pieces of one impl line, with entities already decoded.
enum Segment {
    Text(String),
    Anchor(Anchor),
    Where(String),
}

impl Segment {
    fn text(&self) -> &str {
        match self {
            Segment::Text(text) | Segment::Where(text) => text,
            Segment::Anchor(anchor) => &anchor.text,
        }
    }
}

fn parse_impl_line(crate_name: &str, line: &str) -> Result<ImplementorDescriptor, DomainError> {
    let segments = segments(line);
    let signature = collapse_whitespace(&joined(&segments));
    let where_clause = segments.iter().find_map(|segment| match segment {
        Segment::Where(text) => Some(collapse_whitespace(text)),
        _ => None,
    });
    let head: Vec<&Segment> = segments
        .iter()
        .take_while(|segment| !matches!(segment, Segment::Where(_)))
        .collect();

    let (for_idx, remainder) = head
        .iter()
        .enumerate()
        .find_map(|(idx, segment)| match segment {
            Segment::Text(text) => text
                .find(FOR_KEYWORD)
                .map(|pos| (idx, &text[pos + FOR_KEYWORD.len()..])),
            _ => None,
        })
        .ok_or_else(|| DomainError::malformed(format!("impl line without ' for ': {}", signature)))?;
    let following = &head[for_idx + 1..];

    let mut descriptor = match following.split_first() {
        Some((Segment::Anchor(anchor), rest)) if remainder.trim().is_empty() => {
            let qualified_name = anchor
                .title
                .as_deref()
                .and_then(|t| t.split_whitespace().last())
                .map(String::from)
                .unwrap_or_else(|| collapse_whitespace(&anchor.text));
            let mut descriptor = ImplementorDescriptor::new(qualified_name)
                .with_type_params(type_params(&joined(rest.iter().copied())));
            if let Some(href) = &anchor.href {
                descriptor = descriptor.with_doc_link(href.as_str());
            }
            if let Some(class) = &anchor.class {
                descriptor = descriptor.with_annotation("kind", class.as_str());
            }
            descriptor
        }
        _ => {
            let self_type = format!("{}{}", remainder, joined(following.iter().copied()));
            ImplementorDescriptor::new(collapse_whitespace(&self_type))
        }
    };

    if descriptor.qualified_name().is_empty() {
        return Err(DomainError::malformed(format!(
            "impl line without a self type: {}",
            signature
        )));
    }

    descriptor = descriptor
        .with_crate(crate_name)
        .with_annotation("signature", signature);
    if let Some(where_clause) = where_clause {
        descriptor = descriptor.with_annotation("where", where_clause);
    }

    Ok(descriptor)
}

fn segments(line: &str) -> Vec<Segment> {
    let fragment = Html::parse_fragment(line);
    let mut segments = Vec::new();
    for child in fragment.root_element().children() {
        match child.value() {
            Node::Text(text) => segments.push(Segment::Text(normalize_spaces(text))),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    segments.push(element_segment(element));
                }
            }
            _ => {}
        }
    }
    segments
}

fn element_segment(element: ElementRef<'_>) -> Segment {
    let value = element.value();
    let text = normalize_spaces(&element.text().collect::<String>());
    match value.name() {
        "a" => Segment::Anchor(Anchor {
            class: value.attr("class").map(String::from),
            href: value.attr("href").map(String::from),
            title: value.attr("title").map(String::from),
            text,
        }),
        "span" if value.classes().any(|class| class == "where") => Segment::Where(text),
        _ => Segment::Text(text),
    }
}

fn joined<'a>(segments: impl IntoIterator<Item = &'a Segment>) -> String {
    segments.into_iter().map(Segment::text).collect()
}

/// Title of the first anchor with the given class, e.g. the trait link.
fn anchor_title(line: &str, class: &str) -> Option<String> {
    let selector = Selector::parse(&format!("a.{}", class)).ok()?;
    Html::parse_fragment(line)
        .select(&selector)
        .find_map(|anchor| anchor.value().attr("title").map(String::from))
}

/// `<A, B<C, D>>` → `["A", "B<C, D>"]`; anything not starting with `<` → empty.
fn type_params(text: &str) -> Vec<String> {
    let Some(inner) = text.trim_start().strip_prefix('<') else {
        return Vec::new();
    };

    let mut params = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut prev = ' ';
    for c in inner.chars() {
        match c {
            '>' if prev == '-' => current.push(c),
            '<' | '(' | '[' => {
                depth += 1;
                current.push(c);
            }
            '>' if depth == 0 => break,
            '>' | ')' | ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => params.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
        prev = c;
    }
    params.push(current);

    params
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// `&nbsp;` decodes to U+00A0; treat it as a plain space.
fn normalize_spaces(text: &str) -> String {
    text.replace('\u{a0}', " ")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAPHIQL_LINE: &str = "impl <a class='trait' href='iron/middleware/trait.Handler.html' title='iron::middleware::Handler'>Handler</a> for <a class='struct' href='juniper/iron_handlers/struct.GraphiQLHandler.html' title='juniper::iron_handlers::GraphiQLHandler'>GraphiQLHandler</a>";

    fn raw(origin: &str, content: &str) -> RawFragment {
        RawFragment::new(origin, FragmentFormat::RustdocJs, content.to_string())
    }

    #[test]
    fn test_interface_from_path() {
        let id = interface_from_path(Path::new(
            "/doc/implementors/iron/middleware/trait.Handler.js",
        ))
        .unwrap();
        assert_eq!(id.as_str(), "iron::middleware::Handler");

        assert!(interface_from_path(Path::new("/doc/trait.Handler.js")).is_none());
        assert!(interface_from_path(Path::new("/doc/implementors/trait.Handler.js")).is_none());
        assert!(interface_from_path(Path::new("/doc/implementors/iron/struct.X.js")).is_none());
    }

    #[test]
    fn test_parse_js_string_escapes() {
        let (value, rest) = parse_js_string(r#" "a\"b\\cA" , x"#).unwrap();
        assert_eq!(value, "a\"b\\cA");
        assert_eq!(rest, " , x");

        assert!(parse_js_string("\"open").unwrap_err().is_malformed());
        assert!(parse_js_string("bare").is_err());
    }

    #[test]
    fn test_parse_crate_lists_keeps_file_order() {
        let content = r#"(function() {var implementors = {};
implementors["b"] = ["x",];implementors["a"] = [];implementors["c"] = ["y", "z"];
})()"#;
        let lists = parse_crate_lists(content).unwrap();
        let crates: Vec<&str> = lists.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(crates, vec!["b", "a", "c"]);
        assert_eq!(lists[2].1, vec!["y".to_string(), "z".to_string()]);
    }

    #[test]
    fn test_parse_crate_lists_rejects_garbage() {
        assert!(parse_crate_lists("console.log(1)").unwrap_err().is_malformed());
        assert!(parse_crate_lists(r#"implementors["a"] = ["x""#).is_err());
        assert!(parse_crate_lists(r#"implementors["a"] = ["x" "y"]"#).is_err());
        assert!(parse_crate_lists("var implementors = {};").unwrap().is_empty());
    }

    #[test]
    fn test_simple_impl_line() {
        let descriptor = parse_impl_line("juniper", GRAPHIQL_LINE).unwrap();

        assert_eq!(
            descriptor.qualified_name(),
            "juniper::iron_handlers::GraphiQLHandler"
        );
        assert_eq!(
            descriptor.doc_link(),
            Some("juniper/iron_handlers/struct.GraphiQLHandler.html")
        );
        assert_eq!(descriptor.crate_name(), Some("juniper"));
        assert_eq!(descriptor.annotation("kind"), Some("struct"));
        assert_eq!(
            descriptor.annotation("signature"),
            Some("impl Handler for GraphiQLHandler")
        );
        assert!(descriptor.type_params().is_empty());
        assert!(descriptor.annotation("where").is_none());
    }

    #[test]
    fn test_generic_impl_line_with_where_clause() {
        let line = "impl&lt;T,&nbsp;U&gt; <a class='trait' href='x/trait.Handler.html' title='x::Handler'>Handler</a> for <a class='struct' href='y/struct.Wrap.html' title='y::Wrap'>Wrap</a>&lt;T,&nbsp;<a class='struct' href='y/struct.Pair.html' title='y::Pair'>Pair</a>&lt;U,&nbsp;T&gt;&gt; <span class='where'>where T: <a class='trait' href='core/marker/trait.Send.html' title='core::marker::Send'>Send</a> + 'static</span>";

        let descriptor = parse_impl_line("y", line).unwrap();

        assert_eq!(descriptor.qualified_name(), "y::Wrap");
        assert_eq!(
            descriptor.type_params(),
            ["T".to_string(), "Pair<U, T>".to_string()]
        );
        assert_eq!(descriptor.annotation("where"), Some("where T: Send + 'static"));
    }

    #[test]
    fn test_numeric_entities_are_decoded() {
        let line = "impl&lt;&#x27;a&gt; <a class='trait' href='x/trait.Handler.html' title='x::Handler'>Handler</a> for <a class='struct' href='y/struct.Ref.html' title='y::Ref'>Ref</a>&lt;&#x27;a&gt; <span class='where fmt-newline'>where T: &#8216;static</span>";

        let descriptor = parse_impl_line("y", line).unwrap();

        assert_eq!(descriptor.type_params(), ["'a".to_string()]);
        assert_eq!(descriptor.annotation("where"), Some("where T: \u{2018}static"));
    }

    #[test]
    fn test_title_is_read_from_its_own_attribute() {
        let line = "impl <a class='trait' href='x/trait.Handler.html' title='x::Handler'>Handler</a> for <a href='y/struct.W.html' data-title='bogus' title='y::W' class='struct'>W</a>";

        let descriptor = parse_impl_line("y", line).unwrap();

        assert_eq!(descriptor.qualified_name(), "y::W");
        assert_eq!(descriptor.doc_link(), Some("y/struct.W.html"));
        assert_eq!(descriptor.annotation("kind"), Some("struct"));
    }

    #[test]
    fn test_anchor_with_newline_before_attributes() {
        let line = "impl <a class='trait' href='x/trait.Handler.html' title='x::Handler'>Handler</a> for <a\nclass='struct' href='y/struct.W.html' title='y::W'>W</a>";

        let descriptor = parse_impl_line("y", line).unwrap();

        assert_eq!(descriptor.qualified_name(), "y::W");
        assert_eq!(descriptor.doc_link(), Some("y/struct.W.html"));
    }

    #[test]
    fn test_type_params_with_fn_arrow() {
        assert_eq!(
            type_params("<F, Box<Fn(u8) -> T>> rest"),
            vec!["F".to_string(), "Box<Fn(u8) -> T>".to_string()]
        );
        assert!(type_params("no generics").is_empty());
    }

    #[test]
    fn test_self_type_without_anchor() {
        let line = "impl <a class='trait' href='x/trait.Handler.html' title='x::Handler'>Handler</a> for fn(&amp;str)";
        let descriptor = parse_impl_line("x", line).unwrap();
        assert_eq!(descriptor.qualified_name(), "fn(&str)");
    }

    #[test]
    fn test_line_without_for_is_malformed() {
        let err = parse_impl_line("x", "impl Handler").unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_interface_falls_back_to_trait_anchor() {
        let content = format!(
            "var implementors = {{}};\nimplementors[\"juniper\"] = [\"{}\"];",
            GRAPHIQL_LINE
        );
        let fragment = RustdocFragmentDecoder::new()
            .decode(&raw("loose/trait.Handler.js", &content))
            .unwrap();

        let id = InterfaceId::parse("iron::middleware::Handler").unwrap();
        assert_eq!(fragment.get(&id).map(|s| s.len()), Some(1));
    }

    #[test]
    fn test_unidentifiable_interface_is_malformed() {
        let err = RustdocFragmentDecoder::new()
            .decode(&raw("loose/trait.Handler.js", "var implementors = {};"))
            .unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_empty_table_from_path_registers_empty_set() {
        let fragment = RustdocFragmentDecoder::new()
            .decode(&raw(
                "doc/implementors/iron/trait.Plugin.js",
                "(function() {var implementors = {};\nimplementors[\"iron\"] = [];\n})()",
            ))
            .unwrap();

        let id = InterfaceId::parse("iron::Plugin").unwrap();
        assert!(fragment.get(&id).unwrap().is_empty());
    }
}
