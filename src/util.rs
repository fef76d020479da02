use std::borrow::Cow;
use tl::{HTMLTag, Node, NodeHandle, Parser};

/// Normalize a name for comparison: trim, replace every run of whitespace
/// with a single `_`, lowercase.
///
/// Unit headings, URL fragments and label keys all go through this one function.
pub fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Returns true if the parser node is a HTML tag
pub(crate) fn node_is_tag(node: &NodeHandle, parser: &Parser) -> bool {
    node.get(parser)
        .map(|node| matches!(node, Node::Tag(..)))
        .unwrap_or(false)
}

/// Returns true if the parser node is a comment (never part of the visible tree)
pub(crate) fn node_is_comment(node: &NodeHandle, parser: &Parser) -> bool {
    node.get(parser)
        .map(|node| matches!(node, Node::Comment(..)))
        .unwrap_or(false)
}

/// Make `name` safe to use as a single path component: path separators and
/// characters Windows rejects become `_`, as does a name of only dots.
pub(crate) fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if stem.chars().all(|c| c == '.') {
        return "_".repeat(stem.len().max(1));
    }
    stem
}

/// Returns the entity-decoded value of attribute `attr`, if it exists.
/// `<node attr/>` (no value) is reported as an empty string.
pub(crate) fn get_attr_value(tag: &HTMLTag, attr: &str) -> Option<String> {
    let attributes = tag.attributes();
    let value = match attr {
        "id" => Some(attributes.id()?),
        "class" => Some(attributes.class()?),
        _ => attributes.get(attr)?,
    };
    Some(
        value
            .map(|bytes| decode_entities(&bytes.as_utf8_str()).into_owned())
            .unwrap_or_default(),
    )
}

/// Decodes the HTML character references that show up in wiki markup:
/// the basic named entities plus decimal and hexadecimal references.
/// Unknown references are left untouched.
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(|c| c == 'x' || c == 'X') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
