//! Deterministic HTML serialization of element trees.

use serde::Serialize;
use tracing::warn;

use crate::element::{Element, Tag};
use crate::error::{Error, Result};
use crate::live::handler::element_id_for;
use crate::live::session::Session;

#[derive(Serialize)]
struct EventBinding<'a> {
    event: &'a str,
    handler: String,
}

/// Escape text content.
pub fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Quote an attribute value.
///
/// Values holding `"` but no `'` are single-quoted and left readable, which
/// keeps JSON attributes such as `sle-on` legible. Everything else is
/// double-quoted with `"` escaped.
pub fn quote_attr(value: &str) -> String {
    let escaped = escape_text(value);
    if value.contains('"') && !value.contains('\'') {
        format!("'{}'", escaped)
    } else {
        format!("\"{}\"", escaped.replace('"', "&quot;"))
    }
}

/// Serialize `element`; a synthetic root contributes only its children.
pub fn to_html(element: &Element, session: Option<&Session>) -> Result<String> {
    let mut out = String::new();
    write_element(&mut out, element, session)?;
    Ok(out)
}

fn write_element(out: &mut String, element: &Element, session: Option<&Session>) -> Result<()> {
    if element.text.is_some() && !element.children.is_empty() {
        return Err(Error::malformed(format!(
            "<{}> has both text and children",
            element.tag
        )));
    }

    if element.tag.is_synthetic() {
        for child in &element.children {
            write_element(out, child, session)?;
        }
        return Ok(());
    }

    out.push('<');
    out.push_str(element.tag.as_str());
    for (key, value) in attributes(element, session)? {
        out.push(' ');
        out.push_str(&key);
        out.push('=');
        out.push_str(&quote_attr(&value));
    }
    out.push('>');

    let empty = element.text.is_none() && element.children.is_empty();
    if empty && is_self_contained(element.tag) {
        return Ok(());
    }

    if let Some(text) = &element.text {
        if element.tag.is_raw_text() {
            out.push_str(&raw_text(element.tag, text)?);
        } else {
            out.push_str(&escape_text(text));
        }
    }
    for child in &element.children {
        write_element(out, child, session)?;
    }

    out.push_str("</");
    out.push_str(element.tag.as_str());
    out.push('>');
    Ok(())
}

/// Script and style bodies go out as-is; they only must not close their own
/// element early.
fn raw_text(tag: Tag, text: &str) -> Result<&str> {
    let closing = format!("</{}", tag.as_str());
    if text.to_ascii_lowercase().contains(&closing) {
        return Err(Error::malformed(format!(
            "<{}> text contains '{}'",
            tag, closing
        )));
    }
    Ok(text)
}

fn is_self_contained(tag: Tag) -> bool {
    tag.is_void() && !tag.needs_explicit_close()
}

/// Attributes in serialization order: id, class, attrs, style, sle-on.
fn attributes(element: &Element, session: Option<&Session>) -> Result<Vec<(String, String)>> {
    let mut attrs = Vec::with_capacity(element.attrs.len() + 4);

    let bindings = element.event_bindings();
    let id = match &element.id {
        Some(id) => Some(id.clone()),
        None if !bindings.is_empty() => {
            Some(element_id_for(bindings.iter().map(|(_, handler)| *handler)))
        }
        None => None,
    };
    if let Some(id) = id {
        attrs.push(("id".to_string(), id));
    }

    if !element.classes.is_empty() {
        attrs.push(("class".to_string(), element.classes.render()));
    }

    for (key, value) in &element.attrs {
        attrs.push((key.replace('_', "-"), value.clone()));
    }

    if !element.style.is_empty() {
        let style = element
            .style
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect::<Vec<_>>()
            .join(";");
        attrs.push(("style".to_string(), style));
    }

    if !bindings.is_empty() {
        match session {
            Some(session) => {
                let registered: Vec<EventBinding<'_>> = bindings
                    .iter()
                    .map(|&(event, handler)| EventBinding {
                        event,
                        handler: session.register_handler(handler),
                    })
                    .collect();
                attrs.push(("sle-on".to_string(), serde_json::to_string(&registered)?));
            }
            None => warn!(
                tag = %element.tag,
                "event bindings rendered without a session are dropped"
            ),
        }
    }

    Ok(attrs)
}
