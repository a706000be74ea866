//! Markup minifier.
//!
//! Serializes a parsed document without comments and with collapsed
//! whitespace. Expression placeholders are written exactly as they appeared
//! in the source, and self-closing tags stay self-closing.

use vellum_relief::ast::{AttributeNode, ElementNode, RootNode, TemplateChildNode};

/// Minify a parsed document.
pub fn minify(root: &RootNode<'_>) -> String {
    let mut out = String::with_capacity(root.source.len());
    write_children(&root.children, &mut out);
    out
}

fn write_children(children: &[TemplateChildNode<'_>], out: &mut String) {
    for child in children {
        match child {
            TemplateChildNode::Element(el) => write_element(el, out),
            TemplateChildNode::Text(text) => write_text(text.content.as_str(), out),
            TemplateChildNode::Interpolation(interp) => out.push_str(interp.loc.source.as_str()),
            TemplateChildNode::Comment(_) => {}
        }
    }
}

fn write_element(el: &ElementNode<'_>, out: &mut String) {
    out.push('<');
    out.push_str(el.tag.as_str());
    for attr in el.attrs.iter() {
        write_attr(attr, out);
    }

    if el.is_self_closing {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if vellum_carton::is_void_tag(el.tag.as_str()) {
        return;
    }

    write_children(&el.children, out);
    out.push_str("</");
    out.push_str(el.tag.as_str());
    out.push('>');
}

fn write_attr(attr: &AttributeNode, out: &mut String) {
    out.push(' ');
    out.push_str(attr.name.as_str());
    let Some(value) = &attr.value else {
        return;
    };
    let value = value.content.as_str();
    let quote = if value.contains('"') { '\'' } else { '"' };
    out.push('=');
    out.push(quote);
    out.push_str(value);
    out.push(quote);
}

/// Collapse whitespace runs to one space; whitespace-only text disappears.
/// CDATA sections are copied as they are.
fn write_text(text: &str, out: &mut String) {
    if text.starts_with("<![CDATA[") {
        out.push_str(text);
        return;
    }
    if text.trim().is_empty() {
        return;
    }
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(c);
            in_space = false;
        }
    }
}
