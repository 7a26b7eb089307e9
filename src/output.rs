//! Rendering a finished record (or a search mapping) for the caller.

use std::io::Cursor;
use std::str::FromStr;
use std::sync::LazyLock;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use regex::Regex;
use serde_json::Value;

use crate::error::OutputError;

const XML_ROOT: &str = "root";

static XML_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z_][a-z0-9:._\-]*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    Xml,
    /// Indented dump for eyeballing.
    Raw,
    /// Hand the structured value back untouched.
    #[default]
    Native,
}

impl FromStr for OutputFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "xml" => Ok(OutputFormat::Xml),
            "raw" => Ok(OutputFormat::Raw),
            "" => Ok(OutputFormat::Native),
            other => Err(OutputError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Render `value`; `Native` yields `None`.
pub fn render(value: &Value, format: OutputFormat) -> Result<Option<String>, OutputError> {
    match format {
        OutputFormat::Json => Ok(Some(serde_json::to_string_pretty(value)?)),
        OutputFormat::Xml => to_xml(value, XML_ROOT).map(Some),
        OutputFormat::Raw => Ok(Some(dump(value))),
        OutputFormat::Native => Ok(None),
    }
}

// ── XML ──

fn valid_name(name: &str) -> bool {
    XML_NAME_RE.is_match(name) && !name.ends_with(':')
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Convert a mapping to an XML document.
///
/// Pseudo-keys: `@attributes` (mapping of attributes), `@value` (text
/// content) and `@cdata` (CDATA content). A list under a key repeats the
/// element once per item.
pub fn to_xml(value: &Value, root: &str) -> Result<String, OutputError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_node(&mut writer, root, value)?;
    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_node(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str, value: &Value) -> Result<(), OutputError> {
    let mut start = BytesStart::new(name);

    let Value::Object(map) = value else {
        let text = scalar_text(value);
        if text.is_empty() {
            writer.write_event(Event::Empty(start))?;
        } else {
            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Text(BytesText::new(&text)))?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        return Ok(());
    };

    if let Some(Value::Object(attrs)) = map.get("@attributes") {
        for (key, attr) in attrs {
            if !valid_name(key) {
                return Err(OutputError::InvalidName {
                    kind: "attribute",
                    name: key.clone(),
                    node: name.to_string(),
                });
            }
            start.push_attribute((key.as_str(), scalar_text(attr).as_str()));
        }
    }

    if let Some(text) = map.get("@value") {
        writer.write_event(Event::Start(start))?;
        writer.write_event(Event::Text(BytesText::new(&scalar_text(text))))?;
        writer.write_event(Event::End(BytesEnd::new(name)))?;
        return Ok(());
    }
    if let Some(text) = map.get("@cdata") {
        writer.write_event(Event::Start(start))?;
        writer.write_event(Event::CData(BytesCData::new(scalar_text(text))))?;
        writer.write_event(Event::End(BytesEnd::new(name)))?;
        return Ok(());
    }

    let children: Vec<(&String, &Value)> = map.iter().filter(|(k, _)| *k != "@attributes").collect();
    if children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for (key, child) in children {
        if !valid_name(key) {
            return Err(OutputError::InvalidName {
                kind: "tag",
                name: key.clone(),
                node: name.to_string(),
            });
        }
        match child {
            Value::Array(items) => {
                for item in items {
                    write_node(writer, key, item)?;
                }
            }
            _ => write_node(writer, key, child)?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

// ── Raw dump ──

/// `print_r`-style dump: nested "Array ( [key] => value )" blocks.
pub fn dump(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Object(_) | Value::Array(_) => dump_nested(&mut out, value, 0),
        other => out.push_str(&dump_scalar(other)),
    }
    out
}

fn dump_scalar(value: &Value) -> String {
    match value {
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) | Value::Null => String::new(),
        other => scalar_text(other),
    }
}

/// Keyed children of a mapping or list; list items are keyed by position.
fn dump_entries(value: &Value) -> Vec<(String, &Value)> {
    match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items.iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect(),
        _ => Vec::new(),
    }
}

fn dump_nested(out: &mut String, value: &Value, pad: usize) {
    let indent = " ".repeat(pad);
    out.push_str("Array\n");
    out.push_str(&indent);
    out.push_str("(\n");
    for (key, child) in dump_entries(value) {
        out.push_str(&format!("{indent}    [{key}] => "));
        match child {
            Value::Object(_) | Value::Array(_) => dump_nested(out, child, pad + 8),
            scalar => {
                out.push_str(&dump_scalar(scalar));
                out.push('\n');
            }
        }
    }
    out.push_str(&indent);
    out.push_str(")\n\n");
}
