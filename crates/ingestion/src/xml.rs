//! Record XML → `RecordValue` tree
//!
//! Conversion rules:
//! - attributes become `@name` keys
//! - child elements become keys, repeated siblings collapse into a list
//! - text becomes `#text` next to attributes/children, otherwise the element's value
//! - an element with nothing in it is `Null`

use contracts::{RecordMap, RecordValue};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::{IngestionError, Result};

const TEXT_KEY: &str = "#text";

/// Element under construction
struct Frame {
    name: String,
    fields: RecordMap,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut fields = RecordMap::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = format!("@{}", String::from_utf8_lossy(attr.key.as_ref()));
            let value = attr.unescape_value()?.into_owned();
            fields.insert(key, RecordValue::Text(value));
        }
        Ok(Self {
            name,
            fields,
            text: String::new(),
        })
    }

    fn close(self) -> (String, RecordValue) {
        let text = self.text.trim();
        let value = match (self.fields.is_empty(), text.is_empty()) {
            (true, true) => RecordValue::Null,
            (true, false) => RecordValue::Text(text.to_string()),
            (false, _) => {
                let mut fields = self.fields;
                if !text.is_empty() {
                    fields.insert(TEXT_KEY, RecordValue::Text(text.to_string()));
                }
                RecordValue::Map(fields)
            }
        };
        (self.name, value)
    }
}

fn attach(stack: &mut [Frame], root: &mut RecordMap, (name, value): (String, RecordValue)) {
    match stack.last_mut() {
        Some(parent) => parent.fields.append_child(name, value),
        None => root.append_child(name, value),
    }
}

/// Parse one rendered record into its tree.
///
/// The result is a map keyed by the root element name (normally `Event`).
pub fn parse_record_xml(xml: &str) -> Result<RecordValue> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Frame> = Vec::new();
    let mut root = RecordMap::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Frame::open(&start)?),
            Event::Empty(start) => {
                let element = Frame::open(&start)?.close();
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| IngestionError::Structure("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, frame.close());
            }
            Event::Text(text) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(IngestionError::Structure(format!(
            "element '{}' is not closed",
            open.name
        )));
    }
    if root.is_empty() {
        return Err(IngestionError::Structure("no root element".into()));
    }

    Ok(RecordValue::Map(root))
}
