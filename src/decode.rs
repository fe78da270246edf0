//! Response decoding
//!
//! Bodies are tried as JSON first and, failing that, as XML. The XML side is
//! parsed with `quick-xml` into a small owned element tree, which is all the
//! FRED XML normalizer needs (element names, attributes, children).

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde_json::Value;
use tracing::debug;

/// Decoding errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Body is neither valid JSON nor valid XML
    #[error("response is neither JSON ({json}) nor XML ({xml})")]
    Unrecognized {
        /// JSON parser error
        json: String,
        /// XML parser error
        xml: String,
    },
}

/// Decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedPayload {
    /// JSON document
    Json(Value),
    /// XML document root
    Xml(XmlElement),
}

impl DecodedPayload {
    /// Short format label for messages
    pub fn format_name(&self) -> &'static str {
        match self {
            DecodedPayload::Json(_) => "JSON",
            DecodedPayload::Xml(_) => "XML",
        }
    }
}

/// Owned XML element
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    /// Tag name
    pub name: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order
    pub children: Vec<XmlElement>,
    /// Concatenated text content (trimmed)
    pub text: String,
}

impl XmlElement {
    /// Attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Direct children with the given tag name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }
}

/// Decode a response body: JSON first, XML as a fallback
pub fn decode(body: &str) -> Result<DecodedPayload, DecodeError> {
    let json_err = match serde_json::from_str::<Value>(body) {
        Ok(value) => {
            debug!("Decoded response as JSON");
            return Ok(DecodedPayload::Json(value));
        }
        Err(e) => e.to_string(),
    };

    match parse_xml(body) {
        Ok(root) => {
            debug!(root = %root.name, "Decoded response as XML");
            Ok(DecodedPayload::Xml(root))
        }
        Err(xml) => Err(DecodeError::Unrecognized {
            json: json_err,
            xml,
        }),
    }
}

/// Parse an XML document into its root element
pub fn parse_xml(text: &str) -> Result<XmlElement, String> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("at byte {}: {e}", reader.buffer_position()))?;

        match event {
            Event::Start(start) => {
                ensure_single_root(&stack, &root)?;
                stack.push(element_from(&start)?);
            }
            Event::Empty(start) => {
                ensure_single_root(&stack, &root)?;
                let element = element_from(&start)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| "closing tag without matching opening tag".to_string())?;
                attach(&mut stack, &mut root, element);
            }
            Event::Text(text) => {
                let content = text.unescape().map_err(|e| e.to_string())?;
                push_text(&mut stack, &content)?;
            }
            Event::CData(data) => {
                let content = String::from_utf8_lossy(&data.into_inner()).into_owned();
                push_text(&mut stack, &content)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unclosed element <{}>", open.name));
    }

    root.ok_or_else(|| "document has no root element".to_string())
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement, String> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
        attributes.push((key, value));
    }

    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

fn ensure_single_root(stack: &[XmlElement], root: &Option<XmlElement>) -> Result<(), String> {
    if stack.is_empty() && root.is_some() {
        return Err("multiple root elements".to_string());
    }
    Ok(())
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn push_text(stack: &mut [XmlElement], content: &str) -> Result<(), String> {
    match stack.last_mut() {
        Some(current) => {
            current.text.push_str(content);
            Ok(())
        }
        None if content.trim().is_empty() => Ok(()),
        None => Err("text outside of the root element".to_string()),
    }
}
