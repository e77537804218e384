//! SOAP envelope encoding and decoding
//!
//! Requests are written straight from an [`AxlValue`] tree: record fields become
//! child elements, list items repeat their parent element name, and scalars
//! become escaped text. Replies are read back into the same tree shape:
//!
//! - repeated sibling elements fold into a [`AxlValue::List`]
//! - attributes (`uuid="{...}"`) become record fields
//! - text of an element that also has attributes is stored under `_`
//! - namespace prefixes are dropped
//!
//! The single-vs-repeated ambiguity is left in place on purpose; the
//! [`normalize`](crate::normalize::normalize) step resolves it.

use std::io::Cursor;

use quick_xml::events::attributes::Attributes;
use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::TransportError;
use crate::value::{AxlValue, FlatRecord, TEXT_KEY};

pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// AXL API namespace for a schema version, e.g. `12.5`
pub fn axl_namespace(version: &str) -> String {
    format!("http://www.cisco.com/AXL/API/{}", version)
}

type CodecResult<T> = std::result::Result<T, TransportError>;

fn xml_err(e: impl std::fmt::Display) -> TransportError {
    TransportError::xml(e.to_string())
}

/// Encode `request` as the body of a `procedure` call
pub fn encode_request(procedure: &str, version: &str, request: &AxlValue) -> CodecResult<String> {
    let fields = request
        .as_record()
        .ok_or_else(|| TransportError::xml(format!("{} request must be an object", procedure)))?;

    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;

    let namespace = axl_namespace(version);
    let mut envelope = BytesStart::new("soapenv:Envelope");
    envelope.push_attribute(("xmlns:soapenv", SOAP_ENV_NS));
    envelope.push_attribute(("xmlns:ns", namespace.as_str()));
    writer.write_event(Event::Start(envelope)).map_err(xml_err)?;
    writer
        .write_event(Event::Empty(BytesStart::new("soapenv:Header")))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("soapenv:Body")))
        .map_err(xml_err)?;

    let operation = format!("ns:{}", procedure);
    writer
        .write_event(Event::Start(BytesStart::new(operation.as_str())))
        .map_err(xml_err)?;
    write_fields(&mut writer, fields)?;
    writer
        .write_event(Event::End(BytesStart::new(operation.as_str()).to_end()))
        .map_err(xml_err)?;

    writer
        .write_event(Event::End(BytesStart::new("soapenv:Body").to_end()))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesStart::new("soapenv:Envelope").to_end()))
        .map_err(xml_err)?;

    String::from_utf8(writer.into_inner().into_inner()).map_err(xml_err)
}

fn write_fields(writer: &mut Writer<Cursor<Vec<u8>>>, fields: &FlatRecord) -> CodecResult<()> {
    for (name, value) in fields {
        if name == TEXT_KEY {
            if let Some(text) = value.as_str() {
                writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(xml_err)?;
            }
            continue;
        }
        write_element(writer, name, value)?;
    }
    Ok(())
}

fn write_element(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str, value: &AxlValue) -> CodecResult<()> {
    match value {
        AxlValue::Scalar(text) if text.is_empty() => {
            writer
                .write_event(Event::Empty(BytesStart::new(name)))
                .map_err(xml_err)?;
        }
        AxlValue::Scalar(text) => {
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(xml_err)?;
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(xml_err)?;
            writer
                .write_event(Event::End(BytesStart::new(name).to_end()))
                .map_err(xml_err)?;
        }
        AxlValue::Record(fields) => {
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(xml_err)?;
            write_fields(writer, fields)?;
            writer
                .write_event(Event::End(BytesStart::new(name).to_end()))
                .map_err(xml_err)?;
        }
        AxlValue::List(items) => {
            for item in items {
                write_element(writer, name, item)?;
            }
        }
    }
    Ok(())
}

/// Element under construction while reading
struct Frame {
    name: String,
    fields: FlatRecord,
    text: String,
}

impl Frame {
    fn new(name: String, fields: FlatRecord) -> Self {
        Self {
            name,
            fields,
            text: String::new(),
        }
    }

    fn finish(mut self) -> (String, AxlValue) {
        let has_text = !self.text.trim().is_empty();
        let value = if self.fields.is_empty() {
            if has_text {
                AxlValue::Scalar(self.text)
            } else {
                AxlValue::empty()
            }
        } else {
            if has_text {
                self.fields.insert(TEXT_KEY.to_string(), AxlValue::Scalar(self.text));
            }
            AxlValue::Record(self.fields)
        };
        (self.name, value)
    }

    /// Add a child element, folding repeats into a list
    fn add_child(&mut self, name: String, value: AxlValue) {
        match self.fields.get_mut(&name) {
            Some(AxlValue::List(items)) => items.push(value),
            Some(existing) => {
                let first = std::mem::replace(existing, AxlValue::List(Vec::new()));
                *existing = AxlValue::List(vec![first, value]);
            }
            None => {
                self.fields.insert(name, value);
            }
        }
    }
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn read_attributes(attributes: Attributes<'_>) -> CodecResult<FlatRecord> {
    let mut fields = FlatRecord::new();
    for attr in attributes {
        let attr = attr.map_err(xml_err)?;
        let key = attr.key;
        if key.as_ref().starts_with(b"xmlns") {
            continue;
        }
        let name = String::from_utf8_lossy(key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_err)?.into_owned();
        fields.insert(name, AxlValue::Scalar(value));
    }
    Ok(fields)
}

/// Parse an XML document into a value tree rooted at its document element
pub fn parse_document(xml: &str) -> CodecResult<AxlValue> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Frame::new(String::new(), FlatRecord::new())];

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => {
                let fields = read_attributes(e.attributes())?;
                stack.push(Frame::new(local_name(&e), fields));
            }
            Event::Empty(e) => {
                let fields = read_attributes(e.attributes())?;
                let (name, value) = Frame::new(local_name(&e), fields).finish();
                if let Some(parent) = stack.last_mut() {
                    parent.add_child(name, value);
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(TransportError::xml("unbalanced end tag"));
                }
                if let Some(frame) = stack.pop() {
                    let (name, value) = frame.finish();
                    if let Some(parent) = stack.last_mut() {
                        parent.add_child(name, value);
                    }
                }
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(xml_err)?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Event::CData(e) => {
                let bytes = e.into_inner();
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&bytes));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(TransportError::xml("document ended inside an element"));
    }
    let root = stack.pop().map(|f| f.fields).unwrap_or_default();
    root.into_iter()
        .next()
        .map(|(_, value)| value)
        .ok_or_else(|| TransportError::xml("document has no root element"))
}

/// Decode a SOAP response, returning the `<procedureResponse>` element
///
/// A `Fault` body is turned into [`TransportError::Fault`].
pub fn decode_response(xml: &str) -> CodecResult<AxlValue> {
    let envelope = parse_document(xml)?;
    let body = envelope
        .get("Body")
        .and_then(AxlValue::as_record)
        .ok_or_else(|| TransportError::xml("SOAP envelope has no Body"))?;

    let (name, payload) = body
        .first()
        .ok_or_else(|| TransportError::xml("SOAP Body is empty"))?;

    if name == "Fault" {
        let field = |f: &str| {
            payload
                .get(f)
                .and_then(AxlValue::text)
                .unwrap_or_default()
                .to_string()
        };
        return Err(TransportError::Fault {
            code: field("faultcode"),
            message: field("faultstring"),
        });
    }

    Ok(payload.clone())
}
