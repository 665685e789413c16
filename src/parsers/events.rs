//! Tokenizer side of the USX pipeline. The parser stack only ever sees
//! `UsxEvent`s; `XmlEventSource` produces them from quick-xml.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

impl StartTag {
    pub fn new(name: &str, attributes: &[(&str, &str)]) -> Self {
        StartTag {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value, failing on absent or blank values.
    pub fn required(&self, key: &str) -> Result<&str, ParseError> {
        self.attr(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ParseError::missing(&self.name, key))
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// USX 3 closing milestones (`<verse eid=".."/>`, `<chapter eid=".."/>`)
    /// carry no number and only mark where the previous unit ends.
    pub fn is_end_milestone(&self) -> bool {
        self.attr("eid").is_some() && self.attr("number").is_none()
    }

    /// A `chapter` marker that opens a new chapter.
    pub fn opens_chapter(&self) -> bool {
        self.is("chapter") && !self.is_end_milestone()
    }

    pub fn opens_verse(&self) -> bool {
        self.is("verse") && !self.is_end_milestone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsxEvent {
    Start(StartTag),
    End(String),
    Text(String),
}

/// Forward-only event stream over a USX string. Self-closing elements are
/// reported as a start immediately followed by an end.
pub struct XmlEventSource<'a> {
    reader: Reader<&'a [u8]>,
    pending_end: Option<String>,
    finished: bool,
}

impl<'a> XmlEventSource<'a> {
    pub fn new(xml: &'a str) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);
        XmlEventSource {
            reader,
            pending_end: None,
            finished: false,
        }
    }

    pub fn next_event(&mut self) -> Result<Option<UsxEvent>, ParseError> {
        if let Some(name) = self.pending_end.take() {
            return Ok(Some(UsxEvent::End(name)));
        }
        if self.finished {
            return Ok(None);
        }

        loop {
            let event = self.reader.read_event().map_err(|e| {
                ParseError::Xml(format!(
                    "at position {}: {}",
                    self.reader.buffer_position(),
                    e
                ))
            })?;

            match event {
                Event::Start(e) => return Ok(Some(UsxEvent::Start(start_tag(&e)?))),
                Event::Empty(e) => {
                    let tag = start_tag(&e)?;
                    self.pending_end = Some(tag.name.clone());
                    return Ok(Some(UsxEvent::Start(tag)));
                }
                Event::End(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    return Ok(Some(UsxEvent::End(name)));
                }
                Event::Text(e) => {
                    let text = e
                        .unescape()
                        .map_err(|err| ParseError::Xml(err.to_string()))?;
                    if !text.is_empty() {
                        return Ok(Some(UsxEvent::Text(text.into_owned())));
                    }
                }
                Event::CData(e) => {
                    return Ok(Some(UsxEvent::Text(String::from_utf8_lossy(&e).into_owned())));
                }
                Event::Eof => {
                    self.finished = true;
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

impl Iterator for XmlEventSource<'_> {
    type Item = Result<UsxEvent, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

fn start_tag(e: &BytesStart) -> Result<StartTag, ParseError> {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ParseError::Xml(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| ParseError::Xml(err.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(StartTag { name, attributes })
}
