//! XML parsing into a generic element tree.
//!
//! Uses quick-xml, which never expands external entities. DOCTYPE
//! declarations are rejected outright.
//!
//! The tree follows the shape the service's responses are read in:
//! an element with no child elements collapses to its text, an element
//! with children becomes a map keyed by the qualified child name
//! (`soap:Body`, `APP_PAN_NO`). Attributes are dropped. A name repeated
//! among siblings is an error, since the PAN validation schema never
//! repeats one.

use crate::error::HarnessError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;

/// A node of the parsed response tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// Leaf element, collapsed to its text (empty for `<a/>`)
    Text(String),
    /// Element with child elements
    Element(BTreeMap<String, XmlNode>),
}

impl XmlNode {
    /// Child node by qualified name.
    pub fn get(&self, name: &str) -> Option<&XmlNode> {
        match self {
            Self::Element(children) => children.get(name),
            Self::Text(_) => None,
        }
    }

    /// Walk `path` from this node.
    ///
    /// On failure returns the first path segment that could not be found.
    pub fn descend<'p>(&self, path: &[&'p str]) -> Result<&XmlNode, &'p str> {
        let mut node = self;
        for segment in path {
            node = node.get(segment).ok_or(*segment)?;
        }
        Ok(node)
    }

    /// Walk `path` from this node, returning `None` if any level is missing.
    pub fn lookup(&self, path: &[&str]) -> Option<&XmlNode> {
        self.descend(path).ok()
    }

    /// Text of a leaf node at `path`.
    pub fn text_at(&self, path: &[&str]) -> Option<&str> {
        self.lookup(path).and_then(XmlNode::as_text)
    }

    /// Text of this node if it is a leaf.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Element(_) => None,
        }
    }

    /// True for an element holding at least one child.
    pub fn is_populated(&self) -> bool {
        matches!(self, Self::Element(children) if !children.is_empty())
    }
}

/// SOAP envelope dialects, told apart by namespace prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapDialect {
    /// `soap:Envelope`
    Soap11,
    /// `soap12:Envelope`
    Soap12,
}

impl SoapDialect {
    /// Dialects in the order they are tried.
    pub const ALL: [SoapDialect; 2] = [SoapDialect::Soap11, SoapDialect::Soap12];

    /// Namespace prefix used by this dialect.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Soap11 => "soap",
            Self::Soap12 => "soap12",
        }
    }

    fn envelope_tag(&self) -> String {
        format!("{}:Envelope", self.prefix())
    }

    fn body_tag(&self) -> String {
        format!("{}:Body", self.prefix())
    }
}

/// A located SOAP envelope. Everything below the body is dialect-agnostic.
#[derive(Debug, Clone, Copy)]
pub struct SoapEnvelope<'a> {
    /// Detected dialect
    pub dialect: SoapDialect,
    node: &'a XmlNode,
}

impl<'a> SoapEnvelope<'a> {
    /// The envelope's body element.
    pub fn body(&self) -> Option<&'a XmlNode> {
        self.node.get(&self.dialect.body_tag())
    }
}

/// Find the envelope at the document root, trying `soap:` then `soap12:`.
pub fn locate_envelope(document: &XmlNode) -> Option<SoapEnvelope<'_>> {
    SoapDialect::ALL.iter().find_map(|dialect| {
        document
            .get(&dialect.envelope_tag())
            .map(|node| SoapEnvelope {
                dialect: *dialect,
                node,
            })
    })
}

/// Element under construction.
struct Frame {
    name: String,
    children: BTreeMap<String, XmlNode>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            children: BTreeMap::new(),
            text: String::new(),
        }
    }

    fn attach(&mut self, name: String, node: XmlNode) -> Result<(), HarnessError> {
        if self.children.contains_key(&name) {
            return Err(HarnessError::XmlParse(format!(
                "repeated element <{}> under <{}>",
                name, self.name
            )));
        }
        self.children.insert(name, node);
        Ok(())
    }

    fn finish(self) -> (String, XmlNode) {
        // Text mixed in with child elements is dropped
        let node = if self.children.is_empty() {
            XmlNode::Text(self.text)
        } else {
            XmlNode::Element(self.children)
        };
        (self.name, node)
    }
}

/// Parse an XML document.
///
/// Returns a node whose single child is the root element, keyed by its
/// qualified name, so callers look up `soap:Envelope` from the top.
pub fn parse_xml(xml: &str) -> Result<XmlNode, HarnessError> {
    // Leaf text is kept as written; `<a> X </a>` reads as " X "
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Frame> = Vec::new();
    let mut document = Frame::new(String::from("#document"));
    let mut seen_root = false;

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if stack.is_empty() && seen_root {
                    return Err(HarnessError::XmlParse(
                        "content after the root element".to_string(),
                    ));
                }
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                stack.push(Frame::new(name));
            }

            Ok(Event::Empty(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match stack.last_mut() {
                    Some(parent) => parent.attach(name, XmlNode::Text(String::new()))?,
                    None if seen_root => {
                        return Err(HarnessError::XmlParse(
                            "content after the root element".to_string(),
                        ));
                    }
                    None => {
                        document.attach(name, XmlNode::Text(String::new()))?;
                        seen_root = true;
                    }
                }
            }

            Ok(Event::End(_)) => {
                // quick-xml already verified the end name matches
                let frame = stack.pop().ok_or_else(|| {
                    HarnessError::XmlParse("unexpected closing tag".to_string())
                })?;
                let (name, node) = frame.finish();
                match stack.last_mut() {
                    Some(parent) => parent.attach(name, node)?,
                    None => {
                        document.attach(name, node)?;
                        seen_root = true;
                    }
                }
            }

            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| HarnessError::XmlParse(err.to_string()))?;
                match stack.last_mut() {
                    Some(frame) => frame.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(HarnessError::XmlParse(format!(
                            "text outside the root element: '{}'",
                            text
                        )));
                    }
                }
            }

            Ok(Event::CData(e)) => {
                let data = e.into_inner();
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data));
                }
            }

            Ok(Event::DocType(_)) => {
                return Err(HarnessError::XmlParse(
                    "DOCTYPE declarations are not allowed".to_string(),
                ));
            }

            Ok(Event::Eof) => break,

            Err(e) => {
                return Err(HarnessError::XmlParse(format!(
                    "{} (at byte {})",
                    e,
                    reader.buffer_position()
                )));
            }

            // Declarations, comments, processing instructions
            _ => {}
        }

        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(HarnessError::XmlParse(format!(
            "unclosed element <{}>",
            open.name
        )));
    }
    if !seen_root {
        return Err(HarnessError::XmlParse(
            "document has no root element".to_string(),
        ));
    }

    Ok(XmlNode::Element(document.children))
}
