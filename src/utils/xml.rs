//! Minimal XML element tree on top of `quick_xml`'s event reader.
//!
//! PubMed records have many optional, repeated and mixed-content elements, so
//! they are walked as a tree with ElementTree-style lookups instead of being
//! mapped onto serde structs. Element names are stored without namespace
//! prefixes.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::sources::SourceError;

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Parse a document and return its root element
    pub fn parse(xml: &str) -> Result<XmlElement, SourceError> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Self::from_start(&start)?;
                    Self::attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| SourceError::Parse("Unbalanced XML end tag".to_string()))?;
                    Self::attach(&mut stack, &mut root, element);
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Text(text.unescape()?.into_owned()));
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                        parent.children.push(XmlNode::Text(text));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(SourceError::Parse("Unexpected end of XML document".to_string()));
        }
        root.ok_or_else(|| SourceError::Parse("XML document has no root element".to_string()))
    }

    fn from_start(start: &BytesStart<'_>) -> Result<XmlElement, SourceError> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| SourceError::Parse(format!("XML attribute: {}", e)))?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(XmlElement {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(XmlNode::Element(element)),
            None => {
                if root.is_none() {
                    *root = Some(element);
                }
            }
        }
    }

    /// Attribute value by (local) name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Direct child elements
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    /// All descendants with the given name, in document order (self excluded)
    pub fn descendants(&self, name: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        let mut stack: Vec<&XmlElement> = self.elements().collect();
        stack.reverse();
        while let Some(element) = stack.pop() {
            if element.name == name {
                found.push(element);
            }
            let mut children: Vec<&XmlElement> = element.elements().collect();
            children.reverse();
            stack.extend(children);
        }
        found
    }

    /// ElementTree `.//A/B/C` lookup: every `C` that is a child of a `B` that
    /// is a child of any descendant `A`.
    pub fn find_all(&self, path: &[&str]) -> Vec<&XmlElement> {
        let Some((first, rest)) = path.split_first() else {
            return Vec::new();
        };
        let mut current = self.descendants(first);
        for step in rest {
            current = current
                .into_iter()
                .flat_map(|e| e.elements().filter(move |c| c.name == *step))
                .collect();
        }
        current
    }

    /// First match of [`find_all`](Self::find_all)
    pub fn find(&self, path: &[&str]) -> Option<&XmlElement> {
        self.find_all(path).into_iter().next()
    }

    /// All text inside this element, inline markup flattened, trimmed
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out.trim().to_string()
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => element.collect_text(out),
            }
        }
    }
}
