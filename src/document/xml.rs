/*!
 * XML part parsing and serialization.
 *
 * Every event keeps the exact bytes it was read from, so a part whose text
 * was not replaced serializes back byte-for-byte.
 */

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::errors::TranslationError;

use super::tree::{ElementNode, NodeId, NodeKind, TextNode, Tree, TreeVisitor};

fn malformed(part: &str, error: impl std::fmt::Display) -> TranslationError {
    TranslationError::MalformedDocument(format!("{}: {}", part, error))
}

/// Parse an XML part into a tree. `part` names the part in error messages.
pub fn parse(part: &str, bytes: &[u8]) -> Result<Tree, TranslationError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().check_end_names = true;

    let mut tree = Tree::new();
    let mut open: Vec<NodeId> = Vec::new();

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| malformed(part, format!("at byte {}: {}", start, e)))?;
        let end = reader.buffer_position() as usize;
        let raw = bytes.get(start..end).unwrap_or_default().to_vec();
        let parent = open.last().copied();

        match event {
            Event::Start(tag) => {
                let mut element = element_from(part, &tag)?;
                element.raw_open = Some(raw);
                let id = tree.push(parent, NodeKind::Element(element));
                open.push(id);
            }
            Event::End(_) => {
                let id = open
                    .pop()
                    .ok_or_else(|| malformed(part, format!("unexpected closing tag at byte {}", start)))?;
                if let Some(NodeKind::Element(element)) = tree.kind_mut(id) {
                    element.raw_close = Some(raw);
                }
            }
            Event::Empty(tag) => {
                let mut element = element_from(part, &tag)?;
                element.raw_open = Some(raw);
                tree.push(parent, NodeKind::SelfClosing(element));
            }
            Event::Text(text) => {
                let decoded = text.unescape().map_err(|e| malformed(part, e))?.into_owned();
                tree.push(parent, NodeKind::Text(TextNode::verbatim(decoded, raw)));
            }
            Event::Eof => break,
            // declarations, comments, CDATA, processing instructions, doctypes
            _ => {
                tree.push(parent, NodeKind::Markup(raw));
            }
        }
    }

    if let Some(unclosed) = open.last() {
        let name = tree.element(*unclosed).map(|e| e.name.clone()).unwrap_or_default();
        return Err(malformed(part, format!("element <{}> is never closed", name)));
    }

    Ok(tree)
}

fn element_from(part: &str, tag: &BytesStart<'_>) -> Result<ElementNode, TranslationError> {
    let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attribute in tag.attributes() {
        let attribute = attribute.map_err(|e| malformed(part, e))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(|e| malformed(part, e))?.into_owned();
        attrs.push((key, value));
    }
    Ok(ElementNode::new(name, attrs))
}

/// Writes a tree back to XML, preferring source bytes wherever they survive
#[derive(Default)]
struct XmlWriter {
    out: Vec<u8>,
}

impl XmlWriter {
    fn write_tag(&mut self, element: &ElementNode, self_closing: bool) {
        self.out.push(b'<');
        self.out.extend_from_slice(element.name.as_bytes());
        for (key, value) in &element.attrs {
            self.out.push(b' ');
            self.out.extend_from_slice(key.as_bytes());
            self.out.extend_from_slice(b"=\"");
            self.out.extend_from_slice(quick_xml::escape::escape(value.as_str()).as_bytes());
            self.out.push(b'"');
        }
        self.out.extend_from_slice(if self_closing { b"/>" } else { b">" });
    }
}

impl TreeVisitor for XmlWriter {
    fn text(&mut self, _id: NodeId, node: &TextNode) {
        match node.raw() {
            Some(raw) => self.out.extend_from_slice(raw),
            None => self.out.extend_from_slice(partial_escape(node.text()).as_bytes()),
        }
    }

    fn open(&mut self, _id: NodeId, element: &ElementNode) {
        match &element.raw_open {
            Some(raw) => self.out.extend_from_slice(raw),
            None => self.write_tag(element, false),
        }
    }

    fn close(&mut self, _id: NodeId, element: &ElementNode) {
        match &element.raw_close {
            Some(raw) => self.out.extend_from_slice(raw),
            None => {
                self.out.extend_from_slice(b"</");
                self.out.extend_from_slice(element.name.as_bytes());
                self.out.push(b'>');
            }
        }
    }

    fn self_closing(&mut self, _id: NodeId, element: &ElementNode) {
        match &element.raw_open {
            Some(raw) => self.out.extend_from_slice(raw),
            None => self.write_tag(element, true),
        }
    }

    fn markup(&mut self, _id: NodeId, raw: &[u8]) {
        self.out.extend_from_slice(raw);
    }
}

/// Serialize a tree produced by `parse`
pub fn serialize(tree: &Tree) -> Vec<u8> {
    let mut writer = XmlWriter::default();
    tree.walk(&mut writer);
    writer.out
}
