/*!
 * HTML parsing and serialization.
 *
 * html5ever builds the DOM, which is then copied into the node arena so the
 * rest of the pipeline never touches reference-counted DOM handles.
 */

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, CommentToken, StartTag, Tag, TagToken, Token, TokenSink, TokenSinkResult, Tokenizer,
    TokenizerResult,
};
use html5ever::{LocalName, QualName, namespace_url, ns, parse_document, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::cell::{Cell, RefCell};

use crate::errors::TranslationError;

use super::tree::{ElementNode, NodeId, NodeKind, TextNode, Tree, TreeVisitor};

/// Elements that never have children or a closing tag
const VOID_ELEMENTS: [&str; 15] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose text content is written without escaping
const RAW_TEXT_ELEMENTS: [&str; 8] = [
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

/// Input that carries its own document wrapper, possibly after comments
static DOCUMENT_START: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"^\s*(?:<!--.*?-->\s*)*<(?:!doctype|html|head|body)[\s>/]")
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .expect("document start pattern")
});

/// Whether the input was a bare fragment or carried its own document wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlShape {
    Fragment,
    FullDocument,
}

/// A parsed HTML input
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    pub tree: Tree,
    pub shape: HtmlShape,
}

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

pub fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}

fn detect_shape(source: &str) -> HtmlShape {
    if DOCUMENT_START.is_match(source) {
        HtmlShape::FullDocument
    } else {
        HtmlShape::Fragment
    }
}

fn malformed(message: impl Into<String>) -> TranslationError {
    TranslationError::MalformedDocument(message.into())
}

/// Parse HTML bytes.
///
/// Fragments are parsed in a `template` context, which accepts table rows,
/// cells and head content anywhere. Input the tree builder would rewrite by
/// dropping tags or comments is rejected as malformed.
pub fn parse(bytes: &[u8]) -> Result<HtmlDocument, TranslationError> {
    let source = std::str::from_utf8(bytes).map_err(|e| malformed(format!("html is not valid UTF-8: {}", e)))?;
    let shape = detect_shape(source);

    let mut tree = Tree::new();
    match shape {
        HtmlShape::FullDocument => {
            let dom = parse_document(RcDom::default(), Default::default())
                .from_utf8()
                .read_from(&mut source.as_bytes())
                .map_err(|e| malformed(format!("html: {}", e)))?;
            for child in dom.document.children.borrow().iter() {
                copy_node(child, None, &mut tree);
            }
        }
        HtmlShape::Fragment => {
            let context = QualName::new(None, ns!(html), LocalName::from("template"));
            let dom = parse_fragment(RcDom::default(), Default::default(), context, Vec::new())
                .from_utf8()
                .read_from(&mut source.as_bytes())
                .map_err(|e| malformed(format!("html: {}", e)))?;
            // the fragment lands under a synthetic html root
            for root in dom.document.children.borrow().iter() {
                for child in root.children.borrow().iter() {
                    copy_node(child, None, &mut tree);
                }
            }
        }
    }

    check_nothing_dropped(source, &tree)?;
    Ok(HtmlDocument { tree, shape })
}

/// Attribute name as written, `xlink:href` included
fn attribute_name(name: &QualName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{}:{}", prefix, name.local),
        None => name.local.to_string(),
    }
}

fn copy_node(handle: &Handle, parent: Option<NodeId>, tree: &mut Tree) {
    match &handle.data {
        NodeData::Doctype { name, .. } => {
            tree.push(parent, NodeKind::Markup(format!("<!DOCTYPE {}>", name).into_bytes()));
        }
        NodeData::Text { contents } => {
            tree.push(parent, NodeKind::Text(TextNode::new(contents.borrow().to_string())));
        }
        NodeData::Comment { contents } => {
            tree.push(parent, NodeKind::Markup(format!("<!--{}-->", contents).into_bytes()));
        }
        NodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            let attrs: Vec<(String, String)> = attrs
                .borrow()
                .iter()
                .map(|attr| (attribute_name(&attr.name), attr.value.to_string()))
                .collect();
            let element = ElementNode::new(name.local.to_string(), attrs);
            if is_void_element(&element.name) {
                tree.push(parent, NodeKind::SelfClosing(element));
                return;
            }
            let id = tree.push(parent, NodeKind::Element(element));
            // template children live in a separate fragment
            if let Some(contents) = template_contents.borrow().as_ref() {
                for child in contents.children.borrow().iter() {
                    copy_node(child, Some(id), tree);
                }
            }
            for child in handle.children.borrow().iter() {
                copy_node(child, Some(id), tree);
            }
        }
        NodeData::Document | NodeData::ProcessingInstruction { .. } => {}
    }
}

/// Start tags and comments as the tokenizer sees them in the source
#[derive(Default)]
struct SourceTokens {
    start_tags: RefCell<Vec<String>>,
    comments: Cell<usize>,
}

impl TokenSink for SourceTokens {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            TagToken(Tag {
                kind: StartTag, name, ..
            }) => {
                let result = match &*name {
                    "script" => TokenSinkResult::RawData(RawKind::ScriptData),
                    "title" | "textarea" => TokenSinkResult::RawData(RawKind::Rcdata),
                    "plaintext" => TokenSinkResult::Plaintext,
                    other if is_raw_text_element(other) => TokenSinkResult::RawData(RawKind::Rawtext),
                    _ => TokenSinkResult::Continue,
                };
                self.start_tags.borrow_mut().push(name.to_ascii_lowercase().to_string());
                result
            }
            CommentToken(_) => {
                self.comments.set(self.comments.get() + 1);
                TokenSinkResult::Continue
            }
            _ => TokenSinkResult::Continue,
        }
    }
}

fn tokenize(source: &str) -> SourceTokens {
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(source));
    let tokenizer = Tokenizer::new(SourceTokens::default(), Default::default());
    while let TokenizerResult::Script(()) = tokenizer.feed(&input) {}
    tokenizer.end();
    tokenizer.sink
}

/// Number of comment nodes in `tree`
pub fn comment_count(tree: &Tree) -> usize {
    struct Comments(usize);
    impl TreeVisitor for Comments {
        fn markup(&mut self, _id: NodeId, raw: &[u8]) {
            if raw.starts_with(b"<!--") {
                self.0 += 1;
            }
        }
    }
    let mut comments = Comments(0);
    tree.walk(&mut comments);
    comments.0
}

/// Every start tag of the source must survive, in order, and no comment may be lost.
/// The tree builder may add implied elements such as `tbody`.
fn check_nothing_dropped(source: &str, tree: &Tree) -> Result<(), TranslationError> {
    let tokens = tokenize(source);
    let parsed: Vec<String> = tree.element_names().iter().map(|name| name.to_ascii_lowercase()).collect();

    let mut remaining = parsed.iter();
    for tag in tokens.start_tags.borrow().iter() {
        if !remaining.any(|name| name == tag) {
            return Err(malformed(format!("html structure cannot be preserved: <{}> is dropped or moved", tag)));
        }
    }

    let comments = comment_count(tree);
    if comments != tokens.comments.get() {
        return Err(malformed(format!(
            "html structure cannot be preserved: {} of {} comments kept",
            comments,
            tokens.comments.get()
        )));
    }
    Ok(())
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            other => out.push(other),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            other => out.push(other),
        }
    }
}

#[derive(Default)]
struct HtmlWriter {
    out: String,
    open: Vec<String>,
}

impl HtmlWriter {
    fn write_tag(&mut self, element: &ElementNode) {
        self.out.push('<');
        self.out.push_str(&element.name);
        for (key, value) in &element.attrs {
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            escape_attribute(value, &mut self.out);
            self.out.push('"');
        }
        self.out.push('>');
    }
}

impl TreeVisitor for HtmlWriter {
    fn text(&mut self, _id: NodeId, node: &TextNode) {
        let raw_parent = self.open.last().is_some_and(|name| is_raw_text_element(name));
        if raw_parent {
            self.out.push_str(node.text());
        } else {
            escape_text(node.text(), &mut self.out);
        }
    }

    fn open(&mut self, _id: NodeId, element: &ElementNode) {
        self.write_tag(element);
        self.open.push(element.name.clone());
    }

    fn close(&mut self, _id: NodeId, element: &ElementNode) {
        self.open.pop();
        self.out.push_str("</");
        self.out.push_str(&element.name);
        self.out.push('>');
    }

    fn self_closing(&mut self, _id: NodeId, element: &ElementNode) {
        self.write_tag(element);
    }

    fn markup(&mut self, _id: NodeId, raw: &[u8]) {
        self.out.push_str(&String::from_utf8_lossy(raw));
    }
}

/// Serialize an arena tree back to HTML markup
pub fn serialize(tree: &Tree) -> Vec<u8> {
    let mut writer = HtmlWriter::default();
    tree.walk(&mut writer);
    writer.out.into_bytes()
}
