/*!
 * Plain text containers: one text node per line, line endings kept as markup.
 */

use crate::errors::TranslationError;

use super::tree::{NodeId, NodeKind, TextNode, Tree, TreeVisitor};

pub fn parse(bytes: &[u8]) -> Result<Tree, TranslationError> {
    let source = std::str::from_utf8(bytes)
        .map_err(|e| TranslationError::MalformedDocument(format!("text is not valid UTF-8: {}", e)))?;

    let mut tree = Tree::new();
    for line in source.split_inclusive('\n') {
        let (content, ending) = match line.strip_suffix("\r\n") {
            Some(content) => (content, "\r\n"),
            None => match line.strip_suffix('\n') {
                Some(content) => (content, "\n"),
                None => (line, ""),
            },
        };
        tree.push(None, NodeKind::Text(TextNode::new(content)));
        if !ending.is_empty() {
            tree.push(None, NodeKind::Markup(ending.as_bytes().to_vec()));
        }
    }
    Ok(tree)
}

struct PlainWriter(Vec<u8>);

impl TreeVisitor for PlainWriter {
    fn text(&mut self, _id: NodeId, node: &TextNode) {
        self.0.extend_from_slice(node.text().as_bytes());
    }

    fn markup(&mut self, _id: NodeId, raw: &[u8]) {
        self.0.extend_from_slice(raw);
    }
}

pub fn serialize(tree: &Tree) -> Vec<u8> {
    let mut writer = PlainWriter(Vec::new());
    tree.walk(&mut writer);
    writer.0
}

/// Number of lines, counted as text nodes
pub fn line_count(tree: &Tree) -> usize {
    (0..tree.len())
        .filter(|i| matches!(tree.kind_at(*i), Some(NodeKind::Text(_))))
        .count()
}
