/*!
 * Segment extraction.
 *
 * Walks every tree of a parsed container in document order and turns each
 * translatable text node into a `Segment` that points back at the node it
 * came from. Extraction never touches the network and is deterministic.
 */

use log::debug;

use crate::document::{
    ArchiveFlavor, ArchiveLimits, Document, ElementNode, NodeId, OriginRef, ParsedContainer,
    Segment, StyleHints, TextNode, Tree, TreeVisitor,
};
use crate::errors::TranslationError;

/// HTML elements whose text is code or metadata rather than prose
const HTML_SKIPPED: [&str; 4] = ["script", "style", "noscript", "template"];

/// Which text nodes of a tree are translatable
#[derive(Debug, Clone, Copy)]
enum TextScope {
    Archive(ArchiveFlavor),
    Html,
    Plain,
}

/// A parsed container together with the segments found in it
#[derive(Debug, Clone)]
pub struct Extraction {
    pub container: ParsedContainer,
    pub segments: Vec<Segment>,
}

/// Parse `document` and extract its segments.
///
/// Fails with `MalformedDocument` when the container does not parse and with
/// `NoTranslatableContent` when no segment is found.
pub fn extract(document: &Document, limits: &ArchiveLimits) -> Result<Extraction, TranslationError> {
    let container = ParsedContainer::parse(document, limits)?;
    let segments = collect_segments(&container);
    if segments.is_empty() {
        return Err(TranslationError::NoTranslatableContent);
    }
    debug!("Extracted {} segments from {} document", segments.len(), document.kind);
    Ok(Extraction { container, segments })
}

/// Segments of an already parsed container, in document order
pub fn collect_segments(container: &ParsedContainer) -> Vec<Segment> {
    let scope = match container {
        ParsedContainer::Archive(package) => TextScope::Archive(package.flavor),
        ParsedContainer::Html(_) => TextScope::Html,
        ParsedContainer::Plain(_) => TextScope::Plain,
    };

    let mut segments = Vec::new();
    for part in 0..container.tree_count() {
        if let Some(tree) = container.tree(part) {
            let mut collector = SegmentCollector {
                tree,
                part,
                scope,
                segments: &mut segments,
            };
            tree.walk(&mut collector);
        }
    }
    segments
}

struct SegmentCollector<'a> {
    tree: &'a Tree,
    part: usize,
    scope: TextScope,
    segments: &'a mut Vec<Segment>,
}

impl SegmentCollector<'_> {
    fn in_scope(&self, id: NodeId) -> bool {
        match self.scope {
            TextScope::Plain => true,
            TextScope::Html => !self.tree.ancestors(id).any(|ancestor| {
                self.tree
                    .element(ancestor)
                    .is_some_and(|e| HTML_SKIPPED.contains(&e.name.as_str()))
            }),
            TextScope::Archive(flavor) => self
                .tree
                .get(id)
                .and_then(|node| node.parent)
                .and_then(|parent| self.tree.element(parent))
                .is_some_and(|element| flavor.is_run_text(element)),
        }
    }

    fn style(&self, id: NodeId) -> StyleHints {
        match self.scope {
            TextScope::Plain => StyleHints::default(),
            TextScope::Html => html_style(self.tree, id),
            TextScope::Archive(_) => archive_style(self.tree, id),
        }
    }
}

impl TreeVisitor for SegmentCollector<'_> {
    fn text(&mut self, id: NodeId, node: &TextNode) {
        if node.text().trim().is_empty() || !self.in_scope(id) {
            return;
        }
        let origin = OriginRef { part: self.part, node: id };
        let segment = Segment::from_node_text(self.segments.len(), node.text(), origin, self.style(id));
        self.segments.push(segment);
    }
}

fn html_style(tree: &Tree, id: NodeId) -> StyleHints {
    let mut style = StyleHints::default();
    for element in tree.ancestors(id).filter_map(|ancestor| tree.element(ancestor)) {
        match element.name.as_str() {
            "b" | "strong" => style.bold = true,
            "i" | "em" => style.italic = true,
            "u" | "ins" => style.underline = true,
            name => {
                if style.heading_level.is_none() {
                    style.heading_level = html_heading_level(name);
                }
            }
        }
    }
    style
}

fn html_heading_level(name: &str) -> Option<u8> {
    let digit = name.strip_prefix('h')?;
    match digit.parse::<u8>() {
        Ok(level @ 1..=6) => Some(level),
        _ => None,
    }
}

fn child_named<'t>(tree: &'t Tree, id: NodeId, local: &str) -> Option<(NodeId, &'t ElementNode)> {
    tree.child_elements(id).find(|(_, element)| element.local_name() == local)
}

/// A toggle property such as `<w:b/>` or `<w:b w:val="0"/>`
fn toggle_on(element: &ElementNode) -> bool {
    !matches!(element.attr("val"), Some("0") | Some("false") | Some("off") | Some("none"))
}

fn attribute_on(element: &ElementNode, name: &str) -> Option<bool> {
    element
        .attr(name)
        .map(|value| !matches!(value, "0" | "false" | "none"))
}

fn archive_style(tree: &Tree, id: NodeId) -> StyleHints {
    let mut style = StyleHints::default();
    for ancestor in tree.ancestors(id) {
        let Some(element) = tree.element(ancestor) else {
            continue;
        };
        match element.local_name() {
            "r" => apply_run_properties(tree, ancestor, &mut style),
            "p" if style.heading_level.is_none() => style.heading_level = paragraph_heading(tree, ancestor),
            "sp" if style.heading_level.is_none() => style.heading_level = shape_heading(tree, ancestor),
            _ => {}
        }
    }
    style
}

/// Run properties: child elements in word and spreadsheet parts, attributes in presentations
fn apply_run_properties(tree: &Tree, run: NodeId, style: &mut StyleHints) {
    let Some((properties_id, properties)) = child_named(tree, run, "rPr") else {
        return;
    };

    if let Some(on) = attribute_on(properties, "b") {
        style.bold = on;
    }
    if let Some(on) = attribute_on(properties, "i") {
        style.italic = on;
    }
    if let Some(on) = attribute_on(properties, "u") {
        style.underline = on;
    }

    for (_, property) in tree.child_elements(properties_id) {
        match property.local_name() {
            "b" => style.bold = toggle_on(property),
            "i" => style.italic = toggle_on(property),
            "u" => style.underline = toggle_on(property),
            _ => {}
        }
    }
}

/// Heading level from a word paragraph style (`Heading2`, `Title`)
fn paragraph_heading(tree: &Tree, paragraph: NodeId) -> Option<u8> {
    let (properties, _) = child_named(tree, paragraph, "pPr")?;
    let (_, style) = child_named(tree, properties, "pStyle")?;
    let name = style.attr("val")?.to_ascii_lowercase();
    if name == "title" {
        return Some(1);
    }
    let level = name.strip_prefix("heading")?.trim().parse::<u8>().ok()?;
    (1..=9).contains(&level).then_some(level)
}

/// Title placeholders of a slide shape count as a top-level heading
fn shape_heading(tree: &Tree, shape: NodeId) -> Option<u8> {
    let (non_visual, _) = child_named(tree, shape, "nvSpPr")?;
    let (properties, _) = child_named(tree, non_visual, "nvPr")?;
    let (_, placeholder) = child_named(tree, properties, "ph")?;
    matches!(placeholder.attr("type"), Some("title") | Some("ctrTitle")).then_some(1)
}
