/*!
 * Arena-backed node tree shared by every container format.
 *
 * Nodes live in a flat vector and refer to each other through `NodeId`
 * indices, so segments can point back at their origin without holding
 * references into the tree. A tree only knows four kinds of node; format
 * specific behaviour lives in the visitors that walk it.
 */

/// Index of a node inside its `Tree`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// Literal text, optionally with the exact bytes it was parsed from
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    text: String,
    raw: Option<Vec<u8>>,
}

impl TextNode {
    /// Text without a source representation; serializers escape it
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), raw: None }
    }

    /// Text that remembers its source bytes so unchanged text is written back verbatim
    pub fn verbatim(text: impl Into<String>, raw: Vec<u8>) -> Self {
        Self { text: text.into(), raw: Some(raw) }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Source bytes, dropped once the text is replaced
    pub fn raw(&self) -> Option<&[u8]> {
        self.raw.as_deref()
    }

    /// Replace the text. Returns false (and keeps the raw bytes) when nothing changes.
    pub fn replace(&mut self, text: &str) -> bool {
        if self.text == text {
            return false;
        }
        self.text = text.to_string();
        self.raw = None;
        true
    }
}

/// An element tag with its attributes and, for XML, its source bytes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementNode {
    /// Qualified name as written (`w:t`, `p`)
    pub name: String,
    /// Attributes in source order, values unescaped
    pub attrs: Vec<(String, String)>,
    /// Opening tag bytes (or the whole tag for self-closing nodes)
    pub raw_open: Option<Vec<u8>>,
    /// Closing tag bytes
    pub raw_close: Option<Vec<u8>>,
}

impl ElementNode {
    pub fn new(name: impl Into<String>, attrs: Vec<(String, String)>) -> Self {
        Self {
            name: name.into(),
            attrs,
            raw_open: None,
            raw_close: None,
        }
    }

    /// Name without its namespace prefix
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Attribute value by qualified name, falling back to the local name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .or_else(|| self.attrs.iter().find(|(key, _)| local_part(key) == name))
            .map(|(_, value)| value.as_str())
    }
}

fn local_part(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// The closed set of node kinds
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Text(TextNode),
    Element(ElementNode),
    SelfClosing(ElementNode),
    /// Comments, declarations, doctypes, line endings: copied through untouched
    Markup(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
}

/// Callbacks for a depth-first walk. Every method defaults to a no-op.
pub trait TreeVisitor {
    fn text(&mut self, _id: NodeId, _node: &TextNode) {}
    fn open(&mut self, _id: NodeId, _element: &ElementNode) {}
    fn close(&mut self, _id: NodeId, _element: &ElementNode) {}
    fn self_closing(&mut self, _id: NodeId, _element: &ElementNode) {}
    fn markup(&mut self, _id: NodeId, _raw: &[u8]) {}
}

enum Step {
    Enter(NodeId),
    Leave(NodeId),
}

#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node as the last child of `parent`, or as a new root
    pub fn push(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            kind,
        });
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn kind_mut(&mut self, id: NodeId) -> Option<&mut NodeKind> {
        self.nodes.get_mut(id.0).map(|node| &mut node.kind)
    }

    /// Kind of the node stored at arena position `index`
    pub fn kind_at(&self, index: usize) -> Option<&NodeKind> {
        self.nodes.get(index).map(|node| &node.kind)
    }

    /// First element (in arena order) matching `predicate`
    pub fn find_element(&self, predicate: impl Fn(&ElementNode) -> bool) -> Option<NodeId> {
        (0..self.nodes.len())
            .map(NodeId)
            .find(|id| self.element(*id).is_some_and(&predicate))
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Element behind `id`, whether it has children or not
    pub fn element(&self, id: NodeId) -> Option<&ElementNode> {
        match &self.get(id)?.kind {
            NodeKind::Element(element) | NodeKind::SelfClosing(element) => Some(element),
            _ => None,
        }
    }

    /// Parent chain of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.get(id).and_then(|node| node.parent), move |current| {
            self.get(*current).and_then(|node| node.parent)
        })
    }

    /// Direct element children of `id`
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &ElementNode)> + '_ {
        self.get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(move |child| self.element(*child).map(|element| (*child, element)))
    }

    /// Text carried by a node: its own text, or the concatenated text children of an element
    pub fn text_of(&self, id: NodeId) -> String {
        match self.get(id).map(|node| &node.kind) {
            Some(NodeKind::Text(text)) => text.text().to_string(),
            Some(NodeKind::Element(_)) => self.nodes[id.0]
                .children
                .iter()
                .filter_map(|child| match &self.nodes[child.0].kind {
                    NodeKind::Text(text) => Some(text.text()),
                    _ => None,
                })
                .collect(),
            _ => String::new(),
        }
    }

    /// Replace the text at `id`.
    ///
    /// For an element the first text child receives the new text and any further
    /// text children are emptied. Returns whether anything changed.
    pub fn replace_text(&mut self, id: NodeId, text: &str) -> bool {
        let targets: Vec<NodeId> = match self.get(id).map(|node| &node.kind) {
            Some(NodeKind::Text(_)) => vec![id],
            Some(NodeKind::Element(_)) => self.nodes[id.0]
                .children
                .iter()
                .copied()
                .filter(|child| matches!(self.nodes[child.0].kind, NodeKind::Text(_)))
                .collect(),
            _ => return false,
        };

        let mut changed = false;
        for (position, target) in targets.into_iter().enumerate() {
            if let NodeKind::Text(node) = &mut self.nodes[target.0].kind {
                changed |= node.replace(if position == 0 { text } else { "" });
            }
        }
        changed
    }

    /// Number of element nodes, self-closing ones included
    pub fn element_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node.kind, NodeKind::Element(_) | NodeKind::SelfClosing(_)))
            .count()
    }

    /// Element names in document order
    pub fn element_names(&self) -> Vec<String> {
        struct Names(Vec<String>);
        impl TreeVisitor for Names {
            fn open(&mut self, _id: NodeId, element: &ElementNode) {
                self.0.push(element.name.clone());
            }
            fn self_closing(&mut self, _id: NodeId, element: &ElementNode) {
                self.0.push(element.name.clone());
            }
        }
        let mut names = Names(Vec::new());
        self.walk(&mut names);
        names.0
    }

    /// Element names with their attributes, in document order
    pub fn element_signatures(&self) -> Vec<String> {
        struct Signatures(Vec<String>);
        impl Signatures {
            fn push(&mut self, element: &ElementNode) {
                let mut signature = element.name.clone();
                for (key, value) in &element.attrs {
                    signature.push_str(&format!(" {}={:?}", key, value));
                }
                self.0.push(signature);
            }
        }
        impl TreeVisitor for Signatures {
            fn open(&mut self, _id: NodeId, element: &ElementNode) {
                self.push(element);
            }
            fn self_closing(&mut self, _id: NodeId, element: &ElementNode) {
                self.push(element);
            }
        }
        let mut signatures = Signatures(Vec::new());
        self.walk(&mut signatures);
        signatures.0
    }

    /// Depth-first walk in document order
    pub fn walk<V: TreeVisitor + ?Sized>(&self, visitor: &mut V) {
        let mut stack: Vec<Step> = self.roots.iter().rev().map(|id| Step::Enter(*id)).collect();

        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(id) => {
                    let node = &self.nodes[id.0];
                    match &node.kind {
                        NodeKind::Text(text) => visitor.text(id, text),
                        NodeKind::SelfClosing(element) => visitor.self_closing(id, element),
                        NodeKind::Markup(raw) => visitor.markup(id, raw),
                        NodeKind::Element(element) => {
                            visitor.open(id, element);
                            stack.push(Step::Leave(id));
                            stack.extend(node.children.iter().rev().map(|child| Step::Enter(*child)));
                        }
                    }
                }
                Step::Leave(id) => {
                    if let NodeKind::Element(element) = &self.nodes[id.0].kind {
                        visitor.close(id, element);
                    }
                }
            }
        }
    }
}
