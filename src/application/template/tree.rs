//! Queryable HTML tree used by the template pipeline.
//!
//! Nodes live in a flat arena addressed by [`NodeId`]. After parsing, every
//! attached element is registered in a tag index so selections by tag name
//! never walk the tree. The tree serializes back to HTML through html5ever's
//! serializer, which keeps attribute order and therefore output stable.

use std::{collections::HashMap, io};

use html5ever::{
    LocalName, ParseOpts, QualName, local_name, ns, parse_document,
    serialize::{Serialize, SerializeOpts, Serializer, TraversalScope, serialize},
    tendril::TendrilSink,
};
use thiserror::Error;

use super::sink::TreeBuilderSink;

/// Index of a node inside a [`NodeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) const DOCUMENT: NodeId = NodeId(0);
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeParseError {
    #[error("document is empty")]
    Empty,
    #[error("document has no root element")]
    MissingRoot,
}

#[derive(Debug, Clone)]
pub(crate) struct Attribute {
    pub(crate) name: QualName,
    pub(crate) value: String,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Document,
    Doctype { name: String },
    Element { name: QualName, attrs: Vec<Attribute> },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct NodeTree {
    nodes: Vec<Node>,
    by_tag: HashMap<LocalName, Vec<NodeId>>,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
            by_tag: HashMap::new(),
        }
    }

    /// Parse an HTML document. Blank input, or input that yields no root
    /// element, is rejected.
    pub fn parse(html: &str) -> Result<Self, TreeParseError> {
        if html.trim().is_empty() {
            return Err(TreeParseError::Empty);
        }

        let tree = parse_document(TreeBuilderSink::default(), ParseOpts::default())
            .from_utf8()
            .one(html.as_bytes());

        if tree.root_element().is_none() {
            return Err(TreeParseError::MissingRoot);
        }
        Ok(tree)
    }

    /// The first element directly under the document node.
    pub fn root_element(&self) -> Option<NodeId> {
        self.node(NodeId::DOCUMENT)
            .children
            .iter()
            .copied()
            .find(|id| matches!(self.node(*id).data, NodeData::Element { .. }))
    }

    /// Elements with the given tag name, in document order.
    pub fn select(&self, tag: &str) -> Selection<'_> {
        let ids = self
            .by_tag
            .get(&LocalName::from(tag.to_ascii_lowercase()))
            .cloned()
            .unwrap_or_default();
        Selection { tree: self, ids }
    }

    pub fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        match self.nodes.get(id.0)?.data {
            NodeData::Element { .. } => Some(ElementRef { tree: self, id }),
            _ => None,
        }
    }

    /// Append a new HTML element, with optional text content, as the last
    /// child of `parent`.
    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: &[(&str, &str)],
        text: Option<&str>,
    ) -> NodeId {
        let name = QualName::new(None, ns!(html), LocalName::from(tag));
        let attrs = attrs
            .iter()
            .map(|(name, value)| Attribute {
                name: QualName::new(None, ns!(), LocalName::from(*name)),
                value: (*value).to_string(),
            })
            .collect();

        let element = self.create(NodeData::Element { name, attrs });
        self.append(parent, element);
        if let Some(text) = text {
            self.append_text(element, text);
        }
        self.reindex();
        element
    }

    /// Detach a node, and its subtree, from the document.
    #[cfg(test)]
    pub(crate) fn detach(&mut self, id: NodeId) {
        self.unlink(id);
        self.reindex();
    }

    /// Serialize the whole document back to HTML.
    pub fn to_html(&self) -> io::Result<String> {
        let mut bytes = Vec::new();
        serialize(&mut bytes, self, SerializeOpts::default())?;
        String::from_utf8(bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn create(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    pub(crate) fn append(&mut self, parent: NodeId, child: NodeId) {
        self.unlink(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Append text, merging into a trailing text node when there is one.
    pub(crate) fn append_text(&mut self, parent: NodeId, text: &str) {
        if let Some(&last) = self.nodes[parent.0].children.last()
            && let NodeData::Text(existing) = &mut self.nodes[last.0].data
        {
            existing.push_str(text);
            return;
        }
        let node = self.create(NodeData::Text(text.to_string()));
        self.append(parent, node);
    }

    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub(crate) fn insert_before(&mut self, sibling: NodeId, child: NodeId) {
        let Some(parent) = self.node(sibling).parent else {
            return;
        };
        self.unlink(child);
        let siblings = &mut self.nodes[parent.0].children;
        let position = siblings
            .iter()
            .position(|id| *id == sibling)
            .unwrap_or(siblings.len());
        siblings.insert(position, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Insert text before `sibling`, merging into a preceding text node.
    pub(crate) fn insert_text_before(&mut self, sibling: NodeId, text: &str) {
        let Some(parent) = self.node(sibling).parent else {
            return;
        };
        let siblings = &self.nodes[parent.0].children;
        let previous = siblings
            .iter()
            .position(|id| *id == sibling)
            .and_then(|position| position.checked_sub(1))
            .map(|position| siblings[position]);

        if let Some(previous) = previous
            && let NodeData::Text(existing) = &mut self.nodes[previous.0].data
        {
            existing.push_str(text);
            return;
        }
        let node = self.create(NodeData::Text(text.to_string()));
        self.insert_before(sibling, node);
    }

    pub(crate) fn add_attrs_if_missing(&mut self, id: NodeId, extra: Vec<Attribute>) {
        if let NodeData::Element { attrs, .. } = &mut self.nodes[id.0].data {
            for attr in extra {
                if !attrs.iter().any(|existing| existing.name == attr.name) {
                    attrs.push(attr);
                }
            }
        }
    }

    pub(crate) fn reparent_children(&mut self, from: NodeId, to: NodeId) {
        let children = std::mem::take(&mut self.nodes[from.0].children);
        for child in children {
            self.nodes[child.0].parent = Some(to);
            self.nodes[to.0].children.push(child);
        }
    }

    pub(crate) fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    pub(crate) fn unlink(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    /// Rebuild the tag index from the nodes reachable from the document.
    pub(crate) fn reindex(&mut self) {
        let mut by_tag: HashMap<LocalName, Vec<NodeId>> = HashMap::new();
        let mut pending = vec![NodeId::DOCUMENT];
        while let Some(id) = pending.pop() {
            let node = self.node(id);
            if let NodeData::Element { name, .. } = &node.data {
                by_tag.entry(name.local.clone()).or_default().push(id);
            }
            pending.extend(node.children.iter().rev().copied());
        }
        self.by_tag = by_tag;
    }
}

enum Step<'a> {
    Open(NodeId),
    Close(&'a QualName),
}

impl Serialize for NodeTree {
    fn serialize<S: Serializer>(
        &self,
        serializer: &mut S,
        _traversal_scope: TraversalScope,
    ) -> io::Result<()> {
        let mut steps: Vec<Step<'_>> = self
            .node(NodeId::DOCUMENT)
            .children
            .iter()
            .rev()
            .map(|id| Step::Open(*id))
            .collect();

        while let Some(step) = steps.pop() {
            let id = match step {
                Step::Close(name) => {
                    serializer.end_elem(name.clone())?;
                    continue;
                }
                Step::Open(id) => id,
            };

            let node = self.node(id);
            match &node.data {
                NodeData::Document => {}
                NodeData::Doctype { name } => serializer.write_doctype(name)?,
                NodeData::Text(text) => serializer.write_text(text)?,
                NodeData::Comment(text) => serializer.write_comment(text)?,
                NodeData::Element { name, attrs } => {
                    serializer.start_elem(
                        name.clone(),
                        attrs.iter().map(|attr| (&attr.name, attr.value.as_str())),
                    )?;
                    steps.push(Step::Close(name));
                    steps.extend(node.children.iter().rev().map(|child| Step::Open(*child)));
                }
            }
        }
        Ok(())
    }
}

/// An ordered set of elements selected from a [`NodeTree`].
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    tree: &'a NodeTree,
    ids: Vec<NodeId>,
}

impl<'a> Selection<'a> {
    /// Keep elements whose attribute `name` equals `value` exactly.
    pub fn filter_attr(mut self, name: &str, value: &str) -> Self {
        let tree = self.tree;
        self.ids.retain(|id| {
            tree.element(*id)
                .and_then(|element| element.attr(name))
                .is_some_and(|found| found == value)
        });
        self
    }

    pub fn first(&self) -> Option<ElementRef<'a>> {
        self.ids.first().and_then(|id| self.tree.element(*id))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ElementRef<'a>> + '_ {
        self.ids.iter().filter_map(|id| self.tree.element(*id))
    }
}

/// Read access to one element of a [`NodeTree`].
#[derive(Debug, Clone, Copy)]
pub struct ElementRef<'a> {
    tree: &'a NodeTree,
    id: NodeId,
}

impl<'a> ElementRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    fn parts(&self) -> Option<(&'a QualName, &'a [Attribute])> {
        match &self.tree.node(self.id).data {
            NodeData::Element { name, attrs } => Some((name, attrs.as_slice())),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'a str {
        self.parts()
            .map(|(name, _)| name.local.as_ref())
            .unwrap_or_default()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.attributes()
            .find(|(attr, _)| attr.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Attributes in source order.
    pub fn attributes(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.parts()
            .map(|(_, attrs)| attrs)
            .unwrap_or_default()
            .iter()
            .map(|attr| (attr.name.local.as_ref(), attr.value.as_str()))
    }

    /// Concatenated text of the element's direct text children.
    pub fn text(&self) -> String {
        self.tree
            .node(self.id)
            .children
            .iter()
            .filter_map(|child| match &self.tree.node(*child).data {
                NodeData::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

pub(crate) fn empty_name() -> &'static QualName {
    static EMPTY: QualName = QualName {
        prefix: None,
        ns: ns!(),
        local: local_name!(""),
    };
    &EMPTY
}
