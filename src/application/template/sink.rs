//! html5ever `TreeSink` that builds a [`NodeTree`].

use std::{borrow::Cow, cell::RefCell, rc::Rc};

use html5ever::{
    Attribute as ParsedAttribute, QualName,
    tendril::StrTendril,
    tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink},
};

use super::tree::{Attribute, NodeData, NodeId, NodeTree, empty_name};

/// Node handle handed to the tree builder. Element handles carry their own
/// name so `elem_name` can hand out a reference without borrowing the arena.
#[derive(Debug, Clone)]
pub(crate) struct SinkHandle {
    id: NodeId,
    name: Option<Rc<QualName>>,
}

impl SinkHandle {
    fn node(id: NodeId) -> Self {
        Self { id, name: None }
    }
}

#[derive(Debug, Default)]
pub(crate) struct TreeBuilderSink {
    tree: RefCell<NodeTree>,
}

impl TreeBuilderSink {
    fn insert(&self, parent: NodeId, child: NodeOrText<SinkHandle>) {
        let mut tree = self.tree.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => tree.append(parent, node.id),
            NodeOrText::AppendText(text) => tree.append_text(parent, &text),
        }
    }
}

fn convert_attrs(attrs: Vec<ParsedAttribute>) -> Vec<Attribute> {
    attrs
        .into_iter()
        .map(|attr| Attribute {
            name: attr.name,
            value: attr.value.to_string(),
        })
        .collect()
}

impl TreeSink for TreeBuilderSink {
    type Handle = SinkHandle;
    type Output = NodeTree;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        let mut tree = self.tree.into_inner();
        tree.reindex();
        tree
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {}

    fn get_document(&self) -> Self::Handle {
        SinkHandle::node(NodeId::DOCUMENT)
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        target.name.as_deref().unwrap_or_else(|| empty_name())
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<ParsedAttribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let id = self.tree.borrow_mut().create(NodeData::Element {
            name: name.clone(),
            attrs: convert_attrs(attrs),
        });
        SinkHandle {
            id,
            name: Some(Rc::new(name)),
        }
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        let id = self
            .tree
            .borrow_mut()
            .create(NodeData::Comment(text.to_string()));
        SinkHandle::node(id)
    }

    fn create_pi(&self, _target: StrTendril, data: StrTendril) -> Self::Handle {
        self.create_comment(data)
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        self.insert(parent.id, child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let attached = self.tree.borrow().parent(element.id).is_some();
        if attached {
            self.append_before_sibling(element, child);
        } else {
            self.insert(prev_element.id, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        let mut tree = self.tree.borrow_mut();
        let doctype = tree.create(NodeData::Doctype {
            name: name.to_string(),
        });
        tree.append(NodeId::DOCUMENT, doctype);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x.id == y.id
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut tree = self.tree.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => tree.insert_before(sibling.id, node.id),
            NodeOrText::AppendText(text) => tree.insert_text_before(sibling.id, &text),
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<ParsedAttribute>) {
        self.tree
            .borrow_mut()
            .add_attrs_if_missing(target.id, convert_attrs(attrs));
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.tree.borrow_mut().unlink(target.id);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        self.tree
            .borrow_mut()
            .reparent_children(node.id, new_parent.id);
    }
}
