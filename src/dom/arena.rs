//! Arena-allocated HTML tree.
//!
//! Nodes live in one contiguous vector and link to each other by index. Nodes
//! removed from the tree stay allocated but become unreachable from the
//! document root, so `NodeId`s handed out earlier never dangle.

use html5ever::{LocalName, Namespace, QualName};

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value for no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this is a valid node ID.
    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    /// Check if this is the sentinel value.
    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Node payload.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root.
    Document,
    /// Element with name and attributes (in source order).
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
    },
    /// Character data, stored unescaped.
    Text(String),
    /// Comment.
    Comment(String),
    /// Document type declaration.
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    /// Raw template-engine markup. Serialized verbatim, never escaped.
    Template(String),
}

/// HTML attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

/// A node in the arena.
#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Arena-based DOM tree.
#[derive(Debug)]
pub struct Arena {
    nodes: Vec<Node>,
    document: NodeId,
}

impl Arena {
    /// Create a new empty tree with a document root.
    pub fn new() -> Self {
        let mut arena = Self {
            nodes: Vec::new(),
            document: NodeId::NONE,
        };
        arena.document = arena.alloc(Node::new(NodeData::Document));
        arena
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the document root ID.
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    /// Get a mutable node by ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        self.alloc(Node::new(NodeData::Element { name, attrs }))
    }

    pub fn create_text(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text)))
    }

    pub fn create_comment(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text)))
    }

    pub fn create_template(&mut self, markup: String) -> NodeId {
        self.alloc(Node::new(NodeData::Template(markup)))
    }

    pub fn create_doctype(&mut self, name: String, public_id: String, system_id: String) -> NodeId {
        self.alloc(Node::new(NodeData::Doctype {
            name,
            public_id,
            system_id,
        }))
    }

    /// Append a child to a parent node.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
            child_node.next_sibling = NodeId::NONE;
        }

        if last_child.is_some()
            && let Some(last_node) = self.get_mut(last_child)
        {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert a node before a sibling.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let (parent, prev) = match self.get(sibling) {
            Some(n) => (n.parent, n.prev_sibling),
            None => return,
        };

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Insert a node right after a sibling.
    pub fn insert_after(&mut self, sibling: NodeId, new_node: NodeId) {
        let (parent, next) = match self.get(sibling) {
            Some(n) => (n.parent, n.next_sibling),
            None => return,
        };

        if next.is_some() {
            self.insert_before(next, new_node);
        } else if parent.is_some() {
            self.append(parent, new_node);
        }
    }

    /// Insert a node as the first child of `parent`.
    pub fn prepend(&mut self, parent: NodeId, child: NodeId) {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(NodeId::NONE);

        if first.is_some() {
            self.insert_before(first, child);
        } else {
            self.append(parent, child);
        }
    }

    /// Unlink a node (and its subtree) from its parent.
    pub fn detach(&mut self, target: NodeId) {
        let (parent, prev, next) = match self.get(target) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(target) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Append text to the last child if it is a text node, or create one.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text.to_string());
        self.append(parent, text_node);
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(NodeId::NONE);
        Children {
            arena: self,
            current: first,
        }
    }

    /// All nodes reachable below `root` (excluded), in document order.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children: Vec<_> = self.children(id).collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }
}

#[cfg(test)]
impl Arena {
    /// First element named `tag`, in document order.
    pub(crate) fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.document)
            .into_iter()
            .find(|&id| self.element_name(id).is_some_and(|n| n.as_ref() == tag))
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct Children<'a> {
    arena: &'a Arena,
    current: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .arena
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(NodeId::NONE);
        Some(id)
    }
}

/// Element accessors.
impl Arena {
    /// Get element's qualified name.
    pub fn qual_name(&self, id: NodeId) -> Option<&QualName> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(name),
            _ => None,
        })
    }

    /// Get element's local name (tag).
    pub fn element_name(&self, id: NodeId) -> Option<&LocalName> {
        self.qual_name(id).map(|name| &name.local)
    }

    pub fn element_namespace(&self, id: NodeId) -> Option<&Namespace> {
        self.qual_name(id).map(|name| &name.ns)
    }

    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        self.get(id)
            .and_then(|n| match &n.data {
                NodeData::Element { attrs, .. } => Some(attrs.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Get an attribute value.
    pub fn get_attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.name.local.as_ref() == attr_name)
            .map(|a| a.value.as_str())
    }

    /// Replace the value of an existing attribute, or add it at the end.
    pub fn set_attr(&mut self, id: NodeId, attr_name: &str, value: String) {
        if let Some(node) = self.get_mut(id)
            && let NodeData::Element { attrs, .. } = &mut node.data
        {
            match attrs.iter_mut().find(|a| a.name.local.as_ref() == attr_name) {
                Some(attr) => attr.value = value,
                None => attrs.push(Attribute {
                    name: QualName::new(None, html5ever::ns!(), LocalName::from(attr_name)),
                    value,
                }),
            }
        }
    }

    /// Remove an attribute and return its value.
    pub fn take_attr(&mut self, id: NodeId, attr_name: &str) -> Option<String> {
        let node = self.get_mut(id)?;
        let NodeData::Element { attrs, .. } = &mut node.data else {
            return None;
        };
        let pos = attrs.iter().position(|a| a.name.local.as_ref() == attr_name)?;
        Some(attrs.remove(pos).value)
    }

    /// Get element's id attribute.
    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.get_attr(id, "id")
    }

    /// Iterate over the element's classes.
    pub fn element_classes(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.get_attr(id, "class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Element { .. }))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| matches!(n.data, NodeData::Text(_)))
    }

    /// Text of a text node.
    pub fn text_content(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Mutable text of a text node.
    pub fn text_content_mut(&mut self, id: NodeId) -> Option<&mut String> {
        self.get_mut(id).and_then(|n| match &mut n.data {
            NodeData::Text(s) => Some(s),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use html5ever::ns;

    use super::*;

    fn make_qname(local: &str) -> QualName {
        QualName::new(None, ns!(html), LocalName::from(local))
    }

    fn child_markup(arena: &Arena, parent: NodeId) -> Vec<String> {
        arena
            .children(parent)
            .map(|c| match &arena.get(c).unwrap().data {
                NodeData::Element { name, .. } => name.local.to_string(),
                NodeData::Template(t) | NodeData::Text(t) => t.clone(),
                _ => String::new(),
            })
            .collect()
    }

    #[test]
    fn test_append_children() {
        let mut arena = Arena::new();

        let parent = arena.create_element(make_qname("div"), vec![]);
        let child1 = arena.create_element(make_qname("p"), vec![]);
        let child2 = arena.create_element(make_qname("p"), vec![]);

        arena.append(arena.document(), parent);
        arena.append(parent, child1);
        arena.append(parent, child2);

        let children: Vec<_> = arena.children(parent).collect();
        assert_eq!(children, vec![child1, child2]);
    }

    #[test]
    fn test_insert_around() {
        let mut arena = Arena::new();
        let div = arena.create_element(make_qname("div"), vec![]);
        let p = arena.create_element(make_qname("p"), vec![]);
        arena.append(arena.document(), div);
        arena.append(div, p);

        let open = arena.create_template("{% if x %}".into());
        let close = arena.create_template("{% endif %}".into());
        arena.insert_before(p, open);
        arena.insert_after(p, close);

        assert_eq!(child_markup(&arena, div), ["{% if x %}", "p", "{% endif %}"]);
        assert_eq!(arena.get(div).unwrap().first_child, open);
        assert_eq!(arena.get(div).unwrap().last_child, close);
    }

    #[test]
    fn test_prepend_and_detach() {
        let mut arena = Arena::new();
        let span = arena.create_element(make_qname("span"), vec![]);
        arena.append(arena.document(), span);
        arena.append_text(span, "tail");

        let head = arena.create_template("{ user.name }".into());
        arena.prepend(span, head);
        assert_eq!(child_markup(&arena, span), ["{ user.name }", "tail"]);

        arena.detach(head);
        assert_eq!(child_markup(&arena, span), ["tail"]);
        assert!(arena.get(head).unwrap().parent.is_none());

        arena.detach(span);
        assert!(arena.children(arena.document()).next().is_none());
    }

    #[test]
    fn test_attribute_ops() {
        let mut arena = Arena::new();
        let a = arena.create_element(
            make_qname("a"),
            vec![Attribute {
                name: QualName::new(None, ns!(), LocalName::from("dj-if")),
                value: "user".into(),
            }],
        );

        assert_eq!(arena.get_attr(a, "dj-if"), Some("user"));
        assert_eq!(arena.take_attr(a, "dj-if").as_deref(), Some("user"));
        assert_eq!(arena.take_attr(a, "dj-if"), None);

        arena.set_attr(a, "href", "/x".into());
        arena.set_attr(a, "href", "/y".into());
        assert_eq!(arena.attrs(a).len(), 1);
        assert_eq!(arena.get_attr(a, "href"), Some("/y"));
    }

    #[test]
    fn test_text_merging() {
        let mut arena = Arena::new();

        let p = arena.create_element(make_qname("p"), vec![]);
        arena.append(arena.document(), p);

        arena.append_text(p, "Hello, ");
        arena.append_text(p, "World!");

        let children: Vec<_> = arena.children(p).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(arena.text_content(children[0]), Some("Hello, World!"));
    }
}
