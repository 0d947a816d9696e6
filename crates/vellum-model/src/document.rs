//! Arena-backed element tree with ordered children and parent links.

use indexmap::IndexMap;
use smallvec::SmallVec;

/// Tag of the construct that flattens its children into the position of an
/// including document. The rendering engine never represents it directly,
/// which is what most of the reconciler's special cases are about.
pub const MERGE_TAG: &str = "merge";

/// Tag of the construct that embeds another document. Its rendered content
/// is a single opaque unit and never yields selectable children.
pub const INCLUDE_TAG: &str = "include";

/// Attribute of an `include` element naming the embedded document.
pub const ATTR_LAYOUT: &str = "layout";

/// Stable identity of an element within one [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub(crate) usize);

/// Static description of an element type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementDescriptor {
    /// Local tag name of the element.
    pub tag: String,
    /// Namespace the tag lives in, if any. Construct tags (`merge`,
    /// `include`) are only recognized without a namespace.
    pub namespace: Option<String>,
    /// Whether this element type may contain children.
    pub container: bool,
}

impl ElementDescriptor {
    pub fn container(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            namespace: None,
            container: true,
        }
    }

    pub fn widget(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            namespace: None,
            container: false,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    fn is_construct(&self, tag: &str) -> bool {
        self.namespace.is_none() && self.tag == tag
    }
}

struct ElementData {
    descriptor: ElementDescriptor,
    parent: Option<SourceId>,
    children: SmallVec<[SourceId; 8]>,
    attributes: IndexMap<String, String>,
}

/// The source document: an arena of elements addressed by [`SourceId`].
///
/// Insertion order of children is document order and is significant; the
/// reconciler's ordering predicates scan it directly.
#[derive(Default)]
pub struct Document {
    elements: Vec<ElementData>,
    root: Option<SourceId>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// The document root element, if one has been added.
    pub fn root(&self) -> Option<SourceId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Adds the root element. Panics if a root already exists.
    pub fn add_root(&mut self, descriptor: ElementDescriptor) -> SourceId {
        assert!(self.root.is_none(), "document already has a root");
        let id = self.push(descriptor, None);
        self.root = Some(id);
        id
    }

    /// Appends a child element in document order.
    pub fn add_child(&mut self, parent: SourceId, descriptor: ElementDescriptor) -> SourceId {
        let id = self.push(descriptor, Some(parent));
        self.elements[parent.0].children.push(id);
        id
    }

    pub fn set_attribute(
        &mut self,
        id: SourceId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.elements[id.0]
            .attributes
            .insert(name.into(), value.into());
    }

    fn push(&mut self, descriptor: ElementDescriptor, parent: Option<SourceId>) -> SourceId {
        let id = SourceId(self.elements.len());
        self.elements.push(ElementData {
            descriptor,
            parent,
            children: SmallVec::new(),
            attributes: IndexMap::new(),
        });
        id
    }

    pub fn descriptor(&self, id: SourceId) -> &ElementDescriptor {
        &self.elements[id.0].descriptor
    }

    /// Local tag name of the element.
    pub fn tag(&self, id: SourceId) -> &str {
        &self.elements[id.0].descriptor.tag
    }

    pub fn parent(&self, id: SourceId) -> Option<SourceId> {
        self.elements[id.0].parent
    }

    /// Children in document order.
    pub fn children(&self, id: SourceId) -> &[SourceId] {
        &self.elements[id.0].children
    }

    pub fn attribute(&self, id: SourceId, name: &str) -> Option<&str> {
        self.elements[id.0].attributes.get(name).map(String::as_str)
    }

    /// Attributes in insertion order.
    pub fn attributes(&self, id: SourceId) -> impl Iterator<Item = (&str, &str)> {
        self.elements[id.0]
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_merge(&self, id: SourceId) -> bool {
        self.elements[id.0].descriptor.is_construct(MERGE_TAG)
    }

    pub fn is_include(&self, id: SourceId) -> bool {
        self.elements[id.0].descriptor.is_construct(INCLUDE_TAG)
    }

    /// The element's parent when that parent is a `merge` construct.
    pub fn merge_parent(&self, id: SourceId) -> Option<SourceId> {
        self.parent(id).filter(|&p| self.is_merge(p))
    }
}
