//! Link graph builder — the `_links` object embedded in every representation.
//!
//! Links are a pure function of the entity reference and the children the
//! dispatcher already fetched; building them never touches the control
//! system. Relation keys are always emitted in the order [`Relation`] declares
//! them, so identical input gives byte-identical JSON.

use std::collections::BTreeSet;

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use tangorest_domain::entity::{ChildKind, EntityRef};
use tangorest_domain::path::{DevicePath, MemberName};

use crate::services::locator::ResourceLocator;

/// Relation names, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    SelfLink,
    Parent,
    State,
    Status,
    Devices,
    Attributes,
    Commands,
    Properties,
    Children,
}

impl Relation {
    /// JSON key of the relation.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::SelfLink => "_self",
            Self::Parent => "_parent",
            Self::State => "_state",
            Self::Status => "_status",
            Self::Devices => "_devices",
            Self::Attributes => "_attributes",
            Self::Commands => "_commands",
            Self::Properties => "_properties",
            Self::Children => "_children",
        }
    }

    /// Relation pointing at a device collection.
    #[must_use]
    pub fn collection(kind: ChildKind) -> Self {
        match kind {
            ChildKind::Attributes => Self::Attributes,
            ChildKind::Commands => Self::Commands,
            ChildKind::Properties => Self::Properties,
        }
    }
}

/// Target of a relation: one URI, or a list of URIs for `_children`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LinkTarget {
    One(String),
    Many(Vec<String>),
}

impl LinkTarget {
    /// The single URI, if this is not a list.
    #[must_use]
    pub fn as_uri(&self) -> Option<&str> {
        match self {
            Self::One(uri) => Some(uri),
            Self::Many(_) => None,
        }
    }
}

/// Ordered relation → target mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRelations {
    entries: Vec<(Relation, LinkTarget)>,
}

impl LinkRelations {
    /// Set a relation, replacing any previous target, keeping declared order.
    pub fn insert(&mut self, relation: Relation, target: LinkTarget) {
        match self.entries.binary_search_by_key(&relation, |(r, _)| *r) {
            Ok(index) => self.entries[index].1 = target,
            Err(index) => self.entries.insert(index, (relation, target)),
        }
    }

    #[must_use]
    pub fn get(&self, relation: Relation) -> Option<&LinkTarget> {
        self.entries
            .iter()
            .find(|(r, _)| *r == relation)
            .map(|(_, target)| target)
    }

    #[must_use]
    pub fn contains(&self, relation: Relation) -> bool {
        self.get(relation).is_some()
    }

    /// Relations in emission order.
    pub fn relations(&self) -> impl Iterator<Item = Relation> + '_ {
        self.entries.iter().map(|(relation, _)| *relation)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for LinkRelations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (relation, target) in &self.entries {
            map.serialize_entry(relation.key(), target)?;
        }
        map.end()
    }
}

/// Computes the relation graph of an entity through a [`ResourceLocator`].
#[derive(Debug, Clone, Copy)]
pub struct LinkGraphBuilder<'a> {
    locator: &'a ResourceLocator,
}

impl<'a> LinkGraphBuilder<'a> {
    #[must_use]
    pub fn new(locator: &'a ResourceLocator) -> Self {
        Self { locator }
    }

    /// Build the links of `entity`.
    ///
    /// `known_children` is only used by list resources (device list and
    /// collections); other kinds ignore it.
    #[must_use]
    pub fn build(&self, entity: &EntityRef, known_children: &[EntityRef]) -> LinkRelations {
        let mut links = LinkRelations::default();
        links.insert(Relation::SelfLink, self.link(entity));
        if let Some(parent) = entity.parent() {
            links.insert(Relation::Parent, self.link(&parent));
        }

        match entity {
            EntityRef::Database => {
                links.insert(Relation::Devices, self.link(&EntityRef::DeviceList));
            }
            EntityRef::Device(device) => {
                self.insert_state_links(&mut links, device);
                for kind in ChildKind::ALL {
                    let collection = EntityRef::Collection(device.clone(), kind);
                    links.insert(Relation::collection(kind), self.link(&collection));
                }
            }
            EntityRef::DeviceState(device) => self.insert_state_links(&mut links, device),
            EntityRef::DeviceList | EntityRef::Collection(..) => {
                links.insert(Relation::Children, self.children(known_children));
            }
            EntityRef::Attribute(_)
            | EntityRef::AttributeInfo(..)
            | EntityRef::Command(..)
            | EntityRef::Property(..) => {}
        }
        links
    }

    fn link(&self, entity: &EntityRef) -> LinkTarget {
        LinkTarget::One(self.locator.encode(entity))
    }

    fn insert_state_links(&self, links: &mut LinkRelations, device: &DevicePath) {
        links.insert(
            Relation::State,
            self.link(&EntityRef::DeviceState(device.clone())),
        );
        links.insert(
            Relation::Status,
            self.link(&EntityRef::attribute(device.clone(), MemberName::status())),
        );
    }

    // Sorted and de-duplicated so the output only depends on the children set.
    fn children(&self, known_children: &[EntityRef]) -> LinkTarget {
        let uris: BTreeSet<String> = known_children
            .iter()
            .map(|child| self.locator.encode(child))
            .collect();
        LinkTarget::Many(uris.into_iter().collect())
    }
}
