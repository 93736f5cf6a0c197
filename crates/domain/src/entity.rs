//! Entity references — the closed set of addressable things in the API.
//!
//! Every resource the API serves is one variant of [`EntityRef`]. The
//! variants form a tree rooted at [`EntityRef::Database`]; [`EntityRef::parent`]
//! walks one level up that tree.

use std::fmt;

use crate::path::{DevicePath, MemberName};

/// The per-device collections a device exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChildKind {
    Attributes,
    Commands,
    Properties,
}

impl ChildKind {
    /// All collections, in link order.
    pub const ALL: [Self; 3] = [Self::Attributes, Self::Commands, Self::Properties];

    /// The URI segment naming this collection.
    #[must_use]
    pub fn segment(self) -> &'static str {
        match self {
            Self::Attributes => "attributes",
            Self::Commands => "commands",
            Self::Properties => "properties",
        }
    }

    /// Parse a URI segment; segments are matched exactly.
    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.segment() == segment)
    }
}

impl fmt::Display for ChildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// Discriminant of an [`EntityRef`], used in logs and error details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Database,
    DeviceList,
    Device,
    DeviceState,
    Collection,
    Attribute,
    AttributeInfo,
    Command,
    Property,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Database => "database",
            Self::DeviceList => "device list",
            Self::Device => "device",
            Self::DeviceState => "device state",
            Self::Collection => "collection",
            Self::Attribute => "attribute",
            Self::AttributeInfo => "attribute info",
            Self::Command => "command",
            Self::Property => "property",
        })
    }
}

/// An attribute of a device other than its `State`.
///
/// Only [`EntityRef::attribute`] builds one, so the `State` attribute can
/// never be addressed through [`EntityRef::Attribute`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeRef {
    device: DevicePath,
    name: MemberName,
}

impl AttributeRef {
    #[must_use]
    pub fn device(&self) -> &DevicePath {
        &self.device
    }

    #[must_use]
    pub fn name(&self) -> &MemberName {
        &self.name
    }

    #[must_use]
    pub fn into_parts(self) -> (DevicePath, MemberName) {
        (self.device, self.name)
    }
}

/// Logical identity of an addressable entity.
///
/// Each value has exactly one canonical URI: the `State` attribute of a
/// device is always [`EntityRef::DeviceState`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityRef {
    /// The API root, terminal of the parent chain.
    Database,
    /// All devices known to the naming authority.
    DeviceList,
    Device(DevicePath),
    /// State and status summary of a device (its `State` attribute).
    DeviceState(DevicePath),
    Collection(DevicePath, ChildKind),
    Attribute(AttributeRef),
    /// Configuration of an attribute.
    AttributeInfo(DevicePath, MemberName),
    Command(DevicePath, MemberName),
    Property(DevicePath, MemberName),
}

impl EntityRef {
    /// Reference an attribute, folding `State` into [`EntityRef::DeviceState`].
    #[must_use]
    pub fn attribute(device: DevicePath, name: MemberName) -> Self {
        if name.is_state() {
            Self::DeviceState(device)
        } else {
            Self::Attribute(AttributeRef { device, name })
        }
    }

    /// Reference one item of a device collection.
    #[must_use]
    pub fn child(device: DevicePath, kind: ChildKind, name: MemberName) -> Self {
        match kind {
            ChildKind::Attributes => Self::attribute(device, name),
            ChildKind::Commands => Self::Command(device, name),
            ChildKind::Properties => Self::Property(device, name),
        }
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Database => EntityKind::Database,
            Self::DeviceList => EntityKind::DeviceList,
            Self::Device(_) => EntityKind::Device,
            Self::DeviceState(_) => EntityKind::DeviceState,
            Self::Collection(..) => EntityKind::Collection,
            Self::Attribute(_) => EntityKind::Attribute,
            Self::AttributeInfo(..) => EntityKind::AttributeInfo,
            Self::Command(..) => EntityKind::Command,
            Self::Property(..) => EntityKind::Property,
        }
    }

    /// The device this entity belongs to, if any.
    #[must_use]
    pub fn device(&self) -> Option<&DevicePath> {
        match self {
            Self::Database | Self::DeviceList => None,
            Self::Attribute(attribute) => Some(attribute.device()),
            Self::Device(path)
            | Self::DeviceState(path)
            | Self::Collection(path, _)
            | Self::AttributeInfo(path, _)
            | Self::Command(path, _)
            | Self::Property(path, _) => Some(path),
        }
    }

    /// Name of the attribute, command or property this entity designates.
    #[must_use]
    pub fn member_name(&self) -> Option<&str> {
        match self {
            Self::DeviceState(_) => Some(MemberName::STATE),
            Self::Attribute(attribute) => Some(attribute.name().as_str()),
            Self::AttributeInfo(_, name)
            | Self::Command(_, name)
            | Self::Property(_, name) => Some(name.as_str()),
            Self::Database | Self::DeviceList | Self::Device(_) | Self::Collection(..) => None,
        }
    }

    /// The entity one level up the tree; `None` for the database root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        match self {
            Self::Database => None,
            Self::DeviceList => Some(Self::Database),
            Self::Device(_) => Some(Self::DeviceList),
            Self::DeviceState(path) | Self::Collection(path, _) => Some(Self::Device(path.clone())),
            Self::Attribute(attribute) => Some(Self::Collection(
                attribute.device().clone(),
                ChildKind::Attributes,
            )),
            Self::AttributeInfo(path, name) => Some(Self::attribute(path.clone(), name.clone())),
            Self::Command(path, _) => Some(Self::Collection(path.clone(), ChildKind::Commands)),
            Self::Property(path, _) => Some(Self::Collection(path.clone(), ChildKind::Properties)),
        }
    }

    /// Leaves have no children and only link to themselves and their parent.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Self::Attribute(_) | Self::AttributeInfo(..) | Self::Command(..) | Self::Property(..)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tg_test() -> DevicePath {
        DevicePath::new("sys", "tg_test", "1").unwrap()
    }

    #[test]
    fn should_fold_state_attribute_into_device_state() {
        let entity = EntityRef::attribute(tg_test(), MemberName::new("STATE").unwrap());
        assert_eq!(entity, EntityRef::DeviceState(tg_test()));
    }

    #[test]
    fn should_keep_status_as_plain_attribute() {
        let entity = EntityRef::attribute(tg_test(), MemberName::status());
        let EntityRef::Attribute(attribute) = &entity else {
            panic!("expected an attribute, got {entity:?}");
        };
        assert_eq!(attribute.device(), &tg_test());
        assert_eq!(attribute.name(), &MemberName::status());
        assert_eq!(entity.member_name(), Some("Status"));
    }

    #[test]
    fn should_fold_state_whatever_its_case_or_collection() {
        for name in ["State", "state", "sTaTe"] {
            let name = MemberName::new(name).unwrap();
            assert_eq!(
                EntityRef::attribute(tg_test(), name.clone()),
                EntityRef::DeviceState(tg_test())
            );
            assert_eq!(
                EntityRef::child(tg_test(), ChildKind::Attributes, name),
                EntityRef::DeviceState(tg_test())
            );
        }
    }

    #[test]
    fn should_build_child_for_each_collection_kind() {
        let name = MemberName::new("On").unwrap();
        assert_eq!(
            EntityRef::child(tg_test(), ChildKind::Commands, name.clone()),
            EntityRef::Command(tg_test(), name.clone())
        );
        assert_eq!(
            EntityRef::child(tg_test(), ChildKind::Properties, name.clone()),
            EntityRef::Property(tg_test(), name)
        );
    }

    #[test]
    fn should_walk_parent_chain_up_to_database() {
        let mut current = EntityRef::AttributeInfo(tg_test(), MemberName::new("ampli").unwrap());
        let mut kinds = vec![current.kind()];
        while let Some(parent) = current.parent() {
            kinds.push(parent.kind());
            current = parent;
        }
        assert_eq!(
            kinds,
            vec![
                EntityKind::AttributeInfo,
                EntityKind::Attribute,
                EntityKind::Collection,
                EntityKind::Device,
                EntityKind::DeviceList,
                EntityKind::Database,
            ]
        );
    }

    #[test]
    fn should_have_device_as_parent_of_device_state() {
        assert_eq!(
            EntityRef::DeviceState(tg_test()).parent(),
            Some(EntityRef::Device(tg_test()))
        );
    }

    #[test]
    fn should_report_state_as_member_name_of_device_state() {
        assert_eq!(
            EntityRef::DeviceState(tg_test()).member_name(),
            Some("State")
        );
        assert_eq!(EntityRef::Device(tg_test()).member_name(), None);
    }

    #[test]
    fn should_classify_leaves() {
        let name = MemberName::new("x").unwrap();
        assert!(EntityRef::attribute(tg_test(), name.clone()).is_leaf());
        assert!(EntityRef::Command(tg_test(), name.clone()).is_leaf());
        assert!(EntityRef::Property(tg_test(), name).is_leaf());
        assert!(!EntityRef::Device(tg_test()).is_leaf());
        assert!(!EntityRef::DeviceState(tg_test()).is_leaf());
        assert!(!EntityRef::Collection(tg_test(), ChildKind::Attributes).is_leaf());
    }

    #[test]
    fn should_parse_collection_segments_exactly() {
        assert_eq!(
            ChildKind::from_segment("attributes"),
            Some(ChildKind::Attributes)
        );
        assert_eq!(ChildKind::from_segment("Attributes"), None);
        assert_eq!(ChildKind::from_segment("state"), None);
    }
}
