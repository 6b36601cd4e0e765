//! Object table: the ordered arena that gives objects their reference
//! identity.
//!
//! Index 0 is the null sentinel; real objects occupy 1..=len in strict
//! dependency order (every reference points at a strictly smaller index).
//! Root status is tracked in a vector parallel to the arena: an object starts
//! out as a root and stops being one the first time anything resolves a
//! reference to it.

use crate::codec::ObjectIndex;
use crate::objects::{ObjectType, SceneObject};
use crate::util::{Error, Result};

/// What kind of object a reference field is allowed to point at.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Expect {
    /// Exactly this kind.
    Kind(ObjectType),
    /// Any Node-derived kind (Camera, Group, Light, meshes, Sprite3D, World).
    AnyNode,
}

impl Expect {
    fn expected_name(self) -> &'static str {
        match self {
            Expect::Kind(t) => t.name(),
            Expect::AnyNode => "Node",
        }
    }

    fn matches(self, obj: &SceneObject) -> bool {
        match self {
            Expect::Kind(t) => obj.object_type() == t,
            Expect::AnyNode => obj.is_node(),
        }
    }
}

/// Ordered, append-only arena of scene objects.
#[derive(Debug, Default)]
pub struct ObjectTable {
    entries: Vec<SceneObject>,
    roots: Vec<bool>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of table slots, the null sentinel included.
    pub fn len(&self) -> u32 {
        self.entries.len() as u32 + 1
    }

    /// True when the table holds no objects (only the sentinel).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an object, returning its index.
    pub fn append(&mut self, obj: SceneObject) -> ObjectIndex {
        self.entries.push(obj);
        self.roots.push(true);
        ObjectIndex(self.entries.len() as u32)
    }

    /// Raw slot access; no external-reference substitution.
    pub fn get(&self, index: ObjectIndex) -> Option<&SceneObject> {
        if index.is_null() {
            return None;
        }
        self.entries.get(index.0 as usize - 1)
    }

    pub fn get_mut(&mut self, index: ObjectIndex) -> Option<&mut SceneObject> {
        if index.is_null() {
            return None;
        }
        self.entries.get_mut(index.0 as usize - 1)
    }

    /// Objects in table order, starting at index 1.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectIndex, &SceneObject)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, obj)| (ObjectIndex(i as u32 + 1), obj))
    }

    /// Resolve a reference, substituting a resolved external reference by its
    /// target. Fails on out-of-range indices, kind mismatches and unresolved
    /// external references.
    pub fn resolve(
        &self,
        index: ObjectIndex,
        expect: Expect,
        field: &'static str,
    ) -> Result<&SceneObject> {
        let slot = self.get(index).ok_or(Error::DanglingReference {
            field,
            index: index.0,
        })?;
        let target = match slot {
            SceneObject::ExternalReference(ext) => match &ext.resolved {
                Some(obj) => obj.as_ref(),
                None => {
                    return Err(Error::UnresolvedExternalReference(ext.uri.clone()));
                }
            },
            other => other,
        };
        if !expect.matches(target) {
            return Err(Error::WrongReferentKind {
                field,
                expected: expect.expected_name(),
                actual: target.type_name(),
            });
        }
        Ok(target)
    }

    /// Validate a required reference during decode and clear the referenced
    /// object's root flag. Returns the index unchanged for storage.
    pub fn require_ref(
        &mut self,
        index: ObjectIndex,
        expect: Expect,
        field: &'static str,
    ) -> Result<ObjectIndex> {
        if index.is_null() {
            return Err(Error::DanglingReference { field, index: 0 });
        }
        self.resolve(index, expect, field)?;
        self.mark_referenced(index);
        Ok(index)
    }

    /// Like [`require_ref`](Self::require_ref), but index 0 means absent.
    pub fn optional_ref(
        &mut self,
        index: ObjectIndex,
        expect: Expect,
        field: &'static str,
    ) -> Result<ObjectIndex> {
        if index.is_null() {
            return Ok(ObjectIndex::NULL);
        }
        self.require_ref(index, expect, field)
    }

    /// Write-side kind check. Unlike [`resolve`](Self::resolve), a reference
    /// landing on an unresolved external reference passes: the referent lives
    /// in another file and its kind cannot be known while writing this one.
    pub fn check_kind(&self, index: ObjectIndex, expect: Expect, field: &'static str) -> Result<()> {
        let slot = self.get(index).ok_or(Error::DanglingReference {
            field,
            index: index.0,
        })?;
        let target = match slot {
            SceneObject::ExternalReference(ext) => match &ext.resolved {
                Some(obj) => obj.as_ref(),
                None => return Ok(()),
            },
            other => other,
        };
        if !expect.matches(target) {
            return Err(Error::WrongReferentKind {
                field,
                expected: expect.expected_name(),
                actual: target.type_name(),
            });
        }
        Ok(())
    }

    /// Clear the root flag of a referenced object.
    fn mark_referenced(&mut self, index: ObjectIndex) {
        if !index.is_null() {
            if let Some(flag) = self.roots.get_mut(index.0 as usize - 1) {
                *flag = false;
            }
        }
    }

    /// True if nothing has resolved a reference to this object.
    pub fn is_root(&self, index: ObjectIndex) -> bool {
        !index.is_null()
            && self
                .roots
                .get(index.0 as usize - 1)
                .copied()
                .unwrap_or(false)
    }

    /// Indices of the unreferenced scene objects, file metadata excluded.
    pub fn roots(&self) -> Vec<ObjectIndex> {
        self.iter()
            .filter(|(idx, obj)| {
                self.is_root(*idx)
                    && !matches!(
                        obj,
                        SceneObject::Header(_) | SceneObject::ExternalReference(_)
                    )
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Check the acyclicity-by-construction invariant: every reference held
    /// by every object points at a strictly smaller index. Run as an explicit
    /// build phase before serialization.
    pub fn check_dependency_order(&self) -> Result<()> {
        for (index, obj) in self.iter() {
            for referenced in obj.references() {
                if referenced.0 >= index.0 {
                    return Err(Error::invalid(format!(
                        "object {index} ({}) references {referenced}, which is not before it",
                        obj.type_name()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Write-side context: which index is being encoded, against which table.
pub struct EncodeContext<'a> {
    pub table: &'a ObjectTable,
    /// Index of the object currently being encoded.
    pub current: ObjectIndex,
}

impl EncodeContext<'_> {
    /// A required reference must exist, precede the current object and hold
    /// the expected kind.
    pub fn check_required(
        &self,
        index: ObjectIndex,
        expect: Expect,
        field: &'static str,
    ) -> Result<()> {
        if index.is_null() {
            return Err(Error::DanglingReference { field, index: 0 });
        }
        if index.0 >= self.current.0 {
            return Err(Error::invalid(format!(
                "field {field} of object {} references {index}, which is not before it",
                self.current
            )));
        }
        self.table.check_kind(index, expect, field)
    }

    /// Like [`check_required`](Self::check_required), index 0 meaning absent.
    pub fn check_optional(
        &self,
        index: ObjectIndex,
        expect: Expect,
        field: &'static str,
    ) -> Result<()> {
        if index.is_null() {
            return Ok(());
        }
        self.check_required(index, expect, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Group, Material, SceneObject};

    fn material() -> SceneObject {
        SceneObject::Material(Material::default())
    }

    #[test]
    fn test_append_indices_start_at_one() {
        let mut table = ObjectTable::new();
        assert_eq!(table.len(), 1);
        assert_eq!(table.append(material()), ObjectIndex(1));
        assert_eq!(table.append(material()), ObjectIndex(2));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_null_and_out_of_range() {
        let mut table = ObjectTable::new();
        table.append(material());
        assert!(table.get(ObjectIndex::NULL).is_none());
        assert!(table.get(ObjectIndex(2)).is_none());
        assert!(matches!(
            table.resolve(ObjectIndex(2), Expect::Kind(ObjectType::Material), "m"),
            Err(Error::DanglingReference { index: 2, .. })
        ));
    }

    #[test]
    fn test_kind_mismatch() {
        let mut table = ObjectTable::new();
        let idx = table.append(material());
        let err = table
            .resolve(idx, Expect::Kind(ObjectType::Camera), "camera")
            .unwrap_err();
        match err {
            Error::WrongReferentKind {
                expected, actual, ..
            } => {
                assert_eq!(expected, "Camera");
                assert_eq!(actual, "Material");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_any_node_accepts_group_not_material() {
        let mut table = ObjectTable::new();
        let mat = table.append(material());
        let grp = table.append(SceneObject::Group(Group::default()));
        assert!(table.resolve(grp, Expect::AnyNode, "child").is_ok());
        assert!(table.resolve(mat, Expect::AnyNode, "child").is_err());
    }

    #[test]
    fn test_root_flags() {
        let mut table = ObjectTable::new();
        let a = table.append(material());
        let b = table.append(material());
        assert!(table.is_root(a) && table.is_root(b));
        table
            .require_ref(a, Expect::Kind(ObjectType::Material), "m")
            .unwrap();
        assert!(!table.is_root(a));
        assert_eq!(table.roots(), vec![b]);
    }

    #[test]
    fn test_required_rejects_null() {
        let mut table = ObjectTable::new();
        assert!(matches!(
            table.require_ref(ObjectIndex::NULL, Expect::AnyNode, "child"),
            Err(Error::DanglingReference { index: 0, .. })
        ));
        assert_eq!(
            table
                .optional_ref(ObjectIndex::NULL, Expect::AnyNode, "child")
                .unwrap(),
            ObjectIndex::NULL
        );
    }

    #[test]
    fn test_dependency_order_check() {
        let mut table = ObjectTable::new();
        let mut group = Group::default();
        // Forward reference: object 1 pointing at object 2.
        group.children.push(ObjectIndex(2));
        table.append(SceneObject::Group(group));
        table.append(SceneObject::Group(Group::default()));
        assert!(table.check_dependency_order().is_err());

        let mut table = ObjectTable::new();
        table.append(SceneObject::Group(Group::default()));
        let mut group = Group::default();
        group.children.push(ObjectIndex(1));
        table.append(SceneObject::Group(group));
        assert!(table.check_dependency_order().is_ok());
    }
}
