use std::collections::{HashMap, HashSet};

use crate::policy::{AttrNumber, DistributionPolicy, RelationId};
use crate::types::oid::{INT4ARRAYOID, TEXTARRAYOID};
use crate::types::{is_hashable_type, TypeOid};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDesc {
    pub name: String,
    pub type_oid: TypeOid,
    /// Declared array dimensions, 0 for scalars
    pub ndims: u32,
    pub dropped: bool,
}

impl AttributeDesc {
    pub fn new(name: impl Into<String>, type_oid: TypeOid) -> Self {
        Self {
            name: name.into(),
            type_oid,
            ndims: 0,
            dropped: false,
        }
    }

    pub fn array(name: impl Into<String>, type_oid: TypeOid, ndims: u32) -> Self {
        Self {
            ndims,
            ..Self::new(name, type_oid)
        }
    }

    pub fn dropped(mut self) -> Self {
        self.dropped = true;
        self
    }
}

/// Physical attribute layout of a relation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TupleDesc {
    attrs: Vec<AttributeDesc>,
}

impl TupleDesc {
    pub fn new(attrs: Vec<AttributeDesc>) -> Self {
        Self { attrs }
    }

    pub fn natts(&self) -> usize {
        self.attrs.len()
    }

    pub fn attr(&self, attno: AttrNumber) -> Option<&AttributeDesc> {
        if attno == 0 {
            return None;
        }
        self.attrs.get(attno as usize - 1)
    }

    /// Live attribute numbers in physical order.
    pub fn live_attnos(&self) -> Vec<AttrNumber> {
        self.attrs
            .iter()
            .enumerate()
            .filter(|(_, attr)| !attr.dropped)
            .map(|(i, _)| (i + 1) as AttrNumber)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Base,
    Domain { base: TypeOid },
    Enum,
    Array { element: TypeOid },
    Composite,
    Pseudo,
}

/// Read-only view of the catalog metadata the router consults.
///
/// Lookups happen while policies are bound and on the first row routed to
/// each child partition, never per row afterwards.
pub trait Catalog {
    fn tuple_desc(&self, relid: RelationId) -> Option<&TupleDesc>;

    fn distribution_policy(&self, relid: RelationId) -> Option<&DistributionPolicy>;

    fn type_kind(&self, type_oid: TypeOid) -> TypeKind;

    /// Whether the type may be used in a distribution key.
    fn is_hashable(&self, type_oid: TypeOid) -> bool;

    /// Leaf partitions of a partitioned relation, empty otherwise.
    fn partition_children(&self, relid: RelationId) -> Vec<RelationId>;
}

#[derive(Debug, Clone)]
struct RelationEntry {
    desc: TupleDesc,
    policy: Option<DistributionPolicy>,
    children: Vec<RelationId>,
}

/// In-memory catalog for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    relations: HashMap<RelationId, RelationEntry>,
    types: HashMap<TypeOid, TypeKind>,
    unhashable: HashSet<TypeOid>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_relation(
        &mut self,
        relid: RelationId,
        desc: TupleDesc,
        policy: Option<DistributionPolicy>,
    ) -> &mut Self {
        self.relations.insert(
            relid,
            RelationEntry {
                desc,
                policy,
                children: Vec::new(),
            },
        );
        self
    }

    /// Register `child` as a leaf partition of `parent`.
    pub fn add_partition(
        &mut self,
        parent: RelationId,
        child: RelationId,
        desc: TupleDesc,
        policy: Option<DistributionPolicy>,
    ) -> &mut Self {
        self.add_relation(child, desc, policy);
        if let Some(entry) = self.relations.get_mut(&parent) {
            entry.children.push(child);
        }
        self
    }

    pub fn add_type(&mut self, type_oid: TypeOid, kind: TypeKind) -> &mut Self {
        self.types.insert(type_oid, kind);
        self
    }

    pub fn add_domain(&mut self, type_oid: TypeOid, base: TypeOid) -> &mut Self {
        self.add_type(type_oid, TypeKind::Domain { base })
    }

    pub fn add_enum(&mut self, type_oid: TypeOid) -> &mut Self {
        self.add_type(type_oid, TypeKind::Enum)
    }

    /// Make `is_hashable` answer false for a type regardless of its kind.
    pub fn mark_unhashable(&mut self, type_oid: TypeOid) -> &mut Self {
        self.unhashable.insert(type_oid);
        self
    }
}

impl Catalog for MemoryCatalog {
    fn tuple_desc(&self, relid: RelationId) -> Option<&TupleDesc> {
        self.relations.get(&relid).map(|entry| &entry.desc)
    }

    fn distribution_policy(&self, relid: RelationId) -> Option<&DistributionPolicy> {
        self.relations.get(&relid).and_then(|entry| entry.policy.as_ref())
    }

    fn type_kind(&self, type_oid: TypeOid) -> TypeKind {
        if let Some(kind) = self.types.get(&type_oid) {
            return *kind;
        }
        match type_oid {
            INT4ARRAYOID => TypeKind::Array {
                element: crate::types::oid::INT4OID,
            },
            TEXTARRAYOID => TypeKind::Array {
                element: crate::types::oid::TEXTOID,
            },
            _ => TypeKind::Base,
        }
    }

    fn is_hashable(&self, type_oid: TypeOid) -> bool {
        if self.unhashable.contains(&type_oid) {
            return false;
        }
        match self.type_kind(type_oid) {
            TypeKind::Array { .. } | TypeKind::Enum => true,
            TypeKind::Domain { base } => self.is_hashable(base),
            TypeKind::Base => is_hashable_type(type_oid),
            TypeKind::Composite | TypeKind::Pseudo => false,
        }
    }

    fn partition_children(&self, relid: RelationId) -> Vec<RelationId> {
        self.relations
            .get(&relid)
            .map(|entry| entry.children.clone())
            .unwrap_or_default()
    }
}
