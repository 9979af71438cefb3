use tracing::debug;

use crate::error::{Result, RouteError};
use crate::policy::catalog::{AttributeDesc, Catalog, TupleDesc, TypeKind};
use crate::policy::{AttrNumber, DistributionPolicy, PolicyKind, RelationId};
use crate::types::{TypeFamily, TypeOid};

/// Nested domains deeper than this are treated as a broken catalog
const MAX_DOMAIN_DEPTH: usize = 32;

/// One distribution key column with its resolved encoding family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyColumn {
    pub attno: AttrNumber,
    pub family: TypeFamily,
}

/// A distribution policy checked against its relation.
///
/// Binding validates every key attribute and resolves its type family once,
/// so routing never consults the catalog per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundPolicy {
    relid: RelationId,
    policy: DistributionPolicy,
    natts: usize,
    keys: Vec<KeyColumn>,
}

impl BoundPolicy {
    /// Bind the catalog policy of `relid`.
    pub fn bind(catalog: &dyn Catalog, relid: RelationId) -> Result<Self> {
        let policy = catalog.distribution_policy(relid).ok_or_else(|| {
            RouteError::InvalidPolicy(format!("relation {} has no distribution policy", relid))
        })?;
        let desc = catalog
            .tuple_desc(relid)
            .ok_or_else(|| RouteError::InvalidPolicy(format!("unknown relation {}", relid)))?;
        Self::bind_with(catalog, relid, policy, desc)
    }

    pub fn bind_with(
        catalog: &dyn Catalog,
        relid: RelationId,
        policy: &DistributionPolicy,
        desc: &TupleDesc,
    ) -> Result<Self> {
        if policy.kind() == PolicyKind::SingleNode {
            return Err(RouteError::InvalidPolicy(format!(
                "relation {} is not distributed",
                relid
            )));
        }

        let mut keys = Vec::with_capacity(policy.hash_key_attrs().len());
        for &attno in policy.hash_key_attrs() {
            let attr = desc.attr(attno).ok_or_else(|| {
                RouteError::InvalidPolicy(format!(
                    "key attribute {} is outside relation {} with {} columns",
                    attno,
                    relid,
                    desc.natts()
                ))
            })?;
            if attr.dropped {
                return Err(RouteError::InvalidPolicy(format!(
                    "key attribute {} of relation {} is dropped",
                    attno, relid
                )));
            }
            let family = resolve_column_family(catalog, attr)?;
            keys.push(KeyColumn { attno, family });
        }

        debug!(relid, keys = keys.len(), "bound distribution policy");
        Ok(Self {
            relid,
            policy: policy.clone(),
            natts: desc.natts(),
            keys,
        })
    }

    pub fn relid(&self) -> RelationId {
        self.relid
    }

    pub fn policy(&self) -> &DistributionPolicy {
        &self.policy
    }

    pub fn natts(&self) -> usize {
        self.natts
    }

    pub fn keys(&self) -> &[KeyColumn] {
        &self.keys
    }

    pub fn is_round_robin(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Family used to encode values of `attr` in a distribution key.
///
/// Fails with `NotHashable` when the catalog says the type may not be
/// hashed or when no encoding rule exists for it.
pub fn resolve_column_family(catalog: &dyn Catalog, attr: &AttributeDesc) -> Result<TypeFamily> {
    if !catalog.is_hashable(attr.type_oid) {
        return Err(RouteError::NotHashable(attr.type_oid));
    }
    column_family(catalog, attr).ok_or(RouteError::NotHashable(attr.type_oid))
}

/// Family of `attr` without the hashability check.
///
/// Arrays collapse to `Array`, domains to their base type and every enum to
/// `Enum`.
pub fn column_family(catalog: &dyn Catalog, attr: &AttributeDesc) -> Option<TypeFamily> {
    if attr.ndims > 0 {
        return Some(TypeFamily::Array);
    }
    type_family(catalog, attr.type_oid)
}

fn type_family(catalog: &dyn Catalog, type_oid: TypeOid) -> Option<TypeFamily> {
    let mut current = type_oid;
    for _ in 0..MAX_DOMAIN_DEPTH {
        match catalog.type_kind(current) {
            TypeKind::Domain { base } => current = base,
            TypeKind::Enum => return Some(TypeFamily::Enum),
            TypeKind::Array { .. } => return Some(TypeFamily::Array),
            TypeKind::Base => return TypeFamily::from_oid(current),
            TypeKind::Composite | TypeKind::Pseudo => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::MemoryCatalog;
    use crate::types::oid::{INT4ARRAYOID, INT4OID, TEXTOID, VARCHAROID};

    const JSONOID: TypeOid = 114;

    fn catalog_with(policy: DistributionPolicy, attrs: Vec<AttributeDesc>) -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        catalog
            .add_domain(70_001, VARCHAROID)
            .add_domain(70_002, 70_001)
            .add_enum(70_003)
            .add_type(70_004, TypeKind::Composite);
        catalog.add_relation(10, TupleDesc::new(attrs), Some(policy));
        catalog
    }

    #[test]
    fn test_bind_resolves_families() {
        let catalog = catalog_with(
            DistributionPolicy::hashed(vec![2, 1, 3, 4]).unwrap(),
            vec![
                AttributeDesc::new("id", INT4OID),
                AttributeDesc::new("code", 70_002),
                AttributeDesc::new("mood", 70_003),
                AttributeDesc::array("tags", INT4ARRAYOID, 1),
            ],
        );
        let bound = BoundPolicy::bind(&catalog, 10).unwrap();
        let families: Vec<_> = bound.keys().iter().map(|k| k.family).collect();
        assert_eq!(
            families,
            vec![
                TypeFamily::VarChar,
                TypeFamily::Int4,
                TypeFamily::Enum,
                TypeFamily::Array
            ]
        );
        assert_eq!(bound.natts(), 4);
        assert!(!bound.is_round_robin());
    }

    #[test]
    fn test_bind_rejects_unhashable_key() {
        let catalog = catalog_with(
            DistributionPolicy::hashed(vec![2]).unwrap(),
            vec![
                AttributeDesc::new("id", INT4OID),
                AttributeDesc::new("doc", JSONOID),
            ],
        );
        assert_eq!(
            BoundPolicy::bind(&catalog, 10),
            Err(RouteError::NotHashable(JSONOID))
        );
    }

    #[test]
    fn test_bind_rejects_composite_key() {
        let catalog = catalog_with(
            DistributionPolicy::hashed(vec![1]).unwrap(),
            vec![AttributeDesc::new("row", 70_004)],
        );
        assert!(matches!(
            BoundPolicy::bind(&catalog, 10),
            Err(RouteError::NotHashable(70_004))
        ));
    }

    #[test]
    fn test_bind_rejects_out_of_range_and_dropped() {
        let catalog = catalog_with(
            DistributionPolicy::hashed(vec![3]).unwrap(),
            vec![AttributeDesc::new("id", INT4OID), AttributeDesc::new("t", TEXTOID)],
        );
        assert!(matches!(
            BoundPolicy::bind(&catalog, 10),
            Err(RouteError::InvalidPolicy(_))
        ));

        let catalog = catalog_with(
            DistributionPolicy::hashed(vec![2]).unwrap(),
            vec![
                AttributeDesc::new("id", INT4OID),
                AttributeDesc::new("t", TEXTOID).dropped(),
            ],
        );
        assert!(matches!(
            BoundPolicy::bind(&catalog, 10),
            Err(RouteError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_bind_single_node_is_invalid() {
        let catalog = catalog_with(
            DistributionPolicy::single_node(),
            vec![AttributeDesc::new("id", INT4OID)],
        );
        assert!(matches!(
            BoundPolicy::bind(&catalog, 10),
            Err(RouteError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_round_robin_binds_without_keys() {
        let catalog = catalog_with(
            DistributionPolicy::round_robin(),
            vec![AttributeDesc::new("doc", JSONOID)],
        );
        let bound = BoundPolicy::bind(&catalog, 10).unwrap();
        assert!(bound.is_round_robin());
        assert!(bound.keys().is_empty());
    }

    #[test]
    fn test_missing_relation() {
        let catalog = MemoryCatalog::new();
        assert!(matches!(
            BoundPolicy::bind(&catalog, 99),
            Err(RouteError::InvalidPolicy(_))
        ));
    }
}
