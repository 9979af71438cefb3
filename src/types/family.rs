use std::fmt;

use serde::{Deserialize, Serialize};

use super::oid::*;

/// Closed set of type families the distribution hash knows how to encode.
///
/// `from_oid` is the only place a catalog type id is mapped onto an
/// encoding rule; anything it does not recognise is not hashable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeFamily {
    // Numeric
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Cash,
    Complex,

    // Character
    Char,
    BpChar,
    Text,
    VarChar,
    Bytea,
    Name,

    // Object identifiers
    Oid,
    RegProc,
    RegProcedure,
    RegOper,
    RegOperator,
    RegClass,
    RegType,
    Enum,
    Tid,
    OidVector,

    // Date/Time
    Timestamp,
    TimestampTz,
    Date,
    Time,
    TimeTz,
    Interval,
    AbsTime,
    RelTime,
    TInterval,

    // Network
    Inet,
    Cidr,
    MacAddr,

    // Bit strings
    Bit,
    VarBit,

    // Other
    Bool,
    Uuid,
    Array,
}

impl TypeFamily {
    pub fn from_oid(oid: TypeOid) -> Option<TypeFamily> {
        let family = match oid {
            INT2OID => TypeFamily::Int2,
            INT4OID => TypeFamily::Int4,
            INT8OID => TypeFamily::Int8,
            FLOAT4OID => TypeFamily::Float4,
            FLOAT8OID => TypeFamily::Float8,
            NUMERICOID => TypeFamily::Numeric,
            CASHOID => TypeFamily::Cash,
            COMPLEXOID => TypeFamily::Complex,
            CHAROID => TypeFamily::Char,
            BPCHAROID => TypeFamily::BpChar,
            TEXTOID => TypeFamily::Text,
            VARCHAROID => TypeFamily::VarChar,
            BYTEAOID => TypeFamily::Bytea,
            NAMEOID => TypeFamily::Name,
            OIDOID => TypeFamily::Oid,
            REGPROCOID => TypeFamily::RegProc,
            REGPROCEDUREOID => TypeFamily::RegProcedure,
            REGOPEROID => TypeFamily::RegOper,
            REGOPERATOROID => TypeFamily::RegOperator,
            REGCLASSOID => TypeFamily::RegClass,
            REGTYPEOID => TypeFamily::RegType,
            ANYENUMOID => TypeFamily::Enum,
            TIDOID => TypeFamily::Tid,
            OIDVECTOROID => TypeFamily::OidVector,
            TIMESTAMPOID => TypeFamily::Timestamp,
            TIMESTAMPTZOID => TypeFamily::TimestampTz,
            DATEOID => TypeFamily::Date,
            TIMEOID => TypeFamily::Time,
            TIMETZOID => TypeFamily::TimeTz,
            INTERVALOID => TypeFamily::Interval,
            ABSTIMEOID => TypeFamily::AbsTime,
            RELTIMEOID => TypeFamily::RelTime,
            TINTERVALOID => TypeFamily::TInterval,
            INETOID => TypeFamily::Inet,
            CIDROID => TypeFamily::Cidr,
            MACADDROID => TypeFamily::MacAddr,
            BITOID => TypeFamily::Bit,
            VARBITOID => TypeFamily::VarBit,
            BOOLOID => TypeFamily::Bool,
            UUIDOID => TypeFamily::Uuid,
            ANYARRAYOID => TypeFamily::Array,
            _ => return None,
        };
        Some(family)
    }

    /// Canonical type id of the family (pseudo-types for enums and arrays).
    pub fn oid(self) -> TypeOid {
        match self {
            TypeFamily::Int2 => INT2OID,
            TypeFamily::Int4 => INT4OID,
            TypeFamily::Int8 => INT8OID,
            TypeFamily::Float4 => FLOAT4OID,
            TypeFamily::Float8 => FLOAT8OID,
            TypeFamily::Numeric => NUMERICOID,
            TypeFamily::Cash => CASHOID,
            TypeFamily::Complex => COMPLEXOID,
            TypeFamily::Char => CHAROID,
            TypeFamily::BpChar => BPCHAROID,
            TypeFamily::Text => TEXTOID,
            TypeFamily::VarChar => VARCHAROID,
            TypeFamily::Bytea => BYTEAOID,
            TypeFamily::Name => NAMEOID,
            TypeFamily::Oid => OIDOID,
            TypeFamily::RegProc => REGPROCOID,
            TypeFamily::RegProcedure => REGPROCEDUREOID,
            TypeFamily::RegOper => REGOPEROID,
            TypeFamily::RegOperator => REGOPERATOROID,
            TypeFamily::RegClass => REGCLASSOID,
            TypeFamily::RegType => REGTYPEOID,
            TypeFamily::Enum => ANYENUMOID,
            TypeFamily::Tid => TIDOID,
            TypeFamily::OidVector => OIDVECTOROID,
            TypeFamily::Timestamp => TIMESTAMPOID,
            TypeFamily::TimestampTz => TIMESTAMPTZOID,
            TypeFamily::Date => DATEOID,
            TypeFamily::Time => TIMEOID,
            TypeFamily::TimeTz => TIMETZOID,
            TypeFamily::Interval => INTERVALOID,
            TypeFamily::AbsTime => ABSTIMEOID,
            TypeFamily::RelTime => RELTIMEOID,
            TypeFamily::TInterval => TINTERVALOID,
            TypeFamily::Inet => INETOID,
            TypeFamily::Cidr => CIDROID,
            TypeFamily::MacAddr => MACADDROID,
            TypeFamily::Bit => BITOID,
            TypeFamily::VarBit => VARBITOID,
            TypeFamily::Bool => BOOLOID,
            TypeFamily::Uuid => UUIDOID,
            TypeFamily::Array => ANYARRAYOID,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TypeFamily::Int2 => "int2",
            TypeFamily::Int4 => "int4",
            TypeFamily::Int8 => "int8",
            TypeFamily::Float4 => "float4",
            TypeFamily::Float8 => "float8",
            TypeFamily::Numeric => "numeric",
            TypeFamily::Cash => "money",
            TypeFamily::Complex => "complex",
            TypeFamily::Char => "\"char\"",
            TypeFamily::BpChar => "bpchar",
            TypeFamily::Text => "text",
            TypeFamily::VarChar => "varchar",
            TypeFamily::Bytea => "bytea",
            TypeFamily::Name => "name",
            TypeFamily::Oid => "oid",
            TypeFamily::RegProc => "regproc",
            TypeFamily::RegProcedure => "regprocedure",
            TypeFamily::RegOper => "regoper",
            TypeFamily::RegOperator => "regoperator",
            TypeFamily::RegClass => "regclass",
            TypeFamily::RegType => "regtype",
            TypeFamily::Enum => "anyenum",
            TypeFamily::Tid => "tid",
            TypeFamily::OidVector => "oidvector",
            TypeFamily::Timestamp => "timestamp",
            TypeFamily::TimestampTz => "timestamptz",
            TypeFamily::Date => "date",
            TypeFamily::Time => "time",
            TypeFamily::TimeTz => "timetz",
            TypeFamily::Interval => "interval",
            TypeFamily::AbsTime => "abstime",
            TypeFamily::RelTime => "reltime",
            TypeFamily::TInterval => "tinterval",
            TypeFamily::Inet => "inet",
            TypeFamily::Cidr => "cidr",
            TypeFamily::MacAddr => "macaddr",
            TypeFamily::Bit => "bit",
            TypeFamily::VarBit => "varbit",
            TypeFamily::Bool => "bool",
            TypeFamily::Uuid => "uuid",
            TypeFamily::Array => "anyarray",
        }
    }

    /// Families whose values are widened to an 8-byte integer before hashing.
    pub fn is_integer_like(self) -> bool {
        matches!(
            self,
            TypeFamily::Int2
                | TypeFamily::Int4
                | TypeFamily::Int8
                | TypeFamily::Oid
                | TypeFamily::RegProc
                | TypeFamily::RegProcedure
                | TypeFamily::RegOper
                | TypeFamily::RegOperator
                | TypeFamily::RegClass
                | TypeFamily::RegType
                | TypeFamily::Enum
        )
    }

    /// Families that drop trailing blanks before hashing.
    pub fn trims_blanks(self) -> bool {
        matches!(
            self,
            TypeFamily::BpChar | TypeFamily::Text | TypeFamily::VarChar | TypeFamily::Name
        )
    }
}

impl fmt::Display for TypeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// True when `oid` names a type with a distribution encoding.
pub fn is_hashable_type(oid: TypeOid) -> bool {
    TypeFamily::from_oid(oid).is_some()
}

/// Whether an equality between `left` and `right` can be satisfied by
/// redistributing both sides on their own hash.
///
/// Equal values only hash equally when both sides use the same byte
/// encoding, so mixed-width integers qualify but float4 against float8 does
/// not. Array equality is never redistributable.
pub fn equality_redistributable(left: TypeFamily, right: TypeFamily) -> bool {
    use TypeFamily::*;

    match (left, right) {
        (Array, _) | (_, Array) => false,
        (Int2 | Int4 | Int8, Int2 | Int4 | Int8) => true,
        (BpChar | Text | VarChar, BpChar | Text | VarChar) => true,
        (Cidr, Inet) | (Inet, Cidr) => true,
        (l, r) => l == r,
    }
}
