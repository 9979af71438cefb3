/// Catalog type identifier
pub type TypeOid = u32;

// Built-in type OIDs
pub const BOOLOID: TypeOid = 16;
pub const BYTEAOID: TypeOid = 17;
pub const CHAROID: TypeOid = 18;
pub const NAMEOID: TypeOid = 19;
pub const INT8OID: TypeOid = 20;
pub const INT2OID: TypeOid = 21;
pub const INT4OID: TypeOid = 23;
pub const REGPROCOID: TypeOid = 24;
pub const TEXTOID: TypeOid = 25;
pub const OIDOID: TypeOid = 26;
pub const TIDOID: TypeOid = 27;
pub const OIDVECTOROID: TypeOid = 30;
pub const COMPLEXOID: TypeOid = 195;
pub const CIDROID: TypeOid = 650;
pub const FLOAT4OID: TypeOid = 700;
pub const FLOAT8OID: TypeOid = 701;
pub const ABSTIMEOID: TypeOid = 702;
pub const RELTIMEOID: TypeOid = 703;
pub const TINTERVALOID: TypeOid = 704;
pub const CASHOID: TypeOid = 790;
pub const MACADDROID: TypeOid = 829;
pub const INETOID: TypeOid = 869;
pub const BPCHAROID: TypeOid = 1042;
pub const VARCHAROID: TypeOid = 1043;
pub const DATEOID: TypeOid = 1082;
pub const TIMEOID: TypeOid = 1083;
pub const TIMESTAMPOID: TypeOid = 1114;
pub const TIMESTAMPTZOID: TypeOid = 1184;
pub const INTERVALOID: TypeOid = 1186;
pub const TIMETZOID: TypeOid = 1266;
pub const BITOID: TypeOid = 1560;
pub const VARBITOID: TypeOid = 1562;
pub const NUMERICOID: TypeOid = 1700;
pub const REGPROCEDUREOID: TypeOid = 2202;
pub const REGOPEROID: TypeOid = 2203;
pub const REGOPERATOROID: TypeOid = 2204;
pub const REGCLASSOID: TypeOid = 2205;
pub const REGTYPEOID: TypeOid = 2206;
pub const ANYARRAYOID: TypeOid = 2277;
pub const UUIDOID: TypeOid = 2950;
pub const ANYENUMOID: TypeOid = 3500;

// Array types used by tests and the in-memory catalog
pub const INT4ARRAYOID: TypeOid = 1007;
pub const TEXTARRAYOID: TypeOid = 1009;
