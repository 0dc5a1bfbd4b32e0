use std::fmt;

/// Scalar types understood by the codec, tagged with their PostgreSQL OIDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeIdentifier {
    Int2 = 21,
    Int4 = 23,
    Int8 = 20,
    Numeric = 1700,
    Float4 = 700,
    Float8 = 701,
    Bool = 16,
    Char = 1042,
    Varchar = 1043,
    Date = 1082,
    Timestamp = 1114,
    Timestamptz = 1184,
    Time = 1083,
    Timetz = 1266,
}

impl TypeIdentifier {
    pub const COUNT: usize = 14;

    /// All identifiers, in registry order
    pub const ALL: [TypeIdentifier; Self::COUNT] = [
        TypeIdentifier::Int2,
        TypeIdentifier::Int4,
        TypeIdentifier::Int8,
        TypeIdentifier::Numeric,
        TypeIdentifier::Float4,
        TypeIdentifier::Float8,
        TypeIdentifier::Bool,
        TypeIdentifier::Char,
        TypeIdentifier::Varchar,
        TypeIdentifier::Date,
        TypeIdentifier::Timestamp,
        TypeIdentifier::Timestamptz,
        TypeIdentifier::Time,
        TypeIdentifier::Timetz,
    ];

    /// Position of this identifier in [`TypeIdentifier::ALL`]
    pub const fn index(self) -> usize {
        match self {
            TypeIdentifier::Int2 => 0,
            TypeIdentifier::Int4 => 1,
            TypeIdentifier::Int8 => 2,
            TypeIdentifier::Numeric => 3,
            TypeIdentifier::Float4 => 4,
            TypeIdentifier::Float8 => 5,
            TypeIdentifier::Bool => 6,
            TypeIdentifier::Char => 7,
            TypeIdentifier::Varchar => 8,
            TypeIdentifier::Date => 9,
            TypeIdentifier::Timestamp => 10,
            TypeIdentifier::Timestamptz => 11,
            TypeIdentifier::Time => 12,
            TypeIdentifier::Timetz => 13,
        }
    }

    pub fn from_oid(oid: i32) -> Option<Self> {
        match oid {
            21 => Some(TypeIdentifier::Int2),
            23 => Some(TypeIdentifier::Int4),
            20 => Some(TypeIdentifier::Int8),
            1700 => Some(TypeIdentifier::Numeric),
            700 => Some(TypeIdentifier::Float4),
            701 => Some(TypeIdentifier::Float8),
            16 => Some(TypeIdentifier::Bool),
            1042 => Some(TypeIdentifier::Char),
            1043 => Some(TypeIdentifier::Varchar),
            1082 => Some(TypeIdentifier::Date),
            1114 => Some(TypeIdentifier::Timestamp),
            1184 => Some(TypeIdentifier::Timestamptz),
            1083 => Some(TypeIdentifier::Time),
            1266 => Some(TypeIdentifier::Timetz),
            _ => None,
        }
    }

    pub fn to_oid(&self) -> i32 {
        *self as i32
    }

    /// Resolve a type name as written in DDL or catalog output.
    ///
    /// Case-insensitive, accepts SQL aliases and ignores a type modifier
    /// such as `(255)` or `(10,2)`.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        let base = match lower.find('(') {
            Some(paren) => {
                // Keep anything after the modifier, e.g. "timestamp(3) with time zone"
                let tail = lower[paren..].find(')').map(|close| &lower[paren + close + 1..]).unwrap_or("");
                format!("{}{}", lower[..paren].trim_end(), tail)
            }
            None => lower,
        };
        let base = base.split_whitespace().collect::<Vec<_>>().join(" ");

        match base.as_str() {
            "int2" | "smallint" => Some(TypeIdentifier::Int2),
            "int4" | "int" | "integer" => Some(TypeIdentifier::Int4),
            "int8" | "bigint" => Some(TypeIdentifier::Int8),
            "numeric" | "decimal" => Some(TypeIdentifier::Numeric),
            "float4" | "real" => Some(TypeIdentifier::Float4),
            "float8" | "double precision" | "float" => Some(TypeIdentifier::Float8),
            "bool" | "boolean" => Some(TypeIdentifier::Bool),
            "char" | "character" | "bpchar" | "nchar" => Some(TypeIdentifier::Char),
            "varchar" | "character varying" | "nvarchar" | "text" => Some(TypeIdentifier::Varchar),
            "date" => Some(TypeIdentifier::Date),
            "timestamp" | "timestamp without time zone" => Some(TypeIdentifier::Timestamp),
            "timestamptz" | "timestamp with time zone" => Some(TypeIdentifier::Timestamptz),
            "time" | "time without time zone" => Some(TypeIdentifier::Time),
            "timetz" | "time with time zone" => Some(TypeIdentifier::Timetz),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TypeIdentifier::Int2 => "int2",
            TypeIdentifier::Int4 => "int4",
            TypeIdentifier::Int8 => "int8",
            TypeIdentifier::Numeric => "numeric",
            TypeIdentifier::Float4 => "float4",
            TypeIdentifier::Float8 => "float8",
            TypeIdentifier::Bool => "bool",
            TypeIdentifier::Char => "char",
            TypeIdentifier::Varchar => "varchar",
            TypeIdentifier::Date => "date",
            TypeIdentifier::Timestamp => "timestamp",
            TypeIdentifier::Timestamptz => "timestamptz",
            TypeIdentifier::Time => "time",
            TypeIdentifier::Timetz => "timetz",
        }
    }

    /// Inclusive bounds of the integer types
    pub fn integer_bounds(&self) -> Option<(i64, i64)> {
        match self {
            TypeIdentifier::Int2 => Some((i16::MIN as i64, i16::MAX as i64)),
            TypeIdentifier::Int4 => Some((i32::MIN as i64, i32::MAX as i64)),
            TypeIdentifier::Int8 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            TypeIdentifier::Date
                | TypeIdentifier::Timestamp
                | TypeIdentifier::Timestamptz
                | TypeIdentifier::Time
                | TypeIdentifier::Timetz
        )
    }

    /// Whether decoding normalizes a zone offset to UTC
    pub fn has_time_zone(&self) -> bool {
        matches!(self, TypeIdentifier::Timestamptz | TypeIdentifier::Timetz)
    }
}

impl fmt::Display for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
