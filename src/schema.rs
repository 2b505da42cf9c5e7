//! Item sequences described as strings, e.g. `"int,real,nrvec:10,string"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::item::ItemKind;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    #[error("empty item in schema")]
    Empty,
    #[error("{0}")]
    UnknownKind(String),
    #[error("invalid count '{0}'")]
    BadCount(String),
    #[error("count {count} is only allowed for UCHAR or NRVEC, not {kind}")]
    CountNotAllowed { kind: ItemKind, count: usize },
}

/// One item of a [`Schema`]: kind plus element count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSpec {
    pub kind:  ItemKind,
    pub count: usize,
}

impl ItemSpec {
    pub fn new(kind: ItemKind, count: usize) -> Result<Self, SchemaError> {
        if count != 1 && !kind.is_array() {
            return Err(SchemaError::CountNotAllowed { kind, count });
        }
        Ok(Self { kind, count })
    }
}

impl FromStr for ItemSpec {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SchemaError::Empty);
        }
        let (kind, count) = match s.split_once(':') {
            Some((k, n)) => {
                let n = n.trim();
                (k, n.parse().map_err(|_| SchemaError::BadCount(n.to_owned()))?)
            }
            None => (s, 1),
        };
        let kind = kind.trim().parse().map_err(SchemaError::UnknownKind)?;
        Self::new(kind, count)
    }
}

impl fmt::Display for ItemSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.kind.name().to_lowercase();
        if self.count == 1 {
            f.write_str(&name)
        } else {
            write!(f, "{name}:{}", self.count)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema(pub Vec<ItemSpec>);

impl Schema {
    pub fn items(&self) -> &[ItemSpec] {
        &self.0
    }
}

impl FromStr for Schema {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',').map(str::parse).collect::<Result<_, _>>().map(Schema)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, spec) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{spec}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kinds_and_counts() {
        let schema: Schema = "int, real,rvec,nrvec:10,uchar:4,STRING".parse().unwrap();
        assert_eq!(
            schema.items(),
            &[
                ItemSpec { kind: ItemKind::Int,    count: 1 },
                ItemSpec { kind: ItemKind::Real,   count: 1 },
                ItemSpec { kind: ItemKind::RVec,   count: 1 },
                ItemSpec { kind: ItemKind::NRVec,  count: 10 },
                ItemSpec { kind: ItemKind::UChar,  count: 4 },
                ItemSpec { kind: ItemKind::String, count: 1 },
            ]
        );
        assert_eq!(schema.to_string(), "int,real,rvec,nrvec:10,uchar:4,string");
    }

    #[test]
    fn rejects_bad_items() {
        assert_eq!("int,,real".parse::<Schema>(), Err(SchemaError::Empty));
        assert_eq!("nrvec:x".parse::<Schema>(), Err(SchemaError::BadCount("x".into())));
        assert!(matches!("quad".parse::<Schema>(), Err(SchemaError::UnknownKind(_))));
        assert_eq!(
            "rvec:2".parse::<Schema>(),
            Err(SchemaError::CountNotAllowed { kind: ItemKind::RVec, count: 2 })
        );
    }

    #[test]
    fn zero_length_arrays_are_allowed() {
        let spec: ItemSpec = "uchar:0".parse().unwrap();
        assert_eq!(spec.count, 0);
    }
}
