// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

// Server-side record ids are plain integers on the wire.
macro_rules! record_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            Default,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
        )]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                raw.trim().parse::<i64>().map(Self)
            }
        }
    };
}

record_id!(CategoryId);
record_id!(ItemId);
record_id!(FieldId);
record_id!(OptionId);
record_id!(SavedFilterId);
record_id!(LabelTemplateId);
record_id!(TaxId);
record_id!(WarehouseId);

#[cfg(test)]
mod tests {
    use super::{CategoryId, LabelTemplateId};

    #[test]
    fn ids_serialize_as_bare_integers() -> anyhow::Result<()> {
        let encoded = serde_json::to_string(&CategoryId::new(7))?;
        assert_eq!(encoded, "7");
        let decoded: CategoryId = serde_json::from_str("12")?;
        assert_eq!(decoded.get(), 12);
        Ok(())
    }

    #[test]
    fn ids_parse_from_trimmed_text() {
        assert_eq!(" 3 ".parse::<LabelTemplateId>(), Ok(LabelTemplateId::new(3)));
        assert!("three".parse::<LabelTemplateId>().is_err());
    }
}
