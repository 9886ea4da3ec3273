//! Record identifiers
//!
//! Customers, sales entries and cash entries are each addressed by their own
//! UUID newtype, so a cash entry id can never be passed where a sales entry
//! id is expected. Ids are UUIDv7, so they sort roughly by creation time.
//!
//! Displayed ids carry a short tag (`SAL-…`, `CSH-…`, `CUS-…`). Parsing
//! accepts either the tagged form or a bare UUID.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! ledger_id {
    ($(#[$meta:meta])* $name:ident => $tag:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Fresh time-ordered id
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub const fn tag() -> &'static str {
                $tag
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $tag, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bare = s.strip_prefix(concat!($tag, "-")).unwrap_or(s);
                Uuid::parse_str(bare).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

ledger_id!(
    /// Id of a customer account. Stable across renames.
    CustomerId => "CUS"
);

ledger_id!(
    /// Id of one sales entry
    SalesEntryId => "SAL"
);

ledger_id!(
    /// Id of one cash entry, including the zero-amount opening entry
    CashEntryId => "CSH"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_tagged() {
        assert!(SalesEntryId::new().to_string().starts_with("SAL-"));
    }

    #[test]
    fn test_tagged_and_bare_forms_parse() {
        let id = CashEntryId::new();
        assert_eq!(id.to_string().parse::<CashEntryId>().unwrap(), id);
        assert_eq!(id.as_uuid().to_string().parse::<CashEntryId>().unwrap(), id);
    }

    #[test]
    fn test_foreign_tag_is_rejected() {
        let sales = SalesEntryId::new().to_string();
        assert!(sales.parse::<CashEntryId>().is_err());
    }
}
