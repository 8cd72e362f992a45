//! Strongly-typed identifiers for CRM and storefront entities
//!
//! The CRM assigns sequential integer identifiers to every entity it owns.
//! Newtype wrappers prevent accidental mixing of identifier types, e.g.
//! passing a `PhoneId` where a `ContactId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! define_crm_id {
    ($name:ident, $entity:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Wraps a raw CRM identifier
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Returns the raw identifier value
            pub const fn as_u32(&self) -> u32 {
                self.0
            }

            /// Returns the CRM entity name this identifier belongs to
            pub const fn entity() -> &'static str {
                $entity
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> u32 {
                id.0
            }
        }
    };
}

// Contact entity and its sub-records
define_crm_id!(ContactId, "Contact");
define_crm_id!(AddressId, "Address");
define_crm_id!(PhoneId, "Phone");
define_crm_id!(EmailId, "Email");

// Financial entities
define_crm_id!(ContributionId, "Contribution");
define_crm_id!(FinancialTypeId, "FinancialType");
define_crm_id!(PaymentInstrumentId, "PaymentInstrument");
define_crm_id!(ContributionStatusId, "ContributionStatus");

// Custom data definitions
define_crm_id!(CustomGroupId, "CustomGroup");
define_crm_id!(CustomFieldId, "CustomField");

// Reference data
define_crm_id!(LocationTypeId, "LocationType");
define_crm_id!(CountryId, "Country");
define_crm_id!(StateProvinceId, "StateProvince");

/// Storefront order identifier
///
/// Owned by the storefront, not the CRM. Kept separate from the CRM id
/// macro so the two identifier families cannot be confused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    /// Wraps a raw storefront order identifier
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<u64> for OrderId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<OrderId> for u64 {
    fn from(id: OrderId) -> u64 {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crm_id_display_and_parse() {
        let id = ContactId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!("42".parse::<ContactId>().unwrap(), id);
        assert_eq!(ContactId::entity(), "Contact");
    }

    #[test]
    fn test_crm_id_serde_transparent() {
        let id = ContributionId::new(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
        let back: ContributionId = serde_json::from_str("7").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_order_id_roundtrip() {
        let id = OrderId::new(792);
        assert_eq!(id.as_u64(), 792);
        assert_eq!("792".parse::<OrderId>().unwrap(), id);
    }

    #[test]
    fn test_id_parse_rejects_garbage() {
        assert!("not-a-number".parse::<ContactId>().is_err());
        assert!("-1".parse::<OrderId>().is_err());
    }
}
