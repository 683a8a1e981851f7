//! Typed identifiers.
//!
//! Every entity gets its own UUID newtype so a `TenantId` can never be
//! handed to a function expecting a `CustomerId`. Identifiers serialize as
//! plain hyphenated strings, which is also how they are stored in SQL text
//! columns and rendered into bill numbers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Mint a fresh random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Wrap a UUID obtained elsewhere (storage, a request body).
            #[must_use]
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying UUID.
            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Identifies a [`Tenant`](crate::tenant::Tenant), the billing platform's
    /// customer organization.
    TenantId
);

define_id!(
    /// Identifies a [`Customer`](crate::customer::Customer) of a tenant.
    CustomerId
);

define_id!(
    /// Identifies a [`SubscriptionPackage`](crate::package::SubscriptionPackage).
    PackageId
);

define_id!(
    /// Identifies an [`Invoice`](crate::invoice::Invoice).
    InvoiceId
);

define_id!(
    /// Identifies a [`Notification`](crate::notification::Notification).
    NotificationId
);

define_id!(
    /// Identifies an [`AuditEntry`](crate::audit::AuditEntry).
    AuditEntryId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_mint_distinct_ids() {
        assert_ne!(TenantId::new(), TenantId::new());
    }

    #[test]
    fn should_parse_what_display_produced() {
        let id = InvoiceId::new();
        let parsed: InvoiceId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn should_serialize_as_a_plain_hyphenated_string() {
        let id = CustomerId::from_uuid(uuid::uuid!("0192d3a8-1111-7000-8000-000000000001"));
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0192d3a8-1111-7000-8000-000000000001\"");
        let parsed: CustomerId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn should_reject_garbage_instead_of_guessing() {
        assert!(TenantId::from_str("not-a-uuid").is_err());
        assert!(TenantId::from_str("").is_err());
    }

    #[test]
    fn should_expose_the_wrapped_uuid() {
        let uuid = uuid::Uuid::new_v4();
        assert_eq!(AuditEntryId::from_uuid(uuid).as_uuid(), uuid);
    }
}
