//! Newtype IDs for storefront global IDs.
//!
//! The Storefront API identifies every node with an opaque global ID such as
//! `gid://shopify/ProductVariant/44012345678`. The `define_gid!` macro wraps
//! those strings so a cart line ID can never be passed where a variant ID is
//! expected.

/// Prefix shared by all storefront global IDs.
pub const GID_PREFIX: &str = "gid://shopify/";

/// Macro to define a type-safe global ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `new()`, `as_str()`, `into_inner()` and `resource_id()`
/// - `From<String>`, `From<&str>` and `Display`
///
/// # Example
///
/// ```rust
/// # use wrapsody_core::define_gid;
/// define_gid!(VariantId, "ProductVariant");
/// define_gid!(CartLineId, "CartLine");
///
/// let variant = VariantId::new("gid://shopify/ProductVariant/1");
/// assert_eq!(variant.resource_id(), Some("1"));
///
/// // These are different types, so this won't compile:
/// // let _: CartLineId = variant;
/// ```
#[macro_export]
macro_rules! define_gid {
    ($name:ident, $resource:literal) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Storefront resource type encoded in the global ID.
            pub const RESOURCE: &'static str = $resource;

            /// Wrap a raw global ID.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Build a global ID from a numeric resource ID.
            #[must_use]
            pub fn from_resource_id(id: impl ::core::fmt::Display) -> Self {
                Self(format!("{}{}/{}", $crate::types::id::GID_PREFIX, $resource, id))
            }

            /// Get the raw global ID.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the raw global ID.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// The trailing resource ID, if this is a well-formed global ID
            /// for this resource type. Query strings (cart IDs carry a `?key=`)
            /// are stripped.
            #[must_use]
            pub fn resource_id(&self) -> Option<&str> {
                let rest = self.0.strip_prefix($crate::types::id::GID_PREFIX)?;
                let rest = rest.strip_prefix($resource)?.strip_prefix('/')?;
                let id = rest.split('?').next().unwrap_or(rest);
                (!id.is_empty()).then_some(id)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_gid!(ProductId, "Product");
define_gid!(VariantId, "ProductVariant");
define_gid!(CollectionId, "Collection");
define_gid!(CartId, "Cart");
define_gid!(CartLineId, "CartLine");
define_gid!(CustomerId, "Customer");
define_gid!(OrderId, "Order");
define_gid!(ImageId, "ProductImage");

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_id() {
        let id = VariantId::new("gid://shopify/ProductVariant/42");
        assert_eq!(id.resource_id(), Some("42"));
    }

    #[test]
    fn test_resource_id_wrong_type() {
        let id = VariantId::new("gid://shopify/Product/42");
        assert_eq!(id.resource_id(), None);
    }

    #[test]
    fn test_cart_id_strips_key() {
        let id = CartId::new("gid://shopify/Cart/c1-abc?key=deadbeef");
        assert_eq!(id.resource_id(), Some("c1-abc"));
    }

    #[test]
    fn test_from_resource_id() {
        let id = CollectionId::from_resource_id(7);
        assert_eq!(id.as_str(), "gid://shopify/Collection/7");
    }

    #[test]
    fn test_serde_transparent() {
        let id = ProductId::new("gid://shopify/Product/1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"gid://shopify/Product/1\"");
        let back: ProductId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
