/// Defines a newtype identifier around an integer scalar (typically `i64`)
/// and generates:
/// - derives (Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)
/// - transparent serde representation, so ids read and write as bare numbers
/// - `Display`
/// - `From<$inner> for $name` and `From<$name> for $inner`
///
/// Usage:
///   define_id_type!(i64, BugId);
#[macro_export]
macro_rules! define_id_type {
    ($inner:ty, $name:ident) => {
        #[derive(
            Debug,
            Copy,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::write!(f, "{}", self.0)
            }
        }

        impl ::std::convert::From<$inner> for $name {
            fn from(v: $inner) -> Self {
                $name(v)
            }
        }

        impl ::std::convert::From<$name> for $inner {
            fn from(v: $name) -> Self {
                v.0
            }
        }

        impl $name {
            pub fn new(value: $inner) -> Self {
                $name(value)
            }

            pub fn value(&self) -> $inner {
                self.0
            }
        }
    };
}

crate::define_id_type!(i64, ResourceId);
crate::define_id_type!(i64, ProjectId);
crate::define_id_type!(i64, CategoryId);
crate::define_id_type!(i64, BugId);

#[cfg(test)]
mod tests {
    use super::{BugId, ResourceId};

    #[test]
    fn test_id_display_and_conversions() {
        let id = BugId::new(4711);
        assert_eq!(id.to_string(), "4711");
        assert_eq!(i64::from(id), 4711);
        assert_eq!(BugId::from(4711), id);
        assert_eq!(id.value(), 4711);
    }

    #[test]
    fn test_id_serializes_as_bare_number() {
        let json = serde_json::to_string(&ResourceId(7)).unwrap();
        assert_eq!(json, "7");
        let back: ResourceId = serde_json::from_str("7").unwrap();
        assert_eq!(back, ResourceId(7));
    }
}
