use crate::metadata::{Describe, SimpleKind, TypeDescriptor, TypeKind, TypeRef};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A key and a value bound as `<name>.Key` and `<name>.Value`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyValuePair<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> KeyValuePair<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

macro_rules! describe_signed {
    ($($ty:ident)*) => {
        $(
        impl Describe for $ty {
            fn describe() -> TypeDescriptor {
                TypeDescriptor::simple(stringify!($ty), SimpleKind::Signed { min: i64::from($ty::MIN), max: i64::from($ty::MAX) })
            }
        }
        )*
    };
}

macro_rules! describe_unsigned {
    ($($ty:ident)*) => {
        $(
        impl Describe for $ty {
            fn describe() -> TypeDescriptor {
                TypeDescriptor::simple(stringify!($ty), SimpleKind::Unsigned { max: u64::from($ty::MAX) })
            }
        }
        )*
    };
}

describe_signed! { i8 i16 i32 i64 }
describe_unsigned! { u8 u16 u32 u64 }

impl Describe for bool {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::simple("bool", SimpleKind::Bool)
    }
}

impl Describe for f32 {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::simple("f32", SimpleKind::Float { max: f64::from(f32::MAX) })
    }
}

impl Describe for f64 {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::simple("f64", SimpleKind::Float { max: f64::MAX })
    }
}

impl Describe for char {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::simple("char", SimpleKind::Char)
    }
}

impl Describe for String {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::simple("String", SimpleKind::String)
    }
}

impl<T: Describe> Describe for Option<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(std::any::type_name::<Self>(), TypeKind::Nullable(TypeRef::of::<T>()))
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(std::any::type_name::<Self>(), TypeKind::Collection(TypeRef::of::<T>()))
    }
}

impl<K: Describe, V: Describe> Describe for KeyValuePair<K, V> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(
            std::any::type_name::<Self>(),
            TypeKind::KeyValuePair { key: TypeRef::of::<K>(), value: TypeRef::of::<V>() },
        )
    }
}

impl<K: Describe, V: Describe> Describe for HashMap<K, V> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(
            std::any::type_name::<Self>(),
            TypeKind::Dictionary { key: TypeRef::of::<K>(), value: TypeRef::of::<V>() },
        )
    }
}

impl<K: Describe, V: Describe> Describe for BTreeMap<K, V> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(
            std::any::type_name::<Self>(),
            TypeKind::Dictionary { key: TypeRef::of::<K>(), value: TypeRef::of::<V>() },
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::metadata::{Describe, KeyValuePair, SimpleKind, TypeKind, TypeRef};
    use std::collections::HashMap;

    #[test]
    fn test_integer_bounds() {
        match u8::describe().kind() {
            TypeKind::Simple(SimpleKind::Unsigned { max }) => assert_eq!(*max, 255),
            kind => panic!("unexpected kind {kind:?}"),
        }
        match i16::describe().kind() {
            TypeKind::Simple(SimpleKind::Signed { min, max }) => assert_eq!((*min, *max), (-32768, 32767)),
            kind => panic!("unexpected kind {kind:?}"),
        }
    }

    #[test]
    fn test_float_bounds() {
        match f32::describe().kind() {
            TypeKind::Simple(SimpleKind::Float { max }) => assert_eq!(*max, f64::from(f32::MAX)),
            kind => panic!("unexpected kind {kind:?}"),
        }
        match f64::describe().kind() {
            TypeKind::Simple(SimpleKind::Float { max }) => assert_eq!(*max, f64::MAX),
            kind => panic!("unexpected kind {kind:?}"),
        }
    }

    #[test]
    fn test_generic_shapes() {
        assert!(matches!(Option::<i32>::describe().kind(), TypeKind::Nullable(inner) if *inner == TypeRef::of::<i32>()));
        assert!(matches!(Vec::<String>::describe().kind(), TypeKind::Collection(inner) if *inner == TypeRef::of::<String>()));
        assert!(matches!(
            KeyValuePair::<String, i32>::describe().kind(),
            TypeKind::KeyValuePair { key, value } if *key == TypeRef::of::<String>() && *value == TypeRef::of::<i32>()
        ));
        assert!(matches!(HashMap::<String, u8>::describe().kind(), TypeKind::Dictionary { .. }));
    }

    #[test]
    fn test_key_value_pair_serializes_pascal_case() {
        let json = serde_json::to_value(KeyValuePair::new("a".to_string(), 1)).unwrap();
        assert_eq!(json, serde_json::json!({ "Key": "a", "Value": 1 }));
    }
}
