use std::fmt::Display;

use crate::{slice_from_c_api, str_from_c_api};

/// Represents a constant attribute value that can cross the plugin ABI boundary.
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub enum Value {
    Bool(bool),
    I64(i64),
    I64List(Vec<i64>),
    F32(f32),
    String(String),
}

impl Value {
    /// Creates a new [`Value::Bool`].
    pub fn r#bool<V: Into<bool>>(value: V) -> Self {
        Self::Bool(value.into())
    }

    /// Creates a new [`Value::I64`].
    pub fn i64<V: Into<i64>>(value: V) -> Self {
        Self::I64(value.into())
    }

    /// Creates a new [`Value::I64List`].
    pub fn i64_list<V: Into<Vec<i64>>>(value: V) -> Self {
        Self::I64List(value.into())
    }

    /// Creates a new [`Value::F32`].
    pub fn f32<V: Into<f32>>(value: V) -> Self {
        Self::F32(value.into())
    }

    /// Creates a new [`Value::String`].
    pub fn string<V: Into<String>>(value: V) -> Self {
        Self::String(value.into())
    }
}

impl Display for Value {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(value) => write!(formatter, "{value}"),
            Self::I64(value) => write!(formatter, "{value}"),
            Self::I64List(value) => write!(formatter, "{value:?}"),
            Self::F32(value) => write!(formatter, "{value}"),
            Self::String(value) => write!(formatter, "\"{value}\""),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::I64(value)
    }
}

impl From<Vec<i64>> for Value {
    fn from(value: Vec<i64>) -> Self {
        Self::I64List(value)
    }
}

impl<const N: usize> From<[i64; N]> for Value {
    fn from(value: [i64; N]) -> Self {
        Self::I64List(value.into())
    }
}

impl From<&[i64]> for Value {
    fn from(value: &[i64]) -> Self {
        Self::I64List(value.into())
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::F32(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

/// Represents a named [`Value`]. Named values are how plugins report attributes (e.g., plugin metadata, device
/// description attributes) and how callers pass free-form creation and compilation options to plugins.
#[derive(Clone, Debug, PartialEq)]
pub struct NamedValue {
    /// Name of the value.
    pub name: String,

    /// Underlying value.
    pub value: Value,
}

impl NamedValue {
    /// Constructs a new [`NamedValue`] from the provided [`AXR_NamedValue`](ffi::AXR_NamedValue) handle that came
    /// from a function in the plugin ABI. Panics if the handle carries a type tag outside the trusted set because
    /// that means the loaded plugin violated the ABI contract and no locally-recoverable state remains.
    pub(crate) unsafe fn from_c_api(handle: &ffi::AXR_NamedValue) -> Self {
        Self {
            name: str_from_c_api(handle.name, handle.name_size).into_owned(),
            value: match handle.value_type {
                ffi::AXR_NamedValue_Type_kBool => unsafe { Value::Bool(handle.value.bool_value) },
                ffi::AXR_NamedValue_Type_kInt64 => unsafe { Value::I64(handle.value.int64_value) },
                ffi::AXR_NamedValue_Type_kInt64List => unsafe {
                    let value_ptr = handle.value.int64_array_value;
                    let value_size = handle.value_size;
                    let value = slice_from_c_api(value_ptr, value_size);
                    Value::I64List(value.to_vec())
                },
                ffi::AXR_NamedValue_Type_kFloat => unsafe { Value::F32(handle.value.float_value) },
                ffi::AXR_NamedValue_Type_kString => unsafe {
                    let value_ptr = handle.value.string_value;
                    let value_size = handle.value_size;
                    let value = slice_from_c_api(value_ptr as *const u8, value_size);
                    Value::String(String::from_utf8_lossy(value).into_owned())
                },
                value_type => panic!("unsupported plugin attribute value type: {value_type}"),
            },
        }
    }

    /// Returns the [`AXR_NamedValue`](ffi::AXR_NamedValue) that corresponds to this [`NamedValue`] and which can
    /// be passed to functions in the plugin ABI.
    ///
    /// # Safety
    ///
    /// This function is marked as unsafe because the resulting [`AXR_NamedValue`](ffi::AXR_NamedValue) can become
    /// invalid after this [`NamedValue`] is dropped.
    pub(crate) unsafe fn to_c_api(&self) -> ffi::AXR_NamedValue {
        let name = self.name.as_ptr() as *const i8;
        let name_size = self.name.as_bytes().len();
        match &self.value {
            Value::Bool(value) => ffi::AXR_NamedValue::new(
                name,
                name_size,
                ffi::AXR_NamedValue_Type_kBool,
                ffi::AXR_Value { bool_value: *value },
                1,
            ),
            Value::I64(value) => ffi::AXR_NamedValue::new(
                name,
                name_size,
                ffi::AXR_NamedValue_Type_kInt64,
                ffi::AXR_Value { int64_value: *value },
                1,
            ),
            Value::I64List(value) => ffi::AXR_NamedValue::new(
                name,
                name_size,
                ffi::AXR_NamedValue_Type_kInt64List,
                ffi::AXR_Value { int64_array_value: value.as_ptr() },
                value.len(),
            ),
            Value::F32(value) => ffi::AXR_NamedValue::new(
                name,
                name_size,
                ffi::AXR_NamedValue_Type_kFloat,
                ffi::AXR_Value { float_value: *value },
                1,
            ),
            Value::String(value) => ffi::AXR_NamedValue::new(
                name,
                name_size,
                ffi::AXR_NamedValue_Type_kString,
                ffi::AXR_Value { string_value: value.as_ptr() as *const i8 },
                value.as_bytes().len(),
            ),
        }
    }

    /// Creates a new [`NamedValue`] with the provided name and underlying value.
    pub fn new<S: AsRef<str>, V: Into<Value>>(name: S, value: V) -> Self {
        Self { name: name.as_ref().to_string(), value: value.into() }
    }
}

impl Display for NamedValue {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{name}: {value}", name = self.name, value = self.value)
    }
}

#[allow(dead_code, non_camel_case_types, non_snake_case, non_upper_case_globals)]
pub(crate) mod ffi {
    use crate::ffi::AXR_Extension_Base;

    pub type AXR_NamedValue_Type = std::ffi::c_uint;
    pub const AXR_NamedValue_Type_kString: AXR_NamedValue_Type = 0;
    pub const AXR_NamedValue_Type_kInt64: AXR_NamedValue_Type = 1;
    pub const AXR_NamedValue_Type_kInt64List: AXR_NamedValue_Type = 2;
    pub const AXR_NamedValue_Type_kFloat: AXR_NamedValue_Type = 3;
    pub const AXR_NamedValue_Type_kBool: AXR_NamedValue_Type = 4;

    #[repr(C)]
    pub union AXR_Value {
        pub string_value: *const std::ffi::c_char,
        pub int64_value: i64,
        pub int64_array_value: *const i64,
        pub float_value: f32,
        pub bool_value: bool,
    }

    #[repr(C)]
    pub struct AXR_NamedValue {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub name: *const std::ffi::c_char,
        pub name_size: usize,
        pub value_type: AXR_NamedValue_Type,
        pub value: AXR_Value,
        pub value_size: usize,
    }

    impl AXR_NamedValue {
        pub fn new(
            name: *const std::ffi::c_char,
            name_size: usize,
            value_type: AXR_NamedValue_Type,
            value: AXR_Value,
            value_size: usize,
        ) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                name,
                name_size,
                value_type,
                value,
                value_size,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value() {
        let value_true = Value::r#bool(true);
        let value_false: Value = false.into();
        let value_0i64 = Value::i64(0);
        let value_42i64 = Value::i64(42);
        let value_m7i64: Value = (-7).into();
        let value_i64_list: Value = [4, 1, 1].into();
        let value_2p5f32: Value = 2.5f32.into();
        let value_2p75f32 = Value::f32(2.75);
        let value_0f32 = Value::f32(0.0);
        let value_empty_string = Value::string("");
        let value_hello_string: Value = "hello".into();
        assert_eq!(value_true, Value::r#bool(true));
        assert_ne!(value_false, value_true);
        assert_eq!(value_42i64, Value::i64(42));
        assert_ne!(value_0i64, value_m7i64);
        assert_ne!(value_42i64, value_true);
        assert_eq!(Value::from(i64::MAX), Value::i64(i64::MAX));
        assert_eq!(Value::i64_list([4, 1, 1]), value_i64_list);
        assert_ne!(Value::i64_list([4, 1, 2]), value_i64_list);
        assert_ne!(value_i64_list, value_0i64);
        assert_eq!(value_2p5f32, Value::f32(2.5));
        assert_ne!(value_2p5f32, value_2p75f32);
        assert_ne!(value_0f32, value_0i64);
        assert_ne!(value_0f32, value_empty_string);
        assert_eq!(Value::string(""), value_empty_string);
        assert_ne!(value_hello_string, value_empty_string);
        assert_eq!(Value::from("こんにちは"), Value::string("こんにちは"));
        assert!(Value::i64(1) < Value::i64(2));
        assert!(Value::i64(1) <= Value::i64(1));
        assert!(Value::f32(1.0) < Value::f32(2.0));
        assert!(Value::string("a") < Value::string("b"));
    }

    #[test]
    fn test_value_display_and_debug() {
        assert_eq!(format!("{}", Value::r#bool(true)), "true");
        assert_eq!(format!("{}", Value::i64(42)), "42");
        assert_eq!(format!("{}", Value::i64_list([1, 2, 3])), "[1, 2, 3]");
        assert_eq!(format!("{}", Value::f32(2.5)), "2.5");
        assert_eq!(format!("{}", Value::string("hello")), "\"hello\"");
        assert_eq!(format!("{:?}", Value::r#bool(true)), "Bool(true)");
        assert_eq!(format!("{:?}", Value::i64(42)), "I64(42)");
        assert_eq!(format!("{:?}", Value::i64_list([1, 2, 3])), "I64List([1, 2, 3])");
        assert_eq!(format!("{:?}", Value::f32(2.5)), "F32(2.5)");
        assert_eq!(format!("{:?}", Value::string("hello")), "String(\"hello\")");
    }

    #[test]
    fn test_named_value() {
        let value_0 = NamedValue::new("bool", true);
        let value_1 = NamedValue::new("list", [4, 1, 1]);
        let value_0_roundtripped = unsafe { NamedValue::from_c_api(&value_0.to_c_api()) };
        let value_1_roundtripped = unsafe { NamedValue::from_c_api(&value_1.to_c_api()) };
        assert_eq!(value_0, value_0_roundtripped);
        assert_ne!(value_0, value_1);
        assert_ne!(value_0, value_1_roundtripped);
        assert_eq!(value_1, value_1_roundtripped);

        let value_0 = NamedValue::new("value_0", vec![1, 2, 3]);
        let value_1 = NamedValue::new("value_1", Value::string("hello"));
        assert_eq!(value_0, value_0.clone());
        assert_ne!(value_0, value_1);
        assert_eq!(value_1.clone(), value_1.clone());
    }

    #[test]
    fn test_named_value_display_and_debug() {
        let value_0 = NamedValue::new("value_0", vec![1, 2, 3]);
        let value_1 = NamedValue::new("value_1", Value::string("hello"));
        assert_eq!(format!("{value_0}"), "value_0: [1, 2, 3]");
        assert_eq!(format!("{value_1}"), "value_1: \"hello\"");
        assert_eq!(format!("{value_0:?}"), "NamedValue { name: \"value_0\", value: I64List([1, 2, 3]) }");
        assert_eq!(format!("{value_1:?}"), "NamedValue { name: \"value_1\", value: String(\"hello\") }");
    }
}
