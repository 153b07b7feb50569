use std::fmt::Display;

/// Plugin ABI [`Version`] that this crate has been built for.
pub static VERSION: Version = Version { major: ffi::AXR_API_MAJOR as usize, minor: ffi::AXR_API_MINOR as usize };

/// Represents the version of a plugin ABI. Callers can check for forward compatibility of a loaded plugin by using
/// [`Api::version`](crate::Api::version) to check whether the implementation is aware of newer interface additions.
/// Newly-added capabilities must always be probed before use (a probe failure surfaces as
/// [`Error::Unimplemented`](crate::Error::Unimplemented)), never assumed present based on the version number alone.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    /// Major version number. This number is incremented when an ABI-incompatible change is made to the plugin
    /// interface. Such changes include deleting a function or an argument, changing the type of an argument,
    /// re-arranging fields in any of the ABI records, etc.
    pub major: usize,

    /// Minor version number. This number is incremented when the plugin interface is updated in a way that is
    /// potentially ABI-compatible with older versions, if supported by the caller and/or the implementation.
    /// Such changes include adding a new field to any of the ABI records, renaming a function or argument, etc.
    pub minor: usize,
}

impl Display for Version {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}.{}", self.major, self.minor)
    }
}

#[allow(dead_code, non_camel_case_types, non_snake_case, non_upper_case_globals)]
pub(crate) mod ffi {
    use crate::ffi::AXR_Extension_Base;

    pub const AXR_API_MAJOR: u32 = 1;
    pub const AXR_API_MINOR: u32 = 4;

    #[repr(C)]
    pub struct AXR_Api_Version {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub major_version: std::ffi::c_int,
        pub minor_version: std::ffi::c_int,
    }

    impl AXR_Api_Version {
        pub fn new(major_version: std::ffi::c_int, minor_version: std::ffi::c_int) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), major_version, minor_version }
        }
    }
}
