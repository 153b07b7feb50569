use std::borrow::Cow;
use std::fmt::{Debug, Display};

use crate::{Api, Client, Device, Error, invoke_plugin_api_error_fn, str_from_c_api};

/// Type alias used to represent [`Memory`] IDs, which are unique among all memories of the same type.
pub type MemoryId = usize;

/// Type alias used to represent platform-dependent IDs that uniquely identify the kinds of [`Memory`]s.
pub type MemoryKindId = usize;

/// Memory space managed by a backend [`Plugin`](crate::Plugin). Memory spaces can be used to describe locations of
/// memory. These can either be _unpinned_ and free to live anywhere but be accessible from a [`Device`], or they can
/// be _pinned_ and must live on a specific [`Device`]. Memory spaces know the [`Device`]s (note the plural) that can
/// address them through the device/memory graph that their owning [`Client`] constructs once at client creation
/// time.
///
/// The lifetime parameter `'c` captures the owning [`Client`], ensuring that the client outlives the memory.
#[derive(Copy, Clone)]
pub struct Memory<'c> {
    /// Handle that represents this [`Memory`] in the plugin ABI.
    handle: *mut ffi::AXR_Memory,

    /// [`Client`] that owns this [`Memory`].
    client: &'c Client,
}

impl<'c> Memory<'c> {
    /// Constructs a new [`Memory`] from the provided [`AXR_Memory`](ffi::AXR_Memory) handle that came
    /// from a function in the plugin ABI.
    pub(crate) unsafe fn from_c_api(handle: *mut ffi::AXR_Memory, client: &'c Client) -> Result<Self, Error> {
        if handle.is_null() {
            Err(Error::invalid_argument("the provided plugin memory handle is a null pointer"))
        } else {
            Ok(Self { handle, client })
        }
    }

    /// Returns the [`AXR_Memory`](ffi::AXR_Memory) that corresponds to this [`Memory`] and which can
    /// be passed to functions in the plugin ABI.
    pub(crate) unsafe fn to_c_api(&self) -> *mut ffi::AXR_Memory {
        self.handle
    }

    /// Returns the underlying plugin [`Api`].
    pub(crate) fn api(&self) -> Api {
        self.client.api()
    }

    /// Returns the [`Client`] that owns this [`Memory`].
    pub fn client(&self) -> &'c Client {
        self.client
    }

    /// ID of this [`Memory`] that is unique among all memories of the same type.
    pub fn id(&self) -> Result<MemoryId, Error> {
        use ffi::AXR_Memory_Id_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Memory_Id, { memory = self.to_c_api() }, { id })
            .map(|id| id as usize)
    }

    /// Platform-dependent ID that uniquely identifies the kind of this [`Memory`].
    pub fn kind_id(&self) -> Result<MemoryKindId, Error> {
        use ffi::AXR_Memory_Kind_Id_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Memory_Kind_Id, { memory = self.to_c_api() }, { kind_id })
            .map(|id| id as usize)
    }

    /// Platform-dependent string that uniquely identifies the kind of this [`Memory`].
    pub fn kind(&'_ self) -> Result<Cow<'_, str>, Error> {
        use ffi::AXR_Memory_Kind_Args;
        invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Memory_Kind,
            { memory = self.to_c_api() },
            { kind, kind_size },
        )
        .map(|(string, string_len)| str_from_c_api(string, string_len))
    }

    /// [`Device`]s that can address this [`Memory`]. This is answered from the device/memory graph that the owning
    /// [`Client`] constructed when it was created, without calling into the plugin.
    pub fn addressable_by_devices(&self) -> Vec<Device<'c>> {
        self.client.devices_for_memory(self.handle)
    }
}

impl Display for Memory<'_> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ffi::AXR_Memory_ToString_Args;
        match invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Memory_ToString,
            { memory = self.to_c_api() },
            { to_string, to_string_size },
        ) {
            Ok((string, string_len)) => write!(formatter, "{}", str_from_c_api(string, string_len)),
            Err(error) => write!(formatter, "<failed to render memory as string; {}>", error),
        }
    }
}

impl Debug for Memory<'_> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ffi::AXR_Memory_DebugString_Args;
        match invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Memory_DebugString,
            { memory = self.to_c_api() },
            { debug_string, debug_string_size },
        ) {
            Ok((string, string_len)) => write!(formatter, "{}", str_from_c_api(string, string_len)),
            Err(error) => write!(formatter, "<failed to render memory as debug string; {:?}>", error),
        }
    }
}

impl PartialEq for Memory<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id().is_ok()
            && other.id().is_ok()
            && self.id() == other.id()
            && self.kind_id().is_ok()
            && other.kind_id().is_ok()
            && self.kind_id() == other.kind_id()
    }
}

impl Eq for Memory<'_> {}

#[allow(dead_code, non_camel_case_types, non_snake_case, non_upper_case_globals)]
pub(crate) mod ffi {
    use std::marker::{PhantomData, PhantomPinned};

    use crate::devices::ffi::AXR_Device;
    use crate::errors::ffi::AXR_Error;
    use crate::ffi::AXR_Extension_Base;

    // We represent opaque C types as structs with a particular structure that is following the convention
    // suggested in [the Rustonomicon](https://doc.rust-lang.org/nomicon/ffi.html#representing-opaque-structs).
    #[repr(C)]
    pub struct AXR_Memory {
        _data: [u8; 0],
        _marker: PhantomData<(*mut u8, PhantomPinned)>,
    }

    #[repr(C)]
    pub struct AXR_Memory_Id_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub memory: *mut AXR_Memory,
        pub id: std::ffi::c_int,
    }

    impl AXR_Memory_Id_Args {
        pub fn new(memory: *mut AXR_Memory) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), memory, id: 0 }
        }
    }

    pub type AXR_Memory_Id = unsafe extern "C" fn(args: *mut AXR_Memory_Id_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Memory_Kind_Id_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub memory: *mut AXR_Memory,
        pub kind_id: std::ffi::c_int,
    }

    impl AXR_Memory_Kind_Id_Args {
        pub fn new(memory: *mut AXR_Memory) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), memory, kind_id: 0 }
        }
    }

    pub type AXR_Memory_Kind_Id = unsafe extern "C" fn(args: *mut AXR_Memory_Kind_Id_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Memory_Kind_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub memory: *mut AXR_Memory,
        pub kind: *const std::ffi::c_char,
        pub kind_size: usize,
    }

    impl AXR_Memory_Kind_Args {
        pub fn new(memory: *mut AXR_Memory) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                memory,
                kind: std::ptr::null_mut(),
                kind_size: 0,
            }
        }
    }

    pub type AXR_Memory_Kind = unsafe extern "C" fn(args: *mut AXR_Memory_Kind_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Memory_AddressableByDevices_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub memory: *mut AXR_Memory,
        pub devices: *const *mut AXR_Device,
        pub num_devices: usize,
    }

    impl AXR_Memory_AddressableByDevices_Args {
        pub fn new(memory: *mut AXR_Memory) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                memory,
                devices: std::ptr::null(),
                num_devices: 0,
            }
        }
    }

    pub type AXR_Memory_AddressableByDevices =
        unsafe extern "C" fn(args: *mut AXR_Memory_AddressableByDevices_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Memory_ToString_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub memory: *mut AXR_Memory,
        pub to_string: *const std::ffi::c_char,
        pub to_string_size: usize,
    }

    impl AXR_Memory_ToString_Args {
        pub fn new(memory: *mut AXR_Memory) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                memory,
                to_string: std::ptr::null(),
                to_string_size: 0,
            }
        }
    }

    pub type AXR_Memory_ToString = unsafe extern "C" fn(args: *mut AXR_Memory_ToString_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Memory_DebugString_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub memory: *mut AXR_Memory,
        pub debug_string: *const std::ffi::c_char,
        pub debug_string_size: usize,
    }

    impl AXR_Memory_DebugString_Args {
        pub fn new(memory: *mut AXR_Memory) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                memory,
                debug_string: std::ptr::null(),
                debug_string_size: 0,
            }
        }
    }

    pub type AXR_Memory_DebugString = unsafe extern "C" fn(args: *mut AXR_Memory_DebugString_Args) -> *mut AXR_Error;
}
