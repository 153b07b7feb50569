use std::borrow::Cow;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::OnceLock;

use crate::{
    Api, Client, DeviceDescription, Error, NamedValue, Plugin, Value, hash_map_from_c_api, invoke_plugin_api_error_fn,
    slice_from_c_api, str_from_c_api,
};

/// Represents a [`Device`](crate::Device) topology managed by a backend [`Plugin`].
///
/// The lifetime parameter `'o` represents the lifetime of the owner of this [`Topology`] (e.g., a [`Client`])
/// if it is borrowed. If it is not borrowed, then it will be set to `'static`.
pub struct Topology<'o> {
    /// Handle that represents this [`Topology`] in the plugin ABI.
    handle: *mut ffi::AXR_Topology,

    /// Underlying plugin [`Api`].
    api: Api,

    /// Cached [`Topology::attributes`] of this [`Topology`] so that it will only be constructed once.
    attributes: OnceLock<Result<HashMap<String, Value>, Error>>,

    /// Boolean flag indicating whether this [`Topology`] is borrowed or owned. This influences the behavior
    /// of [`Topology`]'s [`Drop`] implementation as it will only free the underlying memory if the topology
    /// is owned (i.e., `is_borrowed` is set to `false`).
    is_borrowed: bool,

    /// [`PhantomData`] used to track the lifetime of the owner of this [`Topology`], if it is borrowed.
    /// If it is not borrowed, then the lifetime is `'static`.
    owner: PhantomData<&'o ()>,
}

impl Topology<'_> {
    /// Constructs a new [`Topology`] from the provided [`AXR_Topology`](ffi::AXR_Topology) handle that came
    /// from a function in the plugin ABI.
    pub(crate) unsafe fn from_c_api(
        handle: *mut ffi::AXR_Topology,
        api: Api,
        is_borrowed: bool,
    ) -> Result<Self, Error> {
        if handle.is_null() {
            Err(Error::invalid_argument("the provided plugin topology handle is a null pointer"))
        } else {
            Ok(Self { handle, api, attributes: OnceLock::new(), is_borrowed, owner: PhantomData })
        }
    }

    /// Returns the [`AXR_Topology`](ffi::AXR_Topology) that corresponds to this [`Topology`]
    /// and which can be passed to functions in the plugin ABI.
    pub(crate) unsafe fn to_c_api(&self) -> *mut ffi::AXR_Topology {
        self.handle
    }

    /// Returns the underlying plugin [`Api`].
    pub(crate) fn api(&self) -> Api {
        self.api
    }

    /// Returns a string that identifies the platform of this [`Topology`].
    pub fn platform_name(&'_ self) -> Result<Cow<'_, str>, Error> {
        use ffi::AXR_Topology_PlatformName_Args;
        invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Topology_PlatformName,
            { topology = self.to_c_api() },
            { platform_name, platform_name_size },
        )
        .map(|(string, string_len)| str_from_c_api(string, string_len))
    }

    /// Returns a string that contains human-readable, platform-specific, version information for this [`Topology`]
    /// (e.g., the driver version for the underlying accelerator stack).
    pub fn platform_version(&'_ self) -> Result<Cow<'_, str>, Error> {
        use ffi::AXR_Topology_PlatformVersion_Args;
        invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Topology_PlatformVersion,
            { topology = self.to_c_api() },
            { platform_version, platform_version_size },
        )
        .map(|(string, string_len)| str_from_c_api(string, string_len))
    }

    /// Returns [`DeviceDescription`]s for all [`Device`](crate::Device)s in this [`Topology`]. Note that the device
    /// descriptions can be returned in an arbitrary order, but will always be returned in the same order across
    /// multiple calls to this function from within the same process.
    pub fn device_descriptions(&'_ self) -> Result<Vec<DeviceDescription<'_>>, Error> {
        use ffi::AXR_Topology_GetDeviceDescriptions_Args;
        invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Topology_GetDeviceDescriptions,
            { topology = self.to_c_api() },
            { descriptions, num_descriptions },
        )
        .and_then(|(descriptions, descriptions_count)| {
            unsafe { slice_from_c_api(descriptions, descriptions_count) }
                .iter()
                .map(|handle| unsafe { DeviceDescription::from_c_api(*handle, self.api()) })
                .collect::<Result<Vec<_>, _>>()
        })
    }

    /// [`Value`] of the attribute with the provided name attached to this [`Topology`], or [`Error::NotFound`]
    /// if no such attribute is attached to this [`Topology`].
    pub fn attribute<N: AsRef<str>>(&self, name: N) -> Result<&Value, Error> {
        let name = name.as_ref();
        self.attributes()?
            .get(&name.to_string())
            .ok_or_else(|| Error::not_found(format!("no attribute named '{name}' in this topology")))
    }

    /// Collection of [`Topology`]-specific named attributes that are attached to this [`Topology`].
    pub fn attributes(&self) -> Result<&HashMap<String, Value>, Error> {
        self.attributes
            .get_or_init(|| {
                use ffi::AXR_Topology_Attributes_Args;
                let (attributes, attribute_count) = invoke_plugin_api_error_fn!(
                    self.api(),
                    AXR_Topology_Attributes,
                    { topology = self.to_c_api() },
                    { attributes, num_attributes },
                )?;
                Ok(hash_map_from_c_api(attributes, attribute_count))
            })
            .as_ref()
            .map_err(|error| error.clone())
    }

    /// Serializes this [`Topology`] into a [`SerializedTopology`] (i.e., a byte array).
    pub fn serialize(&self) -> Result<SerializedTopology, Error> {
        use ffi::AXR_Topology_Serialize_Args;
        invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Topology_Serialize,
            { topology = self.to_c_api() },
            { serialized_bytes, serialized_bytes_size, serialized_topology, serialized_topology_deleter },
        )
        .map(|(serialized_bytes, serialized_bytes_size, serialized_topology, serialized_topology_deleter)| {
            SerializedTopology {
                handle: serialized_topology,
                deleter: serialized_topology_deleter,
                data: serialized_bytes,
                data_size: serialized_bytes_size,
            }
        })
    }
}

impl Hash for Topology<'_> {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        self.serialize().expect("failed to serialize plugin topology").data().hash(hasher)
    }
}

impl Drop for Topology<'_> {
    fn drop(&mut self) {
        if !self.is_borrowed {
            use ffi::AXR_Topology_Destroy_Args;
            invoke_plugin_api_error_fn!(self.api(), AXR_Topology_Destroy, { topology = self.to_c_api() })
                .expect("failed to destroy plugin topology");
        }
    }
}

impl Client {
    /// Returns the runtime [`Topology`] of this [`Client`]. The returned [`Topology`] is borrowed from this
    /// [`Client`] and remains owned by the plugin.
    pub fn topology(&'_ self) -> Result<Topology<'_>, Error> {
        use ffi::AXR_Client_TopologyDescription_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Client_TopologyDescription, { client = self.to_c_api() }, {
            topology
        })
        .and_then(|handle| unsafe { Topology::from_c_api(handle, self.api(), true) })
    }

    /// Deserializes the provided data into a [`Topology`]. Note that the provided data must be the result of
    /// [`Topology::serialize`].
    pub fn deserialize_topology(&self, data: &[u8]) -> Result<Topology<'static>, Error> {
        self.api().deserialize_topology(data)
    }
}

impl Plugin {
    /// Constructs a new [`Topology`] using the provided name and (optional) platform-specific options.
    pub fn topology<N: AsRef<str>>(
        &self,
        name: N,
        options: HashMap<String, Value>,
    ) -> Result<Topology<'static>, Error> {
        self.api().topology(name, options)
    }

    /// Deserializes the provided data into a [`Topology`]. Note that the provided data must be the result of
    /// [`Topology::serialize`].
    pub fn deserialize_topology(&self, data: &[u8]) -> Result<Topology<'static>, Error> {
        self.api().deserialize_topology(data)
    }
}

impl Api {
    /// Constructs a new [`Topology`] using the provided name and (optional) platform-specific options.
    pub(crate) fn topology<N: AsRef<str>>(
        &self,
        name: N,
        options: HashMap<String, Value>,
    ) -> Result<Topology<'static>, Error> {
        use ffi::AXR_Topology_Create_Args;
        let name = name.as_ref();
        let options = options.into_iter().map(|(name, value)| NamedValue::new(name, value)).collect::<Vec<_>>();
        let options = options.iter().map(|option| unsafe { option.to_c_api() }).collect::<Vec<_>>();
        invoke_plugin_api_error_fn!(
            *self,
            AXR_Topology_Create,
            {
                topology_name = name.as_ptr() as *const _,
                topology_name_size = name.len(),
                create_options = options.as_slice().as_ptr(),
                num_options = options.len(),
            },
            { topology },
        )
        .and_then(|handle| unsafe { Topology::from_c_api(handle, *self, false) })
    }

    /// Deserializes the provided data into a [`Topology`].
    pub(crate) fn deserialize_topology(&self, data: &[u8]) -> Result<Topology<'static>, Error> {
        use ffi::AXR_Topology_Deserialize_Args;
        invoke_plugin_api_error_fn!(
            *self,
            AXR_Topology_Deserialize,
            { serialized_topology = data.as_ptr() as *const _, serialized_topology_size = data.len() },
            { topology },
        )
        .and_then(|handle| unsafe { Topology::from_c_api(handle, *self, false) })
    }
}

/// Serialized [`Topology`]. Note that the serialization format is platform-specific and is not guaranteed to be
/// stable over time.
pub struct SerializedTopology {
    /// Handle that represents this [`SerializedTopology`] in the plugin ABI.
    handle: *mut ffi::AXR_SerializedTopology,

    /// Optional function that must be called to free the underlying memory when dropping this instance.
    deleter: Option<unsafe extern "C" fn(topology: *mut ffi::AXR_SerializedTopology)>,

    /// Pointer to the underlying bytes of this [`SerializedTopology`].
    data: *const std::ffi::c_char,

    /// Size (i.e., number of bytes) of this [`SerializedTopology`].
    data_size: usize,
}

impl SerializedTopology {
    /// Returns a pointer to the underlying bytes of this [`SerializedTopology`].
    pub fn data(&self) -> &[u8] {
        unsafe { slice_from_c_api(self.data as *const _, self.data_size) }
    }
}

impl std::fmt::Debug for SerializedTopology {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("SerializedTopology").field("data_size", &self.data_size).finish()
    }
}

impl PartialEq for SerializedTopology {
    fn eq(&self, other: &Self) -> bool {
        self.data() == other.data()
    }
}

impl Eq for SerializedTopology {}

impl Hash for SerializedTopology {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data().hash(state);
    }
}

unsafe impl Send for SerializedTopology {}
unsafe impl Sync for SerializedTopology {}

impl Drop for SerializedTopology {
    fn drop(&mut self) {
        if let Some(deleter) = self.deleter {
            unsafe { deleter(self.handle) };
        }
    }
}

#[allow(dead_code, non_camel_case_types, non_snake_case, non_upper_case_globals)]
pub(crate) mod ffi {
    use std::marker::{PhantomData, PhantomPinned};

    use crate::clients::ffi::AXR_Client;
    use crate::devices::ffi::AXR_DeviceDescription;
    use crate::errors::ffi::AXR_Error;
    use crate::ffi::AXR_Extension_Base;
    use crate::values::ffi::AXR_NamedValue;

    #[repr(C)]
    pub struct AXR_Client_TopologyDescription_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub client: *mut AXR_Client,
        pub topology: *mut AXR_Topology,
    }

    impl AXR_Client_TopologyDescription_Args {
        pub fn new(client: *mut AXR_Client) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                client,
                topology: std::ptr::null_mut(),
            }
        }
    }

    pub type AXR_Client_TopologyDescription =
        unsafe extern "C" fn(args: *mut AXR_Client_TopologyDescription_Args) -> *mut AXR_Error;

    // We represent opaque C types as structs with a particular structure that is following the convention
    // suggested in [the Rustonomicon](https://doc.rust-lang.org/nomicon/ffi.html#representing-opaque-structs).
    #[repr(C)]
    pub struct AXR_Topology {
        _data: [u8; 0],
        _marker: PhantomData<(*mut u8, PhantomPinned)>,
    }

    #[repr(C)]
    pub struct AXR_Topology_Create_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub topology_name: *const std::ffi::c_char,
        pub topology_name_size: usize,
        pub create_options: *const AXR_NamedValue,
        pub num_options: usize,
        pub topology: *mut AXR_Topology,
    }

    impl AXR_Topology_Create_Args {
        pub fn new(
            topology_name: *const std::ffi::c_char,
            topology_name_size: usize,
            create_options: *const AXR_NamedValue,
            num_options: usize,
        ) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                topology_name,
                topology_name_size,
                create_options,
                num_options,
                topology: std::ptr::null_mut(),
            }
        }
    }

    pub type AXR_Topology_Create = unsafe extern "C" fn(args: *mut AXR_Topology_Create_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Topology_PlatformName_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub topology: *const AXR_Topology,
        pub platform_name: *const std::ffi::c_char,
        pub platform_name_size: usize,
    }

    impl AXR_Topology_PlatformName_Args {
        pub fn new(topology: *mut AXR_Topology) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                topology,
                platform_name: std::ptr::null(),
                platform_name_size: 0,
            }
        }
    }

    pub type AXR_Topology_PlatformName =
        unsafe extern "C" fn(args: *mut AXR_Topology_PlatformName_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Topology_PlatformVersion_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub topology: *mut AXR_Topology,
        pub platform_version: *const std::ffi::c_char,
        pub platform_version_size: usize,
    }

    impl AXR_Topology_PlatformVersion_Args {
        pub fn new(topology: *mut AXR_Topology) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                topology,
                platform_version: std::ptr::null(),
                platform_version_size: 0,
            }
        }
    }

    pub type AXR_Topology_PlatformVersion =
        unsafe extern "C" fn(args: *mut AXR_Topology_PlatformVersion_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Topology_GetDeviceDescriptions_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub topology: *const AXR_Topology,
        pub descriptions: *const *mut AXR_DeviceDescription,
        pub num_descriptions: usize,
    }

    impl AXR_Topology_GetDeviceDescriptions_Args {
        pub fn new(topology: *mut AXR_Topology) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                topology,
                descriptions: std::ptr::null(),
                num_descriptions: 0,
            }
        }
    }

    pub type AXR_Topology_GetDeviceDescriptions =
        unsafe extern "C" fn(args: *mut AXR_Topology_GetDeviceDescriptions_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Topology_Attributes_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub topology: *mut AXR_Topology,
        pub attributes: *const AXR_NamedValue,
        pub num_attributes: usize,
    }

    impl AXR_Topology_Attributes_Args {
        pub fn new(topology: *mut AXR_Topology) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                topology,
                attributes: std::ptr::null(),
                num_attributes: 0,
            }
        }
    }

    pub type AXR_Topology_Attributes = unsafe extern "C" fn(args: *mut AXR_Topology_Attributes_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Topology_Destroy_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub topology: *mut AXR_Topology,
    }

    impl AXR_Topology_Destroy_Args {
        pub fn new(topology: *mut AXR_Topology) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), topology }
        }
    }

    pub type AXR_Topology_Destroy = unsafe extern "C" fn(args: *mut AXR_Topology_Destroy_Args) -> *mut AXR_Error;

    // We represent opaque C types as structs with a particular structure that is following the convention
    // suggested in [the Rustonomicon](https://doc.rust-lang.org/nomicon/ffi.html#representing-opaque-structs).
    #[repr(C)]
    pub struct AXR_SerializedTopology {
        _data: [u8; 0],
        _marker: PhantomData<(*mut u8, PhantomPinned)>,
    }

    #[repr(C)]
    pub struct AXR_Topology_Serialize_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub topology: *mut AXR_Topology,
        pub serialized_bytes: *const std::ffi::c_char,
        pub serialized_bytes_size: usize,
        pub serialized_topology: *mut AXR_SerializedTopology,
        pub serialized_topology_deleter:
            Option<unsafe extern "C" fn(serialized_topology: *mut AXR_SerializedTopology)>,
    }

    impl AXR_Topology_Serialize_Args {
        pub fn new(topology: *mut AXR_Topology) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                topology,
                serialized_bytes: std::ptr::null(),
                serialized_bytes_size: 0,
                serialized_topology: std::ptr::null_mut(),
                serialized_topology_deleter: None,
            }
        }
    }

    pub type AXR_Topology_Serialize = unsafe extern "C" fn(args: *mut AXR_Topology_Serialize_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Topology_Deserialize_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub serialized_topology: *const std::ffi::c_char,
        pub serialized_topology_size: usize,
        pub topology: *mut AXR_Topology,
    }

    impl AXR_Topology_Deserialize_Args {
        pub fn new(serialized_topology: *const std::ffi::c_char, serialized_topology_size: usize) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                serialized_topology,
                serialized_topology_size,
                topology: std::ptr::null_mut(),
            }
        }
    }

    pub type AXR_Topology_Deserialize =
        unsafe extern "C" fn(args: *mut AXR_Topology_Deserialize_Args) -> *mut AXR_Error;
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::tests::{test_client, test_plugin};
    use crate::{Error, Topology};

    #[test]
    fn test_client_topology() {
        let client = test_client();
        let topology = client.topology().unwrap();
        assert_eq!(topology.platform_name().unwrap(), "test");
        assert_eq!(topology.platform_version().unwrap(), "test 1.4");
        assert!(topology.attributes().unwrap().is_empty());
        assert!(matches!(topology.attribute("__test__"), Err(Error::NotFound { .. })));

        let descriptions = topology.device_descriptions().unwrap();
        assert_eq!(descriptions.len(), 2);
        assert_eq!(descriptions[0].id(), Ok(0));
        assert_eq!(descriptions[1].id(), Ok(1));

        let serialized_topology = topology.serialize().unwrap();
        assert!(!serialized_topology.data().is_empty());
        assert_eq!(serialized_topology, topology.serialize().unwrap());

        // Serialized topologies round-trip through deserialization.
        let deserialized_topology = client.deserialize_topology(serialized_topology.data()).unwrap();
        assert_eq!(deserialized_topology.platform_name().unwrap(), "test");

        // Test creating a [`Topology`] from a null pointer.
        assert!(matches!(
            unsafe { Topology::from_c_api(std::ptr::null_mut(), client.api(), false) },
            Err(Error::InvalidArgument { message, .. })
                if message == "the provided plugin topology handle is a null pointer",
        ));
    }

    #[test]
    fn test_plugin_topology() {
        let plugin = test_plugin();
        let topology = plugin.topology("test", HashMap::new()).unwrap();
        assert_eq!(topology.platform_name().unwrap(), "test");
        assert_eq!(topology.device_descriptions().unwrap().len(), 2);
    }
}
