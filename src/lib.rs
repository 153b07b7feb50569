#![allow(clippy::missing_safety_doc)]

use std::borrow::Cow;
use std::collections::HashMap;

pub mod buffers;
pub mod clients;
pub mod devices;
pub mod errors;
pub mod events;
pub mod executables;
pub mod memories;
pub mod plugins;
pub mod streams;
pub mod topologies;
pub mod values;
pub mod versions;

pub use buffers::*;
pub use clients::*;
pub use devices::*;
pub use errors::*;
pub use events::*;
pub use executables::*;
pub use memories::*;
pub use plugins::*;
pub use streams::*;
pub use topologies::*;
pub use values::*;
pub use versions::*;

pub(crate) mod macros;

pub(crate) use macros::{invoke_plugin_api_error_fn, invoke_plugin_api_fn_helper, invoke_plugin_api_void_fn};

#[cfg(test)]
pub(crate) mod testing;

/// Wrapper of an [`AXR_Api`](ffi::AXR_Api) handle that can be used to interact with the plugin ABI.
#[derive(Copy, Clone)]
pub(crate) struct Api {
    /// Handle that represents this [`Api`] in the plugin ABI.
    handle: *const ffi::AXR_Api,
}

impl Api {
    /// Constructs a new [`Api`] from the provided [`AXR_Api`](ffi::AXR_Api) handle that came from a function in the
    /// plugin ABI. The handle must not be null and the plugin's declared major version must match the major version
    /// that this crate was built for. Minor version differences are tolerated because minor versions only ever add
    /// functions at the end of the [`AXR_Api`](ffi::AXR_Api) function table, and availability of individual
    /// functions is probed through the plugin's declared struct size on every invocation.
    pub(crate) unsafe fn from_c_api(handle: *const ffi::AXR_Api) -> Result<Self, Error> {
        if handle.is_null() {
            return Err(Error::invalid_argument("the provided plugin API handle is a null pointer"));
        }
        let api = Self { handle };
        let version = api.version();
        if version.major != ffi::AXR_API_MAJOR as usize {
            return Err(Error::plugin_version_mismatch(format!(
                "the loaded plugin implements ABI version {version} but this crate requires major version {}",
                ffi::AXR_API_MAJOR,
            )));
        }
        Ok(api)
    }

    /// Returns the [`AXR_Api`](ffi::AXR_Api) that corresponds to this [`Api`] and which can
    /// be passed to functions in the plugin ABI.
    pub(crate) unsafe fn to_c_api(&self) -> *const ffi::AXR_Api {
        self.handle
    }

    /// Returns the underlying plugin [`Api`]. Note that this function simply returns a copy of this [`Api`].
    /// It is only used as a helper for implementing our declarative macros in [`macros`] so that the same macros
    /// can be invoked on [`Api`] values and on the wrapper types that hold one.
    pub(crate) fn api(&self) -> Api {
        *self
    }

    /// Returns the plugin ABI version that this [`Api`] supports.
    pub(crate) fn version(&self) -> Version {
        let handle = unsafe { &(*self.to_c_api()).axr_api_version };
        Version { major: handle.major_version as usize, minor: handle.minor_version as usize }
    }

    /// [`Value`] of the attribute with the provided `name` attached to this plugin [`Api`],
    /// or [`Error::NotFound`] if no such attribute is attached to this [`Api`].
    ///
    /// Note that this function is expensive in that it recreates the resulting [`HashMap`] each time it is invoked.
    pub(crate) fn attribute<N: AsRef<str>>(&self, name: N) -> Result<Value, Error> {
        let name = name.as_ref();
        self.attributes()?
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("no attribute named '{name}' found in this plugin")))
    }

    /// Returns the attributes associated with this [`Api`] (e.g., the version of the compiler that the plugin was
    /// built against). The specific attributes returned depend on the backend [`Plugin`] implementation.
    ///
    /// Note that this function is expensive in that it recreates the resulting [`HashMap`] each time it is invoked.
    pub(crate) fn attributes(&self) -> Result<HashMap<String, Value>, Error> {
        use crate::plugins::ffi::AXR_Plugin_Attributes_Args;
        let result = invoke_plugin_api_error_fn!(*self, AXR_Plugin_Attributes, {}, { attributes, num_attributes });
        let (attributes, attribute_count) = result?;
        Ok(hash_map_from_c_api(attributes, attribute_count))
    }
}

unsafe impl Send for Api {}
unsafe impl Sync for Api {}

impl Client {
    /// Returns the plugin ABI version that this [`Client`] supports.
    pub fn version(&self) -> Version {
        self.api().version()
    }
}

impl Plugin {
    /// Returns the plugin ABI version that this [`Plugin`] supports.
    pub fn version(&self) -> Version {
        self.api().version()
    }

    /// [`Value`] of the attribute with the provided `name` attached to this [`Plugin`],
    /// or [`Error::NotFound`] if no such attribute is attached to this [`Plugin`].
    ///
    /// Note that this function is expensive in that it recreates the resulting [`HashMap`] each time it is invoked.
    pub fn attribute<N: AsRef<str>>(&self, name: N) -> Result<Value, Error> {
        self.api().attribute(name)
    }

    /// Returns the attributes associated with this [`Plugin`] (e.g., the version of the compiler that it was built
    /// against). The specific attributes returned depend on the backend [`Plugin`] implementation.
    ///
    /// Note that this function is expensive in that it recreates the resulting [`HashMap`] each time it is invoked.
    pub fn attributes(&self) -> Result<HashMap<String, Value>, Error> {
        self.api().attributes()
    }
}

/// Returns an [`str`] representation for the provided C string. Note that the returned value is a [`Cow`] because
/// this function will avoid creating a copy of the C string unless it really needs to (e.g., for UTF-8 conversion).
pub(crate) fn str_from_c_api<'a>(ptr: *const std::ffi::c_char, size: usize) -> Cow<'a, str> {
    String::from_utf8_lossy(unsafe { slice_from_c_api(ptr as *const u8, size) })
}

/// Returns a [`HashMap`] representation for the provided [`AXR_NamedValue`](values::ffi::AXR_NamedValue) array.
pub(crate) fn hash_map_from_c_api(ptr: *const values::ffi::AXR_NamedValue, size: usize) -> HashMap<String, Value> {
    unsafe { slice_from_c_api(ptr, size) }
        .iter()
        .map(|value| unsafe { NamedValue::from_c_api(value) })
        .map(|named_value| (named_value.name, named_value.value))
        .collect::<HashMap<String, Value>>()
}

/// Returns a slice from a plugin ABI pointer and size pair, treating null pointers and zero sizes as empty slices.
/// The reason we need this helper function is that [`std::slice::from_raw_parts`] results in undefined behavior
/// if the provided pointer is null or the size is zero.
pub(crate) unsafe fn slice_from_c_api<'a, T>(ptr: *const T, size: usize) -> &'a [T] {
    if ptr.is_null() || size == 0 { &[] } else { unsafe { std::slice::from_raw_parts(ptr, size) } }
}

#[allow(dead_code, non_camel_case_types, non_snake_case, non_upper_case_globals)]
pub(crate) mod ffi {
    pub(crate) use crate::buffers::ffi::*;
    pub(crate) use crate::clients::ffi::*;
    pub(crate) use crate::devices::ffi::*;
    pub(crate) use crate::errors::ffi::*;
    pub(crate) use crate::events::ffi::*;
    pub(crate) use crate::executables::ffi::*;
    pub(crate) use crate::memories::ffi::*;
    pub(crate) use crate::plugins::ffi::*;
    pub(crate) use crate::streams::ffi::*;
    pub(crate) use crate::topologies::ffi::*;
    pub(crate) use crate::versions::ffi::*;

    pub type AXR_Extension_Type = std::ffi::c_uint;

    /// Extension base type. The `extension_type` field must be used to identify the type of the extension
    /// and reinterpret its instance accordingly.
    #[repr(C)]
    pub struct AXR_Extension_Base {
        pub struct_size: usize,
        pub extension_type: AXR_Extension_Type,
        pub next: *mut AXR_Extension_Base,
    }

    #[repr(C)]
    pub struct AXR_Api {
        // For backwards compatibility, callers must use this value to guard accesses to fields
        // that may have been added after the plugin version they are interacting with was released.
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub axr_api_version: AXR_Api_Version,

        pub AXR_Error_Destroy: Option<AXR_Error_Destroy>,
        pub AXR_Error_Message: Option<AXR_Error_Message>,
        pub AXR_Error_GetCode: Option<AXR_Error_GetCode>,

        pub AXR_Plugin_Initialize: Option<AXR_Plugin_Initialize>,
        pub AXR_Plugin_Attributes: Option<AXR_Plugin_Attributes>,

        pub AXR_Event_Destroy: Option<AXR_Event_Destroy>,
        pub AXR_Event_IsReady: Option<AXR_Event_IsReady>,
        pub AXR_Event_Error: Option<AXR_Event_Error>,
        pub AXR_Event_Await: Option<AXR_Event_Await>,
        pub AXR_Event_OnReady: Option<AXR_Event_OnReady>,

        pub AXR_Client_Create: Option<AXR_Client_Create>,
        pub AXR_Client_Destroy: Option<AXR_Client_Destroy>,
        pub AXR_Client_PlatformName: Option<AXR_Client_PlatformName>,
        pub AXR_Client_ProcessIndex: Option<AXR_Client_ProcessIndex>,
        pub AXR_Client_PlatformVersion: Option<AXR_Client_PlatformVersion>,
        pub AXR_Client_Devices: Option<AXR_Client_Devices>,
        pub AXR_Client_AddressableDevices: Option<AXR_Client_AddressableDevices>,
        pub AXR_Client_AddressableMemories: Option<AXR_Client_AddressableMemories>,
        pub AXR_Client_Compile: Option<AXR_Client_Compile>,
        pub AXR_Client_DefaultDeviceAssignment: Option<AXR_Client_DefaultDeviceAssignment>,
        pub AXR_Client_BufferFromHost: Option<AXR_Client_BufferFromHost>,

        pub AXR_DeviceDescription_Id: Option<AXR_DeviceDescription_Id>,
        pub AXR_DeviceDescription_ProcessIndex: Option<AXR_DeviceDescription_ProcessIndex>,
        pub AXR_DeviceDescription_Attributes: Option<AXR_DeviceDescription_Attributes>,
        pub AXR_DeviceDescription_Kind: Option<AXR_DeviceDescription_Kind>,
        pub AXR_DeviceDescription_DebugString: Option<AXR_DeviceDescription_DebugString>,
        pub AXR_DeviceDescription_ToString: Option<AXR_DeviceDescription_ToString>,

        pub AXR_Device_GetDescription: Option<AXR_Device_GetDescription>,
        pub AXR_Device_IsAddressable: Option<AXR_Device_IsAddressable>,
        pub AXR_Device_LocalHardwareId: Option<AXR_Device_LocalHardwareId>,
        pub AXR_Device_AddressableMemories: Option<AXR_Device_AddressableMemories>,
        pub AXR_Device_DefaultMemory: Option<AXR_Device_DefaultMemory>,

        pub AXR_Memory_Id: Option<AXR_Memory_Id>,
        pub AXR_Memory_Kind: Option<AXR_Memory_Kind>,
        pub AXR_Memory_DebugString: Option<AXR_Memory_DebugString>,
        pub AXR_Memory_ToString: Option<AXR_Memory_ToString>,
        pub AXR_Memory_AddressableByDevices: Option<AXR_Memory_AddressableByDevices>,

        pub AXR_Executable_Destroy: Option<AXR_Executable_Destroy>,
        pub AXR_Executable_Name: Option<AXR_Executable_Name>,
        pub AXR_Executable_NumReplicas: Option<AXR_Executable_NumReplicas>,
        pub AXR_Executable_NumPartitions: Option<AXR_Executable_NumPartitions>,
        pub AXR_Executable_NumOutputs: Option<AXR_Executable_NumOutputs>,
        pub AXR_Executable_SizeOfGeneratedCodeInBytes: Option<AXR_Executable_SizeOfGeneratedCodeInBytes>,
        pub AXR_Executable_GetCostAnalysis: Option<AXR_Executable_GetCostAnalysis>,
        pub AXR_Executable_OutputMemoryKinds: Option<AXR_Executable_OutputMemoryKinds>,
        pub AXR_Executable_OptimizedProgram: Option<AXR_Executable_OptimizedProgram>,
        pub AXR_Executable_Serialize: Option<AXR_Executable_Serialize>,

        pub AXR_LoadedExecutable_Destroy: Option<AXR_LoadedExecutable_Destroy>,
        pub AXR_LoadedExecutable_GetExecutable: Option<AXR_LoadedExecutable_GetExecutable>,
        pub AXR_LoadedExecutable_AddressableDevices: Option<AXR_LoadedExecutable_AddressableDevices>,
        pub AXR_LoadedExecutable_Delete: Option<AXR_LoadedExecutable_Delete>,
        pub AXR_LoadedExecutable_IsDeleted: Option<AXR_LoadedExecutable_IsDeleted>,
        pub AXR_LoadedExecutable_Execute: Option<AXR_LoadedExecutable_Execute>,
        pub AXR_Executable_DeserializeAndLoad: Option<AXR_Executable_DeserializeAndLoad>,

        pub AXR_Buffer_Destroy: Option<AXR_Buffer_Destroy>,
        pub AXR_Buffer_ElementType: Option<AXR_Buffer_ElementType>,
        pub AXR_Buffer_Dimensions: Option<AXR_Buffer_Dimensions>,
        pub AXR_Buffer_UnpaddedDimensions: Option<AXR_Buffer_UnpaddedDimensions>,
        pub AXR_Buffer_DynamicDimensionIndices: Option<AXR_Buffer_DynamicDimensionIndices>,
        pub AXR_Buffer_Layout: Option<AXR_Buffer_Layout>,
        pub AXR_Buffer_OnDeviceSizeInBytes: Option<AXR_Buffer_OnDeviceSizeInBytes>,
        pub AXR_Buffer_Device: Option<AXR_Buffer_Device>,
        pub AXR_Buffer_Memory: Option<AXR_Buffer_Memory>,
        pub AXR_Buffer_Delete: Option<AXR_Buffer_Delete>,
        pub AXR_Buffer_IsDeleted: Option<AXR_Buffer_IsDeleted>,
        pub AXR_Buffer_CopyToDevice: Option<AXR_Buffer_CopyToDevice>,
        pub AXR_Buffer_ToHost: Option<AXR_Buffer_ToHost>,
        pub AXR_Buffer_IsOnCpu: Option<AXR_Buffer_IsOnCpu>,
        pub AXR_Buffer_ReadyEvent: Option<AXR_Buffer_ReadyEvent>,
        pub AXR_Buffer_UnsafePointer: Option<AXR_Buffer_UnsafePointer>,
        pub AXR_Buffer_IncreaseExternalReferenceCount: Option<AXR_Buffer_IncreaseExternalReferenceCount>,
        pub AXR_Buffer_DecreaseExternalReferenceCount: Option<AXR_Buffer_DecreaseExternalReferenceCount>,
        pub AXR_Buffer_DeviceMemoryPointer: Option<AXR_Buffer_DeviceMemoryPointer>,

        pub AXR_CopyToDeviceStream_Destroy: Option<AXR_CopyToDeviceStream_Destroy>,
        pub AXR_CopyToDeviceStream_AddChunk: Option<AXR_CopyToDeviceStream_AddChunk>,
        pub AXR_CopyToDeviceStream_TotalBytes: Option<AXR_CopyToDeviceStream_TotalBytes>,
        pub AXR_CopyToDeviceStream_GranuleSize: Option<AXR_CopyToDeviceStream_GranuleSize>,

        pub AXR_Topology_Create: Option<AXR_Topology_Create>,
        pub AXR_Topology_Destroy: Option<AXR_Topology_Destroy>,
        pub AXR_Topology_PlatformName: Option<AXR_Topology_PlatformName>,
        pub AXR_Topology_PlatformVersion: Option<AXR_Topology_PlatformVersion>,
        pub AXR_Topology_GetDeviceDescriptions: Option<AXR_Topology_GetDeviceDescriptions>,
        pub AXR_Topology_Serialize: Option<AXR_Topology_Serialize>,
        pub AXR_Topology_Attributes: Option<AXR_Topology_Attributes>,

        pub AXR_Compile: Option<AXR_Compile>,

        // Functions below this point were added in later minor versions of the plugin ABI. Availability must be
        // probed through the plugin's declared struct size before they are invoked.
        pub AXR_Executable_OutputElementTypes: Option<AXR_Executable_OutputElementTypes>,
        pub AXR_Executable_OutputDimensions: Option<AXR_Executable_OutputDimensions>,

        pub AXR_Buffer_CopyToMemory: Option<AXR_Buffer_CopyToMemory>,

        pub AXR_Executable_Fingerprint: Option<AXR_Executable_Fingerprint>,

        pub AXR_Client_TopologyDescription: Option<AXR_Client_TopologyDescription>,

        pub AXR_Memory_Kind_Id: Option<AXR_Memory_Kind_Id>,

        pub AXR_Topology_Deserialize: Option<AXR_Topology_Deserialize>,

        pub AXR_Event_Create: Option<AXR_Event_Create>,
        pub AXR_Event_Set: Option<AXR_Event_Set>,
    }
}
