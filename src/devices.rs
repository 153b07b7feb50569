use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::marker::PhantomData;
use std::sync::OnceLock;

use crate::{
    Api, Client, Error, Memory, ProcessIndex, Value, hash_map_from_c_api, invoke_plugin_api_error_fn, str_from_c_api,
};

/// Type alias used to represent [`Device`] IDs, which are unique among devices of the same type (e.g., CPUs, GPUs)
/// and, on multi-host environments, are also unique across all devices and all hosts.
pub type DeviceId = usize;

/// Type alias used to represent the opaque local hardware IDs of [`Device`]s (e.g., a CUDA device number).
pub type LocalHardwareId = usize;

/// Type alias used to represent replica IDs in [`DeviceAssignment`]s.
pub type ReplicaId = usize;

/// Type alias used to represent computation IDs in [`DeviceAssignment`]s.
pub type ComputationId = usize;

/// Device managed by a backend [`Plugin`](crate::Plugin) (e.g., a specific CPU, GPU, or accelerator card). Each
/// device has a [`DeviceDescription`] that helps identify its kind and a location within a grid of devices both
/// locally and globally. Devices also know their associated [`Memory`]s through the device/memory graph that their
/// owning [`Client`] constructs once at client creation time.
///
/// The lifetime parameter `'c` captures the owning [`Client`], ensuring that the client outlives the device.
#[derive(Clone)]
pub struct Device<'c> {
    /// Handle that represents this [`Device`] in the plugin ABI.
    handle: *mut ffi::AXR_Device,

    /// [`Client`] that owns this [`Device`].
    client: &'c Client,

    /// Cached [`Device::description`] of this [`Device`] so that it will only be constructed once.
    description: OnceLock<Result<DeviceDescription<'c>, Error>>,
}

impl<'c> Device<'c> {
    /// Constructs a new [`Device`] from the provided [`AXR_Device`](ffi::AXR_Device) handle that came
    /// from a function in the plugin ABI.
    pub(crate) unsafe fn from_c_api(handle: *mut ffi::AXR_Device, client: &'c Client) -> Result<Self, Error> {
        if handle.is_null() {
            Err(Error::invalid_argument("the provided plugin device handle is a null pointer"))
        } else {
            Ok(Self { handle, client, description: OnceLock::new() })
        }
    }

    /// Returns the [`AXR_Device`](ffi::AXR_Device) that corresponds to this [`Device`] and which can
    /// be passed to functions in the plugin ABI.
    pub(crate) unsafe fn to_c_api(&self) -> *mut ffi::AXR_Device {
        self.handle
    }

    /// Returns the underlying plugin [`Api`].
    pub(crate) fn api(&self) -> Api {
        self.client.api()
    }

    /// Returns the [`Client`] that owns this [`Device`].
    pub fn client(&self) -> &'c Client {
        self.client
    }

    /// ID of this [`Device`]. IDs are unique among devices of the same type (e.g., CPUs, GPUs) and, in multi-host
    /// environments, they are also unique across all devices and all hosts.
    pub fn id(&self) -> Result<DeviceId, Error> {
        self.description()?.id()
    }

    /// Vendor-dependent string that uniquely identifies the kind of this [`Device`].
    pub fn kind(&'_ self) -> Result<Cow<'_, str>, Error> {
        self.description()?.kind()
    }

    /// Index of the process that this [`Device`] belongs to (i.e., is _addressable_ from). Note that this is not
    /// always identical to the process index of the corresponding [`Client`] in a multi-process setting, where each
    /// client can see devices from all processes, but only a subset of them are addressable and have the same
    /// process index as the client.
    pub fn process_index(&self) -> Result<ProcessIndex, Error> {
        self.description()?.process_index()
    }

    /// [`Value`] of the attribute with the provided name attached to this [`Device`], or [`Error::NotFound`]
    /// if no such attribute is attached to this [`Device`].
    pub fn attribute<N: AsRef<str>>(&self, name: N) -> Result<&Value, Error> {
        let name = name.as_ref();
        self.attributes()?
            .get(&name.to_string())
            .ok_or_else(|| Error::not_found(format!("no attribute named '{name}' in this device")))
    }

    /// Collection of [`Device`]-specific named attributes that are attached to this [`Device`].
    pub fn attributes(&self) -> Result<&HashMap<String, Value>, Error> {
        self.description()?.attributes()
    }

    /// [`DeviceDescription`] associated with this [`Device`].
    pub fn description(&self) -> Result<&DeviceDescription<'c>, Error> {
        self.description
            .get_or_init(|| {
                use ffi::AXR_Device_GetDescription_Args;
                invoke_plugin_api_error_fn!(self.api(), AXR_Device_GetDescription, { device = self.to_c_api() }, {
                    device_description
                })
                .and_then(|handle| unsafe { DeviceDescription::from_c_api(handle, self.api()) })
            })
            .as_ref()
            .map_err(|error| error.clone())
    }

    /// Opaque local hardware ID of this [`Device`] (e.g., its CUDA device number). In general, local hardware IDs
    /// are not guaranteed to be dense/contiguous and are also not always defined.
    pub fn local_hardware_id(&self) -> Result<Option<LocalHardwareId>, Error> {
        use ffi::AXR_Device_LocalHardwareId_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Device_LocalHardwareId, { device = self.to_c_api() }, {
            local_hardware_id
        })
        .map(|id| if id >= 0 { Some(id as usize) } else { None })
    }

    /// Returns `true` if this [`Device`] is _addressable_ by the owning [`Client`] (i.e., if that client
    /// can issue commands to this device).
    pub fn is_addressable(&self) -> Result<bool, Error> {
        use ffi::AXR_Device_IsAddressable_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Device_IsAddressable, { device = self.to_c_api() }, {
            is_addressable
        })
    }

    /// [`Memory`]s that this [`Device`] can address. This is answered from the device/memory graph that the owning
    /// [`Client`] constructed when it was created, without calling into the plugin. Devices that are not addressable
    /// by the owning [`Client`] report an empty list.
    pub fn memories(&self) -> Vec<Memory<'c>> {
        self.client.memories_for_device(self.handle)
    }

    /// Default [`Memory`] of this [`Device`] (i.e., the memory in which data processed by this device
    /// should be stored in by default).
    pub fn default_memory(&self) -> Result<Memory<'c>, Error> {
        use ffi::AXR_Device_DefaultMemory_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Device_DefaultMemory, { device = self.to_c_api() }, { memory })
            .and_then(|handle| unsafe { Memory::from_c_api(handle, self.client) })
    }
}

impl Display for Device<'_> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.description() {
            Ok(description) => write!(formatter, "{}", description),
            Err(error) => write!(formatter, "<failed to render device as string; {:?}>", error),
        }
    }
}

impl Debug for Device<'_> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.description() {
            Ok(description) => {
                use ffi::AXR_DeviceDescription_DebugString_Args;
                match invoke_plugin_api_error_fn!(
                    self.api(),
                    AXR_DeviceDescription_DebugString,
                    { device_description = description.handle },
                    { debug_string, debug_string_size },
                ) {
                    Ok((string, string_len)) => write!(formatter, "Device[{}]", str_from_c_api(string, string_len)),
                    Err(error) => write!(formatter, "<failed to render device as debug string; {:?}>", error),
                }
            }
            Err(error) => write!(formatter, "<failed to render device as debug string; {:?}>", error),
        }
    }
}

impl PartialEq for Device<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id().is_ok()
            && other.id().is_ok()
            && self.id() == other.id()
            && self.kind().is_ok()
            && other.kind().is_ok()
            && self.kind() == other.kind()
    }
}

impl Eq for Device<'_> {}

/// Description of a [`Device`] which may be associated with an actual [`Device`] instance (i.e., obtained via
/// [`Device::description`]) or that is used to describe a device that is not available to the current plugin. This
/// is useful for compiling executables without having the target hardware available, resulting in executables that
/// can be serialized and persisted ahead of time such that they can be loaded and executed on the actual target
/// hardware later.
///
/// Note that the `'o` lifetime parameter captures the fact that [`DeviceDescription`]s are always owned by some
/// other object (e.g., a [`Client`], a [`Device`], or a [`Topology`](crate::Topology)) and makes sure that that
/// other object stays alive for at least as long as all associated [`DeviceDescription`]s are alive.
#[derive(Clone)]
pub struct DeviceDescription<'o> {
    /// Handle that represents this [`DeviceDescription`] in the plugin ABI.
    handle: *mut ffi::AXR_DeviceDescription,

    /// Underlying plugin [`Api`].
    api: Api,

    /// Cached [`DeviceDescription::attributes`] of this [`DeviceDescription`] so that it will only be constructed
    /// once.
    attributes: OnceLock<Result<HashMap<String, Value>, Error>>,

    /// [`PhantomData`] used to track the lifetime of the owner of this [`DeviceDescription`].
    owner: PhantomData<&'o ()>,
}

impl DeviceDescription<'_> {
    /// Constructs a new [`DeviceDescription`] from the provided [`AXR_DeviceDescription`](ffi::AXR_DeviceDescription)
    /// handle that came from a function in the plugin ABI.
    pub(crate) unsafe fn from_c_api(handle: *mut ffi::AXR_DeviceDescription, api: Api) -> Result<Self, Error> {
        if handle.is_null() {
            Err(Error::invalid_argument("the provided plugin device description handle is a null pointer"))
        } else {
            Ok(Self { handle, api, attributes: OnceLock::new(), owner: PhantomData })
        }
    }

    /// Returns the [`AXR_DeviceDescription`](ffi::AXR_DeviceDescription) that corresponds to this
    /// [`DeviceDescription`] and which can be passed to functions in the plugin ABI.
    pub(crate) unsafe fn to_c_api(&self) -> *mut ffi::AXR_DeviceDescription {
        self.handle
    }

    /// Returns the underlying plugin [`Api`].
    pub(crate) fn api(&self) -> Api {
        self.api
    }

    /// [`Device`] ID that corresponds to this [`DeviceDescription`]. IDs are unique among devices of the same type
    /// (e.g., CPUs, GPUs) and, in multi-host environments, they are also unique across all devices and all hosts.
    pub fn id(&self) -> Result<DeviceId, Error> {
        use ffi::AXR_DeviceDescription_Id_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_DeviceDescription_Id, { device_description = self.to_c_api() }, {
            id
        })
        .map(|id| id as usize)
    }

    /// Vendor-dependent string that uniquely identifies the kind of the underlying [`Device`].
    pub fn kind(&'_ self) -> Result<Cow<'_, str>, Error> {
        use ffi::AXR_DeviceDescription_Kind_Args;
        invoke_plugin_api_error_fn!(
            self.api(),
            AXR_DeviceDescription_Kind,
            { device_description = self.to_c_api() },
            { device_kind, device_kind_size },
        )
        .map(|(string, string_len)| str_from_c_api(string, string_len))
    }

    /// Index of the process that the underlying [`Device`] belongs to (i.e., is _addressable_ from). Note that this
    /// is not always identical to the process index of the corresponding [`Client`] in a multi-process setting,
    /// where each client can see devices from all processes, but only a subset of them are addressable and have the
    /// same process index as the client.
    pub fn process_index(&self) -> Result<ProcessIndex, Error> {
        use ffi::AXR_DeviceDescription_ProcessIndex_Args;
        invoke_plugin_api_error_fn!(
            self.api(),
            AXR_DeviceDescription_ProcessIndex,
            { device_description = self.to_c_api() },
            { process_index },
        )
        .map(|id| id as usize)
    }

    /// [`Value`] of the attribute with the provided name attached to this [`DeviceDescription`], or
    /// [`Error::NotFound`] if no such attribute is attached to this [`DeviceDescription`].
    pub fn attribute<N: AsRef<str>>(&self, name: N) -> Result<&Value, Error> {
        let name = name.as_ref();
        self.attributes()?
            .get(&name.to_string())
            .ok_or_else(|| Error::not_found(format!("no attribute named '{name}' in this device description")))
    }

    /// Collection of [`Device`]-specific named attributes that are attached to this [`DeviceDescription`].
    pub fn attributes(&self) -> Result<&HashMap<String, Value>, Error> {
        self.attributes
            .get_or_init(|| {
                use ffi::AXR_DeviceDescription_Attributes_Args;
                let (attributes, attribute_count) = invoke_plugin_api_error_fn!(
                    self.api(),
                    AXR_DeviceDescription_Attributes,
                    { device_description = self.to_c_api() },
                    { attributes, num_attributes },
                )?;
                Ok(hash_map_from_c_api(attributes, attribute_count))
            })
            .as_ref()
            .map_err(|error| error.clone())
    }
}

impl Display for DeviceDescription<'_> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ffi::AXR_DeviceDescription_ToString_Args;
        match invoke_plugin_api_error_fn!(
            self.api(),
            AXR_DeviceDescription_ToString,
            { device_description = self.to_c_api() },
            { to_string, to_string_size },
        ) {
            Ok((string, string_len)) => write!(formatter, "{}", str_from_c_api(string, string_len)),
            Err(error) => write!(formatter, "<failed to render device description as string; {}>", error),
        }
    }
}

impl Debug for DeviceDescription<'_> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ffi::AXR_DeviceDescription_DebugString_Args;
        match invoke_plugin_api_error_fn!(
            self.api(),
            AXR_DeviceDescription_DebugString,
            { device_description = self.to_c_api() },
            { debug_string, debug_string_size },
        ) {
            Ok((string, string_len)) => write!(formatter, "DeviceDescription[{}]", str_from_c_api(string, string_len)),
            Err(error) => write!(formatter, "<failed to render device description as debug string; {:?}>", error),
        }
    }
}

impl PartialEq for DeviceDescription<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id().is_ok()
            && other.id().is_ok()
            && self.id() == other.id()
            && self.kind().is_ok()
            && other.kind().is_ok()
            && self.kind() == other.kind()
    }
}

impl Eq for DeviceDescription<'_> {}

/// Represents the [`Device`] assignment for a set of replicated computations. Specifically, for `R` replicas and `C`
/// computations, `R * C` [`Device`]s are required to execute those computations in parallel. [`DeviceAssignment`]s
/// hold the mapping from `(r, c)`, where `r` is a replica index and `c` is a computation index, to the [`DeviceId`]
/// of the [`Device`] on which the corresponding computation should be executed.
///
/// The default [`DeviceAssignment`] for a given [`Client`] can be obtained using
/// [`Client::default_device_assignment`], which is aware of the set of [`Device`]s that are _addressable_ by that
/// [`Client`]. Refer to the documentation of [`Client::addressable_devices`] for information on what is an
/// _addressable_ [`Device`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeviceAssignment {
    /// Number of replicas that this [`DeviceAssignment`] has been computed for.
    pub(crate) replica_count: usize,

    /// Number of computations that this [`DeviceAssignment`] has been computed for.
    pub(crate) computation_count: usize,

    /// Flattened representation of this [`DeviceAssignment`] with the [`DeviceId`]s for `replica_count`
    /// and `computation_count` stored in row-major format.
    pub(crate) assignment: Vec<std::ffi::c_int>,
}

impl DeviceAssignment {
    /// Number of replicas that this [`DeviceAssignment`] has been computed for.
    pub fn replica_count(&self) -> usize {
        self.replica_count
    }

    /// Number of computations that this [`DeviceAssignment`] has been computed for.
    pub fn computation_count(&self) -> usize {
        self.computation_count
    }

    /// Returns the [`DeviceId`] that replica `replica_id` of computation `computation_id` is assigned to or an
    /// [`Error::FailedPrecondition`] if any of the provided indices are out of range (i.e., larger than the number
    /// of replicas and computations that this [`DeviceAssignment`] was constructed for, respectively).
    pub fn device_id(&self, replica_id: ReplicaId, computation_id: ComputationId) -> Result<DeviceId, Error> {
        if replica_id >= self.replica_count {
            Err(Error::failed_precondition("replica ID is out of range"))
        } else if computation_id >= self.computation_count {
            Err(Error::failed_precondition("computation ID is out of range"))
        } else {
            Ok(self.assignment[replica_id * self.computation_count + computation_id] as usize)
        }
    }

    /// Returns the replica ID assigned to the [`Device`] with the provided [`DeviceId`] in this
    /// [`DeviceAssignment`]. If there are multiple computations or replicas assigned to the same [`Device`] or if
    /// the provided [`DeviceId`] is not used by this [`DeviceAssignment`], then this function will return an
    /// [`Error::Internal`].
    pub fn replica_id(&self, device_id: DeviceId) -> Result<ReplicaId, Error> {
        self.logical_id(device_id).map(|(replica_id, _)| replica_id)
    }

    /// Returns the computation ID assigned to the [`Device`] with the provided [`DeviceId`] in this
    /// [`DeviceAssignment`]. If there are multiple computations or replicas assigned to the same [`Device`] or if
    /// the provided [`DeviceId`] is not used by this [`DeviceAssignment`], then this function will return an
    /// [`Error::Internal`].
    pub fn computation_id(&self, device_id: DeviceId) -> Result<ComputationId, Error> {
        self.logical_id(device_id).map(|(_, computation_id)| computation_id)
    }

    /// Returns the logical ID (i.e., the pair of replica ID and computation ID) assigned to the [`Device`] with the
    /// provided [`DeviceId`] in this [`DeviceAssignment`]. If there are multiple logical IDs assigned to the same
    /// [`Device`] or if the provided [`DeviceId`] is not used by this [`DeviceAssignment`], then this function will
    /// return an [`Error::Internal`].
    pub fn logical_id(&self, device_id: DeviceId) -> Result<(ReplicaId, ComputationId), Error> {
        let mut logical_id = None;
        for replica_id in 0..self.replica_count {
            for computation_id in 0..self.computation_count {
                if self.assignment[replica_id * self.computation_count + computation_id] as usize == device_id {
                    if logical_id.is_some() {
                        return Err(Error::internal("duplicate device ID"));
                    } else {
                        logical_id = Some((replica_id, computation_id));
                    }
                }
            }
        }
        logical_id.ok_or_else(|| Error::internal("device ID not found"))
    }
}

#[allow(dead_code, non_camel_case_types, non_snake_case, non_upper_case_globals)]
pub(crate) mod ffi {
    use std::marker::{PhantomData, PhantomPinned};

    use crate::errors::ffi::AXR_Error;
    use crate::ffi::AXR_Extension_Base;
    use crate::memories::ffi::AXR_Memory;
    use crate::values::ffi::AXR_NamedValue;

    // We represent opaque C types as structs with a particular structure that is following the convention
    // suggested in [the Rustonomicon](https://doc.rust-lang.org/nomicon/ffi.html#representing-opaque-structs).
    #[repr(C)]
    pub struct AXR_Device {
        _data: [u8; 0],
        _marker: PhantomData<(*mut u8, PhantomPinned)>,
    }

    #[repr(C)]
    pub struct AXR_Device_GetDescription_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub device: *mut AXR_Device,
        pub device_description: *mut AXR_DeviceDescription,
    }

    impl AXR_Device_GetDescription_Args {
        pub fn new(device: *mut AXR_Device) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                device,
                device_description: std::ptr::null_mut(),
            }
        }
    }

    pub type AXR_Device_GetDescription =
        unsafe extern "C" fn(args: *mut AXR_Device_GetDescription_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Device_LocalHardwareId_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub device: *mut AXR_Device,
        pub local_hardware_id: std::ffi::c_int,
    }

    impl AXR_Device_LocalHardwareId_Args {
        pub fn new(device: *mut AXR_Device) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), device, local_hardware_id: 0 }
        }
    }

    pub type AXR_Device_LocalHardwareId =
        unsafe extern "C" fn(args: *mut AXR_Device_LocalHardwareId_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Device_IsAddressable_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub device: *mut AXR_Device,
        pub is_addressable: bool,
    }

    impl AXR_Device_IsAddressable_Args {
        pub fn new(device: *mut AXR_Device) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                device,
                is_addressable: false,
            }
        }
    }

    pub type AXR_Device_IsAddressable =
        unsafe extern "C" fn(args: *mut AXR_Device_IsAddressable_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Device_AddressableMemories_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub device: *mut AXR_Device,
        pub memories: *const *mut AXR_Memory,
        pub num_memories: usize,
    }

    impl AXR_Device_AddressableMemories_Args {
        pub fn new(device: *mut AXR_Device) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                device,
                memories: std::ptr::null(),
                num_memories: 0,
            }
        }
    }

    pub type AXR_Device_AddressableMemories =
        unsafe extern "C" fn(args: *mut AXR_Device_AddressableMemories_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Device_DefaultMemory_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub device: *mut AXR_Device,
        pub memory: *mut AXR_Memory,
    }

    impl AXR_Device_DefaultMemory_Args {
        pub fn new(device: *mut AXR_Device) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                device,
                memory: std::ptr::null_mut(),
            }
        }
    }

    pub type AXR_Device_DefaultMemory =
        unsafe extern "C" fn(args: *mut AXR_Device_DefaultMemory_Args) -> *mut AXR_Error;

    // We represent opaque C types as structs with a particular structure that is following the convention
    // suggested in [the Rustonomicon](https://doc.rust-lang.org/nomicon/ffi.html#representing-opaque-structs).
    #[repr(C)]
    pub struct AXR_DeviceDescription {
        _data: [u8; 0],
        _marker: PhantomData<(*mut u8, PhantomPinned)>,
    }

    #[repr(C)]
    pub struct AXR_DeviceDescription_Id_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub device_description: *mut AXR_DeviceDescription,
        pub id: std::ffi::c_int,
    }

    impl AXR_DeviceDescription_Id_Args {
        pub fn new(device_description: *mut AXR_DeviceDescription) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), device_description, id: 0 }
        }
    }

    pub type AXR_DeviceDescription_Id =
        unsafe extern "C" fn(args: *mut AXR_DeviceDescription_Id_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_DeviceDescription_Kind_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub device_description: *mut AXR_DeviceDescription,
        pub device_kind: *const std::ffi::c_char,
        pub device_kind_size: usize,
    }

    impl AXR_DeviceDescription_Kind_Args {
        pub fn new(device_description: *mut AXR_DeviceDescription) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                device_description,
                device_kind: std::ptr::null(),
                device_kind_size: 0,
            }
        }
    }

    pub type AXR_DeviceDescription_Kind =
        unsafe extern "C" fn(args: *mut AXR_DeviceDescription_Kind_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_DeviceDescription_ProcessIndex_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub device_description: *mut AXR_DeviceDescription,
        pub process_index: std::ffi::c_int,
    }

    impl AXR_DeviceDescription_ProcessIndex_Args {
        pub fn new(device_description: *mut AXR_DeviceDescription) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                device_description,
                process_index: 0,
            }
        }
    }

    pub type AXR_DeviceDescription_ProcessIndex =
        unsafe extern "C" fn(args: *mut AXR_DeviceDescription_ProcessIndex_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_DeviceDescription_Attributes_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub device_description: *mut AXR_DeviceDescription,
        pub num_attributes: usize,
        pub attributes: *const AXR_NamedValue,
    }

    impl AXR_DeviceDescription_Attributes_Args {
        pub fn new(device_description: *mut AXR_DeviceDescription) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                device_description,
                num_attributes: 0,
                attributes: std::ptr::null_mut(),
            }
        }
    }

    pub type AXR_DeviceDescription_Attributes =
        unsafe extern "C" fn(args: *mut AXR_DeviceDescription_Attributes_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_DeviceDescription_ToString_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub device_description: *mut AXR_DeviceDescription,
        pub to_string: *const std::ffi::c_char,
        pub to_string_size: usize,
    }

    impl AXR_DeviceDescription_ToString_Args {
        pub fn new(device_description: *mut AXR_DeviceDescription) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                device_description,
                to_string: std::ptr::null(),
                to_string_size: 0,
            }
        }
    }

    pub type AXR_DeviceDescription_ToString =
        unsafe extern "C" fn(args: *mut AXR_DeviceDescription_ToString_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_DeviceDescription_DebugString_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub device_description: *mut AXR_DeviceDescription,
        pub debug_string: *const std::ffi::c_char,
        pub debug_string_size: usize,
    }

    impl AXR_DeviceDescription_DebugString_Args {
        pub fn new(device_description: *mut AXR_DeviceDescription) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                device_description,
                debug_string: std::ptr::null(),
                debug_string_size: 0,
            }
        }
    }

    pub type AXR_DeviceDescription_DebugString =
        unsafe extern "C" fn(args: *mut AXR_DeviceDescription_DebugString_Args) -> *mut AXR_Error;
}

#[cfg(test)]
mod tests {
    use crate::tests::test_client;
    use crate::{Device, DeviceAssignment, DeviceDescription, Error};

    #[test]
    fn test_device() {
        let client = test_client();
        let devices = client.devices();
        assert_eq!(devices.len(), 2);
        for (index, device) in devices.iter().enumerate() {
            assert_eq!(device.id(), Ok(index));
            assert_eq!(device.kind().map(|kind| kind.to_string()), Ok("axr".to_string()));
            assert_eq!(device.process_index(), Ok(0));
            assert!(device.attribute("__test__").is_err());
            assert_eq!(device.attributes().map(|attributes| attributes.is_empty()), Ok(true));
            assert!(device.description().is_ok());
            assert_eq!(device.local_hardware_id(), Ok(Some(index)));
            assert_eq!(device.is_addressable(), Ok(true));
            assert!(device.default_memory().is_ok());
            assert_eq!(format!("{device}"), format!("AxrDevice(id={index})"));
            assert_eq!(format!("{device:?}"), format!("Device[AXR_DEVICE_{index}]"));
        }
        assert_eq!(devices[0], devices[0]);
        assert_eq!(devices[1], devices[1]);
        assert_ne!(devices[0], devices[1]);

        // The device-to-memory edges come from the graph built at client creation time.
        assert_eq!(devices[0].memories().len(), 2);
        assert_eq!(devices[1].memories().len(), 1);
        assert_eq!(devices[0].default_memory().unwrap().kind().unwrap(), "space");

        // Test creating a [`Device`] from a null pointer.
        assert!(matches!(
            unsafe { Device::from_c_api(std::ptr::null_mut(), &client) },
            Err(Error::InvalidArgument { message, .. })
                if message == "the provided plugin device handle is a null pointer",
        ));
    }

    #[test]
    fn test_device_description() {
        let client = test_client();
        let devices = client.devices();
        let descriptions = devices.iter().map(|device| device.description().unwrap()).collect::<Vec<_>>();
        assert_eq!(descriptions.len(), 2);
        let description = &descriptions[1];
        assert_eq!(description.id(), Ok(1));
        assert_eq!(description.kind().map(|kind| kind.to_string()), Ok("axr".to_string()));
        assert_eq!(description.process_index(), Ok(0));
        assert!(description.attribute("__test__").is_err());
        assert_eq!(description.attributes().map(|attributes| attributes.is_empty()), Ok(true));
        assert_eq!(descriptions[0], descriptions[0]);
        assert_ne!(descriptions[0], descriptions[1]);
        assert_eq!(format!("{description}"), "AxrDevice(id=1)");
        assert_eq!(format!("{description:?}"), "DeviceDescription[AXR_DEVICE_1]");

        // Test creating a [`DeviceDescription`] from a null pointer.
        assert!(matches!(
            unsafe { DeviceDescription::from_c_api(std::ptr::null_mut(), client.api()) },
            Err(Error::InvalidArgument { message, .. })
                if message == "the provided plugin device description handle is a null pointer",
        ));
    }

    #[test]
    fn test_device_assignment() {
        let client = test_client();
        let device_assignment = client.default_device_assignment(1, 2).unwrap();
        assert_eq!(device_assignment, DeviceAssignment {
            replica_count: 1,
            computation_count: 2,
            assignment: vec![0, 1],
        });
        assert_eq!(device_assignment.replica_count(), 1);
        assert_eq!(device_assignment.computation_count(), 2);
        assert_eq!(device_assignment.device_id(0, 0), Ok(0));
        assert_eq!(device_assignment.device_id(0, 1), Ok(1));
        assert!(device_assignment.device_id(0, 2).is_err());
        assert!(device_assignment.device_id(1, 0).is_err());
        assert_eq!(device_assignment.replica_id(0), Ok(0));
        assert_eq!(device_assignment.replica_id(1), Ok(0));
        assert!(device_assignment.replica_id(2).is_err());
        assert_eq!(device_assignment.computation_id(0), Ok(0));
        assert_eq!(device_assignment.computation_id(1), Ok(1));
        assert!(device_assignment.computation_id(2).is_err());
        assert_eq!(device_assignment.logical_id(1), Ok((0, 1)));

        let duplicate = DeviceAssignment { replica_count: 1, computation_count: 2, assignment: vec![3, 3] };
        assert!(matches!(
            duplicate.logical_id(3),
            Err(Error::Internal { message, .. }) if message == "duplicate device ID",
        ));
    }
}
