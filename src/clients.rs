use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{LazyLock, Mutex, OnceLock};
use std::time::Duration;

use crate::devices::ffi::AXR_Device;
use crate::memories::ffi::AXR_Memory;
use crate::{
    Api, Device, DeviceAssignment, DeviceId, Error, LocalHardwareId, Memory, NamedValue, Value,
    invoke_plugin_api_error_fn, slice_from_c_api, str_from_c_api,
};

/// Serializes plugin client lifecycle operations (i.e., creation and destruction) across threads. This is necessary
/// because some plugin implementations can fail fatally when client creation and/or destruction race during backend
/// registration and/or teardown.
static PLUGIN_CLIENT_LIFECYCLE_GUARD: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Type alias used to represent process indices (i.e., in a multi-process or multi-host platform).
pub type ProcessIndex = usize;

/// Type alias used to represent platform IDs. Platform IDs are derived locally from platform names and are stable
/// within a single process, which is all that is needed to tell [`Client`]s of different platforms apart.
pub type PlatformId = u64;

/// [`Client`]s represent a connection to an accelerator platform. They hold the topology of the system, managing a
/// list of [`Device`]s and their associated [`Memory`]s (a single device may have multiple memory spaces like _High
/// Bandwidth Memory_ and slower _Capacity Memory_, for example). Furthermore, while [`Buffer`](crate::Buffer)s are
/// associated with (and placed on) [`Device`]s, their lifecycle management is orchestrated through [`Client`]s to
/// ensure thread safety and correct resource allocation.
///
/// The device/memory graph of a client is constructed once, when the client is created, and is immutable afterwards.
/// All graph queries (e.g., [`Device::memories`] and [`Memory::addressable_by_devices`]) are answered from that graph
/// without calling into the plugin, and only ever produce objects owned by the same client.
///
/// Note that a client can optionally own a [`KeyValueStore`] to support multi-process and/or multi-host platforms.
pub struct Client {
    /// Handle that represents this [`Client`] in the plugin ABI.
    handle: *mut ffi::AXR_Client,

    /// Underlying plugin [`Api`].
    api: Api,

    /// Name of the platform that this [`Client`] is connected to, fetched once at client creation time.
    platform_name: String,

    /// Human-readable, platform-specific, version information fetched once at client creation time.
    platform_version: String,

    /// [`PlatformId`] derived from [`Client::platform_name`].
    platform_id: PlatformId,

    /// [`ProcessIndex`] of this [`Client`], fetched once at client creation time.
    process_index: ProcessIndex,

    /// Device/memory graph of this [`Client`], constructed once at client creation time.
    graph: DeviceMemoryGraph,

    /// Cached attributes of the underlying [`Api`] so that they will only be constructed once.
    attributes: OnceLock<Result<HashMap<String, Value>, Error>>,

    /// Underlying [`KeyValueStore`]. Note that if this is [`None`] then this [`Client`] does not have a direct way
    /// to interact with other [`Client`]s and can thus not be used in a multi-process and/or multi-host platform.
    /// The box also keeps the store alive for the callbacks that were handed to the plugin at client creation time.
    key_value_store: Option<Box<dyn KeyValueStore>>,
}

impl Client {
    /// Constructs a new [`Client`] from the provided [`AXR_Client`](ffi::AXR_Client) handle that came from a function
    /// in the plugin ABI. This fetches the platform metadata and constructs the device/memory graph of the client.
    /// If any of that fails, the plugin client is destroyed before the error is returned.
    pub(crate) unsafe fn from_c_api(
        handle: *mut ffi::AXR_Client,
        api: Api,
        key_value_store: Option<Box<dyn KeyValueStore>>,
    ) -> Result<Self, Error> {
        if handle.is_null() {
            return Err(Error::invalid_argument("the provided plugin client handle is a null pointer"));
        }
        match Self::initialize(handle, api) {
            Ok((platform_name, platform_version, process_index, graph)) => {
                let platform_id = fingerprint(&platform_name);
                Ok(Self {
                    handle,
                    api,
                    platform_name,
                    platform_version,
                    platform_id,
                    process_index,
                    graph,
                    attributes: OnceLock::new(),
                    key_value_store,
                })
            }
            Err(error) => {
                let _guard = PLUGIN_CLIENT_LIFECYCLE_GUARD.lock().unwrap();
                use ffi::AXR_Client_Destroy_Args;
                let _ = invoke_plugin_api_error_fn!(api, AXR_Client_Destroy, { client = handle });
                Err(error)
            }
        }
    }

    /// Fetches the platform metadata of the plugin client with the provided handle and constructs its device/memory
    /// graph.
    fn initialize(
        handle: *mut ffi::AXR_Client,
        api: Api,
    ) -> Result<(String, String, ProcessIndex, DeviceMemoryGraph), Error> {
        use ffi::{AXR_Client_PlatformName_Args, AXR_Client_PlatformVersion_Args, AXR_Client_ProcessIndex_Args};
        let platform_name = invoke_plugin_api_error_fn!(
            api,
            AXR_Client_PlatformName,
            { client = handle },
            { platform_name, platform_name_size },
        )
        .map(|(string, string_len)| str_from_c_api(string, string_len).into_owned())?;
        let platform_version = invoke_plugin_api_error_fn!(
            api,
            AXR_Client_PlatformVersion,
            { client = handle },
            { platform_version, platform_version_size },
        )
        .map(|(string, string_len)| str_from_c_api(string, string_len).into_owned())?;
        let process_index =
            invoke_plugin_api_error_fn!(api, AXR_Client_ProcessIndex, { client = handle }, { process_index })
                .map(|index| index as usize)?;
        let graph = DeviceMemoryGraph::new(api, handle)?;
        Ok((platform_name, platform_version, process_index, graph))
    }

    /// Returns the [`AXR_Client`](ffi::AXR_Client) that corresponds to this [`Client`] and which can
    /// be passed to functions in the plugin ABI.
    pub(crate) unsafe fn to_c_api(&self) -> *mut ffi::AXR_Client {
        self.handle
    }

    /// Returns the underlying plugin [`Api`].
    pub(crate) fn api(&self) -> Api {
        self.api
    }

    /// [`Value`] of the attribute with the provided `name` attached to this [`Client`],
    /// or [`Error::NotFound`] if no such attribute is attached to this [`Client`].
    pub fn attribute<N: AsRef<str>>(&self, name: N) -> Result<Value, Error> {
        let name = name.as_ref();
        self.attributes()?
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("no attribute named '{name}' found in this client")))
    }

    /// Returns the attributes associated with this [`Client`] (e.g., the version of the compiler that the loaded
    /// plugin was compiled against). The specific attributes returned depend on the [`Plugin`](crate::Plugin)
    /// implementation.
    pub fn attributes(&self) -> Result<&HashMap<String, Value>, Error> {
        self.attributes.get_or_init(|| self.api().attributes()).as_ref().map_err(|error| error.clone())
    }

    /// Returns the [`KeyValueStore`] that this [`Client`] has access to.
    pub fn key_value_store(&self) -> Option<&dyn KeyValueStore> {
        self.key_value_store.as_deref()
    }

    /// Returns a string that identifies the platform of this [`Client`] (e.g., `"cpu"`, `"gpu"`, etc.).
    pub fn platform_name(&self) -> &str {
        &self.platform_name
    }

    /// Returns a string that contains human-readable, platform-specific, version information for this [`Client`]
    /// (e.g., the driver version for GPU clients).
    pub fn platform_version(&self) -> &str {
        &self.platform_version
    }

    /// [`PlatformId`] that identifies the platform of this [`Client`]. Two clients connected to the same platform
    /// within the same process will report the same ID.
    pub fn platform_id(&self) -> PlatformId {
        self.platform_id
    }

    /// Process index of this [`Client`]. This is always `0` in single-process settings.
    pub fn process_index(&self) -> ProcessIndex {
        self.process_index
    }

    /// Returns a [`Vec`] containing all [`Device`]s that are visible to this [`Client`], including both
    /// _addressable_ and _non-addressable_ devices. This is answered from the device/memory graph that was
    /// constructed when this [`Client`] was created, without calling into the plugin.
    pub fn devices(&self) -> Vec<Device<'_>> {
        self.graph.devices.iter().filter_map(|handle| unsafe { Device::from_c_api(*handle, self) }.ok()).collect()
    }

    /// Returns a [`Device`] with the provided [`DeviceId`] if it is visible by this [`Client`] and an
    /// [`Error::NotFound`] otherwise. Lookups resolve through the device map that was constructed when this
    /// [`Client`] was created, without calling into the plugin.
    pub fn lookup_device(&self, id: DeviceId) -> Result<Device<'_>, Error> {
        self.graph
            .device_ids
            .get(&id)
            .and_then(|index| unsafe { Device::from_c_api(self.graph.devices[*index], self) }.ok())
            .ok_or_else(|| Error::not_found(format!("device with ID '{id}' not found")))
    }

    /// Returns a [`Vec`] containing all [`Device`]s that are _addressable_ from this [`Client`] (i.e., devices that
    /// this client can issue commands to). Note that all visible devices are addressable in a single-process
    /// environment. This is answered from the device/memory graph that was constructed when this [`Client`] was
    /// created, without calling into the plugin.
    pub fn addressable_devices(&self) -> Vec<Device<'_>> {
        self.graph
            .addressable_devices
            .iter()
            .filter_map(|index| unsafe { Device::from_c_api(self.graph.devices[*index], self) }.ok())
            .collect()
    }

    /// Returns a [`Device`] with the provided [`LocalHardwareId`] if it is addressable by this [`Client`] and an
    /// [`Error::NotFound`] otherwise. Lookups resolve through the device map that was constructed when this
    /// [`Client`] was created, without calling into the plugin.
    pub fn lookup_addressable_device(&self, id: LocalHardwareId) -> Result<Device<'_>, Error> {
        self.graph
            .local_hardware_ids
            .get(&id)
            .and_then(|index| unsafe { Device::from_c_api(self.graph.devices[*index], self) }.ok())
            .ok_or_else(|| Error::not_found(format!("device with local hardware ID '{id}' not found in addressable devices")))
    }

    /// Returns a [`Vec`] containing all [`Memory`]s that are _addressable_ from this [`Client`]. Addressable
    /// memories are those that the client can directly transfer data to and from. This is answered from the
    /// device/memory graph that was constructed when this [`Client`] was created, without calling into the plugin.
    /// Plugins that do not report memory spaces result in an empty list.
    pub fn addressable_memories(&self) -> Vec<Memory<'_>> {
        self.graph.memories.iter().filter_map(|handle| unsafe { Memory::from_c_api(*handle, self) }.ok()).collect()
    }

    /// Returns the [`Memory`]s attached to the [`Device`] with the provided handle, answered from the device/memory
    /// graph of this [`Client`]. Devices that are not addressable by this [`Client`] (and device handles that this
    /// [`Client`] does not own) report an empty list.
    pub(crate) fn memories_for_device(&self, device: *mut AXR_Device) -> Vec<Memory<'_>> {
        self.graph
            .device_indices
            .get(&(device as usize))
            .map(|index| {
                self.graph.device_memories[*index]
                    .iter()
                    .filter_map(|handle| unsafe { Memory::from_c_api(*handle, self) }.ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the [`Device`]s that can address the [`Memory`] with the provided handle, answered from the
    /// device/memory graph of this [`Client`]. Memory handles that this [`Client`] does not own report an
    /// empty list.
    pub(crate) fn devices_for_memory(&self, memory: *mut AXR_Memory) -> Vec<Device<'_>> {
        self.graph
            .memory_indices
            .get(&(memory as usize))
            .map(|index| {
                self.graph.memory_devices[*index]
                    .iter()
                    .filter_map(|handle| unsafe { Device::from_c_api(*handle, self) }.ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the default [`DeviceAssignment`] that should be used for this [`Client`],
    /// given the provided number of replicas and computations.
    pub fn default_device_assignment(
        &self,
        replica_count: usize,
        computation_count: usize,
    ) -> Result<DeviceAssignment, Error> {
        use ffi::AXR_Client_DefaultDeviceAssignment_Args;
        let mut assignment = Vec::with_capacity(replica_count * computation_count);
        invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Client_DefaultDeviceAssignment,
            {
                client = self.to_c_api(),
                num_replicas = replica_count as std::ffi::c_int,
                num_computations = computation_count as std::ffi::c_int,
                default_assignment_size = replica_count * computation_count,
                default_assignment = assignment.as_mut_ptr(),
            },
        )?;
        unsafe { assignment.set_len(replica_count * computation_count) }
        Ok(DeviceAssignment { replica_count, computation_count, assignment })
    }
}

unsafe impl Send for Client {}
unsafe impl Sync for Client {}

impl Drop for Client {
    fn drop(&mut self) {
        let _guard = PLUGIN_CLIENT_LIFECYCLE_GUARD.lock().unwrap();
        use ffi::AXR_Client_Destroy_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Client_Destroy, { client = self.to_c_api() })
            .expect("failed to destroy plugin client");
    }
}

/// Returns the [`PlatformId`] that corresponds to the provided platform name.
fn fingerprint(platform_name: &str) -> PlatformId {
    let mut hasher = DefaultHasher::new();
    platform_name.hash(&mut hasher);
    hasher.finish()
}

/// Device/memory graph of a [`Client`]. The graph is constructed once, when the client is created, and is immutable
/// afterwards, which means that all topology queries can be answered without calling into the plugin and that the
/// returned objects always reference handles owned by the same client.
struct DeviceMemoryGraph {
    /// Handles of all [`Device`]s that are visible to the owning [`Client`], in plugin enumeration order.
    devices: Vec<*mut AXR_Device>,

    /// Map from device handle addresses to indices in [`DeviceMemoryGraph::devices`].
    device_indices: HashMap<usize, usize>,

    /// Map from [`DeviceId`]s to indices in [`DeviceMemoryGraph::devices`].
    device_ids: HashMap<DeviceId, usize>,

    /// Indices (into [`DeviceMemoryGraph::devices`]) of the devices that are _addressable_ by the owning [`Client`],
    /// in plugin enumeration order.
    addressable_devices: Vec<usize>,

    /// Map from [`LocalHardwareId`]s of addressable devices to indices in [`DeviceMemoryGraph::devices`].
    local_hardware_ids: HashMap<LocalHardwareId, usize>,

    /// Handles of all [`Memory`]s that are addressable by the owning [`Client`], in plugin enumeration order.
    memories: Vec<*mut AXR_Memory>,

    /// Map from memory handle addresses to indices in [`DeviceMemoryGraph::memories`].
    memory_indices: HashMap<usize, usize>,

    /// Per-device attached memory handles, parallel to [`DeviceMemoryGraph::devices`]. Devices that are not
    /// addressable (and devices whose memories the plugin does not report) have empty entries.
    device_memories: Vec<Vec<*mut AXR_Memory>>,

    /// Per-memory addressing device handles, parallel to [`DeviceMemoryGraph::memories`].
    memory_devices: Vec<Vec<*mut AXR_Device>>,
}

impl DeviceMemoryGraph {
    /// Constructs the device/memory graph of the plugin client with the provided handle. Construction proceeds in
    /// two passes: the first pass enumerates devices, addressable devices, and addressable memories, and the second
    /// pass fills in the edges between them. Handles reported by later steps must resolve through the maps built by
    /// earlier steps. Plugins that do not report memory spaces (i.e., that return [`Error::Unimplemented`] from the
    /// memory enumeration functions) produce a graph without memory edges rather than an error.
    fn new(api: Api, client: *mut ffi::AXR_Client) -> Result<Self, Error> {
        use crate::devices::ffi::{
            AXR_Device_AddressableMemories_Args, AXR_Device_GetDescription_Args, AXR_Device_LocalHardwareId_Args,
            AXR_DeviceDescription_Id_Args,
        };
        use crate::memories::ffi::AXR_Memory_AddressableByDevices_Args;
        use ffi::{AXR_Client_AddressableDevices_Args, AXR_Client_AddressableMemories_Args, AXR_Client_Devices_Args};

        // Step 1: enumerate all visible devices and build the handle and ID maps.
        let devices = invoke_plugin_api_error_fn!(api, AXR_Client_Devices, { client = client }, {
            devices,
            num_devices
        })
        .map(|(devices, devices_count)| unsafe { slice_from_c_api(devices, devices_count) }.to_vec())?;
        let mut device_indices = HashMap::with_capacity(devices.len());
        let mut device_ids = HashMap::with_capacity(devices.len());
        for (index, device) in devices.iter().enumerate() {
            if device.is_null() {
                return Err(Error::internal("the plugin reported a null device handle"));
            }
            device_indices.insert(*device as usize, index);
            let description = invoke_plugin_api_error_fn!(api, AXR_Device_GetDescription, { device = *device }, {
                device_description
            })?;
            let id = invoke_plugin_api_error_fn!(
                api,
                AXR_DeviceDescription_Id,
                { device_description = description },
                { id },
            )?;
            device_ids.insert(id as usize, index);
        }

        // Step 2: enumerate the addressable devices, which must all resolve through the step-1 handle map.
        let addressable_device_handles =
            invoke_plugin_api_error_fn!(api, AXR_Client_AddressableDevices, { client = client }, {
                addressable_devices,
                num_addressable_devices
            })
            .map(|(devices, devices_count)| unsafe { slice_from_c_api(devices, devices_count) }.to_vec())?;
        let mut addressable_devices = Vec::with_capacity(addressable_device_handles.len());
        let mut local_hardware_ids = HashMap::with_capacity(addressable_device_handles.len());
        for device in &addressable_device_handles {
            let index = *device_indices.get(&(*device as usize)).ok_or_else(|| {
                Error::internal("the plugin reported an addressable device that is not in its device list")
            })?;
            addressable_devices.push(index);
            let local_hardware_id =
                invoke_plugin_api_error_fn!(api, AXR_Device_LocalHardwareId, { device = *device }, {
                    local_hardware_id
                })?;
            if local_hardware_id >= 0 {
                local_hardware_ids.insert(local_hardware_id as usize, index);
            }
        }

        // Step 3: enumerate the addressable memories. Plugins without memory spaces report `Unimplemented`,
        // which results in an empty memory set rather than an error.
        let memories = match invoke_plugin_api_error_fn!(api, AXR_Client_AddressableMemories, { client = client }, {
            addressable_memories,
            num_addressable_memories
        }) {
            Ok((memories, memories_count)) => unsafe { slice_from_c_api(memories, memories_count) }.to_vec(),
            Err(Error::Unimplemented { .. }) => Vec::new(),
            Err(error) => return Err(error),
        };
        let mut memory_indices = HashMap::with_capacity(memories.len());
        for (index, memory) in memories.iter().enumerate() {
            if memory.is_null() {
                return Err(Error::internal("the plugin reported a null memory handle"));
            }
            memory_indices.insert(*memory as usize, index);
        }

        // Step 4: fetch the memories attached to each addressable device. The first `Unimplemented` stops the
        // pass without an error.
        let mut device_memories = vec![Vec::new(); devices.len()];
        for index in &addressable_devices {
            match invoke_plugin_api_error_fn!(api, AXR_Device_AddressableMemories, { device = devices[*index] }, {
                memories,
                num_memories
            }) {
                Ok((memories, memories_count)) => {
                    device_memories[*index] = unsafe { slice_from_c_api(memories, memories_count) }.to_vec();
                }
                Err(Error::Unimplemented { .. }) => break,
                Err(error) => return Err(error),
            }
        }

        // Step 5: fetch the devices that can address each memory, which must all resolve through the step-1
        // handle map. Note that the resulting edges are not reconciled with the step-4 edges; the graph stores
        // both directions exactly as the plugin reported them.
        let mut memory_devices = vec![Vec::new(); memories.len()];
        for (index, memory) in memories.iter().enumerate() {
            let handles = invoke_plugin_api_error_fn!(api, AXR_Memory_AddressableByDevices, { memory = *memory }, {
                devices,
                num_devices
            })
            .map(|(devices, devices_count)| unsafe { slice_from_c_api(devices, devices_count) }.to_vec())?;
            for handle in &handles {
                if !device_indices.contains_key(&(*handle as usize)) {
                    return Err(Error::internal(
                        "the plugin reported a memory as addressable by a device that is not in its device list",
                    ));
                }
            }
            memory_devices[index] = handles;
        }

        Ok(Self {
            devices,
            device_indices,
            device_ids,
            addressable_devices,
            local_hardware_ids,
            memories,
            memory_indices,
            device_memories,
            memory_devices,
        })
    }
}

/// Options that can be passed to [`Plugin::client`](crate::Plugin::client) and
/// [`Plugin::client_with_key_value_store`](crate::Plugin::client_with_key_value_store) to configure a [`Client`].
/// The supported option names and their meanings depend on the loaded [`Plugin`](crate::Plugin); options are passed
/// to the plugin verbatim as named values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClientOptions {
    /// Named options that will be passed to the plugin when creating the [`Client`].
    options: HashMap<String, Value>,
}

impl ClientOptions {
    /// Constructs a new, empty, [`ClientOptions`] instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the option with the provided name to the provided [`Value`],
    /// replacing any previously set value for the same name.
    pub fn with_option<N: Into<String>, V: Into<Value>>(mut self, name: N, value: V) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Returns a collection of [`NamedValue`]s that correspond to this [`ClientOptions`] instance.
    pub(crate) fn to_named_values(&self) -> Vec<NamedValue> {
        self.options.iter().map(|(name, value)| NamedValue::new(name, value.clone())).collect()
    }
}

/// Key-value store that can be used by [`Client`]s to coordinate with other [`Client`]s, potentially running in
/// other processes and/or on other machines. The store must be accessible by all participating processes. Plugins
/// use it during client creation to exchange backend-specific bootstrap information (e.g., network addresses for
/// collective operations).
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored for the provided key, blocking for up to `timeout` until it becomes available.
    fn get(&self, key: &[u8], timeout: Duration) -> Result<Vec<u8>, Error>;

    /// Returns the value stored for the provided key, or [`Error::NotFound`] if it is not currently present.
    /// This function never blocks waiting for the key to appear.
    fn try_get(&self, key: &[u8]) -> Result<Vec<u8>, Error>;

    /// Stores the provided value for the provided key.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), Error>;
}

/// Key-value store callbacks that are handed to the plugin at client creation time. The get and put callbacks form
/// a pair: supplying exactly one of them is an invalid configuration that client creation rejects before calling
/// into the plugin.
pub(crate) struct KeyValueCallbacks {
    pub(crate) get: Option<ffi::AXR_KeyValueGetCallback>,
    pub(crate) get_user_arg: *mut std::ffi::c_void,
    pub(crate) try_get: Option<ffi::AXR_KeyValueTryGetCallback>,
    pub(crate) try_get_user_arg: *mut std::ffi::c_void,
    pub(crate) put: Option<ffi::AXR_KeyValuePutCallback>,
    pub(crate) put_user_arg: *mut std::ffi::c_void,
}

impl Default for KeyValueCallbacks {
    fn default() -> Self {
        Self {
            get: None,
            get_user_arg: std::ptr::null_mut(),
            try_get: None,
            try_get_user_arg: std::ptr::null_mut(),
            put: None,
            put_user_arg: std::ptr::null_mut(),
        }
    }
}

impl Api {
    /// Constructs a new [`Client`] using the provided (optional) platform-specific [`ClientOptions`].
    ///
    /// Note that the resulting [`Client`] will not have access to a [`KeyValueStore`] and thus will have no direct
    /// way to interact with other [`Client`]s. Refer to [`Api::client_with_key_value_store`] for more information.
    pub(crate) fn client(&self, options: ClientOptions) -> Result<Client, Error> {
        self.create_client(options, KeyValueCallbacks::default(), None)
    }

    /// Constructs a new [`Client`] using the provided (optional) platform-specific [`ClientOptions`] and
    /// [`KeyValueStore`]. The provided [`KeyValueStore`] must be accessible across multiple hosts and/or processes.
    /// The resulting [`Client`] takes ownership of the store and keeps it alive for as long as the plugin may invoke
    /// the corresponding callbacks.
    pub(crate) fn client_with_key_value_store<Store: KeyValueStore + 'static>(
        &self,
        options: ClientOptions,
        key_value_store: Store,
    ) -> Result<Client, Error> {
        use crate::errors::ffi::AXR_Error;

        /// Opaque value payload that can be passed to plugin ABI functions, paired with a function that can be used
        /// to drop it. Note that the memory layout of `value` is a little weird. Specifically, there is a `usize`
        /// immediately preceding the point at which `value` is pointing that contains `value_size`. That is used
        /// by `drop_fn` to determine how big of a memory region to drop. That is because the plugin ABI does not
        /// allow us to pass a second argument to `drop_fn` with additional information.
        struct CApiValue {
            value: *mut std::ffi::c_char,
            value_size: usize,
            drop_fn: unsafe extern "C" fn(value: *mut std::ffi::c_char),
        }

        impl CApiValue {
            /// Converts a Rust-owned `Vec<u8>` into a [`CApiValue`] that can be passed to plugin ABI functions.
            /// The callback ABI expects a pointer to the value bytes, the number of bytes in the value, and a
            /// deleter callback that only receives the value pointer. To make deallocation possible from that
            /// pointer alone, we allocate a single boxed byte slice with this layout:
            /// `[value_size (native-endian usize)][value bytes...]`
            /// and return a pointer to the payload region. The allocation is intentionally leaked here and reclaimed
            /// by the deleter callback (i.e., [`CApiValue::drop_fn`]).
            fn new(value: Vec<u8>) -> Self {
                unsafe extern "C" fn delete_value(value: *mut std::ffi::c_char) {
                    unsafe {
                        let header_size = size_of::<usize>();
                        let allocation_ptr = (value as *mut u8).sub(header_size);
                        let mut value_size_bytes = [0u8; size_of::<usize>()];
                        std::ptr::copy_nonoverlapping(
                            allocation_ptr as *const u8,
                            value_size_bytes.as_mut_ptr(),
                            header_size,
                        );
                        let value_size = usize::from_ne_bytes(value_size_bytes);
                        let allocation_ptr =
                            std::ptr::slice_from_raw_parts_mut(allocation_ptr, header_size + value_size);
                        drop(Box::from_raw(allocation_ptr));
                    }
                }

                let header_size = size_of::<usize>();
                let value_size = value.len();
                let mut allocation = vec![0u8; header_size + value_size].into_boxed_slice();
                allocation[..header_size].copy_from_slice(&value_size.to_ne_bytes());
                allocation[header_size..].copy_from_slice(&value);
                let allocation_ptr = allocation.as_mut_ptr();
                std::mem::forget(allocation);
                Self {
                    value: unsafe { allocation_ptr.add(header_size) as *mut std::ffi::c_char },
                    value_size,
                    drop_fn: delete_value,
                }
            }
        }

        unsafe extern "C" fn put<KVS: KeyValueStore>(args: *mut ffi::AXR_KeyValuePutCallback_Args) -> *mut AXR_Error {
            unsafe {
                let store = ((*args).user_arg as *const KVS).as_ref().expect("invalid plugin key-value store");
                let key = slice_from_c_api((*args).key as *const u8, (*args).key_size);
                let value = slice_from_c_api((*args).value as *const u8, (*args).value_size);
                match store.put(key, value) {
                    Ok(_) => std::ptr::null_mut(),
                    Err(error) => error.to_c_api((*args).callback_error) as *mut _,
                }
            }
        }

        unsafe extern "C" fn get<KVS: KeyValueStore>(args: *mut ffi::AXR_KeyValueGetCallback_Args) -> *mut AXR_Error {
            unsafe {
                let store = ((*args).user_arg as *const KVS).as_ref().expect("invalid plugin key-value store");
                let key = slice_from_c_api((*args).key as *const u8, (*args).key_size);
                match store.get(key, Duration::from_millis((*args).timeout_in_ms as u64)) {
                    Ok(value) => {
                        let value = CApiValue::new(value);
                        (*args).value = value.value;
                        (*args).value_size = value.value_size;
                        (*args).value_deleter_callback = value.drop_fn;
                        std::ptr::null_mut()
                    }
                    Err(error) => error.to_c_api((*args).callback_error) as *mut _,
                }
            }
        }

        unsafe extern "C" fn try_get<KVS: KeyValueStore>(
            args: *mut ffi::AXR_KeyValueTryGetCallback_Args,
        ) -> *mut AXR_Error {
            unsafe {
                let store = ((*args).user_arg as *const KVS).as_ref().expect("invalid plugin key-value store");
                let key = slice_from_c_api((*args).key as *const u8, (*args).key_size);
                match store.try_get(key) {
                    Ok(value) => {
                        let value = CApiValue::new(value);
                        (*args).value = value.value;
                        (*args).value_size = value.value_size;
                        (*args).value_deleter_callback = value.drop_fn;
                        std::ptr::null_mut()
                    }
                    Err(error) => error.to_c_api((*args).callback_error) as *mut _,
                }
            }
        }

        let store = Box::new(key_value_store);
        let user_arg = &*store as *const Store as *mut std::ffi::c_void;
        let callbacks = KeyValueCallbacks {
            get: Some(get::<Store>),
            get_user_arg: user_arg,
            try_get: Some(try_get::<Store>),
            try_get_user_arg: user_arg,
            put: Some(put::<Store>),
            put_user_arg: user_arg,
        };
        self.create_client(options, callbacks, Some(store))
    }

    /// Constructs a new [`Client`] using the provided [`ClientOptions`] and key-value store callbacks. The get and
    /// put callbacks must either both be provided or both be omitted; supplying exactly one of them is rejected with
    /// an [`Error::InvalidArgument`] before any plugin function is called.
    pub(crate) fn create_client(
        &self,
        options: ClientOptions,
        callbacks: KeyValueCallbacks,
        key_value_store: Option<Box<dyn KeyValueStore>>,
    ) -> Result<Client, Error> {
        use ffi::AXR_Client_Create_Args;
        if callbacks.get.is_some() != callbacks.put.is_some() {
            return Err(Error::invalid_argument(
                "the key-value store get and put callbacks must either both be provided or both be omitted",
            ));
        }
        let options = options.to_named_values();
        let options = options.iter().map(|option| unsafe { option.to_c_api() }).collect::<Vec<_>>();
        let handle = {
            let _guard = PLUGIN_CLIENT_LIFECYCLE_GUARD.lock().unwrap();
            invoke_plugin_api_error_fn!(
                *self,
                AXR_Client_Create,
                {
                    create_options = options.as_slice().as_ptr(),
                    num_options = options.len(),
                    kv_get_callback = callbacks.get,
                    kv_get_user_arg = callbacks.get_user_arg,
                    kv_put_callback = callbacks.put,
                    kv_put_user_arg = callbacks.put_user_arg,
                    kv_try_get_callback = callbacks.try_get,
                    kv_try_get_user_arg = callbacks.try_get_user_arg,
                },
                { client },
            )?
        };
        unsafe { Client::from_c_api(handle, *self, key_value_store) }
    }
}

#[allow(dead_code, non_camel_case_types, non_snake_case, non_upper_case_globals)]
pub(crate) mod ffi {
    use std::marker::{PhantomData, PhantomPinned};

    use crate::devices::ffi::AXR_Device;
    use crate::errors::ffi::{AXR_CallbackError, AXR_Error};
    use crate::ffi::AXR_Extension_Base;
    use crate::memories::ffi::AXR_Memory;
    use crate::values::ffi::AXR_NamedValue;

    // We represent opaque C types as structs with a particular structure that is following the convention
    // suggested in [the Rustonomicon](https://doc.rust-lang.org/nomicon/ffi.html#representing-opaque-structs).
    #[repr(C)]
    pub struct AXR_Client {
        _data: [u8; 0],
        _marker: PhantomData<(*mut u8, PhantomPinned)>,
    }

    pub type AXR_KeyValueGetCallback_ValueDeleter = unsafe extern "C" fn(value: *mut std::ffi::c_char);

    #[repr(C)]
    pub struct AXR_KeyValueGetCallback_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub key: *const std::ffi::c_char,
        pub key_size: usize,
        pub timeout_in_ms: std::ffi::c_int,
        pub callback_error: *mut AXR_CallbackError,
        pub user_arg: *mut std::ffi::c_void,
        pub value: *mut std::ffi::c_char,
        pub value_size: usize,
        pub value_deleter_callback: AXR_KeyValueGetCallback_ValueDeleter,
    }

    impl AXR_KeyValueGetCallback_Args {
        pub fn new(
            key: *const std::ffi::c_char,
            key_size: usize,
            timeout_in_ms: std::ffi::c_int,
            callback_error: *mut AXR_CallbackError,
            user_arg: *mut std::ffi::c_void,
            value_deleter_callback: AXR_KeyValueGetCallback_ValueDeleter,
        ) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                key,
                key_size,
                timeout_in_ms,
                callback_error,
                user_arg,
                value: std::ptr::null_mut(),
                value_size: 0,
                value_deleter_callback,
            }
        }
    }

    pub type AXR_KeyValueGetCallback = unsafe extern "C" fn(args: *mut AXR_KeyValueGetCallback_Args) -> *mut AXR_Error;

    pub type AXR_KeyValueTryGetCallback_ValueDeleter = unsafe extern "C" fn(value: *mut std::ffi::c_char);

    #[repr(C)]
    pub struct AXR_KeyValueTryGetCallback_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub key: *const std::ffi::c_char,
        pub key_size: usize,
        pub callback_error: *mut AXR_CallbackError,
        pub user_arg: *mut std::ffi::c_void,
        pub value: *mut std::ffi::c_char,
        pub value_size: usize,
        pub value_deleter_callback: AXR_KeyValueTryGetCallback_ValueDeleter,
    }

    impl AXR_KeyValueTryGetCallback_Args {
        pub fn new(
            key: *const std::ffi::c_char,
            key_size: usize,
            callback_error: *mut AXR_CallbackError,
            user_arg: *mut std::ffi::c_void,
            value_deleter_callback: AXR_KeyValueTryGetCallback_ValueDeleter,
        ) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                key,
                key_size,
                callback_error,
                user_arg,
                value: std::ptr::null_mut(),
                value_size: 0,
                value_deleter_callback,
            }
        }
    }

    pub type AXR_KeyValueTryGetCallback =
        unsafe extern "C" fn(args: *mut AXR_KeyValueTryGetCallback_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_KeyValuePutCallback_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub key: *const std::ffi::c_char,
        pub key_size: usize,
        pub value: *const std::ffi::c_char,
        pub value_size: usize,
        pub callback_error: *mut AXR_CallbackError,
        pub user_arg: *mut std::ffi::c_void,
    }

    impl AXR_KeyValuePutCallback_Args {
        pub fn new(
            key: *const std::ffi::c_char,
            key_size: usize,
            value: *const std::ffi::c_char,
            value_size: usize,
            callback_error: *mut AXR_CallbackError,
            user_arg: *mut std::ffi::c_void,
        ) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                key,
                key_size,
                value,
                value_size,
                callback_error,
                user_arg,
            }
        }
    }

    pub type AXR_KeyValuePutCallback = unsafe extern "C" fn(args: *mut AXR_KeyValuePutCallback_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Client_Create_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub create_options: *const AXR_NamedValue,
        pub num_options: usize,
        pub kv_get_callback: Option<AXR_KeyValueGetCallback>,
        pub kv_get_user_arg: *mut std::ffi::c_void,
        pub kv_put_callback: Option<AXR_KeyValuePutCallback>,
        pub kv_put_user_arg: *mut std::ffi::c_void,
        pub client: *mut AXR_Client,
        pub kv_try_get_callback: Option<AXR_KeyValueTryGetCallback>,
        pub kv_try_get_user_arg: *mut std::ffi::c_void,
    }

    impl AXR_Client_Create_Args {
        pub fn new(
            create_options: *const AXR_NamedValue,
            num_options: usize,
            kv_get_callback: Option<AXR_KeyValueGetCallback>,
            kv_get_user_arg: *mut std::ffi::c_void,
            kv_put_callback: Option<AXR_KeyValuePutCallback>,
            kv_put_user_arg: *mut std::ffi::c_void,
            kv_try_get_callback: Option<AXR_KeyValueTryGetCallback>,
            kv_try_get_user_arg: *mut std::ffi::c_void,
        ) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                create_options,
                num_options,
                kv_get_callback,
                kv_get_user_arg,
                kv_put_callback,
                kv_put_user_arg,
                client: std::ptr::null_mut(),
                kv_try_get_callback,
                kv_try_get_user_arg,
            }
        }
    }

    pub type AXR_Client_Create = unsafe extern "C" fn(args: *mut AXR_Client_Create_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Client_Destroy_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub client: *mut AXR_Client,
    }

    impl AXR_Client_Destroy_Args {
        pub fn new(client: *mut AXR_Client) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), client }
        }
    }

    pub type AXR_Client_Destroy = unsafe extern "C" fn(args: *mut AXR_Client_Destroy_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Client_PlatformName_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub client: *mut AXR_Client,
        pub platform_name: *const std::ffi::c_char,
        pub platform_name_size: usize,
    }

    impl AXR_Client_PlatformName_Args {
        pub fn new(client: *mut AXR_Client) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                client,
                platform_name: std::ptr::null_mut(),
                platform_name_size: 0,
            }
        }
    }

    pub type AXR_Client_PlatformName =
        unsafe extern "C" fn(args: *mut AXR_Client_PlatformName_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Client_PlatformVersion_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub client: *mut AXR_Client,
        pub platform_version: *const std::ffi::c_char,
        pub platform_version_size: usize,
    }

    impl AXR_Client_PlatformVersion_Args {
        pub fn new(client: *mut AXR_Client) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                client,
                platform_version: std::ptr::null_mut(),
                platform_version_size: 0,
            }
        }
    }

    pub type AXR_Client_PlatformVersion =
        unsafe extern "C" fn(args: *mut AXR_Client_PlatformVersion_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Client_ProcessIndex_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub client: *mut AXR_Client,
        pub process_index: std::ffi::c_int,
    }

    impl AXR_Client_ProcessIndex_Args {
        pub fn new(client: *mut AXR_Client) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), client, process_index: 0 }
        }
    }

    pub type AXR_Client_ProcessIndex =
        unsafe extern "C" fn(args: *mut AXR_Client_ProcessIndex_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Client_Devices_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub client: *mut AXR_Client,
        pub devices: *const *mut AXR_Device,
        pub num_devices: usize,
    }

    impl AXR_Client_Devices_Args {
        pub fn new(client: *mut AXR_Client) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                client,
                devices: std::ptr::null_mut(),
                num_devices: 0,
            }
        }
    }

    pub type AXR_Client_Devices = unsafe extern "C" fn(args: *mut AXR_Client_Devices_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Client_AddressableDevices_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub client: *mut AXR_Client,
        pub addressable_devices: *const *mut AXR_Device,
        pub num_addressable_devices: usize,
    }

    impl AXR_Client_AddressableDevices_Args {
        pub fn new(client: *mut AXR_Client) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                client,
                addressable_devices: std::ptr::null_mut(),
                num_addressable_devices: 0,
            }
        }
    }

    pub type AXR_Client_AddressableDevices =
        unsafe extern "C" fn(args: *mut AXR_Client_AddressableDevices_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Client_AddressableMemories_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub client: *mut AXR_Client,
        pub addressable_memories: *const *mut AXR_Memory,
        pub num_addressable_memories: usize,
    }

    impl AXR_Client_AddressableMemories_Args {
        pub fn new(client: *mut AXR_Client) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                client,
                addressable_memories: std::ptr::null(),
                num_addressable_memories: 0,
            }
        }
    }

    pub type AXR_Client_AddressableMemories =
        unsafe extern "C" fn(args: *mut AXR_Client_AddressableMemories_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Client_DefaultDeviceAssignment_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub client: *mut AXR_Client,
        pub num_replicas: std::ffi::c_int,
        pub num_computations: std::ffi::c_int,
        pub default_assignment_size: usize,
        pub default_assignment: *mut std::ffi::c_int,
    }

    impl AXR_Client_DefaultDeviceAssignment_Args {
        pub fn new(
            client: *mut AXR_Client,
            num_replicas: std::ffi::c_int,
            num_computations: std::ffi::c_int,
            default_assignment_size: usize,
            default_assignment: *mut std::ffi::c_int,
        ) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                client,
                num_replicas,
                num_computations,
                default_assignment_size,
                default_assignment,
            }
        }
    }

    pub type AXR_Client_DefaultDeviceAssignment =
        unsafe extern "C" fn(args: *mut AXR_Client_DefaultDeviceAssignment_Args) -> *mut AXR_Error;
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::KeyValueCallbacks;
    use crate::tests::{test_client, test_plugin};
    use crate::{Client, ClientOptions, Error, KeyValueStore, NamedValue};

    #[derive(Default)]
    struct TestKeyValueStore {
        values: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    }

    impl KeyValueStore for TestKeyValueStore {
        fn get(&self, key: &[u8], _timeout: Duration) -> Result<Vec<u8>, Error> {
            self.try_get(key)
        }

        fn try_get(&self, key: &[u8]) -> Result<Vec<u8>, Error> {
            self.values
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| Error::not_found(format!("key '{}' not found", String::from_utf8_lossy(key))))
        }

        fn put(&self, key: &[u8], value: &[u8]) -> Result<(), Error> {
            self.values.lock().unwrap().insert(key.to_vec(), value.to_vec());
            Ok(())
        }
    }

    #[test]
    fn test_client_metadata() {
        let client = test_client();
        assert_eq!(client.platform_name(), "test");
        assert_eq!(client.platform_version(), "test 1.4");
        assert_eq!(client.process_index(), 0);
        assert!(client.key_value_store().is_none());

        // Two clients connected to the same platform report the same platform ID.
        let other = test_client();
        assert_eq!(client.platform_id(), other.platform_id());

        // Test creating a client from a null pointer.
        assert!(matches!(
            unsafe { Client::from_c_api(std::ptr::null_mut(), client.api(), None) },
            Err(Error::InvalidArgument { message, .. })
                if message == "the provided plugin client handle is a null pointer",
        ));
    }

    #[test]
    fn test_client_graph() {
        let client = test_client();
        let devices = client.devices();
        assert_eq!(devices.len(), 2);
        assert_eq!(client.addressable_devices().len(), 2);
        let memories = client.addressable_memories();
        assert_eq!(memories.len(), 2);

        // Lookups resolve through the maps built at client creation time.
        assert_eq!(client.lookup_device(0).unwrap().id(), Ok(0));
        assert_eq!(client.lookup_device(1).unwrap().id(), Ok(1));
        assert!(matches!(client.lookup_device(7), Err(Error::NotFound { .. })));
        assert_eq!(client.lookup_addressable_device(0).unwrap().id(), Ok(0));
        assert!(matches!(client.lookup_addressable_device(9), Err(Error::NotFound { .. })));

        // All graph edges reference handles owned by the same client.
        let memory_handles = memories.iter().map(|memory| unsafe { memory.to_c_api() } as usize).collect::<Vec<_>>();
        let device_handles = devices.iter().map(|device| unsafe { device.to_c_api() } as usize).collect::<Vec<_>>();
        for device in &devices {
            for memory in device.memories() {
                assert!(memory_handles.contains(&(unsafe { memory.to_c_api() } as usize)));
            }
        }
        for memory in &memories {
            for device in memory.addressable_by_devices() {
                assert!(device_handles.contains(&(unsafe { device.to_c_api() } as usize)));
            }
        }

        // Distinct clients never share handles.
        let other = test_client();
        for device in other.devices() {
            assert!(!device_handles.contains(&(unsafe { device.to_c_api() } as usize)));
        }
        for memory in other.addressable_memories() {
            assert!(!memory_handles.contains(&(unsafe { memory.to_c_api() } as usize)));
        }
    }

    #[test]
    fn test_client_options() {
        let options = ClientOptions::new().with_option("device_count", 4i64).with_option("verbose", true);
        let mut named_values = options.to_named_values();
        named_values.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(named_values, vec![NamedValue::new("device_count", 4i64), NamedValue::new("verbose", true)]);
        assert_eq!(ClientOptions::default().to_named_values(), Vec::new());
        assert_eq!(options, options.clone());
        assert_ne!(options, ClientOptions::default());
    }

    #[test]
    fn test_client_key_value_store() {
        let plugin = test_plugin();
        let client = plugin.client_with_key_value_store(ClientOptions::default(), TestKeyValueStore::default());
        let client = client.unwrap();
        let store = client.key_value_store().unwrap();

        // During client creation, the fake plugin round-trips a handshake value through the callbacks that were
        // handed to it, exercising the full marshalling path including the value deleter.
        assert_eq!(store.try_get(b"handshake"), Ok(b"ok".to_vec()));

        assert!(store.put(b"key", b"value").is_ok());
        assert_eq!(store.try_get(b"key"), Ok(b"value".to_vec()));
        assert_eq!(store.get(b"key", Duration::from_millis(10)), Ok(b"value".to_vec()));
        assert!(matches!(store.try_get(b"missing"), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_client_mismatched_key_value_callbacks() {
        unsafe extern "C" fn get(
            _args: *mut crate::clients::ffi::AXR_KeyValueGetCallback_Args,
        ) -> *mut crate::errors::ffi::AXR_Error {
            std::ptr::null_mut()
        }

        let plugin = test_plugin();
        let callbacks = KeyValueCallbacks { get: Some(get), ..Default::default() };
        assert!(matches!(
            plugin.api().create_client(ClientOptions::default(), callbacks, None),
            Err(Error::InvalidArgument { message, .. })
                if message == "the key-value store get and put callbacks must either both be provided or both be omitted",
        ));
    }
}
