use std::borrow::Cow;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use crate::{
    Api, Buffer, BufferType, Client, Device, Error, Event, Layout, Plugin, ReceiveCallback, SendCallback, Topology,
    Value, hash_map_from_c_api, invoke_plugin_api_error_fn, slice_from_c_api, str_from_c_api,
};

/// Minor version of the IR bytecode writer that this crate emits. The bytecode version is pinned so that programs
/// produced by this crate remain loadable by older plugins. It must not be raised until the plugin ABI declares
/// stable support for a newer version.
pub const IR_BYTECODE_PINNED_MINOR_VERSION: u32 = 1;

/// Program that can be compiled using a [`Client`]. Programs can be provided in multiple formats though not all
/// backend [`Plugin`]s support all formats.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Program {
    /// Program represented using the stable serialized numeric-program format.
    Serialized {
        /// Serialized bytes that represent a program.
        bytes: Vec<u8>,
    },

    /// Program represented using versioned IR bytecode. Note that different backend [`Plugin`]s may support
    /// different IR dialects and so not all programs are necessarily compatible with all plugins.
    Ir {
        /// IR bytecode that represents a program.
        bytecode: Vec<u8>,

        /// Minor version of the IR bytecode writer that produced [`Program::Ir::bytecode`].
        minor_version: u32,
    },

    /// Program represented using the stable serialized numeric-program format, paired with the configuration that
    /// was used to produce it. This format is only ever produced by plugins (e.g., [`Executable::optimized_program`])
    /// and is not meant to be constructed by callers.
    IrWithConfig {
        /// Serialized bytes that represent a program paired with its configuration.
        bytes: Vec<u8>,
    },
}

impl Program {
    /// Constructs a new [`Program`] from the provided IR bytecode, recording the pinned
    /// [`IR_BYTECODE_PINNED_MINOR_VERSION`] as the bytecode writer version.
    pub fn ir(bytecode: Vec<u8>) -> Self {
        Self::Ir { bytecode, minor_version: IR_BYTECODE_PINNED_MINOR_VERSION }
    }

    /// Returns the code of this [`Program`] that can be passed to functions in the plugin ABI.
    fn code(&self) -> &[u8] {
        match self {
            Self::Serialized { bytes } => bytes,
            Self::Ir { bytecode, .. } => bytecode,
            Self::IrWithConfig { bytes } => bytes,
        }
    }

    /// Returns the format tag of this [`Program`] that can be passed to functions in the plugin ABI.
    fn format(&self) -> std::ffi::CString {
        match self {
            Self::Serialized { .. } => std::ffi::CString::new("program").unwrap(),
            Self::Ir { .. } => std::ffi::CString::new("ir").unwrap(),
            Self::IrWithConfig { .. } => std::ffi::CString::new("ir_with_config").unwrap(),
        }
    }
}

/// Represents a compiled [`Program`] that can be serialized and deserialized to e.g., cache compilation artifacts.
pub struct Executable {
    /// Handle that represents this [`Executable`] in the plugin ABI.
    handle: *mut ffi::AXR_Executable,

    /// Underlying plugin [`Api`].
    api: Api,

    /// Cached [`Executable::cost_analysis`] of this [`Executable`] so that it will only be constructed once.
    cost_analysis: OnceLock<Result<HashMap<String, Value>, Error>>,
}

impl Executable {
    /// Constructs a new [`Executable`] from the provided [`AXR_Executable`](ffi::AXR_Executable)
    /// handle that came from a function in the plugin ABI.
    pub(crate) unsafe fn from_c_api(handle: *mut ffi::AXR_Executable, api: Api) -> Result<Self, Error> {
        if handle.is_null() {
            Err(Error::invalid_argument("the provided plugin executable handle is a null pointer"))
        } else {
            Ok(Self { handle, api, cost_analysis: OnceLock::new() })
        }
    }

    /// Returns the [`AXR_Executable`](ffi::AXR_Executable) that corresponds to this [`Executable`]
    /// and which can be passed to functions in the plugin ABI.
    pub(crate) unsafe fn to_c_api(&self) -> *mut ffi::AXR_Executable {
        self.handle
    }

    /// Returns the underlying plugin [`Api`].
    pub(crate) fn api(&self) -> Api {
        self.api
    }

    /// Returns a string that identifies this [`Executable`].
    pub fn name(&'_ self) -> Result<Cow<'_, str>, Error> {
        use ffi::AXR_Executable_Name_Args;
        invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Executable_Name,
            { executable = self.to_c_api() },
            { executable_name, executable_name_size },
        )
        .map(|(string, string_len)| str_from_c_api(string, string_len))
    }

    /// Returns the number of replicas of this [`Executable`].
    pub fn replica_count(&self) -> Result<usize, Error> {
        use ffi::AXR_Executable_NumReplicas_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Executable_NumReplicas, { executable = self.to_c_api() }, {
            num_replicas
        })
    }

    /// Returns the number of partitions of this [`Executable`].
    pub fn partition_count(&self) -> Result<usize, Error> {
        use ffi::AXR_Executable_NumPartitions_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Executable_NumPartitions, { executable = self.to_c_api() }, {
            num_partitions
        })
    }

    /// Returns the number of outputs of this [`Executable`] per [`Device`].
    pub fn output_count(&self) -> Result<usize, Error> {
        use ffi::AXR_Executable_NumOutputs_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Executable_NumOutputs, { executable = self.to_c_api() }, {
            num_outputs
        })
    }

    /// Returns the [`BufferType`] for each of the outputs of this [`Executable`].
    pub fn output_element_types(&self) -> Result<Vec<BufferType>, Error> {
        use ffi::AXR_Executable_OutputElementTypes_Args;
        invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Executable_OutputElementTypes,
            { executable = self.to_c_api() },
            { output_types, num_output_types },
        )
        .and_then(|(output_types, output_type_count)| {
            unsafe { slice_from_c_api(output_types, output_type_count) }
                .iter()
                .map(|element_type| BufferType::from_c_api(*element_type))
                .collect()
        })
    }

    /// Returns the dimension sizes of each output of this [`Executable`].
    pub fn output_dimensions(&self) -> Result<Vec<Vec<u64>>, Error> {
        use ffi::AXR_Executable_OutputDimensions_Args;
        invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Executable_OutputDimensions,
            { executable = self.to_c_api() },
            { num_outputs, dims, dim_sizes },
        )
        .map(|(output_count, dimensions, dimension_counts)| unsafe {
            let dimension_counts = slice_from_c_api(dimension_counts, output_count);
            let mut dimensions_offset = 0;
            let mut output_dimensions = Vec::with_capacity(output_count);
            for dimension_count in dimension_counts {
                if dimensions.is_null() || *dimension_count == 0 {
                    output_dimensions.push(Vec::new());
                } else {
                    output_dimensions.push(
                        slice_from_c_api(dimensions.add(dimensions_offset) as *const u64, *dimension_count).to_vec(),
                    );
                }
                dimensions_offset += *dimension_count;
            }
            output_dimensions
        })
    }

    /// Returns the [`Memory`](crate::Memory) kind of each output of this [`Executable`].
    pub fn output_memory_kinds(&self) -> Result<Vec<Cow<'_, str>>, Error> {
        use ffi::AXR_Executable_OutputMemoryKinds_Args;
        invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Executable_OutputMemoryKinds,
            { executable = self.to_c_api() },
            { num_outputs, memory_kinds, memory_kind_sizes },
        )
        .map(|(output_count, memory_kinds, memory_kind_sizes)| unsafe {
            let memory_kind_sizes = slice_from_c_api(memory_kind_sizes, output_count);
            let mut output_memory_kinds = Vec::with_capacity(output_count);
            for (index, memory_kind_size) in memory_kind_sizes.iter().enumerate() {
                output_memory_kinds.push(str_from_c_api(*(memory_kinds.add(index)), *memory_kind_size));
            }
            output_memory_kinds
        })
    }

    /// Returns the size of the generated code for this [`Executable`] as a number of bytes. Note that, for
    /// [`Executable`]s that are the result of ahead-of-time compilation (e.g., using [`Plugin::compile`], as opposed
    /// to [`Client::compile`] followed by [`LoadedExecutable::executable`]), this function may return an
    /// [`Error::Unavailable`]. That is because the size of the generated code may depend on the number and type of
    /// addressable [`Device`]s after it is loaded, for example.
    pub fn generated_code_size_in_bytes(&self) -> Result<usize, Error> {
        use ffi::AXR_Executable_SizeOfGeneratedCodeInBytes_Args;
        let size = invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Executable_SizeOfGeneratedCodeInBytes,
            { executable = self.to_c_api() },
            { size_in_bytes },
        )?;
        if size <= 0 {
            Err(Error::unavailable("generated code size is unknown".to_string()))
        } else {
            Ok(size as usize)
        }
    }

    /// Returns a unique fingerprint for this [`Executable`], or [`None`] if the loaded plugin does not implement
    /// fingerprinting. Two [`Executable`]s that were produced by compiling with identical inputs (i.e., with the
    /// same [`Program`], compilation options, compiler version, etc.) should have the same fingerprint.
    pub fn fingerprint(&self) -> Result<Option<String>, Error> {
        use ffi::AXR_Executable_Fingerprint_Args;
        let result = invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Executable_Fingerprint,
            { executable = self.to_c_api() },
            { executable_fingerprint, executable_fingerprint_size },
        );
        match result {
            Ok((string, string_len)) => Ok(Some(str_from_c_api(string, string_len).into_owned())),
            Err(Error::Unimplemented { .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Returns the optimized [`Program`] that corresponds to this [`Executable`]. The plugin reports the program
    /// using the `"program"` or `"ir_with_config"` format tags. Any other tag means that the plugin and this crate
    /// disagree about the ABI contract and is reported as an [`Error::Internal`].
    pub fn optimized_program(&self) -> Result<Program, Error> {
        use ffi::AXR_Executable_OptimizedProgram_Args;
        let mut program = ffi::AXR_Program::new(std::ptr::null_mut(), 0, std::ptr::null(), 0);
        invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Executable_OptimizedProgram,
            {
                executable = self.to_c_api(),
                program = &mut program as *mut _,
            },
        )?;
        let mut code = Vec::<u8>::with_capacity(program.code_size);
        program.code = code.as_mut_ptr() as *mut _;
        invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Executable_OptimizedProgram,
            {
                executable = self.to_c_api(),
                program = &mut program as *mut _,
            },
        )?;
        unsafe { code.set_len(program.code_size) };
        let format =
            std::str::from_utf8(unsafe { slice_from_c_api(program.format as *const u8, program.format_size) });
        match format {
            Ok("program") => Ok(Program::Serialized { bytes: code }),
            Ok("ir_with_config") => Ok(Program::IrWithConfig { bytes: code }),
            Ok(format) => Err(Error::internal(format!("the plugin reported an unknown program format: {format}"))),
            _ => Err(Error::internal("the plugin reported an unknown program format".to_string())),
        }
    }

    /// Returns the cost properties for this [`Executable`] after performing a cost analysis. Note that different
    /// platforms may return different properties. For example, some platforms may return the number of operations
    /// or the memory size of the inputs/outputs of the executable, based on performing program analysis. Other
    /// platforms may return different cost properties.
    pub fn cost_analysis(&self) -> Result<&HashMap<String, Value>, Error> {
        self.cost_analysis
            .get_or_init(|| {
                use ffi::AXR_Executable_GetCostAnalysis_Args;
                let (properties, property_count) = invoke_plugin_api_error_fn!(
                    self.api(),
                    AXR_Executable_GetCostAnalysis,
                    { executable = self.to_c_api() },
                    { properties, num_properties },
                )?;
                Ok(hash_map_from_c_api(properties, property_count))
            })
            .as_ref()
            .map_err(|error| error.clone())
    }

    /// Serializes this [`Executable`] into a [`SerializedExecutable`] (i.e., a byte array).
    pub fn serialize(&self) -> Result<SerializedExecutable, Error> {
        use ffi::AXR_Executable_Serialize_Args;
        invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Executable_Serialize,
            { executable = self.to_c_api() },
            { serialized_bytes, serialized_bytes_size, serialized_executable, serialized_executable_deleter },
        )
        .map(
            |(serialized_bytes, serialized_bytes_size, serialized_executable, serialized_executable_deleter)| {
                SerializedExecutable {
                    handle: serialized_executable,
                    deleter: serialized_executable_deleter,
                    data: serialized_bytes,
                    data_size: serialized_bytes_size,
                }
            },
        )
    }
}

impl Drop for Executable {
    fn drop(&mut self) {
        use ffi::AXR_Executable_Destroy_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Executable_Destroy, { executable = self.to_c_api() })
            .expect("failed to destroy plugin executable");
    }
}

/// Platform-specific serialized representation of an [`Executable`]. Note that the serialization format is not
/// guaranteed to be stable over time.
pub struct SerializedExecutable {
    /// Handle that represents this [`SerializedExecutable`] in the plugin ABI.
    handle: *mut ffi::AXR_SerializedExecutable,

    /// Optional function that must be called to free the underlying memory when dropping this instance.
    deleter: Option<unsafe extern "C" fn(executable: *mut ffi::AXR_SerializedExecutable)>,

    /// Pointer to the underlying bytes of this [`SerializedExecutable`].
    data: *const std::ffi::c_char,

    /// Size (i.e., number of bytes) of this [`SerializedExecutable`].
    data_size: usize,
}

impl SerializedExecutable {
    /// Returns a pointer to the underlying bytes of this [`SerializedExecutable`].
    pub fn data(&self) -> &[u8] {
        unsafe { slice_from_c_api(self.data as *const _, self.data_size) }
    }
}

impl std::fmt::Debug for SerializedExecutable {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("SerializedExecutable").field("data_size", &self.data_size).finish()
    }
}

impl PartialEq for SerializedExecutable {
    fn eq(&self, other: &Self) -> bool {
        self.data() == other.data()
    }
}

impl Eq for SerializedExecutable {}

impl Hash for SerializedExecutable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data().hash(state);
    }
}

unsafe impl Send for SerializedExecutable {}
unsafe impl Sync for SerializedExecutable {}

impl Drop for SerializedExecutable {
    fn drop(&mut self) {
        if let Some(deleter) = self.deleter {
            unsafe { deleter(self.handle) };
        }
    }
}

/// In-memory [`Executable`] that represents a compiled [`Program`] which has been loaded by a compatible [`Client`]
/// and is ready to be executed.
///
/// The wrapped [`Executable`] handle and the addressable [`Device`] subset of a loaded executable are fetched once,
/// when the loaded executable is constructed, and are cached afterwards. [`LoadedExecutable::execute`] uses the
/// cached values to validate its inputs and pre-size its outputs without calling back into the plugin.
///
/// The lifetime parameter `'c` captures the lifetime of the [`Client`] that owns this [`LoadedExecutable`],
/// ensuring that the client outlives the loaded executable.
pub struct LoadedExecutable<'c> {
    /// Handle that represents this [`LoadedExecutable`] in the plugin ABI.
    handle: *mut ffi::AXR_LoadedExecutable,

    /// [`Client`] that owns this [`LoadedExecutable`].
    client: &'c Client,

    /// Wrapped [`Executable`] of this [`LoadedExecutable`], fetched once at construction time.
    executable: Executable,

    /// _Addressable_ [`Device`]s that this [`LoadedExecutable`] will run on, fetched once at construction time.
    addressable_devices: Vec<Device<'c>>,
}

impl<'c> LoadedExecutable<'c> {
    /// Constructs a new [`LoadedExecutable`] from the provided [`AXR_LoadedExecutable`](ffi::AXR_LoadedExecutable)
    /// handle that came from a function in the plugin ABI. This fetches the wrapped [`Executable`] and the
    /// addressable [`Device`]s of the loaded executable. If any of that fails, the plugin loaded executable is
    /// destroyed before the error is returned.
    pub(crate) unsafe fn from_c_api(handle: *mut ffi::AXR_LoadedExecutable, client: &'c Client) -> Result<Self, Error> {
        if handle.is_null() {
            return Err(Error::invalid_argument("the provided plugin loaded executable handle is a null pointer"));
        }
        match Self::initialize(handle, client) {
            Ok((executable, addressable_devices)) => Ok(Self { handle, client, executable, addressable_devices }),
            Err(error) => {
                use ffi::AXR_LoadedExecutable_Destroy_Args;
                let _ = invoke_plugin_api_error_fn!(client.api(), AXR_LoadedExecutable_Destroy, {
                    executable = handle,
                });
                Err(error)
            }
        }
    }

    /// Fetches the wrapped [`Executable`] and the addressable [`Device`]s of the plugin loaded executable with the
    /// provided handle.
    fn initialize(
        handle: *mut ffi::AXR_LoadedExecutable,
        client: &'c Client,
    ) -> Result<(Executable, Vec<Device<'c>>), Error> {
        use ffi::{AXR_LoadedExecutable_AddressableDevices_Args, AXR_LoadedExecutable_GetExecutable_Args};
        let executable = invoke_plugin_api_error_fn!(
            client.api(),
            AXR_LoadedExecutable_GetExecutable,
            { loaded_executable = handle },
            { executable },
        )
        .and_then(|executable_handle| unsafe { Executable::from_c_api(executable_handle, client.api()) })?;
        let addressable_devices = invoke_plugin_api_error_fn!(
            client.api(),
            AXR_LoadedExecutable_AddressableDevices,
            { executable = handle },
            { addressable_devices, num_addressable_devices },
        )
        .and_then(|(devices, devices_count)| {
            unsafe { slice_from_c_api(devices, devices_count) }
                .iter()
                .map(|device_handle| unsafe { Device::from_c_api(*device_handle, client) })
                .collect::<Result<Vec<_>, _>>()
        })?;
        Ok((executable, addressable_devices))
    }

    /// Returns the [`AXR_LoadedExecutable`](ffi::AXR_LoadedExecutable) that corresponds to this [`LoadedExecutable`]
    /// and which can be passed to functions in the plugin ABI.
    pub(crate) unsafe fn to_c_api(&self) -> *mut ffi::AXR_LoadedExecutable {
        self.handle
    }

    /// Returns the underlying plugin [`Api`].
    pub(crate) fn api(&self) -> Api {
        self.client.api()
    }

    /// Returns the [`Client`] that owns this [`LoadedExecutable`].
    pub fn client(&self) -> &'c Client {
        self.client
    }

    /// Returns the [`Executable`] that corresponds to this [`LoadedExecutable`].
    pub fn executable(&self) -> &Executable {
        &self.executable
    }

    /// Returns the _addressable_ [`Device`]s that this [`LoadedExecutable`] will run on.
    pub fn addressable_devices(&self) -> &[Device<'c>] {
        &self.addressable_devices
    }

    /// Executes this [`LoadedExecutable`] on its _addressable_ devices (or on a single _addressable_ device if
    /// `device` is provided) using the provided inputs. Note that execution is asynchronous and so the runtime may
    /// not have completed execution by the time this function returns. You can use [`Buffer::ready`] on the returned
    /// [`Buffer`]s or [`ExecutionDeviceOutputs::done`] to wait for the execution to complete.
    ///
    /// # Parameters
    ///
    ///   - `inputs`: [`ExecutionDeviceInputs`]s for each [`Device`] that is _addressable_ by this
    ///     [`LoadedExecutable`]. If `device` is not [`None`], this must contain exactly one entry corresponding to
    ///     that [`Device`]. Otherwise, the length of this [`Vec`] must match the length of
    ///     [`LoadedExecutable::addressable_devices`] for this [`LoadedExecutable`].
    ///   - `launch_id`: Identifier for this execution/launch as part of a potentially multi-device launch. This can
    ///     be used to detect scheduling errors (e.g. if multi-host programs are launched in different orders on
    ///     different hosts, the launch IDs may be used by the runtime to detect the mismatch).
    ///   - `callback_data_layout`: Optional [`Layout`] describing how [`SendCallback`] and [`ReceiveCallback`] data
    ///     is laid out in host memory. Only the major-to-minor layout is supported; requesting any other layout
    ///     results in an [`Error::Unimplemented`]. [`None`] means major-to-minor.
    ///   - `device`: Optional _addressable_ [`Device`] on which to execute this [`LoadedExecutable`]. When provided,
    ///     the execution is launched only on that device and `inputs` must contain only inputs for this device. This
    ///     argument can be used with a multi-device [`LoadedExecutable`] to launch its execution only on one device.
    ///     In that case, the callers are responsible for separately launching execution on all participating devices
    ///     specified at compile time.
    pub fn execute<'l>(
        &self,
        inputs: Vec<ExecutionDeviceInputs<'c, 'l>>,
        launch_id: usize,
        callback_data_layout: Option<Layout>,
        device: Option<&Device<'c>>,
    ) -> Result<Vec<ExecutionDeviceOutputs<'c>>, Error> {
        use ffi::AXR_LoadedExecutable_Execute_Args;

        let mut inputs = inputs;

        let device_count = if device.is_some() { 1 } else { self.addressable_devices.len() };
        let input_count = inputs.first().map(|inputs| inputs.inputs.len()).unwrap_or(0);
        let input_is_donatable = inputs
            .first()
            .map(|inputs| inputs.inputs.iter().map(|input| input.donatable).collect::<Vec<bool>>())
            .unwrap_or_default();
        let send_callback_count = inputs.first().map(|inputs| inputs.send_callbacks.len()).unwrap_or(0);
        let receive_callback_count = inputs.first().map(|inputs| inputs.receive_callbacks.len()).unwrap_or(0);

        if inputs.len() != device_count {
            return Err(Error::invalid_argument(format!(
                "expected inputs for {device_count} device(s) but got inputs for {} device(s)",
                inputs.len(),
            )));
        }

        for (device_index, device_inputs) in inputs.iter().enumerate() {
            if device_inputs.inputs.len() != input_count {
                return Err(Error::invalid_argument(format!(
                    "expected {input_count} input(s) for each device but got {} for device {device_index}",
                    device_inputs.inputs.len(),
                )));
            }

            for (input_index, input) in device_inputs.inputs.iter().enumerate() {
                if input.donatable != input_is_donatable[input_index] {
                    return Err(Error::invalid_argument(format!(
                        "input {input_index} is not marked consistently across all devices \
                            as donatable or non-donatable",
                    )));
                }
            }

            if device_inputs.send_callbacks.len() != send_callback_count {
                return Err(Error::invalid_argument(format!(
                    "expected {send_callback_count} send callback(s) for each device \
                        but got {} for device {device_index}",
                    device_inputs.send_callbacks.len(),
                )));
            }

            if device_inputs.receive_callbacks.len() != receive_callback_count {
                return Err(Error::invalid_argument(format!(
                    "expected {receive_callback_count} receive callback(s) for each device \
                        but got {} for device {device_index}",
                    device_inputs.receive_callbacks.len(),
                )));
            }
        }

        if let Some(layout) = &callback_data_layout {
            if !layout.is_major_to_minor() {
                return Err(Error::unimplemented(
                    "only the major-to-minor data layout is supported for send and receive callback data",
                ));
            }
        }

        // We need to handle memory related to send and receive callbacks _very_ carefully here. Specifically,
        // [`SendCallback::to_c_api`] returns a data structure which contains a pointer that was allocated by using
        // [`Box::into_raw`]. We shall pass those pointers to the [`AXR_LoadedExecutable_Execute`] plugin function
        // later on, but we need to make sure that we free the underlying memory _after_ the execution completes and
        // also in the case when something goes wrong. For that reason, we take ownership of these pointers using
        // [`Box::from_raw`] in `owned_send_callbacks`. This will ensure that if anything goes wrong later on in this
        // function, the underlying memory will be freed. Furthermore, after the call to
        // [`AXR_LoadedExecutable_Execute`] and assuming that everything went well, we move ownership of the
        // callbacks to the corresponding [`Event::on_ready`] callbacks so that the underlying memory will be freed
        // once execution completes.
        let mut send_callbacks = unsafe {
            inputs
                .iter_mut()
                .map(|i| i.send_callbacks.drain(..).map(|c| c.to_c_api()).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        };
        let mut send_callback_pointers = send_callbacks.iter_mut().map(|c| c.as_mut_ptr()).collect::<Vec<_>>();
        let mut send_callbacks = send_callbacks
            .iter()
            .map(|c| c.iter().map(|c| unsafe { Box::from_raw(c.user_arg as *mut SendCallback) }).collect::<Vec<_>>())
            .collect::<Vec<_>>();

        // We handle receive callbacks in exactly the same way as send callbacks.
        let mut receive_callbacks = inputs
            .iter_mut()
            .map(|i| i.receive_callbacks.drain(..).map(|c| unsafe { c.to_c_api() }).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let mut receive_callback_pointers = receive_callbacks.iter_mut().map(|c| c.as_mut_ptr()).collect::<Vec<_>>();
        let mut receive_callbacks = receive_callbacks
            .iter()
            .map(|c| c.iter().map(|c| unsafe { Box::from_raw(c.user_arg as *mut ReceiveCallback) }).collect::<Vec<_>>())
            .collect::<Vec<_>>();

        let non_donatable_input_indices = input_is_donatable
            .into_iter()
            .enumerate()
            .filter_map(|(index, donatable)| if donatable { None } else { Some(index as i64) })
            .collect::<Vec<_>>();

        let mut options = ffi::AXR_ExecuteOptions::new(
            send_callback_pointers.as_mut_ptr(),
            receive_callback_pointers.as_mut_ptr(),
            send_callback_count,
            receive_callback_count,
            launch_id as i32,
            non_donatable_input_indices.as_ptr(),
            non_donatable_input_indices.len(),
        );

        // We prepare the input buffer handles array. This is an array of [`Buffer`] handle arrays where the outer
        // dimension corresponds to devices and the inner dimension corresponds to program inputs.
        let inputs = inputs
            .iter()
            .map(|i| i.inputs.iter().map(|i| unsafe { i.buffer.to_c_api() }).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let input_pointers = inputs.iter().map(|inputs| inputs.as_ptr()).collect::<Vec<_>>();

        // We pre-allocate the backing arrays for the output [`Buffer`] and [`Event`] handles using the output count
        // that the wrapped [`Executable`] declared. The output buffer handles array is an array of [`Buffer`] handle
        // arrays where the outer dimension corresponds to devices and the inner dimension corresponds to program
        // outputs. The [`Event`] handles array contains an [`Event`] for each [`Device`], which can be used to track
        // when the computation for this program is completed on each [`Device`].
        let output_count = self.executable.output_count()?;
        let mut output_buffers: Vec<*mut crate::buffers::ffi::AXR_Buffer> =
            vec![std::ptr::null_mut(); device_count * output_count];
        let output_buffer_pointers = (0..device_count)
            .map(|device_index| unsafe { output_buffers.as_mut_ptr().add(device_index * output_count) })
            .collect::<Vec<_>>();
        let mut done_events: Vec<*mut crate::events::ffi::AXR_Event> = vec![std::ptr::null_mut(); device_count];

        invoke_plugin_api_error_fn!(
            self.api(),
            AXR_LoadedExecutable_Execute,
            {
                executable = self.to_c_api(),
                options = &mut options as *mut _,
                argument_lists = input_pointers.as_ptr(),
                num_devices = device_count,
                num_args = input_count,
                output_lists = output_buffer_pointers.as_ptr(),
                device_complete_events = done_events.as_mut_ptr(),
                execute_device = device.map(|device| device.to_c_api()).unwrap_or(std::ptr::null_mut()),
            },
        )?;

        // Process the outputs and the completion events.
        let mut execution_outputs = Vec::with_capacity(device_count);
        for device_index in 0..device_count {
            let done_event = unsafe { Event::from_c_api(done_events[device_index], self.api(), ()) }?;
            let send_callbacks = std::mem::take(&mut send_callbacks[device_index]);
            let receive_callbacks = std::mem::take(&mut receive_callbacks[device_index]);
            if !send_callbacks.is_empty() || !receive_callbacks.is_empty() {
                // Move the owned callback allocations into the event completion handler so that they
                // are released *only after* the runtime signals the device execution is done.
                done_event.on_ready(move |_| {
                    drop(send_callbacks);
                    drop(receive_callbacks);
                })?
            }

            let mut outputs = Vec::with_capacity(output_count);
            for output_index in 0..output_count {
                let output_handle = output_buffers[device_index * output_count + output_index];
                outputs.push(unsafe { Buffer::from_c_api(output_handle, self.client)? });
            }

            execution_outputs.push(ExecutionDeviceOutputs { outputs, done: done_event })
        }

        Ok(execution_outputs)
    }

    /// Returns `true` if and only if this [`LoadedExecutable`] has been deleted using [`LoadedExecutable::delete`].
    pub fn is_deleted(&self) -> Result<bool, Error> {
        use ffi::AXR_LoadedExecutable_IsDeleted_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_LoadedExecutable_IsDeleted, { executable = self.to_c_api() }, {
            is_deleted
        })
    }

    /// Drops this [`LoadedExecutable`]'s reference to its associated internal runtime object and resources without
    /// dropping this [`LoadedExecutable`] instance itself. After this function is called, this executable should
    /// only be used as a placeholder. The underlying internal runtime object will be freed after the last execution
    /// completes.
    ///
    /// # Safety
    ///
    /// This function is marked as unsafe because it results in eagerly dropping this [`LoadedExecutable`]'s
    /// reference to its associated internal runtime object before the [`LoadedExecutable`] instance is dropped,
    /// making it unsafe to use. Only [`LoadedExecutable::is_deleted`] is considered safe to call on this
    /// [`LoadedExecutable`] after this function has been called.
    pub unsafe fn delete(&self) -> Result<(), Error> {
        use ffi::AXR_LoadedExecutable_Delete_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_LoadedExecutable_Delete, { executable = self.to_c_api() })
    }
}

impl Drop for LoadedExecutable<'_> {
    fn drop(&mut self) {
        use ffi::AXR_LoadedExecutable_Destroy_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_LoadedExecutable_Destroy, { executable = self.to_c_api() })
            .expect("failed to destroy plugin loaded executable");
    }
}

/// Represents a [`Buffer`] that is used as input in a [`LoadedExecutable::execute`] invocation.
pub struct ExecutionInput<'o> {
    /// [`Buffer`] to use as the input value.
    pub buffer: Buffer<'o>,

    /// Boolean flag indicating whether `buffer` should be treated as _donatable_, meaning that the runtime would be
    /// allowed to reuse the [`Buffer`]'s storage for output values and force treating the `buffer` as invalid after
    /// the execution completes. Note that, when executing on multiple [`Device`]s, this flag must be set to the same
    /// value for all corresponding [`ExecutionInput`]s on its [`Device`] (i.e., inputs at the same position).
    pub donatable: bool,
}

impl<'o> From<Buffer<'o>> for ExecutionInput<'o> {
    fn from(buffer: Buffer<'o>) -> Self {
        Self { buffer, donatable: false }
    }
}

/// Represents the input [`Buffer`]s on a single [`Device`] in a call to [`LoadedExecutable::execute`], paired with
/// information on whether they should be treated as _donatable_ or not, as well as with [`SendCallback`]s and
/// [`ReceiveCallback`]s to be used for that execution on that [`Device`].
#[derive(Default)]
pub struct ExecutionDeviceInputs<'o, 'l> {
    /// Slice that contains the [`ExecutionInput`] that corresponds to each input of the [`LoadedExecutable`] that is
    /// being executed. The length of this slice must match the number of inputs of the corresponding executable.
    pub inputs: &'l [ExecutionInput<'o>],

    /// [`SendCallback`]s to use for _send_ operations that involve the host. There must be one [`SendCallback`] per
    /// _send_ operation in the corresponding [`LoadedExecutable`]. The order of the callbacks in this [`Vec`] does
    /// not matter because [`SendCallback::channel_id`] is used to match callbacks to their corresponding _send_
    /// operations.
    pub send_callbacks: Vec<SendCallback>,

    /// [`ReceiveCallback`]s to use for _receive_ operations that involve the host. There must be one
    /// [`ReceiveCallback`] per _receive_ operation in the corresponding [`LoadedExecutable`]. The order of the
    /// callbacks in this [`Vec`] does not matter because [`ReceiveCallback::channel_id`] is used to match callbacks
    /// to their corresponding _receive_ operations.
    pub receive_callbacks: Vec<ReceiveCallback>,
}

impl<'o, 'l> From<&'l [ExecutionInput<'o>]> for ExecutionDeviceInputs<'o, 'l> {
    fn from(inputs: &'l [ExecutionInput<'o>]) -> Self {
        Self { inputs, ..Default::default() }
    }
}

/// Represents the output [`Buffer`]s on a single [`Device`] of a call to [`LoadedExecutable::execute`], paired with
/// an [`Event`] that can be used to track when the computation for this program has completed on that [`Device`].
pub struct ExecutionDeviceOutputs<'o> {
    /// [`Vec`] that contains the output [`Buffer`] that corresponds to each output of the [`LoadedExecutable`]
    /// that was executed.
    pub outputs: Vec<Buffer<'o>>,

    /// [`Event`] that can be used to track when all computation pending on a single [`Device`] for the execution of
    /// a [`LoadedExecutable`] is completed.
    pub done: Event<()>,
}

impl Client {
    /// Compiles a [`Program`] turning it into a [`LoadedExecutable`] which can be executed using this [`Client`].
    /// The compilation is aware of the _addressable_ [`Device`]s of this client, its memory configuration, its
    /// [`Topology`], and any other platform-specific attributes, and will thus be optimized accordingly. The
    /// resulting executable program will be compiled _specifically_ for the [`Device`]s managed by this [`Client`],
    /// and will be ready to be executed on those devices.
    ///
    /// This function is typically used for Just-In-Time (JIT) compilation of [`Program`]s. If you want to perform
    /// Ahead-Of-Time (AOT) compilation for a specific [`Topology`] and without necessarily having access to an
    /// initialized [`Client`], then you must use [`Plugin::compile`] instead.
    ///
    /// The provided `options` are opaque, platform-specific, serialized compilation options that are passed through
    /// to the plugin compiler as-is.
    pub fn compile(&'_ self, program: &Program, options: &[u8]) -> Result<LoadedExecutable<'_>, Error> {
        use ffi::{AXR_Client_Compile_Args, AXR_Program};
        let code = program.code();
        let format = program.format();
        let program = AXR_Program::new(code.as_ptr() as *mut _, code.len(), format.as_ptr(), format.count_bytes());
        invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Client_Compile,
            {
                client = self.to_c_api(),
                program = &program as *const _,
                compile_options = options.as_ptr() as *const _,
                compile_options_size = options.len(),
            },
            { executable },
        )
        .and_then(|handle| unsafe { LoadedExecutable::from_c_api(handle, self) })
    }

    /// Deserializes the provided data into a [`LoadedExecutable`]. Note that the provided data must be the result
    /// of [`Executable::serialize`] and must have been produced by the same platform and plugin version that this
    /// [`Client`] is using. The optional `options` can be used to override the serialized compilation options that
    /// are embedded in the provided data.
    pub fn deserialize_executable(&'_ self, data: &[u8], options: Option<&[u8]>) -> Result<LoadedExecutable<'_>, Error> {
        use ffi::AXR_Executable_DeserializeAndLoad_Args;
        invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Executable_DeserializeAndLoad,
            {
                client = self.to_c_api(),
                serialized_executable = data.as_ptr() as *const _,
                serialized_executable_size = data.len(),
                overridden_serialized_compile_options = options
                    .map(|options| options.as_ptr() as *const _)
                    .unwrap_or(std::ptr::null()),
                overridden_serialized_compile_options_size = options.map(|options| options.len()).unwrap_or(0),
            },
            { loaded_executable },
        )
        .and_then(|handle| unsafe { LoadedExecutable::from_c_api(handle, self) })
    }
}

impl Plugin {
    /// Compiles a [`Program`] turning it into an [`Executable`] such that it can be executed by [`Client`]s with the
    /// specified [`Topology`]. This is more of a "standalone" version of [`Client::compile`] which can be used for
    /// Ahead-Of-Time (AOT) compilation, as opposed to Just-In-Time (JIT) compilation. If you are interested in the
    /// latter (which is the most typical use case), and you have a [`Client`] available, then you should use
    /// [`Client::compile`] instead. This function is useful for situations where you want to compile a program for
    /// a specific hardware target without actually having that hardware physically attached to the machine you are
    /// currently running on.
    pub fn compile(&self, program: &Program, topology: &Topology, options: &[u8]) -> Result<Executable, Error> {
        self.api().compile(program, topology, options)
    }
}

impl Api {
    /// Compiles a [`Program`] turning it into an [`Executable`] for the specified [`Topology`]. Refer to
    /// [`Plugin::compile`] for more information.
    pub(crate) fn compile(&self, program: &Program, topology: &Topology, options: &[u8]) -> Result<Executable, Error> {
        use ffi::{AXR_Compile_Args, AXR_Program};
        let code = program.code();
        let format = program.format();
        let program = AXR_Program::new(code.as_ptr() as *mut _, code.len(), format.as_ptr(), format.count_bytes());
        invoke_plugin_api_error_fn!(
            *self,
            AXR_Compile,
            {
                topology = topology.to_c_api(),
                program = &program as *const _,
                compile_options = options.as_ptr() as *const _,
                compile_options_size = options.len(),
            },
            { executable },
        )
        .and_then(|handle| unsafe { Executable::from_c_api(handle, *self) })
    }
}

#[allow(dead_code, non_camel_case_types, non_snake_case, non_upper_case_globals)]
pub(crate) mod ffi {
    use std::marker::{PhantomData, PhantomPinned};

    use crate::buffers::ffi::{AXR_Buffer, AXR_Buffer_Type};
    use crate::clients::ffi::AXR_Client;
    use crate::devices::ffi::AXR_Device;
    use crate::errors::ffi::AXR_Error;
    use crate::events::ffi::AXR_Event;
    use crate::ffi::AXR_Extension_Base;
    use crate::streams::ffi::{AXR_RecvCallbackInfo, AXR_SendCallbackInfo};
    use crate::topologies::ffi::AXR_Topology;
    use crate::values::ffi::AXR_NamedValue;

    #[repr(C)]
    pub struct AXR_Program {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub code: *mut std::ffi::c_char,
        pub code_size: usize,
        pub format: *const std::ffi::c_char,
        pub format_size: usize,
    }

    impl AXR_Program {
        pub fn new(
            code: *mut std::ffi::c_char,
            code_size: usize,
            format: *const std::ffi::c_char,
            format_size: usize,
        ) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                code,
                code_size,
                format,
                format_size,
            }
        }
    }

    // We represent opaque C types as structs with a particular structure that is following the convention
    // suggested in [the Rustonomicon](https://doc.rust-lang.org/nomicon/ffi.html#representing-opaque-structs).
    #[repr(C)]
    pub struct AXR_Executable {
        _data: [u8; 0],
        _marker: PhantomData<(*mut u8, PhantomPinned)>,
    }

    #[repr(C)]
    pub struct AXR_Executable_Name_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub executable: *mut AXR_Executable,
        pub executable_name: *const std::ffi::c_char,
        pub executable_name_size: usize,
    }

    impl AXR_Executable_Name_Args {
        pub fn new(executable: *mut AXR_Executable) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                executable,
                executable_name: std::ptr::null(),
                executable_name_size: 0,
            }
        }
    }

    pub type AXR_Executable_Name = unsafe extern "C" fn(args: *mut AXR_Executable_Name_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Executable_NumReplicas_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub executable: *mut AXR_Executable,
        pub num_replicas: usize,
    }

    impl AXR_Executable_NumReplicas_Args {
        pub fn new(executable: *mut AXR_Executable) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), executable, num_replicas: 0 }
        }
    }

    pub type AXR_Executable_NumReplicas =
        unsafe extern "C" fn(args: *mut AXR_Executable_NumReplicas_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Executable_NumPartitions_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub executable: *mut AXR_Executable,
        pub num_partitions: usize,
    }

    impl AXR_Executable_NumPartitions_Args {
        pub fn new(executable: *mut AXR_Executable) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                executable,
                num_partitions: 0,
            }
        }
    }

    pub type AXR_Executable_NumPartitions =
        unsafe extern "C" fn(args: *mut AXR_Executable_NumPartitions_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Executable_NumOutputs_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub executable: *mut AXR_Executable,
        pub num_outputs: usize,
    }

    impl AXR_Executable_NumOutputs_Args {
        pub fn new(executable: *mut AXR_Executable) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), executable, num_outputs: 0 }
        }
    }

    pub type AXR_Executable_NumOutputs =
        unsafe extern "C" fn(args: *mut AXR_Executable_NumOutputs_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Executable_OutputElementTypes_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub executable: *mut AXR_Executable,
        pub output_types: *mut AXR_Buffer_Type,
        pub num_output_types: usize,
    }

    impl AXR_Executable_OutputElementTypes_Args {
        pub fn new(executable: *mut AXR_Executable) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                executable,
                output_types: std::ptr::null_mut(),
                num_output_types: 0,
            }
        }
    }

    pub type AXR_Executable_OutputElementTypes =
        unsafe extern "C" fn(args: *mut AXR_Executable_OutputElementTypes_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Executable_OutputDimensions_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub executable: *mut AXR_Executable,
        pub num_outputs: usize,
        pub dims: *const i64,
        pub dim_sizes: *const usize,
    }

    impl AXR_Executable_OutputDimensions_Args {
        pub fn new(executable: *mut AXR_Executable) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                executable,
                num_outputs: 0,
                dims: std::ptr::null(),
                dim_sizes: std::ptr::null(),
            }
        }
    }

    pub type AXR_Executable_OutputDimensions =
        unsafe extern "C" fn(args: *mut AXR_Executable_OutputDimensions_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Executable_OutputMemoryKinds_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub executable: *mut AXR_Executable,
        pub num_outputs: usize,
        pub memory_kinds: *const *const std::ffi::c_char,
        pub memory_kind_sizes: *const usize,
    }

    impl AXR_Executable_OutputMemoryKinds_Args {
        pub fn new(executable: *mut AXR_Executable) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                executable,
                num_outputs: 0,
                memory_kinds: std::ptr::null(),
                memory_kind_sizes: std::ptr::null(),
            }
        }
    }

    pub type AXR_Executable_OutputMemoryKinds =
        unsafe extern "C" fn(args: *mut AXR_Executable_OutputMemoryKinds_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Executable_SizeOfGeneratedCodeInBytes_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub executable: *mut AXR_Executable,
        pub size_in_bytes: i64,
    }

    impl AXR_Executable_SizeOfGeneratedCodeInBytes_Args {
        pub fn new(executable: *mut AXR_Executable) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), executable, size_in_bytes: 0 }
        }
    }

    pub type AXR_Executable_SizeOfGeneratedCodeInBytes =
        unsafe extern "C" fn(args: *mut AXR_Executable_SizeOfGeneratedCodeInBytes_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Executable_Fingerprint_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub executable: *mut AXR_Executable,
        pub executable_fingerprint: *const std::ffi::c_char,
        pub executable_fingerprint_size: usize,
    }

    impl AXR_Executable_Fingerprint_Args {
        pub fn new(executable: *mut AXR_Executable) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                executable,
                executable_fingerprint: std::ptr::null_mut(),
                executable_fingerprint_size: 0,
            }
        }
    }

    pub type AXR_Executable_Fingerprint =
        unsafe extern "C" fn(args: *mut AXR_Executable_Fingerprint_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Executable_OptimizedProgram_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub executable: *mut AXR_Executable,
        pub program: *mut AXR_Program,
    }

    impl AXR_Executable_OptimizedProgram_Args {
        pub fn new(executable: *mut AXR_Executable, program: *mut AXR_Program) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), executable, program }
        }
    }

    pub type AXR_Executable_OptimizedProgram =
        unsafe extern "C" fn(args: *mut AXR_Executable_OptimizedProgram_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Executable_GetCostAnalysis_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub executable: *mut AXR_Executable,
        pub num_properties: usize,
        pub properties: *const AXR_NamedValue,
    }

    impl AXR_Executable_GetCostAnalysis_Args {
        pub fn new(executable: *mut AXR_Executable) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                executable,
                num_properties: 0,
                properties: std::ptr::null_mut(),
            }
        }
    }

    pub type AXR_Executable_GetCostAnalysis =
        unsafe extern "C" fn(args: *mut AXR_Executable_GetCostAnalysis_Args) -> *mut AXR_Error;

    // We represent opaque C types as structs with a particular structure that is following the convention
    // suggested in [the Rustonomicon](https://doc.rust-lang.org/nomicon/ffi.html#representing-opaque-structs).
    #[repr(C)]
    pub struct AXR_SerializedExecutable {
        _data: [u8; 0],
        _marker: PhantomData<(*mut u8, PhantomPinned)>,
    }

    #[repr(C)]
    pub struct AXR_Executable_Serialize_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub executable: *const AXR_Executable,
        pub serialized_bytes: *const std::ffi::c_char,
        pub serialized_bytes_size: usize,
        pub serialized_executable: *mut AXR_SerializedExecutable,
        pub serialized_executable_deleter: Option<unsafe extern "C" fn(exec: *mut AXR_SerializedExecutable)>,
    }

    impl AXR_Executable_Serialize_Args {
        pub fn new(executable: *mut AXR_Executable) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                executable,
                serialized_bytes: std::ptr::null(),
                serialized_bytes_size: 0,
                serialized_executable: std::ptr::null_mut(),
                serialized_executable_deleter: None,
            }
        }
    }

    pub type AXR_Executable_Serialize = unsafe extern "C" fn(args: *mut AXR_Executable_Serialize_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Executable_Destroy_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub executable: *mut AXR_Executable,
    }

    impl AXR_Executable_Destroy_Args {
        pub fn new(executable: *mut AXR_Executable) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), executable }
        }
    }

    pub type AXR_Executable_Destroy = unsafe extern "C" fn(args: *mut AXR_Executable_Destroy_Args) -> *mut AXR_Error;

    // We represent opaque C types as structs with a particular structure that is following the convention
    // suggested in [the Rustonomicon](https://doc.rust-lang.org/nomicon/ffi.html#representing-opaque-structs).
    #[repr(C)]
    pub struct AXR_LoadedExecutable {
        _data: [u8; 0],
        _marker: PhantomData<(*mut u8, PhantomPinned)>,
    }

    #[repr(C)]
    pub struct AXR_LoadedExecutable_GetExecutable_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub loaded_executable: *mut AXR_LoadedExecutable,
        pub executable: *mut AXR_Executable,
    }

    impl AXR_LoadedExecutable_GetExecutable_Args {
        pub fn new(loaded_executable: *mut AXR_LoadedExecutable) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                loaded_executable,
                executable: std::ptr::null_mut(),
            }
        }
    }

    pub type AXR_LoadedExecutable_GetExecutable =
        unsafe extern "C" fn(args: *mut AXR_LoadedExecutable_GetExecutable_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_LoadedExecutable_AddressableDevices_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub executable: *mut AXR_LoadedExecutable,
        pub addressable_devices: *const *mut AXR_Device,
        pub num_addressable_devices: usize,
    }

    impl AXR_LoadedExecutable_AddressableDevices_Args {
        pub fn new(executable: *mut AXR_LoadedExecutable) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                executable,
                addressable_devices: std::ptr::null(),
                num_addressable_devices: 0,
            }
        }
    }

    pub type AXR_LoadedExecutable_AddressableDevices =
        unsafe extern "C" fn(args: *mut AXR_LoadedExecutable_AddressableDevices_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_LoadedExecutable_IsDeleted_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub executable: *mut AXR_LoadedExecutable,
        pub is_deleted: bool,
    }

    impl AXR_LoadedExecutable_IsDeleted_Args {
        pub fn new(executable: *mut AXR_LoadedExecutable) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                executable,
                is_deleted: false,
            }
        }
    }

    pub type AXR_LoadedExecutable_IsDeleted =
        unsafe extern "C" fn(args: *mut AXR_LoadedExecutable_IsDeleted_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_LoadedExecutable_Delete_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub executable: *mut AXR_LoadedExecutable,
    }

    impl AXR_LoadedExecutable_Delete_Args {
        pub fn new(executable: *mut AXR_LoadedExecutable) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), executable }
        }
    }

    pub type AXR_LoadedExecutable_Delete =
        unsafe extern "C" fn(args: *mut AXR_LoadedExecutable_Delete_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_LoadedExecutable_Destroy_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub executable: *mut AXR_LoadedExecutable,
    }

    impl AXR_LoadedExecutable_Destroy_Args {
        pub fn new(executable: *mut AXR_LoadedExecutable) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), executable }
        }
    }

    pub type AXR_LoadedExecutable_Destroy =
        unsafe extern "C" fn(args: *mut AXR_LoadedExecutable_Destroy_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Compile_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub topology: *const AXR_Topology,
        pub program: *const AXR_Program,
        pub compile_options: *const std::ffi::c_char,
        pub compile_options_size: usize,
        pub executable: *mut AXR_Executable,
    }

    impl AXR_Compile_Args {
        pub fn new(
            topology: *const AXR_Topology,
            program: *const AXR_Program,
            compile_options: *const std::ffi::c_char,
            compile_options_size: usize,
        ) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                topology,
                program,
                compile_options,
                compile_options_size,
                executable: std::ptr::null_mut(),
            }
        }
    }

    pub type AXR_Compile = unsafe extern "C" fn(args: *mut AXR_Compile_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Client_Compile_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub client: *mut AXR_Client,
        pub program: *const AXR_Program,
        pub compile_options: *const std::ffi::c_char,
        pub compile_options_size: usize,
        pub executable: *mut AXR_LoadedExecutable,
    }

    impl AXR_Client_Compile_Args {
        pub fn new(
            client: *mut AXR_Client,
            program: *const AXR_Program,
            compile_options: *const std::ffi::c_char,
            compile_options_size: usize,
        ) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                client,
                program,
                compile_options,
                compile_options_size,
                executable: std::ptr::null_mut(),
            }
        }
    }

    pub type AXR_Client_Compile = unsafe extern "C" fn(args: *mut AXR_Client_Compile_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Executable_DeserializeAndLoad_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub client: *mut AXR_Client,
        pub serialized_executable: *const std::ffi::c_char,
        pub serialized_executable_size: usize,
        pub loaded_executable: *mut AXR_LoadedExecutable,
        pub overridden_serialized_compile_options: *const std::ffi::c_char,
        pub overridden_serialized_compile_options_size: usize,
    }

    impl AXR_Executable_DeserializeAndLoad_Args {
        pub fn new(
            client: *mut AXR_Client,
            serialized_executable: *const std::ffi::c_char,
            serialized_executable_size: usize,
            overridden_serialized_compile_options: *const std::ffi::c_char,
            overridden_serialized_compile_options_size: usize,
        ) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                client,
                serialized_executable,
                serialized_executable_size,
                loaded_executable: std::ptr::null_mut(),
                overridden_serialized_compile_options,
                overridden_serialized_compile_options_size,
            }
        }
    }

    pub type AXR_Executable_DeserializeAndLoad =
        unsafe extern "C" fn(args: *mut AXR_Executable_DeserializeAndLoad_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_ExecuteOptions {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub send_callbacks: *mut *mut AXR_SendCallbackInfo,
        pub recv_callbacks: *mut *mut AXR_RecvCallbackInfo,
        pub num_send_ops: usize,
        pub num_recv_ops: usize,
        pub launch_id: std::ffi::c_int,
        pub non_donatable_input_indices: *const i64,
        pub num_non_donatable_input_indices: usize,
        pub use_major_to_minor_data_layout_for_callbacks: bool,
    }

    impl AXR_ExecuteOptions {
        #[allow(clippy::too_many_arguments)]
        pub fn new(
            send_callbacks: *mut *mut AXR_SendCallbackInfo,
            recv_callbacks: *mut *mut AXR_RecvCallbackInfo,
            num_send_ops: usize,
            num_recv_ops: usize,
            launch_id: std::ffi::c_int,
            non_donatable_input_indices: *const i64,
            num_non_donatable_input_indices: usize,
        ) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                send_callbacks,
                recv_callbacks,
                num_send_ops,
                num_recv_ops,
                launch_id,
                non_donatable_input_indices,
                num_non_donatable_input_indices,
                use_major_to_minor_data_layout_for_callbacks: true,
            }
        }
    }

    #[repr(C)]
    pub struct AXR_LoadedExecutable_Execute_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub executable: *mut AXR_LoadedExecutable,
        pub options: *mut AXR_ExecuteOptions,
        pub argument_lists: *const *const *mut AXR_Buffer,
        pub num_devices: usize,
        pub num_args: usize,
        pub output_lists: *const *mut *mut AXR_Buffer,
        pub device_complete_events: *mut *mut AXR_Event,
        pub execute_device: *mut AXR_Device,
    }

    impl AXR_LoadedExecutable_Execute_Args {
        #[allow(clippy::too_many_arguments)]
        pub fn new(
            executable: *mut AXR_LoadedExecutable,
            options: *mut AXR_ExecuteOptions,
            argument_lists: *const *const *mut AXR_Buffer,
            num_devices: usize,
            num_args: usize,
            output_lists: *const *mut *mut AXR_Buffer,
            device_complete_events: *mut *mut AXR_Event,
            execute_device: *mut AXR_Device,
        ) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                executable,
                options,
                argument_lists,
                num_devices,
                num_args,
                output_lists,
                device_complete_events,
                execute_device,
            }
        }
    }

    pub type AXR_LoadedExecutable_Execute =
        unsafe extern "C" fn(args: *mut AXR_LoadedExecutable_Execute_Args) -> *mut AXR_Error;
}
