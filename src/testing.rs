//! In-process test plugin. This module implements the full plugin ABI function table on top of plain Rust data
//! structures so that the rest of the crate can be tested without loading a shared library. The plugin models a
//! tiny platform named "test" with two addressable devices and two memory spaces, executables whose single output
//! is the elementwise sum of their inputs, and buffers that live entirely on the host.
//!
//! Handles returned through the ABI are raw pointers to heap-allocated objects (e.g., [`TestClient`]) cast to the
//! corresponding opaque ABI types, exactly like an out-of-process plugin would return pointers into its own heap.
//! Every client gets a freshly allocated device and memory graph so that handle-identity checks across clients are
//! meaningful.

use std::ffi::{c_char, c_int, c_void};
use std::sync::{Condvar, LazyLock, Mutex};

use crate::buffers::ffi::*;
use crate::clients::ffi::*;
use crate::devices::ffi::*;
use crate::errors::ffi::*;
use crate::events::ffi::*;
use crate::executables::ffi::*;
use crate::ffi::AXR_Api;
use crate::memories::ffi::*;
use crate::plugins::ffi::*;
use crate::slice_from_c_api;
use crate::streams::ffi::*;
use crate::topologies::ffi::*;
use crate::values::ffi::{AXR_NamedValue, AXR_NamedValue_Type_kInt64, AXR_Value};
use crate::versions::ffi::{AXR_API_MAJOR, AXR_API_MINOR, AXR_Api_Version};

const TEST_PLATFORM_NAME: &str = "test";
const TEST_PLATFORM_VERSION: &str = "test 1.4";
const TEST_DEVICE_KIND: &str = "axr";
const TEST_EXECUTABLE_NAME: &str = "main";
const OPTIMIZED_PROGRAM_FORMAT: &str = "ir_with_config";
const SERIALIZED_EXECUTABLE_MAGIC: &[u8] = b"axr-test-executable:";
const SERIALIZED_TOPOLOGY_MAGIC: &[u8] = b"axr-test-topology";

// The counters are thread-local so that tests running in parallel cannot observe each other's allocations. All
// tracked objects are created and destroyed on the thread that runs the corresponding test.
thread_local! {
    static LIVE_ERROR_COUNT: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
    static LIVE_BUFFER_COUNT: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Number of tracked plugin errors that are currently alive on this thread. Only errors created through
/// [`new_error`] and the [`callback_error_hook`] are tracked; errors that the plugin allocates internally
/// (e.g., for failed events) are not.
pub(crate) fn live_error_count() -> usize {
    LIVE_ERROR_COUNT.with(|count| count.get())
}

/// Number of plugin buffers that are currently alive on this thread.
pub(crate) fn live_buffer_count() -> usize {
    LIVE_BUFFER_COUNT.with(|count| count.get())
}

//===----------------------------------------------------------------------------------------------------------===//
// Errors
//===----------------------------------------------------------------------------------------------------------===//

struct TestError {
    code: AXR_Error_Code,
    message: Vec<u8>,
    tracked: bool,
}

/// Allocates a new tracked plugin error carrying the provided code and message.
pub(crate) fn new_error(code: AXR_Error_Code, message: &str) -> *mut AXR_Error {
    LIVE_ERROR_COUNT.with(|count| count.set(count.get() + 1));
    Box::into_raw(Box::new(TestError { code, message: message.as_bytes().to_vec(), tracked: true })) as *mut AXR_Error
}

fn new_internal_error(code: AXR_Error_Code, message: impl Into<Vec<u8>>) -> *mut AXR_Error {
    Box::into_raw(Box::new(TestError { code, message: message.into(), tracked: false })) as *mut AXR_Error
}

/// Returns a pointer to an [`AXR_CallbackError`] function that allocates tracked plugin errors, mirroring how a
/// plugin hands an error-constructor hook to host-side callbacks.
pub(crate) fn callback_error_hook() -> *mut AXR_CallbackError {
    static HOOK: AXR_CallbackError = callback_error;
    &HOOK as *const AXR_CallbackError as *mut AXR_CallbackError
}

unsafe extern "C" fn callback_error(
    code: AXR_Error_Code,
    message: *const c_char,
    message_size: usize,
) -> *mut AXR_Error {
    let message = unsafe { slice_from_c_api(message as *const u8, message_size) };
    LIVE_ERROR_COUNT.with(|count| count.set(count.get() + 1));
    Box::into_raw(Box::new(TestError { code, message: message.to_vec(), tracked: true })) as *mut AXR_Error
}

unsafe extern "C" fn error_destroy(args: *mut AXR_Error_Destroy_Args) {
    unsafe {
        let error = Box::from_raw((*args).error as *mut TestError);
        if error.tracked {
            LIVE_ERROR_COUNT.with(|count| count.set(count.get() - 1));
        }
    }
}

unsafe extern "C" fn error_message(args: *mut AXR_Error_Message_Args) {
    unsafe {
        let error = &*((*args).error as *const TestError);
        (*args).message = error.message.as_ptr() as *const c_char;
        (*args).message_size = error.message.len();
    }
}

unsafe extern "C" fn error_get_code(args: *mut AXR_Error_GetCode_Args) -> *mut AXR_Error {
    unsafe {
        (*args).code = (*((*args).error as *const TestError)).code;
        std::ptr::null_mut()
    }
}

//===----------------------------------------------------------------------------------------------------------===//
// Plugin Initialization & Attributes
//===----------------------------------------------------------------------------------------------------------===//

unsafe extern "C" fn plugin_initialize(_args: *mut AXR_Plugin_Initialize_Args) -> *mut AXR_Error {
    std::ptr::null_mut()
}

struct AttributeTable(Vec<AXR_NamedValue>);

unsafe impl Send for AttributeTable {}
unsafe impl Sync for AttributeTable {}

static PLUGIN_ATTRIBUTES: LazyLock<AttributeTable> = LazyLock::new(|| {
    let name = b"ir_minor_version";
    AttributeTable(vec![AXR_NamedValue::new(
        name.as_ptr() as *const c_char,
        name.len(),
        AXR_NamedValue_Type_kInt64,
        AXR_Value { int64_value: 1 },
        1,
    )])
});

unsafe extern "C" fn plugin_attributes(args: *mut AXR_Plugin_Attributes_Args) -> *mut AXR_Error {
    unsafe {
        (*args).attributes = PLUGIN_ATTRIBUTES.0.as_ptr();
        (*args).num_attributes = PLUGIN_ATTRIBUTES.0.len();
        std::ptr::null_mut()
    }
}

//===----------------------------------------------------------------------------------------------------------===//
// Events
//===----------------------------------------------------------------------------------------------------------===//

/// Terminal outcome of an event. `None` means that the tracked work completed successfully.
type TestEventOutcome = Option<(AXR_Error_Code, Vec<u8>)>;

struct TestEvent {
    state: Mutex<TestEventState>,
    completed: Condvar,
}

struct TestEventState {
    /// `None` while the event is still pending.
    outcome: Option<TestEventOutcome>,

    /// "On-ready" callbacks registered before the event completed, paired with their user argument addresses.
    callbacks: Vec<(AXR_Event_OnReadyCallback, usize)>,
}

fn new_event(outcome: Option<TestEventOutcome>) -> *mut AXR_Event {
    let event = TestEvent {
        state: Mutex::new(TestEventState { outcome, callbacks: Vec::new() }),
        completed: Condvar::new(),
    };
    Box::into_raw(Box::new(event)) as *mut AXR_Event
}

fn new_ready_event(outcome: TestEventOutcome) -> *mut AXR_Event {
    new_event(Some(outcome))
}

/// Allocates a fresh untracked error for the provided outcome. Each observation of a failed event hands out its
/// own error allocation because the caller is expected to destroy what it receives.
fn outcome_to_error(outcome: &TestEventOutcome) -> *mut AXR_Error {
    match outcome {
        None => std::ptr::null_mut(),
        Some((code, message)) => new_internal_error(*code, message.clone()),
    }
}

unsafe extern "C" fn event_create(args: *mut AXR_Event_Create_Args) -> *mut AXR_Error {
    unsafe {
        (*args).event = new_event(None);
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn event_set(args: *mut AXR_Event_Set_Args) -> *mut AXR_Error {
    unsafe {
        let event = &*((*args).event as *const TestEvent);
        let outcome = if (*args).error_code == AXR_Error_Code_OK {
            None
        } else {
            let message = slice_from_c_api((*args).error_message as *const u8, (*args).error_message_size);
            Some(((*args).error_code, message.to_vec()))
        };
        let callbacks = {
            let mut state = event.state.lock().unwrap();
            if state.outcome.is_some() {
                return new_internal_error(
                    AXR_Error_Code_FAILED_PRECONDITION,
                    "the event has already been fulfilled",
                );
            }
            state.outcome = Some(outcome.clone());
            std::mem::take(&mut state.callbacks)
        };
        event.completed.notify_all();
        for (callback, user_arg) in callbacks {
            callback(outcome_to_error(&outcome), user_arg as *mut c_void);
        }
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn event_is_ready(args: *mut AXR_Event_IsReady_Args) -> *mut AXR_Error {
    unsafe {
        let event = &*((*args).event as *const TestEvent);
        (*args).is_ready = event.state.lock().unwrap().outcome.is_some();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn event_error(args: *mut AXR_Event_Error_Args) -> *mut AXR_Error {
    unsafe {
        let event = &*((*args).event as *const TestEvent);
        match &event.state.lock().unwrap().outcome {
            Some(outcome) => outcome_to_error(outcome),
            None => new_internal_error(AXR_Error_Code_FAILED_PRECONDITION, "the event has not been fulfilled yet"),
        }
    }
}

unsafe extern "C" fn event_await(args: *mut AXR_Event_Await_Args) -> *mut AXR_Error {
    unsafe {
        let event = &*((*args).event as *const TestEvent);
        let mut state = event.state.lock().unwrap();
        while state.outcome.is_none() {
            state = event.completed.wait(state).unwrap();
        }
        outcome_to_error(state.outcome.as_ref().unwrap())
    }
}

unsafe extern "C" fn event_on_ready(args: *mut AXR_Event_OnReady_Args) -> *mut AXR_Error {
    unsafe {
        let event = &*((*args).event as *const TestEvent);
        let callback = (*args).callback;
        let user_arg = (*args).user_arg;
        let ready_outcome = {
            let mut state = event.state.lock().unwrap();
            match &state.outcome {
                Some(outcome) => Some(outcome.clone()),
                None => {
                    state.callbacks.push((callback, user_arg as usize));
                    None
                }
            }
        };
        // Callbacks registered on an already-fulfilled event are invoked immediately.
        if let Some(outcome) = ready_outcome {
            callback(outcome_to_error(&outcome), user_arg);
        }
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn event_destroy(args: *mut AXR_Event_Destroy_Args) -> *mut AXR_Error {
    unsafe {
        drop(Box::from_raw((*args).event as *mut TestEvent));
        std::ptr::null_mut()
    }
}

//===----------------------------------------------------------------------------------------------------------===//
// Clients, Devices & Memories
//===----------------------------------------------------------------------------------------------------------===//

struct TestClient {
    devices: Vec<*mut TestDevice>,
    memories: Vec<*mut TestMemory>,
    topology: *mut TestTopology,
}

struct TestDevice {
    description: TestDeviceDescription,
    local_hardware_id: c_int,
    memories: Vec<*mut TestMemory>,
    default_memory: *mut TestMemory,
}

struct TestDeviceDescription {
    id: c_int,
    process_index: c_int,
    kind: &'static str,
    to_string: String,
    debug_string: String,
}

struct TestMemory {
    id: c_int,
    kind_id: c_int,
    kind: String,
    to_string: String,
    debug_string: String,
    devices: Vec<*mut TestDevice>,
}

fn new_device_description(id: c_int) -> TestDeviceDescription {
    TestDeviceDescription {
        id,
        process_index: 0,
        kind: TEST_DEVICE_KIND,
        to_string: format!("AxrDevice(id={id})"),
        debug_string: format!("AXR_DEVICE_{id}"),
    }
}

fn new_memory(id: c_int, kind: &str, devices: Vec<*mut TestDevice>) -> *mut TestMemory {
    Box::into_raw(Box::new(TestMemory {
        id,
        kind_id: id,
        kind: kind.to_owned(),
        to_string: format!("{}_{id}", kind.to_uppercase()),
        debug_string: format!("AxrMemory(id={id}, kind={kind})"),
        devices,
    }))
}

/// Builds the device and memory graph of a new test client. The platform has two addressable devices and two
/// memory spaces, where the "space" memory is shared by both devices and the "pinned" memory is only reachable
/// from the first device.
fn new_test_client() -> *mut TestClient {
    let device_0 = Box::into_raw(Box::new(TestDevice {
        description: new_device_description(0),
        local_hardware_id: 0,
        memories: Vec::new(),
        default_memory: std::ptr::null_mut(),
    }));
    let device_1 = Box::into_raw(Box::new(TestDevice {
        description: new_device_description(1),
        local_hardware_id: 1,
        memories: Vec::new(),
        default_memory: std::ptr::null_mut(),
    }));
    let memory_0 = new_memory(0, "space", vec![device_0, device_1]);
    let memory_1 = new_memory(1, "pinned", vec![device_0]);
    unsafe {
        (*device_0).memories = vec![memory_0, memory_1];
        (*device_0).default_memory = memory_0;
        (*device_1).memories = vec![memory_0];
        (*device_1).default_memory = memory_0;
    }
    Box::into_raw(Box::new(TestClient {
        devices: vec![device_0, device_1],
        memories: vec![memory_0, memory_1],
        topology: new_test_topology(),
    }))
}

unsafe extern "C" fn noop_value_deleter(_value: *mut c_char) {}

/// Round-trips a handshake value through the key-value store callbacks that were handed to the plugin at client
/// creation time, exercising the full marshalling path including the value deleters.
unsafe fn run_key_value_handshake(args: *mut AXR_Client_Create_Args) {
    unsafe {
        let key = b"handshake";
        let value = b"ok";
        if let Some(put) = (*args).kv_put_callback {
            let mut put_args = AXR_KeyValuePutCallback_Args::new(
                key.as_ptr() as *const c_char,
                key.len(),
                value.as_ptr() as *const c_char,
                value.len(),
                callback_error_hook(),
                (*args).kv_put_user_arg,
            );
            let error = put(&mut put_args as *mut _);
            if !error.is_null() {
                error_destroy(&mut AXR_Error_Destroy_Args::new(error) as *mut _);
            }
        }
        if let Some(get) = (*args).kv_get_callback {
            let mut get_args = AXR_KeyValueGetCallback_Args::new(
                key.as_ptr() as *const c_char,
                key.len(),
                100,
                callback_error_hook(),
                (*args).kv_get_user_arg,
                noop_value_deleter,
            );
            let error = get(&mut get_args as *mut _);
            if error.is_null() {
                (get_args.value_deleter_callback)(get_args.value);
            } else {
                error_destroy(&mut AXR_Error_Destroy_Args::new(error) as *mut _);
            }
        }
        if let Some(try_get) = (*args).kv_try_get_callback {
            let mut try_get_args = AXR_KeyValueTryGetCallback_Args::new(
                key.as_ptr() as *const c_char,
                key.len(),
                callback_error_hook(),
                (*args).kv_try_get_user_arg,
                noop_value_deleter,
            );
            let error = try_get(&mut try_get_args as *mut _);
            if error.is_null() {
                (try_get_args.value_deleter_callback)(try_get_args.value);
            } else {
                error_destroy(&mut AXR_Error_Destroy_Args::new(error) as *mut _);
            }
        }
    }
}

unsafe extern "C" fn client_create(args: *mut AXR_Client_Create_Args) -> *mut AXR_Error {
    unsafe {
        (*args).client = new_test_client() as *mut AXR_Client;
        if (*args).kv_put_callback.is_some() || (*args).kv_get_callback.is_some() {
            run_key_value_handshake(args);
        }
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn client_destroy(args: *mut AXR_Client_Destroy_Args) -> *mut AXR_Error {
    unsafe {
        let client = Box::from_raw((*args).client as *mut TestClient);
        for device in &client.devices {
            drop(Box::from_raw(*device));
        }
        for memory in &client.memories {
            drop(Box::from_raw(*memory));
        }
        drop(Box::from_raw(client.topology));
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn client_platform_name(args: *mut AXR_Client_PlatformName_Args) -> *mut AXR_Error {
    unsafe {
        (*args).platform_name = TEST_PLATFORM_NAME.as_ptr() as *const c_char;
        (*args).platform_name_size = TEST_PLATFORM_NAME.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn client_platform_version(args: *mut AXR_Client_PlatformVersion_Args) -> *mut AXR_Error {
    unsafe {
        (*args).platform_version = TEST_PLATFORM_VERSION.as_ptr() as *const c_char;
        (*args).platform_version_size = TEST_PLATFORM_VERSION.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn client_process_index(args: *mut AXR_Client_ProcessIndex_Args) -> *mut AXR_Error {
    unsafe {
        (*args).process_index = 0;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn client_devices(args: *mut AXR_Client_Devices_Args) -> *mut AXR_Error {
    unsafe {
        let client = &*((*args).client as *const TestClient);
        (*args).devices = client.devices.as_ptr() as *const *mut AXR_Device;
        (*args).num_devices = client.devices.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn client_addressable_devices(args: *mut AXR_Client_AddressableDevices_Args) -> *mut AXR_Error {
    unsafe {
        let client = &*((*args).client as *const TestClient);
        (*args).addressable_devices = client.devices.as_ptr() as *const *mut AXR_Device;
        (*args).num_addressable_devices = client.devices.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn client_addressable_memories(args: *mut AXR_Client_AddressableMemories_Args) -> *mut AXR_Error {
    unsafe {
        let client = &*((*args).client as *const TestClient);
        (*args).addressable_memories = client.memories.as_ptr() as *const *mut AXR_Memory;
        (*args).num_addressable_memories = client.memories.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn client_default_device_assignment(
    args: *mut AXR_Client_DefaultDeviceAssignment_Args,
) -> *mut AXR_Error {
    unsafe {
        let client = &*((*args).client as *const TestClient);
        let num_devices = client.devices.len();
        for index in 0..(*args).default_assignment_size {
            *(*args).default_assignment.add(index) = (index % num_devices) as c_int;
        }
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn device_get_description(args: *mut AXR_Device_GetDescription_Args) -> *mut AXR_Error {
    unsafe {
        let device = &mut *((*args).device as *mut TestDevice);
        (*args).device_description = &mut device.description as *mut _ as *mut AXR_DeviceDescription;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn device_is_addressable(args: *mut AXR_Device_IsAddressable_Args) -> *mut AXR_Error {
    unsafe {
        (*args).is_addressable = true;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn device_local_hardware_id(args: *mut AXR_Device_LocalHardwareId_Args) -> *mut AXR_Error {
    unsafe {
        (*args).local_hardware_id = (*((*args).device as *const TestDevice)).local_hardware_id;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn device_addressable_memories(args: *mut AXR_Device_AddressableMemories_Args) -> *mut AXR_Error {
    unsafe {
        let device = &*((*args).device as *const TestDevice);
        (*args).memories = device.memories.as_ptr() as *const *mut AXR_Memory;
        (*args).num_memories = device.memories.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn device_default_memory(args: *mut AXR_Device_DefaultMemory_Args) -> *mut AXR_Error {
    unsafe {
        (*args).memory = (*((*args).device as *const TestDevice)).default_memory as *mut AXR_Memory;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn device_description_id(args: *mut AXR_DeviceDescription_Id_Args) -> *mut AXR_Error {
    unsafe {
        (*args).id = (*((*args).device_description as *const TestDeviceDescription)).id;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn device_description_process_index(
    args: *mut AXR_DeviceDescription_ProcessIndex_Args,
) -> *mut AXR_Error {
    unsafe {
        (*args).process_index = (*((*args).device_description as *const TestDeviceDescription)).process_index;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn device_description_attributes(
    args: *mut AXR_DeviceDescription_Attributes_Args,
) -> *mut AXR_Error {
    unsafe {
        (*args).num_attributes = 0;
        (*args).attributes = std::ptr::null();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn device_description_kind(args: *mut AXR_DeviceDescription_Kind_Args) -> *mut AXR_Error {
    unsafe {
        let description = &*((*args).device_description as *const TestDeviceDescription);
        (*args).device_kind = description.kind.as_ptr() as *const c_char;
        (*args).device_kind_size = description.kind.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn device_description_debug_string(
    args: *mut AXR_DeviceDescription_DebugString_Args,
) -> *mut AXR_Error {
    unsafe {
        let description = &*((*args).device_description as *const TestDeviceDescription);
        (*args).debug_string = description.debug_string.as_ptr() as *const c_char;
        (*args).debug_string_size = description.debug_string.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn device_description_to_string(args: *mut AXR_DeviceDescription_ToString_Args) -> *mut AXR_Error {
    unsafe {
        let description = &*((*args).device_description as *const TestDeviceDescription);
        (*args).to_string = description.to_string.as_ptr() as *const c_char;
        (*args).to_string_size = description.to_string.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn memory_id(args: *mut AXR_Memory_Id_Args) -> *mut AXR_Error {
    unsafe {
        (*args).id = (*((*args).memory as *const TestMemory)).id;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn memory_kind_id(args: *mut AXR_Memory_Kind_Id_Args) -> *mut AXR_Error {
    unsafe {
        (*args).kind_id = (*((*args).memory as *const TestMemory)).kind_id;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn memory_kind(args: *mut AXR_Memory_Kind_Args) -> *mut AXR_Error {
    unsafe {
        let memory = &*((*args).memory as *const TestMemory);
        (*args).kind = memory.kind.as_ptr() as *const c_char;
        (*args).kind_size = memory.kind.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn memory_debug_string(args: *mut AXR_Memory_DebugString_Args) -> *mut AXR_Error {
    unsafe {
        let memory = &*((*args).memory as *const TestMemory);
        (*args).debug_string = memory.debug_string.as_ptr() as *const c_char;
        (*args).debug_string_size = memory.debug_string.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn memory_to_string(args: *mut AXR_Memory_ToString_Args) -> *mut AXR_Error {
    unsafe {
        let memory = &*((*args).memory as *const TestMemory);
        (*args).to_string = memory.to_string.as_ptr() as *const c_char;
        (*args).to_string_size = memory.to_string.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn memory_addressable_by_devices(args: *mut AXR_Memory_AddressableByDevices_Args) -> *mut AXR_Error {
    unsafe {
        let memory = &*((*args).memory as *const TestMemory);
        (*args).devices = memory.devices.as_ptr() as *const *mut AXR_Device;
        (*args).num_devices = memory.devices.len();
        std::ptr::null_mut()
    }
}

//===----------------------------------------------------------------------------------------------------------===//
// Buffers
//===----------------------------------------------------------------------------------------------------------===//

struct TestBuffer {
    client: *mut TestClient,
    device: *mut TestDevice,
    memory: *mut TestMemory,
    element_type: AXR_Buffer_Type,
    dimensions: Vec<i64>,
    /// Minor-to-major dimension ordering reported as the buffer layout. Kept inside the buffer so that the
    /// pointers handed out through `AXR_Buffer_Layout` remain valid for the lifetime of the buffer.
    minor_to_major: Vec<i64>,
    data: Vec<u8>,
    deleted: bool,
    external_reference_count: usize,
    /// Populated for buffers whose host-to-device transfer failed. The readiness event of such buffers reports
    /// this outcome instead of success.
    transfer_error: TestEventOutcome,
}

fn element_size_in_bytes(element_type: AXR_Buffer_Type) -> usize {
    match element_type {
        AXR_Buffer_Type_Pred | AXR_Buffer_Type_I8 | AXR_Buffer_Type_U8 => 1,
        AXR_Buffer_Type_I16 | AXR_Buffer_Type_U16 | AXR_Buffer_Type_F16 | AXR_Buffer_Type_BF16 => 2,
        AXR_Buffer_Type_I32 | AXR_Buffer_Type_U32 | AXR_Buffer_Type_F32 => 4,
        AXR_Buffer_Type_I64 | AXR_Buffer_Type_U64 | AXR_Buffer_Type_F64 | AXR_Buffer_Type_C64 => 8,
        AXR_Buffer_Type_C128 => 16,
        _ => 0,
    }
}

fn new_test_buffer(
    client: *mut TestClient,
    device: *mut TestDevice,
    memory: *mut TestMemory,
    element_type: AXR_Buffer_Type,
    dimensions: Vec<i64>,
    data: Vec<u8>,
    transfer_error: TestEventOutcome,
) -> *mut TestBuffer {
    LIVE_BUFFER_COUNT.with(|count| count.set(count.get() + 1));
    let minor_to_major = (0..dimensions.len() as i64).rev().collect();
    Box::into_raw(Box::new(TestBuffer {
        client,
        device,
        memory,
        element_type,
        dimensions,
        minor_to_major,
        data,
        deleted: false,
        external_reference_count: 0,
        transfer_error,
    }))
}

unsafe extern "C" fn client_buffer_from_host(args: *mut AXR_Client_BufferFromHost_Args) -> *mut AXR_Error {
    unsafe {
        let client = (*args).client as *mut TestClient;
        let memory = (*args).memory as *mut TestMemory;
        let device = if memory.is_null() { (&(*client).devices)[0] } else { (&(*memory).devices)[0] };
        let dimensions = slice_from_c_api((*args).dimensions, (*args).num_dimensions).to_vec();
        let element_count = dimensions.iter().product::<i64>().max(0) as usize;
        let size_in_bytes = element_size_in_bytes((*args).element_type) * element_count;
        let mut data = vec![0u8; size_in_bytes];
        if size_in_bytes > 0 && !(*args).data.is_null() {
            std::ptr::copy_nonoverlapping((*args).data as *const u8, data.as_mut_ptr(), size_in_bytes);
        }
        // Transfers of buffers with an invalid element type are poisoned so that error propagation through
        // readiness and host-release events can be tested.
        let transfer_error = if (*args).element_type == AXR_Buffer_Type_Invalid {
            Some((
                AXR_Error_Code_INVALID_ARGUMENT,
                b"the test platform cannot transfer buffers with an invalid element type".to_vec(),
            ))
        } else {
            None
        };
        (*args).buffer = new_test_buffer(
            client,
            device,
            memory,
            (*args).element_type,
            dimensions,
            data,
            transfer_error.clone(),
        ) as *mut AXR_Buffer;
        (*args).done_with_host_buffer = new_ready_event(transfer_error);
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_element_type(args: *mut AXR_Buffer_ElementType_Args) -> *mut AXR_Error {
    unsafe {
        (*args).element_type = (*((*args).buffer as *const TestBuffer)).element_type;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_dimensions(args: *mut AXR_Buffer_Dimensions_Args) -> *mut AXR_Error {
    unsafe {
        let buffer = &*((*args).buffer as *const TestBuffer);
        (*args).dimensions = buffer.dimensions.as_ptr();
        (*args).num_dimensions = buffer.dimensions.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_unpadded_dimensions(args: *mut AXR_Buffer_UnpaddedDimensions_Args) -> *mut AXR_Error {
    unsafe {
        let buffer = &*((*args).buffer as *const TestBuffer);
        (*args).unpadded_dimensions = buffer.dimensions.as_ptr();
        (*args).num_dimensions = buffer.dimensions.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_dynamic_dimension_indices(
    args: *mut AXR_Buffer_DynamicDimensionIndices_Args,
) -> *mut AXR_Error {
    unsafe {
        (*args).dynamic_dimension_indices = std::ptr::null();
        (*args).num_dynamic_dimensions = 0;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_layout(args: *mut AXR_Buffer_Layout_Args) -> *mut AXR_Error {
    unsafe {
        let buffer = &*((*args).buffer as *const TestBuffer);
        let tiled = AXR_Buffer_MemoryLayout_Tiled::new(
            buffer.minor_to_major.as_ptr(),
            buffer.minor_to_major.len(),
            std::ptr::null(),
            std::ptr::null(),
            0,
        );
        // The layout field of the arguments record is not initialized by the caller and must be written in full.
        std::ptr::addr_of_mut!((*args).layout).write(AXR_Buffer_MemoryLayout::new(
            AXR_Buffer_MemoryLayout_Value { tiled },
            AXR_Buffer_MemoryLayout_Type_Tiled,
        ));
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_on_device_size_in_bytes(args: *mut AXR_Buffer_OnDeviceSizeInBytes_Args) -> *mut AXR_Error {
    unsafe {
        (*args).on_device_size_in_bytes = (*((*args).buffer as *const TestBuffer)).data.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_device(args: *mut AXR_Buffer_Device_Args) -> *mut AXR_Error {
    unsafe {
        (*args).device = (*((*args).buffer as *const TestBuffer)).device as *mut AXR_Device;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_memory(args: *mut AXR_Buffer_Memory_Args) -> *mut AXR_Error {
    unsafe {
        (*args).memory = (*((*args).buffer as *const TestBuffer)).memory as *mut AXR_Memory;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_is_on_cpu(args: *mut AXR_Buffer_IsOnCpu_Args) -> *mut AXR_Error {
    unsafe {
        (*args).is_on_cpu = true;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_ready_event(args: *mut AXR_Buffer_ReadyEvent_Args) -> *mut AXR_Error {
    unsafe {
        let buffer = &*((*args).buffer as *const TestBuffer);
        (*args).event = new_ready_event(buffer.transfer_error.clone());
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_to_host(args: *mut AXR_Buffer_ToHost_Args) -> *mut AXR_Error {
    unsafe {
        let buffer = &*((*args).src as *const TestBuffer);
        if (*args).dst.is_null() {
            // The first call of the two-phase protocol only queries the required destination size.
            (*args).dst_size = buffer.data.len();
        } else {
            let size = buffer.data.len().min((*args).dst_size);
            std::ptr::copy_nonoverlapping(buffer.data.as_ptr(), (*args).dst as *mut u8, size);
            (*args).event = new_ready_event(None);
        }
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_copy_to_memory(args: *mut AXR_Buffer_CopyToMemory_Args) -> *mut AXR_Error {
    unsafe {
        let buffer = &*((*args).buffer as *const TestBuffer);
        let memory = (*args).dst_memory as *mut TestMemory;
        (*args).dst_buffer = new_test_buffer(
            buffer.client,
            (&(*memory).devices)[0],
            memory,
            buffer.element_type,
            buffer.dimensions.clone(),
            buffer.data.clone(),
            None,
        ) as *mut AXR_Buffer;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_copy_to_device(args: *mut AXR_Buffer_CopyToDevice_Args) -> *mut AXR_Error {
    unsafe {
        let buffer = &*((*args).buffer as *const TestBuffer);
        let device = (*args).dst_device as *mut TestDevice;
        (*args).dst_buffer = new_test_buffer(
            buffer.client,
            device,
            (*device).default_memory,
            buffer.element_type,
            buffer.dimensions.clone(),
            buffer.data.clone(),
            None,
        ) as *mut AXR_Buffer;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_increase_external_reference_count(
    args: *mut AXR_Buffer_IncreaseExternalReferenceCount_Args,
) -> *mut AXR_Error {
    unsafe {
        (*((*args).buffer as *mut TestBuffer)).external_reference_count += 1;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_decrease_external_reference_count(
    args: *mut AXR_Buffer_DecreaseExternalReferenceCount_Args,
) -> *mut AXR_Error {
    unsafe {
        let buffer = &mut *((*args).buffer as *mut TestBuffer);
        if buffer.external_reference_count == 0 {
            return new_internal_error(
                AXR_Error_Code_FAILED_PRECONDITION,
                "the buffer has no external references",
            );
        }
        buffer.external_reference_count -= 1;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_device_memory_pointer(args: *mut AXR_Buffer_DeviceMemoryPointer_Args) -> *mut AXR_Error {
    unsafe {
        (*args).device_memory_ptr = (*((*args).buffer as *const TestBuffer)).data.as_ptr() as *mut c_void;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_unsafe_pointer(args: *mut AXR_Buffer_UnsafePointer_Args) -> *mut AXR_Error {
    unsafe {
        (*args).buffer_pointer = (*((*args).buffer as *const TestBuffer)).data.as_ptr() as usize;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_is_deleted(args: *mut AXR_Buffer_IsDeleted_Args) -> *mut AXR_Error {
    unsafe {
        (*args).is_deleted = (*((*args).buffer as *const TestBuffer)).deleted;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_delete(args: *mut AXR_Buffer_Delete_Args) -> *mut AXR_Error {
    unsafe {
        (*((*args).buffer as *mut TestBuffer)).deleted = true;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn buffer_destroy(args: *mut AXR_Buffer_Destroy_Args) -> *mut AXR_Error {
    unsafe {
        LIVE_BUFFER_COUNT.with(|count| count.set(count.get() - 1));
        drop(Box::from_raw((*args).buffer as *mut TestBuffer));
        std::ptr::null_mut()
    }
}

//===----------------------------------------------------------------------------------------------------------===//
// Copy-to-Device Streams
//===----------------------------------------------------------------------------------------------------------===//

struct TestStream {
    total_bytes: i64,
    granule_size_in_bytes: i64,
}

/// Allocates a new plugin copy-to-device stream with the provided byte counts.
pub(crate) fn new_copy_to_device_stream(total_bytes: i64, granule_size_in_bytes: i64) -> *mut AXR_CopyToDeviceStream {
    Box::into_raw(Box::new(TestStream { total_bytes, granule_size_in_bytes })) as *mut AXR_CopyToDeviceStream
}

unsafe extern "C" fn copy_to_device_stream_total_bytes(
    args: *mut AXR_CopyToDeviceStream_TotalBytes_Args,
) -> *mut AXR_Error {
    unsafe {
        (*args).total_bytes = (*((*args).stream as *const TestStream)).total_bytes;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn copy_to_device_stream_granule_size(
    args: *mut AXR_CopyToDeviceStream_GranuleSize_Args,
) -> *mut AXR_Error {
    unsafe {
        (*args).granule_size_in_bytes = (*((*args).stream as *const TestStream)).granule_size_in_bytes;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn copy_to_device_stream_add_chunk(
    args: *mut AXR_CopyToDeviceStream_AddChunk_Args,
) -> *mut AXR_Error {
    unsafe {
        // The plugin takes ownership of the chunk data and releases it through the embedded deleter once the
        // transfer is complete. The test platform completes transfers synchronously.
        let chunk = std::ptr::read((*args).chunk);
        if let Some(deleter) = chunk.deleter {
            deleter(chunk.data, chunk.deleter_arg);
        }
        (*args).transfer_complete = new_ready_event(None);
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn copy_to_device_stream_destroy(
    args: *mut AXR_CopyToDeviceStream_Destroy_Args,
) -> *mut AXR_Error {
    unsafe {
        drop(Box::from_raw((*args).stream as *mut TestStream));
        std::ptr::null_mut()
    }
}

//===----------------------------------------------------------------------------------------------------------===//
// Executables
//===----------------------------------------------------------------------------------------------------------===//

struct TestExecutable {
    output_types: Vec<AXR_Buffer_Type>,
    output_dimensions: Vec<i64>,
    output_dimension_sizes: Vec<usize>,
    output_memory_kinds: Vec<*const c_char>,
    output_memory_kind_sizes: Vec<usize>,
    code: Vec<u8>,
}

struct TestLoadedExecutable {
    client: *mut TestClient,
    code: Vec<u8>,
    deleted: bool,
}

fn new_test_executable(code: Vec<u8>) -> *mut TestExecutable {
    let memory_kind = b"space";
    Box::into_raw(Box::new(TestExecutable {
        output_types: vec![AXR_Buffer_Type_I32],
        output_dimensions: vec![2, 1],
        output_dimension_sizes: vec![2],
        output_memory_kinds: vec![memory_kind.as_ptr() as *const c_char],
        output_memory_kind_sizes: vec![memory_kind.len()],
        code,
    }))
}

unsafe extern "C" fn client_compile(args: *mut AXR_Client_Compile_Args) -> *mut AXR_Error {
    unsafe {
        let program = &*(*args).program;
        let code = slice_from_c_api(program.code as *const u8, program.code_size).to_vec();
        (*args).executable = Box::into_raw(Box::new(TestLoadedExecutable {
            client: (*args).client as *mut TestClient,
            code,
            deleted: false,
        })) as *mut AXR_LoadedExecutable;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn compile(args: *mut AXR_Compile_Args) -> *mut AXR_Error {
    unsafe {
        let program = &*(*args).program;
        let code = slice_from_c_api(program.code as *const u8, program.code_size).to_vec();
        (*args).executable = new_test_executable(code) as *mut AXR_Executable;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn executable_destroy(args: *mut AXR_Executable_Destroy_Args) -> *mut AXR_Error {
    unsafe {
        drop(Box::from_raw((*args).executable as *mut TestExecutable));
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn executable_name(args: *mut AXR_Executable_Name_Args) -> *mut AXR_Error {
    unsafe {
        (*args).executable_name = TEST_EXECUTABLE_NAME.as_ptr() as *const c_char;
        (*args).executable_name_size = TEST_EXECUTABLE_NAME.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn executable_num_replicas(args: *mut AXR_Executable_NumReplicas_Args) -> *mut AXR_Error {
    unsafe {
        (*args).num_replicas = 2;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn executable_num_partitions(args: *mut AXR_Executable_NumPartitions_Args) -> *mut AXR_Error {
    unsafe {
        (*args).num_partitions = 1;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn executable_num_outputs(args: *mut AXR_Executable_NumOutputs_Args) -> *mut AXR_Error {
    unsafe {
        (*args).num_outputs = (*((*args).executable as *const TestExecutable)).output_types.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn executable_output_element_types(
    args: *mut AXR_Executable_OutputElementTypes_Args,
) -> *mut AXR_Error {
    unsafe {
        let executable = &*((*args).executable as *const TestExecutable);
        (*args).output_types = executable.output_types.as_ptr() as *mut AXR_Buffer_Type;
        (*args).num_output_types = executable.output_types.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn executable_output_dimensions(args: *mut AXR_Executable_OutputDimensions_Args) -> *mut AXR_Error {
    unsafe {
        let executable = &*((*args).executable as *const TestExecutable);
        (*args).num_outputs = executable.output_dimension_sizes.len();
        (*args).dims = executable.output_dimensions.as_ptr();
        (*args).dim_sizes = executable.output_dimension_sizes.as_ptr();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn executable_output_memory_kinds(
    args: *mut AXR_Executable_OutputMemoryKinds_Args,
) -> *mut AXR_Error {
    unsafe {
        let executable = &*((*args).executable as *const TestExecutable);
        (*args).num_outputs = executable.output_memory_kinds.len();
        (*args).memory_kinds = executable.output_memory_kinds.as_ptr();
        (*args).memory_kind_sizes = executable.output_memory_kind_sizes.as_ptr();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn executable_size_of_generated_code_in_bytes(
    args: *mut AXR_Executable_SizeOfGeneratedCodeInBytes_Args,
) -> *mut AXR_Error {
    unsafe {
        (*args).size_in_bytes = (*((*args).executable as *const TestExecutable)).code.len() as i64;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn executable_fingerprint(_args: *mut AXR_Executable_Fingerprint_Args) -> *mut AXR_Error {
    new_internal_error(AXR_Error_Code_UNIMPLEMENTED, "the test platform does not fingerprint executables")
}

unsafe extern "C" fn executable_get_cost_analysis(args: *mut AXR_Executable_GetCostAnalysis_Args) -> *mut AXR_Error {
    unsafe {
        (*args).num_properties = 0;
        (*args).properties = std::ptr::null();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn executable_optimized_program(args: *mut AXR_Executable_OptimizedProgram_Args) -> *mut AXR_Error {
    unsafe {
        let executable = &*((*args).executable as *const TestExecutable);
        let program = (*args).program;
        (*program).format = OPTIMIZED_PROGRAM_FORMAT.as_ptr() as *const c_char;
        (*program).format_size = OPTIMIZED_PROGRAM_FORMAT.len();
        if (*program).code.is_null() {
            // The first call of the two-phase protocol only queries the required code size.
            (*program).code_size = executable.code.len();
        } else {
            let size = executable.code.len().min((*program).code_size);
            std::ptr::copy_nonoverlapping(executable.code.as_ptr(), (*program).code as *mut u8, size);
        }
        std::ptr::null_mut()
    }
}

struct TestSerializedExecutable {
    bytes: Vec<u8>,
}

unsafe extern "C" fn serialized_executable_deleter(serialized_executable: *mut AXR_SerializedExecutable) {
    unsafe {
        drop(Box::from_raw(serialized_executable as *mut TestSerializedExecutable));
    }
}

unsafe extern "C" fn executable_serialize(args: *mut AXR_Executable_Serialize_Args) -> *mut AXR_Error {
    unsafe {
        let executable = &*((*args).executable as *const TestExecutable);
        let mut bytes = SERIALIZED_EXECUTABLE_MAGIC.to_vec();
        bytes.extend_from_slice(&executable.code);
        let serialized = Box::into_raw(Box::new(TestSerializedExecutable { bytes }));
        (*args).serialized_bytes = (*serialized).bytes.as_ptr() as *const c_char;
        (*args).serialized_bytes_size = (*serialized).bytes.len();
        (*args).serialized_executable = serialized as *mut AXR_SerializedExecutable;
        (*args).serialized_executable_deleter = Some(serialized_executable_deleter);
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn executable_deserialize_and_load(
    args: *mut AXR_Executable_DeserializeAndLoad_Args,
) -> *mut AXR_Error {
    unsafe {
        let bytes = slice_from_c_api((*args).serialized_executable as *const u8, (*args).serialized_executable_size);
        let Some(code) = bytes.strip_prefix(SERIALIZED_EXECUTABLE_MAGIC) else {
            return new_internal_error(
                AXR_Error_Code_INVALID_ARGUMENT,
                "the provided bytes are not a serialized test platform executable",
            );
        };
        (*args).loaded_executable = Box::into_raw(Box::new(TestLoadedExecutable {
            client: (*args).client as *mut TestClient,
            code: code.to_vec(),
            deleted: false,
        })) as *mut AXR_LoadedExecutable;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn loaded_executable_destroy(args: *mut AXR_LoadedExecutable_Destroy_Args) -> *mut AXR_Error {
    unsafe {
        drop(Box::from_raw((*args).executable as *mut TestLoadedExecutable));
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn loaded_executable_get_executable(
    args: *mut AXR_LoadedExecutable_GetExecutable_Args,
) -> *mut AXR_Error {
    unsafe {
        let loaded_executable = &*((*args).loaded_executable as *const TestLoadedExecutable);
        (*args).executable = new_test_executable(loaded_executable.code.clone()) as *mut AXR_Executable;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn loaded_executable_addressable_devices(
    args: *mut AXR_LoadedExecutable_AddressableDevices_Args,
) -> *mut AXR_Error {
    unsafe {
        let loaded_executable = &*((*args).executable as *const TestLoadedExecutable);
        let client = &*loaded_executable.client;
        (*args).addressable_devices = client.devices.as_ptr() as *const *mut AXR_Device;
        (*args).num_addressable_devices = client.devices.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn loaded_executable_is_deleted(args: *mut AXR_LoadedExecutable_IsDeleted_Args) -> *mut AXR_Error {
    unsafe {
        (*args).is_deleted = (*((*args).executable as *const TestLoadedExecutable)).deleted;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn loaded_executable_delete(args: *mut AXR_LoadedExecutable_Delete_Args) -> *mut AXR_Error {
    unsafe {
        (*((*args).executable as *mut TestLoadedExecutable)).deleted = true;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn loaded_executable_execute(args: *mut AXR_LoadedExecutable_Execute_Args) -> *mut AXR_Error {
    unsafe {
        let loaded_executable = &*((*args).executable as *const TestLoadedExecutable);
        let client = &*loaded_executable.client;

        // The test platform executes a single fixed program whose one output is the elementwise `i32` sum of
        // all of its inputs, shaped `[2, 1]`.
        let output_element_count = 2;
        for device_index in 0..(*args).num_devices {
            let argument_list = *(*args).argument_lists.add(device_index);
            let mut accumulator = vec![0i32; output_element_count];
            for argument_index in 0..(*args).num_args {
                let input = &*(*argument_list.add(argument_index) as *const TestBuffer);
                for (element, chunk) in accumulator.iter_mut().zip(input.data.chunks_exact(4)) {
                    *element += i32::from_ne_bytes(chunk.try_into().unwrap());
                }
            }
            let mut data = Vec::with_capacity(output_element_count * 4);
            for element in &accumulator {
                data.extend_from_slice(&element.to_ne_bytes());
            }

            let device = if (*args).execute_device.is_null() {
                client.devices[device_index]
            } else {
                (*args).execute_device as *mut TestDevice
            };
            let output = new_test_buffer(
                loaded_executable.client,
                device,
                (*device).default_memory,
                AXR_Buffer_Type_I32,
                vec![2, 1],
                data,
                None,
            );
            *(*(*args).output_lists.add(device_index)).add(0) = output as *mut AXR_Buffer;
            *(*args).device_complete_events.add(device_index) = new_ready_event(None);
        }
        std::ptr::null_mut()
    }
}

//===----------------------------------------------------------------------------------------------------------===//
// Topologies
//===----------------------------------------------------------------------------------------------------------===//

struct TestTopology {
    descriptions: Vec<Box<TestDeviceDescription>>,
    description_handles: Vec<*mut AXR_DeviceDescription>,
}

fn new_test_topology() -> *mut TestTopology {
    let mut descriptions =
        vec![Box::new(new_device_description(0)), Box::new(new_device_description(1))];
    let description_handles = descriptions
        .iter_mut()
        .map(|description| description.as_mut() as *mut TestDeviceDescription as *mut AXR_DeviceDescription)
        .collect();
    Box::into_raw(Box::new(TestTopology { descriptions, description_handles }))
}

unsafe extern "C" fn client_topology_description(args: *mut AXR_Client_TopologyDescription_Args) -> *mut AXR_Error {
    unsafe {
        (*args).topology = (*((*args).client as *const TestClient)).topology as *mut AXR_Topology;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn topology_create(args: *mut AXR_Topology_Create_Args) -> *mut AXR_Error {
    unsafe {
        (*args).topology = new_test_topology() as *mut AXR_Topology;
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn topology_destroy(args: *mut AXR_Topology_Destroy_Args) -> *mut AXR_Error {
    unsafe {
        drop(Box::from_raw((*args).topology as *mut TestTopology));
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn topology_platform_name(args: *mut AXR_Topology_PlatformName_Args) -> *mut AXR_Error {
    unsafe {
        (*args).platform_name = TEST_PLATFORM_NAME.as_ptr() as *const c_char;
        (*args).platform_name_size = TEST_PLATFORM_NAME.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn topology_platform_version(args: *mut AXR_Topology_PlatformVersion_Args) -> *mut AXR_Error {
    unsafe {
        (*args).platform_version = TEST_PLATFORM_VERSION.as_ptr() as *const c_char;
        (*args).platform_version_size = TEST_PLATFORM_VERSION.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn topology_get_device_descriptions(
    args: *mut AXR_Topology_GetDeviceDescriptions_Args,
) -> *mut AXR_Error {
    unsafe {
        let topology = &*((*args).topology as *const TestTopology);
        (*args).descriptions = topology.description_handles.as_ptr();
        (*args).num_descriptions = topology.description_handles.len();
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn topology_attributes(args: *mut AXR_Topology_Attributes_Args) -> *mut AXR_Error {
    unsafe {
        (*args).attributes = std::ptr::null();
        (*args).num_attributes = 0;
        std::ptr::null_mut()
    }
}

struct TestSerializedTopology {
    bytes: Vec<u8>,
}

unsafe extern "C" fn serialized_topology_deleter(serialized_topology: *mut AXR_SerializedTopology) {
    unsafe {
        drop(Box::from_raw(serialized_topology as *mut TestSerializedTopology));
    }
}

unsafe extern "C" fn topology_serialize(args: *mut AXR_Topology_Serialize_Args) -> *mut AXR_Error {
    unsafe {
        let serialized =
            Box::into_raw(Box::new(TestSerializedTopology { bytes: SERIALIZED_TOPOLOGY_MAGIC.to_vec() }));
        (*args).serialized_bytes = (*serialized).bytes.as_ptr() as *const c_char;
        (*args).serialized_bytes_size = (*serialized).bytes.len();
        (*args).serialized_topology = serialized as *mut AXR_SerializedTopology;
        (*args).serialized_topology_deleter = Some(serialized_topology_deleter);
        std::ptr::null_mut()
    }
}

unsafe extern "C" fn topology_deserialize(args: *mut AXR_Topology_Deserialize_Args) -> *mut AXR_Error {
    unsafe {
        let bytes = slice_from_c_api((*args).serialized_topology as *const u8, (*args).serialized_topology_size);
        if !bytes.starts_with(SERIALIZED_TOPOLOGY_MAGIC) {
            return new_internal_error(
                AXR_Error_Code_INVALID_ARGUMENT,
                "the provided bytes are not a serialized test platform topology",
            );
        }
        (*args).topology = new_test_topology() as *mut AXR_Topology;
        std::ptr::null_mut()
    }
}

//===----------------------------------------------------------------------------------------------------------===//
// API Table
//===----------------------------------------------------------------------------------------------------------===//

struct ApiTable(AXR_Api);

unsafe impl Send for ApiTable {}
unsafe impl Sync for ApiTable {}

fn make_api(major_version: c_int, minor_version: c_int) -> AXR_Api {
    AXR_Api {
        struct_size: size_of::<AXR_Api>(),
        extension_start: std::ptr::null_mut(),
        axr_api_version: AXR_Api_Version::new(major_version, minor_version),

        AXR_Error_Destroy: Some(error_destroy),
        AXR_Error_Message: Some(error_message),
        AXR_Error_GetCode: Some(error_get_code),

        AXR_Plugin_Initialize: Some(plugin_initialize),
        AXR_Plugin_Attributes: Some(plugin_attributes),

        AXR_Event_Destroy: Some(event_destroy),
        AXR_Event_IsReady: Some(event_is_ready),
        AXR_Event_Error: Some(event_error),
        AXR_Event_Await: Some(event_await),
        AXR_Event_OnReady: Some(event_on_ready),

        AXR_Client_Create: Some(client_create),
        AXR_Client_Destroy: Some(client_destroy),
        AXR_Client_PlatformName: Some(client_platform_name),
        AXR_Client_ProcessIndex: Some(client_process_index),
        AXR_Client_PlatformVersion: Some(client_platform_version),
        AXR_Client_Devices: Some(client_devices),
        AXR_Client_AddressableDevices: Some(client_addressable_devices),
        AXR_Client_AddressableMemories: Some(client_addressable_memories),
        AXR_Client_Compile: Some(client_compile),
        AXR_Client_DefaultDeviceAssignment: Some(client_default_device_assignment),
        AXR_Client_BufferFromHost: Some(client_buffer_from_host),

        AXR_DeviceDescription_Id: Some(device_description_id),
        AXR_DeviceDescription_ProcessIndex: Some(device_description_process_index),
        AXR_DeviceDescription_Attributes: Some(device_description_attributes),
        AXR_DeviceDescription_Kind: Some(device_description_kind),
        AXR_DeviceDescription_DebugString: Some(device_description_debug_string),
        AXR_DeviceDescription_ToString: Some(device_description_to_string),

        AXR_Device_GetDescription: Some(device_get_description),
        AXR_Device_IsAddressable: Some(device_is_addressable),
        AXR_Device_LocalHardwareId: Some(device_local_hardware_id),
        AXR_Device_AddressableMemories: Some(device_addressable_memories),
        AXR_Device_DefaultMemory: Some(device_default_memory),

        AXR_Memory_Id: Some(memory_id),
        AXR_Memory_Kind: Some(memory_kind),
        AXR_Memory_DebugString: Some(memory_debug_string),
        AXR_Memory_ToString: Some(memory_to_string),
        AXR_Memory_AddressableByDevices: Some(memory_addressable_by_devices),

        AXR_Executable_Destroy: Some(executable_destroy),
        AXR_Executable_Name: Some(executable_name),
        AXR_Executable_NumReplicas: Some(executable_num_replicas),
        AXR_Executable_NumPartitions: Some(executable_num_partitions),
        AXR_Executable_NumOutputs: Some(executable_num_outputs),
        AXR_Executable_SizeOfGeneratedCodeInBytes: Some(executable_size_of_generated_code_in_bytes),
        AXR_Executable_GetCostAnalysis: Some(executable_get_cost_analysis),
        AXR_Executable_OutputMemoryKinds: Some(executable_output_memory_kinds),
        AXR_Executable_OptimizedProgram: Some(executable_optimized_program),
        AXR_Executable_Serialize: Some(executable_serialize),

        AXR_LoadedExecutable_Destroy: Some(loaded_executable_destroy),
        AXR_LoadedExecutable_GetExecutable: Some(loaded_executable_get_executable),
        AXR_LoadedExecutable_AddressableDevices: Some(loaded_executable_addressable_devices),
        AXR_LoadedExecutable_Delete: Some(loaded_executable_delete),
        AXR_LoadedExecutable_IsDeleted: Some(loaded_executable_is_deleted),
        AXR_LoadedExecutable_Execute: Some(loaded_executable_execute),
        AXR_Executable_DeserializeAndLoad: Some(executable_deserialize_and_load),

        AXR_Buffer_Destroy: Some(buffer_destroy),
        AXR_Buffer_ElementType: Some(buffer_element_type),
        AXR_Buffer_Dimensions: Some(buffer_dimensions),
        AXR_Buffer_UnpaddedDimensions: Some(buffer_unpadded_dimensions),
        AXR_Buffer_DynamicDimensionIndices: Some(buffer_dynamic_dimension_indices),
        AXR_Buffer_Layout: Some(buffer_layout),
        AXR_Buffer_OnDeviceSizeInBytes: Some(buffer_on_device_size_in_bytes),
        AXR_Buffer_Device: Some(buffer_device),
        AXR_Buffer_Memory: Some(buffer_memory),
        AXR_Buffer_Delete: Some(buffer_delete),
        AXR_Buffer_IsDeleted: Some(buffer_is_deleted),
        AXR_Buffer_CopyToDevice: Some(buffer_copy_to_device),
        AXR_Buffer_ToHost: Some(buffer_to_host),
        AXR_Buffer_IsOnCpu: Some(buffer_is_on_cpu),
        AXR_Buffer_ReadyEvent: Some(buffer_ready_event),
        AXR_Buffer_UnsafePointer: Some(buffer_unsafe_pointer),
        AXR_Buffer_IncreaseExternalReferenceCount: Some(buffer_increase_external_reference_count),
        AXR_Buffer_DecreaseExternalReferenceCount: Some(buffer_decrease_external_reference_count),
        AXR_Buffer_DeviceMemoryPointer: Some(buffer_device_memory_pointer),

        AXR_CopyToDeviceStream_Destroy: Some(copy_to_device_stream_destroy),
        AXR_CopyToDeviceStream_AddChunk: Some(copy_to_device_stream_add_chunk),
        AXR_CopyToDeviceStream_TotalBytes: Some(copy_to_device_stream_total_bytes),
        AXR_CopyToDeviceStream_GranuleSize: Some(copy_to_device_stream_granule_size),

        AXR_Topology_Create: Some(topology_create),
        AXR_Topology_Destroy: Some(topology_destroy),
        AXR_Topology_PlatformName: Some(topology_platform_name),
        AXR_Topology_PlatformVersion: Some(topology_platform_version),
        AXR_Topology_GetDeviceDescriptions: Some(topology_get_device_descriptions),
        AXR_Topology_Serialize: Some(topology_serialize),
        AXR_Topology_Attributes: Some(topology_attributes),

        AXR_Compile: Some(compile),

        AXR_Executable_OutputElementTypes: Some(executable_output_element_types),
        AXR_Executable_OutputDimensions: Some(executable_output_dimensions),

        AXR_Buffer_CopyToMemory: Some(buffer_copy_to_memory),

        AXR_Executable_Fingerprint: Some(executable_fingerprint),

        AXR_Client_TopologyDescription: Some(client_topology_description),

        AXR_Memory_Kind_Id: Some(memory_kind_id),

        AXR_Topology_Deserialize: Some(topology_deserialize),

        AXR_Event_Create: Some(event_create),
        AXR_Event_Set: Some(event_set),
    }
}

/// Returns the function table of the in-process test plugin.
pub(crate) fn get_test_api() -> *const AXR_Api {
    static API: LazyLock<ApiTable> =
        LazyLock::new(|| ApiTable(make_api(AXR_API_MAJOR as c_int, AXR_API_MINOR as c_int)));
    &API.0
}

/// Returns a function table that declares the provided ABI version, for testing version negotiation.
pub(crate) fn get_test_api_with_version(major_version: c_int, minor_version: c_int) -> *const AXR_Api {
    &Box::leak(Box::new(ApiTable(make_api(major_version, minor_version)))).0
}
