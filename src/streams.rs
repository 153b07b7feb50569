use std::marker::PhantomData;
use std::sync::Mutex;

use crate::{Api, Client, Error, Event, Plugin, invoke_plugin_api_error_fn, slice_from_c_api};

/// Sized chunk of host data that is streamed to or from a [`Device`](crate::Device) while a program executes. Chunks
/// own their underlying byte range together with an embedded deleter that is invoked exactly once, either when the
/// chunk is dropped or by the plugin after it has consumed the chunk's bytes.
pub struct Chunk {
    /// Plugin ABI representation of this [`Chunk`]. The fields of this value own the underlying byte range.
    value: ffi::AXR_Chunk,
}

impl Chunk {
    /// Constructs a new [`Chunk`] from the provided [`AXR_Chunk`](ffi::AXR_Chunk) handle that came from a function
    /// in the plugin ABI, taking ownership of the underlying byte range.
    pub(crate) unsafe fn from_c_api(handle: *mut ffi::AXR_Chunk) -> Result<Self, Error> {
        if handle.is_null() {
            Err(Error::invalid_argument("the provided plugin chunk handle is a null pointer"))
        } else {
            Ok(Self { value: unsafe { std::ptr::read(handle) } })
        }
    }

    /// Constructs a new [`Chunk`] that owns the provided bytes. The embedded deleter frees the underlying [`Vec`]
    /// once the chunk has been consumed.
    pub fn from_vec(data: Vec<u8>) -> Self {
        unsafe extern "C" fn drop_vec(_data: *mut std::ffi::c_void, deleter_arg: *mut std::ffi::c_void) {
            unsafe { drop(Box::from_raw(deleter_arg as *mut Vec<u8>)) };
        }

        let mut data = Box::new(data);
        let value = ffi::AXR_Chunk {
            data: data.as_mut_ptr() as *mut _,
            size: data.len(),
            deleter: Some(drop_vec),
            deleter_arg: Box::into_raw(data) as *mut _,
        };
        Self { value }
    }

    /// Returns the underlying data (i.e., bytes) contained in this [`Chunk`].
    pub fn data(&self) -> &[u8] {
        unsafe { slice_from_c_api(self.value.data as *const u8, self.value.size) }
    }

    /// Hands the underlying [`AXR_Chunk`](ffi::AXR_Chunk) (and thus ownership of the byte range and the
    /// responsibility to invoke the embedded deleter) over to the caller.
    pub(crate) fn into_c_api(self) -> ffi::AXR_Chunk {
        // [`Chunk`] implements [`Drop`], so the value cannot be moved out of `self` directly.
        let value = unsafe { std::ptr::read(&self.value) };
        std::mem::forget(self);
        value
    }
}

impl Drop for Chunk {
    fn drop(&mut self) {
        if let Some(deleter) = self.value.deleter {
            unsafe { deleter(self.value.data, self.value.deleter_arg) };
        }
    }
}

/// Stream that copies [`Chunk`]s of data from the host to a [`Device`](crate::Device) while a program executes.
/// Streams know the total number of bytes they expect and the granule size that chunk sizes must be multiples of.
/// Both are fetched from the plugin once, when the stream is constructed, and appends are validated locally before
/// any chunk is handed to the plugin.
///
/// The lifetime parameter `'c` captures the lifetime of the [`Client`] whose execution produced this
/// [`CopyToDeviceStream`], ensuring that the client outlives the stream.
pub struct CopyToDeviceStream<'c> {
    /// Handle that represents this [`CopyToDeviceStream`] in the plugin ABI.
    handle: *mut ffi::AXR_CopyToDeviceStream,

    /// Underlying plugin [`Api`].
    api: Api,

    /// Total amount of data (as a number of bytes) that this stream expects to be transferred.
    total_byte_count: usize,

    /// Granule size (as a number of bytes) of this stream.
    granule_byte_count: usize,

    /// Number of bytes that have been appended to this stream so far.
    current_byte_count: Mutex<usize>,

    /// [`PhantomData`] used to track the lifetime of the [`Client`] whose execution produced this stream.
    owner: PhantomData<&'c ()>,
}

impl CopyToDeviceStream<'_> {
    /// Constructs a new [`CopyToDeviceStream`] from the provided
    /// [`AXR_CopyToDeviceStream`](ffi::AXR_CopyToDeviceStream) handle that came from a function in the plugin ABI.
    /// This fetches the total byte count and granule size of the stream once.
    pub(crate) unsafe fn from_c_api(handle: *mut ffi::AXR_CopyToDeviceStream, api: Api) -> Result<Self, Error> {
        use ffi::{AXR_CopyToDeviceStream_GranuleSize_Args, AXR_CopyToDeviceStream_TotalBytes_Args};
        if handle.is_null() {
            return Err(Error::invalid_argument("the provided plugin copy-to-device stream handle is a null pointer"));
        }
        let total_byte_count =
            invoke_plugin_api_error_fn!(api, AXR_CopyToDeviceStream_TotalBytes, { stream = handle }, { total_bytes })
                .map(|count| count as usize)?;
        let granule_byte_count = invoke_plugin_api_error_fn!(
            api,
            AXR_CopyToDeviceStream_GranuleSize,
            { stream = handle },
            { granule_size_in_bytes },
        )
        .map(|count| count as usize)?;
        Ok(Self {
            handle,
            api,
            total_byte_count,
            granule_byte_count,
            current_byte_count: Mutex::new(0),
            owner: PhantomData,
        })
    }

    /// Returns the [`AXR_CopyToDeviceStream`](ffi::AXR_CopyToDeviceStream) that corresponds to this
    /// [`CopyToDeviceStream`] and which can be passed to functions in the plugin ABI.
    pub(crate) unsafe fn to_c_api(&self) -> *mut ffi::AXR_CopyToDeviceStream {
        self.handle
    }

    /// Returns the underlying plugin [`Api`].
    pub(crate) fn api(&self) -> Api {
        self.api
    }

    /// Returns the amount of data (as a number of bytes) that has been appended to this stream so far.
    pub fn current_byte_count(&self) -> usize {
        *self.current_byte_count.lock().unwrap()
    }

    /// Returns the total amount of data (as a number of bytes) that this stream expects to be transferred.
    pub fn total_byte_count(&self) -> usize {
        self.total_byte_count
    }

    /// Returns the granule size (as a number of bytes) of this stream. The size of each [`Chunk`] added to this
    /// stream must be a multiple of this number, unless the chunk exactly completes the stream.
    pub fn granule_byte_count(&self) -> usize {
        self.granule_byte_count
    }

    /// Enqueues a new [`Chunk`] of data to copy to the target [`Device`](crate::Device). The transfer starts
    /// immediately, and this function returns an [`Event`] that will be triggered when the transfer completes or
    /// fails. Appends that would exceed the total number of bytes expected by this stream are rejected, as are
    /// chunks whose size is not a multiple of [`CopyToDeviceStream::granule_byte_count`], unless the chunk exactly
    /// completes the stream. Rejected chunks are dropped without being handed to the plugin.
    pub fn add_chunk(&self, chunk: Chunk) -> Result<Event<()>, Error> {
        use ffi::AXR_CopyToDeviceStream_AddChunk_Args;
        let size = chunk.data().len();
        let mut current_byte_count = self.current_byte_count.lock().unwrap();
        if *current_byte_count + size > self.total_byte_count {
            return Err(Error::invalid_argument(format!(
                "adding a chunk of {size} byte(s) would exceed the {} total byte(s) expected by this stream",
                self.total_byte_count,
            )));
        }
        let completes_stream = *current_byte_count + size == self.total_byte_count;
        if !completes_stream && (self.granule_byte_count == 0 || size % self.granule_byte_count != 0) {
            return Err(Error::invalid_argument(format!(
                "chunk size {size} is not a multiple of the stream granule size of {} byte(s)",
                self.granule_byte_count,
            )));
        }
        let mut chunk = chunk.into_c_api();
        let result = invoke_plugin_api_error_fn!(
            self.api(),
            AXR_CopyToDeviceStream_AddChunk,
            { stream = self.handle, chunk = &mut chunk as *mut _ },
            { transfer_complete },
        )
        .and_then(|handle| unsafe { Event::from_c_api(handle, self.api(), ()) })?;
        *current_byte_count += size;
        Ok(result)
    }
}

unsafe impl Send for CopyToDeviceStream<'_> {}
unsafe impl Sync for CopyToDeviceStream<'_> {}

impl Drop for CopyToDeviceStream<'_> {
    fn drop(&mut self) {
        use ffi::AXR_CopyToDeviceStream_Destroy_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_CopyToDeviceStream_Destroy, { stream = self.to_c_api() })
            .expect("failed to destroy plugin copy-to-device stream");
    }
}

/// Callback function that is invoked from the runtime when executing _send_ operations in
/// [`Program`](crate::Program)s. The channel ID used in the program _send_ operation must match
/// [`SendCallback::channel_id`] for the callback. Note that there is no guarantee that [`SendCallback`]s will be
/// invoked in the same order as their corresponding _send_ operations in the program.
///
/// [`SendCallback`]s are used to send data from the runtime to the host while executing programs. In some ways, they
/// are the opposite of [`ReceiveCallback`]s that are used to receive data in the runtime from the host while
/// executing programs.
///
/// # Safety
///
/// Certain plugin implementations might **not** signal [`Error`]s returned by this callback to the execution, and
/// the execution will run to completion with _undefined_ data returned by the callback in that case. If there is any
/// potential control flow that depends on the value of the returned data, returning an [`Error`] may be unsafe.
pub struct SendCallback {
    /// Channel ID that is used to identify the program _send_ operation for which this callback will be invoked.
    pub channel_id: usize,

    /// Callback function that is invoked when the program _send_ operation corresponding to this callback is
    /// executed. This function may be invoked multiple times for each _send_ operation as it is a _streaming_
    /// callback. Specifically, the data will be sent in [`Chunk`]s and this function will be invoked for each chunk.
    /// Along with the chunk it has two additional inputs: the total number of bytes that is being sent over and a
    /// boolean value indicating whether the chunk in the current invocation is the last one or not for the ongoing
    /// _send_ operation.
    pub function: Box<dyn FnMut(Chunk, usize, bool) -> Result<(), Error>>,
}

impl SendCallback {
    /// Returns the [`AXR_SendCallbackInfo`](ffi::AXR_SendCallbackInfo) that corresponds to this [`SendCallback`]
    /// and which can be passed to functions in the plugin ABI.
    ///
    /// # Safety
    ///
    /// This function consumes this callback returning an [`AXR_SendCallbackInfo`](ffi::AXR_SendCallbackInfo) that
    /// owns the underlying callback state. The returned [`AXR_SendCallbackInfo::user_arg`] must be freed after the
    /// execution that uses this callback completes. The [`LoadedExecutable::execute`](crate::LoadedExecutable)
    /// implementation handles this by tying cleanup to the execution completion events.
    #[allow(clippy::wrong_self_convention)]
    pub(crate) unsafe fn to_c_api(self) -> ffi::AXR_SendCallbackInfo {
        extern "C" fn callback(
            chunk: *mut ffi::AXR_Chunk,
            callback_error: *mut crate::errors::ffi::AXR_CallbackError,
            total_size_in_bytes: usize,
            done: bool,
            user_arg: *mut std::ffi::c_void,
        ) -> *mut crate::errors::ffi::AXR_Error {
            unsafe {
                let user_arg = &mut *(user_arg as *mut SendCallback);
                match Chunk::from_c_api(chunk).and_then(|chunk| (user_arg.function)(chunk, total_size_in_bytes, done))
                {
                    Ok(()) => std::ptr::null_mut(),
                    Err(error) => error.to_c_api(callback_error) as *mut _,
                }
            }
        }

        ffi::AXR_SendCallbackInfo {
            channel_id: self.channel_id as i64,
            user_arg: Box::into_raw(Box::new(self)) as *mut _,
            send_callback: callback,
        }
    }
}

/// Callback function that is invoked from the runtime when executing _receive_ operations in
/// [`Program`](crate::Program)s. The channel ID used in the program _receive_ operation must match
/// [`ReceiveCallback::channel_id`] for the callback. Note that there is no guarantee that [`ReceiveCallback`]s will
/// be invoked in the same order as their corresponding _receive_ operations in the program.
///
/// [`ReceiveCallback`]s are used to receive data in the runtime from the host while executing programs. In some
/// ways, they are the opposite of [`SendCallback`]s that are used to send data from the runtime to the host while
/// executing programs.
pub struct ReceiveCallback {
    /// Channel ID that is used to identify the program _receive_ operation for which this callback will be invoked.
    pub channel_id: usize,

    /// Callback function that is invoked when the program _receive_ operation corresponding to this callback is
    /// executed. This function will be invoked once for each _receive_ operation. It receives as input a
    /// [`CopyToDeviceStream`] which must be used to _stream_ data to the runtime in [`Chunk`]s.
    pub function: Box<dyn FnMut(CopyToDeviceStream<'_>)>,

    /// Underlying plugin [`Api`].
    api: Api,
}

impl ReceiveCallback {
    /// Returns the [`AXR_RecvCallbackInfo`](ffi::AXR_RecvCallbackInfo) that corresponds to this [`ReceiveCallback`]
    /// and which can be passed to functions in the plugin ABI.
    ///
    /// # Safety
    ///
    /// This function consumes this callback returning an [`AXR_RecvCallbackInfo`](ffi::AXR_RecvCallbackInfo) that
    /// owns the underlying callback state. The returned [`AXR_RecvCallbackInfo::user_arg`] must be freed after the
    /// execution that uses this callback completes. The [`LoadedExecutable::execute`](crate::LoadedExecutable)
    /// implementation handles this by tying cleanup to the execution completion events.
    #[allow(clippy::wrong_self_convention)]
    pub(crate) unsafe fn to_c_api(self) -> ffi::AXR_RecvCallbackInfo {
        extern "C" fn callback(stream: *mut ffi::AXR_CopyToDeviceStream, user_arg: *mut std::ffi::c_void) {
            unsafe {
                let user_arg = &mut *(user_arg as *mut ReceiveCallback);
                // The stream construction can only fail if the plugin handed over a broken stream handle. There is
                // no way to report that back through this callback's signature and unwinding across the ABI boundary
                // is not an option, so the invocation is skipped and the failure surfaces through the execution's
                // completion event.
                let Ok(stream) = CopyToDeviceStream::from_c_api(stream, user_arg.api) else {
                    return;
                };
                (user_arg.function)(stream);
            }
        }

        ffi::AXR_RecvCallbackInfo {
            channel_id: self.channel_id as i64,
            user_arg: Box::into_raw(Box::new(self)) as *mut _,
            recv_callback: callback,
        }
    }
}

impl Client {
    /// Creates a new [`SendCallback`] for the provided channel ID and using the provided callback function. The
    /// channel ID provided here **must match** the corresponding channel ID in a _send_ operation in the
    /// [`Program`](crate::Program) that will be executed.
    pub fn send_callback<F: 'static + FnMut(Chunk, usize, bool) -> Result<(), Error>>(
        &self,
        channel_id: usize,
        function: F,
    ) -> SendCallback {
        self.api().send_callback(channel_id, function)
    }

    /// Creates a new [`ReceiveCallback`] for the provided channel ID and using the provided callback function. The
    /// channel ID provided here **must match** the corresponding channel ID in a _receive_ operation in the
    /// [`Program`](crate::Program) that will be executed.
    pub fn receive_callback<F: 'static + FnMut(CopyToDeviceStream<'_>)>(
        &self,
        channel_id: usize,
        function: F,
    ) -> ReceiveCallback {
        self.api().receive_callback(channel_id, function)
    }
}

impl Plugin {
    /// Creates a new [`SendCallback`] for the provided channel ID and using the provided callback function.
    pub fn send_callback<F: 'static + FnMut(Chunk, usize, bool) -> Result<(), Error>>(
        &self,
        channel_id: usize,
        function: F,
    ) -> SendCallback {
        self.api().send_callback(channel_id, function)
    }

    /// Creates a new [`ReceiveCallback`] for the provided channel ID and using the provided callback function.
    pub fn receive_callback<F: 'static + FnMut(CopyToDeviceStream<'_>)>(
        &self,
        channel_id: usize,
        function: F,
    ) -> ReceiveCallback {
        self.api().receive_callback(channel_id, function)
    }
}

impl Api {
    /// Creates a new [`SendCallback`] for the provided channel ID and using the provided callback function.
    pub(crate) fn send_callback<F: 'static + FnMut(Chunk, usize, bool) -> Result<(), Error>>(
        &self,
        channel_id: usize,
        function: F,
    ) -> SendCallback {
        SendCallback { channel_id, function: Box::new(function) }
    }

    /// Creates a new [`ReceiveCallback`] for the provided channel ID and using the provided callback function.
    pub(crate) fn receive_callback<F: 'static + FnMut(CopyToDeviceStream<'_>)>(
        &self,
        channel_id: usize,
        function: F,
    ) -> ReceiveCallback {
        ReceiveCallback { channel_id, function: Box::new(function), api: *self }
    }
}

#[allow(dead_code, non_camel_case_types, non_snake_case, non_upper_case_globals)]
pub(crate) mod ffi {
    use std::marker::{PhantomData, PhantomPinned};

    use crate::errors::ffi::{AXR_CallbackError, AXR_Error};
    use crate::events::ffi::AXR_Event;
    use crate::ffi::AXR_Extension_Base;

    #[repr(C)]
    pub struct AXR_Chunk {
        pub data: *mut std::ffi::c_void,
        pub size: usize,
        pub deleter: Option<unsafe extern "C" fn(data: *mut std::ffi::c_void, deleter_arg: *mut std::ffi::c_void)>,
        pub deleter_arg: *mut std::ffi::c_void,
    }

    // We represent opaque C types as structs with a particular structure that is following the convention
    // suggested in [the Rustonomicon](https://doc.rust-lang.org/nomicon/ffi.html#representing-opaque-structs).
    #[repr(C)]
    pub struct AXR_CopyToDeviceStream {
        _data: [u8; 0],
        _marker: PhantomData<(*mut u8, PhantomPinned)>,
    }

    #[repr(C)]
    pub struct AXR_CopyToDeviceStream_TotalBytes_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub stream: *mut AXR_CopyToDeviceStream,
        pub total_bytes: i64,
    }

    impl AXR_CopyToDeviceStream_TotalBytes_Args {
        pub fn new(stream: *mut AXR_CopyToDeviceStream) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), stream, total_bytes: 0 }
        }
    }

    pub type AXR_CopyToDeviceStream_TotalBytes =
        unsafe extern "C" fn(args: *mut AXR_CopyToDeviceStream_TotalBytes_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_CopyToDeviceStream_GranuleSize_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub stream: *mut AXR_CopyToDeviceStream,
        pub granule_size_in_bytes: i64,
    }

    impl AXR_CopyToDeviceStream_GranuleSize_Args {
        pub fn new(stream: *mut AXR_CopyToDeviceStream) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                stream,
                granule_size_in_bytes: 0,
            }
        }
    }

    pub type AXR_CopyToDeviceStream_GranuleSize =
        unsafe extern "C" fn(args: *mut AXR_CopyToDeviceStream_GranuleSize_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_CopyToDeviceStream_AddChunk_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub stream: *mut AXR_CopyToDeviceStream,
        pub chunk: *mut AXR_Chunk,
        pub transfer_complete: *mut AXR_Event,
    }

    impl AXR_CopyToDeviceStream_AddChunk_Args {
        pub fn new(stream: *mut AXR_CopyToDeviceStream, chunk: *mut AXR_Chunk) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                stream,
                chunk,
                transfer_complete: std::ptr::null_mut(),
            }
        }
    }

    pub type AXR_CopyToDeviceStream_AddChunk =
        unsafe extern "C" fn(args: *mut AXR_CopyToDeviceStream_AddChunk_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_CopyToDeviceStream_Destroy_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub stream: *mut AXR_CopyToDeviceStream,
    }

    impl AXR_CopyToDeviceStream_Destroy_Args {
        pub fn new(stream: *mut AXR_CopyToDeviceStream) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), stream }
        }
    }

    pub type AXR_CopyToDeviceStream_Destroy =
        unsafe extern "C" fn(args: *mut AXR_CopyToDeviceStream_Destroy_Args) -> *mut AXR_Error;

    pub type AXR_SendCallback = extern "C" fn(
        chunk: *mut AXR_Chunk,
        callback_error: *mut AXR_CallbackError,
        total_size_in_bytes: usize,
        done: bool,
        user_arg: *mut std::ffi::c_void,
    ) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_SendCallbackInfo {
        pub channel_id: i64,
        pub user_arg: *mut std::ffi::c_void,
        pub send_callback: AXR_SendCallback,
    }

    pub type AXR_RecvCallback = extern "C" fn(stream: *mut AXR_CopyToDeviceStream, user_arg: *mut std::ffi::c_void);

    #[repr(C)]
    pub struct AXR_RecvCallbackInfo {
        pub channel_id: i64,
        pub user_arg: *mut std::ffi::c_void,
        pub recv_callback: AXR_RecvCallback,
    }
}
