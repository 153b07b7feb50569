use std::cell::{Ref, RefCell, RefMut, UnsafeCell};
use std::fmt::{Debug, Display};
use std::mem::MaybeUninit;
use std::rc::Rc;
use std::sync::OnceLock;

use crate::events::SharedEvent;
use crate::{
    Api, Client, Device, Error, Event, Memory, SharedEventFuture, invoke_plugin_api_error_fn, slice_from_c_api,
};

/// Type of the elements stored in a [`Buffer`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BufferType {
    /// Invalid element type that no well-formed [`Buffer`] should report.
    Invalid,

    /// Execution-ordering token. Buffers with this element type carry no data.
    Token,

    /// Boolean predicate.
    Predicate,

    /// 8-bit signed integer.
    I8,

    /// 16-bit signed integer.
    I16,

    /// 32-bit signed integer.
    I32,

    /// 64-bit signed integer.
    I64,

    /// 8-bit unsigned integer.
    U8,

    /// 16-bit unsigned integer.
    U16,

    /// 32-bit unsigned integer.
    U32,

    /// 64-bit unsigned integer.
    U64,

    /// 16-bit IEEE 754 floating-point number.
    F16,

    /// 16-bit Brain floating-point number (i.e., 8 exponent bits and 7 mantissa bits).
    BF16,

    /// 32-bit IEEE 754 floating-point number.
    F32,

    /// 64-bit IEEE 754 floating-point number.
    F64,

    /// Complex number made up of two 32-bit IEEE 754 floating-point numbers.
    C64,

    /// Complex number made up of two 64-bit IEEE 754 floating-point numbers.
    C128,
}

impl BufferType {
    /// Constructs a new [`BufferType`] from the provided [`AXR_Buffer_Type`](ffi::AXR_Buffer_Type) that came
    /// from a function in the plugin ABI.
    pub(crate) fn from_c_api(value: ffi::AXR_Buffer_Type) -> Result<Self, Error> {
        match value {
            ffi::AXR_Buffer_Type_Invalid => Ok(Self::Invalid),
            ffi::AXR_Buffer_Type_Token => Ok(Self::Token),
            ffi::AXR_Buffer_Type_Pred => Ok(Self::Predicate),
            ffi::AXR_Buffer_Type_I8 => Ok(Self::I8),
            ffi::AXR_Buffer_Type_I16 => Ok(Self::I16),
            ffi::AXR_Buffer_Type_I32 => Ok(Self::I32),
            ffi::AXR_Buffer_Type_I64 => Ok(Self::I64),
            ffi::AXR_Buffer_Type_U8 => Ok(Self::U8),
            ffi::AXR_Buffer_Type_U16 => Ok(Self::U16),
            ffi::AXR_Buffer_Type_U32 => Ok(Self::U32),
            ffi::AXR_Buffer_Type_U64 => Ok(Self::U64),
            ffi::AXR_Buffer_Type_F16 => Ok(Self::F16),
            ffi::AXR_Buffer_Type_BF16 => Ok(Self::BF16),
            ffi::AXR_Buffer_Type_F32 => Ok(Self::F32),
            ffi::AXR_Buffer_Type_F64 => Ok(Self::F64),
            ffi::AXR_Buffer_Type_C64 => Ok(Self::C64),
            ffi::AXR_Buffer_Type_C128 => Ok(Self::C128),
            _ => Err(Error::invalid_argument(format!("invalid plugin buffer element type: {value}"))),
        }
    }

    /// Returns the [`AXR_Buffer_Type`](ffi::AXR_Buffer_Type) that corresponds to this [`BufferType`] and which can
    /// be passed to functions in the plugin ABI.
    pub(crate) fn to_c_api(self) -> ffi::AXR_Buffer_Type {
        match self {
            Self::Invalid => ffi::AXR_Buffer_Type_Invalid,
            Self::Token => ffi::AXR_Buffer_Type_Token,
            Self::Predicate => ffi::AXR_Buffer_Type_Pred,
            Self::I8 => ffi::AXR_Buffer_Type_I8,
            Self::I16 => ffi::AXR_Buffer_Type_I16,
            Self::I32 => ffi::AXR_Buffer_Type_I32,
            Self::I64 => ffi::AXR_Buffer_Type_I64,
            Self::U8 => ffi::AXR_Buffer_Type_U8,
            Self::U16 => ffi::AXR_Buffer_Type_U16,
            Self::U32 => ffi::AXR_Buffer_Type_U32,
            Self::U64 => ffi::AXR_Buffer_Type_U64,
            Self::F16 => ffi::AXR_Buffer_Type_F16,
            Self::BF16 => ffi::AXR_Buffer_Type_BF16,
            Self::F32 => ffi::AXR_Buffer_Type_F32,
            Self::F64 => ffi::AXR_Buffer_Type_F64,
            Self::C64 => ffi::AXR_Buffer_Type_C64,
            Self::C128 => ffi::AXR_Buffer_Type_C128,
        }
    }

    /// Parses a rendered [`BufferType`] (e.g., `"f32"`) into a [`BufferType`].
    #[allow(clippy::should_implement_trait)]
    pub fn from_str<S: AsRef<str>>(value: S) -> Result<Self, Error> {
        match value.as_ref().trim() {
            "invalid" => Ok(Self::Invalid),
            "token" => Ok(Self::Token),
            "pred" => Ok(Self::Predicate),
            "i8" => Ok(Self::I8),
            "i16" => Ok(Self::I16),
            "i32" => Ok(Self::I32),
            "i64" => Ok(Self::I64),
            "u8" => Ok(Self::U8),
            "u16" => Ok(Self::U16),
            "u32" => Ok(Self::U32),
            "u64" => Ok(Self::U64),
            "f16" => Ok(Self::F16),
            "bf16" => Ok(Self::BF16),
            "f32" => Ok(Self::F32),
            "f64" => Ok(Self::F64),
            "c64" => Ok(Self::C64),
            "c128" => Ok(Self::C128),
            value => Err(Error::invalid_argument(format!("invalid buffer element type: {value}"))),
        }
    }
}

impl Display for BufferType {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid => write!(formatter, "invalid"),
            Self::Token => write!(formatter, "token"),
            Self::Predicate => write!(formatter, "pred"),
            Self::I8 => write!(formatter, "i8"),
            Self::I16 => write!(formatter, "i16"),
            Self::I32 => write!(formatter, "i32"),
            Self::I64 => write!(formatter, "i64"),
            Self::U8 => write!(formatter, "u8"),
            Self::U16 => write!(formatter, "u16"),
            Self::U32 => write!(formatter, "u32"),
            Self::U64 => write!(formatter, "u64"),
            Self::F16 => write!(formatter, "f16"),
            Self::BF16 => write!(formatter, "bf16"),
            Self::F32 => write!(formatter, "f32"),
            Self::F64 => write!(formatter, "f64"),
            Self::C64 => write!(formatter, "c64"),
            Self::C128 => write!(formatter, "c128"),
        }
    }
}

/// Tiled memory [`Layout`] for [`Buffer`]s, described by a minor-to-major dimension order and an optional sequence
/// of tiles. Each tile is a sequence of tile dimension sizes and tiles are applied from left to right.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TiledLayout {
    /// Dimension order of this [`TiledLayout`], from the minor-most to the major-most dimension.
    minor_to_major: Vec<i64>,

    /// Concatenated dimension sizes of all tiles of this [`TiledLayout`].
    tile_dimensions: Vec<i64>,

    /// Number of dimensions for each tile of this [`TiledLayout`] (i.e., `tile_dimension_sizes[i]` is the number of
    /// entries in `tile_dimensions` that belong to tile `i`).
    tile_dimension_sizes: Vec<usize>,
}

impl TiledLayout {
    /// Constructs a new [`TiledLayout`] from the provided minor-to-major dimension order and tiles.
    pub fn new(minor_to_major: Vec<i64>, tiles: Vec<Vec<i64>>) -> Self {
        let tile_dimension_sizes = tiles.iter().map(|tile| tile.len()).collect();
        let tile_dimensions = tiles.into_iter().flatten().collect();
        Self { minor_to_major, tile_dimensions, tile_dimension_sizes }
    }

    /// Constructs a new [`TiledLayout`] from the provided
    /// [`AXR_Buffer_MemoryLayout_Tiled`](ffi::AXR_Buffer_MemoryLayout_Tiled) that came from a function
    /// in the plugin ABI.
    pub(crate) unsafe fn from_c_api(tiled: &ffi::AXR_Buffer_MemoryLayout_Tiled) -> Self {
        let minor_to_major = unsafe { slice_from_c_api(tiled.minor_to_major, tiled.minor_to_major_size) }.to_vec();
        let tile_dimension_sizes = unsafe { slice_from_c_api(tiled.tile_dimension_sizes, tiled.num_tiles) }.to_vec();
        let num_tile_dimensions = tile_dimension_sizes.iter().sum();
        let tile_dimensions = unsafe { slice_from_c_api(tiled.tile_dimensions, num_tile_dimensions) }.to_vec();
        Self { minor_to_major, tile_dimensions, tile_dimension_sizes }
    }

    /// Returns the [`AXR_Buffer_MemoryLayout_Tiled`](ffi::AXR_Buffer_MemoryLayout_Tiled) that corresponds to this
    /// [`TiledLayout`] and which can be passed to functions in the plugin ABI. The returned value borrows the
    /// storage of this [`TiledLayout`] and so this [`TiledLayout`] must be kept alive while the returned value
    /// is in use.
    pub(crate) unsafe fn to_c_api(&self) -> ffi::AXR_Buffer_MemoryLayout_Tiled {
        ffi::AXR_Buffer_MemoryLayout_Tiled::new(
            self.minor_to_major.as_ptr(),
            self.minor_to_major.len(),
            self.tile_dimensions.as_ptr(),
            self.tile_dimension_sizes.as_ptr(),
            self.tile_dimension_sizes.len(),
        )
    }

    /// Dimension order of this [`TiledLayout`], from the minor-most to the major-most dimension.
    pub fn minor_to_major(&self) -> &[i64] {
        &self.minor_to_major
    }

    /// Tiles of this [`TiledLayout`], each rendered as its sequence of tile dimension sizes.
    pub fn tiles(&self) -> Vec<&[i64]> {
        let mut tiles = Vec::with_capacity(self.tile_dimension_sizes.len());
        let mut offset = 0;
        for size in &self.tile_dimension_sizes {
            tiles.push(&self.tile_dimensions[offset..(offset + size)]);
            offset += size;
        }
        tiles
    }

    /// Returns `true` if and only if this [`TiledLayout`] is an untiled dense layout with dimensions ordered from
    /// the major-most to the minor-most dimension (i.e., the default host layout).
    pub fn is_major_to_minor(&self) -> bool {
        self.tile_dimension_sizes.is_empty()
            && self.minor_to_major.iter().rev().enumerate().all(|(index, &dimension)| dimension == index as i64)
    }
}

impl Display for TiledLayout {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{{")?;
        let mut dimensions = self.minor_to_major.iter();
        if let Some(first_dimension) = dimensions.next() {
            write!(formatter, "{first_dimension}")?;
            dimensions.try_for_each(|dimension| write!(formatter, ",{dimension}"))?;
        }
        for tile in self.tiles() {
            write!(formatter, ":T(")?;
            let mut tile_dimensions = tile.iter();
            if let Some(first_dimension) = tile_dimensions.next() {
                write!(formatter, "{first_dimension}")?;
                tile_dimensions.try_for_each(|dimension| write!(formatter, ",{dimension}"))?;
            }
            write!(formatter, ")")?;
        }
        write!(formatter, "}}")
    }
}

/// Strided memory [`Layout`] for [`Buffer`]s, described by the byte stride of each dimension.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StridedLayout {
    /// Number of bytes to traverse per dimension, with one entry per dimension.
    byte_strides: Vec<i64>,
}

impl StridedLayout {
    /// Constructs a new [`StridedLayout`] from the provided byte strides.
    pub fn new(byte_strides: Vec<i64>) -> Self {
        Self { byte_strides }
    }

    /// Constructs a new [`StridedLayout`] from the provided
    /// [`AXR_Buffer_MemoryLayout_Strides`](ffi::AXR_Buffer_MemoryLayout_Strides) that came from a function
    /// in the plugin ABI.
    pub(crate) unsafe fn from_c_api(strides: &ffi::AXR_Buffer_MemoryLayout_Strides) -> Self {
        Self { byte_strides: unsafe { slice_from_c_api(strides.byte_strides, strides.num_byte_strides) }.to_vec() }
    }

    /// Returns the [`AXR_Buffer_MemoryLayout_Strides`](ffi::AXR_Buffer_MemoryLayout_Strides) that corresponds to
    /// this [`StridedLayout`] and which can be passed to functions in the plugin ABI. The returned value borrows
    /// the storage of this [`StridedLayout`] and so this [`StridedLayout`] must be kept alive while the returned
    /// value is in use.
    pub(crate) unsafe fn to_c_api(&self) -> ffi::AXR_Buffer_MemoryLayout_Strides {
        ffi::AXR_Buffer_MemoryLayout_Strides::new(self.byte_strides.as_ptr(), self.byte_strides.len())
    }

    /// Number of bytes to traverse per dimension, with one entry per dimension.
    pub fn byte_strides(&self) -> &[i64] {
        &self.byte_strides
    }
}

impl Display for StridedLayout {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{{strides=(")?;
        let mut byte_strides = self.byte_strides.iter();
        if let Some(first_stride) = byte_strides.next() {
            write!(formatter, "{first_stride}")?;
            byte_strides.try_for_each(|stride| write!(formatter, ",{stride}"))?;
        }
        write!(formatter, ")}}")
    }
}

/// Memory layout of a [`Buffer`], describing how its elements are arranged in the underlying [`Memory`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Tiled layout. Refer to the documentation of [`TiledLayout`] for more information.
    Tiled(TiledLayout),

    /// Strided layout. Refer to the documentation of [`StridedLayout`] for more information.
    Strided(StridedLayout),
}

impl Layout {
    /// Constructs a new [`Layout`] from the provided [`AXR_Buffer_MemoryLayout`](ffi::AXR_Buffer_MemoryLayout)
    /// that came from a function in the plugin ABI.
    pub(crate) unsafe fn from_c_api(layout: &ffi::AXR_Buffer_MemoryLayout) -> Result<Self, Error> {
        match layout.layout_type {
            ffi::AXR_Buffer_MemoryLayout_Type_Tiled => {
                Ok(Self::Tiled(unsafe { TiledLayout::from_c_api(&layout.layout.tiled) }))
            }
            ffi::AXR_Buffer_MemoryLayout_Type_Strides => {
                Ok(Self::Strided(unsafe { StridedLayout::from_c_api(&layout.layout.strides) }))
            }
            layout_type => Err(Error::internal(format!("the plugin reported an invalid layout type: {layout_type}"))),
        }
    }

    /// Returns the [`AXR_Buffer_MemoryLayout`](ffi::AXR_Buffer_MemoryLayout) that corresponds to this [`Layout`]
    /// and which can be passed to functions in the plugin ABI. The returned value borrows the storage of this
    /// [`Layout`] and so this [`Layout`] must be kept alive while the returned value is in use.
    pub(crate) unsafe fn to_c_api(&self) -> ffi::AXR_Buffer_MemoryLayout {
        match self {
            Self::Tiled(tiled) => ffi::AXR_Buffer_MemoryLayout::new(
                ffi::AXR_Buffer_MemoryLayout_Value { tiled: unsafe { tiled.to_c_api() } },
                ffi::AXR_Buffer_MemoryLayout_Type_Tiled,
            ),
            Self::Strided(strided) => ffi::AXR_Buffer_MemoryLayout::new(
                ffi::AXR_Buffer_MemoryLayout_Value { strides: unsafe { strided.to_c_api() } },
                ffi::AXR_Buffer_MemoryLayout_Type_Strides,
            ),
        }
    }

    /// Returns `true` if and only if this [`Layout`] is an untiled dense layout with dimensions ordered from the
    /// major-most to the minor-most dimension (i.e., the default host layout).
    pub fn is_major_to_minor(&self) -> bool {
        match self {
            Self::Tiled(tiled) => tiled.is_major_to_minor(),
            Self::Strided(_) => false,
        }
    }
}

impl Display for Layout {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tiled(tiled) => write!(formatter, "{tiled}"),
            Self::Strided(strided) => write!(formatter, "{strided}"),
        }
    }
}

/// On-device buffer managed by a backend [`Plugin`](crate::Plugin). [`Buffer`]s are created by transferring host
/// data to a [`Memory`] (e.g., via [`Client::buffer_from_host`]), by copying other buffers, or as the outputs of
/// [`LoadedExecutable`](crate::LoadedExecutable) executions. Buffers are asynchronous values and may not contain
/// their final data when a creating function returns. Use [`Buffer::ready`] to observe when a buffer's contents
/// are in place.
///
/// The lifetime parameter `'c` captures the owning [`Client`], ensuring that the client outlives the buffer.
pub struct Buffer<'c> {
    /// Handle that represents this [`Buffer`] in the plugin ABI.
    handle: *mut ffi::AXR_Buffer,

    /// [`Client`] that owns this [`Buffer`].
    client: &'c Client,

    /// Cached element type of this [`Buffer`]. Element types are immutable for the lifetime of a plugin buffer and
    /// so they only need to be fetched once.
    element_type: OnceLock<Result<BufferType, Error>>,

    /// Cached dimensions of this [`Buffer`].
    dimensions: OnceLock<Result<Vec<u64>, Error>>,

    /// Cached unpadded dimensions of this [`Buffer`].
    unpadded_dimensions: OnceLock<Result<Vec<u64>, Error>>,

    /// Cached dynamic dimension indices of this [`Buffer`].
    dynamic_dimension_indices: OnceLock<Result<Vec<usize>, Error>>,

    /// Cached memory [`Layout`] of this [`Buffer`].
    layout: OnceLock<Result<Layout, Error>>,

    /// Cached readiness [`SharedEvent`] of this [`Buffer`]. The plugin-side readiness event is created and its
    /// completion callback is registered at most once, and all [`Buffer::ready`] callers observe the same cached
    /// terminal status through it.
    ready: OnceLock<Result<SharedEvent, Error>>,
}

impl<'c> Buffer<'c> {
    /// Constructs a new [`Buffer`] from the provided [`AXR_Buffer`](ffi::AXR_Buffer) handle that came
    /// from a function in the plugin ABI.
    pub(crate) unsafe fn from_c_api(handle: *mut ffi::AXR_Buffer, client: &'c Client) -> Result<Self, Error> {
        if handle.is_null() {
            Err(Error::invalid_argument("the provided plugin buffer handle is a null pointer"))
        } else {
            Ok(Self {
                handle,
                client,
                element_type: OnceLock::new(),
                dimensions: OnceLock::new(),
                unpadded_dimensions: OnceLock::new(),
                dynamic_dimension_indices: OnceLock::new(),
                layout: OnceLock::new(),
                ready: OnceLock::new(),
            })
        }
    }

    /// Returns the [`AXR_Buffer`](ffi::AXR_Buffer) that corresponds to this [`Buffer`] and which can
    /// be passed to functions in the plugin ABI.
    pub(crate) unsafe fn to_c_api(&self) -> *mut ffi::AXR_Buffer {
        self.handle
    }

    /// Returns the underlying plugin [`Api`].
    pub(crate) fn api(&self) -> Api {
        self.client.api()
    }

    /// Returns the [`Client`] that owns this [`Buffer`].
    pub fn client(&self) -> &'c Client {
        self.client
    }

    /// [`BufferType`] of the elements stored in this [`Buffer`].
    pub fn element_type(&self) -> Result<BufferType, Error> {
        self.element_type
            .get_or_init(|| {
                use ffi::AXR_Buffer_ElementType_Args;
                invoke_plugin_api_error_fn!(self.api(), AXR_Buffer_ElementType, { buffer = self.to_c_api() }, {
                    element_type
                })
                .and_then(BufferType::from_c_api)
            })
            .clone()
    }

    /// Dimensions (i.e., shape) of this [`Buffer`].
    pub fn dimensions(&self) -> Result<&[u64], Error> {
        self.dimensions
            .get_or_init(|| {
                use ffi::AXR_Buffer_Dimensions_Args;
                invoke_plugin_api_error_fn!(
                    self.api(),
                    AXR_Buffer_Dimensions,
                    { buffer = self.to_c_api() },
                    { dimensions, num_dimensions },
                )
                .map(|(dimensions, num_dimensions)| {
                    unsafe { slice_from_c_api(dimensions, num_dimensions) }
                        .iter()
                        .map(|&dimension| dimension as u64)
                        .collect()
                })
            })
            .as_ref()
            .map(|dimensions| dimensions.as_slice())
            .map_err(Error::clone)
    }

    /// Unpadded dimensions of this [`Buffer`]. For buffers with dynamic dimensions, these are the dimensions of the
    /// data that is actually stored, while [`Buffer::dimensions`] returns the padded upper bounds.
    pub fn unpadded_dimensions(&self) -> Result<&[u64], Error> {
        self.unpadded_dimensions
            .get_or_init(|| {
                use ffi::AXR_Buffer_UnpaddedDimensions_Args;
                invoke_plugin_api_error_fn!(
                    self.api(),
                    AXR_Buffer_UnpaddedDimensions,
                    { buffer = self.to_c_api() },
                    { unpadded_dimensions, num_dimensions },
                )
                .map(|(dimensions, num_dimensions)| {
                    unsafe { slice_from_c_api(dimensions, num_dimensions) }
                        .iter()
                        .map(|&dimension| dimension as u64)
                        .collect()
                })
            })
            .as_ref()
            .map(|dimensions| dimensions.as_slice())
            .map_err(Error::clone)
    }

    /// Indices of the dimensions of this [`Buffer`] that are dynamically sized.
    pub fn dynamic_dimension_indices(&self) -> Result<&[usize], Error> {
        self.dynamic_dimension_indices
            .get_or_init(|| {
                use ffi::AXR_Buffer_DynamicDimensionIndices_Args;
                invoke_plugin_api_error_fn!(
                    self.api(),
                    AXR_Buffer_DynamicDimensionIndices,
                    { buffer = self.to_c_api() },
                    { dynamic_dimension_indices, num_dynamic_dimensions },
                )
                .map(|(indices, num_indices)| unsafe { slice_from_c_api(indices, num_indices) }.to_vec())
            })
            .as_ref()
            .map(|indices| indices.as_slice())
            .map_err(Error::clone)
    }

    /// Memory [`Layout`] of this [`Buffer`].
    pub fn layout(&self) -> Result<Layout, Error> {
        self.layout
            .get_or_init(|| {
                // The layout out-parameter contains a union and so this invocation cannot be expressed using
                // [`invoke_plugin_api_error_fn!`], which requires a complete `_Args::new` constructor. The same
                // availability checks are performed by hand instead.
                unsafe {
                    let api_handle = self.api().to_c_api();
                    let api_fn_offset = std::mem::offset_of!(crate::ffi::AXR_Api, AXR_Buffer_Layout);
                    if (*api_handle).struct_size <= api_fn_offset {
                        return Err(Error::unimplemented(format!(
                            "`AXR_Buffer_Layout` is not available in the loaded plugin (version {})",
                            self.api().version(),
                        )));
                    }
                    let api_fn = (*api_handle).AXR_Buffer_Layout.ok_or_else(|| {
                        Error::unimplemented(format!(
                            "`AXR_Buffer_Layout` is not implemented in the loaded plugin (version {})",
                            self.api().version(),
                        ))
                    })?;
                    let mut uninit_args = MaybeUninit::<ffi::AXR_Buffer_Layout_Args>::uninit();
                    let args = uninit_args.as_mut_ptr();
                    std::ptr::addr_of_mut!((*args).struct_size).write(size_of::<ffi::AXR_Buffer_Layout_Args>());
                    std::ptr::addr_of_mut!((*args).extension_start).write(std::ptr::null_mut());
                    std::ptr::addr_of_mut!((*args).buffer).write(self.to_c_api());
                    let error = api_fn(args as *mut _);
                    if error.is_null() {
                        let args = uninit_args.assume_init();
                        Layout::from_c_api(&args.layout)
                    } else {
                        match Error::from_c_api(error, self.api()) {
                            Ok(None) => {
                                let args = uninit_args.assume_init();
                                Layout::from_c_api(&args.layout)
                            }
                            Ok(Some(error)) => Err(error),
                            Err(error) => Err(error),
                        }
                    }
                }
            })
            .clone()
    }

    /// Returns the number of bytes that this [`Buffer`] occupies in the underlying [`Memory`].
    pub fn on_device_size_in_bytes(&self) -> Result<usize, Error> {
        use ffi::AXR_Buffer_OnDeviceSizeInBytes_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Buffer_OnDeviceSizeInBytes, { buffer = self.to_c_api() }, {
            on_device_size_in_bytes
        })
    }

    /// Returns the [`Device`] on which this [`Buffer`] resides.
    pub fn device(&self) -> Result<Device<'c>, Error> {
        use ffi::AXR_Buffer_Device_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Buffer_Device, { buffer = self.to_c_api() }, { device })
            .and_then(|handle| unsafe { Device::from_c_api(handle, self.client) })
    }

    /// Returns the [`Memory`] on which this [`Buffer`] resides.
    pub fn memory(&self) -> Result<Memory<'c>, Error> {
        use ffi::AXR_Buffer_Memory_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Buffer_Memory, { buffer = self.to_c_api() }, { memory })
            .and_then(|handle| unsafe { Memory::from_c_api(handle, self.client) })
    }

    /// Returns `true` if and only if this [`Buffer`] resides on the host CPU.
    pub fn is_on_cpu(&self) -> Result<bool, Error> {
        use ffi::AXR_Buffer_IsOnCpu_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Buffer_IsOnCpu, { buffer = self.to_c_api() }, { is_on_cpu })
    }

    /// Returns a [`SharedEventFuture`] that resolves when the data in this [`Buffer`] becomes ready (i.e., after
    /// the asynchronous operation that populates it completes), or when an error occurs.
    ///
    /// This function is idempotent: the first call creates the plugin-side readiness event and registers a single
    /// completion callback for it, and every call (including calls made after the buffer has become ready) returns
    /// a future that resolves to the same terminal status.
    pub fn ready(&self) -> Result<SharedEventFuture, Error> {
        self.ready
            .get_or_init(|| {
                use ffi::AXR_Buffer_ReadyEvent_Args;
                invoke_plugin_api_error_fn!(self.api(), AXR_Buffer_ReadyEvent, { buffer = self.to_c_api() }, { event })
                    .and_then(|handle| unsafe { Event::from_c_api(handle, self.api(), ()) })
                    .and_then(SharedEvent::new)
            })
            .as_ref()
            .map(SharedEvent::future)
            .map_err(Error::clone)
    }

    /// Copies the underlying data of this [`Buffer`] into a [`Vec`] that is allocated on host memory, with the
    /// provided optional [`Layout`]. This is similar to [`Self::to_host_buffer`], except that it allocates a buffer
    /// for the result instead of taking in a reference to a pre-allocated buffer. The required size is negotiated
    /// with the plugin first by passing a null destination pointer.
    pub fn to_host(&self, layout: Option<Layout>) -> Result<Event<Vec<u8>>, Error> {
        use ffi::AXR_Buffer_ToHost_Args;
        let mut layout_handle = layout.as_ref().map(|layout| unsafe { layout.to_c_api() });
        let layout_handle = layout_handle.as_mut().map(|layout| layout as *mut _).unwrap_or(std::ptr::null_mut());

        // Invoke `AXR_Buffer_ToHost` with `dst` set to a null pointer to get the required `dst_size`.
        let size = invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Buffer_ToHost,
            {
                src = self.to_c_api(),
                host_layout = layout_handle,
                dst = std::ptr::null_mut(),
                dst_size = 0,
            },
            { dst_size },
        )?;

        // Allocate a buffer with the appropriate size and invoke `AXR_Buffer_ToHost` again, passing that buffer.
        let mut buffer = Vec::new();
        buffer.reserve_exact(size);
        unsafe { buffer.set_len(size) };
        let buffer_slice = &mut buffer.as_mut_slice();
        let event = self.to_host_buffer(layout, buffer_slice)?;
        let event_handle = unsafe { event.to_c_api() };
        std::mem::forget(event);

        // Return an `Event` with `buffer` as its output.
        unsafe { Event::from_c_api(event_handle, self.api(), buffer) }
    }

    /// Copies the underlying data of this [`Buffer`] into a buffer that is allocated on host memory, with the
    /// provided optional [`Layout`]. If no layout is provided, then the resulting data will have the same layout
    /// as this [`Buffer`].
    ///
    /// Note that this copy is an asynchronous (i.e., non-blocking) operation and this [`Buffer`] will be kept alive
    /// for the duration of this operation. If the buffer is dropped while the copy is still taking place, the
    /// underlying memory will not be freed by the plugin until the copy is completed.
    pub fn to_host_buffer<'b, B: AsMut<[u8]>>(
        &self,
        layout: Option<Layout>,
        buffer: &'b mut B,
    ) -> Result<Event<&'b mut B>, Error> {
        use ffi::AXR_Buffer_ToHost_Args;
        let mut layout_handle = layout.as_ref().map(|layout| unsafe { layout.to_c_api() });
        let layout_handle = layout_handle.as_mut().map(|layout| layout as *mut _).unwrap_or(std::ptr::null_mut());
        invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Buffer_ToHost,
            {
                src = self.to_c_api(),
                host_layout = layout_handle,
                dst = buffer.as_mut() as *mut _ as *mut _,
                dst_size = buffer.as_mut().len(),
            },
            { event },
        )
        .and_then(|handle| unsafe { Event::from_c_api(handle, self.api(), buffer) })
    }

    /// Copies this [`Buffer`] to the provided [`Memory`].
    ///
    /// If the provided [`Memory`] belongs to the same [`Client`] as this [`Buffer`], the copy is performed directly
    /// by the plugin. Otherwise, the data is first materialized on the host (blocking the current thread until the
    /// bytes have landed) and then ingested on the destination client with zero-copy semantics, with the
    /// intermediate host bytes freed once the destination plugin is done with them.
    ///
    /// Note that this is an asynchronous (i.e., non-blocking) copy operation on the destination side and the
    /// resulting [`Buffer`] may not be ready for use by downstream operations immediately.
    pub fn copy_to_memory<'d>(&self, memory: Memory<'d>) -> Result<Buffer<'d>, Error> {
        if unsafe { self.client.to_c_api() == memory.client().to_c_api() } {
            use ffi::AXR_Buffer_CopyToMemory_Args;
            invoke_plugin_api_error_fn!(
                self.api(),
                AXR_Buffer_CopyToMemory,
                {
                    buffer = self.to_c_api(),
                    dst_memory = memory.to_c_api(),
                },
                { dst_buffer },
            )
            .and_then(|handle| unsafe { Buffer::from_c_api(handle, memory.client()) })
        } else {
            self.copy_through_host(memory)
        }
    }

    /// Copies this [`Buffer`] to the provided [`Device`].
    ///
    /// If the provided [`Device`] belongs to the same [`Client`] as this [`Buffer`], the copy is performed directly
    /// by the plugin. Otherwise, the data is routed through the host and ingested on the destination client, placed
    /// on the destination device's default [`Memory`]. Refer to [`Buffer::copy_to_memory`] for more information on
    /// the cross-client path.
    pub fn copy_to_device<'d>(&self, device: Device<'d>) -> Result<Buffer<'d>, Error> {
        if unsafe { self.client.to_c_api() == device.client().to_c_api() } {
            use ffi::AXR_Buffer_CopyToDevice_Args;
            invoke_plugin_api_error_fn!(
                self.api(),
                AXR_Buffer_CopyToDevice,
                {
                    buffer = self.to_c_api(),
                    dst_device = device.to_c_api(),
                },
                { dst_buffer },
            )
            .and_then(|handle| unsafe { Buffer::from_c_api(handle, device.client()) })
        } else {
            self.copy_through_host(device.default_memory()?)
        }
    }

    /// Copies this [`Buffer`] to the provided [`Memory`] of another [`Client`] by materializing the data on the
    /// host and then ingesting it on the destination client with zero-copy semantics. The intermediate host bytes
    /// are freed by the "done with host buffer" callback once the destination plugin no longer needs them.
    fn copy_through_host<'d>(&self, memory: Memory<'d>) -> Result<Buffer<'d>, Error> {
        /// Internal [`HostBuffer`] wrapper that owns the intermediate host bytes of a cross-client copy and hands
        /// them to the destination plugin with zero-copy semantics. [`HostBuffer::data`] moves the bytes into the
        /// returned [`HostBufferData::drop_fn`] closure so that they are freed exactly when the destination plugin
        /// is done with them (or when this wrapper is dropped if ingestion fails before reaching that point).
        struct TransferredHostBuffer {
            /// Pointer to the intermediate host bytes, passed to the destination plugin as the host buffer data.
            ptr: *const std::ffi::c_void,

            /// Intermediate host bytes, moved into the release closure by [`HostBuffer::data`].
            bytes: UnsafeCell<Option<Vec<u8>>>,
        }

        impl HostBuffer for TransferredHostBuffer {
            fn host_buffer_semantics() -> HostBufferSemantics {
                HostBufferSemantics::ImmutableZeroCopy
            }

            unsafe fn data(&self) -> HostBufferData {
                let bytes = unsafe { &mut *self.bytes.get() }
                    .take()
                    .expect("`TransferredHostBuffer::data()` must only be called exactly once");
                HostBufferData { ptr: self.ptr, drop_fn: Some(Box::new(move || drop(bytes))) }
            }
        }

        let element_type = self.element_type()?;
        let dimensions = self.dimensions()?.to_vec();
        let layout = self.layout().ok();
        let bytes = self.to_host(None)?.wait()?;
        let ptr = bytes.as_ptr() as *const std::ffi::c_void;
        memory.client().buffer_from_host(
            TransferredHostBuffer { ptr, bytes: UnsafeCell::new(Some(bytes)) },
            element_type,
            dimensions,
            None,
            memory,
            layout,
        )
    }

    /// Registers an external reference to this [`Buffer`] and returns an [`ExternalReference`] guard for it. While
    /// at least one external reference is alive, the plugin will not delete or move the underlying buffer data, and
    /// the device memory pointer exposed by the guard remains valid. The reference is released when the guard is
    /// dropped.
    pub fn external_reference(&'_ self) -> Result<ExternalReference<'_, 'c>, Error> {
        use ffi::AXR_Buffer_IncreaseExternalReferenceCount_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Buffer_IncreaseExternalReferenceCount, {
            buffer = self.to_c_api()
        })?;

        use ffi::AXR_Buffer_DeviceMemoryPointer_Args;
        let ptr = invoke_plugin_api_error_fn!(self.api(), AXR_Buffer_DeviceMemoryPointer, { buffer = self.to_c_api() }, {
            device_memory_ptr
        });

        match ptr {
            Ok(ptr) => Ok(ExternalReference { buffer: self, ptr }),
            Err(error) => {
                // Release the reference that was registered above so that a failed pointer fetch does not pin the
                // buffer forever.
                use ffi::AXR_Buffer_DecreaseExternalReferenceCount_Args;
                invoke_plugin_api_error_fn!(self.api(), AXR_Buffer_DecreaseExternalReferenceCount, {
                    buffer = self.to_c_api()
                })?;
                Err(error)
            }
        }
    }

    /// Returns `true` if and only if this [`Buffer`] has been deleted using [`Buffer::delete`].
    pub fn is_deleted(&self) -> Result<bool, Error> {
        use ffi::AXR_Buffer_IsDeleted_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Buffer_IsDeleted, { buffer = self.to_c_api() }, { is_deleted })
    }

    /// Drops this [`Buffer`]'s reference to its associated device memory without dropping this [`Buffer`] instance
    /// itself. After this function is called, this buffer should only be used as a placeholder. The underlying
    /// device memory will be freed when all asynchronous operations using the buffer have completed according to
    /// the allocation semantics of the underlying platform.
    ///
    /// # Safety
    ///
    /// This function is marked as unsafe because it results in eagerly deallocating the underlying memory before
    /// the [`Buffer`] instance is dropped, making it unsafe to use. Only [`Buffer::is_deleted`] is considered safe
    /// to call on this [`Buffer`] after this function has been called.
    pub unsafe fn delete(&self) -> Result<(), Error> {
        use ffi::AXR_Buffer_Delete_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Buffer_Delete, { buffer = self.to_c_api() })
    }
}

impl Drop for Buffer<'_> {
    fn drop(&mut self) {
        use ffi::AXR_Buffer_Destroy_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Buffer_Destroy, { buffer = self.to_c_api() })
            .expect("failed to destroy plugin buffer");
    }
}

/// Guard representing a registered external reference to a [`Buffer`]. While this guard is alive, the plugin will
/// not delete or move the underlying buffer data, and the device memory pointer returned by
/// [`ExternalReference::as_ptr`] remains valid. The reference is released when this guard is dropped.
pub struct ExternalReference<'b, 'c> {
    /// [`Buffer`] that this [`ExternalReference`] pins.
    buffer: &'b Buffer<'c>,

    /// Raw device memory pointer of the pinned [`Buffer`].
    ptr: *mut std::ffi::c_void,
}

impl ExternalReference<'_, '_> {
    /// Returns the _opaque_ device memory data pointer of the pinned [`Buffer`], meaning that it is a handle that
    /// the specific device backend understands. Generally, you are not supposed to dereference this pointer
    /// directly in Rust; instead you are typically expected to pass it to another library that knows how to use it
    /// (e.g., for interoperability with other frameworks).
    pub fn as_ptr(&self) -> *mut std::ffi::c_void {
        self.ptr
    }
}

impl Drop for ExternalReference<'_, '_> {
    fn drop(&mut self) {
        use ffi::AXR_Buffer_DecreaseExternalReferenceCount_Args;
        invoke_plugin_api_error_fn!(self.buffer.api(), AXR_Buffer_DecreaseExternalReferenceCount, {
            buffer = self.buffer.to_c_api()
        })
        .expect("failed to release plugin buffer external reference");
    }
}

/// Represents the assumptions that a backend [`Plugin`](crate::Plugin) can make about a host buffer that is
/// provided to it via the [`Client::buffer_from_host`] function (i.e., how it is allowed to treat the memory that
/// is handed to it). Specifically, it dictates whether the plugin needs to make an immediate copy of the provided
/// data or whether it can borrow it without copying.
pub enum HostBufferSemantics {
    /// The plugin may not hold references to the provided data after the call to [`Client::buffer_from_host`]
    /// returns. The caller promises to not mutate or free the provided data **only** for the duration of the
    /// [`Client::buffer_from_host`] invocation.
    ImmutableOnlyDuringCall,

    /// The plugin may hold references to the provided data after the call to [`Client::buffer_from_host`] returns,
    /// while it completes a transfer of the data to the target [`Memory`]. The caller promises to not mutate or
    /// free the provided data until the transfer completes (i.e., until the "done with host buffer" event fires).
    ImmutableUntilTransferCompletes,

    /// The [`Buffer`] returned by [`Client::buffer_from_host`] may alias the provided data internally, and the
    /// plugin may use that data as long as the [`Buffer`] is alive. The plugin promises to not mutate the contents
    /// of the buffer. The caller promises to keep the data alive and to not mutate it as long as the [`Buffer`] is
    /// alive.
    ImmutableZeroCopy,

    /// The [`Buffer`] returned by [`Client::buffer_from_host`] may alias the provided data internally, and the
    /// plugin is also allowed to mutate that data. This crate does not currently support these semantics and
    /// requests that use them are rejected with [`Error::Unimplemented`] before any data is handed to the plugin.
    MutableZeroCopy,
}

impl HostBufferSemantics {
    /// Returns the [`AXR_HostBufferSemantics`](ffi::AXR_HostBufferSemantics) that corresponds to this
    /// [`HostBufferSemantics`] instance and which can be passed to functions in the plugin ABI.
    unsafe fn to_c_api(&self) -> ffi::AXR_HostBufferSemantics {
        match self {
            Self::ImmutableOnlyDuringCall => ffi::AXR_HostBufferSemantics_ImmutableOnlyDuringCall,
            Self::ImmutableUntilTransferCompletes => ffi::AXR_HostBufferSemantics_ImmutableUntilTransferCompletes,
            Self::ImmutableZeroCopy => ffi::AXR_HostBufferSemantics_ImmutableZeroCopy,
            Self::MutableZeroCopy => ffi::AXR_HostBufferSemantics_MutableZeroCopy,
        }
    }
}

/// Contains a pointer to the data contained in a host buffer (which can be passed to [`Client::buffer_from_host`]
/// to construct a plugin buffer from that data), along with an optional function to free that data once the plugin
/// is done using it.
pub struct HostBufferData {
    /// Pointer to the underlying host buffer data. This pointer will be passed to the plugin ABI and must remain
    /// valid for the duration specified by the buffer's [`HostBufferSemantics`].
    pub(crate) ptr: *const std::ffi::c_void,

    /// Optional callback that will be called when the plugin is done with the host buffer to drop it (or reduce
    /// its reference count if it is wrapped in an [`Rc`]).
    pub(crate) drop_fn: Option<Box<dyn FnOnce()>>,
}

impl HostBufferData {
    /// Constructs a new [`HostBufferData`] instance for the provided buffer.
    pub(crate) fn from_host_buffer<B: AsRef<[u8]>>(buffer: B) -> Self {
        let buffer = buffer.as_ref();
        Self { ptr: buffer.as_ptr() as *const std::ffi::c_void, drop_fn: None }
    }

    /// Constructs a new [`HostBufferData`] instance for the provided buffer reference. If `mutable` is `true`, then
    /// the resulting [`HostBufferData`] will hold a mutable reference to the underlying host buffer data until its
    /// `drop_fn` is invoked by the plugin. If `mutable` is `false`, then it will hold an immutable reference to the
    /// underlying host buffer data.
    pub(crate) fn from_host_buffer_rc_refcell<B: AsRef<[u8]>>(buffer: &Rc<RefCell<B>>, mutable: bool) -> Self {
        let buffer_clone_raw = Rc::into_raw(buffer.clone()) as *const RefCell<()>;
        let ptr = {
            let buffer = buffer.borrow();
            let buffer = buffer.as_ref();
            buffer.as_ptr() as *const std::ffi::c_void
        };

        // Construct the data that will be captured by the `drop_fn` closure that the plugin will invoke once it is
        // done using the host buffer. The data is a [`Box`]ed [`HostBufferReference`] that holds a borrow guard for
        // the host buffer data reference (which is transmuted to a type with a `'static` lifetime so that we can
        // [`Box`] it; this is safe in this case because the backing storage is guaranteed to be kept alive for the
        // duration of this guard via `buffer_clone_raw`) and a raw pointer representing the [`Rc`] that owns the
        // host buffer data and which will be used to decrease its reference count once the plugin is done using
        // the host buffer data.
        let data = unsafe {
            Box::into_raw(Box::new(HostBufferReference {
                ptr: buffer_clone_raw,
                guard: if mutable {
                    HostBufferReferenceGuard::Mutable(std::mem::transmute::<RefMut<'_, ()>, RefMut<'_, ()>>(
                        (*buffer_clone_raw).borrow_mut(),
                    ))
                } else {
                    HostBufferReferenceGuard::Immutable(std::mem::transmute::<Ref<'_, ()>, Ref<'_, ()>>(
                        (*buffer_clone_raw).borrow(),
                    ))
                },
            })) as *const std::ffi::c_void
        };

        Self {
            ptr,
            drop_fn: Some(Box::new(move || unsafe {
                // First, `drop` the reference guard to make sure that runtime borrow checking rules are followed
                // appropriately (and that the subsequent drop of the [`Rc`] does not fail). Then, drop the [`Rc`]
                // that owns the host buffer data, therefore decreasing its reference count. Note that we need to
                // use `std::hint::black_box` here to prevent Dead Code Elimination (DCE) in the Rust compiler from
                // removing these calls.
                let data = Box::from_raw(data as *mut HostBufferReference);
                drop(std::hint::black_box(data.guard));
                drop(std::hint::black_box(Rc::from_raw(data.ptr)))
            })),
        }
    }
}

/// Internal helper for holding a reference to a host buffer that needs to be kept alive until the plugin is done
/// with it along with a [`HostBufferReferenceGuard`] for it. This is captured by a [`HostBufferData::drop_fn`]
/// closure such that it can be dropped once the plugin is done using the host buffer.
struct HostBufferReference {
    /// Raw pointer to the [`Rc`] that owns the host buffer data and that can be used to decrease its reference
    /// count once the plugin is done using the host buffer data.
    ptr: *const RefCell<()>,

    /// Reference guard for the host buffer data that makes sure that Rust borrow checking rules are followed at
    /// runtime using a [`RefCell`] for the host buffer data.
    guard: HostBufferReferenceGuard,
}

/// Internal helper guard for references to host buffer data that need to be held until the plugin is done with
/// them. This is an enum because we need to handle immutable and mutable host buffer borrows differently
/// (i.e., with different guards).
enum HostBufferReferenceGuard {
    /// Immutable reference guard. Note that the `'static` lifetime is fake but needed so that we can [`Box`] it.
    /// We never actually use this guard other than dropping it in a [`HostBufferData::drop_fn`] implementation,
    /// and so we need the `#[allow(dead_code)]` to disable a warning.
    #[allow(dead_code)]
    Immutable(Ref<'static, ()>),

    /// Mutable reference guard. Note that the `'static` lifetime is fake but needed so that we can [`Box`] it.
    /// We never actually use this guard other than dropping it in a [`HostBufferData::drop_fn`] implementation,
    /// and so we need the `#[allow(dead_code)]` to disable a warning.
    #[allow(dead_code)]
    Mutable(RefMut<'static, ()>),
}

/// Represents a host buffer that can be transferred to a [`Memory`] via [`Client::buffer_from_host`] to construct
/// a plugin [`Buffer`] with the same underlying data.
pub trait HostBuffer {
    /// [`HostBufferSemantics`] that the plugin should use when handling this host buffer.
    fn host_buffer_semantics() -> HostBufferSemantics;

    /// [`HostBufferData`] that corresponds to this host buffer. The returned data structure may capture `self`,
    /// allowing cleanup callbacks to hold owned data for the duration of the data transfer.
    unsafe fn data(&self) -> HostBufferData;
}

impl HostBuffer for &[u8] {
    fn host_buffer_semantics() -> HostBufferSemantics {
        HostBufferSemantics::ImmutableOnlyDuringCall
    }

    unsafe fn data(&self) -> HostBufferData {
        HostBufferData::from_host_buffer(self)
    }
}

impl HostBuffer for Vec<u8> {
    fn host_buffer_semantics() -> HostBufferSemantics {
        HostBufferSemantics::ImmutableOnlyDuringCall
    }

    unsafe fn data(&self) -> HostBufferData {
        HostBufferData::from_host_buffer(self)
    }
}

impl<const N: usize> HostBuffer for &[u8; N] {
    fn host_buffer_semantics() -> HostBufferSemantics {
        HostBufferSemantics::ImmutableOnlyDuringCall
    }

    unsafe fn data(&self) -> HostBufferData {
        HostBufferData::from_host_buffer(self)
    }
}

impl HostBuffer for Rc<RefCell<&[u8]>> {
    fn host_buffer_semantics() -> HostBufferSemantics {
        HostBufferSemantics::ImmutableUntilTransferCompletes
    }

    unsafe fn data(&self) -> HostBufferData {
        HostBufferData::from_host_buffer_rc_refcell(self, false)
    }
}

impl Client {
    /// Creates a new [`Buffer`] by asynchronously transferring data from a host buffer to a [`Memory`].
    ///
    /// The behavior of this function depends on the [`HostBufferSemantics`] specified by the `data` type. Those
    /// semantics determine how long `data` needs to stay alive. Note that
    /// [`HostBufferSemantics::MutableZeroCopy`] is rejected with [`Error::Unimplemented`] before any data is
    /// handed to the plugin.
    ///
    /// Note that the resulting [`Buffer`] may not be ready when this function returns (as it performs an
    /// asynchronous data transfer under the hood). To get a [`Future`](std::future::Future) for when the resulting
    /// [`Buffer`] becomes ready, use the [`Buffer::ready`] function.
    ///
    /// # Parameters
    ///
    ///   - `data`: Host buffer containing the data to transfer. `element_type` and `dimensions` determine the size
    ///     that this buffer should have.
    ///   - `element_type`: [`BufferType`] of the elements in the new [`Buffer`].
    ///   - `dimensions`: Dimensions (i.e., shape) of the new [`Buffer`].
    ///   - `byte_strides`: Optional byte strides for each dimension of `data`. If [`None`], the array is assumed
    ///     to have a dense layout with dimensions in major-to-minor order. Note that strides can be negative, in
    ///     which case the data pointer may need to point to the interior of the buffer.
    ///   - `memory`: [`Memory`] on which to place the new [`Buffer`].
    ///   - `device_layout`: Optional memory [`Layout`] for the resulting [`Buffer`]. If [`None`], a dense layout
    ///     with dimensions in major-to-minor order is assumed.
    pub fn buffer_from_host<'c, B: HostBuffer, D: AsRef<[u64]>>(
        &'c self,
        data: B,
        element_type: BufferType,
        dimensions: D,
        byte_strides: Option<&'_ [i64]>,
        memory: Memory<'_>,
        device_layout: Option<Layout>,
    ) -> Result<Buffer<'c>, Error> {
        use ffi::AXR_Client_BufferFromHost_Args;

        // Gate the requested semantics before touching `data` or the plugin, so that an unsupported request
        // results in no partial ingestion.
        let semantics = match B::host_buffer_semantics() {
            HostBufferSemantics::MutableZeroCopy => {
                return Err(Error::unimplemented(
                    "mutable zero-copy host buffer semantics are not supported by this crate",
                ));
            }
            semantics => unsafe { semantics.to_c_api() },
        };

        let data = unsafe { data.data() };
        let dimensions = dimensions.as_ref().iter().map(|&dimension| dimension as i64).collect::<Vec<_>>();
        let device_layout_value = device_layout.as_ref().map(|layout| unsafe { layout.to_c_api() });
        let device_layout_handle = device_layout_value
            .as_ref()
            .map(|layout| layout as *const _ as *mut _)
            .unwrap_or(std::ptr::null_mut());
        let (buffer_handle, done_event_handle) = invoke_plugin_api_error_fn!(
            self.api(),
            AXR_Client_BufferFromHost,
            {
                client = self.to_c_api(),
                data = data.ptr,
                element_type = element_type.to_c_api(),
                dimensions = dimensions.as_ptr(),
                num_dimensions = dimensions.len(),
                byte_strides = byte_strides.map(|strides| strides.as_ptr()).unwrap_or(std::ptr::null()),
                num_byte_strides = byte_strides.map(|strides| strides.len()).unwrap_or(0),
                host_buffer_semantics = semantics,
                memory = memory.to_c_api(),
                device_layout = device_layout_handle,
            },
            { buffer, done_with_host_buffer },
        )?;
        let buffer = unsafe { Buffer::from_c_api(buffer_handle, self)? };
        let done_event = unsafe { Event::from_c_api(done_event_handle, self.api(), ()) };

        // Register a callback to drop the host buffer data after the transfer is completed. This fires exactly
        // once, whether the transfer succeeded or failed.
        if let Ok(done_event) = done_event
            && let Some(drop_fn) = data.drop_fn
        {
            done_event.on_ready(|_| {
                // We ignore the error because there is nothing we can do with it here,
                // and if something goes wrong, it should be reflected in [`Buffer::ready`].
                drop_fn();
            })?;
        }

        Ok(buffer)
    }

    /// Constructs an immutable [`Buffer`] whose underlying data is shared with the provided `data`. Refer to the
    /// documentation of [`Client::buffer_from_host`] for the meaning of the arguments of this function.
    ///
    /// Note that the plugin will hold an immutable reference to the underlying data until the resulting [`Buffer`]
    /// is dropped. If the target [`Memory`] is not host-addressable, the plugin will really only hold that
    /// reference until the data is copied to the target memory, creating an entirely new [`Buffer`] with no shared
    /// data.
    pub fn borrowed_buffer<'c, B: AsRef<[u8]>, D: AsRef<[u64]>>(
        &'c self,
        data: Rc<RefCell<B>>,
        element_type: BufferType,
        dimensions: D,
        byte_strides: Option<&'_ [i64]>,
        memory: Memory<'_>,
        device_layout: Option<Layout>,
    ) -> Result<Buffer<'c>, Error> {
        /// Internal helper that wraps an `Rc<RefCell<B>>` and provides a custom [`HostBuffer`] implementation for
        /// it that uses different [`HostBufferSemantics`] than its default implementation.
        struct BorrowedHostBuffer<B: AsRef<[u8]>> {
            data: Rc<RefCell<B>>,
        }

        impl<B: AsRef<[u8]>> HostBuffer for BorrowedHostBuffer<B> {
            fn host_buffer_semantics() -> HostBufferSemantics {
                HostBufferSemantics::ImmutableZeroCopy
            }

            unsafe fn data(&self) -> HostBufferData {
                HostBufferData::from_host_buffer_rc_refcell(&self.data, false)
            }
        }

        self.buffer_from_host(BorrowedHostBuffer { data }, element_type, dimensions, byte_strides, memory, device_layout)
    }

    /// Constructs a mutable [`Buffer`] whose underlying data would be shared with the provided `data`. Mutable
    /// zero-copy sharing is not currently supported by this crate and so this function always returns
    /// [`Error::Unimplemented`] without handing any data to the plugin. It exists so that callers porting code
    /// from runtimes that support mutable aliasing get a precise signal rather than silently corrupted sharing
    /// semantics.
    pub fn borrowed_mut_buffer<'c, B: AsRef<[u8]>, D: AsRef<[u64]>>(
        &'c self,
        data: Rc<RefCell<B>>,
        element_type: BufferType,
        dimensions: D,
        byte_strides: Option<&'_ [i64]>,
        memory: Memory<'_>,
        device_layout: Option<Layout>,
    ) -> Result<Buffer<'c>, Error> {
        /// Internal helper that wraps an `Rc<RefCell<B>>` and provides a custom [`HostBuffer`] implementation for
        /// it that uses different [`HostBufferSemantics`] than its default implementation.
        struct BorrowedMutHostBuffer<B: AsRef<[u8]>> {
            data: Rc<RefCell<B>>,
        }

        impl<B: AsRef<[u8]>> HostBuffer for BorrowedMutHostBuffer<B> {
            fn host_buffer_semantics() -> HostBufferSemantics {
                HostBufferSemantics::MutableZeroCopy
            }

            unsafe fn data(&self) -> HostBufferData {
                HostBufferData::from_host_buffer_rc_refcell(&self.data, true)
            }
        }

        self.buffer_from_host(
            BorrowedMutHostBuffer { data },
            element_type,
            dimensions,
            byte_strides,
            memory,
            device_layout,
        )
    }

    /// Returns the (platform-dependent) address of the provided [`Buffer`] that often matches the physical address
    /// of the buffer on the underlying [`Device`] (though it is not always guaranteed to match). The provided
    /// [`Buffer`] must be owned by this [`Client`]; passing a buffer owned by another client returns an
    /// [`Error::InvalidArgument`] naming both platforms, without the plugin ever being asked to resolve the
    /// pointer.
    ///
    /// This function is _unsafe_ because it bypasses the standard synchronization mechanisms of the plugin. For
    /// example, accessing the returned pointer does not guarantee that the underlying [`Device`] has finished
    /// writing to the buffer. It is meant to be used primarily for low-level debugging and profiling tools.
    pub unsafe fn unsafe_buffer_pointer(&self, buffer: &Buffer<'_>) -> Result<usize, Error> {
        if unsafe { buffer.client().to_c_api() != self.to_c_api() } {
            return Err(Error::invalid_argument(format!(
                "the provided buffer is owned by a client for platform '{}' \
                 and cannot be accessed through a client for platform '{}'",
                buffer.client().platform_name(),
                self.platform_name(),
            )));
        }
        use ffi::AXR_Buffer_UnsafePointer_Args;
        invoke_plugin_api_error_fn!(self.api(), AXR_Buffer_UnsafePointer, { buffer = buffer.to_c_api() }, {
            buffer_pointer
        })
    }
}

#[allow(dead_code, non_camel_case_types, non_snake_case, non_upper_case_globals)]
pub(crate) mod ffi {
    use std::marker::{PhantomData, PhantomPinned};

    use crate::clients::ffi::AXR_Client;
    use crate::devices::ffi::AXR_Device;
    use crate::errors::ffi::AXR_Error;
    use crate::events::ffi::AXR_Event;
    use crate::ffi::AXR_Extension_Base;
    use crate::memories::ffi::AXR_Memory;

    // We represent opaque C types as structs with a particular structure that is following the convention
    // suggested in [the Rustonomicon](https://doc.rust-lang.org/nomicon/ffi.html#representing-opaque-structs).
    #[repr(C)]
    pub struct AXR_Buffer {
        _data: [u8; 0],
        _marker: PhantomData<(*mut u8, PhantomPinned)>,
    }

    pub type AXR_Buffer_Type = std::ffi::c_uint;
    pub const AXR_Buffer_Type_Invalid: AXR_Buffer_Type = 0;
    pub const AXR_Buffer_Type_Token: AXR_Buffer_Type = 1;
    pub const AXR_Buffer_Type_Pred: AXR_Buffer_Type = 2;
    pub const AXR_Buffer_Type_I8: AXR_Buffer_Type = 3;
    pub const AXR_Buffer_Type_I16: AXR_Buffer_Type = 4;
    pub const AXR_Buffer_Type_I32: AXR_Buffer_Type = 5;
    pub const AXR_Buffer_Type_I64: AXR_Buffer_Type = 6;
    pub const AXR_Buffer_Type_U8: AXR_Buffer_Type = 7;
    pub const AXR_Buffer_Type_U16: AXR_Buffer_Type = 8;
    pub const AXR_Buffer_Type_U32: AXR_Buffer_Type = 9;
    pub const AXR_Buffer_Type_U64: AXR_Buffer_Type = 10;
    pub const AXR_Buffer_Type_F16: AXR_Buffer_Type = 11;
    pub const AXR_Buffer_Type_BF16: AXR_Buffer_Type = 12;
    pub const AXR_Buffer_Type_F32: AXR_Buffer_Type = 13;
    pub const AXR_Buffer_Type_F64: AXR_Buffer_Type = 14;
    pub const AXR_Buffer_Type_C64: AXR_Buffer_Type = 15;
    pub const AXR_Buffer_Type_C128: AXR_Buffer_Type = 16;

    pub type AXR_Buffer_MemoryLayout_Type = std::ffi::c_uint;
    pub const AXR_Buffer_MemoryLayout_Type_Tiled: AXR_Buffer_MemoryLayout_Type = 0;
    pub const AXR_Buffer_MemoryLayout_Type_Strides: AXR_Buffer_MemoryLayout_Type = 1;

    #[repr(C)]
    #[derive(Copy, Clone)]
    pub struct AXR_Buffer_MemoryLayout_Tiled {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub minor_to_major: *const i64,
        pub minor_to_major_size: usize,
        pub tile_dimensions: *const i64,
        pub tile_dimension_sizes: *const usize,
        pub num_tiles: usize,
    }

    impl AXR_Buffer_MemoryLayout_Tiled {
        pub fn new(
            minor_to_major: *const i64,
            minor_to_major_size: usize,
            tile_dimensions: *const i64,
            tile_dimension_sizes: *const usize,
            num_tiles: usize,
        ) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                minor_to_major,
                minor_to_major_size,
                tile_dimensions,
                tile_dimension_sizes,
                num_tiles,
            }
        }
    }

    #[repr(C)]
    #[derive(Copy, Clone)]
    pub struct AXR_Buffer_MemoryLayout_Strides {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub byte_strides: *const i64,
        pub num_byte_strides: usize,
    }

    impl AXR_Buffer_MemoryLayout_Strides {
        pub fn new(byte_strides: *const i64, num_byte_strides: usize) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), byte_strides, num_byte_strides }
        }
    }

    #[repr(C)]
    pub union AXR_Buffer_MemoryLayout_Value {
        pub tiled: AXR_Buffer_MemoryLayout_Tiled,
        pub strides: AXR_Buffer_MemoryLayout_Strides,
    }

    #[repr(C)]
    pub struct AXR_Buffer_MemoryLayout {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub layout: AXR_Buffer_MemoryLayout_Value,
        pub layout_type: AXR_Buffer_MemoryLayout_Type,
    }

    impl AXR_Buffer_MemoryLayout {
        pub fn new(layout: AXR_Buffer_MemoryLayout_Value, layout_type: AXR_Buffer_MemoryLayout_Type) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), layout, layout_type }
        }
    }

    #[repr(C)]
    pub struct AXR_Buffer_ElementType_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub buffer: *mut AXR_Buffer,
        pub element_type: AXR_Buffer_Type,
    }

    impl AXR_Buffer_ElementType_Args {
        pub fn new(buffer: *mut AXR_Buffer) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), buffer, element_type: 0 }
        }
    }

    pub type AXR_Buffer_ElementType = unsafe extern "C" fn(args: *mut AXR_Buffer_ElementType_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Buffer_Dimensions_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub buffer: *mut AXR_Buffer,
        pub dimensions: *const i64,
        pub num_dimensions: usize,
    }

    impl AXR_Buffer_Dimensions_Args {
        pub fn new(buffer: *mut AXR_Buffer) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                buffer,
                dimensions: std::ptr::null(),
                num_dimensions: 0,
            }
        }
    }

    pub type AXR_Buffer_Dimensions = unsafe extern "C" fn(args: *mut AXR_Buffer_Dimensions_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Buffer_UnpaddedDimensions_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub buffer: *mut AXR_Buffer,
        pub unpadded_dimensions: *const i64,
        pub num_dimensions: usize,
    }

    impl AXR_Buffer_UnpaddedDimensions_Args {
        pub fn new(buffer: *mut AXR_Buffer) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                buffer,
                unpadded_dimensions: std::ptr::null(),
                num_dimensions: 0,
            }
        }
    }

    pub type AXR_Buffer_UnpaddedDimensions =
        unsafe extern "C" fn(args: *mut AXR_Buffer_UnpaddedDimensions_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Buffer_DynamicDimensionIndices_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub buffer: *mut AXR_Buffer,
        pub dynamic_dimension_indices: *const usize,
        pub num_dynamic_dimensions: usize,
    }

    impl AXR_Buffer_DynamicDimensionIndices_Args {
        pub fn new(buffer: *mut AXR_Buffer) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                buffer,
                dynamic_dimension_indices: std::ptr::null(),
                num_dynamic_dimensions: 0,
            }
        }
    }

    pub type AXR_Buffer_DynamicDimensionIndices =
        unsafe extern "C" fn(args: *mut AXR_Buffer_DynamicDimensionIndices_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Buffer_Layout_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub buffer: *mut AXR_Buffer,
        pub layout: AXR_Buffer_MemoryLayout,
    }

    pub type AXR_Buffer_Layout = unsafe extern "C" fn(args: *mut AXR_Buffer_Layout_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Buffer_OnDeviceSizeInBytes_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub buffer: *mut AXR_Buffer,
        pub on_device_size_in_bytes: usize,
    }

    impl AXR_Buffer_OnDeviceSizeInBytes_Args {
        pub fn new(buffer: *mut AXR_Buffer) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                buffer,
                on_device_size_in_bytes: 0,
            }
        }
    }

    pub type AXR_Buffer_OnDeviceSizeInBytes =
        unsafe extern "C" fn(args: *mut AXR_Buffer_OnDeviceSizeInBytes_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Buffer_Device_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub buffer: *mut AXR_Buffer,
        pub device: *mut AXR_Device,
    }

    impl AXR_Buffer_Device_Args {
        pub fn new(buffer: *mut AXR_Buffer) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                buffer,
                device: std::ptr::null_mut(),
            }
        }
    }

    pub type AXR_Buffer_Device = unsafe extern "C" fn(args: *mut AXR_Buffer_Device_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Buffer_Memory_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub buffer: *mut AXR_Buffer,
        pub memory: *mut AXR_Memory,
    }

    impl AXR_Buffer_Memory_Args {
        pub fn new(buffer: *mut AXR_Buffer) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                buffer,
                memory: std::ptr::null_mut(),
            }
        }
    }

    pub type AXR_Buffer_Memory = unsafe extern "C" fn(args: *mut AXR_Buffer_Memory_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Buffer_IsOnCpu_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub buffer: *mut AXR_Buffer,
        pub is_on_cpu: bool,
    }

    impl AXR_Buffer_IsOnCpu_Args {
        pub fn new(buffer: *mut AXR_Buffer) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), buffer, is_on_cpu: false }
        }
    }

    pub type AXR_Buffer_IsOnCpu = unsafe extern "C" fn(args: *mut AXR_Buffer_IsOnCpu_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Buffer_ReadyEvent_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub buffer: *mut AXR_Buffer,
        pub event: *mut AXR_Event,
    }

    impl AXR_Buffer_ReadyEvent_Args {
        pub fn new(buffer: *mut AXR_Buffer) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                buffer,
                event: std::ptr::null_mut(),
            }
        }
    }

    pub type AXR_Buffer_ReadyEvent = unsafe extern "C" fn(args: *mut AXR_Buffer_ReadyEvent_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Buffer_ToHost_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub src: *mut AXR_Buffer,
        pub host_layout: *mut AXR_Buffer_MemoryLayout,
        pub dst: *mut std::ffi::c_void,
        pub dst_size: usize,
        pub event: *mut AXR_Event,
    }

    impl AXR_Buffer_ToHost_Args {
        pub fn new(
            src: *mut AXR_Buffer,
            host_layout: *mut AXR_Buffer_MemoryLayout,
            dst: *mut std::ffi::c_void,
            dst_size: usize,
        ) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                src,
                host_layout,
                dst,
                dst_size,
                event: std::ptr::null_mut(),
            }
        }
    }

    pub type AXR_Buffer_ToHost = unsafe extern "C" fn(args: *mut AXR_Buffer_ToHost_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Buffer_CopyToMemory_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub buffer: *mut AXR_Buffer,
        pub dst_memory: *mut AXR_Memory,
        pub dst_buffer: *mut AXR_Buffer,
    }

    impl AXR_Buffer_CopyToMemory_Args {
        pub fn new(buffer: *mut AXR_Buffer, dst_memory: *mut AXR_Memory) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                buffer,
                dst_memory,
                dst_buffer: std::ptr::null_mut(),
            }
        }
    }

    pub type AXR_Buffer_CopyToMemory = unsafe extern "C" fn(args: *mut AXR_Buffer_CopyToMemory_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Buffer_CopyToDevice_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub buffer: *mut AXR_Buffer,
        pub dst_device: *mut AXR_Device,
        pub dst_buffer: *mut AXR_Buffer,
    }

    impl AXR_Buffer_CopyToDevice_Args {
        pub fn new(buffer: *mut AXR_Buffer, dst_device: *mut AXR_Device) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                buffer,
                dst_device,
                dst_buffer: std::ptr::null_mut(),
            }
        }
    }

    pub type AXR_Buffer_CopyToDevice = unsafe extern "C" fn(args: *mut AXR_Buffer_CopyToDevice_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Buffer_IncreaseExternalReferenceCount_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub buffer: *mut AXR_Buffer,
    }

    impl AXR_Buffer_IncreaseExternalReferenceCount_Args {
        pub fn new(buffer: *mut AXR_Buffer) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), buffer }
        }
    }

    pub type AXR_Buffer_IncreaseExternalReferenceCount =
        unsafe extern "C" fn(args: *mut AXR_Buffer_IncreaseExternalReferenceCount_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Buffer_DecreaseExternalReferenceCount_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub buffer: *mut AXR_Buffer,
    }

    impl AXR_Buffer_DecreaseExternalReferenceCount_Args {
        pub fn new(buffer: *mut AXR_Buffer) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), buffer }
        }
    }

    pub type AXR_Buffer_DecreaseExternalReferenceCount =
        unsafe extern "C" fn(args: *mut AXR_Buffer_DecreaseExternalReferenceCount_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Buffer_DeviceMemoryPointer_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub buffer: *mut AXR_Buffer,
        pub device_memory_ptr: *mut std::ffi::c_void,
    }

    impl AXR_Buffer_DeviceMemoryPointer_Args {
        pub fn new(buffer: *mut AXR_Buffer) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                buffer,
                device_memory_ptr: std::ptr::null_mut(),
            }
        }
    }

    pub type AXR_Buffer_DeviceMemoryPointer =
        unsafe extern "C" fn(args: *mut AXR_Buffer_DeviceMemoryPointer_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Buffer_UnsafePointer_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub buffer: *mut AXR_Buffer,
        pub buffer_pointer: usize,
    }

    impl AXR_Buffer_UnsafePointer_Args {
        pub fn new(buffer: *mut AXR_Buffer) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), buffer, buffer_pointer: 0 }
        }
    }

    pub type AXR_Buffer_UnsafePointer =
        unsafe extern "C" fn(args: *mut AXR_Buffer_UnsafePointer_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Buffer_IsDeleted_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub buffer: *mut AXR_Buffer,
        pub is_deleted: bool,
    }

    impl AXR_Buffer_IsDeleted_Args {
        pub fn new(buffer: *mut AXR_Buffer) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), buffer, is_deleted: false }
        }
    }

    pub type AXR_Buffer_IsDeleted = unsafe extern "C" fn(args: *mut AXR_Buffer_IsDeleted_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Buffer_Delete_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub buffer: *mut AXR_Buffer,
    }

    impl AXR_Buffer_Delete_Args {
        pub fn new(buffer: *mut AXR_Buffer) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), buffer }
        }
    }

    pub type AXR_Buffer_Delete = unsafe extern "C" fn(args: *mut AXR_Buffer_Delete_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Buffer_Destroy_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub buffer: *mut AXR_Buffer,
    }

    impl AXR_Buffer_Destroy_Args {
        pub fn new(buffer: *mut AXR_Buffer) -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut(), buffer }
        }
    }

    pub type AXR_Buffer_Destroy = unsafe extern "C" fn(args: *mut AXR_Buffer_Destroy_Args) -> *mut AXR_Error;

    pub type AXR_HostBufferSemantics = std::ffi::c_uint;
    pub const AXR_HostBufferSemantics_ImmutableOnlyDuringCall: AXR_HostBufferSemantics = 0;
    pub const AXR_HostBufferSemantics_ImmutableUntilTransferCompletes: AXR_HostBufferSemantics = 1;
    pub const AXR_HostBufferSemantics_ImmutableZeroCopy: AXR_HostBufferSemantics = 2;
    pub const AXR_HostBufferSemantics_MutableZeroCopy: AXR_HostBufferSemantics = 3;

    #[repr(C)]
    pub struct AXR_Client_BufferFromHost_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub client: *mut AXR_Client,
        pub data: *const std::ffi::c_void,
        pub element_type: AXR_Buffer_Type,
        pub dimensions: *const i64,
        pub num_dimensions: usize,
        pub byte_strides: *const i64,
        pub num_byte_strides: usize,
        pub host_buffer_semantics: AXR_HostBufferSemantics,
        pub memory: *mut AXR_Memory,
        pub device_layout: *mut AXR_Buffer_MemoryLayout,
        pub done_with_host_buffer: *mut AXR_Event,
        pub buffer: *mut AXR_Buffer,
    }

    impl AXR_Client_BufferFromHost_Args {
        #[allow(clippy::too_many_arguments)]
        pub fn new(
            client: *mut AXR_Client,
            data: *const std::ffi::c_void,
            element_type: AXR_Buffer_Type,
            dimensions: *const i64,
            num_dimensions: usize,
            byte_strides: *const i64,
            num_byte_strides: usize,
            host_buffer_semantics: AXR_HostBufferSemantics,
            memory: *mut AXR_Memory,
            device_layout: *mut AXR_Buffer_MemoryLayout,
        ) -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                client,
                data,
                element_type,
                dimensions,
                num_dimensions,
                byte_strides,
                num_byte_strides,
                host_buffer_semantics,
                memory,
                device_layout,
                done_with_host_buffer: std::ptr::null_mut(),
                buffer: std::ptr::null_mut(),
            }
        }
    }

    pub type AXR_Client_BufferFromHost =
        unsafe extern "C" fn(args: *mut AXR_Client_BufferFromHost_Args) -> *mut AXR_Error;
}
