use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, Once, OnceLock};

use libloading::Library;

use crate::{Api, Client, ClientOptions, Error, KeyValueStore, invoke_plugin_api_error_fn};

/// Loaded backend [`Plugin`] that can be used via its [`Plugin::api`].
#[derive(Clone)]
pub struct Plugin {
    /// Plugin [`Api`] for this [`Plugin`].
    api: Api,

    /// Shared [`Once`] used to initialize this [`Plugin`] exactly once, even if it is cloned.
    initialization: Arc<Once>,
}

impl Plugin {
    /// Constructs a new, not-yet-initialized [`Plugin`] from the provided [`Api`].
    pub(crate) fn new(api: Api) -> Self {
        Self { api, initialization: Arc::new(Once::new()) }
    }

    /// Returns the initialized [`Api`] for this [`Plugin`].
    ///
    /// # Panic
    ///
    /// Panics if the plugin's own initialization entry point fails because no coherent plugin state exists at that
    /// point that could be returned to the caller.
    pub(crate) fn api(&self) -> Api {
        self.initialization.call_once(|| {
            use ffi::AXR_Plugin_Initialize_Args;
            invoke_plugin_api_error_fn!(self.api, AXR_Plugin_Initialize).expect("plugin initialization failed");
        });
        self.api
    }

    /// Constructs a new [`Client`] using the provided (optional) platform-specific [`ClientOptions`].
    ///
    /// Note that the resulting [`Client`] will not have access to a [`KeyValueStore`] and thus will have no direct
    /// way to interact with other [`Client`]s. Refer to [`Plugin::client_with_key_value_store`] for more information.
    pub fn client(&self, options: ClientOptions) -> Result<Client, Error> {
        self.api().client(options)
    }

    /// Constructs a new [`Client`] using the provided (optional) platform-specific [`ClientOptions`] and
    /// [`KeyValueStore`]. The provided [`KeyValueStore`] must be accessible across multiple hosts and/or processes.
    /// Access to this [`KeyValueStore`] may be necessary to create certain kinds of multi-process or multi-host
    /// environments as it enables [`Client`]s (potentially on different machines) to communicate with each other.
    pub fn client_with_key_value_store<Store: KeyValueStore + 'static>(
        &self,
        options: ClientOptions,
        key_value_store: Store,
    ) -> Result<Client, Error> {
        self.api().client_with_key_value_store(options, key_value_store)
    }
}

/// Loaded shared [`Library`] that contains a backend [`Plugin`].
struct PluginLibrary {
    /// Shared [`Library`] that contains a backend [`Plugin`].
    library: Library,

    /// [`PathBuf`] pointing to the shared library file from which [`PluginLibrary::library`] was loaded.
    path: PathBuf,

    /// Cached loaded [`Plugin`] to avoid loading the same plugin multiple times.
    plugin: OnceLock<Result<Plugin, Error>>,
}

impl PluginLibrary {
    /// Loads the backend [`Plugin`] that is stored in this [`PluginLibrary`]. The underlying shared library must
    /// export a symbol called `GetAxrApi` with a function signature matching
    /// `unsafe extern "C" fn() -> *const AXR_Api`. This function loads that symbol at most once and then reuses it
    /// in future calls.
    fn load(&self) -> Result<Plugin, Error> {
        self.plugin
            .get_or_init(|| {
                let get_axr_api_function = unsafe {
                    self.library
                        .get::<unsafe extern "C" fn() -> *const crate::ffi::AXR_Api>(b"GetAxrApi")
                        .map_err(|error| Error::plugin_loading_error(format!("{:?}", self.path), error.to_string()))?
                };
                let api = unsafe { Api::from_c_api(get_axr_api_function()) }?;
                Ok(Plugin::new(api))
            })
            .clone()
    }
}

/// Internal helper struct used for managing backend [`Plugin`]s that are loaded from shared libraries at runtime.
struct PluginManager {
    /// Thread-safe [`HashMap`] mapping [`PathBuf`]s pointing to plugin shared libraries to the corresponding loaded
    /// [`PluginLibrary`] instances. Those instances can be used to load the underlying [`Plugin`]s.
    plugins: Arc<Mutex<HashMap<PathBuf, PluginLibrary>>>,
}

impl PluginManager {
    /// Loads a backend [`Plugin`] from the provided [`Path`] pointing to the shared library for that plugin.
    fn load_plugin(&self, library_path: &Path) -> Result<Plugin, Error> {
        let library_path = std::fs::canonicalize(library_path).unwrap_or_else(|_| library_path.to_path_buf());
        let mut plugins = self.plugins.lock().unwrap();
        match plugins.entry(library_path.clone()) {
            Entry::Occupied(entry) => entry.get().load(),
            Entry::Vacant(entry) => {
                let library = unsafe { Library::new(&library_path) }.map_err(|error| {
                    Error::plugin_loading_error(format!("{}", library_path.display()), format!("{:?}", error))
                })?;
                let plugin = PluginLibrary { library, path: library_path, plugin: OnceLock::new() };
                entry.insert(plugin).load()
            }
        }
    }
}

/// Static [`PluginManager`] that is used for loading and caching backend [`Plugin`]s.
static PLUGIN_MANAGER: LazyLock<PluginManager> =
    LazyLock::new(|| PluginManager { plugins: Arc::new(Mutex::new(HashMap::new())) });

/// Loads a backend [`Plugin`] from the provided [`Path`] pointing to the shared library for that plugin.
pub fn load_plugin(library_path: &Path) -> Result<Plugin, Error> {
    PLUGIN_MANAGER.load_plugin(library_path)
}

#[allow(dead_code, non_camel_case_types, non_snake_case, non_upper_case_globals)]
pub(crate) mod ffi {
    use crate::errors::ffi::AXR_Error;
    use crate::ffi::AXR_Extension_Base;
    use crate::values::ffi::AXR_NamedValue;

    #[repr(C)]
    pub struct AXR_Plugin_Initialize_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
    }

    impl AXR_Plugin_Initialize_Args {
        pub fn new() -> Self {
            Self { struct_size: size_of::<Self>(), extension_start: std::ptr::null_mut() }
        }
    }

    pub type AXR_Plugin_Initialize = unsafe extern "C" fn(args: *mut AXR_Plugin_Initialize_Args) -> *mut AXR_Error;

    #[repr(C)]
    pub struct AXR_Plugin_Attributes_Args {
        pub struct_size: usize,
        pub extension_start: *mut AXR_Extension_Base,
        pub attributes: *const AXR_NamedValue,
        pub num_attributes: usize,
    }

    impl AXR_Plugin_Attributes_Args {
        pub fn new() -> Self {
            Self {
                struct_size: size_of::<Self>(),
                extension_start: std::ptr::null_mut(),
                attributes: std::ptr::null_mut(),
                num_attributes: 0,
            }
        }
    }

    pub type AXR_Plugin_Attributes = unsafe extern "C" fn(args: *mut AXR_Plugin_Attributes_Args) -> *mut AXR_Error;
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::Error;
    use crate::tests::{test_client, test_plugin};

    #[test]
    fn test_plugin_client_creation() {
        let plugin = test_plugin();
        assert!(plugin.client(Default::default()).is_ok());
        let client = test_client();
        assert!(!client.platform_name().is_empty());
    }

    #[test]
    fn test_load_plugin_missing_library() {
        let result = crate::load_plugin(Path::new("/nonexistent/axr/plugin.so"));
        assert!(matches!(result, Err(Error::PluginLoadingError { .. })));
    }
}
