/// Low-level helper macro for invoking plugin ABI functions. This macro handles the boilerplate of looking up a
/// function pointer in the [`AXR_Api`](crate::ffi::AXR_Api) struct, constructing the appropriate `*_Args` record,
/// invoking the function, and extracting any output values. It also takes care of error handling by checking the
/// error pointer returned by the function (if that function returned an error pointer) and converting it to a Rust
/// [`Error`](crate::Error) value if something went wrong. Note that if the requested function is not available in
/// the loaded plugin, this macro will generate code that returns an
/// [`Error::Unimplemented`](crate::Error::Unimplemented) error.
///
/// This macro is not intended to be used directly. Instead, use [`invoke_plugin_api_void_fn!`] for functions that
/// do not return errors, or [`invoke_plugin_api_error_fn!`] for functions that may return errors.
///
/// # Parameters
///
///   - `$api`: API instance that provides access to plugin ABI function pointers. The type that this expression
///      evaluates to must provide an `api()` function that returns an [`Api`](crate::Api) instance. Note that you can
///      also optionally use the `@unchecked` keyword prefix if you want to skip checking that `$fn` exists based on
///      the plugin's declared API struct size. That check is how the plugin ABI handles minor-version additions, but
///      it cannot be performed for the handful of functions that must be invoked before any version information can
///      be read, and that is why we support the optional `@unchecked` keyword prefix.
///   - `$fn`: Name of the plugin ABI function to invoke (e.g., `AXR_Client_Create`).
///   - `$input_name = $input_value`: Zero or more input argument assignments that correspond
///     to fields in the corresponding `<$fn>_Args` record in the plugin ABI.
///   - `$output_name`: Zero or more output field names to extract from the `<$fn>_Args` record after the
///     plugin ABI function invocation.
macro_rules! invoke_plugin_api_fn_helper {
    (
        $api:expr,
        $fn:ident,
        { $($input_name:ident = $input_value:expr),* $(,)? },
        { $($output_name:ident),* $(,)? } $(,)?
    ) => {
        paste::paste! {
            {
                let api_handle = unsafe { $api.to_c_api() };
                let api_fn_offset = std::mem::offset_of!(crate::ffi::AXR_Api, $fn);
                let api_struct_size = unsafe { (*api_handle).struct_size } as usize;
                if api_struct_size <= api_fn_offset {
                    Err(crate::errors::Error::unimplemented(format!(
                        "`{}` is not available in the loaded plugin (version {})",
                        stringify!($fn).to_owned(),
                        $api.api().version(),
                    )))
                } else {
                    $crate::invoke_plugin_api_fn_helper!(
                        @unchecked $api,
                        $fn,
                        { $($input_name = $input_value),* },
                        { $($output_name),* },
                    )
                }
            }
        }
    };
    (
        @unchecked $api:expr,
        $fn:ident,
        { $($input_name:ident = $input_value:expr),* $(,)? },
        { $($output_name:ident),* $(,)? } $(,)?
    ) => {
        paste::paste! {
            unsafe {
                let api_fn = (*$api.to_c_api()).$fn.ok_or_else(|| crate::errors::Error::unimplemented(format!(
                    "`{}` is not implemented in the loaded plugin (version {})",
                    stringify!($fn).to_owned(),
                    $api.api().version(),
                )));
                match api_fn {
                    Ok(api_fn) => {
                        let mut args = [<$fn _Args>]::new($($input_value),*);
                        let error = api_fn(&mut args as *mut _);
                        Ok((($(args.$output_name),*), error))
                    },
                    Err(error) => Err(error),
                }
            }
        }
    };
}

/// Helper used for invoking plugin ABI functions that cannot return errors. Use this macro for plugin ABI functions
/// that have a `void` return type. For functions that have an `AXR_Error*` return type and require error handling,
/// use the [`invoke_plugin_api_error_fn!`] macro instead.
///
/// This macro is a wrapper over [`invoke_plugin_api_fn_helper!`].
macro_rules! invoke_plugin_api_void_fn {
    (
        $(@$unchecked:tt)? $api:expr,
        $fn:ident $(,)?
    ) => {
        $crate::invoke_plugin_api_void_fn!(
            $(@$unchecked)? $api,
            $fn,
            {},
            {},
        )
    };
    (
        $(@$unchecked:tt)? $api:expr,
        $fn:ident,
        { $($input_name:ident = $input_value:expr),* $(,)? } $(,)?
    ) => {
        $crate::invoke_plugin_api_void_fn!(
            $(@$unchecked)? $api,
            $fn,
            { $($input_name = $input_value),* },
            {},
        )
    };
    (
        $(@$unchecked:tt)? $api:expr,
        $fn:ident,
        { $($input_name:ident = $input_value:expr),* $(,)? },
        { $($output_name:ident),* $(,)? } $(,)?
    ) => {
        $crate::invoke_plugin_api_fn_helper!(
            $(@$unchecked)? $api,
            $fn,
            { $($input_name = $input_value),* },
            { $($output_name),* },
        ).map(|(outputs, _)| outputs)
    };
}

/// Helper used for invoking plugin ABI functions that may return errors. Use this macro for plugin ABI functions
/// that have an `AXR_Error*` return type and require error handling. For functions that have a `void` return type,
/// use the [`invoke_plugin_api_void_fn!`] macro instead.
///
/// This macro is a wrapper over [`invoke_plugin_api_fn_helper!`].
macro_rules! invoke_plugin_api_error_fn {
    (
        $(@$unchecked:tt)? $api:expr,
        $fn:ident $(,)?
    ) => {
        $crate::invoke_plugin_api_error_fn!(
            $(@$unchecked)? $api,
            $fn,
            {},
            {},
        )
    };
    (
        $(@$unchecked:tt)? $api:expr,
        $fn:ident,
        { $($input_name:ident = $input_value:expr),* $(,)? } $(,)?
    ) => {
        $crate::invoke_plugin_api_error_fn!(
            $(@$unchecked)? $api,
            $fn,
            { $($input_name = $input_value),* },
            {},
        )
    };
    (
        $(@$unchecked:tt)? $api:expr,
        $fn:ident,
        { $($input_name:ident = $input_value:expr),* $(,)? },
        { $($output_name:ident),* $(,)? } $(,)?
    ) => {{
        $crate::invoke_plugin_api_fn_helper!(
            $(@$unchecked)? $api,
            $fn,
            { $($input_name = $input_value),* },
            { $($output_name),* },
        ).and_then(|(outputs, error)| {
            if error.is_null() {
                Ok(outputs)
            } else {
                unsafe {
                    match $crate::Error::from_c_api(error, $api.api()) {
                        Ok(None) => Ok(outputs),
                        Ok(Some(error)) => Err(error),
                        Err(error) => Err(error),
                    }
                }
            }
        })
    }};
}

pub(crate) use {invoke_plugin_api_error_fn, invoke_plugin_api_fn_helper, invoke_plugin_api_void_fn};
