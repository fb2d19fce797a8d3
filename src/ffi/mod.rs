use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};

use crate::ffi::error::{ErrorCode, FFIError};

pub mod error;
pub mod ledger;

pub use error::FFIResult;

/// Error handling helper for FFI boundaries (returns error code)
pub fn handle_status_result<F>(func: F) -> c_int
where
    F: FnOnce() -> FFIResult<()>,
{
    match func() {
        Ok(()) => ErrorCode::Success as c_int,
        Err(e) => {
            log::error!(
                "FFI call failed. Code: {:?}, Message: {}, Details: {}",
                e.code,
                e.message,
                e.details.as_deref().unwrap_or("None")
            );
            e.code as c_int
        }
    }
}

/// Decode a NUL-terminated UTF-8 JSON payload.
///
/// # Safety
/// `ptr` must be null or point to a valid NUL-terminated string.
pub(crate) unsafe fn read_json<T: DeserializeOwned>(ptr: *const c_char, argument: &str) -> FFIResult<T> {
    if ptr.is_null() {
        return Err(FFIError::null_pointer(argument));
    }
    let text = unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| FFIError::new(ErrorCode::InvalidUtf8, &format!("'{}' is not valid UTF-8", argument)))?;
    serde_json::from_str(text).map_err(|e| FFIError::invalid_json(&e))
}

/// Serialize `value` and hand ownership of the string to the caller through `out`.
///
/// # Safety
/// `out` must be null or a valid, writable pointer.
pub(crate) unsafe fn write_json<T: Serialize>(out: *mut *mut c_char, value: &T) -> FFIResult<()> {
    if out.is_null() {
        return Err(FFIError::null_pointer("result"));
    }
    let json = serde_json::to_string(value).map_err(|e| FFIError::internal(format!("Failed to serialize result: {}", e)))?;
    let c_string = CString::new(json).map_err(|e| FFIError::internal(format!("Failed to create CString: {}", e)))?;
    unsafe {
        *out = c_string.into_raw();
    }
    Ok(())
}

/// Free a string previously returned through a `result` out-pointer.
///
/// # Safety
/// `ptr` must come from this library and must not be freed twice.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ledger_free(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}
