//! Safe wrappers over the GDAL utility entry points.
//!
//! The pipeline drives three of GDAL's library-embedded utilities:
//! `gdal_translate` to attach GCPs in memory, `gdalwarp` to fit and
//! resample, and `ogr2ogr` to reproject vector overlays. The bindings
//! crate does not wrap these, so this module does, the way the bindings
//! wrap other C entry points: options built from an argv-style string
//! list (never a shell string), null-checked dataset handles, and failure
//! detail recovered from the library's error stack.
//!
//! Each wrapper returns the produced [`Dataset`]; dropping it closes the
//! handle, which is what flushes file-backed outputs to disk.

use std::ffi::{c_char, c_int, CStr, CString};
use std::path::Path;
use std::ptr;

use gdal::cpl::CslStringList;
use gdal::Dataset;
use thiserror::Error;

/// Error from one utility invocation.
#[derive(Debug, Error)]
#[error("{utility}: {message}")]
pub struct UtilityError {
    utility: &'static str,
    message: String,
}

impl UtilityError {
    fn new(utility: &'static str, message: impl Into<String>) -> Self {
        Self {
            utility,
            message: message.into(),
        }
    }

    /// Name of the utility that failed.
    #[must_use]
    pub fn utility(&self) -> &'static str {
        self.utility
    }
}

/// Run the translate utility against `src`, producing an in-memory dataset.
///
/// `args` must carry `-of MEM`; the destination name stays empty the way
/// the in-memory driver expects.
///
/// # Errors
/// Returns a [`UtilityError`] when the options do not parse or the
/// translation fails.
pub fn translate_to_memory(src: &Dataset, args: &[String]) -> Result<Dataset, UtilityError> {
    const UTILITY: &str = "translate";
    let argv = argv(UTILITY, args)?;
    let dest = dest_cstring(UTILITY, "")?;

    unsafe {
        let options =
            gdal_sys::GDALTranslateOptionsNew(argv.as_ptr() as *mut *mut c_char, ptr::null_mut());
        if options.is_null() {
            return Err(UtilityError::new(UTILITY, last_error_message()));
        }
        let mut usage_error: c_int = 0;
        let handle = gdal_sys::GDALTranslate(dest.as_ptr(), src.c_dataset(), options, &mut usage_error);
        gdal_sys::GDALTranslateOptionsFree(options);
        if handle.is_null() {
            return Err(UtilityError::new(UTILITY, last_error_message()));
        }
        Ok(Dataset::from_c_dataset(handle))
    }
}

/// Run the warp utility, writing `dest` from `src`.
///
/// # Errors
/// Returns a [`UtilityError`] when the options do not parse or the warp
/// fails.
pub fn warp(src: &Dataset, dest: &Path, args: &[String]) -> Result<Dataset, UtilityError> {
    const UTILITY: &str = "warp";
    let argv = argv(UTILITY, args)?;
    let dest = dest_cstring(UTILITY, &dest.to_string_lossy())?;

    unsafe {
        let options =
            gdal_sys::GDALWarpAppOptionsNew(argv.as_ptr() as *mut *mut c_char, ptr::null_mut());
        if options.is_null() {
            return Err(UtilityError::new(UTILITY, last_error_message()));
        }
        let mut usage_error: c_int = 0;
        let mut sources = [src.c_dataset()];
        let handle = gdal_sys::GDALWarp(
            dest.as_ptr(),
            ptr::null_mut(),
            1,
            sources.as_mut_ptr(),
            options,
            &mut usage_error,
        );
        gdal_sys::GDALWarpAppOptionsFree(options);
        if handle.is_null() {
            return Err(UtilityError::new(UTILITY, last_error_message()));
        }
        Ok(Dataset::from_c_dataset(handle))
    }
}

/// Run the vector translate utility, writing `dest` from `src`.
///
/// # Errors
/// Returns a [`UtilityError`] when the options do not parse or the
/// translation fails.
pub fn vector_translate(src: &Dataset, dest: &Path, args: &[String]) -> Result<Dataset, UtilityError> {
    const UTILITY: &str = "vector translate";
    let argv = argv(UTILITY, args)?;
    let dest = dest_cstring(UTILITY, &dest.to_string_lossy())?;

    unsafe {
        let options = gdal_sys::GDALVectorTranslateOptionsNew(
            argv.as_ptr() as *mut *mut c_char,
            ptr::null_mut(),
        );
        if options.is_null() {
            return Err(UtilityError::new(UTILITY, last_error_message()));
        }
        let mut usage_error: c_int = 0;
        let mut sources = [src.c_dataset()];
        let handle = gdal_sys::GDALVectorTranslate(
            dest.as_ptr(),
            ptr::null_mut(),
            1,
            sources.as_mut_ptr(),
            options,
            &mut usage_error,
        );
        gdal_sys::GDALVectorTranslateOptionsFree(options);
        if handle.is_null() {
            return Err(UtilityError::new(UTILITY, last_error_message()));
        }
        Ok(Dataset::from_c_dataset(handle))
    }
}

fn argv(utility: &'static str, args: &[String]) -> Result<CslStringList, UtilityError> {
    let mut list = CslStringList::new();
    for arg in args {
        list.add_string(arg)
            .map_err(|e| UtilityError::new(utility, e.to_string()))?;
    }
    Ok(list)
}

fn dest_cstring(utility: &'static str, dest: &str) -> Result<CString, UtilityError> {
    CString::new(dest)
        .map_err(|_| UtilityError::new(utility, "destination path contains a NUL byte"))
}

/// Last error message on the library's error stack, or a placeholder.
fn last_error_message() -> String {
    let raw = unsafe { CStr::from_ptr(gdal_sys::CPLGetLastErrorMsg()) };
    let message = raw.to_string_lossy().trim().to_string();
    if message.is_empty() {
        "no detail reported".to_string()
    } else {
        message
    }
}
