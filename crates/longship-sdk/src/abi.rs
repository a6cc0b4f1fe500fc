/*
 *  longship-sdk/src/abi.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  Table validation run by every consumer of an ABI table
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

//! Validation protocol for ABI tables
//!
//! A consumer rejects a table when the pointer is null, when `abi_version`
//! differs from the version it was built against, or when `struct_size` is
//! smaller than the fields it reads. Required function pointers are checked
//! one by one with [`require`]. A rejected table is never partially trusted.

use thiserror::Error;

use crate::ffi::{
    LongshipHostVTable,
    LongshipLoggingVTable,
    LongshipRenderVTable,
    LONGSHIP_HOST_ABI_VERSION,
    LONGSHIP_LOGGING_ABI_VERSION,
    LONGSHIP_RENDER_ABI_VERSION,
};

/// Reasons a table is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("{table} table pointer is null")]
    Null { table: &'static str },

    #[error("{table} ABI version mismatch: expected {expected}, got {found}")]
    VersionMismatch {
        table: &'static str,
        expected: u32,
        found: u32,
    },

    #[error("{table} table too small: expected >= {expected} bytes, got {found}")]
    StructTooSmall {
        table: &'static str,
        expected: usize,
        found: u32,
    },

    #[error("{table} table is missing required function {function}")]
    MissingFunction {
        table: &'static str,
        function: &'static str,
    },
}

/// A versioned, append-only table with the common header
///
/// # Safety
///
/// Implementors must be `#[repr(C)]` and start with `abi_version: u32`
/// followed by `struct_size: u32`.
pub unsafe trait AbiTable {
    /// Name used in diagnostics
    const NAME: &'static str;

    /// Version this build was compiled against
    const ABI_VERSION: u32;

    /// Bytes this build reads from the table
    const MIN_SIZE: usize;

    fn abi_version(&self) -> u32;
    fn struct_size(&self) -> u32;
}

unsafe impl AbiTable for LongshipLoggingVTable {
    const NAME: &'static str = "logging";
    const ABI_VERSION: u32 = LONGSHIP_LOGGING_ABI_VERSION;
    const MIN_SIZE: usize = LongshipLoggingVTable::MIN_SIZE;

    fn abi_version(&self) -> u32 {
        self.abi_version
    }

    fn struct_size(&self) -> u32 {
        self.struct_size
    }
}

unsafe impl AbiTable for LongshipHostVTable {
    const NAME: &'static str = "host";
    const ABI_VERSION: u32 = LONGSHIP_HOST_ABI_VERSION;
    const MIN_SIZE: usize = LongshipHostVTable::MIN_SIZE;

    fn abi_version(&self) -> u32 {
        self.abi_version
    }

    fn struct_size(&self) -> u32 {
        self.struct_size
    }
}

unsafe impl AbiTable for LongshipRenderVTable {
    const NAME: &'static str = "render";
    const ABI_VERSION: u32 = LONGSHIP_RENDER_ABI_VERSION;
    const MIN_SIZE: usize = LongshipRenderVTable::MIN_SIZE;

    fn abi_version(&self) -> u32 {
        self.abi_version
    }

    fn struct_size(&self) -> u32 {
        self.struct_size
    }
}

/// Check the header of the table behind `ptr`.
///
/// # Safety
///
/// `ptr` must be null or point to readable memory holding at least the two
/// header words, and that memory must stay valid for `'a`. The caller learns
/// from the returned `struct_size` check whether the rest may be read.
pub unsafe fn validate<'a, T: AbiTable>(ptr: *const T) -> Result<&'a T, AbiError> {
    if ptr.is_null() {
        return Err(AbiError::Null { table: T::NAME });
    }

    // Header words are read before trusting the rest of the layout.
    let header = ptr as *const u32;
    let (version, size) = unsafe { (header.read(), header.add(1).read()) };

    if version != T::ABI_VERSION {
        return Err(AbiError::VersionMismatch {
            table: T::NAME,
            expected: T::ABI_VERSION,
            found: version,
        });
    }

    if (size as usize) < T::MIN_SIZE {
        return Err(AbiError::StructTooSmall {
            table: T::NAME,
            expected: T::MIN_SIZE,
            found: size,
        });
    }

    Ok(unsafe { &*ptr })
}

/// Unwrap a required function pointer or report which one is missing
pub fn require<T: AbiTable, F: Copy>(function: &'static str, entry: Option<F>) -> Result<F, AbiError> {
    entry.ok_or(AbiError::MissingFunction {
        table: T::NAME,
        function,
    })
}
