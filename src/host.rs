/*
 *  host.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  Root host table handed to every plugin at init
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

use longship_sdk::ffi::{struct_size_of, LongshipHostVTable, LONGSHIP_HOST_ABI_VERSION};

use crate::logging::LOGGING_API;

static HOST_API: LongshipHostVTable = LongshipHostVTable {
    abi_version: LONGSHIP_HOST_ABI_VERSION,
    struct_size: struct_size_of::<LongshipHostVTable>(),
    logging: &LOGGING_API,
};

/// Root table passed to `longship_plugin_init`. Lives for the whole process.
pub fn host_api() -> &'static LongshipHostVTable {
    &HOST_API
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::logging_api;
    use longship_sdk::abi;

    #[test]
    fn test_host_table_embeds_logging_table() {
        let host = unsafe { abi::validate(host_api() as *const LongshipHostVTable) }.unwrap();
        assert!(std::ptr::eq(host.logging, logging_api()));
        assert!(unsafe { abi::validate(host.logging) }.is_ok());
    }
}
