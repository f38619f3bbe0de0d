// SPDX-License-Identifier: AGPL-3.0-or-later
//! Fuzz target for unified path validation and mount resolution

#![no_main]

use filemux_core::path;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let _ = path::name(input);
    let _ = path::parent(input);

    if path::validate_path(input).is_err() {
        return;
    }

    // First segment acts as the mount name
    let mount = input.trim_start_matches('/').split('/').next().unwrap_or("");
    if path::validate_mount_name(mount).is_err() {
        return;
    }

    assert!(path::is_under_mount(input, mount));
    let local = path::strip_mount_prefix(input, mount);
    assert!(local.starts_with('/'));
    assert!(path::validate_path(&local).is_ok());

    let joined = path::join(mount, &local);
    assert!(path::is_under_mount(&joined, mount));
});
