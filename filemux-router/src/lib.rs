// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mount-prefix router for filemux
//!
//! One logical namespace, many backends. Each backend is mounted under a
//! name, and `/<name>/rest` is served by that backend as `/rest`:
//!
//! - [`Router`] - resolves a unified path, delegates, rewrites results
//! - [`StorageConfig`] - TOML description of the mounts
//!
//! Paths no mount claims fall through to a guarded dummy backend, so a
//! missing mount reads as not-found and refuses writes instead of failing
//! dispatch.

mod config;
mod router;

pub use config::{
    AccessConfig, BackendsConfig, DbBackendConfig, FsBackendConfig, MemoryBackendConfig,
    StorageConfig,
};
pub use router::{Resolved, Router};
