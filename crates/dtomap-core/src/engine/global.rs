//! Process-wide shared engine
//!
//! An application installs one engine at startup; any thread can then fetch
//! it, and maintenance code (a cache-clear command, a deploy hook) can clear
//! or invalidate its plan cache without holding a handle.
//!
//! Copyright (c) 2025 Dtomap Team
//! Licensed under the Apache-2.0 license

use super::Engine;
use crate::plan::CacheStats;
use crate::{Error, Result};
use std::sync::OnceLock;
use tracing::info;

static ENGINE: OnceLock<Engine> = OnceLock::new();

/// Install the process-wide engine. Fails if one is already installed.
pub fn install(engine: Engine) -> Result<&'static Engine> {
    ENGINE
        .set(engine)
        .map_err(|_| Error::configuration("A global engine is already installed"))?;
    info!("installed global mapping engine");
    ENGINE
        .get()
        .ok_or_else(|| Error::configuration("Global engine is not installed"))
}

/// The installed engine, if any
pub fn engine() -> Option<&'static Engine> {
    ENGINE.get()
}

/// The installed engine, or a configuration error
pub fn try_engine() -> Result<&'static Engine> {
    engine().ok_or_else(|| Error::configuration("Global engine is not installed"))
}

/// Clear the installed engine's plan cache; returns whether an engine exists
pub fn clear_cache() -> bool {
    match engine() {
        Some(engine) => {
            engine.clear_cache();
            true
        }
        None => false,
    }
}

/// Invalidate the cached plans of `type_id`; returns how many were removed
pub fn invalidate(type_id: &str) -> usize {
    engine().map_or(0, |engine| engine.invalidate(type_id))
}

/// Cache statistics of the installed engine
pub fn cache_stats() -> Option<CacheStats> {
    engine().map(Engine::cache_stats)
}
