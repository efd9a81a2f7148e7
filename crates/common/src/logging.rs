// Omni Gateway - typed API in front of an Omni Layer wallet daemon
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Logging configuration for gateway components
//!
//! Provides centralized logging setup with:
//! - Colorful console output with structured formatting
//! - Optional daily-rotated file logging under the system temp directory
//! - Environment variable support (RUST_LOG), defaulting to INFO

use eyre::Result;
use std::{env, fs, path::PathBuf, sync::Once};
use tracing::Level;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, time::LocalTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Directory (under the system temp dir) that holds per-component log folders
pub const LOG_ROOT: &str = "omni-gateway-logs";

/// Initialize logging for a gateway component
///
/// Console output is always enabled. When `enable_file_logging` is set, a second
/// layer writes uncolored output to `<tmp>/omni-gateway-logs/<component>/<component>.log`
/// with daily rotation.
///
/// # Arguments
/// * `component_name` - Name of the component (e.g., "omni-gateway")
/// * `enable_file_logging` - Whether to also write logs to a file
///
/// # Examples
/// ```no_run
/// use omni_gateway_common::logging;
///
/// fn main() -> eyre::Result<()> {
///     logging::init_logging("omni-gateway", false)?;
///     tracing::info!("Application started");
///     Ok(())
/// }
/// ```
pub fn init_logging(component_name: &str, enable_file_logging: bool) -> Result<()> {
    let env_filter = default_filter(Level::INFO)?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_timer(LocalTime::rfc_3339())
        .with_ansi(true);

    if enable_file_logging {
        let log_dir = create_log_directory(component_name)?;

        let file_appender = rolling::daily(&log_dir, format!("{component_name}.log"));
        let (non_blocking_appender, guard) = non_blocking(file_appender);

        // The guard flushes on drop; the process owns the writer until exit.
        std::mem::forget(guard);

        let file_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(LocalTime::rfc_3339())
            .with_ansi(false)
            .with_writer(non_blocking_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer.with_filter(filter_for_console()))
            .with(file_layer.with_filter(filter_for_file()))
            .try_init()
            .map_err(|e| eyre::eyre!("Failed to initialize tracing subscriber: {}", e))?;

        tracing::info!(
            component = component_name,
            log_dir = %log_dir.display(),
            "Logging initialized with console and file output"
        );
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer.with_filter(filter_for_console()))
            .try_init()
            .map_err(|e| eyre::eyre!("Failed to initialize tracing subscriber: {}", e))?;

        tracing::info!(component = component_name, "Logging initialized with console output only");
    }

    log_environment_info(component_name);

    Ok(())
}

/// Filter from RUST_LOG, falling back to `level`
fn default_filter(level: Level) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .map_err(|e| eyre::eyre!("Failed to create environment filter: {}", e))
}

/// Create log directory in system temp folder
fn create_log_directory(component_name: &str) -> Result<PathBuf> {
    let log_dir = env::temp_dir().join(LOG_ROOT).join(component_name);
    fs::create_dir_all(&log_dir)?;
    Ok(log_dir)
}

/// Filter for console output - quiet the HTTP stack
fn filter_for_console() -> EnvFilter {
    let mut filter = EnvFilter::from_default_env();
    for directive in ["tower_http=warn", "hyper=warn", "reqwest=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Filter for file output - be more verbose for debugging
fn filter_for_file() -> EnvFilter {
    EnvFilter::from_default_env()
}

fn log_environment_info(component_name: &str) {
    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    tracing::info!(
        component = component_name,
        version = env!("CARGO_PKG_VERSION"),
        rust_log = %rust_log,
        "Environment information"
    );

    if let Ok(current_dir) = env::current_dir() {
        tracing::debug!(working_directory = %current_dir.display(), "Working directory");
    }
}

/// Initialize simple logging (console only, compact formatting)
///
/// # Arguments
/// * `level` - The default log level to use when RUST_LOG is unset
pub fn init_simple_logging(level: Level) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter(level)?)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to initialize simple logging: {}", e))?;

    Ok(())
}

static TEST_LOGGING_INIT: Once = Once::new();

/// Logging initialization for tests that can be called any number of times
///
/// Only the first call installs a subscriber; later calls are no-ops. A failure to
/// install (because another subscriber already exists) is ignored.
pub fn ensure_test_logging(default_level: Option<Level>) {
    TEST_LOGGING_INIT.call_once(|| {
        let _ = init_simple_logging(default_level.unwrap_or(Level::INFO));
    });
}
