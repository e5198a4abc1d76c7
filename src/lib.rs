//! Healova portal core.
//!
//! Headless client core for a PCOD/PCOS telehealth portal: session and
//! identity resolution, a typed gateway to the REST backend, the
//! four-step consultation intake workflow, camera/microphone capture,
//! doctor-side prescription authoring, and dashboard data assembly.
//! The embedding shell owns rendering and navigation; this crate owns
//! state, validation, and every backend interaction.

pub mod api; // REST gateway client, wire adapter, scriptable mock
pub mod capture; // camera/microphone capture and local object URLs
pub mod config;
pub mod dashboard; // patient and doctor dashboard snapshots
pub mod intake; // four-step consultation intake workflow
pub mod models;
pub mod review; // doctor review and prescription authoring
pub mod routes; // page routes and their role requirements
pub mod session; // identity resolution, cookies, route gating

use tracing_subscriber::EnvFilter;

/// Initialize tracing for an embedding shell. Honors `RUST_LOG` when set,
/// otherwise falls back to [`config::default_log_filter`].
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Healova core starting v{}", config::APP_VERSION);
}
