//! HTTP front end for `city-weather`.
//!
//! Form-based pages: a search box on `/`, a weather page per city on `/{city}`,
//! and a generic `/error` page.

pub mod handlers;
pub mod pages;
pub mod router;
pub mod server;
pub mod state;

pub use router::create_router;
pub use state::AppState;

/// Install the global tracing subscriber. `RUST_LOG` wins over `default_level`.
pub fn init_tracing(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
