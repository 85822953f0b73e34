//! Observability bootstrap: logging, metrics, and panic capture.
//!
//! `init_all` is called once at process start, before any pipeline work.

pub mod logging;
pub mod panic;
pub mod tf_metrics;

#[derive(Clone, Debug, Default)]
pub struct O11yConfig {
    pub logging: logging::Config,
    pub metrics: tf_metrics::Config,
    pub install_panic_hook: bool,
}

pub fn init_all(cfg: &O11yConfig) -> Result<(), Box<dyn std::error::Error>> {
    logging::init(&cfg.logging)?;
    tf_metrics::init(&cfg.metrics)?;
    if cfg.install_panic_hook {
        panic::install_hook();
    }
    Ok(())
}
