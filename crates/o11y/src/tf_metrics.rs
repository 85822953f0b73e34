use axum::{Router, routing::get};
use metrics::{Unit, describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::{net::SocketAddr, time::Duration};
use tokio::net::TcpListener;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone, Debug)]
pub struct Config {
    pub enable: bool,
    pub http_listener: Option<SocketAddr>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable: true,
            http_listener: Some(([0, 0, 0, 0], 9000).into()),
        }
    }
}

pub fn init(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if !cfg.enable {
        return Ok(());
    }

    if HANDLE.get().is_none() {
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .expect("failed to install recorder");
        HANDLE.set(handle).ok();
    }

    if let Some(addr) = cfg.http_listener {
        tokio::spawn(async move {
            let router = Router::new().route("/metrics", get(metrics_handler));
            // Retry binding a few times in case of startup races (tests)
            let mut tries = 0;
            loop {
                match TcpListener::bind(addr).await {
                    Ok(l) => {
                        axum::serve(l, router).await.ok();
                        break;
                    }
                    Err(e) if tries < 5 => {
                        tries += 1;
                        tracing::warn!(error=%e, tries, "metrics listener bind failed; retrying");
                        tokio::time::sleep(Duration::from_millis(150)).await;
                    }
                    Err(e) => {
                        tracing::error!(error=%e, "metrics listener failed; giving up");
                        break;
                    }
                }
            }
        });
    }

    describe_metrics();

    Ok(())
}

/// Axum handler that renders the current metrics snapshot.
pub async fn metrics_handler() -> String {
    HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# recorder not installed\n".into())
}

pub fn router_with_metrics() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub fn describe_metrics() {
    describe_counter!(
        "tweetforge_records_ingested_total",
        Unit::Count,
        "Records received from the event source"
    );
    describe_counter!(
        "tweetforge_parse_failures_total",
        Unit::Count,
        "Records that were not valid JSON, per branch"
    );
    describe_counter!(
        "tweetforge_rows_appended_total",
        Unit::Count,
        "Rows accepted by a sink"
    );
    describe_counter!(
        "tweetforge_sink_errors_total",
        Unit::Count,
        "Rows a sink failed to accept"
    );
    describe_counter!(
        "tweetforge_schema_mismatches_total",
        Unit::Count,
        "Normalized records the target schema could not represent"
    );
    describe_counter!(
        "tweetforge_eligible_records_total",
        Unit::Count,
        "Records that passed the enrichment filter"
    );
    describe_counter!(
        "tweetforge_enriched_records_total",
        Unit::Count,
        "Records successfully annotated with sentiment"
    );
    describe_counter!(
        "tweetforge_enrichment_failures_total",
        Unit::Count,
        "Enrichment calls that failed, by reason"
    );
    describe_counter!(
        "tweetforge_branch_lag_dropped_total",
        Unit::Count,
        "Records dropped because a branch lagged the broadcast"
    );
    describe_counter!(
        "tweetforge_panics_total",
        Unit::Count,
        "Panics captured by the panic hook"
    );
    describe_histogram!(
        "tweetforge_enrichment_latency_seconds",
        Unit::Seconds,
        "Latency of the sentiment analysis call"
    );
    describe_histogram!(
        "tweetforge_sink_latency_seconds",
        Unit::Seconds,
        "Latency to append a row to a sink"
    );
}
