use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use enrichment::LanguageApiClient;
use processors::{RecordFilter, SentimentEnricher};
use runner::fanout::FanoutPipeline;
use sinks::build_sink;
use sources::build_source;
use tweetforge_config::{PipelineSpec, load_cfg};
use tweetforge_core::{RawMessage, SourceHandle, TableSchema};

#[derive(Parser, Debug)]
struct Args {
    #[arg(short, long)]
    config: String,
    #[arg(long, default_value = "0.0.0.0:9095")]
    metrics_addr: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let metrics_addr: SocketAddr = args
        .metrics_addr
        .parse()
        .context("metrics_addr must be host:port")?;

    let cfg = o11y::O11yConfig {
        logging: o11y::logging::Config {
            level: None,
            json: false,
            with_targets: false,
        },
        metrics: o11y::tf_metrics::Config {
            enable: true,
            http_listener: Some(metrics_addr),
        },
        install_panic_hook: true,
    };
    let _ = o11y::init_all(&cfg);

    let pipeline_specs =
        load_pipeline_cfgs(&args.config).context("load pipeline specs")?;

    let mut running_pipelines: Vec<JoinHandle<Result<()>>> =
        Vec::with_capacity(pipeline_specs.len());
    let mut source_handles: Vec<SourceHandle> =
        Vec::with_capacity(pipeline_specs.len());
    let hard_stop = CancellationToken::new();

    for ps in pipeline_specs {
        let pipeline_name = ps.metadata.name.clone();

        let pipeline = build_pipeline(&ps)
            .await
            .context(format!("build pipeline {pipeline_name}"))?;

        let source = build_source(&ps)
            .context(format!("build source for {pipeline_name}"))?;

        let (ingest_tx, ingest_rx) =
            mpsc::channel::<RawMessage>(ps.spec.channel_capacity);
        let src_handle = source.run(ingest_tx).await;
        source_handles.push(src_handle);

        let cancel = hard_stop.clone();
        let handle = tokio::spawn(async move {
            info!(pipeline = %pipeline.name, "fan-out starting");
            let res = pipeline.run(ingest_rx, cancel).await;
            if let Err(ref e) = res {
                error!(error = %e, "fan-out exited with error");
            }
            res
        });
        running_pipelines.push(handle);
    }

    spawn_shutdown_watcher(&source_handles, hard_stop);

    for p in running_pipelines {
        p.await??;
    }

    for h in source_handles {
        if let Err(e) = h.join().await {
            error!(error = %e, "source ended with error");
        }
    }

    Ok(())
}

/// Assemble the transforms, schemas, sinks, and sentiment client for one
/// pipeline spec. Anything wrong here (unreadable schema, missing token,
/// unreachable destination) aborts before any record is processed.
async fn build_pipeline(ps: &PipelineSpec) -> Result<Arc<FanoutPipeline>> {
    let raw_schema = TableSchema::from_file(&ps.spec.schemas.raw)
        .with_context(|| {
            format!("loading raw table schema from {}", ps.spec.schemas.raw)
        })?;
    let annotated_schema = TableSchema::from_file(&ps.spec.schemas.annotated)
        .with_context(|| {
            format!(
                "loading annotated table schema from {}",
                ps.spec.schemas.annotated
            )
        })?;

    let raw_sink = build_sink(&ps.spec.sinks.raw, raw_schema.clone())
        .context("build raw sink")?;
    let annotated_sink =
        build_sink(&ps.spec.sinks.annotated, annotated_schema.clone())
            .context("build annotated sink")?;

    raw_sink
        .ensure_table()
        .await
        .context("ensure raw destination table")?;
    annotated_sink
        .ensure_table()
        .await
        .context("ensure annotated destination table")?;

    let client = Arc::new(
        LanguageApiClient::new(&ps.spec.enrichment)
            .context("build sentiment client")?,
    );
    let enricher =
        Arc::new(SentimentEnricher::from_cfg(client, &ps.spec.enrichment));

    Ok(Arc::new(FanoutPipeline {
        name: ps.metadata.name.clone(),
        filter: RecordFilter::new(&ps.spec.filter),
        enricher,
        raw_schema: Arc::new(raw_schema),
        annotated_schema: Arc::new(annotated_schema),
        raw_sink,
        annotated_sink,
        max_inflight: ps.spec.enrichment.max_inflight,
        channel_capacity: ps.spec.channel_capacity,
    }))
}

/// First signal stops the sources and lets the pipelines drain; a second
/// signal aborts the fan-out outright.
fn spawn_shutdown_watcher(
    source_handles: &[SourceHandle],
    hard_stop: CancellationToken,
) {
    let source_cancels: Vec<CancellationToken> =
        source_handles.iter().map(|h| h.cancel.clone()).collect();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received; stopping sources and draining");
            for c in &source_cancels {
                c.cancel();
            }
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("second shutdown signal; aborting pipelines");
            hard_stop.cancel();
        }
    });
}

fn load_pipeline_cfgs(path: &str) -> Result<Vec<PipelineSpec>> {
    let specs = load_cfg(path)?;
    info!(specs_found = specs.len(), "pipeline specs loaded");
    Ok(specs)
}
