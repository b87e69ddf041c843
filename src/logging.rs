use crate::app_env;
use crate::config::OtelEndpoints;
use anyhow::Context;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use opentelemetry::trace::TracerProvider;
use opentelemetry::{KeyValue, global};
use opentelemetry_http::HeaderExtractor;
use opentelemetry_otlp::{MetricExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::Tracer;
use opentelemetry_sdk::{Resource, runtime};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing::{Span, debug, field, info_span};
use tracing_opentelemetry::{MetricsLayer, OpenTelemetryLayer, OpenTelemetrySpanExt};
use tracing_subscriber::{EnvFilter, prelude::*, registry};

/// `service.name` on exported spans and metrics
const SERVICE_NAME: &str = "task-board";

/// Span and metric pipelines built from [OtelEndpoints]
pub struct OtelExporters {
    pub tracer: Tracer,
    pub meter: SdkMeterProvider,
}

/// Attaches a tracing middleware layer to the given router. Each request gets a "request" span;
/// the session extractor fills in `user_id` once it knows who's calling.
pub fn attach_tracing_http<T>(router: Router<T>) -> Router<T>
where
    T: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new().layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let req_span = info_span!(
                        "request",
                        method = &request.method().as_str(),
                        path = request.uri().path(),
                        response_status = field::Empty,
                        user_id = field::Empty,
                    );

                    req_span.set_parent(global::get_text_map_propagator(|propagator| {
                        propagator.extract(&HeaderExtractor(request.headers()))
                    }));

                    req_span
                })
                .on_response(
                    |response: &Response<Body>, latency: Duration, span: &Span| {
                        span.record("response_status", field::display(response.status()));
                        debug!(latency_ms = latency.as_millis() as u64, "request finished");
                    },
                ),
        ),
    )
}

/// Builds OTLP gRPC exporters for the configured span and metric endpoints. Only called when
/// both endpoints are set.
pub fn init_exporters(endpoints: &OtelEndpoints) -> Result<OtelExporters, anyhow::Error> {
    let span_export = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoints.spans)
        .build()
        .context("building the OTLP span exporter")?;
    let meter_export = MetricExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoints.metrics)
        .build()
        .context("building the OTLP metric exporter")?;

    let metrics_reader = PeriodicReader::builder(meter_export, runtime::Tokio).build();

    let resource = Resource::new([KeyValue::new("service.name", SERVICE_NAME)]);

    Ok(OtelExporters {
        tracer: opentelemetry_sdk::trace::TracerProvider::builder()
            .with_batch_exporter(span_export, runtime::Tokio)
            .with_resource(resource.clone())
            .build()
            .tracer(SERVICE_NAME),
        meter: SdkMeterProvider::builder()
            .with_reader(metrics_reader)
            .with_resource(resource)
            .build(),
    })
}

/// Stdout log filter from [app_env::LOG_LEVEL], e.g. `info,task_board=debug`. Defaults to `info`.
pub fn init_env_filter() -> Result<EnvFilter, anyhow::Error> {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(app_env::LOG_LEVEL)
        .from_env()
        .context("building the logging filter failed")
}

/// Installs the global subscriber: JSON logs on stdout filtered by `env_filter`, plus every
/// debug-and-up span and metric to OTLP when exporters are given. Also installs the W3C
/// trace-context propagator used by [attach_tracing_http].
pub fn setup_logging_and_tracing(env_filter: EnvFilter, otel_exporters: Option<OtelExporters>) {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let (otel_spans, otel_metrics) = match otel_exporters {
        Some(exporters) => (
            Some(OpenTelemetryLayer::new(exporters.tracer)),
            Some(MetricsLayer::new(exporters.meter)),
        ),
        None => (None, None),
    };

    registry()
        .with(LevelFilter::DEBUG)
        .with(otel_spans)
        .with(otel_metrics)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_filter(env_filter),
        )
        .init();
}
