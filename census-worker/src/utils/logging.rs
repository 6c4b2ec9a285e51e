use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Level, Subscriber};
use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::error::{WorkerError, WorkerResult};

pub const DEFAULT_LOG_DIRECTIVE: &str = "census_worker=info";

const DIM: &str = "\x1b[90m";
const RESET: &str = "\x1b[0m";

/// Id of the job a span was opened for, stored in the span's extensions.
#[derive(Debug, Clone)]
struct JobId(String);

#[derive(Default)]
struct JobIdVisitor(Option<String>);

impl Visit for JobIdVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "id" {
            self.0 = Some(format!("{:?}", value).trim_matches('"').to_string());
        }
    }
}

/// Remembers the `id` of every `job` span so formatters can tag lines with it.
pub struct JobSpanLayer;

impl<S> Layer<S> for JobSpanLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        if attrs.metadata().name() != "job" {
            return;
        }
        let Some(span) = ctx.span(id) else { return };
        let mut visitor = JobIdVisitor::default();
        attrs.record(&mut visitor);
        if let Some(job_id) = visitor.0 {
            span.extensions_mut().insert(JobId(job_id));
        }
    }
}

fn current_job_id<S, N>(ctx: &FmtContext<'_, S, N>) -> Option<String>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    let span = ctx.lookup_current()?;
    span.scope().find_map(|span| {
        let extensions = span.extensions();
        let job = extensions.get::<JobId>()?;
        Some(job.0.clone())
    })
}

/// Message and structured fields of one event. Integers stay numbers for the JSON output.
#[derive(Default)]
struct EventFields {
    message: String,
    fields: Map<String, Value>,
}

impl Visit for EventFields {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let text = format!("{:?}", value).trim_matches('"').to_string();
        if field.name() == "message" {
            self.message = text;
        } else {
            self.fields.insert(field.name().to_string(), Value::String(text));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }
}

fn level_color(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "\x1b[31m",
        Level::WARN => "\x1b[33m",
        Level::INFO => "\x1b[32m",
        _ => DIM,
    }
}

/// `timestamp | level | job | service | message (fields)`
pub struct ConsoleFormatter;

impl<S, N> FormatEvent<S, N> for ConsoleFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> std::fmt::Result {
        let meta = event.metadata();
        let mut visitor = EventFields::default();
        event.record(&mut visitor);

        let job = current_job_id(ctx).unwrap_or_else(|| "-".to_string());
        write!(
            writer,
            "{}{}{} | {}{:<5}{} | {:<12} | {:<8} | {}",
            DIM,
            Utc::now().format("%y-%m-%d %H:%M:%S"),
            RESET,
            level_color(meta.level()),
            meta.level(),
            RESET,
            job,
            extract_service_name(meta.target()),
            visitor.message,
        )?;

        if !visitor.fields.is_empty() {
            let rendered: Vec<String> = visitor
                .fields
                .iter()
                .map(|(name, value)| match value {
                    Value::String(text) => format!("{}={}", name, text),
                    other => format!("{}={}", name, other),
                })
                .collect();
            write!(writer, " {}({}){}", DIM, rendered.join(", "), RESET)?;
        }

        writeln!(writer)
    }
}

/// One JSON object per line; the job id, when there is one, lands in `fields.job_id`.
pub struct JsonFormatter;

impl<S, N> FormatEvent<S, N> for JsonFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> std::fmt::Result {
        let meta = event.metadata();
        let mut visitor = EventFields::default();
        event.record(&mut visitor);

        if let Some(job_id) = current_job_id(ctx) {
            visitor.fields.insert("job_id".to_string(), Value::String(job_id));
        }

        let mut line = Map::new();
        line.insert("timestamp".to_string(), Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)));
        line.insert("level".to_string(), Value::from(meta.level().as_str()));
        line.insert("service".to_string(), Value::from(extract_service_name(meta.target())));
        line.insert("target".to_string(), Value::from(meta.target()));
        line.insert("message".to_string(), Value::String(visitor.message));
        if !visitor.fields.is_empty() {
            line.insert("fields".to_string(), Value::Object(visitor.fields));
        }

        let line = serde_json::to_string(&line).map_err(|_| std::fmt::Error)?;
        writeln!(writer, "{}", line)
    }
}

/// Install the global subscriber: `ConsoleFormatter` by default, `JsonFormatter` when
/// `LOG_FORMAT=json`. Also installs color_eyre for panic reports.
pub fn init_logging() -> WorkerResult<()> {
    color_eyre::install().map_err(|e| WorkerError::LoggingError(e.to_string()))?;

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::builder()
            .with_default_directive(Level::INFO.into())
            .parse(DEFAULT_LOG_DIRECTIVE)
            .map_err(|e| WorkerError::LoggingError(e.to_string()))?,
    };

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");
    let fmt_layer = if json {
        fmt::layer().event_format(JsonFormatter).boxed()
    } else {
        fmt::layer().event_format(ConsoleFormatter).boxed()
    };

    let subscriber =
        Registry::default().with(env_filter).with(JobSpanLayer).with(fmt_layer).with(ErrorLayer::default());
    tracing::subscriber::set_global_default(subscriber).map_err(|e| WorkerError::LoggingError(e.to_string()))
}

/// Short service column for a tracing target.
pub fn extract_service_name(target: &str) -> &'static str {
    const SERVICES: &[(&str, &str)] = &[
        ("census_captcha_service", "CAPTCHA"),
        ("census_identity_client", "IDENTITY"),
        ("census_utils", "UTILS"),
        ("census_worker", "-"),
    ];
    SERVICES.iter().find(|(prefix, _)| target.starts_with(*prefix)).map_or("EXTERNAL", |(_, service)| *service)
}
