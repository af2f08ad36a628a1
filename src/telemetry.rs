use tracing::{level_filters::LevelFilter, Level};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

/// Installs the JSON subscriber and forwards `log` records from teloxide and sqlx into it.
///
/// `RUST_LOG` directives, when present, are applied on top of `level`.
pub fn init_tracing(level: Level) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_span_events(FmtSpan::ENTER)
        .log_internal_errors(true)
        .with_line_number(true)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}
