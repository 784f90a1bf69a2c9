//! Tracing configuration for structured logging
//!
//! The library only emits events and spans; the binary installs the
//! subscriber through `TracingConfig`.

#[cfg(feature = "cli")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Configuration for tracing output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingFormat {
    /// Human-readable console output with colors (default for CLI)
    #[default]
    Console,
    /// Compact console output without colors for CI environments
    Compact,
    /// JSON structured logging
    #[cfg(feature = "tracing-json")]
    Json,
}

/// Tracing configuration builder
#[derive(Debug, Default)]
pub struct TracingConfig {
    /// Verbosity level (maps to log levels)
    pub verbosity: u8,
    /// Output format
    pub format: TracingFormat,
    /// Environment filter string (overrides verbosity if set)
    pub env_filter: Option<String>,
    /// Session ID for correlation
    pub session_id: Option<String>,
}

impl TracingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity level (0-2+)
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Set custom environment filter
    #[must_use]
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Set session ID for run correlation
    #[must_use]
    pub fn with_session_id<S: Into<String>>(mut self, session_id: S) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Convert verbosity level to tracing filter string
    #[must_use]
    pub fn verbosity_to_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "info",  // Default: transitions and results
            1 => "debug", // -v: collaborator details, timings
            _ => "trace", // -vv: resampling and tensor shapes
        }
    }

    /// Initialize the global tracing subscriber
    #[cfg(feature = "cli")]
    pub fn init(self) -> anyhow::Result<()> {
        use tracing_subscriber::fmt;

        let filter = match &self.env_filter {
            Some(env_filter) => EnvFilter::try_new(env_filter)?,
            None => EnvFilter::try_new(self.verbosity_to_filter())?,
        };
        let registry = Registry::default().with(filter);

        match self.format {
            TracingFormat::Console => {
                let fmt_layer = fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact();
                registry.with(fmt_layer).try_init()?;
            },
            TracingFormat::Compact => {
                let fmt_layer = fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .compact();
                registry.with(fmt_layer).try_init()?;
            },
            #[cfg(feature = "tracing-json")]
            TracingFormat::Json => {
                let fmt_layer = fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr);
                registry.with(fmt_layer).try_init()?;
            },
        }

        if let Some(session_id) = &self.session_id {
            tracing::debug!(session_id = %session_id, "Studio session started");
        }

        Ok(())
    }
}

/// Initialize tracing with CLI-friendly defaults and a fresh session id
///
/// `RUST_LOG` takes precedence over the verbosity count when set.
#[cfg(feature = "cli")]
pub fn init_cli_tracing(verbosity: u8, format: TracingFormat) -> anyhow::Result<String> {
    let session_id = uuid::Uuid::new_v4().to_string();

    let mut config = TracingConfig::new()
        .with_verbosity(verbosity)
        .with_format(format)
        .with_session_id(session_id.clone());
    if let Ok(filter) = std::env::var(EnvFilter::DEFAULT_ENV) {
        config = config.with_env_filter(filter);
    }
    config.init()?;

    Ok(session_id)
}

/// Span creation helpers for session transitions
pub mod spans {
    use std::path::Path;
    use tracing::{Level, Span};

    /// Span for the Load transition
    pub fn load(path: &Path) -> Span {
        tracing::span!(Level::INFO, "load", path = %path.display())
    }

    /// Span for a background removal run
    pub fn removal(backend: &str, dimensions: (u32, u32), generation: u64) -> Span {
        tracing::span!(
            Level::INFO,
            "remove_background",
            backend = %backend,
            width = dimensions.0,
            height = dimensions.1,
            generation
        )
    }

    /// Span for the Save transition
    pub fn save(path: &Path, format: &str) -> Span {
        tracing::span!(
            Level::INFO,
            "save",
            path = %path.display(),
            format = %format
        )
    }

    /// Span for preview rendering
    pub fn preview(slot: &str, fit_box: &str) -> Span {
        tracing::span!(Level::DEBUG, "preview", slot = %slot, fit_box = %fit_box)
    }
}

/// Event helpers for common logging patterns
pub mod events {
    use tracing::{error, info};

    /// Log a user-facing progress update
    pub fn progress(message: &str) {
        info!("{message}");
    }

    /// Log a rejected transition with its cause chain
    pub fn error_with_context(error: &dyn std::error::Error, context: &str) {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        error!(
            error = %error,
            causes = ?causes,
            context = %context,
            "Operation failed"
        );
    }
}
