//! CLI arguments for configuring [`Tracing`](super::Tracing) at process startup.

use tracing::level_filters::LevelFilter;

use super::settings::{Build as _, ConsoleLogSettings, OtlpLogSettings, OtlpTraceSettings, Settings};

/// A common set of CLI arguments controlling the telemetry subscribers.
///
/// Flatten this into an operator's `Run` arguments and pass the resulting settings on to
/// [`Tracing::builder`](super::Tracing::builder).
#[derive(Debug, Clone, PartialEq, Eq, clap::Args)]
#[command(next_help_heading = "Telemetry Options")]
pub struct TelemetryOptions {
    /// Enable console log output.
    ///
    /// The log level can be overridden using the `RAMEN_HUB_LOG` environment variable.
    #[arg(long, env, default_value_t = true)]
    pub console_log: bool,

    /// Enable exporting logs via OTLP.
    ///
    /// The exporter target is configured through the standard `OTEL_EXPORTER_OTLP_*`
    /// environment variables.
    #[arg(long, env, default_value_t = false)]
    pub otlp_log: bool,

    /// Enable exporting traces via OTLP.
    ///
    /// The exporter target is configured through the standard `OTEL_EXPORTER_OTLP_*`
    /// environment variables.
    #[arg(long, env, default_value_t = false)]
    pub otlp_trace: bool,
}

impl TelemetryOptions {
    /// Builds the [`ConsoleLogSettings`] for the console log subscriber out of these options.
    pub fn console_log_settings(&self, env_var: &'static str) -> ConsoleLogSettings {
        Settings::builder()
            .with_environment_variable(env_var)
            .with_default_level(LevelFilter::INFO)
            .enabled(self.console_log)
            .console_log_settings_builder()
            .build()
    }

    /// Builds the [`OtlpLogSettings`] for the OTLP log subscriber out of these options.
    pub fn otlp_log_settings(&self, env_var: &'static str) -> OtlpLogSettings {
        Settings::builder()
            .with_environment_variable(env_var)
            .with_default_level(LevelFilter::DEBUG)
            .enabled(self.otlp_log)
            .otlp_log_settings_builder()
            .build()
    }

    /// Builds the [`OtlpTraceSettings`] for the OTLP trace subscriber out of these options.
    pub fn otlp_trace_settings(&self, env_var: &'static str) -> OtlpTraceSettings {
        Settings::builder()
            .with_environment_variable(env_var)
            .with_default_level(LevelFilter::INFO)
            .enabled(self.otlp_trace)
            .otlp_trace_settings_builder()
            .build()
    }
}
