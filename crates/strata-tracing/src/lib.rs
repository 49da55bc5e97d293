//! Tracing setup shared by the strata crates, their tests and benches.
//!
//! The runtime logs through plain `tracing` macros; this crate decides where
//! those events go. Filtering is split in two: one level for the runtime's
//! own targets (`strata_core`, `strata_tracing`) and one for everything else,
//! so that `debug` output from task dispatch does not drag in third-party
//! noise.
//!
//! ```text
//! use strata_tracing::{init_global_tracing, TracingConfig};
//!
//! init_global_tracing(&TracingConfig::from_env())?;
//! ```

pub mod timing;

#[macro_use]
pub mod macros;

use std::env;
use tracing::level_filters::LevelFilter;
use tracing::Subscriber;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter, Registry};

pub use tracing::{debug, error, info, trace, warn};

/// Preset name: `local`, `ci` or `test`
pub const PROFILE_ENV: &str = "STRATA_TRACING_PROFILE";
/// Full filter directives, replacing the level split
pub const DIRECTIVES_ENV: &str = "STRATA_TRACING_DIRECTIVES";
/// `pretty`, `compact` or `json`
pub const FORMAT_ENV: &str = "STRATA_TRACING_FORMAT";
/// `1`/`true` to log span close events with busy/idle times
pub const SPAN_TIMING_ENV: &str = "STRATA_TRACING_SPANS";

/// Targets that follow [`TracingConfig::runtime_level`]
pub const RUNTIME_TARGETS: &[&str] = &["strata_core", "strata_tracing"];

#[derive(Clone, Debug)]
pub struct TracingConfig {
    /// Explicit directives; when set, both levels below are ignored
    pub directives: Option<String>,
    /// Level for [`RUNTIME_TARGETS`]
    pub runtime_level: LevelFilter,
    /// Level for every other target
    pub default_level: LevelFilter,
    /// Emit a close event per span (e.g. one per `execute_task`)
    pub span_timing: bool,
    pub output: TracingOutput,
    pub ansi: bool,
    /// Write through libtest's capture instead of stdout
    pub test_writer: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::for_local()
    }
}

impl TracingConfig {
    /// Runtime events at info, pretty and coloured
    pub fn for_local() -> Self {
        Self {
            directives: None,
            runtime_level: LevelFilter::INFO,
            default_level: LevelFilter::WARN,
            span_timing: false,
            output: TracingOutput::Pretty,
            ansi: true,
            test_writer: false,
        }
    }

    /// Runtime events at debug with span timings, as JSON lines
    pub fn for_ci() -> Self {
        Self {
            runtime_level: LevelFilter::DEBUG,
            default_level: LevelFilter::INFO,
            span_timing: true,
            output: TracingOutput::Json,
            ansi: false,
            ..Self::for_local()
        }
    }

    /// Warnings only, compact, captured per test
    pub fn for_tests() -> Self {
        Self {
            runtime_level: LevelFilter::WARN,
            default_level: LevelFilter::WARN,
            output: TracingOutput::Compact,
            ansi: false,
            test_writer: true,
            ..Self::for_local()
        }
    }

    /// Preset chosen by `STRATA_TRACING_PROFILE`, then adjusted by the
    /// directives, format and span-timing variables. Unparseable values are
    /// ignored.
    pub fn from_env() -> Self {
        let profile = env::var(PROFILE_ENV).unwrap_or_default();
        let mut config = match profile.trim().to_ascii_lowercase().as_str() {
            "ci" => Self::for_ci(),
            "test" | "tests" => Self::for_tests(),
            _ => Self::for_local(),
        };

        config.directives = env::var(DIRECTIVES_ENV)
            .ok()
            .filter(|d| !d.trim().is_empty())
            .or(config.directives);

        if let Some(output) = env::var(FORMAT_ENV).ok().as_deref().and_then(TracingOutput::parse) {
            config.output = output;
            config.ansi &= output == TracingOutput::Pretty;
        }

        if let Ok(flag) = env::var(SPAN_TIMING_ENV) {
            config.span_timing = matches!(flag.trim(), "1" | "true" | "yes");
        }

        config
    }

    /// Same config with the runtime targets at `level`
    pub fn with_runtime_level(mut self, level: LevelFilter) -> Self {
        self.runtime_level = level;
        self
    }

    /// Directive string this config filters with
    pub fn filter_directives(&self) -> String {
        if let Some(directives) = &self.directives {
            return directives.clone();
        }
        let mut parts = vec![self.default_level.to_string().to_ascii_lowercase()];
        parts.extend(
            RUNTIME_TARGETS
                .iter()
                .map(|target| format!("{target}={}", self.runtime_level.to_string().to_ascii_lowercase())),
        );
        parts.join(",")
    }

    fn env_filter(&self) -> Result<EnvFilter, TracingSetupError> {
        let directives = self.filter_directives();
        EnvFilter::try_new(&directives).map_err(|err| TracingSetupError::InvalidFilter {
            directives,
            reason: err.to_string(),
        })
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_timing {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TracingOutput {
    Compact,
    Pretty,
    Json,
}

impl TracingOutput {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TracingSetupError {
    #[error("invalid tracing directives `{directives}`: {reason}")]
    InvalidFilter { directives: String, reason: String },

    #[error("global tracing subscriber already installed: {0}")]
    SubscriberInit(#[from] TryInitError),
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Box a formatter layer, redirecting it to the test writer if asked.
macro_rules! boxed_fmt_layer {
    ($layer:expr, $config:expr) => {{
        let layer = $layer
            .with_span_events($config.span_events())
            .with_ansi($config.ansi);
        if $config.test_writer {
            Box::new(layer.with_test_writer()) as BoxedLayer
        } else {
            Box::new(layer) as BoxedLayer
        }
    }};
}

/// Filter plus formatter for callers that build their own registry
pub fn subscriber_layers(config: &TracingConfig) -> Result<(EnvFilter, BoxedLayer), TracingSetupError> {
    let filter = config.env_filter()?;
    let layer = match config.output {
        TracingOutput::Compact => boxed_fmt_layer!(tracing_fmt::layer().compact(), config),
        TracingOutput::Pretty => boxed_fmt_layer!(tracing_fmt::layer().pretty(), config),
        TracingOutput::Json => boxed_fmt_layer!(tracing_fmt::layer().json().flatten_event(true), config),
    };
    Ok((filter, layer))
}

/// Subscriber for `config`, not yet installed
pub fn build_subscriber(config: &TracingConfig) -> Result<impl Subscriber + Send + Sync, TracingSetupError> {
    let (filter, layer) = subscriber_layers(config)?;
    Ok(Registry::default().with(layer).with(filter))
}

pub fn init_global_tracing(config: &TracingConfig) -> Result<(), TracingSetupError> {
    build_subscriber(config)?.try_init()?;
    Ok(())
}

/// Install the test preset; calls after the first are no-ops
pub fn init_test_tracing() {
    let _ = init_global_tracing(&TracingConfig::for_tests());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [PROFILE_ENV, DIRECTIVES_ENV, FORMAT_ENV, SPAN_TIMING_ENV] {
            env::remove_var(key);
        }
    }

    #[test]
    fn level_split_directives() {
        let config = TracingConfig::for_local().with_runtime_level(LevelFilter::TRACE);
        assert_eq!(
            config.filter_directives(),
            "warn,strata_core=trace,strata_tracing=trace"
        );
    }

    #[test]
    fn explicit_directives_win() {
        let config = TracingConfig {
            directives: Some("strata_core::runtime=debug".to_string()),
            ..TracingConfig::for_ci()
        };
        assert_eq!(config.filter_directives(), "strata_core::runtime=debug");
    }

    #[test]
    fn invalid_directives_rejected() {
        let config = TracingConfig {
            directives: Some("strata_core=loud".to_string()),
            ..TracingConfig::for_tests()
        };
        assert!(matches!(
            build_subscriber(&config),
            Err(TracingSetupError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn every_output_builds() {
        for output in [TracingOutput::Compact, TracingOutput::Pretty, TracingOutput::Json] {
            let config = TracingConfig {
                output,
                span_timing: true,
                ..TracingConfig::for_tests()
            };
            assert!(build_subscriber(&config).is_ok());
        }
    }

    #[test]
    #[serial]
    fn ci_profile_from_env() {
        clear_env();
        env::set_var(PROFILE_ENV, "CI");
        env::set_var(FORMAT_ENV, "compact");
        env::set_var(SPAN_TIMING_ENV, "0");

        let config = TracingConfig::from_env();
        clear_env();

        assert_eq!(config.runtime_level, LevelFilter::DEBUG);
        assert_eq!(config.output, TracingOutput::Compact);
        assert!(!config.span_timing);
        assert!(!config.ansi);
    }

    #[test]
    #[serial]
    fn unknown_env_values_keep_preset() {
        clear_env();
        env::set_var(FORMAT_ENV, "xml");
        env::set_var(DIRECTIVES_ENV, "   ");

        let config = TracingConfig::from_env();
        clear_env();

        assert_eq!(config.output, TracingOutput::Pretty);
        assert!(config.ansi);
        assert!(config.directives.is_none());
    }
}
