// Command-line / environment configuration

use clap::{Parser, ValueEnum};
use handoff_core::application::worker::constants::*;
use handoff_core::application::SimulationConfig;
use handoff_core::domain::QueueError;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "handoff")]
#[command(about = "Bounded producer-consumer simulation", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Number of producer workers
    #[arg(long, env = "HANDOFF_PRODUCERS", default_value_t = DEFAULT_PRODUCERS)]
    pub producers: usize,

    /// Number of consumer workers
    #[arg(long, env = "HANDOFF_CONSUMERS", default_value_t = DEFAULT_CONSUMERS)]
    pub consumers: usize,

    /// Messages each producer generates
    #[arg(long, env = "HANDOFF_MESSAGES_PER_PRODUCER", default_value_t = DEFAULT_MESSAGES_PER_PRODUCER)]
    pub messages_per_producer: usize,

    /// Queue capacity (must be positive)
    #[arg(long, env = "HANDOFF_QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY as i64, allow_negative_numbers = true)]
    pub capacity: i64,

    /// Seconds to wait for all messages before cancelling workers
    #[arg(long, env = "HANDOFF_TIMEOUT_SECS", default_value_t = DEFAULT_COMPLETION_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Seconds cancelled workers get to stop
    #[arg(long, env = "HANDOFF_GRACE_SECS", default_value_t = DEFAULT_GRACE_PERIOD.as_secs())]
    pub grace_secs: u64,

    /// Max simulated work after each produce, in ms
    #[arg(long, env = "HANDOFF_PRODUCER_DELAY_MS", default_value_t = DEFAULT_PRODUCER_DELAY_MAX.as_millis() as u64)]
    pub producer_delay_ms: u64,

    /// Max simulated processing after each consume, in ms
    #[arg(long, env = "HANDOFF_CONSUMER_DELAY_MS", default_value_t = DEFAULT_CONSUMER_DELAY_MAX.as_millis() as u64)]
    pub consumer_delay_ms: u64,

    /// Disable simulated delays entirely
    #[arg(long)]
    pub no_delay: bool,

    /// Report format
    #[arg(long, env = "HANDOFF_OUTPUT", value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

impl Cli {
    /// Resolve into a validated simulation config
    pub fn to_config(&self) -> handoff_core::Result<SimulationConfig> {
        let queue_capacity = match usize::try_from(self.capacity) {
            Ok(capacity) if capacity > 0 => capacity,
            _ => {
                return Err(QueueError::InvalidArgument(format!(
                    "capacity must be positive, got {}",
                    self.capacity
                ))
                .into())
            }
        };

        let mut config = SimulationConfig {
            producers: self.producers,
            consumers: self.consumers,
            messages_per_producer: self.messages_per_producer,
            queue_capacity,
            timeout: Duration::from_secs(self.timeout_secs),
            grace_period: Duration::from_secs(self.grace_secs),
            producer_delay_max: Duration::from_millis(self.producer_delay_ms),
            consumer_delay_max: Duration::from_millis(self.consumer_delay_ms),
        };
        if self.no_delay {
            config = config.without_delays();
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_core::AppError;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["handoff"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_match_core_defaults() {
        let config = parse(&[]).to_config().unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn test_overrides_and_no_delay() {
        let cli = parse(&[
            "--producers",
            "3",
            "--consumers",
            "4",
            "--capacity",
            "1",
            "--no-delay",
            "--output",
            "json",
        ]);
        assert_eq!(cli.output, OutputFormat::Json);

        let config = cli.to_config().unwrap();
        assert_eq!(config.producers, 3);
        assert_eq!(config.consumers, 4);
        assert_eq!(config.queue_capacity, 1);
        assert!(config.producer_delay_max.is_zero());
        assert!(config.consumer_delay_max.is_zero());
    }

    #[test]
    fn test_non_positive_capacity_rejected() {
        for raw in ["0", "-3"] {
            let err = parse(&["--capacity", raw]).to_config().unwrap_err();
            assert!(
                matches!(err, AppError::Queue(QueueError::InvalidArgument(_))),
                "capacity {} should be rejected, got {:?}",
                raw,
                err
            );
        }
    }

    #[test]
    fn test_zero_consumers_rejected() {
        let err = parse(&["--consumers", "0"]).to_config().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
