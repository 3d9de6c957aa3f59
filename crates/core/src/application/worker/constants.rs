// Worker and simulation constants (no magic values)
use std::time::Duration;

/// Default number of producer workers
pub const DEFAULT_PRODUCERS: usize = 5;

/// Default number of consumer workers
pub const DEFAULT_CONSUMERS: usize = 2;

/// Default quota per producer
pub const DEFAULT_MESSAGES_PER_PRODUCER: usize = 10;

/// Default queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 5;

/// Upper bound for the whole simulation before stragglers are cancelled (30s)
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);

/// Time cancelled workers get to report back before being detached (5s)
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Max simulated work between produces (exclusive upper bound, 100ms)
pub const DEFAULT_PRODUCER_DELAY_MAX: Duration = Duration::from_millis(100);

/// Max simulated processing after each consume (exclusive upper bound, 150ms)
pub const DEFAULT_CONSUMER_DELAY_MAX: Duration = Duration::from_millis(150);

/// Label prefix for generated messages; producer index is appended
pub const MESSAGE_LABEL_PREFIX: &str = "Msg";
