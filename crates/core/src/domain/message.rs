// Message Domain Model

use serde::{Deserialize, Serialize};

/// Item transferred by the simulation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Producer identity that created the message
    pub producer: String,
    /// 1-based position within the producer's quota
    pub sequence: usize,
    /// Human-readable label, e.g. "Msg-P3-7"
    pub label: String,
}

impl Message {
    pub fn new(producer: impl Into<String>, label_prefix: &str, sequence: usize) -> Self {
        Self {
            producer: producer.into(),
            sequence,
            label: format!("{}-{}", label_prefix, sequence),
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_format() {
        let msg = Message::new("producer-3", "Msg-P3", 7);
        assert_eq!(msg.label, "Msg-P3-7");
        assert_eq!(msg.to_string(), "Msg-P3-7");
        assert_eq!(msg.producer, "producer-3");
        assert_eq!(msg.sequence, 7);
    }
}
