//! Default topic generation.
//!
//! Descriptors created without a requested topic get `/tfsensors/<word><n>`,
//! where `<n>` counts the descriptors of that class named so far. Counters
//! only grow: removing a descriptor never frees its number.

use tf_core::SensorClass;

/// Namespace every generated topic lives under.
pub const TOPIC_NAMESPACE: &str = "tfsensors";

/// Per-class running counters for generated topic names.
#[derive(Debug, Clone, Default)]
pub struct TopicNamer {
    counters: [u32; SensorClass::ALL.len()],
}

impl TopicNamer {
    /// Namer with every counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next topic for `class`.
    ///
    /// Returns `None` for classes that never publish; their counter is left
    /// untouched.
    pub fn generate(&mut self, class: SensorClass) -> Option<String> {
        let topic = self.peek(class)?;
        self.commit(class);
        Some(topic)
    }

    /// The topic [`Self::generate`] would return next, without consuming it.
    pub fn peek(&self, class: SensorClass) -> Option<String> {
        let word = class.topic_word()?;
        let next = self.counters[class.index()] + 1;
        Some(format!("/{}/{}{}", TOPIC_NAMESPACE, word, next))
    }

    /// Consume the number handed out by [`Self::peek`].
    pub fn commit(&mut self, class: SensorClass) {
        if class.is_published() {
            self.counters[class.index()] += 1;
        }
    }

    /// Number of topics generated so far for `class`.
    pub fn count(&self, class: SensorClass) -> u32 {
        self.counters[class.index()]
    }
}
