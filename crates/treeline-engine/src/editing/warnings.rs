/// One-way, fire-and-forget channel for non-fatal corrections the engine
/// made while writing back (clamped levels, elements forced to level 1).
/// The host displays the text verbatim; there are no error codes.
pub trait WarningSink {
    fn warn(&mut self, message: &str);
}

/// Collects warnings in memory; the usual sink for hosts and tests.
#[derive(Debug, Default)]
pub struct CollectedWarnings {
    messages: Vec<String>,
}

impl CollectedWarnings {
    pub fn new() -> Self {
        CollectedWarnings::default()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }
}

impl WarningSink for CollectedWarnings {
    fn warn(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}
