/// Sink for run-level progress messages.
///
/// Components take one of these instead of logging directly so a caller can
/// capture what an unpack run reported.
pub trait Reporter {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Forwards to the `log` facade.
pub struct LogReporter;

impl Reporter for LogReporter {
    fn info(&self, message: &str) {
        log::info!("{}", message);
    }

    fn warn(&self, message: &str) {
        log::warn!("{}", message);
    }
}

#[cfg(test)]
pub use memory::MemoryReporter;
