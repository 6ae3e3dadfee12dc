use std::time::Duration;

/// Runtime statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProcessingStats {
    pub records_processed: usize,
    pub records_output: usize,
    /// Records outside the time window or without a route
    pub records_filtered: usize,
    pub errors: usize,
    pub processing_time: Duration,
}

impl ProcessingStats {
    pub fn merge(&mut self, other: &ProcessingStats) {
        self.records_processed += other.records_processed;
        self.records_output += other.records_output;
        self.records_filtered += other.records_filtered;
        self.errors += other.errors;
        self.processing_time += other.processing_time;
    }
}

/// Result of handling a single record
#[derive(Debug)]
pub enum ProcessResult {
    Output(String),
    Filtered,
}
