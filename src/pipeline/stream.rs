// src/pipeline/stream.rs
use std::io::{BufRead, Write};
use std::time::Instant;

use crate::error::ProcessingError;
use crate::input_format::{JsonlRecordParser, RecordParser};
use crate::pipeline::config::{ErrorStrategy, PipelineConfig};
use crate::pipeline::context::{ProcessResult, ProcessingStats};
use crate::record::Record;
use crate::router::Router;

/// Pulls records one at a time, routes them and writes one text block each
pub struct EventPipeline {
    router: Router,
    parser: Box<dyn RecordParser>,
    config: PipelineConfig,
    stats: ProcessingStats,
    output_closed: bool,
}

impl EventPipeline {
    pub fn new(router: Router, config: PipelineConfig) -> Self {
        EventPipeline {
            router,
            parser: Box::new(JsonlRecordParser::new()),
            config,
            stats: ProcessingStats::default(),
            output_closed: false,
        }
    }

    pub fn with_parser(mut self, parser: Box<dyn RecordParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// True once a write hit a closed reader; later streams are not read.
    pub fn is_output_closed(&self) -> bool {
        self.output_closed
    }

    /// Flush buffered output. A reader that went away counts as done.
    pub fn finish<W: Write>(&mut self, output: &mut W) -> Result<(), ProcessingError> {
        if self.output_closed {
            return Ok(());
        }
        match output.flush() {
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                self.output_closed = true;
                Ok(())
            }
            result => result.map_err(ProcessingError::IoError),
        }
    }

    /// Process a line-oriented record stream (file, stdin, ...)
    pub fn process_stream<R: BufRead, W: Write>(
        &mut self,
        input: R,
        output: &mut W,
        filename: Option<&str>,
    ) -> Result<ProcessingStats, ProcessingError> {
        let start_time = Instant::now();
        let source = filename.unwrap_or("<stdin>");
        let mut file_stats = ProcessingStats::default();
        let mut line_number = 0;
        if self.output_closed {
            return Ok(file_stats);
        }

        for line_result in input.lines() {
            let line = match line_result {
                Ok(line) => line,
                Err(e) => {
                    if e.kind() == std::io::ErrorKind::UnexpectedEof {
                        break;
                    }
                    return Err(ProcessingError::IoError(e));
                }
            };
            line_number += 1;

            if line.trim().is_empty() {
                continue;
            }
            file_stats.records_processed += 1;

            if line.len() > self.config.max_line_length {
                let error = ProcessingError::LineTooLong {
                    length: line.len(),
                    max_length: self.config.max_line_length,
                };
                self.handle_error(error, &mut file_stats, source, line_number)?;
                continue;
            }

            let record = match self.parser.parse_line(&line) {
                Ok(record) => record,
                Err(message) => {
                    let error = ProcessingError::Input {
                        line: line_number,
                        message,
                    };
                    self.handle_error(error, &mut file_stats, source, line_number)?;
                    continue;
                }
            };

            if !self.emit(&record, output, &mut file_stats, source, line_number)? {
                self.output_closed = true;
                break;
            }
        }

        file_stats.processing_time = start_time.elapsed();
        self.stats.merge(&file_stats);
        Ok(file_stats)
    }

    /// Process records that are already decoded
    pub fn process_records<I, W>(&mut self, records: I, output: &mut W) -> Result<ProcessingStats, ProcessingError>
    where
        I: IntoIterator<Item = Record>,
        W: Write,
    {
        let start_time = Instant::now();
        let mut stats = ProcessingStats::default();
        if self.output_closed {
            return Ok(stats);
        }

        for (index, record) in records.into_iter().enumerate() {
            stats.records_processed += 1;
            if !self.emit(&record, output, &mut stats, "<records>", index + 1)? {
                self.output_closed = true;
                break;
            }
        }

        stats.processing_time = start_time.elapsed();
        self.stats.merge(&stats);
        Ok(stats)
    }

    pub fn process_record(&self, record: &Record) -> Result<ProcessResult, ProcessingError> {
        match self.router.dispatch(record) {
            Ok(Some(text)) => Ok(ProcessResult::Output(text)),
            Ok(None) => Ok(ProcessResult::Filtered),
            Err(source) => Err(ProcessingError::Render {
                event: record.event_type.clone(),
                source,
            }),
        }
    }

    /// Returns `false` once the output is closed.
    fn emit<W: Write>(
        &self,
        record: &Record,
        output: &mut W,
        stats: &mut ProcessingStats,
        source: &str,
        position: usize,
    ) -> Result<bool, ProcessingError> {
        match self.process_record(record) {
            Ok(ProcessResult::Output(text)) => {
                if let Err(e) = writeln!(output, "{}", text) {
                    if e.kind() == std::io::ErrorKind::BrokenPipe {
                        return Ok(false);
                    }
                    return Err(ProcessingError::IoError(e));
                }
                stats.records_output += 1;
            }
            Ok(ProcessResult::Filtered) => {
                stats.records_filtered += 1;
            }
            Err(error) => self.handle_error(error, stats, source, position)?,
        }
        Ok(true)
    }

    fn handle_error(
        &self,
        error: ProcessingError,
        stats: &mut ProcessingStats,
        source: &str,
        position: usize,
    ) -> Result<(), ProcessingError> {
        match self.config.error_strategy {
            ErrorStrategy::FailFast => Err(error),
            ErrorStrategy::Skip => {
                stats.errors += 1;
                log::warn!("{}:{}: {}, skipping", source, position, error);
                Ok(())
            }
        }
    }

    /// Get current accumulated stats
    pub fn get_stats(&self) -> &ProcessingStats {
        &self.stats
    }
}
