use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use evprint::input_format::repository_files;
use evprint::pipeline::RouteConfig;
use evprint::{ErrorStrategy, EventPipeline, FileConfig, PipelineConfig, ProcessingStats};

const EXAMPLES: &str = r#"Examples:
  Print every event of a recording in its default text form:
    evprint "*" "*" recording.jsonl

  Print every event through one template:
    evprint "*" "*" "{eventName} {startTime} [{...}]" recording.jsonl

  Print the 'log.' events of the last two hours:
    evprint 2h "log.*" "{eventName,0d,C} {startTime,dt:yyyy-MM-dd HH:mm:ss.SSS} [{eventThread.javaName}] {origin,0d}: {message} {throwable,o,n}" recording.jsonl

  Follow thread starts arriving on stdin:
    tail -f events.jsonl | evprint "*" jdk.ThreadStart "{startTime} name: {thread.javaName}, group: {thread.group.name}" -

Placeholder parameters: n (newline before), o (optional, empty when missing),
c / C (lower / upper case), <N>d (keep the last N+1 dotted segments),
dt:<pattern> (format a timestamp, must come first)."#;

#[derive(Parser)]
#[command(name = "evprint")]
#[command(about = "Print structured trace events through per-event-type templates")]
#[command(version)]
#[command(after_help = EXAMPLES)]
struct Args {
    /// <RANGE> <EVENT> [<TEMPLATE>] ... <INPUT>; only <INPUT> when --config is used.
    /// INPUT is a .jsonl file, a directory of them, or - for stdin
    #[arg(value_name = "ARGS", required = true)]
    args: Vec<String>,

    /// YAML file with range and routes
    #[arg(short = 'c', long = "config")]
    config_file: Option<PathBuf>,

    /// Display timestamps in UTC instead of the local time zone
    #[arg(long)]
    utc: bool,

    /// Skip records that fail to decode or render instead of stopping
    #[arg(long)]
    skip_errors: bool,

    /// Debug mode - show processing details
    #[arg(long)]
    debug: bool,

    /// Output file (default: stdout)
    #[arg(short = 'o', long = "output")]
    output_file: Option<PathBuf>,

    /// Buffer size for I/O
    #[arg(long, default_value = "65536")] // 64KB
    buffer_size: usize,

    /// Maximum line length
    #[arg(long, default_value = "1048576")] // 1MB
    max_line_length: usize,
}

impl Args {
    /// Split the positional arguments into routes and the input.
    fn invocation(&self) -> Result<(FileConfig, String), String> {
        if let Some(path) = &self.config_file {
            let [input] = self.args.as_slice() else {
                return Err("With --config only the input argument is expected".to_string());
            };
            let mut config = FileConfig::load(path)
                .map_err(|e| format!("Failed to load '{}': {}", path.display(), e))?;
            config.utc |= self.utc;
            return Ok((config, input.clone()));
        }

        let [range, middle @ .., input] = self.args.as_slice() else {
            return Err("Expected <RANGE> <EVENT> [<TEMPLATE>] ... <INPUT>".to_string());
        };
        let routes = match middle {
            [] => return Err("Expected at least one event name".to_string()),
            [event] => vec![RouteConfig {
                event: event.clone(),
                template: None,
            }],
            pairs if pairs.len() % 2 == 0 => pairs
                .chunks(2)
                .map(|pair| RouteConfig {
                    event: pair[0].clone(),
                    template: Some(pair[1].clone()),
                })
                .collect(),
            _ => return Err("Every event name needs a template when more than one is given".to_string()),
        };

        Ok((
            FileConfig {
                range: Some(range.clone()),
                utc: self.utc,
                routes,
            },
            input.clone(),
        ))
    }
}

fn main() {
    let args = Args::parse();

    let level = if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    if let Err(e) = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    match run(args) {
        Ok(stats) if stats.errors > 0 => std::process::exit(1),
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<ProcessingStats> {
    let (file_config, input) = args.invocation().map_err(anyhow::Error::msg)?;

    // Every template is compiled before the first record is read
    let router = file_config.build_router(file_config.zone(), Utc::now())?;
    log::debug!(
        "{} route(s), window cutoff: {:?}",
        router.len(),
        router.window().cutoff()
    );

    let config = PipelineConfig {
        error_strategy: if args.skip_errors {
            ErrorStrategy::Skip
        } else {
            ErrorStrategy::FailFast
        },
        buffer_size: args.buffer_size,
        max_line_length: args.max_line_length,
    };
    let mut pipeline = EventPipeline::new(router, config);

    let mut output: Box<dyn Write> = if let Some(output_path) = &args.output_file {
        let file = File::create(output_path)
            .with_context(|| format!("Failed to create output file '{}'", output_path.display()))?;
        Box::new(io::BufWriter::with_capacity(args.buffer_size, file))
    } else {
        Box::new(io::BufWriter::with_capacity(args.buffer_size, io::stdout()))
    };

    if input == "-" {
        let stdin = io::stdin();
        pipeline.process_stream(stdin.lock(), &mut output, None)?;
    } else {
        let path = Path::new(&input);
        let files = if path.is_dir() {
            repository_files(path)
                .with_context(|| format!("Failed to list repository '{}'", path.display()))?
        } else {
            vec![path.to_path_buf()]
        };
        for file_path in files {
            if pipeline.is_output_closed() {
                log::debug!("output closed, not reading {}", file_path.display());
                break;
            }
            let file = File::open(&file_path)
                .with_context(|| format!("Failed to open input file '{}'", file_path.display()))?;
            let name = file_path.display().to_string();
            log::debug!("reading {}", name);
            pipeline.process_stream(
                BufReader::with_capacity(pipeline.config().buffer_size, file),
                &mut output,
                Some(&name),
            )?;
        }
    }

    pipeline.finish(&mut output)?;

    let stats = pipeline.get_stats().clone();
    log::debug!(
        "records: {} processed, {} output, {} filtered, {} errors in {:?}",
        stats.records_processed,
        stats.records_output,
        stats.records_filtered,
        stats.errors,
        stats.processing_time
    );
    Ok(stats)
}
