//! The pipeline orchestrator.
//!
//! A [`Ripper`] owns one record source, one sink, the dictionary, the
//! tokenizer and the filter chain of a run. It moves through a fixed
//! lifecycle:
//!
//! ```text
//! Created -> HeaderWritten -> Processing -> Finished | Failed
//! ```
//!
//! and is closed exactly once afterwards, either explicitly through
//! [`Ripper::close`], by a failing [`Ripper::process_stream`], or on drop.
//! Closing moves any state except `Failed` to `Closed`; a failed ripper has
//! already been closed and keeps reporting `Failed`.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use super::assembler::{RowAssembler, join_tokens, output_header};
use super::progress::{
    ClosureProgressReporter, LogProgressReporter, PositionCounter, ProgressMonitor,
    ProgressReporter, ThroughputSample,
};
use crate::config::{
    ConfigValidationError, DEFAULT_PROGRESS_INTERVAL_SECS, DEFAULT_SEPARATOR, DEFAULT_SUFFIX,
    EchoTarget, RipperConfig, validate_column,
};
use crate::error::{Result, RipperError};
use crate::filters::{FilterChain, FilterSet, StopWords, TextFilter, TokenFilter};
use crate::io::{CsvSink, CsvSource, DiscardSink, RecordSink, RecordSource};
use crate::tokenizer::{Dictionary, DictionaryTokenizer, Tokenizer};
use crate::types::{Header, OutputMode, Token, TokenClass};

/// Lifecycle of a [`Ripper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RipperState {
    Created,
    HeaderWritten,
    Processing,
    Finished,
    Failed,
    Closed,
}

impl std::fmt::Display for RipperState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::HeaderWritten => "header written",
            Self::Processing => "processing",
            Self::Finished => "finished",
            Self::Failed => "failed",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Streams records through tokenization and writes them back out.
///
/// Use [`Ripper::builder()`] for in-process sources and sinks, or
/// [`Ripper::from_config`] for the file-backed setup used by the CLI.
///
/// # Example
///
/// ```rust,ignore
/// use lex_ripper::{Ripper, MemorySource, MemorySink, Header, Record, OutputMode};
///
/// let sink = MemorySink::new();
/// let mut ripper = Ripper::builder()
///     .source(MemorySource::new(Header::new(["text"]), vec![Record::new(["house cat"])]))
///     .sink(sink.clone())
///     .column("text")
///     .build()?;
///
/// ripper.write_header(OutputMode::Append)?;
/// let rows = ripper.process_stream()?;
/// ripper.close()?;
/// ```
pub struct Ripper {
    source: Option<Box<dyn RecordSource>>,
    sink: Option<Box<dyn RecordSink>>,
    dictionary: Option<Dictionary>,
    tokenizer: Box<dyn Tokenizer>,
    chain: FilterChain,
    column: String,
    target_index: usize,
    input_header: Header,
    output: Option<(Header, OutputMode)>,
    quote_columns: Vec<String>,
    separator: String,
    suffix: String,
    show: bool,
    debug: bool,
    echo: Box<dyn Write + Send>,
    progress_interval: Duration,
    progress_reporter: Arc<dyn ProgressReporter>,
    position: PositionCounter,
    state: RipperState,
    closed: bool,
}

// A ripper may be set up on one thread and driven on another
static_assertions::assert_impl_all!(Ripper: Send);

impl Ripper {
    /// Create a new ripper builder.
    pub fn builder() -> RipperBuilder {
        RipperBuilder::default()
    }

    /// Set up a file-backed ripper from a configuration.
    ///
    /// Resources are acquired in order: input, dictionary, stop words, then
    /// the output file. A failure at any step releases what was already
    /// opened, and no output file is created unless everything before it
    /// succeeded.
    pub fn from_config(config: &RipperConfig) -> Result<Self> {
        config.validate()?;

        let source = CsvSource::open(&config.input)?;
        if source.header().index_of(&config.column).is_none() {
            return Err(RipperError::ColumnNotFound(config.column.clone()));
        }

        let dictionary = match &config.dictionary {
            Some(path) => Dictionary::from_path(path)?,
            None => Dictionary::builtin(),
        };

        let stopwords = config
            .stopwords
            .as_ref()
            .map(StopWords::from_path)
            .transpose()?;

        let builder = Ripper::builder()
            .source(source)
            .column(config.column.clone())
            .dictionary(dictionary)
            .separator(config.separator.clone())
            .suffix(config.suffix.clone())
            .show(config.show)
            .debug(config.debug)
            .progress_interval(Duration::from_secs(config.progress_interval_secs));

        let builder = match config.echo {
            EchoTarget::Stdout => builder.echo_to(std::io::stdout()),
            EchoTarget::Stderr => builder.echo_to(std::io::stderr()),
        };

        let builder = match &config.output {
            Some(path) => builder.sink(CsvSink::create(path).map_err(|e| {
                RipperError::SinkWrite {
                    row: 0,
                    reason: format!("cannot create '{}': {e}", path.display()),
                }
            })?),
            None => {
                debug!("No output path, rows will be discarded");
                builder.sink(DiscardSink)
            }
        };

        let mut ripper = builder.build()?;
        ripper.set_quote_columns(config.quote_columns.iter().cloned())?;

        if let Some(stopwords) = stopwords {
            info!("Registered {} stop words", stopwords.len());
            ripper.add_post_filter(stopwords)?;
        }

        Ok(ripper)
    }

    pub fn state(&self) -> RipperState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Name of the column being tokenized.
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn input_header(&self) -> &Header {
        &self.input_header
    }

    /// Header written by [`write_header`](Self::write_header), if any.
    pub fn output_header(&self) -> Option<&Header> {
        self.output.as_ref().map(|(header, _)| header)
    }

    /// Names of the registered filter units in execution order.
    pub fn filter_names(&self) -> Vec<String> {
        self.chain.unit_names()
    }

    /// Number of records fully processed so far.
    pub fn get_current_position(&self) -> u64 {
        self.position.get()
    }

    /// Shared handle to the position counter, readable from any thread.
    pub fn position_counter(&self) -> PositionCounter {
        self.position.clone()
    }

    /// Replace the set of output columns that are always quoted.
    pub fn set_quote_columns<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ensure_configurable("set quote columns")?;
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if let Some(name) = names.iter().find(|n| n.trim().is_empty()) {
            return Err(ConfigValidationError::InvalidQuoteColumn(name.clone()).into());
        }
        self.quote_columns = names;
        Ok(())
    }

    pub fn add_pre_filter(&mut self, filter: impl TextFilter + 'static) -> Result<()> {
        self.ensure_configurable("add pre-filter")?;
        debug!("Adding pre-filter '{}'", filter.name());
        self.register(|chain| chain.add_pre_filter(Box::new(filter)), "add pre-filter")
    }

    pub fn add_plugin(&mut self, plugin: impl TokenFilter + 'static) -> Result<()> {
        self.ensure_configurable("add plugin")?;
        debug!("Adding plugin '{}'", plugin.name());
        self.register(|chain| chain.add_plugin(Box::new(plugin)), "add plugin")
    }

    pub fn add_post_filter(&mut self, filter: impl TokenFilter + 'static) -> Result<()> {
        self.ensure_configurable("add post-filter")?;
        debug!("Adding post-filter '{}'", filter.name());
        self.register(|chain| chain.add_post_filter(Box::new(filter)), "add post-filter")
    }

    /// Register a whole [`FilterSet`]: pre-filters, then plugins, then
    /// post-filters, each list in its own order. Units land after any
    /// already registered in the same stage.
    pub fn add_filters(&mut self, filters: FilterSet) -> Result<()> {
        const OPERATION: &str = "add filters";
        self.ensure_configurable(OPERATION)?;
        if !filters.is_empty() {
            debug!("Adding {} filter units: {:?}", filters.len(), filters);
        }

        let FilterSet {
            pre_filters,
            plugins,
            post_filters,
        } = filters;
        for filter in pre_filters {
            self.register(|chain| chain.add_pre_filter(filter), OPERATION)?;
        }
        for plugin in plugins {
            self.register(|chain| chain.add_plugin(plugin), OPERATION)?;
        }
        for filter in post_filters {
            self.register(|chain| chain.add_post_filter(filter), OPERATION)?;
        }
        Ok(())
    }

    /// Replace the reporter that receives throughput samples.
    pub fn set_progress_reporter(&mut self, reporter: Arc<dyn ProgressReporter>) -> Result<()> {
        self.ensure_configurable("set progress reporter")?;
        self.progress_reporter = reporter;
        Ok(())
    }

    /// Write the output header. Must be called exactly once, before
    /// [`process_stream`](Self::process_stream).
    pub fn write_header(&mut self, mode: OutputMode) -> Result<()> {
        const OPERATION: &str = "write header";
        self.ensure_open(OPERATION)?;
        if self.state != RipperState::Created {
            return Err(RipperError::sequence(OPERATION, self.state));
        }

        let appended = format!("{}{}", self.column, self.suffix);
        if mode == OutputMode::Append {
            if self.suffix.is_empty() {
                return Err(ConfigValidationError::EmptySuffix.into());
            }
            if self.input_header.index_of(&appended).is_some() {
                return Err(ConfigValidationError::DuplicateColumn(appended).into());
            }
        }

        let header = output_header(&self.input_header, mode, &appended);
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| RipperError::sequence(OPERATION, "closed"))?;
        sink.write_header(&header)
            .map_err(|e| RipperError::SinkWrite {
                row: 0,
                reason: e.to_string(),
            })?;

        debug!("Wrote {:?} header with {} columns", mode, header.len());
        self.output = Some((header, mode));
        self.state = RipperState::HeaderWritten;
        Ok(())
    }

    /// Run every remaining record through the pipeline.
    ///
    /// Returns the number of records processed. On failure the ripper is
    /// closed before the error is returned; rows written before the failing
    /// one stay in the sink.
    pub fn process_stream(&mut self) -> Result<u64> {
        const OPERATION: &str = "process stream";
        self.ensure_open(OPERATION)?;
        if self.state != RipperState::HeaderWritten {
            return Err(RipperError::sequence(OPERATION, self.state));
        }
        let Some((header, mode)) = self.output.clone() else {
            return Err(RipperError::sequence(OPERATION, self.state));
        };

        self.chain.freeze();
        self.state = RipperState::Processing;

        let assembler = RowAssembler::new(&header, self.target_index, mode, &self.quote_columns);
        info!(
            "Processing column '{}' ({:?} mode, {} filter units)",
            self.column,
            mode,
            self.chain.unit_names().len()
        );

        let monitor = (!self.progress_interval.is_zero()).then(|| {
            ProgressMonitor::start(
                self.position.clone(),
                self.progress_interval,
                self.progress_reporter.clone(),
            )
        });

        let started = Instant::now();
        let result = self.run_loop(&assembler).and_then(|()| self.flush_sink());

        if let Some(monitor) = monitor {
            monitor.stop();
        }

        match result {
            Ok(()) => {
                self.state = RipperState::Finished;
                let rows = self.position.get();
                info!("Processed {} rows in {:.2?}", rows, started.elapsed());
                Ok(rows)
            }
            Err(e) => {
                self.state = RipperState::Failed;
                error!("Processing failed: {}", e);
                if let Err(close_error) = self.close() {
                    warn!("Close after failure also failed: {}", close_error);
                }
                Err(e)
            }
        }
    }

    /// Release the dictionary, flush and close the sink, close the source.
    ///
    /// Calling it again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if self.state != RipperState::Failed {
            self.state = RipperState::Closed;
        }

        self.dictionary.take();
        let flushed = match self.sink.take() {
            Some(mut sink) => sink.flush().map_err(|e| RipperError::SinkWrite {
                row: self.position.get(),
                reason: e.to_string(),
            }),
            None => Ok(()),
        };
        self.source.take();

        debug!("Ripper closed at position {}", self.position.get());
        flushed
    }

    fn run_loop(&mut self, assembler: &RowAssembler) -> Result<()> {
        let Ripper {
            source,
            sink,
            dictionary,
            tokenizer,
            chain,
            target_index,
            input_header,
            separator,
            show,
            debug,
            echo,
            position,
            ..
        } = self;

        let (Some(source), Some(sink), Some(dictionary)) =
            (source.as_mut(), sink.as_mut(), dictionary.as_ref())
        else {
            return Err(RipperError::sequence("process stream", "closed"));
        };

        let width = input_header.len();
        let mut row: u64 = 0;

        while let Some(record) = source.next_record()? {
            row += 1;
            if record.len() != width {
                return Err(RipperError::SourceRead {
                    row,
                    reason: format!("expected {} fields, found {}", width, record.len()),
                });
            }

            let text = record.get(*target_index).unwrap_or_default().to_string();
            let text = chain.apply_pre(text, row)?;

            let tokens = tokenizer
                .tokenize(&text, dictionary)
                .map_err(|source| RipperError::Tokenize {
                    name: tokenizer.name().to_string(),
                    row,
                    source,
                })?;
            let tokens = chain.apply_post(tokens, row)?;

            let joined = join_tokens(&tokens, separator);
            if *show {
                writeln!(echo, "{}", joined)?;
            }
            if *debug {
                write_token_detail(echo, &tokens)?;
            }

            let output = assembler.assemble(&record, joined);
            sink.write_row(&output)
                .map_err(|e| RipperError::SinkWrite {
                    row,
                    reason: e.to_string(),
                })?;

            position.increment();
        }

        Ok(())
    }

    fn flush_sink(&mut self) -> Result<()> {
        let row = self.position.get();
        match self.sink.as_mut() {
            Some(sink) => sink.flush().map_err(|e| RipperError::SinkWrite {
                row,
                reason: e.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn ensure_open(&self, operation: &'static str) -> Result<()> {
        if self.closed {
            return Err(RipperError::sequence(operation, RipperState::Closed));
        }
        Ok(())
    }

    fn ensure_configurable(&self, operation: &'static str) -> Result<()> {
        self.ensure_open(operation)?;
        match self.state {
            RipperState::Created | RipperState::HeaderWritten => Ok(()),
            state => Err(RipperError::sequence(operation, state)),
        }
    }

    fn register<F>(&mut self, add: F, operation: &'static str) -> Result<()>
    where
        F: FnOnce(&mut FilterChain) -> bool,
    {
        if add(&mut self.chain) {
            Ok(())
        } else {
            Err(RipperError::sequence(operation, self.state))
        }
    }
}

impl Drop for Ripper {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close ripper on drop: {}", e);
        }
    }
}

impl std::fmt::Debug for Ripper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ripper")
            .field("column", &self.column)
            .field("state", &self.state)
            .field("closed", &self.closed)
            .field("position", &self.position.get())
            .field("tokenizer", &self.tokenizer.name())
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

/// One line per token: surface, then features or `*` for unknown words.
fn write_token_detail(out: &mut dyn Write, tokens: &[Token]) -> std::io::Result<()> {
    for token in tokens {
        match token.class {
            TokenClass::Known => writeln!(out, "{}\t{}", token.surface, token.features.join(","))?,
            TokenClass::Unknown => writeln!(out, "{}\t*", token.surface)?,
        }
    }
    writeln!(out, "EOS")
}

/// Builder for [`Ripper`] with fluent API.
#[derive(Default)]
pub struct RipperBuilder {
    source: Option<Box<dyn RecordSource>>,
    sink: Option<Box<dyn RecordSink>>,
    column: Option<String>,
    dictionary: Option<Dictionary>,
    dictionary_path: Option<PathBuf>,
    tokenizer: Option<Box<dyn Tokenizer>>,
    separator: Option<String>,
    suffix: Option<String>,
    show: bool,
    debug: bool,
    echo: Option<Box<dyn Write + Send>>,
    progress_interval: Option<Duration>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl RipperBuilder {
    pub fn source(mut self, source: impl RecordSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn sink(mut self, sink: impl RecordSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.column = Some(name.into());
        self
    }

    /// Use an already loaded dictionary.
    pub fn dictionary(mut self, dictionary: Dictionary) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    /// Load the dictionary from a file during [`build`](Self::build).
    /// Takes precedence over [`dictionary`](Self::dictionary).
    pub fn dictionary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dictionary_path = Some(path.into());
        self
    }

    /// Replace the default [`DictionaryTokenizer`].
    pub fn tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = Some(Box::new(tokenizer));
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Print the joined words of every row.
    pub fn show(mut self, show: bool) -> Self {
        self.show = show;
        self
    }

    /// Print every token with its features.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Destination of `show`/`debug` output. Defaults to stdout.
    pub fn echo_to(mut self, writer: impl Write + Send + 'static) -> Self {
        self.echo = Some(Box::new(writer));
        self
    }

    /// Interval between throughput samples. Zero disables the monitor.
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = Some(interval);
        self
    }

    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ThroughputSample) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the ripper.
    ///
    /// Fails when the column is empty, when the source or sink is missing,
    /// when the column is not in the source header, or when the dictionary
    /// cannot be loaded. Anything already handed to the builder is dropped
    /// on failure.
    pub fn build(self) -> Result<Ripper> {
        let column = self.column.unwrap_or_default();
        validate_column(&column)?;

        let source = self.source.ok_or(ConfigValidationError::MissingInput)?;
        let sink = self.sink.ok_or(ConfigValidationError::MissingOutput)?;

        let input_header = source.header().clone();
        let target_index = input_header
            .index_of(&column)
            .ok_or_else(|| RipperError::ColumnNotFound(column.clone()))?;

        let dictionary = match (self.dictionary_path, self.dictionary) {
            (Some(path), _) => Dictionary::from_path(path)?,
            (None, Some(dictionary)) => dictionary,
            (None, None) => Dictionary::builtin(),
        };

        let tokenizer = self
            .tokenizer
            .unwrap_or_else(|| Box::new(DictionaryTokenizer::new()));

        debug!(
            "Ripper ready: column '{}' at index {}, dictionary '{}', tokenizer '{}'",
            column,
            target_index,
            dictionary.name(),
            tokenizer.name()
        );

        Ok(Ripper {
            source: Some(source),
            sink: Some(sink),
            dictionary: Some(dictionary),
            tokenizer,
            chain: FilterChain::new(),
            column,
            target_index,
            input_header,
            output: None,
            quote_columns: Vec::new(),
            separator: self
                .separator
                .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string()),
            suffix: self.suffix.unwrap_or_else(|| DEFAULT_SUFFIX.to_string()),
            show: self.show,
            debug: self.debug,
            echo: self.echo.unwrap_or_else(|| Box::new(std::io::stdout())),
            progress_interval: self
                .progress_interval
                .unwrap_or(Duration::from_secs(DEFAULT_PROGRESS_INTERVAL_SECS)),
            progress_reporter: self
                .progress_reporter
                .unwrap_or_else(|| Arc::new(LogProgressReporter)),
            position: PositionCounter::new(),
            state: RipperState::Created,
            closed: false,
        })
    }
}
