//! jobwatch - drive the polling, paging, retry, wait and streaming loops
//! against scripted services.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use futures::StreamExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use jobwatch_core::app::{
    JobRunner, NotificationWaiter, Paginator, PollConfig, Retrier, RetryPolicy, StatusPoller,
    StreamRetry, TranscriptStream, UnknownStatusPolicy, WaitConfig,
};
use jobwatch_core::domain::{
    JobHandle, Notification, Page, ResultSet, ServiceError, StatusVocabulary, Subscription,
    TranscriptChunk,
};
use jobwatch_core::impls::{
    InMemoryPageSource, ScriptedCall, ScriptedJobService, ScriptedNotificationSource,
    ScriptedTranscriptSource,
};
use jobwatch_core::Result;

#[derive(Debug, Parser)]
#[command(name = "jobwatch", version, about = "Submit, poll, page and retry against scripted job services")]
struct Cli {
    /// Log filter, e.g. `info` or `jobwatch_core=debug`.
    #[arg(long, env = "JOBWATCH_LOG", default_value = "info", global = true)]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Submit a job, poll it until terminal and print its result set.
    Poll(PollArgs),
    /// Page through a list call and print one item per line.
    List(ListArgs),
    /// Retry a call that answers with the given HTTP status codes.
    Retry(RetryArgs),
    /// Wait for a job's terminal notification on a queue.
    Wait(WaitArgs),
    /// Stream a transcript, re-opening the session on transient failures.
    Transcribe(TranscribeArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
    Xml,
}

#[derive(Debug, Args)]
struct PollArgs {
    /// Status sequence the job reports, one per describe call.
    #[arg(long, value_delimiter = ',', required = true)]
    statuses: Vec<String>,

    #[arg(long, env = "JOBWATCH_POLL_INTERVAL_MS", default_value_t = 200)]
    interval_ms: u64,

    #[arg(long, env = "JOBWATCH_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    #[arg(long)]
    deadline_ms: Option<u64>,

    #[arg(long)]
    warm_up_ms: Option<u64>,

    /// Fail on a status that is neither pending, succeeded nor failed.
    #[arg(long)]
    strict_unknown: bool,

    /// Extra success-terminal statuses.
    #[arg(long)]
    success: Vec<String>,

    /// Extra failure-terminal statuses.
    #[arg(long)]
    failure: Vec<String>,

    #[arg(long, value_delimiter = ',', default_value = "id,name")]
    columns: Vec<String>,

    /// One result row, comma separated. An empty cell is NULL.
    #[arg(long)]
    row: Vec<String>,

    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Pages separated by `;`, items by `,`.
    #[arg(long)]
    pages: String,

    #[arg(long)]
    max_results: Option<u32>,

    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Debug, Args)]
struct RetryArgs {
    #[arg(long, value_delimiter = ',', required = true)]
    codes: Vec<u16>,

    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    #[arg(long, default_value_t = 50)]
    base_delay_ms: u64,
}

#[derive(Debug, Args)]
struct WaitArgs {
    /// Receive batches separated by `;`, each `job:STATE[:message]`.
    #[arg(long)]
    events: String,

    #[arg(long)]
    job: String,

    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    #[arg(long, default_value_t = 100)]
    interval_ms: u64,
}

#[derive(Debug, Args)]
struct TranscribeArgs {
    /// Final transcript segments separated by `;`.
    #[arg(long)]
    chunks: String,

    /// Number of open calls that fail with 503 first.
    #[arg(long, default_value_t = 0)]
    fail_first: u32,

    #[arg(long, default_value_t = 10)]
    max_retries: u32,

    #[arg(long, default_value_t = 100)]
    delay_ms: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Poll(args) => poll(args).await,
        Command::List(args) => list(args).await,
        Command::Retry(args) => retry(args).await,
        Command::Wait(args) => wait(args).await,
        Command::Transcribe(args) => transcribe(args).await,
    }
}

async fn poll(args: PollArgs) -> Result<()> {
    let mut builder = PollConfig::builder().interval(Duration::from_millis(args.interval_ms));
    if let Some(max) = args.max_attempts {
        builder = builder.max_attempts(max);
    }
    if let Some(ms) = args.deadline_ms {
        builder = builder.deadline(Duration::from_millis(ms));
    }
    if let Some(ms) = args.warm_up_ms {
        builder = builder.warm_up(Duration::from_millis(ms));
    }
    if args.strict_unknown {
        builder = builder.unknown(UnknownStatusPolicy::Fail);
    }
    let config = builder.build()?;

    let vocabulary = StatusVocabulary::standard()
        .succeeded(args.success)
        .failed(args.failure);

    let mut output = ResultSet::new(args.columns);
    for row in &args.row {
        output = output.with_row(row.split(',').map(|cell| (!cell.is_empty()).then_some(cell)));
    }

    let statuses: Vec<&str> = args.statuses.iter().map(String::as_str).collect();
    let service = ScriptedJobService::from_statuses(&statuses).with_output(output);
    let runner = JobRunner::new(service, StatusPoller::new(config, vocabulary));

    let done = runner.run(serde_json::json!({ "source": "jobwatch-cli" })).await?;
    info!(handle = %done.handle, attempts = done.report.attempts, transitions = ?done.report.transitions(), "poll finished");

    match args.format {
        Format::Table => println!("{}", done.output.to_text()),
        Format::Json => println!("{}", done.output.to_json()),
        Format::Xml => println!("{}", done.output.to_xml()?),
    }
    Ok(())
}

fn scripted_pages(script: &str) -> Vec<Page<String>> {
    let groups: Vec<&str> = script.split(';').collect();
    let last = groups.len().saturating_sub(1);
    groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let items = group
                .split(',')
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect();
            if i == last {
                Page::last(items)
            } else {
                Page::with_next(items, format!("page-{}", i + 1))
            }
        })
        .collect()
}

async fn list(args: ListArgs) -> Result<()> {
    let mut pager = Paginator::new(InMemoryPageSource::from_pages(scripted_pages(&args.pages)));
    if let Some(max) = args.max_results {
        pager = pager.max_results(max);
    }
    if let Some(limit) = args.limit {
        pager = pager.limit(limit);
    }

    let items = pager.stream();
    futures::pin_mut!(items);
    let mut count = 0usize;
    while let Some(item) = items.next().await {
        println!("{}", item?);
        count += 1;
    }
    info!(items = count, pages = pager.source().calls().len(), "listing finished");
    Ok(())
}

async fn retry(args: RetryArgs) -> Result<()> {
    let policy = RetryPolicy::standard()
        .with_max_attempts(args.max_attempts)
        .with_base_delay(Duration::from_millis(args.base_delay_ms));
    policy.validate()?;

    let call = ScriptedCall::from_status_codes(&args.codes);
    let code = Retrier::new(policy).run(|_| call.call()).await?;
    println!("{code} after {} attempt(s)", call.calls());
    Ok(())
}

fn scripted_batches(script: &str) -> Vec<std::result::Result<Vec<Notification>, ServiceError>> {
    script.split(';')
        .filter(|batch| !batch.is_empty())
        .map(|batch| {
            let mut parts = batch.splitn(3, ':');
            let job = parts.next().unwrap_or_default();
            let state = parts.next().unwrap_or_default();
            let notification = Notification::new(job, state);
            Ok(vec![match parts.next() {
                Some(message) => notification.with_message(message),
                None => notification,
            }])
        })
        .collect()
}

async fn wait(args: WaitArgs) -> Result<()> {
    let config = WaitConfig::new(
        Duration::from_millis(args.interval_ms),
        Duration::from_millis(args.timeout_ms),
    );
    config.validate()?;

    let source = Arc::new(ScriptedNotificationSource::new(scripted_batches(&args.events)));
    let subscription = Subscription::new("jobwatch-topic", "jobwatch-queue");
    let waiter = NotificationWaiter::new(source, subscription, StatusVocabulary::standard()).with_config(config);

    let notification = waiter.wait_for(&JobHandle::new(args.job)).await?;
    println!("{} {}", notification.job, notification.state);
    Ok(())
}

async fn transcribe(args: TranscribeArgs) -> Result<()> {
    let mut source = ScriptedTranscriptSource::new();
    for _ in 0..args.fail_first {
        source = source.open_error(ServiceError::service(503, "ServiceUnavailableException", "try again"));
    }
    let chunks = args
        .chunks
        .split(';')
        .filter(|text| !text.is_empty())
        .map(|text| Ok(TranscriptChunk::final_text(text)))
        .collect();
    let source = Arc::new(source.session(chunks));

    let retry = StreamRetry::new(args.max_retries, Duration::from_millis(args.delay_ms));
    let mut stream = TranscriptStream::open(source.clone(), retry);
    while let Some(chunk) = stream.next().await {
        println!("{}", chunk?.text);
    }
    info!(opens = source.opens(), "transcript finished");
    Ok(())
}
