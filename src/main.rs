use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use wiki_lead_scanner::config::ScanConfig;
use wiki_lead_scanner::export::open_input;
use wiki_lead_scanner::output::{Layout, PageWriter};
use wiki_lead_scanner::parallel::{
    process_batch_parallel, process_channel_pipeline, run_sequential, ParallelConfig, Stats, Strategy,
};
use wiki_lead_scanner::{Error, Result, WordCounter};

#[derive(Parser)]
#[command(name = "wiki-lead-scanner")]
#[command(about = "Extract categories, citations, anchors and plain lead text from Wikipedia export dumps")]
struct Args {
    /// Input export file (.xml or .xml.bz2)
    input: PathBuf,

    /// Output JSONL file
    output: PathBuf,

    /// Processing strategy
    #[arg(short, long, value_enum, default_value_t = Strategy::ChannelPipeline)]
    strategy: Strategy,

    /// Number of threads (0 = auto-detect)
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// Batch size for batch-parallel strategy
    #[arg(long, default_value_t = 1000)]
    batch_size: usize,

    /// Channel buffer size for channel-pipeline strategy
    #[arg(long, default_value_t = 10000)]
    channel_buffer: usize,

    /// Stop after writing this many pages (sequential strategy only)
    #[arg(long)]
    limit: Option<usize>,

    /// Output record layout
    #[arg(long, value_enum, default_value_t = Layout::Lists)]
    layout: Layout,

    /// Scan config YAML (default: config/scanner.yaml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the N most frequent lead-text words at the end
    #[arg(long, default_value_t = 0)]
    top_words: usize,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,
}

fn print_stats(stats: &Stats, counter: &WordCounter, strategy: Strategy, top_words: usize) {
    println!();
    println!("============================================================");
    println!("Strategy: {:?}", strategy);
    println!("Pages scanned: {}", stats.pages_scanned);
    println!("Pages written: {}", stats.pages_written);
    println!("------------------------------------------------------------");
    println!("Categories: {}", stats.categories);
    println!("Citations: {}", stats.citations);
    println!("Anchors: {}", stats.anchors);
    println!("Lead words: {} ({} distinct)", counter.total(), counter.distinct());
    println!("------------------------------------------------------------");
    println!("Special pages: {}", stats.special);
    println!("Redirects: {}", stats.redirects);
    println!("Too short: {}", stats.too_short);
    println!("Malformed: {}", stats.malformed);
    println!("Time: {}m {}s", stats.elapsed.as_secs() / 60, stats.elapsed.as_secs() % 60);
    println!("Rate: {:.0} pages/sec", stats.pages_per_sec());
    if top_words > 0 {
        println!("------------------------------------------------------------");
        println!("Most common: {}", counter.most_common().join(", "));
        for (word, count) in counter.top(top_words) {
            println!("  {:>8}  {}", count, word);
        }
    }
    println!("============================================================");
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    // Early termination only makes sense when pages are written in order
    if args.limit.is_some() && args.strategy != Strategy::Sequential {
        return Err(Error::InvalidOptions(
            "--limit requires --strategy sequential for early termination".to_string(),
        ));
    }

    let scan_config = ScanConfig::resolve(args.config.as_deref())?;
    let config = ParallelConfig {
        batch_size: args.batch_size,
        channel_buffer: args.channel_buffer,
        ..ParallelConfig::default()
    }
    .with_threads(args.threads);

    if !args.quiet {
        println!("Parsing: {}", args.input.display());
        println!("Output: {}", args.output.display());
        println!("Strategy: {:?}", args.strategy);
        if args.strategy != Strategy::Sequential {
            println!("Threads: {}", config.num_threads);
        }
        if let Some(limit) = args.limit {
            println!("Limit: {} pages", limit);
        }
        println!();
    }

    let reader = open_input(&args.input)?;
    let output = File::create(&args.output)?;
    let mut writer = PageWriter::new(BufWriter::with_capacity(256 * 1024, output), args.layout);
    let mut counter = WordCounter::new();
    let pb = progress_bar(args.quiet);

    let stats = match args.strategy {
        Strategy::Sequential => {
            run_sequential(reader, &mut writer, &mut counter, &scan_config, args.limit, &pb)?
        }
        Strategy::BatchParallel => {
            process_batch_parallel(reader, &mut writer, &mut counter, &scan_config, &config, &pb)?
        }
        Strategy::ChannelPipeline => {
            process_channel_pipeline(reader, &mut writer, &mut counter, &scan_config, &config, &pb)?
        }
    };

    match args.limit {
        Some(limit) if stats.pages_written >= limit => {
            pb.finish_with_message(format!("Reached limit of {} pages", limit))
        }
        _ => pb.finish_and_clear(),
    }

    if stats.malformed > 0 {
        log::warn!("{} malformed pages were skipped", stats.malformed);
    }

    if !args.quiet {
        print_stats(&stats, &counter, args.strategy, args.top_words);
    }

    Ok(())
}
