use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::*;
use log::LevelFilter;
use xmlfeed::{ingest_from_path, AttributeView, Attributes, IngestOptions, Progress, SaxEvent, Visitor};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "memory_tracking")]
mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    pub struct TrackingAllocator;

    #[cfg(feature = "mimalloc")]
    static UNDERLYING: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static UNDERLYING: std::alloc::System = std::alloc::System;

    unsafe impl GlobalAlloc for TrackingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = UNDERLYING.alloc(layout);
            if !ptr.is_null() {
                let current = ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
                PEAK_ALLOCATED.fetch_max(current, Ordering::Relaxed);
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            UNDERLYING.dealloc(ptr, layout)
        }
    }

    /// (current, peak) heap bytes
    pub fn snapshot() -> (usize, usize) {
        (ALLOCATED.load(Ordering::SeqCst), PEAK_ALLOCATED.load(Ordering::SeqCst))
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: tracking::TrackingAllocator = tracking::TrackingAllocator;

#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Visitors
// ============================================================================

/// Prints one line per event
struct EventPrinter<W: Write> {
    out: W,
    /// First write failure; later events are dropped
    error: Option<io::Error>,
}

impl<W: Write> EventPrinter<W> {
    fn emit(&mut self, event: SaxEvent) {
        if self.error.is_none() {
            if let Err(e) = writeln!(self.out, "{}", event) {
                self.error = Some(e);
            }
        }
    }

    fn finish(mut self) -> io::Result<()> {
        match self.error.take() {
            Some(e) => Err(e),
            None => self.out.flush(),
        }
    }
}

impl<W: Write> Visitor for EventPrinter<W> {
    fn start_xml(&mut self) {
        self.emit(SaxEvent::StartXml);
    }

    fn start_element(&mut self, name: &str, attrs: &AttributeView<'_>) {
        self.emit(SaxEvent::StartElement {
            name: name.to_string(),
            attributes: attrs.to_snapshot(),
        });
    }

    fn end_element(&mut self, name: &str) {
        self.emit(SaxEvent::EndElement { name: name.to_string() });
    }

    fn data(&mut self, text: &str) {
        self.emit(SaxEvent::Data(text.to_string()));
    }

    fn pi(&mut self, target: &str, data: &str) {
        self.emit(SaxEvent::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        });
    }

    fn comment(&mut self, text: &str) {
        self.emit(SaxEvent::Comment(text.to_string()));
    }

    fn end_xml(&mut self) {
        self.emit(SaxEvent::EndXml);
    }
}

/// Document statistics
#[derive(Debug, Default)]
struct Stats {
    elements: u64,
    attributes: u64,
    text_events: u64,
    text_chars: u64,
    processing_instructions: u64,
    comments: u64,
    depth: usize,
    max_depth: usize,
}

impl Visitor for Stats {
    fn start_element(&mut self, _name: &str, attrs: &AttributeView<'_>) {
        self.elements += 1;
        self.attributes += attrs.len() as u64;
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
    }

    fn end_element(&mut self, _name: &str) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn data(&mut self, text: &str) {
        self.text_events += 1;
        self.text_chars += text.chars().count() as u64;
    }

    fn pi(&mut self, _target: &str, _data: &str) {
        self.processing_instructions += 1;
    }

    fn comment(&mut self, _text: &str) {
        self.comments += 1;
    }
}

fn print_stats(stats: &Stats, started: Instant) {
    println!("elements:                {}", stats.elements);
    println!("attributes:              {}", stats.attributes);
    println!("text events:             {}", stats.text_events);
    println!("text characters:         {}", stats.text_chars);
    println!("processing instructions: {}", stats.processing_instructions);
    println!("comments:                {}", stats.comments);
    println!("max depth:               {}", stats.max_depth);
    println!("elapsed:                 {:.3?}", started.elapsed());

    #[cfg(feature = "memory_tracking")]
    {
        let (current, peak) = tracking::snapshot();
        println!("heap current:            {}", current);
        println!("heap peak:               {}", peak);
    }
}

fn main() -> Result<()> {
    let matches = Command::new("xmlfeed")
        .version(crate_version!())
        .author(crate_authors!())
        .about("Stream an XML file (optionally gzip-compressed) and report its events.")
        .arg(
            Arg::new("file")
                .value_parser(value_parser!(PathBuf))
                .required(true)
                .help("Path to the XML or .xml.gz file"),
        )
        .arg(
            Arg::new("events")
                .long("events")
                .action(ArgAction::SetTrue)
                .help("Print one line per parse event"),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .action(ArgAction::SetTrue)
                .help("Print element / attribute / text statistics (the default)"),
        )
        .arg(
            Arg::new("chunk_size")
                .long("chunk-size")
                .value_parser(value_parser!(usize))
                .default_value("16384")
                .help("Bytes read per chunk"),
        )
        .arg(
            Arg::new("log_level")
                .short('l')
                .long("log-level")
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .default_value("warn"),
        )
        .get_matches();

    let level_filter = match matches.get_one::<String>("log_level").map(String::as_str) {
        Some("error") => LevelFilter::Error,
        Some("info") => LevelFilter::Info,
        Some("debug") => LevelFilter::Debug,
        Some("trace") => LevelFilter::Trace,
        _ => LevelFilter::Warn,
    };
    env_logger::Builder::new().filter_level(level_filter).init();

    let path = matches
        .get_one::<PathBuf>("file")
        .context("missing input file")?;
    let chunk_size = matches.get_one::<usize>("chunk_size").copied().unwrap_or(xmlfeed::DEFAULT_CHUNK_SIZE);
    let options = || {
        IngestOptions::new().with_chunk_size(chunk_size).with_progress(|percent| {
            log::debug!("progress: {}%", percent);
            Progress::Continue
        })
    };

    let started = Instant::now();
    if matches.get_flag("events") {
        let mut printer = EventPrinter {
            out: BufWriter::new(io::stdout().lock()),
            error: None,
        };
        ingest_from_path(path, &mut printer, options())?;
        printer.finish().context("writing events")?;
    }

    if matches.get_flag("stats") || !matches.get_flag("events") {
        let mut stats = Stats::default();
        ingest_from_path(path, &mut stats, options())?;
        print_stats(&stats, started);
    }

    Ok(())
}
