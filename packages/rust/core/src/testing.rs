//! Test doubles shared by the core test modules.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{TimeZone, Utc};
use collectonce_crawler::CrawlCapability;
use collectonce_shared::{
    CollectError, CrawlResult, CrawlSpec, CrawledItem, LogLevel, RawCrawlSpec, Result, normalize,
};

use crate::logging::LevelSink;

/// Records every level applied to it.
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub levels: Mutex<Vec<LogLevel>>,
}

impl RecordingSink {
    pub fn applied(&self) -> Vec<LogLevel> {
        self.levels.lock().unwrap().clone()
    }
}

impl LevelSink for RecordingSink {
    fn apply(&self, level: LogLevel) {
        self.levels.lock().unwrap().push(level);
    }
}

/// In-memory log sink for a test subscriber.
#[derive(Clone, Default)]
pub(crate) struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// What the fake crawler does for a keyword.
#[derive(Clone)]
pub(crate) enum Scripted {
    Items(usize),
    NoData,
    Fail,
}

/// Call counters observable after the crawler has been consumed.
#[derive(Default)]
pub(crate) struct Calls {
    pub acquired: AtomicUsize,
    pub disposed: AtomicUsize,
    pub collected: Mutex<Vec<String>>,
}

impl Calls {
    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn collected(&self) -> Vec<String> {
        self.collected.lock().unwrap().clone()
    }
}

/// Script entries are consumed in order, so a repeated keyword can be
/// scripted differently on each call. Unscripted calls yield no data.
pub(crate) struct FakeCrawler {
    script: Vec<(String, Scripted)>,
    calls: Arc<Calls>,
    fail_dispose: bool,
}

impl FakeCrawler {
    pub fn new(script: &[(&str, Scripted)], calls: Arc<Calls>) -> Self {
        calls.acquired.fetch_add(1, Ordering::SeqCst);
        Self {
            script: script
                .iter()
                .map(|(k, s)| (k.to_string(), s.clone()))
                .collect(),
            calls,
            fail_dispose: false,
        }
    }

    pub fn failing_dispose(mut self) -> Self {
        self.fail_dispose = true;
        self
    }
}

impl CrawlCapability for FakeCrawler {
    async fn collect(&mut self, keyword: &str) -> Result<Option<CrawlResult>> {
        self.calls.collected.lock().unwrap().push(keyword.to_string());
        let scripted = match self.script.iter().position(|(k, _)| k == keyword) {
            Some(pos) => self.script.remove(pos).1,
            None => Scripted::NoData,
        };
        match scripted {
            Scripted::Items(n) => Ok(Some(result_for(keyword, n))),
            Scripted::NoData => Ok(None),
            Scripted::Fail => Err(CollectError::Network(format!("{keyword}: connection reset"))),
        }
    }

    async fn dispose(self) -> Result<()> {
        self.calls.disposed.fetch_add(1, Ordering::SeqCst);
        if self.fail_dispose {
            return Err(CollectError::Network("dispose failed".into()));
        }
        Ok(())
    }
}

pub(crate) fn result_for(keyword: &str, items: usize) -> CrawlResult {
    CrawlResult {
        keyword: keyword.to_string(),
        collected_at: Utc.with_ymd_and_hms(2026, 10, 18, 8, 0, 0).unwrap(),
        items: (0..items)
            .map(|i| CrawledItem {
                url: format!("https://videos.example.com/watch/{keyword}-{i}"),
                title: Some(format!("{keyword} #{i}")),
                seed: "https://videos.example.com/results".into(),
                level: 0,
                parent: None,
            })
            .collect(),
        errors: vec![],
    }
}

pub(crate) fn spec_with_keywords(keywords: &[&str]) -> CrawlSpec {
    normalize(RawCrawlSpec {
        keywords: Some(keywords.iter().map(|k| k.to_string()).collect()),
        seeds: Some(vec!["https://videos.example.com/results?q={keyword}".into()]),
        branches: Some(2),
        depth: Some(1),
        ..Default::default()
    })
    .unwrap()
}

pub(crate) fn temp_dir(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("collectonce-{label}-{}", uuid::Uuid::now_v7()))
}
