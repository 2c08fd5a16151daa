use anyhow::Result;
use std::io::{self, Write};

use crate::metrics::MetricReport;

/// 画面クリア + カーソルを左上へ (ANSI)
const CLEAR_SCREEN: &str = "\x1B[2J\x1B[1;1H";

/// レポートの出力先
pub trait ReportSink {
    fn emit(&mut self, report: &MetricReport) -> Result<()>;
}

impl<S: ReportSink + ?Sized> ReportSink for Box<S> {
    fn emit(&mut self, report: &MetricReport) -> Result<()> {
        (**self).emit(report)
    }
}

/// メモリに貯める
impl ReportSink for Vec<MetricReport> {
    fn emit(&mut self, report: &MetricReport) -> Result<()> {
        self.push(*report);
        Ok(())
    }
}

/// コンソールに1行1メトリクスで表示
pub struct ConsoleSink<W: Write = io::Stdout> {
    out: W,
    clear: bool,
}

impl ConsoleSink {
    pub fn stdout(clear: bool) -> Self {
        Self::new(io::stdout(), clear)
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, clear: bool) -> Self {
        Self { out, clear }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for ConsoleSink<W> {
    fn emit(&mut self, report: &MetricReport) -> Result<()> {
        if self.clear {
            self.out.write_all(CLEAR_SCREEN.as_bytes())?;
        }
        for line in report.lines() {
            writeln!(self.out, "{}", line)?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// ログ (info) に1レコードで出力
#[derive(Debug, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn emit(&mut self, report: &MetricReport) -> Result<()> {
        log::info!("{}", report.lines().join(", "));
        Ok(())
    }
}

/// 複数の出力先へ配る
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<S: ReportSink + 'static>(&mut self, sink: S) {
        self.sinks.push(Box::new(sink));
    }

    pub fn with<S: ReportSink + 'static>(mut self, sink: S) -> Self {
        self.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ReportSink for MultiSink {
    fn emit(&mut self, report: &MetricReport) -> Result<()> {
        for sink in self.sinks.iter_mut() {
            sink.emit(report)?;
        }
        Ok(())
    }
}
