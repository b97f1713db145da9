//! # 进度通道
//!
//! 批处理核心向调用方单向发送可读状态行。
//!
//! 发送方不依赖返回值，也不关心消费方如何显示；
//! 消费方 panic 时该行被丢弃，批处理继续。
//!
//! ## 依赖关系
//! - 被 `batch/executor.rs` 和 `batch/runner.rs` 使用
//! - 被 `commands/run.rs` 通过 `BatchEvent` 通道消费

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use tracing::{debug, warn};

/// 进度行的消费方
pub trait ProgressSink: Send + Sync {
    /// 接收一行状态文本
    fn report(&self, line: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, line: &str) {
        self(line)
    }
}

/// 批处理事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// 一行进度文本
    Progress(String),
    /// 批处理结束（每次运行恰好一次）
    Done,
}

/// 将进度行转发到 mpsc 通道
///
/// 接收端已关闭时静默丢弃。
pub struct ChannelSink {
    tx: Sender<BatchEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<BatchEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelSink {
    fn report(&self, line: &str) {
        let _ = self.tx.send(BatchEvent::Progress(line.to_string()));
    }
}

/// 批处理内部使用的发送端
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<dyn ProgressSink>,
}

impl Reporter {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self { sink }
    }

    /// 发送一行
    pub fn line(&self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        debug!(target: "mpt_batch::progress", "{}", msg);

        let delivered = panic::catch_unwind(AssertUnwindSafe(|| self.sink.report(msg)));
        if delivered.is_err() {
            warn!("Progress consumer panicked, dropped line: {}", msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Mutex;

    #[test]
    fn test_closure_sink() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let store = Arc::clone(&lines);
        let reporter = Reporter::new(Arc::new(move |line: &str| {
            store.lock().unwrap().push(line.to_string())
        }));

        reporter.line("first");
        reporter.line(String::from("second"));

        assert_eq!(*lines.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_channel_sink_preserves_order() {
        let (tx, rx) = mpsc::channel();
        let reporter = Reporter::new(Arc::new(ChannelSink::new(tx)));

        for i in 0..5 {
            reporter.line(format!("line {}", i));
        }
        drop(reporter);

        let received: Vec<_> = rx.iter().collect();
        let expected: Vec<_> = (0..5)
            .map(|i| BatchEvent::Progress(format!("line {}", i)))
            .collect();
        assert_eq!(received, expected);
    }

    #[test]
    fn test_channel_sink_ignores_closed_receiver() {
        let (tx, rx) = mpsc::channel();
        drop(rx);

        let reporter = Reporter::new(Arc::new(ChannelSink::new(tx)));
        reporter.line("nobody is listening");
    }

    #[test]
    fn test_panicking_consumer_is_contained() {
        let reporter = Reporter::new(Arc::new(|line: &str| {
            if line.contains("boom") {
                panic!("consumer failure");
            }
        }));

        reporter.line("boom");
        reporter.line("still delivering");
    }
}
