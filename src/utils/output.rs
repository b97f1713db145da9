//! # 美化输出工具
//!
//! 提供统一的终端输出样式，以及批处理进度行的着色显示。
//!
//! ## 依赖关系
//! - 被所有 `commands/` 模块使用
//! - 使用 `colored` crate
//! - 使用 `batch/isolation.rs` 获取不受静默影响的 stdout 副本

use crate::batch::isolation;

use colored::Colorize;
use std::io::{self, Write};

/// 打印成功消息
pub fn print_success(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    println!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    println!("{} {}", "[*]".blue().bold(), msg);
}

/// 打印完成消息
pub fn print_done(msg: &str) {
    println!("{} {}", "[DONE]".green().bold(), msg);
}

/// 打印标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}

/// 进度行的终端输出
///
/// 批处理期间 fd 1/2 可能被重定向到空设备，
/// 因此进度行写入启动时复制的 stdout 句柄。
pub struct Console {
    out: Box<dyn Write + Send>,
}

impl Console {
    /// 使用复制的 stdout，复制失败时退回普通 stdout
    pub fn detached() -> Self {
        let out: Box<dyn Write + Send> = match isolation::duplicate_stdout() {
            Ok(file) => Box::new(file),
            Err(e) => {
                tracing::warn!("Cannot duplicate stdout, progress may be hidden: {}", e);
                Box::new(io::stdout())
            }
        };
        Self { out }
    }

    #[cfg(test)]
    fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }

    /// 按内容着色输出一行进度
    pub fn progress_line(&mut self, line: &str) {
        let styled = style_progress(line);
        if let Err(e) = writeln!(self.out, "{}", styled).and_then(|_| self.out.flush()) {
            tracing::debug!("Dropped progress line: {}", e);
        }
    }
}

fn style_progress(line: &str) -> String {
    let trimmed = line.trim_start();
    if trimmed.starts_with("Error") {
        line.red().to_string()
    } else if trimmed.starts_with("Done") {
        line.green().to_string()
    } else if trimmed.starts_with("---") || trimmed.starts_with("All tasks completed") {
        line.bold().to_string()
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_progress_line_keeps_text() {
        colored::control::set_override(false);
        let buf = Shared::default();
        let mut console = Console::with_writer(Box::new(buf.clone()));

        console.progress_line("Processing a.csv...");
        console.progress_line("   Done");

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text, "Processing a.csv...\n   Done\n");
    }

    #[test]
    fn test_style_progress_plain_line_untouched() {
        assert_eq!(style_progress("Processing x..."), "Processing x...");
    }
}
