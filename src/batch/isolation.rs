//! # 外部调用隔离
//!
//! 在外部分析调用期间临时切换进程工作目录，并将标准输出/错误重定向到空设备。
//! `IsolationGuard` 析构时无条件恢复（包括出错与 panic 展开路径）。
//!
//! 工作目录与标准流是进程级状态，同一时刻只允许一个守卫存在。
//!
//! ## 依赖关系
//! - 被 `batch/executor.rs` 使用
//! - unix 下使用 `libc::dup2` 重定向文件描述符

use crate::error::{BatchError, Result};

use std::env;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

static ISOLATION_LOCK: Mutex<()> = Mutex::new(());

/// 隔离状态守卫
pub struct IsolationGuard {
    previous_dir: Option<PathBuf>,
    _streams: Option<SilencedStreams>,
    _lock: MutexGuard<'static, ()>,
}

impl IsolationGuard {
    /// 切换到 `work_dir`，可选地静默标准流
    pub fn acquire(work_dir: &Path, silence_streams: bool) -> Result<Self> {
        let lock = ISOLATION_LOCK
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let previous_dir = env::current_dir()
            .map_err(|e| BatchError::Other(format!("Cannot read working directory: {}", e)))?;

        debug!(
            "Isolating external call in {} (silence streams: {})",
            work_dir.display(),
            silence_streams
        );

        let mut guard = IsolationGuard {
            previous_dir: None,
            _streams: None,
            _lock: lock,
        };

        if silence_streams {
            guard._streams = Some(SilencedStreams::redirect().map_err(|e| {
                BatchError::Other(format!("Cannot redirect output streams: {}", e))
            })?);
        }

        env::set_current_dir(work_dir).map_err(|e| {
            BatchError::Other(format!(
                "Cannot change working directory to {}: {}",
                work_dir.display(),
                e
            ))
        })?;
        guard.previous_dir = Some(previous_dir);

        Ok(guard)
    }
}

impl Drop for IsolationGuard {
    fn drop(&mut self) {
        if let Some(dir) = self.previous_dir.take() {
            // 原目录可能已被删除，此时无法恢复
            let _ = env::set_current_dir(dir);
        }
    }
}

/// 复制一份当前标准输出，重定向期间仍可写到终端
pub fn duplicate_stdout() -> io::Result<File> {
    #[cfg(unix)]
    {
        use std::os::fd::AsFd;
        let fd = io::stdout().as_fd().try_clone_to_owned()?;
        Ok(File::from(fd))
    }
    #[cfg(not(unix))]
    {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "stdout duplication is only supported on unix",
        ))
    }
}

/// 被重定向的标准输出/错误，析构时恢复
struct SilencedStreams {
    #[cfg(unix)]
    saved_stdout: std::os::fd::OwnedFd,
    #[cfg(unix)]
    saved_stderr: std::os::fd::OwnedFd,
}

impl SilencedStreams {
    #[cfg(unix)]
    fn redirect() -> io::Result<Self> {
        use std::os::fd::{AsFd, AsRawFd};

        let null = std::fs::OpenOptions::new().write(true).open("/dev/null")?;
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();

        let saved = SilencedStreams {
            saved_stdout: io::stdout().as_fd().try_clone_to_owned()?,
            saved_stderr: io::stderr().as_fd().try_clone_to_owned()?,
        };

        // 失败时 `saved` 析构恢复已替换的描述符
        replace_fd(null.as_raw_fd(), libc::STDOUT_FILENO)?;
        replace_fd(null.as_raw_fd(), libc::STDERR_FILENO)?;

        Ok(saved)
    }

    #[cfg(not(unix))]
    fn redirect() -> io::Result<Self> {
        Ok(SilencedStreams {})
    }
}

impl Drop for SilencedStreams {
    fn drop(&mut self) {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();

        #[cfg(unix)]
        {
            use std::os::fd::AsRawFd;
            let _ = replace_fd(self.saved_stdout.as_raw_fd(), libc::STDOUT_FILENO);
            let _ = replace_fd(self.saved_stderr.as_raw_fd(), libc::STDERR_FILENO);
        }
    }
}

#[cfg(unix)]
fn replace_fd(src: std::os::fd::RawFd, target: std::os::fd::RawFd) -> io::Result<()> {
    // SAFETY: 两个描述符在调用期间均有效，dup2 不接管 src 的所有权
    let rc = unsafe { libc::dup2(src, target) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn same_dir(a: &Path, b: &Path) -> bool {
        a.canonicalize().unwrap() == b.canonicalize().unwrap()
    }

    #[test]
    fn test_guard_switches_and_restores_dir() {
        let dir = tempfile::tempdir().unwrap();

        {
            let _guard = IsolationGuard::acquire(dir.path(), false).unwrap();
            assert!(same_dir(&env::current_dir().unwrap(), dir.path()));
        }

        assert!(!same_dir(&env::current_dir().unwrap(), dir.path()));
    }

    #[test]
    fn test_guard_restores_on_error_path() {
        let dir = tempfile::tempdir().unwrap();

        let result: Result<()> = (|| {
            let _guard = IsolationGuard::acquire(dir.path(), true)?;
            Err(BatchError::Other("external failure".to_string()))
        })();

        assert!(result.is_err());
        assert!(!same_dir(&env::current_dir().unwrap(), dir.path()));
    }

    #[test]
    fn test_guard_restores_on_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();

        let outcome = std::panic::catch_unwind(move || {
            let _guard = IsolationGuard::acquire(&path, true).unwrap();
            panic!("external call crashed");
        });

        assert!(outcome.is_err());
        assert!(!same_dir(&env::current_dir().unwrap(), dir.path()));
        // 锁未因 panic 永久失效
        let _guard = IsolationGuard::acquire(dir.path(), false).unwrap();
    }

    #[test]
    fn test_guard_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");

        assert!(IsolationGuard::acquire(&missing, true).is_err());
        // 失败后锁已释放
        let _guard = IsolationGuard::acquire(dir.path(), false).unwrap();
    }
}
