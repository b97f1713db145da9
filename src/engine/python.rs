//! # Python 分析库桥接
//!
//! 通过子进程调用 `mpt` Python 包，不在进程内嵌入解释器。
//!
//! ## 功能
//! - 导入探测：检查 `mpt` 能否导入，并报告可选能力
//! - 每次分析启动一个驱动子进程，作业以 JSON 经 stdin 传入
//! - 子进程 stdout 丢弃，stderr 最后一行作为错误原因
//!
//! 加载、可选步骤与导出在 Rust 侧登记，于 `export` 时一次性交给驱动脚本执行。
//!
//! ## 依赖关系
//! - 实现 `engine/mod.rs` 中的接口
//! - 被 `commands/run.rs` 构造
//! - 使用 `serde_json` 交换数据

use super::{
    Analysis, AnalysisBackend, AnalysisConfig, AnalysisLibrary, ExportTarget, TrajectoryTracking,
    TrajectoryValidation,
};
use crate::error::{BatchError, Result};

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::{debug, info};

/// 默认 Python 解释器
pub const DEFAULT_PYTHON: &str = "python3";

const IMPORT_CHECK_SCRIPT: &str = r#"
import json
from mpt.database import persist
from mpt.model import Analysis, General
print(json.dumps({
    "validate": hasattr(Analysis, "get_valid_trajectories"),
    "track": hasattr(Analysis, "start_trackpy"),
}))
"#;

const DRIVER_SCRIPT: &str = r#"
import json, sys, warnings
warnings.filterwarnings("ignore")
job = json.load(sys.stdin)

from mpt.database import persist
from mpt.model import Analysis, General

class HeadlessParent:
    def __init__(self, path):
        self.general = General()
        if hasattr(self.general, "config"):
            self.general.config.save_folder = str(path)
            self.general.update()

    def show_message(self, *args, **kwargs):
        pass

persist()
analysis = Analysis()
for key, value in job["config"].items():
    setattr(analysis.config, key, value)
analysis.update()

analysis.load_reports(job["files"])
if job["validate"]:
    analysis.get_valid_trajectories()
if job["track"]:
    analysis.start_trackpy()
analysis.export(HeadlessParent(job["save_folder"]))
analysis.summary = analysis.summary.iloc[0:0]
"#;

/// 分析库报告的可选能力
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Capabilities {
    pub validate: bool,
    pub track: bool,
}

/// 基于子进程的 Python 后端
pub struct PythonBackend {
    interpreter: String,
}

impl PythonBackend {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl Default for PythonBackend {
    fn default() -> Self {
        Self::new(DEFAULT_PYTHON)
    }
}

impl AnalysisBackend for PythonBackend {
    fn open(&self, library_root: &Path) -> Result<Box<dyn AnalysisLibrary>> {
        // 驱动子进程在工作目录已切换后启动，库目录必须是绝对路径
        let library_root = std::path::absolute(library_root)
            .map_err(|e| import_error(library_root, format!("cannot resolve path: {}", e)))?;
        let library_root = library_root.as_path();

        let output = python_command(&self.interpreter, library_root)
            .args(["-c", IMPORT_CHECK_SCRIPT])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                import_error(
                    library_root,
                    spawn_reason(&self.interpreter, library_root, &e),
                )
            })?;

        if !output.status.success() {
            return Err(import_error(library_root, last_stderr_line(&output)));
        }

        let report = String::from_utf8_lossy(&output.stdout);
        let capabilities: Capabilities = report
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .and_then(|l| serde_json::from_str(l).ok())
            .ok_or_else(|| {
                import_error(
                    library_root,
                    format!("unexpected import check output: {}", report.trim()),
                )
            })?;

        info!(
            "Loaded mpt from {} (validate: {}, track: {})",
            library_root.display(),
            capabilities.validate,
            capabilities.track
        );

        Ok(Box::new(PythonLibrary {
            interpreter: self.interpreter.clone(),
            root: library_root.to_path_buf(),
            capabilities,
        }))
    }
}

/// 已导入的 `mpt` 包
struct PythonLibrary {
    interpreter: String,
    root: PathBuf,
    capabilities: Capabilities,
}

impl AnalysisLibrary for PythonLibrary {
    fn new_analysis(&self, config: &AnalysisConfig) -> Result<Box<dyn Analysis>> {
        Ok(Box::new(PythonAnalysis {
            interpreter: self.interpreter.clone(),
            root: self.root.clone(),
            capabilities: self.capabilities,
            config: config.clone(),
            files: Vec::new(),
            validate: false,
            track: false,
        }))
    }
}

/// 传给驱动脚本的作业
#[derive(Serialize)]
struct DriverJob<'a> {
    config: &'a AnalysisConfig,
    files: Vec<String>,
    validate: bool,
    track: bool,
    save_folder: String,
}

/// 单次 Python 分析
struct PythonAnalysis {
    interpreter: String,
    root: PathBuf,
    capabilities: Capabilities,
    config: AnalysisConfig,
    files: Vec<PathBuf>,
    validate: bool,
    track: bool,
}

impl Analysis for PythonAnalysis {
    fn load_reports(&mut self, files: &[PathBuf]) -> Result<()> {
        if let Some(missing) = files.iter().find(|f| !f.is_file()) {
            return Err(BatchError::FileNotFound {
                path: missing.display().to_string(),
            });
        }
        self.files.extend_from_slice(files);
        Ok(())
    }

    fn trajectory_validation(&mut self) -> Option<&mut dyn TrajectoryValidation> {
        if self.capabilities.validate {
            Some(self as &mut dyn TrajectoryValidation)
        } else {
            None
        }
    }

    fn tracking(&mut self) -> Option<&mut dyn TrajectoryTracking> {
        if self.capabilities.track {
            Some(self as &mut dyn TrajectoryTracking)
        } else {
            None
        }
    }

    fn export(&mut self, target: &ExportTarget) -> Result<()> {
        let job = DriverJob {
            config: &self.config,
            files: self
                .files
                .iter()
                .map(|f| f.display().to_string())
                .collect(),
            validate: self.validate,
            track: self.track,
            save_folder: target.save_folder.display().to_string(),
        };
        let payload = serde_json::to_vec(&job)?;

        debug!(
            "Running mpt driver for {} file(s) -> {}",
            job.files.len(),
            job.save_folder
        );

        let mut child = python_command(&self.interpreter, &self.root)
            .args(["-c", DRIVER_SCRIPT])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BatchError::AnalysisFailed {
                step: "export".to_string(),
                reason: spawn_reason(&self.interpreter, &self.root, &e),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&payload)
                .map_err(|e| BatchError::AnalysisFailed {
                    step: "export".to_string(),
                    reason: format!("cannot send job to driver: {}", e),
                })?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| BatchError::CommandFailed {
                command: self.interpreter.clone(),
                stderr: e.to_string(),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(BatchError::AnalysisFailed {
                step: "export".to_string(),
                reason: last_stderr_line(&output),
            })
        }
    }

    fn clear_results(&mut self) {
        self.files.clear();
        self.validate = false;
        self.track = false;
    }
}

impl TrajectoryValidation for PythonAnalysis {
    fn validate_trajectories(&mut self) -> Result<()> {
        self.validate = true;
        Ok(())
    }
}

impl TrajectoryTracking for PythonAnalysis {
    fn compute_trajectories(&mut self) -> Result<()> {
        self.track = true;
        Ok(())
    }
}

/// 构造带库路径的 Python 命令
fn python_command(interpreter: &str, library_root: &Path) -> Command {
    let mut cmd = Command::new(interpreter);
    cmd.current_dir(library_root)
        .env("PYTHONPATH", python_path(library_root))
        .env("PYTHONWARNINGS", "ignore");
    cmd
}

/// 库根目录置于已有 PYTHONPATH 之前
fn python_path(library_root: &Path) -> OsString {
    let mut paths = vec![library_root.to_path_buf()];
    if let Some(existing) = std::env::var_os("PYTHONPATH") {
        paths.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(paths).unwrap_or_else(|_| library_root.as_os_str().to_os_string())
}

fn import_error(library_root: &Path, reason: String) -> BatchError {
    BatchError::LibraryImport {
        path: library_root.display().to_string(),
        reason,
    }
}

/// 启动失败的原因
///
/// 工作目录不存在与解释器不存在都表现为 `NotFound`，需要区分。
fn spawn_reason(interpreter: &str, library_root: &Path, err: &std::io::Error) -> String {
    if err.kind() == ErrorKind::NotFound && !library_root.is_dir() {
        format!("library folder {} does not exist", library_root.display())
    } else if err.kind() == ErrorKind::NotFound {
        BatchError::CommandNotFound {
            command: interpreter.to_string(),
        }
        .to_string()
    } else {
        format!("failed to start {}: {}", interpreter, err)
    }
}

/// stderr 的最后一个非空行（通常是 Python 异常信息）
fn last_stderr_line(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| format!("process exited with {}", output.status))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(capabilities: Capabilities) -> PythonAnalysis {
        PythonAnalysis {
            interpreter: DEFAULT_PYTHON.to_string(),
            root: PathBuf::from("/opt/mpthub"),
            capabilities,
            config: AnalysisConfig {
                p_size: 100.0,
                delta_t: 20.0,
                fps: 50.0,
                min_frames: 30.0,
                total_frames: 400.0,
                width_px: 512.0,
                width_si: 318.2,
                time: 13.33,
                temperature_c: 25.0,
            },
            files: Vec::new(),
            validate: false,
            track: false,
        }
    }

    #[test]
    fn test_optional_capabilities_follow_report() {
        let mut none = analysis(Capabilities::default());
        assert!(none.trajectory_validation().is_none());
        assert!(none.tracking().is_none());

        let mut all = analysis(Capabilities {
            validate: true,
            track: true,
        });
        all.trajectory_validation()
            .unwrap()
            .validate_trajectories()
            .unwrap();
        all.tracking().unwrap().compute_trajectories().unwrap();
        assert!(all.validate && all.track);

        all.clear_results();
        assert!(!all.validate && !all.track);
    }

    #[test]
    fn test_load_reports_requires_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.csv");
        std::fs::write(&present, "frame,x,y\n").unwrap();

        let mut a = analysis(Capabilities::default());
        a.load_reports(&[present.clone()]).unwrap();
        assert_eq!(a.files, vec![present]);

        let err = a.load_reports(&[dir.path().join("b.csv")]).unwrap_err();
        assert!(matches!(err, BatchError::FileNotFound { .. }));
    }

    #[test]
    fn test_capability_report_parsing() {
        let report = r#"{"validate": true, "track": false}"#;
        let caps: Capabilities = serde_json::from_str(report).unwrap();
        assert_eq!(
            caps,
            Capabilities {
                validate: true,
                track: false
            }
        );
    }

    #[test]
    fn test_missing_interpreter_is_import_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = PythonBackend::new("mpt-batch-no-such-python");

        let err = backend.open(dir.path()).err().unwrap();
        match err {
            BatchError::LibraryImport { reason, .. } => {
                assert!(reason.contains("not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_library_folder_is_not_reported_as_missing_interpreter() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("lib");
        let err = python_command(DEFAULT_PYTHON, &gone)
            .arg("--version")
            .output()
            .unwrap_err();

        let reason = spawn_reason(DEFAULT_PYTHON, &gone, &err);
        assert!(reason.contains("library folder"));
        assert!(!reason.contains("PATH"));

        let missing = std::io::Error::from(ErrorKind::NotFound);
        let reason = spawn_reason("no-such-python", dir.path(), &missing);
        assert!(reason.contains("not found in PATH"));
    }

    #[test]
    fn test_open_resolves_relative_root() {
        let backend = PythonBackend::new("mpt-batch-no-such-python");

        let err = backend.open(Path::new("relative-lib")).err().unwrap();
        match err {
            BatchError::LibraryImport { path, .. } => {
                assert!(Path::new(&path).is_absolute());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_python_path_puts_library_first() {
        let path = python_path(Path::new("/opt/mpthub"));
        let first = std::env::split_paths(&path).next().unwrap();
        assert_eq!(first, PathBuf::from("/opt/mpthub"));
    }
}
