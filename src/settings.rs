//! # 持久化设置
//!
//! 以扁平 key → string 的 JSON 文档保存最近使用的路径。
//!
//! ## 已知键
//! - `last_sizes`: 最近使用的尺寸表所在目录
//! - `last_data`: 最近使用的数据目录
//! - `mpt_lib`: 分析库目录
//!
//! 文档缺失或损坏时使用默认值，不报错。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `serde_json`、`directories`

use crate::error::{BatchError, Result};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 默认设置文件名
pub const SETTINGS_FILE: &str = "app_settings.json";

pub const KEY_LAST_SIZES: &str = "last_sizes";
pub const KEY_LAST_DATA: &str = "last_data";
pub const KEY_LIBRARY: &str = "mpt_lib";

/// 默认设置文件路径：可执行文件所在目录
pub fn default_settings_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(SETTINGS_FILE)))
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE))
}

fn home_dir() -> String {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().display().to_string())
        .unwrap_or_default()
}

/// 已加载的设置
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl Settings {
    /// 默认值
    pub fn defaults() -> BTreeMap<String, String> {
        let home = home_dir();
        BTreeMap::from([
            (KEY_LAST_SIZES.to_string(), home.clone()),
            (KEY_LAST_DATA.to_string(), home),
            (KEY_LIBRARY.to_string(), String::new()),
        ])
    }

    /// 读取设置，已保存的值覆盖默认值
    pub fn load(path: &Path) -> Self {
        let mut values = Self::defaults();
        values.extend(read_document(path));
        Settings {
            path: path.to_path_buf(),
            values,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取值，缺失时为空字符串
    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// 保存单个值：重新读取磁盘上的文档，更新后写回
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut values = Self::defaults();
        values.extend(read_document(&self.path));
        values.insert(key.to_string(), value.to_string());

        let content = serde_json::to_string_pretty(&values)?;
        fs::write(&self.path, content).map_err(|e| BatchError::FileWriteError {
            path: self.path.display().to_string(),
            source: e,
        })?;

        debug!("Saved setting {} = {}", key, value);
        self.values = values;
        Ok(())
    }
}

/// 读取设置文档，任何错误都视为空文档
fn read_document(path: &Path) -> BTreeMap<String, String> {
    let Ok(content) = fs::read_to_string(path) else {
        return BTreeMap::new();
    };

    match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&content) {
        Ok(doc) => doc
            .into_iter()
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect(),
        Err(e) => {
            debug!("Ignoring malformed settings {}: {}", path.display(), e);
            BTreeMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join(SETTINGS_FILE));

        assert_eq!(settings.get(KEY_LIBRARY), "");
        assert_eq!(settings.values().len(), 3);
        assert_eq!(settings.get("unknown"), "");
    }

    #[test]
    fn test_set_persists_and_merges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        let mut settings = Settings::load(&path);
        settings.set(KEY_LIBRARY, "/opt/mpthub").unwrap();
        settings.set(KEY_LAST_DATA, "/data").unwrap();

        let reloaded = Settings::load(&path);
        assert_eq!(reloaded.get(KEY_LIBRARY), "/opt/mpthub");
        assert_eq!(reloaded.get(KEY_LAST_DATA), "/data");
        assert_eq!(reloaded, settings);
    }

    #[test]
    fn test_set_keeps_values_written_by_others() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        let mut first = Settings::load(&path);
        let mut second = Settings::load(&path);
        first.set(KEY_LIBRARY, "/opt/mpthub").unwrap();
        second.set(KEY_LAST_DATA, "/data").unwrap();

        let reloaded = Settings::load(&path);
        assert_eq!(reloaded.get(KEY_LIBRARY), "/opt/mpthub");
        assert_eq!(reloaded.get(KEY_LAST_DATA), "/data");
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "[1, 2").unwrap();

        let settings = Settings::load(&path);
        assert_eq!(settings.get(KEY_LIBRARY), "");
    }

    #[test]
    fn test_non_string_values_are_stringified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, r#"{"mpt_lib": "/lib", "runs": 3}"#).unwrap();

        let settings = Settings::load(&path);
        assert_eq!(settings.get(KEY_LIBRARY), "/lib");
        assert_eq!(settings.get("runs"), "3");
    }
}
