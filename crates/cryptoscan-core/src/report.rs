//! 扫描报告结构（对外暴露，可序列化）
use serde::Serialize;
use std::path::PathBuf;

use crate::options::ScanStats;

/// 单个输入的命中结果
#[derive(Debug, Clone, Serialize)]
pub struct FileMatches {
    pub path: PathBuf,
    /// 命中的算法标识符（字典序）
    pub algorithms: Vec<String>,
}

/// 被跳过的输入（二进制 / 超过大小上限）
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// 读取失败的输入
#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: String,
}

/// 一次批量扫描的完整报告
/// 命中结果与跳过/失败条目分开汇总，单个坏文件不影响其余输入。
#[derive(Debug, Default, Clone, Serialize)]
pub struct ScanReport {
    pub results: Vec<FileMatches>,
    pub skipped: Vec<SkippedFile>,
    pub failures: Vec<FailedFile>,
    pub stats: ScanStats,
}

impl ScanReport {
    /// 是否存在读取失败的输入（决定进程退出码）
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
