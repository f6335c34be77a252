//! 扫描选项与统计信息（模块）
use serde::Serialize;

use crate::matcher::MatchMode;

/// 扫描选项
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// 大小写不敏感匹配（ASCII 折叠）；默认大小写敏感
    pub case_insensitive: bool,
    /// 最大文件大小（字节）；超过则跳过并计入 skipped
    pub max_file_size: Option<u64>,
    /// 线程数：None 表示自动（等于 CPU 核数）；Some(1) 走串行
    pub threads: Option<usize>,
}

impl ScanOptions {
    pub(crate) fn match_mode(&self) -> MatchMode {
        if self.case_insensitive {
            MatchMode::CaseInsensitive
        } else {
            MatchMode::CaseSensitive
        }
    }
}

/// 扫描统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone, Serialize)]
pub struct ScanStats {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    /// (文件, 算法) 命中对的总数
    pub matches_total: usize,
}
