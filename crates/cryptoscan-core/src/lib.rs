//! 加密算法关键字扫描核心库
//!
//! 设计要点：
//! - 定义集（YAML，每个算法族一个文件）启动期一次性加载，此后只读。
//! - 匹配语义是严格的字面子串包含（无词边界、无模糊匹配）；
//!   Aho-Corasick 自动机仅是吞吐量上的实现选择。
//! - 单文件失败不影响批次：跳过/失败条目在报告中与命中结果分开汇总。
//! - 报告顺序稳定可复现（文件按路径排序，命中标识符按字典序）。

mod definitions;
mod engine;
mod error;
mod matcher;
mod options;
mod report;
mod scan;

pub use definitions::{AlgorithmDefinition, DefinitionSet};
pub use error::{DefinitionLoadError, FileReadError};
pub use matcher::{KeywordMatcher, MatchMode};
pub use options::{ScanOptions, ScanStats};
pub use report::{FailedFile, FileMatches, ScanReport, SkippedFile};
pub use scan::{scan_inputs, scan_text};
