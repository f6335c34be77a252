//! 错误类型（thiserror）
use std::path::PathBuf;
use thiserror::Error;

/// 定义集加载错误：启动期致命
/// 任一定义文件有问题即整体失败，不允许静默接受“部分定义集”。
#[derive(Debug, Error)]
pub enum DefinitionLoadError {
    /// 定义文件读取失败
    #[error("failed to read definition file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML 结构不符合预期
    #[error("malformed definition file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// 算法标识符在多个定义文件间冲突（策略：加载期拒绝）
    #[error("duplicate algorithm identifier `{id}` in {path}")]
    Duplicate { id: String, path: PathBuf },

    /// id 字段为空
    #[error("empty algorithm identifier in {path}")]
    EmptyId { path: PathBuf },

    /// 关键字为空字符串（空模式匹配任意文本，必须拒绝）
    #[error("empty keyword in definition `{id}` ({path})")]
    EmptyKeyword { id: String, path: PathBuf },

    /// 目录下没有任何定义文件
    #[error("no definition files found under {dir}")]
    NoDefinitions { dir: PathBuf },

    /// 关键字自动机构建失败
    #[error("failed to build keyword automaton: {0}")]
    Matcher(#[from] aho_corasick::BuildError),
}

/// 单个输入文件的读取错误：批次内可恢复
/// 记入报告的 failures 列表后继续处理其余输入。
#[derive(Debug, Error)]
#[error("failed to read {path}: {source}")]
pub struct FileReadError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
