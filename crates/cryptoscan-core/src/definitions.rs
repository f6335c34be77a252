//! 算法定义加载（YAML，每个算法族一个文件）
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::DefinitionLoadError;

/// 单个定义文件的原始结构（字段与数据集的检测文件一致）
#[derive(Debug, Clone, Deserialize)]
struct DefinitionFile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// 归一化后的算法定义（加载完成后不可变）
#[derive(Debug, Clone)]
pub struct AlgorithmDefinition {
    pub id: String,
    pub name: Option<String>,
    pub category: Option<String>,
    /// 关键字列表（保持文件内的声明顺序）
    pub keywords: Vec<String>,
}

/// 完整定义集：id -> 定义
/// 保持按文件路径排序的加载顺序，便于输出与冲突报告可复现。
#[derive(Debug, Clone, Default)]
pub struct DefinitionSet {
    defs: Vec<AlgorithmDefinition>,
    index: HashMap<String, usize>,
}

impl DefinitionSet {
    /// 从目录递归加载所有 `*.yaml` / `*.yml` 定义文件并合并
    pub fn load_dir(dir: &Path) -> Result<Self, DefinitionLoadError> {
        let mut files: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(dir) {
            let entry = match entry { Ok(e) => e, Err(_) => continue };
            if !entry.file_type().is_file() { continue; }
            let is_def = matches!(
                entry.path().extension().and_then(|s| s.to_str()),
                Some("yaml") | Some("yml")
            );
            if is_def { files.push(entry.into_path()); }
        }
        // 按路径排序，保证加载顺序稳定
        files.sort();
        if files.is_empty() {
            return Err(DefinitionLoadError::NoDefinitions { dir: dir.to_path_buf() });
        }

        let mut set = DefinitionSet::default();
        for path in files {
            let def = load_definition_file(&path)?;
            set.insert(def, &path)?;
        }
        Ok(set)
    }

    /// 由内存中的定义直接构建（嵌入与测试场景）
    pub fn from_definitions(
        defs: impl IntoIterator<Item = AlgorithmDefinition>,
    ) -> Result<Self, DefinitionLoadError> {
        let origin = PathBuf::from("<memory>");
        let mut set = DefinitionSet::default();
        for def in defs {
            set.insert(def, &origin)?;
        }
        Ok(set)
    }

    fn insert(&mut self, def: AlgorithmDefinition, path: &Path) -> Result<(), DefinitionLoadError> {
        if self.index.contains_key(&def.id) {
            return Err(DefinitionLoadError::Duplicate { id: def.id, path: path.to_path_buf() });
        }
        self.index.insert(def.id.clone(), self.defs.len());
        self.defs.push(def);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// 按标识符查找定义
    pub fn get(&self, id: &str) -> Option<&AlgorithmDefinition> {
        self.index.get(id).map(|&i| &self.defs[i])
    }

    /// 按加载顺序遍历定义
    pub fn iter(&self) -> impl Iterator<Item = &AlgorithmDefinition> {
        self.defs.iter()
    }
}

/// 读取并校验单个定义文件
fn load_definition_file(path: &Path) -> Result<AlgorithmDefinition, DefinitionLoadError> {
    let txt = std::fs::read_to_string(path)
        .map_err(|source| DefinitionLoadError::Io { path: path.to_path_buf(), source })?;
    let parsed: DefinitionFile = serde_yaml::from_str(&txt)
        .map_err(|source| DefinitionLoadError::Parse { path: path.to_path_buf(), source })?;

    if parsed.id.is_empty() {
        return Err(DefinitionLoadError::EmptyId { path: path.to_path_buf() });
    }
    // 数据集同步工具的缺省行为：未声明关键字时退回 [id]
    let keywords = if parsed.keywords.is_empty() {
        vec![parsed.id.clone()]
    } else {
        parsed.keywords
    };
    for kw in &keywords {
        if kw.is_empty() {
            return Err(DefinitionLoadError::EmptyKeyword { id: parsed.id, path: path.to_path_buf() });
        }
    }

    Ok(AlgorithmDefinition {
        id: parsed.id,
        name: parsed.name,
        category: parsed.category,
        keywords,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_dir_merges_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rsa.yaml"),
            "id: RSA\nkeywords:\n  - RSA\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("aes.yaml"),
            "id: AES\nname: Advanced Encryption Standard\nkeywords:\n  - AES\n  - Rijndael\n",
        )
        .unwrap();
        // 非 YAML 文件不参与加载
        std::fs::write(dir.path().join("README.md"), "notes").unwrap();

        let set = DefinitionSet::load_dir(dir.path()).unwrap();
        assert_eq!(set.len(), 2);
        let ids: Vec<&str> = set.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["AES", "RSA"]);
        assert_eq!(set.get("AES").unwrap().keywords, vec!["AES", "Rijndael"]);
        assert_eq!(
            set.get("AES").unwrap().name.as_deref(),
            Some("Advanced Encryption Standard")
        );
    }

    #[test]
    fn missing_keywords_fall_back_to_id() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ecdh.yaml"), "id: ECDH\n").unwrap();

        let set = DefinitionSet::load_dir(dir.path()).unwrap();
        assert_eq!(set.get("ECDH").unwrap().keywords, vec!["ECDH"]);
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.yaml"), "id: AES\nkeywords: ]broken[\n").unwrap();

        let err = DefinitionSet::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, DefinitionLoadError::Parse { .. }));
    }

    #[test]
    fn missing_id_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.yaml"), "keywords:\n  - AES\n").unwrap();

        let err = DefinitionSet::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, DefinitionLoadError::Parse { .. }));
    }

    #[test]
    fn duplicate_identifier_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.yaml"), "id: AES\nkeywords:\n  - AES\n").unwrap();
        std::fs::write(dir.path().join("b.yaml"), "id: AES\nkeywords:\n  - Rijndael\n").unwrap();

        let err = DefinitionSet::load_dir(dir.path()).unwrap_err();
        match err {
            DefinitionLoadError::Duplicate { id, .. } => assert_eq!(id, "AES"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_keyword_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.yaml"), "id: AES\nkeywords:\n  - AES\n  - \"\"\n")
            .unwrap();

        let err = DefinitionSet::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, DefinitionLoadError::EmptyKeyword { .. }));
    }

    #[test]
    fn empty_dir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = DefinitionSet::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, DefinitionLoadError::NoDefinitions { .. }));
    }
}
