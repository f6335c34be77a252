//! 关键字匹配器（Aho-Corasick 多模式子串匹配）
//!
//! 设计要点：
//! - 所有定义的全部关键字编译进一个自动机，模式索引映射回定义索引。
//! - 可观测语义严格等价于逐关键字的朴素子串包含，自动机只是吞吐量选择。
//! - 大小写不敏感模式使用 ASCII 折叠（数据集关键字均为 ASCII）。
use std::collections::BTreeSet;
use std::path::Path;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};

use crate::definitions::DefinitionSet;
use crate::engine::{scan_file, FileOutcome};
use crate::error::{DefinitionLoadError, FileReadError};

/// 匹配模式：默认大小写敏感
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    CaseSensitive,
    CaseInsensitive,
}

/// 编译后的匹配器。构建完成后只读，可跨线程共享。
pub struct KeywordMatcher {
    ac: AhoCorasick,
    /// 模式索引 -> 定义索引
    pattern_owner: Vec<usize>,
    /// 定义索引 -> 算法标识符
    ids: Vec<String>,
    /// 最长关键字的字节长度（分块扫描的重叠宽度依据）
    max_keyword_len: usize,
}

impl KeywordMatcher {
    /// 从定义集编译匹配器
    pub fn new(defs: &DefinitionSet, mode: MatchMode) -> Result<Self, DefinitionLoadError> {
        let mut patterns: Vec<&str> = Vec::new();
        let mut pattern_owner: Vec<usize> = Vec::new();
        let mut ids: Vec<String> = Vec::with_capacity(defs.len());
        let mut max_keyword_len = 0usize;

        for (idx, def) in defs.iter().enumerate() {
            ids.push(def.id.clone());
            for kw in &def.keywords {
                max_keyword_len = max_keyword_len.max(kw.len());
                patterns.push(kw);
                pattern_owner.push(idx);
            }
        }

        let ac = AhoCorasickBuilder::new()
            .ascii_case_insensitive(matches!(mode, MatchMode::CaseInsensitive))
            .build(&patterns)?;

        Ok(Self { ac, pattern_owner, ids, max_keyword_len })
    }

    /// 扫描一段字节，返回命中的算法标识符集合（字典序）
    pub fn scan_bytes(&self, hay: &[u8]) -> BTreeSet<String> {
        let mut hits: BTreeSet<usize> = BTreeSet::new();
        self.scan_indices(hay, &mut hits);
        hits.into_iter().map(|i| self.ids[i].clone()).collect()
    }

    /// `&str` 便捷入口
    pub fn scan_str(&self, text: &str) -> BTreeSet<String> {
        self.scan_bytes(text.as_bytes())
    }

    /// 读取整个文件并扫描
    /// 返回 `Ok(None)` 表示输入被判定为二进制并按策略跳过。
    pub fn scan_file(&self, path: &Path) -> Result<Option<BTreeSet<String>>, FileReadError> {
        match scan_file(path, self)? {
            FileOutcome::Scanned(hits) => {
                Ok(Some(hits.into_iter().map(|i| self.ids[i].clone()).collect()))
            }
            FileOutcome::Binary => Ok(None),
        }
    }

    /// 收集命中的定义索引（引擎内部使用，跨分块累积同一个集合）
    pub(crate) fn scan_indices(&self, hay: &[u8], out: &mut BTreeSet<usize>) {
        // 使用 overlapping 遍历：不同定义的关键字可能互相重叠，
        // 非重叠遍历会让先命中的模式遮蔽后者。
        for m in self.ac.find_overlapping_iter(hay) {
            out.insert(self.pattern_owner[m.pattern().as_usize()]);
            // 全部定义均已命中时提前结束
            if out.len() == self.ids.len() { break; }
        }
    }

    pub(crate) fn id_at(&self, idx: usize) -> &str {
        &self.ids[idx]
    }

    pub(crate) fn max_keyword_len(&self) -> usize {
        self.max_keyword_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::AlgorithmDefinition;

    fn defs(entries: &[(&str, &[&str])]) -> DefinitionSet {
        DefinitionSet::from_definitions(entries.iter().map(|(id, kws)| AlgorithmDefinition {
            id: id.to_string(),
            name: None,
            category: None,
            keywords: kws.iter().map(|k| k.to_string()).collect(),
        }))
        .unwrap()
    }

    #[test]
    fn keyword_substring_matches() {
        let set = defs(&[("AES", &["AES", "Rijndael"])]);
        let m = KeywordMatcher::new(&set, MatchMode::CaseSensitive).unwrap();

        let hits = m.scan_str("uses AES-256-GCM cipher");
        assert_eq!(hits.into_iter().collect::<Vec<_>>(), vec!["AES"]);
    }

    #[test]
    fn no_keyword_means_no_match() {
        let set = defs(&[("AES", &["AES", "Rijndael"]), ("RSA", &["RSA"])]);
        let m = KeywordMatcher::new(&set, MatchMode::CaseSensitive).unwrap();

        assert!(m.scan_str("plain text without ciphers").is_empty());
    }

    #[test]
    fn case_sensitive_by_default() {
        let set = defs(&[("SHA2", &["SHA-256", "SHA256"])]);
        let m = KeywordMatcher::new(&set, MatchMode::CaseSensitive).unwrap();

        assert!(m.scan_str("calls sha256_init()").is_empty());
    }

    #[test]
    fn case_insensitive_folds_ascii() {
        let set = defs(&[("RSA", &["RSA"]), ("SHA2", &["SHA-256", "SHA256"])]);
        let m = KeywordMatcher::new(&set, MatchMode::CaseInsensitive).unwrap();

        let hits = m.scan_str("calls sha256_init()");
        assert_eq!(hits.into_iter().collect::<Vec<_>>(), vec!["SHA2"]);
    }

    #[test]
    fn overlapping_keywords_both_reported() {
        // "ChaCha20" 是 "XChaCha20" 的后缀，重叠命中不得互相遮蔽
        let set = defs(&[("ChaCha20", &["ChaCha20"]), ("XChaCha20", &["XChaCha20"])]);
        let m = KeywordMatcher::new(&set, MatchMode::CaseSensitive).unwrap();

        let hits = m.scan_str("uses XChaCha20 stream cipher");
        assert_eq!(
            hits.into_iter().collect::<Vec<_>>(),
            vec!["ChaCha20", "XChaCha20"]
        );
    }

    #[test]
    fn match_anywhere_inside_token() {
        // 无词边界要求：关键字允许命中在更长标识符内部
        let set = defs(&[("MD5", &["MD5", "md5"])]);
        let m = KeywordMatcher::new(&set, MatchMode::CaseSensitive).unwrap();

        let hits = m.scan_str("legacy_md5sum_helper");
        assert_eq!(hits.into_iter().collect::<Vec<_>>(), vec!["MD5"]);
    }
}
