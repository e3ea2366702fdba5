//! `loader`：规则表文本的读取与解析。
//!
//! 支持的格式（字段用 `|||` 分隔，`#` 开头为注释）：
//! - standard：`source ||| target ||| scores [||| alignment [||| counts]]`
//! - hiero：`[LHS] ||| source ||| target ||| scores [||| alignment]`
//!
//! 资源可以是 gzip 压缩的，也可以是纯文本；按文件头的魔数判断，不看扩展名。
//! 分数按概率读入，存为 `max(ln(p), LOWEST_SCORE)`。

use std::{
    fs,
    io::{self, Read},
    path::Path,
};

use flate2::read::GzDecoder;
use phrase_core::model::{Phrase, ScoreProducer, ScoredCandidate};
use tracing::debug;

use crate::{error::LoadError, rule_table::RuleTable};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const FIELD_SEPARATOR: &str = "|||";

/// log(0) 的下限。
pub const LOWEST_SCORE: f32 = -100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarFormat {
    Standard,
    Hiero,
}

/// 一行规则拆出来的字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleFields<'a> {
    pub lhs: Option<&'a str>,
    pub source: &'a str,
    pub target: &'a str,
    pub scores: &'a str,
}

/// 规则表加载器：每种格式只负责把字段拆出来，其余流程共用。
pub trait RuleTableLoader {
    fn format(&self) -> GrammarFormat;

    /// 从 `|||` 切好的字段中取出规则；字段不符合本格式时返回 None。
    fn split<'a>(&self, fields: &[&'a str]) -> Option<RuleFields<'a>>;

    /// 解析 `text` 并写入 `table`，返回读入的规则数。
    fn load(&self, path: &Path, text: &str, producer: &ScoreProducer, table: &mut RuleTable) -> Result<usize, LoadError> {
        let mut count = 0;
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parse_error = |message: &str| LoadError::Parse {
                path: path.to_path_buf(),
                line: idx + 1,
                message: message.to_owned(),
            };

            let fields: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
            let Some(rule) = self.split(&fields) else {
                return Err(parse_error("字段数量或格式不符"));
            };
            if rule.source.is_empty() || rule.target.is_empty() {
                return Err(parse_error("缺少 source/target"));
            }

            let mut scores = Vec::with_capacity(producer.num_components());
            for token in rule.scores.split_whitespace() {
                let p: f32 = token
                    .parse()
                    .map_err(|_| parse_error(&format!("无法解析分数 `{token}`")))?;
                scores.push(transform_score(p));
            }
            if scores.len() != producer.num_components() {
                return Err(LoadError::ScoreCount {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    expected: producer.num_components(),
                    actual: scores.len(),
                });
            }

            let mut candidate = ScoredCandidate::new(Phrase::parse(rule.target), producer, scores);
            candidate.lhs = rule.lhs.map(str::to_owned);
            table.insert(Phrase::parse(rule.source), candidate);
            count += 1;
        }
        Ok(count)
    }
}

pub struct StandardLoader;

impl RuleTableLoader for StandardLoader {
    fn format(&self) -> GrammarFormat {
        GrammarFormat::Standard
    }

    fn split<'a>(&self, fields: &[&'a str]) -> Option<RuleFields<'a>> {
        match fields {
            &[source, target, scores, ..] => Some(RuleFields {
                lhs: None,
                source,
                target,
                scores,
            }),
            _ => None,
        }
    }
}

pub struct HieroLoader;

impl RuleTableLoader for HieroLoader {
    fn format(&self) -> GrammarFormat {
        GrammarFormat::Hiero
    }

    fn split<'a>(&self, fields: &[&'a str]) -> Option<RuleFields<'a>> {
        match fields {
            &[lhs, source, target, scores, ..] if is_label(lhs) => Some(RuleFields {
                lhs: Some(lhs),
                source,
                target,
                scores,
            }),
            _ => None,
        }
    }
}

/// 按格式选择加载器。
pub fn loader_for(format: GrammarFormat) -> Box<dyn RuleTableLoader> {
    match format {
        GrammarFormat::Standard => Box::new(StandardLoader),
        GrammarFormat::Hiero => Box::new(HieroLoader),
    }
}

/// 第一条规则行（跳过空行与注释）。
fn first_rule_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|l| !l.is_empty() && !l.starts_with('#'))
}

/// 看第一条规则判断格式；没有规则或字段不够时返回 None。
pub fn detect_format(text: &str) -> Option<GrammarFormat> {
    let line = first_rule_line(text)?;
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
    match fields.as_slice() {
        [lhs, _, _, _, ..] if is_label(lhs) => Some(GrammarFormat::Hiero),
        [_, _, _, ..] => Some(GrammarFormat::Standard),
        _ => None,
    }
}

/// 读取资源全文；gzip 自动解压。
pub fn read_resource(path: &Path) -> Result<String, LoadError> {
    let io_error = |source: io::Error| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let bytes = fs::read(path).map_err(io_error)?;
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut text = String::new();
        GzDecoder::new(bytes.as_slice())
            .read_to_string(&mut text)
            .map_err(io_error)?;
        Ok(text)
    } else {
        String::from_utf8(bytes).map_err(|e| io_error(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}

/// 读取、嗅探格式、解析并按 `table_limit` 裁剪。
///
/// 没有任何规则行的资源得到空表，不算格式错误。
pub fn load_rule_table(path: &Path, producer: &ScoreProducer, table_limit: usize) -> Result<RuleTable, LoadError> {
    let text = read_resource(path)?;
    if first_rule_line(&text).is_none() {
        debug!(event = "rule_table_empty", path = %path.display());
        return Ok(RuleTable::new());
    }
    let format = detect_format(&text).ok_or_else(|| LoadError::UnknownFormat {
        path: path.to_path_buf(),
    })?;
    let loader = loader_for(format);
    let mut table = RuleTable::new();
    let rules = loader.load(path, &text, producer, &mut table)?;
    table.prune(table_limit);
    debug!(
        event = "rule_table_loaded",
        path = %path.display(),
        format = ?loader.format(),
        rules,
        sources = table.len(),
    );
    Ok(table)
}

/// 概率 -> 对数分数（带下限）。
pub fn transform_score(p: f32) -> f32 {
    p.ln().max(LOWEST_SCORE)
}

fn is_label(field: &str) -> bool {
    field.len() > 2 && field.starts_with('[') && field.ends_with(']') && !field.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::{Compression, write::GzEncoder};

    use super::*;

    fn tm(n: usize) -> ScoreProducer {
        ScoreProducer::new("tm", n, None).unwrap()
    }

    #[test]
    fn detects_format_from_first_rule() {
        assert_eq!(
            detect_format("# comment\n\ndas ||| the ||| 0.5 0.5\n"),
            Some(GrammarFormat::Standard)
        );
        assert_eq!(
            detect_format("[X] ||| das [X,1] ||| the [X,1] ||| 0.5 ||| 1-1\n"),
            Some(GrammarFormat::Hiero)
        );
        assert_eq!(detect_format("das ||| the\n"), None);
        assert_eq!(detect_format(""), None);
    }

    #[test]
    fn standard_rules_are_log_transformed() {
        let mut table = RuleTable::new();
        let text = "das haus ||| the house ||| 1 0.5 ||| 0-0 1-1\ndas ||| the ||| 0 1\n";
        let n = StandardLoader.load(Path::new("pt"), text, &tm(2), &mut table).unwrap();
        assert_eq!(n, 2);

        let set = table.get(&Phrase::parse("das haus")).unwrap();
        let scores = set.iter().next().unwrap().scores().get("tm").unwrap();
        assert_eq!(scores[0], 0.0);
        assert!((scores[1] - 0.5f32.ln()).abs() < 1e-6);

        let floored = table.get(&Phrase::parse("das")).unwrap().iter().next().unwrap();
        assert_eq!(floored.scores().get("tm").unwrap(), &[LOWEST_SCORE, 0.0]);
    }

    #[test]
    fn hiero_rules_keep_their_label() {
        let mut table = RuleTable::new();
        let text = "[X] ||| das [X,1] ||| the [X,1] ||| 0.5\n";
        HieroLoader.load(Path::new("g"), text, &tm(1), &mut table).unwrap();
        let rule = table.get(&Phrase::parse("das [X,1]")).unwrap().iter().next().unwrap();
        assert_eq!(rule.lhs.as_deref(), Some("[X]"));
        assert_eq!(rule.target(), &Phrase::parse("the [X,1]"));
    }

    #[test]
    fn bad_lines_report_their_position() {
        let mut table = RuleTable::new();
        let err = StandardLoader
            .load(Path::new("pt"), "a ||| b ||| 0.5\na ||| c ||| 0.5 0.5\n", &tm(1), &mut table)
            .unwrap_err();
        assert!(matches!(err, LoadError::ScoreCount { line: 2, expected: 1, actual: 2, .. }));

        let err = StandardLoader
            .load(Path::new("pt"), "a ||| b ||| abc\n", &tm(1), &mut table)
            .unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: 1, .. }));

        let err = HieroLoader
            .load(Path::new("g"), "a ||| b ||| c ||| 0.5\n", &tm(1), &mut table)
            .unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: 1, .. }));
    }

    #[test]
    fn gzip_and_plain_resources_read_the_same() {
        let dir = tempfile::tempdir().unwrap();
        let text = "das ||| the ||| 0.5\n";

        let plain = dir.path().join("plain.txt");
        fs::write(&plain, text).unwrap();

        let gz = dir.path().join("packed.gz");
        let mut encoder = GzEncoder::new(fs::File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap();

        assert_eq!(read_resource(&plain).unwrap(), text);
        assert_eq!(read_resource(&gz).unwrap(), text);

        let table = load_rule_table(&gz, &tm(1), 0).unwrap();
        assert_eq!(table.rule_count(), 1);
    }

    #[test]
    fn resource_without_rules_loads_as_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.txt");
        fs::write(&empty, "").unwrap();
        let comments = dir.path().join("comments.txt");
        fs::write(&comments, "# no rules for this sentence

").unwrap();

        assert!(load_rule_table(&empty, &tm(1), 0).unwrap().is_empty());
        assert!(load_rule_table(&comments, &tm(1), 0).unwrap().is_empty());

        let garbage = dir.path().join("garbage.txt");
        fs::write(&garbage, "# header
not a grammar
").unwrap();
        let err = load_rule_table(&garbage, &tm(1), 0).unwrap_err();
        assert!(matches!(err, LoadError::UnknownFormat { .. }));
    }

    #[test]
    fn missing_resource_is_an_io_error() {
        let err = read_resource(Path::new("/nonexistent/grammar.0.gz")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
