use std::{
    env,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use phrase_core::{context::SentenceContext, model::Phrase, session::Backend};
use phrase_dict::BackendConfig;
use tracing::error;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

#[derive(Debug, PartialEq)]
struct Args {
    config: PathBuf,
    max_phrase_length: usize,
}

#[derive(Debug, PartialEq)]
enum Command {
    Run(Args),
    Help,
}

const USAGE: &str = "用法：phrase_cli --config <backend.toml> [--max-phrase-length N]\n\
                     从标准输入逐行读取源句（第 n 行的句子编号为 n-1），输出每个短语的融合候选。";

fn main() -> ExitCode {
    init_logging();
    let args = match parse_args(env::args().skip(1)) {
        Some(Command::Run(args)) => args,
        Some(Command::Help) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        None => {
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let mut backend = match load_backend(&args.config) {
        Ok(backend) => backend,
        Err(e) => {
            error!(event = "config_error", config = %args.config.display(), error = %e);
            eprintln!("配置错误：{e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&mut backend, args.max_phrase_length) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("I/O 错误：{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// 参数无效时返回 None。
fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Command> {
    let mut config = None;
    let mut max_phrase_length = 3;
    while let Some(a) = args.next() {
        match a.as_str() {
            "--config" => config = Some(args.next().map(PathBuf::from)?),
            "--max-phrase-length" => {
                max_phrase_length = args.next().and_then(|n| n.parse().ok()).filter(|n| *n > 0)?;
            }
            "--help" | "-h" => return Some(Command::Help),
            _ => return None,
        }
    }
    Some(Command::Run(Args {
        config: config?,
        max_phrase_length,
    }))
}

fn load_backend(path: &Path) -> Result<Backend, phrase_dict::ConfigError> {
    let config = BackendConfig::from_toml_file(path)?;
    let base_dir = path.parent().unwrap_or(Path::new("."));
    config.build(base_dir)
}

fn run(backend: &mut Backend, max_phrase_length: usize) -> io::Result<()> {
    let stdin = io::stdin();
    let mut out = io::stdout().lock();

    for (translation_id, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        let source = Phrase::parse(&line);
        let translation_id = translation_id as u64;
        writeln!(out, "--------------------")?;
        writeln!(out, "[{translation_id}] {source}")?;
        if source.is_empty() {
            continue;
        }

        let mut sentence = match backend.begin_sentence(SentenceContext::new(translation_id, source.clone())) {
            Ok(sentence) => sentence,
            Err(e) => {
                // 单句失败：报告句子编号后继续下一句
                error!(event = "sentence_failed", translation_id, error = %e);
                writeln!(out, "  (第 {translation_id} 句失败：{e})")?;
                continue;
            }
        };

        let mut spans = Vec::new();
        for start in 0..source.len() {
            for end in (start + 1)..=(start + max_phrase_length).min(source.len()) {
                if let Some(phrase) = source.span(start, end) {
                    spans.push((start, end, phrase));
                }
            }
        }
        let phrases: Vec<Phrase> = spans.iter().map(|(_, _, p)| p.clone()).collect();
        let sets = match sentence.lookup_batch(&phrases) {
            Ok(sets) => sets,
            Err(e) => {
                error!(event = "lookup_failed", translation_id, error = %e);
                writeln!(out, "  (第 {translation_id} 句查询失败：{e})")?;
                continue;
            }
        };

        for ((start, end, phrase), set) in spans.iter().zip(&sets) {
            if set.is_empty() {
                continue;
            }
            writeln!(out, "  [{start}, {end}) {phrase}")?;
            for (i, c) in set.sorted().iter().enumerate() {
                let n = i + 1;
                writeln!(out, "    {n}. {}\t{:.4}", c.target(), c.future_score())?;
            }
        }
        let released = sentence.finish();
        writeln!(out, "  (释放 {released} 个候选集合)")?;
    }

    Ok(())
}
