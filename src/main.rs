//! 命令行工具：翻译PPTX演示文稿中的文本。

use anyhow::{bail, Context, Result};
use clap::Parser;
use pptx_translator::{
    translate_document, AnthropicBackend, ChunkTranslator, Cl100kTokenizer, DocumentJob,
    TranslationCache, TranslationService, TranslatorConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Translate the text of a PowerPoint (.pptx) deck with an LLM backend.
#[derive(Parser, Debug)]
#[command(name = "pptx-translate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input .pptx file
    #[arg(required_unless_present = "generate_config")]
    input: Option<PathBuf>,

    /// Output .pptx file
    #[arg(required_unless_present = "generate_config")]
    output: Option<PathBuf>,

    /// Source language code, e.g. "en"
    #[arg(short, long, default_value = "en")]
    source_lang: String,

    /// Target language code, e.g. "fr"
    #[arg(short, long, required_unless_present = "generate_config")]
    target_lang: Option<String>,

    /// Version string used to rewrite "V.xxx" markers
    #[arg(long, default_value = "")]
    doc_version: String,

    /// Rewrite language labels and version markers instead of translating them
    #[arg(short = 'e', long)]
    use_exceptions: bool,

    /// Configuration file (default: search pptx-translator.toml, config.toml, .pptx-translator.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the maximum number of tokens per chunk
    #[arg(long)]
    max_tokens: Option<usize>,

    /// Write an example configuration file and exit
    #[arg(long, value_name = "FILE")]
    generate_config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Some(path) = &args.generate_config {
        TranslatorConfig::generate_example_config(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Example configuration written to {}", path.display());
        return Ok(());
    }

    let (Some(input), Some(output), Some(target_lang)) = (&args.input, &args.output, &args.target_lang)
    else {
        bail!("INPUT, OUTPUT and --target-lang are required");
    };

    let mut config = match &args.config {
        Some(path) => TranslatorConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TranslatorConfig::load_from_default_locations(),
    };
    if let Some(max_tokens) = args.max_tokens {
        config.chunking.max_tokens = max_tokens;
    }

    let backend = AnthropicBackend::new(config.backend.clone()).context("Failed to create backend")?;
    let tokenizer = Cl100kTokenizer::new().context("Failed to load tokenizer")?;
    let translator = ChunkTranslator::new(
        Arc::new(backend),
        Arc::new(tokenizer),
        config.chunking.max_tokens,
        config.retry.clone(),
    );
    let service = TranslationService::new(translator, Arc::new(TranslationCache::new(config.cache.capacity)));

    let job = DocumentJob {
        source_lang: &args.source_lang,
        target_lang,
        version: &args.doc_version,
        use_exceptions: args.use_exceptions,
    };

    let report = match translate_document(input, output, &job, &service).await {
        Ok(report) => report,
        Err(e) if e.is_terminal_translation_failure() => {
            bail!("Translation of {} aborted, {} was not written: {}", input.display(), output.display(), e)
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to translate {}", input.display())),
    };

    eprintln!(
        "Translated {} of {} runs ({} exceptions) -> {}",
        report.translated,
        report.runs,
        report.exceptions,
        output.display()
    );
    Ok(())
}
