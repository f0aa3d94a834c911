//! 演示文稿翻译
//!
//! 逐个文本段翻译：先检查例外规则，未命中再经过缓存和翻译服务。

use crate::error::Result;
use crate::exceptions::ExceptionMatcher;
use crate::languages::prompt_language;
use crate::pptx::Presentation;
use crate::service::TranslationService;
use std::path::Path;

/// 翻译一个演示文稿的参数
#[derive(Debug, Clone)]
pub struct DocumentJob<'a> {
    pub source_lang: &'a str,
    pub target_lang: &'a str,
    /// 替换 `V.xxx` 版本号时使用的版本字符串
    pub version: &'a str,
    pub use_exceptions: bool,
}

/// 翻译统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    pub runs: usize,
    pub translated: usize,
    pub exceptions: usize,
    pub skipped: usize,
}

/// 翻译 `input_path` 中的所有文本段并保存到 `output_path`
///
/// 任何一个文本段翻译失败都会中止整个文档，此时不会写出输出文件。
pub async fn translate_document<P, Q>(
    input_path: P,
    output_path: Q,
    job: &DocumentJob<'_>,
    service: &TranslationService,
) -> Result<DocumentReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();
    let mut presentation = Presentation::open(input_path)?;
    tracing::info!(
        "打开 {}: {} 张幻灯片，{} 个文本段",
        input_path.display(),
        presentation.slide_count(),
        presentation.run_count()
    );

    let report = match translate_presentation(&mut presentation, job, service).await {
        Ok(report) => report,
        Err(e) => {
            if e.is_terminal_translation_failure() {
                tracing::error!("翻译中止，未写出 {}: {}", output_path.display(), e);
            }
            return Err(e);
        }
    };

    presentation.save(output_path)?;
    tracing::info!("已保存到 {}", output_path.display());

    let stats = service.cache().stats().await;
    tracing::info!(
        "完成: 翻译 {}，例外 {}，跳过 {}；缓存命中 {}，未命中 {}，淘汰 {}",
        report.translated,
        report.exceptions,
        report.skipped,
        stats.hits,
        stats.misses,
        stats.evictions
    );
    Ok(report)
}

/// 就地翻译已打开的演示文稿
pub async fn translate_presentation(
    presentation: &mut Presentation,
    job: &DocumentJob<'_>,
    service: &TranslationService,
) -> Result<DocumentReport> {
    let matcher = job
        .use_exceptions
        .then(|| ExceptionMatcher::new(job.source_lang, job.target_lang, job.version));
    let language = prompt_language(job.target_lang);
    let total = presentation.run_count();
    let mut report = DocumentReport {
        runs: total,
        ..DocumentReport::default()
    };
    let mut position = 0;

    for slide in presentation.slides_mut() {
        let slide_number = slide.number();
        for run in slide.runs_mut() {
            position += 1;

            if run.text.trim().is_empty() {
                report.skipped += 1;
                continue;
            }

            if let Some(replaced) = matcher.as_ref().and_then(|m| m.apply(&run.text)) {
                tracing::debug!("幻灯片 {} 例外文本: {:?} -> {:?}", slide_number, run.text, replaced);
                run.text = replaced;
                report.exceptions += 1;
                continue;
            }

            run.text = service.get(&run.text, &language).await?;
            report.translated += 1;
            tracing::info!("Run {}/{} (slide {}) translated", position, total, slide_number);
        }
    }

    Ok(report)
}
