use async_trait::async_trait;
use pptx_translator::{
    translate_document, AttemptOutcome, ChunkTranslator, Cl100kTokenizer, DocumentJob, Presentation,
    RetryConfig, TranslationBackend, TranslationCache, TranslationError, TranslationService,
};
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use zip::write::FileOptions;
use zip::ZipWriter;

/// 把内容包上语言名作为“译文”
#[derive(Default)]
struct TaggingBackend {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl TranslationBackend for TaggingBackend {
    async fn call(&self, system_prompt: &str, content: &str) -> AttemptOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(system_prompt.to_string());
        let text = content.trim_start_matches("string to translate:\n ");
        AttemptOutcome::Success(format!("<fr>{}</fr>", text))
    }
}

struct AlwaysBusy {
    calls: AtomicUsize,
}

#[async_trait]
impl TranslationBackend for AlwaysBusy {
    async fn call(&self, _system_prompt: &str, _content: &str) -> AttemptOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        AttemptOutcome::TransientFailure("overloaded_error".to_string())
    }
}

fn service(backend: Arc<dyn TranslationBackend>, max_attempts: usize) -> TranslationService {
    let translator = ChunkTranslator::new(
        backend,
        Arc::new(Cl100kTokenizer::new().unwrap()),
        1750,
        RetryConfig {
            max_attempts,
            delay_secs: 0.0,
        },
    );
    TranslationService::new(translator, Arc::new(TranslationCache::new(100)))
}

fn write_deck(path: &Path, runs: &[&str]) {
    let body: String = runs
        .iter()
        .map(|text| {
            format!(
                "<p:sp><p:txBody><a:bodyPr/><a:p><a:r><a:rPr lang=\"en-US\"/><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>",
                text
            )
        })
        .collect();
    let slide = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<p:sld xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\"><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>",
        body
    );

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();
    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(b"<Types/>").unwrap();
    zip.start_file("ppt/presentation.xml", options).unwrap();
    zip.write_all(b"<p:presentation/>").unwrap();
    zip.start_file("ppt/slides/slide1.xml", options).unwrap();
    zip.write_all(slide.as_bytes()).unwrap();
    let bytes = zip.finish().unwrap().into_inner();
    std::fs::write(path, bytes).unwrap();
}

fn run_texts(path: &Path) -> Vec<String> {
    let presentation = Presentation::open(path).unwrap();
    presentation
        .slides()
        .flat_map(|s| s.runs().iter().map(|r| r.text.clone()).collect::<Vec<_>>())
        .collect()
}

#[tokio::test]
async fn translates_deck_with_exceptions_and_cache() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("deck.pptx");
    let output = dir.path().join("deck.fr.pptx");
    write_deck(
        &input,
        &["Welcome.", "User guide - EN", "Release V.001", "Welcome.", "   "],
    );

    let backend = Arc::new(TaggingBackend::default());
    let service = service(backend.clone(), 3);
    let job = DocumentJob {
        source_lang: "en",
        target_lang: "fr",
        version: "2.3.4",
        use_exceptions: true,
    };

    let report = translate_document(&input, &output, &job, &service).await.unwrap();

    assert_eq!(
        run_texts(&output),
        vec![
            "<fr>Welcome.</fr>",
            "User guide - FR",
            "Release v234",
            "<fr>Welcome.</fr>",
            "   ",
        ]
    );
    assert_eq!(report.runs, 5);
    assert_eq!(report.translated, 2);
    assert_eq!(report.exceptions, 2);
    assert_eq!(report.skipped, 1);
    // 重复的文本段命中缓存
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    assert!(backend.prompts.lock().unwrap()[0].contains("into French"));
}

#[tokio::test]
async fn exceptions_are_translated_when_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("deck.pptx");
    let output = dir.path().join("out.pptx");
    write_deck(&input, &["Guide - EN"]);

    let backend = Arc::new(TaggingBackend::default());
    let job = DocumentJob {
        source_lang: "en",
        target_lang: "fr",
        version: "1",
        use_exceptions: false,
    };
    translate_document(&input, &output, &job, &service(backend.clone(), 3))
        .await
        .unwrap();

    assert_eq!(run_texts(&output), vec!["<fr>Guide - EN</fr>"]);
}

#[tokio::test]
async fn exhausted_retries_abort_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("deck.pptx");
    let output = dir.path().join("out.pptx");
    write_deck(&input, &["First.", "Second."]);

    let backend = Arc::new(AlwaysBusy {
        calls: AtomicUsize::new(0),
    });
    let job = DocumentJob {
        source_lang: "en",
        target_lang: "de",
        version: "",
        use_exceptions: true,
    };
    let err = translate_document(&input, &output, &job, &service(backend.clone(), 4))
        .await
        .unwrap_err();

    assert!(err.is_terminal_translation_failure());
    assert!(matches!(
        err,
        TranslationError::ChunkFailed {
            index: 1,
            total: 1,
            attempts: 4,
            ..
        }
    ));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 4);
    assert!(!output.exists());
}
