//! PPTX 文档读写
//!
//! 打开演示文稿，按 幻灯片 → 形状 → 段落 → 文本段(run) 的顺序枚举文本，
//! 允许修改每个文本段的内容并保存。除幻灯片XML中的文本外，其余内容原样写回。

use crate::error::{Result, TranslationError};
use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};
use regex::Regex;
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;
use std::sync::LazyLock;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const PRESENTATION_PATH: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PATH: &str = "ppt/_rels/presentation.xml.rels";

static SLIDE_PATH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").expect("valid slide path regex"));

/// 压缩包中的一个条目
struct Entry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

/// 一个文本段
///
/// `text` 可直接修改，保存时写回原位置，格式属性保持不变。
#[derive(Debug, Clone)]
pub struct TextRun {
    /// 幻灯片内形状序号（从0开始）
    pub shape: usize,
    /// 形状内段落序号（从0开始）
    pub paragraph: usize,
    pub text: String,
    /// 对应 `<a:t>` 内的文本事件位置
    events: Vec<usize>,
}

/// 一张幻灯片
pub struct Slide {
    number: usize,
    path: String,
    events: Vec<Event<'static>>,
    runs: Vec<TextRun>,
}

impl Slide {
    /// 在演示顺序中的位置（从1开始）
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    pub fn runs_mut(&mut self) -> &mut [TextRun] {
        &mut self.runs
    }

    fn parse(number: usize, path: &str, xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut events: Vec<Event<'static>> = Vec::new();
        let mut runs = Vec::new();

        let mut shape: Option<usize> = None;
        let mut shapes_seen = 0;
        let mut in_text_body = false;
        let mut paragraph: Option<usize> = None;
        let mut paragraphs_seen = 0;
        let mut in_run = false;
        let mut current: Option<TextRun> = None;

        loop {
            let event = reader.read_event()?;
            match &event {
                Event::Eof => break,
                Event::Start(e) => match local_name(e.name().as_ref()) {
                    b"sp" | b"graphicFrame" => {
                        shape = Some(shapes_seen);
                        shapes_seen += 1;
                    }
                    b"txBody" => {
                        in_text_body = true;
                        paragraphs_seen = 0;
                    }
                    b"p" if in_text_body => {
                        paragraph = Some(paragraphs_seen);
                        paragraphs_seen += 1;
                    }
                    b"r" if paragraph.is_some() => in_run = true,
                    b"t" if in_run => {
                        current = Some(TextRun {
                            shape: shape.unwrap_or_default(),
                            paragraph: paragraph.unwrap_or_default(),
                            text: String::new(),
                            events: Vec::new(),
                        });
                    }
                    _ => {}
                },
                Event::Empty(e) if in_run && local_name(e.name().as_ref()) == b"t" => {
                    // <a:t/> 展开为 <a:t></a:t>，便于写入新文本
                    let start = e.clone().into_owned();
                    let end = start.to_end().into_owned();
                    events.push(Event::Start(start));
                    runs.push(TextRun {
                        shape: shape.unwrap_or_default(),
                        paragraph: paragraph.unwrap_or_default(),
                        text: String::new(),
                        events: vec![events.len()],
                    });
                    events.push(Event::Text(BytesText::new("").into_owned()));
                    events.push(Event::End(end));
                    continue;
                }
                Event::Text(e) if current.is_some() => {
                    let text = e.unescape()?;
                    if let Some(run) = current.as_mut() {
                        run.text.push_str(&text);
                        run.events.push(events.len());
                    }
                }
                Event::CData(e) if current.is_some() => {
                    if let Some(run) = current.as_mut() {
                        run.text.push_str(&String::from_utf8_lossy(e));
                        run.events.push(events.len());
                    }
                }
                Event::End(e) => match local_name(e.name().as_ref()) {
                    b"t" => {
                        if let Some(mut run) = current.take() {
                            if run.events.is_empty() {
                                run.events.push(events.len());
                                events.push(Event::Text(BytesText::new("").into_owned()));
                            }
                            runs.push(run);
                        }
                    }
                    b"r" => in_run = false,
                    b"p" => paragraph = None,
                    b"txBody" => in_text_body = false,
                    b"sp" | b"graphicFrame" => shape = None,
                    _ => {}
                },
                _ => {}
            }
            events.push(event.into_owned());
        }

        Ok(Self {
            number,
            path: path.to_string(),
            events,
            runs,
        })
    }

    /// 用当前的文本段内容重新生成幻灯片XML
    fn to_xml(&self) -> Result<Vec<u8>> {
        let mut events = self.events.clone();
        for run in &self.runs {
            for (i, &index) in run.events.iter().enumerate() {
                let text = if i == 0 { run.text.as_str() } else { "" };
                events[index] = Event::Text(BytesText::new(text).into_owned());
            }
        }

        let mut writer = Writer::new(Vec::new());
        for event in events {
            writer.write_event(event)?;
        }
        Ok(writer.into_inner())
    }
}

/// 一个已打开的演示文稿
pub struct Presentation {
    entries: Vec<Entry>,
    /// (条目位置, 幻灯片)，按演示顺序
    slides: Vec<(usize, Slide)>,
}

impl Presentation {
    /// 打开PPTX文件
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            TranslationError::Document(format!("无法打开 {}: {}", path.display(), e))
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// 读取压缩包
    ///
    /// 幻灯片顺序取自 `ppt/presentation.xml` 的 `sldIdLst`（经
    /// `ppt/_rels/presentation.xml.rels` 解析为路径），未列出的幻灯片部件不参与枚举，
    /// 但保存时原样写回。缺少这两个部件时按文件名中的编号排序。
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push(Entry {
                name,
                compression: file.compression(),
                is_dir: file.is_dir(),
                data,
            });
        }

        let has_slide_parts = entries.iter().any(|e| slide_number(&e.name).is_some());
        if !has_slide_parts && find_entry(&entries, PRESENTATION_PATH).is_none() {
            return Err(TranslationError::Document("不是PPTX演示文稿".to_string()));
        }

        let order = match listed_slides(&entries)? {
            Some(order) => order,
            None => {
                tracing::debug!("缺少 {} 或其关系文件，按文件名编号排序", PRESENTATION_PATH);
                let mut numbered: Vec<(usize, String)> = entries
                    .iter()
                    .filter_map(|e| slide_number(&e.name).map(|n| (n, e.name.clone())))
                    .collect();
                numbered.sort();
                numbered.into_iter().map(|(_, name)| name).collect()
            }
        };

        let mut slides = Vec::with_capacity(order.len());
        for path in order {
            let Some(entry_index) = find_entry(&entries, &path) else {
                tracing::warn!("演示文稿引用了不存在的幻灯片 {}", path);
                continue;
            };
            let xml = entry_str(&entries[entry_index])?;
            let slide = Slide::parse(slides.len() + 1, &path, xml)?;
            slides.push((entry_index, slide));
        }

        tracing::debug!("已读取 {} 个条目，{} 张幻灯片", entries.len(), slides.len());
        Ok(Self { entries, slides })
    }

    pub fn slides(&self) -> impl Iterator<Item = &Slide> {
        self.slides.iter().map(|(_, slide)| slide)
    }

    pub fn slides_mut(&mut self) -> impl Iterator<Item = &mut Slide> {
        self.slides.iter_mut().map(|(_, slide)| slide)
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// 所有幻灯片中的文本段总数
    pub fn run_count(&self) -> usize {
        self.slides().map(|slide| slide.runs.len()).sum()
    }

    /// 保存到文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            TranslationError::Document(format!("无法创建 {}: {}", path.display(), e))
        })?;
        self.write_to(file)?;
        Ok(())
    }

    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut slide_xml = vec![None; self.entries.len()];
        for (entry_index, slide) in &self.slides {
            slide_xml[*entry_index] = Some(slide.to_xml()?);
        }

        let mut zip = ZipWriter::new(writer);
        for (entry, xml) in self.entries.iter().zip(slide_xml) {
            let compression = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = FileOptions::default().compression_method(compression);

            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)?;
                continue;
            }
            zip.start_file(entry.name.as_str(), options)?;
            zip.write_all(xml.as_deref().unwrap_or(entry.data.as_slice()))?;
        }
        Ok(zip.finish()?)
    }
}

/// 从 "ppt/slides/slide3.xml" 取出 3
fn slide_number(path: &str) -> Option<usize> {
    SLIDE_PATH_REGEX
        .captures(path)
        .and_then(|caps| caps[1].parse().ok())
}

fn find_entry(entries: &[Entry], name: &str) -> Option<usize> {
    entries.iter().position(|e| e.name == name)
}

fn entry_str(entry: &Entry) -> Result<&str> {
    std::str::from_utf8(&entry.data)
        .map_err(|e| TranslationError::Document(format!("{} 不是有效的UTF-8: {}", entry.name, e)))
}

/// 按 `sldIdLst` 列出的幻灯片路径；缺少演示文稿部件或其关系文件时返回 `None`
fn listed_slides(entries: &[Entry]) -> Result<Option<Vec<String>>> {
    let (Some(presentation), Some(rels)) = (
        find_entry(entries, PRESENTATION_PATH),
        find_entry(entries, PRESENTATION_RELS_PATH),
    ) else {
        return Ok(None);
    };

    let targets = slide_relationships(entry_str(&entries[rels])?)?;

    let mut reader = Reader::from_str(entry_str(&entries[presentation])?);
    let mut order = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) if local_name(e.name().as_ref()) == b"sldId" => {
                // r:id 指向关系文件；无前缀的 id 是幻灯片编号，不是关系
                let rel_id = e.attributes().flatten().find_map(|attr| {
                    (attr.key.prefix().is_some() && attr.key.local_name().as_ref() == b"id")
                        .then(|| String::from_utf8_lossy(&attr.value).into_owned())
                });
                match rel_id.and_then(|id| targets.iter().find(|(rid, _)| *rid == id)) {
                    Some((_, path)) => order.push(path.clone()),
                    None => tracing::warn!("sldId 没有对应的幻灯片关系，已跳过"),
                }
            }
            _ => {}
        }
    }
    Ok(Some(order))
}

/// 关系文件中类型为幻灯片的 (Id, 部件路径)
fn slide_relationships(xml: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    let mut targets = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) if local_name(e.name().as_ref()) == b"Relationship" => {
                let mut id = String::new();
                let mut target = String::new();
                let mut rel_type = String::new();
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).into_owned();
                    match attr.key.as_ref() {
                        b"Id" => id = value,
                        b"Target" => target = value,
                        b"Type" => rel_type = value,
                        _ => {}
                    }
                }
                if rel_type.ends_with("/slide") {
                    let path = match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("ppt/{}", target),
                    };
                    targets.push((id, path));
                }
            }
            _ => {}
        }
    }
    Ok(targets)
}

/// 去掉命名空间前缀
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}
