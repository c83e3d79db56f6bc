//! Extension-dispatched document loading
//!
//! Each supported format maps to one loader arm; adding a format means adding
//! a `SourceFormat` variant and its arm here. Failures never abort a batch:
//! every file produces an explicit [`LoadOutcome`] for the caller to
//! aggregate.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{ChunkMetadata, Document, SourceFormat};

/// Outcome of loading a single file
#[derive(Debug)]
pub enum LoadOutcome {
    /// Documents extracted from the file
    Loaded(Vec<Document>),
    /// Extension outside the supported set; contributes nothing
    Unsupported,
    /// Path does not exist; contributes nothing
    Missing,
    /// Extraction failed; contributes nothing
    Failed(Error),
}

/// Extension-dispatched document loader
pub struct DocumentLoader;

impl DocumentLoader {
    /// Load a file into zero or more documents, each carrying its source path.
    pub fn load(path: &Path) -> LoadOutcome {
        if !path.exists() {
            return LoadOutcome::Missing;
        }
        let Some(format) = SourceFormat::from_path(path) else {
            return LoadOutcome::Unsupported;
        };

        let source = path.to_string_lossy().into_owned();
        let result = match format {
            SourceFormat::Pdf => Self::load_pdf(path, &source),
            SourceFormat::Text => Self::load_text(path, &source),
            SourceFormat::Docx => Self::load_docx(path, &source),
            SourceFormat::Markdown => Self::load_markdown(path, &source),
            SourceFormat::Html => Self::load_html(path, &source),
            SourceFormat::Xml => Self::load_xml(path, &source),
            SourceFormat::Json => Self::load_json(path, &source),
            SourceFormat::Csv => Self::load_csv(path, &source),
        };

        match result {
            Ok(documents) => LoadOutcome::Loaded(documents),
            Err(err) => LoadOutcome::Failed(err),
        }
    }

    /// Load plain text
    fn load_text(path: &Path, source: &str) -> Result<Vec<Document>> {
        let data = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&data).into_owned();
        Ok(vec![Document::new(text, ChunkMetadata::new(source))])
    }

    /// Load a PDF, preferring whole-document extraction and falling back to
    /// page-by-page content streams when the extractor rejects the file.
    fn load_pdf(path: &Path, source: &str) -> Result<Vec<Document>> {
        let data = std::fs::read(path)?;

        match pdf_extract::extract_text_from_mem(&data) {
            Ok(text) => {
                let text = normalize_pdf_text(&text);
                if text.trim().is_empty() {
                    Self::load_pdf_pages(&data, source)
                } else {
                    Ok(vec![Document::new(text, ChunkMetadata::new(source))])
                }
            }
            Err(err) => {
                tracing::warn!("pdf-extract failed for {}: {}, trying page fallback", source, err);
                Self::load_pdf_pages(&data, source)
            }
        }
    }

    /// Page-by-page PDF fallback via content streams
    fn load_pdf_pages(data: &[u8], source: &str) -> Result<Vec<Document>> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::load(source, format!("failed to load PDF: {}", e)))?;

        let mut documents = Vec::new();
        for (page_number, page_id) in doc.get_pages() {
            match doc.get_page_content(page_id) {
                Ok(content) => {
                    let text = extract_text_from_content_stream(&content);
                    if !text.trim().is_empty() {
                        documents.push(Document::new(
                            text.trim().to_string(),
                            ChunkMetadata::page(source, page_number),
                        ));
                    }
                }
                Err(err) => {
                    tracing::debug!("no content for page {} of {}: {}", page_number, source, err);
                }
            }
        }

        if documents.is_empty() {
            return Err(Error::load(
                source,
                "PDF appears to be image-based or has no extractable text",
            ));
        }
        Ok(documents)
    }

    /// Load a DOCX by walking paragraph runs
    fn load_docx(path: &Path, source: &str) -> Result<Vec<Document>> {
        let data = std::fs::read(path)?;
        let docx = docx_rs::read_docx(&data).map_err(|e| Error::load(source, e.to_string()))?;

        let mut text = String::new();
        for child in docx.document.children {
            if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
                for p_child in paragraph.children {
                    if let docx_rs::ParagraphChild::Run(run) = p_child {
                        for r_child in run.children {
                            if let docx_rs::RunChild::Text(t) = r_child {
                                text.push_str(&t.text);
                            }
                        }
                    }
                }
                text.push('\n');
            }
        }

        Ok(vec![Document::new(text, ChunkMetadata::new(source))])
    }

    /// Load Markdown via structured text extraction, falling back to the raw
    /// file when extraction yields nothing.
    fn load_markdown(path: &Path, source: &str) -> Result<Vec<Document>> {
        let data = std::fs::read(path)?;
        let raw = String::from_utf8_lossy(&data).into_owned();

        let extracted = extract_markdown_text(&raw);
        let text = if extracted.trim().is_empty() {
            raw
        } else {
            extracted
        };

        Ok(vec![Document::new(text, ChunkMetadata::new(source))])
    }

    /// Load an HTML document's body text
    fn load_html(path: &Path, source: &str) -> Result<Vec<Document>> {
        let data = std::fs::read(path)?;
        let html = String::from_utf8_lossy(&data);
        let document = scraper::Html::parse_document(&html);

        let body_selector = scraper::Selector::parse("body").unwrap();
        let mut text = String::new();
        if let Some(body) = document.select(&body_selector).next() {
            for fragment in body.text() {
                let trimmed = fragment.trim();
                if !trimmed.is_empty() {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(trimmed);
                }
            }
        }

        Ok(vec![Document::new(text, ChunkMetadata::new(source))])
    }

    /// Load an XML document's text nodes
    fn load_xml(path: &Path, source: &str) -> Result<Vec<Document>> {
        let data = std::fs::read(path)?;
        let xml = String::from_utf8_lossy(&data);
        let text = extract_xml_text(&xml).map_err(|e| Error::load(source, e))?;
        Ok(vec![Document::new(text, ChunkMetadata::new(source))])
    }

    /// Load a JSON file as one text blob, content coerced to a string
    fn load_json(path: &Path, source: &str) -> Result<Vec<Document>> {
        let raw = std::fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| Error::load(source, format!("invalid JSON: {}", e)))?;

        let text = match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        Ok(vec![Document::new(text, ChunkMetadata::new(source))])
    }

    /// Load a CSV file as one document per row
    fn load_csv(path: &Path, source: &str) -> Result<Vec<Document>> {
        let mut reader =
            csv::Reader::from_path(path).map_err(|e| Error::load(source, e.to_string()))?;
        let headers = reader
            .headers()
            .map_err(|e| Error::load(source, e.to_string()))?
            .clone();

        let mut documents = Vec::new();
        for (row_index, result) in reader.records().enumerate() {
            let record =
                result.map_err(|e| Error::load(source, format!("row {}: {}", row_index, e)))?;
            let lines: Vec<String> = headers
                .iter()
                .zip(record.iter())
                .map(|(header, field)| format!("{}: {}", header, field))
                .collect();
            documents.push(Document::new(
                lines.join("\n"),
                ChunkMetadata::row(source, row_index as u32),
            ));
        }
        Ok(documents)
    }
}

/// Replace glyph artifacts from PDF extraction and drop empty lines
fn normalize_pdf_text(text: &str) -> String {
    text.replace('\0', "")
        .replace('\u{2018}', "'")
        .replace('\u{2019}', "'")
        .replace('\u{201C}', "\"")
        .replace('\u{201D}', "\"")
        .replace('\u{2022}', "* ")
        .replace('\u{00A0}', " ")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pull text-show operands out of a PDF content stream (BT..ET blocks)
fn extract_text_from_content_stream(content: &[u8]) -> String {
    let content = String::from_utf8_lossy(content);
    let mut text = String::new();
    let mut in_text_block = false;

    for line in content.lines() {
        let line = line.trim();
        match line {
            "BT" => in_text_block = true,
            "ET" => {
                in_text_block = false;
                if !text.ends_with(' ') && !text.is_empty() {
                    text.push(' ');
                }
            }
            _ if in_text_block && (line.ends_with("Tj") || line.ends_with("TJ")) => {
                if let (Some(start), Some(end)) = (line.find('('), line.rfind(')')) {
                    if start < end {
                        let operand = &line[start + 1..end];
                        let decoded = operand
                            .replace("\\n", "\n")
                            .replace("\\r", "\r")
                            .replace("\\t", "\t")
                            .replace("\\(", "(")
                            .replace("\\)", ")")
                            .replace("\\\\", "\\");
                        text.push_str(&decoded);
                    }
                }
            }
            _ => {}
        }
    }

    text
}

/// Extract readable text from Markdown, dropping formatting structure
fn extract_markdown_text(markdown: &str) -> String {
    use pulldown_cmark::{Event, Parser, TagEnd};

    let mut text = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) => text.push_str(&t),
            Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Heading(_))
            | Event::End(TagEnd::Item)
            | Event::End(TagEnd::CodeBlock) => text.push('\n'),
            _ => {}
        }
    }
    text
}

/// Collect every text node in an XML document
fn extract_xml_text(xml: &str) -> std::result::Result<String, String> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut parts: Vec<String> = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                if let Ok(fragment) = e.unescape() {
                    let trimmed = fragment.trim();
                    if !trimmed.is_empty() {
                        parts.push(trimmed.to_string());
                    }
                }
            }
            Ok(Event::CData(e)) => {
                let fragment = String::from_utf8_lossy(&e.into_inner()).into_owned();
                let trimmed = fragment.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed.to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(format!("XML parse error: {}", err)),
            _ => {}
        }
    }

    Ok(parts.join("\n"))
}
