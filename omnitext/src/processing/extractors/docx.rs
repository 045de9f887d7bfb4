//! Word document extractor using docx-rs, with a zip + quick-xml fallback
//! for files docx-rs cannot open as a document.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::{OmnitextError, Result};
use crate::models::{DocumentFormat, ExtractedText};

/// WordprocessingML main namespace (`w:`).
pub const W_NS: &[u8] = b"http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Word 2010 drawing-shape namespace (`wps:`), used for text boxes.
pub const WPS_NS: &[u8] = b"http://schemas.microsoft.com/office/word/2010/wordprocessingShape";

const DOCUMENT_PART: &str = "word/document.xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

fn xml_error(part: &str, e: impl std::fmt::Display) -> OmnitextError {
    OmnitextError::DocxExtraction(format!("Malformed XML in {part}: {e}"))
}

fn is_w(ns: &ResolveResult, local: &[u8], name: &[u8]) -> bool {
    local == name && matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == W_NS)
}

fn is_text_element(ns: &ResolveResult, local: &[u8]) -> bool {
    local == b"t"
        && matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == W_NS || *uri == WPS_NS)
}

/// Appends the character data of a text, CDATA or entity event.
///
/// Only the predefined XML entities and character references are expanded;
/// any other entity reference is dropped.
fn push_character_data(event: &Event, part: &str, out: &mut String) -> Result<()> {
    match event {
        Event::Text(e) => out.push_str(&e.decode().map_err(|e| xml_error(part, e))?),
        Event::CData(e) => out.push_str(&e.decode().map_err(|e| xml_error(part, e))?),
        Event::GeneralRef(e) => {
            if let Some(ch) = e.resolve_char_ref().map_err(|e| xml_error(part, e))? {
                out.push(ch);
            } else {
                let name = e.decode().map_err(|e| xml_error(part, e))?;
                match resolve_predefined_entity(&name) {
                    Some(value) => out.push_str(value),
                    None => debug!(part, entity = %name, "Dropping unknown entity reference"),
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Header and footer references of one `w:sectPr`.
#[derive(Debug, Default, Clone, PartialEq)]
struct SectionRefs {
    header: Option<String>,
    footer: Option<String>,
}

pub struct DocxExtractor;

impl DocxExtractor {
    /// Extract text from a Word document on disk
    pub async fn extract(path: &Path) -> Result<ExtractedText> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            OmnitextError::DocxExtraction(format!("Failed to read {}: {e}", path.display()))
        })?;

        tokio::task::spawn_blocking(move || Self::extract_bytes(&bytes))
            .await
            .map_err(|e| OmnitextError::DocxExtraction(format!("DOCX parser panicked: {e}")))?
    }

    /// Extract text from Word document bytes
    ///
    /// A zip holding `word/document.xml` goes through the structured model.
    /// Anything else is scanned as raw XML for `w:t` and `wps:t` text.
    pub fn extract_bytes(bytes: &[u8]) -> Result<ExtractedText> {
        match ZipArchive::new(Cursor::new(bytes)) {
            Ok(mut archive) => {
                if archive.by_name(DOCUMENT_PART).is_ok() {
                    Self::extract_structured(bytes, &mut archive)
                } else {
                    debug!("Archive has no {DOCUMENT_PART}, scanning XML entries");
                    let parts = Self::xml_entries(&mut archive)?;
                    Self::extract_raw_xml(
                        parts
                            .iter()
                            .map(|(name, xml)| (name.as_str(), xml.as_slice())),
                    )
                }
            }
            Err(e) => {
                debug!(error = %e, "Not a zip archive, scanning as raw XML");
                Self::extract_raw_xml(std::iter::once(("document", bytes)))
            }
        }
    }

    fn extract_structured(bytes: &[u8], archive: &mut Archive) -> Result<ExtractedText> {
        let docx = docx_rs::read_docx(bytes)
            .map_err(|e| OmnitextError::DocxExtraction(format!("DOCX parse error: {e}")))?;

        let mut text = ExtractedText::for_format(DocumentFormat::Docx);

        for child in &docx.document.children {
            if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
                text.push(&Self::paragraph_text(paragraph));
            }
        }

        for child in &docx.document.children {
            if let docx_rs::DocumentChild::Table(table) = child {
                for cell in Self::table_cells(table) {
                    text.push(&cell);
                }
            }
        }

        for part in Self::header_footer_parts(archive)? {
            let xml = match Self::read_part(archive, &part) {
                Ok(xml) => xml,
                Err(e) => {
                    warn!(part = %part, error = %e, "Skipping unreadable header/footer part");
                    continue;
                }
            };
            for paragraph in Self::part_paragraphs(&xml, &part)? {
                text.push(&paragraph);
            }
        }

        Ok(text)
    }

    fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
        let mut content = String::new();
        Self::collect_paragraph_children(&paragraph.children, &mut content);
        content
    }

    fn collect_paragraph_children(children: &[docx_rs::ParagraphChild], content: &mut String) {
        for para_child in children {
            match para_child {
                docx_rs::ParagraphChild::Run(run) => {
                    for run_child in &run.children {
                        match run_child {
                            docx_rs::RunChild::Text(text) => content.push_str(&text.text),
                            docx_rs::RunChild::Tab(_) => content.push('\t'),
                            docx_rs::RunChild::Break(_) => content.push('\n'),
                            _ => {}
                        }
                    }
                }
                docx_rs::ParagraphChild::Hyperlink(link) => {
                    Self::collect_paragraph_children(&link.children, content)
                }
                _ => {}
            }
        }
    }

    /// Cell texts in table-major, row-major order; a cell's paragraphs are joined with newlines.
    fn table_cells(table: &docx_rs::Table) -> Vec<String> {
        let mut cells = Vec::new();

        for table_child in &table.rows {
            let docx_rs::TableChild::TableRow(row) = table_child;
            for row_child in &row.cells {
                let docx_rs::TableRowChild::TableCell(cell) = row_child;
                let paragraphs: Vec<String> = cell
                    .children
                    .iter()
                    .filter_map(|content| match content {
                        docx_rs::TableCellContent::Paragraph(para) => {
                            Some(Self::paragraph_text(para))
                        }
                        _ => None,
                    })
                    .collect();
                cells.push(paragraphs.join("\n"));
            }
        }

        cells
    }

    /// Archive paths of each section's default header then default footer.
    ///
    /// A section without its own reference reuses the previous section's.
    fn header_footer_parts(archive: &mut Archive) -> Result<Vec<String>> {
        let document = Self::read_part(archive, DOCUMENT_PART)?;
        let sections = Self::section_refs(&document)?;
        if sections.iter().all(|s| s.header.is_none() && s.footer.is_none()) {
            return Ok(Vec::new());
        }

        let relationships = match Self::read_part(archive, DOCUMENT_RELS_PART) {
            Ok(xml) => Self::relationships(&xml)?,
            Err(e) => {
                warn!(error = %e, "Document relationships missing, headers and footers skipped");
                return Ok(Vec::new());
            }
        };

        let mut parts = Vec::new();
        let mut header = None;
        let mut footer = None;
        for section in sections {
            header = section.header.or(header);
            footer = section.footer.or(footer);

            for r_id in [&header, &footer].into_iter().flatten() {
                match relationships.get(r_id) {
                    Some(target) => parts.push(target.clone()),
                    None => warn!(r_id = %r_id, "Unresolved header/footer relationship"),
                }
            }
        }

        Ok(parts)
    }

    fn section_refs(document: &[u8]) -> Result<Vec<SectionRefs>> {
        let mut reader = NsReader::from_reader(document);
        let mut buf = Vec::new();
        let mut sections = Vec::new();
        let mut current: Option<SectionRefs> = None;

        loop {
            let (ns, event) = reader
                .read_resolved_event_into(&mut buf)
                .map_err(|e| xml_error(DOCUMENT_PART, e))?;

            match event {
                Event::Start(e) if is_w(&ns, e.local_name().as_ref(), b"sectPr") => {
                    current = Some(SectionRefs::default());
                }
                Event::Empty(e) if is_w(&ns, e.local_name().as_ref(), b"sectPr") => {
                    sections.push(SectionRefs::default());
                }
                Event::End(e) if is_w(&ns, e.local_name().as_ref(), b"sectPr") => {
                    if let Some(section) = current.take() {
                        sections.push(section);
                    }
                }
                Event::Start(e) | Event::Empty(e) if current.is_some() => {
                    let local = e.local_name();
                    let is_header = is_w(&ns, local.as_ref(), b"headerReference");
                    let is_footer = is_w(&ns, local.as_ref(), b"footerReference");
                    if let Some(section) = current.as_mut().filter(|_| is_header || is_footer) {
                        let mut kind = None;
                        let mut r_id = None;
                        for attr in e.attributes().flatten() {
                            let value = std::str::from_utf8(&attr.value).ok().map(String::from);
                            match attr.key.local_name().as_ref() {
                                b"type" => kind = value,
                                b"id" => r_id = value,
                                _ => {}
                            }
                        }
                        if kind.as_deref() == Some("default") {
                            if is_header {
                                section.header = r_id;
                            } else {
                                section.footer = r_id;
                            }
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(sections)
    }

    /// Relationship id to archive path.
    fn relationships(xml: &[u8]) -> Result<HashMap<String, String>> {
        let mut reader = NsReader::from_reader(xml);
        let mut buf = Vec::new();
        let mut mapping = HashMap::new();

        loop {
            let (_, event) = reader
                .read_resolved_event_into(&mut buf)
                .map_err(|e| xml_error(DOCUMENT_RELS_PART, e))?;

            match event {
                Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"Relationship" => {
                    let mut id = None;
                    let mut target = None;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Id" => id = std::str::from_utf8(&attr.value).ok().map(String::from),
                            b"Target" => {
                                target = std::str::from_utf8(&attr.value).ok().map(String::from)
                            }
                            _ => {}
                        }
                    }
                    if let (Some(id), Some(target)) = (id, target) {
                        let path = match target.strip_prefix('/') {
                            Some(absolute) => absolute.to_string(),
                            None => format!("word/{target}"),
                        };
                        mapping.insert(id, path);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(mapping)
    }

    /// Text of each top-level `w:p` of a header or footer part.
    fn part_paragraphs(xml: &[u8], part: &str) -> Result<Vec<String>> {
        let mut reader = NsReader::from_reader(xml);
        let mut buf = Vec::new();
        let mut paragraphs = Vec::new();
        let mut depth = 0usize;
        let mut paragraph: Option<String> = None;
        let mut in_text = false;

        loop {
            let (ns, event) = reader
                .read_resolved_event_into(&mut buf)
                .map_err(|e| xml_error(part, e))?;

            match &event {
                Event::Start(e) => {
                    let local = e.local_name();
                    if depth == 1 && is_w(&ns, local.as_ref(), b"p") {
                        paragraph = Some(String::new());
                    } else if paragraph.is_some() && is_w(&ns, local.as_ref(), b"t") {
                        in_text = true;
                    }
                    depth += 1;
                }
                Event::Empty(e) => {
                    if let Some(text) = paragraph.as_mut() {
                        let local = e.local_name();
                        if is_w(&ns, local.as_ref(), b"tab") {
                            text.push('\t');
                        } else if is_w(&ns, local.as_ref(), b"br") || is_w(&ns, local.as_ref(), b"cr")
                        {
                            text.push('\n');
                        }
                    }
                }
                Event::End(e) => {
                    depth = depth.saturating_sub(1);
                    let local = e.local_name();
                    if is_w(&ns, local.as_ref(), b"t") {
                        in_text = false;
                    } else if depth == 1 && is_w(&ns, local.as_ref(), b"p") {
                        if let Some(text) = paragraph.take() {
                            paragraphs.push(text);
                        }
                    }
                }
                Event::Eof => break,
                other => {
                    if in_text {
                        if let Some(text) = paragraph.as_mut() {
                            push_character_data(other, part, text)?;
                        }
                    }
                }
            }
            buf.clear();
        }

        Ok(paragraphs)
    }

    /// Every `*.xml` entry, sorted by name.
    fn xml_entries(archive: &mut Archive) -> Result<Vec<(String, Vec<u8>)>> {
        let mut names: Vec<String> = archive
            .file_names()
            .filter(|name| name.ends_with(".xml"))
            .map(String::from)
            .collect();
        names.sort();

        let mut parts = Vec::with_capacity(names.len());
        for name in names {
            let xml = Self::read_part(archive, &name)?;
            parts.push((name, xml));
        }
        Ok(parts)
    }

    fn read_part(archive: &mut Archive, name: &str) -> Result<Vec<u8>> {
        let mut file = archive.by_name(name).map_err(|e| {
            OmnitextError::DocxExtraction(format!("Missing archive entry {name}: {e}"))
        })?;
        let mut content = Vec::new();
        file.read_to_end(&mut content).map_err(|e| {
            OmnitextError::DocxExtraction(format!("Failed to read archive entry {name}: {e}"))
        })?;
        Ok(content)
    }

    /// Collect the text of every `w:t` and `wps:t` element in document order.
    ///
    /// The reader never loads DTDs or external entities. Text is decoded in
    /// the encoding the XML declaration names, UTF-8 when there is none.
    pub fn extract_raw_xml<'a>(
        sources: impl IntoIterator<Item = (&'a str, &'a [u8])>,
    ) -> Result<ExtractedText> {
        let mut text = ExtractedText::for_format(DocumentFormat::Docx);

        for (part, xml) in sources {
            let mut reader = NsReader::from_reader(xml);
            let mut buf = Vec::new();
            let mut node: Option<String> = None;

            loop {
                let (ns, event) = reader
                    .read_resolved_event_into(&mut buf)
                    .map_err(|e| xml_error(part, e))?;

                match &event {
                    Event::Start(e) if is_text_element(&ns, e.local_name().as_ref()) => {
                        node = Some(String::new());
                    }
                    Event::End(e) if is_text_element(&ns, e.local_name().as_ref()) => {
                        if let Some(content) = node.take() {
                            text.push(&content);
                        }
                    }
                    Event::Eof => break,
                    other => {
                        if let Some(content) = node.as_mut() {
                            push_character_data(other, part, content)?;
                        }
                    }
                }
                buf.clear();
            }
        }

        if text.is_empty() {
            return Err(OmnitextError::NoReadableText);
        }
        Ok(text)
    }
}
