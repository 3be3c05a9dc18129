use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{html_output_path, DocumentConverter, SourceDocument};
use crate::error::ConversionError;

/// Reads `word/document.xml` straight out of a `.docx` package.
///
/// Only what the normalizer looks at survives: paragraph vs. heading (from the
/// `Title`, `Subtitle` and `HeadingN` paragraph styles), bold/italic runs, tabs
/// and line breaks.
pub struct DocxConverter;

impl DocumentConverter for DocxConverter {
    fn convert(&self, doc: &SourceDocument, out_dir: &Path) -> Result<PathBuf, ConversionError> {
        let xml = read_document_xml(&doc.path)?;
        let body = document_xml_to_html(&xml).map_err(|source| ConversionError::Xml {
            path: doc.path.clone(),
            source,
        })?;

        let html_path = html_output_path(doc, out_dir);
        let html = format!(
            "<html><head><meta charset=\"utf-8\"></head><body>\n{}</body></html>\n",
            body
        );
        std::fs::write(&html_path, html).map_err(|source| ConversionError::Io {
            path: html_path.clone(),
            source,
        })?;
        Ok(html_path)
    }
}

fn read_document_xml(path: &Path) -> Result<String, ConversionError> {
    let io_err = |source| ConversionError::Io {
        path: path.to_path_buf(),
        source,
    };
    let package_err = |source| ConversionError::Package {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let mut archive = zip::ZipArchive::new(file).map_err(package_err)?;
    let mut entry = archive.by_name("word/document.xml").map_err(package_err)?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml).map_err(io_err)?;
    Ok(xml)
}

/// An open `<w:p>`. Text boxes nest whole paragraphs inside a run, so each
/// level keeps its own run state and the blocks rendered inside it.
#[derive(Default)]
struct Paragraph {
    style: Option<String>,
    html: String,
    run: Option<Run>,
    nested: Vec<String>,
}

impl Paragraph {
    /// This paragraph's block (if it has text), then the blocks nested in it.
    fn into_blocks(self) -> Vec<String> {
        let mut blocks = Vec::with_capacity(self.nested.len() + 1);
        if !self.html.trim().is_empty() {
            let tag = block_tag(self.style.as_deref());
            blocks.push(format!("<{tag}>{}</{tag}>", self.html));
        }
        blocks.extend(self.nested);
        blocks
    }
}

#[derive(Default)]
struct Run {
    bold: bool,
    italic: bool,
}

fn get_attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .find(|a| a.as_ref().ok().map(|x| x.key.as_ref()) == Some(key))
        .and_then(Result::ok)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// `<w:b/>` is on unless `w:val` says otherwise.
fn toggle_on(e: &BytesStart) -> bool {
    !matches!(get_attr(e, b"w:val").as_deref(), Some("0" | "false" | "off"))
}

fn block_tag(style: Option<&str>) -> &'static str {
    let Some(style) = style else { return "p" };
    let key: String = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    match key.as_str() {
        "title" | "heading1" => "h1",
        "subtitle" | "heading2" => "h2",
        "heading3" => "h3",
        "heading4" => "h4",
        "heading5" => "h5",
        "heading6" => "h6",
        _ => "p",
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn push_run_text(html: &mut String, run: &Run, text: &str) {
    let escaped = escape_html(text);
    match (run.bold, run.italic) {
        (true, true) => html.push_str(&format!("<b><i>{}</i></b>", escaped)),
        (true, false) => html.push_str(&format!("<b>{}</b>", escaped)),
        (false, true) => html.push_str(&format!("<i>{}</i>", escaped)),
        (false, false) => html.push_str(&escaped),
    }
}

/// One HTML block per non-empty `<w:p>`.
///
/// Paragraphs inside a text box come out as their own blocks, right after the
/// paragraph that anchors them. `mc:Fallback` repeats the `mc:Choice` content
/// and is skipped.
pub(crate) fn document_xml_to_html(xml: &str) -> quick_xml::Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut open: Vec<Paragraph> = Vec::new();
    let mut fallback_depth = 0usize;
    let mut in_text = false;

    loop {
        let event = reader.read_event()?;
        if fallback_depth > 0 {
            match &event {
                Event::Start(e) if e.name().as_ref() == b"mc:Fallback" => fallback_depth += 1,
                Event::End(e) if e.name().as_ref() == b"mc:Fallback" => fallback_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"mc:Fallback" => fallback_depth = 1,
                b"w:p" => open.push(Paragraph::default()),
                b"w:r" => {
                    if let Some(p) = open.last_mut() {
                        p.run = Some(Run::default());
                    }
                }
                b"w:t" if open.last().is_some_and(|p| p.run.is_some()) => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match (e.name().as_ref(), open.last_mut()) {
                (b"w:pStyle", Some(p)) => p.style = get_attr(&e, b"w:val"),
                (b"w:b", Some(Paragraph { run: Some(r), .. })) => r.bold = toggle_on(&e),
                (b"w:i", Some(Paragraph { run: Some(r), .. })) => r.italic = toggle_on(&e),
                (b"w:tab", Some(p)) if p.run.is_some() => p.html.push('\t'),
                (b"w:br", Some(p)) if p.run.is_some() => p.html.push_str("<br>"),
                _ => {}
            },
            Event::Text(t) if in_text => {
                if let Some(Paragraph {
                    html, run: Some(run), ..
                }) = open.last_mut()
                {
                    push_run_text(html, run, &t.unescape()?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:r" => {
                    if let Some(p) = open.last_mut() {
                        p.run = None;
                    }
                }
                b"w:p" => {
                    if let Some(p) = open.pop() {
                        let blocks = p.into_blocks();
                        match open.last_mut() {
                            Some(outer) => outer.nested.extend(blocks),
                            None => {
                                for block in blocks {
                                    out.push_str(&block);
                                    out.push('\n');
                                }
                            }
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}
