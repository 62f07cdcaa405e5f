//! Spreadsheet and word-processor containers.
//!
//! `.xlsx` and `.docx` are zip archives of XML parts. Only the text-bearing
//! parts are read; styles, formulas and layout are ignored.

use crate::domain::Metadata;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::json;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use zip::ZipArchive;

static SHARED_STRING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<si>(.*?)</si>").unwrap());
static TEXT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<t(?:\s[^>]*)?>(.*?)</t>").unwrap());
static SHEET_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<sheet\b[^>]*\bname="([^"]*)""#).unwrap());
static ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<row\b[^>]*>(.*?)</row>").unwrap());
static CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<c\b([^>]*?)(?:/>|>(.*?)</c>)").unwrap());
static CELL_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\bt="([^"]*)""#).unwrap());
static CELL_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<v>(.*?)</v>").unwrap());
static INLINE_STRING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<is>(.*?)</is>").unwrap());
static WORKSHEET_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^xl/worksheets/sheet(\d+)\.xml$").unwrap());

// Self-closing `<w:p .../>` has no body and must not open a match.
static PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<w:p(?:\s[^>]*[^/>])?\s*>.*?</w:p>").unwrap());
static WORD_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>").unwrap());
static TABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<w:tbl[\s>]").unwrap());
static CORE_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<dc:title>(.*?)</dc:title>").unwrap());
static CORE_CREATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<dc:creator>(.*?)</dc:creator>").unwrap());

static NUMERIC_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").unwrap());

pub fn read_xlsx(path: &Path) -> Result<(String, Metadata)> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_xlsx_from(file).with_context(|| format!("Failed to read workbook {}", path.display()))
}

pub fn read_docx(path: &Path) -> Result<(String, Metadata)> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_docx_from(file).with_context(|| format!("Failed to read document {}", path.display()))
}

pub fn read_xlsx_from<R: Read + Seek>(reader: R) -> Result<(String, Metadata)> {
    let mut archive = ZipArchive::new(reader).context("Not a zip container")?;

    let shared: Vec<String> = match read_entry(&mut archive, "xl/sharedStrings.xml")? {
        Some(xml) => {
            SHARED_STRING.captures_iter(&xml).map(|c| collect_runs(&TEXT_RUN, &c[1])).collect()
        }
        None => Vec::new(),
    };
    let sheet_names: Vec<String> = match read_entry(&mut archive, "xl/workbook.xml")? {
        Some(xml) => SHEET_NAME.captures_iter(&xml).map(|c| unescape_xml(&c[1])).collect(),
        None => Vec::new(),
    };

    let mut worksheets: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let index = WORKSHEET_ENTRY.captures(name)?.get(1)?.as_str().parse().ok()?;
            Some((index, name.to_string()))
        })
        .collect();
    worksheets.sort();

    let mut sections = Vec::with_capacity(worksheets.len());
    let mut total_rows = 0usize;
    for (position, (index, entry)) in worksheets.iter().enumerate() {
        let Some(xml) = read_entry(&mut archive, entry)? else {
            continue;
        };
        let rows = sheet_rows(&xml, &shared);
        total_rows += rows.len();
        let name = sheet_names.get(position).cloned().unwrap_or_else(|| format!("Sheet{}", index));
        sections.push(format!("=== Sheet: {} ===\n{}", name, rows.join("\n")));
    }

    let mut metadata = Metadata::new();
    metadata.insert("sheet_count".into(), json!(sheet_names.len().max(worksheets.len())));
    metadata.insert("sheet_names".into(), json!(sheet_names));
    metadata.insert("total_rows".into(), json!(total_rows));
    Ok((sections.join("\n\n"), metadata))
}

fn sheet_rows(xml: &str, shared: &[String]) -> Vec<String> {
    ROW.captures_iter(xml)
        .filter_map(|row| {
            let cells: Vec<String> = CELL
                .captures_iter(&row[1])
                .filter_map(|cell| cell_text(&cell, shared))
                .filter(|text| !text.is_empty())
                .collect();
            (!cells.is_empty()).then(|| cells.join("\t"))
        })
        .collect()
}

fn cell_text(cell: &Captures<'_>, shared: &[String]) -> Option<String> {
    let body = cell.get(2)?.as_str();
    let cell_type = CELL_TYPE.captures(&cell[1]).map(|c| c[1].to_string());
    match cell_type.as_deref() {
        Some("s") => {
            let index: usize = CELL_VALUE.captures(body)?[1].trim().parse().ok()?;
            shared.get(index).cloned()
        }
        Some("inlineStr") => {
            INLINE_STRING.captures(body).map(|c| collect_runs(&TEXT_RUN, &c[1]))
        }
        _ => CELL_VALUE.captures(body).map(|c| unescape_xml(c[1].trim())),
    }
}

pub fn read_docx_from<R: Read + Seek>(reader: R) -> Result<(String, Metadata)> {
    let mut archive = ZipArchive::new(reader).context("Not a zip container")?;
    let xml = read_entry(&mut archive, "word/document.xml")?
        .context("Missing word/document.xml")?;

    let paragraphs: Vec<String> = PARAGRAPH
        .find_iter(&xml)
        .map(|p| collect_runs(&WORD_RUN, p.as_str()).trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    let mut metadata = Metadata::new();
    metadata.insert("paragraph_count".into(), json!(paragraphs.len()));
    metadata.insert("table_count".into(), json!(TABLE.find_iter(&xml).count()));

    if let Some(core) = read_entry(&mut archive, "docProps/core.xml")? {
        for (key, pattern) in [("title", &CORE_TITLE), ("author", &CORE_CREATOR)] {
            if let Some(value) = pattern.captures(&core) {
                metadata.insert(key.into(), json!(unescape_xml(value[1].trim())));
            }
        }
    }

    Ok((paragraphs.join("\n\n"), metadata))
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("Failed to open {}", name)),
    };
    let mut xml = String::new();
    entry.read_to_string(&mut xml).with_context(|| format!("Failed to read {}", name))?;
    Ok(Some(xml))
}

fn collect_runs(pattern: &Regex, xml: &str) -> String {
    pattern.captures_iter(xml).map(|c| unescape_xml(&c[1])).collect()
}

fn unescape_xml(raw: &str) -> String {
    let named = raw
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'");
    let numeric = NUMERIC_ENTITY.replace_all(&named, |c: &Captures<'_>| {
        let code = &c[1];
        let parsed = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse().ok(),
        };
        parsed.and_then(char::from_u32).map(String::from).unwrap_or_default()
    });
    numeric.replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn archive(entries: &[(&str, &str)]) -> Cursor<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, body) in entries {
            writer.start_file(*name, options).expect("start");
            writer.write_all(body.as_bytes()).expect("write");
        }
        let mut cursor = writer.finish().expect("finish");
        cursor.set_position(0);
        cursor
    }

    #[test]
    fn xlsx_shared_inline_and_numeric_cells() {
        let zip = archive(&[
            (
                "xl/workbook.xml",
                r#"<workbook><sheets><sheet name="Budget" sheetId="1"/><sheet name="Notes" sheetId="2"/></sheets></workbook>"#,
            ),
            (
                "xl/sharedStrings.xml",
                r#"<sst><si><t>Item</t></si><si><r><t>Co</t></r><r><t xml:space="preserve">st</t></r></si></sst>"#,
            ),
            (
                "xl/worksheets/sheet1.xml",
                r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>Tea &amp; cake</t></is></c><c r="B2"><v>4.5</v></c><c r="C2"/></row></sheetData></worksheet>"#,
            ),
            ("xl/worksheets/sheet2.xml", r#"<worksheet><sheetData/></worksheet>"#),
        ]);

        let (content, metadata) = read_xlsx_from(zip).expect("xlsx");
        assert!(content.contains("=== Sheet: Budget ==="));
        assert!(content.contains("Item\tCost"));
        assert!(content.contains("Tea & cake\t4.5"));
        assert!(content.contains("=== Sheet: Notes ==="));
        assert_eq!(metadata["sheet_count"], json!(2));
        assert_eq!(metadata["total_rows"], json!(2));
    }

    #[test]
    fn docx_paragraphs_and_properties() {
        let zip = archive(&[
            (
                "word/document.xml",
                r#"<w:document><w:body><w:p><w:pPr/><w:r><w:t>Hello, </w:t></w:r><w:r><w:t xml:space="preserve">world!</w:t></w:r></w:p><w:p/><w:p><w:r><w:tab/><w:t>Second &lt;para&gt;</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl></w:body></w:document>"#,
            ),
            (
                "docProps/core.xml",
                r#"<cp:coreProperties><dc:title>Report</dc:title><dc:creator>Kim</dc:creator></cp:coreProperties>"#,
            ),
        ]);

        let (content, metadata) = read_docx_from(zip).expect("docx");
        assert_eq!(content, "Hello, world!\n\nSecond <para>\n\nCell");
        assert_eq!(metadata["paragraph_count"], json!(3));
        assert_eq!(metadata["table_count"], json!(1));
        assert_eq!(metadata["title"], json!("Report"));
        assert_eq!(metadata["author"], json!("Kim"));
    }

    #[test]
    fn self_closing_paragraph_does_not_swallow_the_next() {
        let zip = archive(&[(
            "word/document.xml",
            r#"<w:body><w:p w14:paraId="1A"><w:r><w:t>First</w:t></w:r></w:p><w:p w14:paraId="2B" /><w:sdt><w:r><w:t>Loose</w:t></w:r></w:sdt><w:p w14:paraId="3C"/><w:p ><w:r><w:t>Second</w:t></w:r></w:p></w:body>"#,
        )]);

        let (content, metadata) = read_docx_from(zip).expect("docx");
        assert_eq!(content, "First\n\nSecond");
        assert_eq!(metadata["paragraph_count"], json!(2));
    }

    #[test]
    fn docx_without_body_is_an_error() {
        let zip = archive(&[("word/other.xml", "<x/>")]);
        assert!(read_docx_from(zip).is_err());
    }

    #[test]
    fn non_zip_is_an_error() {
        assert!(read_xlsx_from(Cursor::new(b"plain text".to_vec())).is_err());
    }

    #[test]
    fn entities() {
        assert_eq!(unescape_xml("a &amp;lt; b &#65;&#x42;"), "a &lt; b AB");
    }
}
