//! XLSX reader
//!
//! Reads back cell values, row heights, column widths and cell-anchored
//! pictures. Styles and anything else in the package are ignored.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::text::decode_cell_text;
use thumbsheet_core::units::{emu_to_pixels, stored_to_width};
use thumbsheet_core::{CellAddress, CellValue, ObjectPosition, Picture, Workbook, Worksheet};

/// A package relationship: type URI and resolved part path
#[derive(Debug, Clone)]
struct Relationship {
    rel_type: String,
    target: String,
}

type Relationships = HashMap<String, Relationship>;

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Verify this is an XLSX file
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let sheet_info = Self::read_workbook_xml(&mut archive)?;
        let workbook_rels = Self::read_relationships(&mut archive, "xl/workbook.xml")?
            .ok_or_else(|| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let mut workbook = Workbook::empty();

        for (name, r_id) in &sheet_info {
            let Some(rel) = workbook_rels.get(r_id) else {
                continue;
            };
            if !rel.rel_type.ends_with("/worksheet") {
                continue;
            }

            let mut worksheet = Worksheet::new(name.as_str());
            let drawing_rid =
                Self::read_worksheet(&mut archive, &rel.target, &mut worksheet, &shared_strings)?;

            if let Some(drawing_rid) = drawing_rid {
                let sheet_rels = Self::read_relationships(&mut archive, &rel.target)?
                    .unwrap_or_default();
                match sheet_rels.get(&drawing_rid) {
                    Some(drawing) => {
                        Self::read_drawing(&mut archive, &drawing.target, &mut worksheet)?
                    }
                    None => {
                        return Err(XlsxError::Parse(format!(
                            "Drawing relationship {} not found for {}",
                            drawing_rid, rel.target
                        )))
                    }
                }
            }

            workbook.add_existing_worksheet(worksheet)?;
        }

        // Ensure at least one sheet exists
        if workbook.is_empty() {
            workbook.add_worksheet()?;
        }

        Ok(workbook)
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings), // No shared strings is valid
        };

        let reader = BufReader::new(file);
        // Untrimmed: whitespace inside <t> is part of the value
        let mut xml_reader = Reader::from_reader(reader);

        let mut buf = Vec::new();
        let mut current_string = String::new();
        let mut in_si = false;
        let mut in_t = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current_string.clear();
                    }
                    b"t" if in_si => in_t = true,
                    _ => {}
                },
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(decode_cell_text(&current_string));
                        current_string.clear();
                        in_si = false;
                    }
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    if let Ok(text) = e.unescape() {
                        current_string.push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    /// Read workbook.xml to get sheet names and rIds
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<(String, String)>> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    let name = attr_value(&e, b"name");
                    let r_id = attr_value(&e, b"id");
                    if let (Some(name), Some(r_id)) = (name, r_id) {
                        sheets.push((name, r_id));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Read the relationships of a part, resolving targets to package paths.
    ///
    /// Returns `None` when the part has no relationships file.
    fn read_relationships<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        part: &str,
    ) -> XlsxResult<Option<Relationships>> {
        let (dir, file_name) = part.rsplit_once('/').unwrap_or(("", part));
        let rels_path = if dir.is_empty() {
            format!("_rels/{}.rels", file_name)
        } else {
            format!("{}/_rels/{}.rels", dir, file_name)
        };

        let file = match archive.by_name(&rels_path) {
            Ok(f) => f,
            Err(_) => return Ok(None),
        };

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let id = attr_value(&e, b"Id");
                    let target = attr_value(&e, b"Target");
                    let rel_type = attr_value(&e, b"Type");
                    let external = attr_value(&e, b"TargetMode").as_deref() == Some("External");

                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if !external {
                            let target = resolve_target(dir, &target);
                            rels.insert(id, Relationship { rel_type, target });
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(Some(rels))
    }

    /// Read a worksheet from the archive.
    ///
    /// Returns the relationship id of the sheet's drawing, if any.
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        worksheet: &mut Worksheet,
        shared_strings: &[String],
    ) -> XlsxResult<Option<String>> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);

        let mut buf = Vec::new();
        let mut drawing_rid = None;

        // Current cell state
        let mut current_cell_ref: Option<String> = None;
        let mut current_cell_type: Option<String> = None;
        let mut current_value = String::new();
        let mut in_value = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"row" => Self::apply_row_attrs(&e, worksheet),
                    b"c" => {
                        current_cell_ref = attr_value(&e, b"r");
                        current_cell_type = attr_value(&e, b"t");
                        current_value.clear();
                    }
                    b"v" | b"t" if current_cell_ref.is_some() => in_value = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"col" => Self::apply_col_attrs(&e, worksheet),
                    b"row" => Self::apply_row_attrs(&e, worksheet),
                    b"drawing" => drawing_rid = attr_value(&e, b"id"),
                    _ => {}
                },
                Ok(Event::Text(e)) if in_value => {
                    let text = e.unescape()?;
                    current_value.push_str(&text);
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"v" | b"t" => in_value = false,
                    b"c" => {
                        if let Some(cell_ref) = current_cell_ref.take() {
                            Self::process_cell(
                                worksheet,
                                &cell_ref,
                                current_cell_type.take().as_deref(),
                                &current_value,
                                shared_strings,
                            )?;
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(drawing_rid)
    }

    fn apply_row_attrs(e: &BytesStart, worksheet: &mut Worksheet) {
        let row = attr_value(e, b"r").and_then(|s| s.parse::<u32>().ok());
        let ht = attr_value(e, b"ht").and_then(|s| s.parse::<f64>().ok());
        let custom = attr_value(e, b"customHeight").map_or(false, |s| s == "1" || s == "true");

        if let (Some(row), Some(ht), true) = (row, ht, custom) {
            if row >= 1 {
                worksheet.set_row_height(row - 1, ht);
            }
        }
    }

    fn apply_col_attrs(e: &BytesStart, worksheet: &mut Worksheet) {
        let min = attr_value(e, b"min").and_then(|s| s.parse::<u16>().ok());
        let max = attr_value(e, b"max").and_then(|s| s.parse::<u16>().ok());
        let width = attr_value(e, b"width").and_then(|s| s.parse::<f64>().ok());

        if let (Some(min), Some(max), Some(width)) = (min, max, width) {
            for col in min.max(1)..=max {
                worksheet.set_column_width(col - 1, stored_to_width(width));
            }
        }
    }

    /// Process a cell and add it to the worksheet
    fn process_cell(
        worksheet: &mut Worksheet,
        cell_ref: &str,
        cell_type: Option<&str>,
        value: &str,
        shared_strings: &[String],
    ) -> XlsxResult<()> {
        let addr = CellAddress::parse(cell_ref).map_err(|e| {
            XlsxError::Parse(format!("Invalid cell reference '{}': {}", cell_ref, e))
        })?;

        let cell_value = match cell_type {
            Some("inlineStr") | Some("str") => CellValue::string(decode_cell_text(value)),
            _ => Self::scalar_value(cell_type, value.trim(), shared_strings)?,
        };

        worksheet.set_cell_value_at(addr.row, addr.col, cell_value)?;
        Ok(())
    }

    /// Value of a non-string cell from its trimmed `<v>` text
    fn scalar_value(
        cell_type: Option<&str>,
        value: &str,
        shared_strings: &[String],
    ) -> XlsxResult<CellValue> {
        let cell_value = match cell_type {
            Some("s") => {
                let idx: usize = value.parse().map_err(|_| {
                    XlsxError::Parse(format!("Invalid shared string index: {}", value))
                })?;
                let s = shared_strings.get(idx).ok_or_else(|| {
                    XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
                })?;
                CellValue::string(s.as_str())
            }
            Some("b") => CellValue::Boolean(value == "1" || value.eq_ignore_ascii_case("true")),
            None | Some("n") if value.is_empty() => CellValue::Empty,
            None | Some("n") => match value.parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::string(value),
            },
            Some(_) => CellValue::string(value),
        };
        Ok(cell_value)
    }

    /// Read a drawing part and insert its pictures into the worksheet
    fn read_drawing<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        worksheet: &mut Worksheet,
    ) -> XlsxResult<()> {
        let anchors = {
            let file = archive
                .by_name(path)
                .map_err(|_| XlsxError::MissingPart(path.to_string()))?;
            parse_drawing(BufReader::new(file))?
        };
        let rels = Self::read_relationships(archive, path)?.unwrap_or_default();

        for anchor in anchors {
            let Some(embed) = anchor.embed.as_ref() else {
                continue;
            };
            let media = rels.get(embed).ok_or_else(|| {
                XlsxError::Parse(format!("Image relationship {} not found for {}", embed, path))
            })?;

            let mut data = Vec::new();
            archive
                .by_name(&media.target)
                .map_err(|_| XlsxError::MissingPart(media.target.clone()))?
                .read_to_end(&mut data)?;

            debug!("read {} ({} bytes) from {}", media.target, data.len(), path);

            let mut picture = Picture::new(data, anchor.width, anchor.height)?
                .with_offset(anchor.col_offset, anchor.row_offset)
                .with_position(anchor.position);
            if let Some(descr) = anchor.description {
                picture = picture.with_description(descr);
            }
            worksheet.insert_picture_at(anchor.row, anchor.col, picture)?;
        }

        Ok(())
    }
}

/// Picture anchor as found in a drawing part, sizes converted to pixels
#[derive(Debug, Default)]
struct ParsedAnchor {
    position: ObjectPosition,
    col: u16,
    col_offset: u32,
    row: u32,
    row_offset: u32,
    width: u32,
    height: u32,
    description: Option<String>,
    embed: Option<String>,
}

fn parse_drawing<B: std::io::BufRead>(reader: B) -> XlsxResult<Vec<ParsedAnchor>> {
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut anchors = Vec::new();
    let mut current: Option<ParsedAnchor> = None;
    let mut in_from = false;
    let mut field: Option<Vec<u8>> = None;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"twoCellAnchor" | b"oneCellAnchor" => {
                    let position = attr_value(&e, b"editAs")
                        .and_then(|s| ObjectPosition::from_edit_as(&s))
                        .unwrap_or_default();
                    current = Some(ParsedAnchor {
                        position,
                        ..Default::default()
                    });
                }
                b"from" => in_from = true,
                name @ (b"col" | b"colOff" | b"row" | b"rowOff") if in_from => {
                    field = Some(name.to_vec());
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if let Some(anchor) = current.as_mut() {
                    match e.local_name().as_ref() {
                        b"cNvPr" => anchor.description = attr_value(&e, b"descr"),
                        b"blip" => anchor.embed = attr_value(&e, b"embed"),
                        b"ext" => {
                            let cx = attr_value(&e, b"cx").and_then(|s| s.parse::<u64>().ok());
                            let cy = attr_value(&e, b"cy").and_then(|s| s.parse::<u64>().ok());
                            if let (Some(cx), Some(cy)) = (cx, cy) {
                                anchor.width = emu_to_pixels(cx);
                                anchor.height = emu_to_pixels(cy);
                            }
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if let (Some(name), Some(anchor)) = (field.as_deref(), current.as_mut()) {
                    let text = e.unescape()?;
                    let value: u64 = text.trim().parse().map_err(|_| {
                        XlsxError::Parse(format!("Invalid anchor value '{}'", text))
                    })?;
                    match name {
                        b"col" => anchor.col = value as u16,
                        b"colOff" => anchor.col_offset = emu_to_pixels(value),
                        b"row" => anchor.row = value as u32,
                        b"rowOff" => anchor.row_offset = emu_to_pixels(value),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"twoCellAnchor" | b"oneCellAnchor" => {
                    if let Some(anchor) = current.take() {
                        anchors.push(anchor);
                    }
                }
                b"from" => in_from = false,
                b"col" | b"colOff" | b"row" | b"rowOff" => field = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(anchors)
}

/// Get an attribute by local name (namespace prefix ignored)
fn attr_value(e: &BytesStart, local_name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == local_name)
        .and_then(|attr| attr.unescape_value().ok().map(|s| s.to_string()))
}

/// Resolve a relationship target against the directory of its source part
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
