//! XLSX writer

mod drawing;

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use log::debug;

use crate::error::{XlsxError, XlsxResult};
use crate::text::{encode_cell_text, needs_space_preserve, strip_invalid_xml_chars};
use drawing::DrawingPart;
use thumbsheet_core::units::width_to_stored;
use thumbsheet_core::{CellAddress, CellData, CellValue, PictureFormat, Workbook, Worksheet};

/// Name written as the creating application
const APPLICATION: &str = "thumbsheet";

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(workbook, file)
    }

    /// Write a workbook to a writer
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        if workbook.is_empty() {
            return Err(XlsxError::InvalidFormat(
                "Workbook has no worksheets".into(),
            ));
        }

        let mut zip = zip::ZipWriter::new(writer);

        // Number drawing and media parts up front so every part agrees
        let drawings = drawing::plan_drawings(workbook);

        Self::write_content_types(&mut zip, workbook, &drawings)?;
        Self::write_root_rels(&mut zip)?;
        Self::write_doc_props(&mut zip, workbook)?;
        Self::write_workbook_xml(&mut zip, workbook)?;
        Self::write_workbook_rels(&mut zip, workbook)?;
        Self::write_styles_xml(&mut zip)?;

        for (i, sheet) in workbook.worksheets().enumerate() {
            let drawing = drawings.get(i).and_then(Option::as_ref);
            Self::write_worksheet(&mut zip, sheet, i, drawing.is_some())?;

            if let Some(part) = drawing {
                Self::write_worksheet_rels(&mut zip, i, part)?;
                Self::write_drawing(&mut zip, sheet, part)?;
            }
        }

        zip.finish()?;
        Ok(())
    }

    fn write_content_types<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
        drawings: &[Option<DrawingPart>],
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>"#,
        );

        // One default per embedded image format
        let formats: BTreeSet<&'static str> = drawings
            .iter()
            .flatten()
            .flat_map(|part| part.media.iter())
            .map(|media| media.format.extension())
            .collect();
        for ext in formats {
            let content_type = PictureFormat::from_extension(ext)
                .map(|f| f.content_type())
                .unwrap_or("application/octet-stream");
            content.push_str(&format!(
                r#"
    <Default Extension="{}" ContentType="{}"/>"#,
                ext, content_type
            ));
        }

        content.push_str(
            r#"
    <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
    <Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
        );

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }

        for part in drawings.iter().flatten() {
            content.push_str(&format!(
                r#"
    <Override PartName="/{}" ContentType="application/vnd.openxmlformats-officedocument.drawing+xml"/>"#,
                part.path()
            ));
        }

        content.push_str("\n</Types>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_root_rels<W: Write + Seek>(zip: &mut zip::ZipWriter<W>) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("_rels/.rels", options)?;

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
    <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Write `docProps/core.xml` and `docProps/app.xml`
    fn write_doc_props<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let props = workbook.properties();
        let created = props.created.unwrap_or_else(Utc::now);
        let author = props.author.as_deref().unwrap_or(APPLICATION);

        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("docProps/core.xml", options)?;

        let title = props
            .title
            .as_deref()
            .map(|t| format!("\n    <dc:title>{}</dc:title>", escape_xml(t)))
            .unwrap_or_default();

        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">{}
    <dc:creator>{}</dc:creator>
    <cp:lastModifiedBy>{}</cp:lastModifiedBy>
    <dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>
    <dcterms:modified xsi:type="dcterms:W3CDTF">{}</dcterms:modified>
</cp:coreProperties>"#,
            title,
            escape_xml(author),
            escape_xml(author),
            w3c_datetime(&created),
            w3c_datetime(&created),
        );
        zip.write_all(content.as_bytes())?;

        zip.start_file("docProps/app.xml", options)?;

        let mut titles = String::new();
        for sheet in workbook.worksheets() {
            titles.push_str(&format!(
                "\n            <vt:lpstr>{}</vt:lpstr>",
                escape_xml(sheet.name())
            ));
        }

        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
    <Application>{}</Application>
    <DocSecurity>0</DocSecurity>
    <ScaleCrop>false</ScaleCrop>
    <HeadingPairs>
        <vt:vector size="2" baseType="variant">
            <vt:variant>
                <vt:lpstr>Worksheets</vt:lpstr>
            </vt:variant>
            <vt:variant>
                <vt:i4>{}</vt:i4>
            </vt:variant>
        </vt:vector>
    </HeadingPairs>
    <TitlesOfParts>
        <vt:vector size="{}" baseType="lpstr">{}
        </vt:vector>
    </TitlesOfParts>
    <LinksUpToDate>false</LinksUpToDate>
    <SharedDoc>false</SharedDoc>
    <HyperlinksChanged>false</HyperlinksChanged>
</Properties>"#,
            APPLICATION,
            workbook.sheet_count(),
            workbook.sheet_count(),
            titles,
        );
        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_xml<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/workbook.xml", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheets>"#,
        );

        for (i, sheet) in workbook.worksheets().enumerate() {
            content.push_str(&format!(
                r#"
        <sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml(sheet.name()),
                i + 1,
                i + 1
            ));
        }

        content.push_str(
            r#"
    </sheets>
</workbook>"#,
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_rels<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/_rels/workbook.xml.rels", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }

        // Styles relationship
        let styles_rid = workbook.sheet_count() + 1;
        content.push_str(&format!(
            r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            styles_rid
        ));

        content.push_str("\n</Relationships>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Write a minimal stylesheet with the default font and the "Normal" style
    fn write_styles_xml<W: Write + Seek>(zip: &mut zip::ZipWriter<W>) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/styles.xml", options)?;

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <fonts count="1">
        <font>
            <sz val="11"/>
            <name val="Calibri"/>
            <family val="2"/>
        </font>
    </fonts>
    <fills count="2">
        <fill>
            <patternFill patternType="none"/>
        </fill>
        <fill>
            <patternFill patternType="gray125"/>
        </fill>
    </fills>
    <borders count="1">
        <border>
            <left/>
            <right/>
            <top/>
            <bottom/>
            <diagonal/>
        </border>
    </borders>
    <cellStyleXfs count="1">
        <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
    </cellStyleXfs>
    <cellXfs count="1">
        <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    </cellXfs>
    <cellStyles count="1">
        <cellStyle name="Normal" xfId="0" builtinId="0"/>
    </cellStyles>
</styleSheet>"#;

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_worksheet<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        sheet: &Worksheet,
        index: usize,
        has_drawing: bool,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(format!("xl/worksheets/sheet{}.xml", index + 1), options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );

        let dimension = sheet
            .used_range()
            .map(|r| r.to_a1_string())
            .unwrap_or_else(|| "A1".to_string());
        content.push_str(&format!("\n    <dimension ref=\"{}\"/>", dimension));
        content.push_str("\n    <sheetFormatPr defaultRowHeight=\"15\"/>");

        // Column widths
        let widths = sheet.custom_column_widths();
        if !widths.is_empty() {
            content.push_str("\n    <cols>");
            for (&col, &width) in widths {
                content.push_str(&format!(
                    "\n        <col min=\"{}\" max=\"{}\" width=\"{}\" customWidth=\"1\"/>",
                    col + 1,
                    col + 1,
                    width_to_stored(width)
                ));
            }
            content.push_str("\n    </cols>");
        }

        // Group cells by row; rows with only a custom height are written empty
        let mut rows: BTreeMap<u32, Vec<(u16, &CellData)>> = BTreeMap::new();
        for (row, col, cell) in sheet.iter_cells() {
            rows.entry(row).or_default().push((col, cell));
        }

        content.push_str("\n    <sheetData>");
        for row in sheet.rows_in_use() {
            let height_attr = match sheet.custom_row_heights().get(&row) {
                Some(ht) => format!(" ht=\"{}\" customHeight=\"1\"", ht),
                None => String::new(),
            };

            let cells = rows.get(&row).map(Vec::as_slice).unwrap_or_default();
            if cells.is_empty() {
                content.push_str(&format!("\n        <row r=\"{}\"{}/>", row + 1, height_attr));
                continue;
            }

            content.push_str(&format!("\n        <row r=\"{}\"{}>", row + 1, height_attr));
            for &(col, cell) in cells {
                Self::write_cell(&mut content, CellAddress::new(row, col), cell);
            }
            content.push_str("\n        </row>");
        }
        content.push_str("\n    </sheetData>");

        content.push_str(
            "\n    <pageMargins left=\"0.7\" right=\"0.7\" top=\"0.75\" bottom=\"0.75\" header=\"0.3\" footer=\"0.3\"/>",
        );

        if has_drawing {
            content.push_str("\n    <drawing r:id=\"rId1\"/>");
        }

        content.push_str("\n</worksheet>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_cell(content: &mut String, addr: CellAddress, cell: &CellData) {
        let cell_ref = addr.to_a1_string();
        match &cell.value {
            CellValue::Number(n) => {
                content.push_str(&format!(
                    "\n            <c r=\"{}\"><v>{}</v></c>",
                    cell_ref, n
                ));
            }
            CellValue::String(s) => {
                let space = if needs_space_preserve(s.as_str()) {
                    " xml:space=\"preserve\""
                } else {
                    ""
                };
                content.push_str(&format!(
                    "\n            <c r=\"{}\" t=\"inlineStr\"><is><t{}>{}</t></is></c>",
                    cell_ref,
                    space,
                    escape_xml(&encode_cell_text(s.as_str()))
                ));
            }
            CellValue::Boolean(b) => {
                content.push_str(&format!(
                    "\n            <c r=\"{}\" t=\"b\"><v>{}</v></c>",
                    cell_ref,
                    if *b { 1 } else { 0 }
                ));
            }
            CellValue::Empty => {}
        }
    }

    /// Write worksheet relationships file (links the sheet to its drawing)
    fn write_worksheet_rels<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        sheet_index: usize,
        drawing: &DrawingPart,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(
            format!("xl/worksheets/_rels/sheet{}.xml.rels", sheet_index + 1),
            options,
        )?;

        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing" Target="../drawings/drawing{}.xml"/>
</Relationships>"#,
            drawing.number
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Write a sheet's drawing part, its relationships and its media
    fn write_drawing<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        sheet: &Worksheet,
        part: &DrawingPart,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();

        zip.start_file(part.path(), options)?;
        zip.write_all(drawing::drawing_xml(sheet).as_bytes())?;

        zip.start_file(part.rels_path(), options)?;
        zip.write_all(drawing::drawing_rels_xml(part).as_bytes())?;

        // Image data is already compressed
        let media_options =
            options.compression_method(zip::CompressionMethod::Stored);
        for (pic, media) in sheet.pictures().iter().zip(&part.media) {
            debug!(
                "writing {} ({} bytes) for {}",
                media.path(),
                pic.data.len(),
                CellAddress::new(pic.row, pic.col)
            );
            zip.start_file(media.path(), media_options)?;
            zip.write_all(&pic.data)?;
        }

        Ok(())
    }
}

/// Escape markup characters and drop characters XML 1.0 cannot carry
pub(crate) fn escape_xml(s: &str) -> String {
    strip_invalid_xml_chars(s)
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn w3c_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
