//! DrawingML parts for cell-anchored pictures
//!
//! Every worksheet that holds pictures gets one `xl/drawings/drawingN.xml`
//! part, linked from the sheet's relationships. Each picture's bytes go into
//! their own `xl/media/imageN.<ext>` part, numbered across the whole workbook
//! in sheet order then insertion order.

use thumbsheet_core::units::pixels_to_emu;
use thumbsheet_core::worksheet::AnchorMarker;
use thumbsheet_core::{PictureFormat, Workbook, Worksheet};

use super::escape_xml;

/// A media part holding one picture's bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MediaPart {
    /// 1-based number in `xl/media/imageN.<ext>`
    pub number: usize,
    pub format: PictureFormat,
}

impl MediaPart {
    /// Path of the part inside the package
    pub fn path(&self) -> String {
        format!("xl/media/image{}.{}", self.number, self.format.extension())
    }
}

/// The drawing part of one worksheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DrawingPart {
    /// 1-based number in `xl/drawings/drawingN.xml`
    pub number: usize,
    /// Media parts, in the sheet's picture order
    pub media: Vec<MediaPart>,
}

impl DrawingPart {
    pub fn path(&self) -> String {
        format!("xl/drawings/drawing{}.xml", self.number)
    }

    pub fn rels_path(&self) -> String {
        format!("xl/drawings/_rels/drawing{}.xml.rels", self.number)
    }
}

/// Assign drawing and media part numbers; `None` for sheets without pictures
pub(crate) fn plan_drawings(workbook: &Workbook) -> Vec<Option<DrawingPart>> {
    let mut next_drawing = 1;
    let mut next_image = 1;

    workbook
        .worksheets()
        .map(|sheet| {
            if sheet.picture_count() == 0 {
                return None;
            }
            let media = sheet
                .pictures()
                .iter()
                .map(|pic| {
                    let part = MediaPart {
                        number: next_image,
                        format: pic.format,
                    };
                    next_image += 1;
                    part
                })
                .collect();
            let part = DrawingPart {
                number: next_drawing,
                media,
            };
            next_drawing += 1;
            Some(part)
        })
        .collect()
}

/// Build `xl/drawings/drawingN.xml` for a worksheet
pub(crate) fn drawing_xml(sheet: &Worksheet) -> String {
    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">"#,
    );

    for (i, pic) in sheet.pictures().iter().enumerate() {
        let anchor = sheet.picture_anchor(pic);
        let descr = pic
            .description
            .as_deref()
            .map(|d| format!(" descr=\"{}\"", escape_xml(d)))
            .unwrap_or_default();

        content.push_str(&format!(
            "\n    <xdr:twoCellAnchor editAs=\"{}\">",
            pic.position.edit_as()
        ));
        push_marker(&mut content, "from", &anchor.from);
        push_marker(&mut content, "to", &anchor.to);
        content.push_str(&format!(
            r#"
        <xdr:pic>
            <xdr:nvPicPr>
                <xdr:cNvPr id="{}" name="Picture {}"{}/>
                <xdr:cNvPicPr>
                    <a:picLocks noChangeAspect="1"/>
                </xdr:cNvPicPr>
            </xdr:nvPicPr>
            <xdr:blipFill>
                <a:blip xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" r:embed="rId{}"/>
                <a:stretch>
                    <a:fillRect/>
                </a:stretch>
            </xdr:blipFill>
            <xdr:spPr>
                <a:xfrm>
                    <a:off x="{}" y="{}"/>
                    <a:ext cx="{}" cy="{}"/>
                </a:xfrm>
                <a:prstGeom prst="rect">
                    <a:avLst/>
                </a:prstGeom>
            </xdr:spPr>
        </xdr:pic>
        <xdr:clientData/>
    </xdr:twoCellAnchor>"#,
            i + 2,
            i + 1,
            descr,
            i + 1,
            anchor.x * pixels_to_emu(1),
            anchor.y * pixels_to_emu(1),
            pixels_to_emu(pic.width),
            pixels_to_emu(pic.height),
        ));
    }

    content.push_str("\n</xdr:wsDr>");
    content
}

fn push_marker(content: &mut String, tag: &str, marker: &AnchorMarker) {
    content.push_str(&format!(
        r#"
        <xdr:{tag}>
            <xdr:col>{}</xdr:col>
            <xdr:colOff>{}</xdr:colOff>
            <xdr:row>{}</xdr:row>
            <xdr:rowOff>{}</xdr:rowOff>
        </xdr:{tag}>"#,
        marker.col,
        pixels_to_emu(marker.col_offset),
        marker.row,
        pixels_to_emu(marker.row_offset),
        tag = tag,
    ));
}

/// Build `xl/drawings/_rels/drawingN.xml.rels`
pub(crate) fn drawing_rels_xml(part: &DrawingPart) -> String {
    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );

    for (i, media) in part.media.iter().enumerate() {
        content.push_str(&format!(
            r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image{}.{}"/>"#,
            i + 1,
            media.number,
            media.format.extension()
        ));
    }

    content.push_str("\n</Relationships>");
    content
}
