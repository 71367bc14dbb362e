//! End-to-end runs over scratch folders, verified by reading the workbook back.

use std::fs;
use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use thumbsheet::prelude::*;
use thumbsheet::{ObjectPosition, PictureFormat};

fn write_jpeg(path: &Path, width: u32, height: u32) {
    RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 128]))
        .save_with_format(path, ImageFormat::Jpeg)
        .unwrap();
}

fn write_rgba_png(path: &Path, width: u32, height: u32) {
    RgbaImage::from_pixel(width, height, Rgba([10, 200, 30, 90]))
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

/// Column A values of the data rows
fn filenames(sheet: &Worksheet) -> Vec<String> {
    (1..)
        .map(|row| sheet.get_value_at(row, 0))
        .take_while(|v| !v.is_empty())
        .map(|v| v.to_string())
        .collect()
}

fn header(sheet: &Worksheet) -> (String, String) {
    (
        sheet.get_value("A1").unwrap().to_string(),
        sheet.get_value("B1").unwrap().to_string(),
    )
}

#[test]
fn test_two_images() {
    let dir = tempfile::tempdir().unwrap();
    write_jpeg(&dir.path().join("a.jpg"), 200, 100);
    write_rgba_png(&dir.path().join("b.jpg"), 50, 50);

    let mut seen = Vec::new();
    let summary = run(&Config::new(dir.path()), |f| seen.push(f.name.clone())).unwrap();

    assert_eq!(summary.rows_written, 2);
    assert!(summary.skipped.is_empty());
    assert_eq!(summary.output, dir.path().join("result.xlsx"));

    let wb = Workbook::open(&summary.output).unwrap();
    assert_eq!(wb.sheet_count(), 1);
    let sheet = wb.worksheet(0).unwrap();

    assert_eq!(header(sheet), ("Filename".to_string(), "Image".to_string()));
    assert_eq!(filenames(sheet), seen);
    assert_eq!(sheet.picture_count(), 2);
    assert_eq!(sheet.column_width_pixels(1), 95);

    for (i, name) in seen.iter().enumerate() {
        let row = i as u32 + 1;
        assert_eq!(sheet.row_height_pixels(row), 95);

        let pic = &sheet.pictures()[i];
        assert_eq!((pic.row, pic.col), (row, 1));
        assert_eq!((pic.x_offset, pic.y_offset), (2, 2));
        assert_eq!(pic.position, ObjectPosition::MoveAndSize);
        assert_eq!(pic.format, PictureFormat::Jpeg);

        let decoded = image::load_from_memory(&pic.data).unwrap();
        assert!(!decoded.color().has_alpha());
        assert_eq!((decoded.width(), decoded.height()), (pic.width, pic.height));

        match name.as_str() {
            "a.jpg" => assert_eq!((pic.width, pic.height), (90, 45)),
            "b.jpg" => {
                assert_eq!((pic.width, pic.height), (50, 50));
                assert!(matches!(decoded, DynamicImage::ImageRgb8(_)));
            }
            other => panic!("unexpected row {}", other),
        }
    }
}

#[test]
fn test_non_matching_files_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("c.txt"), b"notes").unwrap();
    write_jpeg(&dir.path().join("upper.JPG"), 20, 20);

    let summary = run(&Config::new(dir.path()), |_| {}).unwrap();
    assert_eq!(summary.rows_written, 0);

    let wb = Workbook::open(&summary.output).unwrap();
    let sheet = wb.worksheet(0).unwrap();
    assert_eq!(header(sheet), ("Filename".to_string(), "Image".to_string()));
    assert!(filenames(sheet).is_empty());
    assert_eq!(sheet.picture_count(), 0);
}

#[test]
fn test_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut calls = 0;
    let summary = run(&Config::new(dir.path()), |_| calls += 1).unwrap();

    assert_eq!(calls, 0);
    assert_eq!(summary.rows_written, 0);
    let wb = Workbook::open(&summary.output).unwrap();
    assert_eq!(wb.worksheet(0).unwrap().cell_count(), 2);
}

#[test]
fn test_corrupt_image_aborts_by_default() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("d.jpg"), b"definitely not a jpeg").unwrap();

    let err = run(&Config::new(dir.path()), |_| {}).unwrap_err();
    assert!(matches!(err, Error::Decode { .. }), "{}", err);

    // The output was created up front and never finalized
    let output = dir.path().join("result.xlsx");
    assert_eq!(fs::metadata(output).unwrap().len(), 0);
}

#[test]
fn test_corrupt_image_skipped_with_skip_policy() {
    let dir = tempfile::tempdir().unwrap();
    let corrupt = dir.path().join("d.jpg");
    fs::write(&corrupt, b"definitely not a jpeg").unwrap();

    let config = Config::new(dir.path()).with_error_policy(ErrorPolicy::Skip);
    let summary = run(&config, |_| {}).unwrap();

    assert_eq!(summary.rows_written, 0);
    assert_eq!(summary.skipped.len(), 1);
    assert!(summary.skipped[0].ends_with("d.jpg"));

    let wb = Workbook::open(&summary.output).unwrap();
    assert!(filenames(wb.worksheet(0).unwrap()).is_empty());
}

#[test]
fn test_skip_policy_keeps_good_rows_contiguous() {
    let dir = tempfile::tempdir().unwrap();
    write_jpeg(&dir.path().join("a.jpg"), 30, 30);
    fs::write(dir.path().join("d.jpg"), b"garbage").unwrap();
    write_jpeg(&dir.path().join("e.jpg"), 30, 30);

    let config = Config::new(dir.path()).with_error_policy(ErrorPolicy::Skip);
    let summary = run(&config, |_| {}).unwrap();
    assert_eq!(summary.rows_written, 2);

    let wb = Workbook::open(&summary.output).unwrap();
    let sheet = wb.worksheet(0).unwrap();
    let mut names = filenames(sheet);
    names.sort();
    assert_eq!(names, vec!["a.jpg", "e.jpg"]);
    let rows: Vec<u32> = sheet.pictures().iter().map(|p| p.row).collect();
    assert_eq!(rows, vec![1, 2]);
}

#[test]
fn test_recursive_order_matches_scanner() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("2023/summer")).unwrap();
    fs::create_dir_all(dir.path().join("2024")).unwrap();
    write_jpeg(&dir.path().join("root.jpg"), 100, 300);
    write_jpeg(&dir.path().join("2023/beach.jpg"), 120, 80);
    write_jpeg(&dir.path().join("2023/summer/sun.jpg"), 10, 10);
    write_jpeg(&dir.path().join("2024/snow.jpg"), 300, 300);

    let expected: Vec<String> = Scanner::new(dir.path(), ".jpg")
        .unwrap()
        .map(|f| f.unwrap().name)
        .collect();
    assert_eq!(expected.len(), 4);

    let mut seen = Vec::new();
    let summary = run(&Config::new(dir.path()), |f| {
        assert!(f.path.is_absolute());
        seen.push(f.name.clone());
    })
    .unwrap();
    assert_eq!(seen, expected);
    assert_eq!(summary.rows_written, 4);

    let wb = Workbook::open(&summary.output).unwrap();
    let sheet = wb.worksheet(0).unwrap();
    assert_eq!(filenames(sheet), expected);

    // Every thumbnail fits the 90px box
    for pic in sheet.pictures() {
        assert!(pic.width <= 90 && pic.height <= 90, "{}x{}", pic.width, pic.height);
    }
}

#[test]
fn test_custom_output_and_layout() {
    let input = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    write_jpeg(&input.path().join("a.jpeg"), 400, 200);
    write_jpeg(&input.path().join("b.jpg"), 400, 200);

    let output = out_dir.path().join("thumbs.xlsx");
    let config = Config::new(input.path())
        .with_output(&output)
        .with_extension(".jpeg")
        .with_cell_size(130)
        .with_margin(10)
        .with_headers("Name", "Preview")
        .with_sheet_name("Photos");
    let summary = run(&config, |_| {}).unwrap();

    assert_eq!(summary.output, output);
    assert!(!input.path().join("result.xlsx").exists());

    let wb = Workbook::open(&output).unwrap();
    let sheet = wb.worksheet(0).unwrap();
    assert_eq!(sheet.name(), "Photos");
    assert_eq!(header(sheet), ("Name".to_string(), "Preview".to_string()));
    assert_eq!(filenames(sheet), vec!["a.jpeg"]);
    assert_eq!(sheet.column_width_pixels(1), 130);
    assert_eq!(sheet.row_height_pixels(1), 130);
    assert_eq!((sheet.pictures()[0].width, sheet.pictures()[0].height), (120, 60));
}

#[test]
fn test_rerun_overwrites_output() {
    let dir = tempfile::tempdir().unwrap();
    write_jpeg(&dir.path().join("a.jpg"), 20, 20);

    run(&Config::new(dir.path()), |_| {}).unwrap();
    write_jpeg(&dir.path().join("b.jpg"), 20, 20);
    let summary = run(&Config::new(dir.path()), |_| {}).unwrap();

    assert_eq!(summary.rows_written, 2);
    let wb = Workbook::open(&summary.output).unwrap();
    assert_eq!(filenames(wb.worksheet(0).unwrap()).len(), 2);
}

#[test]
fn test_invalid_config_is_rejected_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::new(dir.path()).with_quality(0);

    assert!(matches!(run(&config, |_| {}), Err(Error::InvalidConfig(_))));
    assert!(!dir.path().join("result.xlsx").exists());
}

#[cfg(unix)]
#[test]
fn test_unusual_filenames_survive_the_workbook() {
    use std::ffi::OsStr;
    use std::io::Read;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir().unwrap();
    let names = ["bad\u{1}name.jpg", "  lead.jpg", "_x0041_.jpg"];
    for name in names {
        write_jpeg(&dir.path().join(OsStr::from_bytes(name.as_bytes())), 20, 20);
    }

    let summary = run(&Config::new(dir.path()), |_| {}).unwrap();
    assert_eq!(summary.rows_written, 3);

    let mut archive = zip::ZipArchive::new(fs::File::open(&summary.output).unwrap()).unwrap();
    for part in ["xl/worksheets/sheet1.xml", "xl/drawings/drawing1.xml"] {
        let mut xml = String::new();
        archive
            .by_name(part)
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        assert!(!xml.contains('\u{1}'), "raw control character in {}", part);
        if part.ends_with("sheet1.xml") {
            assert!(xml.contains(r#"<t xml:space="preserve">  lead.jpg</t>"#));
        }
    }

    let wb = Workbook::open(&summary.output).unwrap();
    let mut read = filenames(wb.worksheet(0).unwrap());
    read.sort();
    let mut expected: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    expected.sort();
    assert_eq!(read, expected);
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write_jpeg(&dir.path().join("a.jpg"), 20, 20);
    std::os::unix::fs::symlink(dir.path().join("gone.jpg"), dir.path().join("x.jpg")).unwrap();

    let err = run(&Config::new(dir.path()), |_| {}).unwrap_err();
    assert!(matches!(err, Error::Io { .. }), "{}", err);

    // Not a decode failure, so skipping does not apply either
    let config = Config::new(dir.path()).with_error_policy(ErrorPolicy::Skip);
    assert!(matches!(run(&config, |_| {}), Err(Error::Io { .. })));
}
