use axum_test::multipart::{MultipartForm, Part};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub fn manifest_json(slug: &str, version: &str) -> String {
    serde_json::json!({
        "name": format!("Skill {}", slug),
        "slug": slug,
        "version": version,
        "description": "A test skill",
        "category": "testing",
        "tags": ["test", "fixture"],
        "author": "tester",
        "entry_point": "main.py",
    })
    .to_string()
}

/// Build a stored (uncompressed) archive from `(name, contents)` pairs
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, contents) in entries {
        writer.start_file(*name, options).expect("start_file");
        writer.write_all(contents).expect("write entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// A valid skill package with a manifest at the root
pub fn skill_package(slug: &str, version: &str) -> Vec<u8> {
    let manifest = manifest_json(slug, version);
    build_zip(&[
        ("manifest.json", manifest.as_bytes()),
        ("main.py", b"print('hello')\n"),
        ("README.md", b"# test skill\n"),
    ])
}

/// A valid package padded with `padding` bytes of stored payload
pub fn padded_skill_package(slug: &str, padding: usize) -> Vec<u8> {
    let manifest = manifest_json(slug, "1.0.0");
    let payload = vec![b'x'; padding];
    build_zip(&[
        ("manifest.json", manifest.as_bytes()),
        ("data.bin", payload.as_slice()),
    ])
}

pub fn upload_form(package: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(package)
            .file_name("skill.zip")
            .mime_type("application/zip"),
    )
}
