//! BIOS archive resolution: accepts a direct ZIP path, or a directory
//! containing `neogeo.zip`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Resolve a BIOS path to an open, seekable ZIP reader.
///
/// Resolution order:
/// 1. If `path` ends with `.zip` → open it directly.
/// 2. If `path` is a directory containing `neogeo.zip` → open that.
pub fn open_bios_zip(path: &str) -> std::io::Result<BufReader<File>> {
    let path = Path::new(path);

    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("zip")) {
        return Ok(BufReader::new(File::open(path)?));
    }

    if path.is_dir() {
        let zip_path = path.join("neogeo.zip");
        if zip_path.exists() {
            return Ok(BufReader::new(File::open(zip_path)?));
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("BIOS archive not found: {}", path.display()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_test_zip(path: &Path) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        zip.start_file("000-lo.lo", options).unwrap();
        zip.write_all(&[0xaa; 16]).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn resolve_zip_file_directly() {
        let dir = std::env::temp_dir().join("neogeo_bios_test_zip");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let zip_path = dir.join("custom.zip");
        create_test_zip(&zip_path);

        assert!(open_bios_zip(zip_path.to_str().unwrap()).is_ok());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn resolve_zip_from_directory() {
        let dir = std::env::temp_dir().join("neogeo_bios_test_dir");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        create_test_zip(&dir.join("neogeo.zip"));

        assert!(open_bios_zip(dir.to_str().unwrap()).is_ok());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_archive_is_an_error() {
        let dir = std::env::temp_dir().join("neogeo_bios_test_missing");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        assert!(open_bios_zip(dir.to_str().unwrap()).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
