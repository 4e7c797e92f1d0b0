use crate::chunking::{build_chunks, ChunkingConfig};
use crate::extractor::{LopdfExtractor, PdfExtractor};
use crate::{DocumentFingerprint, IngestError, IngestionOptions, PdfChunk};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        if is_pdf(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

pub fn digest_file(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

#[derive(Debug)]
pub struct SkippedPdf {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct IngestionReport {
    pub documents: Vec<DocumentFingerprint>,
    pub pages: usize,
    pub chunks: Vec<PdfChunk>,
    pub skipped_files: Vec<SkippedPdf>,
}

pub fn ingest_path(path: &Path, options: &IngestionOptions) -> Result<IngestionReport, IngestError> {
    ingest_path_with(path, options, &LopdfExtractor)
}

pub fn ingest_path_with<X: PdfExtractor>(
    path: &Path,
    options: &IngestionOptions,
    extractor: &X,
) -> Result<IngestionReport, IngestError> {
    let config = ChunkingConfig::from(options);
    config.validate()?;

    if !path.exists() {
        return Err(IngestError::NotFound(path.display().to_string()));
    }

    let mut report = IngestionReport::default();
    let mut cursor = 0u64;

    if path.is_file() {
        let (document, pages, chunks) = ingest_file(path, config, extractor, &mut cursor)?;
        report.documents.push(document);
        report.pages = pages;
        report.chunks = chunks;
        return Ok(report);
    }

    let files = discover_pdf_files(path);
    if files.is_empty() {
        return Err(IngestError::InvalidArgument(format!(
            "no pdf files found in {}",
            path.display()
        )));
    }

    for file in files {
        match ingest_file(&file, config, extractor, &mut cursor) {
            Ok((document, pages, chunks)) => {
                report.documents.push(document);
                report.pages += pages;
                report.chunks.extend(chunks);
            }
            Err(error) => report.skipped_files.push(SkippedPdf {
                path: file,
                reason: error.to_string(),
            }),
        }
    }

    Ok(report)
}

fn ingest_file<X: PdfExtractor>(
    path: &Path,
    config: ChunkingConfig,
    extractor: &X,
    cursor: &mut u64,
) -> Result<(DocumentFingerprint, usize, Vec<PdfChunk>), IngestError> {
    let fingerprint = build_document_fingerprint(path)?;
    let pages = extractor.extract_pages(path)?;
    let mut chunks = Vec::new();

    for page in &pages {
        let (page_chunks, next_cursor) = build_chunks(&fingerprint, page, config, *cursor)?;
        *cursor = next_cursor;
        chunks.extend(page_chunks);
    }

    tracing::debug!(
        path = %path.display(),
        pages = pages.len(),
        chunks = chunks.len(),
        "chunked pdf"
    );

    Ok((fingerprint, pages.len(), chunks))
}

fn build_document_fingerprint(path: &Path) -> Result<DocumentFingerprint, IngestError> {
    let checksum = digest_file(path)?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            IngestError::MissingFileName(format!("path missing filename: {}", path.display()))
        })?;

    Ok(DocumentFingerprint {
        document_id: generate_document_id(path),
        document_title: name.to_string(),
        source_path: path.to_string_lossy().to_string(),
        checksum,
        ingested_at: Utc::now(),
    })
}

fn generate_document_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::{digest_file, discover_pdf_files, ingest_path, ingest_path_with};
    use crate::extractor::{PageText, PdfExtractor};
    use crate::{IngestError, IngestionOptions};
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::Path;
    use tempfile::tempdir;

    struct FakeExtractor;

    impl PdfExtractor for FakeExtractor {
        fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IngestError> {
            if path.to_string_lossy().contains("broken") {
                return Err(IngestError::PdfParse("broken".to_string()));
            }
            Ok(vec![
                PageText {
                    number: 1,
                    label: "1".to_string(),
                    text: "The policy term is ten years.".to_string(),
                },
                PageText {
                    number: 2,
                    label: "2".to_string(),
                    text: "Premiums are paid annually.".to_string(),
                },
            ])
        }
    }

    #[test]
    fn discover_pdf_files_is_recursive() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let base = dir.path();
        let nested = base.join("nested");
        fs::create_dir(&nested)?;

        File::create(base.join("a.pdf")).and_then(|mut file| file.write_all(b"%PDF-1.4\n%fake"))?;
        File::create(nested.join("b.PDF"))
            .and_then(|mut file| file.write_all(b"%PDF-1.4\n%fake"))?;
        File::create(base.join("notes.txt"))?;

        let files = discover_pdf_files(base);
        assert_eq!(files.len(), 2);
        Ok(())
    }

    #[test]
    fn checksum_is_reproducible() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let file_path = dir.path().join("a.pdf");
        fs::write(&file_path, b"abc")?;

        let first = digest_file(&file_path)?;
        let second = digest_file(&file_path)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn missing_path_is_not_found() {
        let result = ingest_path(Path::new("/nonexistent/icic.pdf"), &IngestionOptions::default());
        assert!(matches!(result, Err(IngestError::NotFound(_))));
    }

    #[test]
    fn ingestion_fails_without_pdfs() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let result = ingest_path(dir.path(), &IngestionOptions::default());
        assert!(matches!(result, Err(IngestError::InvalidArgument(_))));
        Ok(())
    }

    #[test]
    fn single_file_yields_chunks_per_page() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("policy.pdf");
        fs::write(&path, b"%PDF-1.4\n%fake")?;

        let report = ingest_path_with(&path, &IngestionOptions::default(), &FakeExtractor)?;

        assert_eq!(report.pages, 2);
        assert_eq!(report.chunks.len(), 2);
        assert_eq!(report.chunks[1].page_label, "2");
        assert_eq!(report.chunks[1].chunk_index, 1);
        assert_eq!(report.documents[0].document_title, "policy.pdf");
        Ok(())
    }

    #[test]
    fn single_unreadable_file_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"%PDF-1.4\n%broken")?;

        let result = ingest_path_with(&path, &IngestionOptions::default(), &FakeExtractor);
        assert!(matches!(result, Err(IngestError::PdfParse(_))));
        Ok(())
    }

    #[test]
    fn folder_ingestion_skips_unreadable_pdfs() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("broken.pdf"), b"%PDF-1.4\n%broken")?;
        fs::write(dir.path().join("policy.pdf"), b"%PDF-1.4\n%fake")?;

        let report = ingest_path_with(dir.path(), &IngestionOptions::default(), &FakeExtractor)?;

        assert_eq!(report.chunks.len(), 2);
        assert_eq!(report.skipped_files.len(), 1);
        assert_eq!(
            report.skipped_files[0]
                .path
                .file_name()
                .and_then(|name| name.to_str()),
            Some("broken.pdf")
        );
        Ok(())
    }
}
