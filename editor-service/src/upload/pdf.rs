//! PDF to markup conversion via poppler's pdftotext/pdfinfo.

use tokio::io::AsyncWriteExt;

use crate::markup::escape_html;
use crate::upload::executor::CommandExecutor;
use crate::upload::UploadError;

/// Extract text page by page and wrap each page's text in a
/// span inside a `pdf-page` container.
pub async fn convert(executor: &CommandExecutor, data: &[u8]) -> Result<String, UploadError> {
    let file = write_temp(data, "pdf").await?;
    let path = file.path().to_str().ok_or(UploadError::Unreadable("PDF"))?;

    let info = executor.run("PDF", "pdfinfo", &[path]).await?;
    let page_count = parse_page_count(&info)?;

    let extracted = executor.run("PDF", "pdftotext", &[path, "-"]).await?;
    let text = String::from_utf8_lossy(&extracted).to_string();

    // pdftotext separates pages with form feeds.
    let mut content = String::new();
    for page in text.split('\u{c}').take(page_count as usize) {
        let page_text = page.split_whitespace().collect::<Vec<_>>().join(" ");
        if page_text.is_empty() {
            continue;
        }
        content.push_str(&format!(
            "<div class=\"pdf-page\"><span>{}</span></div>",
            escape_html(&page_text)
        ));
    }

    if content.is_empty() {
        return Err(UploadError::ConversionFailed {
            kind: "PDF",
            reason: "No content extracted".to_string(),
        });
    }

    Ok(content)
}

async fn write_temp(data: &[u8], ext: &str) -> Result<tempfile::NamedTempFile, UploadError> {
    let file = tempfile::Builder::new()
        .suffix(&format!(".{ext}"))
        .tempfile()
        .map_err(|_| UploadError::Unreadable("PDF"))?;
    let mut handle = tokio::fs::File::create(file.path())
        .await
        .map_err(|_| UploadError::Unreadable("PDF"))?;
    handle
        .write_all(data)
        .await
        .map_err(|_| UploadError::Unreadable("PDF"))?;
    handle
        .flush()
        .await
        .map_err(|_| UploadError::Unreadable("PDF"))?;
    Ok(file)
}

fn parse_page_count(output: &[u8]) -> Result<i32, UploadError> {
    let output_str = String::from_utf8_lossy(output);

    for line in output_str.lines() {
        if line.starts_with("Pages:") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 2 {
                return parts[1].parse::<i32>().map_err(|e| {
                    UploadError::ConversionFailed {
                        kind: "PDF",
                        reason: format!("Failed to parse page count: {e}"),
                    }
                });
            }
        }
    }

    Err(UploadError::ConversionFailed {
        kind: "PDF",
        reason: "Page count not found in pdfinfo output".to_string(),
    })
}
