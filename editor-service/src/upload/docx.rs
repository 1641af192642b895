//! DOCX to markup conversion via pandoc.
//!
//! Pandoc maps heading and quote paragraph styles onto h1..h6 and
//! blockquote elements, which matches what the editor expects.

use tokio::io::AsyncWriteExt;

use crate::upload::executor::CommandExecutor;
use crate::upload::UploadError;

pub async fn convert(executor: &CommandExecutor, data: &[u8]) -> Result<String, UploadError> {
    let file = tempfile::Builder::new()
        .suffix(".docx")
        .tempfile()
        .map_err(|_| UploadError::Unreadable("DOCX"))?;
    let path = file.path().to_str().ok_or(UploadError::Unreadable("DOCX"))?;

    let mut handle = tokio::fs::File::create(file.path())
        .await
        .map_err(|_| UploadError::Unreadable("DOCX"))?;
    handle
        .write_all(data)
        .await
        .map_err(|_| UploadError::Unreadable("DOCX"))?;
    handle
        .flush()
        .await
        .map_err(|_| UploadError::Unreadable("DOCX"))?;

    let output = executor
        .run("DOCX", "pandoc", &["-f", "docx", "-t", "html", path])
        .await?;

    let html = String::from_utf8_lossy(&output).trim().to_string();
    if html.is_empty() {
        return Err(UploadError::ConversionFailed {
            kind: "DOCX",
            reason: "No content extracted".to_string(),
        });
    }

    Ok(format!("<div class=\"docx-content\">{html}</div>"))
}
