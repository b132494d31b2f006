use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::export::collaborators::{DocumentRenderer, PdfConverter};
use crate::export::error::{ConversionFailure, RenderError};
use crate::export::types::DocBlock;

const SOFFICE_BIN: &str = "libreoffice";

/// Renders the composed blocks as an HTML staging file and converts it to
/// docx with a headless LibreOffice run.
#[derive(Debug, Clone, Default)]
pub struct LibreOfficeRenderer;

#[async_trait]
impl DocumentRenderer for LibreOfficeRenderer {
    async fn render(&self, blocks: &[DocBlock], docx_path: &Path) -> Result<(), RenderError> {
        let out_dir = docx_path
            .parent()
            .ok_or_else(|| RenderError::new("docx path has no parent directory"))?;
        let html_path = docx_path.with_extension("html");
        let html = render_html(blocks);

        tokio::fs::write(&html_path, html).await.map_err(|err| {
            RenderError::new(format!(
                "failed to write staging html {}: {err}",
                html_path.display()
            ))
        })?;

        run_soffice(&html_path, "docx", out_dir)
            .await
            .map_err(RenderError::new)?;

        debug!(target: "export", docx = %docx_path.display(), "docx rendered");
        Ok(())
    }
}

/// `libreoffice --headless --convert-to pdf` over the rendered docx.
#[derive(Debug, Clone, Default)]
pub struct LibreOfficeConverter;

#[async_trait]
impl PdfConverter for LibreOfficeConverter {
    async fn convert(
        &self,
        docx_path: &Path,
        out_dir: &Path,
    ) -> Result<PathBuf, ConversionFailure> {
        run_soffice(docx_path, "pdf", out_dir)
            .await
            .map_err(ConversionFailure::new)?;

        let stem = docx_path.file_stem().unwrap_or(docx_path.as_os_str());
        let pdf_path = out_dir.join(stem).with_extension("pdf");

        if !pdf_path.is_file() {
            return Err(ConversionFailure::new(format!(
                "converter reported success but {} is missing",
                pdf_path.display()
            )));
        }

        Ok(pdf_path)
    }
}

async fn run_soffice(input: &Path, to: &str, out_dir: &Path) -> Result<(), String> {
    let output = Command::new(SOFFICE_BIN)
        .arg("--headless")
        .arg("--convert-to")
        .arg(to)
        .arg(input)
        .arg("--outdir")
        .arg(out_dir)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|err| format!("failed to spawn {SOFFICE_BIN}: {err}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "{SOFFICE_BIN} convert-to {to} exited with {}: {}",
            output.status,
            stderr.trim()
        ));
    }

    Ok(())
}

fn render_html(blocks: &[DocBlock]) -> String {
    let mut body = String::new();

    for block in blocks {
        match block {
            DocBlock::Heading(text) => {
                body.push_str(&format!("<h1>{}</h1>\n", escape_html(text)));
            }
            DocBlock::Paragraph(text) => {
                body.push_str(&format!("<p>{}</p>\n", escape_html(text)));
            }
            DocBlock::Divider => body.push_str("<hr/>\n"),
            DocBlock::Disclaimer(text) => {
                body.push_str(&format!(
                    "<blockquote><em>{}</em></blockquote>\n",
                    escape_html(text)
                ));
            }
        }
    }

    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"/></head><body>\n{body}</body></html>\n"
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
