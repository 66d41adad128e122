use std::io::Read;
use std::path::Path;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::IngestError;

use super::{has_extension, DocumentExtractor};

/// Reads `word/document.xml` out of the `.docx` zip container and walks its
/// paragraph and text-run elements. Empty paragraphs are kept as blank lines
/// so paragraph breaks survive into chunking.
#[derive(Debug, Default)]
pub struct DocxExtractor;

#[async_trait]
impl DocumentExtractor for DocxExtractor {
    fn handles(&self, path: &Path) -> bool {
        has_extension(path, &["docx"])
    }

    async fn extract(&self, path: &Path) -> Result<String, IngestError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || read_docx_text(&path))
            .await
            .map_err(|error| IngestError::DocxParse(error.to_string()))?
    }
}

fn read_docx_text(path: &Path) -> Result<String, IngestError> {
    let file = std::fs::File::open(path)?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|error| IngestError::DocxParse(error.to_string()))?;
    let mut entry = archive
        .by_name("word/document.xml")
        .map_err(|error| IngestError::DocxParse(error.to_string()))?;

    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    parse_document_xml(&xml)
}

fn parse_document_xml(xml: &str) -> Result<String, IngestError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => match start.local_name().as_ref() {
                b"p" => paragraph.clear(),
                b"t" => in_text_run = true,
                _ => {}
            },
            Ok(Event::End(end)) => match end.local_name().as_ref() {
                b"p" => {
                    paragraphs.push(std::mem::take(&mut paragraph));
                }
                b"t" => in_text_run = false,
                _ => {}
            },
            Ok(Event::Empty(empty)) => {
                if empty.local_name().as_ref() == b"p" {
                    paragraphs.push(String::new());
                }
            }
            Ok(Event::Text(text)) if in_text_run => {
                let value = text
                    .unescape()
                    .map_err(|error| IngestError::DocxParse(error.to_string()))?;
                paragraph.push_str(&value);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(error) => return Err(IngestError::DocxParse(error.to_string())),
        }
    }

    Ok(paragraphs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaced_runs_concatenate_within_a_paragraph() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>
<w:p><w:r><w:t xml:space="preserve">Hello </w:t></w:r><w:r><w:t>world.</w:t></w:r></w:p>
</w:body>
</w:document>"#;

        let text = parse_document_xml(xml).expect("parses");
        assert_eq!(text, "Hello world.");
    }

    #[test]
    fn empty_paragraphs_become_blank_lines() {
        let xml = r#"<w:document xmlns:w="ns">
<w:body>
<w:p><w:r><w:t>First.</w:t></w:r></w:p>
<w:p/>
<w:p><w:r><w:t>Second.</w:t></w:r></w:p>
</w:body>
</w:document>"#;

        let text = parse_document_xml(xml).expect("parses");
        assert_eq!(text, "First.\n\nSecond.");
    }

    #[test]
    fn entities_are_unescaped() {
        let xml = r#"<w:document xmlns:w="ns"><w:body>
<w:p><w:r><w:t>Fish &amp; bread</w:t></w:r></w:p>
</w:body></w:document>"#;

        let text = parse_document_xml(xml).expect("parses");
        assert_eq!(text, "Fish & bread");
    }

    #[test]
    fn text_outside_runs_is_ignored() {
        let xml = r#"<w:document xmlns:w="ns"><w:body>
<w:p><w:pPr>style noise</w:pPr><w:r><w:t>Kept.</w:t></w:r></w:p>
</w:body></w:document>"#;

        let text = parse_document_xml(xml).expect("parses");
        assert_eq!(text, "Kept.");
    }

    #[test]
    fn mismatched_tags_are_a_parse_error() {
        let error = parse_document_xml("<w:document><w:p></w:document></w:p>").unwrap_err();
        assert!(matches!(error, IngestError::DocxParse(_)));
    }
}
