//! Input document readers
//!
//! Supports three input shapes: plaintext (one document per line), the
//! MEDLINE field format (`PMID- ` / `TI  - ` / `AB  - ` records separated
//! by blank lines), and MEDLINE XML exports.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// One input document. Title and abstract are processed separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MedlineDocument {
    pub pmid: Option<String>,
    pub title: Option<String>,
    pub abstract_text: Option<String>,
}

impl MedlineDocument {
    fn from_text(text: &str) -> Self {
        Self {
            pmid: None,
            title: None,
            abstract_text: Some(text.trim().to_string()),
        }
    }
}

/// Each non-empty line is one document.
pub fn read_plaintext_file(path: impl AsRef<Path>) -> anyhow::Result<Vec<MedlineDocument>> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("reading {}", path.as_ref().display()))?;

    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(MedlineDocument::from_text)
        .collect())
}

/// Parse the MEDLINE field format.
pub fn parse_medline_file(path: impl AsRef<Path>) -> anyhow::Result<Vec<MedlineDocument>> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("reading {}", path.as_ref().display()))?;
    Ok(parse_medline(&content))
}

fn parse_medline(content: &str) -> Vec<MedlineDocument> {
    let mut documents = Vec::new();
    let mut current: Option<MedlineDocument> = None;
    let mut field: Option<char> = None;

    for line in content.lines() {
        if line.trim().is_empty() {
            if let Some(doc) = current.take() {
                documents.push(doc);
            }
            field = None;
            continue;
        }

        // the fifth character of a field line is a dash: "PMID- ", "TI  - "
        if line.len() > 5 && line.as_bytes()[4] == b'-' {
            let (name, data) = line.split_at(4);
            let name = name.trim();
            let data = data[1..].trim();
            let doc = current.get_or_insert_with(MedlineDocument::default);

            match name {
                "PMID" => {
                    doc.pmid = Some(data.to_string());
                    field = Some('p');
                }
                "TI" => {
                    doc.title = Some(data.to_string());
                    field = Some('t');
                }
                "AB" => {
                    doc.abstract_text = Some(data.to_string());
                    field = Some('a');
                }
                _ => field = None,
            }
        } else if let Some(doc) = current.as_mut() {
            // continuation of the previous field
            let target = match field {
                Some('t') => doc.title.as_mut(),
                Some('a') => doc.abstract_text.as_mut(),
                _ => None,
            };
            if let Some(value) = target {
                value.push(' ');
                value.push_str(line.trim());
            }
        }
    }

    if let Some(doc) = current {
        documents.push(doc);
    }
    documents
}

// ----------------------------------------------------------------------
// MEDLINE XML
// ----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PubmedArticleSet {
    #[serde(rename = "PubmedArticle", default)]
    articles: Vec<PubmedArticle>,
}

#[derive(Debug, Deserialize)]
struct PubmedArticle {
    #[serde(rename = "MedlineCitation")]
    citation: MedlineCitation,
}

#[derive(Debug, Deserialize)]
struct MedlineCitation {
    #[serde(rename = "PMID")]
    pmid: TextElement,
    #[serde(rename = "Article")]
    article: Article,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(rename = "ArticleTitle")]
    title: Option<TextElement>,
    #[serde(rename = "Abstract")]
    r#abstract: Option<AbstractElement>,
}

#[derive(Debug, Deserialize)]
struct AbstractElement {
    #[serde(rename = "AbstractText", default)]
    texts: Vec<TextElement>,
}

/// An element whose attributes we ignore and whose text we keep.
#[derive(Debug, Deserialize)]
struct TextElement {
    #[serde(rename = "$text", default)]
    value: String,
}

/// Parse a MEDLINE XML export.
pub fn parse_medlinexml_file(path: impl AsRef<Path>) -> anyhow::Result<Vec<MedlineDocument>> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("reading {}", path.as_ref().display()))?;
    parse_medlinexml(&content)
}

fn parse_medlinexml(content: &str) -> anyhow::Result<Vec<MedlineDocument>> {
    let set: PubmedArticleSet =
        quick_xml::de::from_str(content).context("parsing MEDLINE XML")?;

    Ok(set
        .articles
        .into_iter()
        .map(|article| {
            let citation = article.citation;
            let abstract_text = citation.article.r#abstract.map(|a| {
                a.texts
                    .iter()
                    .map(|t| t.value.trim())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            });
            MedlineDocument {
                pmid: Some(citation.pmid.value.trim().to_string()),
                title: citation.article.title.map(|t| t.value.trim().to_string()),
                abstract_text,
            }
        })
        .collect())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_medline_fields_and_continuations() {
        let content = "\
PMID- 15996060
TI  - Aspirin in the treatment
      of headaches.
AB  - Aspirin is widely used.
      It is an analgesic.

PMID- 15996061
TI  - Second title.
";
        let docs = parse_medline(content);

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].pmid.as_deref(), Some("15996060"));
        assert_eq!(
            docs[0].title.as_deref(),
            Some("Aspirin in the treatment of headaches.")
        );
        assert_eq!(
            docs[0].abstract_text.as_deref(),
            Some("Aspirin is widely used. It is an analgesic.")
        );
        assert_eq!(docs[1].pmid.as_deref(), Some("15996061"));
        assert_eq!(docs[1].abstract_text, None);
    }

    #[test]
    fn test_parse_medlinexml() {
        let xml = r#"
            <PubmedArticleSet>
                <PubmedArticle>
                    <MedlineCitation Status="MEDLINE">
                        <PMID Version="1">15996060</PMID>
                        <Article>
                            <ArticleTitle>Aspirin and headaches.</ArticleTitle>
                            <Abstract>
                                <AbstractText>First part.</AbstractText>
                                <AbstractText>Second part.</AbstractText>
                            </Abstract>
                        </Article>
                    </MedlineCitation>
                </PubmedArticle>
            </PubmedArticleSet>
        "#;
        let docs = parse_medlinexml(xml).unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].pmid.as_deref(), Some("15996060"));
        assert_eq!(docs[0].title.as_deref(), Some("Aspirin and headaches."));
        assert_eq!(
            docs[0].abstract_text.as_deref(),
            Some("First part. Second part.")
        );
    }

    #[test]
    fn test_plaintext_documents_are_lines() {
        let dir = std::env::temp_dir().join("relex-medline-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("docs.txt");
        std::fs::write(&path, "First document.\n\nSecond document.\n").unwrap();

        let docs = read_plaintext_file(&path).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].abstract_text.as_deref(), Some("First document."));
        assert_eq!(docs[0].title, None);
    }
}
