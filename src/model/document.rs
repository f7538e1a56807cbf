use crate::ParseError;
use scraper::Html;
use serde::de::DeserializeOwned;
use url::Url;

/// A fetched payload, opaque to the engine
///
/// Adapters decide how to read it: as HTML, as JSON or as plain text.
#[derive(Debug, Clone)]
pub struct Document {
    /// URL that was requested
    pub url: String,

    /// URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status: u16,

    /// Content-Type header value, if any
    pub content_type: Option<String>,

    /// Response body
    pub body: String,
}

impl Document {
    /// Creates a successful document with no redirect and no content type
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            final_url: url.clone(),
            url,
            status: 200,
            content_type: None,
            body: body.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    /// Parses the body as an HTML document
    ///
    /// HTML parsing never fails; broken markup yields a best-effort tree.
    pub fn html(&self) -> Html {
        Html::parse_document(&self.body)
    }

    /// Deserializes the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ParseError> {
        serde_json::from_str(&self.body).map_err(|e| {
            ParseError::MalformedDocument(format!("{}: {}", self.final_url, e))
        })
    }

    /// The URL relative links in this document resolve against
    pub fn base_url(&self) -> Result<Url, ParseError> {
        Url::parse(&self.final_url).map_err(|e| {
            ParseError::MalformedDocument(format!("invalid document URL {}: {}", self.final_url, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        title: String,
    }

    #[test]
    fn test_json_ok() {
        let doc = Document::new("https://api.x.de/1", r#"{"title":"Tagesschau"}"#);
        let probe: Probe = doc.json().unwrap();
        assert_eq!(probe.title, "Tagesschau");
    }

    #[test]
    fn test_json_malformed() {
        let doc = Document::new("https://api.x.de/1", "{not json");
        let result: Result<Probe, _> = doc.json();
        assert!(matches!(result, Err(ParseError::MalformedDocument(_))));
    }

    #[test]
    fn test_html_select() {
        let doc = Document::new("https://x.de/", "<html><body><h1>Hallo</h1></body></html>");
        let html = doc.html();
        let h1 = Selector::parse("h1").unwrap();
        let text: String = html.select(&h1).next().unwrap().text().collect();
        assert_eq!(text, "Hallo");
    }

    #[test]
    fn test_base_url_uses_final_url() {
        let mut doc = Document::new("https://x.de/a", "");
        doc.final_url = "https://www.x.de/b/".to_string();
        assert_eq!(doc.base_url().unwrap().as_str(), "https://www.x.de/b/");
    }
}
