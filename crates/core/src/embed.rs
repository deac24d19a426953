//! Screenshot embedding into report markup

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::config::EmbedConfig;
use crate::error::EmbedError;

/// Turns a text-encoded screenshot into markup shown next to a step description
pub trait ImageEmbedder: Send + Sync {
    fn embed(&self, screenshot: &str, style: &str, description: &str) -> Result<String, EmbedError>;
}

/// Renders screenshots as inline `<img>` tags with a data URI
#[derive(Debug, Clone, Default)]
pub struct HtmlEmbedder {
    config: EmbedConfig,
}

impl HtmlEmbedder {
    pub fn new(config: EmbedConfig) -> Self {
        Self { config }
    }
}

impl ImageEmbedder for HtmlEmbedder {
    fn embed(&self, screenshot: &str, style: &str, description: &str) -> Result<String, EmbedError> {
        let data = screenshot.trim();
        if data.is_empty() {
            return Err(EmbedError::Empty);
        }
        if style.is_empty() || !style.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(EmbedError::UnknownStyle(style.to_string()));
        }
        STANDARD
            .decode(data)
            .map_err(|e| EmbedError::InvalidEncoding(e.to_string()))?;

        let label = escape_html(description);
        Ok(format!(
            r#"<img class="screenshot screenshot-{style}" src="data:{mime};base64,{data}" alt="{label}" title="{label}" style="max-width:{width};" />"#,
            style = style,
            mime = self.config.mime_type,
            data = data,
            label = label,
            width = self.config.max_width,
        ))
    }
}

/// Escape text for use inside HTML content or attribute values
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
