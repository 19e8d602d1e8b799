use url::Url;

use crate::error::{ExtractError, Result};

/// Hosts the extractor knows how to read
pub const SUPPORTED_HOSTS: [&str; 2] = ["chatgpt.com", "chat.openai.com"];

/// Whether `url` points at a supported chat page (the host or any subdomain)
pub fn is_supported_page(url: &str) -> Result<bool> {
    let parsed = Url::parse(url).map_err(|e| ExtractError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let Some(host) = parsed.host_str() else {
        return Ok(false);
    };
    let host = host.to_ascii_lowercase();

    Ok(SUPPORTED_HOSTS
        .iter()
        .any(|supported| host == *supported || host.ends_with(&format!(".{supported}"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_hosts_are_supported() {
        assert!(is_supported_page("https://chatgpt.com/c/123").unwrap());
        assert!(is_supported_page("https://chat.openai.com/").unwrap());
        assert!(is_supported_page("https://www.ChatGPT.com/share/x").unwrap());
    }

    #[test]
    fn other_hosts_are_not() {
        assert!(!is_supported_page("https://example.com/chatgpt.com").unwrap());
        assert!(!is_supported_page("https://notchatgpt.com/").unwrap());
        assert!(!is_supported_page("file:///tmp/page.html").unwrap());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(
            is_supported_page("not a url"),
            Err(ExtractError::InvalidUrl { .. })
        ));
    }
}
