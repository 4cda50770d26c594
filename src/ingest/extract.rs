// src/ingest/extract.rs
//! Generic job-link extraction from career-page HTML.
//!
//! Deliberately regex-based and forgiving: career pages vary wildly, and
//! the downstream length filter plus scoring vocabulary absorb the noise
//! a loose extractor lets through.

use once_cell::sync::OnceCell;
use regex::Regex;

use super::clean_text;

/// A candidate listing pulled out of a page: cleaned link text plus an
/// absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedJob {
    pub title: String,
    pub url: String,
}

const CONTEXT_KEYWORDS: [&str; 5] = ["job", "position", "role", "career", "opening"];

fn anchor_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<a\b[^>]*href\s*=\s*["']([^"'#]+)["'][^>]*>(.*?)</a>"#).unwrap()
    })
}

/// Pull job-looking anchors out of raw HTML. An anchor qualifies when its
/// attributes, href, or inner markup mention a job-ish keyword. Relative
/// hrefs are resolved against `base_url`.
pub fn extract_jobs(html: &str, base_url: &str) -> Vec<ExtractedJob> {
    let base = reqwest::Url::parse(base_url).ok();
    let mut out = Vec::new();

    for caps in anchor_re().captures_iter(html) {
        let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        let href = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let inner = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

        let hay = whole.to_lowercase();
        if !CONTEXT_KEYWORDS.iter().any(|kw| hay.contains(kw)) {
            continue;
        }

        let title = clean_text(inner);
        if title.is_empty() {
            continue;
        }

        let url = resolve(href, base.as_ref());
        let Some(url) = url else { continue };

        out.push(ExtractedJob { title, url });
    }

    out.dedup();
    out
}

fn resolve(href: &str, base: Option<&reqwest::Url>) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("javascript:") || href.starts_with("mailto:") {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    base.and_then(|b| b.join(href).ok()).map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <nav><a href="/about">About us</a></nav>
        <ul class="positions">
          <li><a class="job-link" href="/careers/123">Principal ML Engineer</a></li>
          <li><a class="job-link" href="https://acme.example/careers/456">
                <span>Staff&nbsp;Engineer, Inference</span></a></li>
          <li><a class="job-link" href="javascript:void(0)">Apply now</a></li>
        </ul>
        <footer><a href="/privacy">Privacy</a></footer>
        </body></html>
    "#;

    #[test]
    fn extracts_job_anchors_only() {
        let jobs = extract_jobs(PAGE, "https://acme.example/careers");
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].title, "Principal ML Engineer");
        assert_eq!(jobs[0].url, "https://acme.example/careers/123");
        assert_eq!(jobs[1].title, "Staff Engineer, Inference");
    }

    #[test]
    fn non_job_links_skipped() {
        let jobs = extract_jobs(PAGE, "https://acme.example/careers");
        assert!(jobs.iter().all(|j| !j.url.contains("privacy")));
        assert!(jobs.iter().all(|j| !j.url.contains("about")));
    }

    #[test]
    fn relative_urls_resolved_against_base() {
        let html = r#"<a class="opening" href="roles/7">Senior Platform Engineer</a>"#;
        let jobs = extract_jobs(html, "https://acme.example/careers/");
        assert_eq!(jobs[0].url, "https://acme.example/careers/roles/7");
    }
}
