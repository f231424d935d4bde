pub mod error;
pub mod ingest;
pub mod json;
pub mod models;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use ingest::Ingestor;
pub use models::InferenceModel;
pub use storage::{ArticleStorage, CacheStorage};
pub use types::*;

/// Cosine similarity between two vectors; 0.0 when either is empty, zero or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Canonical form used to key stored articles: parsed URLs get a lowercased
/// scheme and host and an explicit path; anything unparsable is only trimmed.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match url::Url::parse(trimmed) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

pub mod prelude {
    pub use super::{Article, ChatResponse, Error, Plan, Result};
    pub use super::{ArticleStorage, CacheStorage, InferenceModel, Ingestor};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &[1.0, 0.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).abs() < 1e-9);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("https://News.Example.com"), "https://news.example.com/");
        assert_eq!(normalize_url("  HTTP://a.com/Story?id=1 "), "http://a.com/Story?id=1");
        assert_eq!(normalize_url("http://a.com/"), normalize_url("http://a.com"));
        assert_eq!(normalize_url(" not a url "), "not a url");
    }

    #[test]
    fn test_cosine_similarity_degenerate() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }
}
