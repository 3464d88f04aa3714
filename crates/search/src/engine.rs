//! Field-weighted fuzzy ranking.
//!
//! Each candidate is split into separately weighted fields so that a keyword
//! in a code sample or heading ranks differently from the same word in body
//! text. Each field is matched with the `fuse-rust` bitap matcher; the
//! weighted similarities of the matching fields add up to the item's score.

use fuse_rust::{Fuse, Pattern};
use serde::Serialize;
use slidemark_core::{SearchResultItem, SlideBlock};
use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;

/// Longest pattern the bitap matcher accepts, in bytes.
const MAX_PATTERN_BYTES: usize = 32;

/// Match distance large enough that position never affects the score.
const IGNORE_LOCATION_DISTANCE: i32 = 1_000_000;

/// Weight of each search field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldWeights {
    pub title: f64,
    pub headers: f64,
    pub code: f64,
    pub presentation_title: f64,
    pub text: f64,
    /// Flat text of records saved without block structure.
    pub legacy_content: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            title: 1.0,
            headers: 0.8,
            code: 0.7,
            presentation_title: 0.5,
            text: 0.6,
            legacy_content: 0.5,
        }
    }
}

/// Ranking configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Highest matcher score (0 = perfect, 1 = anything) that still counts
    /// as a match. 0 means exact substrings only.
    pub threshold: f64,
    /// Queries shorter than this never match.
    pub min_match_chars: usize,
    /// Number of local slides shown for an empty query.
    pub browse_limit: usize,
    /// Optional cap on ranked results.
    pub limit: Option<usize>,
    pub weights: FieldWeights,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            min_match_chars: 2,
            browse_limit: 20,
            limit: None,
            weights: FieldWeights::default(),
        }
    }
}

/// A ranked result with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub item: SearchResultItem,
    /// Sum of weight x similarity over matching fields (0 in browse mode).
    pub score: f64,
}

/// Ranks a candidate pool against a query.
#[derive(Debug, Clone, Default)]
pub struct RankingEngine {
    options: SearchOptions,
}

impl RankingEngine {
    /// Create an engine with default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    /// Cap the number of ranked results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.options.limit = Some(limit);
        self
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Ranked items, most relevant first.
    pub fn rank(&self, pool: &[SearchResultItem], query: &str) -> Vec<SearchResultItem> {
        self.search(pool, query).into_iter().map(|hit| hit.item).collect()
    }

    /// Ranked items with scores.
    ///
    /// An empty query returns the first local slides in pool order.
    pub fn search(&self, pool: &[SearchResultItem], query: &str) -> Vec<SearchHit> {
        if query.trim().is_empty() {
            return pool
                .iter()
                .filter(|item| item.is_local())
                .take(self.options.browse_limit)
                .map(|item| SearchHit {
                    item: item.clone(),
                    score: 0.0,
                })
                .collect();
        }

        let needle = normalize(query.trim());
        if needle.chars().count() < self.options.min_match_chars {
            return Vec::new();
        }

        let fuse = self.matcher();
        let compiled = Query {
            patterns: pattern_chunks(&needle)
                .into_iter()
                .filter_map(|chunk| fuse.create_pattern(chunk))
                .collect(),
            needle,
        };

        let mut hits: Vec<SearchHit> = pool
            .iter()
            .filter_map(|item| {
                let score = self.score(&fuse, &compiled, item)?;
                Some(SearchHit {
                    item: item.clone(),
                    score,
                })
            })
            .collect();

        // Stable: equal scores keep pool order.
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        if let Some(limit) = self.options.limit {
            hits.truncate(limit);
        }
        log::debug!("Query '{}' matched {} of {} candidates", query, hits.len(), pool.len());
        hits
    }

    fn matcher(&self) -> Fuse {
        Fuse {
            threshold: self.options.threshold,
            distance: IGNORE_LOCATION_DISTANCE,
            max_pattern_length: MAX_PATTERN_BYTES as i32,
            ..Fuse::default()
        }
    }

    /// Combined score, or `None` if no field matches.
    fn score(&self, fuse: &Fuse, query: &Query, item: &SearchResultItem) -> Option<f64> {
        let fields = SearchFields::from_item(item);
        let w = &self.options.weights;

        let weighted = [
            (fields.title, w.title),
            (fields.headers, w.headers),
            (fields.code, w.code),
            (fields.presentation_title, w.presentation_title),
            (fields.text, w.text),
            (fields.legacy_content, w.legacy_content),
        ];

        let mut total = 0.0;
        let mut matched = false;
        for (field, weight) in &weighted {
            if let Some(similarity) = self.similarity(fuse, query, field) {
                total += weight * similarity;
                matched = true;
            }
        }
        matched.then_some(total)
    }

    /// Similarity of `field` to the query, in `[0, 1]`.
    ///
    /// Every pattern chunk of the query must match; the similarity is the
    /// mean of `1 - score` over the chunks.
    fn similarity(&self, fuse: &Fuse, query: &Query, field: &str) -> Option<f64> {
        if field.is_empty() {
            return None;
        }
        if field.contains(&query.needle) {
            return Some(1.0);
        }
        if self.options.threshold <= 0.0 || query.patterns.is_empty() {
            return None;
        }

        let mut total = 0.0;
        for pattern in &query.patterns {
            let result = fuse.search(Some(pattern), field)?;
            if result.score > self.options.threshold {
                return None;
            }
            total += 1.0 - result.score;
        }
        Some(total / query.patterns.len() as f64)
    }
}

/// A normalized query and its matcher patterns.
struct Query {
    needle: String,
    patterns: Vec<Pattern>,
}

/// Split a query into pieces no longer than the matcher's pattern limit,
/// on char boundaries.
fn pattern_chunks(needle: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for (i, c) in needle.char_indices() {
        if i + c.len_utf8() - start > MAX_PATTERN_BYTES {
            chunks.push(&needle[start..i]);
            start = i;
        }
    }
    if start < needle.len() {
        chunks.push(&needle[start..]);
    }
    chunks
}

/// Rank with default options.
pub fn rank(pool: &[SearchResultItem], query: &str) -> Vec<SearchResultItem> {
    RankingEngine::new().rank(pool, query)
}

/// Normalized text of each weighted field.
#[derive(Debug, Default)]
struct SearchFields {
    title: String,
    headers: String,
    code: String,
    presentation_title: String,
    text: String,
    legacy_content: String,
}

impl SearchFields {
    fn from_item(item: &SearchResultItem) -> Self {
        let slide = item.slide();

        let headers = join_blocks(slide.blocks_where(SlideBlock::is_header), |b| b.content().to_string());
        let code = join_blocks(slide.blocks_where(SlideBlock::is_code), |b| match b {
            SlideBlock::Code { content, lang } => format!("{} {}", content, lang),
            other => other.content().to_string(),
        });
        let text = join_blocks(
            slide.blocks_where(|b| {
                matches!(
                    b,
                    SlideBlock::Text { .. } | SlideBlock::List { .. } | SlideBlock::Image { .. }
                )
            }),
            |b| b.content().to_string(),
        );

        // Bookmarks are matched on their own content, not their deck's title.
        let presentation_title = if item.is_local() {
            normalize(item.presentation_title())
        } else {
            String::new()
        };

        let legacy_content = if slide.blocks.is_empty() {
            normalize(&slide.search_content)
        } else {
            String::new()
        };

        Self {
            title: normalize(&slide.title),
            headers: normalize(&headers),
            code: normalize(&code),
            presentation_title,
            text: normalize(&text),
            legacy_content,
        }
    }
}

fn join_blocks<'a>(
    blocks: impl Iterator<Item = &'a SlideBlock>,
    render: impl Fn(&SlideBlock) -> String,
) -> String {
    blocks.map(render).collect::<Vec<_>>().join(" ")
}

/// Compatibility-normalize and lowercase for case-insensitive matching.
fn normalize(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidemark_core::{Bookmark, SlideIndex};
    use std::time::{Duration, Instant};

    fn local(h: u32, title: &str, blocks: Vec<SlideBlock>) -> SearchResultItem {
        SearchResultItem::local(SlideIndex::new(h, 0, title, blocks))
    }

    fn text(content: &str) -> SlideBlock {
        SlideBlock::Text {
            content: content.to_string(),
        }
    }

    fn bookmark(title: &str, blocks: Vec<SlideBlock>, deck_title: &str) -> SearchResultItem {
        SearchResultItem::Bookmark(Bookmark {
            slide: SlideIndex::new(0, 0, title, blocks),
            presentation_id: "bob/deck".to_string(),
            presentation_title: deck_title.to_string(),
            url: "https://slides.com/bob/deck".to_string(),
            collection_id: "default".to_string(),
            bookmark_id: "bob/deck#0/0".to_string(),
            created_at: 0,
        })
    }

    #[test]
    fn test_browse_mode_returns_local_slides_only() {
        let mut pool: Vec<_> = (0..25).map(|h| local(h, &format!("Slide {}", h), vec![])).collect();
        pool.insert(3, bookmark("Saved", vec![], "Other"));

        let results = rank(&pool, "   ");
        assert_eq!(results.len(), 20);
        assert!(results.iter().all(SearchResultItem::is_local));
        assert_eq!(results[0].title(), "Slide 0");
        assert_eq!(results[3].title(), "Slide 3");
        assert_eq!(results[19].title(), "Slide 19");
    }

    #[test]
    fn test_language_tag_matches() {
        let pool = vec![
            local(0, "Intro", vec![text("Hello world")]),
            local(
                1,
                "Setup",
                vec![SlideBlock::Code {
                    content: "print(1)".to_string(),
                    lang: "python".to_string(),
                }],
            ),
        ];

        let results = rank(&pool, "python");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title(), "Setup");
    }

    #[test]
    fn test_fuzzy_match_tolerates_typo() {
        let pool = vec![local(0, "Ownership rules", vec![text("Each value has an owner")])];
        assert_eq!(rank(&pool, "ownrship").len(), 1);
        assert!(rank(&pool, "zzzzzzzz").is_empty());
    }

    #[test]
    fn test_match_location_does_not_matter() {
        let long = format!("{} borrow checker", "filler ".repeat(200));
        let pool = vec![local(0, "Deep", vec![text(&long)])];
        assert_eq!(rank(&pool, "borrow").len(), 1);
    }

    #[test]
    fn test_fuzzy_match_far_into_field() {
        let long = format!("{} borrow checker", "filler ".repeat(200));
        let pool = vec![local(0, "Deep", vec![text(&long)])];
        assert_eq!(rank(&pool, "borow chcker").len(), 1);
    }

    #[test]
    fn test_long_query_against_long_field_is_bounded() {
        let pool = vec![local(
            0,
            "Numbers",
            vec![SlideBlock::Code {
                content: "0123456789 ".repeat(455),
                lang: String::new(),
            }],
        )];
        let query = "an unrelated query well past the pattern length";

        let started = Instant::now();
        let results = rank(&pool, query);
        assert!(results.is_empty());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_long_query_matches_in_chunks() {
        let pool = vec![local(
            0,
            "Borrowing",
            vec![text("the borrow checker enforces ownership rules at compile time")],
        )];
        assert_eq!(rank(&pool, "the borow checker enforces ownership rules at compile time").len(), 1);
        assert!(rank(&pool, "the borrow checker enforces ownership zzzzzzzzzzzzzzzzzzzzzzzz").is_empty());
    }

    #[test]
    fn test_pattern_chunks_respect_char_boundaries() {
        let needle = "é".repeat(20);
        let chunks = pattern_chunks(&needle);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() <= MAX_PATTERN_BYTES));
        assert_eq!(chunks.concat(), needle);
        assert_eq!(pattern_chunks("short"), vec!["short"]);
    }

    #[test]
    fn test_zero_threshold_is_exact_only() {
        let pool = vec![local(0, "Ownership rules", vec![])];
        let exact = RankingEngine::new().with_options(SearchOptions {
            threshold: 0.0,
            ..SearchOptions::default()
        });
        assert!(exact.rank(&pool, "ownrship").is_empty());
        assert_eq!(exact.rank(&pool, "ownership").len(), 1);
    }

    #[test]
    fn test_single_character_query_matches_nothing() {
        let pool = vec![local(0, "a b c", vec![text("a")])];
        assert!(rank(&pool, "a").is_empty());
    }

    #[test]
    fn test_title_outranks_body_text() {
        let pool = vec![
            local(0, "Misc", vec![text("we talk about traits here")]),
            local(1, "Traits", vec![text("definitions")]),
        ];
        let results = rank(&pool, "traits");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title(), "Traits");
    }

    #[test]
    fn test_code_weight_above_text_weight() {
        let engine = RankingEngine::new();
        let pool = vec![
            local(0, "A", vec![text("tokio runtime")]),
            local(
                1,
                "B",
                vec![SlideBlock::Code {
                    content: "tokio::spawn(task)".to_string(),
                    lang: "rust".to_string(),
                }],
            ),
        ];
        let hits = engine.search(&pool, "tokio");
        assert_eq!(hits[0].item.title(), "B");
        assert!((hits[0].score - 0.7).abs() < 1e-9);
        assert!((hits[1].score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_bookmark_presentation_title_not_searched() {
        let pool = vec![bookmark("Futures", vec![text("polling")], "Concurrency Deck")];
        assert!(rank(&pool, "concurrency").is_empty());
        assert_eq!(rank(&pool, "polling").len(), 1);
    }

    #[test]
    fn test_legacy_content_field() {
        let mut item = bookmark("Old", vec![], "Deck");
        if let SearchResultItem::Bookmark(b) = &mut item {
            b.slide.search_content = "lifetimes and borrowing".to_string();
        }
        assert_eq!(rank(&[item], "borrowing").len(), 1);
    }

    #[test]
    fn test_ties_keep_pool_order_and_limit() {
        let pool: Vec<_> = (0..5).map(|h| local(h, "Same title", vec![])).collect();
        let results = RankingEngine::new().with_limit(3).rank(&pool, "same");
        let hs: Vec<_> = results.iter().map(|r| r.slide().h).collect();
        assert_eq!(hs, vec![0, 1, 2]);
    }

    #[test]
    fn test_case_and_width_insensitive() {
        let pool = vec![local(0, "ＲＵＳＴ Basics", vec![])];
        assert_eq!(rank(&pool, "rust").len(), 1);
    }
}
