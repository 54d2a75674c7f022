//! Pure filter and sort over paper listings
//!
//! Matching is case-insensitive substring search across title, authors,
//! abstract and tags. Category and year are exact matches with "all" as
//! the wildcard. Sorting is total: every key breaks ties on `paper_id`
//! so equal keys still produce a deterministic order.

use crate::db::schemas::PaperDoc;
use std::cmp::Ordering;

/// Category dropdown values ("all" plus the nine research areas)
pub const CATEGORIES: [&str; 10] = [
    "all",
    "Artificial Intelligence",
    "Blockchain",
    "IoT",
    "Quantum Computing",
    "Biotechnology",
    "EdTech",
    "Cybersecurity",
    "Robotics",
    "Data Science",
];

/// Year dropdown values
pub const YEARS: [&str; 6] = ["all", "2024", "2023", "2022", "2021", "2020"];

/// Free-text search plus categorical filters from the listing query
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub search: String,
    pub category: String,
    pub year: String,
}

impl ListingFilter {
    pub fn new(search: &str, category: &str, year: &str) -> Self {
        Self {
            search: search.to_string(),
            category: category.to_string(),
            year: year.to_string(),
        }
    }
}

/// Sort keys for the paper listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Citations,
    Views,
    Year,
    Title,
    Recent,
}

impl SortKey {
    /// Parse a `sort` query value; anything unrecognized falls back to
    /// citations
    pub fn parse(s: &str) -> Self {
        match s {
            "views" => SortKey::Views,
            "year" => SortKey::Year,
            "title" => SortKey::Title,
            "recent" => SortKey::Recent,
            _ => SortKey::Citations,
        }
    }
}

fn is_wildcard(value: &str) -> bool {
    value.is_empty() || value == "all"
}

/// Whether a paper passes the filter
pub fn matches(paper: &PaperDoc, filter: &ListingFilter) -> bool {
    let term = filter.search.trim().to_lowercase();
    if !term.is_empty() {
        let hit = paper.title.to_lowercase().contains(&term)
            || paper
                .authors
                .iter()
                .any(|author| author.to_lowercase().contains(&term))
            || paper.abstract_text.to_lowercase().contains(&term)
            || paper.tags.iter().any(|tag| tag.to_lowercase().contains(&term));
        if !hit {
            return false;
        }
    }

    if !is_wildcard(&filter.category) && paper.category != filter.category {
        return false;
    }

    if !is_wildcard(&filter.year) && paper.year.to_string() != filter.year {
        return false;
    }

    true
}

fn compare(a: &PaperDoc, b: &PaperDoc, key: SortKey) -> Ordering {
    let primary = match key {
        SortKey::Citations => b.citations.cmp(&a.citations),
        SortKey::Views => b.views.cmp(&a.views),
        SortKey::Year => b.year.cmp(&a.year),
        SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        // Option ordering puts unstamped documents last
        SortKey::Recent => b.metadata.created_at.cmp(&a.metadata.created_at),
    };
    primary.then_with(|| a.paper_id.cmp(&b.paper_id))
}

/// Sort papers in place by the given key
pub fn sort_papers(papers: &mut [PaperDoc], key: SortKey) {
    papers.sort_by(|a, b| compare(a, b, key));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(
        id: &str,
        title: &str,
        authors: &[&str],
        abstract_text: &str,
        tags: &[&str],
        category: &str,
        year: i32,
        citations: i64,
        views: i64,
    ) -> PaperDoc {
        PaperDoc {
            paper_id: id.to_string(),
            user_id: "user-1".to_string(),
            title: title.to_string(),
            abstract_text: abstract_text.to_string(),
            authors: authors.iter().map(|a| a.to_string()).collect(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: category.to_string(),
            year,
            citations,
            views,
            is_public: true,
            ..Default::default()
        }
    }

    // Exactly two of these six mention "AI"; the rest deliberately avoid
    // words with an embedded "ai" (chain, sustain, domain, ...)
    fn fixture() -> Vec<PaperDoc> {
        vec![
            paper(
                "p1",
                "Quantum error correction with surface codes",
                &["L. Chen"],
                "Surveys decoder performance on noisy hardware",
                &["Quantum Computing"],
                "Quantum Computing",
                2023,
                300,
                90,
            ),
            paper(
                "p2",
                "Consensus protocols for permissioned ledgers",
                &["S. Novak"],
                "Measures throughput of ordering services under load",
                &["Distributed Ledgers"],
                "Blockchain",
                2022,
                120,
                400,
            ),
            paper(
                "p3",
                "Transformer models for clinical text",
                &["M. Rossi"],
                "Evaluates AI triage assistants on de-identified records",
                &["Healthcare", "NLP"],
                "Artificial Intelligence",
                2024,
                95,
                610,
            ),
            paper(
                "p4",
                "Thermal design of compact heat exchangers",
                &["R. Gupta"],
                "Compares fin geometries for dense electronics cooling",
                &["Hardware"],
                "Robotics",
                2021,
                47,
                55,
            ),
            paper(
                "p5",
                "Edge inference accelerators",
                &["T. Okafor"],
                "Benchmarks low-power vision workloads",
                &["AI", "Embedded"],
                "Artificial Intelligence",
                2024,
                12,
                230,
            ),
            paper(
                "p6",
                "Groundwater recharge from urban runoff",
                &["K. Patel"],
                "Field study of percolation rates over two monsoon seasons",
                &["Environment"],
                "Biotechnology",
                2020,
                0,
                18,
            ),
        ]
    }

    #[test]
    fn test_search_ai_matches_exactly_two() {
        let papers = fixture();
        let filter = ListingFilter::new("AI", "all", "all");
        let matched: Vec<&str> = papers
            .iter()
            .filter(|p| matches(p, &filter))
            .map(|p| p.paper_id.as_str())
            .collect();
        assert_eq!(matched, vec!["p3", "p5"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let papers = fixture();
        let upper = ListingFilter::new("QUANTUM", "all", "all");
        let lower = ListingFilter::new("quantum", "all", "all");
        let hits_upper = papers.iter().filter(|p| matches(p, &upper)).count();
        let hits_lower = papers.iter().filter(|p| matches(p, &lower)).count();
        assert_eq!(hits_upper, hits_lower);
        assert_eq!(hits_upper, 1);
    }

    #[test]
    fn test_category_and_year_filters() {
        let papers = fixture();

        let by_category = ListingFilter::new("", "Artificial Intelligence", "all");
        assert_eq!(papers.iter().filter(|p| matches(p, &by_category)).count(), 2);

        let by_year = ListingFilter::new("", "all", "2024");
        assert_eq!(papers.iter().filter(|p| matches(p, &by_year)).count(), 2);

        let combined = ListingFilter::new("", "Artificial Intelligence", "2024");
        assert_eq!(papers.iter().filter(|p| matches(p, &combined)).count(), 2);

        // Category text is not part of the search corpus
        let search_category = ListingFilter::new("Biotechnology", "all", "all");
        assert_eq!(papers.iter().filter(|p| matches(p, &search_category)).count(), 0);
    }

    #[test]
    fn test_wildcards_pass_everything() {
        let papers = fixture();
        let open = ListingFilter::default();
        assert_eq!(papers.iter().filter(|p| matches(p, &open)).count(), 6);
        let all = ListingFilter::new("", "all", "all");
        assert_eq!(papers.iter().filter(|p| matches(p, &all)).count(), 6);
    }

    #[test]
    fn test_sort_by_citations_is_total_order() {
        let mut papers = fixture();
        sort_papers(&mut papers, SortKey::Citations);

        let citations: Vec<i64> = papers.iter().map(|p| p.citations).collect();
        assert_eq!(citations, vec![300, 120, 95, 47, 12, 0]);
        for pair in papers.windows(2) {
            assert!(pair[0].citations >= pair[1].citations);
        }
    }

    #[test]
    fn test_sort_ties_break_on_id() {
        let mut papers = vec![
            paper("pb", "B", &[], "", &[], "all", 2024, 10, 0),
            paper("pa", "A", &[], "", &[], "all", 2024, 10, 0),
            paper("pc", "C", &[], "", &[], "all", 2024, 10, 0),
        ];
        sort_papers(&mut papers, SortKey::Citations);
        let ids: Vec<&str> = papers.iter().map(|p| p.paper_id.as_str()).collect();
        assert_eq!(ids, vec!["pa", "pb", "pc"]);
    }

    #[test]
    fn test_sort_by_title_alphabetical() {
        let mut papers = fixture();
        sort_papers(&mut papers, SortKey::Title);
        let first = papers[0].title.to_lowercase();
        let last = papers[5].title.to_lowercase();
        assert!(first < last);
        assert_eq!(papers[0].paper_id, "p2");
    }

    #[test]
    fn test_sort_by_views_and_year() {
        let mut papers = fixture();
        sort_papers(&mut papers, SortKey::Views);
        assert_eq!(papers[0].paper_id, "p3");

        sort_papers(&mut papers, SortKey::Year);
        assert_eq!(papers[0].year, 2024);
        assert_eq!(papers[5].year, 2020);
    }

    #[test]
    fn test_sort_key_parse_defaults_to_citations() {
        assert_eq!(SortKey::parse("views"), SortKey::Views);
        assert_eq!(SortKey::parse("recent"), SortKey::Recent);
        assert_eq!(SortKey::parse("citations"), SortKey::Citations);
        assert_eq!(SortKey::parse("bogus"), SortKey::Citations);
        assert_eq!(SortKey::parse(""), SortKey::Citations);
    }

    #[test]
    fn test_dropdown_lists_start_with_the_wildcard() {
        assert_eq!(CATEGORIES[0], "all");
        assert_eq!(YEARS[0], "all");

        // Every concrete dropdown value is usable as an exact filter
        let papers = fixture();
        for category in &CATEGORIES[1..] {
            let filter = ListingFilter::new("", category, "all");
            let hits = papers.iter().filter(|p| matches(p, &filter)).count();
            assert_eq!(
                hits,
                papers.iter().filter(|p| p.category == *category).count()
            );
        }
        for year in &YEARS[1..] {
            assert!(year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
