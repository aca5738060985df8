// Plain-text renderings of articles for resource reads and tool results

use knowbase_core::query::SearchResults;
use knowbase_core::Article;

/// Full article: heading, metadata lines, then the content
pub fn article_document(article: &Article) -> String {
    let tags = article.tag_list();
    let tags = if tags.is_empty() {
        "None".to_string()
    } else {
        tags.join(", ")
    };
    let published = article
        .published_at
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "Unpublished".to_string());

    format!(
        "# {}\n\nAuthor: {}\nCategory: {}\nTags: {}\nPublished: {}\n\n{}",
        article.title,
        article.author.as_deref().unwrap_or("Unknown"),
        article.category.as_deref().unwrap_or("Uncategorized"),
        tags,
        published,
        article.content
    )
}

/// First `max_chars` characters on one line, with `...` when cut short
pub fn preview(content: &str, max_chars: usize) -> String {
    let flattened: String = content
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();

    match flattened.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &flattened[..cut]),
        None => flattened,
    }
}

pub fn no_results(query: &str) -> String {
    format!("No articles found for query: {}", query)
}

/// Digest of a search: total, then one entry per article on the page
pub fn search_digest(query: &str, results: &SearchResults, preview_chars: usize) -> String {
    if results.meta.total == 0 {
        return no_results(query);
    }

    let entries: Vec<String> = results
        .articles
        .iter()
        .map(|a| {
            format!(
                "- {} ({})\n  Category: {}\n  {}",
                a.title,
                a.slug,
                a.category.as_deref().unwrap_or("None"),
                preview(&a.content, preview_chars)
            )
        })
        .collect();

    let mut digest = format!(
        "Found {} article(s) for query: {}\n\n{}",
        results.meta.total,
        query,
        entries.join("\n\n")
    );

    if results.articles.len() < results.meta.total {
        digest.push_str(&format!(
            "\n\nShowing {} of {}.",
            results.articles.len(),
            results.meta.total
        ));
    }

    digest
}
