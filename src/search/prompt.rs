//! Instructions sent to the completion service and the literal item rendering.

use crate::search::types::{SearchItem, SearchQuery};

pub fn search_instruction(query: &SearchQuery) -> String {
    format!("Perform a web search for: {}", query.as_str())
}

/// Second-stage instruction: digest the extracted items, no tools declared.
pub fn summary_instruction(query: &SearchQuery, items: &[SearchItem]) -> String {
    format!(
        "You are given web search results for the query \"{query}\".\n\
         Write a concise, factual summary in English that answers the query using only these results.\n\
         - If any result is not in English, translate the relevant content into English.\n\
         - Do not mention your knowledge cutoff or add disclaimers about training data.\n\
         - Use lists or tables only when they make the answer clearer; otherwise write plain prose.\n\n\
         Search results:\n{results}",
        query = query.as_str(),
        results = render_items(items),
    )
}

/// Numbered plain-text rendering. Also the summary of last resort when
/// summarization produces nothing.
pub fn render_items(items: &[SearchItem]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            format!(
                "{}. {}\n   {}\n   {}",
                idx + 1,
                item.title,
                item.snippet,
                item.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
