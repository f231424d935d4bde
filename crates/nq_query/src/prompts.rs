use nq_core::Article;

const PLANNER_TEMPLATE: &str = r#"You are a query planner for a news article database.
Convert the user's question into a JSON command. Respond with JSON only, no explanation.

Available commands:
- "summary": summarize one article. args: {"urls": [string]}
- "keywords_or_topics": main keywords and topics of one or more articles. args: {"urls": [string]}
- "get_sentiment": overall sentiment of one or more articles. args: {"urls": [string]}
- "compare_articles": compare two articles. args: {"urls": [string, string]}
- "tone_key_differences": contrast the tone of two articles. args: {"urls": [string, string]}
- "most_positive_article_for_filter": the most positive article about a subject. args: {"filter": string}
- "get_top_entities": most mentioned people, places and organizations, optionally limited to some articles. args: {} or {"urls": [string]}
- "filter_by_specific_topic": list articles about a subject. args: {"filter": string}

Examples:
Question: Summarize https://news.example.com/markets-rally
{"command": "summary", "args": {"urls": ["https://news.example.com/markets-rally"]}}

Question: How do https://a.example.com/story and https://b.example.com/story differ in tone?
{"command": "tone_key_differences", "args": {"urls": ["https://a.example.com/story", "https://b.example.com/story"]}}

Question: What is the most positive article about renewable energy?
{"command": "most_positive_article_for_filter", "args": {"filter": "renewable energy"}}

Question: Who are the most mentioned entities?
{"command": "get_top_entities", "args": {}}

Question: Show me articles about the elections
{"command": "filter_by_specific_topic", "args": {"filter": "elections"}}

Question: {query}
"#;

pub fn planner_prompt(query: &str) -> String {
    PLANNER_TEMPLATE.replace("{query}", query.trim())
}

pub fn validation_prompt(filter: &str, article: &Article) -> String {
    format!(
        "You are checking search results for relevance.\n\n\
         Article title: {}\n\
         Article summary: {}\n\n\
         Does this article explicitly discuss \"{}\"? Answer with only YES or NO.",
        article.title, article.summary, filter
    )
}

pub fn comparison_prompt(query: &str, first: &Article, second: &Article) -> String {
    format!(
        "Compare the following two news articles. Describe what they have in common, \
         where they disagree and what each one covers that the other does not.\n\n\
         User question: {}\n\n\
         Article 1: {}\n{}\n\n\
         Article 2: {}\n{}\n\n\
         Comparison:",
        query, first.title, first.summary, second.title, second.summary
    )
}

pub fn tone_prompt(query: &str, first: &Article, second: &Article) -> String {
    let describe = |article: &Article| {
        format!(
            "{}\nTone: {}\nSentiment: {} ({:.2})\nSummary: {}",
            article.title,
            if article.tone.is_empty() { "unknown" } else { article.tone.as_str() },
            article.sentiment,
            article.sentiment_score,
            article.summary
        )
    };

    format!(
        "Contrast the tone of the following two news articles. Focus on word choice, \
         framing and emotional register rather than on the facts reported, and list the \
         key differences.\n\n\
         User question: {}\n\n\
         Article 1: {}\n\n\
         Article 2: {}\n\n\
         Tone differences:",
        query,
        describe(first),
        describe(second)
    )
}
