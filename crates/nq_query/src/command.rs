use nq_core::Error;
use std::fmt;
use std::str::FromStr;

/// Every command the planner may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Summary,
    KeywordsOrTopics,
    GetSentiment,
    CompareArticles,
    ToneKeyDifferences,
    MostPositiveArticleForFilter,
    GetTopEntities,
    FilterBySpecificTopic,
}

impl CommandKind {
    pub const ALL: [CommandKind; 8] = [
        CommandKind::Summary,
        CommandKind::KeywordsOrTopics,
        CommandKind::GetSentiment,
        CommandKind::CompareArticles,
        CommandKind::ToneKeyDifferences,
        CommandKind::MostPositiveArticleForFilter,
        CommandKind::GetTopEntities,
        CommandKind::FilterBySpecificTopic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Summary => "summary",
            CommandKind::KeywordsOrTopics => "keywords_or_topics",
            CommandKind::GetSentiment => "get_sentiment",
            CommandKind::CompareArticles => "compare_articles",
            CommandKind::ToneKeyDifferences => "tone_key_differences",
            CommandKind::MostPositiveArticleForFilter => "most_positive_article_for_filter",
            CommandKind::GetTopEntities => "get_top_entities",
            CommandKind::FilterBySpecificTopic => "filter_by_specific_topic",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Command not supported: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in CommandKind::ALL {
            assert_eq!(kind.as_str().parse::<CommandKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_name() {
        assert!("translate".parse::<CommandKind>().is_err());
        assert!("Summary".parse::<CommandKind>().is_err());
    }
}
