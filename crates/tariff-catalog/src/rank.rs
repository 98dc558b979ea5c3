//! Search ranking.

use std::cmp::Reverse;

use tariff_model::{ClassificationNode, SearchHit};

/// How a node matched a query. Earlier variants rank higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    /// Code equals the query, ignoring punctuation and case.
    ExactCode,
    /// Code starts with the query, ignoring punctuation and case.
    CodePrefix,
    /// Every query word starts some description word.
    DescriptionWords,
    /// Description contains the query text.
    Substring,
}

impl MatchKind {
    pub fn score(self) -> f32 {
        match self {
            Self::ExactCode => 1.0,
            Self::CodePrefix => 0.9,
            Self::DescriptionWords => 0.75,
            Self::Substring => 0.5,
        }
    }
}

/// Pre-processed query.
#[derive(Debug, Clone)]
pub struct Query {
    text: String,
    code: String,
    words: Vec<String>,
}

impl Query {
    pub fn parse(raw: &str) -> Self {
        let text = raw.trim().to_lowercase();
        Self {
            code: code_key(&text),
            words: words(&text).map(str::to_string).collect(),
            text,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Best way `node` matches this query, if it matches at all.
    pub fn matches(&self, node: &ClassificationNode) -> Option<MatchKind> {
        if self.is_empty() {
            return None;
        }
        if !self.code.is_empty() {
            let code = code_key(&node.code);
            if code == self.code {
                return Some(MatchKind::ExactCode);
            }
            if code.starts_with(&self.code) {
                return Some(MatchKind::CodePrefix);
            }
        }
        let description = node.description.to_lowercase();
        if !self.words.is_empty()
            && self
                .words
                .iter()
                .all(|q| words(&description).any(|w| w.starts_with(q.as_str())))
        {
            return Some(MatchKind::DescriptionWords);
        }
        description
            .contains(&self.text)
            .then_some(MatchKind::Substring)
    }
}

/// Rank `nodes` against `query`, best first, keeping at most `limit`.
///
/// Ties go to the finer level, then to the lower code.
pub fn rank<'a, I>(query: &Query, nodes: I, limit: usize) -> Vec<SearchHit>
where
    I: IntoIterator<Item = &'a ClassificationNode>,
{
    let mut matched: Vec<_> = nodes
        .into_iter()
        .filter_map(|node| query.matches(node).map(|kind| (kind, node)))
        .collect();
    matched.sort_by(|(ka, a), (kb, b)| {
        (ka, Reverse(a.level), &a.code).cmp(&(kb, Reverse(b.level), &b.code))
    });
    matched
        .into_iter()
        .take(limit)
        .map(|(kind, node)| SearchHit::from(node).with_score(kind.score()))
        .collect()
}

fn code_key(code: &str) -> String {
    code.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tariff_model::Level;

    fn node(code: &str, description: &str, level: Level) -> ClassificationNode {
        ClassificationNode::child(code, description, level, "x", false)
    }

    #[test]
    fn test_code_match_ignores_punctuation() {
        let query = Query::parse("85171200");
        let phone = node("8517.12.00", "Mobile telephones", Level::Subheading);
        assert_eq!(query.matches(&phone), Some(MatchKind::ExactCode));

        let query = Query::parse("8517.1");
        assert_eq!(query.matches(&phone), Some(MatchKind::CodePrefix));
    }

    #[test]
    fn test_word_prefix_needs_every_token() {
        let horses = node("0101", "Live horses, asses, mules", Level::Heading);
        assert_eq!(
            Query::parse("hor liv").matches(&horses),
            Some(MatchKind::DescriptionWords)
        );
        assert_eq!(Query::parse("horses cattle").matches(&horses), None);
        assert_eq!(
            Query::parse("orses").matches(&horses),
            Some(MatchKind::Substring)
        );
    }

    #[test]
    fn test_ties_prefer_finer_level_then_code() {
        let nodes = [
            node("8517", "Telephone sets", Level::Heading),
            node("8517.18.00", "Other telephone sets", Level::Subheading),
            node("8517.11.00", "Line telephone sets", Level::Subheading),
        ];
        let hits = rank(&Query::parse("telephone"), &nodes, 10);
        let codes: Vec<_> = hits.iter().map(|h| h.code.as_str()).collect();
        assert_eq!(codes, ["8517.11.00", "8517.18.00", "8517"]);
        assert_eq!(hits[0].score, Some(0.75));

        assert_eq!(rank(&Query::parse("telephone"), &nodes, 1).len(), 1);
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        let nodes = [node("01", "Live animals", Level::Chapter)];
        assert!(rank(&Query::parse("   "), &nodes, 10).is_empty());
    }
}
