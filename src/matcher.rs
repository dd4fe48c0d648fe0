/// A successful keyword match against one notification text fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatch {
    pub keyword: String,
    pub text: String,
}

/// Case-insensitive substring search of `keywords` over `candidates`.
///
/// Iterates candidates in arrival order and keywords in configured order;
/// the first containment wins. No word boundaries, no ranking. Returns
/// `None` when the keyword list is empty or nothing matches.
pub fn find_match(candidates: &[String], keywords: &[String]) -> Option<KeywordMatch> {
    if keywords.is_empty() {
        return None;
    }

    for text in candidates {
        let haystack = text.to_lowercase();
        for keyword in keywords {
            if haystack.contains(&keyword.to_lowercase()) {
                return Some(KeywordMatch {
                    keyword: keyword.clone(),
                    text: text.clone(),
                });
            }
        }
    }

    None
}
