//! Candidates, choice sources, and the substring ranker.

use crate::utils::byte_to_char_index;
use anyhow::Result;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::mpsc::Sender;

/// Ranked results are capped at this many entries unless configured otherwise.
pub const DEFAULT_LIMIT: usize = 20;

/// One selectable suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Text inserted in place of the current word.
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Earliest match index from the last ranking pass.
    #[serde(skip)]
    pub rank: Option<usize>,
}

impl Candidate {
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self { title: title.into(), subtitle: None, value: value.into(), image: None, rank: None }
    }

    #[must_use]
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }
}

/// Answer to one suggestion request, tagged with the request number.
pub struct Response {
    pub request: u64,
    pub result: Result<Vec<Candidate>>,
}

/// Handle a [`Provider`] uses to answer a request, now or later.
///
/// Dropping it without answering is allowed; the box simply never updates for that request.
pub struct Responder {
    request: u64,
    tx: Sender<Response>,
}

impl Responder {
    pub(crate) fn new(request: u64, tx: Sender<Response>) -> Self {
        Self { request, tx }
    }

    pub fn request(&self) -> u64 {
        self.request
    }

    pub fn resolve(self, candidates: Vec<Candidate>) {
        // the box may already be gone
        let _ = self.tx.send(Response { request: self.request, result: Ok(candidates) });
    }

    pub fn fail(self, err: anyhow::Error) {
        let _ = self.tx.send(Response { request: self.request, result: Err(err) });
    }
}

/// Asynchronous source of candidates. Results are used as given, not re-ranked.
pub trait Provider {
    fn suggest(&mut self, word: &str, responder: Responder);
}

impl<F> Provider for F
where
    F: FnMut(&str, Responder),
{
    fn suggest(&mut self, word: &str, responder: Responder) {
        self(word, responder);
    }
}

/// Where a suggestion box gets its candidates from.
pub enum ChoiceSource {
    /// One flat list ranked against the whole word.
    List(Vec<Candidate>),
    /// Lists keyed by a trigger char; the rest of the word is ranked against the list.
    Keyed(HashMap<char, Vec<Candidate>>),
    Provider(Box<dyn Provider>),
}

impl fmt::Debug for ChoiceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(v) => f.debug_tuple("List").field(&v.len()).finish(),
            Self::Keyed(m) => {
                let mut keys: Vec<_> = m.keys().collect();
                keys.sort();
                f.debug_tuple("Keyed").field(&keys).finish()
            }
            Self::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

impl ChoiceSource {
    pub fn provider(p: impl Provider + 'static) -> Self {
        Self::Provider(Box::new(p))
    }

    /// Ask for candidates for `word`. The answer goes through `responder`.
    ///
    /// List and keyed sources answer before returning.
    pub fn suggest(&mut self, word: &str, limit: usize, responder: Responder) {
        match self {
            Self::List(choices) => responder.resolve(rank(word, choices, limit)),
            Self::Keyed(map) => {
                let mut chars = word.chars();
                let found = chars.next().and_then(|key| map.get(&key));
                match found {
                    Some(choices) => responder.resolve(rank(chars.as_str(), choices, limit)),
                    None => responder.resolve(Vec::new()),
                }
            }
            Self::Provider(p) => p.suggest(word, responder),
        }
    }
}

/// Build the case-insensitive matcher for `word`, ignoring non-word chars.
fn matcher(word: &str) -> Option<Regex> {
    let cleaned: String = word.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_').collect();
    RegexBuilder::new(&regex::escape(&cleaned)).case_insensitive(true).build().ok()
}

fn first_match(re: &Regex, s: &str) -> Option<usize> {
    re.find(s).map(|m| byte_to_char_index(s, m.start()))
}

/// Rank `choices` against `word`.
///
/// Keeps candidates whose title or subtitle contains the word, orders them by earliest
/// match index then title, and returns at most `limit` of them.
pub fn rank(word: &str, choices: &[Candidate], limit: usize) -> Vec<Candidate> {
    let Some(re) = matcher(word) else { return Vec::new(); };

    let mut hits: Vec<Candidate> = choices
        .iter()
        .filter_map(|c| {
            let in_title = first_match(&re, &c.title);
            let in_subtitle = c.subtitle.as_deref().and_then(|s| first_match(&re, s));
            let rank = match (in_title, in_subtitle) {
                (Some(t), Some(s)) => t.min(s),
                (Some(t), None) => t,
                (None, Some(s)) => s,
                (None, None) => return None,
            };
            let mut hit = c.clone();
            hit.rank = Some(rank);
            Some(hit)
        })
        .collect();

    hits.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.title.cmp(&b.title)));
    hits.truncate(limit);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn fruits() -> Vec<Candidate> {
        ["Apple", "Banana", "Grape"].iter().map(|t| Candidate::new(*t, *t)).collect()
    }

    fn titles(v: &[Candidate]) -> Vec<&str> {
        v.iter().map(|c| c.title.as_str()).collect()
    }

    /// Run `source` for `word` and collect the synchronous answer.
    fn ask(source: &mut ChoiceSource, word: &str) -> Vec<Candidate> {
        let (tx, rx) = mpsc::channel();
        source.suggest(word, DEFAULT_LIMIT, Responder::new(1, tx));
        rx.try_recv().expect("answered synchronously").result.expect("no error")
    }

    // ==================== list ranking tests ====================

    #[test]
    fn substring_match_is_case_insensitive() {
        assert_eq!(titles(&rank("an", &fruits(), DEFAULT_LIMIT)), vec!["Banana"]);
        assert_eq!(titles(&rank("AN", &fruits(), DEFAULT_LIMIT)), vec!["Banana"]);
    }

    #[test]
    fn ordered_by_match_index_then_title() {
        let ranked = rank("a", &fruits(), DEFAULT_LIMIT);
        assert_eq!(titles(&ranked), vec!["Apple", "Banana", "Grape"]);
        assert_eq!(ranked.iter().map(|c| c.rank).collect::<Vec<_>>(), vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn ties_broken_by_title() {
        let choices = vec![Candidate::new("beta", "b"), Candidate::new("alpha", "a")];
        assert_eq!(titles(&rank("", &choices, DEFAULT_LIMIT)), vec!["alpha", "beta"]);
    }

    #[test]
    fn subtitle_match_counts_and_minimum_wins() {
        let choices = vec![
            Candidate::new("Total", "t").with_subtitle("net price"),
            Candidate::new("Price", "p").with_subtitle("gross"),
            Candidate::new("Unrelated", "u"),
        ];
        let ranked = rank("price", &choices, DEFAULT_LIMIT);
        assert_eq!(titles(&ranked), vec!["Price", "Total"]);
        assert_eq!(ranked[1].rank, Some(4));
    }

    #[test]
    fn non_word_chars_are_ignored_in_query() {
        let choices = vec![Candidate::new("order_id", "o")];
        assert_eq!(titles(&rank("order-id", &choices, DEFAULT_LIMIT)), Vec::<&str>::new());
        assert_eq!(titles(&rank("der_i(", &choices, DEFAULT_LIMIT)), vec!["order_id"]);
    }

    #[test]
    fn never_more_than_limit() {
        let many: Vec<Candidate> = (0..50).map(|i| Candidate::new(format!("col{i:02}"), "v")).collect();
        let ranked = rank("col", &many, DEFAULT_LIMIT);
        assert_eq!(ranked.len(), 20);
        assert_eq!(ranked[0].title, "col00");
        assert_eq!(rank("col", &many, 5).len(), 5);
    }

    #[test]
    fn match_index_is_in_chars() {
        let choices = vec![Candidate::new("éé total", "v")];
        assert_eq!(rank("total", &choices, DEFAULT_LIMIT)[0].rank, Some(3));
    }

    // ==================== source dispatch tests ====================

    #[test]
    fn keyed_source_uses_prefix_and_ranks_remainder() {
        let mut map = HashMap::new();
        map.insert('.', fruits());
        map.insert('$', vec![Candidate::new("context.period.start", "$context.period.start")]);
        let mut source = ChoiceSource::Keyed(map);

        assert_eq!(titles(&ask(&mut source, ".gr")), vec!["Grape"]);
        assert_eq!(titles(&ask(&mut source, ".")), vec!["Apple", "Banana", "Grape"]);
        assert_eq!(titles(&ask(&mut source, "$per")), vec!["context.period.start"]);
    }

    #[test]
    fn keyed_source_without_key_gives_nothing() {
        let mut map = HashMap::new();
        map.insert('.', fruits());
        let mut source = ChoiceSource::Keyed(map);
        assert!(ask(&mut source, "apple").is_empty());
    }

    #[test]
    fn provider_results_are_not_reranked() {
        let mut source = ChoiceSource::provider(|_word: &str, responder: Responder| {
            responder.resolve(vec![Candidate::new("zzz", "z"), Candidate::new("aaa", "a")]);
        });
        assert_eq!(titles(&ask(&mut source, "q")), vec!["zzz", "aaa"]);
    }

    #[test]
    fn candidates_deserialize_without_optional_fields() {
        let c: Candidate = serde_json::from_str(r#"{"title":"Price","value":".price"}"#).unwrap();
        assert_eq!(c, Candidate::new("Price", ".price"));
    }
}
