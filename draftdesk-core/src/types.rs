//! Domain types shared by the annotation engine, the API client, and the
//! history journal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::text::char_prefix;

/// Opaque annotation identity.
pub type AnnotationId = String; // UUID v4 text

/// A user-authored improvement suggestion anchored to `[start, end)` of one
/// fixed original string.
///
/// `text` is the literal substring captured when the annotation was created;
/// it is what the regeneration payload quotes back to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub id: AnnotationId,
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub suggestion: String,
}

impl Annotation {
    /// Builds an annotation with a fresh UUID v4 identity.
    pub fn new(
        start: usize,
        end: usize,
        text: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            start,
            end,
            text: text.into(),
            suggestion: suggestion.into(),
        }
    }

    /// True when `[start, end)` intersects this annotation's range.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        start < self.end && end > self.start
    }

    /// True when the char at `offset` lies inside this annotation.
    pub fn covers(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// A contiguous run of original text, derived on demand for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSegment<'a> {
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
    pub annotation: Option<&'a Annotation>,
}

/// The four kinds of content the generation service produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Tweet,
    Thread,
    Quote,
    Reply,
}

impl ContentType {
    /// Cycle order used by the request form.
    pub const ALL: [ContentType; 4] = [
        ContentType::Tweet,
        ContentType::Thread,
        ContentType::Quote,
        ContentType::Reply,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Tweet => "tweet",
            ContentType::Thread => "thread",
            ContentType::Quote => "quote",
            ContentType::Reply => "reply",
        }
    }

    /// Human label used for card titles.
    pub fn label(self) -> &'static str {
        match self {
            ContentType::Tweet => "Tweet",
            ContentType::Thread => "Thread",
            ContentType::Quote => "Quote",
            ContentType::Reply => "Reply",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tweet" => Ok(ContentType::Tweet),
            "thread" => Ok(ContentType::Thread),
            "quote" => Ok(ContentType::Quote),
            "reply" => Ok(ContentType::Reply),
            other => Err(format!("unknown content type '{other}'")),
        }
    }
}

/// Proposal body: one post, or an ordered thread of posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProposalContent {
    Text(String),
    Thread(Vec<String>),
}

impl ProposalContent {
    /// The posts in display order; a single post yields one item.
    pub fn items(&self) -> Vec<&str> {
        match self {
            ProposalContent::Text(text) => vec![text.as_str()],
            ProposalContent::Thread(items) => items.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_thread(&self) -> bool {
        matches!(self, ProposalContent::Thread(_))
    }
}

/// Projected change to one profile-health metric.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HealthImpact {
    #[serde(default)]
    pub metric: String,
    #[serde(default)]
    pub delta: f64,
    #[serde(default)]
    pub reason: String,
}

/// One generated content candidate. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub content: ProposalContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virality_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub virality_notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub health_impact: Vec<HealthImpact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub followup_formats: Vec<String>,
}

impl Proposal {
    pub fn new(content: ProposalContent) -> Self {
        Self {
            content,
            virality_score: None,
            virality_notes: Vec::new(),
            health_impact: Vec::new(),
            followup_formats: Vec::new(),
        }
    }
}

/// Proposals grouped by kind, as returned by both generation endpoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Proposals {
    #[serde(default)]
    pub quote: Vec<Proposal>,
    #[serde(default)]
    pub tweet: Vec<Proposal>,
    #[serde(default)]
    pub reply: Vec<Proposal>,
    #[serde(default)]
    pub thread: Vec<Proposal>,
}

impl Proposals {
    /// Display order of the card list.
    pub const ORDER: [ContentType; 4] = [
        ContentType::Quote,
        ContentType::Tweet,
        ContentType::Reply,
        ContentType::Thread,
    ];

    pub fn bucket(&self, kind: ContentType) -> &[Proposal] {
        match kind {
            ContentType::Quote => &self.quote,
            ContentType::Tweet => &self.tweet,
            ContentType::Reply => &self.reply,
            ContentType::Thread => &self.thread,
        }
    }

    fn bucket_mut(&mut self, kind: ContentType) -> &mut Vec<Proposal> {
        match kind {
            ContentType::Quote => &mut self.quote,
            ContentType::Tweet => &mut self.tweet,
            ContentType::Reply => &mut self.reply,
            ContentType::Thread => &mut self.thread,
        }
    }

    /// Every proposal with its kind, in card order.
    pub fn cards(&self) -> impl Iterator<Item = (ContentType, &Proposal)> {
        Self::ORDER
            .into_iter()
            .flat_map(move |kind| self.bucket(kind).iter().map(move |p| (kind, p)))
    }

    pub fn len(&self) -> usize {
        self.quote.len() + self.tweet.len() + self.reply.len() + self.thread.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Swaps in every bucket the regenerate response populated; buckets it
    /// left empty keep their current proposals.
    pub fn replace_with(&mut self, replacement: Proposals) {
        let mut replacement = replacement;
        for kind in Self::ORDER {
            let incoming = std::mem::take(replacement.bucket_mut(kind));
            if !incoming.is_empty() {
                *self.bucket_mut(kind) = incoming;
            }
        }
    }

    /// One-line summary: first 100 chars of the first proposal per kind.
    pub fn preview(&self) -> String {
        let labelled = [
            (ContentType::Quote, "QT"),
            (ContentType::Tweet, "Tweet"),
            (ContentType::Reply, "Reply"),
            (ContentType::Thread, "Thread"),
        ];
        let parts: Vec<String> = labelled
            .iter()
            .filter_map(|(kind, label)| {
                let first = self.bucket(*kind).first()?;
                let text = first.content.items().first().copied().unwrap_or("");
                let preview = char_prefix(text, 100);
                (!preview.is_empty()).then(|| format!("{label}: {preview}..."))
            })
            .collect();
        if parts.is_empty() {
            "No content generated".to_owned()
        } else {
            parts.join(" | ")
        }
    }
}

/// The tweet a generation run was inspired by.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OriginalTweet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet_id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub author_username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retweet_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_count: Option<u64>,
}

/// Terminal payload of a generation run (streaming or not).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_tweet: Option<OriginalTweet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default)]
    pub proposals: Proposals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_id: Option<String>,
}

/// Request-side facts recorded with each journal entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationMeta {
    pub username: String,
    pub tweet_url: Option<String>,
    pub prompt: Option<String>,
    pub content_type: ContentType,
}

/// One row of the history list; payloads stay on disk until opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySummary {
    pub id: String,
    pub username: String,
    pub tweet_url: Option<String>,
    pub content_type: ContentType,
    pub preview: String,
    /// Unix timestamp in seconds.
    pub created_at: i64,
}

/// A fully loaded journal entry.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub meta: GenerationMeta,
    pub result: GenerationResult,
    pub preview: String,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Proposal {
        Proposal::new(ProposalContent::Text(s.to_owned()))
    }

    #[test]
    fn content_deserializes_as_text_or_thread() {
        let single: Proposal = serde_json::from_str(r#"{"content":"hello"}"#).unwrap();
        assert_eq!(single.content, ProposalContent::Text("hello".into()));

        let thread: Proposal =
            serde_json::from_str(r#"{"content":["one","two"],"virality_score":7.5}"#).unwrap();
        assert!(thread.content.is_thread());
        assert_eq!(thread.content.items(), vec!["one", "two"]);
        assert_eq!(thread.virality_score, Some(7.5));
    }

    #[test]
    fn missing_buckets_default_to_empty() {
        let result: GenerationResult = serde_json::from_str(r#"{"proposals":{}}"#).unwrap();
        assert!(result.proposals.is_empty());
        assert!(result.research_id.is_none());
    }

    #[test]
    fn cards_follow_display_order() {
        let proposals = Proposals {
            tweet: vec![text("t")],
            quote: vec![text("q")],
            thread: vec![Proposal::new(ProposalContent::Thread(vec!["a".into()]))],
            reply: vec![],
        };
        let kinds: Vec<ContentType> = proposals.cards().map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            vec![ContentType::Quote, ContentType::Tweet, ContentType::Thread]
        );
    }

    #[test]
    fn replace_keeps_buckets_the_response_left_empty() {
        let mut shown = Proposals {
            quote: vec![text("old quote")],
            tweet: vec![text("old tweet")],
            ..Default::default()
        };
        shown.replace_with(Proposals {
            tweet: vec![text("new tweet")],
            ..Default::default()
        });
        assert_eq!(shown.quote, vec![text("old quote")]);
        assert_eq!(shown.tweet, vec![text("new tweet")]);
    }

    #[test]
    fn preview_summarises_each_kind() {
        let proposals = Proposals {
            quote: vec![text("quoted")],
            thread: vec![Proposal::new(ProposalContent::Thread(vec!["first".into()]))],
            ..Default::default()
        };
        assert_eq!(proposals.preview(), "QT: quoted... | Thread: first...");
        assert_eq!(Proposals::default().preview(), "No content generated");
    }

    #[test]
    fn content_type_cycles_and_parses() {
        assert_eq!(ContentType::Reply.next(), ContentType::Tweet);
        assert_eq!(ContentType::Tweet.prev(), ContentType::Reply);
        assert_eq!("Thread".parse::<ContentType>(), Ok(ContentType::Thread));
        assert!("poll".parse::<ContentType>().is_err());
    }
}
