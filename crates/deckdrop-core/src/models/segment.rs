use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Segmentation strategy, selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One segment per blank-line separated paragraph
    #[default]
    Paragraph,
    /// One segment per detected heading and the lines under it
    Topic,
    /// Fixed-size word chunks
    Length,
    /// One segment per frequent keyword, gathering the sentences that mention it
    Keyword,
}

impl FromStr for Strategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "paragraph" => Ok(Strategy::Paragraph),
            "topic" => Ok(Strategy::Topic),
            "length" => Ok(Strategy::Length),
            "keyword" => Ok(Strategy::Keyword),
            _ => Err(anyhow::anyhow!("Unknown segmentation strategy: {}", s)),
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Strategy::Paragraph => write!(f, "paragraph"),
            Strategy::Topic => write!(f, "topic"),
            Strategy::Length => write!(f, "length"),
            Strategy::Keyword => write!(f, "keyword"),
        }
    }
}

/// Which strategy produced a segment.
///
/// Mirrors [`Strategy`] one-to-one; kept separate so a segment never claims to be
/// produced by a strategy that fell back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Paragraph,
    Topic,
    Length,
    Keyword,
}

impl From<Strategy> for SegmentKind {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Paragraph => SegmentKind::Paragraph,
            Strategy::Topic => SegmentKind::Topic,
            Strategy::Length => SegmentKind::Length,
            Strategy::Keyword => SegmentKind::Keyword,
        }
    }
}

/// One titled chunk of content destined for one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub title: String,
    pub body: String,
    /// 1-based, contiguous within one segmentation run
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

/// Output of one segmentation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationResult {
    /// Strategy that actually produced `segments` (paragraph after a fallback)
    pub strategy: Strategy,
    pub requested_strategy: Strategy,
    pub total_words: usize,
    pub total_paragraphs: usize,
    pub segments: Vec<Segment>,
    /// Segments plus one title slide
    pub estimated_slide_count: usize,
}

impl SegmentationResult {
    pub fn fell_back(&self) -> bool {
        self.strategy != self.requested_strategy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!("Topic".parse::<Strategy>().unwrap(), Strategy::Topic);
        assert_eq!(" keyword ".parse::<Strategy>().unwrap(), Strategy::Keyword);
        assert!("sentences".parse::<Strategy>().is_err());
    }

    #[test]
    fn segment_omits_missing_keyword_when_serialized() {
        let segment = Segment {
            kind: SegmentKind::Paragraph,
            title: "Intro".to_string(),
            body: "Intro".to_string(),
            index: 1,
            keyword: None,
        };
        let json = serde_json::to_value(&segment).unwrap();
        assert_eq!(json["kind"], "paragraph");
        assert!(json.get("keyword").is_none());
    }
}
