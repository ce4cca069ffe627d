use crate::application::dtos::{
    AnswerDetail, ContextBlock, DiscussionInfo, MeetingInfo, QuestionDetail, SummaryInfo,
};
use crate::domain::{DomainError, Metadata, RetrievedChunk};

/// Placeholder rendered for metadata the entry does not carry.
pub const MISSING: &str = "N/A";

const SUMMARY_QUESTION_LABEL: &str = "Summary (Question): ";
const SUMMARY_ANSWER_LABEL: &str = "Summary (Answer): ";

/// Lay out retrieval hits as prompt context blocks, preserving rank order.
pub fn format_context(results: &[RetrievedChunk]) -> Vec<ContextBlock> {
    results.iter().map(context_block).collect()
}

/// JSON rendering of the blocks for the template's data slot.
pub fn serialize_context(blocks: &[ContextBlock]) -> Result<String, DomainError> {
    serde_json::to_string_pretty(blocks)
        .map_err(|err| DomainError::other(format!("failed to serialize context: {err}")))
}

/// Split a comma-joined keyword string into trimmed, non-empty tokens.
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn context_block(result: &RetrievedChunk) -> ContextBlock {
    let meta = &result.metadata;
    ContextBlock {
        meeting: MeetingInfo {
            date: field(meta, "date"),
            meeting_name: field(meta, "meeting_name"),
            committee: field(meta, "committee_name"),
            meeting_number: field(meta, "meeting_number"),
            session_number: field(meta, "session_number"),
            agenda: field(meta, "agenda"),
            law: field(meta, "law"),
        },
        discussion: DiscussionInfo {
            context: result.text.clone(),
            summary: SummaryInfo {
                question: labelled_line(&result.text, SUMMARY_QUESTION_LABEL),
                answer: labelled_line(&result.text, SUMMARY_ANSWER_LABEL),
            },
            question: QuestionDetail {
                name: field(meta, "questioner_name"),
                position: field(meta, "questioner_position"),
                content: field(meta, "question_comment"),
                keywords: keywords(meta, "question_keyword"),
            },
            answer: AnswerDetail {
                name: field(meta, "answerer_name"),
                position: field(meta, "answerer_position"),
                affiliation: field(meta, "answerer_affiliation"),
                content: field(meta, "answer_comment"),
                keywords: keywords(meta, "answer_keyword"),
            },
        },
    }
}

fn field(meta: &Metadata, key: &str) -> String {
    meta.get(key)
        .cloned()
        .unwrap_or_else(|| MISSING.to_string())
}

fn keywords(meta: &Metadata, key: &str) -> Vec<String> {
    meta.get(key)
        .map(|raw| split_keywords(raw))
        .unwrap_or_default()
}

/// Summaries live in the chunk text rather than the metadata mapping; a chunk
/// cut before the summary lines renders the placeholder. The normalizer writes
/// them last, so the scan runs from the end and ignores look-alike lines quoted
/// inside the context.
fn labelled_line(text: &str, label: &str) -> String {
    text.lines()
        .rev()
        .find_map(|line| line.strip_prefix(label))
        .map(str::to_string)
        .unwrap_or_else(|| MISSING.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::normalizer::normalize;
    use crate::domain::Record;
    use uuid::Uuid;

    fn hit(text: &str, metadata: Metadata) -> RetrievedChunk {
        RetrievedChunk {
            entry_id: Uuid::new_v4(),
            text: text.to_string(),
            metadata,
            score: 0.9,
        }
    }

    #[test]
    fn keyword_splitting_drops_empty_tokens() {
        assert_eq!(split_keywords("a,b,c"), ["a", "b", "c"]);
        assert!(split_keywords("").is_empty());
        assert_eq!(split_keywords("a,,b"), ["a", "b"]);
        assert_eq!(split_keywords(" 태풍 , 복구 ,"), ["태풍", "복구"]);
    }

    #[test]
    fn block_groups_metadata_and_summaries() {
        let record = Record::from_json_slice(
            r#"{
                "date": "2022-08-10",
                "committee_name": "행정안전위원회",
                "agenda": "수해 복구 지원",
                "questioner_name": "박위원",
                "question": {"comment": "지원 규모는?", "keyword": "수해,지원"},
                "answerer_name": "최차관",
                "answerer_affiliation": "행정안전부",
                "answer": {"comment": "특별교부세 집행", "keyword": ""},
                "context": "집중호우 피해 복구",
                "context_summary": {"summary_q": "규모 질의", "summary_a": "교부세 집행"}
            }"#
            .as_bytes(),
        )
        .unwrap();
        let doc = normalize(&record);

        let blocks = format_context(&[hit(&doc.content, doc.metadata)]);
        let block = &blocks[0];

        assert_eq!(block.meeting.agenda, "수해 복구 지원");
        assert_eq!(block.meeting.committee, "행정안전위원회");
        assert_eq!(block.meeting.law, "");
        assert_eq!(block.discussion.context, doc.content);
        assert_eq!(block.discussion.summary.question, "규모 질의");
        assert_eq!(block.discussion.summary.answer, "교부세 집행");
        assert_eq!(block.discussion.question.keywords, ["수해", "지원"]);
        assert!(block.discussion.answer.keywords.is_empty());
        assert_eq!(block.discussion.answer.affiliation, "행정안전부");
    }

    #[test]
    fn summary_lines_inside_context_do_not_shadow_real_summaries() {
        let record = Record::from_json_slice(
            r#"{
                "agenda": "수해",
                "context": "위원 발언 인용\nSummary (Question): 인용된 가짜 요약",
                "context_summary": {"summary_q": "실제 질의 요약", "summary_a": "실제 답변 요약"}
            }"#
            .as_bytes(),
        )
        .unwrap();
        let doc = normalize(&record);

        let block = &format_context(&[hit(&doc.content, doc.metadata)])[0];
        assert_eq!(block.discussion.summary.question, "실제 질의 요약");
        assert_eq!(block.discussion.summary.answer, "실제 답변 요약");
    }

    #[test]
    fn missing_metadata_renders_placeholder() {
        let blocks = format_context(&[hit("partial chunk text", Metadata::new())]);
        let block = &blocks[0];

        assert_eq!(block.meeting.date, MISSING);
        assert_eq!(block.meeting.meeting_name, MISSING);
        assert_eq!(block.discussion.summary.question, MISSING);
        assert_eq!(block.discussion.answer.name, MISSING);
        assert!(block.discussion.question.keywords.is_empty());
    }

    #[test]
    fn serialization_keeps_korean_labels_in_order() {
        let blocks = format_context(&[hit("text", Metadata::new())]);
        let json = serialize_context(&blocks).unwrap();

        let meeting = json.find("회의 정보").unwrap();
        let discussion = json.find("논의 정보").unwrap();
        assert!(meeting < discussion);
        assert!(json.find("날짜").unwrap() < json.find("법안").unwrap());
        assert!(json.contains("\"N/A\""));

        assert_eq!(serialize_context(&[]).unwrap(), "[]");
    }

    #[test]
    fn preserves_rank_order() {
        let first = hit("first", Metadata::from([("agenda".into(), "A".into())]));
        let second = hit("second", Metadata::from([("agenda".into(), "B".into())]));
        let agendas: Vec<String> = format_context(&[first, second])
            .into_iter()
            .map(|block| block.meeting.agenda)
            .collect();
        assert_eq!(agendas, ["A", "B"]);
    }
}
