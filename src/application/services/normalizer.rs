use crate::domain::{Metadata, NormalizedDocument, Record};

/// Flatten a record into embeddable text plus its 16-key metadata mapping.
pub fn normalize(record: &Record) -> NormalizedDocument {
    NormalizedDocument {
        content: document_content(record),
        metadata: document_metadata(record),
    }
}

fn document_content(record: &Record) -> String {
    [
        format!("Agenda: {}", record.agenda),
        format!("Context: {}", record.context),
        format!("Summary (Question): {}", record.context_summary.summary_q),
        format!("Summary (Answer): {}", record.context_summary.summary_a),
    ]
    .join("\n")
}

fn document_metadata(record: &Record) -> Metadata {
    [
        ("date", &record.date),
        ("meeting_name", &record.meeting_name),
        ("committee_name", &record.committee_name),
        ("meeting_number", &record.meeting_number),
        ("session_number", &record.session_number),
        ("agenda", &record.agenda),
        ("law", &record.law),
        ("questioner_name", &record.questioner_name),
        ("questioner_position", &record.questioner_position),
        ("question_comment", &record.question.comment),
        ("question_keyword", &record.question.keyword),
        ("answerer_name", &record.answerer_name),
        ("answerer_affiliation", &record.answerer_affiliation),
        ("answerer_position", &record.answerer_position),
        ("answer_comment", &record.answer.comment),
        ("answer_keyword", &record.answer.keyword),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.clone()))
    .collect()
}
