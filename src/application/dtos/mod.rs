use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One retrieved chunk laid out for the prompt's data section.
///
/// Field names are the Korean labels the answering model sees; their order is
/// the serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBlock {
    #[serde(rename = "회의 정보")]
    pub meeting: MeetingInfo,
    #[serde(rename = "논의 정보")]
    pub discussion: DiscussionInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingInfo {
    #[serde(rename = "날짜")]
    pub date: String,
    #[serde(rename = "회의 이름")]
    pub meeting_name: String,
    #[serde(rename = "위원회")]
    pub committee: String,
    #[serde(rename = "회의 번호")]
    pub meeting_number: String,
    #[serde(rename = "세션 번호")]
    pub session_number: String,
    #[serde(rename = "안건")]
    pub agenda: String,
    #[serde(rename = "법안")]
    pub law: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionInfo {
    #[serde(rename = "Context")]
    pub context: String,
    #[serde(rename = "요약")]
    pub summary: SummaryInfo,
    #[serde(rename = "질문 상세")]
    pub question: QuestionDetail,
    #[serde(rename = "응답 상세")]
    pub answer: AnswerDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryInfo {
    #[serde(rename = "Summary (Question)")]
    pub question: String,
    #[serde(rename = "Summary (Answer)")]
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDetail {
    #[serde(rename = "질의자")]
    pub name: String,
    #[serde(rename = "직위")]
    pub position: String,
    #[serde(rename = "내용")]
    pub content: String,
    #[serde(rename = "키워드")]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerDetail {
    #[serde(rename = "응답자")]
    pub name: String,
    #[serde(rename = "직위")]
    pub position: String,
    #[serde(rename = "소속")]
    pub affiliation: String,
    #[serde(rename = "내용")]
    pub content: String,
    #[serde(rename = "키워드")]
    pub keywords: Vec<String>,
}

/// A record file the index builder skipped, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of one index build run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildReport {
    pub files_seen: usize,
    pub documents_processed: usize,
    pub failed_files: Vec<FileFailure>,
    pub chunks_total: usize,
    pub chunks_indexed: usize,
    pub batches_committed: usize,
    /// 1-based indices of batches that failed to commit.
    pub failed_batches: Vec<usize>,
}

impl BuildReport {
    pub fn is_empty(&self) -> bool {
        self.files_seen == 0
    }
}

/// Every intermediate product of answering one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub question: String,
    pub context: Vec<ContextBlock>,
    pub prompt: String,
    pub answer: String,
}
