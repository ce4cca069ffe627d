//! The grounding contract handed to the answering model.

/// Exact reply the model must give when the data does not support an answer.
pub const REFUSAL: &str = "제공된 데이터에서 관련 정보를 찾을 수 없습니다";

const CONTEXT_SLOT: &str = "{context}";
const QUESTION_SLOT: &str = "{question}";

/// Answer-only-from-data instructions with `{context}` and `{question}` slots.
pub const QUERY_TEMPLATE: &str = r#"
---역할---
당신은 제공된 데이터만을 참조하여 답변하는 국회회의록 분석 전문가입니다.
첫째, 국회의원이 과거 회의록을 검색하고 질의응답을 통해 더 나은 정책을 개발하는 등 의정활동을 지원하는 도구로 활용될 수 있습니다.
둘째, 국민이 정책 및 법안과 관련된 현안을 잘 이해할 수 있도록 도와 국민의 알권리를 보장하는 데 기여할 수 있습니다.

---원칙---
# '데이터'가 부족하거나 찾을 수 없는 경우 반드시 "제공된 데이터에서 관련 정보를 찾을 수 없습니다"라고 답변하세요.
# 제공된 '데이터'에 있는 사실만 사용하여 답변하세요.
# '데이터'에 없는 내용은 절대 추측하거나 생성하지 마세요.
# 모든 답변에는 반드시 메타데이터를 통한 근거를 제시하세요.
# 아래 '답변 형식'을 따르세요.

---데이터---
{context}

---답변 형식---
1. 답변 내용
- 데이터를 참조한 답변을 종합적으로 도출합니다. 회의 참여자의 발언을 인용하면 신뢰도가 더 상승합니다.

2. 근거 데이터
# 회의 정보에 대한 요약
- 가독성이 좋게 요약합니다.

# 논의 정보에 대한 요약
- 컨텍스트
- 요약
- 질문 상세
- 응답 상세


---질문---
{question}
"#;

/// Fill the template's slots in one pass.
///
/// Slot markers that appear inside `context` or `question` are left as text.
pub fn compose(context: &str, question: &str) -> String {
    let mut prompt = String::with_capacity(QUERY_TEMPLATE.len() + context.len() + question.len());
    let mut rest = QUERY_TEMPLATE;

    while let Some((pos, slot)) = next_slot(rest) {
        prompt.push_str(&rest[..pos]);
        prompt.push_str(if slot == CONTEXT_SLOT { context } else { question });
        rest = &rest[pos + slot.len()..];
    }
    prompt.push_str(rest);

    prompt
}

fn next_slot(text: &str) -> Option<(usize, &'static str)> {
    [CONTEXT_SLOT, QUESTION_SLOT]
        .into_iter()
        .filter_map(|slot| text.find(slot).map(|pos| (pos, slot)))
        .min_by_key(|(pos, _)| *pos)
}
