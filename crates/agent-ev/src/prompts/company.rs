//! Company analysis prompts: RAG answering, fixed questions, summary

use agent_prompt::PromptTemplate;

pub const RAG_STUFF: &str = "rag_stuff";
pub const COMPANY_SUMMARY: &str = "company_summary";

/// Topic label and template name of each fixed company question
pub const COMPANY_QUESTIONS: [(&str, &str); 5] = [
    ("strategy", "company_q_strategy"),
    ("products", "company_q_products"),
    ("partnerships", "company_q_partnerships"),
    ("technology", "company_q_technology"),
    ("risks", "company_q_risks"),
];

const RAG_STUFF_EN: &str = "\
Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.

{{ context }}

Question: {{ question }}
Helpful Answer:";

const RAG_STUFF_KO: &str = "\
아래 자료를 참고하여 마지막 질문에 답하세요. \
답을 모르면 모른다고 답하고, 답을 지어내지 마세요.

{{ context }}

질문: {{ question }}
답변:";

const QUESTIONS: [(&str, &str); 5] = [
    (
        "What is {{ company }}'s main business strategy for 2024-2025?",
        "{{ company }}의 2024-2025년 주요 사업 전략은?",
    ),
    (
        "What is {{ company }}'s core product lineup?",
        "{{ company }}의 핵심 제품 라인업은?",
    ),
    (
        "What are {{ company }}'s key partnerships and collaborations?",
        "{{ company }}의 주요 파트너십과 협력 관계는?",
    ),
    (
        "What are {{ company }}'s technical strengths and differentiators?",
        "{{ company }}의 기술적 강점과 차별화 요소는?",
    ),
    (
        "What are the main risks and challenges {{ company }} faces?",
        "{{ company }}가 직면한 주요 리스크와 도전과제는?",
    ),
];

const SUMMARY_EN: &str = "\
Here is the information collected about {{ company }}:

{% for qa in answers %}**{{ qa.topic }}**
{{ qa.answer }}

{% endfor %}
Based on this information, summarise {{ company }}'s current position under these headings:

1. Company overview (2-3 sentences)
2. Core strengths (3-5 bullet points)
3. Main weaknesses / risks (3-5 bullet points)
4. 2025 outlook (2-3 sentences)

Keep each heading clearly separated.";

const SUMMARY_KO: &str = "\
다음은 {{ company }}에 대해 수집한 정보입니다:

{% for qa in answers %}**{{ qa.topic }}**
{{ qa.answer }}

{% endfor %}
위 정보를 바탕으로 {{ company }}의 현황을 다음 항목으로 요약해주세요:

1. 회사 개요 (2-3문장)
2. 핵심 강점 (3-5개 bullet points)
3. 주요 약점/리스크 (3-5개 bullet points)
4. 2025년 전망 (2-3문장)

각 항목을 명확하게 구분하여 작성해주세요.";

pub(crate) fn templates() -> Vec<PromptTemplate> {
    let mut templates = vec![
        PromptTemplate::bilingual(RAG_STUFF, RAG_STUFF_EN, RAG_STUFF_KO),
        PromptTemplate::bilingual(COMPANY_SUMMARY, SUMMARY_EN, SUMMARY_KO),
    ];
    for ((_, name), (english, korean)) in COMPANY_QUESTIONS.iter().zip(QUESTIONS) {
        templates.push(PromptTemplate::bilingual(*name, english, korean));
    }
    templates
}
