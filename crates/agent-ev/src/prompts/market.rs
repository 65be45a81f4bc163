//! Market research prompts

use agent_prompt::PromptTemplate;

pub const MARKET_SYSTEM: &str = "market_system";
pub const MARKET_SYNTHESIS: &str = "market_synthesis";

const SYSTEM_EN: &str = "\
You are a senior analyst covering the global electric vehicle industry.
You read news, research notes and company material and turn them into a
balanced, evidence-based market assessment. Quote figures only when the
documents support them and say so when information is missing.";

const SYSTEM_KO: &str = "\
당신은 글로벌 전기차 산업을 담당하는 시니어 애널리스트입니다.
뉴스, 리서치 자료, 기업 자료를 읽고 근거에 기반한 균형 잡힌 시장 평가를 작성합니다.
수치는 문서에 근거가 있을 때만 인용하고, 정보가 부족하면 그렇다고 밝히세요.";

const SYNTHESIS_EN: &str = r#"Analyse the documents below and write an EV market report.

# Documents
{{ documents }}

# Sources
{{ sources }}

Answer with a single JSON object in a ```json block, using exactly these fields:
{
  "summary": "overall market summary (3-5 sentences)",
  "market_size": "current market size, or null",
  "growth_rate": "expected growth rate",
  "key_companies": ["company names"],
  "key_trends": [{"title": "", "description": "", "impact": "positive|negative|neutral"}],
  "opportunities": ["market opportunities"],
  "risks": [{"title": "", "description": "", "severity": "high|medium|low"}],
  "battery_supply_chain": "state of the battery supply chain"
}"#;

const SYNTHESIS_KO: &str = r#"아래 문서를 분석하여 전기차 시장 보고서를 작성하세요.

# 문서
{{ documents }}

# 출처
{{ sources }}

```json 블록 안에 하나의 JSON 객체로 답하고, 정확히 다음 필드를 사용하세요:
{
  "summary": "시장 전체 요약 (3-5문장)",
  "market_size": "현재 시장 규모 또는 null",
  "growth_rate": "예상 성장률",
  "key_companies": ["기업명"],
  "key_trends": [{"title": "", "description": "", "impact": "긍정적|부정적|중립적"}],
  "opportunities": ["시장 기회"],
  "risks": [{"title": "", "description": "", "severity": "높음|중간|낮음"}],
  "battery_supply_chain": "배터리 공급망 현황"
}"#;

pub(crate) fn templates() -> Vec<PromptTemplate> {
    vec![
        PromptTemplate::bilingual(MARKET_SYSTEM, SYSTEM_EN, SYSTEM_KO),
        PromptTemplate::bilingual(MARKET_SYNTHESIS, SYNTHESIS_EN, SYNTHESIS_KO),
    ]
}
