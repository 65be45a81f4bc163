//! Stock analysis prompts

use agent_prompt::PromptTemplate;

pub const STOCK_SYSTEM: &str = "stock_system";
pub const STOCK_USER: &str = "stock_user";
pub const TICKER_EXTRACTION: &str = "ticker_extraction";
pub const STOCK_DATA_BLOCK: &str = "stock_data_block";

const SYSTEM_EN: &str = "\
You are an equity analyst specialising in electric vehicle and battery stocks.
Interpret price levels, volume and technical indicators for the user, compare
the companies where several are given, and point out the main risks.
Write in Markdown. Base every statement on the data provided; this is not
investment advice.";

const SYSTEM_KO: &str = "\
당신은 전기차 및 배터리 종목을 전문으로 하는 주식 애널리스트입니다.
가격 수준, 거래량, 기술적 지표를 사용자에게 해석해 주고, 여러 종목이 주어지면 비교하며,
주요 리스크를 짚어 주세요. Markdown으로 작성하고 모든 내용은 제공된 데이터에 근거하세요.
투자 권유가 아님을 밝혀 주세요.";

const USER_EN: &str = "\
# User request
{{ query }}

# Collected stock data
{{ data }}

Answer the user's question based on the data above.";

const USER_KO: &str = "\
# 사용자 요청
{{ query }}

# 수집된 주식 데이터
{{ data }}

위 데이터를 바탕으로 사용자의 질문에 답변해주세요.";

const EXTRACTION_EN: &str = "\
Extract the stocks mentioned in the user question and convert them to ticker symbols.

# Main EV / battery tickers
- Tesla: TSLA
- BYD: 1211.HK
- LG Energy Solution: 373220
- Samsung SDI: 006400
- SK Hynix: 000660
- Hyundai Motor: 005380
- Kia: 000270
- POSCO Future M: 003670

# User question
{{ query }}

# Output format
Output only the tickers separated by commas, without any explanation.
Example: TSLA,373220,006400";

const EXTRACTION_KO: &str = "\
사용자 질문에서 주식 종목을 추출하고 티커 심볼로 변환하세요.

# 주요 전기차/배터리 기업 티커
- 테슬라: TSLA
- BYD: 1211.HK
- LG에너지솔루션: 373220
- 삼성SDI: 006400
- SK하이닉스: 000660
- 현대차: 005380
- 기아: 000270
- 포스코퓨처엠: 003670

# 사용자 질문
{{ query }}

# 출력 형식
티커만 콤마로 구분하여 출력하세요. 설명 없이 티커만.
예: TSLA,373220,006400";

const DATA_BLOCK_EN: &str = "\
## {{ company_name }} ({{ ticker }})

**Price**
- Current price: {{ current_price }}
- Change vs previous close: {{ change }} ({{ change_pct }})
- Period high: {{ period_high }}
- Period low: {{ period_low }}
- Period average: {{ avg_price }}

**Volume**
- Latest volume: {{ recent_volume }}
- Average volume: {{ avg_volume }}
- Volume change: {{ volume_change }}

**Technicals**
- Trend: {{ trend }}
- Volatility: {{ volatility }}
- 20-day moving average: {{ ma20 }}
- 60-day moving average: {{ ma60 }}

**Data period**: {{ period }}";

const DATA_BLOCK_KO: &str = "\
## {{ company_name }} ({{ ticker }})

**가격 정보**
- 현재가: {{ current_price }}
- 전일 대비: {{ change }} ({{ change_pct }})
- 기간 최고가: {{ period_high }}
- 기간 최저가: {{ period_low }}
- 기간 평균가: {{ avg_price }}

**거래량**
- 최근 거래량: {{ recent_volume }}
- 평균 거래량: {{ avg_volume }}
- 거래량 변화: {{ volume_change }}

**기술적 분석**
- 추세: {{ trend }}
- 변동성: {{ volatility }}
- 20일 이동평균: {{ ma20 }}
- 60일 이동평균: {{ ma60 }}

**데이터 기간**: {{ period }}";

pub(crate) fn templates() -> Vec<PromptTemplate> {
    vec![
        PromptTemplate::bilingual(STOCK_SYSTEM, SYSTEM_EN, SYSTEM_KO),
        PromptTemplate::bilingual(STOCK_USER, USER_EN, USER_KO),
        PromptTemplate::bilingual(TICKER_EXTRACTION, EXTRACTION_EN, EXTRACTION_KO),
        PromptTemplate::bilingual(STOCK_DATA_BLOCK, DATA_BLOCK_EN, DATA_BLOCK_KO),
    ]
}
