//! Command-line interface for the EV market analysis agents

#![allow(clippy::print_stdout)]

mod report;

use agent_core::{Agent, AgentState, StateUpdate, state::keys};
use agent_ev::api::{HttpFetcher, SearchBackend, TavilyClient, WebContentFetcher, YahooPriceSource};
use agent_ev::tools::{self, DocumentLoader, FinanceDataTool, RecursiveCharacterTextSplitter};
use agent_ev::{
    ChatModel, CompanyAnalyzerAgent, EvConfig, Language, MarketResearcherAgent, Prompts,
    StockAnalyzerAgent,
};
use agent_llm::providers::{OpenAIConfig, OpenAIProvider};
use agent_llm::{EmbeddingProvider, LLMProvider};
use agent_tools::ToolRegistry;
use agent_utils::Settings;
use agent_workflow::Workflow;
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "ev-agent")]
#[command(about = "EV market research, company analysis and stock analysis", long_about = None)]
struct Cli {
    /// Report language ("en" or "ko"); overrides REPORT_LANGUAGE
    #[arg(short, long, global = true)]
    language: Option<String>,

    /// Write the final state as JSON to this file
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Research the EV market
    Market(RequestArgs),

    /// Analyse companies with retrieval over web documents
    Company {
        #[command(flatten)]
        request: RequestArgs,

        /// Companies to analyse, comma separated
        #[arg(short, long, value_delimiter = ',')]
        companies: Vec<String>,

        /// Save the vector index to this file
        #[arg(long)]
        index: Option<PathBuf>,
    },

    /// Analyse stock prices
    Stock {
        #[command(flatten)]
        request: RequestArgs,

        /// Tickers to analyse, comma separated
        #[arg(short, long, value_delimiter = ',')]
        tickers: Vec<String>,
    },

    /// Run market research, company analysis and stock analysis in order
    Pipeline {
        #[command(flatten)]
        request: RequestArgs,

        /// Stop at the first failing agent
        #[arg(long)]
        stop_on_error: bool,
    },

    /// Run a single EV market web search
    Search {
        /// Search query
        query: String,
    },

    /// Call a tool by name, or list the tools when no name is given
    Tool {
        /// Tool name, e.g. stock_data
        name: Option<String>,

        /// Parameters as a JSON object
        #[arg(default_value = "{}")]
        params: String,
    },
}

#[derive(Args)]
struct RequestArgs {
    /// Natural-language request
    #[arg(default_value = "")]
    request: String,
}

/// Clients shared by the agents
struct Services {
    config: EvConfig,
    prompts: Prompts,
    llm: Arc<dyn LLMProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    search: Arc<dyn SearchBackend>,
    fetcher: WebContentFetcher,
}

impl Services {
    fn new(settings: &Settings, language: Option<&str>) -> anyhow::Result<Self> {
        let mut config = EvConfig::from_settings(settings)?;
        if let Some(code) = language {
            config.language = Language::from_code(code);
        }

        let mut openai_config = OpenAIConfig::new(&settings.openai_api_key);
        if let Some(api_base) = &settings.openai_api_base {
            openai_config = openai_config.with_api_base(api_base);
        }
        let openai = Arc::new(OpenAIProvider::with_config(openai_config)?);

        let search = Arc::new(TavilyClient::new(
            &settings.tavily_api_key,
            config.search_max_results,
            config.search_rate_per_minute,
        ));
        let fetcher = WebContentFetcher::new(Arc::new(HttpFetcher::new(
            config.fetch_timeout,
            config.accept_invalid_certs,
        )?));

        Ok(Self {
            prompts: Prompts::new(config.language)?,
            llm: openai.clone(),
            embedder: openai,
            search,
            fetcher,
            config,
        })
    }

    fn chat(&self) -> ChatModel {
        ChatModel::from_config(Arc::clone(&self.llm), &self.config)
    }

    fn market_researcher(&self) -> MarketResearcherAgent {
        MarketResearcherAgent::new(
            Arc::clone(&self.search),
            self.fetcher.clone(),
            self.chat(),
            self.prompts.clone(),
            &self.config,
        )
    }

    fn company_analyzer(&self) -> CompanyAnalyzerAgent {
        let loader = DocumentLoader::new(Arc::clone(&self.search), self.fetcher.clone())
            .with_splitter(RecursiveCharacterTextSplitter::new(
                self.config.chunk_size,
                self.config.chunk_overlap,
            ))
            .with_max_urls(self.config.max_urls_per_company)
            .with_language(self.config.language);
        CompanyAnalyzerAgent::new(
            loader,
            Arc::clone(&self.embedder),
            self.chat(),
            self.prompts.clone(),
            &self.config,
        )
    }

    fn finance(&self) -> Arc<FinanceDataTool> {
        Arc::new(FinanceDataTool::from_config(
            Arc::new(YahooPriceSource::new()),
            &self.config,
        ))
    }

    fn stock_analyzer(&self) -> StockAnalyzerAgent {
        StockAnalyzerAgent::new(
            self.finance(),
            self.chat(),
            self.prompts.clone(),
            &self.config,
        )
    }

    fn tools(&self) -> ToolRegistry {
        tools::registry(
            Arc::clone(&self.search),
            self.finance(),
            self.config.language,
        )
    }
}

/// Initial state for a request, with optional list seeds
fn initial_state(request: &str, seeds: &[(&str, &[String])]) -> anyhow::Result<AgentState> {
    let mut state = AgentState::new().with_user_request(request);
    for (key, values) in seeds {
        if !values.is_empty() {
            state.apply(StateUpdate::new().set_typed(*key, values)?)?;
        }
    }
    Ok(state)
}

async fn run_agents(
    agents: Vec<Arc<dyn Agent>>,
    state: AgentState,
    stop_on_error: bool,
) -> anyhow::Result<AgentState> {
    let workflow = agents
        .into_iter()
        .fold(Workflow::builder(), |builder, agent| builder.add_agent(agent))
        .stop_on_error(stop_on_error)
        .build()?;
    info!(agents = ?workflow.agent_names(), "Running workflow");
    Ok(workflow.execute(state).await?)
}

fn save_json(path: &Path, value: &serde_json::Value) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("\nSaved result to {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::global()?;
    agent_utils::init_tracing_with_level(settings.tracing_level());
    info!(model = settings.llm_model.as_str(), "Starting ev-agent");

    let services = Services::new(settings, cli.language.as_deref())?;

    let result = match cli.command {
        Commands::Market(args) => {
            let state = initial_state(&args.request, &[])?;
            let agents: Vec<Arc<dyn Agent>> = vec![Arc::new(services.market_researcher())];
            let state = run_agents(agents, state, true).await?;
            report::print_market(&state);
            report::print_messages(&state);
            state.to_json()
        }
        Commands::Company {
            request,
            companies,
            index,
        } => {
            let state =
                initial_state(&request.request, &[(keys::COMPANIES, companies.as_slice())])?;
            let mut analyzer = services.company_analyzer();
            if let Some(path) = index {
                analyzer = analyzer.with_index_path(path);
            }
            let agents: Vec<Arc<dyn Agent>> = vec![Arc::new(analyzer)];
            let state = run_agents(agents, state, true).await?;
            report::print_companies(&state);
            report::print_messages(&state);
            state.to_json()
        }
        Commands::Stock { request, tickers } => {
            let state =
                initial_state(&request.request, &[(keys::TICKER_SYMBOLS, tickers.as_slice())])?;
            let agents: Vec<Arc<dyn Agent>> = vec![Arc::new(services.stock_analyzer())];
            let state = run_agents(agents, state, true).await?;
            report::print_stocks(&state);
            report::print_messages(&state);
            state.to_json()
        }
        Commands::Pipeline {
            request,
            stop_on_error,
        } => {
            let state = initial_state(&request.request, &[])?;
            let agents: Vec<Arc<dyn Agent>> = vec![
                Arc::new(services.market_researcher()),
                Arc::new(services.company_analyzer()),
                Arc::new(services.stock_analyzer()),
            ];
            let state = run_agents(agents, state, stop_on_error).await?;
            report::print_market(&state);
            report::print_companies(&state);
            report::print_stocks(&state);
            report::print_messages(&state);
            state.to_json()
        }
        Commands::Search { query } => {
            let result = services
                .tools()
                .execute("search_ev_market", json!({ "query": query }))
                .await?;
            if let Some(summary) = result["summary"].as_str() {
                println!("{summary}");
            }
            result
        }
        Commands::Tool { name: None, .. } => {
            let definitions = services.tools().definitions();
            for definition in &definitions {
                println!("{}\n    {}\n", definition.name, definition.description);
            }
            serde_json::to_value(definitions)?
        }
        Commands::Tool {
            name: Some(name),
            params,
        } => {
            let params: serde_json::Value =
                serde_json::from_str(&params).context("Tool parameters must be JSON")?;
            let result = services.tools().execute(&name, params).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            result
        }
    };

    if let Some(path) = cli.output {
        save_json(&path, &result)?;
    }
    Ok(())
}
