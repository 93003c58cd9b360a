use std::io::Read;

use anyhow::{bail, Context};
use clap::Parser;

use vecgraph::sql_generator::{translate_to_sql_with_config, Params, SqlProgram};
use vecgraph::{config::CompilerConfig, parse_query};

/// vecgraph - Cypher-to-SQL compiler for an RDF-style knowledge graph
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Cypher query text; reads stdin when omitted
    query: Option<String>,

    /// Query parameters as a JSON object, e.g. '{"limit": 10}'
    #[arg(long)]
    params: Option<String>,

    /// Schema prefix for table references (overrides VECGRAPH_SCHEMA_PREFIX)
    #[arg(long)]
    schema_prefix: Option<String>,

    /// Print the full SQL program as JSON instead of plain statements
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let mut config = CompilerConfig::from_env().context("invalid compiler configuration")?;
    if let Some(prefix) = cli.schema_prefix {
        config.schema_prefix = prefix;
    }

    let query_text = match cli.query {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read query from stdin")?;
            buffer
        }
    };
    if query_text.trim().is_empty() {
        bail!("no query given (pass it as an argument or on stdin)");
    }

    let params: Option<Params> = match cli.params {
        Some(text) => Some(serde_json::from_str(&text).context("--params must be a JSON object")?),
        None => None,
    };

    let query = parse_query(&query_text).map_err(|err| anyhow::anyhow!("{}", err))?;
    let program = translate_to_sql_with_config(&query, params.as_ref(), &config)
        .map_err(|err| anyhow::anyhow!("{}", err))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&program)?);
    } else {
        print_program(&program);
    }
    Ok(())
}

fn print_program(program: &SqlProgram) {
    let statements = program.statements();
    if program.is_transactional {
        println!("-- transactional program ({} statements)", statements.len());
    }
    for (index, statement) in statements.iter().enumerate() {
        if statements.len() > 1 {
            println!("-- statement {}", index + 1);
        }
        println!("{};", statement);
    }
    let params = program.all_parameters();
    if !params.is_empty() {
        let rendered = serde_json::Value::Array(params.into_iter().cloned().collect());
        println!("-- parameters: {}", rendered);
    }
}
