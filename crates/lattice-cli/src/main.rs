use clap::{ArgAction, Parser, Subcommand};
use lattice_client::{ApiClient, ClientConfig, configure};
use lattice_core::{ApiResponse, Entity, ResourceObject, ResponseData, TypeKey, TypeRegistry};
use serde_json::{Value, json};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lattice")]
#[command(about = "Fetch and hydrate resources from a JSON:API server")]
struct Cli {
    /// Overrides LATTICE_API_BASE_URL.
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Overrides LATTICE_API_TOKEN.
    #[arg(long, global = true)]
    token: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Get(GetArgs),
}

#[derive(clap::Args, Debug)]
struct GetArgs {
    /// Path relative to the base URL, or an absolute URL.
    path: String,
    /// Wire type to hydrate; defaults to the first path segment.
    #[arg(long = "type")]
    wire_type: Option<String>,
    /// Number of pages to follow through `links.next`.
    #[arg(long, default_value_t = 1)]
    pages: usize,
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = client_config(cli.base_url, cli.token);
    let result = match cli.command {
        Commands::Get(args) => get_command(config, args).await,
    };

    match result {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(1)
        }
    }
}

fn client_config(base_url: Option<String>, token: Option<String>) -> ClientConfig {
    let mut config = ClientConfig::from_env();
    if let Some(base_url) = base_url {
        config.base_url = base_url;
    }
    if token.is_some() {
        config.token = token;
    }
    config
}

async fn get_command(config: ClientConfig, args: GetArgs) -> Result<ExitCode, String> {
    let wire_type = match args.wire_type {
        Some(wire_type) => wire_type,
        None => wire_type_from_path(&args.path)
            .ok_or_else(|| format!("cannot infer a resource type from '{}'", args.path))?,
    };
    let type_key = TypeKey::of::<ResourceObject>(wire_type);
    let client = build_client(config, type_key.clone())?;

    let mut response = client
        .get_path(&type_key, &args.path)
        .await
        .map_err(|error| error.to_string())?;
    let mut collected = Vec::new();
    for page in 1..=args.pages.max(1) {
        if !response.ok {
            return Err(format!(
                "request failed with status {}: {}",
                response.status,
                response.error.as_deref().unwrap_or("unknown error")
            ));
        }
        collected.extend(render_response(&response));
        if page == args.pages.max(1) {
            break;
        }
        let Some(next) = response.next_page() else {
            break;
        };
        response = next.await.map_err(|error| error.to_string())?;
    }

    if args.json {
        let rendered = serde_json::to_string_pretty(&Value::Array(collected))
            .map_err(|error| error.to_string())?;
        println!("{rendered}");
    } else {
        for item in &collected {
            println!("{}", summary_line(item));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn build_client(config: ClientConfig, type_key: TypeKey) -> Result<ApiClient, String> {
    configure(
        Arc::new(move |registry: &TypeRegistry| {
            registry.register(&type_key);
        }),
        config,
    )
    .map_err(|error| error.to_string())
}

fn wire_type_from_path(path: &str) -> Option<String> {
    let path = path
        .split_once("://")
        .map(|(_, rest)| rest.split_once('/').map_or("", |(_, path)| path))
        .unwrap_or(path);
    path.split(['?', '#'])
        .next()
        .unwrap_or_default()
        .split('/')
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

fn render_response(response: &ApiResponse) -> Vec<Value> {
    match &response.data {
        ResponseData::Raw(value) => vec![value.clone()],
        _ => response
            .many::<ResourceObject>()
            .into_iter()
            .map(render_resource)
            .collect(),
    }
}

fn render_resource(resource: &ResourceObject) -> Value {
    json!({
        "type": resource.type_name().unwrap_or_default(),
        "id": resource.id().unwrap_or_default(),
        "attributes": resource.attributes(),
        "relationships": resource.relationships(),
    })
}

fn summary_line(item: &Value) -> String {
    match (
        item.get("type").and_then(Value::as_str),
        item.get("id").and_then(Value::as_str),
    ) {
        (Some(resource_type), Some(id)) => {
            let attributes = item.get("attributes").cloned().unwrap_or(Value::Null);
            format!("{resource_type}/{id} {attributes}")
        }
        _ => item.to_string(),
    }
}
