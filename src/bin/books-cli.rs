use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "books-cli")]
#[command(about = "Command-line client for the OData book catalogue", long_about = None)]
struct Cli {
    /// Service root of the catalogue.
    #[arg(short, long, default_value = "http://localhost:8080/odata")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List books, optionally with query options
    List(ListOptions),
    /// Show one book
    Get {
        id: i32,
        #[arg(long)]
        expand: Option<String>,
    },
    /// Show the main author of a book
    MainAuthor { id: i32 },
    /// Show the highest book id
    MostRecent,
    /// Rate a book (the rating is not stored)
    Rate { id: i32, rating: i32 },
    /// List books for kids
    Kids,
    /// List the authors of a book
    Authors { id: i32 },
    /// List the translators of a book
    Translators { id: i32 },
}

#[derive(Args)]
struct ListOptions {
    #[arg(long)]
    filter: Option<String>,
    #[arg(long)]
    orderby: Option<String>,
    #[arg(long)]
    top: Option<usize>,
    #[arg(long)]
    skip: Option<usize>,
    #[arg(long)]
    select: Option<String>,
    #[arg(long)]
    expand: Option<String>,
    /// Include `@odata.count`
    #[arg(long)]
    count: bool,
}

impl ListOptions {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(filter) = &self.filter {
            query.push(("$filter", filter.clone()));
        }
        if let Some(orderby) = &self.orderby {
            query.push(("$orderby", orderby.clone()));
        }
        if let Some(top) = self.top {
            query.push(("$top", top.to_string()));
        }
        if let Some(skip) = self.skip {
            query.push(("$skip", skip.to_string()));
        }
        if let Some(select) = &self.select {
            query.push(("$select", select.clone()));
        }
        if let Some(expand) = &self.expand {
            query.push(("$expand", expand.clone()));
        }
        if self.count {
            query.push(("$count", "true".to_string()));
        }
        query
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let root = cli.url.trim_end_matches('/');

    let request = match &cli.command {
        Commands::List(options) => client
            .get(format!("{root}/Books"))
            .query(&options.to_query()),
        Commands::Get { id, expand } => {
            let request = client.get(format!("{root}/Books({id})"));
            match expand {
                Some(expand) => request.query(&[("$expand", expand)]),
                None => request,
            }
        }
        Commands::MainAuthor { id } => client.get(format!("{root}/Books({id})/MainAuthor")),
        Commands::MostRecent => client.get(format!("{root}/Books/MostRecent()")),
        Commands::Rate { id, rating } => client
            .post(format!("{root}/Books({id})/Rate"))
            .json(&json!({ "Rating": rating })),
        Commands::Kids => client.get(format!("{root}/ReturnAllForKidsBooks()")),
        Commands::Authors { id } => client.get(format!("{root}/Books({id})/Authors")),
        Commands::Translators { id } => client.get(format!("{root}/Books({id})/Translators")),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let json: Value = res.json().await.unwrap_or(Value::Null);

    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Some(message) = json["error"]["message"].as_str() {
            eprintln!("{}", message);
        }
        std::process::exit(1);
    }

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
