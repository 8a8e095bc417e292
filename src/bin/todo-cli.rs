use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "todo-cli")]
#[command(about = "Command-line client for the task list service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:43524")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every task
    List,
    /// Show one task
    Get { id: String },
    /// Create a task
    Add { title: String },
    /// Replace a task's title and completion flag
    Update {
        id: String,
        title: String,
        #[arg(long)]
        completed: bool,
    },
    /// Remove a task
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::List => client.get(format!("{base}/todos")).send().await?,
        Commands::Get { id } => client.get(format!("{base}/todos/{id}")).send().await?,
        Commands::Add { title } => {
            client
                .post(format!("{base}/todos"))
                .json(&json!({ "title": title }))
                .send()
                .await?
        }
        Commands::Update { id, title, completed } => {
            client
                .put(format!("{base}/todos/{id}"))
                .json(&json!({ "title": title, "completed": completed }))
                .send()
                .await?
        }
        Commands::Delete { id } => client.delete(format!("{base}/todos/{id}")).send().await?,
    };
    print_response(res).await?;

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }

    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
