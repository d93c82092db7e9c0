use clap::Parser;
use url::Url;

use sso_request::snapshot::{group_pairs, IdentityClaim, QueryParameters, RequestSnapshot};

#[derive(Parser)]
#[command(name = "snapshot-cli")]
#[command(about = "Build a request snapshot offline and print it as JSON", long_about = None)]
struct Cli {
    /// Http method of the request.
    #[arg(short, long, default_value = "GET")]
    method: String,

    /// Full requested url.
    #[arg(short, long)]
    url: Url,

    /// Path the application is mounted under.
    #[arg(short, long, default_value = "/")]
    app_path: String,

    /// Form field as name=value; repeat a name to submit it twice.
    #[arg(short, long = "form", value_parser = parse_pair)]
    form: Vec<(String, String)>,

    /// Name identifier of the signed-in user.
    #[arg(long)]
    name_id: Option<String>,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{s}'"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let query = QueryParameters::from_url(&cli.url);
    let mut builder = RequestSnapshot::builder(cli.method, cli.url)
        .application_path(cli.app_path)
        .query_parameters(query);
    if !cli.form.is_empty() {
        builder = builder.form_data(group_pairs(cli.form));
    }
    if let Some(name_id) = cli.name_id {
        builder = builder.identity_claim(IdentityClaim::name_identifier(name_id));
    }

    let snapshot = builder.build()?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
