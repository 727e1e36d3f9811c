use color_eyre::eyre::{
    Result,
    eyre,
};
use punter_profile::client;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: punter-profile [--api-url <url>]\n\
         \n\
         Flags:\n\
           --api-url <url>  Base URL of the betting backend (default {})",
        client::DEFAULT_API_URL,
    );
    std::process::exit(0);
}

fn parse_cli_args() -> Result<client::AppConfig> {
    let mut args = std::env::args().skip(1);
    let mut api_url: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--api-url" => {
                let url = args
                    .next()
                    .ok_or_else(|| eyre!("--api-url requires a URL argument"))?;
                if api_url.is_some() {
                    return Err(eyre!("--api-url may only be specified once"));
                }
                api_url = Some(url);
            }
            "--help" | "-h" => print_usage_and_exit(),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    Ok(client::AppConfig {
        base_url: api_url.unwrap_or_else(|| client::DEFAULT_API_URL.to_string()),
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    // the terminal belongs to the UI; logs go to a file
    let file_appender = rolling::daily("logs", "punter-profile.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .init();
    tracing::info!("starting punter-profile client");
    let config = parse_cli_args()?;
    client::run_app(config).await
}
