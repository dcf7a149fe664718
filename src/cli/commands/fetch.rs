//! Fetch command - request a resource the way a controlled page would

use crate::cli::args::FetchArgs;
use crate::cli::CommandContext;
use crate::error::{PrecacheError, PrecacheResult};
use crate::http::{self, Request, Response};
use crate::worker::ResponseSource;
use console::style;
use std::io::{self, Write};
use tokio::fs;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, ctx: &CommandContext) -> PrecacheResult<()> {
    let mut registration = ctx.registration().await?;

    // Relative URLs follow the active manager's scope, falling back to config
    let scope = registration
        .record()
        .map(|r| r.scope.clone())
        .unwrap_or_else(|| ctx.config.worker.scope.clone());
    let url = http::resolve_url(&scope, &args.url)?;
    let request = args
        .headers
        .iter()
        .try_fold(Request::new(&args.method, url), |request, header| {
            let (name, value) = parse_header(header)?;
            Ok::<_, PrecacheError>(request.with_header(name, value))
        })?;

    let client = registration.open_client();
    let outcome = registration.fetch(client, &request).await;
    registration.close_client(client);
    let outcome = outcome?;

    let source = match outcome.source {
        ResponseSource::Cache => style("cache").green(),
        ResponseSource::Network => style("network").yellow(),
    };
    eprintln!(
        "{} {} {} ({})",
        outcome.response.status, request.method, request.url, source
    );

    write_response(&outcome.response, &args).await
}

/// Split a `Name: value` header argument
fn parse_header(header: &str) -> PrecacheResult<(&str, &str)> {
    match header.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value.trim())),
        _ => Err(PrecacheError::User(format!(
            "Invalid header '{}', expected 'Name: value'",
            header
        ))),
    }
}

async fn write_response(response: &Response, args: &FetchArgs) -> PrecacheResult<()> {
    let mut head = String::new();
    if args.include {
        head.push_str(&format!(
            "HTTP {} {}\n",
            response.status, response.status_text
        ));
        for (name, value) in &response.headers {
            head.push_str(&format!("{}: {}\n", name, value));
        }
        head.push('\n');
    }

    match &args.output {
        Some(path) => {
            fs::write(path, &response.body)
                .await
                .map_err(|e| PrecacheError::io(format!("writing {}", path.display()), e))?;
            print!("{}", head);
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(head.as_bytes())
                .and_then(|_| stdout.write_all(&response.body))
                .and_then(|_| stdout.flush())
                .map_err(|e| PrecacheError::io("writing response to stdout", e))?;
        }
    }

    Ok(())
}
