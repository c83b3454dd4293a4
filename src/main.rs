mod cli;

use std::io::{self, Read};

use anyhow::{bail, Context, Result};
use is_terminal::IsTerminal;
use lazydsgen::{utils, Config, GenerationSettings, InputData, InvokeOptions, Session};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lazydsgen=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = cli::Cli::parse();
    let cfg = Config::load();

    // stdin handling (pipe support)
    let mut prompt_from_stdin = String::new();
    if !io::stdin().is_terminal() {
        io::stdin().read_to_string(&mut prompt_from_stdin)?;
    }
    let prompt = utils::combine_prompt(prompt_from_stdin.trim(), args.prompt.as_deref().unwrap_or_default().trim());
    if prompt.is_empty() {
        bail!("Provide a prompt as an argument or via stdin");
    }

    let mut data = InputData::from_path(&args.data)?;
    if let Some(type_name) = args.data_type {
        data = data.with_type_name(type_name);
    }

    let desc_from_file = args
        .desc_file
        .as_deref()
        .map(utils::read_description)
        .transpose()?;
    let description = utils::combine_descriptions(args.desc.as_deref(), desc_from_file.as_deref());

    // CLI overrides config
    let defaults = GenerationSettings::from_config(&cfg);
    let settings = GenerationSettings {
        model: args.model.unwrap_or(defaults.model),
        temperature: args.temperature.unwrap_or(defaults.temperature),
        n_tries: args.tries.unwrap_or(defaults.n_tries),
    };

    let session = Session::from_config(&cfg, data, description)
        .context("cannot start session")?
        .with_settings(settings);

    let opts = InvokeOptions {
        verbose: args.verbose,
        include_metadata: !args.no_metadata,
    };
    let envelope = if args.no_retry {
        session.invoke(&prompt, opts).await?
    } else {
        session.invoke_with_tries(&prompt, opts).await
    };

    println!("{}", serde_json::to_string_pretty(&envelope)?);
    if envelope.is_failure() {
        std::process::exit(1);
    }
    Ok(())
}
