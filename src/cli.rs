use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "lazydsgen", about = "Ask questions about a dataset; get answers from generated code", version)]
pub struct Cli {
    /// What to compute from the data.
    #[arg(value_name = "PROMPT")]
    pub prompt: Option<String>,

    /// JSON (.json) or JSON lines (.jsonl, .ndjson) file holding the data.
    #[arg(long, value_name = "FILE")]
    pub data: String,

    /// Type name reported to the model instead of the one derived from the data.
    #[arg(long = "data-type", value_name = "NAME")]
    pub data_type: Option<String>,

    /// Free-text description of the data's shape and meaning.
    #[arg(long)]
    pub desc: Option<String>,

    /// Read the data description from a file (.md, .txt).
    #[arg(long = "desc-file", value_name = "FILE")]
    pub desc_file: Option<String>,

    /// Large language model to use.
    #[arg(long)]
    pub model: Option<String>,

    /// Randomness of generated output.
    #[arg(long, value_parser = clap::value_parser!(f32))]
    pub temperature: Option<f32>,

    /// Maximum number of generate-and-run attempts.
    #[arg(long)]
    pub tries: Option<usize>,

    /// Make a single attempt and report its error instead of retrying.
    #[arg(long = "no-retry")]
    pub no_retry: bool,

    /// Print the generated code of each attempt before running it.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Only print the result, without code, input and prompt.
    #[arg(long = "no-metadata")]
    pub no_metadata: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
