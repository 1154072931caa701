use argh::FromArgs;
use reqwest::multipart::{Form, Part};
use std::path::PathBuf;

mod messages;

// defaults for the client
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 3000;

#[derive(FromArgs)]
/// Client for the vision describe server
struct ClientArgs {
    /// the host to connect to
    #[argh(option, short = 'h', default = "DEFAULT_HOST.to_string()")]
    host: String,

    /// the port to connect to
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,

    /// command to execute: "classify", "describe" or "models"
    #[argh(subcommand)]
    command: ClientCommands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum ClientCommands {
    Classify(ClassifyCommand),
    Describe(DescribeCommand),
    Models(ModelsCommand),
}

#[derive(FromArgs)]
/// Run a vision task on an image and print its description
#[argh(subcommand, name = "classify")]
struct ClassifyCommand {
    /// the path to the image
    #[argh(option, short = 'i')]
    image_path: PathBuf,

    /// the model identifier
    #[argh(option, short = 'm')]
    model: String,

    /// the task, e.g. "classification" or "zero-shot-detection"
    #[argh(option, short = 't')]
    task: String,

    /// minimum confidence for an item to be kept
    #[argh(option, short = 'c')]
    confidence_threshold: Option<f64>,

    /// maximum number of items to keep
    #[argh(option, short = 'n')]
    max_results: Option<usize>,
}

#[derive(FromArgs)]
/// Caption an image
#[argh(subcommand, name = "describe")]
struct DescribeCommand {
    /// the path to the image
    #[argh(option, short = 'i')]
    image_path: PathBuf,

    /// the captioning model identifier
    #[argh(option, short = 'm', default = "String::new()")]
    model: String,

    /// maximum number of generated tokens
    #[argh(option, short = 'l')]
    max_length: Option<u32>,
}

#[derive(FromArgs)]
/// List the models the server offers
#[argh(subcommand, name = "models")]
struct ModelsCommand {}

fn image_part(path: &PathBuf) -> Result<Part, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    Ok(Part::bytes(bytes).file_name(file_name))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: ClientArgs = argh::from_env();

    let client = reqwest::Client::new();

    // format the host and port
    let addr = format!("{}:{}", args.host, args.port);

    let response = match args.command {
        ClientCommands::Classify(command) => {
            let mut form = Form::new()
                .part(messages::FIELD_IMAGE, image_part(&command.image_path)?)
                .text(messages::FIELD_MODEL, command.model)
                .text(messages::FIELD_TASK, command.task);
            if let Some(threshold) = command.confidence_threshold {
                form = form.text(messages::FIELD_CONFIDENCE_THRESHOLD, threshold.to_string());
            }
            if let Some(max_results) = command.max_results {
                form = form.text(messages::FIELD_MAX_RESULTS, max_results.to_string());
            }
            client
                .post(format!("http://{}/api/classify", addr))
                .multipart(form)
                .send()
                .await?
        }
        ClientCommands::Describe(command) => {
            let mut form = Form::new()
                .part(messages::FIELD_IMAGE, image_part(&command.image_path)?)
                .text(messages::FIELD_MODEL, command.model);
            if let Some(max_length) = command.max_length {
                form = form.text(messages::FIELD_MAX_LENGTH, max_length.to_string());
            }
            client
                .post(format!("http://{}/api/describe", addr))
                .multipart(form)
                .send()
                .await?
        }
        ClientCommands::Models(_) => {
            client
                .get(format!("http://{}/models", addr))
                .send()
                .await?
        }
    };

    let status = response.status();
    let result = response.json::<serde_json::Value>().await?;
    if status.is_success() {
        match serde_json::from_value::<messages::DescriptionResponse>(result.clone()) {
            Ok(message) => println!("{}", message.description),
            Err(_) => println!("{}", serde_json::to_string_pretty(&result)?),
        }
    } else {
        match serde_json::from_value::<messages::ErrorResponse>(result.clone()) {
            Ok(message) => eprintln!("Error ({status}, {}): {}", message.kind, message.error),
            Err(_) => eprintln!("Error ({status}): {}", serde_json::to_string_pretty(&result)?),
        }
    }

    Ok(())
}
