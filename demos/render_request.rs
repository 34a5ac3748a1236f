use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

use s205b::delivery::{DirectorySink, OutputSink as _};
use s205b::document::{request_summary, DocumentAssembler, FormInput};
use s205b::error::ContextError;
use s205b::notification::{notify, NotificationPayload, TelegramChannel};
use s205b::signature::{PixelBuffer, Signature};
use s205b::template::FormTemplate;

#[derive(Parser, Debug)]
#[command(version, long_about = None)]
struct CliArguments {
    #[arg(short = 'r', long = "request", value_name = "json_file")]
    request_path: PathBuf,
    #[arg(short = 's', long = "signature", value_name = "png_file")]
    signature_path: PathBuf,
    #[arg(short = 'o', long = "output", value_name = "directory")]
    output_directory: PathBuf,
    #[arg(short = 't', long = "template", value_name = "json_file")]
    template_path: Option<PathBuf>,
    /// Announce the request on Telegram, reading TELEGRAM_TOKEN and TELEGRAM_CHAT_ID
    #[arg(long = "notify")]
    notify: bool,
}

/// The request as written by hand, the signature being read from a separate image.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestFile {
    #[serde(default)]
    periods: Vec<String>,
    #[serde(default)]
    continuous: bool,
    /// Defaults to the current date.
    request_date: Option<String>,
    applicant_name: String,
    #[serde(default)]
    approver_initials: [Option<String>; 3],
}

fn main() {
    if let Err(error) = fallible_main() {
        log::error!("{}", error);
        std::process::exit(1);
    }
}

fn fallible_main() -> Result<(), ContextError> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();
    let arguments = CliArguments::parse();
    log::debug!("{:?}", arguments);

    let template = match &arguments.template_path {
        Some(template_path) => FormTemplate::from_path(template_path)?,
        None => FormTemplate::default(),
    };
    let request_contents = std::fs::read_to_string(&arguments.request_path).map_err(|error| {
        ContextError::with_error(
            format!("Unable to read the request {:?}", arguments.request_path),
            &error,
        )
    })?;
    let request: RequestFile = serde_json::from_str(&request_contents).map_err(|error| {
        ContextError::with_error(
            format!("Unable to parse the request {:?}", arguments.request_path),
            &error,
        )
    })?;
    let signature_bytes = std::fs::read(&arguments.signature_path).map_err(|error| {
        ContextError::with_error(
            format!("Unable to read the signature {:?}", arguments.signature_path),
            &error,
        )
    })?;

    let request_date = request.request_date.unwrap_or_else(|| {
        s205b::locale::format_request_date(time::OffsetDateTime::now_utc().date())
    });
    // The months are written the way the form prints them, whatever their case in the request
    let periods = if request.continuous {
        Vec::new()
    } else {
        request
            .periods
            .iter()
            .map(|period| {
                s205b::locale::parse_month(period)
                    .map(|month| s205b::locale::month_label(month).to_string())
                    .ok_or_else(|| {
                        ContextError::with_context(format!("Unknown month {:?} in the request", period))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?
    };
    let form_input = FormInput::new(
        periods,
        request.continuous,
        &request_date,
        &request.applicant_name,
        request.approver_initials,
        Signature::Present(PixelBuffer::from_png(&signature_bytes)?),
    );

    let document = DocumentAssembler::new(template)
        .assemble(&form_input)
        .map_err(|error| ContextError::with_error("Unable to generate the form", &error))?;
    log::info!("{}", request_summary(&form_input));

    if arguments.notify {
        // The document is delivered whatever the outcome of the notification
        match TelegramChannel::from_env() {
            Ok(channel) => {
                let report = notify(&channel, &NotificationPayload::new(&form_input, &document));
                log::info!("Notification report: {:?}", report);
            }
            Err(error) => log::warn!("Skipping the notification: {}", error),
        }
    }

    DirectorySink::new(&arguments.output_directory).deliver(&document)?;

    Ok(())
}
