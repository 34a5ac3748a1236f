use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{ContextError, FormError};
use crate::layout::PageLayoutEngine;
use crate::pdf::PdfDocument;
use crate::signature::Signature;
use crate::template::FormTemplate;

/// The period label standing for open-ended service instead of specific months.
pub const CONTINUOUS_SENTINEL: &str = "CONTINUOUS";

/// The values the form is filled in with, as handed over by the input layer. Deserializing goes
/// through [`FormInput::new`], so the JSON input is normalized like any other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawFormInput")]
pub struct FormInput {
    /// The selected months in selection order, or only the continuous sentinel.
    pub periods: Vec<String>,
    pub continuous: bool,
    /// The date of the request, already formatted, see [`crate::locale::format_request_date`].
    pub request_date: String,
    pub applicant_name: String,
    #[serde(default)]
    pub approver_initials: [Option<String>; 3],
    pub signature: Signature,
}

/// The request exactly as it was written, before any normalization.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFormInput {
    periods: Vec<String>,
    continuous: bool,
    request_date: String,
    applicant_name: String,
    #[serde(default)]
    approver_initials: [Option<String>; 3],
    signature: Signature,
}

impl From<RawFormInput> for FormInput {
    fn from(raw_form_input: RawFormInput) -> Self {
        FormInput::new(
            raw_form_input.periods,
            raw_form_input.continuous,
            &raw_form_input.request_date,
            &raw_form_input.applicant_name,
            raw_form_input.approver_initials,
            raw_form_input.signature,
        )
    }
}

impl FormInput {
    /// Creates the input normalizing the free text fields to upper case. When `continuous` is set
    /// the selected periods are replaced by the sentinel.
    pub fn new(
        periods: Vec<String>,
        continuous: bool,
        request_date: &str,
        applicant_name: &str,
        approver_initials: [Option<String>; 3],
        signature: Signature,
    ) -> Self {
        let periods = if continuous {
            vec![CONTINUOUS_SENTINEL.to_string()]
        } else {
            periods
        };

        FormInput {
            periods,
            continuous,
            request_date: request_date.to_string(),
            applicant_name: applicant_name.trim().to_uppercase(),
            approver_initials: approver_initials.map(|initials| {
                initials
                    .map(|initials| initials.trim().to_uppercase())
                    .filter(|initials| !initials.is_empty())
            }),
            signature,
        }
    }

    /// A copy of the input with the normalization of [`FormInput::new`] applied, for values built
    /// field by field.
    pub fn normalized(&self) -> FormInput {
        FormInput::new(
            self.periods.clone(),
            self.continuous,
            &self.request_date,
            &self.applicant_name,
            self.approver_initials.clone(),
            self.signature.clone(),
        )
    }

    /// The initials that were actually supplied, in approval line order.
    pub fn supplied_initials(&self) -> Vec<&str> {
        self.approver_initials
            .iter()
            .filter_map(|initials| initials.as_deref())
            .filter(|initials| !initials.trim().is_empty())
            .collect()
    }
}

/// A rendered form, ready to be handed over to the output sink and the notification channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    bytes: Vec<u8>,
    file_name: String,
}

impl RenderedDocument {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Builds the `<PERIOD>-<APPLICANT_NAME>.pdf` name of the rendered form, where the period is
/// either the continuous sentinel, the only selected month or the first and last selected months.
pub fn derive_file_name(form_input: &FormInput) -> String {
    let period_token = match form_input.periods.as_slice() {
        _ if form_input.continuous => CONTINUOUS_SENTINEL.to_string(),
        [] => String::new(),
        [period] => period.to_uppercase(),
        [first, .., last] => format!("{}-{}", first.to_uppercase(), last.to_uppercase()),
    };
    let applicant_name = form_input
        .applicant_name
        .trim()
        .to_uppercase()
        .replace(' ', "_");

    format!("{period_token}-{applicant_name}.pdf")
}

/// A short human readable recap of the request, in the language of the form.
pub fn request_summary(form_input: &FormInput) -> String {
    let mut summary = if form_input.continuous {
        format!("Período: Servicio continuo desde {}\n", form_input.request_date)
    } else {
        format!("Período: {}\n", form_input.periods.join(", "))
    };
    summary.push_str(&format!("Fecha de solicitud: {}\n", form_input.request_date));
    summary.push_str(&format!("Solicitante: {}\n", form_input.applicant_name));

    let initials = form_input.supplied_initials();
    if !initials.is_empty() {
        summary.push_str(&format!("Aprobado por: {}\n", initials.join(", ")));
    }

    summary
}

/// Derives the PDF identifier from the file name, so that the same request always produces the
/// same bytes. The halves are 64-bit FNV-1a hashes of the name prefixed by a salt byte, which do
/// not change between toolchains.
fn document_identifier(file_name: &str) -> String {
    const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut identifier = String::new();
    for salt in 0u8..2 {
        let hash = std::iter::once(salt)
            .chain(file_name.bytes())
            .fold(FNV_OFFSET_BASIS, |hash, byte| {
                (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
            });
        identifier.push_str(&format!("{:016x}", hash));
    }

    identifier
}

/// The entry point of the rendering: it checks the request, lays out the form exactly once and
/// serializes it. It is the only place where rendering failures are recovered from.
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    engine: PageLayoutEngine,
}

impl DocumentAssembler {
    pub fn new(template: FormTemplate) -> Self {
        DocumentAssembler {
            engine: PageLayoutEngine::new(template),
        }
    }

    /// Renders the form, never returning a partially rendered document. The input is normalized
    /// first, and a template that fails its own checks is reported as a render error.
    pub fn assemble(&self, form_input: &FormInput) -> Result<RenderedDocument, FormError> {
        let form_input = &form_input.normalized();
        validate(form_input).map_err(FormError::Validation)?;
        self.engine.template().validate().map_err(|error| {
            log::error!("The template of the form is invalid: {}", error);
            FormError::Render(error)
        })?;

        let file_name = derive_file_name(form_input);
        log::debug!("Rendering the form {:?}", file_name);
        let bytes = self.render(form_input, &file_name).map_err(|error| {
            log::error!("Failed to render the form {:?}: {}", file_name, error);
            FormError::Render(error)
        })?;
        log::debug!("Rendered the form {:?} into {} bytes", file_name, bytes.len());

        Ok(RenderedDocument { bytes, file_name })
    }

    fn render(&self, form_input: &FormInput, file_name: &str) -> Result<Vec<u8>, ContextError> {
        let template = self.engine.template();
        let (canvas, _) = self.engine.layout(form_input)?;

        let identifier = document_identifier(file_name);
        let mut pdf_document = PdfDocument::new(identifier.clone());
        pdf_document.title = file_name.to_string();
        pdf_document.author = template.metadata.author.clone();
        pdf_document.producer = template.metadata.producer.clone();
        pdf_document.creation_date =
            OffsetDateTime::from_unix_timestamp(template.metadata.creation_timestamp).map_err(
                |error| ContextError::with_error("Invalid creation timestamp of the document", &error),
            )?;

        let page_index = pdf_document.add_page(canvas.width, canvas.height);
        canvas.render_into(&mut pdf_document, page_index)?;
        pdf_document.write_all(identifier)?;

        pdf_document.save_to_bytes()
    }
}

/// The checks the input layer is expected to have done already, repeated so that a malformed
/// request never turns into a malformed page.
fn validate(form_input: &FormInput) -> Result<(), ContextError> {
    if form_input.periods.is_empty() {
        return Err(ContextError::with_context(
            "At least one month or the continuous service must be selected",
        ));
    }
    if !form_input.continuous
        && form_input
            .periods
            .iter()
            .all(|period| period.trim().is_empty() || period == CONTINUOUS_SENTINEL)
    {
        return Err(ContextError::with_context(
            "At least one month must be selected when the service is not continuous",
        ));
    }
    if form_input.applicant_name.trim().is_empty() {
        return Err(ContextError::with_context(
            "The full name of the applicant is missing",
        ));
    }
    if !form_input.signature.is_present() {
        return Err(ContextError::with_context(
            "The signature of the applicant is missing",
        ));
    }

    Ok(())
}
