use std::path::{Path, PathBuf};

use crate::document::RenderedDocument;
use crate::error::ContextError;

/// Where a rendered form is offered to the applicant for retrieval.
pub trait OutputSink {
    /// Hands over the document unchanged, returning where it can be retrieved from.
    fn deliver(&self, document: &RenderedDocument) -> Result<String, ContextError>;
}

/// Writes every rendered form as `<file name>` into a directory, replacing any previous file
/// with the same name.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    directory: PathBuf,
}

impl DirectorySink {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        DirectorySink {
            directory: directory.as_ref().to_path_buf(),
        }
    }
}

impl OutputSink for DirectorySink {
    fn deliver(&self, document: &RenderedDocument) -> Result<String, ContextError> {
        std::fs::create_dir_all(&self.directory).map_err(|error| {
            ContextError::with_error(
                format!("Unable to create the output directory {:?}", self.directory),
                &error,
            )
        })?;

        // The name is derived from user input, so it must not escape the directory
        let file_name = Path::new(document.file_name())
            .file_name()
            .ok_or(ContextError::with_context(format!(
                "Invalid file name {:?}",
                document.file_name()
            )))?;
        let document_path = self.directory.join(file_name);
        std::fs::write(&document_path, document.bytes()).map_err(|error| {
            ContextError::with_error(
                format!("Unable to write the document {:?}", document_path),
                &error,
            )
        })?;
        log::info!("The form was saved to {:?}", document_path);

        Ok(document_path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentAssembler, FormInput};
    use crate::signature::{PixelBuffer, Signature};

    #[test]
    fn documents_are_written_under_their_file_name() {
        let form_input = FormInput::new(
            vec!["Agosto".to_string()],
            false,
            "3 de julio de 2026",
            "Luis Gómez",
            [None, None, None],
            Signature::Present(PixelBuffer {
                width: 2,
                height: 2,
                data: vec![255; 16],
            }),
        );
        let document = DocumentAssembler::new(Default::default())
            .assemble(&form_input)
            .unwrap();
        let directory = std::env::temp_dir().join(format!("s205b-delivery-{}", std::process::id()));

        let location = DirectorySink::new(&directory).deliver(&document).unwrap();

        assert!(location.ends_with("AGOSTO-LUIS_GÓMEZ.pdf"));
        assert_eq!(std::fs::read(&location).unwrap(), document.bytes());
        std::fs::remove_dir_all(&directory).unwrap();
    }
}
