use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ContextError;

/// The fixed coordinates, sizes and strings of the official S-205b form. All the values are in
/// PDF points with the origin at the bottom left corner of the page; vertical offsets are
/// distances measured downwards from the cursor of the layout engine.
///
/// The defaults reproduce the paper form. Alternative values can be loaded from a JSON file with
/// [`FormTemplate::from_path`], where any omitted key keeps its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormTemplate {
    pub page_width: f32,
    pub page_height: f32,
    pub left_margin: f32,
    pub right_margin: f32,
    pub header: HeaderSection,
    pub intro: ParagraphSection,
    pub period: PeriodSection,
    pub checkbox: CheckboxSection,
    pub declaration: ParagraphSection,
    pub signature: SignatureSection,
    pub note: NoteSection,
    pub approval: ApprovalSection,
    pub footer: FooterSection,
    pub metadata: MetadataSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderSection {
    /// Distance between the top edge of the page and the baseline of the title.
    pub top_offset: f32,
    pub title: String,
    pub font_size: f32,
}

/// A block of boilerplate text wrapped at a fixed number of characters per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParagraphSection {
    pub gap_before: f32,
    pub text: String,
    pub wrap_length: usize,
    pub font_size: f32,
    pub line_pitch: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PeriodSection {
    pub gap_before: f32,
    pub label: String,
    pub font_size: f32,
    /// Where the selected periods start, which is also where the decorative rule starts.
    pub value_x: f32,
    pub wrap_length: usize,
    pub line_pitch: f32,
    pub gap_after_values: f32,
    /// How far the cursor moves when no period is printed.
    pub empty_advance: f32,
    /// Height of the decorative rule above the cursor.
    pub rule_lift: f32,
    pub gap_after: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckboxSection {
    pub x: f32,
    pub size: f32,
    /// How far the bottom of the box sits below the caption baseline.
    pub box_drop: f32,
    pub caption_x: f32,
    pub caption: String,
    pub caption_font_size: f32,
    pub gap_after: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignatureSection {
    pub gap_before: f32,
    pub date_label: String,
    pub date_value_offset: f32,
    pub font_size: f32,
    pub underline_width: f32,
    pub underline_drop: f32,
    pub column_gap: f32,
    pub image_offset_x: f32,
    pub image_max_width: f32,
    pub image_max_height: f32,
    pub signature_caption: String,
    pub caption_font_size: f32,
    pub caption_drop: f32,
    /// Distance between the signature baseline and the applicant name baseline.
    pub name_drop: f32,
    pub name_lift: f32,
    pub name_font_size: f32,
    pub name_caption: String,
}

/// One line of the committee questions, drawn `advance` points below the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateLine {
    pub x: f32,
    pub advance: f32,
    pub text: String,
}

impl TemplateLine {
    fn new(x: f32, advance: f32, text: &str) -> Self {
        TemplateLine {
            x,
            advance,
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NoteSection {
    pub gap_before: f32,
    pub label_x: f32,
    pub label: String,
    pub label_font_size: f32,
    pub text_x: f32,
    pub text: String,
    pub wrap_length: usize,
    pub font_size: f32,
    pub text_drop: f32,
    pub line_pitch: f32,
    pub committee_gap: f32,
    pub committee_heading: Vec<String>,
    pub committee_heading_pitch: f32,
    pub questions_gap: f32,
    pub questions: Vec<TemplateLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApprovalSection {
    pub x: f32,
    pub heading: Vec<String>,
    pub heading_font_size: f32,
    pub heading_pitch: f32,
    pub hint: String,
    pub hint_font_size: f32,
    /// Distance between the first heading baseline and the first initials baseline.
    pub lines_drop: f32,
    pub underline_width: f32,
    pub underline_drop: f32,
    pub line_pitch: f32,
    pub initials_font_size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FooterSection {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub font_size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetadataSection {
    pub author: String,
    pub producer: String,
    /// Unix timestamp written as the creation and modification date, so that the same request
    /// always renders to the same bytes.
    pub creation_timestamp: i64,
}

impl Default for FormTemplate {
    fn default() -> Self {
        FormTemplate {
            page_width: 792.0,
            page_height: 612.0,
            left_margin: 72.0,
            right_margin: 72.0,
            header: HeaderSection::default(),
            intro: ParagraphSection {
                gap_before: 35.0,
                text: "Debido a mi amor a Jehová y mi deseo de ayudar al prójimo a aprender acerca de él y sus amorosos propósitos, \
                       quisiera aumentar mi participación en el servicio del campo siendo precursor auxiliar durante el período indicado abajo:"
                    .to_string(),
                ..ParagraphSection::default()
            },
            period: PeriodSection::default(),
            checkbox: CheckboxSection::default(),
            declaration: ParagraphSection {
                gap_before: 0.0,
                text: "Gozo de una buena reputación moral y tengo buenos hábitos. He hecho planes para satisfacer el requisito de horas. \
                       (Vea Nuestro Ministerio del Reino de junio de 2013, página 2)."
                    .to_string(),
                ..ParagraphSection::default()
            },
            signature: SignatureSection::default(),
            note: NoteSection::default(),
            approval: ApprovalSection::default(),
            footer: FooterSection::default(),
            metadata: MetadataSection::default(),
        }
    }
}

impl Default for HeaderSection {
    fn default() -> Self {
        HeaderSection {
            top_offset: 50.0,
            title: "SOLICITUD PARA EL SERVICIO DE PRECURSOR AUXILIAR".to_string(),
            font_size: 14.0,
        }
    }
}

impl Default for ParagraphSection {
    fn default() -> Self {
        ParagraphSection {
            gap_before: 0.0,
            text: String::new(),
            wrap_length: 95,
            font_size: 10.0,
            line_pitch: 14.0,
        }
    }
}

impl Default for PeriodSection {
    fn default() -> Self {
        PeriodSection {
            gap_before: 10.0,
            label: "El (los) mes(es) de:".to_string(),
            font_size: 10.0,
            value_x: 200.0,
            wrap_length: 75,
            line_pitch: 12.0,
            gap_after_values: 5.0,
            empty_advance: 12.0,
            rule_lift: 5.0,
            gap_after: 15.0,
        }
    }
}

impl Default for CheckboxSection {
    fn default() -> Self {
        CheckboxSection {
            x: 72.0,
            size: 10.0,
            box_drop: 2.0,
            caption_x: 90.0,
            caption: "Marque la casilla si desea ser precursor auxiliar de continuo hasta nuevo aviso."
                .to_string(),
            caption_font_size: 9.0,
            gap_after: 30.0,
        }
    }
}

impl Default for SignatureSection {
    fn default() -> Self {
        SignatureSection {
            gap_before: 58.0,
            date_label: "Fecha:".to_string(),
            date_value_offset: 45.0,
            font_size: 10.0,
            underline_width: 250.0,
            underline_drop: 2.0,
            column_gap: 50.0,
            image_offset_x: 25.0,
            image_max_width: 200.0,
            image_max_height: 50.0,
            signature_caption: "(Firma del solicitante)".to_string(),
            caption_font_size: 8.0,
            caption_drop: 15.0,
            name_drop: 58.0,
            name_lift: 3.0,
            name_font_size: 16.0,
            name_caption: "(Nombre en letra de molde)".to_string(),
        }
    }
}

impl Default for NoteSection {
    fn default() -> Self {
        NoteSection {
            gap_before: 102.0,
            label_x: 128.0,
            label: "NOTA:".to_string(),
            label_font_size: 8.0,
            text_x: 159.0,
            text: "Después de llenar esta solicitud, entréguela al coordinador del cuerpo de ancianos. Si es posible, \
                   hágalo por lo menos una semana antes de la fecha en que desea comenzar el servicio de precursor auxiliar. \
                   No debe enviarse esta solicitud a la sucursal, sino más bien guardarse en los archivos de la congregación."
                .to_string(),
            wrap_length: 55,
            font_size: 7.0,
            text_drop: 2.0,
            line_pitch: 9.0,
            committee_gap: 5.0,
            committee_heading: vec![
                "Para el Comité de Servicio".to_string(),
                "de la Congregación:".to_string(),
            ],
            committee_heading_pitch: 10.0,
            questions_gap: 20.0,
            questions: vec![
                TemplateLine::new(128.0, 0.0, "1. ¿Es el solicitante un buen ejemplo"),
                TemplateLine::new(136.0, 8.0, "del vivir cristiano?"),
                TemplateLine::new(128.0, 11.0, "2. Quienes hayan sido censurados o"),
                TemplateLine::new(136.0, 8.0, "readmitidos durante el pasado año o"),
                TemplateLine::new(128.0, 8.0, "todavía estén bajo restricciones no"),
                TemplateLine::new(136.0, 8.0, "satisfacen los requisitos."),
                TemplateLine::new(128.0, 11.0, "3. ¿Han consultado con su"),
                TemplateLine::new(136.0, 8.0, "superintendente de grupo?"),
            ],
        }
    }
}

impl Default for ApprovalSection {
    fn default() -> Self {
        ApprovalSection {
            x: 450.0,
            heading: vec![
                "Aprobado por los miembros".to_string(),
                "del comité de servicio:".to_string(),
            ],
            heading_font_size: 9.0,
            heading_pitch: 12.0,
            hint: "(Basta con las iniciales)".to_string(),
            hint_font_size: 8.0,
            lines_drop: 76.0,
            underline_width: 130.0,
            underline_drop: 2.0,
            line_pitch: 30.0,
            initials_font_size: 14.0,
        }
    }
}

impl Default for FooterSection {
    fn default() -> Self {
        FooterSection {
            x: 72.0,
            y: 30.0,
            text: "S-205b-S  4/15".to_string(),
            font_size: 8.0,
        }
    }
}

impl Default for MetadataSection {
    fn default() -> Self {
        MetadataSection {
            author: "Comité de Servicio de la Congregación".to_string(),
            producer: format!("s205b {}", env!("CARGO_PKG_VERSION")),
            creation_timestamp: 0,
        }
    }
}

impl FormTemplate {
    /// Loads a template from a JSON file, keeping the default for every key the file omits.
    pub fn from_path(template_file_path: &Path) -> Result<Self, ContextError> {
        let template_file_contents =
            std::fs::read_to_string(template_file_path).map_err(|error| {
                ContextError::with_error(
                    format!("Failed to read the template file {:?}", template_file_path),
                    &error,
                )
            })?;
        let template: FormTemplate =
            serde_json::from_str(&template_file_contents).map_err(|error| {
                ContextError::with_error(
                    format!("Failed to parse the template file {:?}", template_file_path),
                    &error,
                )
            })?;
        template.validate()?;

        Ok(template)
    }

    /// Checks the values that would make the layout meaningless.
    pub fn validate(&self) -> Result<(), ContextError> {
        if !(self.page_width > 0.0 && self.page_height > 0.0) {
            return Err(ContextError::with_context(format!(
                "The page size {} x {} is not positive",
                self.page_width, self.page_height
            )));
        }
        let wrap_lengths = [
            ("intro", self.intro.wrap_length),
            ("period", self.period.wrap_length),
            ("declaration", self.declaration.wrap_length),
            ("note", self.note.wrap_length),
        ];
        if let Some((section, _)) = wrap_lengths.iter().find(|(_, length)| *length == 0) {
            return Err(ContextError::with_context(format!(
                "The wrap length of the {} section must be positive",
                section
            )));
        }
        let texts = [
            ("intro", &self.intro.text),
            ("declaration", &self.declaration.text),
            ("note", &self.note.text),
        ];
        if let Some((section, _)) = texts.iter().find(|(_, text)| text.trim().is_empty()) {
            return Err(ContextError::with_context(format!(
                "The text of the {} section must not be empty",
                section
            )));
        }
        if !(self.signature.image_max_width > 0.0 && self.signature.image_max_height > 0.0) {
            return Err(ContextError::with_context(
                "The signature box must have a positive size",
            ));
        }

        Ok(())
    }

    /// The x coordinate of the right margin, where the decorative rule of the period block ends.
    pub fn right_edge(&self) -> f32 {
        self.page_width - self.right_margin
    }
}
