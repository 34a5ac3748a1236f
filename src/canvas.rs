use lopdf::content::Operation;
use lopdf::{Object, StringFormat};

use crate::error::ContextError;
use crate::metrics::{encode_win_ansi, StandardFont};
use crate::pdf::PdfDocument;
use crate::signature::{DecodedImage, Placement};

/// A single drawing operation recorded on the canvas, in page coordinates (points, origin at the
/// bottom left corner of the page).
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Baseline-anchored text starting at `x`.
    Text {
        x: f32,
        y: f32,
        text: String,
        font: StandardFont,
        font_size: f32,
    },
    /// A stroked straight line.
    Line { x1: f32, y1: f32, x2: f32, y2: f32 },
    /// A stroked, unfilled rectangle whose bottom left corner is at `x`, `y`.
    Rectangle {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    /// A raster image stretched over the placement.
    Image {
        image: DecodedImage,
        placement: Placement,
    },
}

/// The surface of a single page. The drawing primitives only record what they are asked to draw,
/// the commands are turned into PDF content operations by [`PageCanvas::render_into`].
///
/// A canvas belongs to a single render and must not be shared between renders.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCanvas {
    pub width: f32,
    pub height: f32,
    commands: Vec<DrawCommand>,
}

impl PageCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        PageCanvas {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Draws `text` with its baseline starting at `x`, `y`.
    pub fn draw_text(&mut self, x: f32, y: f32, text: &str, font: StandardFont, font_size: f32) {
        self.commands.push(DrawCommand::Text {
            x,
            y,
            text: text.to_string(),
            font,
            font_size,
        });
    }

    /// Draws `text` horizontally centered around `x_center` and returns the x it starts at. The
    /// width is measured with the same font and size the text is drawn with.
    pub fn draw_centered(
        &mut self,
        x_center: f32,
        y: f32,
        text: &str,
        font: StandardFont,
        font_size: f32,
    ) -> f32 {
        let start_x = x_center - font.text_width(text, font_size) / 2.0;
        self.draw_text(start_x, y, text, font, font_size);

        start_x
    }

    /// Draws `text` centered on the span from `x1` to `x2` and returns the x it starts at, which
    /// is before `x1` when the text is wider than the span.
    pub fn draw_centered_in_span(
        &mut self,
        x1: f32,
        x2: f32,
        y: f32,
        text: &str,
        font: StandardFont,
        font_size: f32,
    ) -> f32 {
        let start_x = x1 + ((x2 - x1) - font.text_width(text, font_size)) / 2.0;
        self.draw_text(start_x, y, text, font, font_size);

        start_x
    }

    /// Draws an empty square of side `size` with its bottom left corner at `x`, `y`. When
    /// `checked` a bold "X" one point smaller than the box is drawn inside of it.
    pub fn draw_checkbox(&mut self, x: f32, y: f32, size: f32, checked: bool) {
        self.commands.push(DrawCommand::Rectangle {
            x,
            y,
            width: size,
            height: size,
        });
        if checked {
            self.draw_text(x + 2.0, y + 1.0, "X", StandardFont::HelveticaBold, size - 1.0);
        }
    }

    /// Draws a horizontal line at `y` from `x1` to `x2`.
    pub fn draw_rule(&mut self, x1: f32, y: f32, x2: f32) {
        self.commands.push(DrawCommand::Line {
            x1,
            y1: y,
            x2,
            y2: y,
        });
    }

    pub fn draw_image(&mut self, image: DecodedImage, placement: Placement) {
        self.commands.push(DrawCommand::Image { image, placement });
    }

    /// The text commands drawn so far, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = (&str, f32, f32)> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Text { text, x, y, .. } => Some((text.as_str(), *x, *y)),
            _ => None,
        })
    }

    /// Writes the recorded commands into the given page of the document, registering the images
    /// in the resources of the page along the way.
    pub fn render_into(
        &self,
        pdf_document: &mut PdfDocument,
        page_index: usize,
    ) -> Result<(), ContextError> {
        let mut operations = Vec::new();
        for command in &self.commands {
            match command {
                DrawCommand::Text {
                    x,
                    y,
                    text,
                    font,
                    font_size,
                } => {
                    operations.extend([
                        Operation::new("BT", vec![]),
                        Operation::new(
                            "Tf",
                            vec![
                                Object::Name(font.resource_name().into()),
                                (*font_size).into(),
                            ],
                        ),
                        Operation::new("Td", vec![(*x).into(), (*y).into()]),
                        Operation::new(
                            "Tj",
                            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
                        ),
                        Operation::new("ET", vec![]),
                    ]);
                }
                DrawCommand::Line { x1, y1, x2, y2 } => {
                    operations.extend([
                        Operation::new("m", vec![(*x1).into(), (*y1).into()]),
                        Operation::new("l", vec![(*x2).into(), (*y2).into()]),
                        Operation::new("S", vec![]),
                    ]);
                }
                DrawCommand::Rectangle {
                    x,
                    y,
                    width,
                    height,
                } => {
                    operations.extend([
                        Operation::new(
                            "re",
                            vec![(*x).into(), (*y).into(), (*width).into(), (*height).into()],
                        ),
                        Operation::new("S", vec![]),
                    ]);
                }
                DrawCommand::Image { image, placement } => {
                    let reference =
                        pdf_document.add_image_to_page(page_index, image.to_image_xobject())?;
                    // The image space is the unit square, so the matrix maps it onto the placement
                    let transform = placement.transform();
                    operations.extend([
                        Operation::new("q", vec![]),
                        Operation::new(
                            "cm",
                            vec![
                                transform[(0, 0)].into(),
                                transform[(1, 0)].into(),
                                transform[(0, 1)].into(),
                                transform[(1, 1)].into(),
                                transform[(0, 2)].into(),
                                transform[(1, 2)].into(),
                            ],
                        ),
                        Operation::new("Do", vec![Object::Name(reference.name().into())]),
                        Operation::new("Q", vec![]),
                    ]);
                }
            }
        }

        pdf_document.add_operations_to_page(page_index, operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(left: f32, right: f32) {
        assert!((left - right).abs() < 1e-3, "{left} != {right}");
    }

    #[test]
    fn centered_text_starts_half_the_slack_into_the_span() {
        let mut canvas = PageCanvas::new(792.0, 612.0);
        let text = "JUAN PEREZ";
        let width = StandardFont::HelveticaBold.text_width(text, 16.0);

        let start_x =
            canvas.draw_centered_in_span(417.0, 667.0, 100.0, text, StandardFont::HelveticaBold, 16.0);

        assert_close(start_x, 417.0 + (250.0 - width) / 2.0);
        assert_eq!(
            canvas.commands(),
            [DrawCommand::Text {
                x: start_x,
                y: 100.0,
                text: text.to_string(),
                font: StandardFont::HelveticaBold,
                font_size: 16.0,
            }]
        );
    }

    #[test]
    fn centering_around_a_point_is_symmetric() {
        let mut canvas = PageCanvas::new(792.0, 612.0);
        let text = "SOLICITUD PARA EL SERVICIO DE PRECURSOR AUXILIAR";
        let width = StandardFont::HelveticaBold.text_width(text, 14.0);

        let start_x = canvas.draw_centered(396.0, 562.0, text, StandardFont::HelveticaBold, 14.0);

        assert_close(start_x + width / 2.0, 396.0);
    }

    #[test]
    fn checked_checkbox_overlays_a_bold_x() {
        let mut canvas = PageCanvas::new(792.0, 612.0);
        canvas.draw_checkbox(72.0, 400.0, 10.0, false);
        assert_eq!(canvas.commands().len(), 1);

        canvas.draw_checkbox(72.0, 400.0, 10.0, true);
        assert_eq!(
            canvas.commands()[2],
            DrawCommand::Text {
                x: 74.0,
                y: 401.0,
                text: "X".to_string(),
                font: StandardFont::HelveticaBold,
                font_size: 9.0,
            }
        );
    }

    #[test]
    fn drawing_is_idempotent_given_the_same_arguments() {
        let mut first = PageCanvas::new(792.0, 612.0);
        let mut second = PageCanvas::new(792.0, 612.0);
        for canvas in [&mut first, &mut second] {
            canvas.draw_rule(200.0, 300.0, 720.0);
            canvas.draw_text(72.0, 30.0, "S-205b-S  4/15", StandardFont::Helvetica, 8.0);
        }

        assert_eq!(first, second);
    }

    #[test]
    fn rendered_operations_use_the_font_resources() {
        let mut canvas = PageCanvas::new(792.0, 612.0);
        canvas.draw_text(72.0, 30.0, "Año", StandardFont::HelveticaOblique, 8.0);
        canvas.draw_rule(200.0, 300.0, 720.0);
        let mut pdf_document = PdfDocument::new("identifier".into());
        let page_index = pdf_document.add_page(canvas.width, canvas.height);

        canvas.render_into(&mut pdf_document, page_index).unwrap();

        let operations = &pdf_document.pages[page_index].operations;
        let operators: Vec<_> = operations
            .iter()
            .map(|operation| operation.operator.as_str())
            .collect();
        assert_eq!(operators, ["BT", "Tf", "Td", "Tj", "ET", "m", "l", "S"]);
        assert_eq!(operations[1].operands[0], Object::Name(b"F3".to_vec()));
        assert_eq!(
            operations[3].operands[0],
            Object::String(b"A\xf1o".to_vec(), StringFormat::Literal)
        );
    }
}
