use crate::canvas::PageCanvas;
use crate::cursor::Cursor;
use crate::document::FormInput;
use crate::error::ContextError;
use crate::metrics::StandardFont;
use crate::signature::{self, SignatureBox};
use crate::template::{ApprovalSection, FormTemplate, NoteSection, ParagraphSection};
use crate::wrap::wrap_text;

/// The sections of the form, in the order in which they are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Header,
    Intro,
    Period,
    Checkbox,
    Declaration,
    Signature,
    NoteAndApproval,
    Footer,
}

/// The value of the cursor at the start of each section, in layout order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutTrace {
    marks: Vec<(Section, f32)>,
}

impl LayoutTrace {
    fn mark(&mut self, section: Section, cursor: &Cursor) {
        log::debug!("Laying out the section {:?} at y = {}", section, cursor.y());
        self.marks.push((section, cursor.y()));
    }

    pub fn marks(&self) -> &[(Section, f32)] {
        &self.marks
    }

    /// The cursor value at the start of the given section, if it was laid out.
    pub fn section_start(&self, section: Section) -> Option<f32> {
        self.marks
            .iter()
            .find(|(marked_section, _)| *marked_section == section)
            .map(|(_, y)| *y)
    }
}

/// Lays out the whole form on a single page in one top to bottom pass.
///
/// Every position comes from the injected template; the only values derived at layout time are
/// the wrapped lines and the centered x coordinates. Content that does not fit its section is not
/// reflowed: it overlaps whatever comes next, including the bottom margin.
#[derive(Debug, Clone)]
pub struct PageLayoutEngine {
    template: FormTemplate,
}

impl PageLayoutEngine {
    pub fn new(template: FormTemplate) -> Self {
        PageLayoutEngine { template }
    }

    pub fn template(&self) -> &FormTemplate {
        &self.template
    }

    /// Draws the form filled in with `form_input` onto a new canvas.
    pub fn layout(&self, form_input: &FormInput) -> Result<(PageCanvas, LayoutTrace), ContextError> {
        let template = &self.template;
        let mut canvas = PageCanvas::new(template.page_width, template.page_height);
        let mut trace = LayoutTrace::default();
        let mut cursor = Cursor::new(template.page_height);

        cursor.move_down(template.header.top_offset)?;
        trace.mark(Section::Header, &cursor);
        canvas.draw_centered(
            template.page_width / 2.0,
            cursor.y(),
            &template.header.title,
            StandardFont::HelveticaBold,
            template.header.font_size,
        );

        cursor.move_down(template.intro.gap_before)?;
        trace.mark(Section::Intro, &cursor);
        self.layout_paragraph(&mut canvas, &mut cursor, &template.intro)?;

        cursor.move_down(template.period.gap_before)?;
        trace.mark(Section::Period, &cursor);
        self.layout_period(&mut canvas, &mut cursor, form_input)?;

        trace.mark(Section::Checkbox, &cursor);
        let checkbox = &template.checkbox;
        canvas.draw_checkbox(
            checkbox.x,
            cursor.y() - checkbox.box_drop,
            checkbox.size,
            form_input.continuous,
        );
        canvas.draw_text(
            checkbox.caption_x,
            cursor.y(),
            &checkbox.caption,
            StandardFont::Helvetica,
            checkbox.caption_font_size,
        );
        cursor.move_down(checkbox.gap_after)?;

        cursor.move_down(template.declaration.gap_before)?;
        trace.mark(Section::Declaration, &cursor);
        self.layout_paragraph(&mut canvas, &mut cursor, &template.declaration)?;

        cursor.move_down(template.signature.gap_before)?;
        trace.mark(Section::Signature, &cursor);
        self.layout_signature(&mut canvas, &cursor, form_input);

        cursor.move_down(template.note.gap_before)?;
        trace.mark(Section::NoteAndApproval, &cursor);
        // Both columns start at the same height and advance independently of each other
        self.layout_note(&mut canvas, cursor, &template.note)?;
        self.layout_approval(
            &mut canvas,
            cursor,
            &template.approval,
            &form_input.approver_initials,
        )?;

        trace.mark(Section::Footer, &cursor);
        let footer = &template.footer;
        canvas.draw_text(
            footer.x,
            footer.y,
            &footer.text,
            StandardFont::HelveticaBold,
            footer.font_size,
        );

        Ok((canvas, trace))
    }

    fn layout_paragraph(
        &self,
        canvas: &mut PageCanvas,
        cursor: &mut Cursor,
        paragraph: &ParagraphSection,
    ) -> Result<(), ContextError> {
        for line in &wrap_text(&paragraph.text, paragraph.wrap_length) {
            canvas.draw_text(
                self.template.left_margin,
                cursor.y(),
                line,
                StandardFont::Helvetica,
                paragraph.font_size,
            );
            cursor.move_down(paragraph.line_pitch)?;
        }

        Ok(())
    }

    fn layout_period(
        &self,
        canvas: &mut PageCanvas,
        cursor: &mut Cursor,
        form_input: &FormInput,
    ) -> Result<(), ContextError> {
        let period = &self.template.period;
        canvas.draw_text(
            self.template.left_margin,
            cursor.y(),
            &period.label,
            StandardFont::HelveticaBold,
            period.font_size,
        );

        if form_input.continuous {
            cursor.move_down(period.empty_advance)?;
        } else {
            let period_text = form_input
                .periods
                .iter()
                .map(|label| label.to_uppercase())
                .collect::<Vec<_>>()
                .join(", ");
            let period_lines = wrap_text(&period_text, period.wrap_length);
            for (line_index, line) in period_lines.iter().enumerate() {
                canvas.draw_text(
                    period.value_x,
                    cursor.y() - line_index as f32 * period.line_pitch,
                    line,
                    StandardFont::Helvetica,
                    period.font_size,
                );
            }
            cursor.move_down(period_lines.len() as f32 * period.line_pitch + period.gap_after_values)?;
        }

        canvas.draw_rule(
            period.value_x,
            cursor.y() + period.rule_lift,
            self.template.right_edge(),
        );
        cursor.move_down(period.gap_after)
    }

    fn layout_signature(&self, canvas: &mut PageCanvas, cursor: &Cursor, form_input: &FormInput) {
        let left_margin = self.template.left_margin;
        let section = &self.template.signature;
        let y = cursor.y();
        let underline_y = y - section.underline_drop;

        canvas.draw_text(
            left_margin,
            y,
            &section.date_label,
            StandardFont::HelveticaBold,
            section.font_size,
        );
        let date_x = left_margin + section.date_value_offset;
        canvas.draw_text(
            date_x,
            y,
            &form_input.request_date,
            StandardFont::Helvetica,
            section.font_size,
        );
        canvas.draw_rule(date_x, underline_y, date_x + section.underline_width);

        let signature_x1 = date_x + section.underline_width + section.column_gap;
        let signature_x2 = signature_x1 + section.underline_width;
        canvas.draw_rule(signature_x1, underline_y, signature_x2);
        signature::composite(
            canvas,
            &form_input.signature,
            &SignatureBox {
                x: signature_x1 + section.image_offset_x,
                y,
                max_width: section.image_max_width,
                max_height: section.image_max_height,
            },
        );
        canvas.draw_centered_in_span(
            signature_x1,
            signature_x2,
            y - section.caption_drop,
            &section.signature_caption,
            StandardFont::HelveticaOblique,
            section.caption_font_size,
        );

        let name_y = y - section.name_drop;
        canvas.draw_centered_in_span(
            signature_x1,
            signature_x2,
            name_y + section.name_lift,
            &form_input.applicant_name,
            StandardFont::HelveticaBold,
            section.name_font_size,
        );
        canvas.draw_rule(signature_x1, name_y - section.underline_drop, signature_x2);
        canvas.draw_centered_in_span(
            signature_x1,
            signature_x2,
            name_y - section.caption_drop,
            &section.name_caption,
            StandardFont::HelveticaOblique,
            section.caption_font_size,
        );
    }

    fn layout_note(
        &self,
        canvas: &mut PageCanvas,
        mut cursor: Cursor,
        note: &NoteSection,
    ) -> Result<(), ContextError> {
        canvas.draw_text(
            note.label_x,
            cursor.y(),
            &note.label,
            StandardFont::HelveticaBold,
            note.label_font_size,
        );

        cursor.move_down(note.text_drop)?;
        for line in &wrap_text(&note.text, note.wrap_length) {
            canvas.draw_text(note.text_x, cursor.y(), line, StandardFont::Helvetica, note.font_size);
            cursor.move_down(note.line_pitch)?;
        }

        cursor.move_down(note.committee_gap)?;
        for (heading_index, heading) in note.committee_heading.iter().enumerate() {
            canvas.draw_text(
                note.label_x,
                cursor.y() - heading_index as f32 * note.committee_heading_pitch,
                heading,
                StandardFont::HelveticaBold,
                note.label_font_size,
            );
        }

        cursor.move_down(note.questions_gap)?;
        for question in &note.questions {
            cursor.move_down(question.advance)?;
            canvas.draw_text(
                question.x,
                cursor.y(),
                &question.text,
                StandardFont::Helvetica,
                note.font_size,
            );
        }

        Ok(())
    }

    fn layout_approval(
        &self,
        canvas: &mut PageCanvas,
        mut cursor: Cursor,
        approval: &ApprovalSection,
        approver_initials: &[Option<String>; 3],
    ) -> Result<(), ContextError> {
        let heading_y = cursor.y();
        for (heading_index, heading) in approval.heading.iter().enumerate() {
            canvas.draw_text(
                approval.x,
                heading_y - heading_index as f32 * approval.heading_pitch,
                heading,
                StandardFont::HelveticaBold,
                approval.heading_font_size,
            );
        }
        canvas.draw_text(
            approval.x,
            heading_y - approval.heading.len() as f32 * approval.heading_pitch,
            &approval.hint,
            StandardFont::HelveticaOblique,
            approval.hint_font_size,
        );

        let line_x2 = approval.x + approval.underline_width;
        cursor.move_down(approval.lines_drop)?;
        for (line_index, initials) in approver_initials.iter().enumerate() {
            if line_index > 0 {
                cursor.move_down(approval.line_pitch)?;
            }
            if let Some(initials) = initials.as_deref().filter(|initials| !initials.trim().is_empty()) {
                canvas.draw_centered_in_span(
                    approval.x,
                    line_x2,
                    cursor.y(),
                    initials,
                    StandardFont::Helvetica,
                    approval.initials_font_size,
                );
            }
            canvas.draw_rule(approval.x, cursor.y() - approval.underline_drop, line_x2);
        }

        Ok(())
    }
}
