use lopdf::content::Operation;
use lopdf::{Object, StringFormat};
use std::{collections::BTreeMap, io::BufWriter, mem};
use time::OffsetDateTime;

use crate::error::ContextError;
use crate::metrics::StandardFont;

/// The low-level image representation for a PDF document. The color samples and the alpha
/// samples are stored as two separate images, the latter being referenced as the soft mask of
/// the former, and both are compressed losslessly when the document is written.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageXObject {
    /// Width of the image in pixels (original width, not scaled width).
    pub width: u32,
    /// Height of the image in pixels (original height, not scaled height).
    pub height: u32,
    /// Bits per color component, 8 for all the images produced by this crate.
    pub bits_per_component: u8,
    /// Should the image be interpolated when scaled?
    pub interpolate: bool,
    /// The RGB samples of the image, row by row.
    pub image_data: Vec<u8>,
    /// The alpha samples of the image, if `None` the image is fully opaque.
    pub soft_mask_data: Option<Vec<u8>>,
}

impl ImageXObject {
    /// Inserts the image (and its soft mask, if any) into the document and returns the identifier
    /// of the image stream.
    fn insert_into_document(&self, inner_document: &mut lopdf::Document) -> lopdf::ObjectId {
        use lopdf::Object::*;

        let mut image_dictionary = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("XObject".into())),
            ("Subtype", Name("Image".into())),
            ("Width", Integer(i64::from(self.width))),
            ("Height", Integer(i64::from(self.height))),
            ("ColorSpace", Name("DeviceRGB".into())),
            ("BitsPerComponent", Integer(i64::from(self.bits_per_component))),
            ("Interpolate", Boolean(self.interpolate)),
        ]);

        if let Some(soft_mask_data) = &self.soft_mask_data {
            let soft_mask_dictionary = lopdf::Dictionary::from_iter(vec![
                ("Type", Name("XObject".into())),
                ("Subtype", Name("Image".into())),
                ("Width", Integer(i64::from(self.width))),
                ("Height", Integer(i64::from(self.height))),
                ("ColorSpace", Name("DeviceGray".into())),
                ("BitsPerComponent", Integer(i64::from(self.bits_per_component))),
            ]);
            let soft_mask_id = inner_document
                .add_object(lopdf::Stream::new(soft_mask_dictionary, soft_mask_data.clone()));
            image_dictionary.set("SMask", Reference(soft_mask_id));
        }

        inner_document.add_object(lopdf::Stream::new(image_dictionary, self.image_data.clone()))
    }
}

/// `XObject`s are parts of the PDF specification. They allow for complex behavior to be
/// inserted into the PDF document, this implementation only covers images.
#[derive(Debug, Clone, PartialEq)]
pub enum XObject {
    Image(ImageXObject),
}

/// Named reference to an `XObject`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct XObjectReference(String);

impl XObjectReference {
    /// Creates a new reference for an `XObject` from a number.
    pub fn new(index: usize) -> Self {
        Self(format!("Im{index}"))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// The association between the `XObject`s names and the actual `XObject`s themselves. It is
/// ordered so that the objects are always inserted into the document in the same order.
#[derive(Default, Debug, Clone)]
pub struct XObjectMap(BTreeMap<String, XObject>);

impl XObjectMap {
    /// Inserts the `XObject`s into the document, simultaneously constructing a PDF dictionary of them.
    pub fn into_with_document(&self, document: &mut lopdf::Document) -> lopdf::Dictionary {
        self.0
            .iter()
            .map(|(name, object)| {
                let object_id = match object {
                    XObject::Image(image) => image.insert_into_document(document),
                };
                (name.clone(), lopdf::Object::Reference(object_id))
            })
            .collect()
    }
}

/// Struct for storing the PDF Resources, to be used on a PDF page.
#[derive(Default, Debug, Clone)]
pub(crate) struct PdfResources {
    /// External graphics objects.
    pub xobjects: XObjectMap,
}

/// The representation of a PDF page, with its size in points and the content operations drawing it.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// Page width in points.
    pub width: f32,
    /// Page height in points.
    pub height: f32,
    /// The operations of the content stream of the page.
    pub(crate) operations: Vec<Operation>,
    /// Resources used in this page.
    pub(crate) resources: PdfResources,
}

/// This struct represents the actual PDF document on a high-level. It is an interface to the
/// underlying `lopdf::Document` with the addition of the pages and the document information.
///
/// Only the standard Helvetica faces are used for text, so no font is ever embedded. Nothing in
/// the output depends on the clock or on randomness: the identifiers and the dates are provided
/// by the caller, so the same inputs always produce the same bytes.
pub struct PdfDocument {
    /// The underlying PDF document: this is a low-level interface and shouldn't be directly
    /// interacted with unless strictly necessary.
    pub inner_document: lopdf::Document,
    /// The identifier of the document, it is used to in order to set the PDF `ID` tag.
    pub identifier: String,
    pub title: String,
    pub author: String,
    pub producer: String,
    pub creation_date: OffsetDateTime,
    /// The pages of the PDF document.
    pub(crate) pages: Vec<PdfPage>,
}

impl PdfDocument {
    /// Create a new `PdfDocument` by defaulting the underlying PDF document to version 1.5
    /// of the PDF specification and customly specifying the PDF identifier.
    pub fn new(pdf_document_identifier: String) -> Self {
        PdfDocument {
            inner_document: lopdf::Document::with_version("1.5"),
            identifier: pdf_document_identifier,
            title: String::new(),
            author: String::new(),
            producer: String::new(),
            creation_date: OffsetDateTime::UNIX_EPOCH,
            pages: Vec::new(),
        }
    }

    /// Adds an empty page of the given width and height in points and returns its index, which is
    /// to be passed to the other functions when drawing on the page.
    pub fn add_page(&mut self, page_width: f32, page_height: f32) -> usize {
        self.pages.push(PdfPage {
            width: page_width,
            height: page_height,
            operations: Vec::new(),
            resources: PdfResources::default(),
        });

        self.pages.len() - 1
    }

    /// Appends the given content operations to the specified page.
    pub fn add_operations_to_page(
        &mut self,
        page_index: usize,
        operations: Vec<Operation>,
    ) -> Result<(), ContextError> {
        self.get_mut_page(page_index)?.operations.extend(operations);

        Ok(())
    }

    /// Registers an image in the resources of the page and returns the name to draw it with.
    pub fn add_image_to_page(
        &mut self,
        page_index: usize,
        image: ImageXObject,
    ) -> Result<XObjectReference, ContextError> {
        let pdf_page = self.get_mut_page(page_index)?;
        let reference = XObjectReference::new(pdf_page.resources.xobjects.0.len());
        pdf_page
            .resources
            .xobjects
            .0
            .insert(reference.0.clone(), XObject::Image(image));

        Ok(reference)
    }

    /// Write the pages so far specified into the underlying document and finalize it.
    pub fn write_all(&mut self, instance_id: String) -> Result<(), ContextError> {
        use lopdf::Object::*;
        use lopdf::StringFormat::*;

        let creation_date = String(
            to_pdf_timestamp_format(&self.creation_date).into_bytes(),
            Literal,
        );
        let document_info = lopdf::Dictionary::from_iter(vec![
            ("Title", text_string(&self.title)),
            ("Author", text_string(&self.author)),
            ("Creator", text_string(&self.producer)),
            ("Producer", text_string(&self.producer)),
            ("CreationDate", creation_date.clone()),
            ("ModDate", creation_date),
            ("Trapped", Name("False".into())),
        ]);
        let document_info_id = self.inner_document.add_object(Dictionary(document_info));

        let pages_id = self.inner_document.new_object_id();
        let catalog = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("Catalog".into())),
            ("PageLayout", Name("OneColumn".into())),
            ("PageMode", Name("UseNone".into())),
            ("Pages", Reference(pages_id)),
        ]);
        let catalog_id = self.inner_document.add_object(catalog);

        self.inner_document
            .trailer
            .set("Root", Reference(catalog_id));
        self.inner_document
            .trailer
            .set("Info", Reference(document_info_id));
        self.inner_document.trailer.set(
            "ID",
            Array(vec![
                String(self.identifier.clone().into_bytes(), Literal),
                String(instance_id.into_bytes(), Literal),
            ]),
        );

        let fonts_dictionary = self.insert_fonts_into_document();
        let fonts_dictionary_id = self.inner_document.add_object(fonts_dictionary);

        let mut page_ids = Vec::<lopdf::Object>::new();
        let pages = mem::take(&mut self.pages);
        for page in pages.iter() {
            let mut resource_dictionary = lopdf::Dictionary::new();
            resource_dictionary.set("Font", Reference(fonts_dictionary_id));
            let xobjects_dictionary = page
                .resources
                .xobjects
                .into_with_document(&mut self.inner_document);
            if !xobjects_dictionary.is_empty() {
                resource_dictionary.set("XObject", Dictionary(xobjects_dictionary));
            }
            let resources_page_id = self
                .inner_document
                .add_object(Dictionary(resource_dictionary));

            let page_content = lopdf::content::Content {
                operations: page.operations.clone(),
            }
            .encode()
            .map_err(|error| {
                ContextError::with_error("Failed to encode the content of the page", &error)
            })?;
            // Page contents are not compressed, only the images are
            let page_content_id = self.inner_document.add_object(
                lopdf::Stream::new(lopdf::Dictionary::new(), page_content)
                    .with_compression(false),
            );

            let media_box: lopdf::Object =
                vec![Integer(0), Integer(0), page.width.into(), page.height.into()].into();
            let page_dictionary = lopdf::Dictionary::from_iter(vec![
                ("Type", Name("Page".into())),
                ("Rotate", Integer(0)),
                ("MediaBox", media_box.clone()),
                ("TrimBox", media_box.clone()),
                ("CropBox", media_box),
                ("Parent", Reference(pages_id)),
                ("Resources", Reference(resources_page_id)),
                ("Contents", Reference(page_content_id)),
            ]);
            let page_id = self.inner_document.add_object(page_dictionary);
            page_ids.push(Reference(page_id));
        }

        let pages_dictionary = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("Pages".into())),
            ("Count", Integer(page_ids.len() as i64)),
            ("Kids", Array(page_ids)),
        ]);
        self.inner_document
            .objects
            .insert(pages_id, Dictionary(pages_dictionary));

        // Only the image streams allow compression, which is lossless
        self.inner_document.compress();
        self.pages = pages;

        Ok(())
    }

    /// Save the `PdfDocument` to bytes in order for it to be written to a file or further processed.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, ContextError> {
        let mut pdf_document_bytes = Vec::new();
        let mut writer = BufWriter::new(&mut pdf_document_bytes);
        self.inner_document.save_to(&mut writer).map_err(|error| {
            ContextError::with_error("Error while saving the PDF document to bytes", &error)
        })?;
        mem::drop(writer);

        Ok(pdf_document_bytes)
    }

    /// Constructs the dictionary of the standard fonts, inserting each of them into the document.
    fn insert_fonts_into_document(&mut self) -> lopdf::Dictionary {
        use lopdf::Object::*;

        let mut font_dictionary = lopdf::Dictionary::new();
        for font in StandardFont::ALL {
            let font_object_id = self
                .inner_document
                .add_object(lopdf::Dictionary::from_iter(vec![
                    ("Type", Name("Font".into())),
                    ("Subtype", Name("Type1".into())),
                    ("BaseFont", Name(font.base_font().into())),
                    ("Encoding", Name("WinAnsiEncoding".into())),
                ]));
            font_dictionary.set(font.resource_name(), Reference(font_object_id));
        }

        font_dictionary
    }

    // Retrieve the page with the given index.
    fn get_mut_page(&mut self, page_index: usize) -> Result<&mut PdfPage, ContextError> {
        self.pages
            .get_mut(page_index)
            .ok_or(ContextError::with_context(format!(
                "Failed to find the page with index {}",
                page_index
            )))
    }
}

/// Encodes a text string of the document information, using UTF-16 only when needed.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
    } else {
        let mut bytes = vec![0xfe, 0xff];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

/// Formats the given time so that it matches what the PDF specification expects.
/// An example of it is the following: D:20170505150224+02'00'.
pub fn to_pdf_timestamp_format(date: &OffsetDateTime) -> String {
    let offset = date.offset();
    let offset_sign = if offset.is_negative() { '-' } else { '+' };
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}{offset_sign}{:02}'{:02}'",
        date.year(),
        u8::from(date.month()),
        date.day(),
        date.hour(),
        date.minute(),
        date.second(),
        offset.whole_hours().abs(),
        offset.minutes_past_hour().abs(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_follow_the_pdf_date_format() {
        let date = OffsetDateTime::from_unix_timestamp(1_776_340_800).unwrap();

        assert_eq!(to_pdf_timestamp_format(&date), "D:20260416120000+00'00'");
        assert_eq!(
            to_pdf_timestamp_format(&OffsetDateTime::UNIX_EPOCH),
            "D:19700101000000+00'00'"
        );
    }

    #[test]
    fn non_ascii_text_strings_are_utf16_encoded() {
        assert_eq!(
            text_string("Ñ"),
            Object::String(vec![0xfe, 0xff, 0x00, 0xd1], StringFormat::Hexadecimal)
        );
        assert_eq!(
            text_string("JUNIO"),
            Object::String(b"JUNIO".to_vec(), StringFormat::Literal)
        );
    }

    #[test]
    fn missing_page_is_an_error() {
        let mut pdf_document = PdfDocument::new("identifier".into());

        let error = pdf_document
            .add_operations_to_page(3, vec![Operation::new("S", vec![])])
            .unwrap_err();
        assert_eq!(error.context, "Failed to find the page with index 3");
    }

    #[test]
    fn written_document_can_be_parsed_back() {
        let mut pdf_document = PdfDocument::new("identifier".into());
        pdf_document.title = "MARZO-ANA.pdf".into();
        let page_index = pdf_document.add_page(792.0, 612.0);
        pdf_document
            .add_operations_to_page(
                page_index,
                vec![
                    Operation::new("m", vec![Object::Integer(72), Object::Integer(30)]),
                    Operation::new("l", vec![Object::Integer(720), Object::Integer(30)]),
                    Operation::new("S", vec![]),
                ],
            )
            .unwrap();
        let reference = pdf_document
            .add_image_to_page(
                page_index,
                ImageXObject {
                    width: 2,
                    height: 1,
                    bits_per_component: 8,
                    interpolate: false,
                    image_data: vec![0, 0, 0, 255, 255, 255],
                    soft_mask_data: Some(vec![255, 0]),
                },
            )
            .unwrap();
        assert_eq!(reference.name(), "Im0");

        pdf_document.write_all("instance".into()).unwrap();
        let bytes = pdf_document.save_to_bytes().unwrap();

        let parsed = lopdf::Document::load_mem(&bytes).unwrap();
        let pages = parsed.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = pages[&1];
        let content = lopdf::content::Content::decode(&parsed.get_page_content(page_id).unwrap())
            .unwrap();
        let operators: Vec<_> = content
            .operations
            .iter()
            .map(|operation| operation.operator.as_str())
            .collect();
        assert_eq!(operators, ["m", "l", "S"]);
    }
}
