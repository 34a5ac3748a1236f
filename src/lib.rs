//! s205b renders the S-205b request form for the auxiliary pioneer service into a single
//! landscape PDF page, filled in with the values supplied by the applicant: the selected months or
//! the continuous service, the date of the request, the applicant name and signature and the
//! initials of the approving committee members.
//!
//! The entry point is the `DocumentAssembler`, which checks a `FormInput`, lays it out over the
//! fixed coordinates of a `FormTemplate` and returns the PDF bytes together with the file name
//! derived from the request. The rendering is deterministic: the same request always produces
//! the same bytes.

/// The greedy word wrap used by the paragraphs of the form.
pub mod wrap;

/// Advance widths and WinAnsi encoding of the standard PDF fonts used by the form.
///
/// The fonts are never embedded, so the text is measured with the same metrics any PDF reader
/// uses to draw it, which keeps the centered strings centered.
pub mod metrics;

/// The drawing primitives: text, centered text, checkboxes, rules and images, recorded onto a
/// `PageCanvas` before being written into the PDF page.
pub mod canvas;

/// Decoding and scale-to-fit placement of the applicant signature.
pub mod signature;

/// The vertical cursor of the layout, which only moves down the page.
pub mod cursor;

/// The coordinates, sizes and strings of the official form, loadable from a JSON file.
pub mod template;

/// The single-pass layout of the form sections.
pub mod layout;

/// This module contains the `ContextError` type which is the error type used throughout this library,
/// and the `FormError` type which is returned by the `DocumentAssembler`.
///
/// The `ContextError` type is always returned from a `Result` type, which means that the end user can
/// expect to obtain an explanation whenever a function returns an error. If an error happened in a function
/// which was called inside a function of this library, then the user can expect to also obtain information
/// about this propagated error.
pub mod error;

/// The module were the `PdfDocument` interface for working with PDF documents is presented.
///
/// # Disclaimer
///
/// The [specification for the PDF format](https://opensource.adobe.com/dc-acrobat-sdk-docs/pdfstandards/PDF32000_2008.pdf)
/// was briefly studied before committing to this module. The identifiers and the dates of the documents are
/// provided by the caller instead of being generated, so that the documents can be compared byte by byte.
pub mod pdf;

/// The `FormInput`, the `DocumentAssembler` and the `RenderedDocument` it produces.
pub mod document;

/// Spanish month names and dates as they are written on the form.
pub mod locale;

/// Announcing the new requests, with a Telegram implementation of the channel.
pub mod notification;

/// Handing the rendered forms over to the applicant.
pub mod delivery;
