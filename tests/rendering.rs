use lopdf::Object;

use s205b::document::{DocumentAssembler, FormInput, RenderedDocument, CONTINUOUS_SENTINEL};
use s205b::error::FormError;
use s205b::signature::{PixelBuffer, Signature};
use s205b::template::FormTemplate;
use s205b::wrap::wrap_text;

#[derive(Debug, Clone, PartialEq)]
struct DrawnText {
    text: String,
    font: String,
    font_size: f32,
    x: f32,
    y: f32,
}

fn initialize_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn signature_buffer(width: u32, height: u32) -> PixelBuffer {
    let data = (0..width * height)
        .flat_map(|index| {
            let alpha = if index % 3 == 0 { 255 } else { 0 };
            [20, 20, 20, alpha]
        })
        .collect();

    PixelBuffer {
        width,
        height,
        data,
    }
}

fn junio_request() -> FormInput {
    FormInput::new(
        vec!["Junio".to_string()],
        false,
        "16 de octubre de 2026",
        "Juan Perez",
        [Some("JMP".to_string()), Some(String::new()), None],
        Signature::Present(signature_buffer(32, 32)),
    )
}

fn continuous_request() -> FormInput {
    FormInput::new(
        Vec::new(),
        true,
        "16 de octubre de 2026",
        "Ana Ruiz",
        [None, None, None],
        Signature::Present(signature_buffer(120, 40)),
    )
}

fn render(form_input: &FormInput) -> RenderedDocument {
    initialize_logging();
    DocumentAssembler::new(FormTemplate::default())
        .assemble(form_input)
        .unwrap()
}

fn number(object: &Object) -> f32 {
    match object {
        Object::Integer(value) => *value as f32,
        Object::Real(value) => *value,
        _ => panic!("The operand {:?} is not a number", object),
    }
}

fn assert_close(left: f32, right: f32) {
    assert!((left - right).abs() < 1e-2, "{left} != {right}");
}

fn load_single_page(bytes: &[u8]) -> (lopdf::Document, lopdf::ObjectId) {
    let document = lopdf::Document::load_mem(bytes).unwrap();
    let pages = document.get_pages();
    assert_eq!(pages.len(), 1);
    let page_id = pages[&1];

    (document, page_id)
}

fn page_operations(bytes: &[u8]) -> Vec<lopdf::content::Operation> {
    let (document, page_id) = load_single_page(bytes);
    let content = document.get_page_content(page_id).unwrap();

    lopdf::content::Content::decode(&content).unwrap().operations
}

fn drawn_texts(bytes: &[u8]) -> Vec<DrawnText> {
    let mut texts = Vec::new();
    let (mut font, mut font_size, mut x, mut y) = (String::new(), 0.0, 0.0, 0.0);
    for operation in page_operations(bytes) {
        match operation.operator.as_str() {
            "Tf" => {
                font = String::from_utf8(operation.operands[0].as_name().unwrap().to_vec()).unwrap();
                font_size = number(&operation.operands[1]);
            }
            "Td" => {
                x = number(&operation.operands[0]);
                y = number(&operation.operands[1]);
            }
            "Tj" => {
                // Every byte of the WinAnsi strings used below has the same value as its codepoint
                let text = operation.operands[0]
                    .as_str()
                    .unwrap()
                    .iter()
                    .map(|byte| *byte as char)
                    .collect();
                texts.push(DrawnText {
                    text,
                    font: font.clone(),
                    font_size,
                    x,
                    y,
                });
            }
            _ => (),
        }
    }

    texts
}

fn drawn_lines(bytes: &[u8]) -> Vec<(f32, f32, f32, f32)> {
    let operations = page_operations(bytes);
    operations
        .windows(2)
        .filter(|pair| pair[0].operator == "m" && pair[1].operator == "l")
        .map(|pair| {
            (
                number(&pair[0].operands[0]),
                number(&pair[0].operands[1]),
                number(&pair[1].operands[0]),
                number(&pair[1].operands[1]),
            )
        })
        .collect()
}

#[test]
fn junio_request_is_rendered_with_one_initialed_line() {
    let document = render(&junio_request());

    assert_eq!(document.file_name(), "JUNIO-JUAN_PEREZ.pdf");
    let texts = drawn_texts(document.bytes());
    let periods: Vec<_> = texts.iter().filter(|text| text.text.contains("JUNIO")).collect();
    assert_eq!(periods.len(), 1);
    assert_eq!((periods[0].x, periods[0].font.as_str()), (200.0, "F1"));

    let initials: Vec<_> = texts
        .iter()
        .filter(|text| text.font == "F1" && text.font_size == 14.0)
        .collect();
    assert_eq!(initials.len(), 1);
    assert_eq!(initials[0].text, "JMP");
    assert!(initials[0].x > 450.0 && initials[0].x < 580.0);

    assert!(texts.iter().any(|text| text.text == "JUAN PEREZ" && text.font == "F2"));
    assert!(texts.iter().all(|text| text.text != "X"));
}

#[test]
fn continuous_request_checks_the_box_and_leaves_the_period_line_blank() {
    let template = FormTemplate::default();
    let intro_lines = wrap_text(&template.intro.text, template.intro.wrap_length).len() as f32;
    let form_input = continuous_request();
    assert_eq!(form_input.periods, [CONTINUOUS_SENTINEL]);

    let document = render(&form_input);

    assert!(document.file_name().starts_with("CONTINUOUS-"));
    let texts = drawn_texts(document.bytes());
    assert!(texts.iter().all(|text| text.x != 200.0));
    assert!(texts.iter().all(|text| !text.text.contains(CONTINUOUS_SENTINEL)));
    let check_mark = texts
        .iter()
        .find(|text| text.text == "X")
        .expect("the continuous box is checked");
    assert_eq!((check_mark.font.as_str(), check_mark.font_size), ("F2", 9.0));

    let (rule_x1, rule_y, rule_x2, _) = drawn_lines(document.bytes())[0];
    assert_eq!((rule_x1, rule_x2), (200.0, 720.0));
    assert_close(rule_y, 612.0 - 50.0 - 35.0 - 14.0 * intro_lines - 10.0 - 12.0 + 5.0);
}

#[test]
fn rendering_is_deterministic() {
    let first = render(&junio_request());
    let second = render(&junio_request());

    assert_eq!(first, second);
    assert_ne!(first.bytes(), render(&continuous_request()).bytes());
}

#[test]
fn document_title_is_the_file_name() {
    let document = render(&junio_request());

    let (pdf_document, _) = load_single_page(document.bytes());
    let information_id = pdf_document
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .unwrap();
    let information = pdf_document.get_dictionary(information_id).unwrap();
    assert_eq!(
        information.get(b"Title").and_then(Object::as_str).unwrap(),
        b"JUNIO-JUAN_PEREZ.pdf"
    );
    assert_eq!(
        information.get(b"CreationDate").and_then(Object::as_str).unwrap(),
        b"D:19700101000000+00'00'"
    );
}

#[test]
fn signature_is_embedded_with_its_transparency() {
    let document = render(&continuous_request());

    let (pdf_document, page_id) = load_single_page(document.bytes());
    let page = pdf_document.get_dictionary(page_id).unwrap();
    let resources_id = page.get(b"Resources").and_then(Object::as_reference).unwrap();
    let resources = pdf_document.get_dictionary(resources_id).unwrap();
    let xobjects = resources.get(b"XObject").and_then(Object::as_dict).unwrap();
    let image_id = xobjects.get(b"Im0").and_then(Object::as_reference).unwrap();
    let image = pdf_document.get_object(image_id).and_then(Object::as_stream).unwrap();
    assert_eq!(image.dict.get(b"Width").and_then(Object::as_i64).unwrap(), 120);
    assert!(image.dict.get(b"SMask").is_ok());

    // A 120x40 signature fills the height of the 200x50 box and is centered horizontally
    let operations = page_operations(document.bytes());
    let matrix = operations
        .iter()
        .find(|operation| operation.operator == "cm")
        .unwrap();
    let operands: Vec<_> = matrix.operands.iter().map(number).collect();
    assert_close(operands[0], 150.0);
    assert_close(operands[3], 50.0);
    assert_close(operands[4], 417.0 + 25.0 + 25.0);
    assert!(operations.iter().any(|operation| operation.operator == "Do"));
}

#[test]
fn malformed_signature_renders_a_blank_signature_area() {
    let mut form_input = junio_request();
    form_input.signature = Signature::Present(PixelBuffer {
        width: 32,
        height: 32,
        data: vec![0; 32 * 32 * 3],
    });

    let document = render(&form_input);

    let operations = page_operations(document.bytes());
    assert!(operations.iter().all(|operation| operation.operator != "Do"));
}

#[test]
fn missing_signature_is_a_validation_error() {
    initialize_logging();
    let mut form_input = junio_request();
    form_input.signature = Signature::Absent;

    let error = DocumentAssembler::new(FormTemplate::default())
        .assemble(&form_input)
        .unwrap_err();

    assert!(matches!(error, FormError::Validation(_)));
    similar_asserts::assert_eq!(
        error.to_string(),
        "Invalid request: The signature of the applicant is missing"
    );
}

#[test]
fn template_files_override_the_defaults() {
    let template_path = std::env::temp_dir().join(format!("s205b-template-{}.json", std::process::id()));
    std::fs::write(&template_path, r#"{ "footer": { "text": "S-205b-E  4/15" } }"#).unwrap();
    let template = FormTemplate::from_path(&template_path).unwrap();
    std::fs::remove_file(&template_path).unwrap();

    let document = DocumentAssembler::new(template)
        .assemble(&junio_request())
        .unwrap();

    let texts = drawn_texts(document.bytes());
    let footer = texts.iter().find(|text| text.text.starts_with("S-205b")).unwrap();
    assert_eq!(
        (footer.text.as_str(), footer.x, footer.y),
        ("S-205b-E  4/15", 72.0, 30.0)
    );
}

#[test]
fn requests_read_from_json_are_drawn_upper_cased() {
    let form_input: FormInput = serde_json::from_str(
        r#"{
            "periods": ["Junio"],
            "continuous": false,
            "requestDate": "16 de octubre de 2026",
            "applicantName": "juan perez",
            "approverInitials": ["jmp", null, null],
            "signature": { "present": { "width": 1, "height": 1, "data": [0, 0, 0, 255] } }
        }"#,
    )
    .unwrap();

    let document = render(&form_input);

    let texts = drawn_texts(document.bytes());
    assert!(texts.iter().any(|text| text.text == "JUAN PEREZ" && text.font == "F2"));
    assert!(texts.iter().any(|text| text.text == "JMP" && text.font_size == 14.0));
    assert!(texts.iter().all(|text| text.text != "juan perez" && text.text != "jmp"));
}
