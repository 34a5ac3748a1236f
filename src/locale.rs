use time::{Date, Month};

/// The calendar months as they are offered to the applicant, in calendar order.
pub const MONTHS: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

pub fn month_label(month: Month) -> &'static str {
    MONTHS[usize::from(u8::from(month)) - 1]
}

/// Formats a date the way it is written on the form, e.g. "16 de octubre de 2026".
pub fn format_request_date(date: Date) -> String {
    format!(
        "{} de {} de {}",
        date.day(),
        month_label(date.month()).to_lowercase(),
        date.year()
    )
}

/// Finds the month with the given label, whatever its case.
pub fn parse_month(label: &str) -> Option<Month> {
    let position = MONTHS
        .iter()
        .position(|month| month.eq_ignore_ascii_case(label.trim()))?;
    Month::try_from(position as u8 + 1).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_dates_are_written_in_spanish() {
        let date = Date::from_calendar_date(2026, Month::October, 16).unwrap();
        assert_eq!(format_request_date(date), "16 de octubre de 2026");

        let date = Date::from_calendar_date(2025, Month::January, 3).unwrap();
        assert_eq!(format_request_date(date), "3 de enero de 2025");
    }

    #[test]
    fn month_labels_round_trip_through_parsing() {
        assert_eq!(parse_month("JUNIO"), Some(Month::June));
        assert_eq!(parse_month(" septiembre "), Some(Month::September));
        assert_eq!(parse_month("CONTINUOUS"), None);
        assert_eq!(month_label(Month::December), "Diciembre");
    }
}
