use chrono::NaiveTime;
use scraper::{ElementRef, Html, Selector};

use pubroulette_core::{
    model::{OpeningHour, PartialVenue},
    ports::PortError,
};

const OPENING_TIMES_HEADING: &str = "Opening Times";
const FACILITIES_HEADING: &str = "Facilities";

fn selector(css: &str) -> Result<Selector, PortError> {
    Selector::parse(css).map_err(|err| PortError::Internal(format!("selector {css}: {err}")))
}

/// Extract opening times and facilities from a venue page.
///
/// Missing sections yield empty lists.
///
/// # Errors
///
/// Returns [`PortError::SourceMiss`] when any opening-times row cannot be parsed.
pub fn parse_page(html: &str) -> Result<PartialVenue, PortError> {
    let doc = Html::parse_document(html);

    let opening_times = match section(&doc, OPENING_TIMES_HEADING)? {
        Some(section) => opening_rows(section)?
            .iter()
            .map(|(day, range)| parse_row(day, range))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    let features = match section(&doc, FACILITIES_HEADING)? {
        Some(section) => facilities(section)?,
        None => Vec::new(),
    };

    Ok(PartialVenue {
        features,
        opening_times,
        ..PartialVenue::default()
    })
}

// The page is a list of <section>s, each titled by a `p.pub_heading`.
fn section<'a>(doc: &'a Html, heading: &str) -> Result<Option<ElementRef<'a>>, PortError> {
    let sections = selector("section")?;
    let title = selector("p.pub_heading")?;

    Ok(doc
        .select(&sections)
        .find(|section| section.select(&title).any(|p| text(p) == heading)))
}

fn opening_rows(section: ElementRef<'_>) -> Result<Vec<(String, String)>, PortError> {
    let rows = selector(".opening-times-table table tr")?;
    let cells = selector("td")?;

    Ok(section
        .select(&rows)
        .filter_map(|row| {
            let cols: Vec<ElementRef<'_>> = row.select(&cells).collect();
            let [day, range] = cols.as_slice() else {
                return None;
            };
            let (day, range) = (text(*day), text(*range));
            (!day.is_empty() && !range.is_empty()).then_some((day, range))
        })
        .collect())
}

fn facilities(section: ElementRef<'_>) -> Result<Vec<String>, PortError> {
    let items = selector("ul.pub_features li")?;
    let label = selector("span")?;

    Ok(section
        .select(&items)
        .filter_map(|item| item.select(&label).next().map(text))
        .filter(|name| !name.is_empty())
        .collect())
}

fn text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse one `day | range` row of the opening-times table.
///
/// # Errors
///
/// Returns [`PortError::SourceMiss`] when the range is neither `Closed` nor
/// `<open> - <close>` in 12-hour clock.
pub fn parse_row(day: &str, range: &str) -> Result<OpeningHour, PortError> {
    let day = day.trim();
    let range = range.trim();

    if range.eq_ignore_ascii_case("closed") {
        return Ok(OpeningHour::closed(day));
    }

    let Some((open, close)) = range.split_once('-') else {
        return Err(PortError::SourceMiss(format!(
            "invalid time range for {day}: {range}"
        )));
    };

    Ok(OpeningHour::open(day, parse_time(open)?, parse_time(close)?))
}

/// Parse a 12-hour clock time such as `11.30 am`, `5:00 pm`, `Noon` or `Midnight`.
///
/// # Errors
///
/// Returns [`PortError::SourceMiss`] for anything else.
pub fn parse_time(raw: &str) -> Result<NaiveTime, PortError> {
    let raw = raw.trim();

    let normalized = if raw.eq_ignore_ascii_case("noon") {
        String::from("12:00 PM")
    } else if raw.eq_ignore_ascii_case("midnight") {
        String::from("12:00 AM")
    } else {
        raw.replacen('.', ":", 1).to_ascii_uppercase()
    };
    NaiveTime::parse_from_str(&normalized, "%I:%M %p")
        .map_err(|err| PortError::SourceMiss(format!("error parsing time '{raw}': {err}")))
}
