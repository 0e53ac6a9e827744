//! Free-form US address decomposition.
//!
//! An address string is split into street, city, state and ZIP parts by a
//! cascade that branches on the number of comma-separated segments:
//!
//! - three or more segments: `street, APT, ZIP`, then `..., city, STATE ZIP`,
//!   then `..., city STATE ZIP` with the last segment taken as the city;
//! - two segments: `street, city STATE ZIP`, `street, ZIP`, `street, APT`,
//!   `street city, STATE ZIP`, then `street, city`;
//! - a single segment: trailing ZIP and state tokens are removed.
//!
//! When no city is found, a single-line `street city STATE ZIP` pattern
//! anchored on a street suffix is tried. The street falls back to the whole
//! normalized input, so the original text is never dropped.

use serde::{Deserialize, Serialize};

use super::patterns::{
    collapse_whitespace, is_state_code, CITY_STATE_ZIP_SEGMENT, COMMA_RUN, SINGLE_LINE_ADDRESS,
    STATE_AT_END, STATE_BEFORE_ZIP, STATE_LABEL, STATE_MIDDLE, STATE_ZIP_SEGMENT, TRAILING_ZIP,
    UNIT_PREFIX, ZIP_CODE, ZIP_ONLY,
};

/// Components of a decomposed address. Undecidable parts are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressParts {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

/// Street/city split chosen by the segment cascade, with any state or ZIP it matched explicitly.
#[derive(Debug, Default)]
struct Split {
    street: String,
    city: String,
    state: Option<String>,
    zip_code: Option<String>,
}

impl Split {
    fn street(street: impl Into<String>) -> Self {
        Self {
            street: street.into(),
            ..Self::default()
        }
    }
}

/// Decompose `address` into its parts. `aux_text` is only consulted for a `State: XX` label.
pub fn decompose_address(address: &str, aux_text: &str) -> AddressParts {
    let normalized = normalize_address(address);
    if normalized.is_empty() {
        return AddressParts::default();
    }

    let zip_code = ZIP_CODE
        .captures(&normalized)
        .map(|c| c[1].to_string())
        .unwrap_or_default();
    let state = find_state(&normalized)
        .or_else(|| find_labeled_state(aux_text))
        .unwrap_or_default();

    let segments: Vec<&str> = normalized
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let mut split = match segments.len() {
        0 | 1 => {
            let (street, stripped_state, stripped_zip) = strip_state_and_zip(&normalized);
            Split {
                street,
                city: String::new(),
                state: stripped_state,
                zip_code: stripped_zip,
            }
        }
        2 => split_pair(segments[0], segments[1]),
        _ => split_many(&segments),
    };

    if split.city.is_empty() && normalized.contains(' ') {
        if let Some(single_line) = split_single_line(&normalized) {
            split = single_line;
        }
    }

    let street = trim_commas(&split.street);
    let city = trim_commas(&split.city);

    AddressParts {
        street: if street.is_empty() { normalized } else { street },
        city,
        state: if state.is_empty() {
            split.state.unwrap_or_default()
        } else {
            state
        },
        zip_code: split.zip_code.unwrap_or(zip_code),
    }
}

/// Trim, collapse whitespace runs and collapse repeated commas.
pub fn normalize_address(address: &str) -> String {
    let collapsed = collapse_whitespace(address);
    let commas = COMMA_RUN.replace_all(&collapsed, ",");
    commas.trim().to_string()
}

/// State code from the address itself: before the ZIP, after a final comma, or between spaces.
fn find_state(address: &str) -> Option<String> {
    let before_zip = STATE_BEFORE_ZIP
        .captures_iter(address)
        .map(|c| c[1].to_string())
        .find(|s| is_state_code(s));
    if before_zip.is_some() {
        return before_zip;
    }

    let at_end = STATE_AT_END
        .captures(address)
        .map(|c| c[1].to_string())
        .filter(|s| is_state_code(s));
    if at_end.is_some() {
        return at_end;
    }

    STATE_MIDDLE
        .captures_iter(address)
        .map(|c| c[1].to_string())
        .find(|s| is_state_code(s))
}

/// State code from an explicit `State: XX` label in auxiliary text.
fn find_labeled_state(text: &str) -> Option<String> {
    STATE_LABEL
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .find(|s| is_state_code(s))
}

fn split_many(segments: &[&str]) -> Split {
    let n = segments.len();
    let last = segments[n - 1];
    let before_last = segments[n - 2];

    if ZIP_ONLY.is_match(last) && UNIT_PREFIX.is_match(before_last) {
        return Split::street(segments[..n - 1].join(", "));
    }

    if let Some(caps) = STATE_ZIP_SEGMENT.captures(last) {
        if is_state_code(&caps[1]) {
            return Split {
                street: segments[..n - 2].join(", "),
                city: before_last.to_string(),
                state: Some(caps[1].to_string()),
                zip_code: Some(caps[2].to_string()),
            };
        }
    }

    let (city, state, zip_code) = strip_state_and_zip(last);
    if city.is_empty() {
        // The last segment held only a state and/or ZIP.
        Split {
            street: segments[..n - 2].join(", "),
            city: before_last.to_string(),
            state,
            zip_code,
        }
    } else {
        Split {
            street: segments[..n - 1].join(", "),
            city,
            state,
            zip_code,
        }
    }
}

fn split_pair(first: &str, second: &str) -> Split {
    if let Some(caps) = CITY_STATE_ZIP_SEGMENT.captures(second) {
        if is_state_code(&caps[2]) {
            return Split {
                street: first.to_string(),
                city: caps[1].to_string(),
                state: Some(caps[2].to_string()),
                zip_code: Some(caps[3].to_string()),
            };
        }
    }

    if ZIP_ONLY.is_match(second) {
        return Split::street(first);
    }

    if UNIT_PREFIX.is_match(second) {
        return Split::street(format!("{}, {}", first, second));
    }

    if let Some(caps) = STATE_ZIP_SEGMENT.captures(second) {
        if is_state_code(&caps[1]) {
            return Split {
                street: first.to_string(),
                state: Some(caps[1].to_string()),
                zip_code: Some(caps[2].to_string()),
                ..Split::default()
            };
        }
    }

    let (city, state, zip_code) = strip_state_and_zip(second);
    Split {
        street: first.to_string(),
        city,
        state,
        zip_code,
    }
}

/// `street city STATE ZIP` on one line, with commas treated as spaces.
fn split_single_line(address: &str) -> Option<Split> {
    let flattened = collapse_whitespace(&address.replace(',', " "));
    let caps = SINGLE_LINE_ADDRESS.captures(&flattened)?;
    if !is_state_code(&caps[3]) {
        return None;
    }

    Some(Split {
        street: caps[1].to_string(),
        city: caps[2].to_string(),
        state: Some(caps[3].to_string()),
        zip_code: Some(caps[4].to_string()),
    })
}

/// Remove a trailing ZIP, then a trailing state code. Returns the rest, the state and the ZIP removed.
fn strip_state_and_zip(segment: &str) -> (String, Option<String>, Option<String>) {
    let (without_zip, zip_code) = match TRAILING_ZIP.find(segment) {
        Some(m) => (
            &segment[..m.start()],
            Some(m.as_str().trim_start_matches([' ', ',']).to_string()),
        ),
        None => (segment, None),
    };
    let without_zip = trim_commas(without_zip);

    let (rest, last_token) = match without_zip.rsplit_once(' ') {
        Some((rest, token)) => (rest, token),
        None => ("", without_zip.as_str()),
    };

    if is_state_code(last_token) {
        (trim_commas(rest), Some(last_token.to_string()), zip_code)
    } else {
        (without_zip, None, zip_code)
    }
}

fn trim_commas(s: &str) -> String {
    s.trim().trim_end_matches(',').trim().to_string()
}
