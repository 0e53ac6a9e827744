//! Common regex patterns for US tax form text recovery.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Employee name (W-2 box e)
    pub static ref W2_NAME_COMBINED: Regex = Regex::new(
        r"(?i)employee['’]?s\s+first\s+name\s+and\s+initial\s+last\s+name[^\n]*\n\s*([^\n]+)"
    ).unwrap();

    pub static ref W2_NAME_SPLIT: Regex = Regex::new(
        r"(?i)employee['’]?s\s+first\s+name\s+and\s+initial[^\n]*\n\s*([^\n]+?)[^\S\n]*\n\s*last\s+name[^\n]*\n\s*([^\n]+)"
    ).unwrap();

    pub static ref W2_NAME_WITH_ADDRESS: Regex = Regex::new(
        r"(?i)employee['’]?s\s+name,?\s+address,?\s+and\s+zip\s+code[^\n]*\n\s*([^\n]+)"
    ).unwrap();

    pub static ref W2_NAME_LABELED: Regex = Regex::new(
        r"(?i)employee['’]?s\s+name(?:[^\S\n]*:[^\S\n]*|[^\S\n]*\n\s*)([^\n]+)"
    ).unwrap();

    pub static ref EMPLOYEE_NAME_LABEL: Regex = Regex::new(
        r"(?i)\bemployee\s+name[^\S\n]*:[^\S\n]*([^\n]+)"
    ).unwrap();

    pub static ref EMPLOYEE_LABEL: Regex = Regex::new(
        r"(?i)\bemployee[^\S\n]*:[^\S\n]*([^\n]+)"
    ).unwrap();

    // Employee SSN (W-2 box a)
    pub static ref W2_SSN_DELIMITED: Regex = Regex::new(
        r"(?i)employee['’]?s\s+social\s+security\s+(?:number|no\.?)[^\d\n]*\n?[^\d\n]*(\d{3}[-\s]\d{2}[-\s]\d{4})\b"
    ).unwrap();

    pub static ref W2_SSN_CONTINUOUS: Regex = Regex::new(
        r"(?i)employee['’]?s\s+social\s+security\s+(?:number|no\.?)[^\d\n]*\n?[^\d\n]*(\d{9})\b"
    ).unwrap();

    pub static ref SSN_LABEL: Regex = Regex::new(
        r"(?i)\bSSN\b[^\S\n]*[:#]?[^\S\n]*(\d{3}-?\d{2}-?\d{4})\b"
    ).unwrap();

    pub static ref SSN_BARE: Regex = Regex::new(
        r"\b(\d{3}-\d{2}-\d{4})\b"
    ).unwrap();

    // Employee address (W-2 box f)
    pub static ref W2_ADDRESS_AFTER_NAME: Regex = Regex::new(
        r"(?i)employee['’]?s\s+name,?\s+address,?\s+and\s+zip\s+code[^\n]*\n\s*[^\n]+\n((?:[^\n]*\n)?[^\n]*\b\d{5}(?:-\d{4})?\b)"
    ).unwrap();

    pub static ref W2_ADDRESS_NEXT_LINE: Regex = Regex::new(
        r"(?i)employee['’]?s\s+address\s+and\s+zip\s+code[^\S\n]*\n\s*((?:[^\n]*\n)?[^\n]*\b\d{5}(?:-\d{4})?\b)"
    ).unwrap();

    pub static ref W2_ADDRESS_AFTER_LAST_NAME: Regex = Regex::new(
        r"(?i)\blast\s+name[^\n]*\n\s*[^\n]+\n\s*((?:[^\n]*\n)?[^\n]*\b\d{5}(?:-\d{4})?\b)"
    ).unwrap();

    pub static ref W2_ADDRESS_SAME_LINE: Regex = Regex::new(
        r"(?i)employee['’]?s\s+address(?:\s+and\s+zip\s+code)?[^\S\n]*:?[^\S\n]+([^\n]*\b\d{5}(?:-\d{4})?\b)"
    ).unwrap();

    // Wages (W-2 box 1). Group 2 is the first letter of a word following the
    // numeral, which marks the numeral as the next box label.
    pub static ref W2_WAGES_SAME_LINE: Regex = Regex::new(
        r"(?i)\b1[^\S\n]+wages,?\s+tips,?\s+(?:and\s+)?other\s+comp(?:ensation|\.)?[^\S\n]*\$?[^\S\n]*(\d[\d,]*(?:\.\d{2})?)\b(?:[^\S\n]+([A-Za-z]))?"
    ).unwrap();

    pub static ref W2_WAGES_NEXT_LINE: Regex = Regex::new(
        r"(?i)\b1[^\S\n]+wages,?\s+tips,?\s+(?:and\s+)?other\s+comp(?:ensation|\.)?[^\n]*\n\s*\$?[^\S\n]*(\d[\d,]*(?:\.\d{2})?)\b(?:[^\S\n]+([A-Za-z]))?"
    ).unwrap();

    pub static ref WAGES_UNNUMBERED: Regex = Regex::new(
        r"(?i)wages,?\s+tips,?\s+(?:and\s+)?other\s+comp(?:ensation|\.)?[^\S\n]*\$?[^\S\n]*(\d[\d,]*(?:\.\d{2})?)\b(?:[^\S\n]+([A-Za-z]))?"
    ).unwrap();

    pub static ref WAGES_NEXT_LINE_LOOSE: Regex = Regex::new(
        r"(?i)wages,?\s+tips[^\n]*\n\s*\$?[^\S\n]*(\d[\d,]*(?:\.\d{2})?)\b(?:[^\S\n]+([A-Za-z]))?"
    ).unwrap();

    // Address decomposition
    pub static ref ZIP_CODE: Regex = Regex::new(
        r"\b(\d{5}(?:-\d{4})?)\b"
    ).unwrap();

    pub static ref ZIP_ONLY: Regex = Regex::new(
        r"^\d{5}(?:-\d{4})?$"
    ).unwrap();

    pub static ref TRAILING_ZIP: Regex = Regex::new(
        r"[\s,]*\b\d{5}(?:-\d{4})?$"
    ).unwrap();

    pub static ref STATE_BEFORE_ZIP: Regex = Regex::new(
        r"\b([A-Z]{2})[\s,]+\d{5}(?:-\d{4})?\b"
    ).unwrap();

    pub static ref STATE_AT_END: Regex = Regex::new(
        r",\s*([A-Z]{2})$"
    ).unwrap();

    pub static ref STATE_MIDDLE: Regex = Regex::new(
        r" ([A-Z]{2}) "
    ).unwrap();

    pub static ref STATE_LABEL: Regex = Regex::new(
        r"(?i:state)[^\S\n]*:[^\S\n]*([A-Z]{2})\b"
    ).unwrap();

    pub static ref UNIT_PREFIX: Regex = Regex::new(
        r"(?i)^(?:#|(?:apt|apartment|unit|suite|ste|bldg|building|fl|floor|rm|room)\b)"
    ).unwrap();

    pub static ref STATE_ZIP_SEGMENT: Regex = Regex::new(
        r"^([A-Z]{2})\s+(\d{5}(?:-\d{4})?)$"
    ).unwrap();

    pub static ref CITY_STATE_ZIP_SEGMENT: Regex = Regex::new(
        r"^(.+?)\s+([A-Z]{2})\s+(\d{5}(?:-\d{4})?)$"
    ).unwrap();

    pub static ref SINGLE_LINE_ADDRESS: Regex = Regex::new(
        r"^(.*\b(?i:st|street|ave|avenue|rd|road|blvd|boulevard|dr|drive|ln|lane|ct|court|way|pl|place|pkwy|parkway|cir|circle|hwy|highway|ter|terrace|trl|trail|sq|square)\.?(?:\s+(?:(?i:apt|unit|ste|suite)\.?|#)\s*[A-Za-z0-9-]+)?)\s+([A-Za-z][A-Za-z .'-]*?)\s+([A-Z]{2})\s+(\d{5}(?:-\d{4})?)$"
    ).unwrap();

    // Whitespace and punctuation clean-up
    pub static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();

    pub static ref COMMA_RUN: Regex = Regex::new(r"\s*,(?:\s*,)+").unwrap();
}

/// USPS state, district and territory codes.
pub const US_STATE_CODES: [&str; 56] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY", "DC", "PR", "GU", "VI", "AS", "MP",
];

/// Whether `code` is a USPS state or territory code.
pub fn is_state_code(code: &str) -> bool {
    US_STATE_CODES.contains(&code)
}

/// Collapse runs of whitespace (including line breaks) to single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
}
