//! Spreadsheet-style labels for grid columns and cells.

/// Convert a zero-based column index to its alphabetic label: 0 is "A",
/// 25 is "Z", 26 is "AA", 701 is "ZZ", 702 is "AAA".
///
/// This is bijective base-26: no letter stands for zero, which is exactly
/// what makes the sequence line up with spreadsheet column headers.
#[must_use]
pub fn column_label(index: u32) -> String {
    let mut n = u64::from(index) + 1;
    let mut label = String::new();
    while n > 0 {
        n -= 1;
        label.push(char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    label.chars().rev().collect()
}

/// Compose the canonical cell code for a zero-based (column, row) pair:
/// column label followed by the 1-based row number, e.g. (0, 0) is "A1"
/// and (26, 1) is "AA2".
#[must_use]
pub fn cell_code(col: u32, row: u32) -> String {
    format!("{}{}", column_label(col), row + 1)
}

/// Check whether a string is a well-formed cell code: one or more ASCII
/// uppercase letters followed by a row number with no leading zero.
#[must_use]
pub fn is_valid_cell_code(code: &str) -> bool {
    let letters_end = code
        .find(|c: char| !c.is_ascii_uppercase())
        .unwrap_or(code.len());
    if letters_end == 0 {
        return false;
    }
    let digits = &code[letters_end..];
    !digits.is_empty() && !digits.starts_with('0') && digits.chars().all(|c| c.is_ascii_digit())
}
