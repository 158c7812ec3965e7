/// Reformat typed input as a US phone number, `(XXX) XXX-XXXX`
///
/// Non-digits are dropped and anything past ten digits is cut off.
pub fn format_phone(input: &str) -> String {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).take(10).collect();

    match digits.len() {
        0 => String::new(),
        1..=3 => format!("({}", digits),
        4..=6 => format!("({}) {}", &digits[..3], &digits[3..]),
        _ => format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]),
    }
}
