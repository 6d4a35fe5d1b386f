use crate::common::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRef {
    column: String,
    row: u64,
}

impl CellRef {
    // Parses A1 notation (for example: B3, AA10). Letters are normalized to
    // uppercase; anything other than letters-then-digits is rejected.
    pub fn parse(input: &str) -> Result<Self, AppError> {
        if input.trim().is_empty() {
            return Err(AppError::InvalidCellAddress("address is empty".to_string()));
        }

        let mut letters = String::new();
        let mut digits = String::new();
        for ch in input.chars() {
            if ch.is_ascii_alphabetic() {
                if !digits.is_empty() {
                    return Err(AppError::InvalidCellAddress(input.to_string()));
                }
                letters.push(ch.to_ascii_uppercase());
            } else if ch.is_ascii_digit() {
                digits.push(ch);
            } else {
                return Err(AppError::InvalidCellAddress(input.to_string()));
            }
        }

        if letters.is_empty() || digits.is_empty() {
            return Err(AppError::InvalidCellAddress(input.to_string()));
        }

        let row: u64 = digits
            .parse()
            .map_err(|_| AppError::InvalidCellAddress(input.to_string()))?;
        if row == 0 {
            return Err(AppError::InvalidCellAddress(input.to_string()));
        }

        Ok(Self {
            column: letters,
            row,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn row(&self) -> u64 {
        self.row
    }

    pub fn column_index(&self) -> u64 {
        column_letters_to_index(&self.column)
    }

    pub fn to_a1(&self) -> String {
        format!("{}{}", self.column, self.row)
    }
}

// Base-26 with digits A=1..Z=26, most significant letter first, so that
// A=1, Z=26, AA=27 matches spreadsheet column ordering.
pub fn column_letters_to_index(letters: &str) -> u64 {
    letters.chars().fold(0u64, |acc, ch| {
        acc.saturating_mul(26)
            .saturating_add(u64::from(ch.to_ascii_uppercase() as u8 - b'A') + 1)
    })
}

// Ordering-only variant: a malformed address sorts as column 0 instead of
// failing, so insertion can proceed in documents that already carry bad refs.
pub fn lenient_column_index(address: &str) -> u64 {
    match CellRef::parse(address) {
        Ok(cell_ref) => cell_ref.column_index(),
        Err(_) => 0,
    }
}
