/// Row/column encoded in a seat number such as `"R3-2"`.
///
/// Everything before the last `-` names the row; the part after it is a
/// 1-based column. Seats sit in pairs along a row: columns (1, 2), (3, 4), ...
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeatPosition {
    pub row: String,
    pub column: u32,
}

impl SeatPosition {
    pub fn parse(seat_number: &str) -> Option<Self> {
        let (row, column) = seat_number.rsplit_once('-')?;
        let row = row.trim();
        if row.is_empty() {
            return None;
        }
        let column: u32 = column.trim().parse().ok()?;
        if column == 0 {
            return None;
        }
        Some(Self {
            row: row.to_string(),
            column,
        })
    }

    /// Position of the seat sharing this seat's pair. `None` when the pair
    /// would fall outside the column range.
    pub fn partner(&self) -> Option<Self> {
        let column = if self.column % 2 == 1 {
            self.column.checked_add(1)?
        } else {
            self.column.checked_sub(1)?
        };
        Some(Self {
            row: self.row.clone(),
            column,
        })
    }
}

/// Short label shown to riders: the column part of the seat number.
pub fn label(seat_number: &str) -> &str {
    seat_number
        .rsplit_once('-')
        .map(|(_, column)| column)
        .unwrap_or(seat_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positions() {
        let pos = SeatPosition::parse("R3-2").unwrap();
        assert_eq!(pos.row, "R3");
        assert_eq!(pos.column, 2);

        // Only the last dash separates the column
        let pos = SeatPosition::parse("UPPER-A-7").unwrap();
        assert_eq!(pos.row, "UPPER-A");
        assert_eq!(pos.column, 7);

        assert!(SeatPosition::parse("12").is_none());
        assert!(SeatPosition::parse("-4").is_none());
        assert!(SeatPosition::parse("R1-0").is_none());
        assert!(SeatPosition::parse("R1-x").is_none());
    }

    #[test]
    fn test_partner_pairs() {
        let first = SeatPosition::parse("R1-1").unwrap();
        assert_eq!(first.partner().unwrap().column, 2);
        assert_eq!(first.partner().and_then(|p| p.partner()), Some(first));

        let fourth = SeatPosition::parse("R1-4").unwrap();
        assert_eq!(fourth.partner().unwrap().column, 3);

        // Odd last column has no pair to move into
        let last = SeatPosition::parse("R1-4294967295").unwrap();
        assert_eq!(last.column, u32::MAX);
        assert!(last.partner().is_none());
    }

    #[test]
    fn test_label() {
        assert_eq!(label("R3-2"), "2");
        assert_eq!(label("7"), "7");
    }
}
