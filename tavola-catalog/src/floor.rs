use serde::{Deserialize, Serialize};

/// The fixed set of seat positions in the dining room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatLayout {
    seats: Vec<String>,
}

impl SeatLayout {
    pub fn new(seats: Vec<String>) -> Self {
        Self { seats }
    }

    /// Four rows (A-D) of five seats.
    pub fn reference() -> Self {
        let seats = ["A", "B", "C", "D"]
            .iter()
            .flat_map(|row| (1..=5).map(move |n| format!("{}{}", row, n)))
            .collect();
        Self { seats }
    }

    pub fn contains(&self, seat_id: &str) -> bool {
        self.seats.iter().any(|s| s == seat_id)
    }

    pub fn seats(&self) -> &[String] {
        &self.seats
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }
}

impl Default for SeatLayout {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_layout() {
        let layout = SeatLayout::reference();
        assert_eq!(layout.len(), 20);
        assert_eq!(layout.seats()[0], "A1");
        assert_eq!(layout.seats()[19], "D5");
        assert!(layout.contains("C3"));
        assert!(!layout.contains("E1"));
        assert!(!layout.contains("a1"));
    }
}
