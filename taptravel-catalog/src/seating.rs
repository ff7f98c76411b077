use taptravel_shared::{Gender, Seat};

/// The seat paired with the one being assigned, plus the gender it currently
/// holds (booked, or provisionally assigned in the same session).
#[derive(Debug, Clone, Copy)]
pub struct Neighbor<'a> {
    pub seat: &'a Seat,
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected { reason: String },
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Unrelated male and female riders may not sit side by side.
///
/// The check is advisory: seat state is a client-side snapshot, and the
/// backend re-validates when seats are committed.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenderConstraintResolver;

impl GenderConstraintResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_assignment(
        &self,
        seat: &Seat,
        proposed: Gender,
        neighbor: Option<Neighbor<'_>>,
    ) -> Verdict {
        let Some(neighbor) = neighbor else {
            return Verdict::Accepted;
        };
        match neighbor.gender {
            Some(required) if required != proposed => {
                tracing::debug!(
                    seat_number = %seat.seat_number,
                    neighbor = %neighbor.seat.seat_number,
                    proposed = %proposed,
                    required = %required,
                    "Gender assignment rejected"
                );
                Verdict::Rejected {
                    reason: format!("neighbor requires {}", required),
                }
            }
            _ => Verdict::Accepted,
        }
    }
}
