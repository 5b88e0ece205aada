/// Identifies the color of a flow. `0` is reserved for the null affiliation, i.e. a neutral cell.
pub type AffiliationID = usize;

pub(crate) const NULL_AFFILIATION: AffiliationID = 0;

/// Default display for `affiliation` when none was supplied: `A` for 1, `B` for 2, and so on up to `Z`, then `?`.
pub(crate) fn default_display(affiliation: AffiliationID) -> char {
    match affiliation {
        NULL_AFFILIATION => '.',
        aff => aff.checked_add(9)
            .and_then(|digit| u32::try_from(digit).ok())
            .and_then(|digit| char::from_digit(digit, 36))
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?'),
    }
}
