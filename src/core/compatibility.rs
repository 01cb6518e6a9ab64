use crate::models::BloodGroup;

/// Donor groups that may give blood to `recipient` under ABO/Rh rules
pub fn compatible_donor_groups(recipient: BloodGroup) -> &'static [BloodGroup] {
    use BloodGroup::*;

    match recipient {
        APositive => &[APositive, ANegative, OPositive, ONegative],
        ANegative => &[ANegative, ONegative],
        BPositive => &[BPositive, BNegative, OPositive, ONegative],
        BNegative => &[BNegative, ONegative],
        // universal recipient
        AbPositive => &BloodGroup::ALL,
        AbNegative => &[AbNegative, ANegative, BNegative, ONegative],
        OPositive => &[OPositive, ONegative],
        ONegative => &[ONegative],
    }
}

/// True when a donor of group `donor` can give to `recipient`
#[inline]
pub fn can_donate_to(donor: BloodGroup, recipient: BloodGroup) -> bool {
    compatible_donor_groups(recipient).contains(&donor)
}
