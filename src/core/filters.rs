use crate::core::compatibility::{can_donate_to, compatible_donor_groups};
use crate::core::distance::is_within_bounding_box;
use chrono::NaiveDate;

use crate::models::{
    BloodGroup, BloodRequest, Campaign, CampaignFilter, Donor, DonorFilter, DonorQuery,
    GroupFilter, RequestQuery,
};

/// Check a donor group against the group policy of a search
#[inline]
pub fn matches_group_filter(group: BloodGroup, filter: &GroupFilter) -> bool {
    match filter {
        GroupFilter::Any => true,
        GroupFilter::Exact(wanted) => group == *wanted,
        GroupFilter::CompatibleWith(recipient) => can_donate_to(group, *recipient),
    }
}

/// Groups to push down into a repository query; empty means every group
pub fn groups_for(filter: &GroupFilter) -> Vec<BloodGroup> {
    match filter {
        GroupFilter::Any => Vec::new(),
        GroupFilter::Exact(group) => vec![*group],
        GroupFilter::CompatibleWith(recipient) => compatible_donor_groups(*recipient).to_vec(),
    }
}

/// Donors a proximity search may return: present, available, right group
#[inline]
pub fn is_match_candidate(donor: &Donor, filter: &GroupFilter) -> bool {
    !donor.is_removed() && donor.availability && matches_group_filter(donor.blood_group, filter)
}

/// Check a stored donor against a repository candidate query
#[inline]
pub fn matches_donor_query(donor: &Donor, query: &DonorQuery) -> bool {
    if donor.is_removed() {
        return false;
    }

    if query.available_only && !donor.availability {
        return false;
    }

    if !query.groups.is_empty() && !query.groups.contains(&donor.blood_group) {
        return false;
    }

    is_within_bounding_box(
        donor.location.latitude(),
        donor.location.longitude(),
        &query.bounding_box,
    )
}

/// Check a donor against the browse filter (exact group match)
#[inline]
pub fn matches_donor_filter(donor: &Donor, filter: &DonorFilter) -> bool {
    if donor.is_removed() {
        return false;
    }

    if let Some(group) = filter.blood_group {
        if donor.blood_group != group {
            return false;
        }
    }

    match filter.available {
        Some(available) => donor.availability == available,
        None => true,
    }
}

/// Check a stored request against a repository candidate query
#[inline]
pub fn matches_request_query(request: &BloodRequest, query: &RequestQuery) -> bool {
    if !query.statuses.is_empty() && !query.statuses.contains(&request.status) {
        return false;
    }

    is_within_bounding_box(
        request.location.latitude(),
        request.location.longitude(),
        &query.bounding_box,
    )
}

/// Check a campaign against the browse filter; status is judged as of `today`
pub fn matches_campaign_filter(campaign: &Campaign, filter: &CampaignFilter, today: NaiveDate) -> bool {
    if let Some(city) = &filter.city {
        if !campaign.city.to_lowercase().contains(&city.to_lowercase()) {
            return false;
        }
    }

    if filter.campaign_type.is_some_and(|t| t != campaign.campaign_type) {
        return false;
    }

    if filter.date.is_some_and(|d| d != campaign.date) {
        return false;
    }

    filter.status.map_or(true, |status| campaign.status_on(today) == status)
}
