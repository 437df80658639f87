//! Free-text methodology → bucket normalization.

use crate::domain::Methodology;

/// Map a free-text methodology label onto one of the four buckets.
///
/// Rules are checked in order on the lowercased label, first match wins:
///
/// 1. missing → `Unknown`
/// 2. "live phone", or "text" without "text-to-web" → `Phone`
/// 3. "online" or "text-to-web" → `Online`
/// 4. "probability" → `Panel`
/// 5. anything else → `Unknown`
///
/// So a mixed-mode label such as `IVR/Live Phone/Text-to-Web` lands in
/// `Phone`.
pub fn normalize(raw: Option<&str>) -> Methodology {
    let Some(raw) = raw else {
        return Methodology::Unknown;
    };
    let label = raw.to_lowercase();

    let text_to_web = label.contains("text-to-web");
    if label.contains("live phone") || (label.contains("text") && !text_to_web) {
        Methodology::Phone
    } else if label.contains("online") || text_to_web {
        Methodology::Online
    } else if label.contains("probability") {
        Methodology::Panel
    } else {
        Methodology::Unknown
    }
}

/// Resolve the bucket for a pre-cleaned methodology column.
///
/// Bucket labels are taken as-is; anything else still goes through
/// `normalize` so the result stays total.
pub fn from_precleaned(raw: Option<&str>) -> Methodology {
    raw.and_then(Methodology::from_label)
        .unwrap_or_else(|| normalize(raw))
}
