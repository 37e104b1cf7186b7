/// Markers closer together than this fraction of the asset duration share one timeline marker.
pub const MARKER_GROUP_FRACTION: f64 = 0.02;

/// A cluster of comment markers drawn as one timeline marker.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerGroup<T> {
    /// Timestamp of the first (earliest) marker in the group.
    pub timestamp: f64,
    pub items: Vec<T>,
}

/// Cluster `(timestamp, item)` pairs in time order.
///
/// A marker joins the previous group when it is within `duration * 0.02` of that group's anchor
/// timestamp. A non-positive or non-finite duration yields no groups.
pub fn group_markers<T>(markers: impl IntoIterator<Item = (f64, T)>, duration: f64) -> Vec<MarkerGroup<T>> {
    if !duration.is_finite() || duration <= 0.0 {
        return Vec::new();
    }
    let threshold = duration * MARKER_GROUP_FRACTION;

    let mut sorted: Vec<(f64, T)> = markers
        .into_iter()
        .filter(|(t, _)| t.is_finite())
        .collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut groups: Vec<MarkerGroup<T>> = Vec::new();
    for (t, item) in sorted {
        match groups.last_mut() {
            Some(last) if t - last.timestamp < threshold => last.items.push(item),
            _ => groups.push(MarkerGroup {
                timestamp: t,
                items: vec![item],
            }),
        }
    }
    groups
}

#[cfg(test)]
#[path = "../../tests/unit/timecode/markers.rs"]
mod tests;
