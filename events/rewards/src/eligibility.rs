use crate::types::RewardEventType;

/// Upstream application tags that produce reward events.
const APPLICATION_EVENT_TYPES: [(&str, RewardEventType); 3] = [
    ("graphql-images", RewardEventType::ImageSearch),
    ("graphql-video", RewardEventType::VideoSearch),
    ("graphql-audio", RewardEventType::AudioSearch),
];

/// Map an application tag to its reward event type. Unknown tags are not eligible.
pub fn resolve_event_type(application: &str) -> Option<RewardEventType> {
    APPLICATION_EVENT_TYPES
        .iter()
        .find(|(tag, _)| *tag == application)
        .map(|(_, event_type)| *event_type)
}

pub fn is_eligible_application(application: &str) -> bool {
    resolve_event_type(application).is_some()
}

/// The tracked application tags, in table order.
pub fn eligible_applications() -> impl Iterator<Item = &'static str> {
    APPLICATION_EVENT_TYPES.iter().map(|(tag, _)| *tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_applications() {
        assert_eq!(
            resolve_event_type("graphql-images"),
            Some(RewardEventType::ImageSearch)
        );
        assert_eq!(
            resolve_event_type("graphql-video"),
            Some(RewardEventType::VideoSearch)
        );
        assert_eq!(
            resolve_event_type("graphql-audio"),
            Some(RewardEventType::AudioSearch)
        );
        assert!(is_eligible_application("graphql-images"));
    }

    #[test]
    fn test_unknown_application() {
        assert!(!is_eligible_application("unknown-app"));
        assert!(!is_eligible_application(""));
        // Exact match only.
        assert!(!is_eligible_application("GraphQL-Images"));
        assert!(!is_eligible_application(" graphql-images"));
    }

    #[test]
    fn test_every_event_type_reachable() {
        let mapped: Vec<RewardEventType> = eligible_applications()
            .filter_map(resolve_event_type)
            .collect();
        for event_type in RewardEventType::ALL {
            assert!(mapped.contains(&event_type));
        }
    }
}
