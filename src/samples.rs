use crate::models::EventDraft;

struct Sample {
    title: &'static str,
    image: &'static str,
    venue: &'static str,
    location: &'static str,
    date: &'static str,
    time: &'static str,
    mode: &'static str,
    tags: &'static [&'static str],
}

const SAMPLES: [Sample; 6] = [
    Sample {
        title: "React Summit US 2025",
        image: "/images/event1.png",
        venue: "Pier 48",
        location: "San Francisco, CA, USA",
        date: "2025-11-07",
        time: "09:00 AM",
        mode: "offline",
        tags: &["react", "frontend", "javascript"],
    },
    Sample {
        title: "KubeCon + CloudNativeCon Europe 2026",
        image: "/images/event2.png",
        venue: "Messe Wien",
        location: "Vienna, Austria",
        date: "2026-03-23",
        time: "10:00 AM",
        mode: "offline",
        tags: &["kubernetes", "cloud", "devops"],
    },
    Sample {
        title: "AWS re:Invent 2025",
        image: "/images/event3.png",
        venue: "The Venetian Expo",
        location: "Las Vegas, NV, USA",
        date: "2025-12-01",
        time: "08:00 AM",
        mode: "hybrid",
        tags: &["aws", "cloud"],
    },
    Sample {
        title: "Next.js Conf 2025",
        image: "/images/event4.png",
        venue: "Online",
        location: "Worldwide",
        date: "2025-10-22",
        time: "9:30 AM",
        mode: "online",
        tags: &["nextjs", "react", "web"],
    },
    Sample {
        title: "Google Cloud Next 2026",
        image: "/images/event5.png",
        venue: "Mandalay Bay Convention Center",
        location: "Las Vegas, NV, USA",
        date: "2026-04-22",
        time: "09:00 AM",
        mode: "hybrid",
        tags: &["gcp", "ai", "cloud"],
    },
    Sample {
        title: "ETHGlobal Hackathon: Brussels 2026",
        image: "/images/event6.png",
        venue: "BluePoint Brussels",
        location: "Brussels, Belgium",
        date: "2026-07-10",
        time: "10:00 AM",
        mode: "offline",
        tags: &["web3", "hackathon", "ethereum"],
    },
];

/// Built-in showcase events used to seed an empty store.
pub fn sample_events() -> Vec<EventDraft> {
    SAMPLES
        .iter()
        .map(|sample| EventDraft {
            title: sample.title.to_string(),
            description: format!(
                "{} brings the community together in {}.",
                sample.title, sample.location
            ),
            overview: format!("Talks, workshops and networking at {}.", sample.venue),
            image: sample.image.to_string(),
            venue: sample.venue.to_string(),
            location: sample.location.to_string(),
            date: sample.date.to_string(),
            time: sample.time.to_string(),
            mode: sample.mode.to_string(),
            audience: "Developers".to_string(),
            agenda: vec![
                "Registration".to_string(),
                "Keynote".to_string(),
                "Breakout sessions".to_string(),
            ],
            organizer: "Community organizers".to_string(),
            tags: sample.tags.iter().map(|tag| tag.to_string()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::build_event;
    use crate::slug::slugify;

    #[test]
    fn every_sample_passes_validation() {
        for draft in sample_events() {
            build_event(&draft, chrono_tz::UTC)
                .unwrap_or_else(|err| panic!("{} rejected: {err}", draft.title));
        }
    }

    #[test]
    fn sample_slugs_are_distinct() {
        let mut slugs: Vec<String> = sample_events().iter().map(|d| slugify(&d.title)).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), SAMPLES.len());
    }
}
