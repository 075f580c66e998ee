use chrono_tz::Tz;

use crate::error::{RecordError, RecordResult};
use crate::models::{EventDetails, EventDraft, EventPatch};
use crate::slug::slugify;
use crate::temporal::{normalize_date_in, normalize_time};

pub fn build_event(draft: &EventDraft, tz: Tz) -> RecordResult<EventDetails> {
    let title = required("title", &draft.title)?;
    let description = required("description", &draft.description)?;
    let overview = required("overview", &draft.overview)?;
    let image = required("image", &draft.image)?;
    let venue = required("venue", &draft.venue)?;
    let location = required("location", &draft.location)?;
    let date = required("date", &draft.date)?;
    let time = required("time", &draft.time)?;
    let mode = required("mode", &draft.mode)?;
    let audience = required("audience", &draft.audience)?;
    let agenda = required_list("agenda", &draft.agenda)?;
    let organizer = required("organizer", &draft.organizer)?;
    let tags = dedupe(required_list("tags", &draft.tags)?);

    Ok(EventDetails {
        slug: derive_slug(&title)?,
        title,
        description,
        overview,
        image,
        venue,
        location,
        date: normalize_date_in(&date, tz)?,
        time: normalize_time(&time)?,
        mode,
        audience,
        agenda,
        organizer,
        tags,
    })
}

/// The slug is derived again only when the title changes.
pub fn apply_patch(
    current: &EventDetails,
    patch: &EventPatch,
    tz: Tz,
) -> RecordResult<EventDetails> {
    let mut next = current.clone();

    if let Some(title) = &patch.title {
        let title = required("title", title)?;
        if title != current.title {
            next.slug = derive_slug(&title)?;
            next.title = title;
        }
    }

    replace("description", &patch.description, &mut next.description)?;
    replace("overview", &patch.overview, &mut next.overview)?;
    replace("image", &patch.image, &mut next.image)?;
    replace("venue", &patch.venue, &mut next.venue)?;
    replace("location", &patch.location, &mut next.location)?;
    replace("mode", &patch.mode, &mut next.mode)?;
    replace("audience", &patch.audience, &mut next.audience)?;
    replace("organizer", &patch.organizer, &mut next.organizer)?;

    if let Some(date) = &patch.date {
        let date = required("date", date)?;
        if date != current.date {
            next.date = normalize_date_in(&date, tz)?;
        }
    }
    if let Some(time) = &patch.time {
        let time = required("time", time)?;
        if time != current.time {
            next.time = normalize_time(&time)?;
        }
    }

    if let Some(agenda) = &patch.agenda {
        next.agenda = required_list("agenda", agenda)?;
    }
    if let Some(tags) = &patch.tags {
        next.tags = dedupe(required_list("tags", tags)?);
    }

    Ok(next)
}

fn derive_slug(title: &str) -> RecordResult<String> {
    let slug = slugify(title);
    if slug.is_empty() {
        return Err(RecordError::validation(
            "title",
            "must contain at least one letter or digit",
        ));
    }
    Ok(slug)
}

fn required(field: &'static str, value: &str) -> RecordResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RecordError::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn replace(field: &'static str, value: &Option<String>, slot: &mut String) -> RecordResult<()> {
    if let Some(value) = value {
        *slot = required(field, value)?;
    }
    Ok(())
}

fn required_list(field: &'static str, values: &[String]) -> RecordResult<Vec<String>> {
    if values.is_empty() {
        return Err(RecordError::validation(field, "must have at least one entry"));
    }
    values
        .iter()
        .map(|value| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(RecordError::validation(field, "entries must not be empty"))
            } else {
                Ok(trimmed.to_string())
            }
        })
        .collect()
}

fn dedupe(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}
