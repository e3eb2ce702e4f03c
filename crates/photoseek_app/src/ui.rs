use photoseek_core::{AppViewModel, JobPhase, Notice, SearchFailure};

/// Print the current view to stdout.
pub fn render(view: &AppViewModel) {
    for line in lines(view) {
        println!("{line}");
    }
}

/// Pure formatting: one string per terminal line.
pub fn lines(view: &AppViewModel) -> Vec<String> {
    let mut out = Vec::new();

    if let Some(banner) = &view.notice {
        out.push(format!("! {}", notice_text(&banner.notice)));
    }

    if let Some(line) = status_line(view) {
        out.push(line);
    }

    for (index, card) in view.results.iter().enumerate() {
        let mut marks = String::new();
        if card.is_saved {
            marks.push_str(" [saved]");
        }
        if card.is_saving {
            marks.push_str(" [saving...]");
        }
        if card.is_flagged {
            marks.push_str(" [flagged]");
        }
        out.push(format!(
            "{:>3}. {} by {} ({}){}",
            index + 1,
            card.result.image_url,
            card.result.author.name,
            card.result.provider,
            marks,
        ));
    }

    if view.saved.loading {
        out.push("Loading your saved photos...".to_string());
    } else if !view.saved.rows.is_empty() {
        out.push(format!("Saved photos ({}):", view.saved.rows.len()));
        for row in &view.saved.rows {
            let marker = if row.is_removing { " [removing...]" } else { "" };
            let id = row
                .record
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "?".to_string());
            out.push(format!("  #{} {}{}", id, row.record.image_url, marker));
        }
    }

    out
}

fn status_line(view: &AppViewModel) -> Option<String> {
    if let Some(failure) = &view.search.failure {
        return Some(format!("Search failed: {}", failure_text(failure)));
    }
    let phase = view.search.phase?;
    let query = view.search.query.as_deref().unwrap_or("");
    let line = match phase {
        JobPhase::Pending => format!("Submitting search for {query:?}..."),
        JobPhase::Streaming => match &view.search.progress {
            Some(progress) => format!(
                "Searching for {:?}: {}% ({})",
                query, progress.percent, progress.tag
            ),
            None => format!("Searching for {query:?}..."),
        },
        JobPhase::Completed => format!("{} result(s) for {:?}:", view.results.len(), query),
        JobPhase::Failed => format!("Search for {query:?} failed"),
        JobPhase::Superseded => return None,
    };
    Some(line)
}

fn failure_text(failure: &SearchFailure) -> String {
    match failure {
        SearchFailure::InvalidQuery => "describe the photo you are looking for".to_string(),
        SearchFailure::Submission { message } => message.clone(),
        SearchFailure::Stream { message } => message.clone(),
    }
}

fn notice_text(notice: &Notice) -> String {
    match notice {
        Notice::PhotoSaveFailed { message } => format!("Could not save photo: {message}"),
        Notice::PhotoRemoveFailed { message } => format!("Could not remove photo: {message}"),
        Notice::PostSuspended => "Post suspended".to_string(),
        Notice::SuspendFailed => "Something went wrong".to_string(),
    }
}

pub fn print_help() {
    println!("Type a description to search for photos.");
    println!("Commands: /save N, /remove ID, /flag N, /saved, /logout, /help, /quit");
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoseek_core::{update, AppState, Author, Msg, SearchResult};

    fn result(image_url: &str) -> SearchResult {
        SearchResult {
            id: "r1".to_string(),
            image_url: image_url.to_string(),
            description: None,
            keywords: Vec::new(),
            author: Author {
                name: "Alex".to_string(),
                url: "https://example.com/alex".to_string(),
            },
            source_url: "https://example.com/posts/r1".to_string(),
            provider: "pixabay".to_string(),
        }
    }

    #[test]
    fn streaming_status_shows_progress() {
        let (state, _) = update(AppState::new(), Msg::QueryEdited("cats".to_string()));
        let (state, _) = update(state, Msg::SearchSubmitted);
        let (state, _) = update(
            state,
            Msg::SearchAccepted {
                job_id: 1,
                stream_key: "abc".to_string(),
            },
        );
        let (state, _) = update(
            state,
            Msg::StreamProgress {
                job_id: 1,
                percent: 40,
                tag: "embedding".to_string(),
            },
        );

        let rendered = lines(&state.view());
        assert!(rendered
            .iter()
            .any(|line| line.contains("40%") && line.contains("embedding")));
    }

    #[test]
    fn completed_results_are_numbered_with_save_marks() {
        let (state, _) = update(AppState::new(), Msg::QueryEdited("cats".to_string()));
        let (state, _) = update(state, Msg::SearchSubmitted);
        let (state, _) = update(
            state,
            Msg::SearchAccepted {
                job_id: 1,
                stream_key: "abc".to_string(),
            },
        );
        let (state, _) = update(
            state,
            Msg::StreamCompleted {
                job_id: 1,
                results: vec![result("https://x/1.jpg")],
            },
        );
        let (state, _) = update(
            state,
            Msg::SaveRequested {
                result: result("https://x/1.jpg"),
            },
        );

        let rendered = lines(&state.view());
        assert!(rendered
            .iter()
            .any(|line| line.starts_with("  1.") && line.contains("[saving...]")));
    }
}
